//! Serialization strategy for message bodies.

use crate::error::SerializationError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;

/// Wire format used to turn queue message bodies into events and back
pub trait MessageFormat: Send + Sync {
    /// Decode a message body
    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T, SerializationError>;

    /// Encode a value as a message body
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, SerializationError>;

    /// Decode a value from a UTF-8 byte stream
    fn decode_reader<T: DeserializeOwned, R: Read>(
        &self,
        reader: R,
    ) -> Result<T, SerializationError>;
}

/// JSON message bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl MessageFormat for JsonFormat {
    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T, SerializationError> {
        Ok(serde_json::from_str(body)?)
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<String, SerializationError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode_reader<T: DeserializeOwned, R: Read>(
        &self,
        reader: R,
    ) -> Result<T, SerializationError> {
        let mut body = String::new();
        std::io::BufReader::new(reader).read_to_string(&mut body)?;
        self.decode(&body)
    }
}
