//! Serialization framework for iWF.
//!
//! Values crossing the process boundary travel as an [`EncodedObject`]: an
//! encoding name plus the encoded payload. The payload never carries type
//! information; callers recover the type from a registration-time table and
//! decode with the matching [`crate::TypeDescriptor`].

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Encoding name written by [`JsonObjectEncoder`]
pub const JSON_ENCODING: &str = "json";

/// Encoded value as exchanged with the iWF server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedObject {
    pub encoding: String,
    pub data: String,
}

impl EncodedObject {
    pub fn new(encoding: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            encoding: encoding.into(),
            data: data.into(),
        }
    }

    /// Get the raw payload
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Get the encoding name
    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

/// Encoding errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// A value arrived under a name that has no registered type
    #[error("No type registered for {0}")]
    UnknownType(String),

    /// A value was handed to a descriptor of a different type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Pluggable codec between domain values and [`EncodedObject`].
///
/// The trait is object safe so that options can hold an
/// `Arc<dyn ObjectEncoder>`. Values pass through `serde_json::Value` as the
/// neutral intermediate form; the typed [`encode`](ObjectEncoder::encode) and
/// [`decode`](ObjectEncoder::decode) helpers live on `dyn ObjectEncoder`.
pub trait ObjectEncoder: Send + Sync {
    /// Name written to [`EncodedObject::encoding`]
    fn encoding(&self) -> &str;

    /// Encode an intermediate value
    fn encode_value(&self, value: &serde_json::Value) -> Result<EncodedObject, EncodingError>;

    /// Decode to an intermediate value
    fn decode_value(&self, encoded: &EncodedObject) -> Result<serde_json::Value, EncodingError>;
}

impl<'a> dyn ObjectEncoder + 'a {
    /// Encode a typed value
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<EncodedObject, EncodingError> {
        let value =
            serde_json::to_value(value).map_err(|e| EncodingError::Serialization(e.to_string()))?;
        self.encode_value(&value)
    }

    /// Decode to a typed value
    pub fn decode<T: DeserializeOwned>(&self, encoded: &EncodedObject) -> Result<T, EncodingError> {
        let value = self.decode_value(encoded)?;
        serde_json::from_value(value).map_err(|e| EncodingError::Deserialization(e.to_string()))
    }
}

/// Default JSON object encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObjectEncoder;

impl JsonObjectEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl ObjectEncoder for JsonObjectEncoder {
    fn encoding(&self) -> &str {
        JSON_ENCODING
    }

    fn encode_value(&self, value: &serde_json::Value) -> Result<EncodedObject, EncodingError> {
        let data =
            serde_json::to_string(value).map_err(|e| EncodingError::Serialization(e.to_string()))?;
        Ok(EncodedObject::new(JSON_ENCODING, data))
    }

    fn decode_value(&self, encoded: &EncodedObject) -> Result<serde_json::Value, EncodingError> {
        if encoded.encoding != JSON_ENCODING {
            return Err(EncodingError::UnsupportedEncoding(encoded.encoding.clone()));
        }
        serde_json::from_str(&encoded.data)
            .map_err(|e| EncodingError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Order {
        order_id: String,
        quantity: i32,
    }

    fn encoder() -> Box<dyn ObjectEncoder> {
        Box::new(JsonObjectEncoder::new())
    }

    #[test]
    fn test_json_encode_decode() {
        let encoder = encoder();
        let original = Order {
            order_id: "O1".to_string(),
            quantity: 3,
        };

        let encoded = encoder.encode(&original).unwrap();
        assert_eq!(encoded.encoding(), JSON_ENCODING);

        let decoded: Order = encoder.decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_encoded_payload_has_no_type_information() {
        let encoded = encoder().encode(&42i64).unwrap();
        assert_eq!(encoded.data(), "42");
    }

    #[test]
    fn test_decode_rejects_foreign_encoding() {
        let encoded = EncodedObject::new("protobuf", "CgRPMQ==");
        let err = encoder().decode::<String>(&encoded).unwrap_err();
        assert_eq!(
            err,
            EncodingError::UnsupportedEncoding("protobuf".to_string())
        );
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let encoded = encoder().encode("abc").unwrap();
        let err = encoder().decode::<i64>(&encoded).unwrap_err();
        assert!(matches!(err, EncodingError::Deserialization(_)));
    }
}
