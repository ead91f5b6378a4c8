//! Runtime type descriptors.
//!
//! The wire protocol never says what type a payload has. A [`TypeDescriptor`]
//! is recorded for every signal channel, query attribute, state input and
//! activity output when a workflow is registered, and is used later to decode
//! the payload that arrives under that name. Decoded values are handed around
//! as [`DynValue`] and downcast by the caller that knows the concrete type.

use std::any::{Any, TypeId};
use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::encoded::{EncodedObject, EncodingError, ObjectEncoder};

type EncodeFn =
    fn(&dyn ObjectEncoder, &(dyn Any + Send + Sync)) -> Result<EncodedObject, EncodingError>;
type DecodeFn = fn(&dyn ObjectEncoder, &EncodedObject) -> Result<DynValue, EncodingError>;
type DecodeAbsentFn = fn() -> Result<DynValue, EncodingError>;

/// Type identity plus the monomorphized codec entry points for one type
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
    decode_absent: DecodeAbsentFn,
}

impl TypeDescriptor {
    /// Descriptor for `T`
    pub fn of<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            encode: encode_erased::<T>,
            decode: decode_erased::<T>,
            decode_absent: decode_absent_erased::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether values of `T` are instances of the described type
    pub fn is_instance_of<T: Any + ?Sized>(&self) -> bool {
        TypeId::of::<T>() == self.type_id
    }

    /// Decode a payload as the described type
    pub fn decode(
        &self,
        encoder: &dyn ObjectEncoder,
        encoded: &EncodedObject,
    ) -> Result<DynValue, EncodingError> {
        (self.decode)(encoder, encoded)
    }

    /// Decode an optional payload; a missing payload is read as JSON `null`,
    /// which succeeds for `()` and `Option<_>` and fails for everything else
    pub fn decode_optional(
        &self,
        encoder: &dyn ObjectEncoder,
        encoded: Option<&EncodedObject>,
    ) -> Result<DynValue, EncodingError> {
        match encoded {
            Some(encoded) => self.decode(encoder, encoded),
            None => (self.decode_absent)(),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.type_name).finish()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeDescriptor {}

fn encode_erased<T>(
    encoder: &dyn ObjectEncoder,
    value: &(dyn Any + Send + Sync),
) -> Result<EncodedObject, EncodingError>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let value = value
        .downcast_ref::<T>()
        .ok_or(EncodingError::TypeMismatch {
            expected: std::any::type_name::<T>(),
            actual: "<erased>",
        })?;
    encoder.encode(value)
}

fn decode_erased<T>(
    encoder: &dyn ObjectEncoder,
    encoded: &EncodedObject,
) -> Result<DynValue, EncodingError>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let value: T = encoder.decode(encoded)?;
    Ok(DynValue::new(value))
}

fn decode_absent_erased<T>() -> Result<DynValue, EncodingError>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    let value: T = serde_json::from_value(serde_json::Value::Null).map_err(|_| {
        EncodingError::Deserialization(format!(
            "missing value for {}",
            std::any::type_name::<T>()
        ))
    })?;
    Ok(DynValue::new(value))
}

/// A value whose concrete type is only known at runtime
pub struct DynValue {
    value: Box<dyn Any + Send + Sync>,
    descriptor: TypeDescriptor,
}

impl DynValue {
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            descriptor: TypeDescriptor::of::<T>(),
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the value out, or get `self` back if it is not a `T`
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let descriptor = self.descriptor;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { value, descriptor }),
        }
    }

    /// Encode with the codec captured when the value was created
    pub fn encode(&self, encoder: &dyn ObjectEncoder) -> Result<EncodedObject, EncodingError> {
        (self.descriptor.encode)(encoder, self.value.as_ref())
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynValue")
            .field("type", &self.descriptor.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonObjectEncoder;

    #[test]
    fn test_descriptor_round_trip() {
        let encoder = JsonObjectEncoder::new();

        let int_type = TypeDescriptor::of::<i64>();
        let encoded = DynValue::new(42i64).encode(&encoder).unwrap();
        let decoded = int_type.decode(&encoder, &encoded).unwrap();
        assert_eq!(decoded.downcast_ref::<i64>(), Some(&42));

        let string_type = TypeDescriptor::of::<String>();
        let encoded = DynValue::new("abc".to_string()).encode(&encoder).unwrap();
        let decoded = string_type.decode(&encoder, &encoded).unwrap();
        assert_eq!(decoded.downcast::<String>().unwrap(), "abc");
    }

    #[test]
    fn test_is_instance_of() {
        let bool_type = TypeDescriptor::of::<bool>();
        assert!(bool_type.is_instance_of::<bool>());
        assert!(!bool_type.is_instance_of::<&str>());
        assert!(!bool_type.is_instance_of::<String>());
    }

    #[test]
    fn test_downcast_to_wrong_type_returns_value() {
        let value = DynValue::new(7i32);
        assert!(value.downcast_ref::<i64>().is_none());

        let value = value.downcast::<String>().unwrap_err();
        assert_eq!(value.type_name(), "i32");
        assert!(value.is::<i32>());
    }

    #[test]
    fn test_absent_payload() {
        let encoder = JsonObjectEncoder::new();

        let unit = TypeDescriptor::of::<()>()
            .decode_optional(&encoder, None)
            .unwrap();
        assert!(unit.is::<()>());

        let optional = TypeDescriptor::of::<Option<String>>()
            .decode_optional(&encoder, None)
            .unwrap();
        assert_eq!(optional.downcast::<Option<String>>().unwrap(), None);

        let err = TypeDescriptor::of::<i64>()
            .decode_optional(&encoder, None)
            .unwrap_err();
        assert!(matches!(err, EncodingError::Deserialization(_)));
    }

    #[test]
    fn test_descriptor_equality_is_type_identity() {
        assert_eq!(TypeDescriptor::of::<i64>(), TypeDescriptor::of::<i64>());
        assert_ne!(TypeDescriptor::of::<i64>(), TypeDescriptor::of::<i32>());
    }
}
