//! Key/value coercion of hash input.
//!
//! # Invariants
//! - Output preserves input iteration order.
//! - Errors name the raw (pre-coercion) key.
//! - Duplicate coerced keys follow `DuplicateKeyPolicy`.

use crate::attribute::Attribute;
use crate::coerce::{CoercionError, CoercionResult};
use crate::config::DuplicateKeyPolicy;
use crate::model::value::{Value, ValueMap};

/// Coerces every entry of a hash through key and value attributes.
pub struct MappingCoercer<'a> {
    key: &'a Attribute,
    value: &'a Attribute,
    duplicate_keys: DuplicateKeyPolicy,
}

impl<'a> MappingCoercer<'a> {
    pub fn new(key: &'a Attribute, value: &'a Attribute, duplicate_keys: DuplicateKeyPolicy) -> Self {
        Self {
            key,
            value,
            duplicate_keys,
        }
    }

    /// Expects `input` to have passed the guard already.
    pub fn coerce(&self, input: Value) -> CoercionResult<Value> {
        let Value::Map(entries) = input else {
            return Err(CoercionError::TypeMismatch {
                expected: format!("Hash[{} => {}]", self.key, self.value),
                found: input.kind_name(),
            });
        };

        let key_attribute = self.key.finalize()?;
        let value_attribute = self.value.finalize()?;
        let mut output = ValueMap::with_capacity(entries.len());

        for (raw_key, raw_value) in entries {
            let key = key_attribute.coerce(raw_key.clone()).map_err(|cause| {
                CoercionError::KeyCoercionFailed {
                    key: raw_key.clone(),
                    cause: Box::new(cause),
                }
            })?;
            let value = value_attribute.coerce(raw_value).map_err(|cause| {
                CoercionError::ValueCoercionFailed {
                    key: raw_key.clone(),
                    cause: Box::new(cause),
                }
            })?;

            if self.duplicate_keys == DuplicateKeyPolicy::FailOnCollision
                && output.contains_key(&key)
            {
                return Err(CoercionError::DuplicateKey { key: raw_key });
            }
            output.insert(key, value);
        }

        Ok(Value::Map(output))
    }
}
