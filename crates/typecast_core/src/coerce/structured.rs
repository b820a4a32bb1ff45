//! Structured value construction from scalars, tuples and hashes.

use crate::attribute::Attribute;
use crate::coerce::{CoercionError, CoercionResult};
use crate::config::DuplicateKeyPolicy;
use crate::model::descriptor::{StructuredType, TypeDescriptor};
use crate::model::value::{StructValue, Value, ValueMap};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Builds instances of one structured type.
///
/// - an instance of the same type passes through unchanged;
/// - an array fills fields positionally;
/// - a hash fills fields by name (string or symbol keys);
/// - any other scalar fills the first field, unless the chain of first
///   fields leads back to a structured type already on it.
///
/// Fields not supplied are `Nil`. Typed fields coerce through their own
/// attribute. A hash naming one field twice (`"x"` and `:x`) follows the
/// duplicate-key policy.
pub struct StructuredCoercer<'a> {
    ty: &'a StructuredType,
    duplicate_keys: DuplicateKeyPolicy,
}

impl<'a> StructuredCoercer<'a> {
    pub fn new(ty: &'a StructuredType, duplicate_keys: DuplicateKeyPolicy) -> Self {
        Self { ty, duplicate_keys }
    }

    /// Expects `input` to have passed the guard already.
    pub fn coerce(&self, input: Value) -> CoercionResult<Value> {
        match input {
            Value::Struct(instance) if instance.type_name() == self.ty.name() => {
                Ok(Value::Struct(instance))
            }
            Value::Array(items) => self.from_positional(items),
            Value::Map(entries) => self.from_named(entries),
            other @ (Value::Struct(_) | Value::Foreign(_)) => Err(CoercionError::TypeMismatch {
                expected: self.ty.name().to_string(),
                found: other.kind_name(),
            }),
            scalar => {
                if self.scalar_wrap_cycles()? {
                    return Err(CoercionError::TypeMismatch {
                        expected: self.ty.name().to_string(),
                        found: scalar.kind_name(),
                    });
                }
                self.from_positional(vec![scalar])
            }
        }
    }

    /// Follows typed first fields through structured types; a repeat means a
    /// scalar would be wrapped forever.
    fn scalar_wrap_cycles(&self) -> CoercionResult<bool> {
        let mut seen = BTreeSet::from([self.ty.name().to_string()]);
        let mut next = first_field_attribute(self.ty);
        while let Some(attribute) = next {
            let resolved = attribute.finalize()?;
            let TypeDescriptor::StructuredValue(ty) = resolved.descriptor() else {
                return Ok(false);
            };
            if !seen.insert(ty.name().to_string()) {
                return Ok(true);
            }
            next = first_field_attribute(ty);
        }
        Ok(false)
    }

    fn from_positional(&self, items: Vec<Value>) -> CoercionResult<Value> {
        if items.len() > self.ty.arity() {
            return Err(CoercionError::StructArity {
                type_name: self.ty.name().to_string(),
                expected: self.ty.arity(),
                found: items.len(),
            });
        }
        let mut slots = items;
        slots.resize(self.ty.arity(), Value::Nil);
        self.build(slots)
    }

    fn from_named(&self, entries: ValueMap) -> CoercionResult<Value> {
        let mut slots = vec![Value::Nil; self.ty.arity()];
        let mut assigned = vec![false; self.ty.arity()];
        for (key, value) in entries {
            let Some(name) = key.as_name() else {
                return Err(CoercionError::TypeMismatch {
                    expected: format!("field name of {}", self.ty.name()),
                    found: key.kind_name(),
                });
            };
            let index = self
                .ty
                .field_index(name)
                .ok_or_else(|| CoercionError::UnknownField {
                    type_name: self.ty.name().to_string(),
                    field: name.to_string(),
                })?;
            if assigned[index] && self.duplicate_keys == DuplicateKeyPolicy::FailOnCollision {
                return Err(CoercionError::DuplicateKey { key });
            }
            assigned[index] = true;
            slots[index] = value;
        }
        self.build(slots)
    }

    fn build(&self, slots: Vec<Value>) -> CoercionResult<Value> {
        let mut fields = Vec::with_capacity(slots.len());
        for (spec, raw) in self.ty.fields().iter().zip(slots) {
            let value = match &spec.attribute {
                Some(attribute) => {
                    attribute
                        .coerce(raw)
                        .map_err(|cause| CoercionError::FieldCoercionFailed {
                            type_name: self.ty.name().to_string(),
                            field: spec.name.clone(),
                            cause: Box::new(cause),
                        })?
                }
                None => raw,
            };
            fields.push((spec.name.clone(), value));
        }
        Ok(Value::Struct(StructValue::new(self.ty.name(), fields)))
    }
}

fn first_field_attribute(ty: &StructuredType) -> Option<Arc<Attribute>> {
    ty.fields().first().and_then(|field| field.attribute.clone())
}
