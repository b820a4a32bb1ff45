//! Element-wise coercion of array input.
//!
//! # Invariants
//! - Output length and order equal the input's; nothing is reordered,
//!   deduplicated or skipped.
//! - The member is resolved once per call, before the first element.
//! - The first failing element aborts the call; no partial output escapes.

use crate::attribute::Attribute;
use crate::coerce::{CoercionError, CoercionResult};
use crate::model::value::Value;

/// Coerces every element of an array through one member attribute.
pub struct CollectionCoercer<'a> {
    member: &'a Attribute,
}

impl<'a> CollectionCoercer<'a> {
    pub fn new(member: &'a Attribute) -> Self {
        Self { member }
    }

    /// Expects `input` to have passed the guard already.
    pub fn coerce(&self, input: Value) -> CoercionResult<Value> {
        let Value::Array(items) = input else {
            return Err(CoercionError::TypeMismatch {
                expected: format!("Array[{}]", self.member),
                found: input.kind_name(),
            });
        };

        let member = self.member.finalize()?;
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                member
                    .coerce(item)
                    .map_err(|cause| CoercionError::ElementCoercionFailed {
                        index,
                        cause: Box::new(cause),
                    })
            })
            .collect::<CoercionResult<Vec<_>>>()
            .map(Value::Array)
    }
}
