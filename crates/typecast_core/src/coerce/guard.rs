//! Passthrough policy evaluated before any element processing.
//!
//! # Invariants
//! - Rules are checked in order and the first match wins:
//!   1. `Nil` input is returned as `Nil` for every descriptor.
//!   2. A foreign instance of the declared foreign type is returned as the
//!      identical instance.
//!   3. An array given for a foreign type is returned as-is, with no element
//!      coercion and no construction of the foreign type.
//! - A bypass never invokes a coercer or constructor.

use crate::model::descriptor::TypeDescriptor;
use crate::model::value::Value;
use log::trace;

/// Why the guard skipped coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    NilInput,
    ForeignInstance,
    ForeignSequence,
}

impl BypassReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NilInput => "nil_input",
            Self::ForeignInstance => "foreign_instance",
            Self::ForeignSequence => "foreign_sequence",
        }
    }
}

/// Guard outcome; both arms hand the input back by value.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Bypass { value: Value, reason: BypassReason },
    Proceed(Value),
}

impl GuardDecision {
    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypass { .. })
    }
}

/// Stateless passthrough guard.
pub struct PassthroughGuard;

impl PassthroughGuard {
    pub fn check(input: Value, descriptor: &TypeDescriptor) -> GuardDecision {
        let reason = match (&input, descriptor) {
            (Value::Nil, _) => Some(BypassReason::NilInput),
            (Value::Foreign(instance), TypeDescriptor::ForeignCapabilityOnly(ty))
                if instance.type_name() == ty.name() =>
            {
                Some(BypassReason::ForeignInstance)
            }
            (Value::Array(_), TypeDescriptor::ForeignCapabilityOnly(_)) => {
                Some(BypassReason::ForeignSequence)
            }
            _ => None,
        };

        match reason {
            Some(reason) => {
                trace!(
                    "event=coerce_bypass module=guard status=skip reason={} target={}",
                    reason.as_str(),
                    descriptor
                );
                GuardDecision::Bypass {
                    value: input,
                    reason,
                }
            }
            None => GuardDecision::Proceed(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BypassReason, GuardDecision, PassthroughGuard};
    use crate::attribute::Attribute;
    use crate::model::descriptor::{PrimitiveKind, TypeDescriptor};
    use crate::model::value::{ForeignInstance, Value};

    #[test]
    fn nil_bypasses_every_descriptor() {
        let descriptor =
            TypeDescriptor::collection(Attribute::primitive(PrimitiveKind::Integer));
        assert_eq!(
            PassthroughGuard::check(Value::Nil, &descriptor),
            GuardDecision::Bypass {
                value: Value::Nil,
                reason: BypassReason::NilInput
            }
        );
    }

    #[test]
    fn foreign_instance_of_other_type_proceeds() {
        let descriptor = TypeDescriptor::foreign("Relation");
        let input = Value::Foreign(ForeignInstance::new("Cursor", ()));
        assert!(!PassthroughGuard::check(input, &descriptor).is_bypass());
    }

    #[test]
    fn arrays_only_bypass_for_foreign_descriptors() {
        let foreign = TypeDescriptor::foreign("Relation");
        let array = Value::array([Value::from("1")]);
        assert_eq!(
            PassthroughGuard::check(array.clone(), &foreign),
            GuardDecision::Bypass {
                value: array.clone(),
                reason: BypassReason::ForeignSequence
            }
        );

        let collection =
            TypeDescriptor::collection(Attribute::primitive(PrimitiveKind::Integer));
        assert_eq!(
            PassthroughGuard::check(array.clone(), &collection),
            GuardDecision::Proceed(array)
        );
    }
}
