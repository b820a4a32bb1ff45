//! Coercion engine: passthrough policy, collection/mapping orchestration and
//! structured value construction.
//!
//! # Responsibility
//! - Turn raw values into values that conform to a `TypeDescriptor`.
//! - Report the first failure with its position and full cause chain.
//!
//! # Invariants
//! - Coercion is pure and synchronous; no partial result is ever returned.
//! - Failures are never defaulted or swallowed.

pub mod collection;
pub mod guard;
pub mod mapping;
pub mod scalar;
pub mod structured;

use crate::model::descriptor::PrimitiveKind;
use crate::model::value::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoercionResult<T> = Result<T, CoercionError>;

/// A raw scalar could not be converted into the requested primitive kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarCoercionError {
    pub raw_value: Value,
    pub target_kind: PrimitiveKind,
}

impl ScalarCoercionError {
    pub fn new(raw_value: Value, target_kind: PrimitiveKind) -> Self {
        Self {
            raw_value,
            target_kind,
        }
    }
}

impl Display for ScalarCoercionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot coerce {} into {}",
            self.raw_value, self.target_kind
        )
    }
}

impl Error for ScalarCoercionError {}

/// Coercion failure with position context.
///
/// Nested failures keep their cause, so a path like
/// `element 1 -> value for :two -> scalar` stays inspectable.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercionError {
    ElementCoercionFailed {
        index: usize,
        cause: Box<CoercionError>,
    },
    KeyCoercionFailed {
        key: Value,
        cause: Box<CoercionError>,
    },
    ValueCoercionFailed {
        key: Value,
        cause: Box<CoercionError>,
    },
    FieldCoercionFailed {
        type_name: String,
        field: String,
        cause: Box<CoercionError>,
    },
    UnresolvedMemberType {
        reference: String,
    },
    Scalar(ScalarCoercionError),
    TypeMismatch {
        expected: String,
        found: &'static str,
    },
    StructArity {
        type_name: String,
        expected: usize,
        found: usize,
    },
    UnknownField {
        type_name: String,
        field: String,
    },
    DuplicateKey {
        key: Value,
    },
}

impl CoercionError {
    /// Returns the innermost error of a nested failure chain.
    pub fn root_cause(&self) -> &CoercionError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }

    fn cause(&self) -> Option<&CoercionError> {
        match self {
            Self::ElementCoercionFailed { cause, .. }
            | Self::KeyCoercionFailed { cause, .. }
            | Self::ValueCoercionFailed { cause, .. }
            | Self::FieldCoercionFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl Display for CoercionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ElementCoercionFailed { index, .. } => {
                write!(f, "element at index {index} could not be coerced")
            }
            Self::KeyCoercionFailed { key, .. } => write!(f, "key {key} could not be coerced"),
            Self::ValueCoercionFailed { key, .. } => {
                write!(f, "value for key {key} could not be coerced")
            }
            Self::FieldCoercionFailed {
                type_name, field, ..
            } => write!(f, "field `{field}` of {type_name} could not be coerced"),
            Self::UnresolvedMemberType { reference } => {
                write!(f, "member type `{reference}` cannot be resolved")
            }
            Self::Scalar(err) => write!(f, "{err}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::StructArity {
                type_name,
                expected,
                found,
            } => write!(
                f,
                "{type_name} takes at most {expected} field value(s), got {found}"
            ),
            Self::UnknownField { type_name, field } => {
                write!(f, "{type_name} has no field `{field}`")
            }
            Self::DuplicateKey { key } => {
                write!(f, "key {key} collides with an earlier key after coercion")
            }
        }
    }
}

impl Error for CoercionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ElementCoercionFailed { cause, .. }
            | Self::KeyCoercionFailed { cause, .. }
            | Self::ValueCoercionFailed { cause, .. }
            | Self::FieldCoercionFailed { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<ScalarCoercionError> for CoercionError {
    fn from(value: ScalarCoercionError) -> Self {
        Self::Scalar(value)
    }
}
