//! Type descriptors consumed by the coercion engine.
//!
//! # Responsibility
//! - Describe the target shape of one attribute: primitive, structured value,
//!   mapping, collection, or opaque foreign type.
//!
//! # Invariants
//! - Descriptors are immutable once built and shared through `Arc`.
//! - Collection and mapping members are attributes, so a member may be a
//!   deferred reference that resolves later.
//! - Foreign types are tagged at declaration time; nothing inspects runtime
//!   values to discover them.

use crate::attribute::Attribute;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Scalar target kinds handled by a `ScalarCoercer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    /// Accepts any value unchanged.
    Object,
    String,
    Symbol,
    Integer,
    Float,
    Boolean,
}

impl PrimitiveKind {
    /// Declaration name, e.g. `Integer`.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::String => "String",
            Self::Symbol => "Symbol",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
        }
    }

    /// Parses a declaration name back into a primitive kind.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Object" => Some(Self::Object),
            "String" => Some(Self::String),
            "Symbol" => Some(Self::Symbol),
            "Integer" => Some(Self::Integer),
            "Float" => Some(Self::Float),
            "Boolean" => Some(Self::Boolean),
            _ => None,
        }
    }
}

impl Display for PrimitiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One declared field of a structured value type.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    /// `None` keeps the raw field value as given.
    pub attribute: Option<Arc<Attribute>>,
}

impl FieldSpec {
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: None,
        }
    }

    pub fn typed(name: impl Into<String>, attribute: Arc<Attribute>) -> Self {
        Self {
            name: name.into(),
            attribute: Some(attribute),
        }
    }
}

/// Small value type built from its components during coercion.
#[derive(Debug, Clone)]
pub struct StructuredType {
    name: String,
    fields: Vec<FieldSpec>,
}

impl StructuredType {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Builds a type whose fields keep raw values.
    pub fn untyped<'a>(name: impl Into<String>, fields: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(name, fields.into_iter().map(FieldSpec::untyped).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|spec| spec.name == field)
    }
}

/// External type that only supports iteration.
///
/// Its construction contract is unknown, so coercion never builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignType {
    name: String,
}

impl ForeignType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Target type of one attribute.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    StructuredValue(Arc<StructuredType>),
    Mapping {
        key: Arc<Attribute>,
        value: Arc<Attribute>,
    },
    Collection {
        member: Arc<Attribute>,
    },
    ForeignCapabilityOnly(Arc<ForeignType>),
}

impl TypeDescriptor {
    pub fn collection(member: Arc<Attribute>) -> Self {
        Self::Collection { member }
    }

    pub fn mapping(key: Arc<Attribute>, value: Arc<Attribute>) -> Self {
        Self::Mapping { key, value }
    }

    pub fn structured(ty: StructuredType) -> Self {
        Self::StructuredValue(Arc::new(ty))
    }

    pub fn foreign(name: impl Into<String>) -> Self {
        Self::ForeignCapabilityOnly(Arc::new(ForeignType::new(name)))
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self, Self::ForeignCapabilityOnly(_))
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::StructuredValue(ty) => write!(f, "{}", ty.name()),
            Self::Mapping { key, value } => write!(f, "Hash[{key} => {value}]"),
            Self::Collection { member } => write!(f, "Array[{member}]"),
            Self::ForeignCapabilityOnly(ty) => write!(f, "{}", ty.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PrimitiveKind, StructuredType, TypeDescriptor};
    use crate::attribute::Attribute;

    #[test]
    fn primitive_names_round_trip() {
        for kind in [
            PrimitiveKind::Object,
            PrimitiveKind::String,
            PrimitiveKind::Symbol,
            PrimitiveKind::Integer,
            PrimitiveKind::Float,
            PrimitiveKind::Boolean,
        ] {
            assert_eq!(PrimitiveKind::from_type_name(kind.type_name()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_type_name("integer"), None);
    }

    #[test]
    fn descriptor_display_uses_declaration_notation() {
        let descriptor = TypeDescriptor::collection(Attribute::mapping(
            Attribute::primitive(PrimitiveKind::String),
            Attribute::primitive(PrimitiveKind::Integer),
        ));
        assert_eq!(descriptor.to_string(), "Array[Hash[String => Integer]]");
    }

    #[test]
    fn structured_type_indexes_fields() {
        let ty = StructuredType::untyped("Point", ["x", "y"]);
        assert_eq!(ty.arity(), 2);
        assert_eq!(ty.field_index("y"), Some(1));
        assert_eq!(ty.field_index("z"), None);
    }
}
