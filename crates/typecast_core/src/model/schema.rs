//! Model schemas: named attribute sets and constructor-style instantiation.
//!
//! # Responsibility
//! - Hold the ordered attribute declarations of one model.
//! - Merge positional-hash and keyword arguments, then coerce each value.
//!
//! # Invariants
//! - Keyword arguments win over the positional hash for the same name.
//! - Unknown attribute names are rejected, never dropped.
//! - Attributes not supplied are `Nil` and skip coercion.

use crate::attribute::Attribute;
use crate::coerce::CoercionError;
use crate::model::value::{Value, ValueMap};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Schema declaration and instantiation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    InvalidAttributeName(String),
    DuplicateAttribute(String),
    UnknownAttribute { model: String, name: String },
    InvalidArguments { found: &'static str },
    Unresolved { attribute: String, source: CoercionError },
    Coercion { attribute: String, source: CoercionError },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAttributeName(value) => write!(f, "attribute name is invalid: {value}"),
            Self::DuplicateAttribute(value) => write!(f, "attribute already declared: {value}"),
            Self::UnknownAttribute { model, name } => {
                write!(f, "{model} has no attribute `{name}`")
            }
            Self::InvalidArguments { found } => {
                write!(f, "constructor arguments must be a hash, found {found}")
            }
            Self::Unresolved { attribute, .. } => {
                write!(f, "attribute `{attribute}` has an unresolved type")
            }
            Self::Coercion { attribute, .. } => {
                write!(f, "attribute `{attribute}` could not be coerced")
            }
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unresolved { source, .. } | Self::Coercion { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Ordered attribute declarations of one model.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    attributes: Vec<(String, Arc<Attribute>)>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares one attribute.
    pub fn define(
        &mut self,
        name: &str,
        attribute: Arc<Attribute>,
    ) -> Result<(), SchemaError> {
        let name = name.trim();
        if !is_valid_attribute_name(name) {
            return Err(SchemaError::InvalidAttributeName(name.to_string()));
        }
        if self.attribute(name).is_some() {
            return Err(SchemaError::DuplicateAttribute(name.to_string()));
        }
        self.attributes.push((name.to_string(), attribute));
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<Attribute>> {
        self.attributes
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, attribute)| attribute)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Resolves every attribute type reachable from this schema.
    ///
    /// Call once all referenced types are registered; an unknown reference is
    /// a declaration defect and fails here rather than at first use.
    pub fn finalize(&self) -> Result<(), SchemaError> {
        for (name, attribute) in &self.attributes {
            if let Err(source) = attribute.finalize_deep() {
                warn!(
                    "event=schema_finalize module=schema status=error model={} attribute={}",
                    self.name, name
                );
                return Err(SchemaError::Unresolved {
                    attribute: name.clone(),
                    source,
                });
            }
        }
        info!(
            "event=schema_finalize module=schema status=ok model={} attributes={}",
            self.name,
            self.attributes.len()
        );
        Ok(())
    }

    /// Builds one instance from a positional hash and keyword arguments.
    ///
    /// `positional` must be `None`, `Nil` or a hash.
    pub fn instantiate(
        &self,
        positional: Option<Value>,
        keywords: ValueMap,
    ) -> Result<ModelInstance, SchemaError> {
        let mut merged = match positional {
            None | Some(Value::Nil) => ValueMap::new(),
            Some(Value::Map(entries)) => self.normalize_keys(entries)?,
            Some(other) => {
                return Err(SchemaError::InvalidArguments {
                    found: other.kind_name(),
                })
            }
        };
        for (key, value) in self.normalize_keys(keywords)? {
            merged.insert(key, value);
        }

        let mut values = Vec::with_capacity(self.attributes.len());
        for (name, attribute) in &self.attributes {
            let raw = merged
                .get(&Value::string(name.as_str()))
                .cloned()
                .unwrap_or(Value::Nil);
            let value = attribute
                .coerce(raw)
                .map_err(|source| SchemaError::Coercion {
                    attribute: name.clone(),
                    source,
                })?;
            values.push((name.clone(), value));
        }

        Ok(ModelInstance {
            model: self.name.clone(),
            values,
        })
    }

    fn normalize_keys(&self, entries: ValueMap) -> Result<ValueMap, SchemaError> {
        let mut normalized = ValueMap::with_capacity(entries.len());
        for (key, value) in entries {
            let Some(name) = key.as_name() else {
                return Err(SchemaError::InvalidArguments {
                    found: key.kind_name(),
                });
            };
            if self.attribute(name).is_none() {
                return Err(SchemaError::UnknownAttribute {
                    model: self.name.clone(),
                    name: name.to_string(),
                });
            }
            normalized.insert(Value::string(name), value);
        }
        Ok(normalized)
    }
}

/// Coerced attribute values of one model instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    model: String,
    values: Vec<(String, Value)>,
}

impl ModelInstance {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, value)| value)
    }

    /// Attribute values as a hash keyed by attribute name.
    pub fn to_value(&self) -> Value {
        Value::map(
            self.values
                .iter()
                .map(|(name, value)| (Value::string(name.as_str()), value.clone())),
        )
    }
}

fn is_valid_attribute_name(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::{ModelSchema, SchemaError};
    use crate::attribute::Attribute;
    use crate::model::descriptor::PrimitiveKind;

    #[test]
    fn define_rejects_duplicates_and_bad_names() {
        let mut schema = ModelSchema::new("User");
        schema
            .define("name", Attribute::primitive(PrimitiveKind::String))
            .expect("first definition");

        assert_eq!(
            schema
                .define("name", Attribute::primitive(PrimitiveKind::String))
                .expect_err("duplicate"),
            SchemaError::DuplicateAttribute("name".to_string())
        );
        assert_eq!(
            schema
                .define("Name", Attribute::primitive(PrimitiveKind::String))
                .expect_err("capitalized"),
            SchemaError::InvalidAttributeName("Name".to_string())
        );
        assert_eq!(schema.attribute_names(), vec!["name"]);
    }
}
