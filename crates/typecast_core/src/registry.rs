//! In-process registry of declared structured and foreign types.
//!
//! # Responsibility
//! - Own the name -> type table that deferred references resolve against.
//! - Tag foreign types at declaration time so coercion never has to guess.
//!
//! # Invariants
//! - Names are unique and never shadow primitive names.
//! - Registration is safe while other threads resolve references.

use crate::attribute::resolver::{TypeReference, TypeResolver};
use crate::model::descriptor::{ForeignType, PrimitiveKind, StructuredType, TypeDescriptor};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// Type registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidTypeName(String),
    ReservedTypeName(String),
    DuplicateTypeName(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTypeName(value) => write!(f, "type name is invalid: {value}"),
            Self::ReservedTypeName(value) => write!(f, "type name is reserved: {value}"),
            Self::DuplicateTypeName(value) => write!(f, "type name already registered: {value}"),
        }
    }
}

impl Error for RegistryError {}

/// One registered declaration.
#[derive(Debug, Clone)]
pub enum RegisteredType {
    Structured(Arc<StructuredType>),
    Foreign(Arc<ForeignType>),
}

impl RegisteredType {
    pub fn descriptor(&self) -> TypeDescriptor {
        match self {
            Self::Structured(ty) => TypeDescriptor::StructuredValue(Arc::clone(ty)),
            Self::Foreign(ty) => TypeDescriptor::ForeignCapabilityOnly(Arc::clone(ty)),
        }
    }
}

/// Thread-safe type table.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<BTreeMap<String, RegisteredType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one structured value type under its own name.
    pub fn register_structured(
        &self,
        ty: StructuredType,
    ) -> Result<Arc<StructuredType>, RegistryError> {
        let ty = Arc::new(ty);
        self.insert(ty.name(), RegisteredType::Structured(Arc::clone(&ty)))?;
        Ok(ty)
    }

    /// Registers one foreign type whose instances must pass through untouched.
    pub fn register_foreign(&self, name: &str) -> Result<Arc<ForeignType>, RegistryError> {
        let ty = Arc::new(ForeignType::new(name.trim()));
        self.insert(ty.name(), RegisteredType::Foreign(Arc::clone(&ty)))?;
        Ok(ty)
    }

    pub fn get(&self, name: &str) -> Option<RegisteredType> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name.trim())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns sorted type names.
    pub fn type_names(&self) -> Vec<String> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Creates a forward reference resolved against this registry.
    pub fn reference(self: &Arc<Self>, name: &str) -> TypeReference {
        TypeReference::new(name.trim(), Arc::clone(self) as Arc<dyn TypeResolver>)
    }

    fn insert(&self, name: &str, entry: RegisteredType) -> Result<(), RegistryError> {
        if !is_valid_type_name(name) {
            return Err(RegistryError::InvalidTypeName(name.to_string()));
        }
        if is_reserved_type_name(name) {
            return Err(RegistryError::ReservedTypeName(name.to_string()));
        }

        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if types.contains_key(name) {
            return Err(RegistryError::DuplicateTypeName(name.to_string()));
        }
        types.insert(name.to_string(), entry);
        debug!("event=type_register module=registry status=ok name={name}");
        Ok(())
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, name: &str) -> Option<TypeDescriptor> {
        self.get(name).map(|entry| entry.descriptor())
    }
}

/// Accepts `Name` and namespaced `Outer::Inner` forms.
fn is_valid_type_name(value: &str) -> bool {
    !value.is_empty()
        && value.split("::").all(|segment| {
            let mut chars = segment.chars();
            chars.next().is_some_and(|c| c.is_ascii_uppercase())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn is_reserved_type_name(value: &str) -> bool {
    PrimitiveKind::from_type_name(value).is_some() || matches!(value, "Array" | "Hash")
}
