//! Deferred type references and the resolver seam behind them.

use crate::model::descriptor::TypeDescriptor;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Looks up a declared type by name.
///
/// `TypeRegistry` is the standard implementation; tests and embedders can
/// supply their own.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<TypeDescriptor>;
}

/// Forward reference to a type that may not be declared yet.
#[derive(Clone)]
pub struct TypeReference {
    name: String,
    resolver: Arc<dyn TypeResolver>,
}

impl TypeReference {
    pub fn new(name: impl Into<String>, resolver: Arc<dyn TypeResolver>) -> Self {
        Self {
            name: name.into(),
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn resolve(&self) -> Option<TypeDescriptor> {
        self.resolver.resolve(&self.name)
    }
}

impl Debug for TypeReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeReference")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
