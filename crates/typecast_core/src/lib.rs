//! Runtime type coercion for declared attributes.
//! This crate turns untyped input into values that match a declared type tree.

pub mod attribute;
pub mod coerce;
pub mod config;
pub mod logging;
pub mod model;
pub mod notation;
pub mod registry;

pub use attribute::resolver::{TypeReference, TypeResolver};
pub use attribute::{Attribute, AttributeOptions, ResolvedAttribute};
pub use coerce::guard::{BypassReason, GuardDecision, PassthroughGuard};
pub use coerce::scalar::{ScalarCoercer, StandardScalarCoercer};
pub use coerce::{CoercionError, CoercionResult, ScalarCoercionError};
pub use config::{CoercionConfig, ConfigError, DuplicateKeyPolicy, LoggingConfig, TypecastConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::descriptor::{FieldSpec, ForeignType, PrimitiveKind, StructuredType, TypeDescriptor};
pub use model::schema::{ModelInstance, ModelSchema, SchemaError};
pub use model::value::{ForeignInstance, StructValue, Value, ValueMap};
pub use notation::{parse_type, parse_type_with, NotationError};
pub use registry::{RegisteredType, RegistryError, TypeRegistry};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
