//! Declared attributes and their one-time resolution.
//!
//! # Responsibility
//! - Pair a type descriptor (or a deferred reference to one) with the options
//!   that drive its coercion.
//! - Resolve deferred references exactly once and memoize the result.
//!
//! # Invariants
//! - `finalize()` runs at most one successful resolution per attribute, even
//!   under concurrent callers; every caller observes the same `Arc`.
//! - A failed resolution is not memoized, so a type declared later can still
//!   be picked up by the next call.
//! - `coerce(Nil)` yields `Nil` for every resolved descriptor.

pub mod resolver;

use crate::coerce::collection::CollectionCoercer;
use crate::coerce::guard::{GuardDecision, PassthroughGuard};
use crate::coerce::mapping::MappingCoercer;
use crate::coerce::scalar::{ScalarCoercer, StandardScalarCoercer};
use crate::coerce::structured::StructuredCoercer;
use crate::coerce::{CoercionError, CoercionResult};
use crate::config::CoercionConfig;
use crate::model::descriptor::{ForeignType, PrimitiveKind, StructuredType, TypeDescriptor};
use crate::model::value::Value;
use log::{debug, warn};
use once_cell::sync::OnceCell;
use resolver::TypeReference;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Options applied when an attribute coerces its own value.
#[derive(Clone)]
pub struct AttributeOptions {
    pub config: CoercionConfig,
    pub scalar_coercer: Arc<dyn ScalarCoercer>,
}

impl AttributeOptions {
    pub fn with_config(mut self, config: CoercionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scalar_coercer(mut self, coercer: Arc<dyn ScalarCoercer>) -> Self {
        self.scalar_coercer = coercer;
        self
    }
}

impl Default for AttributeOptions {
    fn default() -> Self {
        Self {
            config: CoercionConfig::default(),
            scalar_coercer: Arc::new(StandardScalarCoercer),
        }
    }
}

impl Debug for AttributeOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeOptions")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum DescriptorSource {
    Concrete(TypeDescriptor),
    Deferred(TypeReference),
}

/// A typed field paired with its coercion strategy.
pub struct Attribute {
    source: DescriptorSource,
    options: AttributeOptions,
    resolved: OnceCell<Arc<ResolvedAttribute>>,
}

impl Attribute {
    pub fn new(descriptor: TypeDescriptor, options: AttributeOptions) -> Self {
        Self {
            source: DescriptorSource::Concrete(descriptor),
            options,
            resolved: OnceCell::new(),
        }
    }

    pub fn build(descriptor: TypeDescriptor) -> Arc<Self> {
        Self::build_with(descriptor, AttributeOptions::default())
    }

    pub fn build_with(descriptor: TypeDescriptor, options: AttributeOptions) -> Arc<Self> {
        Arc::new(Self::new(descriptor, options))
    }

    /// Declares an attribute whose type is looked up on first `finalize()`.
    pub fn deferred(reference: TypeReference, options: AttributeOptions) -> Arc<Self> {
        Arc::new(Self {
            source: DescriptorSource::Deferred(reference),
            options,
            resolved: OnceCell::new(),
        })
    }

    pub fn primitive(kind: PrimitiveKind) -> Arc<Self> {
        Self::build(TypeDescriptor::Primitive(kind))
    }

    pub fn collection(member: Arc<Attribute>) -> Arc<Self> {
        Self::build(TypeDescriptor::collection(member))
    }

    pub fn mapping(key: Arc<Attribute>, value: Arc<Attribute>) -> Arc<Self> {
        Self::build(TypeDescriptor::mapping(key, value))
    }

    pub fn structured(ty: Arc<StructuredType>) -> Arc<Self> {
        Self::build(TypeDescriptor::StructuredValue(ty))
    }

    pub fn foreign(ty: Arc<ForeignType>) -> Arc<Self> {
        Self::build(TypeDescriptor::ForeignCapabilityOnly(ty))
    }

    pub fn options(&self) -> &AttributeOptions {
        &self.options
    }

    /// Returns the forward reference name for deferred attributes.
    pub fn reference(&self) -> Option<&str> {
        match &self.source {
            DescriptorSource::Deferred(reference) => Some(reference.name()),
            DescriptorSource::Concrete(_) => None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolves this attribute once and returns the cached result afterwards.
    ///
    /// # Errors
    /// - `UnresolvedMemberType` when a deferred reference is unknown to its
    ///   resolver.
    pub fn finalize(&self) -> CoercionResult<Arc<ResolvedAttribute>> {
        self.resolved
            .get_or_try_init(|| {
                let descriptor = match &self.source {
                    DescriptorSource::Concrete(descriptor) => descriptor.clone(),
                    DescriptorSource::Deferred(reference) => {
                        let Some(descriptor) = reference.resolve() else {
                            warn!(
                                "event=attribute_finalize module=attribute status=error reference={}",
                                reference.name()
                            );
                            return Err(CoercionError::UnresolvedMemberType {
                                reference: reference.name().to_string(),
                            });
                        };
                        debug!(
                            "event=attribute_finalize module=attribute status=ok reference={} resolved={}",
                            reference.name(),
                            descriptor
                        );
                        descriptor
                    }
                };
                Ok(Arc::new(ResolvedAttribute {
                    descriptor,
                    options: self.options.clone(),
                }))
            })
            .cloned()
    }

    /// Finalizes this attribute and every attribute reachable from it.
    ///
    /// Used by declaration paths to surface unresolved references before any
    /// value is coerced. Structured types are visited once, so
    /// self-referencing declarations terminate.
    pub fn finalize_deep(&self) -> CoercionResult<()> {
        let mut visited = BTreeSet::new();
        self.finalize_walk(&mut visited)
    }

    fn finalize_walk(&self, visited: &mut BTreeSet<String>) -> CoercionResult<()> {
        let resolved = self.finalize()?;
        match resolved.descriptor() {
            TypeDescriptor::Collection { member } => member.finalize_walk(visited),
            TypeDescriptor::Mapping { key, value } => {
                key.finalize_walk(visited)?;
                value.finalize_walk(visited)
            }
            TypeDescriptor::StructuredValue(ty) => {
                if !visited.insert(ty.name().to_string()) {
                    return Ok(());
                }
                for field in ty.fields() {
                    if let Some(attribute) = &field.attribute {
                        attribute.finalize_walk(visited)?;
                    }
                }
                Ok(())
            }
            TypeDescriptor::Primitive(_) | TypeDescriptor::ForeignCapabilityOnly(_) => Ok(()),
        }
    }

    /// Coerces one raw value into this attribute's type.
    pub fn coerce(&self, input: Value) -> CoercionResult<Value> {
        self.finalize()?.coerce(input)
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            DescriptorSource::Concrete(descriptor) => write!(f, "{descriptor}"),
            DescriptorSource::Deferred(reference) => write!(f, "{}", reference.name()),
        }
    }
}

impl Debug for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("source", &self.source)
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

/// Finalized attribute: concrete descriptor plus coercion options.
#[derive(Debug)]
pub struct ResolvedAttribute {
    descriptor: TypeDescriptor,
    options: AttributeOptions,
}

impl ResolvedAttribute {
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Applies the passthrough guard, then the descriptor's strategy.
    pub fn coerce(&self, input: Value) -> CoercionResult<Value> {
        let input = match PassthroughGuard::check(input, &self.descriptor) {
            GuardDecision::Bypass { value, .. } => return Ok(value),
            GuardDecision::Proceed(value) => value,
        };

        match &self.descriptor {
            TypeDescriptor::Primitive(kind) => Ok(self
                .options
                .scalar_coercer
                .coerce_scalar(&input, *kind)?),
            TypeDescriptor::StructuredValue(ty) => {
                StructuredCoercer::new(ty, self.options.config.duplicate_keys).coerce(input)
            }
            TypeDescriptor::Collection { member } => CollectionCoercer::new(member).coerce(input),
            TypeDescriptor::Mapping { key, value } => {
                MappingCoercer::new(key, value, self.options.config.duplicate_keys).coerce(input)
            }
            TypeDescriptor::ForeignCapabilityOnly(ty) => Err(CoercionError::TypeMismatch {
                expected: ty.name().to_string(),
                found: input.kind_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::resolver::{TypeReference, TypeResolver};
    use super::{Attribute, AttributeOptions};
    use crate::coerce::CoercionError;
    use crate::model::descriptor::{
        FieldSpec, PrimitiveKind, StructuredType, TypeDescriptor,
    };
    use crate::model::value::Value;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ToggleResolver {
        available: AtomicBool,
        calls: AtomicUsize,
    }

    impl TypeResolver for ToggleResolver {
        fn resolve(&self, name: &str) -> Option<TypeDescriptor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.available.load(Ordering::SeqCst) {
                Some(TypeDescriptor::structured(StructuredType::untyped(name, ["id"])))
            } else {
                None
            }
        }
    }

    #[test]
    fn finalize_returns_same_arc_on_repeat_calls() {
        let attribute = Attribute::primitive(PrimitiveKind::Integer);
        assert!(!attribute.is_finalized());
        let first = attribute.finalize().expect("concrete attribute resolves");
        let second = attribute.finalize().expect("concrete attribute resolves");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(attribute.is_finalized());
    }

    #[test]
    fn failed_resolution_is_retried_until_type_exists() {
        let resolver = Arc::new(ToggleResolver {
            available: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        });
        let attribute = Attribute::deferred(
            TypeReference::new("Later", resolver.clone()),
            AttributeOptions::default(),
        );

        let err = attribute.finalize().expect_err("unknown type must fail");
        assert_eq!(
            err,
            CoercionError::UnresolvedMemberType {
                reference: "Later".to_string()
            }
        );
        assert!(!attribute.is_finalized());

        resolver.available.store(true, Ordering::SeqCst);
        attribute.finalize().expect("type is now declared");
        attribute.finalize().expect("cached");
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn nil_is_returned_for_every_descriptor() {
        let point = Arc::new(StructuredType::untyped("Point", ["x", "y"]));
        let attributes = [
            Attribute::primitive(PrimitiveKind::Integer),
            Attribute::structured(point),
            Attribute::collection(Attribute::primitive(PrimitiveKind::String)),
            Attribute::mapping(
                Attribute::primitive(PrimitiveKind::String),
                Attribute::primitive(PrimitiveKind::Integer),
            ),
            Attribute::build(TypeDescriptor::foreign("Relation")),
        ];
        for attribute in attributes {
            assert_eq!(attribute.coerce(Value::Nil).expect("nil passes"), Value::Nil);
        }
    }

    #[test]
    fn finalize_deep_reports_unresolved_nested_reference() {
        let resolver = Arc::new(ToggleResolver {
            available: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        });
        let nested = Attribute::deferred(
            TypeReference::new("Missing", resolver),
            AttributeOptions::default(),
        );
        let owner = Arc::new(StructuredType::new(
            "Owner",
            vec![FieldSpec::typed("items", Attribute::collection(nested))],
        ));
        let attribute = Attribute::structured(owner);

        attribute.finalize().expect("owner itself is concrete");
        let err = attribute
            .finalize_deep()
            .expect_err("nested reference must be reported");
        assert!(matches!(err, CoercionError::UnresolvedMemberType { .. }));
    }

    #[test]
    fn foreign_descriptor_rejects_scalars() {
        let attribute = Attribute::build(TypeDescriptor::foreign("Relation"));
        let err = attribute
            .coerce(Value::Integer(1))
            .expect_err("scalar is not a relation");
        assert_eq!(
            err,
            CoercionError::TypeMismatch {
                expected: "Relation".to_string(),
                found: "integer",
            }
        );
    }
}
