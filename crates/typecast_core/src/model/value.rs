//! Dynamic value model shared by raw input and coerced output.
//!
//! # Responsibility
//! - Represent untyped input (scalars, arrays, maps) and typed results
//!   (structured values, foreign instances) with one enum.
//! - Provide inspection-style rendering used in error messages.
//!
//! # Invariants
//! - `ValueMap` keeps insertion order; re-inserting an equal key replaces the
//!   value in place.
//! - `Foreign` values compare by reference identity, never by content.
//! - `Hash` on `Value` agrees with `PartialEq`, so map lookups stay constant-time.

use indexmap::{Equivalent, IndexMap};
use std::any::Any;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Raw or coerced attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Interned-name style key, e.g. `:one`.
    Symbol(String),
    Array(Vec<Value>),
    Map(ValueMap),
    Struct(StructValue),
    Foreign(ForeignInstance),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    pub fn symbol(value: impl Into<String>) -> Self {
        Self::Symbol(value.into())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::Map(entries.into_iter().collect())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Short runtime kind name used in mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Array(_) => "array",
            Self::Map(_) => "hash",
            Self::Struct(_) => "struct",
            Self::Foreign(_) => "foreign",
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the key text for string or symbol values.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::String(value) | Self::Symbol(value) => Some(value),
            _ => None,
        }
    }

    /// Returns whether both values are the same foreign instance.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Foreign(left), Self::Foreign(right)) => left.same_instance(right),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Self::Map(value)
    }
}

/// Agrees with `PartialEq`: `0.0` and `-0.0` hash alike, maps hash by size
/// only, foreign instances by address.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Nil => {}
            Self::Boolean(value) => value.hash(state),
            Self::Integer(value) => value.hash(state),
            Self::Float(value) => {
                let bits = if *value == 0.0 { 0.0_f64.to_bits() } else { value.to_bits() };
                bits.hash(state);
            }
            Self::String(value) | Self::Symbol(value) => value.hash(state),
            Self::Array(items) => items.hash(state),
            Self::Map(map) => map.len().hash(state),
            Self::Struct(value) => {
                value.type_name.hash(state);
                value.fields.hash(state);
            }
            Self::Foreign(value) => value.address().hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{}", format_float(*value)),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Symbol(value) => write!(f, ":{value}"),
            Self::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => write!(f, "{map}"),
            Self::Struct(value) => write!(f, "{value}"),
            Self::Foreign(value) => write!(f, "#<{}>", value.type_name()),
        }
    }
}

/// Renders floats the way an inspect would: integral values keep `.0`.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Insertion-ordered key/value mapping.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: IndexMap<MapKey, Value>,
}

/// Hash key wrapper; equality is `Value`'s own.
///
/// `NaN` keys never match, so each one stays a separate entry.
#[derive(Debug, Clone)]
struct MapKey(Value);

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Equivalent<MapKey> for Value {
    fn equivalent(&self, key: &MapKey) -> bool {
        *self == key.0
    }
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts one entry, replacing the value of an equal key in place.
    ///
    /// Returns the previous value when the key was already present.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        self.entries.insert(MapKey(key), value)
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(key, value)| (&key.0, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys().map(|key| &key.0)
    }
}

/// Equality ignores insertion order, matching hash semantics.
impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|found| found == value))
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ValueMap {
    type Item = (Value, Value);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.entries.into_iter())
    }
}

/// Owning iterator over `ValueMap` entries in insertion order.
pub struct IntoIter(indexmap::map::IntoIter<MapKey, Value>);

impl Iterator for IntoIter {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, value)| (key.0, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl Display for ValueMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key} => {value}")?;
        }
        write!(f, "}}")
    }
}

/// Instance of a structured value type.
///
/// Field order follows the declaring `StructuredType`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn new(type_name: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

impl Display for StructValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#<{}", self.type_name)?;
        for (index, (name, value)) in self.fields.iter().enumerate() {
            let separator = if index == 0 { " " } else { ", " };
            write!(f, "{separator}{name}={value}")?;
        }
        write!(f, ">")
    }
}

/// Opaque instance of an externally defined type.
///
/// The coercion engine never builds these; it only recognizes them by type
/// name and hands them back untouched.
#[derive(Clone)]
pub struct ForeignInstance {
    type_name: String,
    object: Arc<dyn Any + Send + Sync>,
}

impl ForeignInstance {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, object: T) -> Self {
        Self {
            type_name: type_name.into(),
            object: Arc::new(object),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    pub fn same_instance(&self, other: &ForeignInstance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.object), Arc::as_ptr(&other.object))
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.object) as *const () as usize
    }
}

impl PartialEq for ForeignInstance {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl Debug for ForeignInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignInstance")
            .field("type_name", &self.type_name)
            .field("object", &Arc::as_ptr(&self.object))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{ForeignInstance, StructValue, Value, ValueMap};

    #[test]
    fn map_insert_replaces_in_place() {
        let mut map = ValueMap::new();
        map.insert(Value::from("a"), Value::Integer(1));
        map.insert(Value::from("b"), Value::Integer(2));
        let previous = map.insert(Value::from("a"), Value::Integer(3));

        assert_eq!(previous, Some(Value::Integer(1)));
        assert_eq!(map.len(), 2);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b")]);
        assert_eq!(map.get(&Value::from("a")), Some(&Value::Integer(3)));
    }

    #[test]
    fn map_lookup_follows_value_equality() {
        let relation = ForeignInstance::new("Relation", 1_u8);
        let mut map = ValueMap::new();
        map.insert(Value::Float(0.0), Value::from("zero"));
        map.insert(Value::Foreign(relation.clone()), Value::from("relation"));
        map.insert(Value::Float(f64::NAN), Value::Nil);
        map.insert(Value::Float(f64::NAN), Value::Nil);

        assert_eq!(map.get(&Value::Float(-0.0)), Some(&Value::from("zero")));
        assert_eq!(map.get(&Value::Integer(0)), None);
        assert_eq!(
            map.get(&Value::Foreign(relation)),
            Some(&Value::from("relation"))
        );
        assert_eq!(
            map.get(&Value::Foreign(ForeignInstance::new("Relation", 1_u8))),
            None
        );
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn large_maps_keep_insertion_order() {
        let map: ValueMap = (0..20_000_i64)
            .rev()
            .map(|n| (Value::Integer(n), Value::Integer(n * 2)))
            .collect();

        assert_eq!(map.len(), 20_000);
        assert_eq!(map.keys().next(), Some(&Value::Integer(19_999)));
        assert_eq!(map.get(&Value::Integer(7)), Some(&Value::Integer(14)));
    }

    #[test]
    fn map_equality_ignores_order() {
        let left = ValueMap::from_iter([
            (Value::from("a"), Value::Integer(1)),
            (Value::from("b"), Value::Integer(2)),
        ]);
        let right = ValueMap::from_iter([
            (Value::from("b"), Value::Integer(2)),
            (Value::from("a"), Value::Integer(1)),
        ]);
        assert_eq!(left, right);
    }

    #[test]
    fn foreign_equality_is_identity() {
        let first = ForeignInstance::new("Relation", 1_u8);
        let copy = first.clone();
        let other = ForeignInstance::new("Relation", 1_u8);

        assert_eq!(first, copy);
        assert_ne!(first, other);
        assert_eq!(copy.downcast_ref::<u8>(), Some(&1));
    }

    #[test]
    fn display_renders_inspect_style() {
        let value = Value::array([
            Value::map([(Value::symbol("one"), Value::from("1"))]),
            Value::Float(2.0),
            Value::Struct(StructValue::new(
                "Point",
                vec![("x".to_string(), Value::Integer(1))],
            )),
        ]);
        assert_eq!(value.to_string(), r#"[{:one => "1"}, 2.0, #<Point x=1>]"#);
    }
}
