use std::sync::Arc;
use typecast_core::{
    parse_type, Attribute, CoercionError, ModelSchema, PrimitiveKind, SchemaError,
    StructuredType, TypeRegistry, Value, ValueMap,
};

fn foo_bar_schema() -> ModelSchema {
    let mut schema = ModelSchema::new("Widget");
    schema
        .define("foo", Attribute::primitive(PrimitiveKind::String))
        .expect("foo definition");
    schema
        .define("bar", Attribute::primitive(PrimitiveKind::String))
        .expect("bar definition");
    schema
}

fn keywords(entries: &[(&str, Value)]) -> ValueMap {
    entries
        .iter()
        .map(|(name, value)| (Value::symbol(*name), value.clone()))
        .collect()
}

#[test]
fn accepts_keyword_arguments() {
    let schema = foo_bar_schema();

    let instance = schema
        .instantiate(None, keywords(&[("foo", Value::from("a"))]))
        .expect("keyword construction");

    assert_eq!(instance.model(), "Widget");
    assert_eq!(instance.get("foo"), Some(&Value::from("a")));
    assert_eq!(instance.get("bar"), Some(&Value::Nil));
}

#[test]
fn merges_positional_hash_and_keyword_arguments() {
    let schema = foo_bar_schema();
    let positional = Value::map([(Value::symbol("foo"), Value::from("a"))]);

    let instance = schema
        .instantiate(Some(positional), keywords(&[("bar", Value::from("b"))]))
        .expect("merged construction");

    assert_eq!(instance.get("foo"), Some(&Value::from("a")));
    assert_eq!(instance.get("bar"), Some(&Value::from("b")));
}

#[test]
fn keyword_arguments_override_positional_hash() {
    let schema = foo_bar_schema();
    let positional = Value::map([(Value::from("foo"), Value::from("positional"))]);

    let instance = schema
        .instantiate(Some(positional), keywords(&[("foo", Value::symbol("keyword"))]))
        .expect("override construction");

    assert_eq!(instance.get("foo"), Some(&Value::from("keyword")));
}

#[test]
fn rejects_unknown_attributes_and_non_hash_positional() {
    let schema = foo_bar_schema();

    let err = schema
        .instantiate(None, keywords(&[("baz", Value::Integer(1))]))
        .expect_err("unknown attribute");
    assert_eq!(
        err,
        SchemaError::UnknownAttribute {
            model: "Widget".to_string(),
            name: "baz".to_string(),
        }
    );

    let err = schema
        .instantiate(Some(Value::array([])), ValueMap::new())
        .expect_err("array positional");
    assert_eq!(err, SchemaError::InvalidArguments { found: "array" });
}

#[test]
fn collection_attributes_coerce_through_constructor() {
    let registry = Arc::new(TypeRegistry::new());
    let mut schema = ModelSchema::new("Order");
    schema
        .define(
            "quantities",
            parse_type("Array[Integer]", &registry).expect("notation parses"),
        )
        .expect("quantities definition");

    let instance = schema
        .instantiate(
            None,
            keywords(&[("quantities", Value::array([Value::from("3"), Value::from("4")]))]),
        )
        .expect("quantities coerce");
    assert_eq!(
        instance.get("quantities"),
        Some(&Value::array([Value::Integer(3), Value::Integer(4)]))
    );

    let err = schema
        .instantiate(
            None,
            keywords(&[("quantities", Value::array([Value::from("x")]))]),
        )
        .expect_err("bad quantity");
    assert!(matches!(
        err,
        SchemaError::Coercion {
            ref attribute,
            source: CoercionError::ElementCoercionFailed { index: 0, .. },
        } if attribute == "quantities"
    ));
}

#[test]
fn finalize_surfaces_forward_references_at_declaration_time() {
    let registry = Arc::new(TypeRegistry::new());
    let mut schema = ModelSchema::new("Order");
    schema
        .define(
            "lines",
            parse_type("Array[LineItem]", &registry).expect("forward reference parses"),
        )
        .expect("lines definition");

    let err = schema.finalize().expect_err("LineItem is not declared");
    assert!(matches!(
        err,
        SchemaError::Unresolved {
            ref attribute,
            source: CoercionError::UnresolvedMemberType { ref reference },
        } if attribute == "lines" && reference == "LineItem"
    ));

    registry
        .register_structured(StructuredType::untyped("LineItem", ["sku", "qty"]))
        .expect("line item registration");
    schema.finalize().expect("all types resolve");

    let instance = schema
        .instantiate(
            None,
            keywords(&[(
                "lines",
                Value::array([Value::array([Value::from("A-1"), Value::Integer(2)])]),
            )]),
        )
        .expect("lines coerce");
    let lines = instance
        .get("lines")
        .and_then(Value::as_array)
        .expect("lines array");
    assert_eq!(lines.len(), 1);
    assert!(matches!(&lines[0], Value::Struct(item) if item.get("qty") == Some(&Value::Integer(2))));
    assert!(instance.to_value().as_map().is_some());
}
