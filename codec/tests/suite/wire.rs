//! Wire shapes and decode failures.

use std::collections::BTreeMap;

use courier_codec::{CodecSettings, HookRegistry, MarshalError, PropertyPolicy};
use courier_types::{Decimal, IntoObject, Object, TypeRef};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{State, codec, codec_with, march_fourth};

#[test]
fn dates_carry_tag_and_iso_text() {
    let codec = codec();
    let wire = codec
        .encode(&Object::Date(march_fourth()), PropertyPolicy::Whitelist)
        .unwrap();
    assert_eq!(
        wire,
        json!({ "@class": "courier.Date", "value": "2011-03-04T05:06:07.000+0100" })
    );
    assert_eq!(
        codec.decode(&wire, &TypeRef::Any).unwrap(),
        Object::Date(march_fourth())
    );
}

#[test]
fn scalars_and_collections_are_untagged() {
    let codec = codec();
    let mut entries = BTreeMap::new();
    entries.insert("state".to_string(), State::CA.into_object());
    entries.insert("chars".to_string(), Object::CharArray(vec!['o', 'k']));
    entries.insert("type".to_string(), Object::Type("shop.Person".into()));
    entries.insert(
        "list".to_string(),
        Object::List(vec![Object::Int(1), Object::Char('x'), Object::Null]),
    );
    let wire = codec
        .encode(&Object::Map(entries), PropertyPolicy::Blacklist)
        .unwrap();
    assert_eq!(
        wire,
        json!({
            "chars": "ok",
            "list": [1, "x", null],
            "state": "CA",
            "type": "shop.Person"
        })
    );
}

#[test]
fn untyped_numbers_widen_by_magnitude() {
    let codec = codec();
    let wire = json!([5, 3_000_000_000_i64, 18_000_000_000_000_000_000_u64, 2.5]);
    assert_eq!(
        codec.decode(&wire, &TypeRef::Any).unwrap(),
        Object::List(vec![
            Object::Int(5),
            Object::Long(3_000_000_000),
            Object::BigInteger(18_000_000_000_000_000_000),
            Object::Double(2.5),
        ])
    );
}

#[test]
fn declared_numeric_types_coerce_wire_numbers() {
    let codec = codec();
    assert_eq!(
        codec.decode(&json!(5), &TypeRef::Double).unwrap(),
        Object::Double(5.0)
    );
    assert_eq!(
        codec.decode(&json!(5), &TypeRef::BigDecimal).unwrap(),
        Object::BigDecimal(Decimal::new(5, 0))
    );
    assert_eq!(
        codec.decode(&json!("12345678901234567890.5"), &TypeRef::BigDecimal).unwrap(),
        Object::BigDecimal("12345678901234567890.5".parse().unwrap())
    );
}

#[test]
fn imprecise_decimals_travel_as_strings() {
    let codec = codec();
    let precise: Decimal = "12345678901234567890.5".parse().unwrap();
    let wire = codec
        .encode(&Object::BigDecimal(precise), PropertyPolicy::Whitelist)
        .unwrap();
    assert_eq!(wire, json!("12345678901234567890.5"));
    assert_eq!(
        codec
            .encode(&Object::BigDecimal(Decimal::new(1025, 2)), PropertyPolicy::Whitelist)
            .unwrap(),
        json!(10.25)
    );
}

#[test]
fn unknown_tags_are_rejected() {
    let codec = codec();
    let err = codec
        .decode(&json!({ "@class": "system.ProcessBuilder" }), &TypeRef::Any)
        .unwrap_err();
    assert!(matches!(err, MarshalError::Decode { .. }));
    assert!(matches!(err.root_cause(), MarshalError::UnknownTypeTag { tag } if tag == "system.ProcessBuilder"));
}

#[test]
fn unrelated_tag_for_declared_bean_is_rejected() {
    let codec = codec();
    let err = codec
        .decode(
            &json!({ "@class": "shop.Address", "street": "x" }),
            &TypeRef::bean("shop.Person"),
        )
        .unwrap_err();
    assert!(matches!(err.root_cause(), MarshalError::TagMismatch { .. }));
}

#[test]
fn unknown_enum_member_fails_instead_of_nulling() {
    let codec = codec();
    let err = codec
        .decode(
            &json!({ "street": "x", "state": "NOPE" }),
            &TypeRef::bean("shop.Address"),
        )
        .unwrap_err();
    match &err {
        MarshalError::Decode { source, .. } => match source.as_ref() {
            MarshalError::Property { type_name, property, .. } => {
                assert_eq!(type_name, "shop.Address");
                assert_eq!(property, "state");
            }
            other => panic!("expected property error, got {other:?}"),
        },
        other => panic!("expected decode error, got {other:?}"),
    }
    assert!(matches!(err.root_cause(), MarshalError::UnknownEnumMember { member, .. } if member == "NOPE"));
}

#[test]
fn malformed_dates_surface_as_one_wrapped_error() {
    let codec = codec();
    let err = codec
        .decode(
            &json!({ "@class": "courier.Date", "value": "yesterday" }),
            &TypeRef::Any,
        )
        .unwrap_err();
    let MarshalError::Decode { value, source } = &err else {
        panic!("expected decode error, got {err:?}");
    };
    assert!(value.contains("yesterday"));
    assert!(matches!(source.as_ref(), MarshalError::MalformedDate { .. }));
}

#[test]
fn constructor_failures_are_reported() {
    let codec = codec();
    let err = codec
        .decode(&json!({ "@class": "shop.Sealed", "value": "v" }), &TypeRef::Any)
        .unwrap_err();
    assert!(matches!(err.root_cause(), MarshalError::Construct { type_name, .. } if type_name == "shop.Sealed"));
}

#[test]
fn nesting_past_the_limit_fails() {
    let codec = codec_with(
        HookRegistry::new(),
        CodecSettings {
            max_depth: 3,
            pretty: false,
        },
    );
    assert!(codec.decode(&json!([[[1]]]), &TypeRef::Any).is_ok());
    let err = codec.decode(&json!([[[[1]]]]), &TypeRef::Any).unwrap_err();
    assert!(matches!(err.root_cause(), MarshalError::DepthExceeded { limit: 3 }));

    let deep = Object::List(vec![Object::List(vec![Object::List(vec![Object::List(
        vec![Object::Int(1)],
    )])])]);
    let err = codec.encode(&deep, PropertyPolicy::Blacklist).unwrap_err();
    assert!(matches!(err, MarshalError::DepthExceeded { limit: 3 }));
}

#[test]
fn unregistered_beans_cannot_be_encoded() {
    #[derive(Debug, Clone, PartialEq)]
    struct Stranger;

    let codec = codec();
    let err = codec
        .encode(&Object::bean(Stranger), PropertyPolicy::Blacklist)
        .unwrap_err();
    assert!(matches!(err, MarshalError::UnregisteredType { .. }));
}

#[test]
fn non_finite_doubles_cannot_be_encoded() {
    let codec = codec();
    let err = codec
        .encode(&Object::Double(f64::INFINITY), PropertyPolicy::Blacklist)
        .unwrap_err();
    assert!(matches!(err, MarshalError::NumericRange { .. }));
}

#[test]
fn nested_bean_failures_name_the_property() {
    let codec = codec();
    let err = codec
        .decode(
            &json!({ "name": "n", "address": { "state": "ZZ" } }),
            &TypeRef::bean("shop.Person"),
        )
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("shop.Person.address"), "{message}");
    assert!(message.contains("shop.Address.state"), "{message}");
}

#[test]
fn map_targets_drop_the_tag() {
    let codec = codec();
    let decoded = codec
        .decode(
            &json!({ "@class": "shop.Address", "street": "x" }),
            &TypeRef::Map,
        )
        .unwrap();
    let mut expected = BTreeMap::new();
    expected.insert("street".to_string(), Object::text("x"));
    assert_eq!(decoded, Object::Map(expected));
}
