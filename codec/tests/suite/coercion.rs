//! Coercion as seen through the codec.

use courier_codec::MarshalError;
use courier_types::{Decimal, Object, TypeRef};
use pretty_assertions::assert_eq;

use crate::common::{Customer, codec};

#[test]
fn five_becomes_five_point_zero() {
    let codec = codec();
    let decimal = codec.coerce(Object::Int(5), &TypeRef::BigDecimal).unwrap();
    assert_eq!(decimal, Object::BigDecimal(Decimal::new(50, 1)));
    assert_eq!(decimal.to_string(), "5.0");
    assert_eq!(
        codec.coerce(Object::Int(5), &TypeRef::Double).unwrap(),
        Object::Double(5.0)
    );
}

#[test]
fn enum_coercion_failure_is_an_error() {
    let codec = codec();
    let err = codec
        .coerce(Object::text("NOPE"), &TypeRef::enumeration("shop.State"))
        .unwrap_err();
    assert!(matches!(err, MarshalError::UnknownEnumMember { .. }));
}

#[test]
fn property_writes_coerce_through_the_registry() {
    let codec = codec();
    let registry = codec.registry();
    let mut customer = Object::bean(Customer::default());

    registry
        .write_property(&mut customer, "balance", Object::Int(5))
        .unwrap();
    registry
        .write_property(
            &mut customer,
            "tags",
            Object::List(vec![Object::text("b"), Object::text("a"), Object::text("b")]),
        )
        .unwrap();
    registry
        .write_property(&mut customer, "code", Object::text("QZ"))
        .unwrap();

    let customer = customer.into_bean::<Customer>().unwrap();
    assert_eq!(customer.balance, Decimal::new(5, 0));
    assert_eq!(
        customer.tags.into_iter().collect::<Vec<_>>(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert_eq!(customer.code, "QZ");
}

#[test]
fn registry_accepts_subtypes_only() {
    let codec = codec();
    let registry = codec.registry();
    let customer = Object::bean(Customer::default());
    assert!(registry.accepts(&TypeRef::bean("shop.Person"), &customer));
    assert!(!registry.accepts(&TypeRef::bean("shop.Address"), &customer));
    assert!(registry.accepts(&TypeRef::Any, &customer));
    assert!(!registry.accepts(&TypeRef::Int, &Object::text("5")));
}
