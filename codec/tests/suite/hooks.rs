//! Serialization and deserialization substitution hooks.

use std::collections::BTreeMap;

use courier_codec::{
    CodecSettings, EncodeContext, HookRegistry, MarshalError, PropertyPolicy,
};
use courier_types::{Object, TypeRef};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::common::{Address, State, codec_with};

/// Streets already written during one encode call.
#[derive(Debug, Default)]
struct Written(Vec<String>);

fn reference_stubs(value: &Object, context: &mut EncodeContext) -> Result<Option<Object>, MarshalError> {
    let Some(address) = value.as_bean::<Address>() else {
        return Ok(None);
    };
    let written = context.state::<Written>();
    if written.0.contains(&address.street) {
        let mut stub = BTreeMap::new();
        stub.insert("ref".to_string(), Object::text(address.street.clone()));
        return Ok(Some(Object::Map(stub)));
    }
    written.0.push(address.street.clone());
    Ok(None)
}

fn resolve_stubs(decoded: Object, wire: &Value) -> Result<Object, MarshalError> {
    match wire.get("ref").and_then(Value::as_str) {
        Some(street) => Ok(Object::bean(Address {
            street: street.to_string(),
            state: Some(State::TX),
        })),
        None => Ok(decoded),
    }
}

fn hooked_codec() -> courier_codec::Codec {
    codec_with(
        HookRegistry::new()
            .with_serializer(reference_stubs)
            .with_deserializer(resolve_stubs),
        CodecSettings::default(),
    )
}

#[test]
fn serialization_hooks_share_state_within_one_call() {
    let codec = hooked_codec();
    let address = Address {
        street: "1 Main St".into(),
        state: Some(State::NY),
    };
    let value = Object::List(vec![Object::bean(address.clone()), Object::bean(address)]);

    let wire = codec.encode(&value, PropertyPolicy::Whitelist).unwrap();
    assert_eq!(
        wire,
        json!([
            { "@class": "shop.Address", "street": "1 Main St", "state": "NY" },
            { "ref": "1 Main St" }
        ])
    );

    // A fresh call starts with fresh hook state.
    let single = codec
        .encode(&Object::bean(Address::default()), PropertyPolicy::Whitelist)
        .unwrap();
    assert_eq!(single["@class"], json!("shop.Address"));
}

#[test]
fn deserialization_hooks_see_the_wire_value() {
    let codec = hooked_codec();
    let decoded = codec
        .decode(&json!({ "ref": "9 Hidden Rd" }), &TypeRef::bean("shop.Address"))
        .unwrap();
    assert_eq!(
        decoded.into_bean::<Address>().unwrap(),
        Address {
            street: "9 Hidden Rd".into(),
            state: Some(State::TX),
        }
    );
}

#[test]
fn hooks_skip_null() {
    let codec = codec_with(
        HookRegistry::new().with_serializer(
            |_: &Object, _: &mut EncodeContext| -> Result<Option<Object>, MarshalError> {
                Ok(Some(Object::text("replaced")))
            },
        ),
        CodecSettings::default(),
    );
    assert_eq!(
        codec.encode(&Object::Null, PropertyPolicy::Whitelist).unwrap(),
        Value::Null
    );
    assert_eq!(
        codec.encode(&Object::Int(1), PropertyPolicy::Whitelist).unwrap(),
        json!("replaced")
    );
}
