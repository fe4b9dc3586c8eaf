//! Encode/decode round trips and inclusion policies.

use std::collections::BTreeSet;

use courier_codec::PropertyPolicy;
use courier_types::{Object, TypeRef};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{Customer, Person, Preferences, Rejection, codec, sample_customer};

#[test]
fn blacklist_round_trip_preserves_non_excluded_properties() {
    let codec = codec();
    let original = sample_customer();

    let wire = codec
        .encode(&Object::bean(original.clone()), PropertyPolicy::Blacklist)
        .unwrap();
    let decoded = codec.decode(&wire, &TypeRef::bean("shop.Customer")).unwrap();

    let mut expected = original;
    expected.person.password = String::new();
    assert_eq!(decoded.into_bean::<Customer>().unwrap(), expected);
}

#[test]
fn tagged_map_decodes_to_tagged_type_without_target() {
    let codec = codec();
    let wire = codec
        .encode(&Object::bean(sample_customer()), PropertyPolicy::Blacklist)
        .unwrap();

    let decoded = codec.decode(&wire, &TypeRef::Any).unwrap();
    let bean = decoded.as_remotable().unwrap();
    assert_eq!(codec.registry().type_name_of(bean), Some("shop.Customer"));
}

#[test]
fn subtype_tag_wins_over_declared_parent() {
    let codec = codec();
    let wire = json!({ "@class": "shop.Customer", "name": "Grace", "visits": 2 });
    let decoded = codec.decode(&wire, &TypeRef::bean("shop.Person")).unwrap();
    let customer = decoded.into_bean::<Customer>().unwrap();
    assert_eq!(customer.person.name, "Grace");
    assert_eq!(customer.visits, 2);
}

#[test]
fn whitelist_keys_are_a_subset_of_blacklist_keys() {
    let codec = codec();
    let value = Object::bean(sample_customer());
    let whitelist = codec.encode(&value, PropertyPolicy::Whitelist).unwrap();
    let blacklist = codec.encode(&value, PropertyPolicy::Blacklist).unwrap();

    let keys = |wire: &serde_json::Value| -> BTreeSet<String> {
        wire.as_object().unwrap().keys().cloned().collect()
    };
    let whitelist_keys = keys(&whitelist);
    let blacklist_keys = keys(&blacklist);

    assert!(whitelist_keys.is_subset(&blacklist_keys));
    let expected: BTreeSet<String> = ["@class", "address", "balance", "id", "name"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(whitelist_keys, expected);
    assert!(!blacklist_keys.contains("password"));
}

#[test]
fn error_message_is_whitelisted() {
    let codec = codec();
    let rejection = Rejection {
        message: "insufficient funds".into(),
        code: 7,
    };
    let wire = codec
        .encode(&Object::bean(rejection), PropertyPolicy::Whitelist)
        .unwrap();
    assert_eq!(
        wire,
        json!({ "@class": "shop.Rejection", "message": "insufficient funds" })
    );
}

#[test]
fn null_entries_clear_optional_properties() {
    let codec = codec();
    let original = Preferences {
        theme: None,
        font_size: 14,
    };

    let wire = codec
        .encode(&Object::bean(original.clone()), PropertyPolicy::Blacklist)
        .unwrap();
    assert_eq!(
        wire,
        json!({ "@class": "shop.Preferences", "theme": null, "fontSize": 14 })
    );
    let decoded = codec
        .decode(&wire, &TypeRef::Any)
        .unwrap()
        .into_bean::<Preferences>()
        .unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn null_entries_keep_defaults_of_non_optional_fields() {
    let codec = codec();
    let decoded = codec
        .decode(
            &json!({ "@class": "shop.Preferences", "fontSize": null }),
            &TypeRef::Any,
        )
        .unwrap()
        .into_bean::<Preferences>()
        .unwrap();
    assert_eq!(decoded, Preferences::default());
}

#[test]
fn null_entries_on_non_optional_fields_and_unknown_keys_are_ignored() {
    let codec = codec();
    let wire = json!({
        "@class": "shop.Person",
        "name": null,
        "address": null,
        "favouriteColour": "green"
    });
    let person = codec
        .decode(&wire, &TypeRef::Any)
        .unwrap()
        .into_bean::<Person>()
        .unwrap();
    assert_eq!(person, Person::default());
}

#[test]
fn untagged_map_binds_to_declared_type() {
    let codec = codec();
    let wire = json!({ "name": "Linus", "address": { "street": "3 Elm", "state": "TX" } });
    let person = codec
        .decode(&wire, &TypeRef::bean("shop.Person"))
        .unwrap()
        .into_bean::<Person>()
        .unwrap();
    assert_eq!(person.name, "Linus");
    let address = person.address.unwrap();
    assert_eq!(address.street, "3 Elm");
    assert_eq!(address.state, Some(crate::common::State::TX));
}

#[test]
fn json_text_entry_points_round_trip() {
    let codec = codec();
    let text = codec
        .to_json_string(&Object::bean(sample_customer()), PropertyPolicy::Blacklist)
        .unwrap();
    let decoded = codec.from_json_str(&text, &TypeRef::Any).unwrap();
    let customer = decoded.into_bean::<Customer>().unwrap();
    assert_eq!(customer.person.name, "Ada");
    assert_eq!(customer.code, "AX");
}
