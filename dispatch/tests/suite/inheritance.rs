//! Methods declared on a parent type, invoked on subtype targets.

use courier_codec::TypeSpec;
use courier_dispatch::{
    Application, Call, DispatchError, Fault, Outcome, RemoteMethod, RemoteType,
};
use courier_types::{Object, TypeRef, bean_conversions};
use pretty_assertions::assert_eq;
use serde_json::json;

#[derive(Debug, Clone, Default, PartialEq)]
struct Person {
    name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Customer {
    person: Person,
    visits: i32,
}

bean_conversions!(Person, Customer);

fn application() -> Application {
    let person = TypeSpec::<Person>::new("crm.Person").include_all().property(
        "name",
        TypeRef::Text,
        |p| p.name.clone(),
        |p, v| p.name = v,
    );
    let customer = TypeSpec::<Customer>::new("crm.Customer")
        .include_all()
        .extends(&person, |c| &c.person, |c| &mut c.person)
        .property("visits", TypeRef::Int, |c| c.visits, |c, v| c.visits = v);

    Application::builder("crm")
        .register_type(customer)
        .register_remote(
            RemoteType::new(person)
                .method(RemoteMethod::instance("greet", [], |person: &mut Person, _| {
                    Ok(format!("Hello, {}", person.name))
                }))
                .method(RemoteMethod::instance(
                    "rename",
                    [TypeRef::Text],
                    |person: &mut Person, args| {
                        person.name = args.next()?;
                        Ok(person.name.clone())
                    },
                )),
        )
        .build()
        .unwrap()
}

#[test]
fn parent_methods_accept_tagged_subtype_targets() {
    let app = application();
    let envelope = app.invoke(
        "crm.Person",
        "greet",
        &json!({ "target": { "@class": "crm.Customer", "name": "Ada", "visits": 3 } }),
    );
    assert_eq!(envelope.exception, json!(null));
    assert_eq!(envelope.result, json!("Hello, Ada"));
}

#[test]
fn parent_methods_act_on_the_inherited_part() {
    let app = application();
    let target = Object::bean(Customer {
        person: Person {
            name: "Ada".into(),
        },
        visits: 3,
    });
    let outcome = app.dispatch(
        "crm.Person",
        "rename",
        Call::on(target).with_argument(Object::text("Grace")),
    );
    let Outcome::Success(result) = outcome else {
        panic!("expected the rename to succeed");
    };
    assert_eq!(result, Object::text("Grace"));
}

#[test]
fn targets_outside_the_hierarchy_are_still_rejected() {
    let app = application();
    let outcome = app.dispatch("crm.Person", "greet", Call::on(Object::text("Ada")));
    assert!(matches!(
        outcome,
        Outcome::Failure(Fault::Dispatch(DispatchError::TargetType { .. }))
    ));
}
