//! Application-scoped method eligibility.

use courier_dispatch::{Call, DispatchError, Fault, Outcome};
use courier_types::Object;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{account_object, application, builder};

#[test]
fn restricted_methods_are_refused_outside_their_application() {
    let public = builder("public").build().unwrap();
    let envelope = public.invoke(
        "ledger.Account",
        "audit",
        &json!({ "target": { "number": "A-1" } }),
    );
    assert_eq!(envelope.exception["kind"], json!("NotRemote"));
    assert_eq!(
        envelope.exception["message"],
        json!("Method audit on type ledger.Account is not remotely executable")
    );
}

#[test]
fn restricted_methods_run_inside_their_application() {
    let admin = builder("admin").build().unwrap();
    let outcome = admin.dispatch("ledger.Account", "audit", Call::on(account_object("A-1", 7)));
    let Outcome::Success(Object::Text(summary)) = outcome else {
        panic!("expected a text result");
    };
    assert_eq!(summary, "A-1 holds 7");
}

#[test]
fn non_remote_methods_are_never_callable() {
    let admin = builder("admin").build().unwrap();
    let outcome = admin.dispatch("ledger.Account", "purge", Call::on(account_object("A-1", 0)));
    assert!(matches!(
        outcome,
        Outcome::Failure(Fault::Dispatch(DispatchError::NotRemote { .. }))
    ));
}

#[test]
fn listings_hide_methods_the_application_cannot_call() {
    let names = |app: &courier_dispatch::Application| -> Vec<String> {
        app.remote_methods("ledger.Account")
            .into_iter()
            .map(|method| method.name().to_string())
            .collect()
    };
    assert_eq!(
        names(&application()),
        ["open", "ping", "deposit", "withdraw", "close"]
    );
    assert_eq!(
        names(&builder("admin").build().unwrap()),
        ["open", "ping", "deposit", "withdraw", "close", "audit"]
    );
    assert_eq!(application().remote_types(), ["ledger.Account"]);
    assert!(application().remote_methods("ledger.Vault").is_empty());
}
