//! Setup-time validation.

use std::thread;

use courier_codec::RegistryError;
use courier_dispatch::{
    Application, ConfigurationError, Interceptor, Plugin, RemoteMethod, RemoteType,
};
use courier_types::TypeRef;
use serde_json::json;

use crate::common::{account_spec, application, builder, overdrawn_spec};

#[test]
fn duplicate_remote_method_names_fail_the_build() {
    let err = Application::builder("ledger")
        .register_remote(
            RemoteType::new(account_spec())
                .method(RemoteMethod::static_method("open", [], |_| Ok(())))
                .method(RemoteMethod::static_method("open", [TypeRef::Text], |_| Ok(()))),
        )
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::DuplicateRemoteMethod { ref method, .. } if method == "open"
    ));
}

#[test]
fn duplicates_outside_the_application_are_tolerated() {
    let app = Application::builder("ledger")
        .register_remote(
            RemoteType::new(account_spec())
                .method(RemoteMethod::static_method("open", [], |_| Ok(())))
                .method(
                    RemoteMethod::static_method("open", [TypeRef::Text], |_| Ok(()))
                        .only_in(["admin"]),
                ),
        )
        .build();
    assert!(app.is_ok());
}

#[test]
fn calls_resolve_to_the_overload_eligible_in_the_application() {
    let service = || {
        RemoteType::named("ledger.Desk")
            .method(RemoteMethod::static_method("open", [], |_| Ok("admin")).only_in(["admin"]))
            .method(RemoteMethod::static_method("open", [], |_| Ok("public")))
            .method(RemoteMethod::static_method("lock", [], |_| Ok(())).only_in(["admin"]))
    };
    let app = Application::builder("ledger")
        .register_remote(service())
        .build()
        .unwrap();

    let envelope = app.invoke("ledger.Desk", "open", &json!({}));
    assert_eq!(envelope.exception, json!(null));
    assert_eq!(envelope.result, json!("public"));

    let refused = app.invoke("ledger.Desk", "lock", &json!({}));
    assert_eq!(refused.exception["kind"], json!("NotRemote"));
}

#[test]
fn duplicate_type_registrations_fail_the_build() {
    let err = builder("ledger")
        .register_type(overdrawn_spec())
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigurationError::Registry(RegistryError::DuplicateType { .. })
    ));
}

#[test]
fn instance_methods_need_a_registered_type() {
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Ghost;

    let err = Application::builder("ledger")
        .register_remote(
            RemoteType::named("ledger.Ghost")
                .method(RemoteMethod::instance("haunt", [], |_: &mut Ghost, _| Ok(()))),
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownRemoteType { .. }));

    let services = Application::builder("ledger")
        .register_remote(
            RemoteType::named("ledger.Clock")
                .method(RemoteMethod::static_method("now", [], |_| Ok(0_i64))),
        )
        .build()
        .unwrap();
    assert_eq!(
        services.invoke("ledger.Clock", "now", &json!({})).result,
        json!(0)
    );
}

struct Contributor;

impl Plugin for Contributor {
    fn name(&self) -> &str {
        "contributor"
    }

    fn build_interceptor(&self) -> Box<dyn Interceptor> {
        struct Passive;
        impl Interceptor for Passive {}
        Box::new(Passive)
    }

    fn remote_types(&self) -> Vec<RemoteType> {
        vec![RemoteType::named("ledger.Status").method(RemoteMethod::static_method(
            "version",
            [],
            |_| Ok("1.0"),
        ))]
    }
}

#[test]
fn plugins_contribute_remote_types() {
    let app = builder("ledger").register_plugin(Contributor).build().unwrap();
    assert_eq!(app.remote_types(), ["ledger.Account", "ledger.Status"]);
    let envelope = app.invoke("ledger.Status", "version", &json!({}));
    assert_eq!(envelope.result, json!("1.0"));
}

#[test]
fn applications_serve_calls_from_many_threads() {
    let app = application();
    thread::scope(|scope| {
        for n in 0..4 {
            let app = &app;
            scope.spawn(move || {
                let envelope = app.invoke(
                    "ledger.Account",
                    "open",
                    &json!({ "arguments": [format!("T-{n}")] }),
                );
                assert_eq!(envelope.result["number"], json!(format!("T-{n}")));
            });
        }
    });
}
