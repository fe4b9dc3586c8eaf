//! A small ledger application and recording interceptors.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use courier_codec::TypeSpec;
use courier_dispatch::{
    Application, ApplicationBuilder, Fault, Interceptor, InvocationContext, Plugin, RemoteMethod,
    RemoteType,
};
use courier_types::{Decimal, Object, TypeRef, bean_conversions};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub number: String,
    pub balance: Decimal,
    pub closed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overdrawn {
    pub message: String,
    pub shortfall: Decimal,
}

bean_conversions!(Account, Overdrawn);

pub fn account_spec() -> TypeSpec<Account> {
    TypeSpec::<Account>::new("ledger.Account")
        .include_all()
        .property(
            "number",
            TypeRef::Text,
            |a| a.number.clone(),
            |a, v| a.number = v,
        )
        .property(
            "balance",
            TypeRef::BigDecimal,
            |a| a.balance,
            |a, v| a.balance = v,
        )
        .property("closed", TypeRef::Bool, |a| a.closed, |a, v| a.closed = v)
}

pub fn overdrawn_spec() -> TypeSpec<Overdrawn> {
    TypeSpec::<Overdrawn>::new("ledger.Overdrawn")
        .error_shaped()
        .property(
            "message",
            TypeRef::Text,
            |e| e.message.clone(),
            |e, v| e.message = v,
        )
        .property(
            "shortfall",
            TypeRef::BigDecimal,
            |e| e.shortfall,
            |e, v| e.shortfall = v,
        )
}

pub fn account_type() -> RemoteType {
    RemoteType::new(account_spec())
        .method(RemoteMethod::static_method(
            "open",
            [TypeRef::Text],
            |args| {
                Ok(Account {
                    number: args.next()?,
                    ..Account::default()
                })
            },
        ))
        .method(RemoteMethod::static_method("ping", [], |_| Ok(())))
        .method(RemoteMethod::instance(
            "deposit",
            [TypeRef::BigDecimal],
            |account: &mut Account, args| {
                let amount: Decimal = args.next()?;
                account.balance += amount;
                Ok(account.balance)
            },
        ))
        .method(RemoteMethod::instance(
            "withdraw",
            [TypeRef::BigDecimal],
            |account: &mut Account, args| {
                let amount: Decimal = args.next()?;
                if amount > account.balance {
                    return Err(Fault::raise(Overdrawn {
                        message: format!("Account {} is overdrawn", account.number),
                        shortfall: amount - account.balance,
                    }));
                }
                account.balance -= amount;
                Ok(account.balance)
            },
        ))
        .method(RemoteMethod::instance(
            "close",
            [],
            |account: &mut Account, _| {
                account.closed = true;
                Ok(())
            },
        ))
        .method(
            RemoteMethod::instance("audit", [], |account: &mut Account, _| {
                Ok(format!("{} holds {}", account.number, account.balance))
            })
            .only_in(["admin"]),
        )
        .method(
            RemoteMethod::instance("purge", [], |_: &mut Account, _| Ok(())).not_remote(),
        )
}

pub fn builder(name: &str) -> ApplicationBuilder {
    Application::builder(name)
        .register_type(overdrawn_spec())
        .register_remote(account_type())
}

pub fn application() -> Application {
    builder("ledger").build().unwrap()
}

pub fn account(number: &str, balance: i64) -> Account {
    Account {
        number: number.into(),
        balance: Decimal::new(balance, 0),
        closed: false,
    }
}

pub fn account_object(number: &str, balance: i64) -> Object {
    Object::bean(account(number, balance))
}

// ============================================================================
// Recording interceptors
// ============================================================================

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Where a [`Recorder`] interceptor raises instead of passing through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nowhere,
    Before,
    Success,
}

/// Plugin whose interceptors append `label.hook` to a shared journal.
pub struct Recorder {
    pub label: &'static str,
    pub journal: Journal,
    pub fail_at: FailAt,
}

impl Recorder {
    pub fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            journal: Arc::clone(journal),
            fail_at: FailAt::Nowhere,
        }
    }

    pub fn failing_at(mut self, fail_at: FailAt) -> Self {
        self.fail_at = fail_at;
        self
    }
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        self.label
    }

    fn build_interceptor(&self) -> Box<dyn Interceptor> {
        Box::new(Recording {
            label: self.label,
            journal: Arc::clone(&self.journal),
            fail_at: self.fail_at,
        })
    }
}

struct Recording {
    label: &'static str,
    journal: Journal,
    fail_at: FailAt,
}

impl Recording {
    fn record(&self, hook: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}.{hook}", self.label));
    }
}

impl Interceptor for Recording {
    fn before_invocation(&mut self, _context: &mut InvocationContext) -> Result<(), Fault> {
        self.record("before");
        if self.fail_at == FailAt::Before {
            return Err(Fault::raise(format!("{} refused", self.label)));
        }
        Ok(())
    }

    fn replace_target(
        &mut self,
        _context: &mut InvocationContext,
        target: Object,
    ) -> Result<Object, Fault> {
        self.record("replaceTarget");
        Ok(target)
    }

    fn prepare_arguments(
        &mut self,
        _context: &mut InvocationContext,
        _target: Option<&Object>,
        arguments: Vec<Object>,
    ) -> Result<Vec<Object>, Fault> {
        self.record("prepareArgs");
        Ok(arguments)
    }

    fn replace_result(
        &mut self,
        _context: &mut InvocationContext,
        result: Object,
    ) -> Result<Object, Fault> {
        self.record("replaceResult");
        Ok(result)
    }

    fn on_success(
        &mut self,
        _context: &mut InvocationContext,
        _target: Option<&Object>,
        _result: &Object,
    ) -> Result<(), Fault> {
        self.record("onSuccess");
        if self.fail_at == FailAt::Success {
            return Err(Fault::raise(format!("{} rolled back", self.label)));
        }
        Ok(())
    }

    fn on_failure(&mut self, _context: &mut InvocationContext, fault: Fault) -> Fault {
        self.record("onFailure");
        fault
    }
}
