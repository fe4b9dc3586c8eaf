//! Demonstration bank served by the `courier` binary.
//!
//! ```text
//! bank.Bank     static  states(), branch(name, address)
//! bank.Branch           openAccount(customer), auditTrail() [admin only]
//! bank.Account          deposit(amount), withdraw(amount), close()
//! ```
//!
//! Mutating calls run inside a ledger transaction that commits when the call
//! succeeds and rolls back when it fails.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use courier_codec::TypeSpec;
use courier_dispatch::{
    Application, ApplicationBuilder, Fault, Interceptor, InvocationContext, Plugin, RemoteError,
    RemoteMethod, RemoteType,
};
use courier_types::{Date, Decimal, Object, TypeRef, Uuid, bean_conversions, remote_enum};
use parking_lot::Mutex;
use tracing::info;

remote_enum! {
    pub enum State as "bank.State" { CA, NY, TX }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: Option<State>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub person: Person,
    pub ssn: String,
    pub age: i32,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branch {
    pub name: String,
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub owner: Option<Customer>,
    pub branch: String,
    pub number: Option<Uuid>,
    pub date_opened: Option<Date>,
    pub date_closed: Option<Date>,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountClosedError {
    pub message: String,
}

bean_conversions!(Address, Person, Customer, Branch, Account, AccountClosedError);

impl Account {
    fn ensure_open(&self) -> Result<(), Fault> {
        match self.date_closed {
            Some(closed) => Err(Fault::raise(AccountClosedError {
                message: format!("This account was already closed on {closed}"),
            })),
            None => Ok(()),
        }
    }
}

fn positive(amount: Decimal) -> Result<Decimal, Fault> {
    if amount <= Decimal::ZERO {
        return Err(Fault::raise(RemoteError::new(
            "InvalidAmount",
            format!("Amount must be positive, got {amount}"),
        )));
    }
    Ok(amount)
}

// ============================================================================
// Type registrations
// ============================================================================

fn address_spec() -> TypeSpec<Address> {
    TypeSpec::<Address>::new("bank.Address")
        .include_all()
        .property(
            "street",
            TypeRef::Text,
            |a| a.street.clone(),
            |a, v| a.street = v,
        )
        .property("city", TypeRef::Text, |a| a.city.clone(), |a, v| a.city = v)
        .property(
            "state",
            TypeRef::enumeration("bank.State"),
            |a| a.state,
            |a, v| a.state = v,
        )
}

fn person_spec() -> TypeSpec<Person> {
    TypeSpec::<Person>::new("bank.Person")
        .property(
            "firstName",
            TypeRef::Text,
            |p| p.first_name.clone(),
            |p, v| p.first_name = v,
        )
        .include()
        .property(
            "lastName",
            TypeRef::Text,
            |p| p.last_name.clone(),
            |p, v| p.last_name = v,
        )
        .include()
}

fn customer_spec(person: &TypeSpec<Person>) -> TypeSpec<Customer> {
    TypeSpec::<Customer>::new("bank.Customer")
        .extends(person, |c| &c.person, |c| &mut c.person)
        .property("ssn", TypeRef::Text, |c| c.ssn.clone(), |c, v| c.ssn = v)
        .exclude()
        .property("age", TypeRef::Int, |c| c.age, |c, v| c.age = v)
        .include()
        .property(
            "address",
            TypeRef::bean("bank.Address"),
            |c| c.address.clone(),
            |c, v| c.address = v,
        )
        .include()
}

fn branch_spec() -> TypeSpec<Branch> {
    TypeSpec::<Branch>::new("bank.Branch")
        .include_all()
        .property("name", TypeRef::Text, |b| b.name.clone(), |b, v| b.name = v)
        .property(
            "address",
            TypeRef::bean("bank.Address"),
            |b| b.address.clone(),
            |b, v| b.address = v,
        )
}

fn account_spec() -> TypeSpec<Account> {
    TypeSpec::<Account>::new("bank.Account")
        .include_all()
        .property(
            "owner",
            TypeRef::bean("bank.Customer"),
            |a| a.owner.clone(),
            |a, v| a.owner = v,
        )
        .property(
            "branch",
            TypeRef::Text,
            |a| a.branch.clone(),
            |a, v| a.branch = v,
        )
        .property("number", TypeRef::Uuid, |a| a.number, |a, v| a.number = v)
        .property(
            "dateOpened",
            TypeRef::Date,
            |a| a.date_opened,
            |a, v| a.date_opened = v,
        )
        .property(
            "dateClosed",
            TypeRef::Date,
            |a| a.date_closed,
            |a, v| a.date_closed = v,
        )
        .property(
            "balance",
            TypeRef::BigDecimal,
            |a| a.balance,
            |a, v| a.balance = v,
        )
        .getter("isClosed", TypeRef::Bool, |a| a.date_closed.is_some())
}

fn account_closed_spec() -> TypeSpec<AccountClosedError> {
    TypeSpec::<AccountClosedError>::new("bank.AccountClosedError")
        .error_shaped()
        .property(
            "message",
            TypeRef::Text,
            |e| e.message.clone(),
            |e, v| e.message = v,
        )
}

// ============================================================================
// Remote methods
// ============================================================================

fn bank_type() -> RemoteType {
    RemoteType::named("bank.Bank")
        .method(RemoteMethod::static_method("states", [], |_| {
            Ok(vec![State::CA, State::NY, State::TX])
        }))
        .method(RemoteMethod::static_method(
            "branch",
            [TypeRef::Text, TypeRef::bean("bank.Address")],
            |args| {
                Ok(Branch {
                    name: args.next()?,
                    address: args.next()?,
                })
            },
        ))
}

fn branch_type(ledger: &Arc<Ledger>) -> RemoteType {
    let ledger = Arc::clone(ledger);
    RemoteType::new(branch_spec())
        .method(RemoteMethod::instance(
            "openAccount",
            [TypeRef::bean("bank.Customer")],
            |branch: &mut Branch, args| {
                let owner: Customer = args.next()?;
                Ok(Account {
                    owner: Some(owner),
                    branch: branch.name.clone(),
                    number: Some(Uuid::new_v4()),
                    date_opened: Some(Utc::now().fixed_offset()),
                    ..Account::default()
                })
            },
        ))
        .method(
            RemoteMethod::instance("auditTrail", [], move |_: &mut Branch, _| {
                Ok(ledger.entries())
            })
            .only_in(["admin"]),
        )
}

fn account_type() -> RemoteType {
    RemoteType::new(account_spec())
        .method(RemoteMethod::instance(
            "deposit",
            [TypeRef::BigDecimal],
            |account: &mut Account, args| {
                account.ensure_open()?;
                account.balance += positive(args.next()?)?;
                Ok(account.clone())
            },
        ))
        .method(RemoteMethod::instance(
            "withdraw",
            [TypeRef::BigDecimal],
            |account: &mut Account, args| {
                account.ensure_open()?;
                let amount = positive(args.next()?)?;
                if amount > account.balance {
                    return Err(Fault::raise(RemoteError::new(
                        "InsufficientFunds",
                        format!("Balance {} does not cover {amount}", account.balance),
                    )));
                }
                account.balance -= amount;
                Ok(account.clone())
            },
        ))
        .method(RemoteMethod::instance(
            "close",
            [],
            |account: &mut Account, _| {
                account.ensure_open()?;
                account.date_closed = Some(Utc::now().fixed_offset());
                Ok(account.clone())
            },
        ))
}

/// Registers the bank's types, methods and transaction plugin.
pub fn builder(name: &str, ledger: &Arc<Ledger>) -> ApplicationBuilder {
    let person = person_spec();
    let customer = customer_spec(&person);
    Application::builder(name)
        .register_enum::<State>()
        .register_type(address_spec())
        .register_type(person)
        .register_type(customer)
        .register_type(account_closed_spec())
        .register_remote(bank_type())
        .register_remote(branch_type(ledger))
        .register_remote(account_type())
        .register_plugin(TransactionPlugin::new(
            Arc::clone(ledger),
            [
                ("bank.Branch", "openAccount"),
                ("bank.Account", "deposit"),
                ("bank.Account", "withdraw"),
                ("bank.Account", "close"),
            ],
        ))
}

// ============================================================================
// Transactions
// ============================================================================

/// Append-only journal of transaction boundaries.
#[derive(Debug, Default)]
pub struct Ledger {
    next_id: AtomicU64,
    entries: Mutex<Vec<String>>,
}

impl Ledger {
    fn begin(&self, scope: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.record(format!("begin #{id} {scope}"));
        id
    }

    fn commit(&self, id: u64) {
        self.record(format!("commit #{id}"));
    }

    fn rollback(&self, id: u64) {
        self.record(format!("rollback #{id}"));
    }

    fn record(&self, entry: String) {
        info!(target: "courier::ledger", "{entry}");
        self.entries.lock().push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// The transaction open for the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionId(pub u64);

/// Wraps selected methods in a ledger transaction.
pub struct TransactionPlugin {
    ledger: Arc<Ledger>,
    requires: Arc<BTreeSet<(String, String)>>,
}

impl TransactionPlugin {
    pub fn new<'a>(
        ledger: Arc<Ledger>,
        methods: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let requires = methods
            .into_iter()
            .map(|(type_name, method)| (type_name.to_string(), method.to_string()))
            .collect();
        Self {
            ledger,
            requires: Arc::new(requires),
        }
    }
}

impl Plugin for TransactionPlugin {
    fn name(&self) -> &str {
        "transactions"
    }

    fn build_interceptor(&self) -> Box<dyn Interceptor> {
        Box::new(TransactionInterceptor {
            ledger: Arc::clone(&self.ledger),
            requires: Arc::clone(&self.requires),
            current: None,
        })
    }
}

struct TransactionInterceptor {
    ledger: Arc<Ledger>,
    requires: Arc<BTreeSet<(String, String)>>,
    current: Option<u64>,
}

impl Interceptor for TransactionInterceptor {
    fn before_invocation(&mut self, context: &mut InvocationContext) -> Result<(), Fault> {
        let key = (context.type_name().to_string(), context.method().to_string());
        if self.requires.contains(&key) {
            let id = self
                .ledger
                .begin(&format!("{}.{}", context.type_name(), context.method()));
            self.current = Some(id);
            context.extensions_mut().insert(TransactionId(id));
        }
        Ok(())
    }

    fn on_success(
        &mut self,
        context: &mut InvocationContext,
        _target: Option<&Object>,
        _result: &Object,
    ) -> Result<(), Fault> {
        if let Some(id) = self.current.take() {
            self.ledger.commit(id);
            context.extensions_mut().remove::<TransactionId>();
        }
        Ok(())
    }

    fn on_failure(&mut self, context: &mut InvocationContext, fault: Fault) -> Fault {
        if let Some(id) = self.current.take() {
            self.ledger.rollback(id);
            context.extensions_mut().remove::<TransactionId>();
        }
        fault
    }
}
