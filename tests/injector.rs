mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use rinject::{
    registrable, ConstructError, Injectable, Injector, InjectorConfig, InjectorError, Provider,
    Registrable, TypeKey,
};

use common::capture_logs;

#[registrable]
trait Mailer: Send + Sync {
    fn send(&self, to: &str) -> String;
}

#[derive(Registrable, Injectable)]
struct SmtpMailer;

impl Mailer for SmtpMailer {
    fn send(&self, to: &str) -> String {
        format!("smtp:{to}")
    }
}

#[derive(Registrable, Injectable)]
struct Notifier {
    #[inject]
    mailer: Arc<dyn Mailer>,
}

#[registrable]
trait Clock: Send + Sync {
    fn tick(&self) -> usize;
}

struct Counter(usize);

impl Clock for Counter {
    fn tick(&self) -> usize {
        self.0
    }
}

#[derive(Registrable)]
struct ClockProvider {
    produced: AtomicUsize,
}

impl Injectable for ClockProvider {
    type Dependencies = ();

    fn construct(_: ()) -> Result<Self, ConstructError> {
        Ok(ClockProvider {
            produced: AtomicUsize::new(0),
        })
    }
}

impl Provider<dyn Clock> for ClockProvider {
    fn get(&self) -> Arc<dyn Clock> {
        Arc::new(Counter(self.produced.fetch_add(1, Ordering::SeqCst) + 1))
    }
}

mod billing {
    pub struct Service(pub &'static str);
    impl rinject::Registrable for Service {}
}

mod shipping {
    pub struct Service(pub &'static str);
    impl rinject::Registrable for Service {}
}

#[test]
fn repeated_resolution_returns_same_instance() {
    let injector = Injector::new();
    injector.register_singleton_as::<SmtpMailer, dyn Mailer>(|mailer| mailer);
    injector.register_singleton::<Notifier>();

    let first = injector.get_instance::<Notifier>().unwrap();
    let second = injector.get_instance::<Notifier>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(
        &first.mailer,
        &injector.get_instance::<dyn Mailer>().unwrap()
    ));
    assert_eq!(first.mailer.send("ops"), "smtp:ops");
}

#[test]
fn has_instance_leaves_cache_empty() {
    let injector = Injector::new();
    injector.register_singleton::<SmtpMailer>();
    injector.register_singleton::<Notifier>();

    assert!(injector.has_instance::<Notifier>());
    assert!(!injector.has_instance::<dyn Mailer>());
    assert_eq!(injector.singletons().constructed_count(), 0);
}

#[test]
fn same_implementation_under_two_keys_is_one_instance() {
    let injector = Injector::new();
    injector.register_singleton::<SmtpMailer>();
    injector.register_singleton_as::<SmtpMailer, dyn Mailer>(|mailer| mailer);

    let concrete = injector.get_instance::<SmtpMailer>().unwrap();
    let mapped = injector.get_instance::<dyn Mailer>().unwrap();

    assert_eq!(injector.singletons().constructed_count(), 1);
    assert_eq!(
        Arc::as_ptr(&concrete) as *const u8,
        Arc::as_ptr(&mapped) as *const u8
    );
}

#[test]
fn provider_value_is_returned_and_provider_is_singleton() {
    let injector = Injector::new();
    injector.register_singleton_provider::<ClockProvider, dyn Clock>();

    assert_eq!(injector.get_instance::<dyn Clock>().unwrap().tick(), 1);
    assert_eq!(injector.get_instance::<dyn Clock>().unwrap().tick(), 2);

    let provider = injector.get_instance::<ClockProvider>().unwrap();
    assert!(Arc::ptr_eq(
        &provider,
        &injector.get_instance::<ClockProvider>().unwrap()
    ));
    assert_eq!(provider.produced.load(Ordering::SeqCst), 2);
}

#[test]
fn eager_initialization_follows_registration_order() {
    let injector = Injector::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = order.clone();
    injector.register_singleton_with(move || {
        log.lock().push("shipping");
        Ok(shipping::Service("ship"))
    });
    let log = order.clone();
    injector.register_singleton_with(move || {
        log.lock().push("smtp");
        Ok(SmtpMailer)
    });
    injector.register_singleton::<Notifier>();
    injector.register_singleton_as::<SmtpMailer, dyn Mailer>(|mailer| mailer);

    injector.initialize_singleton_instances().unwrap();

    assert_eq!(*order.lock(), vec!["shipping", "smtp"]);
    assert!(injector.singletons().is_constructed::<Notifier>());
    assert_eq!(
        injector.registered_keys(),
        vec![
            TypeKey::of::<shipping::Service>(),
            TypeKey::of::<SmtpMailer>(),
            TypeKey::of::<Notifier>(),
            TypeKey::of::<dyn Mailer>(),
        ]
    );
}

#[test]
fn failed_construction_is_logged_and_retried() {
    let injector = Injector::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    injector.register_singleton_with(move || {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            Err("smtp relay unreachable".into())
        } else {
            Ok(SmtpMailer)
        }
    });

    let (first, logs) = capture_logs(|| injector.get_instance::<SmtpMailer>());
    match first {
        Err(InjectorError::Construction { implementation, source }) => {
            assert!(implementation.ends_with("SmtpMailer"));
            assert_eq!(source.to_string(), "smtp relay unreachable");
        }
        _ => panic!("expected a construction error"),
    }
    assert!(logs.contains("ERROR"));
    assert!(logs.contains("cannot create instance of"));
    assert!(logs.contains("smtp relay unreachable"));
    assert!(!injector.singletons().is_constructed::<SmtpMailer>());

    assert!(injector.get_instance::<SmtpMailer>().is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);

    injector.get_instance::<SmtpMailer>().unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn failing_dependency_fails_dependent() {
    #[derive(Registrable, Injectable)]
    struct Outbox {
        #[inject]
        mailer: Arc<SmtpMailer>,
    }

    let injector = Injector::new();
    injector.register_singleton_with(|| -> Result<SmtpMailer, ConstructError> {
        Err("relay down".into())
    });
    injector.register_singleton::<Outbox>();

    match injector.get_instance::<Outbox>() {
        Err(InjectorError::Construction { implementation, .. }) => {
            assert!(implementation.ends_with("SmtpMailer"));
        }
        Ok(outbox) => panic!("unexpected outbox for {}", outbox.mailer.send("x")),
        Err(other) => panic!("unexpected error: {other}"),
    }
    assert!(!injector.singletons().is_constructed::<Outbox>());
}

#[test]
fn missing_dependency_is_not_registered() {
    let injector = Injector::new();
    injector.register_singleton::<Notifier>();

    match injector.get_instance::<Notifier>() {
        Err(InjectorError::NotRegistered { key }) => {
            assert_eq!(key, TypeKey::of::<dyn Mailer>());
        }
        _ => panic!("expected the missing mailer to be reported"),
    }
}

#[test]
fn untagged_fallback_warns() {
    let injector = Injector::new();
    let (_, logs) = capture_logs(|| injector.register_singleton_with(|| Ok(billing::Service("bill"))));

    assert!(logs.contains("WARN"));
    assert!(logs.contains("falling back to intrinsic name"));
    assert_eq!(injector.registered_keys(), vec![TypeKey::tagged("Service")]);
}

#[test]
fn untagged_warning_can_be_silenced() {
    let injector = Injector::with_config(InjectorConfig {
        warn_untagged: false,
        ..InjectorConfig::default()
    });
    let (_, logs) = capture_logs(|| injector.register_singleton_with(|| Ok(billing::Service("bill"))));

    assert!(!logs.contains("falling back to intrinsic name"));
}

#[test]
fn colliding_intrinsic_names_overwrite_each_other() {
    let injector = Injector::new();
    injector.register_singleton_with(|| Ok(billing::Service("bill")));
    injector.register_singleton_with(|| Ok(shipping::Service("ship")));

    assert_eq!(
        TypeKey::of::<billing::Service>(),
        TypeKey::of::<shipping::Service>()
    );
    // Both entry points are kept, but they share one registry entry.
    assert_eq!(injector.registered_keys().len(), 2);
    assert!(injector.has_instance::<billing::Service>());

    assert_eq!(injector.get_instance::<shipping::Service>().unwrap().0, "ship");
    assert!(matches!(
        injector.get_instance::<billing::Service>(),
        Err(InjectorError::TypeMismatch { .. })
    ));
}

#[test]
fn collision_is_avoided_by_mapping_to_a_tagged_type() {
    #[registrable]
    trait Invoicing: Send + Sync {
        fn name(&self) -> &'static str;
    }

    impl Invoicing for billing::Service {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    impl Injectable for billing::Service {
        type Dependencies = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(billing::Service("bill"))
        }
    }

    let injector = Injector::new();
    injector.register_singleton_as::<billing::Service, dyn Invoicing>(|service| service);
    injector.register_singleton_with(|| Ok(shipping::Service("ship")));

    assert_eq!(injector.get_instance::<dyn Invoicing>().unwrap().name(), "bill");
    assert_eq!(injector.get_instance::<shipping::Service>().unwrap().0, "ship");
}

#[test]
fn registered_instance_is_shared_with_mapped_key() {
    #[registrable]
    trait Store: Send + Sync {
        fn generation(&self) -> u32;
    }

    #[derive(Registrable)]
    struct Db(u32);

    impl Injectable for Db {
        type Dependencies = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(Db(1))
        }
    }

    impl Store for Db {
        fn generation(&self) -> u32 {
            self.0
        }
    }

    let injector = Injector::new();
    injector.register_singleton_as::<Db, dyn Store>(|db| db);
    assert_eq!(injector.get_instance::<dyn Store>().unwrap().generation(), 1);

    injector.register_instance(Db(2));

    let concrete = injector.get_instance::<Db>().unwrap();
    let mapped = injector.get_instance::<dyn Store>().unwrap();
    assert_eq!(concrete.0, 2);
    assert_eq!(mapped.generation(), 2);
    assert_eq!(
        Arc::as_ptr(&concrete) as *const u8,
        Arc::as_ptr(&mapped) as *const u8
    );
}
