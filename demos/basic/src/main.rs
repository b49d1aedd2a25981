use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use iconfig::ApplicationConfig;
use rinject::{
    configure_global_injector, get_global_instance, registrable, ConstructError, Injectable,
    Injector, Provider, Registrable,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[registrable]
trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Registrable, Injectable)]
struct Polite {
    #[inject]
    config: Arc<ApplicationConfig>,
}

impl Greeter for Polite {
    fn greet(&self, name: &str) -> String {
        let greeting = self
            .config
            .get("demo.greeting")
            .and_then(|value| value.as_str())
            .unwrap_or("Hello");
        format!("{greeting}, {name}!")
    }
}

#[derive(Debug)]
struct Ticket(u32);

impl Registrable for Ticket {
    const TYPE_TAG: Option<&'static str> = Some("basic::Ticket");
}

/// Hands out a new ticket on every resolution.
#[derive(Registrable)]
struct TicketDispenser {
    next: AtomicU32,
}

impl Injectable for TicketDispenser {
    type Dependencies = ();

    fn construct(_: ()) -> Result<Self, ConstructError> {
        Ok(TicketDispenser {
            next: AtomicU32::new(1),
        })
    }
}

impl Provider<Ticket> for TicketDispenser {
    fn get(&self) -> Arc<Ticket> {
        Arc::new(Ticket(self.next.fetch_add(1, Ordering::SeqCst)))
    }
}

#[derive(Registrable, Injectable)]
struct Frontdesk {
    #[inject]
    greeter: Arc<dyn Greeter>,
    #[inject]
    ticket: Arc<Ticket>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config() -> ApplicationConfig {
    match iconfig::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "no configuration file, using defaults");
            ApplicationConfig::empty()
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    let injector = Arc::new(Injector::with_config(config.injector_config()?));
    injector.register_instance(config);
    injector.register_singleton_as::<Polite, dyn Greeter>(|polite| polite);
    injector.register_singleton_provider::<TicketDispenser, Ticket>();
    injector.register_singleton::<Frontdesk>();

    injector.initialize_singleton_instances()?;
    configure_global_injector(injector);

    let frontdesk = get_global_instance::<Frontdesk>()?;
    info!(ticket = ?frontdesk.ticket, "{}", frontdesk.greeter.greet("visitor"));

    for _ in 0..2 {
        let ticket = get_global_instance::<Ticket>()?;
        info!(ticket = ticket.0, "dispensed ticket");
    }
    Ok(())
}
