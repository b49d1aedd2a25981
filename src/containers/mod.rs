pub mod injector;
pub(crate) mod registry;
pub mod singleton;
