pub mod container;
pub mod injectable;
pub mod provider;
