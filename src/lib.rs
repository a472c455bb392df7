pub mod configuration;
pub mod server;
