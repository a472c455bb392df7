pub mod action;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod session;
pub mod surface;
