pub mod errors;
pub mod events;
pub mod gatekeeper;
pub mod models;
pub mod ports;
pub mod service;
