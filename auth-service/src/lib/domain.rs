pub mod auth;
pub mod clock;
pub mod token;
pub mod user;
