pub mod errors;
pub mod hasher;

pub use errors::CredentialError;
pub use hasher::CredentialHasher;
pub use hasher::PasswordPolicy;
