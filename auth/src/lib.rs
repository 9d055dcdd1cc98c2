//! Authentication primitives shared by services.
//!
//! - Credential hashing and verification (Argon2id) plus a password policy
//! - Signed, purpose-scoped tokens (HS256 JWT) with a clock-injected decoder
//!
//! Both halves are stateless. Whether a token is still outstanding is a
//! question for the service that owns the token ledger.
//!
//! # Examples
//!
//! ## Credentials
//! ```
//! use auth::{CredentialHasher, PasswordPolicy};
//!
//! PasswordPolicy::default().check("password123").unwrap();
//! let hasher = CredentialHasher::new();
//! let hash = hasher.hash("password123").unwrap();
//! assert!(hasher.verify("password123", &hash).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{TokenClaims, TokenCodec, TokenPurpose};
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let claims = TokenClaims::issue("user123", TokenPurpose::Access, 1_000, 1_060);
//! let token = codec.encode(&claims).unwrap();
//!
//! assert_eq!(codec.decode(&token, 1_030).unwrap(), claims);
//! assert!(codec.decode(&token, 1_060).is_err());
//! ```

pub mod credential;
pub mod token;

pub use credential::CredentialError;
pub use credential::CredentialHasher;
pub use credential::PasswordPolicy;
pub use token::CodecError;
pub use token::TokenClaims;
pub use token::TokenCodec;
pub use token::TokenPurpose;
