pub mod claims;
pub mod codec;
pub mod errors;
pub mod purpose;

pub use claims::TokenClaims;
pub use codec::TokenCodec;
pub use errors::CodecError;
pub use purpose::TokenPurpose;
pub use purpose::UnknownPurpose;
