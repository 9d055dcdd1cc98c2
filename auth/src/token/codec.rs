use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::TokenClaims;
use super::errors::CodecError;

/// Signs and parses self-describing tokens (HS256 JWT).
///
/// The codec never consults the ledger: a successful decode proves the claims
/// were minted with our secret, not that the token is still outstanding.
/// Expiry is judged against the caller's clock rather than the system clock
/// so that time can be simulated.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// Create a codec with an HMAC secret.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Load it from configuration, never from code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Sign claims into a compact token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, CodecError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| CodecError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature and parse claims, then reject if `now` has
    /// reached the embedded expiry.
    ///
    /// # Errors
    /// * `BadSignature` - Signature does not match the claims
    /// * `Malformed` - Not a token, unexpected algorithm, or claims missing
    /// * `Expired` - Signature valid but `now >= exp`
    pub fn decode(&self, token: &str, now: i64) -> Result<TokenClaims, CodecError> {
        let claims = self.inspect(token)?;

        if claims.is_expired(now) {
            return Err(CodecError::Expired);
        }

        Ok(claims)
    }

    /// Verify the signature and parse claims without judging expiry.
    ///
    /// Only for stateless inspection (logging, locating the owner of a token
    /// being discarded). Never admit a request on this alone.
    pub fn inspect(&self, token: &str) -> Result<TokenClaims, CodecError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => CodecError::BadSignature,
                ErrorKind::ExpiredSignature => CodecError::Expired,
                _ => CodecError::Malformed(e.to_string()),
            })
    }
}
