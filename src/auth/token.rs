use crate::{error::AppError, models::Role};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of every session token. There is no refresh and no revocation.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the user the token was issued for.
    pub id: Uuid,
    /// Role of the user at issuance time.
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
}

/// Signing and verification keys derived from the server secret.
///
/// Built once at startup and shared through `web::Data`.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys(..)")
    }
}

/// Issues a session token binding `user_id` and `role`, valid for 30 days.
///
/// # Returns
/// The encoded JWT. Encoding with an HMAC key only fails on serializer errors,
/// which surface as `AppError::InternalServerError`.
pub fn generate_token(keys: &JwtKeys, user_id: Uuid, role: Role) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now + chrono::Duration::days(TOKEN_TTL_DAYS);

    let claims = Claims {
        id: user_id,
        role,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
}

/// Verifies a session token and decodes its claims.
///
/// Signature and expiry are checked with no leeway, so a token is rejected the
/// moment its `exp` has passed.
///
/// # Returns
/// `AppError::Unauthorized` if the token is malformed, signed with another
/// secret, or expired.
pub fn verify_token(keys: &JwtKeys, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<Claims>(token, &keys.decoding, &validation)?;
    Ok(data.claims)
}
