use std::path::Path;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::Rng;

use crate::auth::middleware::Claims;

/// Session token lifetime: one hour from issuance. Tokens are stateless and
/// never revoked before natural expiry.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Load or generate the JWT signing key (256-bit random secret).
/// Key is stored as raw bytes in data_dir/jwt_secret.
pub fn load_or_generate_jwt_secret(data_dir: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    std::fs::create_dir_all(data_dir)?;
    let key_path = Path::new(data_dir).join("jwt_secret");

    if key_path.exists() {
        let key = std::fs::read(&key_path)?;
        if key.len() == 32 {
            tracing::info!("JWT signing key loaded from {}", key_path.display());
            return Ok(key);
        }
        // Invalid key file — regenerate
        tracing::warn!("JWT key file has wrong size ({}), regenerating", key.len());
    }

    // Generate new 256-bit random key
    let key: [u8; 32] = rand::rng().random();
    std::fs::write(&key_path, key)?;
    tracing::info!("JWT signing key generated at {}", key_path.display());
    Ok(key.to_vec())
}

/// Issue a session token for an authenticated user.
/// Claims: sub=user id, email, iat, exp (one hour out).
pub fn issue_token(
    secret: &[u8],
    user_id: &str,
    email: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn issued_token_round_trips() {
        let secret = [7u8; 32];
        let token = issue_token(&secret, "user-1", "admin@example.com").unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(&secret),
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, "user-1");
        assert_eq!(decoded.claims.email, "admin@example.com");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = issue_token(&[7u8; 32], "user-1", "admin@example.com").unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(&[8u8; 32]),
            &Validation::new(jsonwebtoken::Algorithm::HS256),
        );
        assert!(result.is_err());
    }

    #[test]
    fn secret_is_persistent_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();

        let first = load_or_generate_jwt_secret(data_dir).unwrap();
        let second = load_or_generate_jwt_secret(data_dir).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }
}
