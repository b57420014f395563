use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Signs an HS256 token for `user_id` that expires after `expires_in_minutes`.
pub fn create_token(
    user_id: &str,
    secret: &[u8],
    expires_in_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    if user_id.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::minutes(expires_in_minutes)).timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

/// Returns the subject of a valid, unexpired token.
pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &[u8],
) -> Result<String, jsonwebtoken::errors::Error> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(decoded.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn round_trips_the_subject() {
        let token = create_token("user-1", SECRET, 60).unwrap();
        assert_eq!(decode_token(token, SECRET).unwrap(), "user-1");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = create_token("user-1", SECRET, 60).unwrap();
        assert!(decode_token(token, b"other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        // Past the default 60s leeway.
        let token = create_token("user-1", SECRET, -5).unwrap();
        assert!(decode_token(token, SECRET).is_err());
    }

    #[test]
    fn rejects_empty_subject() {
        assert!(create_token("", SECRET, 60).is_err());
    }
}
