use chrono::{DateTime, Duration, Utc};
use coffer_core::Identity;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub login: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token_encode_failed")]
    Encode,
    #[error("token_invalid")]
    Invalid,
    #[error("token_expired")]
    Expired,
    #[error("token_subject_invalid")]
    Subject,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        login: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = now + Duration::seconds(self.ttl_seconds);
        let claims = Claims {
            sub: user_id.to_string(),
            login: login.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|_| TokenError::Encode)?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Subject)?;
        Ok(Identity {
            user_id,
            login: data.claims.login,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies_to_identity() {
        let issuer = TokenIssuer::new(SECRET, 60);
        let user_id = Uuid::now_v7();
        let now = Utc::now();
        let (token, expires_at) = issuer.issue(user_id, "alice", now).expect("issue");
        assert_eq!(expires_at, now + Duration::seconds(60));

        let identity = issuer.verify(&token).expect("verify");
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.login, "alice");
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new(SECRET, 60);
        let issued = Utc::now() - Duration::seconds(3600);
        let (token, _) = issuer.issue(Uuid::now_v7(), "alice", issued).expect("issue");
        assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = TokenIssuer::new(SECRET, 60);
        let other = TokenIssuer::new(b"another-secret-another-secret-xx", 60);
        let (token, _) = other.issue(Uuid::now_v7(), "mallory", Utc::now()).expect("issue");
        assert_eq!(issuer.verify(&token), Err(TokenError::Invalid));
        assert_eq!(issuer.verify("not.a.jwt"), Err(TokenError::Invalid));
    }
}
