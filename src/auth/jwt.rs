use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, state::AppState};

/// Verification (and, for tooling and tests, signing) keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    /// Mints an access token for `user_id` valid for `ttl` (negative yields an expired token).
    pub fn sign(&self, user_id: Uuid, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: Some(TokenKind::Access),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry, plus issuer/audience when configured.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        match &self.audience {
            Some(aud) => validation.set_audience(std::slice::from_ref(aud)),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(std::slice::from_ref(iss));
        }
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if data.claims.kind == Some(TokenKind::Refresh) {
            anyhow::bail!("refresh token cannot be used for access");
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.map(Into::into),
            audience: audience.map(Into::into),
        })
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys("dev-secret", Some("test-issuer"), Some("test-aud"));
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, Duration::minutes(5)).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss.as_deref(), Some("test-issuer"));
        assert_eq!(claims.aud.as_deref(), Some("test-aud"));
        assert_eq!(claims.kind, Some(TokenKind::Access));
    }

    #[test]
    fn verify_without_issuer_or_audience() {
        let keys = make_keys("dev-secret", None, None);
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, Duration::minutes(5)).expect("sign");
        assert_eq!(keys.verify(&token).expect("verify").sub, user_id);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", None, None);
        let token = keys.sign(Uuid::new_v4(), Duration::hours(-1)).expect("sign");
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys("secret-a", None, None);
        let bad = make_keys("secret-b", None, None);
        let token = good.sign(Uuid::new_v4(), Duration::minutes(5)).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", Some("good-iss"), Some("good-aud"));
        let bad = make_keys("same-secret", Some("bad-iss"), Some("bad-aud"));
        let token = good.sign(Uuid::new_v4(), Duration::minutes(5)).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_refresh_token() {
        let keys = make_keys("dev-secret", None, None);
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now.unix_timestamp() as usize,
            exp: (now + Duration::minutes(5)).unix_timestamp() as usize,
            iss: None,
            aud: None,
            kind: Some(TokenKind::Refresh),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        let err = keys.verify(&token).unwrap_err();
        assert!(err.to_string().contains("refresh token"));
    }
}
