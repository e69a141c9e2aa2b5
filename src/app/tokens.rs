use anyhow::anyhow;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app::error::{ServiceError, ServiceResult};

const ISSUER: &str = "quill";
const TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Issues and verifies PASETO v4.local bearer tokens. Holds no state beyond
/// the key, so verification never touches the datastore.
#[derive(Clone)]
pub struct TokenService {
    key: [u8; 32],
    ttl_hours: u64,
}

impl TokenService {
    pub fn new(key: [u8; 32], ttl_hours: u64) -> Self {
        Self { key, ttl_hours }
    }

    pub fn issue(&self, user_id: Uuid) -> ServiceResult<IssuedToken> {
        let (claims, expires_at) = self.build_claims(user_id)?;
        let key = self.symmetric_key()?;
        let token = local::encrypt(&key, &claims, None, None)
            .map_err(|err| anyhow!("failed to encrypt token: {}", err))?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> ServiceResult<Uuid> {
        let claims = self
            .decrypt_claims(token)?
            .ok_or_else(|| ServiceError::unauthorized("invalid token"))?;
        if !has_token_type(&claims, TOKEN_TYPE) {
            return Err(ServiceError::unauthorized("invalid token"));
        }
        claim_uuid(&claims, "sub").ok_or_else(|| ServiceError::unauthorized("invalid token"))
    }

    fn build_claims(&self, user_id: Uuid) -> ServiceResult<(Claims, OffsetDateTime)> {
        let ttl_seconds = self
            .ttl_hours
            .checked_mul(60 * 60)
            .and_then(|secs| i64::try_from(secs).ok())
            .ok_or_else(|| anyhow!("token ttl of {} hours is out of range", self.ttl_hours))?;
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(Duration::seconds(ttl_seconds))
            .ok_or_else(|| anyhow!("token ttl of {} hours is out of range", self.ttl_hours))?;

        let duration = std::time::Duration::from_secs(ttl_seconds as u64);
        let mut claims = Claims::new_expires_in(&duration).map_err(claims_error)?;
        claims.issuer(ISSUER).map_err(claims_error)?;
        claims.audience(ISSUER).map_err(claims_error)?;
        claims.subject(&user_id.to_string()).map_err(claims_error)?;
        claims.add_additional("typ", TOKEN_TYPE).map_err(claims_error)?;
        Ok((claims, expires_at))
    }

    fn decrypt_claims(&self, token: &str) -> ServiceResult<Option<Claims>> {
        let key = self.symmetric_key()?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(ISSUER);
        rules.validate_audience_with(ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }

    fn symmetric_key(&self) -> ServiceResult<SymmetricKey<V4>> {
        SymmetricKey::<V4>::from(&self.key)
            .map_err(|err| ServiceError::Internal(anyhow!("invalid token key: {}", err)))
    }
}

fn claims_error(err: pasetors::errors::Error) -> ServiceError {
    ServiceError::Internal(anyhow!("failed to build token claims: {}", err))
}

fn claim_uuid(claims: &Claims, name: &str) -> Option<Uuid> {
    claims
        .get_claim(name)
        .and_then(|value| value.as_str())
        .and_then(|value| Uuid::parse_str(value).ok())
}

fn has_token_type(claims: &Claims, expected: &str) -> bool {
    claims
        .get_claim("typ")
        .and_then(|value| value.as_str())
        .map(|value| value == expected)
        .unwrap_or(false)
}
