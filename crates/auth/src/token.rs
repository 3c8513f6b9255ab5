//! Signed session tokens (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use epicevents_core::UserId;

use crate::claims::{SessionClaims, TokenError, validate_claims};
use crate::{AuthConfig, Role};

/// Issues and verifies session tokens with one process-wide secret.
///
/// Expiry is judged against the caller's `now` with no leeway, never against
/// the system clock.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.secret_key.as_bytes(), config.token_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(
        &self,
        subject: UserId,
        employee_number: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims::new(subject, employee_number, role, now, now + self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify the signature, then the expiry.
    ///
    /// Any malformed, mis-signed or undecodable token is `Invalid`; the
    /// payload is never looked at before the signature checks out.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }

    pub fn is_expired(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.decode(token, now).is_err()
    }

    pub fn subject_id(&self, token: &str, now: DateTime<Utc>) -> Option<UserId> {
        self.decode(token, now).ok()?.subject_id().ok()
    }

    pub fn role(&self, token: &str, now: DateTime<Utc>) -> Option<Role> {
        self.decode(token, now).ok().map(|c| c.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret-key-for-jwt", Duration::hours(24))
    }

    fn flip_signature_byte(token: &str) -> String {
        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(sig).unwrap();
        bytes[0] ^= 0x01;
        format!("{head}.{}", URL_SAFE_NO_PAD.encode(bytes))
    }

    #[test]
    fn issue_then_decode_carries_identity() {
        let svc = service();
        let id = UserId::new();
        let now = Utc::now();

        let token = svc.issue(id, "EMP001", Role::Sales, now).unwrap();
        let claims = svc.decode(&token, now).unwrap();

        assert_eq!(claims.subject_id().unwrap(), id);
        assert_eq!(claims.employee_number, "EMP001");
        assert_eq!(claims.role, Role::Sales);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expires_exactly_at_ttl() {
        let svc = service();
        let now = Utc::now();
        let token = svc.issue(UserId::new(), "EMP001", Role::Support, now).unwrap();

        assert!(svc.decode(&token, now + Duration::hours(23)).is_ok());
        assert_eq!(
            svc.decode(&token, now + Duration::hours(24)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            svc.decode(&token, now + Duration::hours(24) + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
        assert!(svc.is_expired(&token, now + Duration::days(2)));
        assert!(!svc.is_expired(&token, now));
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let svc = service();
        let now = Utc::now();
        let token = svc.issue(UserId::new(), "EMP001", Role::Sales, now).unwrap();

        let tampered = flip_signature_byte(&token);
        assert_ne!(tampered, token);
        assert_eq!(svc.decode(&tampered, now), Err(TokenError::Invalid));
        assert!(svc.is_expired(&tampered, now));
    }

    #[test]
    fn tampered_and_expired_reports_invalid() {
        let svc = service();
        let now = Utc::now();
        let token = svc.issue(UserId::new(), "EMP001", Role::Sales, now).unwrap();

        let tampered = flip_signature_byte(&token);
        assert_eq!(
            svc.decode(&tampered, now + Duration::days(3)),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let now = Utc::now();
        let token = service().issue(UserId::new(), "EMP001", Role::Sales, now).unwrap();
        let other = TokenService::new(b"different-secret", Duration::hours(24));
        assert_eq!(other.decode(&token, now), Err(TokenError::Invalid));
    }

    #[test]
    fn malformed_tokens_are_invalid() {
        let svc = service();
        let now = Utc::now();
        for token in ["", "invalid", "not.a.token", "too.many.parts.in.this.token"] {
            assert_eq!(svc.decode(token, now), Err(TokenError::Invalid), "token: {token:?}");
        }
    }

    #[test]
    fn signed_payload_missing_claims_is_invalid() {
        let secret = b"test-secret-key-for-jwt";
        let now = Utc::now();
        let payload = serde_json::json!({
            "sub": UserId::new().to_string(),
            "exp": (now + Duration::hours(1)).timestamp(),
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();

        assert_eq!(service().decode(&token, now), Err(TokenError::Invalid));
    }

    #[test]
    fn convenience_readers() {
        let svc = service();
        let id = UserId::new();
        let now = Utc::now();
        let token = svc.issue(id, "EMP7", Role::Management, now).unwrap();

        assert_eq!(svc.subject_id(&token, now), Some(id));
        assert_eq!(svc.role(&token, now), Some(Role::Management));
        assert_eq!(svc.role(&token, now + Duration::days(1)), None);
        assert_eq!(svc.subject_id("garbage", now), None);
    }

    fn instant(secs: i64, nanos: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, nanos).unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: every issued token lives exactly 24h.
        #[test]
        fn lifetime_is_exactly_one_day(
            secs in 1_000_000_000i64..4_000_000_000,
            nanos in 0u32..1_000_000_000,
        ) {
            let svc = service();
            let issued = instant(secs, nanos);
            let token = svc.issue(UserId::new(), "EMP001", Role::Sales, issued).unwrap();
            let claims = svc.decode(&token, issued).unwrap();

            prop_assert_eq!(claims.iat, secs);
            prop_assert_eq!(claims.exp - claims.iat, 86_400);
        }

        /// Property: decode reports Expired exactly when now is at or past exp.
        #[test]
        fn expired_iff_past_expiry(
            secs in 1_000_000_000i64..4_000_000_000,
            offset in -86_400i64..3 * 86_400,
            nanos in 0u32..1_000_000_000,
        ) {
            let svc = service();
            let issued = instant(secs, 0);
            let token = svc.issue(UserId::new(), "EMP001", Role::Support, issued).unwrap();
            let now = instant(secs + offset, nanos);

            let result = svc.decode(&token, now);
            if now.timestamp() >= secs + 86_400 {
                prop_assert_eq!(result, Err(TokenError::Expired));
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
