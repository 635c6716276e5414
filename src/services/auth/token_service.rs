use std::sync::Arc;

use chrono::{Duration, SubsecRound};
use tracing::{debug, error, warn};

use crate::services::auth::clock::{Clock, SystemClock};
use crate::services::auth::codec::{CodecError, SigningKey, TokenClaims, TokenCodec};
use crate::services::auth::error::AuthError;
use crate::services::auth::identity::Identity;

/// Issues and validates bearer tokens.
///
/// - Holds the process-wide signing key and the configured validity.
/// - Tokens are never stored: every request re-verifies.
#[derive(Clone)]
pub struct TokenService {
    codec: TokenCodec,
    validity: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("validity_seconds", &self.validity.num_seconds())
            .finish()
    }
}

/// A freshly minted token together with the claims it encodes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

impl IssuedToken {
    /// Seconds until expiry, counted from issuance.
    pub fn expires_in(&self) -> i64 {
        (self.claims.expires_at - self.claims.issued_at).num_seconds()
    }
}

impl TokenService {
    pub fn new(key: &SigningKey, validity: Duration) -> Self {
        Self::with_clock(key, validity, Arc::new(SystemClock))
    }

    pub fn with_clock(key: &SigningKey, validity: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            codec: TokenCodec::new(key),
            validity,
            clock,
        }
    }

    /// Issue a token for `identity` valid from now for the configured duration.
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        // Claims carry whole seconds; truncate so the returned claims match what parses back.
        let issued_at = self.clock.now().trunc_subsecs(0);
        let expires_at = issued_at.checked_add_signed(self.validity).ok_or_else(|| {
            error!(issued_at = %issued_at, "token expiry is out of range");
            AuthError::ExpiryOutOfRange
        })?;
        let claims = TokenClaims {
            subject: identity.subject.clone(),
            issued_at,
            expires_at,
        };

        let token = self.codec.sign(&claims).map_err(|e| {
            error!(subject = %identity.subject, error = %e, "failed to sign token");
            AuthError::Signing(e.to_string())
        })?;

        debug!(
            subject = %claims.subject,
            expires_at = %claims.expires_at,
            "issued token"
        );

        Ok(IssuedToken { token, claims })
    }

    /// Verify `token` and return its claims.
    ///
    /// Malformed and wrongly signed tokens both come back as `TokenInvalid`.
    pub fn parse(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.codec
            .verify(token, self.clock.now())
            .map_err(|e| match e {
                CodecError::Expired(expired_at) => {
                    warn!(expired_at = %expired_at, "token has expired");
                    AuthError::TokenExpired
                }
                CodecError::Malformed | CodecError::SignatureInvalid => {
                    error!(error = %e, "token is invalid");
                    AuthError::TokenInvalid
                }
                CodecError::Signing(msg) => AuthError::Signing(msg),
            })
    }

    /// Same verification as `parse`, collapsed to a bool.
    pub fn is_valid(&self, token: &str) -> bool {
        match self.codec.verify(token, self.clock.now()) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "rejecting token");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::services::auth::clock::FixedClock;

    const SECRET: &str = "token-service-test-secret-long-enough";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
    }

    fn alice() -> Identity {
        Identity {
            id: 1,
            subject: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: BTreeSet::from(["ROLE_USER".to_string()]),
        }
    }

    fn service(clock: Arc<FixedClock>) -> TokenService {
        TokenService::with_clock(&SigningKey::new(SECRET), Duration::minutes(30), clock)
    }

    #[test]
    fn issued_token_parses_back_to_subject() {
        let clock = Arc::new(FixedClock::new(t0()));
        let tokens = service(clock);

        let issued = tokens.issue(&alice()).unwrap();
        let claims = tokens.parse(&issued.token).unwrap();

        assert_eq!(claims.subject, "alice");
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.expires_at - claims.issued_at, Duration::minutes(30));
        assert_eq!(issued.expires_in(), 1800);
    }

    #[test]
    fn subsecond_clock_is_truncated() {
        let clock = Arc::new(FixedClock::new(t0() + Duration::milliseconds(750)));
        let tokens = service(clock);

        let issued = tokens.issue(&alice()).unwrap();
        assert_eq!(issued.claims.issued_at, t0());
        assert_eq!(tokens.parse(&issued.token).unwrap(), issued.claims);
    }

    #[test]
    fn expiry_overflow_is_an_error() {
        let clock = Arc::new(FixedClock::new(DateTime::<Utc>::MAX_UTC));
        let tokens = service(clock);

        let err = tokens.issue(&alice()).unwrap_err();
        assert!(matches!(err, AuthError::ExpiryOutOfRange));
        assert_eq!(err.category(), crate::error::ErrorCategory::Technical);
    }

    #[test]
    fn validity_window_scenario() {
        let clock = Arc::new(FixedClock::new(t0()));
        let tokens = service(clock.clone());
        let issued = tokens.issue(&alice()).unwrap();

        clock.set(t0() + Duration::minutes(29));
        assert!(tokens.is_valid(&issued.token));
        assert_eq!(tokens.parse(&issued.token).unwrap().subject, "alice");

        clock.set(t0() + Duration::minutes(31));
        assert!(!tokens.is_valid(&issued.token));
        assert!(matches!(
            tokens.parse(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn exactly_at_expiry_is_expired() {
        let clock = Arc::new(FixedClock::new(t0()));
        let tokens = service(clock.clone());
        let issued = tokens.issue(&alice()).unwrap();

        clock.set(t0() + Duration::minutes(30) - Duration::seconds(1));
        assert!(tokens.is_valid(&issued.token));

        clock.set(t0() + Duration::minutes(30));
        assert!(!tokens.is_valid(&issued.token));
        assert!(matches!(
            tokens.parse(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn is_valid_agrees_with_parse() {
        let clock = Arc::new(FixedClock::new(t0()));
        let tokens = service(clock.clone());
        let good = tokens.issue(&alice()).unwrap().token;

        for token in [good.as_str(), "", "abc", "a.b.c", "Bearer x"] {
            for offset in [0, 29, 30, 45] {
                clock.set(t0() + Duration::minutes(offset));
                assert_eq!(tokens.is_valid(token), tokens.parse(token).is_ok());
            }
        }
    }

    #[test]
    fn any_altered_character_is_invalid() {
        let clock = Arc::new(FixedClock::new(t0()));
        let tokens = service(clock.clone());
        let token = tokens.issue(&alice()).unwrap().token;
        clock.set(t0() + Duration::minutes(1));

        // The final character of a base64url segment may only carry padding bits,
        // so altering it is not guaranteed to change the decoded bytes.
        let segment_ends: Vec<usize> = token
            .char_indices()
            .filter(|(i, _)| token[i + 1..].starts_with('.') || *i == token.len() - 1)
            .map(|(i, _)| i)
            .collect();

        for (i, c) in token.char_indices() {
            if segment_ends.contains(&i) {
                continue;
            }
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert!(
                matches!(tokens.parse(&tampered), Err(AuthError::TokenInvalid)),
                "tampering at index {i} was not rejected"
            );
            assert!(!tokens.is_valid(&tampered));
        }
    }

    #[test]
    fn forged_subject_is_invalid() {
        let clock = Arc::new(FixedClock::new(t0()));
        let tokens = service(clock);
        let token = tokens.issue(&alice()).unwrap().token;
        let parts: Vec<&str> = token.split('.').collect();

        let payload = String::from_utf8(URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(payload.replace("alice", "bob"));
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            tokens.parse(&forged),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn token_from_other_key_fails_regardless_of_expiry() {
        let clock = Arc::new(FixedClock::new(t0()));
        let ours = service(clock.clone());
        let theirs = TokenService::with_clock(
            &SigningKey::new("some-other-deployment-secret-value"),
            Duration::minutes(30),
            clock.clone(),
        );
        let foreign = theirs.issue(&alice()).unwrap().token;

        for offset in [1, 31] {
            clock.set(t0() + Duration::minutes(offset));
            assert!(matches!(
                ours.parse(&foreign),
                Err(AuthError::TokenInvalid)
            ));
        }
    }
}
