//! RS256 access tokens.
//!
//! Tokens are stateless: nothing is persisted at issuance, and a token stays
//! valid until its `exp` passes.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keys::{KeyError, KeyStore};
use super::permission::Permissions;
use crate::db::{RoleWithPermissions, User};

/// Token errors.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The token's `exp` has passed.
    #[error("token has expired")]
    Expired,

    /// Malformed token, bad signature, or unexpected algorithm.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// The key store could not provide a key.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Encoding the token failed.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// The account has no role to put in the token.
    #[error("account has no role")]
    MissingRole,
}

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a decimal string.
    pub sub: String,
    /// Role name at issuance.
    pub role: String,
    /// Permission names at issuance, or `["*"]` for superusers.
    pub perms: Vec<String>,
    /// Issued at (seconds since the epoch).
    pub iat: i64,
    /// Expiration (seconds since the epoch).
    pub exp: i64,
}

impl Claims {
    /// The subject as a user id, if it is a positive integer.
    pub fn subject_id(&self) -> Option<i64> {
        self.sub.parse::<i64>().ok().filter(|id| *id > 0)
    }

    /// Permission snapshot taken at issuance.
    pub fn permissions(&self) -> Permissions {
        Permissions::from_claim(&self.perms)
    }
}

/// Issues and verifies access tokens.
pub struct TokenService {
    keys: Arc<KeyStore>,
    ttl: Duration,
    validation: Validation,
}

impl TokenService {
    /// Create a token service with the default lifetime `ttl`.
    pub fn new(keys: Arc<KeyStore>, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys,
            ttl,
            validation,
        }
    }

    /// The underlying key store.
    pub fn keys(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    /// Default token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token.
    ///
    /// `ttl` overrides the default lifetime.
    pub fn issue(
        &self,
        subject_id: i64,
        role: &str,
        permissions: &Permissions,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = ttl.unwrap_or(self.ttl);
        let claims = Claims {
            sub: subject_id.to_string(),
            role: role.to_string(),
            perms: permissions.to_claim(),
            iat: now,
            exp: now + ttl.num_seconds(),
        };

        let key = self.keys.signing_key()?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue a token for `user` carrying a snapshot of `role`'s permissions.
    pub fn issue_for(&self, user: &User, role: &RoleWithPermissions) -> Result<String, TokenError> {
        self.issue(user.id, &role.role.name, &role.resolve(), None)
    }

    /// Verify a token's signature and expiry and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let key = self.keys.verification_key()?;
        let data = decode::<Claims>(token, &key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        // The library only rejects exp strictly in the past.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &self.keys)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::EncodingKey;
    use std::collections::BTreeSet;

    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/private_key.pem");
    const PUBLIC_PEM: &str = include_str!("../../tests/fixtures/public_key.pem");
    const OTHER_PRIVATE_PEM: &str = include_str!("../../tests/fixtures/other_private_key.pem");
    const OTHER_PUBLIC_PEM: &str = include_str!("../../tests/fixtures/other_public_key.pem");

    fn service() -> TokenService {
        TokenService::new(
            Arc::new(KeyStore::from_pem(PRIVATE_PEM, PUBLIC_PEM)),
            Duration::minutes(60),
        )
    }

    fn granted(names: &[&str]) -> Permissions {
        Permissions::Granted(names.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>())
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let token = tokens
            .issue(7, "support_agent", &granted(&["support:tickets:view"]), None)
            .unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.subject_id(), Some(7));
        assert_eq!(claims.role, "support_agent");
        assert_eq!(claims.perms, vec!["support:tickets:view"]);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_superuser_claim_is_wildcard() {
        let tokens = service();
        let token = tokens.issue(1, "super_admin", &Permissions::All, None).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.perms, vec!["*"]);
        assert!(claims.permissions().is_all());
    }

    #[test]
    fn test_header_is_rs256() {
        let tokens = service();
        let token = tokens.issue(1, "r", &Permissions::none(), None).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
    }

    #[test]
    fn test_custom_ttl() {
        let tokens = service();
        let token = tokens
            .issue(1, "r", &Permissions::none(), Some(Duration::minutes(5)))
            .unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 300);
    }

    #[test]
    fn test_expired_token() {
        let tokens = service();
        let token = tokens
            .issue(1, "r", &Permissions::none(), Some(Duration::minutes(-1)))
            .unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_zero_ttl_is_already_expired() {
        let tokens = service();
        let token = tokens
            .issue(1, "r", &Permissions::none(), Some(Duration::zero()))
            .unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_forged_with_other_keypair() {
        let forger = TokenService::new(
            Arc::new(KeyStore::from_pem(OTHER_PRIVATE_PEM, OTHER_PUBLIC_PEM)),
            Duration::minutes(60),
        );
        let forged = forger.issue(1, "super_admin", &Permissions::All, None).unwrap();

        assert!(matches!(
            service().verify(&forged),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_hs256_with_public_key_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            role: "super_admin".to_string(),
            perms: vec!["*".to_string()],
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(PUBLIC_PEM.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service().verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = service();
        let token = tokens.issue(2, "basic_user", &Permissions::none(), None).unwrap();
        let other = tokens.issue(1, "super_admin", &Permissions::All, None).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(tokens.verify(&spliced), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let tokens = service();
        assert!(matches!(tokens.verify(""), Err(TokenError::Invalid(_))));
        assert!(matches!(
            tokens.verify("not.a.token"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_keys_is_key_error() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = TokenService::new(
            Arc::new(KeyStore::from_files(
                dir.path().join("private.pem"),
                dir.path().join("public.pem"),
            )),
            Duration::minutes(60),
        );

        assert!(matches!(
            tokens.issue(1, "r", &Permissions::none(), None),
            Err(TokenError::Key(KeyError::NotFound(_)))
        ));
        assert!(matches!(
            tokens.verify("a.b.c"),
            Err(TokenError::Key(KeyError::NotFound(_)))
        ));
    }

    #[test]
    fn test_subject_id_must_be_positive_integer() {
        let mut claims = Claims {
            sub: "42".to_string(),
            role: "r".to_string(),
            perms: vec![],
            iat: 0,
            exp: 0,
        };
        assert_eq!(claims.subject_id(), Some(42));

        for bad in ["0", "-3", "abc", "", "4.2"] {
            claims.sub = bad.to_string();
            assert_eq!(claims.subject_id(), None, "sub {bad:?}");
        }
    }
}
