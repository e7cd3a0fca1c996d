//! JWT issuance and verification for the dual-token scheme.
//!
//! Access and refresh tokens share a claim shape but are signed with
//! independent secrets and lifetimes, so a token of one kind can never
//! validate against the other kind's verifier.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::account::{Account, Role};
use crate::config::AuthConfig;
use crate::errors::{AuthErrorType, Error, Result};

/// JWT claims shared by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signer/verifier for a single token kind, parameterized by secret and TTL.
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl JwtCodec {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl_secs,
        }
    }

    /// Sign a token for the given account.
    pub fn issue(&self, account: &Account) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| Error::internal(format!("Failed to sign token: {}", err)))
    }

    /// Verify signature and expiry, returning the claim set.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| convert_jwt_error(&err))
    }
}

fn convert_jwt_error(err: &jsonwebtoken::errors::Error) -> Error {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => {
            Error::auth("Token has expired", AuthErrorType::ExpiredToken)
        }
        _ => Error::auth("Token is invalid", AuthErrorType::InvalidToken),
    }
}

/// Issues access/refresh pairs from the two independently keyed codecs.
#[derive(Clone)]
pub struct TokenIssuer {
    access: JwtCodec,
    refresh: JwtCodec,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: JwtCodec::new(
                config.access_token_secret.as_bytes(),
                config.access_token_ttl_secs,
            ),
            refresh: JwtCodec::new(
                config.refresh_token_secret.as_bytes(),
                config.refresh_token_ttl_secs,
            ),
        }
    }

    /// Issue a new access/refresh pair sharing one claim set.
    pub fn issue_pair(&self, account: &Account) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.access.issue(account)?,
            refresh_token: self.refresh.issue(account)?,
        })
    }

    /// Verifier scoped to access tokens.
    pub fn access_codec(&self) -> JwtCodec {
        self.access.clone()
    }

    /// Verifier scoped to refresh tokens.
    pub fn refresh_codec(&self) -> JwtCodec {
        self.refresh.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::ApprovalState;
    use crate::domain::AccountId;

    fn sample_account() -> Account {
        Account {
            id: AccountId::new(),
            email: "claims@example.com".to_string(),
            name: "Claims Test".to_string(),
            role: Role::Parent,
            approval_state: ApprovalState::None,
            current_refresh_token: None,
            family_id: None,
            school_name: None,
            grade: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "test-access-secret-0123456789-0123456789".to_string(),
            access_token_ttl_secs: 900,
            refresh_token_secret: "test-refresh-secret-0123456789-0123456789".to_string(),
            refresh_token_ttl_secs: 3600,
        }
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let account = sample_account();
        let issuer = TokenIssuer::new(&test_config());

        let pair = issuer.issue_pair(&account).unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);

        let claims = issuer.access_codec().verify(&pair.access_token).unwrap();
        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.email, account.email);
        assert_eq!(claims.role, Role::Parent);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn cross_kind_verification_fails() {
        let account = sample_account();
        let issuer = TokenIssuer::new(&test_config());
        let pair = issuer.issue_pair(&account).unwrap();

        let err = issuer.refresh_codec().verify(&pair.access_token).unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::InvalidToken, .. }
        ));

        let err = issuer.access_codec().verify(&pair.refresh_token).unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::InvalidToken, .. }
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let account = sample_account();
        // TTL far enough in the past to clear jsonwebtoken's default leeway.
        let codec = JwtCodec::new(b"expired-token-secret-0123456789-xyz", -120);

        let token = codec.issue(&account).unwrap();
        let err = codec.verify(&token).unwrap_err();
        assert!(matches!(
            err,
            Error::Auth { error_type: AuthErrorType::ExpiredToken, .. }
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let account = sample_account();
        let issuer = TokenIssuer::new(&test_config());
        let pair = issuer.issue_pair(&account).unwrap();

        let mut tampered = pair.access_token.clone();
        tampered.pop();
        tampered.push(if pair.access_token.ends_with('A') { 'B' } else { 'A' });

        assert!(issuer.access_codec().verify(&tampered).is_err());
    }
}
