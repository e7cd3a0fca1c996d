//! Account signup, login, token refresh, and approval workflows.

use std::sync::{Arc, LazyLock};

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::account::{
    Account, ApprovalState, LoginRequest, NewAccount, Role, SignupRequest,
};
use crate::auth::hashing::{hash_password, verify_password};
use crate::auth::token::{Claims, TokenIssuer, TokenPair};
use crate::domain::AccountId;
use crate::errors::{AuthErrorType, Error, Result};
use crate::storage::AccountRepository;

/// Hash verified against when the email is unknown, so a failed login takes
/// the same time whether or not the account exists.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_password("dummy-password-for-timing-defense").unwrap_or_default()
});

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Coordinates the repository, password hasher, and token issuer.
#[derive(Clone)]
pub struct AuthService {
    repository: Arc<dyn AccountRepository>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(repository: Arc<dyn AccountRepository>, tokens: TokenIssuer) -> Self {
        Self { repository, tokens }
    }

    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create a new account. The email must not already be registered.
    #[instrument(skip(self, request), fields(email = %request.email), name = "auth_signup")]
    pub async fn signup(&self, request: SignupRequest) -> Result<Account> {
        request.validate()?;

        let email = Account::normalize_email(&request.email);
        if self.repository.get_account_by_email(&email).await?.is_some() {
            return Err(Error::conflict(
                format!("An account with email '{}' already exists", email),
                "account",
            ));
        }

        let role = request.role.unwrap_or(Role::Student);
        // Consultants start unapproved and cannot log in until an
        // administrator approves them.
        let approval_state = match role {
            Role::Consultant => ApprovalState::Pending,
            _ => ApprovalState::None,
        };

        let account = self
            .repository
            .create_account(NewAccount {
                id: AccountId::new(),
                email,
                password_hash: hash_password(&request.password)?,
                name: request.name.trim().to_string(),
                role,
                approval_state,
                family_id: request.family_id,
                school_name: request.school_name,
                grade: request.grade,
            })
            .await?;

        info!(account_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    /// Verify credentials and issue a fresh token pair.
    ///
    /// Unknown email and wrong password produce the same error so responses
    /// never reveal whether an address is registered.
    #[instrument(skip(self, request), fields(email = %request.email), name = "auth_login")]
    pub async fn login(&self, request: LoginRequest) -> Result<(Account, TokenPair)> {
        let email = Account::normalize_email(&request.email);

        let Some((account, password_hash)) =
            self.repository.get_account_with_password(&email).await?
        else {
            // Burn a verification anyway to keep timing uniform.
            let _ = verify_password(&request.password, &DUMMY_HASH);
            return Err(Error::auth(INVALID_CREDENTIALS, AuthErrorType::InvalidCredentials));
        };

        if !verify_password(&request.password, &password_hash)? {
            return Err(Error::auth(INVALID_CREDENTIALS, AuthErrorType::InvalidCredentials));
        }

        // The approval gate applies only at login. Tokens already issued
        // stay valid for their lifetime regardless of later state changes.
        if account.role == Role::Consultant && account.approval_state == ApprovalState::Pending {
            warn!(account_id = %account.id, "Login rejected for unapproved consultant");
            return Err(Error::forbidden("Your account is pending administrator approval"));
        }

        let pair = self.tokens.issue_pair(&account)?;
        self.repository
            .update_refresh_token(&account.id, Some(&pair.refresh_token))
            .await?;

        info!(account_id = %account.id, role = %account.role, "Login succeeded");
        Ok((account, pair))
    }

    /// Rotate a verified refresh token into a new pair.
    ///
    /// The presented token must match the single stored value exactly. A
    /// mismatch means the token was already rotated out, and the request is
    /// rejected without revealing which check failed.
    #[instrument(skip(self, claims, presented_token), fields(account_id = %claims.sub), name = "auth_refresh")]
    pub async fn refresh(&self, claims: &Claims, presented_token: &str) -> Result<TokenPair> {
        let id = AccountId::from_string(claims.sub.clone());
        let account = self
            .repository
            .get_account(&id)
            .await?
            .ok_or_else(|| Error::auth("Invalid refresh token", AuthErrorType::InvalidToken))?;

        match account.current_refresh_token.as_deref() {
            Some(stored) if stored == presented_token => {}
            _ => {
                warn!(account_id = %account.id, "Stale refresh token presented");
                return Err(Error::auth(
                    "Invalid refresh token",
                    AuthErrorType::StaleRefreshToken,
                ));
            }
        }

        let pair = self.tokens.issue_pair(&account)?;
        self.repository
            .update_refresh_token(&account.id, Some(&pair.refresh_token))
            .await?;

        Ok(pair)
    }

    /// Resolve the account behind a verified access token.
    #[instrument(skip(self), fields(account_id = %id), name = "auth_me")]
    pub async fn me(&self, id: &AccountId) -> Result<Account> {
        self.repository
            .get_account(id)
            .await?
            .ok_or_else(|| Error::auth("Invalid token", AuthErrorType::InvalidToken))
    }

    /// Consultants awaiting an approval decision.
    #[instrument(skip(self), name = "auth_list_pending_consultants")]
    pub async fn list_pending_consultants(&self) -> Result<Vec<Account>> {
        self.repository.list_by_approval(Role::Consultant, ApprovalState::Pending).await
    }

    /// Record an administrative approval decision for a consultant.
    #[instrument(skip(self), fields(account_id = %id, state = %state), name = "auth_set_consultant_approval")]
    pub async fn set_consultant_approval(
        &self,
        id: &AccountId,
        state: ApprovalState,
    ) -> Result<Account> {
        let account = self
            .repository
            .get_account(id)
            .await?
            .ok_or_else(|| Error::not_found("account", id.to_string()))?;

        if account.role != Role::Consultant {
            return Err(Error::validation(format!(
                "Account '{}' is not a consultant and has no approval workflow",
                id
            )));
        }

        self.repository.set_approval_state(id, state).await?;
        info!(account_id = %id, state = %state, "Approval decision recorded");

        self.repository
            .get_account(id)
            .await?
            .ok_or_else(|| Error::internal("Account not found after approval update"))
    }
}
