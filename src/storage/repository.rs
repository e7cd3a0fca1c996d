//! Account repository for the credential store.
//!
//! Provides the persistence operations the auth core needs: account creation,
//! lookup (with and without the password hash), the single-value refresh
//! ledger, and the administrative approval-state update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::instrument;

use crate::auth::account::{Account, ApprovalState, NewAccount, Role};
use crate::domain::{AccountId, FamilyId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

#[derive(Debug, Clone, FromRow)]
struct AccountRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub approval_state: String,
    pub current_refresh_token: Option<String>,
    pub family_id: Option<String>,
    pub school_name: Option<String>,
    pub grade: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, name, role, approval_state, \
     current_refresh_token, family_id, school_name, grade, created_at, updated_at";

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create a new account
    async fn create_account(&self, account: NewAccount) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>>;

    /// Get an account by email
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Get an account with its password hash for credential verification
    async fn get_account_with_password(&self, email: &str) -> Result<Option<(Account, String)>>;

    /// Overwrite the single live refresh token for an account
    async fn update_refresh_token(&self, id: &AccountId, token: Option<&str>) -> Result<()>;

    /// Record an administrative approval decision
    async fn set_approval_state(&self, id: &AccountId, state: ApprovalState) -> Result<()>;

    /// List accounts of a role in a given approval state
    async fn list_by_approval(&self, role: Role, state: ApprovalState) -> Result<Vec<Account>>;

    /// Count total accounts
    async fn count_accounts(&self) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct SqlxAccountRepository {
    pool: DbPool,
}

impl SqlxAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_account(&self, row: AccountRow) -> Result<Account> {
        let role = Role::from_str(&row.role)
            .map_err(|_| Error::validation(format!("Unknown role '{}'", row.role)))?;
        let approval_state = ApprovalState::from_str(&row.approval_state).map_err(|_| {
            Error::validation(format!("Unknown approval state '{}'", row.approval_state))
        })?;

        Ok(Account {
            id: AccountId::from_string(row.id),
            email: row.email,
            name: row.name,
            role,
            approval_state,
            current_refresh_token: row.current_refresh_token,
            family_id: row.family_id.map(FamilyId::from_string),
            school_name: row.school_name,
            grade: row.grade,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn fetch_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to fetch account by email".to_string(),
        })
    }
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    #[instrument(skip(self, account), fields(account_email = %account.email, account_id = %account.id), name = "db_create_account")]
    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let id = account.id.to_string();
        let role = account.role.to_string();
        let approval_state = account.approval_state.to_string();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, password_hash, name, role, approval_state,
                                  family_id, school_name, grade, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&role)
        .bind(&approval_state)
        .bind(account.family_id.as_ref().map(|f| f.as_str()))
        .bind(&account.school_name)
        .bind(account.grade)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to create account".to_string(),
        })?;

        self.get_account(&account.id)
            .await?
            .ok_or_else(|| Error::internal("Account not found after creation"))
    }

    #[instrument(skip(self), fields(account_id = %id), name = "db_get_account")]
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to fetch account".to_string(),
        })?;

        row.map(|r| self.row_to_account(r)).transpose()
    }

    #[instrument(skip(self, email), name = "db_get_account_by_email")]
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = self.fetch_by_email(email).await?;
        row.map(|r| self.row_to_account(r)).transpose()
    }

    #[instrument(skip(self, email), name = "db_get_account_with_password")]
    async fn get_account_with_password(&self, email: &str) -> Result<Option<(Account, String)>> {
        if let Some(row) = self.fetch_by_email(email).await? {
            let password_hash = row.password_hash.clone();
            let account = self.row_to_account(row)?;
            Ok(Some((account, password_hash)))
        } else {
            Ok(None)
        }
    }

    #[instrument(skip(self, token), fields(account_id = %id), name = "db_update_refresh_token")]
    async fn update_refresh_token(&self, id: &AccountId, token: Option<&str>) -> Result<()> {
        // Single-row overwrite: whatever value was stored before is gone,
        // which is exactly what rotates the previous refresh token out.
        sqlx::query("UPDATE accounts SET current_refresh_token = $1, updated_at = $2 WHERE id = $3")
            .bind(token)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| Error::Database {
                source: err,
                context: "Failed to update refresh token".to_string(),
            })?;

        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %id, state = %state), name = "db_set_approval_state")]
    async fn set_approval_state(&self, id: &AccountId, state: ApprovalState) -> Result<()> {
        sqlx::query("UPDATE accounts SET approval_state = $1, updated_at = $2 WHERE id = $3")
            .bind(state.to_string())
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| Error::Database {
                source: err,
                context: "Failed to update approval state".to_string(),
            })?;

        Ok(())
    }

    #[instrument(skip(self), fields(role = %role, state = %state), name = "db_list_by_approval")]
    async fn list_by_approval(&self, role: Role, state: ApprovalState) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE role = $1 AND approval_state = $2 ORDER BY created_at",
            ACCOUNT_COLUMNS
        ))
        .bind(role.to_string())
        .bind(state.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to list accounts by approval state".to_string(),
        })?;

        rows.into_iter().map(|r| self.row_to_account(r)).collect()
    }

    #[instrument(skip(self), name = "db_count_accounts")]
    async fn count_accounts(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(|err| Error::Database {
                source: err,
                context: "Failed to count accounts".to_string(),
            })?;

        Ok(count)
    }
}
