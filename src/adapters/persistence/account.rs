use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::account::{AccountProfile, AccountRepoTrait},
};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> AccountProfile {
    AccountProfile {
        id: row.get("id"),
        provider_customer_id: row.get("provider_customer_id"),
    }
}

#[async_trait]
impl AccountRepoTrait for PostgresPersistence {
    async fn get_by_id(&self, account_id: Uuid) -> AppResult<Option<AccountProfile>> {
        let row = sqlx::query("SELECT id, provider_customer_id FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn find_account_id_by_customer_id(&self, customer_id: &str) -> AppResult<Option<Uuid>> {
        let row = sqlx::query("SELECT id FROM accounts WHERE provider_customer_id = $1")
            .bind(customer_id)
            .fetch_optional(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(row.map(|r| r.get("id")))
    }

    async fn set_customer_id_if_unset(
        &self,
        account_id: Uuid,
        customer_id: &str,
    ) -> AppResult<Option<AccountProfile>> {
        // COALESCE keeps an existing link; the unique index on
        // provider_customer_id rejects a customer owned by another account.
        let row = sqlx::query(
            r#"
            UPDATE accounts SET
                provider_customer_id = COALESCE(provider_customer_id, $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, provider_customer_id
            "#,
        )
        .bind(account_id)
        .bind(customer_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }
}
