mod account;
mod log;
mod payment;

use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgExecutor;
use strum_macros::{Display, EnumString};

use cardvault_database::PgModel;

pub use account::{
    CreditAccount, DailyClaim, DailyClaimState, DAILY_CLAIM_AMOUNT, HOURLY_EARN_AMOUNT,
    HOURLY_EARN_INTERVAL, STARTER_BALANCE,
};
pub use log::{CreditLog, CreditLogReason};
pub use payment::{UserPayment, UserPaymentStatus};

#[derive(
    Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Display, EnumString, Default, sqlx::Type,
)]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

/// Local anchor for an externally-authenticated user. Identity and sessions
/// live with the OAuth provider; `user_id` is the provider's subject.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_id: String,
    pub user_aka: String,

    pub role: UserRole,
    pub provider: String,

    pub last_active: i64,

    pub created_at: i64,
    pub updated_at: i64,
}

impl PgModel for User {
    const TABLE_NAME: &'static str = "users";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "users" (
            "id" UUID PRIMARY KEY,
            "user_id" TEXT NOT NULL UNIQUE,
            "user_aka" TEXT NOT NULL,
            "role" TEXT NOT NULL,
            "provider" TEXT NOT NULL,
            "last_active" BIGINT NOT NULL,
            "created_at" BIGINT NOT NULL,
            "updated_at" BIGINT NOT NULL
        );
    "#;
}

impl User {
    pub fn new(user_id: &str, user_aka: &str, provider: &str, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            user_aka: user_aka.to_string(),
            role: UserRole::default(),
            provider: provider.to_string(),
            last_active: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn create<'e>(self, executor: impl PgExecutor<'e>) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "users"
               ("id", "user_id", "user_aka", "role", "provider",
                "last_active", "created_at", "updated_at")
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(self.id)
        .bind(&self.user_id)
        .bind(&self.user_aka)
        .bind(&self.role)
        .bind(&self.provider)
        .bind(self.last_active)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(self)
    }

    pub async fn find_by_id<'e>(
        id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE "id" = $1"#)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_external_id<'e>(
        user_id: &str,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE "user_id" = $1"#)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn touch_last_active<'e>(
        &self,
        now: i64,
        executor: impl PgExecutor<'e>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(r#"UPDATE "users" SET "last_active" = $2, "updated_at" = $2 WHERE "id" = $1"#)
            .bind(self.id)
            .bind(now)
            .execute(executor)
            .await?;
        Ok(())
    }
}
