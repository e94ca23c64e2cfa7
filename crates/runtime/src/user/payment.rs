use serde::{Deserialize, Serialize};
use sqlx::types::{Json, Uuid};
use sqlx::PgExecutor;
use strum_macros::{Display, EnumString};

use cardvault_database::PgModel;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
    sqlx::Type,
)]
pub enum UserPaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Canceled,
}

/// One checkout session with the payment processor. Credits are granted
/// exactly once, when the webhook flips the status to `Completed`.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct UserPayment {
    pub id: Uuid,
    pub user_id: Uuid,

    pub checkout_session_id: String,
    pub url: String,

    pub amount_total: i64,
    pub currency: String,
    pub items: Json<serde_json::Value>,

    /// Credits granted when the session completes.
    pub credits: i64,

    pub status: UserPaymentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PgModel for UserPayment {
    const TABLE_NAME: &'static str = "user_payments";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "user_payments" (
            "id" UUID PRIMARY KEY,
            "user_id" UUID NOT NULL REFERENCES "users"("id"),
            "checkout_session_id" TEXT NOT NULL,
            "url" TEXT NOT NULL,
            "amount_total" BIGINT NOT NULL,
            "currency" TEXT NOT NULL,
            "items" JSONB NOT NULL,
            "credits" BIGINT NOT NULL,
            "status" TEXT NOT NULL,
            "created_at" BIGINT NOT NULL,
            "updated_at" BIGINT NOT NULL
        );
    "#;
    const INDEXES_SQL: &'static [&'static str] = &[
        r#"CREATE INDEX IF NOT EXISTS "user_payments_user_idx" ON "user_payments" ("user_id");"#,
        r#"CREATE INDEX IF NOT EXISTS "user_payments_session_idx" ON "user_payments" ("checkout_session_id");"#,
    ];
}

impl UserPayment {
    pub async fn create<'e>(self, executor: impl PgExecutor<'e>) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "user_payments"
               ("id", "user_id", "checkout_session_id", "url", "amount_total",
                "currency", "items", "credits", "status", "created_at", "updated_at")
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.checkout_session_id)
        .bind(&self.url)
        .bind(self.amount_total)
        .bind(&self.currency)
        .bind(&self.items)
        .bind(self.credits)
        .bind(&self.status)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(self)
    }

    /// Row-level lock so a replayed webhook cannot grant the bundle twice.
    pub async fn lock_by_session<'e>(
        checkout_session_id: &str,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "user_payments" WHERE "checkout_session_id" = $1 FOR UPDATE"#,
        )
        .bind(checkout_session_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn update_status<'e>(
        mut self,
        status: UserPaymentStatus,
        now: i64,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self, sqlx::Error> {
        self.status = status;
        self.updated_at = now;
        sqlx::query(
            r#"UPDATE "user_payments" SET "status" = $2, "updated_at" = $3 WHERE "id" = $1"#,
        )
        .bind(self.id)
        .bind(&self.status)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(self)
    }
}
