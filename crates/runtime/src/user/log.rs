use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgExecutor;
use strum_macros::{Display, EnumString};

use cardvault_database::PgModel;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
    sqlx::Type,
)]
pub enum CreditLogReason {
    #[default]
    Registration,
    DailyClaim,
    HourlyEarn,
    PackPurchase,
    CardSale,
    CreditPurchase,
}

/// Append-only journal of every balance mutation. `delta` is negative for
/// debits; `balance_after` is the balance the mutating transaction
/// committed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreditLog {
    pub id: Uuid,
    pub user_id: Uuid,

    pub reason: CreditLogReason,
    pub delta: i64,
    pub balance_after: i64,

    pub created_at: i64,
}

impl PgModel for CreditLog {
    const TABLE_NAME: &'static str = "credit_logs";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "credit_logs" (
            "id" UUID PRIMARY KEY,
            "user_id" UUID NOT NULL REFERENCES "users"("id"),
            "reason" TEXT NOT NULL,
            "delta" BIGINT NOT NULL,
            "balance_after" BIGINT NOT NULL,
            "created_at" BIGINT NOT NULL
        );
    "#;
    const INDEXES_SQL: &'static [&'static str] = &[
        r#"CREATE INDEX IF NOT EXISTS "credit_logs_user_idx" ON "credit_logs" ("user_id");"#,
    ];
}

impl CreditLog {
    fn new(user_id: Uuid, reason: CreditLogReason, delta: i64, balance_after: i64, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            reason,
            delta,
            balance_after,
            created_at: now,
        }
    }

    pub fn from_registration(user_id: Uuid, amount: i64, balance_after: i64, now: i64) -> Self {
        Self::new(user_id, CreditLogReason::Registration, amount, balance_after, now)
    }

    pub fn from_daily_claim(user_id: Uuid, amount: i64, balance_after: i64, now: i64) -> Self {
        Self::new(user_id, CreditLogReason::DailyClaim, amount, balance_after, now)
    }

    pub fn from_hourly_earn(user_id: Uuid, amount: i64, balance_after: i64, now: i64) -> Self {
        Self::new(user_id, CreditLogReason::HourlyEarn, amount, balance_after, now)
    }

    pub fn from_pack_purchase(user_id: Uuid, cost: i64, balance_after: i64, now: i64) -> Self {
        Self::new(user_id, CreditLogReason::PackPurchase, -cost, balance_after, now)
    }

    pub fn from_card_sale(user_id: Uuid, earned: i64, balance_after: i64, now: i64) -> Self {
        Self::new(user_id, CreditLogReason::CardSale, earned, balance_after, now)
    }

    pub fn from_credit_purchase(user_id: Uuid, amount: i64, balance_after: i64, now: i64) -> Self {
        Self::new(user_id, CreditLogReason::CreditPurchase, amount, balance_after, now)
    }

    pub async fn create<'e>(self, executor: impl PgExecutor<'e>) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "credit_logs"
               ("id", "user_id", "reason", "delta", "balance_after", "created_at")
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(self.reason)
        .bind(self.delta)
        .bind(self.balance_after)
        .bind(self.created_at)
        .execute(executor)
        .await?;
        Ok(self)
    }

    pub async fn find_by_user<'e>(
        user_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "credit_logs" WHERE "user_id" = $1 ORDER BY "created_at" DESC"#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
