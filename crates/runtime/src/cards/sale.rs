use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgExecutor;

use cardvault_database::PgModel;

/// Append-only audit record of one card sale.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CardSale {
    pub id: Uuid,
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub quantity: i64,
    pub credits_earned: i64,
    pub created_at: i64,
}

impl PgModel for CardSale {
    const TABLE_NAME: &'static str = "card_sales";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "card_sales" (
            "id" UUID PRIMARY KEY,
            "user_id" UUID NOT NULL REFERENCES "users"("id"),
            "card_id" UUID NOT NULL REFERENCES "cards"("id"),
            "quantity" BIGINT NOT NULL,
            "credits_earned" BIGINT NOT NULL,
            "created_at" BIGINT NOT NULL
        );
    "#;
    const INDEXES_SQL: &'static [&'static str] = &[
        r#"CREATE INDEX IF NOT EXISTS "card_sales_user_idx" ON "card_sales" ("user_id");"#,
    ];
}

impl CardSale {
    pub fn new(
        user_id: Uuid,
        card_id: Uuid,
        quantity: i64,
        credits_earned: i64,
        now: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            card_id,
            quantity,
            credits_earned,
            created_at: now,
        }
    }

    pub async fn create<'e>(self, executor: impl PgExecutor<'e>) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "card_sales"
               ("id", "user_id", "card_id", "quantity", "credits_earned", "created_at")
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(self.card_id)
        .bind(self.quantity)
        .bind(self.credits_earned)
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
            r#"SELECT * FROM "card_sales" WHERE "user_id" = $1 ORDER BY "created_at" DESC"#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
