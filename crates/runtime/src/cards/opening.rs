use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgExecutor;

use cardvault_database::PgModel;

/// Append-only audit record of one pack opening. Never mutated or deleted.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PackOpening {
    pub id: Uuid,
    pub user_id: Uuid,
    pub pack_id: String,
    pub credits_spent: i64,
    /// Drawn card ids in draw order, duplicates included.
    pub card_ids: Vec<Uuid>,
    pub created_at: i64,
}

impl PgModel for PackOpening {
    const TABLE_NAME: &'static str = "pack_openings";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "pack_openings" (
            "id" UUID PRIMARY KEY,
            "user_id" UUID NOT NULL REFERENCES "users"("id"),
            "pack_id" TEXT NOT NULL,
            "credits_spent" BIGINT NOT NULL,
            "card_ids" UUID[] NOT NULL,
            "created_at" BIGINT NOT NULL
        );
    "#;
    const INDEXES_SQL: &'static [&'static str] = &[
        r#"CREATE INDEX IF NOT EXISTS "pack_openings_user_idx" ON "pack_openings" ("user_id");"#,
    ];
}

impl PackOpening {
    pub fn new(
        user_id: Uuid,
        pack_id: &str,
        credits_spent: i64,
        card_ids: Vec<Uuid>,
        now: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            pack_id: pack_id.to_string(),
            credits_spent,
            card_ids,
            created_at: now,
        }
    }

    pub async fn create<'e>(self, executor: impl PgExecutor<'e>) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "pack_openings"
               ("id", "user_id", "pack_id", "credits_spent", "card_ids", "created_at")
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.pack_id)
        .bind(self.credits_spent)
        .bind(&self.card_ids)
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
            r#"SELECT * FROM "pack_openings" WHERE "user_id" = $1 ORDER BY "created_at" DESC"#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
