use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgExecutor;
use strum_macros::{Display, EnumString};

use cardvault_database::PgModel;

/// The four rarity tiers, ordered rarest first. Draw sampling, pool fallback
/// and valuation all walk tiers in this order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, Default, sqlx::Type,
)]
pub enum Rarity {
    Super,
    Epic,
    Rare,
    #[default]
    Common,
}

/// Fixed bucket-walk order: Super, Epic, Rare, Common.
pub const DRAW_ORDER: [Rarity; 4] = [Rarity::Super, Rarity::Epic, Rarity::Rare, Rarity::Common];

impl Rarity {
    pub fn draw_order_index(self) -> usize {
        match self {
            Rarity::Super => 0,
            Rarity::Epic => 1,
            Rarity::Rare => 2,
            Rarity::Common => 3,
        }
    }
}

/// A catalog card. The catalog is read-only to the economy: rows are seeded
/// by admins and `rarity` never changes once assigned.
#[derive(Clone, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Card {
    pub id: Uuid,
    pub name: String,
    pub rarity: Rarity,

    pub attack: i64,
    pub defense: i64,
    pub speed: i64,
    pub stamina: i64,
    pub technique: i64,
    pub instinct: i64,
    // derived from the six attributes at seeding time
    pub rating: i64,

    pub image_url: String,

    pub created_at: i64,
    pub updated_at: i64,
}

impl PgModel for Card {
    const TABLE_NAME: &'static str = "cards";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "cards" (
            "id" UUID PRIMARY KEY,
            "name" TEXT NOT NULL,
            "rarity" TEXT NOT NULL,
            "attack" BIGINT NOT NULL,
            "defense" BIGINT NOT NULL,
            "speed" BIGINT NOT NULL,
            "stamina" BIGINT NOT NULL,
            "technique" BIGINT NOT NULL,
            "instinct" BIGINT NOT NULL,
            "rating" BIGINT NOT NULL,
            "image_url" TEXT NOT NULL DEFAULT '',
            "created_at" BIGINT NOT NULL,
            "updated_at" BIGINT NOT NULL
        );
    "#;
    const INDEXES_SQL: &'static [&'static str] =
        &[r#"CREATE INDEX IF NOT EXISTS "cards_rarity_idx" ON "cards" ("rarity");"#];
}

impl Card {
    pub async fn create<'e>(self, executor: impl PgExecutor<'e>) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "cards"
               ("id", "name", "rarity", "attack", "defense", "speed", "stamina",
                "technique", "instinct", "rating", "image_url", "created_at", "updated_at")
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(self.rarity)
        .bind(self.attack)
        .bind(self.defense)
        .bind(self.speed)
        .bind(self.stamina)
        .bind(self.technique)
        .bind(self.instinct)
        .bind(self.rating)
        .bind(&self.image_url)
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
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "cards" WHERE "id" = $1"#)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_all<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "cards" ORDER BY "created_at""#)
            .fetch_all(executor)
            .await
    }

    pub async fn find_by_rarity<'e>(
        rarity: Rarity,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "cards" WHERE "rarity" = $1"#)
            .bind(rarity)
            .fetch_all(executor)
            .await
    }
}
