use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgExecutor;

use cardvault_database::PgModel;

/// One (user, card) ownership row. `quantity` is strictly positive while
/// the row exists; a sale that exhausts the quantity deletes the row
/// instead of leaving it at zero. `first_acquired_at` is set once and
/// survives later re-acquisitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OwnedCard {
    pub user_id: Uuid,
    pub card_id: Uuid,
    pub quantity: i64,
    pub first_acquired_at: i64,
}

impl PgModel for OwnedCard {
    const TABLE_NAME: &'static str = "owned_cards";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "owned_cards" (
            "user_id" UUID NOT NULL REFERENCES "users"("id"),
            "card_id" UUID NOT NULL REFERENCES "cards"("id"),
            "quantity" BIGINT NOT NULL CHECK ("quantity" > 0),
            "first_acquired_at" BIGINT NOT NULL,
            PRIMARY KEY ("user_id", "card_id")
        );
    "#;
}

impl OwnedCard {
    pub async fn find<'e>(
        user_id: Uuid,
        card_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "owned_cards" WHERE "user_id" = $1 AND "card_id" = $2"#,
        )
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(executor)
        .await
    }

    /// Row-level lock held for the surrounding transaction.
    pub async fn lock<'e>(
        user_id: Uuid,
        card_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "owned_cards" WHERE "user_id" = $1 AND "card_id" = $2 FOR UPDATE"#,
        )
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_user<'e>(
        user_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "owned_cards" WHERE "user_id" = $1 ORDER BY "first_acquired_at""#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Adds copies of a card, creating the row on first acquisition.
    /// `first_acquired_at` is untouched when the row already exists.
    pub async fn add<'e>(
        user_id: Uuid,
        card_id: Uuid,
        quantity: i64,
        now: i64,
        executor: impl PgExecutor<'e>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "owned_cards" ("user_id", "card_id", "quantity", "first_acquired_at")
               VALUES ($1, $2, $3, $4)
               ON CONFLICT ("user_id", "card_id")
               DO UPDATE SET "quantity" = "owned_cards"."quantity" + EXCLUDED."quantity""#,
        )
        .bind(user_id)
        .bind(card_id)
        .bind(quantity)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Removes `quantity` copies, deleting the row when it reaches zero.
    /// The caller must hold the row lock and have validated the quantity.
    /// Returns the remaining quantity.
    pub async fn deduct<'e>(
        &self,
        quantity: i64,
        executor: impl PgExecutor<'e>,
    ) -> Result<i64, sqlx::Error> {
        let remaining = self.quantity - quantity;
        if remaining <= 0 {
            sqlx::query(
                r#"DELETE FROM "owned_cards" WHERE "user_id" = $1 AND "card_id" = $2"#,
            )
            .bind(self.user_id)
            .bind(self.card_id)
            .execute(executor)
            .await?;
            Ok(0)
        } else {
            sqlx::query(
                r#"UPDATE "owned_cards" SET "quantity" = $3
                   WHERE "user_id" = $1 AND "card_id" = $2"#,
            )
            .bind(self.user_id)
            .bind(self.card_id)
            .bind(remaining)
            .execute(executor)
            .await?;
            Ok(remaining)
        }
    }
}
