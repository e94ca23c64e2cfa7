use chrono::{DateTime, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgExecutor;

use cardvault_database::PgModel;

use crate::error::EconomyError;

pub const STARTER_BALANCE: i64 = 500;
pub const DAILY_CLAIM_AMOUNT: i64 = 100;
pub const HOURLY_EARN_AMOUNT: i64 = 10;
pub const HOURLY_EARN_INTERVAL: i64 = 60 * 60;

/// A user's credit balance plus the claim bookkeeping. The balance is only
/// ever written through the methods below; `balance >= 0` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreditAccount {
    pub user_id: Uuid,

    pub balance: i64,
    pub last_earn_at: i64,
    pub last_daily_claim_at: Option<i64>,
    pub packs_opened: i64,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Daily-claim eligibility. The window is the UTC calendar day, not a
/// rolling 24 hours: 23:59 and 00:01 the next day are two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyClaimState {
    NoClaimYet,
    ClaimedToday { next_eligible_at: i64 },
    EligibleAgain,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DailyClaim {
    pub granted: bool,
    pub amount: i64,
    pub next_eligible_at: i64,
}

fn utc_day(ts: i64) -> NaiveDate {
    DateTime::from_timestamp(ts, 0)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .date_naive()
}

/// 00:00 UTC of the day after `ts`.
fn next_utc_midnight(ts: i64) -> i64 {
    utc_day(ts)
        .checked_add_days(Days::new(1))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(ts)
}

impl PgModel for CreditAccount {
    const TABLE_NAME: &'static str = "credit_accounts";
    const CREATE_TABLE_SQL: &'static str = r#"
        CREATE TABLE IF NOT EXISTS "credit_accounts" (
            "user_id" UUID PRIMARY KEY REFERENCES "users"("id"),
            "balance" BIGINT NOT NULL CHECK ("balance" >= 0),
            "last_earn_at" BIGINT NOT NULL,
            "last_daily_claim_at" BIGINT,
            "packs_opened" BIGINT NOT NULL,
            "created_at" BIGINT NOT NULL,
            "updated_at" BIGINT NOT NULL
        );
    "#;
}

impl CreditAccount {
    pub fn new(user_id: Uuid, now: i64) -> Self {
        Self {
            user_id,
            balance: STARTER_BALANCE,
            last_earn_at: now,
            last_daily_claim_at: None,
            packs_opened: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn daily_claim_state(&self, now: i64) -> DailyClaimState {
        match self.last_daily_claim_at {
            None => DailyClaimState::NoClaimYet,
            Some(last) if utc_day(last) < utc_day(now) => DailyClaimState::EligibleAgain,
            Some(_) => DailyClaimState::ClaimedToday {
                next_eligible_at: next_utc_midnight(now),
            },
        }
    }

    /// Grants the daily bonus at most once per UTC calendar day. Never
    /// fails; an ineligible claim reports when the next window opens.
    pub fn claim_daily(&mut self, now: i64) -> DailyClaim {
        match self.daily_claim_state(now) {
            DailyClaimState::ClaimedToday { next_eligible_at } => DailyClaim {
                granted: false,
                amount: 0,
                next_eligible_at,
            },
            DailyClaimState::NoClaimYet | DailyClaimState::EligibleAgain => {
                self.balance += DAILY_CLAIM_AMOUNT;
                self.last_daily_claim_at = Some(now);
                DailyClaim {
                    granted: true,
                    amount: DAILY_CLAIM_AMOUNT,
                    next_eligible_at: next_utc_midnight(now),
                }
            }
        }
    }

    /// Passive trickle: one fixed tick once an hour has elapsed, at most one
    /// tick per call. Hours missed in between are not backfilled.
    pub fn tick_hourly_earn(&mut self, now: i64) -> Option<i64> {
        if now - self.last_earn_at < HOURLY_EARN_INTERVAL {
            return None;
        }
        self.balance += HOURLY_EARN_AMOUNT;
        self.last_earn_at = now;
        Some(HOURLY_EARN_AMOUNT)
    }

    pub fn debit(&mut self, amount: i64) -> Result<(), EconomyError> {
        if self.balance < amount {
            return Err(EconomyError::InsufficientCredits {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: i64) {
        self.balance += amount;
    }

    pub async fn create<'e>(self, executor: impl PgExecutor<'e>) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "credit_accounts"
               ("user_id", "balance", "last_earn_at", "last_daily_claim_at",
                "packs_opened", "created_at", "updated_at")
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(self.user_id)
        .bind(self.balance)
        .bind(self.last_earn_at)
        .bind(self.last_daily_claim_at)
        .bind(self.packs_opened)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(self)
    }

    pub async fn find_by_user<'e>(
        user_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(r#"SELECT * FROM "credit_accounts" WHERE "user_id" = $1"#)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Row-level lock for the duration of the surrounding transaction.
    /// Every economy operation takes this before validating preconditions.
    pub async fn lock_by_user<'e>(
        user_id: Uuid,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"SELECT * FROM "credit_accounts" WHERE "user_id" = $1 FOR UPDATE"#,
        )
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn update<'e>(
        mut self,
        now: i64,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self, sqlx::Error> {
        self.updated_at = now;
        sqlx::query(
            r#"UPDATE "credit_accounts"
               SET "balance" = $2, "last_earn_at" = $3, "last_daily_claim_at" = $4,
                   "packs_opened" = $5, "updated_at" = $6
               WHERE "user_id" = $1"#,
        )
        .bind(self.user_id)
        .bind(self.balance)
        .bind(self.last_earn_at)
        .bind(self.last_daily_claim_at)
        .bind(self.packs_opened)
        .bind(self.updated_at)
        .execute(executor)
        .await?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> CreditAccount {
        CreditAccount::new(Uuid::new_v4(), 0)
    }

    // 2024-01-01T23:59:00Z
    const NEW_YEARS_EVE: i64 = 1_704_153_540;
    // 2024-01-02T00:01:00Z
    const NEW_YEARS_DAY: i64 = 1_704_153_660;

    #[test]
    fn first_claim_is_always_granted() {
        let mut acc = account();
        let claim = acc.claim_daily(NEW_YEARS_EVE);
        assert!(claim.granted);
        assert_eq!(claim.amount, DAILY_CLAIM_AMOUNT);
        assert_eq!(acc.balance, STARTER_BALANCE + DAILY_CLAIM_AMOUNT);
        assert_eq!(acc.last_daily_claim_at, Some(NEW_YEARS_EVE));
    }

    #[test]
    fn second_claim_on_same_utc_day_is_rejected() {
        let mut acc = account();
        assert!(acc.claim_daily(NEW_YEARS_EVE).granted);
        let again = acc.claim_daily(NEW_YEARS_EVE + 1);
        assert!(!again.granted);
        assert_eq!(again.amount, 0);
        assert_eq!(acc.balance, STARTER_BALANCE + DAILY_CLAIM_AMOUNT);
        // next window opens at 2024-01-02T00:00:00Z
        assert_eq!(again.next_eligible_at, 1_704_153_600);
    }

    #[test]
    fn utc_date_boundary_beats_elapsed_time() {
        let mut acc = account();
        assert!(acc.claim_daily(NEW_YEARS_EVE).granted);
        // two minutes later, but a different UTC calendar date
        assert!(acc.claim_daily(NEW_YEARS_DAY).granted);

        let mut acc = account();
        assert!(acc.claim_daily(NEW_YEARS_DAY).granted);
        // 23 hours later, same UTC date
        let same_day = acc.claim_daily(NEW_YEARS_DAY + 23 * 60 * 60);
        assert!(!same_day.granted);
    }

    #[test]
    fn claim_is_granted_again_a_full_day_later() {
        let mut acc = account();
        assert!(acc.claim_daily(NEW_YEARS_EVE).granted);
        assert!(acc.claim_daily(NEW_YEARS_EVE + 24 * 60 * 60).granted);
    }

    #[test]
    fn hourly_earn_requires_a_full_hour() {
        let mut acc = account();
        acc.last_earn_at = 10_000;
        assert_eq!(acc.tick_hourly_earn(10_000 + HOURLY_EARN_INTERVAL - 1), None);
        assert_eq!(acc.balance, STARTER_BALANCE);

        assert_eq!(
            acc.tick_hourly_earn(10_000 + HOURLY_EARN_INTERVAL),
            Some(HOURLY_EARN_AMOUNT)
        );
        assert_eq!(acc.balance, STARTER_BALANCE + HOURLY_EARN_AMOUNT);
        assert_eq!(acc.last_earn_at, 10_000 + HOURLY_EARN_INTERVAL);
    }

    #[test]
    fn hourly_earn_does_not_backfill_missed_hours() {
        let mut acc = account();
        acc.last_earn_at = 0;
        // five hours elapsed, still a single tick
        assert_eq!(acc.tick_hourly_earn(5 * HOURLY_EARN_INTERVAL), Some(HOURLY_EARN_AMOUNT));
        assert_eq!(acc.balance, STARTER_BALANCE + HOURLY_EARN_AMOUNT);
        // and nothing more until another hour passes
        assert_eq!(acc.tick_hourly_earn(5 * HOURLY_EARN_INTERVAL + 1), None);
    }

    #[test]
    fn debit_never_drives_balance_negative() {
        let mut acc = account();
        let err = acc.debit(STARTER_BALANCE + 1).unwrap_err();
        match err {
            EconomyError::InsufficientCredits { required, available } => {
                assert_eq!(required, STARTER_BALANCE + 1);
                assert_eq!(available, STARTER_BALANCE);
            }
            other => panic!("unexpected error: {other}"),
        }
        // rejected debit leaves the balance untouched
        assert_eq!(acc.balance, STARTER_BALANCE);

        acc.debit(STARTER_BALANCE).unwrap();
        assert_eq!(acc.balance, 0);
    }
}
