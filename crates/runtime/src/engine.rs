use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use sqlx::types::Uuid;
use sqlx::PgPool;

use cardvault_database::is_retryable;

use crate::cards::{draw_pack, resolve_pack, sell_value, Card, CardSale, PackOpening};
use crate::error::EconomyError;
use crate::inventory::OwnedCard;
use crate::user::{CreditAccount, CreditLog, DailyClaim, UserPayment, UserPaymentStatus};

const MAX_TX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 50;

#[derive(Debug, Serialize)]
pub struct PackOpened {
    pub opening_id: Uuid,
    pub pack_id: &'static str,
    pub cards: Vec<Card>,
    pub credits_spent: i64,
    pub remaining_credits: i64,
}

#[derive(Debug, Serialize)]
pub struct SaleOutcome {
    pub credits_earned: i64,
    pub new_balance: i64,
    pub remaining_quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct ClaimOutcome {
    pub granted: bool,
    pub amount: i64,
    pub balance: i64,
    pub next_eligible_at: i64,
}

#[derive(Debug, Serialize)]
pub struct BalanceView {
    pub balance: i64,
    pub last_earn_at: i64,
    /// Credits granted by the passive hourly tick during this call, 0 if
    /// none were due.
    pub earned: i64,
}

/// Replays an operation whose transaction lost a serialization or deadlock
/// race. Operations commit whole or leave nothing behind, so a replay
/// starts from clean state.
async fn with_tx_retry<T, F, Fut>(op: &'static str, mut run: F) -> Result<T, EconomyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EconomyError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match run().await {
            Err(EconomyError::Database(err)) if is_retryable(&err) => {
                if attempts >= MAX_TX_ATTEMPTS {
                    tracing::error!("[{op}] giving up after {attempts} conflicting attempts");
                    return Err(EconomyError::Conflict { attempts });
                }
                let backoff = Duration::from_millis(RETRY_BACKOFF_MS << attempts);
                tracing::warn!("[{op}] transaction conflict, retrying in {backoff:?}: {err}");
                tokio::time::sleep(backoff).await;
            }
            other => return other,
        }
    }
}

/// Debits the pack cost, draws the cards, adds them to the inventory and
/// records the opening, all in one transaction against the locked account
/// row. Unknown pack ids resolve to the standard pack.
pub async fn open_pack(
    pool: &PgPool,
    user_id: Uuid,
    pack_id: &str,
    now: i64,
) -> Result<PackOpened, EconomyError> {
    with_tx_retry("open_pack", || open_pack_once(pool, user_id, pack_id, now)).await
}

async fn open_pack_once(
    pool: &PgPool,
    user_id: Uuid,
    pack_id: &str,
    now: i64,
) -> Result<PackOpened, EconomyError> {
    let pack = resolve_pack(pack_id);

    let mut tx = pool.begin().await?;
    let mut account = CreditAccount::lock_by_user(user_id, &mut *tx)
        .await?
        .ok_or(EconomyError::AccountNotFound(user_id))?;

    account.debit(pack.cost)?;

    let catalog = Card::find_all(&mut *tx).await?;
    let drawn: Vec<Card> = draw_pack(pack, &catalog)?.into_iter().cloned().collect();

    for card in &drawn {
        OwnedCard::add(user_id, card.id, 1, now, &mut *tx).await?;
    }

    account.packs_opened += 1;
    let account = account.update(now, &mut *tx).await?;

    let opening = PackOpening::new(
        user_id,
        pack.id,
        pack.cost,
        drawn.iter().map(|c| c.id).collect(),
        now,
    )
    .create(&mut *tx)
    .await?;
    CreditLog::from_pack_purchase(user_id, pack.cost, account.balance, now)
        .create(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "[open_pack] user {user_id} opened {} for {} credits",
        pack.id,
        pack.cost
    );
    Ok(PackOpened {
        opening_id: opening.id,
        pack_id: pack.id,
        cards: drawn,
        credits_spent: pack.cost,
        remaining_credits: account.balance,
    })
}

/// Sells `quantity` copies of a card back for credits. All-or-nothing: an
/// insufficient quantity rejects the whole sale and reports the owned
/// amount.
pub async fn sell_cards(
    pool: &PgPool,
    user_id: Uuid,
    card_id: Uuid,
    quantity: i64,
    now: i64,
) -> Result<SaleOutcome, EconomyError> {
    if quantity < 1 {
        return Err(EconomyError::InvalidQuantity(quantity));
    }
    with_tx_retry("sell_cards", || {
        sell_cards_once(pool, user_id, card_id, quantity, now)
    })
    .await
}

async fn sell_cards_once(
    pool: &PgPool,
    user_id: Uuid,
    card_id: Uuid,
    quantity: i64,
    now: i64,
) -> Result<SaleOutcome, EconomyError> {
    let mut tx = pool.begin().await?;
    let mut account = CreditAccount::lock_by_user(user_id, &mut *tx)
        .await?
        .ok_or(EconomyError::AccountNotFound(user_id))?;

    let card = Card::find_by_id(card_id, &mut *tx)
        .await?
        .ok_or(EconomyError::UnknownCard(card_id))?;
    let owned = OwnedCard::lock(user_id, card_id, &mut *tx)
        .await?
        .ok_or(EconomyError::CardNotOwned(card_id))?;

    if owned.quantity < quantity {
        return Err(EconomyError::InsufficientQuantity {
            requested: quantity,
            owned: owned.quantity,
        });
    }

    let credits_earned = sell_value(card.rarity, card.rating) * quantity;
    let remaining_quantity = owned.deduct(quantity, &mut *tx).await?;

    account.credit(credits_earned);
    let account = account.update(now, &mut *tx).await?;

    CardSale::new(user_id, card_id, quantity, credits_earned, now)
        .create(&mut *tx)
        .await?;
    CreditLog::from_card_sale(user_id, credits_earned, account.balance, now)
        .create(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(SaleOutcome {
        credits_earned,
        new_balance: account.balance,
        remaining_quantity,
    })
}

/// The once-per-UTC-day bonus claim. Eligibility is evaluated against the
/// locked account row, so two racing claims can never both be granted.
/// Never fails for an ineligible claim; the outcome carries the next
/// eligible instant instead.
pub async fn claim_daily(
    pool: &PgPool,
    user_id: Uuid,
    now: i64,
) -> Result<ClaimOutcome, EconomyError> {
    with_tx_retry("claim_daily", || claim_daily_once(pool, user_id, now)).await
}

async fn claim_daily_once(
    pool: &PgPool,
    user_id: Uuid,
    now: i64,
) -> Result<ClaimOutcome, EconomyError> {
    let mut tx = pool.begin().await?;
    let mut account = CreditAccount::lock_by_user(user_id, &mut *tx)
        .await?
        .ok_or(EconomyError::AccountNotFound(user_id))?;

    let DailyClaim {
        granted,
        amount,
        next_eligible_at,
    } = account.claim_daily(now);

    if granted {
        let account = account.update(now, &mut *tx).await?;
        CreditLog::from_daily_claim(user_id, amount, account.balance, now)
            .create(&mut *tx)
            .await?;
        tx.commit().await?;
        return Ok(ClaimOutcome {
            granted,
            amount,
            balance: account.balance,
            next_eligible_at,
        });
    }

    tx.commit().await?;
    Ok(ClaimOutcome {
        granted,
        amount,
        balance: account.balance,
        next_eligible_at,
    })
}

/// Reads the balance, applying the hourly passive tick when one is due.
pub async fn balance(pool: &PgPool, user_id: Uuid, now: i64) -> Result<BalanceView, EconomyError> {
    with_tx_retry("balance", || balance_once(pool, user_id, now)).await
}

async fn balance_once(
    pool: &PgPool,
    user_id: Uuid,
    now: i64,
) -> Result<BalanceView, EconomyError> {
    let mut tx = pool.begin().await?;
    let mut account = CreditAccount::lock_by_user(user_id, &mut *tx)
        .await?
        .ok_or(EconomyError::AccountNotFound(user_id))?;

    let earned = account.tick_hourly_earn(now);
    if let Some(amount) = earned {
        account = account.update(now, &mut *tx).await?;
        CreditLog::from_hourly_earn(user_id, amount, account.balance, now)
            .create(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(BalanceView {
        balance: account.balance,
        last_earn_at: account.last_earn_at,
        earned: earned.unwrap_or(0),
    })
}

/// Marks a checkout session completed and credits its bundle, in one
/// transaction against the locked payment row. Sessions that are unknown
/// or already settled return `None` so a replayed webhook is a no-op.
pub async fn complete_credit_purchase(
    pool: &PgPool,
    checkout_session_id: &str,
    now: i64,
) -> Result<Option<i64>, EconomyError> {
    with_tx_retry("complete_credit_purchase", || {
        complete_credit_purchase_once(pool, checkout_session_id, now)
    })
    .await
}

async fn complete_credit_purchase_once(
    pool: &PgPool,
    checkout_session_id: &str,
    now: i64,
) -> Result<Option<i64>, EconomyError> {
    let mut tx = pool.begin().await?;
    let Some(payment) = UserPayment::lock_by_session(checkout_session_id, &mut *tx).await? else {
        return Ok(None);
    };
    if payment.status != UserPaymentStatus::Pending {
        return Ok(None);
    }

    let mut account = CreditAccount::lock_by_user(payment.user_id, &mut *tx)
        .await?
        .ok_or(EconomyError::AccountNotFound(payment.user_id))?;

    account.credit(payment.credits);
    let account = account.update(now, &mut *tx).await?;
    CreditLog::from_credit_purchase(payment.user_id, payment.credits, account.balance, now)
        .create(&mut *tx)
        .await?;
    payment
        .update_status(UserPaymentStatus::Completed, now, &mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Some(account.balance))
}
