//! Transactional-path tests against a live Postgres. Run with
//! `cargo test -- --ignored` and a `DATABASE_URL` pointing at a scratch
//! database.

use sqlx::types::Uuid;
use sqlx::PgPool;

use cardvault_runtime::{
    balance, claim_daily, open_pack, sell_cards, Card, CardSale, CreditAccount, EconomyError,
    OwnedCard, PackOpening, Rarity, User, UserPayment, CreditLog, HOURLY_EARN_AMOUNT,
    HOURLY_EARN_INTERVAL, STARTER_BALANCE,
};

cardvault_database::init_tables!([
    User,
    Card,
    CreditAccount,
    OwnedCard,
    PackOpening,
    CardSale,
    CreditLog,
    UserPayment,
]);

const NOW: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z

async fn setup() -> &'static PgPool {
    connect(false, true).await
}

async fn new_account(pool: &PgPool) -> CreditAccount {
    let suffix = Uuid::new_v4();
    let user = User::new(&format!("test_user_{suffix}"), "nono", "test_provider", NOW)
        .create(pool)
        .await
        .unwrap();
    CreditAccount::new(user.id, NOW).create(pool).await.unwrap()
}

async fn seed_card(pool: &PgPool, rarity: Rarity, rating: i64) -> Card {
    Card {
        id: Uuid::new_v4(),
        name: format!("test_card_{}", Uuid::new_v4()),
        rarity,
        attack: rating,
        defense: rating,
        speed: rating,
        stamina: rating,
        technique: rating,
        instinct: rating,
        rating,
        image_url: String::new(),
        created_at: NOW,
        updated_at: NOW,
    }
    .create(pool)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn pack_purchases_stop_exactly_at_zero_balance() {
    let pool = setup().await;
    let account = new_account(pool).await;
    seed_card(pool, Rarity::Common, 70).await;

    // starter balance covers exactly five standard packs
    for i in 1..=5i64 {
        let opened = open_pack(pool, account.user_id, "standard", NOW + i).await.unwrap();
        assert_eq!(opened.cards.len(), 5);
        assert_eq!(opened.remaining_credits, STARTER_BALANCE - i * 100);
    }

    let err = open_pack(pool, account.user_id, "standard", NOW + 6)
        .await
        .unwrap_err();
    match err {
        EconomyError::InsufficientCredits { required, available } => {
            assert_eq!(required, 100);
            assert_eq!(available, 0);
        }
        other => panic!("unexpected error: {other}"),
    }

    // the rejected purchase left nothing behind
    let account = CreditAccount::find_by_user(account.user_id, pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.balance, 0);
    assert_eq!(account.packs_opened, 5);
    let openings = PackOpening::find_by_user(account.user_id, pool).await.unwrap();
    assert_eq!(openings.len(), 5);
}

#[tokio::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn unknown_pack_id_opens_the_standard_pack() {
    let pool = setup().await;
    let account = new_account(pool).await;
    seed_card(pool, Rarity::Common, 70).await;

    let opened = open_pack(pool, account.user_id, "no-such-pack", NOW).await.unwrap();
    assert_eq!(opened.pack_id, "standard");
    assert_eq!(opened.credits_spent, 100);
}

#[tokio::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn selling_exhausts_and_deletes_the_ownership_row() {
    let pool = setup().await;
    let account = new_account(pool).await;
    let card = seed_card(pool, Rarity::Epic, 96).await;
    OwnedCard::add(account.user_id, card.id, 3, NOW, pool).await.unwrap();

    let sale = sell_cards(pool, account.user_id, card.id, 2, NOW).await.unwrap();
    // Epic at rating 96 sells for floor(100 * 2.0) per copy
    assert_eq!(sale.credits_earned, 400);
    assert_eq!(sale.new_balance, STARTER_BALANCE + 400);
    assert_eq!(sale.remaining_quantity, 1);

    let err = sell_cards(pool, account.user_id, card.id, 2, NOW).await.unwrap_err();
    match err {
        EconomyError::InsufficientQuantity { requested, owned } => {
            assert_eq!(requested, 2);
            assert_eq!(owned, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    let sale = sell_cards(pool, account.user_id, card.id, 1, NOW).await.unwrap();
    assert_eq!(sale.remaining_quantity, 0);
    assert!(OwnedCard::find(account.user_id, card.id, pool)
        .await
        .unwrap()
        .is_none());

    // the row is gone, so another sale is a not-owned rejection
    let err = sell_cards(pool, account.user_id, card.id, 1, NOW).await.unwrap_err();
    assert!(matches!(err, EconomyError::CardNotOwned(_)));
}

#[tokio::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn zero_quantity_sales_are_rejected_before_touching_anything() {
    let pool = setup().await;
    let account = new_account(pool).await;
    let card = seed_card(pool, Rarity::Rare, 80).await;
    OwnedCard::add(account.user_id, card.id, 1, NOW, pool).await.unwrap();

    let err = sell_cards(pool, account.user_id, card.id, 0, NOW).await.unwrap_err();
    assert!(matches!(err, EconomyError::InvalidQuantity(0)));
    let err = sell_cards(pool, account.user_id, card.id, -3, NOW).await.unwrap_err();
    assert!(matches!(err, EconomyError::InvalidQuantity(-3)));

    let owned = OwnedCard::find(account.user_id, card.id, pool).await.unwrap().unwrap();
    assert_eq!(owned.quantity, 1);
}

#[tokio::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn concurrent_daily_claims_grant_exactly_once() {
    let pool = setup().await;
    let account = new_account(pool).await;

    let (a, b) = tokio::join!(
        claim_daily(pool, account.user_id, NOW),
        claim_daily(pool, account.user_id, NOW),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(
        a.granted != b.granted,
        "exactly one of two racing claims may be granted (got {} and {})",
        a.granted,
        b.granted
    );

    let account = CreditAccount::find_by_user(account.user_id, pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.balance, STARTER_BALANCE + a.amount + b.amount);
}

#[tokio::test]
#[ignore = "requires a live Postgres at DATABASE_URL"]
async fn balance_read_applies_a_single_hourly_tick() {
    let pool = setup().await;
    let account = new_account(pool).await;

    let view = balance(pool, account.user_id, NOW + HOURLY_EARN_INTERVAL).await.unwrap();
    assert_eq!(view.earned, HOURLY_EARN_AMOUNT);
    assert_eq!(view.balance, STARTER_BALANCE + HOURLY_EARN_AMOUNT);

    // a second read in the same hour earns nothing
    let view = balance(pool, account.user_id, NOW + HOURLY_EARN_INTERVAL + 1).await.unwrap();
    assert_eq!(view.earned, 0);
    assert_eq!(view.balance, STARTER_BALANCE + HOURLY_EARN_AMOUNT);
}
