mod cards;
mod engine;
mod error;
mod inventory;
mod user;

pub use cards::{
    draw_pack, resolve_pack, sell_value, Card, CardSale, PackOpening, PackType, Rarity,
    RarityWeights, CARDS_PER_PACK, DRAW_ORDER, PACK_TYPES, WEIGHT_SCALE,
};
pub use engine::{
    balance, claim_daily, complete_credit_purchase, open_pack, sell_cards, BalanceView,
    ClaimOutcome, PackOpened, SaleOutcome,
};
pub use error::EconomyError;
pub use inventory::OwnedCard;
pub use user::{
    CreditAccount, CreditLog, CreditLogReason, DailyClaim, DailyClaimState, User, UserPayment,
    UserPaymentStatus, UserRole, DAILY_CLAIM_AMOUNT, HOURLY_EARN_AMOUNT, HOURLY_EARN_INTERVAL,
    STARTER_BALANCE,
};
