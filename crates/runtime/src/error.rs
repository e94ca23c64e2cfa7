use sqlx::types::Uuid;
use thiserror::Error;

/// Everything the economy operations can reject with. Every variant except
/// `Database` is detected before any mutation commits, so callers may retry
/// or surface the error without worrying about partial state.
#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("unknown card {0}")]
    UnknownCard(Uuid),

    #[error("card {0} is not in the collection")]
    CardNotOwned(Uuid),

    #[error("no credit account for user {0}")]
    AccountNotFound(Uuid),

    #[error("insufficient credits: need {required}, balance is {available}")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("insufficient quantity: requested {requested}, owned {owned}")]
    InsufficientQuantity { requested: i64, owned: i64 },

    #[error("card catalog has no cards to draw from")]
    EmptyCatalog,

    #[error("transaction conflict, gave up after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
