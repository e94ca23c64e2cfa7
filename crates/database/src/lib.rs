mod postgres;

pub use postgres::{is_retryable, PgModel};
