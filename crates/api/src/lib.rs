mod env;
mod global_state;
mod middleware;
mod response;
mod routes;
mod utils;

pub use routes::{
    card_routes,
    collection_routes,
    misc_routes,
    pack_routes,
    stripe_routes,
    user_routes,
};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use middleware::{authenticate, ensure_account};
pub use response::{AppError, AppSuccess};
pub use utils::setup_tracing;
