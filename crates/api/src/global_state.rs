use sqlx::PgPool;
use stripe::Client as StripeClient;

#[derive(Clone)]
pub struct GlobalState {
    pub db: &'static PgPool,
    pub stripe_client: StripeClient,
}

impl GlobalState {
    pub fn new(db: &'static PgPool) -> Self {
        let stripe_client = StripeClient::new(
            std::env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY not set"),
        );
        Self { db, stripe_client }
    }
}
