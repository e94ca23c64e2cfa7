use anyhow::Result;
use axum::Router;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use cardvault_service_api::{
    card_routes, collection_routes, misc_routes, pack_routes, setup_tracing, stripe_routes,
    user_routes, GlobalState,
};

use cardvault_runtime::{
    Card, CardSale, CreditAccount, CreditLog, OwnedCard, PackOpening, User, UserPayment,
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

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let cors = CorsLayer::very_permissive();
    let trace = TraceLayer::new_for_http();

    let db_pool = connect(false, true).await;
    let global_state = GlobalState::new(db_pool);

    let app = Router::new()
        .merge(misc_routes())
        .merge(user_routes())
        .merge(pack_routes())
        .merge(collection_routes())
        .merge(card_routes())
        .merge(stripe_routes())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
        .layer(cors)
        .layer(trace)
        .with_state(global_state);

    let port: u16 = std::env::var("PORT")
        .unwrap_or("3033".into())
        .parse()
        .expect("failed to convert to number");

    let listener = tokio::net::TcpListener::bind(format!(":::{port}"))
        .await
        .unwrap();

    tracing::info!("LISTENING ON {port}");
    axum::serve(listener, app.into_make_service()).await.unwrap();
    Ok(())
}
