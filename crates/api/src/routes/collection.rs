use std::collections::HashMap;

use anyhow::anyhow;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use cardvault_common::get_current_timestamp;
use cardvault_runtime::{sell_cards, Card, CardSale, OwnedCard};

use crate::{
    ensure_account,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState,
};

pub fn collection_routes() -> Router<GlobalState> {
    Router::new()
        .route("/collection",
            get(list_collection)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/collection/sell/{card_id}",
            post(sell)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/collection/sales",
            get(sales_history)
            .route_layer(middleware::from_fn(authenticate))
        )
}

#[derive(Debug, Serialize)]
struct CollectionEntry {
    card: Card,
    quantity: i64,
    first_acquired_at: i64,
}

async fn list_collection(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/collection] User not found")))?;

    let owned = OwnedCard::find_by_user(user.id, state.db).await?;
    let catalog: HashMap<Uuid, Card> = Card::find_all(state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let entries = owned
        .into_iter()
        .filter_map(|o| {
            catalog.get(&o.card_id).map(|card| CollectionEntry {
                card: card.clone(),
                quantity: o.quantity,
                first_acquired_at: o.first_acquired_at,
            })
        })
        .collect::<Vec<_>>();

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Collection fetched successfully",
        json!(entries),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SellRequest {
    pub quantity: Option<i64>,
}

async fn sell(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
    Path(card_id): Path<Uuid>,
    Json(payload): Json<SellRequest>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/collection/sell] User not found")))?;

    let quantity = payload.quantity.unwrap_or(1);
    let now = get_current_timestamp() as i64;
    let outcome = sell_cards(state.db, user.id, card_id, quantity, now)
        .await
        .map_err(AppError::economy)?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Cards sold successfully",
        json!(outcome),
    ))
}

async fn sales_history(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/collection/sales] User not found")))?;

    let sales = CardSale::find_by_user(user.id, state.db).await?;
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Sales history fetched successfully",
        json!(sales),
    ))
}
