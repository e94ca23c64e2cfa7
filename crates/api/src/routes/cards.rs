use anyhow::anyhow;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::types::Uuid;

use cardvault_common::get_current_timestamp;
use cardvault_runtime::{Card, Rarity, UserRole};

use crate::{
    ensure_account,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState,
};

pub fn card_routes() -> Router<GlobalState> {
    Router::new()
        .route("/cards",
            get(list_cards)
        )

        .route("/cards/new",
            post(new_card)
            .route_layer(middleware::from_fn(authenticate))
        )
}

async fn list_cards(State(state): State<GlobalState>) -> Result<AppSuccess, AppError> {
    let cards = Card::find_all(state.db).await?;
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Catalog fetched successfully",
        json!(cards),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewCardRequest {
    pub name: String,
    pub rarity: Rarity,

    pub attack: i64,
    pub defense: i64,
    pub speed: i64,
    pub stamina: i64,
    pub technique: i64,
    pub instinct: i64,

    pub rating: Option<i64>,
    pub image_url: Option<String>,
}

async fn new_card(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
    Json(payload): Json<NewCardRequest>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/cards/new] User not found")))?;

    if user.role != UserRole::Admin {
        return Err(AppError::new(
            StatusCode::FORBIDDEN,
            anyhow!("[/cards/new] Admin only"),
        ));
    }

    let attributes = [
        payload.attack,
        payload.defense,
        payload.speed,
        payload.stamina,
        payload.technique,
        payload.instinct,
    ];
    if attributes.iter().any(|a| !(0..=99).contains(a)) {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/cards/new] Attributes must be within 0-99"),
        ));
    }

    let now = get_current_timestamp() as i64;
    let card = Card {
        id: Uuid::new_v4(),
        name: payload.name,
        rarity: payload.rarity,
        attack: payload.attack,
        defense: payload.defense,
        speed: payload.speed,
        stamina: payload.stamina,
        technique: payload.technique,
        instinct: payload.instinct,
        rating: payload
            .rating
            .unwrap_or(attributes.iter().sum::<i64>() / attributes.len() as i64),
        image_url: payload.image_url.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    }
    .create(state.db)
    .await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Card created successfully",
        json!({ "card_id": card.id }),
    ))
}
