use anyhow::anyhow;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::json;

use cardvault_common::get_current_timestamp;
use cardvault_runtime::{open_pack, PackOpening, PACK_TYPES};

use crate::{
    ensure_account,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState,
};

pub fn pack_routes() -> Router<GlobalState> {
    Router::new()
        .route("/packs",
            get(list_packs)
        )

        .route("/packs/open/{pack_id}",
            post(open)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/packs/history",
            get(history)
            .route_layer(middleware::from_fn(authenticate))
        )
}

async fn list_packs() -> Result<AppSuccess, AppError> {
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Pack types fetched successfully",
        json!(PACK_TYPES),
    ))
}

async fn open(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
    Path(pack_id): Path<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/packs/open] User not found")))?;

    let now = get_current_timestamp() as i64;
    let opened = open_pack(state.db, user.id, &pack_id, now)
        .await
        .map_err(AppError::economy)?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Pack opened successfully",
        json!(opened),
    ))
}

async fn history(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/packs/history] User not found")))?;

    let openings = PackOpening::find_by_user(user.id, state.db).await?;
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Pack history fetched successfully",
        json!(openings),
    ))
}
