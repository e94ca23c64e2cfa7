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

use cardvault_common::get_current_timestamp;
use cardvault_runtime::{claim_daily, CreditAccount, CreditLog, User, STARTER_BALANCE};

use crate::{
    ensure_account,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    GlobalState,
};

pub fn user_routes() -> Router<GlobalState> {
    Router::new()
        .route("/user/register",
            post(register)
        )

        .route("/user/claim",
            post(claim)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/user/balance",
            get(balance)
            .route_layer(middleware::from_fn(authenticate))
        )

        .route("/user/ledger",
            get(ledger)
            .route_layer(middleware::from_fn(authenticate))
        )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub user_id: String,
    pub user_aka: Option<String>,
    pub provider: String,
}

async fn register(
    State(state): State<GlobalState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<AppSuccess, AppError> {
    let now = get_current_timestamp() as i64;
    let mut tx = state.db.begin().await?;

    // 1. check if the user already exists
    let user = User::find_by_external_id(&payload.user_id, &mut *tx).await?;
    if user.is_some() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[/user/register] User already exists"),
        ));
    }

    let user = User::new(
        &payload.user_id,
        payload.user_aka.as_deref().unwrap_or("nono"),
        &payload.provider,
        now,
    )
    .create(&mut *tx)
    .await?;

    // 2. open the credit account with the starter balance and grant the
    //    first daily claim on the spot
    let mut account = CreditAccount::new(user.id, now);
    CreditLog::from_registration(user.id, STARTER_BALANCE, account.balance, now)
        .create(&mut *tx)
        .await?;
    let first_claim = account.claim_daily(now);
    let account = account.create(&mut *tx).await?;
    CreditLog::from_daily_claim(user.id, first_claim.amount, account.balance, now)
        .create(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "User registered successfully",
        json!({
            "id": user.id,
            "balance": account.balance,
        }),
    ))
}

async fn claim(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/user/claim] User not found")))?;

    let now = get_current_timestamp() as i64;
    let outcome = claim_daily(state.db, user.id, now)
        .await
        .map_err(AppError::economy)?;

    let message = if outcome.granted {
        "Daily credits claimed"
    } else {
        "Already claimed today"
    };
    Ok(AppSuccess::new(
        StatusCode::OK,
        message,
        json!({
            "granted": outcome.granted,
            "amount": outcome.amount,
            "balance": outcome.balance,
            "next_eligible_at": outcome.next_eligible_at,
            "retry_in_secs": (outcome.next_eligible_at - now).max(0),
        }),
    ))
}

async fn balance(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/user/balance] User not found")))?;

    let now = get_current_timestamp() as i64;
    let view = cardvault_runtime::balance(state.db, user.id, now)
        .await
        .map_err(AppError::economy)?;

    user.touch_last_active(now, state.db).await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Balance fetched successfully",
        json!(view),
    ))
}

async fn ledger(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[/user/ledger] User not found")))?;

    let logs = CreditLog::find_by_user(user.id, state.db).await?;
    Ok(AppSuccess::new(
        StatusCode::OK,
        "Ledger fetched successfully",
        json!(logs),
    ))
}
