use anyhow::anyhow;
use axum::{
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    routing::post,
    Router,
};
use serde_json::json;
use sqlx::types::{Json, Uuid};
use stripe::{
    CheckoutSession, CheckoutSessionMode, CreateCheckoutSession, CreateCheckoutSessionLineItems,
    EventObject, EventType, Webhook,
};

use cardvault_common::{get_current_timestamp, EnvVars};
use cardvault_runtime::{complete_credit_purchase, UserPayment, UserPaymentStatus};

use crate::{
    ensure_account,
    middleware::authenticate,
    response::{AppError, AppSuccess},
    ApiServerEnv, GlobalState,
};

pub fn stripe_routes() -> Router<GlobalState> {
    Router::new()
        .route(
            "/stripe/checkout/{product_id}",
            post(create_checkout_session)
                .route_layer(middleware::from_fn(authenticate)),
        )
        .route("/stripe/webhook", post(stripe_webhook))
}

/// Purchasable credit bundles, keyed by Stripe price id.
fn bundle_credits(product_id: &str) -> i64 {
    match product_id {
        "price_cardvault_credits_500" => 500,
        "price_cardvault_credits_1200" => 1200,
        "price_cardvault_credits_2600" => 2600,
        _ => 0,
    }
}

async fn create_checkout_session(
    State(state): State<GlobalState>,
    Extension(user_id_str): Extension<String>,
    Path(product_id): Path<String>,
    headers: HeaderMap,
) -> Result<AppSuccess, AppError> {
    let user = ensure_account(&state, &user_id_str)
        .await?
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, anyhow!("[create_checkout_session] User not found")))?;

    let credits = bundle_credits(&product_id);
    if credits == 0 {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            anyhow!("[create_checkout_session] Unknown credit bundle"),
        ));
    }

    let origin = headers
        .get("origin")
        .and_then(|o| o.to_str().ok())
        .unwrap_or("http://localhost:3000");

    let client_reference_id = user.id.to_string();
    let success_url = format!("{}/credits?status=success", origin);
    let cancel_url = format!("{}/credits?status=canceled", origin);

    let params = CreateCheckoutSession {
        customer_email: user.user_id.strip_prefix("email_"),
        client_reference_id: Some(&client_reference_id),
        line_items: Some(vec![CreateCheckoutSessionLineItems {
            price: Some(product_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Payment),
        success_url: Some(&success_url),
        cancel_url: Some(&cancel_url),
        allow_promotion_codes: Some(true),
        ..Default::default()
    };

    let session = CheckoutSession::create(&state.stripe_client, params)
        .await
        .map_err(|e| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("Stripe error: {}", e)))?;
    let url = session.url
        .ok_or_else(|| AppError::new(StatusCode::INTERNAL_SERVER_ERROR, anyhow!("Stripe error: no session url")))?;

    let now = get_current_timestamp() as i64;
    let items = session.line_items.unwrap_or_default().data;
    let user_payment = UserPayment {
        id: Uuid::new_v4(),
        user_id: user.id,
        checkout_session_id: session.id.to_string(),
        url: url.clone(),

        amount_total: session.amount_total.unwrap_or_default(),
        currency: session.currency.map(|c| c.to_string()).unwrap_or_default(),
        items: Json(serde_json::to_value(&items)?),
        credits,
        status: UserPaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    let mut tx = state.db.begin().await?;
    user_payment.create(&mut *tx).await?;
    tx.commit().await?;

    Ok(AppSuccess::new(
        StatusCode::OK,
        "Checkout session created",
        json!({ "url": url }),
    ))
}

async fn stripe_webhook(
    State(state): State<GlobalState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<AppSuccess, AppError> {
    let env = ApiServerEnv::load();
    let sig = headers
        .get("stripe-signature")
        .and_then(|s| s.to_str().ok())
        .ok_or_else(|| AppError::new(StatusCode::BAD_REQUEST, anyhow!("Missing stripe-signature header")))?;

    let payload = String::from_utf8(body.to_vec())?;
    let event = Webhook::construct_event(&payload, sig, &env.get_env_var("STRIPE_WEBHOOK_SECRET"))
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, anyhow!("Webhook error: {}", e)))?;

    if let EventObject::CheckoutSession(session) = event.data.object {
        let session_id = session.id.to_string();
        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                let now = get_current_timestamp() as i64;
                match complete_credit_purchase(state.db, &session_id, now).await {
                    Ok(Some(balance)) => {
                        tracing::info!(
                            "[stripe_webhook] session {} settled, new balance {}",
                            session_id,
                            balance
                        );
                    }
                    Ok(None) => {
                        tracing::warn!(
                            "[stripe_webhook] session {} unknown or already settled",
                            session_id
                        );
                    }
                    Err(e) => return Err(AppError::economy(e)),
                }
            }
            _ => {
                // unhandled event type
            }
        }
    }
    Ok(AppSuccess::new(StatusCode::OK, "Webhook received", json!({})))
}
