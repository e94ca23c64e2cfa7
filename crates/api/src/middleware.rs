use axum::body::Body;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::{extract::Request, response::Response};

use anyhow::anyhow;
use cardvault_common::{get_current_timestamp, verify_token, EnvVars};
use cardvault_runtime::User;

use crate::env::ApiServerEnv;
use crate::response::AppError;
use crate::utils::extract_bearer_token;
use crate::GlobalState;

/// Decodes the bearer token and stashes the external user id as a request
/// extension. Requests without a valid, fresh token proceed with an empty
/// id and are turned away later by `ensure_account`.
pub async fn authenticate(mut req: Request, next: Next) -> Result<Response<Body>, AppError> {
    let env = ApiServerEnv::load();
    let user_id = extract_bearer_token(&req)
        .and_then(|token| {
            verify_token(&token, &env.get_env_var("SECRET_SALT"))
                .map_err(|e| AppError::new(StatusCode::UNAUTHORIZED, e))
        })
        .and_then(|claims| {
            if claims.timestamp < get_current_timestamp() as i64 - 60 {
                return Err(AppError::new(
                    StatusCode::UNAUTHORIZED,
                    anyhow!("authenticate expired"),
                ));
            }
            Ok(claims.user_id)
        })
        .unwrap_or_default();

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}

pub async fn ensure_account(
    state: &GlobalState,
    user_id_str: &str,
) -> Result<Option<User>, AppError> {
    if user_id_str.is_empty() {
        return Ok(None);
    }
    let user = User::find_by_external_id(user_id_str, state.db).await?;
    Ok(user)
}
