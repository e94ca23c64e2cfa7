mod auth_token;
mod env;

pub use auth_token::{sign_token, verify_token, AuthClaims};
pub use env::EnvVars;

pub fn get_current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}
