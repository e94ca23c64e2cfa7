use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

/// Claims carried by a bearer token. The token is minted by the identity
/// gateway after OAuth completes; this service only verifies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub user_id: String,
    pub timestamp: i64,
    pub origin: String,
}

fn mac_key(salt: &str) -> [u8; 32] {
    *blake3::hash(salt.as_bytes()).as_bytes()
}

/// Token layout: `base64url(claims_json) . base64url(blake3_keyed_mac)`.
pub fn sign_token(claims: &AuthClaims, salt: &str) -> Result<String> {
    let payload = serde_json::to_vec(claims)?;
    let mac = blake3::keyed_hash(&mac_key(salt), &payload);
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(&payload),
        URL_SAFE_NO_PAD.encode(mac.as_bytes())
    ))
}

pub fn verify_token(token: &str, salt: &str) -> Result<AuthClaims> {
    let (payload_b64, mac_b64) = token
        .split_once('.')
        .ok_or_else(|| anyhow!("malformed token"))?;

    let payload = URL_SAFE_NO_PAD.decode(payload_b64)?;
    let mac_bytes: [u8; 32] = URL_SAFE_NO_PAD
        .decode(mac_b64)?
        .try_into()
        .map_err(|_| anyhow!("malformed token mac"))?;

    let expected = blake3::keyed_hash(&mac_key(salt), &payload);
    // blake3::Hash equality is constant-time
    if expected != blake3::Hash::from_bytes(mac_bytes) {
        return Err(anyhow!("token mac mismatch"));
    }

    Ok(serde_json::from_slice(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> AuthClaims {
        AuthClaims {
            user_id: "email_someone@example.com".to_string(),
            timestamp: 1_700_000_000,
            origin: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn round_trip() {
        let token = sign_token(&claims(), "salt").unwrap();
        let decoded = verify_token(&token, "salt").unwrap();
        assert_eq!(decoded.user_id, claims().user_id);
        assert_eq!(decoded.timestamp, claims().timestamp);
    }

    #[test]
    fn wrong_salt_rejected() {
        let token = sign_token(&claims(), "salt").unwrap();
        assert!(verify_token(&token, "other-salt").is_err());
    }

    #[test]
    fn tampered_payload_rejected() {
        let token = sign_token(&claims(), "salt").unwrap();
        let (_, mac) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&AuthClaims {
                user_id: "email_attacker@example.com".to_string(),
                ..claims()
            })
            .unwrap(),
        );
        assert!(verify_token(&format!("{forged_payload}.{mac}"), "salt").is_err());
    }
}
