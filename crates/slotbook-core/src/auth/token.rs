use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: Option<f64>,
}

/// Read the `exp` claim (seconds since the epoch) from a JWT-style token.
///
/// Only the payload segment is decoded; the signature is not checked, the
/// server remains the authority on validity. Returns `None` for anything
/// that is not three dot-separated segments with a base64url JSON payload
/// carrying a numeric `exp`.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        debug!("Token is not three segments");
        return None;
    };

    // Some issuers keep the padding; the no-pad engine rejects it.
    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Failed to decode token payload");
            return None;
        }
    };

    let claim: ExpiryClaim = match serde_json::from_slice(&bytes) {
        Ok(claim) => claim,
        Err(e) => {
            debug!(error = %e, "Token payload is not a JSON object");
            return None;
        }
    };

    let exp = claim.exp.filter(|exp| exp.is_finite())?;
    Utc.timestamp_opt(exp.trunc() as i64, 0).single()
}
