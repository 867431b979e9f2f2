//! HMAC-SHA1 request signatures for service-to-service calls.
//!
//! A caller signs `"<nonce>-<service id>"` with its shared secret and sends
//! the lower-case hex digest. The nonce is opaque: there is no freshness or
//! replay window check.
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::core::credentials::ServiceCredentials;

type HmacSha1 = Hmac<Sha1>;

/// Message covered by the signature.
pub fn signing_message(nonce: &str, service_id: &str) -> String {
    [nonce, service_id].join("-")
}

/// Lower-case hex HMAC-SHA1 of `data` keyed by `key`.
pub fn calculate_hmac_signature(key: &str, data: &str) -> String {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = HmacSha1::new_from_slice(key.as_bytes()) else {
        return String::new();
    };
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signature a registered service must send for `nonce`.
pub fn sign(service_id: &str, nonce: &str, secret: &str) -> String {
    calculate_hmac_signature(secret, &signing_message(nonce, service_id))
}

/// True iff all inputs are non-empty, the service is registered and the
/// supplied signature equals the expected one.
pub fn validate_hmac_digest(
    service_id: &str,
    nonce: &str,
    signature: &str,
    credentials: &ServiceCredentials,
) -> bool {
    if service_id.is_empty() || nonce.is_empty() || signature.is_empty() {
        return false;
    }

    let Some(secret) = credentials.secret(service_id) else {
        return false;
    };

    let expected = sign(service_id, nonce, secret);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
