use kantin_common::Rupiah;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::{MidtransApiError, NotificationSignatureFields};

/// Midtrans expresses amounts as decimal strings, e.g. "25000.00". Rupiah has no minor unit, so any non-zero fraction
/// is rejected.
pub fn parse_midtrans_amount(amount: &str) -> Result<Rupiah, MidtransApiError> {
    let mut parts = amount.trim().split('.');
    let whole = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MidtransApiError::InvalidCurrencyAmount(amount.to_string()))?
        .parse::<i64>()
        .map_err(|e| MidtransApiError::InvalidCurrencyAmount(format!("Invalid amount: {amount}. {e}.")))?;
    match parts.next() {
        None => Ok(Rupiah::from(whole)),
        Some(frac) if frac.chars().all(|c| c == '0') => Ok(Rupiah::from(whole)),
        Some(_) => Err(MidtransApiError::InvalidCurrencyAmount(format!("Fractional rupiah are not supported: {amount}"))),
    }
}

fn signature_digest(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hasher.finalize().to_vec()
}

/// `SHA512(order_id + status_code + gross_amount + server_key)`, hex encoded.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    hex::encode(signature_digest(order_id, status_code, gross_amount, server_key))
}

/// Checks the notification's `signature_key` in constant time. Signatures that are not valid hex never match.
pub fn verify_notification_signature(fields: &NotificationSignatureFields, server_key: &str) -> bool {
    let Ok(provided) = hex::decode(fields.signature_key.trim()) else {
        return false;
    };
    let expected = signature_digest(&fields.order_id, &fields.status_code, &fields.gross_amount, server_key);
    expected.as_slice().ct_eq(provided.as_slice()).into()
}
