//! Per-request message authentication.
//!
//! Clients sign the canonical string `public_key || now || path || method`
//! with HMAC-SHA256 keyed by their private key and send the digest as
//! lowercase hex. The `now` field is part of the signature but its freshness
//! is not enforced here; replay of a captured request within the lifetime of
//! a keypair is therefore possible and must be mitigated by the surrounding
//! deployment if required.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the lowercase-hex HMAC-SHA256 digest for the given request fields.
///
/// This is the reference signer: gateway-side verification and client-side
/// signing both reduce to this function.
pub fn sign(private_key: &str, public_key: &str, now: &str, path: &str, method: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(private_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(public_key.as_bytes());
    mac.update(now.as_bytes());
    mac.update(path.as_bytes());
    mac.update(method.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a supplied digest against the locally recomputed one.
///
/// The comparison is constant-time; digests of unequal length compare
/// unequal without leaking where they differ.
pub fn authenticate(
    digest: &str,
    public_key: &str,
    private_key: &str,
    now: &str,
    path: &str,
    method: &str,
) -> bool {
    let local = sign(private_key, public_key, now, path, method);
    bool::from(local.as_bytes().ct_eq(digest.as_bytes()))
}
