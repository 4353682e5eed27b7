//! Domain-separated RNG streams derived from a user-visible seed.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;

const TRAFFIC_DOMAIN: &[u8] = b"streetgrid.traffic";

/// Derive an independent 64-bit stream seed for `domain_tag`.
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any length and SHA-256 digests are 32 bytes.
#[must_use]
pub fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// RNG used to lay out traffic classes for `user_seed`.
#[must_use]
pub fn traffic_rng(user_seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(derive_stream_seed(user_seed, TRAFFIC_DOMAIN))
}
