//! Opaque driver identifiers.

use md5::{Digest, Md5};
use rand::TryRngCore;
use rand::rngs::OsRng;
use tracing::warn;

const SEED_LEN: usize = 10;

/// Generates a 128-bit identifier rendered as 32 lowercase hex characters.
///
/// The identifier is the MD5 digest of ten bytes drawn from the operating
/// system RNG. It only needs to be unique per driver instance, so an RNG
/// failure is logged and the all-zero seed is hashed instead.
#[must_use]
pub fn generate_id() -> String {
    let mut seed = [0_u8; SEED_LEN];
    if let Err(err) = OsRng.try_fill_bytes(&mut seed) {
        warn!(error = %err, "OS random source unavailable; falling back to a fixed seed");
        seed = [0_u8; SEED_LEN];
    }
    hex::encode(Md5::digest(seed))
}
