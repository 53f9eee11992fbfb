//! Dynamic secret ("DS") header required by the HoYoLAB game record endpoints.

use md5::{Digest, Md5};
use rand::{distributions::Alphanumeric, Rng};
use std::time::{SystemTime, UNIX_EPOCH};

const OVERSEAS_SALT: &str = "6s25p5ox5y14umn1p61aqyyvbvvl3lrt";

/// Generates a DS value for the current time.
pub fn generate() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let nonce: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .filter(u8::is_ascii_alphabetic)
        .take(6)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    sign(timestamp, &nonce)
}

fn sign(timestamp: u64, nonce: &str) -> String {
    let digest = Md5::digest(format!("salt={OVERSEAS_SALT}&t={timestamp}&r={nonce}"));
    format!("{timestamp},{nonce},{}", hex::encode(digest))
}
