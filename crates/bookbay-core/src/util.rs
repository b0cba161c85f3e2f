use blake3::Hasher;
use ulid::Ulid;

pub fn blake3_hex(data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(data);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}

/// Salted password digest. The salt is stored next to the digest on the user record.
pub fn password_digest(salt: &str, password: &str) -> String {
    blake3_hex(format!("{}:{}", salt, password).as_bytes())
}

pub fn new_salt() -> String {
    Ulid::new().to_string()
}

/// Rounds a dollar amount to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
