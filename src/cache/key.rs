//! Cache key derivation.

use sha2::{Digest, Sha256};

/// Identifies one classification slot. Derived from the public token so that the
/// token itself is neither stored as a map key nor written to logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn from_token(public_token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(public_token.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        Self { hash }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// First 12 hex chars, for log lines.
    pub fn short(&self) -> &str {
        &self.hash[..12]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}
