//! State Hashing for Verification
//!
//! Provides deterministic hashing of match state for:
//! - Replay validation (same inputs must give the same hash)
//! - Snapshot integrity between simulation and renderer

use sha2::{Sha256, Digest};
use super::grid::GridPos;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256 with helpers for grid types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for match state.
    pub fn for_match_state() -> Self {
        Self::new(b"BLAST_CTF_STATE_V1")
    }

    /// Create hasher for input buffers.
    pub fn for_input_buffer() -> Self {
        Self::new(b"BLAST_CTF_INPUTS_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a grid position.
    #[inline]
    pub fn update_pos(&mut self, pos: GridPos) {
        self.update_u32(pos.x);
        self.update_u32(pos.y);
    }

    /// Update with an optional u8 handle (tagged so `None` != `Some(0)`).
    #[inline]
    pub fn update_opt_u8(&mut self, value: Option<u8>) {
        match value {
            Some(v) => {
                self.update_u8(1);
                self.update_u8(v);
            }
            None => self.update_u8(0),
        }
    }

    /// Update with a UUID (16 bytes).
    #[inline]
    pub fn update_uuid(&mut self, uuid: &[u8; 16]) {
        self.hasher.update(uuid);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for match verification.
///
/// Called by `MatchState::compute_hash()` and `CtfGame::compute_hash()`.
/// The closure adds the state-specific data.
pub fn compute_state_hash<F>(tick: u32, match_id: &[u8; 16], add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_match_state();

    // Always hash tick and match id first
    hasher.update_u32(tick);
    hasher.update_uuid(match_id);

    add_state(&mut hasher);

    hasher.finalize()
}
