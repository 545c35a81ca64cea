//! Render Snapshots
//!
//! Read-only copy of everything the presentation layer draws for one tick.
//! Snapshots travel as bincode (compact, for frame handoff) or JSON (for
//! inspection and tooling).

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::StateHash;
use crate::game::ctf::MatchOutcome;
use crate::game::entity::{EntityKind, RenderView};
use crate::game::state::MatchPhase;

/// Snapshot encoding errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Binary encoding failed.
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// JSON encoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything needed to draw one frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Tick this snapshot was taken at
    pub tick: u32,
    /// Match phase
    pub phase: MatchPhase,
    /// Board width in tiles
    pub width: u32,
    /// Board height in tiles
    pub height: u32,
    /// Blue team score
    pub blue_score: u32,
    /// Red team score
    pub red_score: u32,
    /// Visible entities: players, then bombs, then items
    pub entities: Vec<RenderView>,
    /// Set once the match is over
    pub outcome: Option<MatchOutcome>,
    /// Hash of the state this was taken from
    pub state_hash: StateHash,
}

impl RenderSnapshot {
    /// Encode as bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Hex form of the state hash, for logs.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.state_hash)
    }

    /// Views of the given kind.
    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &RenderView> {
        self.entities.iter().filter(move |v| v.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridPos;
    use crate::game::board::Board;
    use crate::game::config::CtfConfig;
    use crate::game::ctf::CtfGame;
    use crate::game::state::Team;

    fn game() -> CtfGame {
        let board = Board::from_rows(&[
            "#######",
            "#.....#",
            "#######",
        ]).unwrap();
        let mut game = CtfGame::new([3; 16], board, CtfConfig::default()).unwrap();
        game.add_player(Team::Blue, GridPos::new(1, 1)).unwrap();
        game.add_player(Team::Red, GridPos::new(5, 1)).unwrap();
        game.place_flag(Team::Blue, GridPos::new(2, 1)).unwrap();
        game.place_flag(Team::Red, GridPos::new(4, 1)).unwrap();
        game
    }

    #[test]
    fn test_snapshot_contents() {
        let snapshot = game().snapshot();
        assert_eq!(snapshot.phase, MatchPhase::Waiting);
        assert_eq!((snapshot.width, snapshot.height), (7, 3));
        assert_eq!(snapshot.entities_of(EntityKind::Player).count(), 2);
        assert_eq!(snapshot.entities_of(EntityKind::Flag).count(), 2);
        assert!(snapshot.outcome.is_none());
        assert_eq!(snapshot.hash_hex().len(), 64);
    }

    #[test]
    fn test_bincode_round_trip() {
        let snapshot = game().snapshot();
        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(RenderSnapshot::from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_json_names_fields() {
        let json = game().snapshot().to_json().unwrap();
        assert!(json.contains("\"blue_score\":0"));
        assert!(json.contains("\"Flag\""));
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let bytes = game().snapshot().to_bytes().unwrap();
        assert!(matches!(
            RenderSnapshot::from_bytes(&bytes[..bytes.len() / 2]),
            Err(SnapshotError::Bincode(_))
        ));
    }
}
