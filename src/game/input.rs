//! Input Capture and Recording
//!
//! Per-tick player input, packed into two bytes, plus a delta-compressed
//! per-player recording used for replays.

use serde::{Serialize, Deserialize};
use crate::core::grid::Direction;
use crate::core::hash::{StateHash, StateHasher};
use crate::game::state::PlayerId;

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Raw input state for a single frame.
///
/// NO tick field - tick is stored separately for compression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(C)]
pub struct InputFrame {
    /// Movement direction code (see `Direction::from_code`), 0 = stand still
    pub direction: u8,

    /// Action flags (packed bits):
    /// - Bit 0: Place bomb this frame
    /// - Bit 1-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Size in bytes
    pub const SIZE: usize = 2;

    /// Direction code meaning "no movement"
    pub const NO_MOVE: u8 = 0;

    /// Place-bomb flag bit
    pub const FLAG_BOMB: u8 = 0x01;

    /// Create a new empty input frame.
    pub const fn new() -> Self {
        Self {
            direction: Self::NO_MOVE,
            flags: 0,
        }
    }

    /// Create input moving one tile in `dir`.
    pub const fn with_direction(dir: Direction) -> Self {
        Self {
            direction: dir as u8,
            flags: 0,
        }
    }

    /// Create input that only places a bomb.
    pub const fn bomb() -> Self {
        Self {
            direction: Self::NO_MOVE,
            flags: Self::FLAG_BOMB,
        }
    }

    /// Decoded movement direction.
    #[inline]
    pub fn move_direction(&self) -> Option<Direction> {
        Direction::from_code(self.direction)
    }

    /// Check if a bomb should be placed this frame.
    #[inline]
    pub fn bomb_pressed(&self) -> bool {
        self.flags & Self::FLAG_BOMB != 0
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.direction == Self::NO_MOVE && self.flags == 0
    }

    /// Set bomb flag.
    #[inline]
    pub fn set_bomb(&mut self, pressed: bool) {
        if pressed {
            self.flags |= Self::FLAG_BOMB;
        } else {
            self.flags &= !Self::FLAG_BOMB;
        }
    }
}

/// Delta-compressed input entry.
///
/// Only stored when input CHANGES (not every tick).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

impl InputDelta {
    /// Create new delta entry.
    pub fn new(tick: u32, frame: InputFrame) -> Self {
        Self { tick, frame }
    }
}

// =============================================================================
// INPUT BUFFER
// =============================================================================

/// Complete input recording for one player in one match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerInputBuffer {
    /// Player slot
    pub player_id: PlayerId,

    /// Match identifier
    pub match_id: [u8; 16],

    /// Starting tick (usually 0)
    pub start_tick: u32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Delta-compressed input data.
    /// Only stores ticks where input CHANGED.
    deltas: Vec<InputDelta>,

    /// Last recorded input (for delta comparison)
    #[serde(skip)]
    last_frame: InputFrame,
}

impl PlayerInputBuffer {
    /// Create a new input buffer for a player.
    pub fn new(player_id: PlayerId, match_id: [u8; 16]) -> Self {
        Self {
            player_id,
            match_id,
            start_tick: 0,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick.
    ///
    /// Only stores if input changed from previous frame.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;

        if frame != self.last_frame {
            self.deltas.push(InputDelta::new(tick, frame));
            self.last_frame = frame;
        }
    }

    /// Get input at a specific tick.
    ///
    /// Uses binary search for efficiency.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Get all deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of delta entries.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Finalize the buffer (call at match end).
    pub fn finalize(&mut self, end_tick: u32) {
        self.end_tick = end_tick;
    }

    /// Hash of the recording, for comparing replays across machines.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_input_buffer();
        hasher.update_uuid(&self.match_id);
        hasher.update_u8(self.player_id.slot());
        hasher.update_u32(self.start_tick);
        hasher.update_u32(self.end_tick);
        for delta in &self.deltas {
            hasher.update_u32(delta.tick);
            hasher.update_bytes(&[delta.frame.direction, delta.frame.flags]);
        }
        hasher.finalize()
    }

    /// Create iterator over all inputs for replay.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            buffer: self,
            current_tick: self.start_tick,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }
}

/// Iterator for replaying inputs tick-by-tick.
pub struct ReplayIterator<'a> {
    buffer: &'a PlayerInputBuffer,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick > self.buffer.end_tick {
            return None;
        }

        while let Some(delta) = self.buffer.deltas.get(self.delta_idx) {
            if delta.tick > self.current_tick {
                break;
            }
            self.current_frame = delta.frame;
            self.delta_idx += 1;
        }

        let result = (self.current_tick, self.current_frame);
        self.current_tick += 1;
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_frame_flags() {
        let mut frame = InputFrame::new();
        assert!(frame.is_idle());
        assert!(!frame.bomb_pressed());

        frame.set_bomb(true);
        assert!(frame.bomb_pressed());
        assert!(!frame.is_idle());

        frame.set_bomb(false);
        assert!(frame.is_idle());
    }

    #[test]
    fn test_input_frame_direction() {
        let frame = InputFrame::with_direction(Direction::Left);
        assert_eq!(frame.move_direction(), Some(Direction::Left));
        assert_eq!(InputFrame::new().move_direction(), None);
        assert_eq!(InputFrame::bomb().move_direction(), None);
    }

    #[test]
    fn test_input_buffer_delta_compression() {
        let mut buffer = PlayerInputBuffer::new(PlayerId::new(1), [0u8; 16]);

        let frame = InputFrame::with_direction(Direction::Right);
        for tick in 0..4 {
            buffer.record(tick, frame);
        }
        assert_eq!(buffer.delta_count(), 1);

        buffer.record(4, InputFrame::with_direction(Direction::Down));
        assert_eq!(buffer.delta_count(), 2);
    }

    #[test]
    fn test_input_buffer_get_at() {
        let mut buffer = PlayerInputBuffer::new(PlayerId::new(1), [0u8; 16]);

        let frame1 = InputFrame::with_direction(Direction::Up);
        let frame2 = InputFrame::bomb();

        buffer.record(10, frame1);
        buffer.record(20, frame2);

        assert!(buffer.get_input_at(5).is_idle());
        assert_eq!(buffer.get_input_at(10), frame1);
        assert_eq!(buffer.get_input_at(15), frame1);
        assert_eq!(buffer.get_input_at(20), frame2);
        assert_eq!(buffer.get_input_at(100), frame2);
    }

    #[test]
    fn test_input_hash_tracks_changes() {
        let mut a = PlayerInputBuffer::new(PlayerId::new(1), [0u8; 16]);
        let mut b = PlayerInputBuffer::new(PlayerId::new(1), [0u8; 16]);
        a.record(0, InputFrame::with_direction(Direction::Up));
        b.record(0, InputFrame::with_direction(Direction::Up));
        assert_eq!(a.compute_hash(), b.compute_hash());

        b.record(1, InputFrame::bomb());
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_replay_iterator() {
        let mut buffer = PlayerInputBuffer::new(PlayerId::new(1), [0u8; 16]);

        buffer.record(0, InputFrame::with_direction(Direction::Left));
        buffer.record(3, InputFrame::with_direction(Direction::Right));
        buffer.finalize(5);

        let frames: Vec<_> = buffer.replay_iter().collect();

        assert_eq!(frames.len(), 6); // Ticks 0-5
        assert_eq!(frames[2].1.move_direction(), Some(Direction::Left));
        assert_eq!(frames[3].1.move_direction(), Some(Direction::Right));
        assert_eq!(frames[5].1.move_direction(), Some(Direction::Right));
    }
}
