//! Per-frame input records

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Where an input record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InputSource {
    /// Debug mouse, absolute position
    #[default]
    Mouse,
    /// Debug arrow keys, per-frame delta
    ArrowKeys,
    /// Debug WASD keys, per-frame delta
    WasdKeys,
    /// Person reported by the motion tracker, absolute position
    Tracked,
}

impl InputSource {
    /// Player id a debug source drives; tracked input is matched by its own id
    pub fn debug_slot(self) -> Option<u32> {
        match self {
            InputSource::Mouse => Some(0),
            InputSource::ArrowKeys => Some(1),
            InputSource::WasdKeys => Some(2),
            InputSource::Tracked => None,
        }
    }

    /// Whether `target` is a delta rather than a position
    pub fn is_relative(self) -> bool {
        matches!(self, InputSource::ArrowKeys | InputSource::WasdKeys)
    }
}

/// One input record
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputRecord {
    pub source: InputSource,
    /// Invalid records only carry frame time and key edges
    pub valid: bool,
    /// Tracked-person id (tracked input only)
    pub id: u32,
    /// Position, or delta for key input
    pub target: Vec2,
    /// Seconds since the previous frame
    pub frame_time: f32,
    /// Space was pressed this frame
    pub space: bool,
    /// Debug: destroy every player
    pub kill_players: bool,
    /// Debug: create one player
    pub add_player: bool,
    /// Debug: toggle debug overlay
    pub toggle_debug: bool,
}

impl InputRecord {
    pub fn new(source: InputSource, target: Vec2) -> Self {
        Self {
            source,
            valid: true,
            target,
            ..Default::default()
        }
    }

    /// Record for a tracked person
    pub fn tracked(id: u32, pos: Vec2, frame_time: f32) -> Self {
        Self {
            id,
            frame_time,
            ..Self::new(InputSource::Tracked, pos)
        }
    }

    /// Record that only carries the frame time
    pub fn frame(frame_time: f32) -> Self {
        Self {
            frame_time,
            ..Default::default()
        }
    }

    pub fn with_frame_time(mut self, frame_time: f32) -> Self {
        self.frame_time = frame_time;
        self
    }
}

/// All input of one frame; the first record carries frame time and key edges
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub inputs: &'a [InputRecord],
}

impl<'a> Frame<'a> {
    pub fn new(inputs: &'a [InputRecord]) -> Self {
        Self { inputs }
    }

    fn head(&self) -> Option<&InputRecord> {
        self.inputs.first()
    }

    /// Frame time in seconds (0 for an empty frame)
    pub fn dt(&self) -> f32 {
        self.head().map_or(0.0, |i| i.frame_time)
    }

    pub fn space_pressed(&self) -> bool {
        self.head().is_some_and(|i| i.space)
    }

    pub fn kill_players(&self) -> bool {
        self.head().is_some_and(|i| i.kill_players)
    }

    pub fn add_player(&self) -> bool {
        self.head().is_some_and(|i| i.add_player)
    }

    pub fn toggle_debug(&self) -> bool {
        self.head().is_some_and(|i| i.toggle_debug)
    }

    /// Records that carry a position
    pub fn valid(self) -> impl Iterator<Item = &'a InputRecord> {
        self.inputs.iter().filter(|i| i.valid)
    }
}
