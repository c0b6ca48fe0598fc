// Legacy replay frames: a button bitmask plus cursor coordinates.

use osu_model::Vec2;
use osu_model::parsing::{parse_double, parse_float, parse_int};
use osu_model::{Error, Result};
use serde::{Deserialize, Serialize};

/// Button flags of a legacy frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReplayButtons(pub i32);

impl ReplayButtons {
    pub const NONE: ReplayButtons = ReplayButtons(0);
    pub const LEFT1: ReplayButtons = ReplayButtons(1);
    pub const RIGHT1: ReplayButtons = ReplayButtons(1 << 1);
    pub const LEFT2: ReplayButtons = ReplayButtons(1 << 2);
    pub const RIGHT2: ReplayButtons = ReplayButtons(1 << 3);
    pub const SMOKE: ReplayButtons = ReplayButtons(1 << 4);

    pub fn contains(self, other: ReplayButtons) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: ReplayButtons) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ReplayButtons {
    type Output = ReplayButtons;

    fn bitor(self, rhs: ReplayButtons) -> ReplayButtons {
        ReplayButtons(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyReplayFrame {
    /// Absolute time in milliseconds.
    pub time: f64,
    /// Time since the previous frame.
    pub interval: f64,
    pub position: Vec2,
    pub buttons: ReplayButtons,
}

impl LegacyReplayFrame {
    pub fn new(time: f64, position: Vec2, buttons: ReplayButtons) -> Self {
        Self {
            time,
            interval: 0.0,
            position,
            buttons,
        }
    }
}

/// One `buttons|x|y|delta` record of the frame stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameRecord {
    pub buttons: i32,
    pub x: f32,
    pub y: f32,
    pub delta: f64,
}

impl FrameRecord {
    pub fn parse(record: &str) -> Result<FrameRecord> {
        let fields: Vec<&str> = record.trim().split('|').collect();
        let [buttons, x, y, delta] = fields[..] else {
            return Err(Error::format(format!(
                "frame record {record:?} needs 4 fields, got {}",
                fields.len()
            )));
        };
        Ok(FrameRecord {
            buttons: parse_int(buttons)?,
            x: parse_float(x)?,
            y: parse_float(y)?,
            delta: parse_double(delta)?,
        })
    }

    pub fn to_text(&self) -> String {
        format!("{}|{}|{}|{}", self.buttons, self.x, self.y, self.delta)
    }
}
