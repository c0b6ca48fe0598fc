use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::path::SliderPath;
use crate::sample::{HitSampleInfo, HitSound, SampleBank};

/// Bits of the hit object type field.
pub mod type_flags {
    pub const CIRCLE: i32 = 1;
    pub const SLIDER: i32 = 1 << 1;
    pub const NEW_COMBO: i32 = 1 << 2;
    pub const SPINNER: i32 = 1 << 3;
    pub const COMBO_OFFSET: i32 = (1 << 4) | (1 << 5) | (1 << 6);
    pub const HOLD: i32 = 1 << 7;
}

/// Largest slide count accepted for a slider.
pub const MAX_SLIDES: i32 = 9000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitObject {
    pub position: Vec2,
    pub start_time: f64,
    pub new_combo: bool,
    /// Extra combo colours to skip, `0..=7`.
    pub combo_offset: i32,
    pub hit_sound: HitSound,
    pub samples: HitSampleInfo,
    pub kind: HitObjectKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HitObjectKind {
    Circle,
    Slider(Slider),
    Spinner { end_time: f64 },
    Hold { end_time: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    /// Control points relative to the object position.
    pub path: SliderPath,
    /// Number of slides as written, one more than the repeat count.
    pub slides: i32,
    /// Hit sound per node, head to tail.
    pub node_sounds: Vec<HitSound>,
    /// `(normal, addition)` banks per node.
    pub node_banks: Vec<(SampleBank, SampleBank)>,
}

impl Slider {
    /// Nodes are the head, every repeat point and the tail.
    pub fn node_count(slides: i32) -> usize {
        slides.max(1) as usize + 1
    }
}

impl HitObject {
    pub fn type_bits(&self) -> i32 {
        let kind = match self.kind {
            HitObjectKind::Circle => type_flags::CIRCLE,
            HitObjectKind::Slider(_) => type_flags::SLIDER,
            HitObjectKind::Spinner { .. } => type_flags::SPINNER,
            HitObjectKind::Hold { .. } => type_flags::HOLD,
        };
        let combo = if self.new_combo {
            type_flags::NEW_COMBO
        } else {
            0
        };
        kind | combo | ((self.combo_offset << 4) & type_flags::COMBO_OFFSET)
    }

    pub fn end_time(&self) -> f64 {
        match self.kind {
            HitObjectKind::Spinner { end_time } | HitObjectKind::Hold { end_time } => end_time,
            _ => self.start_time,
        }
    }
}
