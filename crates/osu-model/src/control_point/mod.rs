// Control points: timestamped changes to tempo, slider velocity, effects and samples.

mod timeline;

pub use timeline::{ControlPointGroup, ControlPointTimeline};

use serde::{Deserialize, Serialize};

use crate::sample::SampleBank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ControlPointKind {
    Timing,
    Difficulty,
    Effect,
    Sample,
}

impl ControlPointKind {
    pub const ALL: [ControlPointKind; 4] = [
        ControlPointKind::Timing,
        ControlPointKind::Difficulty,
        ControlPointKind::Effect,
        ControlPointKind::Sample,
    ];
}

/// Tempo and meter change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    /// Milliseconds per beat, kept within `6..=60000`.
    pub beat_length: f64,
    /// Beats per bar.
    pub meter: i32,
    pub omit_first_bar_line: bool,
}

impl TimingPoint {
    pub const DEFAULT_BEAT_LENGTH: f64 = 1000.0;
    pub const MIN_BEAT_LENGTH: f64 = 6.0;
    pub const MAX_BEAT_LENGTH: f64 = 60000.0;

    pub fn new(beat_length: f64, meter: i32) -> Self {
        Self {
            beat_length: beat_length.clamp(Self::MIN_BEAT_LENGTH, Self::MAX_BEAT_LENGTH),
            meter,
            omit_first_bar_line: false,
        }
    }

    pub fn bpm(&self) -> f64 {
        60000.0 / self.beat_length
    }
}

/// Slider velocity multiplier change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPoint {
    /// Kept within `0.1..=10`.
    pub slider_velocity: f64,
    /// False when the source line disabled slider ticks with a NaN beat length.
    pub generate_ticks: bool,
}

impl DifficultyPoint {
    pub const MIN_SLIDER_VELOCITY: f64 = 0.1;
    pub const MAX_SLIDER_VELOCITY: f64 = 10.0;

    pub fn new(slider_velocity: f64) -> Self {
        Self {
            slider_velocity: slider_velocity
                .clamp(Self::MIN_SLIDER_VELOCITY, Self::MAX_SLIDER_VELOCITY),
            generate_ticks: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectPoint {
    pub kiai: bool,
    pub scroll_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub bank: SampleBank,
    pub volume: i32,
    pub custom_sample_bank: i32,
}

/// Kind-specific payload of a control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlPointData {
    Timing(TimingPoint),
    Difficulty(DifficultyPoint),
    Effect(EffectPoint),
    Sample(SamplePoint),
}

impl ControlPointData {
    pub fn kind(&self) -> ControlPointKind {
        match self {
            Self::Timing(_) => ControlPointKind::Timing,
            Self::Difficulty(_) => ControlPointKind::Difficulty,
            Self::Effect(_) => ControlPointKind::Effect,
            Self::Sample(_) => ControlPointKind::Sample,
        }
    }

    /// Whether adding `self` where `existing` is already in effect changes nothing.
    ///
    /// Timing points are never redundant since each one restarts the beat grid.
    pub fn is_redundant(&self, existing: &ControlPointData) -> bool {
        match (self, existing) {
            (Self::Timing(_), _) => false,
            (Self::Difficulty(new), Self::Difficulty(old)) => {
                new.slider_velocity == old.slider_velocity
                    && new.generate_ticks == old.generate_ticks
            }
            (Self::Effect(new), Self::Effect(old)) => {
                new.kiai == old.kiai && new.scroll_speed == old.scroll_speed
            }
            (Self::Sample(new), Self::Sample(old)) => new == old,
            _ => false,
        }
    }
}

/// Key of the group a point belongs to: the group's start time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupKey(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    group: Option<GroupKey>,
    pub data: ControlPointData,
}

impl ControlPoint {
    /// An unattached point.
    pub const fn new(data: ControlPointData) -> Self {
        Self { group: None, data }
    }

    pub fn kind(&self) -> ControlPointKind {
        self.data.kind()
    }

    pub fn group(&self) -> Option<GroupKey> {
        self.group
    }

    /// Start time of the owning group, or zero while unattached.
    pub fn start_time(&self) -> f64 {
        self.group.map_or(0.0, |key| key.0)
    }

    pub(crate) fn set_group(&mut self, group: Option<GroupKey>) {
        self.group = group;
    }
}

pub(crate) static DEFAULT_TIMING: ControlPoint = ControlPoint::new(ControlPointData::Timing(
    TimingPoint {
        beat_length: TimingPoint::DEFAULT_BEAT_LENGTH,
        meter: 4,
        omit_first_bar_line: false,
    },
));

pub(crate) static DEFAULT_DIFFICULTY: ControlPoint =
    ControlPoint::new(ControlPointData::Difficulty(DifficultyPoint {
        slider_velocity: 1.0,
        generate_ticks: true,
    }));

pub(crate) static DEFAULT_EFFECT: ControlPoint =
    ControlPoint::new(ControlPointData::Effect(EffectPoint {
        kiai: false,
        scroll_speed: 1.0,
    }));

pub(crate) static DEFAULT_SAMPLE: ControlPoint =
    ControlPoint::new(ControlPointData::Sample(SamplePoint {
        bank: SampleBank::Normal,
        volume: 100,
        custom_sample_bank: 0,
    }));

impl ControlPointKind {
    pub fn default_point(self) -> &'static ControlPoint {
        match self {
            Self::Timing => &DEFAULT_TIMING,
            Self::Difficulty => &DEFAULT_DIFFICULTY,
            Self::Effect => &DEFAULT_EFFECT,
            Self::Sample => &DEFAULT_SAMPLE,
        }
    }
}
