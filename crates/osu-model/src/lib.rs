// Legacy rhythm game map model: text decoder, encoder, control points, slider paths, storyboards

mod beatmap;
pub mod control_point;
mod decode;
mod encode;
mod error;
mod hit_object;
pub mod math;
mod mode;
mod options;
pub mod parsing;
pub mod path;
mod sample;
mod section;
mod source;
pub mod storyboard;

pub use beatmap::{
    Background, Beatmap, BreakPeriod, Colour, Colours, Difficulty, Editor, Events, General,
    LATEST_VERSION, Metadata, Video,
};
pub use control_point::{ControlPoint, ControlPointData, ControlPointKind, ControlPointTimeline};
pub use decode::{BeatmapDecoder, decode};
pub use encode::encode;
pub use error::{Error, ErrorKind, Result};
pub use hit_object::{HitObject, HitObjectKind, MAX_SLIDES, Slider, type_flags};
pub use math::Vec2;
pub use mode::{Countdown, Ruleset};
pub use options::DecodeOptions;
pub use parsing::LegacyEnum;
pub use sample::{HitSampleInfo, HitSound, SampleBank};
pub use section::{Section, SectionGate};
pub use source::{ByteSource, MemorySource, not_found};
pub use storyboard::Storyboard;
