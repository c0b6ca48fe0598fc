// In-memory beatmap model filled by the decoder and read by the encoder.

use serde::{Deserialize, Serialize};

use crate::control_point::ControlPointTimeline;
use crate::hit_object::HitObject;
use crate::mode::{Countdown, Ruleset};
use crate::sample::SampleBank;
use crate::storyboard::Storyboard;

/// Format version written by the encoder.
pub const LATEST_VERSION: i32 = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct General {
    pub audio_filename: String,
    pub audio_lead_in: i32,
    pub preview_time: i32,
    pub sample_set: SampleBank,
    pub sample_volume: i32,
    pub stack_leniency: f32,
    pub mode: Ruleset,
    pub countdown: Countdown,
    pub countdown_offset: i32,
    pub letterbox_in_breaks: bool,
    pub widescreen_storyboard: bool,
    pub epilepsy_warning: bool,
    pub special_style: bool,
    pub samples_match_playback_rate: bool,
    pub use_skin_sprites: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            audio_filename: String::new(),
            audio_lead_in: 0,
            preview_time: -1,
            sample_set: SampleBank::Normal,
            sample_volume: 100,
            stack_leniency: 0.7,
            mode: Ruleset::Osu,
            countdown: Countdown::Normal,
            countdown_offset: 0,
            letterbox_in_breaks: false,
            widescreen_storyboard: false,
            epilepsy_warning: false,
            special_style: false,
            samples_match_playback_rate: false,
            use_skin_sprites: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Editor {
    pub bookmarks: Vec<i32>,
    pub distance_spacing: f64,
    pub beat_divisor: i32,
    pub grid_size: i32,
    pub timeline_zoom: f64,
}

impl Default for Editor {
    fn default() -> Self {
        Self {
            bookmarks: Vec::new(),
            distance_spacing: 1.0,
            beat_divisor: 4,
            grid_size: 4,
            timeline_zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub title_unicode: String,
    pub artist: String,
    pub artist_unicode: String,
    pub creator: String,
    pub version: String,
    pub source: String,
    pub tags: String,
    pub beatmap_id: i32,
    pub beatmap_set_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub hp_drain_rate: f32,
    pub circle_size: f32,
    pub overall_difficulty: f32,
    pub approach_rate: f32,
    /// Kept within `0.4..=3.6`.
    pub slider_multiplier: f64,
    /// Kept within `0.5..=8`.
    pub slider_tick_rate: f64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            hp_drain_rate: 5.0,
            circle_size: 5.0,
            overall_difficulty: 5.0,
            approach_rate: 5.0,
            slider_multiplier: 1.4,
            slider_tick_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub filename: String,
    pub x_offset: i32,
    pub y_offset: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub start_time: i32,
    pub filename: String,
    pub x_offset: i32,
    pub y_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub start_time: f64,
    pub end_time: f64,
}

impl BreakPeriod {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Events {
    pub background: Option<Background>,
    pub video: Option<Video>,
    pub breaks: Vec<BreakPeriod>,
}

/// An RGBA colour with byte channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Colours {
    /// `Combo1`, `Combo2`, ... in file order.
    pub combo_colours: Vec<Colour>,
    /// Every other named colour, in file order.
    pub custom_colours: Vec<(String, Colour)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    pub format_version: i32,
    pub general: General,
    pub editor: Editor,
    pub metadata: Metadata,
    pub difficulty: Difficulty,
    pub events: Events,
    pub storyboard: Storyboard,
    pub control_points: ControlPointTimeline,
    pub colours: Colours,
    pub hit_objects: Vec<HitObject>,
    /// `$NAME` to replacement text, in declaration order.
    pub variables: Vec<(String, String)>,
    /// Hex MD5 of the decoded bytes. Empty for models not built by the decoder.
    pub md5: String,
    /// Hex SHA-256 of the decoded bytes.
    pub sha256: String,
}

impl Default for Beatmap {
    fn default() -> Self {
        Self {
            format_version: LATEST_VERSION,
            general: General::default(),
            editor: Editor::default(),
            metadata: Metadata::default(),
            difficulty: Difficulty::default(),
            events: Events::default(),
            storyboard: Storyboard::default(),
            control_points: ControlPointTimeline::default(),
            colours: Colours::default(),
            hit_objects: Vec::new(),
            variables: Vec::new(),
            md5: String::new(),
            sha256: String::new(),
        }
    }
}

impl Beatmap {
    /// Copy without the source digests, for comparing decoded models.
    pub fn without_hashes(&self) -> Beatmap {
        Beatmap {
            md5: String::new(),
            sha256: String::new(),
            ..self.clone()
        }
    }

    pub fn total_break_time(&self) -> f64 {
        self.events.breaks.iter().map(BreakPeriod::duration).sum()
    }

    /// Playable length from the first object to the end of the last one, breaks excluded.
    pub fn drain_length(&self) -> f64 {
        match (self.hit_objects.first(), self.hit_objects.last()) {
            (Some(first), Some(last)) => {
                last.end_time() - first.start_time - self.total_break_time()
            }
            _ => 0.0,
        }
    }
}
