use serde::{Deserialize, Serialize};

use crate::section::{Section, SectionGate};

/// Which parts of a map file a decode pass fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub general: bool,
    pub editor: bool,
    pub metadata: bool,
    pub difficulty: bool,
    pub events: bool,
    pub timing_points: bool,
    pub colours: bool,
    pub hit_objects: bool,
    pub variables: bool,
    /// Keep sprite, animation and sample lines of `[Events]`.
    pub storyboard: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            general: true,
            editor: true,
            metadata: true,
            difficulty: true,
            events: true,
            timing_points: true,
            colours: true,
            hit_objects: true,
            variables: true,
            storyboard: true,
        }
    }
}

impl DecodeOptions {
    /// Reads nothing but the storyboard.
    pub fn storyboard_only() -> Self {
        Self {
            general: false,
            editor: false,
            metadata: false,
            difficulty: false,
            events: true,
            timing_points: false,
            colours: false,
            hit_objects: false,
            variables: true,
            storyboard: true,
        }
    }

    /// Enables only the named sections. Storyboard lines follow `Events`.
    pub fn only(sections: &[Section]) -> Self {
        let has = |s: Section| sections.contains(&s);
        Self {
            general: has(Section::General),
            editor: has(Section::Editor),
            metadata: has(Section::Metadata),
            difficulty: has(Section::Difficulty),
            events: has(Section::Events),
            timing_points: has(Section::TimingPoints),
            colours: has(Section::Colours),
            hit_objects: has(Section::HitObjects),
            variables: has(Section::Variables),
            storyboard: has(Section::Events),
        }
    }

    /// Applies the flags to a freshly reset gate.
    pub fn configure(&self, gate: &mut SectionGate) {
        gate.reset_all();
        let flags = [
            (Section::General, self.general),
            (Section::Editor, self.editor),
            (Section::Metadata, self.metadata),
            (Section::Difficulty, self.difficulty),
            (Section::Events, self.events),
            (Section::TimingPoints, self.timing_points),
            (Section::Colours, self.colours),
            (Section::HitObjects, self.hit_objects),
            (Section::Variables, self.variables),
        ];
        for (section, enabled) in flags {
            if enabled {
                gate.enable(section);
            } else {
                gate.disable(section);
            }
        }
    }
}
