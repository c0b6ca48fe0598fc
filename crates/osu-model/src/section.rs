// Section routing for the text map format.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural region of a map file, named by its `[Header]` line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    General,
    Editor,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    Colours,
    HitObjects,
    Variables,
    Fonts,
    CatchTheBeat,
    Mania,
    /// Any header this codec has no name for.
    Custom(String),
}

impl Section {
    pub const KNOWN: [Section; 12] = [
        Section::General,
        Section::Editor,
        Section::Metadata,
        Section::Difficulty,
        Section::Events,
        Section::TimingPoints,
        Section::Colours,
        Section::HitObjects,
        Section::Variables,
        Section::Fonts,
        Section::CatchTheBeat,
        Section::Mania,
    ];

    /// Maps a header name (without brackets) to a section.
    pub fn from_name(name: &str) -> Section {
        Section::KNOWN
            .iter()
            .find(|s| s.name() == name)
            .cloned()
            .unwrap_or_else(|| Section::Custom(name.to_string()))
    }

    pub fn name(&self) -> &str {
        match self {
            Section::General => "General",
            Section::Editor => "Editor",
            Section::Metadata => "Metadata",
            Section::Difficulty => "Difficulty",
            Section::Events => "Events",
            Section::TimingPoints => "TimingPoints",
            Section::Colours => "Colours",
            Section::HitObjects => "HitObjects",
            Section::Variables => "Variables",
            Section::Fonts => "Fonts",
            Section::CatchTheBeat => "CatchTheBeat",
            Section::Mania => "Mania",
            Section::Custom(name) => name,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name())
    }
}

/// Enabled flags per section plus the section the parser currently sits in.
///
/// Known sections start enabled; a section without an entry counts as
/// disabled, as does the absence of a current section.
#[derive(Debug, Clone)]
pub struct SectionGate {
    flags: BTreeMap<Section, bool>,
    current: Option<Section>,
}

impl Default for SectionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionGate {
    pub fn new() -> Self {
        let flags = Section::KNOWN.iter().cloned().map(|s| (s, true)).collect();
        Self {
            flags,
            current: None,
        }
    }

    /// Moves the cursor. Flags are left untouched.
    pub fn set_current(&mut self, section: Section) {
        self.current = Some(section);
    }

    pub fn current(&self) -> Option<&Section> {
        self.current.as_ref()
    }

    pub fn enable(&mut self, section: Section) {
        self.flags.insert(section, true);
    }

    pub fn disable(&mut self, section: Section) {
        self.flags.insert(section, false);
    }

    pub fn is_enabled(&self, section: &Section) -> bool {
        self.flags.get(section).copied().unwrap_or(false)
    }

    pub fn is_current_enabled(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|section| self.is_enabled(section))
    }

    /// Re-enables every registered section and clears the cursor.
    pub fn reset_all(&mut self) {
        for flag in self.flags.values_mut() {
            *flag = true;
        }
        self.current = None;
    }
}
