// Text map decoder: routes each line through the section gate to a handler.

mod events;
mod hit_objects;
mod sections;
mod timing;

use std::borrow::Cow;
use std::path::Path;

use log::{debug, trace};

use crate::beatmap::{Beatmap, LATEST_VERSION};
use crate::error::Result;
use crate::options::DecodeOptions;
use crate::parsing::parse_int;
use crate::section::{Section, SectionGate};
use crate::source::ByteSource;

use self::events::StoryboardCursor;
use self::timing::PendingControlPoints;

pub(crate) use self::timing::effect_flags;

const HEADER_PREFIX: &str = "osu file format v";

/// Files older than this have every timestamp shifted.
const OFFSET_CUTOFF_VERSION: i32 = 5;
const LEGACY_OFFSET: i32 = 24;

type Handler = fn(&mut DecodeState, &str) -> Result<()>;

/// Map file decoder.
#[derive(Debug, Clone, Default)]
pub struct BeatmapDecoder {
    options: DecodeOptions,
}

/// Decodes with every section enabled.
pub fn decode(bytes: &[u8]) -> Result<Beatmap> {
    BeatmapDecoder::new().decode(bytes)
}

impl BeatmapDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Beatmap> {
        let text = decode_text(bytes);
        let mut beatmap = self.decode_str(&text)?;
        compute_hashes(bytes, &mut beatmap);
        debug!(
            "decoded v{} map: {} objects, {} control point groups, {} storyboard elements",
            beatmap.format_version,
            beatmap.hit_objects.len(),
            beatmap.control_points.groups().len(),
            beatmap.storyboard.elements.len()
        );
        Ok(beatmap)
    }

    pub fn decode_from<S: ByteSource + ?Sized>(&self, source: &S, path: &Path) -> Result<Beatmap> {
        let bytes = source.read(path)?;
        self.decode(&bytes)
    }

    /// Decodes already-decoded text. Hashes are left empty.
    pub fn decode_str(&self, text: &str) -> Result<Beatmap> {
        let mut gate = SectionGate::new();
        self.options.configure(&mut gate);
        let mut state = DecodeState::new(self.options.storyboard);
        let mut seen_content = false;

        for (index, raw) in text.lines().enumerate() {
            let number = index + 1;
            let line = raw.trim_end();
            if line.trim_start().is_empty() {
                continue;
            }

            if !seen_content {
                seen_content = true;
                if let Some(version) = line.trim_start().strip_prefix(HEADER_PREFIX) {
                    let version = parse_int(version).map_err(|e| e.at_line(number))?;
                    state.set_version(version);
                    continue;
                }
            }

            if line.trim_start().starts_with("//") {
                continue;
            }

            if let Some(name) = section_header(line) {
                state.finish_section();
                gate.set_current(Section::from_name(name));
                continue;
            }

            if !gate.is_current_enabled() {
                continue;
            }
            let Some(section) = gate.current() else {
                continue;
            };
            let Some(handler) = handler_for(section) else {
                trace!("no handler for {section}, skipping line {number}");
                continue;
            };
            let line = if *section == Section::Metadata {
                line
            } else {
                strip_comment(line)
            };
            handler(&mut state, line).map_err(|e| e.at_line(number))?;
        }

        Ok(state.finish())
    }
}

fn handler_for(section: &Section) -> Option<Handler> {
    let handler: Handler = match section {
        Section::General => sections::general,
        Section::Editor => sections::editor,
        Section::Metadata => sections::metadata,
        Section::Difficulty => sections::difficulty,
        Section::Colours => sections::colour,
        Section::Variables => sections::variable,
        Section::Events => events::event,
        Section::TimingPoints => timing::timing_point,
        Section::HitObjects => hit_objects::hit_object,
        _ => return None,
    };
    Some(handler)
}

fn section_header(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    trimmed.strip_prefix('[')?.strip_suffix(']')
}

/// Cuts a trailing `//` comment. A comment at the start of a line is handled earlier.
fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(index) if index > 0 => line[..index].trim_end(),
        _ => line,
    }
}

/// Decoder state shared by the section handlers during one pass.
pub(crate) struct DecodeState {
    beatmap: Beatmap,
    /// Added to every timestamp of pre-v5 files.
    offset: i32,
    keep_storyboard: bool,
    has_approach_rate: bool,
    pending_points: PendingControlPoints,
    cursor: StoryboardCursor,
}

impl DecodeState {
    fn new(keep_storyboard: bool) -> Self {
        // input without a header line, such as a storyboard file, is read as the latest version
        Self {
            beatmap: Beatmap {
                format_version: LATEST_VERSION,
                ..Beatmap::default()
            },
            offset: 0,
            keep_storyboard,
            has_approach_rate: false,
            pending_points: PendingControlPoints::default(),
            cursor: StoryboardCursor::default(),
        }
    }

    fn set_version(&mut self, version: i32) {
        self.beatmap.format_version = version;
        self.offset = if version < OFFSET_CUTOFF_VERSION {
            LEGACY_OFFSET
        } else {
            0
        };
    }

    fn version(&self) -> i32 {
        self.beatmap.format_version
    }

    fn offset_time(&self, time: f64) -> f64 {
        time + f64::from(self.offset)
    }

    fn finish_section(&mut self) {
        self.pending_points
            .flush(&mut self.beatmap.control_points);
        self.cursor = StoryboardCursor::default();
    }

    fn finish(mut self) -> Beatmap {
        self.finish_section();
        if !self.has_approach_rate {
            self.beatmap.difficulty.approach_rate = self.beatmap.difficulty.overall_difficulty;
        }
        self.beatmap
    }

    /// Repeatedly replaces `$NAME` tokens until the line stops changing.
    fn substitute_variables<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if self.beatmap.variables.is_empty() || !line.contains('$') {
            return Cow::Borrowed(line);
        }
        // longest names first so `$a` never eats the front of `$ab`
        let mut by_length: Vec<&(String, String)> = self.beatmap.variables.iter().collect();
        by_length.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut current = line.to_string();
        for _ in 0..=by_length.len() {
            let mut next = current.clone();
            for (name, value) in &by_length {
                next = next.replace(name.as_str(), value);
            }
            if next == current {
                break;
            }
            current = next;
        }
        Cow::Owned(current)
    }
}

fn decode_text(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(raw);
    if let Ok(text) = std::str::from_utf8(raw) {
        return Cow::Borrowed(text);
    }
    // Pre-unicode editors wrote the system code page
    let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(raw);
    Cow::Owned(decoded.into_owned())
}

fn compute_hashes(raw: &[u8], beatmap: &mut Beatmap) {
    use md5::Md5;
    use sha2::{Digest, Sha256};

    beatmap.md5 = format!("{:x}", Md5::digest(raw));
    beatmap.sha256 = format!("{:x}", Sha256::digest(raw));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};

    fn decode_inline(text: &str) -> Beatmap {
        BeatmapDecoder::new().decode(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_header_version() {
        let beatmap = decode_inline("osu file format v9\n\n[General]\nAudioFilename: a.mp3\n");
        assert_eq!(beatmap.format_version, 9);
        assert_eq!(beatmap.general.audio_filename, "a.mp3");
    }

    #[test]
    fn test_missing_header_uses_latest() {
        let beatmap = decode_inline("[Metadata]\nTitle:Song\n");
        assert_eq!(beatmap.format_version, LATEST_VERSION);
        assert_eq!(beatmap.metadata.title, "Song");
    }

    #[test]
    fn test_bad_header_version() {
        let err = BeatmapDecoder::new()
            .decode(b"osu file format vX\n")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(matches!(err, Error::Line { line: 1, .. }));
    }

    #[test]
    fn test_bom_and_crlf() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"osu file format v14\r\n\r\n[Metadata]\r\nArtist:Someone\r\n");
        let beatmap = BeatmapDecoder::new().decode(&bytes).unwrap();
        assert_eq!(beatmap.format_version, 14);
        assert_eq!(beatmap.metadata.artist, "Someone");
    }

    #[test]
    fn test_windows_1252_fallback() {
        let bytes = b"[Metadata]\nArtist:Caf\xe9\n";
        let beatmap = BeatmapDecoder::new().decode(bytes).unwrap();
        assert_eq!(beatmap.metadata.artist, "Caf\u{e9}");
    }

    #[test]
    fn test_hashes_of_raw_bytes() {
        let beatmap = decode_inline("osu file format v14\n");
        assert_eq!(beatmap.md5, "36f70c48e16e2b13c3c93609eafdaff9");
        assert_eq!(
            beatmap.sha256,
            "b8568f02331922c7cec6624f3d9f02de897c03ab6442bad9c3411bb84594ffa1"
        );
    }

    #[test]
    fn test_comments_and_metadata_slashes() {
        let text = "osu file format v14\n// leading comment\n[Metadata]\nSource:http://example.com\n[Difficulty]\nHPDrainRate:6 // trailing\n";
        let beatmap = decode_inline(text);
        assert_eq!(beatmap.metadata.source, "http://example.com");
        assert_eq!(beatmap.difficulty.hp_drain_rate, 6.0);
    }

    #[test]
    fn test_error_reports_line_number() {
        let text = "osu file format v14\n\n[Difficulty]\nCircleSize:4\nOverallDifficulty:abc\n";
        let err = BeatmapDecoder::new().decode(text.as_bytes()).unwrap_err();
        match err {
            Error::Line { line, source } => {
                assert_eq!(line, 5);
                assert_eq!(source.kind(), ErrorKind::Format);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_gated_sections_are_not_parsed() {
        // the malformed difficulty line is never looked at
        let text = "[Metadata]\nTitle:T\n[Difficulty]\nCircleSize:zzz\n";
        let options = DecodeOptions::only(&[Section::Metadata]);
        let beatmap = BeatmapDecoder::with_options(options)
            .decode(text.as_bytes())
            .unwrap();
        assert_eq!(beatmap.metadata.title, "T");
        assert_eq!(beatmap.difficulty.circle_size, 5.0);
    }

    #[test]
    fn test_unknown_section_skipped() {
        let text = "[Extras]\nwhatever,1,2\n[Metadata]\nVersion:Hard\n";
        let beatmap = decode_inline(text);
        assert_eq!(beatmap.metadata.version, "Hard");
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("a,b // c"), "a,b");
        assert_eq!(strip_comment("// whole"), "// whole");
        assert_eq!(strip_comment("plain"), "plain");
    }
}
