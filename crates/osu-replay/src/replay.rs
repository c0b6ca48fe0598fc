// Replay file model with its binary decoder and encoder.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, trace};
use lzma_rs::compress::{Options, UnpackedSize};
use osu_model::parsing::{parse_float, parse_int, round_to_even};
use osu_model::{ByteSource, Error, LegacyEnum, Result, Ruleset, Vec2};
use serde::{Deserialize, Serialize};

use crate::convert::{ConvertibleReplayFrame, from_legacy_frames};
use crate::legacy_frame::{FrameRecord, LegacyReplayFrame, ReplayButtons};
use crate::serialization::{ReplayReader, ReplayWriter};

/// Delta of the record that carries the random seed instead of a frame.
pub const SEED_MARKER: i32 = -12345;

/// Placeholder position of the frames stable writes before the first real one.
const PLACEHOLDER_POSITION: Vec2 = Vec2 { x: 256.0, y: -500.0 };

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitCounts {
    pub count_300: u16,
    pub count_100: u16,
    pub count_50: u16,
    pub count_geki: u16,
    pub count_katu: u16,
    pub count_miss: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifeBarPoint {
    pub time: i32,
    /// Health in `0..=1`.
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub ruleset: Ruleset,
    pub version: i32,
    pub beatmap_hash: String,
    pub player_name: String,
    pub replay_hash: String,
    pub counts: HitCounts,
    pub total_score: i32,
    pub max_combo: u16,
    pub perfect: bool,
    pub mods: i32,
    pub life_bar: Vec<LifeBarPoint>,
    pub date: DateTime<Utc>,
    pub frames: Vec<LegacyReplayFrame>,
    /// Random seed recorded at the end of the frame stream.
    pub seed: Option<i32>,
    pub online_score_id: i64,
}

impl Replay {
    /// Frames converted to the structured actions of the replay's mode.
    pub fn convert_frames<F: ConvertibleReplayFrame>(&self) -> Vec<F> {
        from_legacy_frames(&self.frames)
    }

    pub fn duration(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }
}

fn parse_life_bar(text: &str) -> Result<Vec<LifeBarPoint>> {
    text.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (time, value) = pair
                .split_once('|')
                .ok_or_else(|| Error::format(format!("life bar entry {pair:?} is not time|value")))?;
            Ok(LifeBarPoint {
                time: parse_int(time)?,
                value: parse_float(value)?,
            })
        })
        .collect()
}

fn format_life_bar(points: &[LifeBarPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{}|{},", p.time, p.value))
        .collect()
}

/// Parses the decompressed frame stream into absolute-time frames and the trailing seed.
fn parse_frames(text: &str) -> Result<(Vec<LegacyReplayFrame>, Option<i32>)> {
    let mut frames = Vec::new();
    let mut seed = None;
    let mut clock = 0.0;
    let mut last_kept: Option<f64> = None;

    let records = text.split(',').filter(|r| !r.trim().is_empty());
    for (index, raw) in records.enumerate() {
        let record = FrameRecord::parse(raw)?;
        if record.delta == f64::from(SEED_MARKER) {
            seed = Some(record.buttons);
            break;
        }

        clock += record.delta;
        let position = Vec2::new(record.x, record.y);
        if index < 2 && position == PLACEHOLDER_POSITION {
            trace!("skipping placeholder frame {index}");
            continue;
        }
        if record.delta < 0.0 {
            trace!("skipping frame {index} with negative delta {}", record.delta);
            continue;
        }

        let interval = last_kept.map_or(clock, |last| clock - last);
        last_kept = Some(clock);
        frames.push(LegacyReplayFrame {
            time: clock,
            interval,
            position,
            buttons: ReplayButtons(record.buttons),
        });
    }
    Ok((frames, seed))
}

fn format_frames(frames: &[LegacyReplayFrame], seed: Option<i32>) -> String {
    let mut out = String::new();
    let mut last_time = 0.0;
    for frame in frames {
        let time = round_to_even(frame.time);
        let record = FrameRecord {
            buttons: frame.buttons.0,
            x: frame.position.x,
            y: frame.position.y,
            delta: time - last_time,
        };
        out.push_str(&record.to_text());
        out.push(',');
        last_time = time;
    }
    if let Some(seed) = seed {
        let marker = FrameRecord {
            buttons: seed,
            x: 0.0,
            y: 0.0,
            delta: f64::from(SEED_MARKER),
        };
        out.push_str(&marker.to_text());
        out.push(',');
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct ReplayDecoder;

impl ReplayDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Replay> {
        let mut reader = ReplayReader::new(bytes);

        let mode = reader.read_u8()?;
        let ruleset = Ruleset::from_value(i32::from(mode))
            .ok_or_else(|| Error::format(format!("{mode} is not a game mode")))?;
        let version = reader.read_i32()?;
        let beatmap_hash = reader.read_string()?;
        let player_name = reader.read_string()?;
        let replay_hash = reader.read_string()?;

        let counts = HitCounts {
            count_300: reader.read_u16()?,
            count_100: reader.read_u16()?,
            count_50: reader.read_u16()?,
            count_geki: reader.read_u16()?,
            count_katu: reader.read_u16()?,
            count_miss: reader.read_u16()?,
        };
        let total_score = reader.read_i32()?;
        let max_combo = reader.read_u16()?;
        let perfect = reader.read_u8()? != 0;
        let mods = reader.read_i32()?;
        let life_bar = parse_life_bar(&reader.read_string()?)?;
        let date = reader.read_date()?;

        let compressed_length = reader.read_i32()?;
        let compressed_length = usize::try_from(compressed_length)
            .map_err(|_| Error::format(format!("negative compressed length {compressed_length}")))?;
        let compressed = reader.read_bytes(compressed_length)?;
        let stream = decompress_frames(compressed)?;
        let (frames, seed) = parse_frames(&stream)?;

        let online_score_id = reader.read_i64()?;

        debug!(
            "decoded {} replay v{version} by {player_name:?}: {} frames",
            ruleset.name(),
            frames.len()
        );
        Ok(Replay {
            ruleset,
            version,
            beatmap_hash,
            player_name,
            replay_hash,
            counts,
            total_score,
            max_combo,
            perfect,
            mods,
            life_bar,
            date,
            frames,
            seed,
            online_score_id,
        })
    }

    pub fn decode_from<S: ByteSource + ?Sized>(&self, source: &S, path: &Path) -> Result<Replay> {
        let bytes = source.read(path)?;
        self.decode(&bytes)
    }
}

/// Unpacks an LZMA-alone block: 13-byte header, then the range-coded stream.
fn decompress_frames(mut compressed: &[u8]) -> Result<String> {
    let mut stream = Vec::new();
    lzma_rs::lzma_decompress(&mut compressed, &mut stream)
        .map_err(|e| Error::Compression(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    String::from_utf8(stream).map_err(|e| Error::format(format!("frame stream is not UTF-8: {e}")))
}

/// Packs the frame stream with its unpacked size recorded in the header.
fn compress_frames(stream: &str) -> Result<Vec<u8>> {
    let options = Options {
        unpacked_size: UnpackedSize::WriteToHeader(Some(stream.len() as u64)),
    };
    let mut compressed = Vec::new();
    lzma_rs::lzma_compress_with_options(&mut stream.as_bytes(), &mut compressed, &options)
        .map_err(Error::Compression)?;
    Ok(compressed)
}

#[derive(Debug, Clone, Default)]
pub struct ReplayEncoder;

impl ReplayEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, replay: &Replay) -> Result<Vec<u8>> {
        let mut writer = ReplayWriter::new();
        writer.write_u8(replay.ruleset.value() as u8);
        writer.write_i32(replay.version);
        writer.write_string(&replay.beatmap_hash)?;
        writer.write_string(&replay.player_name)?;
        writer.write_string(&replay.replay_hash)?;

        let counts = &replay.counts;
        for count in [
            counts.count_300,
            counts.count_100,
            counts.count_50,
            counts.count_geki,
            counts.count_katu,
            counts.count_miss,
        ] {
            writer.write_u16(count);
        }
        writer.write_i32(replay.total_score);
        writer.write_u16(replay.max_combo);
        writer.write_u8(u8::from(replay.perfect));
        writer.write_i32(replay.mods);
        writer.write_string(&format_life_bar(&replay.life_bar))?;
        writer.write_date(&replay.date)?;

        let stream = format_frames(&replay.frames, replay.seed);
        let compressed = compress_frames(&stream)?;
        let length = i32::try_from(compressed.len())
            .map_err(|_| Error::range(format!("compressed frames of {} bytes", compressed.len())))?;
        writer.write_i32(length);
        writer.write_bytes(&compressed);

        writer.write_i64(replay.online_score_id);
        Ok(writer.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use osu_model::ErrorKind;

    fn sample_replay() -> Replay {
        Replay {
            ruleset: Ruleset::Osu,
            version: 20240101,
            beatmap_hash: "36f70c48e16e2b13c3c93609eafdaff9".to_string(),
            player_name: "player".to_string(),
            replay_hash: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            counts: HitCounts {
                count_300: 300,
                count_100: 20,
                count_50: 3,
                count_geki: 40,
                count_katu: 10,
                count_miss: 1,
            },
            total_score: 1_234_567,
            max_combo: 412,
            perfect: false,
            mods: 8 | 64,
            life_bar: vec![
                LifeBarPoint { time: 0, value: 1.0 },
                LifeBarPoint { time: 2000, value: 0.75 },
            ],
            date: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            frames: vec![
                LegacyReplayFrame {
                    time: 0.0,
                    interval: 0.0,
                    position: Vec2::new(100.0, 200.0),
                    buttons: ReplayButtons::NONE,
                },
                LegacyReplayFrame {
                    time: 16.0,
                    interval: 16.0,
                    position: Vec2::new(110.5, 190.25),
                    buttons: ReplayButtons::LEFT1,
                },
                LegacyReplayFrame {
                    time: 33.0,
                    interval: 17.0,
                    position: Vec2::new(120.0, 180.0),
                    buttons: ReplayButtons::LEFT1 | ReplayButtons::RIGHT1,
                },
            ],
            seed: Some(7),
            online_score_id: 987_654_321,
        }
    }

    #[test]
    fn test_round_trip() {
        let replay = sample_replay();
        let bytes = ReplayEncoder::new().encode(&replay).unwrap();
        assert_eq!(bytes[0], 0);
        let decoded = ReplayDecoder::new().decode(&bytes).unwrap();
        assert_eq!(decoded, replay);
    }

    #[test]
    fn test_frame_block_header() {
        let stream = "0|100|200|0,";
        let block = compress_frames(stream).unwrap();
        // properties byte, dictionary size, then the unpacked size
        assert_eq!(block[0], 0x5d);
        assert_eq!(&block[5..13], &(stream.len() as u64).to_le_bytes());
        assert_eq!(decompress_frames(&block).unwrap(), stream);
    }

    #[test]
    fn test_frame_block_garbage() {
        let err = decompress_frames(&[0x5d, 0, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(matches!(err, Error::Compression(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let replay = sample_replay();
        let json = serde_json::to_string(&replay).unwrap();
        let back: Replay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, replay);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let replay = sample_replay();
        let encoder = ReplayEncoder::new();
        assert_eq!(encoder.encode(&replay).unwrap(), encoder.encode(&replay).unwrap());
    }

    #[test]
    fn test_frame_stream_layout() {
        let replay = sample_replay();
        let stream = format_frames(&replay.frames, replay.seed);
        assert_eq!(stream, "0|100|200|0,1|110.5|190.25|16,3|120|180|17,7|0|0|-12345,");
    }

    #[test]
    fn test_frame_times_are_rounded_to_even() {
        let frames = [
            LegacyReplayFrame::new(0.5, Vec2::ZERO, ReplayButtons::NONE),
            LegacyReplayFrame::new(1.5, Vec2::ZERO, ReplayButtons::NONE),
            LegacyReplayFrame::new(2.5, Vec2::ZERO, ReplayButtons::NONE),
        ];
        assert_eq!(format_frames(&frames, None), "0|0|0|0,0|0|0|2,0|0|0|0,");
    }

    #[test]
    fn test_placeholders_and_negative_deltas_are_skipped() {
        let stream = "0|256|-500|0,0|256|-500|-1,0|10|10|20,0|11|11|-5,1|12|12|10,";
        let (frames, seed) = parse_frames(stream).unwrap();
        assert_eq!(seed, None);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].time, 19.0);
        // the skipped negative frame still moved the clock back
        assert_eq!(frames[1].time, 24.0);
        assert_eq!(frames[1].interval, 5.0);
        assert_eq!(frames[1].buttons, ReplayButtons::LEFT1);
    }

    #[test]
    fn test_seed_ends_stream() {
        let (frames, seed) = parse_frames("0|1|1|5,42|0|0|-12345,0|2|2|5,").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(seed, Some(42));
    }

    #[test]
    fn test_life_bar() {
        let points = parse_life_bar("0|1,500|0.5,").unwrap();
        assert_eq!(points[1], LifeBarPoint { time: 500, value: 0.5 });
        assert_eq!(format_life_bar(&points), "0|1,500|0.5,");
        assert!(parse_life_bar("").unwrap().is_empty());
        assert_eq!(parse_life_bar("0-1").unwrap_err().kind(), ErrorKind::Format);
    }

    #[test]
    fn test_truncated_replay() {
        let bytes = ReplayEncoder::new().encode(&sample_replay()).unwrap();
        for len in [0, 1, 10, bytes.len() - 1] {
            let err = ReplayDecoder::new().decode(&bytes[..len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "length {len}");
        }
    }

    #[test]
    fn test_unknown_mode() {
        let mut bytes = ReplayEncoder::new().encode(&sample_replay()).unwrap();
        bytes[0] = 9;
        assert_eq!(
            ReplayDecoder::new().decode(&bytes).unwrap_err().kind(),
            ErrorKind::Format
        );
    }
}
