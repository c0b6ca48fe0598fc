// Subcommand implementations. Each returns the text to print.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{debug, info};
use osu_model::storyboard::Layer;
use osu_model::{
    Beatmap, BeatmapDecoder, ByteSource, DecodeOptions, HitObjectKind, LegacyEnum, Section, encode,
};
use osu_replay::{Replay, ReplayDecoder, ReplayEncoder};

fn is_replay(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("osr"))
}

pub fn inspect<S: ByteSource>(source: &S, path: &Path, only: &[Section], json: bool) -> Result<String> {
    let options = if only.is_empty() {
        DecodeOptions::default()
    } else {
        DecodeOptions::only(only)
    };
    let beatmap = BeatmapDecoder::with_options(options)
        .decode_from(source, path)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    if json {
        return serde_json::to_string_pretty(&beatmap).context("failed to serialize beatmap");
    }
    Ok(summarize_beatmap(&beatmap))
}

pub fn summarize_beatmap(beatmap: &Beatmap) -> String {
    let mut out = String::new();
    let meta = &beatmap.metadata;
    let _ = writeln!(out, "format:   v{}", beatmap.format_version);
    let _ = writeln!(out, "mode:     {}", beatmap.general.mode.name());
    let _ = writeln!(out, "title:    {} - {} [{}]", meta.artist, meta.title, meta.version);
    let _ = writeln!(out, "creator:  {}", meta.creator);

    let (mut circles, mut sliders, mut spinners, mut holds) = (0, 0, 0, 0);
    for object in &beatmap.hit_objects {
        match object.kind {
            HitObjectKind::Circle => circles += 1,
            HitObjectKind::Slider(_) => sliders += 1,
            HitObjectKind::Spinner { .. } => spinners += 1,
            HitObjectKind::Hold { .. } => holds += 1,
        }
    }
    let _ = writeln!(
        out,
        "objects:  {} ({circles} circles, {sliders} sliders, {spinners} spinners, {holds} holds)",
        beatmap.hit_objects.len()
    );
    let _ = writeln!(out, "timing:   {} groups", beatmap.control_points.groups().len());
    let _ = writeln!(out, "breaks:   {}", beatmap.events.breaks.len());
    let _ = writeln!(out, "length:   {:.0} ms drain", beatmap.drain_length());

    if !beatmap.storyboard.is_empty() {
        let layers: Vec<String> = Layer::ALL
            .iter()
            .map(|&layer| (layer, beatmap.storyboard.layer(layer).count()))
            .filter(|&(_, count)| count > 0)
            .map(|(layer, count)| format!("{} {count}", layer.name()))
            .collect();
        let _ = writeln!(out, "story:    {}", layers.join(", "));
    }
    if !beatmap.md5.is_empty() {
        let _ = writeln!(out, "md5:      {}", beatmap.md5);
    }
    out
}

pub fn replay<S: ByteSource>(source: &S, path: &Path, json: bool) -> Result<String> {
    let replay = ReplayDecoder::new()
        .decode_from(source, path)
        .with_context(|| format!("failed to decode replay {}", path.display()))?;

    if json {
        return serde_json::to_string_pretty(&replay).context("failed to serialize replay");
    }
    Ok(summarize_replay(&replay))
}

pub fn summarize_replay(replay: &Replay) -> String {
    let mut out = String::new();
    let counts = &replay.counts;
    let _ = writeln!(out, "player:   {}", replay.player_name);
    let _ = writeln!(out, "mode:     {}", replay.ruleset.name());
    let _ = writeln!(out, "version:  {}", replay.version);
    let _ = writeln!(out, "played:   {}", replay.date.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "beatmap:  {}", replay.beatmap_hash);
    let _ = writeln!(
        out,
        "score:    {} x{}{}",
        replay.total_score,
        replay.max_combo,
        if replay.perfect { " (perfect)" } else { "" }
    );
    let _ = writeln!(
        out,
        "hits:     {}/{}/{} geki {} katu {} miss {}",
        counts.count_300,
        counts.count_100,
        counts.count_50,
        counts.count_geki,
        counts.count_katu,
        counts.count_miss
    );
    let _ = writeln!(out, "mods:     {:#x}", replay.mods);
    let _ = writeln!(
        out,
        "frames:   {} over {:.0} ms",
        replay.frames.len(),
        replay.duration()
    );
    if let Some(seed) = replay.seed {
        let _ = writeln!(out, "seed:     {seed}");
    }
    out
}

/// Names of the model parts that differ between two decodes.
pub fn beatmap_differences(before: &Beatmap, after: &Beatmap) -> Vec<&'static str> {
    let checks = [
        ("general", before.general == after.general),
        ("editor", before.editor == after.editor),
        ("metadata", before.metadata == after.metadata),
        ("difficulty", before.difficulty == after.difficulty),
        ("events", before.events == after.events),
        ("storyboard", before.storyboard == after.storyboard),
        ("timing points", before.control_points == after.control_points),
        ("colours", before.colours == after.colours),
        ("hit objects", before.hit_objects == after.hit_objects),
        ("variables", before.variables == after.variables),
    ];
    checks
        .into_iter()
        .filter(|&(_, same)| !same)
        .map(|(name, _)| name)
        .collect()
}

pub fn roundtrip<S: ByteSource>(source: &S, path: &Path, output: Option<&Path>) -> Result<String> {
    let (encoded, report) = if is_replay(path) {
        roundtrip_replay(source, path)?
    } else {
        roundtrip_beatmap(source, path)?
    };

    if let Some(output) = output {
        fs::write(output, &encoded)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("wrote {} bytes to {}", encoded.len(), output.display());
    }
    Ok(report)
}

fn roundtrip_beatmap<S: ByteSource>(source: &S, path: &Path) -> Result<(Vec<u8>, String)> {
    let decoder = BeatmapDecoder::new();
    let before = decoder
        .decode_from(source, path)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    let encoded = encode(&before);
    let after = decoder
        .decode(&encoded)
        .context("re-encoded beatmap failed to decode")?;
    debug!("re-encoded {} into {} bytes", path.display(), encoded.len());

    let differences = beatmap_differences(&before, &after);
    if !differences.is_empty() {
        bail!("round trip changed: {}", differences.join(", "));
    }
    let report = format!(
        "{}: round trip ok (v{} -> v{}, md5 {})\n",
        path.display(),
        before.format_version,
        after.format_version,
        after.md5
    );
    Ok((encoded, report))
}

fn roundtrip_replay<S: ByteSource>(source: &S, path: &Path) -> Result<(Vec<u8>, String)> {
    let decoder = ReplayDecoder::new();
    let before = decoder
        .decode_from(source, path)
        .with_context(|| format!("failed to decode replay {}", path.display()))?;
    let encoded = ReplayEncoder::new()
        .encode(&before)
        .context("failed to encode replay")?;
    let after = decoder
        .decode(&encoded)
        .context("re-encoded replay failed to decode")?;

    if before.frames != after.frames {
        bail!("round trip changed the frame stream");
    }
    if before != after {
        bail!("round trip changed the replay header");
    }
    let report = format!(
        "{}: round trip ok ({} frames)\n",
        path.display(),
        after.frames.len()
    );
    Ok((encoded, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_source::FsSource;
    use chrono::{TimeZone, Utc};
    use osu_model::{Ruleset, Vec2};
    use osu_replay::{HitCounts, LegacyReplayFrame, ReplayButtons};

    const MAP: &str = "osu file format v14

[General]
AudioFilename: audio.mp3
Mode: 0

[Metadata]
Title:Song
Artist:Band
Creator:mapper
Version:Hard

[Difficulty]
SliderMultiplier:1.4

[Events]
0,0,\"bg.jpg\",0,0
2,3000,4000
Sprite,Foreground,Centre,\"star.png\",320,240
 F,0,0,1000,0,1

[TimingPoints]
0,500,4,2,0,80,1,0

[HitObjects]
256,192,1000,5,0,0:0:0:0:
100,100,2000,2,0,B|200:100,1,100
256,192,5000,12,0,6000,0:0:0:0:
";

    fn write_map(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("map.osu");
        fs::write(&path, MAP).unwrap();
        path
    }

    fn sample_replay() -> Replay {
        Replay {
            ruleset: Ruleset::Taiko,
            version: 20240101,
            beatmap_hash: "abc".to_string(),
            player_name: "player".to_string(),
            replay_hash: "def".to_string(),
            counts: HitCounts {
                count_300: 10,
                ..HitCounts::default()
            },
            total_score: 1000,
            max_combo: 10,
            perfect: true,
            mods: 0,
            life_bar: Vec::new(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            frames: vec![LegacyReplayFrame {
                time: 20.0,
                interval: 20.0,
                position: Vec2::ZERO,
                buttons: ReplayButtons::LEFT1,
            }],
            seed: None,
            online_score_id: 0,
        }
    }

    #[test]
    fn test_inspect_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_map(dir.path());

        let summary = inspect(&FsSource, &path, &[], false).unwrap();
        assert!(summary.contains("title:    Band - Song [Hard]"));
        assert!(summary.contains("objects:  3 (1 circles, 1 sliders, 1 spinners, 0 holds)"));
        assert!(summary.contains("breaks:   1"));
        assert!(summary.contains("story:    Foreground 1"));
        assert!(summary.contains("md5:"));
    }

    #[test]
    fn test_inspect_only_metadata_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_map(dir.path());

        let json = inspect(&FsSource, &path, &[Section::Metadata], true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["title"], "Song");
        assert_eq!(value["hit_objects"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_inspect_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = inspect(&FsSource, &dir.path().join("none.osu"), &[], false).unwrap_err();
        assert!(format!("{err:#}").contains("none.osu"));
    }

    #[test]
    fn test_roundtrip_beatmap_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_map(dir.path());
        let output = dir.path().join("out.osu");

        let report = roundtrip(&FsSource, &path, Some(&output)).unwrap();
        assert!(report.contains("round trip ok"));
        let written = fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("osu file format v14"));
    }

    #[test]
    fn test_replay_summary_and_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("play.OSR");
        fs::write(&path, ReplayEncoder::new().encode(&sample_replay()).unwrap()).unwrap();

        let summary = replay(&FsSource, &path, false).unwrap();
        assert!(summary.contains("mode:     Taiko"));
        assert!(summary.contains("(perfect)"));
        assert!(summary.contains("frames:   1 over 0 ms"));

        let report = roundtrip(&FsSource, &path, None).unwrap();
        assert!(report.contains("1 frames"));
    }

    #[test]
    fn test_differences_name_changed_parts() {
        let before = Beatmap::default();
        let mut after = before.clone();
        after.metadata.title = "changed".to_string();
        after.variables.push(("$a".to_string(), "b".to_string()));
        assert_eq!(beatmap_differences(&before, &after), ["metadata", "variables"]);
        assert!(beatmap_differences(&before, &before).is_empty());
    }
}
