// Text map encoder: writes the latest format version in canonical section order.
//
// Decoding the output yields an equal model for anything the decoder itself
// produces, with the exceptions listed on `encode`.

mod storyboard;

use std::fmt::{self, Write};

use crate::beatmap::{Beatmap, Colour, LATEST_VERSION};
use crate::control_point::{ControlPointGroup, ControlPointKind, ControlPointTimeline, DifficultyPoint};
use crate::decode::effect_flags;
use crate::hit_object::{HitObject, HitObjectKind, Slider};
use crate::parsing::LegacyEnum;
use crate::path::PathType;

/// Encodes `beatmap` as version 14 text.
///
/// Positions are written as they are but read back truncated, and in taiko and
/// mania the scroll speed of an inherited line always mirrors its slider velocity.
/// A velocity that no beat length divides out to exactly is written as the nearest one.
pub fn encode(beatmap: &Beatmap) -> Vec<u8> {
    let mut out = String::new();
    // fmt::Write for String cannot fail
    let _ = write_beatmap(&mut out, beatmap);
    out.into_bytes()
}

fn write_beatmap(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    writeln!(out, "osu file format v{LATEST_VERSION}")?;
    write_general(out, beatmap)?;
    write_editor(out, beatmap)?;
    write_metadata(out, beatmap)?;
    write_difficulty(out, beatmap)?;
    if !beatmap.variables.is_empty() {
        writeln!(out, "\n[Variables]")?;
        for (name, value) in &beatmap.variables {
            writeln!(out, "{name}={value}")?;
        }
    }
    write_events(out, beatmap)?;
    write_timing_points(out, beatmap)?;
    write_colours(out, beatmap)?;
    write_hit_objects(out, beatmap)
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn write_general(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    let general = &beatmap.general;
    writeln!(out, "\n[General]")?;
    writeln!(out, "AudioFilename: {}", general.audio_filename)?;
    writeln!(out, "AudioLeadIn: {}", general.audio_lead_in)?;
    writeln!(out, "PreviewTime: {}", general.preview_time)?;
    writeln!(out, "Countdown: {}", general.countdown.value())?;
    writeln!(out, "CountdownOffset: {}", general.countdown_offset)?;
    writeln!(out, "SampleSet: {}", general.sample_set.name())?;
    writeln!(out, "SampleVolume: {}", general.sample_volume)?;
    writeln!(out, "StackLeniency: {}", general.stack_leniency)?;
    writeln!(out, "Mode: {}", general.mode.value())?;
    writeln!(out, "LetterboxInBreaks: {}", flag(general.letterbox_in_breaks))?;
    writeln!(out, "WidescreenStoryboard: {}", flag(general.widescreen_storyboard))?;
    writeln!(out, "EpilepsyWarning: {}", flag(general.epilepsy_warning))?;
    writeln!(out, "SpecialStyle: {}", flag(general.special_style))?;
    writeln!(
        out,
        "SamplesMatchPlaybackRate: {}",
        flag(general.samples_match_playback_rate)
    )?;
    writeln!(out, "UseSkinSprites: {}", flag(general.use_skin_sprites))
}

fn write_editor(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    let editor = &beatmap.editor;
    writeln!(out, "\n[Editor]")?;
    if !editor.bookmarks.is_empty() {
        let bookmarks: Vec<String> = editor.bookmarks.iter().map(i32::to_string).collect();
        writeln!(out, "Bookmarks: {}", bookmarks.join(","))?;
    }
    writeln!(out, "DistanceSpacing: {}", editor.distance_spacing)?;
    writeln!(out, "BeatDivisor: {}", editor.beat_divisor)?;
    writeln!(out, "GridSize: {}", editor.grid_size)?;
    writeln!(out, "TimelineZoom: {}", editor.timeline_zoom)
}

fn write_metadata(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    let metadata = &beatmap.metadata;
    writeln!(out, "\n[Metadata]")?;
    writeln!(out, "Title:{}", metadata.title)?;
    writeln!(out, "TitleUnicode:{}", metadata.title_unicode)?;
    writeln!(out, "Artist:{}", metadata.artist)?;
    writeln!(out, "ArtistUnicode:{}", metadata.artist_unicode)?;
    writeln!(out, "Creator:{}", metadata.creator)?;
    writeln!(out, "Version:{}", metadata.version)?;
    writeln!(out, "Source:{}", metadata.source)?;
    writeln!(out, "Tags:{}", metadata.tags)?;
    writeln!(out, "BeatmapID:{}", metadata.beatmap_id)?;
    writeln!(out, "BeatmapSetID:{}", metadata.beatmap_set_id)
}

fn write_difficulty(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    let difficulty = &beatmap.difficulty;
    writeln!(out, "\n[Difficulty]")?;
    writeln!(out, "HPDrainRate:{}", difficulty.hp_drain_rate)?;
    writeln!(out, "CircleSize:{}", difficulty.circle_size)?;
    writeln!(out, "OverallDifficulty:{}", difficulty.overall_difficulty)?;
    writeln!(out, "ApproachRate:{}", difficulty.approach_rate)?;
    writeln!(out, "SliderMultiplier:{}", difficulty.slider_multiplier)?;
    writeln!(out, "SliderTickRate:{}", difficulty.slider_tick_rate)
}

fn write_events(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    let events = &beatmap.events;
    writeln!(out, "\n[Events]")?;
    if let Some(background) = &events.background {
        writeln!(
            out,
            "0,0,\"{}\",{},{}",
            background.filename, background.x_offset, background.y_offset
        )?;
    }
    if let Some(video) = &events.video {
        writeln!(
            out,
            "Video,{},\"{}\",{},{}",
            video.start_time, video.filename, video.x_offset, video.y_offset
        )?;
    }
    for period in &events.breaks {
        writeln!(out, "2,{},{}", period.start_time, period.end_time)?;
    }
    storyboard::write_storyboard(out, &beatmap.storyboard)
}

/// Beat length of an inherited line that decodes back to exactly `velocity`.
fn inherited_beat_length(velocity: f64) -> f64 {
    let estimate = -100.0 / velocity;
    let bits = estimate.to_bits();
    // the division may be off by an ulp either way
    for candidate in [bits, bits + 1, bits - 1, bits + 2, bits - 2] {
        let beat_length = f64::from_bits(candidate);
        if 100.0 / -beat_length == velocity {
            return beat_length;
        }
    }
    estimate
}

fn write_timing_points(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    let timeline = &beatmap.control_points;
    writeln!(out, "\n[TimingPoints]")?;
    for group in timeline.groups().iter().filter(|g| !g.is_empty()) {
        write_control_point_group(out, timeline, group, beatmap.general.mode.uses_effect_scroll_speed())?;
    }
    Ok(())
}

fn write_control_point_group(
    out: &mut String,
    timeline: &ControlPointTimeline,
    group: &ControlPointGroup,
    effect_scroll_speed: bool,
) -> fmt::Result {
    let time = group.time();
    let timing = timeline.timing_point_at(time);
    let difficulty = timeline.difficulty_point_at(time);
    let effect = timeline.effect_point_at(time);
    let sample = timeline.sample_point_at(time);
    let kiai = if effect.kiai { effect_flags::KIAI } else { 0 };

    let has_timing = group.get(ControlPointKind::Timing).is_some();
    if has_timing {
        let omit = if timing.omit_first_bar_line {
            effect_flags::OMIT_FIRST_BAR_LINE
        } else {
            0
        };
        writeln!(
            out,
            "{time},{},{},{},{},{},1,{}",
            timing.beat_length,
            timing.meter,
            sample.bank.value(),
            sample.custom_sample_bank,
            sample.volume,
            kiai | omit
        )?;
    }

    // an uninherited line resets velocity and scroll speed, so restate them when they differ
    let resets_velocity = difficulty != DifficultyPoint::new(1.0);
    let resets_scroll = effect_scroll_speed && effect.scroll_speed != 1.0;
    let inherited = !has_timing
        || group.get(ControlPointKind::Difficulty).is_some()
        || resets_velocity
        || resets_scroll;
    if inherited {
        let beat_length = if difficulty.generate_ticks {
            inherited_beat_length(difficulty.slider_velocity)
        } else {
            f64::NAN
        };
        writeln!(
            out,
            "{time},{beat_length},{},{},{},{},0,{kiai}",
            timing.meter,
            sample.bank.value(),
            sample.custom_sample_bank,
            sample.volume,
        )?;
    }
    Ok(())
}

fn write_colour(out: &mut String, name: &str, colour: &Colour) -> fmt::Result {
    write!(out, "{name} : {},{},{}", colour.r, colour.g, colour.b)?;
    if colour.a != u8::MAX {
        write!(out, ",{}", colour.a)?;
    }
    writeln!(out)
}

fn write_colours(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    let colours = &beatmap.colours;
    if colours.combo_colours.is_empty() && colours.custom_colours.is_empty() {
        return Ok(());
    }
    writeln!(out, "\n[Colours]")?;
    for (index, colour) in colours.combo_colours.iter().enumerate() {
        write_colour(out, &format!("Combo{}", index + 1), colour)?;
    }
    for (name, colour) in &colours.custom_colours {
        write_colour(out, name, colour)?;
    }
    Ok(())
}

fn write_hit_objects(out: &mut String, beatmap: &Beatmap) -> fmt::Result {
    writeln!(out, "\n[HitObjects]")?;
    for object in &beatmap.hit_objects {
        write_hit_object(out, object)?;
    }
    Ok(())
}

fn write_hit_object(out: &mut String, object: &HitObject) -> fmt::Result {
    write!(
        out,
        "{},{},{},{},{},",
        object.position.x,
        object.position.y,
        object.start_time,
        object.type_bits(),
        object.hit_sound.0
    )?;
    let samples = object.samples.to_legacy_string();
    match &object.kind {
        HitObjectKind::Circle => writeln!(out, "{samples}"),
        HitObjectKind::Slider(slider) => {
            write_slider(out, object, slider)?;
            writeln!(out, ",{samples}")
        }
        HitObjectKind::Spinner { end_time } => writeln!(out, "{end_time},{samples}"),
        HitObjectKind::Hold { end_time } => writeln!(out, "{end_time}:{samples}"),
    }
}

fn write_slider(out: &mut String, object: &HitObject, slider: &Slider) -> fmt::Result {
    let points = &slider.path.control_points;
    let first_kind = points
        .first()
        .and_then(|p| p.kind)
        .unwrap_or(PathType::Bezier);
    write!(out, "{}", first_kind.letter())?;
    for point in points.iter().skip(1) {
        let absolute = object.position + point.position;
        write!(out, "|{}:{}", absolute.x, absolute.y)?;
        // a repeated anchor starts a new bezier segment
        if point.kind == Some(PathType::Bezier) {
            write!(out, "|{}:{}", absolute.x, absolute.y)?;
        }
    }

    let sounds: Vec<String> = slider.node_sounds.iter().map(|s| s.0.to_string()).collect();
    let banks: Vec<String> = slider
        .node_banks
        .iter()
        .map(|(normal, addition)| format!("{}:{}", normal.value(), addition.value()))
        .collect();
    write!(
        out,
        ",{},{},{},{}",
        slider.slides,
        slider.path.expected_distance.unwrap_or(0.0),
        sounds.join("|"),
        banks.join("|")
    )
}
