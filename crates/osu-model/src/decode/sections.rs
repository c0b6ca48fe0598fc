// Key-value sections: General, Editor, Metadata, Difficulty, Colours, Variables.

use log::warn;

use super::DecodeState;
use crate::beatmap::Colour;
use crate::error::{Error, Result};
use crate::mode::{Countdown, Ruleset};
use crate::parsing::{parse_byte, parse_double, parse_enum, parse_float, parse_int};
use crate::sample::SampleBank;

/// Splits at the first separator and trims both halves. A missing separator yields an empty value.
pub(super) fn split_pair(line: &str, separator: char) -> (&str, &str) {
    match line.split_once(separator) {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (line.trim(), ""),
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    Ok(parse_int(value)? == 1)
}

pub(super) fn standardise_path(value: &str) -> String {
    value.trim().trim_matches('"').replace('\\', "/")
}

pub(super) fn general(state: &mut DecodeState, line: &str) -> Result<()> {
    let (key, value) = split_pair(line, ':');
    let offset = state.offset;
    let general = &mut state.beatmap.general;
    match key {
        "AudioFilename" => general.audio_filename = standardise_path(value),
        "AudioLeadIn" => general.audio_lead_in = parse_int(value)?,
        "PreviewTime" => {
            let time = parse_int(value)?;
            general.preview_time = if time == -1 { time } else { time.saturating_add(offset) };
        }
        "SampleSet" => {
            general.sample_set = match parse_enum::<SampleBank>(value)? {
                SampleBank::None => SampleBank::Normal,
                bank => bank,
            };
        }
        "SampleVolume" => general.sample_volume = parse_int(value)?,
        "StackLeniency" => general.stack_leniency = parse_float(value)?,
        "Mode" => general.mode = parse_enum::<Ruleset>(value)?,
        "Countdown" => general.countdown = parse_enum::<Countdown>(value)?,
        "CountdownOffset" => general.countdown_offset = parse_int(value)?,
        "LetterboxInBreaks" => general.letterbox_in_breaks = parse_flag(value)?,
        "WidescreenStoryboard" => general.widescreen_storyboard = parse_flag(value)?,
        "EpilepsyWarning" => general.epilepsy_warning = parse_flag(value)?,
        "SpecialStyle" => general.special_style = parse_flag(value)?,
        "SamplesMatchPlaybackRate" => general.samples_match_playback_rate = parse_flag(value)?,
        "UseSkinSprites" => general.use_skin_sprites = parse_flag(value)?,
        _ => warn!("ignoring unknown [General] key {key:?}"),
    }
    Ok(())
}

pub(super) fn editor(state: &mut DecodeState, line: &str) -> Result<()> {
    let (key, value) = split_pair(line, ':');
    let offset = state.offset;
    let editor = &mut state.beatmap.editor;
    match key {
        "Bookmarks" => {
            editor.bookmarks = value
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| parse_int(s).map(|t| t.saturating_add(offset)))
                .collect::<Result<_>>()?;
        }
        "DistanceSpacing" => editor.distance_spacing = parse_double(value)?,
        "BeatDivisor" => editor.beat_divisor = parse_int(value)?,
        "GridSize" => editor.grid_size = parse_int(value)?,
        "TimelineZoom" => editor.timeline_zoom = parse_double(value)?,
        _ => warn!("ignoring unknown [Editor] key {key:?}"),
    }
    Ok(())
}

pub(super) fn metadata(state: &mut DecodeState, line: &str) -> Result<()> {
    let (key, value) = split_pair(line, ':');
    let metadata = &mut state.beatmap.metadata;
    match key {
        "Title" => metadata.title = value.to_string(),
        "TitleUnicode" => metadata.title_unicode = value.to_string(),
        "Artist" => metadata.artist = value.to_string(),
        "ArtistUnicode" => metadata.artist_unicode = value.to_string(),
        "Creator" => metadata.creator = value.to_string(),
        "Version" => metadata.version = value.to_string(),
        "Source" => metadata.source = value.to_string(),
        "Tags" => metadata.tags = value.to_string(),
        "BeatmapID" => metadata.beatmap_id = parse_int(value)?,
        "BeatmapSetID" => metadata.beatmap_set_id = parse_int(value)?,
        _ => warn!("ignoring unknown [Metadata] key {key:?}"),
    }
    Ok(())
}

pub(super) fn difficulty(state: &mut DecodeState, line: &str) -> Result<()> {
    let (key, value) = split_pair(line, ':');
    let difficulty = &mut state.beatmap.difficulty;
    match key {
        "HPDrainRate" => difficulty.hp_drain_rate = parse_float(value)?,
        "CircleSize" => difficulty.circle_size = parse_float(value)?,
        "OverallDifficulty" => difficulty.overall_difficulty = parse_float(value)?,
        "ApproachRate" => {
            difficulty.approach_rate = parse_float(value)?;
            state.has_approach_rate = true;
        }
        "SliderMultiplier" => difficulty.slider_multiplier = parse_double(value)?.clamp(0.4, 3.6),
        "SliderTickRate" => difficulty.slider_tick_rate = parse_double(value)?.clamp(0.5, 8.0),
        _ => warn!("ignoring unknown [Difficulty] key {key:?}"),
    }
    Ok(())
}

pub(super) fn colour(state: &mut DecodeState, line: &str) -> Result<()> {
    let (key, value) = split_pair(line, ':');
    let channels = value
        .split(',')
        .map(parse_byte)
        .collect::<Result<Vec<u8>>>()?;
    let colour = match channels[..] {
        [r, g, b] => Colour::rgb(r, g, b),
        [r, g, b, a] => Colour { r, g, b, a },
        _ => {
            return Err(Error::format(format!(
                "colour {key} needs 3 or 4 components, got {}",
                channels.len()
            )));
        }
    };
    let colours = &mut state.beatmap.colours;
    if key.starts_with("Combo") {
        colours.combo_colours.push(colour);
    } else {
        colours.custom_colours.push((key.to_string(), colour));
    }
    Ok(())
}

pub(super) fn variable(state: &mut DecodeState, line: &str) -> Result<()> {
    let (name, value) = split_pair(line, '=');
    let variables = &mut state.beatmap.variables;
    match variables.iter_mut().find(|(n, _)| n == name) {
        Some(entry) => entry.1 = value.to_string(),
        None => variables.push((name.to_string(), value.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::beatmap::Colour;
    use crate::decode::BeatmapDecoder;
    use crate::error::ErrorKind;
    use crate::mode::{Countdown, Ruleset};
    use crate::sample::SampleBank;

    fn decode_inline(text: &str) -> crate::Result<crate::Beatmap> {
        BeatmapDecoder::new().decode(text.as_bytes())
    }

    #[test]
    fn test_general_section() {
        let text = "osu file format v14\n[General]\nAudioFilename: audio\\song.mp3\nAudioLeadIn: 500\nPreviewTime: 12000\nCountdown: 0\nSampleSet: Soft\nStackLeniency: 0.5\nMode: 3\nLetterboxInBreaks: 1\nSpecialStyle: 0\nAlwaysShowPlayfield: 0\n";
        let beatmap = decode_inline(text).unwrap();
        let general = &beatmap.general;
        assert_eq!(general.audio_filename, "audio/song.mp3");
        assert_eq!(general.audio_lead_in, 500);
        assert_eq!(general.preview_time, 12000);
        assert_eq!(general.countdown, Countdown::None);
        assert_eq!(general.sample_set, SampleBank::Soft);
        assert_eq!(general.stack_leniency, 0.5);
        assert_eq!(general.mode, Ruleset::Mania);
        assert!(general.letterbox_in_breaks);
        assert!(!general.special_style);
    }

    #[test]
    fn test_sample_set_none_is_normal() {
        let beatmap = decode_inline("[General]\nSampleSet: None\n").unwrap();
        assert_eq!(beatmap.general.sample_set, SampleBank::Normal);
    }

    #[test]
    fn test_bad_enum_token() {
        let err = decode_inline("[General]\nMode: Piano\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_old_versions_offset_preview_and_bookmarks() {
        let text = "osu file format v4\n[General]\nPreviewTime: 1000\n[Editor]\nBookmarks: 100,200\n";
        let beatmap = decode_inline(text).unwrap();
        assert_eq!(beatmap.general.preview_time, 1024);
        assert_eq!(beatmap.editor.bookmarks, vec![124, 224]);

        let unset = decode_inline("osu file format v4\n[General]\nPreviewTime: -1\n").unwrap();
        assert_eq!(unset.general.preview_time, -1);
    }

    #[test]
    fn test_difficulty_clamps_and_ar_default() {
        let text = "[Difficulty]\nOverallDifficulty:8\nSliderMultiplier:5\nSliderTickRate:0.1\n";
        let beatmap = decode_inline(text).unwrap();
        assert_eq!(beatmap.difficulty.approach_rate, 8.0);
        assert_eq!(beatmap.difficulty.slider_multiplier, 3.6);
        assert_eq!(beatmap.difficulty.slider_tick_rate, 0.5);

        let explicit = decode_inline("[Difficulty]\nOverallDifficulty:8\nApproachRate:9.3\n").unwrap();
        assert_eq!(explicit.difficulty.approach_rate, 9.3);
    }

    #[test]
    fn test_colours() {
        let text = "[Colours]\nCombo1 : 255,128,0\nCombo2 : 0,0,255,100\nSliderBorder : 10,20,30\n";
        let beatmap = decode_inline(text).unwrap();
        let colours = &beatmap.colours;
        assert_eq!(colours.combo_colours, vec![
            Colour::rgb(255, 128, 0),
            Colour { r: 0, g: 0, b: 255, a: 100 },
        ]);
        assert_eq!(colours.custom_colours[0].0, "SliderBorder");
    }

    #[test]
    fn test_colour_component_count() {
        let err = decode_inline("[Colours]\nCombo1 : 255,128\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = decode_inline("[Colours]\nCombo1 : 255,128,0,0,0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = decode_inline("[Colours]\nCombo1 : 256,0,0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_variables_keep_order_and_overwrite() {
        let text = "[Variables]\n$a=1\n$b=2\n$a=3\n";
        let beatmap = decode_inline(text).unwrap();
        assert_eq!(
            beatmap.variables,
            vec![("$a".to_string(), "3".to_string()), ("$b".to_string(), "2".to_string())]
        );
    }
}
