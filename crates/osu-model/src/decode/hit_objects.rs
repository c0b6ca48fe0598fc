// [HitObjects]: circles, sliders, spinners and hold notes.

use super::DecodeState;
use crate::error::{Error, Result};
use crate::hit_object::{HitObject, HitObjectKind, MAX_SLIDES, Slider, type_flags};
use crate::math::Vec2;
use crate::parsing::{
    MAX_COORDINATE_VALUE, parse_byte, parse_double, parse_double_within, parse_float_within,
    parse_int,
};
use crate::path::{PathPoint, PathType, SliderPath};
use crate::sample::{HitSampleInfo, HitSound, SampleBank};

fn coordinate(text: &str) -> Result<f32> {
    Ok(parse_float_within(text, MAX_COORDINATE_VALUE as f32, false)?.trunc())
}

fn require(fields: &[&str], count: usize, what: &str) -> Result<()> {
    if fields.len() < count {
        return Err(Error::format(format!(
            "{what} needs {count} fields, got {}",
            fields.len()
        )));
    }
    Ok(())
}

pub(super) fn hit_object(state: &mut DecodeState, line: &str) -> Result<()> {
    let fields: Vec<&str> = line.split(',').collect();
    require(&fields, 5, "hit object")?;

    let position = Vec2::new(coordinate(fields[0])?, coordinate(fields[1])?);
    let start_time = state.offset_time(parse_double(fields[2])?);
    let type_bits = parse_int(fields[3])?;
    let hit_sound = HitSound(parse_byte(fields[4])?);

    let (kind, samples) = if type_bits & type_flags::CIRCLE != 0 {
        (HitObjectKind::Circle, extras(fields.get(5))?)
    } else if type_bits & type_flags::SLIDER != 0 {
        require(&fields, 7, "slider")?;
        let samples = extras(fields.get(10))?;
        let slider = slider(&fields, position, hit_sound, &samples)?;
        (HitObjectKind::Slider(slider), samples)
    } else if type_bits & type_flags::SPINNER != 0 {
        require(&fields, 6, "spinner")?;
        let end_time = state.offset_time(parse_double(fields[5])?).max(start_time);
        (HitObjectKind::Spinner { end_time }, extras(fields.get(6))?)
    } else if type_bits & type_flags::HOLD != 0 {
        require(&fields, 6, "hold note")?;
        let (end_text, rest) = fields[5].split_once(':').unwrap_or((fields[5], ""));
        let end_time = state.offset_time(parse_double(end_text)?).max(start_time);
        (HitObjectKind::Hold { end_time }, HitSampleInfo::parse(rest)?)
    } else {
        return Err(Error::format(format!("unknown hit object type {type_bits}")));
    };

    state.beatmap.hit_objects.push(HitObject {
        position,
        start_time,
        new_combo: type_bits & type_flags::NEW_COMBO != 0,
        combo_offset: (type_bits & type_flags::COMBO_OFFSET) >> 4,
        hit_sound,
        samples,
        kind,
    });
    Ok(())
}

fn extras(field: Option<&&str>) -> Result<HitSampleInfo> {
    match field {
        Some(text) => HitSampleInfo::parse(text.trim()),
        None => Ok(HitSampleInfo::default()),
    }
}

fn slider(fields: &[&str], position: Vec2, hit_sound: HitSound, samples: &HitSampleInfo) -> Result<Slider> {
    let control_points = curve(fields[5], position)?;

    let slides = parse_int(fields[6])?;
    if slides > MAX_SLIDES {
        return Err(Error::range(format!("{slides} slides exceeds {MAX_SLIDES}")));
    }

    let expected_distance = match fields.get(7) {
        Some(text) => {
            let length = parse_double_within(text, f64::from(MAX_COORDINATE_VALUE), false)?.max(0.0);
            (length > 0.0).then_some(length)
        }
        None => None,
    };

    let nodes = Slider::node_count(slides);

    let mut node_sounds = vec![hit_sound; nodes];
    if let Some(text) = fields.get(8).filter(|t| !t.trim().is_empty()) {
        for (slot, sound) in node_sounds.iter_mut().zip(text.split('|')) {
            *slot = HitSound(parse_byte(sound)?);
        }
    }

    let mut node_banks = vec![(samples.normal_bank, samples.addition_bank); nodes];
    if let Some(text) = fields.get(9).filter(|t| !t.trim().is_empty()) {
        for (slot, banks) in node_banks.iter_mut().zip(text.split('|')) {
            let (normal, addition) = banks
                .split_once(':')
                .ok_or_else(|| Error::format(format!("node banks {banks:?} need two values")))?;
            *slot = (
                SampleBank::parse_numeric(normal)?,
                SampleBank::parse_numeric(addition)?,
            );
        }
    }

    Ok(Slider {
        path: SliderPath::new(control_points, expected_distance),
        slides,
        node_sounds,
        node_banks,
    })
}

/// Parses `T|x:y|x:y...` into points relative to `origin`, with the origin itself first.
fn curve(text: &str, origin: Vec2) -> Result<Vec<PathPoint>> {
    let mut parts = text.split('|');
    let kind = PathType::from_letter(parts.next().unwrap_or_default().trim())?;
    let mut points = vec![PathPoint::typed(Vec2::ZERO, kind)];
    for part in parts {
        let (x, y) = part
            .split_once(':')
            .ok_or_else(|| Error::format(format!("curve point {part:?} is not x:y")))?;
        let limit = f64::from(MAX_COORDINATE_VALUE);
        let x = parse_double_within(x, limit, false)?.trunc() as f32;
        let y = parse_double_within(y, limit, false)?.trunc() as f32;
        points.push(PathPoint::new(Vec2::new(x, y) - origin));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use crate::decode::BeatmapDecoder;
    use crate::error::ErrorKind;
    use crate::hit_object::HitObjectKind;
    use crate::math::Vec2;
    use crate::path::PathType;
    use crate::sample::{HitSound, SampleBank};

    fn decode_objects(lines: &str) -> crate::Result<crate::Beatmap> {
        let text = format!("osu file format v14\n[HitObjects]\n{lines}");
        BeatmapDecoder::new().decode(text.as_bytes())
    }

    #[test]
    fn test_circle() {
        let beatmap = decode_objects("256,192,1000,5,2,0:0:0:0:\n").unwrap();
        let object = &beatmap.hit_objects[0];
        assert_eq!(object.position, Vec2::new(256.0, 192.0));
        assert_eq!(object.start_time, 1000.0);
        assert!(object.new_combo);
        assert_eq!(object.hit_sound, HitSound::WHISTLE);
        assert_eq!(object.kind, HitObjectKind::Circle);
    }

    #[test]
    fn test_circle_without_extras_and_combo_offset() {
        let beatmap = decode_objects("100.7,50.2,500,37,0\n").unwrap();
        let object = &beatmap.hit_objects[0];
        assert_eq!(object.position, Vec2::new(100.0, 50.0));
        assert_eq!(object.combo_offset, 2);
    }

    #[test]
    fn test_slider() {
        let line = "100,100,2000,2,0,B|200:100|200:200,2,150.5,2|0|8,1:2|0:0|3:0,2:0:0:0:\n";
        let beatmap = decode_objects(line).unwrap();
        let HitObjectKind::Slider(slider) = &beatmap.hit_objects[0].kind else {
            panic!("expected slider");
        };
        let points = &slider.path.control_points;
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].kind, Some(PathType::Bezier));
        assert_eq!(points[0].position, Vec2::ZERO);
        assert_eq!(points[1].position, Vec2::new(100.0, 0.0));
        assert_eq!(points[2].position, Vec2::new(100.0, 100.0));
        assert_eq!(slider.slides, 2);
        assert_eq!(slider.path.expected_distance, Some(150.5));
        assert_eq!(slider.node_sounds, vec![HitSound(2), HitSound(0), HitSound(8)]);
        assert_eq!(slider.node_banks[0], (SampleBank::Normal, SampleBank::Soft));
        assert_eq!(slider.node_banks[2], (SampleBank::Drum, SampleBank::None));
    }

    #[test]
    fn test_slider_defaults_fill_nodes() {
        let beatmap = decode_objects("0,0,0,2,4,L|100:0,3,100\n").unwrap();
        let HitObjectKind::Slider(slider) = &beatmap.hit_objects[0].kind else {
            panic!("expected slider");
        };
        assert_eq!(slider.node_sounds, vec![HitSound::FINISH; 4]);
        assert_eq!(slider.node_banks.len(), 4);
    }

    #[test]
    fn test_slider_zero_length_has_no_expected_distance() {
        let beatmap = decode_objects("0,0,0,2,0,L|100:0,1,0\n").unwrap();
        let HitObjectKind::Slider(slider) = &beatmap.hit_objects[0].kind else {
            panic!("expected slider");
        };
        assert_eq!(slider.path.expected_distance, None);
    }

    #[test]
    fn test_slider_slide_limit() {
        let err = decode_objects("0,0,0,2,0,L|100:0,9001,100\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_bad_curve() {
        let err = decode_objects("0,0,0,2,0,X|100:0,1,100\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        let err = decode_objects("0,0,0,2,0,B|100,1,100\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_spinner_and_hold() {
        let lines = "256,192,3000,12,0,4000,0:0:0:0:\n64,192,5000,128,0,5500:1:0:0:80:hit.wav\n";
        let beatmap = decode_objects(lines).unwrap();
        assert_eq!(beatmap.hit_objects[0].kind, HitObjectKind::Spinner { end_time: 4000.0 });
        assert!(beatmap.hit_objects[0].new_combo);
        let hold = &beatmap.hit_objects[1];
        assert_eq!(hold.kind, HitObjectKind::Hold { end_time: 5500.0 });
        assert_eq!(hold.samples.normal_bank, SampleBank::Normal);
        assert_eq!(hold.samples.volume, 80);
        assert_eq!(hold.samples.filename, "hit.wav");
    }

    #[test]
    fn test_unknown_type_and_bad_hit_sound() {
        assert_eq!(
            decode_objects("0,0,0,16,0\n").unwrap_err().kind(),
            ErrorKind::Format
        );
        assert_eq!(
            decode_objects("0,0,0,1,300\n").unwrap_err().kind(),
            ErrorKind::Range
        );
        assert_eq!(
            decode_objects("0,0,0,1\n").unwrap_err().kind(),
            ErrorKind::Format
        );
    }

    #[test]
    fn test_coordinate_limit() {
        let err = decode_objects("200000,0,0,1,0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }
}
