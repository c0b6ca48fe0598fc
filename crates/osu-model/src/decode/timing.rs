// [TimingPoints]: one line may yield up to four control points.

use super::DecodeState;
use crate::control_point::{
    ControlPointData, ControlPointKind, ControlPointTimeline, DifficultyPoint, EffectPoint,
    SamplePoint, TimingPoint,
};
use crate::error::{Error, Result};
use crate::parsing::{MAX_PARSE_VALUE, parse_double, parse_double_within, parse_int};
use crate::sample::SampleBank;

pub(crate) mod effect_flags {
    pub const KIAI: i32 = 1;
    pub const OMIT_FIRST_BAR_LINE: i32 = 8;
}

const MIN_SCROLL_SPEED: f64 = 0.01;
const MAX_SCROLL_SPEED: f64 = 10.0;

/// Points decoded from lines that share one timestamp.
///
/// Points implied by an uninherited line sit at the front and points from
/// inherited lines at the back, so that on flush the inherited values win.
#[derive(Debug, Default)]
pub(super) struct PendingControlPoints {
    time: Option<f64>,
    points: Vec<ControlPointData>,
}

impl PendingControlPoints {
    fn push(&mut self, timeline: &mut ControlPointTimeline, time: f64, data: ControlPointData, timing_change: bool) {
        if self.time != Some(time) {
            self.flush(timeline);
        }
        if timing_change {
            self.points.insert(0, data);
        } else {
            self.points.push(data);
        }
        self.time = Some(time);
    }

    pub(super) fn flush(&mut self, timeline: &mut ControlPointTimeline) {
        let Some(time) = self.time.take() else {
            return;
        };
        let mut seen: Vec<ControlPointKind> = Vec::with_capacity(4);
        for data in self.points.drain(..).rev() {
            if seen.contains(&data.kind()) {
                continue;
            }
            seen.push(data.kind());
            timeline.add(time, data);
        }
    }
}

fn first_char_flag(field: &str, name: &str) -> Result<char> {
    field
        .trim()
        .chars()
        .next()
        .ok_or_else(|| Error::format(format!("empty {name} field")))
}

pub(super) fn timing_point(state: &mut DecodeState, line: &str) -> Result<()> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 2 {
        return Err(Error::format("timing point needs a time and a beat length"));
    }

    let time = state.offset_time(parse_double(fields[0])?);
    // NaN turns off slider ticks on inherited lines
    let beat_length = parse_double_within(fields[1], f64::from(MAX_PARSE_VALUE), true)?;
    let speed_multiplier = if beat_length < 0.0 {
        100.0 / -beat_length
    } else {
        1.0
    };

    let meter = match fields.get(2) {
        Some(field) if first_char_flag(field, "meter")? == '0' => 4,
        Some(field) => parse_int(field)?,
        None => 4,
    };
    if meter < 1 {
        return Err(Error::range(format!("meter {meter} must be positive")));
    }

    let general = &state.beatmap.general;
    let bank = match fields.get(3) {
        Some(field) => SampleBank::parse_numeric(field)?,
        None => general.sample_set,
    };
    let bank = if bank == SampleBank::None {
        SampleBank::Normal
    } else {
        bank
    };
    let custom_sample_bank = match fields.get(4) {
        Some(field) => parse_int(field)?,
        None => 0,
    };
    let volume = match fields.get(5) {
        Some(field) => parse_int(field)?,
        None => general.sample_volume,
    };
    let timing_change = match fields.get(6) {
        Some(field) => first_char_flag(field, "uninherited")? == '1',
        None => true,
    };
    let effects = match fields.get(7) {
        Some(field) => parse_int(field)?,
        None => 0,
    };
    let kiai = effects & effect_flags::KIAI != 0;
    let omit_first_bar_line = effects & effect_flags::OMIT_FIRST_BAR_LINE != 0;
    let scroll_speed = if general.mode.uses_effect_scroll_speed() {
        speed_multiplier.clamp(MIN_SCROLL_SPEED, MAX_SCROLL_SPEED)
    } else {
        1.0
    };

    let mut points = Vec::with_capacity(4);
    if timing_change {
        if beat_length.is_nan() {
            return Err(Error::format("uninherited timing point has a NaN beat length"));
        }
        let mut timing = TimingPoint::new(beat_length, meter);
        timing.omit_first_bar_line = omit_first_bar_line;
        points.push(ControlPointData::Timing(timing));
    }
    let mut difficulty = DifficultyPoint::new(speed_multiplier);
    difficulty.generate_ticks = !beat_length.is_nan();
    points.push(ControlPointData::Difficulty(difficulty));
    points.push(ControlPointData::Effect(EffectPoint { kiai, scroll_speed }));
    points.push(ControlPointData::Sample(SamplePoint {
        bank,
        volume,
        custom_sample_bank,
    }));

    for data in points {
        state
            .pending_points
            .push(&mut state.beatmap.control_points, time, data, timing_change);
    }
    Ok(())
}
