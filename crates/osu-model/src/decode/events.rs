// [Events]: background, video, breaks and storyboard elements with their commands.

use super::DecodeState;
use super::sections::standardise_path;
use crate::beatmap::{Background, BreakPeriod, Video};
use crate::error::{Error, Result};
use crate::math::Vec2;
use crate::parsing::{
    LegacyEnum, MAX_COORDINATE_VALUE, legacy_enum, parse_double, parse_double_within, parse_enum,
    parse_float, parse_float_within, parse_int, round_to_even,
};
use crate::storyboard::{
    AnimationLoopType, CommandLoop, CommandTimelineGroup, CommandTrigger, Easing, Layer, Origin,
    Rgb, StoryboardAnimation, StoryboardElement, StoryboardSample, StoryboardSprite,
};

/// Before this version loop counts include the first pass and frame delays are in legacy units.
const STORYBOARD_CUTOFF_VERSION: i32 = 6;

legacy_enum! {
    pub(crate) enum EventType {
        Background = 0,
        Video = 1,
        Break = 2,
        Colour = 3,
        Sprite = 4,
        Sample = 5,
        Animation = 6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenGroup {
    Loop(usize),
    Trigger(usize),
}

/// The storyboard element and nested group that indented command lines apply to.
#[derive(Debug, Default)]
pub(super) struct StoryboardCursor {
    element: Option<usize>,
    group: Option<OpenGroup>,
}

fn field<'a>(fields: &[&'a str], index: usize) -> Result<&'a str> {
    fields
        .get(index)
        .copied()
        .ok_or_else(|| Error::format(format!("missing field {index} in event line")))
}

fn coordinate(text: &str) -> Result<f32> {
    parse_float_within(text, MAX_COORDINATE_VALUE as f32, false)
}

pub(super) fn event(state: &mut DecodeState, line: &str) -> Result<()> {
    let line = state.substitute_variables(line).into_owned();
    let content = line.trim_start_matches([' ', '_']);
    let depth = line.len() - content.len();
    let fields: Vec<&str> = content.split(',').collect();

    if depth > 0 {
        if !state.keep_storyboard {
            return Ok(());
        }
        return command(state, depth, &fields);
    }

    state.cursor = StoryboardCursor::default();
    let kind = parse_enum::<EventType>(field(&fields, 0)?.trim())?;
    match kind {
        EventType::Background => {
            let filename = standardise_path(field(&fields, 2)?);
            let x_offset = fields.get(3).map(|t| parse_int(t)).transpose()?.unwrap_or(0);
            let y_offset = fields.get(4).map(|t| parse_int(t)).transpose()?.unwrap_or(0);
            state.beatmap.events.background = Some(Background {
                filename,
                x_offset,
                y_offset,
            });
        }
        EventType::Video => {
            let start_time = parse_int(field(&fields, 1)?)?.saturating_add(state.offset);
            let filename = standardise_path(field(&fields, 2)?);
            let x_offset = fields.get(3).map(|t| parse_int(t)).transpose()?.unwrap_or(0);
            let y_offset = fields.get(4).map(|t| parse_int(t)).transpose()?.unwrap_or(0);
            state.beatmap.events.video = Some(Video {
                start_time,
                filename,
                x_offset,
                y_offset,
            });
        }
        EventType::Break => {
            let start_time = state.offset_time(parse_double(field(&fields, 1)?)?);
            let end_time = state.offset_time(parse_double(field(&fields, 2)?)?);
            state.beatmap.events.breaks.push(BreakPeriod {
                start_time,
                end_time: end_time.max(start_time),
            });
        }
        // Background colour transitions are not kept
        EventType::Colour => {}
        EventType::Sprite | EventType::Animation | EventType::Sample if !state.keep_storyboard => {}
        EventType::Sprite => {
            let sprite = sprite(&fields)?;
            push_element(state, StoryboardElement::Sprite(sprite));
        }
        EventType::Animation => {
            let sprite = sprite(&fields)?;
            let frame_count = parse_int(field(&fields, 6)?)?;
            let mut frame_delay = parse_double(field(&fields, 7)?)?;
            if state.version() < STORYBOARD_CUTOFF_VERSION {
                frame_delay = round_to_even(0.015 * frame_delay) * 1.186 * f64::from(1000f32 / 60.0);
            }
            let loop_type = match fields.get(8) {
                Some(text) => parse_enum::<AnimationLoopType>(text.trim())?,
                None => AnimationLoopType::default(),
            };
            push_element(
                state,
                StoryboardElement::Animation(StoryboardAnimation {
                    sprite,
                    frame_count,
                    frame_delay,
                    loop_type,
                }),
            );
        }
        EventType::Sample => {
            let time = parse_double(field(&fields, 1)?)?;
            let layer = parse_enum::<Layer>(field(&fields, 2)?.trim())?;
            let path = standardise_path(field(&fields, 3)?);
            let volume = fields.get(4).map(|t| parse_int(t)).transpose()?.unwrap_or(100);
            state
                .beatmap
                .storyboard
                .elements
                .push(StoryboardElement::Sample(StoryboardSample {
                    time,
                    layer,
                    path,
                    volume,
                }));
        }
    }
    Ok(())
}

fn sprite(fields: &[&str]) -> Result<StoryboardSprite> {
    let layer = parse_enum::<Layer>(field(fields, 1)?.trim())?;
    let origin = parse_enum::<Origin>(field(fields, 2)?.trim())?;
    let path = standardise_path(field(fields, 3)?);
    let x = coordinate(field(fields, 4)?)?;
    let y = coordinate(field(fields, 5)?)?;
    Ok(StoryboardSprite::new(layer, origin, path, Vec2::new(x, y)))
}

fn push_element(state: &mut DecodeState, element: StoryboardElement) {
    let elements = &mut state.beatmap.storyboard.elements;
    elements.push(element);
    state.cursor.element = Some(elements.len() - 1);
}

fn current_sprite(state: &mut DecodeState) -> Result<&mut StoryboardSprite> {
    let missing = || Error::format("storyboard command without a sprite");
    let index = state.cursor.element.ok_or_else(missing)?;
    state
        .beatmap
        .storyboard
        .elements
        .get_mut(index)
        .and_then(StoryboardElement::sprite_mut)
        .ok_or_else(missing)
}

fn command(state: &mut DecodeState, depth: usize, fields: &[&str]) -> Result<()> {
    if depth > 2 {
        return Err(Error::format(format!("command nested {depth} levels deep")));
    }
    let name = field(fields, 0)?.trim();

    if depth == 1 {
        state.cursor.group = None;
        match name {
            "L" => {
                let start_time = parse_double(field(fields, 1)?)?;
                let mut repeat_count = parse_int(field(fields, 2)?)?;
                if state.version() < STORYBOARD_CUTOFF_VERSION {
                    repeat_count = (repeat_count - 1).max(0);
                }
                let sprite = current_sprite(state)?;
                sprite.loops.push(CommandLoop::new(start_time, repeat_count));
                let index = sprite.loops.len() - 1;
                state.cursor.group = Some(OpenGroup::Loop(index));
                return Ok(());
            }
            "T" => {
                let trigger_name = field(fields, 1)?.trim();
                // the window may be written out with its unbounded defaults
                let start_time = match fields.get(2) {
                    Some(text) => parse_double_within(text, f64::MAX, false)?,
                    None => f64::MIN,
                };
                let end_time = match fields.get(3) {
                    Some(text) => parse_double_within(text, f64::MAX, false)?,
                    None => f64::MAX,
                };
                let group_number = fields.get(4).map(|t| parse_int(t)).transpose()?.unwrap_or(0);
                let sprite = current_sprite(state)?;
                sprite
                    .triggers
                    .push(CommandTrigger::new(trigger_name, start_time, end_time, group_number));
                let index = sprite.triggers.len() - 1;
                state.cursor.group = Some(OpenGroup::Trigger(index));
                return Ok(());
            }
            _ => {}
        }
    } else if matches!(name, "L" | "T") {
        return Err(Error::format(format!("{name} group cannot be nested")));
    }

    let open = state.cursor.group;
    let sprite = current_sprite(state)?;
    let group = match (depth, open) {
        (1, _) => &mut sprite.commands,
        (_, Some(OpenGroup::Loop(index))) => &mut sprite.loops[index].group,
        (_, Some(OpenGroup::Trigger(index))) => &mut sprite.triggers[index].group,
        (_, None) => return Err(Error::format("nested command outside a loop or trigger")),
    };
    keyframe(group, name, fields)
}

/// Adds one keyframe command line to `group`.
fn keyframe(group: &mut CommandTimelineGroup, name: &str, fields: &[&str]) -> Result<()> {
    let easing_value = parse_int(field(fields, 1)?)?;
    let easing = Easing::from_value(easing_value)
        .ok_or_else(|| Error::format(format!("{easing_value} is not an easing")))?;
    let start_time = parse_double(field(fields, 2)?)?;
    let end_text = field(fields, 3)?;
    let end_time = if end_text.trim().is_empty() {
        start_time
    } else {
        parse_double(end_text)?
    };

    // End values fall back to the start values when omitted
    let float_at = |index: usize, fallback: Option<f32>| -> Result<f32> {
        match (fields.get(index), fallback) {
            (Some(text), _) => parse_float(text),
            (None, Some(value)) => Ok(value),
            (None, None) => Err(Error::format(format!("missing field {index} in {name} command"))),
        }
    };

    match name {
        "F" | "S" | "R" | "MX" | "MY" => {
            let start = float_at(4, None)?;
            let end = float_at(5, Some(start))?;
            let timeline = match name {
                "F" => &mut group.alpha,
                "S" => &mut group.scale,
                "R" => &mut group.rotation,
                "MX" => &mut group.x,
                _ => &mut group.y,
            };
            timeline.add(easing, start_time, end_time, start, end);
        }
        "M" | "V" => {
            let start_x = float_at(4, None)?;
            let start_y = float_at(5, None)?;
            let end_x = float_at(6, Some(start_x))?;
            let end_y = float_at(7, Some(start_y))?;
            let timeline = if name == "M" {
                &mut group.movement
            } else {
                &mut group.vector_scale
            };
            timeline.add(
                easing,
                start_time,
                end_time,
                Vec2::new(start_x, start_y),
                Vec2::new(end_x, end_y),
            );
        }
        "C" => {
            let r = float_at(4, None)?;
            let g = float_at(5, None)?;
            let b = float_at(6, None)?;
            let end_r = float_at(7, Some(r))?;
            let end_g = float_at(8, Some(g))?;
            let end_b = float_at(9, Some(b))?;
            group.colour.add(
                easing,
                start_time,
                end_time,
                Rgb::from_bytes(r, g, b),
                Rgb::from_bytes(end_r, end_g, end_b),
            );
        }
        "P" => {
            let timeline = match field(fields, 4)?.trim() {
                "A" => &mut group.additive,
                "H" => &mut group.flip_h,
                "V" => &mut group.flip_v,
                other => return Err(Error::format(format!("unknown parameter {other:?}"))),
            };
            // an instant parameter holds for the rest of the element's life
            timeline.add(easing, start_time, end_time, true, start_time == end_time);
        }
        other => return Err(Error::format(format!("unknown storyboard command {other:?}"))),
    }
    Ok(())
}
