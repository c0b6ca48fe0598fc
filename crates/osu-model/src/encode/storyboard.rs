// [Events] storyboard lines: elements, then their commands indented by nesting depth.

use std::fmt::{self, Write};

use crate::parsing::LegacyEnum;
use crate::storyboard::{
    Command, CommandTimelineGroup, Storyboard, StoryboardCommand, StoryboardElement,
    StoryboardSprite,
};

pub(super) fn write_storyboard(out: &mut String, storyboard: &Storyboard) -> fmt::Result {
    for element in &storyboard.elements {
        match element {
            StoryboardElement::Sprite(sprite) => {
                write_sprite_header(out, "Sprite", sprite)?;
                writeln!(out)?;
                write_sprite_commands(out, sprite)?;
            }
            StoryboardElement::Animation(animation) => {
                write_sprite_header(out, "Animation", &animation.sprite)?;
                writeln!(
                    out,
                    ",{},{},{}",
                    animation.frame_count,
                    animation.frame_delay,
                    animation.loop_type.name()
                )?;
                write_sprite_commands(out, &animation.sprite)?;
            }
            StoryboardElement::Sample(sample) => writeln!(
                out,
                "Sample,{},{},\"{}\",{}",
                sample.time,
                sample.layer.name(),
                sample.path,
                sample.volume
            )?,
        }
    }
    Ok(())
}

fn write_sprite_header(out: &mut String, kind: &str, sprite: &StoryboardSprite) -> fmt::Result {
    write!(
        out,
        "{kind},{},{},\"{}\",{},{}",
        sprite.layer.name(),
        sprite.origin.name(),
        sprite.path,
        sprite.initial_position.x,
        sprite.initial_position.y
    )
}

fn write_sprite_commands(out: &mut String, sprite: &StoryboardSprite) -> fmt::Result {
    write_group(out, " ", &sprite.commands)?;
    for command_loop in &sprite.loops {
        writeln!(out, " L,{},{}", command_loop.loop_start_time, command_loop.repeat_count)?;
        write_group(out, "  ", &command_loop.group)?;
    }
    for trigger in &sprite.triggers {
        write!(out, " T,{}", trigger.trigger_name)?;
        // trailing fields are left off while they hold their unbounded defaults
        let has_group = trigger.group_number != 0;
        let has_end = has_group || trigger.trigger_end_time != f64::MAX;
        let has_start = has_end || trigger.trigger_start_time != f64::MIN;
        if has_start {
            write!(out, ",{}", trigger.trigger_start_time)?;
        }
        if has_end {
            write!(out, ",{}", trigger.trigger_end_time)?;
        }
        if has_group {
            write!(out, ",{}", trigger.group_number)?;
        }
        writeln!(out)?;
        write_group(out, "  ", &trigger.group)?;
    }
    Ok(())
}

/// Byte value of a normalised channel, exact when the channel came from a byte.
fn channel(value: f32) -> f32 {
    let byte = (value * 255.0).round();
    if byte / 255.0 == value {
        byte
    } else {
        value * 255.0
    }
}

fn write_prefix<T>(out: &mut String, indent: &str, name: &str, command: &Command<T>) -> fmt::Result {
    write!(
        out,
        "{indent}{name},{},{},{}",
        command.easing.value(),
        command.start_time,
        command.end_time
    )
}

fn write_group(out: &mut String, indent: &str, group: &CommandTimelineGroup) -> fmt::Result {
    for command in group.commands() {
        match &command {
            StoryboardCommand::Move(c) | StoryboardCommand::VectorScale(c) => {
                let name = if matches!(command, StoryboardCommand::Move(_)) {
                    "M"
                } else {
                    "V"
                };
                write_prefix(out, indent, name, c)?;
                write!(
                    out,
                    ",{},{},{},{}",
                    c.start_value.x, c.start_value.y, c.end_value.x, c.end_value.y
                )?;
            }
            StoryboardCommand::MoveX(c)
            | StoryboardCommand::MoveY(c)
            | StoryboardCommand::Scale(c)
            | StoryboardCommand::Rotation(c)
            | StoryboardCommand::Alpha(c) => {
                let name = match command {
                    StoryboardCommand::MoveX(_) => "MX",
                    StoryboardCommand::MoveY(_) => "MY",
                    StoryboardCommand::Scale(_) => "S",
                    StoryboardCommand::Rotation(_) => "R",
                    _ => "F",
                };
                write_prefix(out, indent, name, c)?;
                write!(out, ",{},{}", c.start_value, c.end_value)?;
            }
            StoryboardCommand::Colour(c) => {
                write_prefix(out, indent, "C", c)?;
                let (from, to) = (c.start_value, c.end_value);
                write!(
                    out,
                    ",{},{},{},{},{},{}",
                    channel(from.r),
                    channel(from.g),
                    channel(from.b),
                    channel(to.r),
                    channel(to.g),
                    channel(to.b)
                )?;
            }
            StoryboardCommand::Additive(c)
            | StoryboardCommand::FlipH(c)
            | StoryboardCommand::FlipV(c) => {
                let parameter = match command {
                    StoryboardCommand::Additive(_) => "A",
                    StoryboardCommand::FlipH(_) => "H",
                    _ => "V",
                };
                write_prefix(out, indent, "P", c)?;
                write!(out, ",{parameter}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
