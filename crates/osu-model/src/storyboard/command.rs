// Keyframed storyboard commands, loops and triggers.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::parsing::legacy_enum;

legacy_enum! {
    #[derive(Default)]
    pub enum Easing {
        #[default]
        None = 0,
        Out = 1,
        In = 2,
        InQuad = 3,
        OutQuad = 4,
        InOutQuad = 5,
        InCubic = 6,
        OutCubic = 7,
        InOutCubic = 8,
        InQuart = 9,
        OutQuart = 10,
        InOutQuart = 11,
        InQuint = 12,
        OutQuint = 13,
        InOutQuint = 14,
        InSine = 15,
        OutSine = 16,
        InOutSine = 17,
        InExpo = 18,
        OutExpo = 19,
        InOutExpo = 20,
        InCirc = 21,
        OutCirc = 22,
        InOutCirc = 23,
        InElastic = 24,
        OutElastic = 25,
        OutElasticHalf = 26,
        OutElasticQuarter = 27,
        InOutElastic = 28,
        InBack = 29,
        OutBack = 30,
        InOutBack = 31,
        InBounce = 32,
        OutBounce = 33,
        InOutBounce = 34,
        OutPow10 = 35,
    }
}

/// Normalised RGB colour, each channel in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn from_bytes(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r / 255.0,
            g: g / 255.0,
            b: b / 255.0,
        }
    }
}

/// One keyframe transition of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command<T> {
    pub easing: Easing,
    pub start_time: f64,
    pub end_time: f64,
    pub start_value: T,
    pub end_value: T,
}

impl<T: Clone> Command<T> {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn shifted(&self, offset: f64) -> Command<T> {
        Command {
            start_time: self.start_time + offset,
            end_time: self.end_time + offset,
            ..self.clone()
        }
    }
}

/// Commands of one property ordered by start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTimeline<T> {
    commands: Vec<Command<T>>,
}

impl<T> Default for CommandTimeline<T> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<T: Clone> CommandTimeline<T> {
    /// Inserts after every command starting at or before `start_time`.
    pub fn add(&mut self, easing: Easing, start_time: f64, end_time: f64, start_value: T, end_value: T) {
        let index = self
            .commands
            .partition_point(|c| c.start_time <= start_time);
        self.commands.insert(
            index,
            Command {
                easing,
                start_time,
                end_time,
                start_value,
                end_value,
            },
        );
    }

    pub fn commands(&self) -> &[Command<T>] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn start_time(&self) -> Option<f64> {
        self.commands.iter().map(|c| c.start_time).reduce(f64::min)
    }

    pub fn end_time(&self) -> Option<f64> {
        self.commands.iter().map(|c| c.end_time).reduce(f64::max)
    }
}

/// A single command of any property, as produced by flattening a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoryboardCommand {
    Move(Command<Vec2>),
    MoveX(Command<f32>),
    MoveY(Command<f32>),
    Scale(Command<f32>),
    VectorScale(Command<Vec2>),
    Rotation(Command<f32>),
    Colour(Command<Rgb>),
    Alpha(Command<f32>),
    Additive(Command<bool>),
    FlipH(Command<bool>),
    FlipV(Command<bool>),
}

macro_rules! each_command {
    ($command:expr, $c:ident => $body:expr) => {
        match $command {
            StoryboardCommand::Move($c) => $body,
            StoryboardCommand::MoveX($c) => $body,
            StoryboardCommand::MoveY($c) => $body,
            StoryboardCommand::Scale($c) => $body,
            StoryboardCommand::VectorScale($c) => $body,
            StoryboardCommand::Rotation($c) => $body,
            StoryboardCommand::Colour($c) => $body,
            StoryboardCommand::Alpha($c) => $body,
            StoryboardCommand::Additive($c) => $body,
            StoryboardCommand::FlipH($c) => $body,
            StoryboardCommand::FlipV($c) => $body,
        }
    };
}

impl StoryboardCommand {
    pub fn start_time(&self) -> f64 {
        each_command!(self, c => c.start_time)
    }

    pub fn end_time(&self) -> f64 {
        each_command!(self, c => c.end_time)
    }

    pub fn easing(&self) -> Easing {
        each_command!(self, c => c.easing)
    }

    pub fn shifted(&self, offset: f64) -> StoryboardCommand {
        match self {
            Self::Move(c) => Self::Move(c.shifted(offset)),
            Self::MoveX(c) => Self::MoveX(c.shifted(offset)),
            Self::MoveY(c) => Self::MoveY(c.shifted(offset)),
            Self::Scale(c) => Self::Scale(c.shifted(offset)),
            Self::VectorScale(c) => Self::VectorScale(c.shifted(offset)),
            Self::Rotation(c) => Self::Rotation(c.shifted(offset)),
            Self::Colour(c) => Self::Colour(c.shifted(offset)),
            Self::Alpha(c) => Self::Alpha(c.shifted(offset)),
            Self::Additive(c) => Self::Additive(c.shifted(offset)),
            Self::FlipH(c) => Self::FlipH(c.shifted(offset)),
            Self::FlipV(c) => Self::FlipV(c.shifted(offset)),
        }
    }
}

/// Per-property command timelines of one sprite, loop or trigger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandTimelineGroup {
    pub movement: CommandTimeline<Vec2>,
    pub x: CommandTimeline<f32>,
    pub y: CommandTimeline<f32>,
    pub scale: CommandTimeline<f32>,
    pub vector_scale: CommandTimeline<Vec2>,
    pub rotation: CommandTimeline<f32>,
    pub colour: CommandTimeline<Rgb>,
    pub alpha: CommandTimeline<f32>,
    pub additive: CommandTimeline<bool>,
    pub flip_h: CommandTimeline<bool>,
    pub flip_v: CommandTimeline<bool>,
}

impl CommandTimelineGroup {
    /// Every command of the group, ordered by start time.
    pub fn commands(&self) -> Vec<StoryboardCommand> {
        let mut out = Vec::new();
        out.extend(self.movement.commands().iter().cloned().map(StoryboardCommand::Move));
        out.extend(self.x.commands().iter().cloned().map(StoryboardCommand::MoveX));
        out.extend(self.y.commands().iter().cloned().map(StoryboardCommand::MoveY));
        out.extend(self.scale.commands().iter().cloned().map(StoryboardCommand::Scale));
        out.extend(
            self.vector_scale
                .commands()
                .iter()
                .cloned()
                .map(StoryboardCommand::VectorScale),
        );
        out.extend(self.rotation.commands().iter().cloned().map(StoryboardCommand::Rotation));
        out.extend(self.colour.commands().iter().cloned().map(StoryboardCommand::Colour));
        out.extend(self.alpha.commands().iter().cloned().map(StoryboardCommand::Alpha));
        out.extend(self.additive.commands().iter().cloned().map(StoryboardCommand::Additive));
        out.extend(self.flip_h.commands().iter().cloned().map(StoryboardCommand::FlipH));
        out.extend(self.flip_v.commands().iter().cloned().map(StoryboardCommand::FlipV));
        // stable sort keeps property order for equal start times
        out.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        out
    }

    pub fn has_commands(&self) -> bool {
        !(self.movement.is_empty()
            && self.x.is_empty()
            && self.y.is_empty()
            && self.scale.is_empty()
            && self.vector_scale.is_empty()
            && self.rotation.is_empty()
            && self.colour.is_empty()
            && self.alpha.is_empty()
            && self.additive.is_empty()
            && self.flip_h.is_empty()
            && self.flip_v.is_empty())
    }

    pub fn start_time(&self) -> Option<f64> {
        self.commands().iter().map(StoryboardCommand::start_time).reduce(f64::min)
    }

    pub fn end_time(&self) -> Option<f64> {
        self.commands().iter().map(StoryboardCommand::end_time).reduce(f64::max)
    }
}

/// Commands repeated back to back from `loop_start_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLoop {
    pub loop_start_time: f64,
    /// Repeats after the first pass.
    pub repeat_count: i32,
    pub group: CommandTimelineGroup,
}

impl CommandLoop {
    pub fn new(loop_start_time: f64, repeat_count: i32) -> Self {
        Self {
            loop_start_time,
            repeat_count,
            group: CommandTimelineGroup::default(),
        }
    }

    pub fn total_iterations(&self) -> usize {
        self.repeat_count.max(0) as usize + 1
    }

    /// Length of one pass, measured from the earliest command start.
    pub fn iteration_duration(&self) -> f64 {
        match (self.group.start_time(), self.group.end_time()) {
            (Some(start), Some(end)) => end - start,
            _ => 0.0,
        }
    }

    /// Absolute-time commands of every pass.
    pub fn unroll_commands(&self) -> Vec<StoryboardCommand> {
        let template = self.group.commands();
        let duration = self.iteration_duration();
        (0..self.total_iterations())
            .flat_map(|i| {
                let offset = self.loop_start_time + i as f64 * duration;
                template.iter().map(move |c| c.shifted(offset))
            })
            .collect()
    }
}

/// Commands fired relative to a named gameplay event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTrigger {
    pub trigger_name: String,
    /// Start of the activation window. `f64::MIN` when unbounded.
    pub trigger_start_time: f64,
    /// End of the activation window. `f64::MAX` when unbounded.
    pub trigger_end_time: f64,
    pub group_number: i32,
    pub group: CommandTimelineGroup,
}

impl CommandTrigger {
    pub fn new(
        trigger_name: impl Into<String>,
        trigger_start_time: f64,
        trigger_end_time: f64,
        group_number: i32,
    ) -> Self {
        Self {
            trigger_name: trigger_name.into(),
            trigger_start_time,
            trigger_end_time,
            group_number,
            group: CommandTimelineGroup::default(),
        }
    }

    /// Template commands shifted to fire at `offset`. The template is left as is.
    pub fn unroll_at(&self, offset: f64) -> Vec<StoryboardCommand> {
        self.group
            .commands()
            .iter()
            .map(|c| c.shifted(offset))
            .collect()
    }

    /// Template commands shifted to the window start. An unbounded start leaves them unshifted.
    pub fn unroll_commands(&self) -> Vec<StoryboardCommand> {
        if self.has_unbounded_start() {
            return self.unroll_at(0.0);
        }
        self.unroll_at(self.trigger_start_time)
    }

    pub fn has_unbounded_start(&self) -> bool {
        self.trigger_start_time == f64::MIN
    }
}
