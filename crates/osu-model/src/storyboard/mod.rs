// Storyboard elements declared in the [Events] section.

mod command;

pub use command::{
    Command, CommandLoop, CommandTimeline, CommandTimelineGroup, CommandTrigger, Easing, Rgb,
    StoryboardCommand,
};

use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::parsing::legacy_enum;

legacy_enum! {
    pub enum Layer {
        Background = 0,
        Fail = 1,
        Pass = 2,
        Foreground = 3,
        Overlay = 4,
        Video = 5,
    }
}

legacy_enum! {
    pub enum Origin {
        TopLeft = 0,
        Centre = 1,
        CentreLeft = 2,
        TopRight = 3,
        BottomCentre = 4,
        TopCentre = 5,
        Custom = 6,
        CentreRight = 7,
        BottomLeft = 8,
        BottomRight = 9,
    }
}

legacy_enum! {
    #[derive(Default)]
    pub enum AnimationLoopType {
        #[default]
        LoopForever = 0,
        LoopOnce = 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardSprite {
    pub layer: Layer,
    pub origin: Origin,
    pub path: String,
    pub initial_position: Vec2,
    pub commands: CommandTimelineGroup,
    pub loops: Vec<CommandLoop>,
    pub triggers: Vec<CommandTrigger>,
}

impl StoryboardSprite {
    pub fn new(layer: Layer, origin: Origin, path: impl Into<String>, initial_position: Vec2) -> Self {
        Self {
            layer,
            origin,
            path: path.into(),
            initial_position,
            commands: CommandTimelineGroup::default(),
            loops: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Main commands plus every loop pass, in absolute time.
    ///
    /// Trigger groups are excluded since their firing time is only known during playback.
    pub fn timed_commands(&self) -> Vec<StoryboardCommand> {
        let mut out = self.commands.commands();
        for command_loop in &self.loops {
            out.extend(command_loop.unroll_commands());
        }
        out.sort_by(|a, b| a.start_time().total_cmp(&b.start_time()));
        out
    }

    pub fn start_time(&self) -> Option<f64> {
        self.timed_commands()
            .iter()
            .map(StoryboardCommand::start_time)
            .reduce(f64::min)
    }

    pub fn end_time(&self) -> Option<f64> {
        self.timed_commands()
            .iter()
            .map(StoryboardCommand::end_time)
            .reduce(f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardAnimation {
    pub sprite: StoryboardSprite,
    pub frame_count: i32,
    /// Milliseconds per frame.
    pub frame_delay: f64,
    pub loop_type: AnimationLoopType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryboardSample {
    pub time: f64,
    pub layer: Layer,
    pub path: String,
    pub volume: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoryboardElement {
    Sprite(StoryboardSprite),
    Animation(StoryboardAnimation),
    Sample(StoryboardSample),
}

impl StoryboardElement {
    pub fn layer(&self) -> Layer {
        match self {
            Self::Sprite(sprite) => sprite.layer,
            Self::Animation(animation) => animation.sprite.layer,
            Self::Sample(sample) => sample.layer,
        }
    }

    pub fn sprite_mut(&mut self) -> Option<&mut StoryboardSprite> {
        match self {
            Self::Sprite(sprite) => Some(sprite),
            Self::Animation(animation) => Some(&mut animation.sprite),
            Self::Sample(_) => None,
        }
    }

    pub fn sprite(&self) -> Option<&StoryboardSprite> {
        match self {
            Self::Sprite(sprite) => Some(sprite),
            Self::Animation(animation) => Some(&animation.sprite),
            Self::Sample(_) => None,
        }
    }
}

/// Storyboard elements in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storyboard {
    pub elements: Vec<StoryboardElement>,
}

impl Storyboard {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &StoryboardElement> {
        self.elements.iter().filter(move |e| e.layer() == layer)
    }
}
