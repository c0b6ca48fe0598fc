// Mode-specific replay frames and their mapping to and from legacy frames.

use std::collections::BTreeSet;

use osu_model::Vec2;
use serde::{Deserialize, Serialize};

use crate::legacy_frame::{LegacyReplayFrame, ReplayButtons};

/// An action inferred for the frame before the one being converted.
///
/// The legacy encoding has no directional buttons, so a direction only becomes
/// known once the following frame's position is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePatch<A> {
    pub add: A,
}

/// A mode-specific frame that maps to and from the legacy encoding.
pub trait ConvertibleReplayFrame: Sized {
    type Action: Copy + Ord;

    /// Converts `current`, given the already converted frame before it.
    ///
    /// A returned patch belongs to `previous` and must be applied to it by the caller.
    fn from_legacy(
        current: &LegacyReplayFrame,
        previous: Option<&Self>,
    ) -> (Self, Option<FramePatch<Self::Action>>);

    /// Rebuilds the legacy frame from this frame's own actions.
    fn to_legacy(&self) -> LegacyReplayFrame;

    fn actions_mut(&mut self) -> &mut BTreeSet<Self::Action>;

    fn apply(&mut self, patch: FramePatch<Self::Action>) {
        self.actions_mut().insert(patch.add);
    }
}

/// Converts a legacy frame stream, applying every patch to the frame it names.
pub fn from_legacy_frames<F: ConvertibleReplayFrame>(frames: &[LegacyReplayFrame]) -> Vec<F> {
    let mut out: Vec<F> = Vec::with_capacity(frames.len());
    for frame in frames {
        let (converted, patch) = F::from_legacy(frame, out.last());
        if let (Some(patch), Some(previous)) = (patch, out.last_mut()) {
            previous.apply(patch);
        }
        out.push(converted);
    }
    out
}

pub fn to_legacy_frames<F: ConvertibleReplayFrame>(frames: &[F]) -> Vec<LegacyReplayFrame> {
    frames.iter().map(ConvertibleReplayFrame::to_legacy).collect()
}

fn legacy(time: f64, interval: f64, position: Vec2, buttons: ReplayButtons) -> LegacyReplayFrame {
    LegacyReplayFrame {
        time,
        interval,
        position,
        buttons,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OsuAction {
    LeftButton,
    RightButton,
    Smoke,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsuReplayFrame {
    pub time: f64,
    pub interval: f64,
    pub position: Vec2,
    pub actions: BTreeSet<OsuAction>,
}

impl ConvertibleReplayFrame for OsuReplayFrame {
    type Action = OsuAction;

    fn from_legacy(current: &LegacyReplayFrame, _previous: Option<&Self>) -> (Self, Option<FramePatch<OsuAction>>) {
        let buttons = current.buttons;
        let mut actions = BTreeSet::new();
        if buttons.contains(ReplayButtons::LEFT1) || buttons.contains(ReplayButtons::LEFT2) {
            actions.insert(OsuAction::LeftButton);
        }
        if buttons.contains(ReplayButtons::RIGHT1) || buttons.contains(ReplayButtons::RIGHT2) {
            actions.insert(OsuAction::RightButton);
        }
        if buttons.contains(ReplayButtons::SMOKE) {
            actions.insert(OsuAction::Smoke);
        }
        let frame = OsuReplayFrame {
            time: current.time,
            interval: current.interval,
            position: current.position,
            actions,
        };
        (frame, None)
    }

    fn to_legacy(&self) -> LegacyReplayFrame {
        let mut buttons = ReplayButtons::NONE;
        for action in &self.actions {
            buttons.insert(match action {
                OsuAction::LeftButton => ReplayButtons::LEFT1,
                OsuAction::RightButton => ReplayButtons::RIGHT1,
                OsuAction::Smoke => ReplayButtons::SMOKE,
            });
        }
        legacy(self.time, self.interval, self.position, buttons)
    }

    fn actions_mut(&mut self) -> &mut BTreeSet<OsuAction> {
        &mut self.actions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaikoAction {
    LeftRim,
    LeftCentre,
    RightCentre,
    RightRim,
}

const TAIKO_BUTTONS: [(ReplayButtons, TaikoAction); 4] = [
    (ReplayButtons::RIGHT1, TaikoAction::LeftRim),
    (ReplayButtons::RIGHT2, TaikoAction::RightRim),
    (ReplayButtons::LEFT1, TaikoAction::LeftCentre),
    (ReplayButtons::LEFT2, TaikoAction::RightCentre),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaikoReplayFrame {
    pub time: f64,
    pub interval: f64,
    pub actions: BTreeSet<TaikoAction>,
}

impl ConvertibleReplayFrame for TaikoReplayFrame {
    type Action = TaikoAction;

    fn from_legacy(current: &LegacyReplayFrame, _previous: Option<&Self>) -> (Self, Option<FramePatch<TaikoAction>>) {
        let actions = TAIKO_BUTTONS
            .iter()
            .filter(|(button, _)| current.buttons.contains(*button))
            .map(|&(_, action)| action)
            .collect();
        let frame = TaikoReplayFrame {
            time: current.time,
            interval: current.interval,
            actions,
        };
        (frame, None)
    }

    fn to_legacy(&self) -> LegacyReplayFrame {
        let mut buttons = ReplayButtons::NONE;
        for (button, action) in TAIKO_BUTTONS {
            if self.actions.contains(&action) {
                buttons.insert(button);
            }
        }
        legacy(self.time, self.interval, Vec2::ZERO, buttons)
    }

    fn actions_mut(&mut self) -> &mut BTreeSet<TaikoAction> {
        &mut self.actions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CatchAction {
    MoveLeft,
    MoveRight,
    Dash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchReplayFrame {
    pub time: f64,
    pub interval: f64,
    /// Catcher x position.
    pub position: f32,
    pub actions: BTreeSet<CatchAction>,
}

impl CatchReplayFrame {
    pub fn dashing(&self) -> bool {
        self.actions.contains(&CatchAction::Dash)
    }
}

impl ConvertibleReplayFrame for CatchReplayFrame {
    type Action = CatchAction;

    /// The movement direction between two frames is credited to the earlier one.
    fn from_legacy(current: &LegacyReplayFrame, previous: Option<&Self>) -> (Self, Option<FramePatch<CatchAction>>) {
        let position = current.position.x;
        let mut actions = BTreeSet::new();
        if current.buttons.contains(ReplayButtons::LEFT1) {
            actions.insert(CatchAction::Dash);
        }

        let patch = previous.and_then(|previous| {
            if position > previous.position {
                Some(FramePatch {
                    add: CatchAction::MoveRight,
                })
            } else if position < previous.position {
                Some(FramePatch {
                    add: CatchAction::MoveLeft,
                })
            } else {
                None
            }
        });

        let frame = CatchReplayFrame {
            time: current.time,
            interval: current.interval,
            position,
            actions,
        };
        (frame, patch)
    }

    fn to_legacy(&self) -> LegacyReplayFrame {
        let buttons = if self.dashing() {
            ReplayButtons::LEFT1
        } else {
            ReplayButtons::NONE
        };
        legacy(self.time, self.interval, Vec2::new(self.position, 0.0), buttons)
    }

    fn actions_mut(&mut self) -> &mut BTreeSet<CatchAction> {
        &mut self.actions
    }
}

/// A pressed mania column, counted from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManiaAction(pub u8);

/// Columns beyond this cannot be stored in the x coordinate.
pub const MAX_MANIA_COLUMNS: u8 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManiaReplayFrame {
    pub time: f64,
    pub interval: f64,
    pub actions: BTreeSet<ManiaAction>,
}

impl ConvertibleReplayFrame for ManiaReplayFrame {
    type Action = ManiaAction;

    /// The x coordinate carries one bit per held column.
    fn from_legacy(current: &LegacyReplayFrame, _previous: Option<&Self>) -> (Self, Option<FramePatch<ManiaAction>>) {
        let mask = current.position.x.max(0.0) as u32;
        let actions = (0..MAX_MANIA_COLUMNS)
            .filter(|column| mask & (1 << column) != 0)
            .map(ManiaAction)
            .collect();
        let frame = ManiaReplayFrame {
            time: current.time,
            interval: current.interval,
            actions,
        };
        (frame, None)
    }

    fn to_legacy(&self) -> LegacyReplayFrame {
        let mask = self
            .actions
            .iter()
            .filter(|a| a.0 < MAX_MANIA_COLUMNS)
            .fold(0u32, |mask, a| mask | (1 << a.0));
        legacy(
            self.time,
            self.interval,
            Vec2::new(mask as f32, 0.0),
            ReplayButtons::NONE,
        )
    }

    fn actions_mut(&mut self) -> &mut BTreeSet<ManiaAction> {
        &mut self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: f64, x: f32, buttons: ReplayButtons) -> LegacyReplayFrame {
        LegacyReplayFrame::new(time, Vec2::new(x, 100.0), buttons)
    }

    #[test]
    fn test_osu_second_buttons_map_to_primary() {
        let (converted, patch) = OsuReplayFrame::from_legacy(
            &frame(10.0, 5.0, ReplayButtons::LEFT2 | ReplayButtons::RIGHT1),
            None,
        );
        assert!(patch.is_none());
        assert_eq!(
            converted.actions,
            BTreeSet::from([OsuAction::LeftButton, OsuAction::RightButton])
        );
        let back = converted.to_legacy();
        assert_eq!(back.buttons, ReplayButtons::LEFT1 | ReplayButtons::RIGHT1);
        assert_eq!(back.position, Vec2::new(5.0, 100.0));
    }

    #[test]
    fn test_taiko_mapping() {
        let (converted, _) = TaikoReplayFrame::from_legacy(
            &frame(0.0, 0.0, ReplayButtons::RIGHT1 | ReplayButtons::LEFT2),
            None,
        );
        assert_eq!(
            converted.actions,
            BTreeSet::from([TaikoAction::LeftRim, TaikoAction::RightCentre])
        );
        assert_eq!(
            converted.to_legacy().buttons,
            ReplayButtons::RIGHT1 | ReplayButtons::LEFT2
        );
    }

    #[test]
    fn test_catch_direction_patches_previous_frame() {
        let frames = [
            frame(0.0, 100.0, ReplayButtons::NONE),
            frame(16.0, 120.0, ReplayButtons::LEFT1),
            frame(32.0, 90.0, ReplayButtons::NONE),
            frame(48.0, 90.0, ReplayButtons::NONE),
        ];
        let converted: Vec<CatchReplayFrame> = from_legacy_frames(&frames);
        assert_eq!(converted[0].actions, BTreeSet::from([CatchAction::MoveRight]));
        assert_eq!(
            converted[1].actions,
            BTreeSet::from([CatchAction::Dash, CatchAction::MoveLeft])
        );
        assert!(converted[2].actions.is_empty());
        assert!(converted[3].actions.is_empty());
    }

    #[test]
    fn test_catch_patch_is_returned_not_applied() {
        let previous = CatchReplayFrame {
            time: 0.0,
            interval: 0.0,
            position: 50.0,
            actions: BTreeSet::new(),
        };
        let (current, patch) = CatchReplayFrame::from_legacy(&frame(16.0, 40.0, ReplayButtons::NONE), Some(&previous));
        assert_eq!(patch, Some(FramePatch { add: CatchAction::MoveLeft }));
        assert!(previous.actions.is_empty());
        assert!(current.actions.is_empty());
        assert_eq!(current.to_legacy().position, Vec2::new(40.0, 0.0));
    }

    #[test]
    fn test_mania_columns_from_x() {
        let (converted, _) = ManiaReplayFrame::from_legacy(&frame(0.0, 5.0, ReplayButtons::NONE), None);
        assert_eq!(converted.actions, BTreeSet::from([ManiaAction(0), ManiaAction(2)]));
        assert_eq!(converted.to_legacy().position.x, 5.0);
    }

    #[test]
    fn test_to_legacy_frames_keeps_timing() {
        let frames = [frame(0.0, 1.0, ReplayButtons::NONE), frame(20.0, 2.0, ReplayButtons::SMOKE)];
        let converted: Vec<OsuReplayFrame> = from_legacy_frames(&frames);
        let back = to_legacy_frames(&converted);
        assert_eq!(back[1].time, 20.0);
        assert_eq!(back[1].buttons, ReplayButtons::SMOKE);
    }
}
