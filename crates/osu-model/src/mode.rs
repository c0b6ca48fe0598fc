use crate::parsing::legacy_enum;

legacy_enum! {
    /// Game mode a map or replay is played in.
    #[derive(Default)]
    pub enum Ruleset {
        #[default]
        Osu = 0,
        Taiko = 1,
        Catch = 2,
        Mania = 3,
    }
}

impl Ruleset {
    /// Taiko and mania express scroll speed through effect points.
    pub fn uses_effect_scroll_speed(self) -> bool {
        matches!(self, Self::Taiko | Self::Mania)
    }
}

legacy_enum! {
    #[derive(Default)]
    pub enum Countdown {
        None = 0,
        #[default]
        Normal = 1,
        HalfSpeed = 2,
        DoubleSpeed = 3,
    }
}
