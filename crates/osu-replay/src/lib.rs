// Replay file codec: header fields, compressed frame stream, per-mode frame conversion

mod convert;
mod legacy_frame;
mod replay;
pub mod serialization;

pub use convert::{
    CatchAction, CatchReplayFrame, ConvertibleReplayFrame, FramePatch, MAX_MANIA_COLUMNS,
    ManiaAction, ManiaReplayFrame, OsuAction, OsuReplayFrame, TaikoAction, TaikoReplayFrame,
    from_legacy_frames, to_legacy_frames,
};
pub use legacy_frame::{LegacyReplayFrame, ReplayButtons};
pub use replay::{HitCounts, LifeBarPoint, Replay, ReplayDecoder, ReplayEncoder, SEED_MARKER};
