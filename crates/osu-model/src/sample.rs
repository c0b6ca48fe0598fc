// Hit sound and sample bank types shared by hit objects and control points.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::parsing::{LegacyEnum, legacy_enum, parse_int};

legacy_enum! {
    #[derive(Default)]
    pub enum SampleBank {
        #[default]
        None = 0,
        Normal = 1,
        Soft = 2,
        Drum = 3,
    }
}

impl SampleBank {
    /// Parses a bank stored as its numeric value. Undefined values are rejected.
    pub fn parse_numeric(text: &str) -> Result<SampleBank> {
        let value = parse_int(text)?;
        SampleBank::from_value(value)
            .ok_or_else(|| Error::format(format!("{value} is not a sample bank")))
    }
}

/// Additive hit sound flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HitSound(pub u8);

impl HitSound {
    pub const NONE: HitSound = HitSound(0);
    pub const NORMAL: HitSound = HitSound(1);
    pub const WHISTLE: HitSound = HitSound(2);
    pub const FINISH: HitSound = HitSound(4);
    pub const CLAP: HitSound = HitSound(8);

    pub fn contains(self, other: HitSound) -> bool {
        self.0 & other.0 == other.0
    }
}

/// The `normal:addition:index:volume:filename` sample field of a hit object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HitSampleInfo {
    pub normal_bank: SampleBank,
    pub addition_bank: SampleBank,
    pub custom_index: i32,
    pub volume: i32,
    pub filename: String,
}

impl HitSampleInfo {
    /// Parses the colon-separated sample string. Missing trailing fields keep their defaults.
    pub fn parse(text: &str) -> Result<HitSampleInfo> {
        let mut info = HitSampleInfo::default();
        if text.is_empty() {
            return Ok(info);
        }
        let fields: Vec<&str> = text.split(':').collect();
        if fields.len() < 2 {
            return Err(Error::format(format!("sample string {text:?} is too short")));
        }
        info.normal_bank = SampleBank::parse_numeric(fields[0])?;
        info.addition_bank = SampleBank::parse_numeric(fields[1])?;
        if let Some(index) = fields.get(2) {
            info.custom_index = parse_int(index)?;
        }
        if let Some(volume) = fields.get(3) {
            info.volume = parse_int(volume)?.max(0);
        }
        if let Some(filename) = fields.get(4) {
            info.filename = filename.to_string();
        }
        Ok(info)
    }

    pub fn to_legacy_string(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.normal_bank.value(),
            self.addition_bank.value(),
            self.custom_index,
            self.volume,
            self.filename
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_full_sample_string() {
        let info = HitSampleInfo::parse("1:2:3:70:clap.wav").unwrap();
        assert_eq!(info.normal_bank, SampleBank::Normal);
        assert_eq!(info.addition_bank, SampleBank::Soft);
        assert_eq!(info.custom_index, 3);
        assert_eq!(info.volume, 70);
        assert_eq!(info.filename, "clap.wav");
        assert_eq!(info.to_legacy_string(), "1:2:3:70:clap.wav");
    }

    #[test]
    fn test_parse_short_sample_string() {
        let info = HitSampleInfo::parse("3:0").unwrap();
        assert_eq!(info.normal_bank, SampleBank::Drum);
        assert_eq!(info.volume, 0);
        assert_eq!(info.to_legacy_string(), "3:0:0:0:");
    }

    #[test]
    fn test_undefined_bank_rejected() {
        let err = HitSampleInfo::parse("4:0:0:0:").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_hit_sound_flags() {
        let sound = HitSound(HitSound::WHISTLE.0 | HitSound::CLAP.0);
        assert!(sound.contains(HitSound::CLAP));
        assert!(!sound.contains(HitSound::FINISH));
    }
}
