// Little-endian primitives of the binary replay format.

use chrono::{DateTime, Utc};
use osu_model::{Error, Result};

/// Tick count at the unix epoch, in 100ns ticks counted from year 1.
pub const EPOCH_TICKS: i64 = 621_355_968_000_000_000;

const TICKS_PER_MILLISECOND: i64 = 10_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Converts a timestamp to ticks at millisecond precision.
pub fn write_date(date: &DateTime<Utc>) -> Result<i64> {
    date.timestamp_millis()
        .checked_mul(TICKS_PER_MILLISECOND)
        .and_then(|ticks| ticks.checked_add(EPOCH_TICKS))
        .ok_or_else(|| Error::range(format!("date {date} not representable as ticks")))
}

/// Converts ticks back to a timestamp, keeping sub-millisecond ticks.
pub fn read_date(ticks: i64) -> Result<DateTime<Utc>> {
    let since_epoch = ticks
        .checked_sub(EPOCH_TICKS)
        .ok_or_else(|| Error::range(format!("date ticks {ticks} out of range")))?;
    let seconds = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = since_epoch.rem_euclid(TICKS_PER_SECOND) * 100;
    DateTime::from_timestamp(seconds, nanos as u32)
        .ok_or_else(|| Error::range(format!("date ticks {ticks} out of range")))
}

/// Cursor over a replay buffer.
pub struct ReplayReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReplayReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::format(format!(
                "replay truncated: needed {len} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Reads bytes up to the next zero byte, which is consumed.
    pub fn read_string(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::format(format!("unterminated string at offset {}", self.pos)))?;
        let text = std::str::from_utf8(&rest[..end])
            .map_err(|e| Error::format(format!("string at offset {} is not UTF-8: {e}", self.pos)))?
            .to_string();
        self.pos += end + 1;
        Ok(text)
    }

    pub fn read_date(&mut self) -> Result<DateTime<Utc>> {
        read_date(self.read_i64()?)
    }
}

#[derive(Debug, Default)]
pub struct ReplayWriter {
    buf: Vec<u8>,
}

impl ReplayWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes the string followed by a zero byte. Interior zero bytes cannot be represented.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        if text.as_bytes().contains(&0) {
            return Err(Error::format(format!("string {text:?} contains a zero byte")));
        }
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    pub fn write_date(&mut self, date: &DateTime<Utc>) -> Result<()> {
        self.write_i64(write_date(date)?);
        Ok(())
    }
}
