use crate::{BitReader, Result};

/// Mask for 33-bit MPEG PTS values.
pub const PTS_MASK: u64 = (1 << 33) - 1;

/// PTS clock rate (90 kHz).
pub const PTS_CLOCK_HZ: u64 = 90_000;

/// `splice_time()` structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpliceTime {
    /// 33-bit PTS, present only when `time_specified_flag` is set.
    pub pts_time: Option<u64>,
}

impl SpliceTime {
    /// Parse a `splice_time()`: 8 bits when unspecified, 40 bits otherwise.
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let time_specified_flag = reader.read_bool()?;
        if !time_specified_flag {
            reader.skip(7)?;
            return Ok(SpliceTime { pts_time: None });
        }
        reader.skip(6)?;
        let pts_time = reader.read_unsigned(33)?;
        Ok(SpliceTime {
            pts_time: Some(pts_time),
        })
    }

    pub fn time_specified_flag(&self) -> bool {
        self.pts_time.is_some()
    }

    /// PTS as seconds (floating point).
    pub fn as_seconds(&self) -> Option<f64> {
        self.pts_time.map(|pts| pts as f64 / PTS_CLOCK_HZ as f64)
    }
}

/// `break_duration()` structure, always 40 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BreakDuration {
    pub auto_return: bool,
    /// Duration in 90kHz ticks (33-bit)
    pub duration: u64,
}

impl BreakDuration {
    pub fn parse(reader: &mut BitReader<'_>) -> Result<Self> {
        let auto_return = reader.read_bool()?;
        reader.skip(6)?;
        let duration = reader.read_unsigned(33)?;
        Ok(BreakDuration {
            auto_return,
            duration,
        })
    }

    /// Duration as seconds (floating point).
    pub fn as_seconds(&self) -> f64 {
        self.duration as f64 / PTS_CLOCK_HZ as f64
    }
}
