//! Frame-count to `HH:MM:SS:FF` conversion.
//!
//! The server reports clip durations as a frame count plus a timebase
//! (`1/25`, `1001/30000`, …). A [`FrameRate`] can only be built from a
//! non-zero fraction, so [`Timecode::from_frames`] itself is total.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AmcpError;

// ── FrameRate ────────────────────────────────────────────────────

/// Frames per second expressed as `num / den`.
///
/// Serialises as the `"num/den"` string and is validated on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameRate {
    num: u32,
    den: u32,
}

impl FrameRate {
    /// Build a frame rate of `num / den` frames per second.
    pub fn new(num: u32, den: u32) -> Result<Self, AmcpError> {
        if num == 0 {
            return Err(AmcpError::Timecode("frame rate must be positive"));
        }
        if den == 0 {
            return Err(AmcpError::Timecode("frame rate denominator is zero"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number rate, e.g. `FrameRate::integer(25)`.
    pub fn integer(fps: u32) -> Result<Self, AmcpError> {
        Self::new(fps, 1)
    }

    /// Parse a server timebase (seconds per frame, `"1/25"`) into the
    /// equivalent frame rate (`25/1`).
    pub fn from_timebase(timebase: &str) -> Result<Self, AmcpError> {
        let (num, den) = parse_fraction(timebase)?;
        Self::new(den, num)
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn den(&self) -> u32 {
        self.den
    }

    /// The rate as a floating point value.
    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl FromStr for FrameRate {
    type Err = AmcpError;

    /// Accepts `"25"` or `"30000/1001"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            let (num, den) = parse_fraction(s)?;
            Self::new(num, den)
        } else {
            let fps = s
                .trim()
                .parse()
                .map_err(|_| AmcpError::Timecode("frame rate is not a number"))?;
            Self::integer(fps)
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl TryFrom<String> for FrameRate {
    type Error = AmcpError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FrameRate> for String {
    fn from(rate: FrameRate) -> Self {
        rate.to_string()
    }
}

fn parse_fraction(s: &str) -> Result<(u32, u32), AmcpError> {
    let (num, den) = s
        .trim()
        .split_once('/')
        .ok_or(AmcpError::Timecode("fraction has no '/'"))?;
    let num = num
        .parse()
        .map_err(|_| AmcpError::Timecode("fraction numerator is not a number"))?;
    let den = den
        .parse()
        .map_err(|_| AmcpError::Timecode("fraction denominator is not a number"))?;
    Ok((num, den))
}

// ── Timecode ─────────────────────────────────────────────────────

/// A decomposed display timecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timecode {
    pub hours: u64,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u32,
}

impl Timecode {
    /// Convert an elapsed frame count at `rate` into a timecode.
    ///
    /// Whole seconds are `frames / fps`; the remainder is expressed in
    /// frames of the same cadence. Durations past `u64::MAX` seconds
    /// saturate.
    pub fn from_frames(frames: u64, rate: FrameRate) -> Self {
        let num = u128::from(rate.num);
        let den = u128::from(rate.den);
        let scaled = u128::from(frames) * den;

        let total_seconds = u64::try_from(scaled / num).unwrap_or(u64::MAX);
        // scaled % num < num <= u32::MAX
        let remainder = ((scaled % num) / den) as u32;

        Self {
            hours: total_seconds / 3600,
            minutes: ((total_seconds / 60) % 60) as u8,
            seconds: (total_seconds % 60) as u8,
            frames: remainder,
        }
    }

    /// Convert elapsed seconds into a timecode, rounding to the nearest
    /// frame. Negative or non-finite input is treated as zero.
    pub fn from_seconds(seconds: f64, rate: FrameRate) -> Self {
        let frames = if seconds.is_finite() && seconds > 0.0 {
            (seconds * rate.as_f64()).round() as u64
        } else {
            0
        };
        Self::from_frames(frames, rate)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

/// Format `frames` at `num / den` fps as `HH:MM:SS:FF`.
pub fn from_frames(frames: u64, num: u32, den: u32) -> Result<String, AmcpError> {
    let rate = FrameRate::new(num, den)?;
    Ok(Timecode::from_frames(frames, rate).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_seconds_at_25() {
        assert_eq!(from_frames(750, 25, 1).unwrap(), "00:00:30:00");
    }

    #[test]
    fn one_second_one_frame() {
        assert_eq!(from_frames(26, 25, 1).unwrap(), "00:00:01:01");
    }

    #[test]
    fn hours_and_minutes() {
        let rate = FrameRate::integer(50).unwrap();
        // 1h 2m 3s 4f
        let frames = ((3600 + 2 * 60 + 3) * 50 + 4) as u64;
        assert_eq!(Timecode::from_frames(frames, rate).to_string(), "01:02:03:04");
    }

    #[test]
    fn huge_durations_saturate() {
        // One frame every u32::MAX seconds.
        let rate = FrameRate::from_timebase("4294967295/1").unwrap();
        let tc = Timecode::from_frames(u64::MAX, rate);
        assert_eq!(tc.hours, u64::MAX / 3600);
        assert_eq!(tc.minutes, ((u64::MAX / 60) % 60) as u8);
        assert_eq!(tc.seconds, (u64::MAX % 60) as u8);
    }

    #[test]
    fn zero_frames() {
        let rate = FrameRate::integer(25).unwrap();
        assert_eq!(Timecode::from_frames(0, rate).to_string(), "00:00:00:00");
    }

    #[test]
    fn fractional_rate() {
        // 30000/1001 fps: 30 frames is just over one second.
        let rate = FrameRate::new(30000, 1001).unwrap();
        let tc = Timecode::from_frames(30, rate);
        assert_eq!(tc.seconds, 1);
        assert_eq!(tc.frames, 0);
    }

    #[test]
    fn zero_rate_rejected() {
        assert!(matches!(FrameRate::new(0, 1), Err(AmcpError::Timecode(_))));
        assert!(matches!(FrameRate::new(25, 0), Err(AmcpError::Timecode(_))));
        assert!(from_frames(10, 0, 1).is_err());
    }

    #[test]
    fn timebase_is_inverted() {
        let rate = FrameRate::from_timebase("1/60").unwrap();
        assert_eq!(rate.num(), 60);
        assert_eq!(rate.den(), 1);

        let rate = FrameRate::from_timebase("1001/30000").unwrap();
        assert_eq!(rate.to_string(), "30000/1001");
    }

    #[test]
    fn timebase_garbage_rejected() {
        assert!(FrameRate::from_timebase("25").is_err());
        assert!(FrameRate::from_timebase("a/b").is_err());
        assert!(FrameRate::from_timebase("0/25").is_err());
    }

    #[test]
    fn parse_rate_from_str() {
        assert_eq!("25".parse::<FrameRate>().unwrap(), FrameRate::integer(25).unwrap());
        assert_eq!(
            "30000/1001".parse::<FrameRate>().unwrap(),
            FrameRate::new(30000, 1001).unwrap()
        );
        assert!("x".parse::<FrameRate>().is_err());
    }

    #[test]
    fn rate_serde_is_validated() {
        let rate = FrameRate::new(30000, 1001).unwrap();
        let json = serde_json::to_string(&rate).unwrap();
        assert_eq!(json, r#""30000/1001""#);
        assert_eq!(serde_json::from_str::<FrameRate>(&json).unwrap(), rate);
        assert!(serde_json::from_str::<FrameRate>(r#""25/0""#).is_err());
    }

    #[test]
    fn from_seconds_rounds_to_frame() {
        let rate = FrameRate::integer(25).unwrap();
        assert_eq!(Timecode::from_seconds(30.0, rate).to_string(), "00:00:30:00");
        assert_eq!(Timecode::from_seconds(1.04, rate).to_string(), "00:00:01:01");
        assert_eq!(Timecode::from_seconds(-3.0, rate).to_string(), "00:00:00:00");
    }
}
