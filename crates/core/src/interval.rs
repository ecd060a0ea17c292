// Regulator - Register Dump Decoder
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Half-open integer ranges.
//!
//! One type serves bit positions inside a register, byte offsets inside a
//! cluster and absolute bus addresses. Addresses are translated between
//! those frames with [`Interval::translate`] and bit numbering is flipped
//! between LSB-first and MSB-first with [`Interval::reverse`].

use regulator_config::parse_int;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("start must be less than stop (got {start}..{stop})")]
    InvalidRange { start: u64, stop: u64 },
    #[error("cannot parse location '{0}'")]
    Parse(String),
    #[error("location '{text}' spans {actual}, expected {expected}")]
    LengthMismatch {
        text: String,
        expected: u64,
        actual: u64,
    },
    #[error("{interval} is not inside a frame of width {width}")]
    OutOfFrame { interval: Interval, width: u64 },
    #[error("{interval} cannot be moved by {offset}")]
    Overflow { interval: Interval, offset: i64 },
}

/// A non-empty half-open range `[start, stop)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    start: u64,
    stop: u64,
}

impl Interval {
    pub fn new(start: u64, stop: u64) -> Result<Self, IntervalError> {
        if start >= stop {
            return Err(IntervalError::InvalidRange { start, stop });
        }
        Ok(Self { start, stop })
    }

    /// For bounds already known to be ordered.
    pub(crate) fn from_raw(start: u64, stop: u64) -> Self {
        debug_assert!(start < stop, "empty interval {}..{}", start, stop);
        Self { start, stop }
    }

    /// The one-element interval `[at, at + 1)`.
    pub fn unit(at: u64) -> Self {
        Self {
            start: at,
            stop: at + 1,
        }
    }

    /// `[0, size)`.
    pub fn from_size(size: u64) -> Result<Self, IntervalError> {
        Self::new(0, size)
    }

    /// `[start, start + len)`.
    pub fn with_len(start: u64, len: u64) -> Result<Self, IntervalError> {
        let stop = start.checked_add(len).ok_or(IntervalError::InvalidRange {
            start,
            stop: u64::MAX,
        })?;
        Self::new(start, stop)
    }

    /// Parses a location and checks that it spans exactly `size` units.
    ///
    /// A bare start (`"28"`) is widened to `size` units, so `"28"` with a
    /// size of 3 becomes `28…30`.
    pub fn parse_sized(s: &str, size: u64) -> Result<Self, IntervalError> {
        let text = s.trim();
        let interval = match split_range(text) {
            Some(_) => text.parse::<Interval>()?,
            None => {
                let start = parse_int(text).map_err(|_| IntervalError::Parse(s.to_string()))?;
                Self::with_len(start, size)?
            }
        };
        if interval.len() != size {
            return Err(IntervalError::LengthMismatch {
                text: s.to_string(),
                expected: size,
                actual: interval.len(),
            });
        }
        Ok(interval)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// Always at least 1.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.stop - self.start
    }

    pub fn contains(&self, point: u64) -> bool {
        self.start <= point && point < self.stop
    }

    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        if self.start < other.stop && other.start < self.stop {
            Some(Interval {
                start: self.start.max(other.start),
                stop: self.stop.min(other.stop),
            })
        } else {
            None
        }
    }

    pub fn translate(&self, offset: i64) -> Result<Interval, IntervalError> {
        let overflow = || IntervalError::Overflow {
            interval: *self,
            offset,
        };
        let start = self.start.checked_add_signed(offset).ok_or_else(overflow)?;
        let stop = self.stop.checked_add_signed(offset).ok_or_else(overflow)?;
        Ok(Interval { start, stop })
    }

    /// Moves the interval into a frame whose origin is `origin`.
    pub fn rebase(&self, origin: u64) -> Result<Interval, IntervalError> {
        if origin > self.start {
            return Err(IntervalError::Overflow {
                interval: *self,
                offset: -(origin.min(i64::MAX as u64) as i64),
            });
        }
        Ok(Interval {
            start: self.start - origin,
            stop: self.stop - origin,
        })
    }

    /// Converts e.g. a byte interval into the equivalent bit interval.
    pub fn scale(&self, factor: u64) -> Interval {
        Interval {
            start: self.start * factor,
            stop: self.stop * factor,
        }
    }

    /// The smallest interval of `factor`-sized units covering `self`,
    /// e.g. the bytes touched by a bit interval.
    pub fn scale_down(&self, factor: u64) -> Interval {
        Interval {
            start: self.start / factor,
            stop: self.stop.div_ceil(factor),
        }
    }

    pub fn align(&self, step: u64) -> Interval {
        Interval {
            start: (self.start / step) * step,
            stop: self.stop.div_ceil(step) * step,
        }
    }

    /// Mirrors `[s, e)` inside `[0, width)` to `[width - e, width - s)`.
    pub fn reverse(&self, width: u64) -> Result<Interval, IntervalError> {
        if self.stop > width {
            return Err(IntervalError::OutOfFrame {
                interval: *self,
                width,
            });
        }
        Ok(Interval {
            start: width - self.stop,
            stop: width - self.start,
        })
    }

    /// The unit interval right after this one.
    pub fn next(&self) -> Interval {
        Interval::unit(self.stop)
    }

    /// Walks the interval in `step`-sized pieces.
    ///
    /// With `align` the walk starts at `start` rounded down and ends at
    /// `stop` rounded up to a multiple of `step`. Every call starts a fresh
    /// walk.
    pub fn range(&self, step: u64, align: bool) -> Steps {
        assert!(step > 0, "step must be positive");
        let bounds = if align { self.align(step) } else { *self };
        Steps {
            next: bounds.start,
            stop: bounds.stop,
            step,
        }
    }
}

/// Iterator returned by [`Interval::range`].
#[derive(Debug, Clone)]
pub struct Steps {
    next: u64,
    stop: u64,
    step: u64,
}

impl Iterator for Steps {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        if self.next >= self.stop {
            return None;
        }
        let item = Interval {
            start: self.next,
            stop: self.next + self.step,
        };
        self.next += self.step;
        Some(item)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len() == 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}…{}", self.start, self.stop - 1)
        }
    }
}

impl fmt::LowerHex for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len() == 1 {
            write!(f, "{:#x}", self.start)
        } else {
            write!(f, "{:#x}…{:#x}", self.start, self.stop - 1)
        }
    }
}

fn split_range(s: &str) -> Option<(&str, &str)> {
    s.split_once('…').or_else(|| s.split_once(".."))
}

impl FromStr for Interval {
    type Err = IntervalError;

    /// Accepts `5`, `1..3` and `1…3` (end inclusive), each endpoint in
    /// decimal, `0x` hex or `0b` binary.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let bad = || IntervalError::Parse(s.to_string());
        match split_range(text) {
            Some((first, last)) => {
                let start = parse_int(first).map_err(|_| bad())?;
                let last = parse_int(last).map_err(|_| bad())?;
                let stop = last.checked_add(1).ok_or_else(bad)?;
                Interval::new(start, stop)
            }
            None => {
                let start = parse_int(text).map_err(|_| bad())?;
                if start == u64::MAX {
                    return Err(bad());
                }
                Ok(Interval::unit(start))
            }
        }
    }
}
