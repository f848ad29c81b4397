// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tick-based time for host-driven frame loops.
//!
//! Hosts hand the context raw monotonic counter readings (a
//! `CADisplayLink` timestamp, a performance counter) and never a
//! wall-clock date. Everything here stays in those native ticks:
//! [`HostTime`] is one reading, [`Duration`] is the span between two,
//! and [`Timebase`] holds the platform's tick-to-nanosecond ratio for
//! the few places a real unit is needed, such as configuring the idle
//! interval. Conversions go through 128-bit intermediates, so oddball
//! ratios survive large counter values.

use core::ops::Add;

/// Platform tick-to-nanosecond ratio, as a `numer / denom` fraction.
///
/// Mach hosts report ratios like `125 / 3` for a 24 MHz counter; hosts
/// whose counters already run in nanoseconds use [`Timebase::NANOS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timebase {
    /// Nanoseconds per tick, numerator.
    pub numer: u32,
    /// Nanoseconds per tick, denominator.
    pub denom: u32,
}

/// Scales `value` by `mul / div` through a 128-bit intermediate.
#[expect(
    clippy::cast_possible_truncation,
    reason = "a result beyond u64::MAX nanoseconds is outside any session's lifetime"
)]
const fn rescale(value: u64, mul: u32, div: u32) -> u64 {
    (value as u128 * mul as u128 / div as u128) as u64
}

impl Timebase {
    /// The 1:1 ratio for counters that already count nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Creates a timebase from a raw ratio.
    ///
    /// # Panics
    ///
    /// Panics when the denominator is zero.
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "zero-denominator timebase ratio");
        Self { numer, denom }
    }

    /// Nanoseconds in `ticks` native ticks, truncated.
    #[inline]
    #[must_use]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        rescale(ticks, self.numer, self.denom)
    }

    /// Native ticks in `nanos` nanoseconds, truncated.
    #[inline]
    #[must_use]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        rescale(nanos, self.denom, self.numer)
    }
}

/// A span between two [`HostTime`] readings, in native ticks.
///
/// Compared and added in the tick units of whatever clock produced it;
/// mixing clocks with different timebases is the caller's bug.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(pub u64);

impl Duration {
    /// The empty span.
    pub const ZERO: Self = Self(0);

    /// The span's raw tick count.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// A span of `nanos` nanoseconds on the clock described by
    /// `timebase`.
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }
}

/// One reading of the host's monotonic frame clock.
///
/// The wrapped value is whatever the host's counter produced; it is
/// only meaningful relative to other readings from the same clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostTime(pub u64);

impl HostTime {
    /// The raw counter reading.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Ticks elapsed since `earlier`, clamped to [`Duration::ZERO`]
    /// when the readings arrive out of order.
    ///
    /// Idle polling leans on the clamp: a host may re-deliver an old
    /// timestamp after a suspend, and a backwards step must read as
    /// "not yet due" rather than wrap.
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for HostTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs.0)
    }
}
