// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The effect context: parameter table plus dispatcher under one driver.
//!
//! An [`EffectContext`] owns one [`ParamTable`] and one
//! [`UpdateDispatcher`] and sequences them. Nothing here is global; a
//! host can run several contexts side by side, and everything a context
//! touches arrives through its constructor or the driver entry points.
//!
//! The host picks one of two drive modes at construction:
//!
//! ```text
//!  Active host                          Idle host
//!  ───────────                          ─────────
//!  every rendered frame:                on any wakeup:
//!    frame(now, surface, tracer)          poll(now, surface, tracer)
//!      Update pass                          throttled to the idle
//!      LateUpdate pass                      interval; when it fires:
//!      flush if dirty                       Update, LateUpdate,
//!    fixed_step(now, tracer) × N            FixedUpdate, flush
//! ```
//!
//! Active mode is for hosts with a real frame loop. Idle mode is for
//! hosts that wake up eagerly but present rarely (an editor viewport, a
//! paused scene); polls are throttled so effect work runs at a low rate
//! no matter how often the host calls in. A poll that fires runs all
//! three phases, so no registration starves while idle.

use crate::dispatch::{Phase, UpdateDispatcher};
use crate::params::{ParamSurface, ParamTable};
use crate::time::{Duration, HostTime, Timebase};
use crate::trace::{FlushEvent, IdleSkipEvent, TickBeginEvent, TickEndEvent, Tracer};

/// Idle polls fire at most once per this interval unless
/// [`ContextConfig::idle_interval`] overrides it (30 Hz).
pub const DEFAULT_IDLE_INTERVAL_NANOS: u64 = 33_333_333;

/// How a context expects to be driven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DriveMode {
    /// The host has a frame loop and calls
    /// [`frame`](EffectContext::frame) every rendered frame.
    #[default]
    Active,
    /// The host calls [`poll`](EffectContext::poll) opportunistically
    /// and the context throttles itself.
    Idle,
}

/// Construction parameters for an [`EffectContext`].
#[derive(Clone, Copy, Debug)]
pub struct ContextConfig {
    /// Requested parameter channels per effect instance (rounded up to
    /// a multiple of 4 by the table).
    pub channels: u32,
    /// Requested concurrent effect instances (rounded up to even).
    pub instances: u32,
    /// How the host will drive this context.
    pub mode: DriveMode,
    /// Tick-to-nanosecond conversion for the host's clock.
    pub timebase: Timebase,
    /// Idle throttle interval in host ticks; `None` selects the 30 Hz
    /// default. Ignored in [`DriveMode::Active`].
    pub idle_interval: Option<Duration>,
}

impl ContextConfig {
    /// The standard table shape: 4 channels, 1024 instances.
    pub const STANDARD_CHANNELS: u32 = 4;
    /// See [`STANDARD_CHANNELS`](Self::STANDARD_CHANNELS).
    pub const STANDARD_INSTANCES: u32 = 1024;

    /// An active-mode config with the standard table shape.
    #[must_use]
    pub const fn standard(timebase: Timebase) -> Self {
        Self {
            channels: Self::STANDARD_CHANNELS,
            instances: Self::STANDARD_INSTANCES,
            mode: DriveMode::Active,
            timebase,
            idle_interval: None,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::standard(Timebase::NANOS)
    }
}

/// Owns the parameter table and dispatcher and drives them per frame.
#[derive(Debug)]
pub struct EffectContext {
    dispatcher: UpdateDispatcher,
    params: ParamTable,
    mode: DriveMode,
    timebase: Timebase,
    idle_interval: Duration,
    last_idle_fire: Option<HostTime>,
    frame_index: u64,
}

impl EffectContext {
    /// Creates a context from the given configuration.
    #[must_use]
    pub fn new(config: ContextConfig) -> Self {
        let idle_interval = match config.idle_interval {
            Some(interval) => interval,
            None => Duration::from_nanos(DEFAULT_IDLE_INTERVAL_NANOS, config.timebase),
        };
        Self {
            dispatcher: UpdateDispatcher::new(),
            params: ParamTable::new(config.channels, config.instances),
            mode: config.mode,
            timebase: config.timebase,
            idle_interval,
            last_idle_fire: None,
            frame_index: 0,
        }
    }

    /// The shared parameter table.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    /// Mutable access to the parameter table, for slot management and
    /// writes outside the tick cycle.
    #[inline]
    pub fn params_mut(&mut self) -> &mut ParamTable {
        &mut self.params
    }

    /// The callback dispatcher.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &UpdateDispatcher {
        &self.dispatcher
    }

    /// Mutable access to the dispatcher, for registration outside the
    /// tick cycle.
    #[inline]
    pub fn dispatcher_mut(&mut self) -> &mut UpdateDispatcher {
        &mut self.dispatcher
    }

    /// The drive mode fixed at construction.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> DriveMode {
        self.mode
    }

    /// The host timebase fixed at construction.
    #[inline]
    #[must_use]
    pub const fn timebase(&self) -> Timebase {
        self.timebase
    }

    /// The effective idle throttle interval.
    #[inline]
    #[must_use]
    pub const fn idle_interval(&self) -> Duration {
        self.idle_interval
    }

    /// Number of completed frame (or fired poll) passes.
    #[inline]
    #[must_use]
    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Runs one active-mode frame: the `Update` pass, the `LateUpdate`
    /// pass, then a flush of dirty parameters to `surface`.
    ///
    /// Returns `false` without doing anything if the context was built
    /// for [`DriveMode::Idle`].
    pub fn frame(
        &mut self,
        now: HostTime,
        surface: &mut dyn ParamSurface,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.mode != DriveMode::Active {
            return false;
        }
        self.run_phase(Phase::Update, now, tracer);
        self.run_phase(Phase::LateUpdate, now, tracer);
        self.flush(surface, tracer);
        self.frame_index += 1;
        true
    }

    /// Runs one `FixedUpdate` pass.
    ///
    /// Active-mode hosts call this zero or more times per frame from
    /// their fixed-timestep loop. Returns `false` in idle mode, where
    /// fixed passes ride along with [`poll`](Self::poll) instead.
    pub fn fixed_step(&mut self, now: HostTime, tracer: &mut Tracer<'_>) -> bool {
        if self.mode != DriveMode::Active {
            return false;
        }
        self.run_phase(Phase::FixedUpdate, now, tracer);
        true
    }

    /// Offers the context a chance to run while idle.
    ///
    /// Fires at most once per idle interval: a poll that arrives early
    /// is skipped (reported via [`IdleSkipEvent`]) and returns `false`.
    /// A poll that fires runs all three phases and a flush, then
    /// returns `true`.
    ///
    /// Also returns `false` if the context was built for
    /// [`DriveMode::Active`].
    pub fn poll(
        &mut self,
        now: HostTime,
        surface: &mut dyn ParamSurface,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.mode != DriveMode::Idle {
            return false;
        }
        if let Some(last) = self.last_idle_fire {
            if now.saturating_duration_since(last) < self.idle_interval {
                tracer.idle_skip(&IdleSkipEvent {
                    now,
                    next_due: last + self.idle_interval,
                });
                return false;
            }
        }
        self.last_idle_fire = Some(now);
        self.run_phase(Phase::Update, now, tracer);
        self.run_phase(Phase::LateUpdate, now, tracer);
        self.run_phase(Phase::FixedUpdate, now, tracer);
        self.flush(surface, tracer);
        self.frame_index += 1;
        true
    }

    fn run_phase(&mut self, phase: Phase, now: HostTime, tracer: &mut Tracer<'_>) {
        tracer.tick_begin(&TickBeginEvent {
            frame_index: self.frame_index,
            phase,
            now,
            registered: self.dispatcher.phase_len(phase),
        });
        let faults = self
            .dispatcher
            .run_phase(phase, self.frame_index, now, &mut self.params, tracer);
        tracer.tick_end(&TickEndEvent {
            frame_index: self.frame_index,
            phase,
            now,
            faults,
        });
    }

    fn flush(&mut self, surface: &mut dyn ParamSurface, tracer: &mut Tracer<'_>) {
        if self.params.flush(surface) {
            tracer.flush(&FlushEvent {
                frame_index: self.frame_index,
                bytes: self.params.byte_len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{FrameCallback, PhaseSet, TickContext, TickFault};
    use crate::params::ParamSlot;
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[derive(Default)]
    struct CountingSurface {
        uploads: usize,
    }

    impl ParamSurface for CountingSurface {
        fn upload(&mut self, _data: &[u8]) {
            self.uploads += 1;
        }
    }

    struct PhaseRecorder {
        seen: Rc<RefCell<Vec<Phase>>>,
    }

    impl FrameCallback for PhaseRecorder {
        fn on_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
            self.seen.borrow_mut().push(tick.phase);
            Ok(())
        }

        fn on_late_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
            self.seen.borrow_mut().push(tick.phase);
            Ok(())
        }

        fn on_fixed_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
            self.seen.borrow_mut().push(tick.phase);
            Ok(())
        }
    }

    struct Writer {
        slot: ParamSlot,
    }

    impl FrameCallback for Writer {
        fn on_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
            tick.params.set_channel(&self.slot, 0, 1);
            Ok(())
        }
    }

    fn small_config(mode: DriveMode) -> ContextConfig {
        ContextConfig {
            channels: 4,
            instances: 4,
            mode,
            timebase: Timebase::NANOS,
            idle_interval: Some(Duration(100)),
        }
    }

    #[test]
    fn frame_runs_update_then_late_then_flush() {
        let mut ctx = EffectContext::new(small_config(DriveMode::Active));
        let mut surface = CountingSurface::default();

        let seen = Rc::new(RefCell::new(Vec::new()));
        ctx.dispatcher_mut()
            .register(Box::new(PhaseRecorder { seen: seen.clone() }), PhaseSet::ALL);

        let mut slot = ParamSlot::unowned();
        ctx.params_mut().acquire(&mut slot).unwrap();
        ctx.dispatcher_mut()
            .register(Box::new(Writer { slot }), PhaseSet::UPDATE);

        assert!(ctx.frame(HostTime(0), &mut surface, &mut Tracer::none()));
        assert_eq!(
            *seen.borrow(),
            [Phase::Update, Phase::LateUpdate],
            "fixed pass does not ride along with frame()"
        );
        assert_eq!(surface.uploads, 1, "dirty writes flushed once");
        assert_eq!(ctx.frame_index(), 1);

        assert!(ctx.frame(HostTime(16), &mut surface, &mut Tracer::none()));
        assert_eq!(surface.uploads, 2, "writer dirties every update");
        assert_eq!(ctx.frame_index(), 2);
    }

    #[test]
    fn fixed_step_repeats_between_frames() {
        let mut ctx = EffectContext::new(small_config(DriveMode::Active));
        let seen = Rc::new(RefCell::new(Vec::new()));
        ctx.dispatcher_mut().register(
            Box::new(PhaseRecorder { seen: seen.clone() }),
            PhaseSet::FIXED_UPDATE,
        );

        assert!(ctx.fixed_step(HostTime(0), &mut Tracer::none()));
        assert!(ctx.fixed_step(HostTime(8), &mut Tracer::none()));
        assert_eq!(
            *seen.borrow(),
            [Phase::FixedUpdate, Phase::FixedUpdate],
            "one record per fixed step"
        );
        assert_eq!(ctx.frame_index(), 0, "fixed steps do not advance the frame");
    }

    #[test]
    fn wrong_mode_entry_points_are_rejected() {
        let mut surface = CountingSurface::default();

        let mut active = EffectContext::new(small_config(DriveMode::Active));
        assert!(!active.poll(HostTime(0), &mut surface, &mut Tracer::none()));

        let mut idle = EffectContext::new(small_config(DriveMode::Idle));
        assert!(!idle.frame(HostTime(0), &mut surface, &mut Tracer::none()));
        assert!(!idle.fixed_step(HostTime(0), &mut Tracer::none()));
        assert_eq!(surface.uploads, 0, "rejected entries do nothing");
    }

    #[test]
    fn idle_polls_throttle_to_the_interval() {
        let mut ctx = EffectContext::new(small_config(DriveMode::Idle));
        let mut surface = CountingSurface::default();
        let mut tracer = Tracer::none();

        assert!(ctx.poll(HostTime(0), &mut surface, &mut tracer), "first poll fires");
        assert!(!ctx.poll(HostTime(50), &mut surface, &mut tracer));
        assert!(!ctx.poll(HostTime(99), &mut surface, &mut tracer));
        assert!(ctx.poll(HostTime(100), &mut surface, &mut tracer), "interval elapsed");
        assert!(!ctx.poll(HostTime(150), &mut surface, &mut tracer));
        assert!(ctx.poll(HostTime(250), &mut surface, &mut tracer));
        assert_eq!(ctx.frame_index(), 3, "only fired polls advance the frame");
    }

    #[test]
    fn fired_poll_runs_all_three_phases() {
        let mut ctx = EffectContext::new(small_config(DriveMode::Idle));
        let mut surface = CountingSurface::default();

        let seen = Rc::new(RefCell::new(Vec::new()));
        ctx.dispatcher_mut()
            .register(Box::new(PhaseRecorder { seen: seen.clone() }), PhaseSet::ALL);
        let mut slot = ParamSlot::unowned();
        ctx.params_mut().acquire(&mut slot).unwrap();
        ctx.dispatcher_mut()
            .register(Box::new(Writer { slot }), PhaseSet::UPDATE);

        assert!(ctx.poll(HostTime(0), &mut surface, &mut Tracer::none()));
        assert_eq!(
            *seen.borrow(),
            [Phase::Update, Phase::LateUpdate, Phase::FixedUpdate],
            "idle passes cover every membership"
        );
        assert_eq!(surface.uploads, 1, "fired poll flushes dirty parameters");
    }

    #[test]
    fn default_idle_interval_is_thirty_hz() {
        let config = ContextConfig {
            idle_interval: None,
            mode: DriveMode::Idle,
            ..ContextConfig::standard(Timebase::NANOS)
        };
        let ctx = EffectContext::new(config);
        assert_eq!(ctx.idle_interval(), Duration(DEFAULT_IDLE_INTERVAL_NANOS));
    }

    #[cfg(feature = "trace")]
    #[test]
    fn throttled_poll_reports_the_skip() {
        use crate::trace::TraceSink;

        #[derive(Default)]
        struct SkipSink {
            skips: Vec<(u64, u64)>,
        }

        impl TraceSink for SkipSink {
            fn on_idle_skip(&mut self, e: &IdleSkipEvent) {
                self.skips.push((e.now.ticks(), e.next_due.ticks()));
            }
        }

        let mut ctx = EffectContext::new(small_config(DriveMode::Idle));
        let mut surface = CountingSurface::default();
        let mut sink = SkipSink::default();

        let mut tracer = Tracer::new(&mut sink);
        assert!(ctx.poll(HostTime(10), &mut surface, &mut tracer));
        assert!(!ctx.poll(HostTime(40), &mut surface, &mut tracer));
        drop(tracer);

        assert_eq!(sink.skips, [(40, 110)], "skip names the next due time");
    }
}
