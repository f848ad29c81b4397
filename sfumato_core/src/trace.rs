// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the effect frame loop.
//!
//! This module provides a [`TraceSink`] trait with per-event methods covering
//! slot traffic, tick dispatch, callback faults, and parameter flushes. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates the per-tick retired-callback
//!   batch and the corresponding `TraceSink` method.

use crate::dispatch::{CallbackId, Phase};
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an effect instance acquires a parameter slot.
#[derive(Clone, Copy, Debug)]
pub struct SlotAcquireEvent {
    /// The slot index handed out.
    pub index: u32,
    /// Free slots remaining after the acquire.
    pub free_remaining: usize,
}

/// Emitted when an effect instance releases its parameter slot.
#[derive(Clone, Copy, Debug)]
pub struct SlotReleaseEvent {
    /// The slot index returned.
    pub index: u32,
    /// Free slots remaining after the release.
    pub free_remaining: usize,
}

/// Emitted when a slot acquire fails because the table is exhausted.
#[derive(Clone, Copy, Debug)]
pub struct TableFullEvent {
    /// Total instance capacity of the table.
    pub capacity: u32,
}

/// Emitted before the dispatcher runs one phase of registered callbacks.
#[derive(Clone, Copy, Debug)]
pub struct TickBeginEvent {
    /// Monotonic frame counter of the owning context.
    pub frame_index: u64,
    /// The phase about to run.
    pub phase: Phase,
    /// Host time passed in by the driver.
    pub now: HostTime,
    /// Callbacks registered for this phase at tick start.
    pub registered: usize,
}

/// Emitted after the dispatcher finishes one phase.
#[derive(Clone, Copy, Debug)]
pub struct TickEndEvent {
    /// Monotonic frame counter of the owning context.
    pub frame_index: u64,
    /// The phase that ran.
    pub phase: Phase,
    /// Host time passed in by the driver.
    pub now: HostTime,
    /// Number of callbacks that returned a fault this phase.
    pub faults: u32,
}

/// Emitted when a callback returns a fault during dispatch.
///
/// The fault is contained: the callback's error never unwinds into the
/// dispatch loop, and the remaining callbacks in the phase still run.
#[derive(Clone, Copy, Debug)]
pub struct CallbackFaultEvent<'s> {
    /// Monotonic frame counter of the owning context.
    pub frame_index: u64,
    /// The phase the callback faulted in.
    pub phase: Phase,
    /// Registration id of the faulting callback.
    pub id: CallbackId,
    /// Human-readable fault reason.
    pub reason: &'s str,
}

/// Emitted when dirty parameter bytes are pushed to the host surface.
#[derive(Clone, Copy, Debug)]
pub struct FlushEvent {
    /// Monotonic frame counter of the owning context.
    pub frame_index: u64,
    /// Size of the uploaded parameter block in bytes.
    pub bytes: usize,
}

/// Emitted when an idle-mode poll arrives before the throttle interval
/// has elapsed and is skipped.
#[derive(Clone, Copy, Debug)]
pub struct IdleSkipEvent {
    /// Host time of the rejected poll.
    pub now: HostTime,
    /// Earliest host time at which a poll will fire.
    pub next_due: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink
// ---------------------------------------------------------------------------

/// Receiver for frame-loop diagnostics.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a parameter slot is acquired.
    fn on_slot_acquire(&mut self, e: &SlotAcquireEvent) {
        _ = e;
    }

    /// Called when a parameter slot is released.
    fn on_slot_release(&mut self, e: &SlotReleaseEvent) {
        _ = e;
    }

    /// Called when a slot acquire fails with the table exhausted.
    fn on_table_full(&mut self, e: &TableFullEvent) {
        _ = e;
    }

    /// Called before a dispatch phase runs.
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        _ = e;
    }

    /// Called after a dispatch phase finishes.
    fn on_tick_end(&mut self, e: &TickEndEvent) {
        _ = e;
    }

    /// Called for each callback fault, from inside the dispatch loop.
    fn on_callback_fault(&mut self, e: &CallbackFaultEvent<'_>) {
        _ = e;
    }

    /// Called when dirty parameter data is uploaded.
    fn on_flush(&mut self, e: &FlushEvent) {
        _ = e;
    }

    /// Called when an idle-mode poll is throttled away.
    fn on_idle_skip(&mut self, e: &IdleSkipEvent) {
        _ = e;
    }

    /// Called with the callbacks retired at the end of a phase (requires
    /// the `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_callbacks_retired(&mut self, frame_index: u64, retired: &[CallbackId]) {
        _ = (frame_index, retired);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SlotAcquireEvent`].
    #[inline]
    pub fn slot_acquire(&mut self, e: &SlotAcquireEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slot_acquire(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SlotReleaseEvent`].
    #[inline]
    pub fn slot_release(&mut self, e: &SlotReleaseEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_slot_release(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TableFullEvent`].
    #[inline]
    pub fn table_full(&mut self, e: &TableFullEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_table_full(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TickBeginEvent`].
    #[inline]
    pub fn tick_begin(&mut self, e: &TickBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TickEndEvent`].
    #[inline]
    pub fn tick_end(&mut self, e: &TickEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CallbackFaultEvent`].
    #[inline]
    pub fn callback_fault(&mut self, e: &CallbackFaultEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_callback_fault(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FlushEvent`].
    #[inline]
    pub fn flush(&mut self, e: &FlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`IdleSkipEvent`].
    #[inline]
    pub fn idle_skip(&mut self, e: &IdleSkipEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_idle_skip(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits the retired-callback batch for a finished phase.
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn callbacks_retired(&mut self, frame_index: u64, retired: &[CallbackId]) {
        if let Some(s) = &mut self.sink {
            s.on_callbacks_retired(frame_index, retired);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "trace")]
    struct CountingSink {
        acquires: u32,
        ticks: u32,
        faults: u32,
    }

    #[cfg(feature = "trace")]
    impl TraceSink for CountingSink {
        fn on_slot_acquire(&mut self, _e: &SlotAcquireEvent) {
            self.acquires += 1;
        }

        fn on_tick_begin(&mut self, _e: &TickBeginEvent) {
            self.ticks += 1;
        }

        fn on_callback_fault(&mut self, e: &CallbackFaultEvent<'_>) {
            assert!(!e.reason.is_empty(), "fault events carry a reason");
            self.faults += 1;
        }
    }

    #[test]
    fn noop_sink_accepts_all_events() {
        let mut sink = NoopSink;
        sink.on_slot_acquire(&SlotAcquireEvent {
            index: 3,
            free_remaining: 1020,
        });
        sink.on_table_full(&TableFullEvent { capacity: 1024 });
        sink.on_flush(&FlushEvent {
            frame_index: 0,
            bytes: 4096,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.tick_begin(&TickBeginEvent {
            frame_index: 0,
            phase: Phase::Update,
            now: HostTime(0),
            registered: 0,
        });
        tracer.idle_skip(&IdleSkipEvent {
            now: HostTime(10),
            next_due: HostTime(20),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        let mut sink = CountingSink {
            acquires: 0,
            ticks: 0,
            faults: 0,
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.slot_acquire(&SlotAcquireEvent {
            index: 0,
            free_remaining: 3,
        });
        tracer.tick_begin(&TickBeginEvent {
            frame_index: 7,
            phase: Phase::LateUpdate,
            now: HostTime(100),
            registered: 2,
        });
        tracer.callback_fault(&CallbackFaultEvent {
            frame_index: 7,
            phase: Phase::LateUpdate,
            id: CallbackId {
                idx: 0,
                generation: 0,
            },
            reason: "overdrawn",
        });
        drop(tracer);
        assert_eq!(sink.acquires, 1, "one acquire forwarded");
        assert_eq!(sink.ticks, 1, "one tick forwarded");
        assert_eq!(sink.faults, 1, "one fault forwarded");
    }
}
