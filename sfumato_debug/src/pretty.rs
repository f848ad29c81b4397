// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One-line-per-event text output.
//!
//! [`PrettySink`] is the development companion to the binary
//! [`RecorderSink`](crate::recorder::RecorderSink): instead of bytes it
//! emits grep-friendly lines like `[tick:begin] frame=12 update at
//! 1666.7µs registered=3` while the app runs. Host timestamps are
//! rendered as fractional microseconds through the supplied
//! [`Timebase`].

use std::io::Write;

use sfumato_core::dispatch::{CallbackId, Phase};
use sfumato_core::time::{HostTime, Timebase};
use sfumato_core::trace::{
    CallbackFaultEvent, FlushEvent, IdleSkipEvent, SlotAcquireEvent, SlotReleaseEvent,
    TableFullEvent, TickBeginEvent, TickEndEvent, TraceSink,
};

/// A [`TraceSink`] that writes one formatted line per event.
///
/// Write errors are swallowed; a tracing aid must never take the frame
/// loop down with it.
pub struct PrettySink<W: Write> {
    writer: W,
    timebase: Timebase,
}

impl PrettySink<std::io::Stderr> {
    /// A sink on standard error, the usual destination during bring-up.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self::new(std::io::stderr(), timebase)
    }
}

impl<W: Write> PrettySink<W> {
    /// Wraps `writer`, rendering timestamps through `timebase`.
    #[must_use]
    pub fn new(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    fn stamp(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
    }
}

impl<W: Write> std::fmt::Debug for PrettySink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettySink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Update => "update",
        Phase::LateUpdate => "late",
        Phase::FixedUpdate => "fixed",
    }
}

impl<W: Write> TraceSink for PrettySink<W> {
    fn on_slot_acquire(&mut self, e: &SlotAcquireEvent) {
        let _ = writeln!(
            self.writer,
            "[slot:acquire] index={} free={}",
            e.index, e.free_remaining,
        );
    }

    fn on_slot_release(&mut self, e: &SlotReleaseEvent) {
        let _ = writeln!(
            self.writer,
            "[slot:release] index={} free={}",
            e.index, e.free_remaining,
        );
    }

    fn on_table_full(&mut self, e: &TableFullEvent) {
        let _ = writeln!(self.writer, "[slot:FULL] capacity={}", e.capacity);
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[tick:begin] frame={} {} at {:.1}µs registered={}",
            e.frame_index,
            phase_name(e.phase),
            self.stamp(e.now),
            e.registered,
        );
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        let _ = writeln!(
            self.writer,
            "[tick:end] frame={} {} at {:.1}µs faults={}",
            e.frame_index,
            phase_name(e.phase),
            self.stamp(e.now),
            e.faults,
        );
    }

    fn on_callback_fault(&mut self, e: &CallbackFaultEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[fault] frame={} {} id={}@gen{} reason={}",
            e.frame_index,
            phase_name(e.phase),
            e.id.index(),
            e.id.generation(),
            e.reason,
        );
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] frame={} bytes={}",
            e.frame_index, e.bytes,
        );
    }

    fn on_idle_skip(&mut self, e: &IdleSkipEvent) {
        let _ = writeln!(
            self.writer,
            "[idle:skip] now={:.1}µs due={:.1}µs",
            self.stamp(e.now),
            self.stamp(e.next_due),
        );
    }

    fn on_callbacks_retired(&mut self, frame_index: u64, retired: &[CallbackId]) {
        let _ = writeln!(
            self.writer,
            "[retired] frame={frame_index} count={}",
            retired.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfumato_core::dispatch::{FrameCallback, PhaseSet, UpdateDispatcher};

    fn capture() -> PrettySink<Vec<u8>> {
        PrettySink::new(Vec::new(), Timebase::NANOS)
    }

    fn lines(sink: PrettySink<Vec<u8>>) -> String {
        String::from_utf8(sink.writer).unwrap()
    }

    #[test]
    fn tick_lines_carry_phase_and_stamp() {
        let mut sink = capture();
        sink.on_tick_begin(&TickBeginEvent {
            frame_index: 12,
            phase: Phase::FixedUpdate,
            now: HostTime(1_666_700),
            registered: 4,
        });
        let out = lines(sink);
        assert!(out.contains("[tick:begin]"), "got: {out}");
        assert!(out.contains("frame=12 fixed at 1666.7µs"), "got: {out}");
        assert!(out.contains("registered=4"), "got: {out}");
    }

    #[test]
    fn fault_lines_name_the_callback() {
        struct Inert;
        impl FrameCallback for Inert {}

        let mut dispatcher = UpdateDispatcher::new();
        let id = dispatcher.register(Box::new(Inert), PhaseSet::UPDATE);

        let mut sink = capture();
        sink.on_callback_fault(&CallbackFaultEvent {
            frame_index: 9,
            phase: Phase::LateUpdate,
            id,
            reason: "texture lost",
        });
        sink.on_table_full(&TableFullEvent { capacity: 1024 });
        let out = lines(sink);
        assert!(out.contains("[fault]"), "got: {out}");
        assert!(out.contains("id=0@gen0"), "got: {out}");
        assert!(out.contains("reason=texture lost"), "got: {out}");
        assert!(out.contains("[slot:FULL]"), "got: {out}");
    }
}
