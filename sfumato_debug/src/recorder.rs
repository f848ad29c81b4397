// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. [`decode`] reads them back as an
//! iterator of [`RecordedEvent`].
//!
//! The rich retired-callback batch
//! ([`on_callbacks_retired`](TraceSink::on_callbacks_retired)) stores only
//! the count.

use sfumato_core::dispatch::{CallbackId, Phase};
use sfumato_core::time::HostTime;
use sfumato_core::trace::{
    CallbackFaultEvent, FlushEvent, IdleSkipEvent, SlotAcquireEvent, SlotReleaseEvent,
    TableFullEvent, TickBeginEvent, TickEndEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_SLOT_ACQUIRE: u8 = 1;
const TAG_SLOT_RELEASE: u8 = 2;
const TAG_TABLE_FULL: u8 = 3;
const TAG_TICK_BEGIN: u8 = 4;
const TAG_TICK_END: u8 = 5;
const TAG_CALLBACK_FAULT: u8 = 6;
const TAG_FLUSH: u8 = 7;
const TAG_IDLE_SKIP: u8 = 8;
const TAG_RETIRED_COUNT: u8 = 9;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "lengths are capped at u32::MAX for recording"
    )]
    fn write_len(&mut self, v: usize) {
        self.write_u32(v.min(u32::MAX as usize) as u32);
    }

    fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let len = bytes.len().min(u32::MAX as usize);
        self.write_len(len);
        self.buf.extend_from_slice(&bytes[..len]);
    }

    fn write_phase(&mut self, p: Phase) {
        self.write_u8(match p {
            Phase::Update => 0,
            Phase::LateUpdate => 1,
            Phase::FixedUpdate => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_slot_acquire(&mut self, e: &SlotAcquireEvent) {
        self.write_u8(TAG_SLOT_ACQUIRE);
        self.write_u32(e.index);
        self.write_len(e.free_remaining);
    }

    fn on_slot_release(&mut self, e: &SlotReleaseEvent) {
        self.write_u8(TAG_SLOT_RELEASE);
        self.write_u32(e.index);
        self.write_len(e.free_remaining);
    }

    fn on_table_full(&mut self, e: &TableFullEvent) {
        self.write_u8(TAG_TABLE_FULL);
        self.write_u32(e.capacity);
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.write_u8(TAG_TICK_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.now.ticks());
        self.write_len(e.registered);
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        self.write_u8(TAG_TICK_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u64(e.now.ticks());
        self.write_u32(e.faults);
    }

    fn on_callback_fault(&mut self, e: &CallbackFaultEvent<'_>) {
        self.write_u8(TAG_CALLBACK_FAULT);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u32(e.id.index());
        self.write_u32(e.id.generation());
        self.write_str(e.reason);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.write_u8(TAG_FLUSH);
        self.write_u64(e.frame_index);
        self.write_len(e.bytes);
    }

    fn on_idle_skip(&mut self, e: &IdleSkipEvent) {
        self.write_u8(TAG_IDLE_SKIP);
        self.write_u64(e.now.ticks());
        self.write_u64(e.next_due.ticks());
    }

    fn on_callbacks_retired(&mut self, frame_index: u64, retired: &[CallbackId]) {
        self.write_u8(TAG_RETIRED_COUNT);
        self.write_u64(frame_index);
        self.write_len(retired.len());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`SlotAcquireEvent`].
    SlotAcquire(SlotAcquireEvent),
    /// A [`SlotReleaseEvent`].
    SlotRelease(SlotReleaseEvent),
    /// A [`TableFullEvent`].
    TableFull(TableFullEvent),
    /// A [`TickBeginEvent`].
    TickBegin(TickBeginEvent),
    /// A [`TickEndEvent`].
    TickEnd(TickEndEvent),
    /// A callback fault, with the reason copied out of the borrowed event.
    ///
    /// The id is stored as its raw index and generation; handles cannot be
    /// forged outside the dispatcher.
    CallbackFault {
        /// Frame counter.
        frame_index: u64,
        /// Phase the callback faulted in.
        phase: Phase,
        /// Slab index of the faulting callback.
        callback_index: u32,
        /// Generation counter of the faulting callback.
        callback_generation: u32,
        /// Human-readable fault reason.
        reason: String,
    },
    /// A [`FlushEvent`].
    Flush(FlushEvent),
    /// An [`IdleSkipEvent`].
    IdleSkip(IdleSkipEvent),
    /// Retired-callback count for a phase.
    CallbacksRetiredCount {
        /// Frame counter.
        frame_index: u64,
        /// Number of callbacks retired.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_str(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        if self.remaining() < len {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn read_phase(&mut self) -> Option<Phase> {
        Some(match self.read_u8()? {
            0 => Phase::Update,
            1 => Phase::LateUpdate,
            _ => Phase::FixedUpdate,
        })
    }

    fn decode_slot_acquire(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SlotAcquire(SlotAcquireEvent {
            index: self.read_u32()?,
            free_remaining: self.read_u32()? as usize,
        }))
    }

    fn decode_slot_release(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SlotRelease(SlotReleaseEvent {
            index: self.read_u32()?,
            free_remaining: self.read_u32()? as usize,
        }))
    }

    fn decode_table_full(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TableFull(TableFullEvent {
            capacity: self.read_u32()?,
        }))
    }

    fn decode_tick_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickBegin(TickBeginEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            now: HostTime(self.read_u64()?),
            registered: self.read_u32()? as usize,
        }))
    }

    fn decode_tick_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickEnd(TickEndEvent {
            frame_index: self.read_u64()?,
            phase: self.read_phase()?,
            now: HostTime(self.read_u64()?),
            faults: self.read_u32()?,
        }))
    }

    fn decode_callback_fault(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let phase = self.read_phase()?;
        let callback_index = self.read_u32()?;
        let callback_generation = self.read_u32()?;
        let reason = self.read_str()?;
        Some(RecordedEvent::CallbackFault {
            frame_index,
            phase,
            callback_index,
            callback_generation,
            reason,
        })
    }

    fn decode_flush(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Flush(FlushEvent {
            frame_index: self.read_u64()?,
            bytes: self.read_u32()? as usize,
        }))
    }

    fn decode_idle_skip(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::IdleSkip(IdleSkipEvent {
            now: HostTime(self.read_u64()?),
            next_due: HostTime(self.read_u64()?),
        }))
    }

    fn decode_retired_count(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::CallbacksRetiredCount { frame_index, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_SLOT_ACQUIRE => self.decode_slot_acquire(),
            TAG_SLOT_RELEASE => self.decode_slot_release(),
            TAG_TABLE_FULL => self.decode_table_full(),
            TAG_TICK_BEGIN => self.decode_tick_begin(),
            TAG_TICK_END => self.decode_tick_end(),
            TAG_CALLBACK_FAULT => self.decode_callback_fault(),
            TAG_FLUSH => self.decode_flush(),
            TAG_IDLE_SKIP => self.decode_idle_skip(),
            TAG_RETIRED_COUNT => self.decode_retired_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sfumato_core::dispatch::{FrameCallback, PhaseSet, UpdateDispatcher};

    struct Idle;

    impl FrameCallback for Idle {}

    fn sample_id() -> CallbackId {
        let mut dispatcher = UpdateDispatcher::new();
        dispatcher.register(Box::new(Idle), PhaseSet::UPDATE)
    }

    fn sample_tick_begin() -> TickBeginEvent {
        TickBeginEvent {
            frame_index: 7,
            phase: Phase::Update,
            now: HostTime(1_000_000),
            registered: 5,
        }
    }

    fn sample_tick_end() -> TickEndEvent {
        TickEndEvent {
            frame_index: 7,
            phase: Phase::Update,
            now: HostTime(1_000_400),
            faults: 1,
        }
    }

    #[test]
    fn round_trip_slot_events() {
        let mut rec = RecorderSink::new();
        rec.on_slot_acquire(&SlotAcquireEvent {
            index: 3,
            free_remaining: 1020,
        });
        rec.on_slot_release(&SlotReleaseEvent {
            index: 3,
            free_remaining: 1021,
        });
        rec.on_table_full(&TableFullEvent { capacity: 1024 });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 3);
        match &events[0] {
            RecordedEvent::SlotAcquire(e) => {
                assert_eq!(e.index, 3);
                assert_eq!(e.free_remaining, 1020);
            }
            other => panic!("expected SlotAcquire, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::SlotRelease(e) => {
                assert_eq!(e.index, 3);
                assert_eq!(e.free_remaining, 1021);
            }
            other => panic!("expected SlotRelease, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::TableFull(e) => assert_eq!(e.capacity, 1024),
            other => panic!("expected TableFull, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_tick_events() {
        let mut rec = RecorderSink::new();
        let begin = sample_tick_begin();
        let end = sample_tick_end();
        rec.on_tick_begin(&begin);
        rec.on_tick_end(&end);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::TickBegin(e) => {
                assert_eq!(e.frame_index, begin.frame_index);
                assert_eq!(e.phase, begin.phase);
                assert_eq!(e.now, begin.now);
                assert_eq!(e.registered, begin.registered);
            }
            other => panic!("expected TickBegin, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::TickEnd(e) => {
                assert_eq!(e.frame_index, end.frame_index);
                assert_eq!(e.phase, end.phase);
                assert_eq!(e.now, end.now);
                assert_eq!(e.faults, end.faults);
            }
            other => panic!("expected TickEnd, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_callback_fault() {
        let mut rec = RecorderSink::new();
        let id = sample_id();
        rec.on_callback_fault(&CallbackFaultEvent {
            frame_index: 12,
            phase: Phase::FixedUpdate,
            id,
            reason: "texture lost",
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::CallbackFault {
                frame_index,
                phase,
                callback_index,
                callback_generation,
                reason,
            } => {
                assert_eq!(*frame_index, 12);
                assert_eq!(*phase, Phase::FixedUpdate);
                assert_eq!(*callback_index, id.index());
                assert_eq!(*callback_generation, id.generation());
                assert_eq!(reason, "texture lost");
            }
            other => panic!("expected CallbackFault, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_flush_and_idle() {
        let mut rec = RecorderSink::new();
        rec.on_flush(&FlushEvent {
            frame_index: 30,
            bytes: 4096,
        });
        rec.on_idle_skip(&IdleSkipEvent {
            now: HostTime(5000),
            next_due: HostTime(8000),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::Flush(e) => {
                assert_eq!(e.frame_index, 30);
                assert_eq!(e.bytes, 4096);
            }
            other => panic!("expected Flush, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::IdleSkip(e) => {
                assert_eq!(e.now, HostTime(5000));
                assert_eq!(e.next_due, HostTime(8000));
            }
            other => panic!("expected IdleSkip, got {other:?}"),
        }
    }

    #[test]
    fn retired_count() {
        let mut dispatcher = UpdateDispatcher::new();
        let a = dispatcher.register(Box::new(Idle), PhaseSet::UPDATE);
        let b = dispatcher.register(Box::new(Idle), PhaseSet::UPDATE);

        let mut rec = RecorderSink::new();
        rec.on_callbacks_retired(42, &[a, b]);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::CallbacksRetiredCount { frame_index, count } => {
                assert_eq!(*frame_index, 42);
                assert_eq!(*count, 2);
            }
            other => panic!("expected CallbacksRetiredCount, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_multiple_events() {
        let mut rec = RecorderSink::new();
        rec.on_slot_acquire(&SlotAcquireEvent {
            index: 0,
            free_remaining: 7,
        });
        rec.on_tick_begin(&sample_tick_begin());
        rec.on_tick_end(&sample_tick_end());
        rec.on_flush(&FlushEvent {
            frame_index: 7,
            bytes: 64,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::SlotAcquire(_)));
        assert!(matches!(events[1], RecordedEvent::TickBegin(_)));
        assert!(matches!(events[2], RecordedEvent::TickEnd(_)));
        assert!(matches!(events[3], RecordedEvent::Flush(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
