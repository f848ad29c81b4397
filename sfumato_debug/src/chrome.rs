// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome trace export for recorded event streams.
//!
//! [`export`] turns the bytes captured by a
//! [`RecorderSink`](crate::recorder::RecorderSink) into the JSON array
//! flavor of the [Trace Event Format], readable by `chrome://tracing`
//! and [Perfetto]. Tick begin/end pairs become duration spans named
//! after their phase; everything else becomes an instant. Events that
//! carry no host time of their own are stamped with the most recent
//! tick time seen in the stream, so slot traffic and faults line up
//! with the pass they happened in.
//!
//! [Trace Event Format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU
//! [Perfetto]: https://ui.perfetto.dev/

use std::io::{self, Write};

use serde_json::{Value, json};

use sfumato_core::dispatch::Phase;
use sfumato_core::time::Timebase;

use crate::recorder::{RecordedEvent, decode};

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Update => "update",
        Phase::LateUpdate => "late_update",
        Phase::FixedUpdate => "fixed_update",
    }
}

/// One `B` or `E` record bracketing a dispatch pass.
fn span(ph: &str, name: &str, ts_us: f64, args: Value) -> Value {
    json!({
        "ph": ph,
        "name": name,
        "cat": "dispatch",
        "ts": ts_us,
        "pid": 0,
        "tid": 0,
        "args": args,
    })
}

/// One thread-scoped instant record.
fn instant(name: &str, cat: &str, ts_us: f64, args: Value) -> Value {
    json!({
        "ph": "i",
        "s": "t",
        "name": name,
        "cat": cat,
        "ts": ts_us,
        "pid": 0,
        "tid": 0,
        "args": args,
    })
}

/// Writes the recorded stream as a Trace Event Format JSON array.
///
/// Timestamps are converted to fractional microseconds with `timebase`.
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let micros = |ticks: u64| timebase.ticks_to_nanos(ticks) as f64 / 1000.0;
    let mut out: Vec<Value> = Vec::new();
    // Instants without their own timestamp inherit the last tick's.
    let mut cursor_us = 0.0;

    for rec in decode(bytes) {
        out.push(match rec {
            RecordedEvent::SlotAcquire(e) => instant(
                "slot_acquire",
                "params",
                cursor_us,
                json!({ "index": e.index, "free_remaining": e.free_remaining }),
            ),
            RecordedEvent::SlotRelease(e) => instant(
                "slot_release",
                "params",
                cursor_us,
                json!({ "index": e.index, "free_remaining": e.free_remaining }),
            ),
            RecordedEvent::TableFull(e) => instant(
                "table_full",
                "params",
                cursor_us,
                json!({ "capacity": e.capacity }),
            ),
            RecordedEvent::TickBegin(e) => {
                cursor_us = micros(e.now.ticks());
                span(
                    "B",
                    phase_label(e.phase),
                    cursor_us,
                    json!({ "frame_index": e.frame_index, "registered": e.registered }),
                )
            }
            RecordedEvent::TickEnd(e) => {
                cursor_us = micros(e.now.ticks());
                span(
                    "E",
                    phase_label(e.phase),
                    cursor_us,
                    json!({ "frame_index": e.frame_index, "faults": e.faults }),
                )
            }
            RecordedEvent::CallbackFault {
                frame_index,
                phase,
                callback_index,
                callback_generation,
                reason,
            } => instant(
                "callback_fault",
                "dispatch",
                cursor_us,
                json!({
                    "frame_index": frame_index,
                    "phase": phase_label(phase),
                    "callback": format!("{callback_index}@gen{callback_generation}"),
                    "reason": reason,
                }),
            ),
            RecordedEvent::Flush(e) => instant(
                "flush",
                "upload",
                cursor_us,
                json!({ "frame_index": e.frame_index, "bytes": e.bytes }),
            ),
            RecordedEvent::IdleSkip(e) => {
                cursor_us = micros(e.now.ticks());
                instant(
                    "idle_skip",
                    "idle",
                    cursor_us,
                    json!({ "next_due_us": micros(e.next_due.ticks()) }),
                )
            }
            RecordedEvent::CallbacksRetiredCount { frame_index, count } => instant(
                "callbacks_retired",
                "retire",
                cursor_us,
                json!({ "frame_index": frame_index, "count": count }),
            ),
        });
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use sfumato_core::time::HostTime;
    use sfumato_core::trace::{
        FlushEvent, SlotReleaseEvent, TickBeginEvent, TickEndEvent, TraceSink,
    };

    fn record_one_pass() -> RecorderSink {
        let mut rec = RecorderSink::new();
        rec.on_tick_begin(&TickBeginEvent {
            frame_index: 3,
            phase: Phase::LateUpdate,
            now: HostTime(2_000_000),
            registered: 1,
        });
        rec.on_slot_release(&SlotReleaseEvent {
            index: 9,
            free_remaining: 16,
        });
        rec.on_tick_end(&TickEndEvent {
            frame_index: 3,
            phase: Phase::LateUpdate,
            now: HostTime(2_400_000),
            faults: 0,
        });
        rec.on_flush(&FlushEvent {
            frame_index: 3,
            bytes: 128,
        });
        rec
    }

    fn exported(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), Timebase::NANOS, &mut out).unwrap();
        serde_json::from_str(&String::from_utf8(out).unwrap()).unwrap()
    }

    #[test]
    fn passes_become_named_spans() {
        let parsed = exported(&record_one_pass());
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "late_update");
        assert_eq!(parsed[0]["ts"], 2000.0);
        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["name"], "late_update");
        assert_eq!(parsed[2]["ts"], 2400.0);
    }

    #[test]
    fn bare_instants_inherit_the_tick_cursor() {
        let parsed = exported(&record_one_pass());
        // Slot traffic rides at the tick-begin time, the flush at tick-end.
        assert_eq!(parsed[1]["name"], "slot_release");
        assert_eq!(parsed[1]["ts"], 2000.0);
        assert_eq!(parsed[1]["args"]["index"], 9);
        assert_eq!(parsed[3]["name"], "flush");
        assert_eq!(parsed[3]["ts"], 2400.0);
        assert_eq!(parsed[3]["args"]["bytes"], 128);
    }

    #[test]
    fn empty_recording_is_an_empty_array() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[]");
    }
}
