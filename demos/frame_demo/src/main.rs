// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated host loop that exercises the effect context end to end.
//!
//! Runs 60 synthetic frames through an [`EffectContext`] with registered
//! callbacks, a filter animating the parameter table, and mesh modifiers
//! rebuilding a quad. Events are recorded to both a
//! [`PrettySink`](sfumato_debug::pretty::PrettySink) and a
//! [`RecorderSink`](sfumato_debug::recorder::RecorderSink), then exported as
//! a Chrome trace JSON file.

use std::cell::Cell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::Rect;

use sfumato_core::context::{
    ContextConfig, DEFAULT_IDLE_INTERVAL_NANOS, DriveMode, EffectContext,
};
use sfumato_core::dispatch::{CallbackId, FrameCallback, PhaseSet, TickContext, TickFault};
use sfumato_core::params::ParamSurface;
use sfumato_core::time::{HostTime, Timebase};
use sfumato_core::trace::{
    CallbackFaultEvent, FlushEvent, IdleSkipEvent, SlotAcquireEvent, SlotReleaseEvent,
    TableFullEvent, TickBeginEvent, TickEndEvent, TraceSink, Tracer,
};

use sfumato_effects::filter::{Filter, ToneMode};
use sfumato_effects::gradient::{Direction, Gradient};
use sfumato_effects::mesh::{ElementContext, ElementKind, MeshBuffer, MeshModifier, Winding};
use sfumato_effects::tessellate::Tessellate;
use sfumato_effects::vertex::{Rgba, Vec2, Vec3, Vertex};

use sfumato_debug::pretty::PrettySink;
use sfumato_debug::recorder::RecorderSink;

const FRAME_COUNT: u64 = 60;
/// 16.6ms refresh interval in nanoseconds (≈60 Hz).
const REFRESH_INTERVAL_NS: u64 = 16_666_667;

fn main() {
    let timebase = Timebase::NANOS;

    // -- sinks -------------------------------------------------------------
    let mut sinks = TeeSink {
        pretty: PrettySink::new(std::io::stdout(), timebase),
        recorder: RecorderSink::new(),
    };

    // -- context -----------------------------------------------------------
    // A deliberately tiny table so the demo can fill it.
    let config = ContextConfig {
        channels: 4,
        instances: 2,
        mode: DriveMode::Active,
        timebase,
        idle_interval: None,
    };
    let mut ctx = EffectContext::new(config);
    let mut surface = SoftwareSurface::default();

    // -- effect instances --------------------------------------------------
    let mut filter = Filter::new();
    filter.tone_mode = ToneMode::Sepia;
    attach_reporting(&mut filter, &mut ctx, &mut sinks);

    // A second instance fills the table; the third acquire must fail.
    let mut overlay = Filter::new();
    attach_reporting(&mut overlay, &mut ctx, &mut sinks);
    let mut crowded_out = Filter::new();
    attach_reporting(&mut crowded_out, &mut ctx, &mut sinks);
    detach_reporting(&mut overlay, &mut ctx, &mut sinks);

    // -- mesh rebuild ------------------------------------------------------
    // The filter stamps its table row into the quad once, up front.
    // Per-frame factor changes flow through the table upload instead.
    let element = ElementContext::new(Rect::new(0.0, 0.0, 320.0, 96.0), ElementKind::Graphic);
    let mut mesh = MeshBuffer::new();
    mesh.push_quad(&banner_quad(320.0, 96.0), Winding::Standard);

    let tessellate = Tessellate {
        tile_width: 32.0,
        tile_height: 32.0,
        ..Tessellate::default()
    };
    tessellate.modify_mesh(&element, &mut mesh);

    let gradient = Gradient {
        direction: Direction::Diagonal,
        color1: Rgba::new(0.13, 0.16, 0.27, 1.0),
        color2: Rgba::new(0.62, 0.23, 0.35, 1.0),
        color3: Rgba::new(0.22, 0.42, 0.56, 1.0),
        color4: Rgba::new(0.93, 0.78, 0.45, 1.0),
        ..Gradient::default()
    };
    gradient.modify_mesh(&element, &mut mesh);
    filter.modify_mesh(&element, &mut mesh);

    println!("mesh: {} vertices after tessellation", mesh.vertices().len());

    // -- registrations -----------------------------------------------------
    ctx.dispatcher_mut()
        .register(Box::new(Pulse { filter }), PhaseSet::UPDATE);
    ctx.dispatcher_mut().register(Box::new(Flaky), PhaseSet::UPDATE);

    let one_shot_id = Rc::new(Cell::new(None));
    let id = ctx.dispatcher_mut().register(
        Box::new(OneShot {
            id: Rc::clone(&one_shot_id),
        }),
        PhaseSet::LATE_UPDATE,
    );
    one_shot_id.set(Some(id));

    // -- frame loop --------------------------------------------------------
    let mut now_ticks: u64 = 1_000_000_000; // start at 1s

    for frame in 0..FRAME_COUNT {
        let now = HostTime(now_ticks);
        let mut tracer = Tracer::new(&mut sinks);
        ctx.frame(now, &mut surface, &mut tracer);

        // A fixed pass rides along every fourth frame.
        if frame % 4 == 3 {
            ctx.fixed_step(now, &mut tracer);
        }

        now_ticks += REFRESH_INTERVAL_NS;
    }

    println!(
        "ran {FRAME_COUNT} frames: {} uploads of {} bytes, {} of {} rows free",
        surface.uploads,
        surface.bytes,
        ctx.params().free_instances(),
        ctx.params().max_instances(),
    );

    // -- idle epilogue -----------------------------------------------------
    // A second context in idle mode: polls throttle to the interval.
    let idle_config = ContextConfig {
        mode: DriveMode::Idle,
        ..ContextConfig::standard(timebase)
    };
    let mut idle = EffectContext::new(idle_config);
    let mut tracer = Tracer::new(&mut sinks);
    idle.poll(HostTime(now_ticks), &mut surface, &mut tracer);
    idle.poll(HostTime(now_ticks + 1_000_000), &mut surface, &mut tracer);
    idle.poll(
        HostTime(now_ticks + DEFAULT_IDLE_INTERVAL_NANOS + 1),
        &mut surface,
        &mut tracer,
    );
    drop(tracer);

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    sfumato_debug::chrome::export(sinks.recorder.as_bytes(), timebase, &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({FRAME_COUNT} frames)");
}

/// Builds one banner-sized quad in canonical corner order.
fn banner_quad(w: f32, h: f32) -> [Vertex; 4] {
    let corner = |x: f32, y: f32, u: f32, v: f32| Vertex {
        position: Vec3::new(x, y, 0.0),
        uv0: Vec2::new(u, v),
        color: Rgba::WHITE,
        ..Vertex::default()
    };
    [
        corner(0.0, 0.0, 0.0, 0.0),
        corner(0.0, h, 0.0, 1.0),
        corner(w, h, 1.0, 1.0),
        corner(w, 0.0, 1.0, 0.0),
    ]
}

/// Attaches `filter` and reports the slot event; table exhaustion is
/// reported instead of treated as an error.
fn attach_reporting(filter: &mut Filter, ctx: &mut EffectContext, sinks: &mut TeeSink) {
    match filter.attach(ctx.params_mut()) {
        Ok(()) => sinks.on_slot_acquire(&SlotAcquireEvent {
            index: filter.row_index().unwrap_or(0),
            free_remaining: ctx.params().free_instances(),
        }),
        Err(full) => sinks.on_table_full(&TableFullEvent {
            capacity: full.capacity,
        }),
    }
}

/// Detaches `filter` and reports the slot event.
fn detach_reporting(filter: &mut Filter, ctx: &mut EffectContext, sinks: &mut TeeSink) {
    let Some(index) = filter.row_index() else {
        return;
    };
    filter.detach(ctx.params_mut());
    sinks.on_slot_release(&SlotReleaseEvent {
        index,
        free_remaining: ctx.params().free_instances(),
    });
}

/// Stand-in for a host parameter texture.
#[derive(Default)]
struct SoftwareSurface {
    uploads: usize,
    bytes: usize,
}

impl ParamSurface for SoftwareSurface {
    fn upload(&mut self, data: &[u8]) {
        self.uploads += 1;
        self.bytes = data.len();
    }
}

/// Animates its filter's tone and blur levels with a triangle wave.
struct Pulse {
    filter: Filter,
}

impl FrameCallback for Pulse {
    fn on_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
        let t = (tick.frame_index % 30) as f32 / 30.0;
        let level = if t < 0.5 { t * 2.0 } else { 2.0 - t * 2.0 };
        self.filter.set_tone(tick.params, level);
        self.filter.set_blur(tick.params, level * 0.5);
        Ok(())
    }
}

/// Faults every 30th frame to exercise containment.
struct Flaky;

impl FrameCallback for Flaky {
    fn on_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
        if tick.frame_index % 30 == 15 {
            return Err(TickFault::new("synthetic fault"));
        }
        Ok(())
    }
}

/// Retires itself after its first pass.
struct OneShot {
    id: Rc<Cell<Option<CallbackId>>>,
}

impl FrameCallback for OneShot {
    fn on_late_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
        if let Some(id) = self.id.get() {
            tick.retire(id);
        }
        Ok(())
    }
}

/// Forwards every event to both wrapped sinks.
struct TeeSink {
    pretty: PrettySink<std::io::Stdout>,
    recorder: RecorderSink,
}

impl TraceSink for TeeSink {
    fn on_slot_acquire(&mut self, e: &SlotAcquireEvent) {
        self.pretty.on_slot_acquire(e);
        self.recorder.on_slot_acquire(e);
    }

    fn on_slot_release(&mut self, e: &SlotReleaseEvent) {
        self.pretty.on_slot_release(e);
        self.recorder.on_slot_release(e);
    }

    fn on_table_full(&mut self, e: &TableFullEvent) {
        self.pretty.on_table_full(e);
        self.recorder.on_table_full(e);
    }

    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.pretty.on_tick_begin(e);
        self.recorder.on_tick_begin(e);
    }

    fn on_tick_end(&mut self, e: &TickEndEvent) {
        self.pretty.on_tick_end(e);
        self.recorder.on_tick_end(e);
    }

    fn on_callback_fault(&mut self, e: &CallbackFaultEvent<'_>) {
        self.pretty.on_callback_fault(e);
        self.recorder.on_callback_fault(e);
    }

    fn on_flush(&mut self, e: &FlushEvent) {
        self.pretty.on_flush(e);
        self.recorder.on_flush(e);
    }

    fn on_idle_skip(&mut self, e: &IdleSkipEvent) {
        self.pretty.on_idle_skip(e);
        self.recorder.on_idle_skip(e);
    }

    fn on_callbacks_retired(&mut self, frame_index: u64, retired: &[CallbackId]) {
        self.pretty.on_callbacks_retired(frame_index, retired);
        self.recorder.on_callbacks_retired(frame_index, retired);
    }
}
