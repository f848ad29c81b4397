// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parameter table, slot allocation, and update dispatch for UI effect
//! pipelines.
//!
//! `sfumato_core` provides the host-independent machinery behind
//! per-instance visual effects: a shared byte table that effect instances
//! write parameters into, and a dispatcher that ticks registered
//! callbacks each frame. It is `no_std` compatible (with `alloc`) and
//! owns no threads, clocks, or GPU resources; the host drives everything
//! through explicit entry points.
//!
//! # Architecture
//!
//! One [`EffectContext`](context::EffectContext) ties the pieces together:
//!
//! ```text
//!   Host (frame loop or idle pump)
//!       │  frame(now) / poll(now)
//!       ▼
//!   EffectContext ──► UpdateDispatcher ──► FrameCallback passes
//!       │                 per phase           │ set_channel()
//!       │ flush if dirty                      ▼
//!       └───────────────► ParamTable ──► ParamSurface::upload()
//! ```
//!
//! **[`params`]** — [`ParamTable`](params::ParamTable), a fixed-capacity
//! channels × instances byte matrix with move-only
//! [`ParamSlot`](params::ParamSlot) row handles and a lazy, dirty-gated
//! flush to the host's [`ParamSurface`](params::ParamSurface).
//!
//! **[`slot`]** — The index pool backing the table's row allocation.
//!
//! **[`dispatch`]** — [`UpdateDispatcher`](dispatch::UpdateDispatcher),
//! a slab of registered callbacks with independent `Update`,
//! `LateUpdate`, and `FixedUpdate` membership lists, tail-swap removal,
//! and per-callback fault containment.
//!
//! **[`context`]** — The owning context plus the two drive modes:
//! frame-driven `Active` and throttled `Idle`.
//!
//! **[`time`]** — Host tick timestamps and the tick↔nanosecond timebase.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types
//! for instrumentation, with the zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates the
//!   per-pass retired-callback batch event.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod context;
pub mod dispatch;
pub mod params;
pub mod slot;
pub mod time;
pub mod trace;
