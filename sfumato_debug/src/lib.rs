// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sinks for the `sfumato_core` trace stream.
//!
//! Everything here sits behind the core `trace` feature: wire a sink
//! into a [`Tracer`](sfumato_core::trace::Tracer) and the frame loop
//! reports what it does. [`pretty::PrettySink`] prints events live,
//! [`recorder::RecorderSink`] captures them as bytes for later, and
//! [`chrome::export`] converts a capture into JSON that
//! `chrome://tracing` and Perfetto open directly.

pub mod chrome;
pub mod pretty;
pub mod recorder;
