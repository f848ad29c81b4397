// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packing normalized values into single floats.
//!
//! Vertex formats give effect passes two spare UV channels, and each
//! channel component is one `f32`. To move more than two values per
//! component across to the shader, normalized inputs are quantized and
//! bit-packed into the 24-bit integer range a 32-bit float represents
//! exactly. The shader reverses the split with floored division.
//!
//! [`pack4`] stores four values at 6 bits each, [`pack2`] stores two at
//! 12 bits each. Inputs are clamped to `0.0..=1.0` so an out-of-range
//! value can never bleed into a neighboring field.

/// Packs four normalized values into one float at 6-bit precision.
#[expect(
    clippy::cast_possible_truncation,
    reason = "quantized fields fit 6 bits after the clamp"
)]
#[must_use]
pub fn pack4(x: f32, y: f32, z: f32, w: f32) -> f32 {
    const PRECISION: u32 = (1 << 6) - 1;
    let q = |v: f32| (v.clamp(0.0, 1.0) * PRECISION as f32) as u32;
    (q(w) << 18 | q(z) << 12 | q(y) << 6 | q(x)) as f32
}

/// Packs two normalized values into one float at 12-bit precision.
#[expect(
    clippy::cast_possible_truncation,
    reason = "quantized fields fit 12 bits after the clamp"
)]
#[must_use]
pub fn pack2(x: f32, y: f32) -> f32 {
    const PRECISION: u32 = (1 << 12) - 1;
    let q = |v: f32| (v.clamp(0.0, 1.0) * PRECISION as f32) as u32;
    (q(y) << 12 | q(x)) as f32
}
