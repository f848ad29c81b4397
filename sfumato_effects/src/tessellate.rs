// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quad subdivision and curve-driven bending.
//!
//! [`Tessellate`] splits each quad of an element's stream into a grid of
//! smaller quads so that per-vertex effects (gradients, displacement)
//! get enough geometry to look smooth. With a [`Bend`] attached it also
//! displaces the subdivided vertices along a scalar curve, which is how
//! ribbon and wave treatments are built.
//!
//! Subdivision density is controlled in element units: a quad whose
//! horizontal edge spans 100 units with `tile_width` 10 splits into ten
//! columns. Corner attributes are bilinearly interpolated, so UVs,
//! colors, and packed parameter coordinates all survive subdivision.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::mesh::{
    ElementContext, MeshModifier, QUAD_STREAM_LEN, VertexStream, Winding, emit_quad,
    quad_from_stream,
};
use crate::vertex::{Vec3, Vertex};

/// A scalar curve sampled by [`Bend`].
///
/// `value(t)` is the curve height at `t`, where `t` spans roughly
/// `0.0..=1.0` across the element (plus whatever [`Bend::offset`]
/// shifts in). Closures implement this automatically.
pub trait BendCurve {
    /// Samples the curve at `t`.
    fn value(&self, t: f32) -> f32;
}

impl<F: Fn(f32) -> f32> BendCurve for F {
    fn value(&self, t: f32) -> f32 {
        self(t)
    }
}

/// Displaces vertices along a curve's tangent.
///
/// For each vertex the curve is sampled at the vertex's normalized
/// horizontal position, the local tangent is estimated by a forward
/// difference, and the position is pushed `multiplier` units along it.
/// A flat curve therefore shifts the whole quad down by `multiplier`,
/// and a rising curve rotates that displacement toward +X.
pub struct Bend {
    /// Displacement distance in element units.
    pub multiplier: f32,
    /// Phase shift applied to the sample position, in `-1.0..=1.0`.
    pub offset: f32,
    curve: Box<dyn BendCurve>,
}

impl Bend {
    /// Step used for the forward-difference tangent estimate.
    const EPS: f32 = 1e-4;

    /// Creates a bend over `curve` with multiplier `10.0` and no offset.
    #[must_use]
    pub fn new(curve: impl BendCurve + 'static) -> Self {
        Self {
            multiplier: 10.0,
            offset: 0.0,
            curve: Box::new(curve),
        }
    }

    /// Displaces one position along the curve tangent at its normalized
    /// horizontal coordinate within a rect of `rect_width` units.
    pub fn displace(&self, position: &mut Vec3, rect_width: f32) {
        let t = position.x / rect_width + 0.5 + self.offset;
        let rise = self.curve.value(t + Self::EPS) - self.curve.value(t);
        // Normalized tangent of the curve at t. len >= EPS, so the
        // division is always defined.
        let len = (Self::EPS * Self::EPS + rise * rise).sqrt();
        let (tx, ty) = (Self::EPS / len, rise / len);
        position.x += ty * self.multiplier;
        position.y += -tx * self.multiplier;
    }
}

impl Debug for Bend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bend")
            .field("multiplier", &self.multiplier)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Grid tessellation pass, optionally bent along a curve.
#[derive(Debug)]
pub struct Tessellate {
    /// Subdivide along the horizontal edge.
    pub horizontal: bool,
    /// Subdivide along the vertical edge.
    pub vertical: bool,
    /// Target column width in element units.
    pub tile_width: f32,
    /// Target row height in element units.
    pub tile_height: f32,
    /// Optional curve displacement applied to the subdivided vertices.
    ///
    /// The bent path subdivides in columns only; rows would be sheared
    /// by the displacement without getting smoother.
    pub bend: Option<Bend>,
}

impl Default for Tessellate {
    fn default() -> Self {
        Self {
            horizontal: true,
            vertical: true,
            tile_width: 10.0,
            tile_height: 10.0,
            bend: None,
        }
    }
}

/// Splits `quad` into an `x_quads` by `y_quads` grid, appending six
/// vertices (two triangles) per cell to `out` in `winding` order.
///
/// Cell corners are bilinearly interpolated from the input corners, so
/// UVs, colors, and packed parameters subdivide along with position.
/// Counts are clamped to at least one cell per axis.
pub fn tessellate_quad(
    quad: &[Vertex; 4],
    x_quads: usize,
    y_quads: usize,
    winding: Winding,
    out: &mut Vec<Vertex>,
) {
    let grid = GridIter {
        quad,
        x_quads: x_quads.max(1),
        y_quads: y_quads.max(1),
        x: 0,
        y: 0,
    };
    for sub in grid {
        emit_quad(&sub, winding, out);
    }
}

/// Number of tiles needed to cover `edge` units, at least one.
#[expect(
    clippy::cast_possible_truncation,
    reason = "edge/tile counts are tiny; saturation on absurd inputs is acceptable"
)]
fn subdivisions(edge: f32, tile: f32) -> usize {
    let count = (edge / tile).ceil() as usize;
    count.max(1)
}

struct GridIter<'a> {
    quad: &'a [Vertex; 4],
    x_quads: usize,
    y_quads: usize,
    x: usize,
    y: usize,
}

impl Iterator for GridIter<'_> {
    type Item = [Vertex; 4];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y == self.y_quads {
            return None;
        }
        let (xq, yq) = (self.x_quads as f32, self.y_quads as f32);
        let (sx, ex) = (self.x as f32 / xq, (self.x + 1) as f32 / xq);
        let (sy, ey) = (self.y as f32 / yq, (self.y + 1) as f32 / yq);
        let q = self.quad;
        let sub = [
            Vertex::bilerp(q[0], q[1], q[2], q[3], sx, sy),
            Vertex::bilerp(q[0], q[1], q[2], q[3], sx, ey),
            Vertex::bilerp(q[0], q[1], q[2], q[3], ex, ey),
            Vertex::bilerp(q[0], q[1], q[2], q[3], ex, sy),
        ];
        self.x += 1;
        if self.x == self.x_quads {
            self.x = 0;
            self.y += 1;
        }
        Some(sub)
    }
}

impl MeshModifier for Tessellate {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "element rects are laid out in f32 range"
    )]
    fn modify_mesh(&self, element: &ElementContext, stream: &mut dyn VertexStream) {
        if !self.horizontal && !self.vertical {
            return;
        }
        let n = stream.len();
        if n == 0 || n % QUAD_STREAM_LEN != 0 {
            // Not a quad stream; leave it alone.
            return;
        }

        let input: Vec<Vertex> = (0..n).map(|i| stream.vertex(i)).collect();
        let winding = Winding::from(element.kind);
        let rect_width = element.rect.width() as f32;
        let mut out = Vec::with_capacity(n);

        for at in (0..n).step_by(QUAD_STREAM_LEN) {
            let quad = quad_from_stream(&input, at, winding);
            let delta_x = quad[2].position - quad[1].position;
            let delta_y = quad[1].position - quad[0].position;
            let x_quads = if self.horizontal {
                subdivisions(delta_x.length(), self.tile_width)
            } else {
                1
            };

            match &self.bend {
                Some(bend) => {
                    // Columns only: one band tall, displaced corner by
                    // corner.
                    for x in 0..x_quads {
                        let sx = x as f32 / x_quads as f32;
                        let ex = (x + 1) as f32 / x_quads as f32;
                        let mut sub = [
                            quad[0].lerp(quad[3], sx),
                            quad[1].lerp(quad[2], sx),
                            quad[1].lerp(quad[2], ex),
                            quad[0].lerp(quad[3], ex),
                        ];
                        for vertex in &mut sub {
                            bend.displace(&mut vertex.position, rect_width);
                        }
                        emit_quad(&sub, winding, &mut out);
                    }
                }
                None => {
                    let y_quads = if self.vertical {
                        subdivisions(delta_y.length(), self.tile_height)
                    } else {
                        1
                    };
                    tessellate_quad(&quad, x_quads, y_quads, winding, &mut out);
                }
            }
        }

        stream.clear();
        stream.extend_triangles(&out);
    }
}
