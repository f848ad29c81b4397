// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-vertex effect factors carried in `uv1`.
//!
//! The cheap alternative to a parameter-table row: up to eight
//! normalized factors are quantized to 6 bits and packed into the two
//! floats of `uv1`, identical on every vertex of the element. Changing
//! a factor means rebuilding the mesh, so this suits effects whose
//! parameters rarely change; anything animated per frame belongs in a
//! [`Filter`](crate::filter::Filter) row instead.

use crate::mesh::{ElementContext, MeshModifier, VertexStream};
use crate::packing::pack4;
use crate::vertex::Vec2;

/// Factors carried by one [`FactorPack`].
pub const FACTOR_COUNT: usize = 8;

/// Packs eight normalized factors into every vertex's `uv1`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FactorPack {
    factors: [f32; FACTOR_COUNT],
}

impl FactorPack {
    /// Creates a pack with all factors zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pack from eight factors, each clamped to `0.0..=1.0`.
    #[must_use]
    pub fn from_factors(factors: [f32; FACTOR_COUNT]) -> Self {
        Self {
            factors: factors.map(|f| f.clamp(0.0, 1.0)),
        }
    }

    /// Reads a factor.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`FACTOR_COUNT`].
    #[must_use]
    pub fn factor(&self, index: usize) -> f32 {
        self.factors[index]
    }

    /// Sets a factor, clamped to `0.0..=1.0`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`FACTOR_COUNT`].
    pub fn set_factor(&mut self, index: usize, value: f32) {
        assert!(
            index < FACTOR_COUNT,
            "factor index {index} out of range ({FACTOR_COUNT} factors)"
        );
        self.factors[index] = value.clamp(0.0, 1.0);
    }

    /// The two packed floats written to `uv1`, factors 0 to 3 in the
    /// first and 4 to 7 in the second.
    #[must_use]
    pub fn packed(&self) -> (f32, f32) {
        let f = &self.factors;
        (
            pack4(f[0], f[1], f[2], f[3]),
            pack4(f[4], f[5], f[6], f[7]),
        )
    }
}

impl MeshModifier for FactorPack {
    fn modify_mesh(&self, _element: &ElementContext, stream: &mut dyn VertexStream) {
        let (x, y) = self.packed();
        let uv1 = Vec2::new(x, y);
        for i in 0..stream.len() {
            let mut vertex = stream.vertex(i);
            vertex.uv1 = uv1;
            stream.set_vertex(i, vertex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{ElementKind, MeshBuffer};
    use crate::vertex::Vertex;
    use alloc::vec;
    use kurbo::Rect;

    #[test]
    fn factors_land_in_their_fields() {
        let mut pack = FactorPack::new();
        pack.set_factor(0, 1.0);
        pack.set_factor(4, 1.0);

        let (x, y) = pack.packed();
        assert_eq!(x, 63.0, "factor 0 fills the low bits of the first float");
        assert_eq!(y, 63.0, "factor 4 fills the low bits of the second");
    }

    #[test]
    fn setters_clamp() {
        let mut pack = FactorPack::new();
        pack.set_factor(7, 3.0);
        assert_eq!(pack.factor(7), 1.0);

        let from = FactorPack::from_factors([-1.0, 0.5, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(from.factor(0), 0.0);
        assert_eq!(from.factor(1), 0.5);
        assert_eq!(from.factor(2), 1.0);
    }

    #[test]
    fn mesh_pass_stamps_every_vertex() {
        let mut stream = MeshBuffer::from_vertices(vec![Vertex::default(); 7]);
        let pack = FactorPack::from_factors([1.0, 0.0, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let element = ElementContext::new(Rect::new(0.0, 0.0, 4.0, 4.0), ElementKind::Graphic);

        pack.modify_mesh(&element, &mut stream);

        let (x, y) = pack.packed();
        for i in 0..stream.len() {
            assert_eq!(stream.vertex(i).uv1, Vec2::new(x, y), "vertex {i}");
        }
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn factor_index_is_checked() {
        FactorPack::new().set_factor(8, 0.5);
    }
}
