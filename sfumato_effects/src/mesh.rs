// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element context, vertex streams, and quad encoding.
//!
//! Effect passes see an element's geometry as a flat triangle stream:
//! six vertices per quad, two triangles. Text and non-text elements
//! arrive wound differently, and [`Winding`] captures that difference so
//! passes that rebuild geometry can take quads apart and emit them back
//! without disturbing either kind:
//!
//! ```text
//!   Standard (graphics)            Mirrored (text)
//!   stream [BL TL TR · BR ·]       stream [TL TR BR · BL ·]
//!   corners at  +0 +1 +2 +4        corners at  +0 +4 +2 +1
//!   emit (0,1,2)(2,3,0)            emit (0,3,2)(2,1,0)
//! ```
//!
//! For both kinds, extracting a quad with [`quad_from_stream`] and
//! re-emitting it with [`emit_quad`] reproduces the original six
//! vertices exactly.

use alloc::vec::Vec;
use kurbo::Rect;

use crate::vertex::Vertex;

/// Vertices per encoded quad in a triangle stream.
pub const QUAD_STREAM_LEN: usize = 6;

/// What kind of element a mesh pass is operating on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Images, shapes, and other non-text graphics.
    #[default]
    Graphic,
    /// Glyph quads from a text generator.
    Text,
}

/// Per-element state a mesh pass needs besides the vertices.
#[derive(Clone, Copy, Debug)]
pub struct ElementContext {
    /// The element's layout rectangle in its local space.
    pub rect: Rect,
    /// Element kind, which decides the quad winding.
    pub kind: ElementKind,
}

impl ElementContext {
    /// Creates a context for an element.
    #[inline]
    #[must_use]
    pub const fn new(rect: Rect, kind: ElementKind) -> Self {
        Self { rect, kind }
    }

    /// Returns `true` for text elements.
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == ElementKind::Text
    }
}

/// How quads are wound in an element's triangle stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Winding {
    /// Non-text elements: corners at stream offsets `+0, +1, +2, +4`.
    Standard,
    /// Text elements: corners at stream offsets `+0, +4, +2, +1`.
    Mirrored,
}

impl From<ElementKind> for Winding {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Graphic => Self::Standard,
            ElementKind::Text => Self::Mirrored,
        }
    }
}

/// Extracts the four corners of the quad encoded at `at` in a triangle
/// stream, in the crate's canonical corner order.
///
/// # Panics
///
/// Panics if the stream holds fewer than [`QUAD_STREAM_LEN`] vertices
/// past `at`.
#[must_use]
pub fn quad_from_stream(stream: &[Vertex], at: usize, winding: Winding) -> [Vertex; 4] {
    match winding {
        Winding::Standard => [stream[at], stream[at + 1], stream[at + 2], stream[at + 4]],
        Winding::Mirrored => [stream[at], stream[at + 4], stream[at + 2], stream[at + 1]],
    }
}

/// Appends a quad to a triangle stream as two triangles in the given
/// winding. Inverse of [`quad_from_stream`].
pub fn emit_quad(quad: &[Vertex; 4], winding: Winding, out: &mut Vec<Vertex>) {
    match winding {
        Winding::Standard => {
            out.extend_from_slice(&[quad[0], quad[1], quad[2], quad[2], quad[3], quad[0]]);
        }
        Winding::Mirrored => {
            out.extend_from_slice(&[quad[0], quad[3], quad[2], quad[2], quad[1], quad[0]]);
        }
    }
}

/// Mutable view of an element's triangle stream.
///
/// The host adapts whatever its canvas hands out (a mesh builder, a
/// vertex helper, a plain buffer) behind this trait so effect passes can
/// rewrite attributes in place or replace the geometry wholesale.
pub trait VertexStream {
    /// Number of vertices in the stream.
    fn len(&self) -> usize;

    /// Returns `true` if the stream has no vertices.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads the vertex at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn vertex(&self, index: usize) -> Vertex;

    /// Overwrites the vertex at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    fn set_vertex(&mut self, index: usize, vertex: Vertex);

    /// Removes all vertices.
    fn clear(&mut self);

    /// Appends vertices as a triangle list (`vertices.len()` should be a
    /// multiple of 3).
    fn extend_triangles(&mut self, vertices: &[Vertex]);
}

/// A geometry pass over one element's vertex stream.
///
/// Implementations run inside the host's mesh-rebuild path, after layout
/// produces the base quads and before the canvas uploads them.
pub trait MeshModifier {
    /// Rewrites `stream` in place for `element`.
    fn modify_mesh(&self, element: &ElementContext, stream: &mut dyn VertexStream);
}

/// A plain `Vec`-backed [`VertexStream`].
#[derive(Clone, Debug, Default)]
pub struct MeshBuffer {
    vertices: Vec<Vertex>,
}

impl MeshBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer from an existing triangle list.
    #[must_use]
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// The current triangle list.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Consumes the buffer and returns its triangle list.
    #[must_use]
    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    /// Appends a quad in the given winding.
    pub fn push_quad(&mut self, quad: &[Vertex; 4], winding: Winding) {
        emit_quad(quad, winding, &mut self.vertices);
    }
}

impl VertexStream for MeshBuffer {
    fn len(&self) -> usize {
        self.vertices.len()
    }

    fn vertex(&self, index: usize) -> Vertex {
        self.vertices[index]
    }

    fn set_vertex(&mut self, index: usize, vertex: Vertex) {
        self.vertices[index] = vertex;
    }

    fn clear(&mut self) {
        self.vertices.clear();
    }

    fn extend_triangles(&mut self, vertices: &[Vertex]) {
        self.vertices.extend_from_slice(vertices);
    }
}
