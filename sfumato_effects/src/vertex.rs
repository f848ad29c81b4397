// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertex attribute types and interpolation.
//!
//! These are plain `f32` value types matching what UI renderers feed
//! their vertex buffers, so [`Vertex`] is `repr(C)` and
//! [`Pod`](bytemuck::Pod): a `&[Vertex]` can be handed to a GPU upload
//! as bytes without copying field by field.
//!
//! Quads use one canonical corner order throughout the crate:
//!
//! ```text
//!   1 ───── 2       v1 = top-left     v2 = top-right
//!   │       │
//!   0 ───── 3       v0 = bottom-left  v3 = bottom-right
//! ```

use bytemuck::{Pod, Zeroable};
use core::ops::Sub;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// A 2-component `f32` vector (texture coordinates).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec2 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Vec2 {
    /// Creates a vector from components.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation between `self` and `other` (unclamped).
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// A 3-component `f32` vector (positions, normals).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Creates a vector from components.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Linear interpolation between `self` and `other` (unclamped).
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

/// A 4-component `f32` vector (tangents).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec4 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// W component.
    pub w: f32,
}

impl Vec4 {
    /// Creates a vector from components.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Linear interpolation between `self` and `other` (unclamped).
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
            w: self.w + (other.w - self.w) * t,
        }
    }
}

/// An RGBA color with `f32` components, typically in `[0, 1]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Rgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Rgba {
    /// Opaque white; the multiplicative identity for vertex tinting.
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Creates a color from components.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Linear interpolation between `self` and `other` (unclamped).
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Component-wise product, for tinting one color by another.
    #[inline]
    #[must_use]
    pub fn modulate(self, other: Self) -> Self {
        Self {
            r: self.r * other.r,
            g: self.g * other.g,
            b: self.b * other.b,
            a: self.a * other.a,
        }
    }

    /// Converts linear RGB components to sRGB gamma space. Alpha is
    /// unchanged.
    #[must_use]
    pub fn to_gamma(self) -> Self {
        Self {
            r: linear_to_gamma(self.r),
            g: linear_to_gamma(self.g),
            b: linear_to_gamma(self.b),
            a: self.a,
        }
    }

    /// Converts sRGB gamma components to linear space. Alpha is
    /// unchanged.
    #[must_use]
    pub fn to_linear(self) -> Self {
        Self {
            r: gamma_to_linear(self.r),
            g: gamma_to_linear(self.g),
            b: gamma_to_linear(self.b),
            a: self.a,
        }
    }
}

/// sRGB transfer function. Negative inputs clamp to zero so `powf`
/// never sees a negative base.
fn linear_to_gamma(c: f32) -> f32 {
    let c = c.max(0.0);
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Inverse sRGB transfer function.
fn gamma_to_linear(c: f32) -> f32 {
    let c = c.max(0.0);
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// One UI vertex: position, lighting basis, two UV channels, and color.
///
/// The layout matches the per-vertex data UI renderers exchange with
/// their canvas mesh, so effect passes can rewrite attributes in place.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in the element's local space.
    pub position: Vec3,
    /// Surface normal.
    pub normal: Vec3,
    /// Tangent with handedness in `w`.
    pub tangent: Vec4,
    /// Primary texture coordinates; effect passes may repack these.
    pub uv0: Vec2,
    /// Secondary texture coordinates, used for packed effect factors.
    pub uv1: Vec2,
    /// Vertex color.
    pub color: Rgba,
}

impl Vertex {
    /// Interpolates every attribute between `self` and `other`
    /// (unclamped).
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
            tangent: self.tangent.lerp(other.tangent, t),
            uv0: self.uv0.lerp(other.uv0, t),
            uv1: self.uv1.lerp(other.uv1, t),
            color: self.color.lerp(other.color, t),
        }
    }

    /// Bilinear interpolation inside a quad, using the canonical corner
    /// order (`v0` bottom-left, `v1` top-left, `v2` top-right, `v3`
    /// bottom-right). `a` runs left to right, `b` bottom to top.
    #[inline]
    #[must_use]
    pub fn bilerp(v0: Self, v1: Self, v2: Self, v3: Self, a: f32, b: f32) -> Self {
        let bottom = v0.lerp(v3, a);
        let top = v1.lerp(v2, a);
        bottom.lerp(top, b)
    }
}
