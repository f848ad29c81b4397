// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directional color gradients over element geometry.
//!
//! [`Gradient`] multiplies an interpolated color into each vertex. The
//! interpolation coordinate comes from mapping the vertex position into
//! a normalized gradient space: the element rect (or, for text, the
//! vertex bounding box or per-character unit corners), rotated about its
//! center. Rotation and space selection are resolved per pass, so the
//! same component drives horizontal, vertical, angled, and four-color
//! diagonal fills.
//!
//! Because the result is multiplied into the existing vertex color, a
//! gradient composes with tinting and with other passes that ran
//! earlier. Colors can be converted to gamma or linear space first for
//! hosts whose canvas works in the other space.

use kurbo::{Affine, Point, Rect, Vec2};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::mesh::{ElementContext, MeshModifier, QUAD_STREAM_LEN, VertexStream, Winding};
use crate::vertex::Rgba;

/// Gradient axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
    /// Along [`Gradient::rotation`].
    Angle,
    /// Four-color bilinear fill, rotated by [`Gradient::rotation`].
    Diagonal,
}

/// Gradient space for text elements.
///
/// Non-text elements always use the element rect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GradientStyle {
    /// The element's layout rect.
    #[default]
    Rect,
    /// The bounding box of the element's vertices.
    Fit,
    /// Each character spans the full gradient on its own.
    Split,
}

/// Color space conversion applied to the gradient color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorCorrection {
    /// Use the colors as authored.
    #[default]
    None,
    /// Convert to gamma space before multiplying.
    Gamma,
    /// Convert to linear space before multiplying.
    Linear,
}

/// Unit-square corners in canonical quad order.
const SPLIT_CORNERS: [(f64, f64); 4] = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];

/// A directional gradient pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    /// Gradient axis.
    pub direction: Direction,
    /// Top (vertical) or left (horizontal) color. Bottom-left for
    /// diagonal fills.
    pub color1: Rgba,
    /// Bottom or right color. Bottom-right for diagonal fills.
    pub color2: Rgba,
    /// Top-left color for diagonal fills.
    pub color3: Rgba,
    /// Top-right color for diagonal fills.
    pub color4: Rgba,
    /// Rotation in degrees for [`Direction::Angle`] and
    /// [`Direction::Diagonal`]. Horizontal and vertical directions pin
    /// their own rotation.
    pub rotation: f64,
    /// Shift along the gradient's vertical coordinate, in `-1.0..=1.0`.
    pub offset: f64,
    /// Shift along the horizontal coordinate, in `-1.0..=1.0`. Mostly
    /// useful for diagonal fills.
    pub offset2: f64,
    /// Gradient space for text elements.
    pub style: GradientStyle,
    /// Color space conversion for the gradient color.
    pub correction: ColorCorrection,
    /// Skip the aspect compensation for angled gradients.
    pub ignore_aspect_ratio: bool,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            direction: Direction::Horizontal,
            color1: Rgba::WHITE,
            color2: Rgba::WHITE,
            color3: Rgba::WHITE,
            color4: Rgba::WHITE,
            rotation: 0.0,
            offset: 0.0,
            offset2: 0.0,
            style: GradientStyle::Rect,
            correction: ColorCorrection::None,
            ignore_aspect_ratio: true,
        }
    }
}

impl Gradient {
    /// The rotation the pass actually uses, in degrees.
    #[must_use]
    pub fn effective_rotation(&self) -> f64 {
        match self.direction {
            Direction::Horizontal => -90.0,
            Direction::Vertical => 0.0,
            Direction::Angle | Direction::Diagonal => self.rotation,
        }
    }

    fn gradient_rect(&self, element: &ElementContext, stream: &dyn VertexStream) -> Rect {
        if !element.is_text() {
            return element.rect;
        }
        match self.style {
            GradientStyle::Rect => element.rect,
            GradientStyle::Split => Rect::new(0.0, 0.0, 1.0, 1.0),
            GradientStyle::Fit => {
                let (mut x0, mut y0) = (f64::MAX, f64::MAX);
                let (mut x1, mut y1) = (f64::MIN, f64::MIN);
                for i in 0..stream.len() {
                    let p = stream.vertex(i).position;
                    x0 = x0.min(f64::from(p.x));
                    y0 = y0.min(f64::from(p.y));
                    x1 = x1.max(f64::from(p.x));
                    y1 = y1.max(f64::from(p.y));
                }
                Rect::new(x0, y0, x1, y1)
            }
        }
    }

    /// Maps positions in `rect` to rotated normalized gradient space.
    fn local_transform(&self, rect: Rect) -> Affine {
        let rad = self.effective_rotation().to_radians();
        #[cfg(feature = "std")]
        let (mut s, mut c) = rad.sin_cos();
        #[cfg(not(feature = "std"))]
        let (mut s, mut c) = (rad.sin(), rad.cos());
        if !self.ignore_aspect_ratio
            && matches!(self.direction, Direction::Angle | Direction::Diagonal)
        {
            // Compensate the rotation direction for non-square rects.
            c *= rect.height() / rect.width();
            let len = (c * c + s * s).sqrt();
            if len > 1e-9 {
                c /= len;
                s /= len;
            }
        }
        Affine::translate((0.5, 0.5))
            * Affine::new([c, s, -s, c, 0.0, 0.0])
            * Affine::translate((-0.5, -0.5))
            * Affine::scale_non_uniform(1.0 / rect.width(), 1.0 / rect.height())
            * Affine::translate((-rect.x0, -rect.y0))
    }
}

/// Unit corner for the vertex at `index` of a quad stream.
fn split_corner(winding: Winding, index: usize) -> Point {
    let corner = match winding {
        Winding::Standard => [0, 1, 2, 2, 3, 0][index % QUAD_STREAM_LEN],
        Winding::Mirrored => [0, 3, 2, 2, 1, 0][index % QUAD_STREAM_LEN],
    };
    let (x, y) = SPLIT_CORNERS[corner];
    Point::new(x, y)
}

impl MeshModifier for Gradient {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "normalized gradient coordinates are near the unit range"
    )]
    fn modify_mesh(&self, element: &ElementContext, stream: &mut dyn VertexStream) {
        if stream.is_empty() {
            return;
        }
        let split = element.is_text() && self.style == GradientStyle::Split;
        let rect = self.gradient_rect(element, stream);
        let transform = self.local_transform(rect);
        let shift = Vec2::new(self.offset2, self.offset);
        let winding = Winding::from(element.kind);

        for i in 0..stream.len() {
            let mut vertex = stream.vertex(i);
            let sample = if split {
                split_corner(winding, i)
            } else {
                Point::new(f64::from(vertex.position.x), f64::from(vertex.position.y))
            };
            let pos = transform * sample + shift;
            let (x, y) = (pos.x as f32, pos.y as f32);

            let color = match self.direction {
                Direction::Diagonal => self
                    .color1
                    .lerp(self.color2, x)
                    .lerp(self.color3.lerp(self.color4, x), y),
                _ => self.color2.lerp(self.color1, y),
            };
            let color = match self.correction {
                ColorCorrection::None => color,
                ColorCorrection::Gamma => color.to_gamma(),
                ColorCorrection::Linear => color.to_linear(),
            };
            vertex.color = vertex.color.modulate(color);
            stream.set_vertex(i, vertex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{ElementKind, MeshBuffer};
    use crate::vertex::{Vec3, Vertex};
    use alloc::vec;

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 1.0);
    const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);
    const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> [Vertex; 4] {
        let at = |x: f32, y: f32| Vertex {
            position: Vec3::new(x, y, 0.0),
            color: Rgba::WHITE,
            ..Vertex::default()
        };
        [at(x0, y0), at(x0, y1), at(x1, y1), at(x1, y0)]
    }

    fn element(kind: ElementKind) -> ElementContext {
        ElementContext::new(Rect::new(0.0, 0.0, 10.0, 10.0), kind)
    }

    fn assert_close(got: Rgba, want: Rgba, what: &str) {
        let close = (got.r - want.r).abs() < 1e-4
            && (got.g - want.g).abs() < 1e-4
            && (got.b - want.b).abs() < 1e-4
            && (got.a - want.a).abs() < 1e-4;
        assert!(close, "{what}: got {got:?}, want {want:?}");
    }

    #[test]
    fn vertical_runs_top_to_bottom() {
        let mut stream = MeshBuffer::new();
        stream.push_quad(&quad(0.0, 0.0, 10.0, 10.0), Winding::Standard);

        let pass = Gradient {
            direction: Direction::Vertical,
            color1: RED,
            color2: BLUE,
            ..Gradient::default()
        };
        pass.modify_mesh(&element(ElementKind::Graphic), &mut stream);

        assert_eq!(stream.vertex(0).color, BLUE, "bottom-left");
        assert_eq!(stream.vertex(1).color, RED, "top-left");
    }

    #[test]
    fn horizontal_pins_its_own_rotation() {
        let mut stream = MeshBuffer::new();
        stream.push_quad(&quad(0.0, 0.0, 10.0, 10.0), Winding::Standard);

        let pass = Gradient {
            direction: Direction::Horizontal,
            color1: RED,
            color2: BLUE,
            rotation: 45.0,
            ..Gradient::default()
        };
        assert_eq!(pass.effective_rotation(), -90.0);
        pass.modify_mesh(&element(ElementKind::Graphic), &mut stream);

        assert_close(stream.vertex(0).color, RED, "left edge");
        assert_close(stream.vertex(2).color, BLUE, "right edge");
    }

    #[test]
    fn diagonal_fills_all_four_corners() {
        let mut stream = MeshBuffer::new();
        stream.push_quad(&quad(0.0, 0.0, 10.0, 10.0), Winding::Standard);

        let pass = Gradient {
            direction: Direction::Diagonal,
            color1: RED,
            color2: BLUE,
            color3: GREEN,
            color4: BLACK,
            ..Gradient::default()
        };
        pass.modify_mesh(&element(ElementKind::Graphic), &mut stream);

        assert_close(stream.vertex(0).color, RED, "bottom-left");
        assert_close(stream.vertex(4).color, BLUE, "bottom-right");
        assert_close(stream.vertex(1).color, GREEN, "top-left");
        assert_close(stream.vertex(2).color, BLACK, "top-right");
    }

    #[test]
    fn offset_shifts_the_sample() {
        let mut stream = MeshBuffer::new();
        stream.push_quad(&quad(0.0, 0.0, 10.0, 10.0), Winding::Standard);

        let pass = Gradient {
            direction: Direction::Vertical,
            color1: RED,
            color2: BLUE,
            offset: -0.5,
            ..Gradient::default()
        };
        pass.modify_mesh(&element(ElementKind::Graphic), &mut stream);

        // Top vertex now samples the midpoint.
        assert_eq!(stream.vertex(1).color, RED.lerp(BLUE, 0.5));
    }

    #[test]
    fn split_tints_each_character_alike() {
        let mut stream = MeshBuffer::new();
        stream.push_quad(&quad(0.0, 0.0, 4.0, 10.0), Winding::Mirrored);
        stream.push_quad(&quad(5.0, 2.0, 9.0, 8.0), Winding::Mirrored);

        let pass = Gradient {
            direction: Direction::Vertical,
            color1: RED,
            color2: BLUE,
            style: GradientStyle::Split,
            ..Gradient::default()
        };
        pass.modify_mesh(&element(ElementKind::Text), &mut stream);

        for block in [0, QUAD_STREAM_LEN] {
            // Mirrored blocks run [BL, BR, TR, TR, TL, BL].
            assert_eq!(stream.vertex(block).color, BLUE, "bottom-left");
            assert_eq!(stream.vertex(block + 2).color, RED, "top-right");
            assert_eq!(stream.vertex(block + 4).color, RED, "top-left");
        }
    }

    #[test]
    fn split_needs_a_text_element() {
        let mut stream = MeshBuffer::new();
        stream.push_quad(&quad(0.0, 5.0, 10.0, 10.0), Winding::Standard);

        let pass = Gradient {
            direction: Direction::Vertical,
            color1: RED,
            color2: BLUE,
            style: GradientStyle::Split,
            ..Gradient::default()
        };
        pass.modify_mesh(&element(ElementKind::Graphic), &mut stream);

        // Element-rect space: the quad's bottom sits halfway up.
        assert_eq!(stream.vertex(0).color, RED.lerp(BLUE, 0.5));
    }

    #[test]
    fn fit_spans_the_vertex_bounds() {
        let mut stream = MeshBuffer::new();
        stream.push_quad(&quad(100.0, 100.0, 104.0, 110.0), Winding::Mirrored);

        let pass = Gradient {
            direction: Direction::Vertical,
            color1: RED,
            color2: BLUE,
            style: GradientStyle::Fit,
            ..Gradient::default()
        };
        pass.modify_mesh(&element(ElementKind::Text), &mut stream);

        assert_eq!(stream.vertex(0).color, BLUE, "bbox bottom");
        assert_eq!(stream.vertex(2).color, RED, "bbox top");
    }

    #[test]
    fn correction_applies_to_the_gradient_color_only() {
        let gray = Rgba::new(0.5, 0.5, 0.5, 1.0);
        let mut stream = MeshBuffer::from_vertices(vec![Vertex {
            position: Vec3::new(5.0, 5.0, 0.0),
            color: gray,
            ..Vertex::default()
        }]);

        // White gradient: correction of white is white, so the vertex
        // color must come through untouched.
        let pass = Gradient {
            direction: Direction::Vertical,
            correction: ColorCorrection::Gamma,
            ..Gradient::default()
        };
        pass.modify_mesh(&element(ElementKind::Graphic), &mut stream);

        assert_close(stream.vertex(0).color, gray, "white gradient is neutral");
    }

    #[test]
    fn aspect_compensation_changes_angled_gradients() {
        let wide = ElementContext::new(Rect::new(0.0, 0.0, 20.0, 10.0), ElementKind::Graphic);
        let probe = |ignore: bool| {
            let mut stream = MeshBuffer::new();
            stream.push_quad(&quad(0.0, 0.0, 20.0, 10.0), Winding::Standard);
            let pass = Gradient {
                direction: Direction::Angle,
                color1: RED,
                color2: BLUE,
                rotation: 45.0,
                ignore_aspect_ratio: ignore,
                ..Gradient::default()
            };
            pass.modify_mesh(&wide, &mut stream);
            stream.vertex(0).color
        };

        assert_ne!(probe(true), probe(false), "compensation must be visible");
    }
}
