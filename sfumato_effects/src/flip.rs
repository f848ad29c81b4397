// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis mirroring about the element origin.

use crate::mesh::{ElementContext, MeshModifier, VertexStream};

/// Mirrors vertex positions across the element's axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flip {
    /// Negate X.
    pub horizontal: bool,
    /// Negate Y.
    pub vertical: bool,
}

impl MeshModifier for Flip {
    fn modify_mesh(&self, _element: &ElementContext, stream: &mut dyn VertexStream) {
        if !self.horizontal && !self.vertical {
            return;
        }
        for i in 0..stream.len() {
            let mut vertex = stream.vertex(i);
            if self.horizontal {
                vertex.position.x = -vertex.position.x;
            }
            if self.vertical {
                vertex.position.y = -vertex.position.y;
            }
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
    use kurbo::Rect;

    fn stream() -> MeshBuffer {
        MeshBuffer::from_vertices(vec![Vertex {
            position: Vec3::new(3.0, -2.0, 1.0),
            ..Vertex::default()
        }])
    }

    fn element() -> ElementContext {
        ElementContext::new(Rect::new(0.0, 0.0, 10.0, 10.0), ElementKind::Graphic)
    }

    #[test]
    fn flips_selected_axes() {
        let mut both = stream();
        Flip {
            horizontal: true,
            vertical: true,
        }
        .modify_mesh(&element(), &mut both);
        assert_eq!(both.vertex(0).position, Vec3::new(-3.0, 2.0, 1.0), "z is untouched");

        let mut horizontal = stream();
        Flip {
            horizontal: true,
            vertical: false,
        }
        .modify_mesh(&element(), &mut horizontal);
        assert_eq!(horizontal.vertex(0).position, Vec3::new(-3.0, -2.0, 1.0));
    }

    #[test]
    fn disabled_flip_is_a_no_op() {
        let mut stream = stream();
        let before = stream.vertices().to_vec();
        Flip::default().modify_mesh(&element(), &mut stream);
        assert_eq!(stream.vertices(), &before[..]);
    }
}
