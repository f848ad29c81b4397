// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mesh-space effect components for UI elements.
//!
//! `sfumato_effects` builds on [`sfumato_core`]'s parameter table with
//! the geometry side of an effect pipeline: passes that rewrite an
//! element's vertex stream before the host canvas uploads it. Every
//! pass implements [`MeshModifier`](mesh::MeshModifier) over the same
//! six-vertices-per-quad stream contract, so hosts chain them freely:
//!
//! ```text
//!   layout quads ──► Tessellate ──► Gradient ──► Filter ──► canvas
//!                    (subdivide,     (vertex      (pack row
//!                     bend)           colors)      into uv0)
//! ```
//!
//! **[`mesh`]** — The stream contract: [`ElementContext`](mesh::ElementContext),
//! [`VertexStream`](mesh::VertexStream), quad winding and extraction,
//! and a `Vec`-backed buffer.
//!
//! **[`vertex`]** — Plain-data vertex and color types with the lerp and
//! bilerp helpers the passes interpolate with.
//!
//! **[`tessellate`]** — Grid subdivision and curve bending.
//!
//! **[`gradient`]** — Directional and four-color vertex gradients.
//!
//! **[`filter`]** — Tone/color/blur factors in a
//! [`ParamTable`](sfumato_core::params::ParamTable) row, addressed
//! through rewritten UVs.
//!
//! **[`factors`]** — Static per-vertex factors packed into `uv1`.
//!
//! **[`flip`]** — Axis mirroring.
//!
//! **[`capture`]** — Screen-capture blur planning as a backend-agnostic
//! op list.
//!
//! **[`packing`]** — The float bit-packing shared by `filter` and
//! `factors`.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Uses the standard library for float
//!   math instead of `libm`.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod capture;
pub mod factors;
pub mod filter;
pub mod flip;
pub mod gradient;
pub mod mesh;
pub mod packing;
pub mod tessellate;
pub mod vertex;
