// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tone, color, and blur filtering driven by the parameter table.
//!
//! A [`Filter`] owns one parameter-table row and three normalized
//! factors stored in it. The mesh pass does not touch colors at all: it
//! rewrites each vertex's `uv0` so the fragment shader can recover both
//! the original texture coordinate and the table row to sample factors
//! from. Factor changes after that are texture updates only, with no
//! mesh rebuild.
//!
//! Which treatments the factors drive is selected by the three mode
//! enums. Modes are shader-variant selection data for the host; they do
//! not affect the mesh pass.

use sfumato_core::params::{ParamSlot, ParamTable, TableFull};

use crate::mesh::{ElementContext, MeshModifier, VertexStream};
use crate::packing::pack2;
use crate::vertex::Vec2;

/// Tone treatment applied by the fragment shader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToneMode {
    /// No tone change.
    #[default]
    None,
    /// Luminance-weighted grayscale.
    Grayscale,
    /// Sepia tinting.
    Sepia,
    /// Color inversion.
    Negative,
    /// Blocky pixelation; the tone factor scales the block size.
    Pixelate,
    /// Hard black/white threshold.
    Mono,
    /// Alpha cutoff at the tone factor.
    Cutoff,
    /// Hue rotation by the tone factor.
    Hue,
}

/// How the effect color is combined with the source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// No color change.
    #[default]
    None,
    /// Replace the source color.
    Set,
    /// Additive blend.
    Add,
    /// Subtractive blend.
    Subtract,
}

/// Blur kernel quality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlurMode {
    /// No blur.
    #[default]
    None,
    /// Smallest kernel, cheapest.
    Fast,
    /// Medium kernel.
    Medium,
    /// Widest kernel, smoothest falloff.
    Detail,
}

/// A per-element filter bound to one parameter-table row.
///
/// Detached filters are inert: setters keep the CPU-side value and
/// [`attach`](Self::attach) writes everything through once a row is
/// acquired.
#[derive(Debug)]
pub struct Filter {
    slot: ParamSlot,
    /// Normalized row coordinate, cached at attach.
    row: f32,
    /// Tone treatment variant.
    pub tone_mode: ToneMode,
    /// Color blend variant.
    pub color_mode: ColorMode,
    /// Blur kernel variant.
    pub blur_mode: BlurMode,
    tone: f32,
    color: f32,
    blur: f32,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            slot: ParamSlot::unowned(),
            row: 0.0,
            tone_mode: ToneMode::None,
            color_mode: ColorMode::None,
            blur_mode: BlurMode::None,
            tone: 1.0,
            color: 1.0,
            blur: 0.25,
        }
    }
}

impl Filter {
    /// Table channel holding the tone factor.
    pub const TONE_CHANNEL: u32 = 0;
    /// Table channel holding the color factor.
    pub const COLOR_CHANNEL: u32 = 1;
    /// Table channel holding the blur factor.
    pub const BLUR_CHANNEL: u32 = 2;

    /// Creates a detached filter with default factors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while the filter owns a table row.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.slot.is_owned()
    }

    /// The table row this filter writes, if attached.
    #[must_use]
    pub fn row_index(&self) -> Option<u32> {
        self.slot.index()
    }

    /// Tone factor in `0.0..=1.0`.
    #[must_use]
    pub fn tone(&self) -> f32 {
        self.tone
    }

    /// Color factor in `0.0..=1.0`.
    #[must_use]
    pub fn color(&self) -> f32 {
        self.color
    }

    /// Blur factor in `0.0..=1.0`.
    #[must_use]
    pub fn blur(&self) -> f32 {
        self.blur
    }

    /// Acquires a table row and writes the current factors into it.
    ///
    /// Attaching an already-attached filter is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TableFull`] if the table has no free rows.
    pub fn attach(&mut self, table: &mut ParamTable) -> Result<(), TableFull> {
        if self.slot.is_owned() {
            return Ok(());
        }
        table.acquire(&mut self.slot)?;
        self.row = table.normalized_row(&self.slot).unwrap_or(0.0);
        self.write_factors(table);
        Ok(())
    }

    /// Releases the table row. Detaching a detached filter is a no-op.
    pub fn detach(&mut self, table: &mut ParamTable) {
        table.release(&mut self.slot);
    }

    /// Sets the tone factor, clamped to `0.0..=1.0`.
    pub fn set_tone(&mut self, table: &mut ParamTable, value: f32) {
        self.tone = value.clamp(0.0, 1.0);
        table.set_channel_norm(&self.slot, Self::TONE_CHANNEL, self.tone);
    }

    /// Sets the color factor, clamped to `0.0..=1.0`.
    pub fn set_color(&mut self, table: &mut ParamTable, value: f32) {
        self.color = value.clamp(0.0, 1.0);
        table.set_channel_norm(&self.slot, Self::COLOR_CHANNEL, self.color);
    }

    /// Sets the blur factor, clamped to `0.0..=1.0`.
    pub fn set_blur(&mut self, table: &mut ParamTable, value: f32) {
        self.blur = value.clamp(0.0, 1.0);
        table.set_channel_norm(&self.slot, Self::BLUR_CHANNEL, self.blur);
    }

    fn write_factors(&self, table: &mut ParamTable) {
        table.set_channel_norm(&self.slot, Self::TONE_CHANNEL, self.tone);
        table.set_channel_norm(&self.slot, Self::COLOR_CHANNEL, self.color);
        table.set_channel_norm(&self.slot, Self::BLUR_CHANNEL, self.blur);
    }
}

impl MeshModifier for Filter {
    fn modify_mesh(&self, _element: &ElementContext, stream: &mut dyn VertexStream) {
        if !self.slot.is_owned() {
            return;
        }
        for i in 0..stream.len() {
            let mut vertex = stream.vertex(i);
            vertex.uv0 = Vec2::new(pack2(vertex.uv0.x, vertex.uv0.y), self.row);
            stream.set_vertex(i, vertex);
        }
    }
}
