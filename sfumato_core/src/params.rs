// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared parameter table for effect instances.
//!
//! A [`ParamTable`] is a byte matrix with one row per effect instance and
//! one column per parameter channel. Effect instances acquire a row via a
//! [`ParamSlot`] handle, write channel bytes into it, and the table pushes
//! the whole block to the host's [`ParamSurface`] at most once per frame,
//! and only when something changed.
//!
//! The backing store is laid out row-major:
//!
//! ```text
//!              ch0  ch1  ch2  ch3
//! instance 0 [  .    .    .    .  ]
//! instance 1 [  .    .    .    .  ]      dirty ──flush──▶ ParamSurface
//! instance 2 [  .    .    .    .  ]
//!     ⋮
//! ```
//!
//! Hosts that present the block as an RGBA texture read it as
//! `channel_count / 4` pixels wide and `max_instances` rows tall, sampled
//! with point filtering. The constructor rounds the requested channel
//! count up to a multiple of 4 and the instance count up to a multiple of
//! 2 so the block always maps to whole pixels.

use core::fmt;

use alloc::vec;
use alloc::vec::Vec;

use crate::slot::SlotPool;

/// Sentinel row index meaning "no row owned".
const UNOWNED: u32 = u32::MAX;

/// Receiver for flushed parameter data.
///
/// The host implements this over whatever its renderer samples: a texture
/// upload, a uniform buffer write, or a plain copy in tests.
pub trait ParamSurface {
    /// Accepts the full parameter block, row-major, one byte per channel.
    fn upload(&mut self, data: &[u8]);
}

/// Error returned when a slot acquire fails because every row is in use.
///
/// The table is fixed-capacity; the caller decides whether to drop the
/// effect, evict another instance, or surface the error to its own caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableFull {
    /// Total instance capacity of the table.
    pub capacity: u32,
}

impl fmt::Display for TableFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter table full ({} instances in use)", self.capacity)
    }
}

impl core::error::Error for TableFull {}

/// An effect instance's claim on one parameter table row.
///
/// A slot is either *owned* (bound to a row) or *unowned*. Handles are
/// deliberately not `Clone`: exactly one handle refers to a given row, so
/// releasing through it cannot leave aliases behind. A freshly constructed
/// or defaulted slot is unowned.
#[derive(PartialEq, Eq, Hash)]
pub struct ParamSlot {
    idx: u32,
}

impl ParamSlot {
    /// Creates an unowned slot.
    #[inline]
    #[must_use]
    pub const fn unowned() -> Self {
        Self { idx: UNOWNED }
    }

    /// Returns `true` if this slot currently owns a table row.
    #[inline]
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.idx != UNOWNED
    }

    /// Returns the owned row index, or `None` for an unowned slot.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> Option<u32> {
        if self.is_owned() { Some(self.idx) } else { None }
    }
}

impl fmt::Debug for ParamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_owned() {
            write!(f, "ParamSlot({})", self.idx)
        } else {
            write!(f, "ParamSlot(unowned)")
        }
    }
}

impl Default for ParamSlot {
    fn default() -> Self {
        Self::unowned()
    }
}

impl ParamSlot {
    fn take_row(&mut self, idx: u32) {
        self.idx = idx;
    }

    fn drop_row(&mut self) {
        self.idx = UNOWNED;
    }
}

/// Fixed-capacity channel/instance parameter store with lazy flush.
#[derive(Debug)]
pub struct ParamTable {
    channel_count: u32,
    max_instances: u32,
    data: Vec<u8>,
    pool: SlotPool,
    dirty: bool,
}

impl ParamTable {
    /// Creates a table for `channels` parameter channels and `instances`
    /// concurrent effect instances.
    ///
    /// Both requests are minimums: channels round up to a multiple of 4
    /// (whole RGBA pixels) and instances to a multiple of 2.
    ///
    /// # Panics
    ///
    /// Panics if `channels` or `instances` is zero.
    #[must_use]
    pub fn new(channels: u32, instances: u32) -> Self {
        assert!(channels > 0, "table needs at least one channel");
        assert!(instances > 0, "table needs at least one instance");
        let channel_count = ((channels - 1) / 4 + 1) * 4;
        let max_instances = ((instances - 1) / 2 + 1) * 2;
        let len = channel_count as usize * max_instances as usize;
        Self {
            channel_count,
            max_instances,
            data: vec![0; len],
            pool: SlotPool::new(max_instances),
            dirty: false,
        }
    }

    /// Number of channels per instance, after rounding.
    #[inline]
    #[must_use]
    pub const fn channel_count(&self) -> u32 {
        self.channel_count
    }

    /// Number of instance rows, after rounding.
    #[inline]
    #[must_use]
    pub const fn max_instances(&self) -> u32 {
        self.max_instances
    }

    /// Width in RGBA pixels of the texture view of this table.
    #[inline]
    #[must_use]
    pub const fn texture_width(&self) -> u32 {
        self.channel_count / 4
    }

    /// Height in pixels of the texture view of this table.
    #[inline]
    #[must_use]
    pub const fn texture_height(&self) -> u32 {
        self.max_instances
    }

    /// Size of the parameter block in bytes.
    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// The raw parameter block, row-major.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of rows not currently claimed by a slot.
    #[inline]
    #[must_use]
    pub fn free_instances(&self) -> usize {
        self.pool.free_len()
    }

    /// Returns `true` if unflushed writes are pending.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Binds `slot` to a free row.
    ///
    /// On success the slot becomes owned; on [`TableFull`] it is left
    /// unowned. The row's previous contents are kept, so a new owner
    /// should write all channels it cares about before the next flush.
    ///
    /// Acquiring into a slot that already owns a row is a caller bug: it
    /// would leak the held row. A debug assertion catches it; release
    /// first.
    pub fn acquire(&mut self, slot: &mut ParamSlot) -> Result<(), TableFull> {
        debug_assert!(
            !slot.is_owned(),
            "acquire into an owned slot leaks its row; release first"
        );
        match self.pool.acquire() {
            Some(idx) => {
                slot.take_row(idx);
                Ok(())
            }
            None => Err(TableFull {
                capacity: self.max_instances,
            }),
        }
    }

    /// Returns `slot`'s row to the free pool and marks the slot unowned.
    ///
    /// Releasing an unowned slot is a no-op, so teardown paths can call
    /// this unconditionally.
    pub fn release(&mut self, slot: &mut ParamSlot) {
        if let Some(idx) = slot.index() {
            self.pool.release(idx);
            slot.drop_row();
        }
    }

    /// Writes one channel byte in `slot`'s row and marks the table dirty.
    ///
    /// Writes through an unowned slot are silently dropped; a detached
    /// effect can keep running its update logic without corrupting rows
    /// owned by others.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range for this table.
    pub fn set_channel(&mut self, slot: &ParamSlot, channel: u32, value: u8) {
        let Some(idx) = slot.index() else {
            return;
        };
        assert!(
            channel < self.channel_count,
            "channel {channel} out of range (table has {})",
            self.channel_count
        );
        let at = idx as usize * self.channel_count as usize + channel as usize;
        self.data[at] = value;
        self.dirty = true;
    }

    /// Writes one channel from a `[0, 1]` float, quantized to a byte.
    ///
    /// Quantization truncates (`0.5` becomes `127`); out-of-range inputs
    /// clamp to the byte range.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float-to-byte quantization; `as u8` saturates out-of-range inputs"
    )]
    pub fn set_channel_norm(&mut self, slot: &ParamSlot, channel: u32, value: f32) {
        self.set_channel(slot, channel, (value * 255.0) as u8);
    }

    /// Texture V coordinate of `slot`'s row center, or `None` if unowned.
    ///
    /// Shaders sample the parameter texture at this V with point
    /// filtering; the half-texel offset lands exactly on the row.
    #[must_use]
    pub fn normalized_row(&self, slot: &ParamSlot) -> Option<f32> {
        let idx = slot.index()?;
        Some((idx as f32 + 0.5) / self.max_instances as f32)
    }

    /// Pushes the parameter block to `surface` if anything changed since
    /// the last flush. Returns `true` if an upload happened.
    pub fn flush(&mut self, surface: &mut dyn ParamSurface) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        surface.upload(&self.data);
        true
    }
}
