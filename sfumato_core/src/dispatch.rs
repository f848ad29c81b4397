// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration and per-frame dispatch of effect callbacks.
//!
//! Hosts register a [`FrameCallback`] once, choosing which phases it
//! participates in via a [`PhaseSet`]. Each frame, the driver runs the
//! phases in order and the dispatcher invokes every member of the
//! matching list:
//!
//! ```text
//!              slab (one slot per registration)
//!              ┌────┬────┬────┬────┬────┐
//!   callback   │ A  │ B  │ —  │ C  │ D  │   generation-checked
//!   phases     │ U  │UL F│    │ U  │ F  │   CallbackId handles
//!              └────┴────┴────┴────┴────┘
//!                ▲         ▲
//!   update_list [0, 3]     │ freed slots are recycled
//!   late_list   [1]        │ through a free list
//!   fixed_list  [1, 4]
//! ```
//!
//! Membership lists hold slab indices, not boxes, so removal is a cheap
//! tail swap and iteration touches one flat array per phase. A callback
//! that fails returns a [`TickFault`]; the dispatcher reports it to the
//! tracer and keeps going, so one broken effect cannot stall the others.
//!
//! Callbacks never touch the dispatcher directly while it is mid-pass.
//! The [`TickContext`] handed to each callback exposes the parameter
//! table plus [`retire`](TickContext::retire), which queues removals that
//! the dispatcher applies once the current phase pass completes.

use core::fmt;

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::params::ParamTable;
use crate::time::HostTime;
use crate::trace::{CallbackFaultEvent, Tracer};

/// Phase membership lists start with room for this many entries.
const INITIAL_PHASE_CAPACITY: usize = 16;

/// One phase of the per-frame dispatch cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Main per-frame pass.
    Update,
    /// Runs after every `Update` callback has finished.
    LateUpdate,
    /// Fixed-timestep pass; the host may run it zero or more times per
    /// frame.
    FixedUpdate,
}

/// Which phases a registration participates in.
///
/// The memberships are independent; a callback can join any subset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PhaseSet {
    /// Member of the `Update` pass.
    pub update: bool,
    /// Member of the `LateUpdate` pass.
    pub late_update: bool,
    /// Member of the `FixedUpdate` pass.
    pub fixed_update: bool,
}

impl PhaseSet {
    /// Membership in `Update` only.
    pub const UPDATE: Self = Self {
        update: true,
        late_update: false,
        fixed_update: false,
    };

    /// Membership in `LateUpdate` only.
    pub const LATE_UPDATE: Self = Self {
        update: false,
        late_update: true,
        fixed_update: false,
    };

    /// Membership in `FixedUpdate` only.
    pub const FIXED_UPDATE: Self = Self {
        update: false,
        late_update: false,
        fixed_update: true,
    };

    /// Membership in every phase.
    pub const ALL: Self = Self {
        update: true,
        late_update: true,
        fixed_update: true,
    };

    /// Returns the combined membership of `self` and `other`.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            update: self.update || other.update,
            late_update: self.late_update || other.late_update,
            fixed_update: self.fixed_update || other.fixed_update,
        }
    }

    /// Returns `true` if this set joins the given phase.
    #[inline]
    #[must_use]
    pub const fn contains(self, phase: Phase) -> bool {
        match phase {
            Phase::Update => self.update,
            Phase::LateUpdate => self.late_update,
            Phase::FixedUpdate => self.fixed_update,
        }
    }

    /// Returns `true` if this set joins no phase at all.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.update && !self.late_update && !self.fixed_update
    }
}

impl core::ops::BitOr for PhaseSet {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// A handle to a registered callback.
///
/// Contains both a slab index and a generation counter so that stale
/// handles can be detected after a registration is removed and the slot
/// is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId {
    /// Slab index into the dispatcher's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the dispatcher's generation for
    /// this slot.
    pub(crate) generation: u32,
}

impl CallbackId {
    /// Returns the raw slab index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallbackId({}@gen{})", self.idx, self.generation)
    }
}

/// Error value a callback returns to report a failed tick.
///
/// The dispatcher logs the fault and moves on to the next callback; it
/// never unwinds the pass.
#[derive(Clone, PartialEq, Eq)]
pub struct TickFault {
    reason: Cow<'static, str>,
}

impl TickFault {
    /// Creates a fault with a human-readable reason.
    #[must_use]
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The fault reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Debug for TickFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TickFault({:?})", self.reason)
    }
}

impl fmt::Display for TickFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl core::error::Error for TickFault {}

/// Per-pass state handed to every callback.
///
/// This is the only view a callback gets of the engine while a pass is
/// in progress: the shared parameter table, the clock values for the
/// pass, and a deferred-removal queue.
#[derive(Debug)]
pub struct TickContext<'a> {
    /// Phase being dispatched.
    pub phase: Phase,
    /// Monotonic frame counter of the owning context.
    pub frame_index: u64,
    /// Host time the driver passed in for this pass.
    pub now: HostTime,
    /// Shared parameter table.
    pub params: &'a mut ParamTable,
    retired: &'a mut Vec<CallbackId>,
}

impl TickContext<'_> {
    /// Queues a registration for removal once the current phase pass
    /// completes.
    ///
    /// Stale or already-queued ids are tolerated and dropped when the
    /// queue is applied.
    pub fn retire(&mut self, id: CallbackId) {
        self.retired.push(id);
    }
}

/// A per-frame effect callback.
///
/// Implement the phases you joined via [`PhaseSet`]; the rest default to
/// doing nothing, so a registration never has to stub out passes it did
/// not ask for.
pub trait FrameCallback {
    /// Main per-frame pass.
    fn on_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
        _ = tick;
        Ok(())
    }

    /// Runs after the `Update` pass completes.
    fn on_late_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
        _ = tick;
        Ok(())
    }

    /// Fixed-timestep pass.
    fn on_fixed_update(&mut self, tick: &mut TickContext<'_>) -> Result<(), TickFault> {
        _ = tick;
        Ok(())
    }
}

/// Slab of registered callbacks plus per-phase membership lists.
pub struct UpdateDispatcher {
    // -- Slab columns --
    callback: Vec<Option<Box<dyn FrameCallback>>>,
    phases: Vec<PhaseSet>,

    // -- Allocation --
    generation: Vec<u32>,
    free_list: Vec<u32>,
    len: u32,

    // -- Phase membership (slab indices) --
    update_list: Vec<u32>,
    late_update_list: Vec<u32>,
    fixed_update_list: Vec<u32>,

    // -- Deferred removals queued during a pass --
    retired: Vec<CallbackId>,
}

impl Default for UpdateDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callback: Vec::new(),
            phases: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            update_list: Vec::with_capacity(INITIAL_PHASE_CAPACITY),
            late_update_list: Vec::with_capacity(INITIAL_PHASE_CAPACITY),
            fixed_update_list: Vec::with_capacity(INITIAL_PHASE_CAPACITY),
            retired: Vec::new(),
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn registered_len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Number of registrations in the given phase's membership list.
    #[must_use]
    pub fn phase_len(&self, phase: Phase) -> usize {
        self.phase_list(phase).len()
    }

    /// Returns whether the given handle refers to a live registration.
    #[must_use]
    pub fn is_registered(&self, id: CallbackId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && self.callback[id.idx as usize].is_some()
    }

    /// Adds a callback to the given phase memberships and returns its
    /// handle.
    ///
    /// Registering with an empty [`PhaseSet`] is almost certainly a bug
    /// (the callback would never tick) and trips a debug assertion.
    pub fn register(&mut self, callback: Box<dyn FrameCallback>, phases: PhaseSet) -> CallbackId {
        debug_assert!(
            !phases.is_empty(),
            "registration with no phase memberships never ticks"
        );
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            self.generation[idx as usize] += 1;
            self.callback[idx as usize] = Some(callback);
            self.phases[idx as usize] = phases;
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.callback.push(Some(callback));
            self.phases.push(phases);
            self.generation.push(0);
            idx
        };

        if phases.update {
            self.update_list.push(idx);
        }
        if phases.late_update {
            self.late_update_list.push(idx);
        }
        if phases.fixed_update {
            self.fixed_update_list.push(idx);
        }

        CallbackId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Removes a registration and drops its callback.
    ///
    /// Returns `false` (and does nothing) for stale or already-removed
    /// handles, so teardown paths can call this unconditionally.
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        if !self.is_registered(id) {
            return false;
        }
        let idx = id.idx;
        let phases = self.phases[idx as usize];
        self.callback[idx as usize] = None;
        self.phases[idx as usize] = PhaseSet::default();

        if phases.update {
            swap_remove_index(&mut self.update_list, idx);
        }
        if phases.late_update {
            swap_remove_index(&mut self.late_update_list, idx);
        }
        if phases.fixed_update {
            swap_remove_index(&mut self.fixed_update_list, idx);
        }

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        true
    }

    /// Runs one phase pass over its membership list.
    ///
    /// Faulting callbacks are reported to `tracer` and skipped over; the
    /// pass always visits the membership snapshot taken at entry. Returns
    /// the number of faults.
    ///
    /// Removals queued through [`TickContext::retire`] are applied after
    /// the last member has run, so a callback that retires itself still
    /// finishes its own tick.
    pub fn run_phase(
        &mut self,
        phase: Phase,
        frame_index: u64,
        now: HostTime,
        params: &mut ParamTable,
        tracer: &mut Tracer<'_>,
    ) -> u32 {
        let len = self.phase_list(phase).len();
        let mut faults = 0;
        for i in 0..len {
            let idx = self.phase_list(phase)[i];
            let Some(cb) = self.callback[idx as usize].as_mut() else {
                continue;
            };
            let mut tick = TickContext {
                phase,
                frame_index,
                now,
                params: &mut *params,
                retired: &mut self.retired,
            };
            let result = match phase {
                Phase::Update => cb.on_update(&mut tick),
                Phase::LateUpdate => cb.on_late_update(&mut tick),
                Phase::FixedUpdate => cb.on_fixed_update(&mut tick),
            };
            if let Err(fault) = result {
                faults += 1;
                tracer.callback_fault(&CallbackFaultEvent {
                    frame_index,
                    phase,
                    id: CallbackId {
                        idx,
                        generation: self.generation[idx as usize],
                    },
                    reason: fault.reason(),
                });
            }
        }

        if !self.retired.is_empty() {
            #[cfg(feature = "trace-rich")]
            tracer.callbacks_retired(frame_index, &self.retired);
            while let Some(id) = self.retired.pop() {
                _ = self.unregister(id);
            }
        }
        faults
    }

    fn phase_list(&self, phase: Phase) -> &[u32] {
        match phase {
            Phase::Update => &self.update_list,
            Phase::LateUpdate => &self.late_update_list,
            Phase::FixedUpdate => &self.fixed_update_list,
        }
    }
}

impl fmt::Debug for UpdateDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateDispatcher")
            .field("registered", &self.registered_len())
            .field("update", &self.update_list.len())
            .field("late_update", &self.late_update_list.len())
            .field("fixed_update", &self.fixed_update_list.len())
            .finish_non_exhaustive()
    }
}

/// Removes `idx` from a membership list by swapping the tail entry into
/// its position. Membership order is not part of the contract.
fn swap_remove_index(list: &mut Vec<u32>, idx: u32) {
    if let Some(at) = list.iter().position(|&i| i == idx) {
        list.swap_remove(at);
    }
}
