//! Deferred work: one-tick tasks and the click/double-click debounce.
//!
//! The engine never reads a clock or spawns callbacks. Hosts run queued
//! tasks on the next turn of their event loop and feed the current time
//! through `tick`.

use crate::scene::EditSurface;
use eb_core::id::ShapeId;
use std::collections::VecDeque;

/// Work that must wait one event-loop turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Focus and select-all once the live surface is laid out.
    FocusEdit { shape: ShapeId, surface: EditSurface },
    /// Classify where focus went after the edit surface blurred.
    ResolveBlur { shape: ShapeId },
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    tasks: VecDeque<Deferred>,
}

impl DeferredQueue {
    pub fn push(&mut self, task: Deferred) {
        self.tasks.push_back(task);
    }

    /// Take everything queued so far. Tasks queued while these run wait for
    /// the following turn.
    pub fn take_all(&mut self) -> Vec<Deferred> {
        self.tasks.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// A single click waiting to see whether a double-click follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingClick {
    pub shape: ShapeId,
    pub due_ms: f64,
    /// The shape was being edited when the click landed.
    pub was_editing: bool,
}

#[derive(Debug, Default)]
pub struct ClickDebouncer {
    pending: Option<PendingClick>,
}

impl ClickDebouncer {
    /// Start the debounce window for a click. A pending click on the same
    /// shape is invalidated; one on another shape is returned so the caller
    /// can fire it right away.
    pub fn schedule(&mut self, click: PendingClick) -> Option<PendingClick> {
        match self.pending.replace(click) {
            Some(prev) if prev.shape != click.shape => Some(prev),
            _ => None,
        }
    }

    /// Cancel a pending click on `shape`. Returns whether one was pending.
    pub fn cancel(&mut self, shape: ShapeId) -> bool {
        if self.pending.is_some_and(|p| p.shape == shape) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Take the pending click regardless of its deadline.
    pub fn flush(&mut self) -> Option<PendingClick> {
        self.pending.take()
    }

    /// Take the pending click if its window has elapsed.
    pub fn take_due(&mut self, now_ms: f64) -> Option<PendingClick> {
        if self.pending.is_some_and(|p| now_ms >= p.due_ms) {
            self.pending.take()
        } else {
            None
        }
    }

    pub fn pending(&self) -> Option<&PendingClick> {
        self.pending.as_ref()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.pending.map(|p| p.due_ms)
    }
}
