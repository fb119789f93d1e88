//! Drag-to-reorder state machine.
//!
//! The controller turns a stream of pointer positions into discrete moves on
//! the [`Registry`]. It knows nothing about rendering: callers hand it the
//! geometry of every row except the dragged one, in current display order.

use super::Registry;
use tracing::debug;

/// Vertical extent of one rendered row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowGeometry {
    pub top: f64,
    pub height: f64,
}

impl RowGeometry {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Insertion index for a pointer at `pointer_y` among `other_rows`.
///
/// The first row whose midpoint lies strictly below the pointer wins; past
/// every midpoint the entry goes to the end. No rows means index 0.
pub fn target_index(pointer_y: f64, other_rows: &[RowGeometry]) -> usize {
    other_rows
        .iter()
        .position(|row| row.midpoint() > pointer_y)
        .unwrap_or(other_rows.len())
}

/// When a drag turns into a committed move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Every midpoint crossing reorders the registry on the spot.
    #[default]
    Immediate,
    /// Track the target while dragging and move once, on release.
    OnRelease,
}

/// State of one reorder gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub entry: String,
    pub start_y: f64,
    pub current_target: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// What a controller call did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragUpdate {
    Unchanged,
    Moved { from: usize, to: usize },
    /// OnRelease only: the target changed but nothing was committed yet.
    Pending { target: usize },
    /// The dragged entry vanished; the gesture was dropped without a move.
    Aborted,
}

#[derive(Debug, Default)]
pub struct ReorderController {
    state: DragState,
    policy: CommitPolicy,
}

impl ReorderController {
    pub fn new(policy: CommitPolicy) -> Self {
        Self {
            state: DragState::Idle,
            policy,
        }
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn dragged_entry(&self) -> Option<&str> {
        self.session().map(|s| s.entry.as_str())
    }

    /// Begins a gesture on the row handle of `handle`.
    ///
    /// Stays idle when the gesture did not start on a handle (`None`) or the
    /// name is not in the registry. A start while already dragging replaces
    /// the previous session.
    pub fn start(&mut self, registry: &Registry, handle: Option<&str>, pointer_y: f64) -> bool {
        let Some(name) = handle else {
            return false;
        };
        let Some(index) = registry.index_of(name) else {
            return false;
        };

        debug!(entry = name, index, "drag started");
        self.state = DragState::Dragging(DragSession {
            entry: name.to_string(),
            start_y: pointer_y,
            current_target: index,
        });
        true
    }

    /// Feeds a new pointer position.
    ///
    /// `other_rows` is the geometry of every row except the dragged one, in
    /// display order, as laid out right now.
    pub fn update(
        &mut self,
        registry: &mut Registry,
        pointer_y: f64,
        other_rows: &[RowGeometry],
    ) -> DragUpdate {
        let DragState::Dragging(session) = &mut self.state else {
            return DragUpdate::Unchanged;
        };

        let Some(current) = registry.index_of(&session.entry) else {
            debug!(entry = %session.entry, "dragged entry disappeared");
            self.state = DragState::Idle;
            return DragUpdate::Aborted;
        };

        let target = target_index(pointer_y, other_rows);

        match self.policy {
            CommitPolicy::Immediate => {
                if target == current {
                    return DragUpdate::Unchanged;
                }
                match registry.move_entry(&session.entry, target) {
                    Some(to) => {
                        // Re-anchor so the next update measures from the new slot.
                        session.start_y = pointer_y;
                        session.current_target = to;
                        DragUpdate::Moved { from: current, to }
                    }
                    None => DragUpdate::Unchanged,
                }
            }
            CommitPolicy::OnRelease => {
                if target == session.current_target {
                    DragUpdate::Unchanged
                } else {
                    session.current_target = target;
                    DragUpdate::Pending { target }
                }
            }
        }
    }

    /// Ends the gesture. Under `Immediate` the order is already final; under
    /// `OnRelease` the buffered target is committed now.
    pub fn end(&mut self, registry: &mut Registry) -> DragUpdate {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return DragUpdate::Unchanged;
        };

        let Some(current) = registry.index_of(&session.entry) else {
            return DragUpdate::Aborted;
        };

        match self.policy {
            CommitPolicy::Immediate => DragUpdate::Unchanged,
            CommitPolicy::OnRelease => match registry.move_entry(&session.entry, session.current_target)
            {
                Some(to) => DragUpdate::Moved { from: current, to },
                None => DragUpdate::Unchanged,
            },
        }
    }

    /// Drops the gesture without committing anything that is still pending.
    pub fn abort(&mut self) {
        self.state = DragState::Idle;
    }
}
