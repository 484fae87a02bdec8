//! Store state as a reducer.
//!
//! At most one operation is in flight, recorded as a single `Option<Operation>`,
//! and every category has one error slot. All busy flags derive from that one
//! field, so two of them can never be true at once.

use std::fmt;

use schedule_core::model::{Schedule, User};
use schedule_core::validation::ValidationError;

use crate::error::SyncError;

/// Every request the store can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Fetch,
    AddCourse,
    RemoveCourse,
    RemoveEvent,
    AddCustomEvent,
    Undo,
    Redo,
    Save,
    Load,
    Create,
    Delete,
    Share,
}

/// Error slot an operation reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Fetch and course/event edits.
    Schedule,
    Save,
    /// Load, create and delete by name.
    Control,
    CustomEvent,
    /// Undo and redo.
    History,
    Share,
}

impl Operation {
    pub fn category(self) -> Category {
        match self {
            Operation::Fetch
            | Operation::AddCourse
            | Operation::RemoveCourse
            | Operation::RemoveEvent => Category::Schedule,
            Operation::AddCustomEvent => Category::CustomEvent,
            Operation::Undo | Operation::Redo => Category::History,
            Operation::Save => Category::Save,
            Operation::Load | Operation::Create | Operation::Delete => Category::Control,
            Operation::Share => Category::Share,
        }
    }

    /// Whether the operation acts on the active schedule.
    pub fn needs_schedule(self) -> bool {
        matches!(
            self,
            Operation::AddCourse
                | Operation::RemoveCourse
                | Operation::RemoveEvent
                | Operation::AddCustomEvent
                | Operation::Undo
                | Operation::Redo
                | Operation::Save
        )
    }

    /// Message used when a 409 means a conflict with existing data.
    pub fn conflict_message(self) -> Option<&'static str> {
        match self {
            Operation::AddCourse => Some("Conflict detected. Course not added."),
            Operation::AddCustomEvent => Some("Conflict detected. Event not added."),
            Operation::Create => Some("A schedule with this name already exists."),
            _ => None,
        }
    }

    fn no_schedule_message(self) -> &'static str {
        match self {
            Operation::AddCourse => "Please load or create a schedule to add courses.",
            Operation::RemoveCourse => "Please load or create a schedule to remove courses.",
            Operation::RemoveEvent => "Please load or create a schedule to remove events.",
            Operation::AddCustomEvent => "Please load or create a schedule to add events.",
            Operation::Undo | Operation::Redo => "No active schedule to undo or redo.",
            Operation::Save => "No active schedule to save.",
            _ => "No active schedule.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::AddCourse => "add-course",
            Operation::RemoveCourse => "remove-course",
            Operation::RemoveEvent => "remove-event",
            Operation::AddCustomEvent => "add-custom-event",
            Operation::Undo => "undo",
            Operation::Redo => "redo",
            Operation::Save => "save",
            Operation::Load => "load",
            Operation::Create => "create",
            Operation::Delete => "delete",
            Operation::Share => "share",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One error string per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSlots {
    schedule: Option<String>,
    save: Option<String>,
    control: Option<String>,
    custom_event: Option<String>,
    history: Option<String>,
    share: Option<String>,
}

impl ErrorSlots {
    pub fn get(&self, category: Category) -> Option<&str> {
        match category {
            Category::Schedule => self.schedule.as_deref(),
            Category::Save => self.save.as_deref(),
            Category::Control => self.control.as_deref(),
            Category::CustomEvent => self.custom_event.as_deref(),
            Category::History => self.history.as_deref(),
            Category::Share => self.share.as_deref(),
        }
    }

    pub fn set(&mut self, category: Category, message: impl Into<String>) {
        *self.slot_mut(category) = Some(message.into());
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Non-empty slots.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> + '_ {
        [
            Category::Schedule,
            Category::Save,
            Category::Control,
            Category::CustomEvent,
            Category::History,
            Category::Share,
        ]
        .into_iter()
        .filter_map(|c| self.get(c).map(|m| (c, m)))
    }

    fn slot_mut(&mut self, category: Category) -> &mut Option<String> {
        match category {
            Category::Schedule => &mut self.schedule,
            Category::Save => &mut self.save,
            Category::Control => &mut self.control,
            Category::CustomEvent => &mut self.custom_event,
            Category::History => &mut self.history,
            Category::Share => &mut self.share,
        }
    }
}

/// Handle for an accepted operation.
///
/// Results are applied only while the identity that started the operation is
/// still current; the guard itself is released regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub op: Operation,
    epoch: u64,
}

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub user: Option<User>,
    /// `None` until fetched (or after a failed fetch); the placeholder when the
    /// service has no active schedule.
    pub schedule: Option<Schedule>,
    pub in_flight: Option<Operation>,
    pub errors: ErrorSlots,
    pub save_success: bool,
    pub save_generation: u64,
    /// Path portion of the last minted share link.
    pub share_path: Option<String>,
    epoch: u64,
}

impl StoreState {
    /// Precondition checks and guard acquisition, in one step.
    ///
    /// Order: signed in, active schedule (when needed), argument shape, nothing
    /// else in flight. The first three record their error in the operation's
    /// slot; a busy rejection touches nothing.
    pub fn begin<A>(
        &mut self,
        op: Operation,
        args: Result<A, ValidationError>,
    ) -> Result<(Ticket, A), SyncError> {
        let checked = if self.user.is_none() {
            Err(SyncError::NotAuthenticated)
        } else if op.needs_schedule() && !self.has_active_schedule() {
            Err(SyncError::NoActiveSchedule(op.no_schedule_message().to_string()))
        } else {
            args.map_err(SyncError::from)
        };
        let args = match checked {
            Ok(args) => args,
            Err(e) => {
                self.errors.set(op.category(), e.to_string());
                return Err(e);
            }
        };
        if let Some(current) = self.in_flight {
            return Err(SyncError::Busy(current));
        }

        self.in_flight = Some(op);
        self.errors.clear_all();
        self.save_success = false;
        if op == Operation::Share {
            self.share_path = None;
        }
        Ok((
            Ticket {
                op,
                epoch: self.epoch,
            },
            args,
        ))
    }

    /// Whether results for `ticket` should still be applied.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.epoch == ticket.epoch
    }

    /// Replaces the snapshot wholesale.
    pub fn succeed_with(&mut self, ticket: Ticket, schedule: Schedule) {
        if self.is_current(ticket) {
            self.schedule = Some(schedule);
        }
    }

    /// Records a failure. Prior schedule state is kept, except that a failed
    /// fetch leaves nothing to show.
    pub fn fail(&mut self, ticket: Ticket, error: &SyncError) {
        if !self.is_current(ticket) {
            return;
        }
        self.errors.set(ticket.op.category(), error.to_string());
        if ticket.op == Operation::Fetch {
            self.schedule = None;
        }
    }

    /// Releases the guard.
    pub fn finish(&mut self, ticket: Ticket) {
        if self.in_flight == Some(ticket.op) {
            self.in_flight = None;
        }
    }

    pub fn mark_saved(&mut self, ticket: Ticket) -> Option<u64> {
        if !self.is_current(ticket) {
            return None;
        }
        self.save_success = true;
        self.save_generation += 1;
        Some(self.save_generation)
    }

    /// Clears the save flag unless a newer save has happened since.
    pub fn clear_save_success(&mut self, generation: u64) -> bool {
        if self.save_success && self.save_generation == generation {
            self.save_success = false;
            true
        } else {
            false
        }
    }

    /// New identity. Any result still in flight for the previous one is dropped;
    /// the guard stays held until that request returns.
    pub fn switch_user(&mut self, user: Option<User>) {
        self.epoch += 1;
        self.user = user;
        self.schedule = None;
        self.errors.clear_all();
        self.save_success = false;
        self.share_path = None;
    }

    pub fn has_active_schedule(&self) -> bool {
        self.schedule.as_ref().is_some_and(|s| !s.is_placeholder())
    }

    pub fn error(&self, category: Category) -> Option<&str> {
        self.errors.get(category)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Fetch or a course/event edit.
    pub fn is_loading(&self) -> bool {
        self.in_flight.map(Operation::category) == Some(Category::Schedule)
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight == Some(Operation::Save)
    }

    pub fn is_control_loading(&self) -> bool {
        self.in_flight.map(Operation::category) == Some(Category::Control)
    }

    pub fn is_adding_custom(&self) -> bool {
        self.in_flight == Some(Operation::AddCustomEvent)
    }

    pub fn is_undoing(&self) -> bool {
        self.in_flight == Some(Operation::Undo)
    }

    pub fn is_redoing(&self) -> bool {
        self.in_flight == Some(Operation::Redo)
    }

    pub fn is_sharing(&self) -> bool {
        self.in_flight == Some(Operation::Share)
    }
}
