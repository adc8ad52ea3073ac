//! Field validators for tasks.
//!
//! Each validator checks exactly one field and returns a
//! [`ValidationResult`]; validators never fail to return. Validators are
//! combined into a [`TaskValidator`] that runs them in a fixed order
//! (title, description, due date) and stops at the first failure, so the
//! surfaced message is deterministic.

use crate::task::{Task, Timestamp};

/// Minimum title length in characters.
pub const MIN_TITLE_LENGTH: usize = 3;

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 50;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Outcome of a single validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The value satisfies the rule.
    Valid,
    /// The value violates the rule; the message is user-facing.
    Invalid(String),
}

impl ValidationResult {
    /// Returns `true` for [`ValidationResult::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Runs `next` only if this result is valid.
    ///
    /// This is the short-circuit used to chain validators: the first
    /// `Invalid` wins and later validators are never evaluated.
    #[must_use]
    pub fn and_then(self, next: impl FnOnce() -> Self) -> Self {
        match self {
            Self::Valid => next(),
            invalid @ Self::Invalid(_) => invalid,
        }
    }

    /// Converts into a `Result`, keeping the message on failure.
    ///
    /// # Errors
    ///
    /// Returns the invalid message if the result is not valid.
    pub fn into_result(self) -> Result<(), String> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(message) => Err(message),
        }
    }
}

/// A rule over a single value.
pub trait Validator<T: ?Sized> {
    /// Checks `value` against the rule.
    fn validate(&self, value: &T) -> ValidationResult;
}

/// Title must be non-blank and between 3 and 50 characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleValidator;

impl Validator<str> for TitleValidator {
    fn validate(&self, value: &str) -> ValidationResult {
        let len = value.chars().count();
        if value.trim().is_empty() {
            ValidationResult::Invalid("Title cannot be empty".to_string())
        } else if len < MIN_TITLE_LENGTH {
            ValidationResult::Invalid(format!(
                "Title must be at least {MIN_TITLE_LENGTH} characters"
            ))
        } else if len > MAX_TITLE_LENGTH {
            ValidationResult::Invalid(format!(
                "Title cannot exceed {MAX_TITLE_LENGTH} characters"
            ))
        } else {
            ValidationResult::Valid
        }
    }
}

/// Description may be empty but not longer than 500 characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionValidator;

impl Validator<str> for DescriptionValidator {
    fn validate(&self, value: &str) -> ValidationResult {
        if value.chars().count() > MAX_DESCRIPTION_LENGTH {
            ValidationResult::Invalid(format!(
                "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters"
            ))
        } else {
            ValidationResult::Valid
        }
    }
}

/// Due date, when present, must not be in the past.
#[derive(Debug, Clone, Copy, Default)]
pub struct DueDateValidator;

impl DueDateValidator {
    /// Validates against an explicit clock reading.
    ///
    /// A due date equal to `now` is accepted; only strictly earlier
    /// timestamps are rejected.
    #[must_use]
    pub fn validate_at(&self, value: Option<Timestamp>, now: Timestamp) -> ValidationResult {
        match value {
            Some(due) if due < now => {
                ValidationResult::Invalid("Due date cannot be in the past".to_string())
            }
            _ => ValidationResult::Valid,
        }
    }
}

impl Validator<Option<Timestamp>> for DueDateValidator {
    fn validate(&self, value: &Option<Timestamp>) -> ValidationResult {
        self.validate_at(*value, Timestamp::now())
    }
}

/// Ordered validator chain for whole tasks.
///
/// Runs title, then description, then (if enabled) due date. The
/// due-date rule only makes sense for new tasks: an existing task whose
/// deadline has passed must still accept edits.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskValidator {
    title: TitleValidator,
    description: DescriptionValidator,
    due_date: Option<DueDateValidator>,
}

impl TaskValidator {
    /// Chain for creating tasks: title, description, due date.
    #[must_use]
    pub const fn for_create() -> Self {
        Self {
            title: TitleValidator,
            description: DescriptionValidator,
            due_date: Some(DueDateValidator),
        }
    }

    /// Chain for updating tasks: title, description.
    #[must_use]
    pub const fn for_update() -> Self {
        Self {
            title: TitleValidator,
            description: DescriptionValidator,
            due_date: None,
        }
    }

    /// Validates `task` against the chain using `now` for time rules.
    #[must_use]
    pub fn validate_at(&self, task: &Task, now: Timestamp) -> ValidationResult {
        self.title
            .validate(task.title.as_str())
            .and_then(|| self.description.validate(task.description.as_str()))
            .and_then(|| {
                self.due_date
                    .map_or(ValidationResult::Valid, |v| v.validate_at(task.due_date, now))
            })
    }
}

impl Validator<Task> for TaskValidator {
    fn validate(&self, task: &Task) -> ValidationResult {
        self.validate_at(task, Timestamp::now())
    }
}
