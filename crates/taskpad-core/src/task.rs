use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::TaskId;

/// Maximum number of characters accepted by the date field (`DD/MM/YYYY`).
pub const DATE_INPUT_MAX_CHARS: usize = 10;

/// Reasons a task cannot be authored from form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The title is empty once surrounding whitespace is removed.
    #[error("Please enter a task title")]
    EmptyTitle,
}

/// A single to-do item.
///
/// Deserialized tasks go through the same title and date rules as
/// [`Task::new`]; a payload without an id gets a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTask")]
pub struct Task {
    /// Stable identifier assigned at creation.
    pub id: TaskId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Optional due date as typed by the user (`DD/MM/YYYY`, not calendar checked).
    pub date: Option<String>,
    /// Whether the task has been ticked off.
    pub completed: bool,
}

#[derive(Deserialize)]
struct RawTask {
    #[serde(default = "TaskId::new")]
    id: TaskId,
    title: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    completed: bool,
}

impl TryFrom<RawTask> for Task {
    type Error = ValidationError;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.id,
            title: validate_title(&raw.title)?,
            date: normalize_date(raw.date),
            completed: raw.completed,
        })
    }
}

impl Task {
    /// Construct a new, not yet completed task with a fresh identifier.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyTitle`] when the title is blank.
    pub fn new(title: &str, date: Option<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: TaskId::new(),
            title: validate_title(title)?,
            date: normalize_date(date),
            completed: false,
        })
    }

    /// Project the task onto the persisted document schema.
    #[must_use]
    pub fn to_document(&self) -> TaskDocument {
        TaskDocument {
            title: self.title.clone(),
            date: self.date.clone(),
        }
    }
}

/// Shape of a task inside the remote `tasks` collection.
///
/// The completion flag is not part of the persisted schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDocument {
    /// Task title.
    pub title: String,
    /// Optional due date.
    pub date: Option<String>,
}

/// Field replacements applied when an edit is committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpdate {
    /// Replace the title (validated and trimmed on apply).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Patch applied to the date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DatePatch>,
}

/// Patch for the optional date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DatePatch {
    /// Overwrite with the provided text.
    Set {
        /// Date as typed by the user.
        date: String,
    },
    /// Remove the date.
    Clear,
}

impl TaskUpdate {
    /// Returns true when applying the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none()
    }
}

/// Trim the title and reject blank input.
///
/// # Errors
/// Returns [`ValidationError::EmptyTitle`] when nothing remains after trimming.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

/// Blank dates collapse to `None`; anything else is kept as opaque text
/// clipped to [`DATE_INPUT_MAX_CHARS`].
#[must_use]
pub fn normalize_date(date: Option<String>) -> Option<String> {
    date.filter(|value| !value.trim().is_empty()).map(|value| clip_date_input(&value))
}

/// Clip typed date input to the field's character limit.
#[must_use]
pub fn clip_date_input(input: &str) -> String {
    input.chars().take(DATE_INPUT_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_blank_titles() {
        assert_eq!(validate_title(""), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_title("   "), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_title("\t\n"), Err(ValidationError::EmptyTitle));
    }

    #[test]
    fn validate_trims_titles() {
        assert_eq!(validate_title("Buy milk"), Ok("Buy milk".to_owned()));
        assert_eq!(validate_title("  Buy milk \n"), Ok("Buy milk".to_owned()));
    }

    #[test]
    fn new_task_starts_incomplete() -> Result<(), ValidationError> {
        let task = Task::new(" Pay rent ", Some("05/05/2025".into()))?;
        assert_eq!(task.title, "Pay rent");
        assert_eq!(task.date.as_deref(), Some("05/05/2025"));
        assert!(!task.completed);
        Ok(())
    }

    #[test]
    fn blank_date_is_treated_as_absent() {
        assert_eq!(normalize_date(Some(String::new())), None);
        assert_eq!(normalize_date(Some("  ".into())), None);
        assert_eq!(normalize_date(Some("31/02/2030".into())).as_deref(), Some("31/02/2030"));
    }

    #[test]
    fn new_task_clips_long_dates() -> Result<(), ValidationError> {
        let task = Task::new("Buy milk", Some("01/01/2030 and then some".into()))?;
        assert_eq!(task.date.as_deref(), Some("01/01/2030"));
        Ok(())
    }

    #[test]
    fn deserializing_applies_authoring_rules() -> Result<(), serde_json::Error> {
        let task: Task = serde_json::from_str(r#"{"title": "  Buy milk ", "date": "01/01/2030xyz"}"#)?;
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.date.as_deref(), Some("01/01/2030"));
        assert!(!task.completed);

        let blank = serde_json::from_str::<Task>(r#"{"title": "   ", "date": null}"#);
        let Err(err) = blank else {
            panic!("blank title must be rejected");
        };
        assert!(err.to_string().contains("Please enter a task title"));
        Ok(())
    }

    #[test]
    fn deserializing_keeps_a_provided_id() -> Result<(), serde_json::Error> {
        let id = TaskId::new();
        let task: Task = serde_json::from_str(&format!(r#"{{"id": "{id}", "title": "Pay rent", "completed": true}}"#))?;
        assert_eq!(task.id, id);
        assert!(task.completed);
        Ok(())
    }

    #[test]
    fn date_input_is_clipped_to_ten_characters() {
        assert_eq!(clip_date_input("01/01/20301"), "01/01/2030");
        assert_eq!(clip_date_input("01/01"), "01/01");
    }

    #[test]
    fn document_omits_completion_flag() -> Result<(), ValidationError> {
        let mut task = Task::new("Buy milk", None)?;
        task.completed = true;
        let json = serde_json::to_value(task.to_document())
            .unwrap_or_else(|err| panic!("serialize document: {err}"));
        assert_eq!(json, serde_json::json!({ "title": "Buy milk", "date": null }));
        Ok(())
    }
}
