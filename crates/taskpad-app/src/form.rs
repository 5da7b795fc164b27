//! Task authoring form: field state, validation, and construction.

use taskpad_core::{
    DatePatch, Task, TaskId, TaskUpdate, ValidationError, clip_date_input, normalize_date, validate_title,
};

/// Heading shown when the form creates a new task.
pub const CREATE_HEADING: &str = "Create a New To-Do Task";
/// Heading shown when the form edits an existing task.
pub const EDIT_HEADING: &str = "Edit Task";

/// What a submit of the form will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    /// Submitting appends a new task.
    #[default]
    Create,
    /// Submitting commits changes to an existing task.
    Edit(TaskId),
}

/// Field values of the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    title: String,
    date_enabled: bool,
    date: String,
    mode: FormMode,
}

impl FormState {
    /// Empty form in create mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Title as typed.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Replace the title text.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Date as typed, kept even while the date limit is switched off.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Replace the date text, clipped to the field's character limit.
    pub fn set_date(&mut self, date: &str) {
        self.date = clip_date_input(date);
    }

    /// Whether the date limit switch is on.
    #[must_use]
    pub const fn date_enabled(&self) -> bool {
        self.date_enabled
    }

    /// Flip the date limit switch. The typed date is left alone so switching
    /// back on restores it.
    pub const fn toggle_date_limit(&mut self) {
        self.date_enabled = !self.date_enabled;
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    /// Heading for the form screen.
    #[must_use]
    pub const fn heading(&self) -> &'static str {
        match self.mode {
            FormMode::Create => CREATE_HEADING,
            FormMode::Edit(_) => EDIT_HEADING,
        }
    }

    /// Clear every field and return to create mode.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    /// A new task to append.
    Created(Task),
    /// Changes for an existing task.
    Edited {
        /// Task being edited.
        id: TaskId,
        /// Field replacements.
        update: TaskUpdate,
    },
}

/// Validation and construction rules for the task form.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFormController;

impl TaskFormController {
    /// Trim the title, rejecting blank input.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyTitle`] for a blank title.
    pub fn validate(title: &str) -> Result<String, ValidationError> {
        validate_title(title)
    }

    /// Build a fresh task from raw field values.
    ///
    /// The date is dropped whenever the date limit is off and clipped to the
    /// field's character limit otherwise.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyTitle`] for a blank title.
    pub fn build(title: &str, date_enabled: bool, date: Option<&str>) -> Result<Task, ValidationError> {
        let date = date.filter(|_| date_enabled).map(str::to_owned);
        Task::new(title, date)
    }

    /// Seed form fields from an existing task, or return an empty create form.
    #[must_use]
    pub fn prefill(existing: Option<&Task>) -> FormState {
        existing.map_or_else(FormState::default, |task| FormState {
            title: task.title.clone(),
            date_enabled: task.date.is_some(),
            date: task.date.clone().unwrap_or_default(),
            mode: FormMode::Edit(task.id),
        })
    }

    /// Validate the form and turn it into an outcome, resetting the fields.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyTitle`] for a blank title; the form is
    /// left exactly as it was.
    pub fn submit(form: &mut FormState) -> Result<FormOutcome, ValidationError> {
        let outcome = match form.mode {
            FormMode::Create => {
                FormOutcome::Created(Self::build(&form.title, form.date_enabled, Some(form.date.as_str()))?)
            }
            FormMode::Edit(id) => {
                let title = Self::validate(&form.title)?;
                let date = normalize_date(Some(form.date.clone()).filter(|_| form.date_enabled))
                    .map_or(DatePatch::Clear, |date| DatePatch::Set { date });
                FormOutcome::Edited {
                    id,
                    update: TaskUpdate {
                        title: Some(title),
                        date: Some(date),
                    },
                }
            }
        };
        form.reset();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_date_limit_drops_the_date() -> Result<(), ValidationError> {
        let task = TaskFormController::build("Buy milk", false, Some("01/01/2030"))?;
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.date, None);
        assert!(!task.completed);
        Ok(())
    }

    #[test]
    fn enabled_date_limit_keeps_the_date() -> Result<(), ValidationError> {
        let task = TaskFormController::build("  Pay rent ", true, Some("05/05/2025"))?;
        assert_eq!(task.title, "Pay rent");
        assert_eq!(task.date.as_deref(), Some("05/05/2025"));
        Ok(())
    }

    #[test]
    fn build_clips_long_dates() -> Result<(), ValidationError> {
        let task = TaskFormController::build("Buy milk", true, Some("01/01/2030 and then some"))?;
        assert_eq!(task.date.as_deref(), Some("01/01/2030"));
        Ok(())
    }

    #[test]
    fn build_rejects_blank_title() {
        assert_eq!(
            TaskFormController::build("   ", true, Some("05/05/2025")),
            Err(ValidationError::EmptyTitle)
        );
    }

    #[test]
    fn prefill_without_task_is_empty() {
        let form = TaskFormController::prefill(None);
        assert_eq!(form, FormState::new());
        assert_eq!(form.heading(), CREATE_HEADING);
    }

    #[test]
    fn prefill_seeds_fields_from_task() -> Result<(), ValidationError> {
        let dated = Task::new("Pay rent", Some("05/05/2025".into()))?;
        let form = TaskFormController::prefill(Some(&dated));
        assert_eq!(form.title(), "Pay rent");
        assert_eq!(form.date(), "05/05/2025");
        assert!(form.date_enabled());
        assert_eq!(form.mode(), FormMode::Edit(dated.id));
        assert_eq!(form.heading(), EDIT_HEADING);

        let undated = Task::new("Buy milk", None)?;
        let form = TaskFormController::prefill(Some(&undated));
        assert_eq!(form.date(), "");
        assert!(!form.date_enabled());
        Ok(())
    }

    #[test]
    fn toggling_date_limit_restores_typed_date() -> Result<(), ValidationError> {
        let mut form = FormState::new();
        form.set_title("Pay rent");
        form.toggle_date_limit();
        form.set_date("05/05/2025");
        form.toggle_date_limit();
        assert_eq!(form.date(), "05/05/2025");
        form.toggle_date_limit();

        let FormOutcome::Created(task) = TaskFormController::submit(&mut form)? else {
            panic!("create form must create");
        };
        assert_eq!(task.date.as_deref(), Some("05/05/2025"));
        Ok(())
    }

    #[test]
    fn date_input_is_limited_to_ten_characters() {
        let mut form = FormState::new();
        form.set_date("05/05/20251999");
        assert_eq!(form.date(), "05/05/2025");
    }

    #[test]
    fn successful_submit_resets_form() -> Result<(), ValidationError> {
        let mut form = FormState::new();
        form.set_title("Buy milk");
        form.toggle_date_limit();
        form.set_date("01/01/2030");
        TaskFormController::submit(&mut form)?;
        assert_eq!(form, FormState::new());
        Ok(())
    }

    #[test]
    fn failed_submit_leaves_form_untouched() {
        let mut form = FormState::new();
        form.set_title("   ");
        form.toggle_date_limit();
        form.set_date("01/01/2030");
        let before = form.clone();

        assert_eq!(TaskFormController::submit(&mut form), Err(ValidationError::EmptyTitle));
        assert_eq!(form, before);
    }

    #[test]
    fn edit_submit_produces_update() -> Result<(), ValidationError> {
        let task = Task::new("Pay rent", Some("05/05/2025".into()))?;
        let mut form = TaskFormController::prefill(Some(&task));
        form.set_title("Pay rent early ");
        form.toggle_date_limit();

        let outcome = TaskFormController::submit(&mut form)?;
        assert_eq!(
            outcome,
            FormOutcome::Edited {
                id: task.id,
                update: TaskUpdate {
                    title: Some("Pay rent early".into()),
                    date: Some(DatePatch::Clear),
                },
            }
        );
        assert_eq!(form.mode(), FormMode::Create);
        Ok(())
    }
}
