//! The list and form screens wired together.

use taskpad_core::{StoreError, Task, TaskId, TaskStore, ValidationError};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::{Screen, ScreenBridge, ScreenParams};
use crate::config::ProjectConfig;
use crate::form::{FormOutcome, FormState, TaskFormController};
use crate::persistence::{DocumentCollection, FailureFeed, MemoryCollection, PersistenceFailure, PersistenceGateway};

/// Errors surfaced to the user by session actions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The form input was rejected; the form is unchanged.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The referenced task is not in the list.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A form action was attempted while the list is shown.
    #[error("the task form is not open")]
    FormNotOpen,
}

/// What happened on a successful submit.
#[derive(Debug)]
pub struct Submission {
    /// Task appended or edited.
    pub task: TaskId,
    /// Detached remote write, when a new task was saved. Dropping it does not
    /// cancel the write.
    pub save: Option<JoinHandle<()>>,
}

/// State of the running application: the task list, the form, and the
/// payloads travelling between them.
pub struct TodoSession<C = MemoryCollection> {
    store: TaskStore,
    form: FormState,
    bridge: ScreenBridge,
    screen: Screen,
    gateway: Option<PersistenceGateway<C>>,
    failures: Option<FailureFeed>,
}

impl TodoSession {
    /// Session that keeps tasks locally only.
    #[must_use]
    pub fn offline() -> Self {
        Self::from_parts(None)
    }
}

impl<C: DocumentCollection> TodoSession<C> {
    /// Session saving every new task through `gateway`.
    #[must_use]
    pub fn with_gateway(gateway: PersistenceGateway<C>, failures: FailureFeed) -> Self {
        Self::from_parts(Some((gateway, failures)))
    }

    /// Session configured from `config`, writing to `collection` when
    /// persistence is enabled.
    #[must_use]
    pub fn from_config(config: &ProjectConfig, collection: C, runtime: Handle) -> Self {
        if !config.persistence.enabled {
            info!("remote persistence disabled");
            return Self::from_parts(None);
        }
        let (gateway, failures) = PersistenceGateway::new(collection, config.persistence.collection.clone(), runtime);
        Self::with_gateway(gateway, failures)
    }

    fn from_parts(persistence: Option<(PersistenceGateway<C>, FailureFeed)>) -> Self {
        let (gateway, failures) = persistence.unzip();
        Self {
            store: TaskStore::new(),
            form: FormState::new(),
            bridge: ScreenBridge::new(),
            screen: Screen::List,
            gateway,
            failures,
        }
    }

    /// Screen currently shown.
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    /// Tasks in display order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.store.list()
    }

    /// Borrow the task list.
    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Borrow the form fields.
    #[must_use]
    pub const fn form(&self) -> &FormState {
        &self.form
    }

    /// Edit the form fields.
    ///
    /// # Errors
    /// Returns [`SessionError::FormNotOpen`] while the list is shown.
    pub fn form_mut(&mut self) -> Result<&mut FormState, SessionError> {
        self.require_form()?;
        Ok(&mut self.form)
    }

    /// Backing document collection, when persistence is on.
    #[must_use]
    pub fn collection(&self) -> Option<&C> {
        self.gateway.as_ref().map(PersistenceGateway::collection)
    }

    /// Whether new tasks are written remotely.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.gateway.is_some()
    }

    /// Show an empty create form.
    pub fn open_create_form(&mut self) {
        self.form = TaskFormController::prefill(None);
        self.navigate(Screen::Form);
    }

    /// Show the form prefilled with the task carrying `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] for an unknown id.
    pub fn open_edit_form(&mut self, id: TaskId) -> Result<(), SessionError> {
        let task = self.store.get(id).cloned().ok_or(StoreError::TaskNotFound(id))?;
        self.bridge.send(Screen::Form, ScreenParams::TaskToEdit(task));
        self.navigate(Screen::Form);
        Ok(())
    }

    /// Leave the form without submitting.
    pub fn close_form(&mut self) {
        self.navigate(Screen::List);
    }

    /// Submit the form and return to the list.
    ///
    /// A new task is appended and saved in the background; an edit is
    /// committed to the list.
    ///
    /// # Errors
    /// Returns [`SessionError::Validation`] for a blank title (the user stays
    /// on the unchanged form), [`SessionError::FormNotOpen`] when no form is
    /// shown, and [`SessionError::Store`] when the edited task was removed, in
    /// which case the typed edit is kept on the open form.
    pub fn submit_form(&mut self) -> Result<Submission, SessionError> {
        self.require_form()?;
        let typed = self.form.clone();
        let params = match TaskFormController::submit(&mut self.form)? {
            FormOutcome::Created(task) => ScreenParams::NewTask(task),
            FormOutcome::Edited { id, update } => ScreenParams::EditedTask { id, update },
        };
        self.bridge.send(Screen::List, params);
        self.screen = Screen::List;

        let mut submission = None;
        while let Some(params) = self.bridge.take(Screen::List) {
            match self.apply_to_list(params) {
                Ok(applied) => submission = Some(applied),
                Err(error) => {
                    self.form = typed;
                    self.screen = Screen::Form;
                    return Err(error);
                }
            }
        }
        submission.ok_or(SessionError::FormNotOpen)
    }

    /// Delete the task carrying `id` once `confirm` agrees.
    ///
    /// Declining leaves the list untouched and returns `None`.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] for an unknown id.
    pub fn request_delete(
        &mut self,
        id: TaskId,
        confirm: impl FnOnce(&Task) -> bool,
    ) -> Result<Option<Task>, SessionError> {
        let task = self.store.get(id).ok_or(StoreError::TaskNotFound(id))?;
        if !confirm(task) {
            debug!(task = %id, "deletion declined");
            return Ok(None);
        }
        Ok(Some(self.store.remove(id)?))
    }

    /// Flip the completion flag of the task carrying `id`.
    ///
    /// # Errors
    /// Returns [`StoreError::TaskNotFound`] for an unknown id.
    pub fn toggle(&mut self, id: TaskId) -> Result<bool, SessionError> {
        Ok(self.store.toggle(id)?)
    }

    /// Remote write failures delivered since the last call.
    pub fn drain_failures(&mut self) -> Vec<PersistenceFailure> {
        self.failures.as_mut().map(FailureFeed::drain).unwrap_or_default()
    }

    fn require_form(&self) -> Result<(), SessionError> {
        if self.screen == Screen::Form {
            Ok(())
        } else {
            Err(SessionError::FormNotOpen)
        }
    }

    fn navigate(&mut self, screen: Screen) {
        debug!(from = ?self.screen, to = ?screen, "navigate");
        self.screen = screen;
        while let Some(params) = self.bridge.take(screen) {
            match (screen, params) {
                (Screen::Form, ScreenParams::TaskToEdit(task)) => {
                    self.form = TaskFormController::prefill(Some(&task));
                }
                (Screen::List, params) => {
                    if let Err(error) = self.apply_to_list(params) {
                        warn!(%error, "dropped list payload");
                    }
                }
                (Screen::Form, other) => warn!(?other, "unexpected form payload"),
            }
        }
    }

    fn apply_to_list(&mut self, params: ScreenParams) -> Result<Submission, SessionError> {
        match params {
            ScreenParams::NewTask(task) => {
                let id = self.store.append(task.clone());
                let save = self.gateway.as_ref().map(|gateway| gateway.save_detached(task));
                info!(task = %id, "task added");
                Ok(Submission { task: id, save })
            }
            ScreenParams::EditedTask { id, update } => {
                self.store.update(id, update)?;
                Ok(Submission { task: id, save: None })
            }
            ScreenParams::TaskToEdit(task) => {
                warn!(task = %task.id, "edit intent sent to the list");
                Ok(Submission {
                    task: task.id,
                    save: None,
                })
            }
        }
    }
}
