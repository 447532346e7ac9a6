//! The Form State Controller: step navigation, per-step gating, draft
//! persistence and submission for the ten-step wizard.
//!
//! All wizard state lives in an explicit, serialisable [`WizardState`].
//! [`FormController`] owns that state together with a [`DraftStorage`]
//! backend and mirrors the state to it after every change.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  draft::{ApplicationDraft, ChipTarget, FieldChange},
  error::DraftError,
  step::Step,
  submission::{SubmissionReceipt, SubmitApplication, SubmitFailure},
  validate::{ValidationErrors, validate, validate_step},
};

// ─── Storage ─────────────────────────────────────────────────────────────────

/// Somewhere to keep the serialised wizard state between sessions. Holds a
/// single value that is overwritten on every change and read once at
/// start-up.
pub trait DraftStorage {
  fn load(&self) -> Result<Option<String>>;
  fn save(&mut self, data: &str) -> Result<()>;
  fn clear(&mut self) -> Result<()>;
}

/// Process-local storage. `quota` simulates a full backing store: writes
/// larger than it fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
  pub data:  Option<String>,
  pub quota: Option<usize>,
}

impl DraftStorage for MemoryStorage {
  fn load(&self) -> Result<Option<String>> { Ok(self.data.clone()) }

  fn save(&mut self, data: &str) -> Result<()> {
    if self.quota.is_some_and(|q| data.len() > q) {
      return Err(Error::Storage("quota exceeded".to_owned()));
    }
    self.data = Some(data.to_owned());
    Ok(())
  }

  fn clear(&mut self) -> Result<()> {
    self.data = None;
    Ok(())
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardState {
  pub step:  Step,
  pub draft: ApplicationDraft,
}

impl WizardState {
  /// Validate the current step and move forward only if it is clean.
  pub fn advance(&mut self) -> Navigation {
    let Some(next) = self.step.next() else {
      return Navigation::AtEnd;
    };
    let errors = validate_step(&self.draft, self.step);
    if !errors.is_empty() {
      return Navigation::Blocked(errors);
    }
    self.step = next;
    Navigation::Advanced { to: next, scroll_to_top: true }
  }

  /// Unconditional move to the previous step.
  pub fn back(&mut self) -> Step {
    if let Some(prev) = self.step.previous() {
      self.step = prev;
    }
    self.step
  }

  /// Unconditional jump, as used by the review screen's edit shortcuts.
  pub fn jump(&mut self, step: Step) { self.step = step; }
}

/// The result of [`FormController::next`].
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
  Advanced { to: Step, scroll_to_top: bool },
  Blocked(ValidationErrors),
  /// Already on the review step; submission is the only way forward.
  AtEnd,
}

/// The result of a submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
  Submitted(SubmissionReceipt),
  /// Local or server-side validation failed; the wizard now shows `step`.
  Invalid { step: Step, errors: ValidationErrors },
  /// The email is already registered.
  Conflict(String),
  /// Transport or server failure. The user may try again.
  Failed(String),
  AlreadySubmitting,
  NotOnReview,
}

/// One block of the review screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSection {
  pub step:   Step,
  pub title:  &'static str,
  pub fields: Vec<(&'static str, Value)>,
}

// ─── Controller ──────────────────────────────────────────────────────────────

pub struct FormController<D> {
  state:      WizardState,
  storage:    D,
  errors:     ValidationErrors,
  notice:     Option<String>,
  submitting: bool,
  persisted:  bool,
}

impl<D: DraftStorage> FormController<D> {
  /// Restore the wizard from `storage`. Unreadable or corrupt data is
  /// discarded and the wizard starts empty.
  pub fn hydrate(storage: D) -> Self {
    let mut state = match storage.load() {
      Ok(Some(raw)) => match serde_json::from_str::<WizardState>(&raw) {
        Ok(state) => {
          debug!(step = state.step.number(), "restored draft");
          state
        }
        Err(e) => {
          warn!(error = %e, "discarding corrupt saved draft");
          WizardState::default()
        }
      },
      Ok(None) => WizardState::default(),
      Err(e) => {
        warn!(error = %e, "could not read saved draft; starting empty");
        WizardState::default()
      }
    };
    state.draft.seed_english();

    Self {
      state,
      storage,
      errors: ValidationErrors::new(),
      notice: None,
      submitting: false,
      persisted: true,
    }
  }

  pub fn state(&self) -> &WizardState { &self.state }

  pub fn step(&self) -> Step { self.state.step }

  pub fn draft(&self) -> &ApplicationDraft { &self.state.draft }

  /// Field errors currently on display.
  pub fn errors(&self) -> &ValidationErrors { &self.errors }

  /// A form-level message (conflict, retry prompt, step jump reason).
  pub fn notice(&self) -> Option<&str> { self.notice.as_deref() }

  pub fn is_submitting(&self) -> bool { self.submitting }

  /// Whether the last write to storage succeeded.
  pub fn persisted(&self) -> bool { self.persisted }

  pub fn storage(&self) -> &D { &self.storage }

  /// Apply one edit and persist the whole state. Errors shown for the
  /// edited field are cleared.
  pub fn apply(&mut self, change: FieldChange) -> Result<(), DraftError> {
    let field = changed_field(&change);
    self.state.draft.apply(change)?;
    self.errors = ValidationErrors::from(
      self
        .errors
        .iter()
        .filter(|e| e.path.first_key() != Some(field.as_str()))
        .cloned()
        .collect::<Vec<_>>(),
    );
    self.persist();
    Ok(())
  }

  pub fn next(&mut self) -> Navigation {
    let nav = self.state.advance();
    match &nav {
      Navigation::Advanced { .. } => {
        self.errors = ValidationErrors::new();
        self.notice = None;
        self.persist();
      }
      Navigation::Blocked(errors) => self.errors = errors.clone(),
      Navigation::AtEnd => {}
    }
    nav
  }

  pub fn previous(&mut self) -> Step {
    let step = self.state.back();
    self.persist();
    step
  }

  pub fn go_to(&mut self, step: Step) {
    self.state.jump(step);
    self.persist();
  }

  /// Read-only view of every field, grouped by step.
  pub fn review(&self) -> Vec<ReviewSection> {
    let tree = serde_json::to_value(&self.state.draft).unwrap_or(Value::Null);
    Step::ALL
      .into_iter()
      .filter(|s| *s != Step::Review)
      .map(|step| ReviewSection {
        step,
        title: step.title(),
        fields: step
          .fields()
          .map(|f| (f, tree.get(f).cloned().unwrap_or(Value::Null)))
          .collect(),
      })
      .collect()
  }

  /// Validate the whole draft and take the submission slot. On success the
  /// caller sends the returned draft and reports back through
  /// [`finish_submit`](Self::finish_submit).
  pub fn begin_submit(&mut self) -> Result<ApplicationDraft, SubmitOutcome> {
    if self.submitting {
      return Err(SubmitOutcome::AlreadySubmitting);
    }
    if self.state.step != Step::Review {
      return Err(SubmitOutcome::NotOnReview);
    }
    if let Err(errors) = validate(&self.state.draft) {
      return Err(self.show_errors(errors));
    }
    self.submitting = true;
    self.notice = None;
    Ok(self.state.draft.clone())
  }

  /// Release the submission slot and act on the server's answer.
  pub fn finish_submit(
    &mut self,
    result: std::result::Result<SubmissionReceipt, SubmitFailure>,
  ) -> SubmitOutcome {
    self.submitting = false;
    match result {
      Ok(receipt) => {
        info!(id = %receipt.id, "application submitted");
        if let Err(e) = self.storage.clear() {
          warn!(error = %e, "could not clear saved draft");
        }
        self.state = WizardState::default();
        self.state.draft.seed_english();
        self.errors = ValidationErrors::new();
        SubmitOutcome::Submitted(receipt)
      }
      Err(SubmitFailure::Fields(errors)) => self.show_errors(errors),
      Err(SubmitFailure::Conflict(message)) => {
        self.notice = Some(message.clone());
        SubmitOutcome::Conflict(message)
      }
      Err(SubmitFailure::Transport(message)) => {
        warn!(%message, "submission failed");
        self.notice = Some("Failed to submit application. Please try again.".to_owned());
        SubmitOutcome::Failed(message)
      }
    }
  }

  /// Validate, send through `client` and apply the result. A failed
  /// attempt is never retried automatically.
  pub async fn submit<C: SubmitApplication>(&mut self, client: &C) -> SubmitOutcome {
    let draft = match self.begin_submit() {
      Ok(draft) => draft,
      Err(outcome) => return outcome,
    };
    let result = client.submit(&draft).await;
    self.finish_submit(result)
  }

  /// Display `errors` and jump to the earliest step holding one.
  fn show_errors(&mut self, errors: ValidationErrors) -> SubmitOutcome {
    let step = errors.first_step().unwrap_or(self.state.step);
    self.state.step = step;
    self.notice =
      Some(format!("Please fix the errors in step {} ({})", step.number(), step.title()));
    self.errors = errors.clone();
    self.persist();
    SubmitOutcome::Invalid { step, errors }
  }

  fn persist(&mut self) {
    let saved = serde_json::to_string(&self.state)
      .map_err(Error::from)
      .and_then(|raw| self.storage.save(&raw));
    self.persisted = match saved {
      Ok(()) => true,
      Err(e) => {
        warn!(error = %e, "could not save draft; continuing in memory");
        false
      }
    };
  }
}

/// The top-level field an edit touches.
fn changed_field(change: &FieldChange) -> String {
  match change {
    FieldChange::Set { path, .. } => path.first_key().unwrap_or_default().to_owned(),
    FieldChange::AddRow(list) | FieldChange::RemoveRow { list, .. } => list.name().to_owned(),
    FieldChange::AddChip { target, .. } | FieldChange::RemoveChip { target, .. } => {
      match target {
        ChipTarget::PortfolioLinks => "portfolioLinks",
        ChipTarget::SkillTags(_) => "skills",
        ChipTarget::ExperienceLinks(_)
        | ChipTarget::ExperienceAchievements(_)
        | ChipTarget::ExperienceCategories(_) => "experiences",
      }
      .to_owned()
    }
  }
}
