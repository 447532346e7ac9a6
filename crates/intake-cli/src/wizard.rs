//! Applicant commands: edit, navigate and submit the saved draft.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Subcommand;
use intake_core::{
  draft::{ChipTarget, FieldChange, ListField},
  error::DraftError,
  step::Step,
  validate::{FieldPath, ValidationErrors},
  wizard::{DraftStorage, FormController, Navigation, SubmitOutcome},
};
use serde_json::Value;

use crate::client::{ApiClient, UploadKind};

#[derive(Subcommand, Debug)]
pub enum WizardCommand {
  /// Show the current step, its errors and any notice.
  Status,
  /// Print every answer grouped by step.
  Show,
  /// Set a field, e.g. `set firstName Ada` or `set skills.0.level expert`.
  /// Values are read as JSON where possible, otherwise as text.
  Set { path: String, value: String },
  /// Append an empty row to `languages`, `socialProfiles`, `skills` or
  /// `experiences`.
  AddRow { list: String },
  RemoveRow { list: String, index: usize },
  /// Add a chip to `portfolioLinks`, `skills.N.tags`, `experiences.N.links`,
  /// `experiences.N.achievements` or `experiences.N.categoryIds`.
  AddChip { target: String, value: String },
  RemoveChip { target: String, value: String },
  /// Validate the current step and move to the next one.
  Next,
  Back,
  /// Jump to a step (1-10).
  Goto { step: u8 },
  /// Send the completed application from the review step.
  Submit,
  /// Ask the server whether an email is still free. Defaults to the
  /// draft's email.
  CheckEmail { email: Option<String> },
  /// Upload a file and attach its URL to the draft.
  Upload {
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = UploadKind::Resume)]
    kind: UploadKind,
  },
}

pub async fn run<D: DraftStorage>(
  wizard: &mut FormController<D>,
  client: &ApiClient,
  command: WizardCommand,
) -> Result<()> {
  match command {
    WizardCommand::Status => print_status(wizard),
    WizardCommand::Show => print_review(wizard),
    WizardCommand::Set { path, value } => {
      set_field(wizard, &path, &value)?;
      print_status(wizard);
    }
    WizardCommand::AddRow { list } => {
      let list = parse_list(&list)?;
      wizard.apply(FieldChange::AddRow(list))?;
      println!("Added a row to {}.", list.name());
    }
    WizardCommand::RemoveRow { list, index } => {
      let list = parse_list(&list)?;
      wizard.apply(FieldChange::RemoveRow { list, index })?;
      println!("Removed {}[{index}].", list.name());
    }
    WizardCommand::AddChip { target, value } => {
      let target = parse_chip(&target)?;
      wizard.apply(FieldChange::AddChip { target, value })?;
    }
    WizardCommand::RemoveChip { target, value } => {
      let target = parse_chip(&target)?;
      wizard.apply(FieldChange::RemoveChip { target, value })?;
    }
    WizardCommand::Next => report_navigation(wizard.next())?,
    WizardCommand::Back => {
      let step = wizard.previous();
      print_step(step);
    }
    WizardCommand::Goto { step } => {
      wizard.go_to(Step::from_number(step)?);
      print_status(wizard);
    }
    WizardCommand::Submit => report_submit(wizard.submit(client).await)?,
    WizardCommand::CheckEmail { email } => {
      let email = email
        .or_else(|| wizard.draft().email.clone())
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| anyhow!("no email given and none in the draft"))?;
      if client.check_email(&email).await? {
        println!("{email} is available.");
      } else {
        println!("An application with {email} already exists.");
      }
    }
    WizardCommand::Upload { file, kind } => {
      let receipt = client.upload(&file, kind).await?;
      let field = match kind {
        UploadKind::Resume => "resumeUrl",
        UploadKind::Portfolio => "portfolioFileUrl",
      };
      set_field(wizard, field, &receipt.url)?;
      println!("Uploaded {} ({} bytes) as {field}: {}", receipt.file_name, receipt.size, receipt.url);
    }
  }

  if !wizard.persisted() {
    eprintln!("warning: the draft could not be saved");
  }
  Ok(())
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

pub fn parse_list(name: &str) -> Result<ListField> {
  [ListField::Languages, ListField::Socials, ListField::Skills, ListField::Experiences]
    .into_iter()
    .find(|l| l.name() == name)
    .ok_or_else(|| anyhow!("unknown list {name:?}"))
}

pub fn parse_chip(target: &str) -> Result<ChipTarget> {
  if target == "portfolioLinks" {
    return Ok(ChipTarget::PortfolioLinks);
  }
  let mut parts = target.split('.');
  let (Some(list), Some(index), Some(field), None) =
    (parts.next(), parts.next(), parts.next(), parts.next())
  else {
    bail!("unknown chip input {target:?}");
  };
  let index: usize = index.parse().with_context(|| format!("bad row index in {target:?}"))?;
  Ok(match (list, field) {
    ("skills", "tags") => ChipTarget::SkillTags(index),
    ("experiences", "links") => ChipTarget::ExperienceLinks(index),
    ("experiences", "achievements") => ChipTarget::ExperienceAchievements(index),
    ("experiences", "categoryIds") => ChipTarget::ExperienceCategories(index),
    _ => bail!("unknown chip input {target:?}"),
  })
}

/// Apply `raw` to `path`, reading it as JSON first and falling back to a
/// plain string when the field rejects the JSON reading.
pub fn set_field<D: DraftStorage>(
  wizard: &mut FormController<D>,
  path: &str,
  raw: &str,
) -> Result<()> {
  let Ok(field) = path.parse::<FieldPath>();
  let text = || Value::String(raw.to_owned());

  let result = match serde_json::from_str::<Value>(raw) {
    Ok(value) => {
      match wizard.apply(FieldChange::Set { path: field.clone(), value }) {
        Err(DraftError::InvalidValue { .. }) => {
          wizard.apply(FieldChange::Set { path: field, value: text() })
        }
        other => other,
      }
    }
    _ => wizard.apply(FieldChange::Set { path: field, value: text() }),
  };
  result.with_context(|| format!("cannot set {path}"))
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_step(step: Step) {
  println!("Step {} of {}: {}", step.number(), Step::ALL.len(), step.title());
}

fn print_errors(errors: &ValidationErrors) {
  for e in errors.iter() {
    println!("  ✗ {}: {}", e.path, e.message);
  }
}

pub fn print_status<D: DraftStorage>(wizard: &FormController<D>) {
  print_step(wizard.step());
  if let Some(notice) = wizard.notice() {
    println!("{notice}");
  }
  print_errors(&wizard.errors().for_step(wizard.step()));
}

pub fn print_review<D: DraftStorage>(wizard: &FormController<D>) {
  for section in wizard.review() {
    println!("{}. {}", section.step.number(), section.title);
    for (name, value) in section.fields {
      println!("  {name}: {}", display_value(&value));
    }
  }
}

fn display_value(value: &Value) -> String {
  match value {
    Value::Null => "-".to_owned(),
    Value::String(s) if s.is_empty() => "-".to_owned(),
    Value::String(s) => s.clone(),
    Value::Array(items) if items.is_empty() => "-".to_owned(),
    other => other.to_string(),
  }
}

fn report_navigation(nav: Navigation) -> Result<()> {
  match nav {
    Navigation::Advanced { to, .. } => {
      print_step(to);
      Ok(())
    }
    Navigation::Blocked(errors) => {
      print_errors(&errors);
      bail!("fix the errors above before continuing")
    }
    Navigation::AtEnd => {
      println!("Already on the review step; run `intake submit` to send the application.");
      Ok(())
    }
  }
}

fn report_submit(outcome: SubmitOutcome) -> Result<()> {
  match outcome {
    SubmitOutcome::Submitted(receipt) => {
      println!("{} (id {}).", receipt.message, receipt.id);
      Ok(())
    }
    SubmitOutcome::Invalid { step, errors } => {
      print_errors(&errors);
      bail!("please fix the errors in step {} ({})", step.number(), step.title())
    }
    SubmitOutcome::Conflict(message) => bail!(message),
    SubmitOutcome::Failed(message) => bail!("failed to submit application: {message}"),
    SubmitOutcome::AlreadySubmitting => bail!("a submission is already in progress"),
    SubmitOutcome::NotOnReview => {
      bail!("submission happens from the review step; run `intake goto {}`", Step::LAST.number())
    }
  }
}
