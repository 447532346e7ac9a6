//! The in-progress application draft.
//!
//! Every field is optional so that a half-filled form can be persisted and
//! restored. Field names on the wire match the submission payload
//! (`firstName`, `linkedinUrl`, ...). [`crate::validate::validate`] turns a
//! complete draft into a [`NewApplication`](crate::application::NewApplication).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  application::{
    Availability, EducationLevel, JobStatus, Proficiency, SkillLevel, SocialPlatform,
    is_english,
  },
  error::DraftError,
  step::step_for_field,
  validate::{FieldPath, Segment},
};

/// Categories whose applicants must link a portfolio.
pub const PORTFOLIO_REQUIRED_CATEGORIES: &[&str] = &[
  "Frontend Developer",
  "Backend Developer",
  "Full-Stack Developer",
  "UI/UX Designer",
  "Graphic Designer",
];

/// Applicants in this category link a portfolio or upload a portfolio file.
pub const VIDEO_EDITOR_CATEGORY: &str = "Video Editor";

/// Minimum length of a portfolio link chip.
pub const MIN_PORTFOLIO_LINK_LEN: usize = 3;

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LanguageDraft {
  pub name:        Option<String>,
  pub proficiency: Option<Proficiency>,
}

impl LanguageDraft {
  pub fn is_english(&self) -> bool { self.name.as_deref().is_some_and(is_english) }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialDraft {
  pub platform: Option<SocialPlatform>,
  pub url:      Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkillDraft {
  pub name:             Option<String>,
  pub tags:             Vec<String>,
  pub level:            Option<SkillLevel>,
  pub total_experience: Option<i32>,
  pub start_year:       Option<i32>,
  pub institution:      Option<String>,
  pub self_taught:      Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExperienceDraft {
  pub company:      Option<String>,
  pub position:     Option<String>,
  pub description:  Option<String>,
  pub start_year:   Option<i32>,
  pub end_year:     Option<i32>,
  pub is_current:   bool,
  pub links:        Vec<String>,
  pub achievements: Vec<String>,
  pub category_ids: Vec<String>,
}

// ─── Draft ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationDraft {
  // Step 1
  pub first_name:                     Option<String>,
  pub last_name:                      Option<String>,
  pub email:                          Option<String>,
  pub phone_number:                   Option<String>,
  // Step 2
  pub highest_formal_education_level: Option<EducationLevel>,
  pub current_job_status:             Option<JobStatus>,
  pub category:                       Option<String>,
  pub portfolio_links:                Vec<String>,
  pub portfolio_file_url:             Option<String>,
  // Step 3
  pub country_of_residence:           Option<String>,
  pub time_zone:                      Option<String>,
  pub country_of_origin:              Option<String>,
  pub city:                           Option<String>,
  pub birth_year:                     Option<i32>,
  // Step 4
  pub languages:                      Vec<LanguageDraft>,
  // Step 5
  pub linkedin_url:                   Option<String>,
  pub social_profiles:                Vec<SocialDraft>,
  // Step 6
  pub availability:                   Option<Availability>,
  pub available_in:                   Option<i32>,
  pub hours_per_week:                 Option<i32>,
  pub available_from:                 Option<NaiveDate>,
  pub expected_salary:                Option<f64>,
  // Step 7
  pub skills:                         Vec<SkillDraft>,
  // Step 8
  pub experiences:                    Vec<ExperienceDraft>,
  // Step 9
  pub resume_url:                     Option<String>,
  pub video_url:                      Option<String>,
  pub notes:                          Option<String>,
}

/// A dynamic list on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
  Languages,
  Socials,
  Skills,
  Experiences,
}

impl ListField {
  pub fn name(self) -> &'static str {
    match self {
      ListField::Languages => "languages",
      ListField::Socials => "socialProfiles",
      ListField::Skills => "skills",
      ListField::Experiences => "experiences",
    }
  }
}

/// A chip (tag-style) input. Indexed variants address a row of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipTarget {
  PortfolioLinks,
  SkillTags(usize),
  ExperienceLinks(usize),
  ExperienceAchievements(usize),
  ExperienceCategories(usize),
}

/// Whether the chosen category obliges the applicant to show a portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioRequirement {
  NotRequired,
  Required,
  /// Satisfied by either a portfolio link or an uploaded portfolio file.
  RequiredUnlessFile,
}

/// One user edit. Every edit is applied through [`ApplicationDraft::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
  /// Replace the value at `path` (`firstName`, `skills.0.level`, ...).
  Set { path: FieldPath, value: Value },
  AddRow(ListField),
  RemoveRow { list: ListField, index: usize },
  AddChip { target: ChipTarget, value: String },
  RemoveChip { target: ChipTarget, value: String },
}

impl ApplicationDraft {
  /// Apply a single edit. On error the draft is left untouched.
  pub fn apply(&mut self, change: FieldChange) -> Result<(), DraftError> {
    match change {
      FieldChange::Set { path, value } => self.set(&path, value),
      FieldChange::AddRow(list) => {
        self.add_row(list);
        Ok(())
      }
      FieldChange::RemoveRow { list, index } => self.remove_row(list, index),
      FieldChange::AddChip { target, value } => self.add_chip(target, &value).map(|_| ()),
      FieldChange::RemoveChip { target, value } => {
        self.remove_chip(target, &value).map(|_| ())
      }
    }
  }

  /// Replace the value at `path`. `null` clears an optional field.
  pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<(), DraftError> {
    let field = path
      .first_key()
      .filter(|f| step_for_field(f).is_some())
      .ok_or_else(|| DraftError::UnknownField(path.to_string()))?;

    let mut tree = serde_json::to_value(&*self).map_err(|e| DraftError::InvalidValue {
      field:  path.to_string(),
      reason: e.to_string(),
    })?;
    *walk_mut(&mut tree, path)? = value;

    let updated: ApplicationDraft =
      serde_json::from_value(tree).map_err(|e| DraftError::InvalidValue {
        field:  path.to_string(),
        reason: e.to_string(),
      })?;

    // Editing a row must not rename the English entry away.
    if field == "languages"
      && let Some(Segment::Index(i)) = path.segment(1)
    {
      let was_english = self.languages.get(*i).is_some_and(LanguageDraft::is_english);
      let still_english = updated.languages.get(*i).is_some_and(LanguageDraft::is_english);
      if was_english && !still_english {
        return Err(DraftError::EnglishLocked);
      }
    }
    // Replacing the whole list must keep an English row too.
    if field == "languages"
      && self.languages.iter().any(LanguageDraft::is_english)
      && !updated.languages.iter().any(LanguageDraft::is_english)
    {
      return Err(DraftError::EnglishLocked);
    }

    *self = updated;
    Ok(())
  }

  /// Add the mandatory English row if the language list is empty. Returns
  /// whether a row was added.
  pub fn seed_english(&mut self) -> bool {
    if !self.languages.is_empty() {
      return false;
    }
    self.languages.push(LanguageDraft {
      name:        Some("English".to_owned()),
      proficiency: Some(Proficiency::Intermediate),
    });
    true
  }

  pub fn add_row(&mut self, list: ListField) {
    match list {
      ListField::Languages => self.languages.push(LanguageDraft {
        name:        Some(String::new()),
        proficiency: Some(Proficiency::Beginner),
      }),
      ListField::Socials => self.social_profiles.push(SocialDraft::default()),
      ListField::Skills => self.skills.push(SkillDraft::default()),
      ListField::Experiences => self.experiences.push(ExperienceDraft::default()),
    }
  }

  /// Remove a row. The English language row cannot be removed.
  pub fn remove_row(&mut self, list: ListField, index: usize) -> Result<(), DraftError> {
    let len = match list {
      ListField::Languages => self.languages.len(),
      ListField::Socials => self.social_profiles.len(),
      ListField::Skills => self.skills.len(),
      ListField::Experiences => self.experiences.len(),
    };
    if index >= len {
      return Err(no_row(list.name(), index));
    }
    match list {
      ListField::Languages => {
        if self.languages[index].is_english() {
          return Err(DraftError::EnglishLocked);
        }
        self.languages.remove(index);
      }
      ListField::Socials => {
        self.social_profiles.remove(index);
      }
      ListField::Skills => {
        self.skills.remove(index);
      }
      ListField::Experiences => {
        self.experiences.remove(index);
      }
    }
    Ok(())
  }

  /// Add a chip. Blank input and duplicates are ignored (`Ok(false)`).
  /// Skill tags are lower-cased.
  pub fn add_chip(&mut self, target: ChipTarget, raw: &str) -> Result<bool, DraftError> {
    let value = match target {
      ChipTarget::SkillTags(_) => raw.trim().to_lowercase(),
      _ => raw.trim().to_owned(),
    };
    if value.is_empty() {
      return Ok(false);
    }
    if target == ChipTarget::PortfolioLinks && value.chars().count() < MIN_PORTFOLIO_LINK_LEN {
      return Err(DraftError::InvalidValue {
        field:  "portfolioLinks".to_owned(),
        reason: format!(
          "the link must be at least {MIN_PORTFOLIO_LINK_LEN} characters long"
        ),
      });
    }
    let chips = self.chips_mut(target)?;
    if chips.contains(&value) {
      return Ok(false);
    }
    chips.push(value);
    Ok(true)
  }

  /// Remove a chip by value. Returns whether anything was removed.
  pub fn remove_chip(&mut self, target: ChipTarget, raw: &str) -> Result<bool, DraftError> {
    let value = match target {
      ChipTarget::SkillTags(_) => raw.trim().to_lowercase(),
      _ => raw.trim().to_owned(),
    };
    let chips = self.chips_mut(target)?;
    let before = chips.len();
    chips.retain(|c| *c != value);
    Ok(chips.len() != before)
  }

  fn chips_mut(&mut self, target: ChipTarget) -> Result<&mut Vec<String>, DraftError> {
    match target {
      ChipTarget::PortfolioLinks => Ok(&mut self.portfolio_links),
      ChipTarget::SkillTags(i) => self
        .skills
        .get_mut(i)
        .map(|s| &mut s.tags)
        .ok_or_else(|| no_row("skills", i)),
      ChipTarget::ExperienceLinks(i) => self
        .experiences
        .get_mut(i)
        .map(|e| &mut e.links)
        .ok_or_else(|| no_row("experiences", i)),
      ChipTarget::ExperienceAchievements(i) => self
        .experiences
        .get_mut(i)
        .map(|e| &mut e.achievements)
        .ok_or_else(|| no_row("experiences", i)),
      ChipTarget::ExperienceCategories(i) => self
        .experiences
        .get_mut(i)
        .map(|e| &mut e.category_ids)
        .ok_or_else(|| no_row("experiences", i)),
    }
  }

  pub fn portfolio_requirement(&self) -> PortfolioRequirement {
    match self.category.as_deref().map(str::trim) {
      Some(c) if PORTFOLIO_REQUIRED_CATEGORIES.contains(&c) => PortfolioRequirement::Required,
      Some(VIDEO_EDITOR_CATEGORY) => PortfolioRequirement::RequiredUnlessFile,
      _ => PortfolioRequirement::NotRequired,
    }
  }
}

fn no_row(list: &str, index: usize) -> DraftError {
  DraftError::NoSuchRow { list: list.to_owned(), index }
}

fn walk_mut<'v>(mut cur: &'v mut Value, path: &FieldPath) -> Result<&'v mut Value, DraftError> {
  for (depth, seg) in path.segments().iter().enumerate() {
    cur = match seg {
      Segment::Key(k) => cur
        .as_object_mut()
        .and_then(|o| o.get_mut(k.as_str()))
        .ok_or_else(|| DraftError::UnknownField(path.to_string()))?,
      Segment::Index(i) => cur
        .as_array_mut()
        .and_then(|a| a.get_mut(*i))
        .ok_or_else(|| no_row(&path.prefix(depth).to_string(), *i))?,
    };
  }
  Ok(cur)
}
