//! The stored application record and its child entities.
//!
//! An [`Application`] is created exactly once, at submission time, together
//! with all of its languages, socials, skills and experiences. Children are
//! never written independently afterwards.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::sharing::PublicToken;

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EducationLevel {
  Bachelor,
  Master,
  Doctorate,
  Postdoctoral,
  /// No formal education.
  #[serde(rename = "none")]
  #[strum(serialize = "none")]
  NoFormal,
  Other,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
  Employed,
  Unemployed,
  SelfEmployed,
  Retired,
  Student,
  Other,
}

/// Working mode. Full-time applicants give a lead time in days; everyone
/// else gives weekly hours.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Availability {
  FullTime,
  PartTime,
  Freelance,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillLevel {
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Proficiency {
  Beginner,
  Intermediate,
  Advanced,
  Native,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SocialPlatform {
  Linkedin,
  Github,
  Twitter,
  Facebook,
  Instagram,
  Youtube,
}

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApplicationStatus {
  #[default]
  Active,
  Archived,
}

// ─── Money ───────────────────────────────────────────────────────────────────

/// An expected monthly rate in USD, held as integer cents.
///
/// On the wire it is a plain JSON number (`2500.5`). Amounts with more than
/// two decimal places are rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthlyRate {
  cents: i64,
}

impl MonthlyRate {
  pub const fn from_cents(cents: i64) -> Self { Self { cents } }

  pub const fn cents(self) -> i64 { self.cents }

  /// Convert a decimal amount. Returns `None` for negative, non-finite, or
  /// sub-cent amounts.
  pub fn from_amount(amount: f64) -> Option<Self> {
    if !amount.is_finite() || amount < 0.0 {
      return None;
    }
    let scaled = amount * 100.0;
    let rounded = scaled.round();
    if (scaled - rounded).abs() > 1e-6 {
      return None;
    }
    Some(Self { cents: rounded as i64 })
  }

  pub fn as_amount(self) -> f64 { self.cents as f64 / 100.0 }
}

impl fmt::Display for MonthlyRate {
  /// Shortest decimal form: `3000`, `2500.5`, `1999.99`.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_amount())
  }
}

impl Serialize for MonthlyRate {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(self.as_amount())
  }
}

impl<'de> Deserialize<'de> for MonthlyRate {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let amount = f64::deserialize(d)?;
    Self::from_amount(amount).ok_or_else(|| {
      serde::de::Error::custom(format!(
        "{amount} is not a non-negative amount with at most 2 decimals"
      ))
    })
  }
}

// ─── Children ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
  pub name:        String,
  pub proficiency: Proficiency,
}

impl Language {
  pub fn is_english(&self) -> bool { is_english(&self.name) }
}

/// Case-insensitive match against the mandatory language.
pub fn is_english(name: &str) -> bool { name.trim().eq_ignore_ascii_case("english") }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
  pub name:             String,
  pub tags:             Vec<String>,
  pub level:            SkillLevel,
  /// Total years of experience with the skill.
  pub total_experience: Option<i32>,
  pub start_year:       Option<i32>,
  /// Always `None` when `self_taught` is set.
  pub institution:      Option<String>,
  pub self_taught:      Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
  pub company:      Option<String>,
  pub position:     Option<String>,
  pub description:  Option<String>,
  pub start_year:   Option<i32>,
  /// `None` exactly when `is_current` is set.
  pub end_year:     Option<i32>,
  pub is_current:   bool,
  pub links:        Vec<String>,
  pub achievements: Vec<String>,
  pub category_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Social {
  pub platform: SocialPlatform,
  pub url:      String,
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The root row of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
  pub id:                             Uuid,
  pub first_name:                     String,
  pub last_name:                      String,
  pub email:                          String,
  pub phone_number:                   String,
  pub birth_year:                     Option<i32>,
  pub country_of_origin:              Option<String>,
  pub country_of_residence:           String,
  pub city:                           Option<String>,
  pub time_zone:                      String,
  pub highest_formal_education_level: EducationLevel,
  pub current_job_status:             JobStatus,
  pub category:                       String,
  pub portfolio_links:                Vec<String>,
  pub portfolio_file_url:             Option<String>,
  pub availability:                   Availability,
  /// Lead time in days; only meaningful for full-time applicants.
  pub available_in:                   Option<i32>,
  pub hours_per_week:                 Option<i32>,
  pub available_from:                 Option<NaiveDate>,
  pub expected_salary:                MonthlyRate,
  pub resume_url:                     Option<String>,
  pub video_url:                      Option<String>,
  pub notes:                          Option<String>,
  pub tags:                           Vec<String>,
  pub status:                         ApplicationStatus,
  pub archived_at:                    Option<DateTime<Utc>>,
  pub is_public:                      bool,
  pub public_token:                   Option<PublicToken>,
  pub created_at:                     DateTime<Utc>,
  pub updated_at:                     DateTime<Utc>,
}

impl Application {
  pub fn full_name(&self) -> String { format!("{} {}", self.first_name, self.last_name) }

  pub fn has_portfolio(&self) -> bool {
    !self.portfolio_links.is_empty()
      || self
        .portfolio_file_url
        .as_deref()
        .is_some_and(|u| !u.trim().is_empty())
  }
}

/// An application with every child relation loaded; the shape served by
/// the detail view, the public view and the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetail {
  #[serde(flatten)]
  pub application: Application,
  pub languages:   Vec<Language>,
  pub skills:      Vec<Skill>,
  pub experiences: Vec<Experience>,
  pub socials:     Vec<Social>,
}

// ─── NewApplication ──────────────────────────────────────────────────────────

/// A fully validated submission, produced by [`crate::validate::validate`].
///
/// Identity, status, visibility and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
  pub first_name:                     String,
  pub last_name:                      String,
  pub email:                          String,
  pub phone_number:                   String,
  pub birth_year:                     Option<i32>,
  pub country_of_origin:              Option<String>,
  pub country_of_residence:           String,
  pub city:                           Option<String>,
  pub time_zone:                      String,
  pub highest_formal_education_level: EducationLevel,
  pub current_job_status:             JobStatus,
  pub category:                       String,
  pub portfolio_links:                Vec<String>,
  pub portfolio_file_url:             Option<String>,
  pub availability:                   Availability,
  pub available_in:                   Option<i32>,
  pub hours_per_week:                 Option<i32>,
  pub available_from:                 Option<NaiveDate>,
  pub expected_salary:                MonthlyRate,
  pub resume_url:                     Option<String>,
  pub video_url:                      Option<String>,
  pub notes:                          Option<String>,
  pub languages:                      Vec<Language>,
  /// Stored as the primary `linkedin` social row.
  pub linkedin_url:                   String,
  /// Additional socials; never contains a duplicate platform.
  pub social_profiles:                Vec<Social>,
  pub skills:                         Vec<Skill>,
  pub experiences:                    Vec<Experience>,
}

impl NewApplication {
  /// All social rows in insertion order: LinkedIn first.
  pub fn socials(&self) -> Vec<Social> {
    std::iter::once(Social {
      platform: SocialPlatform::Linkedin,
      url:      self.linkedin_url.clone(),
    })
    .chain(self.social_profiles.iter().cloned())
    .collect()
  }
}
