//! The ten wizard steps and the static field → step table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One screen of the application wizard. Each step owns a disjoint set of
/// top-level draft fields.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
  #[default]
  Identity = 1,
  ProfessionalBaseline = 2,
  PersonalProfile = 3,
  Languages = 4,
  Socials = 5,
  Availability = 6,
  Skills = 7,
  Experience = 8,
  ResumeVideo = 9,
  Review = 10,
}

impl Step {
  pub const ALL: [Step; 10] = [
    Step::Identity,
    Step::ProfessionalBaseline,
    Step::PersonalProfile,
    Step::Languages,
    Step::Socials,
    Step::Availability,
    Step::Skills,
    Step::Experience,
    Step::ResumeVideo,
    Step::Review,
  ];

  pub const FIRST: Step = Step::Identity;
  pub const LAST: Step = Step::Review;

  pub fn number(self) -> u8 { self as u8 }

  pub fn from_number(n: u8) -> Result<Self> {
    Self::ALL
      .get(usize::from(n).wrapping_sub(1))
      .copied()
      .ok_or(Error::StepOutOfRange(n))
  }

  /// The following step, or `None` on the review step.
  pub fn next(self) -> Option<Self> { Self::from_number(self.number() + 1).ok() }

  /// The preceding step, or `None` on the first step.
  pub fn previous(self) -> Option<Self> {
    self.number().checked_sub(1).and_then(|n| Self::from_number(n).ok())
  }

  pub fn title(self) -> &'static str {
    match self {
      Step::Identity => "User Identity",
      Step::ProfessionalBaseline => "Professional Baseline",
      Step::PersonalProfile => "Personal Profile",
      Step::Languages => "Language Proficiency",
      Step::Socials => "Social Profiles",
      Step::Availability => "Availability & Compensation",
      Step::Skills => "Skills",
      Step::Experience => "Work Experience",
      Step::ResumeVideo => "Resume & Video",
      Step::Review => "Review",
    }
  }

  /// The top-level draft fields owned by this step.
  pub fn fields(self) -> impl Iterator<Item = &'static str> {
    FIELD_STEPS
      .iter()
      .filter(move |(_, s)| *s == self)
      .map(|(f, _)| *f)
  }
}

impl From<Step> for u8 {
  fn from(s: Step) -> u8 { s.number() }
}

impl TryFrom<u8> for Step {
  type Error = Error;

  fn try_from(n: u8) -> Result<Self> { Self::from_number(n) }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}. {}", self.number(), self.title())
  }
}

/// Top-level field name (or list container) → owning step.
///
/// The review step owns no fields.
pub static FIELD_STEPS: &[(&str, Step)] = &[
  ("firstName", Step::Identity),
  ("lastName", Step::Identity),
  ("email", Step::Identity),
  ("phoneNumber", Step::Identity),
  ("highestFormalEducationLevel", Step::ProfessionalBaseline),
  ("currentJobStatus", Step::ProfessionalBaseline),
  ("category", Step::ProfessionalBaseline),
  ("portfolioLinks", Step::ProfessionalBaseline),
  ("portfolioFileUrl", Step::ProfessionalBaseline),
  ("countryOfResidence", Step::PersonalProfile),
  ("timeZone", Step::PersonalProfile),
  ("countryOfOrigin", Step::PersonalProfile),
  ("city", Step::PersonalProfile),
  ("birthYear", Step::PersonalProfile),
  ("languages", Step::Languages),
  ("linkedinUrl", Step::Socials),
  ("socialProfiles", Step::Socials),
  ("availability", Step::Availability),
  ("availableIn", Step::Availability),
  ("hoursPerWeek", Step::Availability),
  ("expectedSalary", Step::Availability),
  ("availableFrom", Step::Availability),
  ("skills", Step::Skills),
  ("experiences", Step::Experience),
  ("resumeUrl", Step::ResumeVideo),
  ("videoUrl", Step::ResumeVideo),
  ("notes", Step::ResumeVideo),
];

/// Look up the step owning a top-level field name.
pub fn step_for_field(field: &str) -> Option<Step> {
  FIELD_STEPS
    .iter()
    .find(|(f, _)| *f == field)
    .map(|(_, s)| *s)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numbering_is_one_based_and_bounded() {
    assert_eq!(Step::from_number(1).unwrap(), Step::Identity);
    assert_eq!(Step::from_number(10).unwrap(), Step::Review);
    assert!(matches!(Step::from_number(0), Err(Error::StepOutOfRange(0))));
    assert!(matches!(Step::from_number(11), Err(Error::StepOutOfRange(11))));
  }

  #[test]
  fn next_and_previous_stop_at_the_ends() {
    assert_eq!(Step::Identity.previous(), None);
    assert_eq!(Step::Identity.next(), Some(Step::ProfessionalBaseline));
    assert_eq!(Step::Review.next(), None);
    assert_eq!(Step::Review.previous(), Some(Step::ResumeVideo));
  }

  #[test]
  fn every_non_review_step_owns_a_field() {
    for step in Step::ALL.into_iter().filter(|s| *s != Step::Review) {
      assert!(step.fields().next().is_some(), "{step} owns no fields");
    }
    assert_eq!(Step::Review.fields().count(), 0);
  }

  #[test]
  fn field_lookup() {
    assert_eq!(step_for_field("linkedinUrl"), Some(Step::Socials));
    assert_eq!(step_for_field("experiences"), Some(Step::Experience));
    assert_eq!(step_for_field("nope"), None);
  }

  #[test]
  fn serialises_as_a_number() {
    assert_eq!(serde_json::to_string(&Step::Socials).unwrap(), "5");
    let s: Step = serde_json::from_str("8").unwrap();
    assert_eq!(s, Step::Experience);
    assert!(serde_json::from_str::<Step>("42").is_err());
  }
}
