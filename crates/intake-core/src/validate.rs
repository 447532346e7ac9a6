//! Draft validation.
//!
//! Validation is an ordered list of [`Rule`]s, each owned by one wizard step.
//! Per-step validation runs the rules of that step; whole-submission
//! validation runs every rule. Failures are returned as [`ValidationErrors`],
//! never as `Err` of an exceptional kind, and every failure carries a
//! [`FieldPath`] that maps back to the step that owns it.

use std::{collections::HashSet, fmt, str::FromStr, sync::LazyLock};

use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
  application::{
    Availability, Experience, Language, MonthlyRate, NewApplication, Skill, Social, is_english,
  },
  draft::{ApplicationDraft, PortfolioRequirement},
  step::{Step, step_for_field},
};

// ─── Field paths ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
  Key(String),
  Index(usize),
}

/// A dotted path into the draft, e.g. `experiences.0.endYear`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
  pub fn field(name: &str) -> Self { Self(vec![Segment::Key(name.to_owned())]) }

  pub fn key(mut self, name: &str) -> Self {
    self.0.push(Segment::Key(name.to_owned()));
    self
  }

  pub fn index(mut self, i: usize) -> Self {
    self.0.push(Segment::Index(i));
    self
  }

  pub fn segments(&self) -> &[Segment] { &self.0 }

  pub fn segment(&self, i: usize) -> Option<&Segment> { self.0.get(i) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The first `n` segments.
  pub fn prefix(&self, n: usize) -> Self { Self(self.0.iter().take(n).cloned().collect()) }

  /// The top-level field name, if the path starts with one.
  pub fn first_key(&self) -> Option<&str> {
    match self.0.first() {
      Some(Segment::Key(k)) => Some(k.as_str()),
      _ => None,
    }
  }

  /// The wizard step owning this path.
  pub fn step(&self) -> Option<Step> { self.first_key().and_then(step_for_field) }
}

impl fmt::Display for FieldPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, seg) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(".")?;
      }
      match seg {
        Segment::Key(k) => f.write_str(k)?,
        Segment::Index(n) => write!(f, "{n}")?,
      }
    }
    Ok(())
  }
}

impl FromStr for FieldPath {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let segments = s
      .split('.')
      .filter(|p| !p.is_empty())
      .map(|p| match p.parse::<usize>() {
        Ok(n) => Segment::Index(n),
        Err(_) => Segment::Key(p.to_owned()),
      })
      .collect();
    Ok(Self(segments))
  }
}

impl Serialize for FieldPath {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for FieldPath {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    let Ok(path) = raw.parse();
    Ok(path)
  }
}

/// Map a path to its owning step (`None` for unknown fields and the root).
pub fn step_for_path(path: &FieldPath) -> Option<Step> { path.step() }

/// The lowest-numbered step that contains one of `paths`.
pub fn first_error_step<'a>(paths: impl IntoIterator<Item = &'a FieldPath>) -> Option<Step> {
  paths.into_iter().filter_map(step_for_path).min()
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
  pub path:    FieldPath,
  pub message: String,
}

/// An ordered set of field-level failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// Record a failure. An identical (path, message) pair is kept only once.
  pub fn push(&mut self, path: FieldPath, message: impl Into<String>) {
    let message = message.into();
    if !self.0.iter().any(|e| e.path == path && e.message == message) {
      self.0.push(FieldError { path, message });
    }
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = &FieldError> { self.0.iter() }

  /// Failures belonging to `step`.
  pub fn for_step(&self, step: Step) -> Self {
    Self(self.0.iter().filter(|e| e.path.step() == Some(step)).cloned().collect())
  }

  /// The messages recorded against exactly `path`.
  pub fn messages_at(&self, path: &str) -> Vec<&str> {
    self
      .0
      .iter()
      .filter(|e| e.path.to_string() == path)
      .map(|e| e.message.as_str())
      .collect()
  }

  /// The lowest-numbered step holding a failure.
  pub fn first_step(&self) -> Option<Step> { first_error_step(self.0.iter().map(|e| &e.path)) }
}

impl From<Vec<FieldError>> for ValidationErrors {
  fn from(v: Vec<FieldError>) -> Self { Self(v) }
}

impl IntoIterator for ValidationErrors {
  type IntoIter = std::vec::IntoIter<FieldError>;
  type Item = FieldError;

  fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", e.path, e.message)?;
    }
    Ok(())
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// A named check owned by one wizard step.
pub struct Rule {
  pub step:  Step,
  pub name:  &'static str,
  pub check: fn(&ApplicationDraft, &mut ValidationErrors),
}

pub static RULES: &[Rule] = &[
  Rule { step: Step::Identity, name: "identity", check: identity },
  Rule { step: Step::ProfessionalBaseline, name: "baseline", check: baseline },
  Rule { step: Step::ProfessionalBaseline, name: "portfolio", check: portfolio },
  Rule { step: Step::PersonalProfile, name: "personal-profile", check: personal_profile },
  Rule { step: Step::Languages, name: "language-entries", check: language_entries },
  Rule { step: Step::Languages, name: "english-required", check: english_required },
  Rule { step: Step::Socials, name: "linkedin", check: linkedin },
  Rule { step: Step::Socials, name: "social-entries", check: social_entries },
  Rule { step: Step::Socials, name: "social-platforms-unique", check: social_platforms_unique },
  Rule { step: Step::Availability, name: "availability", check: availability },
  Rule { step: Step::Availability, name: "availability-mode", check: availability_mode },
  Rule { step: Step::Skills, name: "skill-entries", check: skill_entries },
  Rule { step: Step::Skills, name: "skill-names-unique", check: skill_names_unique },
  Rule { step: Step::Experience, name: "experience-entries", check: experience_entries },
  Rule { step: Step::Experience, name: "experience-timeline", check: experience_timeline },
  Rule { step: Step::Experience, name: "experience-content", check: experience_content },
  Rule { step: Step::ResumeVideo, name: "attachments", check: attachments },
];

/// Run the rules owned by `step`. The review step has no rules of its own.
pub fn validate_step(draft: &ApplicationDraft, step: Step) -> ValidationErrors {
  let mut errors = ValidationErrors::new();
  for rule in RULES.iter().filter(|r| r.step == step) {
    (rule.check)(draft, &mut errors);
  }
  errors
}

/// Run every rule, in step order.
pub fn validate_all(draft: &ApplicationDraft) -> ValidationErrors {
  let mut errors = ValidationErrors::new();
  for rule in RULES {
    (rule.check)(draft, &mut errors);
  }
  errors
}

/// Whole-submission validation. On success, yields the typed submission.
pub fn validate(draft: &ApplicationDraft) -> Result<NewApplication, ValidationErrors> {
  let errors = validate_all(draft);
  if !errors.is_empty() {
    return Err(errors);
  }
  assemble(draft).ok_or_else(|| {
    let mut errors = ValidationErrors::new();
    errors.push(FieldPath::default(), "The application is incomplete");
    errors
  })
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

static EMAIL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

fn current_year() -> i32 { Utc::now().year() }

/// Trimmed, non-empty text.
fn text(v: &Option<String>) -> Option<&str> { v.as_deref().map(str::trim).filter(|s| !s.is_empty()) }

fn chars(s: &str) -> usize { s.chars().count() }

fn is_url(s: &str) -> bool { url::Url::parse(s.trim()).is_ok() }

fn is_email(s: &str) -> bool { EMAIL.is_match(s.trim()) }

fn required_text(
  errors: &mut ValidationErrors,
  path: FieldPath,
  value: &Option<String>,
  max: usize,
  missing: &str,
  too_long: &str,
) {
  match text(value) {
    None => errors.push(path, missing),
    Some(s) if chars(s) > max => errors.push(path, too_long),
    Some(_) => {}
  }
}

fn optional_max(errors: &mut ValidationErrors, path: FieldPath, value: &Option<String>, max: usize, msg: &str) {
  if text(value).is_some_and(|s| chars(s) > max) {
    errors.push(path, msg);
  }
}

fn optional_url(errors: &mut ValidationErrors, path: FieldPath, value: &Option<String>, msg: &str) {
  if text(value).is_some_and(|s| !is_url(s)) {
    errors.push(path, msg);
  }
}

fn year_range(errors: &mut ValidationErrors, path: FieldPath, value: Option<i32>, label: &str) {
  if let Some(y) = value {
    if y < 1900 {
      errors.push(path, format!("{label} must be 1900 or later"));
    } else if y > current_year() {
      errors.push(path, format!("{label} cannot be in the future"));
    }
  }
}

// ─── Step 1 ──────────────────────────────────────────────────────────────────

fn identity(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  required_text(
    errors,
    FieldPath::field("firstName"),
    &d.first_name,
    100,
    "First name is required",
    "First name must be less than 100 characters",
  );
  required_text(
    errors,
    FieldPath::field("lastName"),
    &d.last_name,
    100,
    "Last name is required",
    "Last name must be less than 100 characters",
  );
  match text(&d.email) {
    None => errors.push(FieldPath::field("email"), "Email address is required"),
    Some(e) if !is_email(e) => errors.push(
      FieldPath::field("email"),
      "Please enter a valid email address (e.g., name@example.com)",
    ),
    Some(_) => {}
  }
  required_text(
    errors,
    FieldPath::field("phoneNumber"),
    &d.phone_number,
    20,
    "Phone number is required",
    "Phone number must be less than 20 characters",
  );
}

// ─── Step 2 ──────────────────────────────────────────────────────────────────

fn baseline(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  if d.highest_formal_education_level.is_none() {
    errors.push(
      FieldPath::field("highestFormalEducationLevel"),
      "Please select your highest education level",
    );
  }
  if d.current_job_status.is_none() {
    errors.push(FieldPath::field("currentJobStatus"), "Please select your current job status");
  }
  required_text(
    errors,
    FieldPath::field("category"),
    &d.category,
    200,
    "Please select or enter your specialization",
    "Specialization must be less than 200 characters",
  );
}

fn portfolio(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  let has_links = d.portfolio_links.iter().any(|l| !l.trim().is_empty());
  let has_file = text(&d.portfolio_file_url).is_some();
  match d.portfolio_requirement() {
    PortfolioRequirement::Required if !has_links => errors.push(
      FieldPath::field("portfolioLinks"),
      "Please add at least one portfolio link for this specialization",
    ),
    PortfolioRequirement::RequiredUnlessFile if !has_links && !has_file => errors.push(
      FieldPath::field("portfolioLinks"),
      "Please add a portfolio link or upload a portfolio video",
    ),
    _ => {}
  }
  for (i, link) in d.portfolio_links.iter().enumerate() {
    if chars(link.trim()) < crate::draft::MIN_PORTFOLIO_LINK_LEN {
      errors.push(
        FieldPath::field("portfolioLinks").index(i),
        "Please enter a valid link. The link must be at least 3 characters long.",
      );
    }
  }
  optional_url(
    errors,
    FieldPath::field("portfolioFileUrl"),
    &d.portfolio_file_url,
    "Please upload a valid portfolio file",
  );
}

// ─── Step 3 ──────────────────────────────────────────────────────────────────

fn personal_profile(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  if text(&d.country_of_residence).is_none_or(|c| chars(c) != 2) {
    errors.push(FieldPath::field("countryOfResidence"), "Please select your country of residence");
  }
  if text(&d.time_zone).is_none() {
    errors.push(FieldPath::field("timeZone"), "Please select your time zone");
  }
  if text(&d.country_of_origin).is_some_and(|c| chars(c) != 2) {
    errors.push(FieldPath::field("countryOfOrigin"), "Country code must be 2 characters");
  }
  optional_max(
    errors,
    FieldPath::field("city"),
    &d.city,
    100,
    "City name must be less than 100 characters",
  );
  year_range(errors, FieldPath::field("birthYear"), d.birth_year, "Birth year");
}

// ─── Step 4 ──────────────────────────────────────────────────────────────────

fn language_entries(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  for (i, lang) in d.languages.iter().enumerate() {
    let row = FieldPath::field("languages").index(i);
    required_text(
      errors,
      row.clone().key("name"),
      &lang.name,
      50,
      "Language name is required",
      "Language name must be less than 50 characters",
    );
    if lang.proficiency.is_none() {
      errors.push(row.key("proficiency"), "Please select a proficiency level");
    }
  }
}

fn english_required(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  let path = FieldPath::field("languages");
  if d.languages.is_empty() {
    errors.push(path.clone(), "Please add at least one language");
  }
  match d.languages.iter().find(|l| l.is_english()) {
    None => errors.push(path.clone(), "English is required. Please add English to your languages."),
    Some(english) if english.proficiency.is_none() => {
      errors.push(path.clone(), "Please select your English proficiency level")
    }
    Some(_) => {}
  }
  let english_rows = d.languages.iter().filter(|l| l.is_english()).count();
  if english_rows > 1 {
    errors.push(path.clone(), "English can only be listed once");
  }
  if d
    .languages
    .iter()
    .any(|l| text(&l.name).is_some() && l.proficiency.is_none())
  {
    errors.push(path, "Please select a proficiency level for all languages");
  }
}

// ─── Step 5 ──────────────────────────────────────────────────────────────────

fn linkedin(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  match text(&d.linkedin_url) {
    None => errors.push(FieldPath::field("linkedinUrl"), "LinkedIn URL is required"),
    Some(u) if !is_url(u) => errors.push(
      FieldPath::field("linkedinUrl"),
      "Please enter a valid LinkedIn URL (e.g., https://linkedin.com/in/yourprofile)",
    ),
    Some(_) => {}
  }
}

fn social_entries(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  for (i, social) in d.social_profiles.iter().enumerate() {
    let row = FieldPath::field("socialProfiles").index(i);
    if social.platform.is_none() {
      errors.push(row.clone().key("platform"), "Please select a platform");
    }
    match text(&social.url) {
      None => errors.push(row.key("url"), "URL is required"),
      Some(u) if !is_url(u) => {
        errors.push(row.key("url"), "Please enter a valid URL (e.g., https://example.com)")
      }
      Some(_) => {}
    }
  }
}

fn social_platforms_unique(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  let mut seen = HashSet::new();
  let duplicated = d
    .social_profiles
    .iter()
    .filter_map(|s| s.platform)
    .any(|p| !seen.insert(p));
  if duplicated {
    errors.push(
      FieldPath::field("socialProfiles"),
      "You cannot add the same platform twice. Please remove the duplicate.",
    );
  }
}

// ─── Step 6 ──────────────────────────────────────────────────────────────────

fn availability(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  if d.availability.is_none() {
    errors.push(FieldPath::field("availability"), "Please select your availability");
  }
  if let Some(days) = d.available_in {
    if days < 0 {
      errors.push(FieldPath::field("availableIn"), "Available days must be 0 or greater");
    } else if days > 365 {
      errors.push(FieldPath::field("availableIn"), "Available days cannot exceed 365");
    }
  }
  if let Some(hours) = d.hours_per_week {
    if hours < 1 {
      errors.push(FieldPath::field("hoursPerWeek"), "Hours per week must be at least 1");
    } else if hours > 80 {
      errors.push(FieldPath::field("hoursPerWeek"), "Hours per week cannot exceed 80");
    }
  }
  let path = FieldPath::field("expectedSalary");
  match d.expected_salary {
    None => errors.push(path, "Please enter your expected monthly salary"),
    Some(s) if !s.is_finite() || s < 0.0 => errors.push(path, "Expected salary must be 0 or greater"),
    Some(s) if s > 10_000_000.0 => errors.push(path, "Expected salary cannot exceed $10,000,000"),
    Some(s) if MonthlyRate::from_amount(s).is_none() => {
      errors.push(path, "Salary must have at most 2 decimal places")
    }
    Some(_) => {}
  }
}

/// Full-time needs a lead time; every other mode needs weekly hours.
fn availability_mode(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  match d.availability {
    Some(Availability::FullTime) if d.available_in.is_none() => errors.push(
      FieldPath::field("availableIn"),
      "Please specify how many days until you're available for full-time work",
    ),
    Some(Availability::PartTime | Availability::Freelance) if d.hours_per_week.is_none() => {
      errors.push(
        FieldPath::field("hoursPerWeek"),
        "Please specify how many hours per week you're available",
      )
    }
    _ => {}
  }
}

// ─── Step 7 ──────────────────────────────────────────────────────────────────

fn skill_entries(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  for (i, skill) in d.skills.iter().enumerate() {
    let row = FieldPath::field("skills").index(i);
    required_text(
      errors,
      row.clone().key("name"),
      &skill.name,
      100,
      "Skill name is required",
      "Skill name must be less than 100 characters",
    );
    if skill.level.is_none() {
      errors.push(row.clone().key("level"), "Please select a skill level");
    }
    if let Some(years) = skill.total_experience {
      if years < 0 {
        errors.push(row.clone().key("totalExperience"), "Total experience must be 0 or greater");
      } else if years > 100 {
        errors.push(row.clone().key("totalExperience"), "Total experience cannot exceed 100 years");
      }
    }
    year_range(errors, row.clone().key("startYear"), skill.start_year, "Start year");
    optional_max(
      errors,
      row.key("institution"),
      &skill.institution,
      200,
      "Institution name must be less than 200 characters",
    );
  }
}

fn skill_names_unique(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  let mut seen = HashSet::new();
  let duplicated = d
    .skills
    .iter()
    .filter_map(|s| text(&s.name))
    .any(|n| !seen.insert(n.to_lowercase()));
  if duplicated {
    errors.push(
      FieldPath::field("skills"),
      "You cannot add the same skill twice. Please remove the duplicate.",
    );
  }
}

// ─── Step 8 ──────────────────────────────────────────────────────────────────

fn experience_entries(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  for (i, exp) in d.experiences.iter().enumerate() {
    let row = FieldPath::field("experiences").index(i);
    optional_max(
      errors,
      row.clone().key("company"),
      &exp.company,
      200,
      "Company name must be less than 200 characters",
    );
    optional_max(
      errors,
      row.clone().key("position"),
      &exp.position,
      200,
      "Position title must be less than 200 characters",
    );
    optional_max(
      errors,
      row.clone().key("description"),
      &exp.description,
      5000,
      "Description must be less than 5000 characters",
    );
    year_range(errors, row.clone().key("startYear"), exp.start_year, "Start year");
    year_range(errors, row.key("endYear"), exp.end_year, "End year");
  }
}

/// Current positions have no end year; past positions need one, no earlier
/// than the start year.
fn experience_timeline(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  for (i, exp) in d.experiences.iter().enumerate() {
    let path = FieldPath::field("experiences").index(i).key("endYear");
    match (exp.is_current, exp.start_year, exp.end_year) {
      (true, _, Some(_)) => errors.push(path, "End year should be empty for current positions"),
      (false, _, None) => errors.push(
        path,
        "Please provide an end year for past positions, or mark this as your current position",
      ),
      (false, Some(start), Some(end)) if end < start => {
        errors.push(path, "End year must be the same as or after the start year")
      }
      _ => {}
    }
  }
}

fn experience_content(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  for (i, exp) in d.experiences.iter().enumerate() {
    if text(&exp.company).is_none() && text(&exp.position).is_none() && text(&exp.description).is_none()
    {
      errors.push(
        FieldPath::field("experiences").index(i),
        "Please provide at least a company name, position title, or description",
      );
    }
  }
}

// ─── Step 9 ──────────────────────────────────────────────────────────────────

fn attachments(d: &ApplicationDraft, errors: &mut ValidationErrors) {
  optional_url(
    errors,
    FieldPath::field("resumeUrl"),
    &d.resume_url,
    "Please enter a valid resume URL (e.g., https://example.com/resume.pdf)",
  );
  optional_url(
    errors,
    FieldPath::field("videoUrl"),
    &d.video_url,
    "Please enter a valid video URL (e.g., https://youtube.com/watch?v=...)",
  );
  optional_max(
    errors,
    FieldPath::field("notes"),
    &d.notes,
    5000,
    "Additional notes must be less than 5000 characters",
  );
}

// ─── Assembly ────────────────────────────────────────────────────────────────

fn owned(v: &Option<String>) -> Option<String> { text(v).map(str::to_owned) }

/// Build the typed submission from a draft that passed every rule.
fn assemble(d: &ApplicationDraft) -> Option<NewApplication> {
  let availability = d.availability?;
  let full_time = availability == Availability::FullTime;

  let languages = d
    .languages
    .iter()
    .map(|l| {
      Some(Language {
        name:        owned(&l.name)?,
        proficiency: l.proficiency?,
      })
    })
    .collect::<Option<Vec<_>>>()?;

  let social_profiles = d
    .social_profiles
    .iter()
    .map(|s| {
      Some(Social {
        platform: s.platform?,
        url:      owned(&s.url)?,
      })
    })
    .collect::<Option<Vec<_>>>()?;

  let skills = d
    .skills
    .iter()
    .map(|s| {
      let self_taught = s.self_taught;
      Some(Skill {
        name: owned(&s.name)?,
        tags: s.tags.clone(),
        level: s.level?,
        total_experience: s.total_experience,
        start_year: s.start_year,
        institution: if self_taught == Some(true) { None } else { owned(&s.institution) },
        self_taught,
      })
    })
    .collect::<Option<Vec<_>>>()?;

  let experiences = d
    .experiences
    .iter()
    .map(|e| Experience {
      company:      owned(&e.company),
      position:     owned(&e.position),
      description:  owned(&e.description),
      start_year:   e.start_year,
      end_year:     if e.is_current { None } else { e.end_year },
      is_current:   e.is_current,
      links:        e.links.clone(),
      achievements: e.achievements.clone(),
      category_ids: e.category_ids.clone(),
    })
    .collect();

  Some(NewApplication {
    first_name: owned(&d.first_name)?,
    last_name: owned(&d.last_name)?,
    email: owned(&d.email)?,
    phone_number: owned(&d.phone_number)?,
    birth_year: d.birth_year,
    country_of_origin: owned(&d.country_of_origin).map(|c| c.to_uppercase()),
    country_of_residence: owned(&d.country_of_residence)?.to_uppercase(),
    city: owned(&d.city),
    time_zone: owned(&d.time_zone)?,
    highest_formal_education_level: d.highest_formal_education_level?,
    current_job_status: d.current_job_status?,
    category: owned(&d.category)?,
    portfolio_links: d
      .portfolio_links
      .iter()
      .map(|l| l.trim().to_owned())
      .filter(|l| !l.is_empty())
      .collect(),
    portfolio_file_url: owned(&d.portfolio_file_url),
    availability,
    available_in: if full_time { Some(d.available_in.unwrap_or(0)) } else { None },
    hours_per_week: if full_time { None } else { d.hours_per_week },
    available_from: d.available_from,
    expected_salary: MonthlyRate::from_amount(d.expected_salary?)?,
    resume_url: owned(&d.resume_url),
    video_url: owned(&d.video_url),
    notes: owned(&d.notes),
    languages,
    linkedin_url: owned(&d.linkedin_url)?,
    social_profiles,
    skills,
    experiences,
  })
}

/// `true` when the languages of a submission satisfy the English rule.
pub fn has_english(languages: &[Language]) -> bool { languages.iter().any(|l| is_english(&l.name)) }

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::{
    application::{Proficiency, SocialPlatform},
    draft::{ExperienceDraft, LanguageDraft, SkillDraft, SocialDraft},
    fixtures::complete_draft,
  };

  #[test]
  fn complete_draft_validates() {
    let app = validate(&complete_draft()).expect("valid draft");
    assert_eq!(app.email, "ada@example.com");
    assert!(has_english(&app.languages));
    assert_eq!(app.socials()[0].platform, SocialPlatform::Linkedin);
  }

  #[test]
  fn field_paths_parse_and_display() {
    let p: FieldPath = "experiences.0.endYear".parse().unwrap();
    assert_eq!(p, FieldPath::field("experiences").index(0).key("endYear"));
    assert_eq!(p.to_string(), "experiences.0.endYear");
    assert_eq!(p.step(), Some(Step::Experience));
    assert_eq!(serde_json::to_value(&p).unwrap(), json!("experiences.0.endYear"));
  }

  #[test]
  fn first_error_step_picks_the_earliest_step() {
    let paths: Vec<FieldPath> = ["skills.0.name", "linkedinUrl", "bogus"]
      .iter()
      .map(|s| s.parse().unwrap())
      .collect();
    assert_eq!(first_error_step(&paths), Some(Step::Socials));
    assert_eq!(first_error_step(&[FieldPath::field("bogus")]), None);
  }

  #[test]
  fn missing_linkedin_maps_to_step_five() {
    let mut d = complete_draft();
    d.linkedin_url = None;
    let errors = validate(&d).unwrap_err();
    assert_eq!(errors.messages_at("linkedinUrl"), vec!["LinkedIn URL is required"]);
    assert_eq!(errors.first_step(), Some(Step::Socials));
  }

  #[test]
  fn full_time_requires_lead_time_not_hours() {
    let mut d = complete_draft();
    d.availability = Some(Availability::FullTime);
    d.available_in = None;
    d.hours_per_week = None;
    let errors = validate(&d).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(
      errors.messages_at("availableIn"),
      vec!["Please specify how many days until you're available for full-time work"]
    );
    assert!(errors.messages_at("hoursPerWeek").is_empty());
  }

  #[test]
  fn part_time_requires_hours() {
    let mut d = complete_draft();
    d.availability = Some(Availability::PartTime);
    d.hours_per_week = None;
    let errors = validate_step(&d, Step::Availability);
    assert_eq!(errors.messages_at("hoursPerWeek").len(), 1);
    assert!(errors.messages_at("availableIn").is_empty());
  }

  #[test]
  fn english_must_be_present_with_proficiency() {
    let mut d = complete_draft();
    d.languages = vec![LanguageDraft {
      name:        Some("French".into()),
      proficiency: Some(Proficiency::Native),
    }];
    let errors = validate_step(&d, Step::Languages);
    assert_eq!(
      errors.messages_at("languages"),
      vec!["English is required. Please add English to your languages."]
    );

    d.languages.push(LanguageDraft { name: Some("english".into()), proficiency: None });
    let errors = validate_step(&d, Step::Languages);
    assert!(
      errors
        .messages_at("languages")
        .contains(&"Please select your English proficiency level")
    );
  }

  #[test]
  fn duplicate_social_platforms_are_rejected() {
    let mut d = complete_draft();
    let github = SocialDraft {
      platform: Some(SocialPlatform::Github),
      url:      Some("https://github.com/ada".into()),
    };
    d.social_profiles = vec![github.clone(), github];
    let errors = validate_step(&d, Step::Socials);
    assert_eq!(errors.messages_at("socialProfiles").len(), 1);
  }

  #[test]
  fn duplicate_skill_names_ignore_case() {
    let mut d = complete_draft();
    d.skills.push(SkillDraft {
      name: Some("RUST".into()),
      level: Some(crate::application::SkillLevel::Beginner),
      ..Default::default()
    });
    let errors = validate_step(&d, Step::Skills);
    assert_eq!(
      errors.messages_at("skills"),
      vec!["You cannot add the same skill twice. Please remove the duplicate."]
    );
  }

  #[test]
  fn experience_timeline_rules() {
    let base = ExperienceDraft { company: Some("Acme".into()), ..Default::default() };
    let cases = [
      (true, Some(2020), Some(2022), "End year should be empty for current positions"),
      (
        false,
        Some(2020),
        None,
        "Please provide an end year for past positions, or mark this as your current position",
      ),
      (false, Some(2021), Some(2020), "End year must be the same as or after the start year"),
    ];
    for (is_current, start, end, expected) in cases {
      let mut d = complete_draft();
      d.experiences =
        vec![ExperienceDraft { is_current, start_year: start, end_year: end, ..base.clone() }];
      let errors = validate_step(&d, Step::Experience);
      assert_eq!(errors.messages_at("experiences.0.endYear"), vec![expected]);
    }

    let mut d = complete_draft();
    d.experiences = vec![ExperienceDraft { is_current: true, start_year: Some(2020), ..base }];
    assert!(validate_step(&d, Step::Experience).is_empty());
  }

  #[test]
  fn experience_needs_some_content() {
    let mut d = complete_draft();
    d.experiences = vec![ExperienceDraft {
      company: Some("   ".into()),
      end_year: Some(2020),
      ..Default::default()
    }];
    let errors = validate_step(&d, Step::Experience);
    assert_eq!(
      errors.messages_at("experiences.0"),
      vec!["Please provide at least a company name, position title, or description"]
    );
  }

  #[test]
  fn portfolio_categories() {
    let mut d = complete_draft();
    d.category = Some("Frontend Developer".into());
    d.portfolio_links.clear();
    assert_eq!(validate_step(&d, Step::ProfessionalBaseline).messages_at("portfolioLinks").len(), 1);

    d.category = Some("Video Editor".into());
    assert_eq!(validate_step(&d, Step::ProfessionalBaseline).messages_at("portfolioLinks").len(), 1);
    d.portfolio_file_url = Some("https://cdn.example.com/reel.mp4".into());
    assert!(validate_step(&d, Step::ProfessionalBaseline).is_empty());
  }

  #[test]
  fn salary_precision() {
    let mut d = complete_draft();
    d.expected_salary = Some(1234.567);
    assert_eq!(
      validate_step(&d, Step::Availability).messages_at("expectedSalary"),
      vec!["Salary must have at most 2 decimal places"]
    );
  }

  #[test]
  fn step_validation_only_reports_its_own_fields() {
    let d = ApplicationDraft::default();
    let errors = validate_step(&d, Step::Identity);
    assert!(!errors.is_empty());
    assert!(errors.iter().all(|e| e.path.step() == Some(Step::Identity)));
    assert!(validate_step(&d, Step::Review).is_empty());
  }

  #[test]
  fn assembly_normalises_conditional_fields() {
    let mut d = complete_draft();
    d.availability = Some(Availability::FullTime);
    d.available_in = Some(14);
    d.hours_per_week = Some(20);
    d.skills[0].self_taught = Some(true);
    d.skills[0].institution = Some("MIT".into());
    let app = validate(&d).unwrap();
    assert_eq!(app.available_in, Some(14));
    assert_eq!(app.hours_per_week, None);
    assert_eq!(app.skills[0].institution, None);
  }

  #[test]
  fn rules_are_ordered_by_step() {
    assert!(RULES.windows(2).all(|w| w[0].step <= w[1].step));
  }
}
