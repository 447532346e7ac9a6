//! Integration tests for `SqliteStore` against an in-memory database.

use intake_core::{
  application::{
    Availability, EducationLevel, Experience, JobStatus, Language, MonthlyRate, NewApplication,
    Proficiency, Skill, SkillLevel, Social, SocialPlatform,
  },
  export::{ExportFormat, render},
  sharing::PublicToken,
  store::{
    ApplicationQuery, ApplicationStore, ExportFilter, SearchField, SortDirection, SortKey,
  },
  submission::{SubmitError, submit_application},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn applicant(first: &str, last: &str, email: &str) -> NewApplication {
  NewApplication {
    first_name:                     first.into(),
    last_name:                      last.into(),
    email:                          email.into(),
    phone_number:                   "555-0100".into(),
    birth_year:                     Some(1991),
    country_of_origin:              None,
    country_of_residence:           "US".into(),
    city:                           None,
    time_zone:                      "America/New_York".into(),
    highest_formal_education_level: EducationLevel::Bachelor,
    current_job_status:             JobStatus::Employed,
    category:                       "Data Analyst".into(),
    portfolio_links:                vec![],
    portfolio_file_url:             None,
    availability:                   Availability::FullTime,
    available_in:                   Some(14),
    hours_per_week:                 None,
    available_from:                 None,
    expected_salary:                MonthlyRate::from_cents(300_000),
    resume_url:                     None,
    video_url:                      None,
    notes:                          None,
    languages:                      vec![Language {
      name:        "English".into(),
      proficiency: Proficiency::Advanced,
    }],
    linkedin_url:                   format!("https://linkedin.com/in/{first}"),
    social_profiles:                vec![],
    skills:                         vec![],
    experiences:                    vec![],
  }
}

fn rust_skill() -> Skill {
  Skill {
    name:             "Rust".into(),
    tags:             vec!["systems".into()],
    level:            SkillLevel::Advanced,
    total_experience: Some(4),
    start_year:       Some(2020),
    institution:      None,
    self_taught:      Some(true),
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_round_trip() {
  let s = store().await;
  let mut input = applicant("ada", "Lovelace", "ada@x.com");
  input.skills = vec![rust_skill()];
  input.social_profiles = vec![Social {
    platform: SocialPlatform::Github,
    url:      "https://github.com/ada".into(),
  }];
  input.experiences = vec![Experience {
    company:      Some("Acme".into()),
    position:     Some("Engineer".into()),
    description:  None,
    start_year:   Some(2019),
    end_year:     None,
    is_current:   true,
    links:        vec!["https://acme.dev".into()],
    achievements: vec!["Shipped".into()],
    category_ids: vec!["eng".into(), "data".into()],
  }];

  let app = s.insert_application(input.clone()).await.unwrap();
  let detail = s.get_application(app.id).await.unwrap().expect("stored");

  assert_eq!(detail.application, app);
  assert_eq!(detail.languages, input.languages);
  assert_eq!(detail.skills, input.skills);
  assert_eq!(detail.experiences, input.experiences);
  assert_eq!(detail.socials.len(), 2);
  assert_eq!(detail.socials[0].platform, SocialPlatform::Linkedin);
  assert_eq!(detail.socials[1].platform, SocialPlatform::Github);
}

#[tokio::test]
async fn get_application_missing_returns_none() {
  let s = store().await;
  assert!(s.get_application(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_and_writes_nothing() {
  let s = store().await;
  s.insert_application(applicant("a", "One", "a@x.com")).await.unwrap();

  let mut second = applicant("b", "Two", "a@x.com");
  second.skills = vec![rust_skill()];
  let err = s.insert_application(second).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateEmail(ref e) if e == "a@x.com"));
  assert!(SqliteStore::is_duplicate_email(&err));

  let page = s.list_applications(&ApplicationQuery::default()).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.applications[0].first_name, "a");

  // The rolled-back insert left no orphaned skill rows.
  let with_skills = ApplicationQuery { filter_min_skills: Some(true), ..Default::default() };
  assert_eq!(s.list_applications(&with_skills).await.unwrap().total, 0);
}

#[tokio::test]
async fn submission_service_rejects_a_second_email() {
  let s = store().await;
  let mut draft = intake_core_draft();
  submit_application(&s, &draft).await.unwrap();

  draft.first_name = Some("Someone".into());
  let err = submit_application(&s, &draft).await.unwrap_err();
  assert!(matches!(err, SubmitError::DuplicateEmail(_)));
  assert!(s.email_exists("ada@example.com").await.unwrap());
  assert_eq!(s.list_applications(&ApplicationQuery::default()).await.unwrap().total, 1);
}

#[tokio::test]
async fn submission_service_reports_validation_errors() {
  let s = store().await;
  let mut draft = intake_core_draft();
  draft.linkedin_url = None;
  let Err(SubmitError::Invalid(errors)) = submit_application(&s, &draft).await else {
    panic!("expected validation failure");
  };
  assert_eq!(errors.messages_at("linkedinUrl").len(), 1);
  assert_eq!(s.list_applications(&ApplicationQuery::default()).await.unwrap().total, 0);
}

#[tokio::test]
async fn current_positions_never_store_an_end_year() {
  let s = store().await;
  let mut input = applicant("ada", "L", "ada@x.com");
  input.experiences = vec![Experience {
    company:      Some("Acme".into()),
    position:     None,
    description:  None,
    start_year:   Some(2019),
    end_year:     Some(2021),
    is_current:   true,
    links:        vec![],
    achievements: vec![],
    category_ids: vec![],
  }];
  let app = s.insert_application(input).await.unwrap();
  let detail = s.get_application(app.id).await.unwrap().unwrap();
  assert_eq!(detail.experiences[0].end_year, None);
}

fn intake_core_draft() -> intake_core::draft::ApplicationDraft {
  use intake_core::draft::{ApplicationDraft, LanguageDraft};
  ApplicationDraft {
    first_name: Some("Ada".into()),
    last_name: Some("Lovelace".into()),
    email: Some("ada@example.com".into()),
    phone_number: Some("555-0100".into()),
    highest_formal_education_level: Some(EducationLevel::Master),
    current_job_status: Some(JobStatus::Employed),
    category: Some("Data Analyst".into()),
    country_of_residence: Some("GB".into()),
    time_zone: Some("Europe/London".into()),
    languages: vec![LanguageDraft {
      name:        Some("English".into()),
      proficiency: Some(Proficiency::Native),
    }],
    linkedin_url: Some("https://linkedin.com/in/ada".into()),
    availability: Some(Availability::FullTime),
    available_in: Some(30),
    expected_salary: Some(3000.0),
    ..Default::default()
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cardinality_filter_counts_only_matches() {
  let s = store().await;
  s.insert_application(applicant("a", "A", "a@x.com")).await.unwrap();
  let mut with_skill = applicant("b", "B", "b@x.com");
  with_skill.skills = vec![rust_skill()];
  let b = s.insert_application(with_skill).await.unwrap();
  s.insert_application(applicant("c", "C", "c@x.com")).await.unwrap();

  let q = ApplicationQuery { filter_min_skills: Some(true), ..Default::default() };
  let page = s.list_applications(&q).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.applications.len(), 1);
  assert_eq!(page.applications[0].id, b.id);
}

#[tokio::test]
async fn socials_filter_sees_the_primary_linkedin_row() {
  let s = store().await;
  s.insert_application(applicant("a", "A", "a@x.com")).await.unwrap();
  let q = ApplicationQuery { filter_min_socials: Some(true), ..Default::default() };
  assert_eq!(s.list_applications(&q).await.unwrap().total, 1);
  let q = ApplicationQuery { filter_min_experiences: Some(true), ..Default::default() };
  assert_eq!(s.list_applications(&q).await.unwrap().total, 0);
}

#[tokio::test]
async fn root_column_filters() {
  let s = store().await;
  let mut noted = applicant("a", "A", "a@x.com");
  noted.notes = Some("Available soon".into());
  noted.resume_url = Some("https://cdn.x/cv.pdf".into());
  s.insert_application(noted).await.unwrap();
  let mut portfolio = applicant("b", "B", "b@x.com");
  portfolio.portfolio_links = vec!["https://b.dev".into()];
  s.insert_application(portfolio).await.unwrap();
  let mut blank = applicant("c", "C", "c@x.com");
  blank.notes = Some("   ".into());
  s.insert_application(blank).await.unwrap();

  let note = ApplicationQuery { filter_has_note: Some(true), ..Default::default() };
  assert_eq!(total(&s, note).await, 1);
  let resume = ApplicationQuery { filter_has_resume: Some(true), ..Default::default() };
  assert_eq!(total(&s, resume).await, 1);
  let video = ApplicationQuery { filter_has_video: Some(true), ..Default::default() };
  assert_eq!(total(&s, video).await, 0);
  let portfolio = ApplicationQuery { filter_has_portfolio: Some(true), ..Default::default() };
  assert_eq!(total(&s, portfolio).await, 1);
  let ignored = ApplicationQuery { filter_has_note: Some(false), ..Default::default() };
  assert_eq!(total(&s, ignored).await, 3);
}

async fn total(s: &SqliteStore, q: ApplicationQuery) -> usize {
  s.list_applications(&q).await.unwrap().total
}

#[tokio::test]
async fn search_by_field() {
  let s = store().await;
  s.insert_application(applicant("Ada", "Lovelace", "ada@x.com")).await.unwrap();
  let mut grace = applicant("Grace", "Hopper", "grace@navy.mil");
  grace.category = "Backend Developer".into();
  s.insert_application(grace).await.unwrap();

  let search = |value: &str, field: Option<SearchField>| ApplicationQuery {
    search_value: Some(value.into()),
    search_field: field,
    ..Default::default()
  };

  let page = s.list_applications(&search("ada lovelace", None)).await.unwrap();
  assert_eq!(page.total, 1);
  let page = s.list_applications(&search("NAVY", None)).await.unwrap();
  assert_eq!(page.applications[0].first_name, "Grace");
  let page = s.list_applications(&search("navy", Some(SearchField::Name))).await.unwrap();
  assert_eq!(page.total, 0);
  let page = s.list_applications(&search("backend", Some(SearchField::Category))).await.unwrap();
  assert_eq!(page.total, 1);
  let page = s.list_applications(&search("%", None)).await.unwrap();
  assert_eq!(page.total, 0);
}

#[tokio::test]
async fn search_folds_case_beyond_ascii() {
  let s = store().await;
  s.insert_application(applicant("Émile", "Öztürk", "emile@x.com")).await.unwrap();
  s.insert_application(applicant("Łukasz", "Nowak", "lukasz@x.com")).await.unwrap();

  let search = |value: &str, field: Option<SearchField>| ApplicationQuery {
    search_value: Some(value.into()),
    search_field: field,
    ..Default::default()
  };

  for value in ["émile", "ÉMILE", "Émile", "öztürk", "émile öztürk"] {
    assert_eq!(total(&s, search(value, None)).await, 1, "{value}");
  }
  assert_eq!(total(&s, search("łukasz", Some(SearchField::Name))).await, 1);
  assert_eq!(total(&s, search("EMILE@X", Some(SearchField::Email))).await, 1);
}

#[tokio::test]
async fn huge_offsets_give_an_empty_page() {
  let s = store().await;
  s.insert_application(applicant("Ada", "Lovelace", "ada@x.com")).await.unwrap();

  let q = ApplicationQuery { offset: Some(usize::MAX), ..Default::default() };
  let page = s.list_applications(&q).await.unwrap();
  assert_eq!(page.total, 1);
  assert!(page.applications.is_empty());

  let page = s.list_favorites(10, usize::MAX).await.unwrap();
  assert!(page.favorites.is_empty());
}

#[tokio::test]
async fn listing_is_stable_paginated_and_sorted() {
  let s = store().await;
  for (first, email) in [("carol", "c@x.com"), ("alice", "a@x.com"), ("bob", "b@x.com")] {
    s.insert_application(applicant(first, "Z", email)).await.unwrap();
  }

  let q = ApplicationQuery { limit: Some(2), ..Default::default() };
  let first = s.list_applications(&q).await.unwrap();
  let again = s.list_applications(&q).await.unwrap();
  assert_eq!(first, again);
  assert_eq!(first.total, 3);
  assert_eq!(first.applications.len(), 2);
  // Newest first by default.
  assert_eq!(first.applications[0].first_name, "bob");

  let q = ApplicationQuery {
    sort_by: Some(SortKey::Name),
    sort_direction: Some(SortDirection::Asc),
    offset: Some(1),
    ..Default::default()
  };
  let page = s.list_applications(&q).await.unwrap();
  let names: Vec<_> = page.applications.iter().map(|a| a.first_name.as_str()).collect();
  assert_eq!(names, vec!["bob", "carol"]);
  assert_eq!(page.total, 3);
  assert_eq!(page.offset, 1);
}

// ─── Export ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_loads_children_and_filters() {
  let s = store().await;
  let mut ada = applicant("Ada", "Lovelace", "ada@x.com");
  ada.languages.push(Language { name: "French".into(), proficiency: Proficiency::Intermediate });
  ada.languages[0].proficiency = Proficiency::Native;
  s.insert_application(ada).await.unwrap();
  let mut other = applicant("Bob", "B", "bob@x.com");
  other.category = "Video Editor".into();
  s.insert_application(other).await.unwrap();

  let filter = ExportFilter { filter_category: Some("Data Analyst".into()), ..Default::default() };
  let details = s.export_applications(&filter).await.unwrap();
  assert_eq!(details.len(), 1);

  let csv = render(ExportFormat::Csv, &details).unwrap().data;
  assert!(csv.contains("\"English (native); French (intermediate)\""));

  let all = s.export_applications(&ExportFilter::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].application.first_name, "Bob");
}

// ─── Sharing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn public_toggle_mints_fresh_tokens() {
  let s = store().await;
  let app = s.insert_application(applicant("a", "A", "a@x.com")).await.unwrap();

  let on = s.set_public(app.id, true).await.unwrap().unwrap();
  let first = on.public_token.clone().unwrap();
  assert!(on.is_public);
  assert!(s.get_public(&first).await.unwrap().is_some());

  let off = s.set_public(app.id, false).await.unwrap().unwrap();
  assert!(!off.is_public);
  assert_eq!(off.public_token, None);
  // A stale token reveals nothing.
  assert!(s.get_public(&first).await.unwrap().is_none());

  let again = s.set_public(app.id, true).await.unwrap().unwrap();
  let second = again.public_token.unwrap();
  assert_ne!(first, second);
  assert!(s.get_public(&first).await.unwrap().is_none());
  let detail = s.get_public(&second).await.unwrap().unwrap();
  assert_eq!(detail.application.id, app.id);
  assert!(detail.application.is_public);
}

#[tokio::test]
async fn unknown_tokens_and_applications() {
  let s = store().await;
  assert!(s.get_public(&PublicToken::new("nope")).await.unwrap().is_none());
  assert!(s.set_public(Uuid::new_v4(), true).await.unwrap().is_none());
  assert!(s.set_public(Uuid::new_v4(), false).await.unwrap().is_none());
}

#[tokio::test]
async fn token_minting_gives_up_after_repeated_collisions() {
  let s = store().await;
  let a = s.insert_application(applicant("a", "A", "a@x.com")).await.unwrap();
  let b = s.insert_application(applicant("b", "B", "b@x.com")).await.unwrap();

  let taken = s.enable_sharing(a.id, || PublicToken::new("fixed")).await.unwrap().unwrap();
  assert_eq!(taken.as_str(), "fixed");

  let err = s.enable_sharing(b.id, || PublicToken::new("fixed")).await.unwrap_err();
  assert!(matches!(err, Error::TokenExhausted(8)));
  let detail = s.get_application(b.id).await.unwrap().unwrap();
  assert!(!detail.application.is_public);

  // A collision followed by a fresh candidate succeeds.
  let mut candidates = vec![PublicToken::new("fresh"), PublicToken::new("fixed")];
  let token = s
    .enable_sharing(b.id, move || candidates.pop().unwrap_or_else(PublicToken::generate))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(token.as_str(), "fresh");
}

// ─── Favorites ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn favorites_toggle_per_user() {
  let s = store().await;
  let app = s.insert_application(applicant("a", "A", "a@x.com")).await.unwrap();

  assert_eq!(s.toggle_favorite("alice", app.id).await.unwrap(), Some(true));
  assert!(s.is_favorite("alice", app.id).await.unwrap());
  assert!(!s.is_favorite("bob", app.id).await.unwrap());

  assert_eq!(s.toggle_favorite("bob", app.id).await.unwrap(), Some(true));
  let page = s.list_favorites(50, 0).await.unwrap();
  assert_eq!(page.total, 2);
  assert_eq!(page.favorites[0].favorited_by, "bob");

  assert_eq!(s.toggle_favorite("alice", app.id).await.unwrap(), Some(false));
  assert!(!s.is_favorite("alice", app.id).await.unwrap());
  assert_eq!(s.list_favorites(50, 0).await.unwrap().total, 1);

  assert_eq!(s.toggle_favorite("alice", Uuid::new_v4()).await.unwrap(), None);
}
