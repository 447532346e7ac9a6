//! Shared test data.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::{
  application::{
    Application, ApplicationDetail, ApplicationStatus, Availability, EducationLevel, JobStatus,
    Language, MonthlyRate, Proficiency, Skill, SkillLevel, Social, SocialPlatform,
  },
  draft::{ApplicationDraft, ExperienceDraft, LanguageDraft, SkillDraft, SocialDraft},
};

/// A draft that passes every rule.
pub fn complete_draft() -> ApplicationDraft {
  ApplicationDraft {
    first_name: Some("Ada".into()),
    last_name: Some("Lovelace".into()),
    email: Some("ada@example.com".into()),
    phone_number: Some("+44 20 7946 0000".into()),
    highest_formal_education_level: Some(EducationLevel::Master),
    current_job_status: Some(JobStatus::Employed),
    category: Some("Backend Developer".into()),
    portfolio_links: vec!["https://ada.dev".into()],
    country_of_residence: Some("GB".into()),
    time_zone: Some("Europe/London".into()),
    city: Some("London".into()),
    birth_year: Some(1990),
    languages: vec![LanguageDraft {
      name:        Some("English".into()),
      proficiency: Some(Proficiency::Native),
    }],
    linkedin_url: Some("https://linkedin.com/in/ada".into()),
    social_profiles: vec![SocialDraft {
      platform: Some(SocialPlatform::Github),
      url:      Some("https://github.com/ada".into()),
    }],
    availability: Some(Availability::PartTime),
    hours_per_week: Some(30),
    expected_salary: Some(4500.5),
    skills: vec![SkillDraft {
      name: Some("Rust".into()),
      tags: vec!["backend".into()],
      level: Some(SkillLevel::Expert),
      total_experience: Some(6),
      start_year: Some(2018),
      institution: Some("Open University".into()),
      self_taught: Some(false),
    }],
    experiences: vec![ExperienceDraft {
      company: Some("Analytical Engines Ltd".into()),
      position: Some("Engineer".into()),
      start_year: Some(2019),
      is_current: true,
      ..Default::default()
    }],
    ..Default::default()
  }
}

/// A stored application with one child of each kind.
pub fn detail() -> ApplicationDetail {
  let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
  ApplicationDetail {
    application: Application {
      id: Uuid::nil(),
      first_name: "Ada".into(),
      last_name: "Lovelace".into(),
      email: "ada@example.com".into(),
      phone_number: "+44 20 7946 0000".into(),
      birth_year: Some(1990),
      country_of_origin: Some("GB".into()),
      country_of_residence: "GB".into(),
      city: Some("London".into()),
      time_zone: "Europe/London".into(),
      highest_formal_education_level: EducationLevel::Master,
      current_job_status: JobStatus::Employed,
      category: "Backend Developer".into(),
      portfolio_links: vec!["https://ada.dev".into()],
      portfolio_file_url: None,
      availability: Availability::PartTime,
      available_in: None,
      hours_per_week: Some(30),
      available_from: None,
      expected_salary: MonthlyRate::from_cents(450_050),
      resume_url: None,
      video_url: None,
      notes: None,
      tags: vec![],
      status: ApplicationStatus::Active,
      archived_at: None,
      is_public: false,
      public_token: None,
      created_at: created,
      updated_at: created,
    },
    languages:   vec![Language { name: "English".into(), proficiency: Proficiency::Native }],
    skills:      vec![Skill {
      name:             "Rust".into(),
      tags:             vec!["backend".into()],
      level:            SkillLevel::Expert,
      total_experience: Some(6),
      start_year:       Some(2018),
      institution:      None,
      self_taught:      Some(true),
    }],
    experiences: vec![],
    socials:     vec![Social {
      platform: SocialPlatform::Linkedin,
      url:      "https://linkedin.com/in/ada".into(),
    }],
  }
}
