//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that text order is time order. String lists are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.
//! Enumerations use their snake_case wire names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use intake_core::{
  application::{Application, Experience, Language, MonthlyRate, Skill, Social},
  sharing::PublicToken,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Time ────────────────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn encode_enum<E: AsRef<str>>(e: E) -> String { e.as_ref().to_owned() }

pub fn decode_enum<E: FromStr>(column: &'static str, s: &str) -> Result<E> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawApplication::from_row`], for `SELECT`s aliased
/// as `a`.
pub const APPLICATION_COLUMNS: &str = "
  a.id, a.first_name, a.last_name, a.email, a.phone_number, a.birth_year,
  a.country_of_origin, a.country_of_residence, a.city, a.time_zone,
  a.highest_formal_education_level, a.current_job_status, a.category,
  a.portfolio_links, a.portfolio_file_url, a.availability, a.available_in,
  a.hours_per_week, a.available_from, a.expected_salary_cents, a.resume_url,
  a.video_url, a.notes, a.tags, a.status, a.archived_at, a.is_public,
  a.public_token, a.created_at, a.updated_at";

/// Raw values read directly from an `applications` row.
pub struct RawApplication {
  pub id:                             String,
  pub first_name:                     String,
  pub last_name:                      String,
  pub email:                          String,
  pub phone_number:                   String,
  pub birth_year:                     Option<i32>,
  pub country_of_origin:              Option<String>,
  pub country_of_residence:           String,
  pub city:                           Option<String>,
  pub time_zone:                      String,
  pub highest_formal_education_level: String,
  pub current_job_status:             String,
  pub category:                       String,
  pub portfolio_links:                String,
  pub portfolio_file_url:             Option<String>,
  pub availability:                   String,
  pub available_in:                   Option<i32>,
  pub hours_per_week:                 Option<i32>,
  pub available_from:                 Option<String>,
  pub expected_salary_cents:          i64,
  pub resume_url:                     Option<String>,
  pub video_url:                      Option<String>,
  pub notes:                          Option<String>,
  pub tags:                           String,
  pub status:                         String,
  pub archived_at:                    Option<String>,
  pub is_public:                      bool,
  pub public_token:                   Option<String>,
  pub created_at:                     String,
  pub updated_at:                     String,
}

impl RawApplication {
  /// Read the columns of [`APPLICATION_COLUMNS`], starting at index 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                             row.get(0)?,
      first_name:                     row.get(1)?,
      last_name:                      row.get(2)?,
      email:                          row.get(3)?,
      phone_number:                   row.get(4)?,
      birth_year:                     row.get(5)?,
      country_of_origin:              row.get(6)?,
      country_of_residence:           row.get(7)?,
      city:                           row.get(8)?,
      time_zone:                      row.get(9)?,
      highest_formal_education_level: row.get(10)?,
      current_job_status:             row.get(11)?,
      category:                       row.get(12)?,
      portfolio_links:                row.get(13)?,
      portfolio_file_url:             row.get(14)?,
      availability:                   row.get(15)?,
      available_in:                   row.get(16)?,
      hours_per_week:                 row.get(17)?,
      available_from:                 row.get(18)?,
      expected_salary_cents:          row.get(19)?,
      resume_url:                     row.get(20)?,
      video_url:                      row.get(21)?,
      notes:                          row.get(22)?,
      tags:                           row.get(23)?,
      status:                         row.get(24)?,
      archived_at:                    row.get(25)?,
      is_public:                      row.get(26)?,
      public_token:                   row.get(27)?,
      created_at:                     row.get(28)?,
      updated_at:                     row.get(29)?,
    })
  }

  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      id:                             decode_uuid(&self.id)?,
      first_name:                     self.first_name,
      last_name:                      self.last_name,
      email:                          self.email,
      phone_number:                   self.phone_number,
      birth_year:                     self.birth_year,
      country_of_origin:              self.country_of_origin,
      country_of_residence:           self.country_of_residence,
      city:                           self.city,
      time_zone:                      self.time_zone,
      highest_formal_education_level: decode_enum(
        "highest_formal_education_level",
        &self.highest_formal_education_level,
      )?,
      current_job_status:             decode_enum("current_job_status", &self.current_job_status)?,
      category:                       self.category,
      portfolio_links:                decode_list(&self.portfolio_links)?,
      portfolio_file_url:             self.portfolio_file_url,
      availability:                   decode_enum("availability", &self.availability)?,
      available_in:                   self.available_in,
      hours_per_week:                 self.hours_per_week,
      available_from:                 self.available_from.as_deref().map(decode_date).transpose()?,
      expected_salary:                MonthlyRate::from_cents(self.expected_salary_cents),
      resume_url:                     self.resume_url,
      video_url:                      self.video_url,
      notes:                          self.notes,
      tags:                           decode_list(&self.tags)?,
      status:                         decode_enum("status", &self.status)?,
      archived_at:                    self.archived_at.as_deref().map(decode_dt).transpose()?,
      is_public:                      self.is_public,
      public_token:                   self.public_token.map(PublicToken::new),
      created_at:                     decode_dt(&self.created_at)?,
      updated_at:                     decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawLanguage {
  pub name:        String,
  pub proficiency: String,
}

impl RawLanguage {
  pub fn into_language(self) -> Result<Language> {
    Ok(Language {
      proficiency: decode_enum("proficiency", &self.proficiency)?,
      name:        self.name,
    })
  }
}

pub struct RawSocial {
  pub platform: String,
  pub url:      String,
}

impl RawSocial {
  pub fn into_social(self) -> Result<Social> {
    Ok(Social { platform: decode_enum("platform", &self.platform)?, url: self.url })
  }
}

pub struct RawSkill {
  pub name:             String,
  pub tags:             String,
  pub level:            String,
  pub total_experience: Option<i32>,
  pub start_year:       Option<i32>,
  pub institution:      Option<String>,
  pub self_taught:      Option<bool>,
}

impl RawSkill {
  pub fn into_skill(self) -> Result<Skill> {
    Ok(Skill {
      name:             self.name,
      tags:             decode_list(&self.tags)?,
      level:            decode_enum("level", &self.level)?,
      total_experience: self.total_experience,
      start_year:       self.start_year,
      institution:      self.institution,
      self_taught:      self.self_taught,
    })
  }
}

/// An `experiences` row. Category links live in their own table and are
/// attached on conversion.
pub struct RawExperience {
  pub id:           i64,
  pub company:      Option<String>,
  pub position:     Option<String>,
  pub description:  Option<String>,
  pub start_year:   Option<i32>,
  pub end_year:     Option<i32>,
  pub is_current:   bool,
  pub links:        String,
  pub achievements: String,
}

impl RawExperience {
  pub fn into_experience(self, category_ids: Vec<String>) -> Result<Experience> {
    Ok(Experience {
      company: self.company,
      position: self.position,
      description: self.description,
      start_year: self.start_year,
      end_year: self.end_year,
      is_current: self.is_current,
      links: decode_list(&self.links)?,
      achievements: decode_list(&self.achievements)?,
      category_ids,
    })
  }
}
