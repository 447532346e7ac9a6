//! CSV and JSON dumps of fully-loaded applications.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, application::ApplicationDetail};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
  #[default]
  Csv,
  Json,
}

/// The export body handed back to the admin client. `data` is the whole
/// document as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
  pub format: ExportFormat,
  pub data:   String,
}

pub const CSV_COLUMNS: &[&str] = &[
  "id",
  "firstName",
  "lastName",
  "email",
  "phoneNumber",
  "category",
  "status",
  "countryOfResidence",
  "countryOfOrigin",
  "city",
  "currentJobStatus",
  "highestFormalEducationLevel",
  "availability",
  "hoursPerWeek",
  "expectedSalary",
  "resumeUrl",
  "videoUrl",
  "notes",
  "tags",
  "languages",
  "skills",
  "experiences",
  "socials",
  "createdAt",
  "updatedAt",
];

const LIST_SEPARATOR: &str = "; ";

pub fn render(format: ExportFormat, details: &[ApplicationDetail]) -> Result<ExportPayload> {
  let data = match format {
    ExportFormat::Json => serde_json::to_string_pretty(details)?,
    ExportFormat::Csv => to_csv(details)?,
  };
  Ok(ExportPayload { format, data })
}

// ─── CSV ─────────────────────────────────────────────────────────────────────

/// One flattened cell. Text is always quoted; numbers are written bare.
enum Cell {
  Text(String),
  Number(i64),
}

impl Cell {
  fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }

  fn opt(s: Option<impl ToString>) -> Self {
    Self::Text(s.map(|s| s.to_string()).unwrap_or_default())
  }

  /// Quoting happens here since the writer runs with `QuoteStyle::Never`.
  fn encode(&self) -> String {
    match self {
      Cell::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
      Cell::Number(n) => n.to_string(),
    }
  }
}

fn timestamp(t: DateTime<Utc>) -> String { t.to_rfc3339_opts(SecondsFormat::Millis, true) }

fn joined<T>(items: &[T], f: impl Fn(&T) -> String) -> Cell {
  Cell::Text(items.iter().map(f).collect::<Vec<_>>().join(LIST_SEPARATOR))
}

fn row(d: &ApplicationDetail) -> Vec<Cell> {
  let a = &d.application;
  vec![
    Cell::text(a.id.to_string()),
    Cell::text(&a.first_name),
    Cell::text(&a.last_name),
    Cell::text(&a.email),
    Cell::text(&a.phone_number),
    Cell::text(&a.category),
    Cell::text(a.status.to_string()),
    Cell::text(&a.country_of_residence),
    Cell::opt(a.country_of_origin.as_deref()),
    Cell::opt(a.city.as_deref()),
    Cell::text(a.current_job_status.to_string()),
    Cell::text(a.highest_formal_education_level.to_string()),
    Cell::text(a.availability.to_string()),
    match a.hours_per_week {
      Some(h) => Cell::Number(h.into()),
      None => Cell::text(""),
    },
    Cell::text(a.expected_salary.to_string()),
    Cell::opt(a.resume_url.as_deref()),
    Cell::opt(a.video_url.as_deref()),
    Cell::opt(a.notes.as_deref()),
    Cell::text(a.tags.join(LIST_SEPARATOR)),
    joined(&d.languages, |l| format!("{} ({})", l.name, l.proficiency)),
    joined(&d.skills, |s| s.name.clone()),
    joined(&d.experiences, |e| {
      match (e.position.as_deref(), e.company.as_deref()) {
        (Some(p), Some(c)) => format!("{p} at {c}"),
        (Some(p), None) => p.to_owned(),
        (None, Some(c)) => c.to_owned(),
        (None, None) => String::new(),
      }
    }),
    joined(&d.socials, |s| format!("{}: {}", s.platform, s.url)),
    Cell::text(timestamp(a.created_at)),
    Cell::text(timestamp(a.updated_at)),
  ]
}

/// Header plus one row per application, `\n`-separated with no trailing
/// newline. An empty set renders as an empty string.
fn to_csv(details: &[ApplicationDetail]) -> Result<String> {
  if details.is_empty() {
    return Ok(String::new());
  }

  // Cells arrive pre-escaped so the writer must not quote again.
  let mut writer = csv::WriterBuilder::new()
    .quote_style(csv::QuoteStyle::Never)
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(Vec::new());

  writer.write_record(CSV_COLUMNS)?;
  for detail in details {
    writer.write_record(row(detail).iter().map(Cell::encode))?;
  }

  let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
  let mut out = String::from_utf8_lossy(&bytes).into_owned();
  if out.ends_with('\n') {
    out.pop();
  }
  Ok(out)
}
