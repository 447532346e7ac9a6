//! `POST /api/uploads`: applicant attachments stored on local disk.
//!
//! Multipart fields: `file` (required) and `type` (`resume`, the default, or
//! `portfolio`). Files land in `{upload_dir}/{resumes|portfolios}/` under a
//! timestamped, sanitised name and are served back from `/uploads/`.

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json,
  extract::{Multipart, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Error;

const MB: usize = 1024 * 1024;

/// Largest request body accepted by the upload route, leaving room for
/// multipart framing around the largest file.
pub const BODY_LIMIT: usize = 51 * MB;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
  #[default]
  Resume,
  Portfolio,
}

impl UploadKind {
  fn parse(s: &str) -> Result<Self, Error> {
    match s.trim() {
      "" | "resume" => Ok(Self::Resume),
      "portfolio" => Ok(Self::Portfolio),
      other => Err(Error::BadRequest(format!("Unknown upload type: {other}"))),
    }
  }

  pub fn dir(self) -> &'static str {
    match self {
      Self::Resume => "resumes",
      Self::Portfolio => "portfolios",
    }
  }

  pub fn max_bytes(self) -> usize {
    match self {
      Self::Resume => 10 * MB,
      Self::Portfolio => 50 * MB,
    }
  }

  fn content_types(self) -> &'static [&'static str] {
    match self {
      Self::Resume => &[
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
      ],
      Self::Portfolio => &["video/mp4", "video/quicktime", "video/webm"],
    }
  }

  fn extensions(self) -> &'static [&'static str] {
    match self {
      Self::Resume => &[".pdf", ".doc", ".docx"],
      Self::Portfolio => &[".mp4", ".mov", ".webm"],
    }
  }

  /// Either the declared content type or the file extension must be on the
  /// allow-list.
  pub fn accepts(self, content_type: &str, file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    let extension = lower.rfind('.').map(|i| &lower[i..]).unwrap_or_default();
    self.content_types().contains(&content_type) || self.extensions().contains(&extension)
  }

  fn type_error(self) -> Error {
    Error::BadRequest(
      match self {
        Self::Resume => "Invalid file type. Please upload PDF, DOC, or DOCX files.",
        Self::Portfolio => "Invalid file type. Please upload MP4, MOV, or WEBM files.",
      }
      .to_owned(),
    )
  }
}

/// Replace everything outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
  name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
    .collect()
}

/// Where uploads are written and how they are addressed afterwards.
#[derive(Debug, Clone)]
pub struct UploadConfig {
  pub dir:             PathBuf,
  pub public_base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
  pub url:       String,
  /// The name the client sent, before sanitising.
  pub file_name: String,
  pub size:      usize,
  /// The declared content type.
  #[serde(rename = "type")]
  pub mime:      String,
}

struct Received {
  name:         String,
  content_type: String,
  data:         axum::body::Bytes,
}

pub async fn handler(
  State(config): State<Arc<UploadConfig>>,
  mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, Error> {
  let mut kind = UploadKind::default();
  let mut file = None;

  while let Some(field) = multipart.next_field().await? {
    let field_name = field.name().map(str::to_owned);
    match field_name.as_deref() {
      Some("file") => {
        let name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let data = field.bytes().await?;
        file = Some(Received { name, content_type, data });
      }
      Some("type") => kind = UploadKind::parse(&field.text().await?)?,
      _ => {}
    }
  }

  let file = file.ok_or_else(|| Error::BadRequest("No file provided".to_owned()))?;

  if !kind.accepts(&file.content_type, &file.name) {
    return Err(kind.type_error());
  }
  if file.data.len() > kind.max_bytes() {
    return Err(Error::BadRequest(format!(
      "File size exceeds {}MB limit",
      kind.max_bytes() / MB
    )));
  }

  let stored = format!("{}-{}", Utc::now().timestamp_millis(), sanitize_file_name(&file.name));
  let dir = config.dir.join(kind.dir());
  tokio::fs::create_dir_all(&dir).await?;
  tokio::fs::write(dir.join(&stored), &file.data).await?;

  let url = format!(
    "{}/uploads/{}/{stored}",
    config.public_base_url.trim_end_matches('/'),
    kind.dir()
  );
  info!(kind = kind.dir(), size = file.data.len(), %stored, "stored upload");

  Ok(Json(UploadReceipt {
    url,
    file_name: file.name,
    size: file.data.len(),
    mime: file.content_type,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_sanitised() {
    assert_eq!(sanitize_file_name("my resume (final).pdf"), "my_resume__final_.pdf");
    assert_eq!(sanitize_file_name("café-cv.docx"), "caf_-cv.docx");
    assert_eq!(sanitize_file_name("a/../b.pdf"), "a_.._b.pdf");
  }

  #[test]
  fn type_or_extension_is_enough() {
    assert!(UploadKind::Resume.accepts("application/pdf", "blob"));
    assert!(UploadKind::Resume.accepts("application/octet-stream", "CV.DOCX"));
    assert!(!UploadKind::Resume.accepts("video/mp4", "clip.mp4"));
    assert!(UploadKind::Portfolio.accepts("", "reel.mov"));
    assert!(!UploadKind::Portfolio.accepts("application/pdf", "cv.pdf"));
    assert!(!UploadKind::Resume.accepts("", "noextension"));
  }

  #[test]
  fn kind_defaults_to_resume() {
    assert_eq!(UploadKind::parse("").unwrap(), UploadKind::Resume);
    assert_eq!(UploadKind::parse("portfolio").unwrap(), UploadKind::Portfolio);
    assert!(UploadKind::parse("avatar").is_err());
  }
}
