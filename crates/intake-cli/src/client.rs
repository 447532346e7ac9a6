//! Async HTTP client wrapping the intake JSON API.

use std::{future::Future, path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use intake_core::{
  application::ApplicationDetail,
  draft::ApplicationDraft,
  export::{ExportFormat, ExportPayload},
  sharing::Visibility,
  store::{ApplicationPage, ApplicationQuery, ExportFilter, FavoritePage},
  submission::{SubmissionReceipt, SubmitApplication, SubmitFailure},
  validate::ValidationErrors,
};
use reqwest::{Client, Response, StatusCode, multipart};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Connection settings for the intake API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Which upload slot a file goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UploadKind {
  Resume,
  Portfolio,
}

impl UploadKind {
  fn as_str(self) -> &'static str {
    match self {
      Self::Resume => "resume",
      Self::Portfolio => "portfolio",
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
  pub url:       String,
  pub file_name: String,
  pub size:      u64,
}

/// Error body shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ErrorBody {
  error:        String,
  field_errors: Option<ValidationErrors>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteState {
  is_favorite: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailAvailability {
  is_unique: bool,
}

/// Async HTTP client for the intake REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
    let req = self.client.request(method, self.url(&format!("/admin{path}")));
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  // ── Applicant ─────────────────────────────────────────────────────────────

  /// `GET /api/applications/email-available?email=<email>`
  pub async fn check_email(&self, email: &str) -> Result<bool> {
    let resp = self
      .client
      .get(self.url("/applications/email-available"))
      .query(&[("email", email)])
      .send()
      .await
      .context("GET /applications/email-available failed")?;
    let body: EmailAvailability = success(resp, "GET /applications/email-available")
      .await?
      .json()
      .await
      .context("deserialising email availability")?;
    Ok(body.is_unique)
  }

  /// `POST /api/uploads` (multipart)
  pub async fn upload(&self, path: &Path, kind: UploadKind) -> Result<UploadReceipt> {
    let data = tokio::fs::read(path)
      .await
      .with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_owned());
    let part = multipart::Part::bytes(data)
      .file_name(file_name.clone())
      .mime_str(content_type_for(&file_name))
      .context("building upload part")?;
    let form = multipart::Form::new().text("type", kind.as_str()).part("file", part);

    let resp = self
      .client
      .post(self.url("/uploads"))
      .multipart(form)
      .send()
      .await
      .context("POST /uploads failed")?;
    success(resp, "POST /uploads")
      .await?
      .json()
      .await
      .context("deserialising upload receipt")
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  /// `GET /api/admin/applications?...`
  pub async fn list_applications(&self, query: &ApplicationQuery) -> Result<ApplicationPage> {
    let resp = self
      .admin(reqwest::Method::GET, "/applications")
      .query(query)
      .send()
      .await
      .context("GET /admin/applications failed")?;
    success(resp, "GET /admin/applications")
      .await?
      .json()
      .await
      .context("deserialising application page")
  }

  /// `GET /api/admin/applications/<id>`; `None` when there is no such
  /// application.
  pub async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
    let resp = self
      .admin(reqwest::Method::GET, &format!("/applications/{id}"))
      .send()
      .await
      .context("GET /admin/applications/<id> failed")?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let detail = success(resp, "GET /admin/applications/<id>")
      .await?
      .json()
      .await
      .context("deserialising application")?;
    Ok(Some(detail))
  }

  /// `POST /api/admin/export`
  pub async fn export(&self, format: ExportFormat, filter: &ExportFilter) -> Result<ExportPayload> {
    let mut body = serde_json::to_value(filter).context("encoding export filter")?;
    body["format"] = json!(format);
    let resp = self
      .admin(reqwest::Method::POST, "/export")
      .json(&body)
      .send()
      .await
      .context("POST /admin/export failed")?;
    success(resp, "POST /admin/export")
      .await?
      .json()
      .await
      .context("deserialising export")
  }

  /// `POST /api/admin/applications/<id>/public`
  pub async fn set_public(&self, id: Uuid, is_public: bool) -> Result<Visibility> {
    let resp = self
      .admin(reqwest::Method::POST, &format!("/applications/{id}/public"))
      .json(&json!({ "isPublic": is_public }))
      .send()
      .await
      .context("POST /admin/applications/<id>/public failed")?;
    success(resp, "POST /admin/applications/<id>/public")
      .await?
      .json()
      .await
      .context("deserialising visibility")
  }

  /// `POST /api/admin/applications/<id>/favorite`; returns the new state.
  pub async fn toggle_favorite(&self, id: Uuid) -> Result<bool> {
    let resp = self
      .admin(reqwest::Method::POST, &format!("/applications/{id}/favorite"))
      .send()
      .await
      .context("POST /admin/applications/<id>/favorite failed")?;
    let state: FavoriteState = success(resp, "POST /admin/applications/<id>/favorite")
      .await?
      .json()
      .await
      .context("deserialising favorite state")?;
    Ok(state.is_favorite)
  }

  /// `GET /api/admin/favorites?limit=&offset=`
  pub async fn list_favorites(&self, limit: Option<usize>, offset: Option<usize>) -> Result<FavoritePage> {
    let mut params = Vec::new();
    if let Some(limit) = limit {
      params.push(("limit", limit));
    }
    if let Some(offset) = offset {
      params.push(("offset", offset));
    }
    let resp = self
      .admin(reqwest::Method::GET, "/favorites")
      .query(&params)
      .send()
      .await
      .context("GET /admin/favorites failed")?;
    success(resp, "GET /admin/favorites")
      .await?
      .json()
      .await
      .context("deserialising favorites")
  }
}

impl SubmitApplication for ApiClient {
  fn submit<'a>(
    &'a self,
    draft: &'a ApplicationDraft,
  ) -> impl Future<Output = Result<SubmissionReceipt, SubmitFailure>> + 'a {
    async move {
      let resp = self
        .client
        .post(self.url("/applications"))
        .json(draft)
        .send()
        .await
        .map_err(|e| SubmitFailure::Transport(e.to_string()))?;

      let status = resp.status();
      if status.is_success() {
        return resp
          .json()
          .await
          .map_err(|e| SubmitFailure::Transport(format!("deserialising receipt: {e}")));
      }

      let body: ErrorBody = resp.json().await.unwrap_or_default();
      Err(match status {
        StatusCode::UNPROCESSABLE_ENTITY => {
          SubmitFailure::Fields(body.field_errors.unwrap_or_default())
        }
        StatusCode::CONFLICT => SubmitFailure::Conflict(body.error),
        _ => SubmitFailure::Transport(format!("POST /applications → {status}: {}", body.error)),
      })
    }
  }
}

/// Pass a successful response through; turn anything else into an error
/// carrying the server's message.
async fn success(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body: ErrorBody = resp.json().await.unwrap_or_default();
  if body.error.is_empty() {
    Err(anyhow!("{what} → {status}"))
  } else {
    Err(anyhow!("{what} → {status}: {}", body.error))
  }
}

fn content_type_for(file_name: &str) -> &'static str {
  let lower = file_name.to_ascii_lowercase();
  match lower.rsplit_once('.').map(|(_, ext)| ext) {
    Some("pdf") => "application/pdf",
    Some("doc") => "application/msword",
    Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    Some("mp4") => "video/mp4",
    Some("mov") => "video/quicktime",
    Some("webm") => "video/webm",
    _ => "application/octet-stream",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn content_type_follows_extension() {
    assert_eq!(content_type_for("CV.PDF"), "application/pdf");
    assert_eq!(content_type_for("reel.mov"), "video/quicktime");
    assert_eq!(content_type_for("notes"), "application/octet-stream");
  }

  #[test]
  fn field_errors_decode_from_a_422_body() {
    let raw = r#"{"error":"Validation failed","fieldErrors":[{"path":"email","message":"Invalid email"}]}"#;
    let body: ErrorBody = serde_json::from_str(raw).unwrap();
    let errors = body.field_errors.unwrap();
    assert_eq!(errors.messages_at("email"), vec!["Invalid email"]);
  }

  #[test]
  fn urls_are_rooted_at_api() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://localhost:8080/".to_owned(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap();
    assert_eq!(client.url("/applications"), "http://localhost:8080/api/applications");
  }
}
