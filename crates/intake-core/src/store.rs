//! The `ApplicationStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `intake-store-sqlite`).
//! Higher layers (`intake-api`, `intake-server`) depend on this abstraction,
//! not on any concrete backend.

use std::{fmt, future::Future, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  application::{Application, ApplicationDetail, ApplicationStatus, NewApplication},
  sharing::{PublicToken, Visibility},
};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

// ─── Listing query ───────────────────────────────────────────────────────────

/// Which columns a free-text search looks at. Without one, the search
/// matches either the name or the email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
  Name,
  Email,
  Category,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
  #[default]
  CreatedAt,
  Name,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

/// Parameters for [`ApplicationStore::list_applications`].
///
/// Every `filter_*` flag is a presence filter: `Some(true)` keeps only
/// applications that have the thing, anything else is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationQuery {
  /// Case-insensitive substring.
  pub search_value:           Option<String>,
  pub search_field:           Option<SearchField>,
  pub limit:                  Option<usize>,
  pub offset:                 Option<usize>,
  pub sort_by:                Option<SortKey>,
  pub sort_direction:         Option<SortDirection>,
  pub filter_status:          Option<ApplicationStatus>,
  pub filter_category:        Option<String>,
  pub filter_min_skills:      Option<bool>,
  pub filter_min_experiences: Option<bool>,
  pub filter_min_socials:     Option<bool>,
  pub filter_has_portfolio:   Option<bool>,
  pub filter_has_note:        Option<bool>,
  pub filter_has_resume:      Option<bool>,
  pub filter_has_video:       Option<bool>,
}

impl ApplicationQuery {
  pub fn limit(&self) -> usize { self.limit.unwrap_or(DEFAULT_PAGE_SIZE) }

  pub fn offset(&self) -> usize { self.offset.unwrap_or(0) }

  pub fn sort_by(&self) -> SortKey { self.sort_by.unwrap_or_default() }

  pub fn sort_direction(&self) -> SortDirection { self.sort_direction.unwrap_or_default() }

  /// The trimmed search text, if any.
  pub fn search(&self) -> Option<&str> {
    self.search_value.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }

  /// Reject a page size outside `1..=100`.
  pub fn validate(&self) -> Result<(), QueryError> {
    match self.limit {
      Some(n) if !(1..=MAX_PAGE_SIZE).contains(&n) => Err(QueryError::Limit(n)),
      _ => Ok(()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
  #[error("limit must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
  Limit(usize),
}

/// One page of a listing. `total` counts every match, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPage {
  pub applications: Vec<Application>,
  pub total:        usize,
  pub limit:        usize,
  pub offset:       usize,
}

// ─── Export filter ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportFilter {
  pub filter_status:   Option<ApplicationStatus>,
  pub filter_category: Option<String>,
}

// ─── Favorites ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
  pub application:  Application,
  pub favorited_by: String,
  pub favorited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePage {
  pub favorites: Vec<FavoriteEntry>,
  pub total:     usize,
  pub limit:     usize,
  pub offset:    usize,
}

impl FromStr for SearchField {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "name" => Ok(Self::Name),
      "email" => Ok(Self::Email),
      "category" => Ok(Self::Category),
      other => Err(Error::UnknownVariant { kind: "search field", value: other.to_owned() }),
    }
  }
}

impl fmt::Display for SearchField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Name => "name",
      Self::Email => "email",
      Self::Category => "category",
    })
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an application store backend.
///
/// Applications are written once, with all their children, and never edited
/// afterwards except for the visibility flag. Favorites are independent
/// staff bookmarks.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ApplicationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Submission ────────────────────────────────────────────────────────

  /// Whether an application with this email (case-sensitive, trimmed by the
  /// caller) already exists.
  fn email_exists<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Insert an application and all of its children in one transaction.
  ///
  /// Fails without writing anything if the email is already taken.
  fn insert_application(
    &self,
    input: NewApplication,
  ) -> impl Future<Output = Result<Application, Self::Error>> + Send + '_;

  /// `true` when the error is the store's duplicate-email conflict.
  fn is_duplicate_email(err: &Self::Error) -> bool;

  // ── Admin reads ───────────────────────────────────────────────────────

  fn list_applications<'a>(
    &'a self,
    query: &'a ApplicationQuery,
  ) -> impl Future<Output = Result<ApplicationPage, Self::Error>> + Send + 'a;

  /// Load one application with every child relation. `None` if absent.
  fn get_application(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ApplicationDetail>, Self::Error>> + Send + '_;

  /// Every matching application with its children, newest first.
  fn export_applications<'a>(
    &'a self,
    filter: &'a ExportFilter,
  ) -> impl Future<Output = Result<Vec<ApplicationDetail>, Self::Error>> + Send + 'a;

  // ── Sharing ───────────────────────────────────────────────────────────

  /// Turn public sharing on (minting a fresh token) or off (clearing it).
  /// Returns `None` if the application does not exist.
  ///
  /// The returned [`Visibility`] carries no URL; callers add their own base.
  fn set_public(
    &self,
    id: Uuid,
    is_public: bool,
  ) -> impl Future<Output = Result<Option<Visibility>, Self::Error>> + Send + '_;

  /// Resolve a token to its application, only while sharing is on.
  fn get_public<'a>(
    &'a self,
    token: &'a PublicToken,
  ) -> impl Future<Output = Result<Option<ApplicationDetail>, Self::Error>> + Send + 'a;

  // ── Favorites ─────────────────────────────────────────────────────────

  /// Flip membership of `id` in `username`'s favorites. Returns the new
  /// state, or `None` if the application does not exist.
  fn toggle_favorite<'a>(
    &'a self,
    username: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<bool>, Self::Error>> + Send + 'a;

  fn is_favorite<'a>(
    &'a self,
    username: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Favorites of every staff member, most recent first.
  fn list_favorites(
    &self,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<FavoritePage, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn query_defaults() {
    let q = ApplicationQuery::default();
    assert_eq!(q.limit(), DEFAULT_PAGE_SIZE);
    assert_eq!(q.offset(), 0);
    assert_eq!(q.sort_by(), SortKey::CreatedAt);
    assert_eq!(q.sort_direction(), SortDirection::Desc);
    assert_eq!(q.search(), None);
  }

  #[test]
  fn query_limit_bounds() {
    let q = |limit| ApplicationQuery { limit: Some(limit), ..Default::default() };
    assert!(q(1).validate().is_ok());
    assert!(q(100).validate().is_ok());
    assert_eq!(q(0).validate(), Err(QueryError::Limit(0)));
    assert_eq!(q(101).validate(), Err(QueryError::Limit(101)));
  }

  #[test]
  fn query_deserialises_from_camel_case() {
    let q: ApplicationQuery = serde_json::from_value(serde_json::json!({
      "searchValue": "ada",
      "searchField": "email",
      "sortBy": "name",
      "sortDirection": "asc",
      "filterMinSkills": true,
    }))
    .unwrap();
    assert_eq!(q.search_field, Some(SearchField::Email));
    assert_eq!(q.sort_by(), SortKey::Name);
    assert_eq!(q.sort_direction(), SortDirection::Asc);
    assert_eq!(q.filter_min_skills, Some(true));
  }
}
