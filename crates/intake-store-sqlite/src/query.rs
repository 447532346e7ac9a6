//! SQL predicate building for listings and exports.
//!
//! Every filter, including the child-cardinality ones, becomes part of one
//! `WHERE` clause, so a page and its total are computed from the same
//! predicate.

use intake_core::store::{
  ApplicationQuery, ExportFilter, SearchField, SortDirection, SortKey,
};
use rusqlite::types::Value;

use crate::encode::encode_enum;

/// A `WHERE` clause (possibly empty) and its positional parameters.
#[derive(Debug, Default)]
pub struct Predicate {
  conds:  Vec<String>,
  params: Vec<Value>,
}

impl Predicate {
  fn push(&mut self, cond: impl Into<String>) { self.conds.push(cond.into()); }

  /// Add a condition using one new parameter, referenced as `?N` in `cond`.
  fn push_param(&mut self, make: impl FnOnce(usize) -> String, value: impl Into<Value>) {
    self.params.push(value.into());
    let n = self.params.len();
    self.conds.push(make(n));
  }

  pub fn clause(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }

  pub fn params(&self) -> &[Value] { &self.params }
}

/// `%text%` with LIKE wildcards in `text` escaped by `\`.
pub fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

fn present(column: &str) -> String {
  format!("(a.{column} IS NOT NULL AND TRIM(a.{column}) != '')")
}

fn has_child(table: &str) -> String {
  format!("EXISTS (SELECT 1 FROM {table} c WHERE c.application_id = a.id)")
}

fn equality_filters(p: &mut Predicate, status: Option<&str>, category: Option<&str>) {
  if let Some(status) = status {
    p.push_param(|n| format!("a.status = ?{n}"), status.to_owned());
  }
  if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
    p.push_param(|n| format!("a.category = ?{n}"), category.to_owned());
  }
}

pub fn listing(q: &ApplicationQuery) -> Predicate {
  let mut p = Predicate::default();

  if let Some(text) = q.search() {
    let name = |n: usize| {
      format!(
        "ulower(a.first_name) LIKE ?{n} ESCAPE '\\' OR ulower(a.last_name) LIKE ?{n} ESCAPE '\\' \
         OR ulower(a.first_name || ' ' || a.last_name) LIKE ?{n} ESCAPE '\\'"
      )
    };
    let make = move |n: usize| match q.search_field {
      Some(SearchField::Name) => format!("({})", name(n)),
      Some(SearchField::Email) => format!("ulower(a.email) LIKE ?{n} ESCAPE '\\'"),
      Some(SearchField::Category) => format!("ulower(a.category) LIKE ?{n} ESCAPE '\\'"),
      None => format!("({} OR ulower(a.email) LIKE ?{n} ESCAPE '\\')", name(n)),
    };
    // Both sides are lower-cased; `ulower` is registered on every connection.
    p.push_param(make, like_pattern(&text.to_lowercase()));
  }

  let status = q.filter_status.map(encode_enum);
  equality_filters(&mut p, status.as_deref(), q.filter_category.as_deref());

  let on = |flag: Option<bool>| flag == Some(true);
  if on(q.filter_has_note) {
    p.push(present("notes"));
  }
  if on(q.filter_has_resume) {
    p.push(present("resume_url"));
  }
  if on(q.filter_has_video) {
    p.push(present("video_url"));
  }
  if on(q.filter_has_portfolio) {
    p.push(format!(
      "(json_array_length(a.portfolio_links) > 0 OR {})",
      present("portfolio_file_url")
    ));
  }
  if on(q.filter_min_skills) {
    p.push(has_child("skills"));
  }
  if on(q.filter_min_experiences) {
    p.push(has_child("experiences"));
  }
  if on(q.filter_min_socials) {
    p.push(has_child("socials"));
  }
  p
}

pub fn export(f: &ExportFilter) -> Predicate {
  let mut p = Predicate::default();
  let status = f.filter_status.map(encode_enum);
  equality_filters(&mut p, status.as_deref(), f.filter_category.as_deref());
  p
}

/// `ORDER BY` with `a.id` as the final tie-breaker.
pub fn order_by(q: &ApplicationQuery) -> String {
  let dir = match q.sort_direction() {
    SortDirection::Asc => "ASC",
    SortDirection::Desc => "DESC",
  };
  match q.sort_by() {
    SortKey::CreatedAt => format!("ORDER BY a.created_at {dir}, a.id {dir}"),
    SortKey::Name => format!(
      "ORDER BY a.first_name COLLATE NOCASE {dir}, a.last_name COLLATE NOCASE {dir}, a.id {dir}"
    ),
  }
}
