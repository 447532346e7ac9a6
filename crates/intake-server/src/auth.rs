//! HTTP Basic authentication for staff routes.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use intake_api::StaffUser;
use serde::Deserialize;
use tracing::warn;

use crate::error::Error;

/// One staff login.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffAccount {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Verify Basic credentials against the configured accounts.
pub fn verify_auth(headers: &HeaderMap, accounts: &[StaffAccount]) -> Result<StaffUser, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val.strip_prefix("Basic ").ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let account = accounts
    .iter()
    .find(|a| a.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash).map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(StaffUser(account.username.clone()))
}

/// Middleware: reject unauthenticated requests, otherwise attach the
/// [`StaffUser`] for the admin handlers.
pub async fn require_staff(
  State(accounts): State<Arc<[StaffAccount]>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let staff = verify_auth(req.headers(), &accounts).inspect_err(|_| {
    warn!(path = %req.uri().path(), "rejected staff request");
  })?;
  req.extensions_mut().insert(staff);
  Ok(next.run(req).await)
}

#[cfg(test)]
pub(crate) mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::{HeaderValue, header};
  use rand_core::OsRng;

  use super::*;

  pub fn account(username: &str, password: &str) -> StaffAccount {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string();
    StaffAccount { username: username.to_owned(), password_hash: hash }
  }

  pub fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn correct_credentials_name_the_staff_member() {
    let accounts = [account("alice", "secret"), account("bob", "hunter2")];
    let staff = verify_auth(&headers(&basic("bob", "hunter2")), &accounts).unwrap();
    assert_eq!(staff, StaffUser("bob".into()));
  }

  #[test]
  fn wrong_password() {
    let accounts = [account("alice", "secret")];
    let result = verify_auth(&headers(&basic("alice", "wrong")), &accounts);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let accounts = [account("alice", "secret")];
    let result = verify_auth(&headers(&basic("mallory", "secret")), &accounts);
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let accounts = [account("alice", "secret")];
    assert!(matches!(verify_auth(&HeaderMap::new(), &accounts), Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64_and_scheme() {
    let accounts = [account("alice", "secret")];
    let bad = verify_auth(&headers("Basic !!!not-base64!!!"), &accounts);
    assert!(matches!(bad, Err(Error::Unauthorized)));
    let bearer = verify_auth(&headers("Bearer abc"), &accounts);
    assert!(matches!(bearer, Err(Error::Unauthorized)));
  }
}
