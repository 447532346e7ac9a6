//! Public share tokens.

use std::fmt;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random bytes per token. The hex form is twice as long.
pub const TOKEN_BYTES: usize = 32;

/// How many fresh tokens a store tries before giving up on a collision.
pub const MAX_TOKEN_ATTEMPTS: usize = 8;

/// An opaque, unguessable handle granting read-only access to one
/// application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicToken(String);

impl PublicToken {
  /// Mint a token from the operating system's secure random source.
  pub fn generate() -> Self {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Self(hex::encode(bytes))
  }

  /// Wrap a token received from a URL or read back from storage.
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for PublicToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// The sharing state of an application after a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
  pub application_id: Uuid,
  pub is_public:      bool,
  pub public_token:   Option<PublicToken>,
  /// Fully-qualified link to the public view; present only when public.
  pub shareable_url:  Option<String>,
}

impl Visibility {
  pub fn private(application_id: Uuid) -> Self {
    Self { application_id, is_public: false, public_token: None, shareable_url: None }
  }

  pub fn public(application_id: Uuid, token: PublicToken, base_url: &str) -> Self {
    let url = shareable_url(base_url, &token);
    Self {
      application_id,
      is_public: true,
      public_token: Some(token),
      shareable_url: Some(url),
    }
  }

  /// Fill in the link for a visibility returned by a store.
  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.shareable_url = self.public_token.as_ref().map(|t| shareable_url(base_url, t));
    self
  }
}

/// `{base}/application/{token}`, tolerating a trailing slash on `base`.
pub fn shareable_url(base_url: &str, token: &PublicToken) -> String {
  format!("{}/application/{}", base_url.trim_end_matches('/'), token)
}
