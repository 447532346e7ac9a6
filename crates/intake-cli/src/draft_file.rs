//! Wizard state kept in a JSON file between invocations.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use intake_core::{Error, Result, wizard::DraftStorage};

/// [`DraftStorage`] backed by a single file. Writes go to a sibling
/// temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStorage {
  path: PathBuf,
}

impl FileStorage {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  fn failure(&self, action: &str, e: std::io::Error) -> Error {
    Error::Storage(format!("{action} {}: {e}", self.path.display()))
  }
}

impl DraftStorage for FileStorage {
  fn load(&self) -> Result<Option<String>> {
    match std::fs::read_to_string(&self.path) {
      Ok(raw) => Ok(Some(raw)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(self.failure("reading", e)),
    }
  }

  fn save(&mut self, data: &str) -> Result<()> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent).map_err(|e| self.failure("creating directory for", e))?;
    }
    let tmp = self.path.with_extension("json.tmp");
    std::fs::write(&tmp, data).map_err(|e| self.failure("writing", e))?;
    std::fs::rename(&tmp, &self.path).map_err(|e| self.failure("replacing", e))
  }

  fn clear(&mut self) -> Result<()> {
    match std::fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(self.failure("removing", e)),
    }
  }
}

#[cfg(test)]
mod tests {
  use intake_core::{
    draft::FieldChange,
    step::Step,
    wizard::FormController,
  };
  use serde_json::json;
  use uuid::Uuid;

  use super::*;

  fn scratch() -> PathBuf {
    std::env::temp_dir()
      .join(format!("intake-cli-{}", Uuid::new_v4()))
      .join("draft.json")
  }

  #[test]
  fn missing_file_loads_as_nothing() {
    let storage = FileStorage::new(scratch());
    assert_eq!(storage.load().unwrap(), None);
  }

  #[test]
  fn save_creates_directories_and_clear_is_idempotent() {
    let path = scratch();
    let mut storage = FileStorage::new(&path);
    storage.save("{\"step\":3}").unwrap();
    assert_eq!(storage.load().unwrap().as_deref(), Some("{\"step\":3}"));
    assert!(!path.with_extension("json.tmp").exists());

    storage.clear().unwrap();
    storage.clear().unwrap();
    assert_eq!(storage.load().unwrap(), None);

    if let Some(dir) = path.parent() {
      std::fs::remove_dir_all(dir).ok();
    }
  }

  #[test]
  fn wizard_resumes_from_the_file() {
    let path = scratch();

    let mut wizard = FormController::hydrate(FileStorage::new(&path));
    wizard
      .apply(FieldChange::Set { path: "firstName".parse().unwrap(), value: json!("Ada") })
      .unwrap();
    wizard.go_to(Step::Skills);
    assert!(wizard.persisted());
    drop(wizard);

    let resumed = FormController::hydrate(FileStorage::new(&path));
    assert_eq!(resumed.step(), Step::Skills);
    assert_eq!(resumed.draft().first_name.as_deref(), Some("Ada"));

    if let Some(dir) = path.parent() {
      std::fs::remove_dir_all(dir).ok();
    }
  }

  #[test]
  fn corrupt_file_starts_fresh() {
    let path = scratch();
    let mut storage = FileStorage::new(&path);
    storage.save("not json").unwrap();

    let wizard = FormController::hydrate(FileStorage::new(&path));
    assert_eq!(wizard.step(), Step::FIRST);

    if let Some(dir) = path.parent() {
      std::fs::remove_dir_all(dir).ok();
    }
  }
}
