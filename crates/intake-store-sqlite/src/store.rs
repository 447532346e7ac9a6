//! [`SqliteStore`], the SQLite implementation of [`ApplicationStore`].

use std::path::Path;

use intake_core::{
  application::{Application, ApplicationDetail, ApplicationStatus, NewApplication},
  sharing::{MAX_TOKEN_ATTEMPTS, PublicToken, Visibility},
  store::{
    ApplicationPage, ApplicationQuery, ApplicationStore, ExportFilter, FavoriteEntry,
    FavoritePage,
  },
};
use rusqlite::{OptionalExtension as _, functions::FunctionFlags, types::Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    APPLICATION_COLUMNS, RawApplication, RawExperience, RawLanguage, RawSkill, RawSocial,
    decode_dt, encode_date, encode_dt, encode_enum, encode_list, encode_uuid, now,
  },
  query,
  schema::SCHEMA,
};

/// `ulower(text)`: Unicode lower-casing. SQLite's own `lower` and `LIKE`
/// fold ASCII only.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "ulower",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: Option<String> = ctx.get(0)?;
      Ok(text.map(|t| t.to_lowercase()))
    },
  )
}

/// Row counts for `LIMIT` / `OFFSET`; anything past `i64::MAX` saturates.
fn sql_count(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

// ─── Row bundles ─────────────────────────────────────────────────────────────

/// An application row with all of its children, still undecoded.
struct RawDetail {
  application: RawApplication,
  languages:   Vec<RawLanguage>,
  socials:     Vec<RawSocial>,
  skills:      Vec<RawSkill>,
  experiences: Vec<(RawExperience, Vec<String>)>,
}

impl RawDetail {
  fn into_detail(self) -> Result<ApplicationDetail> {
    Ok(ApplicationDetail {
      application: self.application.into_application()?,
      languages:   self
        .languages
        .into_iter()
        .map(RawLanguage::into_language)
        .collect::<Result<_>>()?,
      skills:      self.skills.into_iter().map(RawSkill::into_skill).collect::<Result<_>>()?,
      experiences: self
        .experiences
        .into_iter()
        .map(|(raw, categories)| raw.into_experience(categories))
        .collect::<Result<_>>()?,
      socials:     self.socials.into_iter().map(RawSocial::into_social).collect::<Result<_>>()?,
    })
  }
}

/// A submission with every JSON column pre-encoded, ready to move onto the
/// connection thread.
struct PendingInsert {
  id:              String,
  at:              String,
  app:             NewApplication,
  portfolio_links: String,
  skill_tags:      Vec<String>,
  exp_lists:       Vec<(String, String)>,
}

/// What happened while turning sharing on.
enum Sharing {
  Missing,
  Enabled(PublicToken),
  Exhausted,
}

fn is_unique_violation(e: &rusqlite::Error, column: &str) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, Some(msg))
      if f.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains(column)
  )
}

fn load_detail(conn: &rusqlite::Connection, application: RawApplication) -> rusqlite::Result<RawDetail> {
  let id = application.id.clone();

  let languages = conn
    .prepare_cached(
      "SELECT name, proficiency FROM languages WHERE application_id = ?1 ORDER BY sort_order",
    )?
    .query_map([&id], |r| Ok(RawLanguage { name: r.get(0)?, proficiency: r.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let socials = conn
    .prepare_cached(
      "SELECT platform, url FROM socials WHERE application_id = ?1 ORDER BY sort_order",
    )?
    .query_map([&id], |r| Ok(RawSocial { platform: r.get(0)?, url: r.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let skills = conn
    .prepare_cached(
      "SELECT name, tags, level, total_experience, start_year, institution, self_taught
       FROM skills WHERE application_id = ?1 ORDER BY sort_order",
    )?
    .query_map([&id], |r| {
      Ok(RawSkill {
        name:             r.get(0)?,
        tags:             r.get(1)?,
        level:            r.get(2)?,
        total_experience: r.get(3)?,
        start_year:       r.get(4)?,
        institution:      r.get(5)?,
        self_taught:      r.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let raw_experiences = conn
    .prepare_cached(
      "SELECT id, company, position, description, start_year, end_year, is_current,
              links, achievements
       FROM experiences WHERE application_id = ?1 ORDER BY sort_order",
    )?
    .query_map([&id], |r| {
      Ok(RawExperience {
        id:           r.get(0)?,
        company:      r.get(1)?,
        position:     r.get(2)?,
        description:  r.get(3)?,
        start_year:   r.get(4)?,
        end_year:     r.get(5)?,
        is_current:   r.get(6)?,
        links:        r.get(7)?,
        achievements: r.get(8)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut categories = conn.prepare_cached(
    "SELECT category_id FROM experience_categories WHERE experience_id = ?1 ORDER BY rowid",
  )?;
  let mut experiences = Vec::with_capacity(raw_experiences.len());
  for raw in raw_experiences {
    let ids = categories
      .query_map([raw.id], |r| r.get(0))?
      .collect::<rusqlite::Result<Vec<String>>>()?;
    experiences.push((raw, ids));
  }

  Ok(RawDetail { application, languages, socials, skills, experiences })
}

fn insert_rows(tx: &rusqlite::Transaction<'_>, p: &PendingInsert) -> rusqlite::Result<()> {
  let a = &p.app;
  tx.execute(
    "INSERT INTO applications (
       id, first_name, last_name, email, phone_number, birth_year,
       country_of_origin, country_of_residence, city, time_zone,
       highest_formal_education_level, current_job_status, category,
       portfolio_links, portfolio_file_url, availability, available_in,
       hours_per_week, available_from, expected_salary_cents, resume_url,
       video_url, notes, status, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
               ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?25)",
    rusqlite::params![
      p.id,
      a.first_name,
      a.last_name,
      a.email,
      a.phone_number,
      a.birth_year,
      a.country_of_origin,
      a.country_of_residence,
      a.city,
      a.time_zone,
      encode_enum(a.highest_formal_education_level),
      encode_enum(a.current_job_status),
      a.category,
      p.portfolio_links,
      a.portfolio_file_url,
      encode_enum(a.availability),
      a.available_in,
      a.hours_per_week,
      a.available_from.map(encode_date),
      a.expected_salary.cents(),
      a.resume_url,
      a.video_url,
      a.notes,
      encode_enum(ApplicationStatus::Active),
      p.at,
    ],
  )?;

  for (i, lang) in a.languages.iter().enumerate() {
    tx.execute(
      "INSERT INTO languages (application_id, sort_order, name, proficiency)
       VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![p.id, i as i64, lang.name, encode_enum(lang.proficiency)],
    )?;
  }

  for (i, social) in a.socials().iter().enumerate() {
    tx.execute(
      "INSERT INTO socials (application_id, sort_order, platform, url) VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![p.id, i as i64, encode_enum(social.platform), social.url],
    )?;
  }

  for (i, (skill, tags)) in a.skills.iter().zip(&p.skill_tags).enumerate() {
    tx.execute(
      "INSERT INTO skills (
         application_id, sort_order, name, tags, level, total_experience,
         start_year, institution, self_taught
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      rusqlite::params![
        p.id,
        i as i64,
        skill.name,
        tags,
        encode_enum(skill.level),
        skill.total_experience,
        skill.start_year,
        skill.institution,
        skill.self_taught,
      ],
    )?;
  }

  for (i, (exp, (links, achievements))) in a.experiences.iter().zip(&p.exp_lists).enumerate() {
    tx.execute(
      "INSERT INTO experiences (
         application_id, sort_order, company, position, description,
         start_year, end_year, is_current, links, achievements
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
      rusqlite::params![
        p.id,
        i as i64,
        exp.company,
        exp.position,
        exp.description,
        exp.start_year,
        if exp.is_current { None } else { exp.end_year },
        exp.is_current,
        links,
        achievements,
      ],
    )?;
    let exp_id = tx.last_insert_rowid();
    for category in &exp.category_ids {
      tx.execute(
        "INSERT OR IGNORE INTO experience_categories (experience_id, category_id) VALUES (?1, ?2)",
        rusqlite::params![exp_id, category],
      )?;
    }
  }

  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An application store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load every application matching a `WHERE` clause, with children.
  async fn fetch_details(
    &self,
    clause: String,
    params: Vec<Value>,
    order: &'static str,
  ) -> Result<Vec<ApplicationDetail>> {
    let raws: Vec<RawDetail> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications a {clause} {order}");
        let apps = conn
          .prepare(&sql)?
          .query_map(rusqlite::params_from_iter(params.iter()), RawApplication::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let details = apps
          .into_iter()
          .map(|app| load_detail(conn, app))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(details)
      })
      .await?;

    raws.into_iter().map(RawDetail::into_detail).collect()
  }

  /// Turn sharing on for `id`, drawing candidate tokens from `mint`.
  ///
  /// A candidate already in use is discarded; after [`MAX_TOKEN_ATTEMPTS`]
  /// discarded candidates the call fails.
  pub(crate) async fn enable_sharing<F>(&self, id: Uuid, mut mint: F) -> Result<Option<PublicToken>>
  where
    F: FnMut() -> PublicToken + Send + 'static,
  {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let outcome = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row("SELECT 1 FROM applications WHERE id = ?1", [&id_str], |_| Ok(()))
          .optional()?
          .is_some();
        if !exists {
          return Ok(Sharing::Missing);
        }

        for _ in 0..MAX_TOKEN_ATTEMPTS {
          let token = mint();
          let taken = conn
            .query_row(
              "SELECT 1 FROM applications WHERE public_token = ?1",
              [token.as_str()],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            continue;
          }
          let updated = conn.execute(
            "UPDATE applications SET is_public = 1, public_token = ?1, updated_at = ?2
             WHERE id = ?3",
            rusqlite::params![token.as_str(), at_str, id_str],
          );
          match updated {
            Ok(_) => return Ok(Sharing::Enabled(token)),
            Err(e) if is_unique_violation(&e, "applications.public_token") => continue,
            Err(e) => return Err(e.into()),
          }
        }
        Ok(Sharing::Exhausted)
      })
      .await?;

    match outcome {
      Sharing::Missing => Ok(None),
      Sharing::Enabled(token) => Ok(Some(token)),
      Sharing::Exhausted => {
        warn!(%id, "public token minting exhausted its attempts");
        Err(Error::TokenExhausted(MAX_TOKEN_ATTEMPTS))
      }
    }
  }

  async fn disable_sharing(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE applications SET is_public = 0, public_token = NULL, updated_at = ?1
           WHERE id = ?2",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── ApplicationStore impl ───────────────────────────────────────────────────

impl ApplicationStore for SqliteStore {
  type Error = Error;

  // ── Submission ────────────────────────────────────────────────────────────

  async fn email_exists(&self, email: &str) -> Result<bool> {
    let email = email.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row("SELECT 1 FROM applications WHERE email = ?1", [&email], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn insert_application(&self, input: NewApplication) -> Result<Application> {
    let id = Uuid::new_v4();
    let at = now();

    let pending = PendingInsert {
      id:              encode_uuid(id),
      at:              encode_dt(at),
      portfolio_links: encode_list(&input.portfolio_links)?,
      skill_tags:      input
        .skills
        .iter()
        .map(|s| encode_list(&s.tags))
        .collect::<Result<_>>()?,
      exp_lists:       input
        .experiences
        .iter()
        .map(|e| Ok((encode_list(&e.links)?, encode_list(&e.achievements)?)))
        .collect::<Result<_>>()?,
      app:             input,
    };

    let (inserted, pending) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match insert_rows(&tx, &pending) {
          Ok(()) => {
            tx.commit()?;
            Ok((true, pending))
          }
          // Dropping the transaction rolls it back.
          Err(e) if is_unique_violation(&e, "applications.email") => Ok((false, pending)),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    let a = pending.app;
    if !inserted {
      return Err(Error::DuplicateEmail(a.email));
    }

    debug!(%id, languages = a.languages.len(), skills = a.skills.len(), "inserted application");
    Ok(Application {
      id,
      first_name: a.first_name,
      last_name: a.last_name,
      email: a.email,
      phone_number: a.phone_number,
      birth_year: a.birth_year,
      country_of_origin: a.country_of_origin,
      country_of_residence: a.country_of_residence,
      city: a.city,
      time_zone: a.time_zone,
      highest_formal_education_level: a.highest_formal_education_level,
      current_job_status: a.current_job_status,
      category: a.category,
      portfolio_links: a.portfolio_links,
      portfolio_file_url: a.portfolio_file_url,
      availability: a.availability,
      available_in: a.available_in,
      hours_per_week: a.hours_per_week,
      available_from: a.available_from,
      expected_salary: a.expected_salary,
      resume_url: a.resume_url,
      video_url: a.video_url,
      notes: a.notes,
      tags: vec![],
      status: ApplicationStatus::Active,
      archived_at: None,
      is_public: false,
      public_token: None,
      created_at: at,
      updated_at: at,
    })
  }

  fn is_duplicate_email(err: &Error) -> bool { matches!(err, Error::DuplicateEmail(_)) }

  // ── Admin reads ───────────────────────────────────────────────────────────

  async fn list_applications(&self, q: &ApplicationQuery) -> Result<ApplicationPage> {
    let predicate = query::listing(q);
    let clause = predicate.clause();
    let params = predicate.params().to_vec();
    let order = query::order_by(q);
    let limit = q.limit();
    let offset = q.offset();

    let (total, raws): (i64, Vec<RawApplication>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let total: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM applications a {clause}"),
          rusqlite::params_from_iter(params.iter()),
          |r| r.get(0),
        )?;

        let mut page_params = params;
        page_params.push(Value::Integer(sql_count(limit)));
        page_params.push(Value::Integer(sql_count(offset)));
        let n = page_params.len();
        let sql = format!(
          "SELECT {APPLICATION_COLUMNS} FROM applications a {clause} {order}
           LIMIT ?{} OFFSET ?{n}",
          n - 1
        );
        let rows = tx
          .prepare(&sql)?
          .query_map(rusqlite::params_from_iter(page_params.iter()), RawApplication::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok((total, rows))
      })
      .await?;

    Ok(ApplicationPage {
      applications: raws
        .into_iter()
        .map(RawApplication::into_application)
        .collect::<Result<_>>()?,
      total: usize::try_from(total).unwrap_or_default(),
      limit,
      offset,
    })
  }

  async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationDetail>> {
    let mut found = self
      .fetch_details("WHERE a.id = ?1".to_owned(), vec![Value::Text(encode_uuid(id))], "")
      .await?;
    Ok(found.pop())
  }

  async fn export_applications(&self, filter: &ExportFilter) -> Result<Vec<ApplicationDetail>> {
    let predicate = query::export(filter);
    let details = self
      .fetch_details(
        predicate.clause(),
        predicate.params().to_vec(),
        "ORDER BY a.created_at DESC, a.id DESC",
      )
      .await?;
    info!(count = details.len(), "exported applications");
    Ok(details)
  }

  // ── Sharing ───────────────────────────────────────────────────────────────

  async fn set_public(&self, id: Uuid, is_public: bool) -> Result<Option<Visibility>> {
    if is_public {
      let Some(token) = self.enable_sharing(id, PublicToken::generate).await? else {
        return Ok(None);
      };
      info!(%id, "public sharing enabled");
      Ok(Some(Visibility {
        application_id: id,
        is_public:      true,
        public_token:   Some(token),
        shareable_url:  None,
      }))
    } else {
      if !self.disable_sharing(id).await? {
        return Ok(None);
      }
      info!(%id, "public sharing disabled");
      Ok(Some(Visibility::private(id)))
    }
  }

  async fn get_public(&self, token: &PublicToken) -> Result<Option<ApplicationDetail>> {
    let mut found = self
      .fetch_details(
        "WHERE a.public_token = ?1 AND a.is_public = 1".to_owned(),
        vec![Value::Text(token.as_str().to_owned())],
        "",
      )
      .await?;
    Ok(found.pop())
  }

  // ── Favorites ─────────────────────────────────────────────────────────────

  async fn toggle_favorite(&self, username: &str, id: Uuid) -> Result<Option<bool>> {
    let user = username.to_owned();
    let id_str = encode_uuid(id);
    let at_str = encode_dt(now());

    let state = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = tx
          .query_row("SELECT 1 FROM applications WHERE id = ?1", [&id_str], |_| Ok(()))
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }
        let removed = tx.execute(
          "DELETE FROM favorites WHERE username = ?1 AND application_id = ?2",
          rusqlite::params![user, id_str],
        )?;
        if removed == 0 {
          tx.execute(
            "INSERT INTO favorites (username, application_id, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![user, id_str, at_str],
          )?;
        }
        tx.commit()?;
        Ok(Some(removed == 0))
      })
      .await?;

    if let Some(on) = state {
      debug!(%id, %username, favorite = on, "toggled favorite");
    }
    Ok(state)
  }

  async fn is_favorite(&self, username: &str, id: Uuid) -> Result<bool> {
    let user = username.to_owned();
    let id_str = encode_uuid(id);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM favorites WHERE username = ?1 AND application_id = ?2",
              rusqlite::params![user, id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  async fn list_favorites(&self, limit: usize, offset: usize) -> Result<FavoritePage> {
    let (total, rows): (i64, Vec<(RawApplication, String, String)>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let total: i64 = tx.query_row("SELECT COUNT(*) FROM favorites", [], |r| r.get(0))?;
        let sql = format!(
          "SELECT {APPLICATION_COLUMNS}, f.username, f.created_at
           FROM favorites f JOIN applications a ON a.id = f.application_id
           ORDER BY f.created_at DESC, f.username, a.id
           LIMIT ?1 OFFSET ?2"
        );
        let rows = tx
          .prepare(&sql)?
          .query_map(rusqlite::params![sql_count(limit), sql_count(offset)], |r| {
            Ok((RawApplication::from_row(r)?, r.get(30)?, r.get(31)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok((total, rows))
      })
      .await?;

    let favorites = rows
      .into_iter()
      .map(|(raw, favorited_by, at)| {
        Ok(FavoriteEntry {
          application: raw.into_application()?,
          favorited_by,
          favorited_at: decode_dt(&at)?,
        })
      })
      .collect::<Result<_>>()?;

    Ok(FavoritePage {
      favorites,
      total: usize::try_from(total).unwrap_or_default(),
      limit,
      offset,
    })
  }
}
