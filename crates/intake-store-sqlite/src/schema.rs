//! SQL schema for the intake SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS applications (
    id                             TEXT PRIMARY KEY,
    first_name                     TEXT NOT NULL,
    last_name                      TEXT NOT NULL,
    email                          TEXT NOT NULL UNIQUE,
    phone_number                   TEXT NOT NULL,
    birth_year                     INTEGER,
    country_of_origin              TEXT,
    country_of_residence           TEXT NOT NULL,
    city                           TEXT,
    time_zone                      TEXT NOT NULL,
    highest_formal_education_level TEXT NOT NULL,
    current_job_status             TEXT NOT NULL,
    category                       TEXT NOT NULL,
    portfolio_links                TEXT NOT NULL DEFAULT '[]',   -- JSON array
    portfolio_file_url             TEXT,
    availability                   TEXT NOT NULL,   -- 'full_time' | 'part_time' | 'freelance'
    available_in                   INTEGER,         -- days; full-time only
    hours_per_week                 INTEGER,
    available_from                 TEXT,            -- YYYY-MM-DD
    expected_salary_cents          INTEGER NOT NULL,
    resume_url                     TEXT,
    video_url                      TEXT,
    notes                          TEXT,
    tags                           TEXT NOT NULL DEFAULT '[]',   -- JSON array
    status                         TEXT NOT NULL DEFAULT 'active',
    archived_at                    TEXT,
    is_public                      INTEGER NOT NULL DEFAULT 0,
    public_token                   TEXT UNIQUE,
    created_at                     TEXT NOT NULL,   -- RFC 3339, fixed width
    updated_at                     TEXT NOT NULL,
    CHECK ((is_public = 1) = (public_token IS NOT NULL))
);

CREATE TABLE IF NOT EXISTS languages (
    id             INTEGER PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    sort_order     INTEGER NOT NULL,
    name           TEXT NOT NULL,
    proficiency    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS socials (
    id             INTEGER PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    sort_order     INTEGER NOT NULL,
    platform       TEXT NOT NULL,
    url            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS skills (
    id               INTEGER PRIMARY KEY,
    application_id   TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    sort_order       INTEGER NOT NULL,
    name             TEXT NOT NULL,
    tags             TEXT NOT NULL DEFAULT '[]',
    level            TEXT NOT NULL,
    total_experience INTEGER,
    start_year       INTEGER,
    institution      TEXT,
    self_taught      INTEGER
);

CREATE TABLE IF NOT EXISTS experiences (
    id             INTEGER PRIMARY KEY,
    application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    sort_order     INTEGER NOT NULL,
    company        TEXT,
    position       TEXT,
    description    TEXT,
    start_year     INTEGER,
    end_year       INTEGER,
    is_current     INTEGER NOT NULL DEFAULT 0,
    links          TEXT NOT NULL DEFAULT '[]',
    achievements   TEXT NOT NULL DEFAULT '[]',
    CHECK (is_current = 0 OR end_year IS NULL)
);

CREATE TABLE IF NOT EXISTS experience_categories (
    experience_id INTEGER NOT NULL REFERENCES experiences(id) ON DELETE CASCADE,
    category_id   TEXT NOT NULL,
    PRIMARY KEY (experience_id, category_id)
);

-- Staff bookmarks; toggled, never edited.
CREATE TABLE IF NOT EXISTS favorites (
    username       TEXT NOT NULL,
    application_id TEXT NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    created_at     TEXT NOT NULL,
    PRIMARY KEY (username, application_id)
);

CREATE INDEX IF NOT EXISTS applications_created_idx  ON applications(created_at);
CREATE INDEX IF NOT EXISTS applications_category_idx ON applications(category);
CREATE INDEX IF NOT EXISTS languages_app_idx         ON languages(application_id);
CREATE INDEX IF NOT EXISTS socials_app_idx           ON socials(application_id);
CREATE INDEX IF NOT EXISTS skills_app_idx            ON skills(application_id);
CREATE INDEX IF NOT EXISTS experiences_app_idx       ON experiences(application_id);
CREATE INDEX IF NOT EXISTS favorites_created_idx     ON favorites(created_at);

PRAGMA user_version = 1;
";
