//! Table definitions, applied idempotently at startup.

pub(crate) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS clubs (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_clubs_name ON clubs (name)",
    "CREATE TABLE IF NOT EXISTS threads (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        club_id         INTEGER NOT NULL REFERENCES clubs(id),
        title           TEXT NOT NULL,
        description     TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        delete_password TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_threads_club_created ON threads (club_id, created_at)",
    "CREATE TABLE IF NOT EXISTS responses (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        thread_id       INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
        text            TEXT NOT NULL,
        name            TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        anon_id         TEXT NOT NULL,
        ip_address      TEXT NOT NULL,
        delete_password TEXT,
        image_filename  TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_responses_thread ON responses (thread_id)",
];
