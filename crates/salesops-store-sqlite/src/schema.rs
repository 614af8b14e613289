//! SQL schema for the local mirror.
//!
//! Column names match the hosted tables so snapshot rows load unchanged.
//! Timestamps are stored as fixed-width `YYYY-MM-DDTHH:MM:SS.mmmZ` text, which
//! keeps lexical comparison equal to chronological comparison.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS calls (
    id              INTEGER PRIMARY KEY,
    lead_id         TEXT NOT NULL,
    phone           TEXT,
    book_date       TEXT NOT NULL,
    call_date       TEXT,
    setter_id       TEXT,
    first_setter_id TEXT,
    closer_id       TEXT,
    is_reschedule   INTEGER NOT NULL DEFAULT 0,
    source_type     TEXT,
    utm_source      TEXT,
    utm_medium      TEXT,
    utm_campaign    TEXT,
    confirmed       INTEGER NOT NULL DEFAULT 0,
    picked_up       INTEGER NOT NULL DEFAULT 0,
    showed_up       INTEGER NOT NULL DEFAULT 0,
    purchased       INTEGER NOT NULL DEFAULT 0,
    cancelled       INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS outcome_log (
    id            INTEGER PRIMARY KEY,
    outcome       TEXT NOT NULL,
    clawback      REAL,             -- percent refunded; NULL means 100
    purchase_date TEXT,
    call_id       INTEGER
);

CREATE TABLE IF NOT EXISTS setters (
    id     TEXT PRIMARY KEY,
    name   TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS closers (
    id     TEXT PRIMARY KEY,
    name   TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS calls_book_date_idx   ON calls(book_date);
CREATE INDEX IF NOT EXISTS calls_call_date_idx   ON calls(call_date);
CREATE INDEX IF NOT EXISTS calls_lead_idx        ON calls(lead_id);
CREATE INDEX IF NOT EXISTS outcome_purchased_idx ON outcome_log(purchase_date);
CREATE INDEX IF NOT EXISTS outcome_call_idx      ON outcome_log(call_id);

PRAGMA user_version = 1;
";
