//! SQL schema for the HIP SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per processed discovery transaction. The primary key is what
-- makes a transaction id processable at most once. A failed attempt has no
-- patient reference number.
CREATE TABLE IF NOT EXISTS discovery_requests (
    transaction_id           TEXT PRIMARY KEY,
    patient_id               TEXT NOT NULL,
    patient_reference_number TEXT,
    created_at               TEXT NOT NULL   -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS link_requests (
    link_reference_number    TEXT PRIMARY KEY,
    transaction_id           TEXT NOT NULL,
    patient_id               TEXT NOT NULL,
    patient_reference_number TEXT NOT NULL,
    care_contexts            TEXT NOT NULL,  -- JSON array of reference numbers
    expires_at               TEXT NOT NULL,
    created_at               TEXT NOT NULL
);

-- One row per linked care context.
CREATE TABLE IF NOT EXISTS linked_accounts (
    patient_id               TEXT NOT NULL,
    patient_reference_number TEXT NOT NULL,
    care_context             TEXT NOT NULL,
    linked_at                TEXT NOT NULL,
    UNIQUE (patient_id, patient_reference_number, care_context)
);

CREATE INDEX IF NOT EXISTS linked_accounts_patient_idx ON linked_accounts(patient_id);

PRAGMA user_version = 1;
";
