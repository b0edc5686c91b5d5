//! [`SqliteStore`]: the SQLite implementation of [`DiscoveryRequestStore`]
//! and [`LinkStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use hip_core::{
  link::{LinkRequest, LinkedAccount},
  store::{DiscoveryRecord, DiscoveryRequestStore, LinkStore},
};

use crate::{
  Result,
  encode::{RawLinkRequest, RawLinkedContext, encode_care_contexts, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Discovery and link persistence backed by a single SQLite file.
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

  /// Open an in-memory store, useful for testing.
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
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DiscoveryRequestStore impl ──────────────────────────────────────────────

impl DiscoveryRequestStore for SqliteStore {
  type Error = crate::Error;

  async fn exists(&self, transaction_id: &str) -> Result<bool> {
    let transaction_id = transaction_id.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM discovery_requests WHERE transaction_id = ?1",
            rusqlite::params![transaction_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;

    Ok(found)
  }

  async fn exists_for(
    &self,
    transaction_id: &str,
    patient_id: &str,
    patient_reference_number: &str,
  ) -> Result<bool> {
    let transaction_id = transaction_id.to_owned();
    let patient_id = patient_id.to_owned();
    let reference = patient_reference_number.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM discovery_requests
             WHERE transaction_id = ?1
               AND patient_id = ?2
               AND patient_reference_number = ?3",
            rusqlite::params![transaction_id, patient_id, reference],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;

    Ok(found)
  }

  async fn add(&self, record: DiscoveryRecord) -> Result<bool> {
    let at_str = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT OR IGNORE INTO discovery_requests
             (transaction_id, patient_id, patient_reference_number, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            record.transaction_id,
            record.patient_id,
            record.patient_reference_number,
            at_str,
          ],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if !inserted {
      tracing::debug!("discovery request already recorded; insert ignored");
    }
    Ok(inserted)
  }
}

// ─── LinkStore impl ──────────────────────────────────────────────────────────

impl LinkStore for SqliteStore {
  type Error = crate::Error;

  async fn linked_care_contexts(&self, patient_id: &str) -> Result<Vec<LinkedAccount>> {
    let patient_id = patient_id.to_owned();

    let raws: Vec<RawLinkedContext> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT patient_id, patient_reference_number, care_context
           FROM linked_accounts
           WHERE patient_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![patient_id], |row| {
            Ok(RawLinkedContext {
              patient_id:               row.get(0)?,
              patient_reference_number: row.get(1)?,
              care_context:             row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // Group rows into accounts, ordered by each account's first link.
    let mut accounts: Vec<LinkedAccount> = Vec::new();
    for raw in raws {
      match accounts
        .iter_mut()
        .find(|a| a.patient_reference_number == raw.patient_reference_number)
      {
        Some(account) => {
          account.care_contexts.insert(raw.care_context);
        }
        None => accounts.push(LinkedAccount {
          patient_id:               raw.patient_id,
          patient_reference_number: raw.patient_reference_number,
          care_contexts:            [raw.care_context].into(),
        }),
      }
    }

    Ok(accounts)
  }

  async fn save_linked_account(&self, account: LinkedAccount) -> Result<()> {
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO linked_accounts
               (patient_id, patient_reference_number, care_context, linked_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for care_context in &account.care_contexts {
            stmt.execute(rusqlite::params![
              account.patient_id,
              account.patient_reference_number,
              care_context,
              at_str,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn save_link_request(&self, request: LinkRequest) -> Result<()> {
    let care_contexts = encode_care_contexts(&request.care_contexts)?;
    let expires_at = encode_dt(request.expires_at);
    let created_at = encode_dt(request.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO link_requests (
             link_reference_number, transaction_id, patient_id,
             patient_reference_number, care_contexts, expires_at, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            request.link_reference_number,
            request.transaction_id,
            request.patient_id,
            request.patient_reference_number,
            care_contexts,
            expires_at,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn link_request(&self, link_reference_number: &str) -> Result<Option<LinkRequest>> {
    let reference = link_reference_number.to_owned();

    let raw: Option<RawLinkRequest> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT link_reference_number, transaction_id, patient_id,
                    patient_reference_number, care_contexts, expires_at, created_at
             FROM link_requests
             WHERE link_reference_number = ?1",
            rusqlite::params![reference],
            |row| {
              Ok(RawLinkRequest {
                link_reference_number:    row.get(0)?,
                transaction_id:           row.get(1)?,
                patient_id:               row.get(2)?,
                patient_reference_number: row.get(3)?,
                care_contexts:            row.get(4)?,
                expires_at:               row.get(5)?,
                created_at:               row.get(6)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawLinkRequest::into_link_request).transpose()
  }
}
