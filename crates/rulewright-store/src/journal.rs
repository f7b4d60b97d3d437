//! SQLite journal of exemplars
//!
//! Exemplars are only ever appended. On startup the journal is replayed in
//! append order to rebuild the in-memory index.

use crate::StoreError;
use rulewright_domain::{Exemplar, ExemplarId};
use rusqlite::{params, Connection};
use std::path::Path;

/// Append-only SQLite storage for exemplars
///
/// SQLite connections are not `Sync`; the owning index serializes access.
pub struct ExemplarJournal {
    conn: Connection,
}

impl ExemplarJournal {
    /// Open (or create) a journal at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    /// Append one exemplar
    pub fn append(&self, exemplar: &Exemplar) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO exemplars (id, rule_text, compiled_document, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                exemplar_id_to_bytes(exemplar.id),
                &exemplar.rule_text,
                &exemplar.compiled_document,
                exemplar.created_at as i64,
            ],
        )?;
        Ok(())
    }

    /// Load every exemplar in append order
    pub fn load_all(&self) -> Result<Vec<Exemplar>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, rule_text, compiled_document, created_at FROM exemplars ORDER BY seq",
        )?;

        let rows = stmt.query_map([], |row| {
            let id_bytes: Vec<u8> = row.get(0)?;
            let id = bytes_to_exemplar_id(&id_bytes).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(e))
            })?;
            Ok(Exemplar {
                id,
                rule_text: row.get(1)?,
                compiled_document: row.get(2)?,
                created_at: row.get::<_, i64>(3)? as u64,
            })
        })?;

        let mut exemplars = Vec::new();
        for row in rows {
            exemplars.push(row?);
        }
        Ok(exemplars)
    }

    /// Number of stored exemplars
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM exemplars", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn exemplar_id_to_bytes(id: ExemplarId) -> Vec<u8> {
    id.value().to_be_bytes().to_vec()
}

fn bytes_to_exemplar_id(bytes: &[u8]) -> Result<ExemplarId, StoreError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!(
            "Expected 16 bytes for ExemplarId, got {}",
            bytes.len()
        ))
    })?;
    Ok(ExemplarId::from_value(u128::from_be_bytes(arr)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_load_in_order() {
        let journal = ExemplarJournal::open(":memory:").unwrap();
        let first = Exemplar::new("rule one", "{\"tableName\":\"one\"}");
        let second = Exemplar::new("rule two", "{\"tableName\":\"two\"}");
        journal.append(&first).unwrap();
        journal.append(&second).unwrap();

        let loaded = journal.load_all().unwrap();
        assert_eq!(loaded, vec![first, second]);
        assert_eq!(journal.count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let journal = ExemplarJournal::open(":memory:").unwrap();
        let exemplar = Exemplar::new("rule", "{}");
        journal.append(&exemplar).unwrap();
        assert!(matches!(journal.append(&exemplar), Err(StoreError::Database(_))));
    }

    #[test]
    fn test_id_bytes_roundtrip() {
        let id = ExemplarId::new();
        assert_eq!(bytes_to_exemplar_id(&exemplar_id_to_bytes(id)).unwrap(), id);
        assert!(bytes_to_exemplar_id(&[1, 2, 3]).is_err());
    }
}
