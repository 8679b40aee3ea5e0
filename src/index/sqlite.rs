//! `rusqlite`-backed Index implementation.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::VaultError;

use super::{Index, MetadataRecord, RecordFilter};

pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    /// Opens (creating if absent) the index database at `database_uri`.
    /// Accepts a bare path or a `sqlite://`/`sqlite:///` URI, matching the
    /// `general.database` configuration value.
    pub fn open(database_uri: &str) -> Result<Self, VaultError> {
        let path = database_uri
            .strip_prefix("sqlite:///")
            .or_else(|| database_uri.strip_prefix("sqlite://"))
            .unwrap_or(database_uri);

        let conn = Connection::open(path)
            .map_err(|e| VaultError::backend(format!("failed to open index database: {e}")))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS metadata_records (
                back_end_id         TEXT NOT NULL,
                entry_key           TEXT NOT NULL,
                metadata_version    INTEGER NOT NULL,
                name                TEXT NOT NULL,
                path                TEXT NOT NULL,
                size                INTEGER NOT NULL,
                mode                INTEGER NOT NULL,
                uid                 INTEGER NOT NULL,
                gid                 INTEGER NOT NULL,
                atime               INTEGER NOT NULL,
                mtime               INTEGER NOT NULL,
                ctime               INTEGER NOT NULL,
                checksum            TEXT NOT NULL,
                encryption_key      TEXT,
                encrypted_size      INTEGER NOT NULL,
                encrypted_checksum  TEXT NOT NULL,
                PRIMARY KEY (back_end_id, entry_key)
            );
            CREATE INDEX IF NOT EXISTS idx_metadata_checksum ON metadata_records (back_end_id, checksum);
            CREATE INDEX IF NOT EXISTS idx_metadata_path ON metadata_records (back_end_id, path);",
        )
        .map_err(|e| VaultError::backend(format!("failed to initialize index schema: {e}")))?;

        Ok(SqliteIndex { conn })
    }

    pub fn in_memory() -> Result<Self, VaultError> {
        Self::open(":memory:")
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MetadataRecord> {
    Ok(MetadataRecord {
        metadata_version: row.get("metadata_version")?,
        back_end_id: row.get("back_end_id")?,
        entry_key: row.get("entry_key")?,
        name: row.get("name")?,
        path: row.get("path")?,
        size: row.get("size")?,
        mode: row.get("mode")?,
        uid: row.get("uid")?,
        gid: row.get("gid")?,
        atime: row.get("atime")?,
        mtime: row.get("mtime")?,
        ctime: row.get("ctime")?,
        checksum: row.get("checksum")?,
        encryption_key: row.get("encryption_key")?,
        encrypted_size: row.get("encrypted_size")?,
        encrypted_checksum: row.get("encrypted_checksum")?,
    })
}

/// Builds a `WHERE` clause and bound parameters from the filter's equality
/// conjunction, used by every query method.
fn where_clause(filter: &RecordFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut clauses = Vec::new();
    let mut bindings: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(v) = &filter.back_end_id {
        clauses.push("back_end_id = ?".to_owned());
        bindings.push(Box::new(v.clone()));
    }
    if let Some(v) = &filter.entry_key {
        clauses.push("entry_key = ?".to_owned());
        bindings.push(Box::new(v.clone()));
    }
    if let Some(v) = &filter.checksum {
        clauses.push("checksum = ?".to_owned());
        bindings.push(Box::new(v.clone()));
    }
    if let Some(v) = &filter.path {
        clauses.push("path = ?".to_owned());
        bindings.push(Box::new(v.clone()));
    }
    if let Some(v) = &filter.path_prefix {
        clauses.push("path LIKE ? ESCAPE '\\'".to_owned());
        bindings.push(Box::new(format!("{}%", v.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_"))));
    }

    if clauses.is_empty() {
        (String::new(), bindings)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), bindings)
    }
}

impl Index for SqliteIndex {
    fn upsert(&mut self, record: &MetadataRecord) -> Result<(), VaultError> {
        self.conn
            .execute(
                "INSERT INTO metadata_records (
                    back_end_id, entry_key, metadata_version, name, path, size,
                    mode, uid, gid, atime, mtime, ctime, checksum,
                    encryption_key, encrypted_size, encrypted_checksum
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)
                ON CONFLICT (back_end_id, entry_key) DO UPDATE SET
                    metadata_version = excluded.metadata_version,
                    name = excluded.name,
                    path = excluded.path,
                    size = excluded.size,
                    mode = excluded.mode,
                    uid = excluded.uid,
                    gid = excluded.gid,
                    atime = excluded.atime,
                    mtime = excluded.mtime,
                    ctime = excluded.ctime,
                    checksum = excluded.checksum,
                    encryption_key = excluded.encryption_key,
                    encrypted_size = excluded.encrypted_size,
                    encrypted_checksum = excluded.encrypted_checksum",
                params![
                    record.back_end_id,
                    record.entry_key,
                    record.metadata_version,
                    record.name,
                    record.path,
                    record.size,
                    record.mode,
                    record.uid,
                    record.gid,
                    record.atime,
                    record.mtime,
                    record.ctime,
                    record.checksum,
                    record.encryption_key,
                    record.encrypted_size,
                    record.encrypted_checksum,
                ],
            )
            .map_err(|e| VaultError::backend(format!("index upsert failed: {e}")))?;
        Ok(())
    }

    fn delete_by(&mut self, filter: &RecordFilter) -> Result<(), VaultError> {
        let (clause, bindings) = where_clause(filter);
        let refs: Vec<&dyn rusqlite::ToSql> = bindings.iter().map(|b| b.as_ref()).collect();
        self.conn
            .execute(&format!("DELETE FROM metadata_records{clause}"), refs.as_slice())
            .map_err(|e| VaultError::backend(format!("index delete failed: {e}")))?;
        Ok(())
    }

    fn list(&self, filter: &RecordFilter) -> Result<Vec<MetadataRecord>, VaultError> {
        let (clause, bindings) = where_clause(filter);
        let refs: Vec<&dyn rusqlite::ToSql> = bindings.iter().map(|b| b.as_ref()).collect();

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM metadata_records{clause}"))
            .map_err(|e| VaultError::backend(format!("index query failed: {e}")))?;

        let rows = stmt
            .query_map(refs.as_slice(), row_to_record)
            .map_err(|e| VaultError::backend(format!("index query failed: {e}")))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| VaultError::backend(format!("index row decode failed: {e}")))
    }

    fn find_one(&self, filter: &RecordFilter) -> Result<Option<MetadataRecord>, VaultError> {
        let (clause, bindings) = where_clause(filter);
        let refs: Vec<&dyn rusqlite::ToSql> = bindings.iter().map(|b| b.as_ref()).collect();

        self.conn
            .query_row(
                &format!("SELECT * FROM metadata_records{clause} LIMIT 1"),
                refs.as_slice(),
                row_to_record,
            )
            .optional()
            .map_err(|e| VaultError::backend(format!("index query failed: {e}")))
    }

    fn drop(&mut self, filter: &RecordFilter) -> Result<(), VaultError> {
        self.delete_by(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(back_end_id: &str, entry_key: &str, path: &str, checksum: &str) -> MetadataRecord {
        MetadataRecord {
            metadata_version: 1,
            back_end_id: back_end_id.to_owned(),
            entry_key: entry_key.to_owned(),
            name: path.rsplit('/').next().unwrap_or(path).to_owned(),
            path: path.to_owned(),
            size: 4,
            mode: 0o644,
            uid: 0,
            gid: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
            checksum: checksum.to_owned(),
            encryption_key: None,
            encrypted_size: 4,
            encrypted_checksum: checksum.to_owned(),
        }
    }

    #[test]
    fn upsert_then_find_by_primary_key() {
        let mut index = SqliteIndex::in_memory().unwrap();
        let record = sample("be1", "ek1", "a/x.txt", "chk1");
        index.upsert(&record).unwrap();

        let found = index
            .find_one(&RecordFilter {
                back_end_id: Some("be1".into()),
                entry_key: Some("ek1".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found, Some(record));
    }

    #[test]
    fn upsert_collision_overwrites() {
        let mut index = SqliteIndex::in_memory().unwrap();
        index.upsert(&sample("be1", "ek1", "a/x.txt", "chk1")).unwrap();
        index.upsert(&sample("be1", "ek1", "a/x.txt", "chk2")).unwrap();

        let rows = index
            .list(&RecordFilter { back_end_id: Some("be1".into()), ..Default::default() })
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].checksum, "chk2");
    }

    #[test]
    fn path_prefix_filter_matches_only_descendants() {
        let mut index = SqliteIndex::in_memory().unwrap();
        index.upsert(&sample("be1", "ek1", "proj/a", "chk1")).unwrap();
        index.upsert(&sample("be1", "ek2", "proj/b", "chk2")).unwrap();
        index.upsert(&sample("be1", "ek3", "other/c", "chk3")).unwrap();

        let rows = index
            .list(&RecordFilter { path_prefix: Some("proj/".into()), ..Default::default() })
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn drop_with_empty_filter_truncates() {
        let mut index = SqliteIndex::in_memory().unwrap();
        index.upsert(&sample("be1", "ek1", "a/x.txt", "chk1")).unwrap();
        index.drop(&RecordFilter::default()).unwrap();
        assert!(index.list(&RecordFilter::default()).unwrap().is_empty());
    }
}
