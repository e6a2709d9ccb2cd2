//! SQLite-backed row sink.
//!
//! Writes go to `<target>.tmp` inside one transaction; `finish` builds the
//! indexes and the full-text table, commits, and atomically renames the
//! database into place. A reader never observes a partially ingested
//! dataset: an aborted run leaves the previously published file untouched
//! and removes the temporary one.

use std::fs;
use std::path::{Path, PathBuf};

use placemap_core::{DropTableRow, ObjectRow, RowSink};
use rusqlite::{Connection, named_params};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteSinkError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

const SCHEMA: &str = r#"
CREATE TABLE objs (
  objid INTEGER PRIMARY KEY,
  map_type TEXT NOT NULL,
  map_name TEXT NOT NULL,
  map_static BOOL,
  gen_group INTEGER,
  hash_id INTEGER,
  unit_config_name TEXT NOT NULL,
  ui_name TEXT NOT NULL,
  data JSON NOT NULL,
  one_hit_mode BOOL DEFAULT 0,
  last_boss_mode BOOL DEFAULT 0,
  hard_mode BOOL DEFAULT 0,
  disable_rankup_for_hard_mode BOOL DEFAULT 0,
  scale INTEGER DEFAULT 0,
  sharp_weapon_judge_type INTEGER DEFAULT 0,
  "drop" JSON,
  equip JSON,
  ui_drop TEXT,
  ui_equip TEXT,
  messageid TEXT,
  region TEXT NOT NULL,
  field_area INTEGER,
  spawns_with_lotm BOOL,
  korok_id TEXT,
  korok_type TEXT
);

CREATE TABLE drop_table (
  actor_name TEXT NOT NULL,
  name TEXT NOT NULL,
  data JSON
);
"#;

const INSERT_OBJ: &str = r#"
INSERT INTO objs
  (map_type, map_name, map_static, gen_group, hash_id, unit_config_name,
   ui_name, data, one_hit_mode, last_boss_mode, hard_mode,
   disable_rankup_for_hard_mode, scale, sharp_weapon_judge_type, "drop",
   equip, ui_drop, ui_equip, messageid, region, field_area, spawns_with_lotm,
   korok_id, korok_type)
VALUES
  (:map_type, :map_name, :map_static, :gen_group, :hash_id,
   :unit_config_name, :ui_name, :data, :one_hit_mode, :last_boss_mode,
   :hard_mode, :disable_rankup_for_hard_mode, :scale,
   :sharp_weapon_judge_type, :drop, :equip, :ui_drop, :ui_equip, :messageid,
   :region, :field_area, :spawns_with_lotm, :korok_id, :korok_type)
"#;

const INDEXES: &str = r#"
CREATE INDEX objs_map ON objs (map_type, map_name);
CREATE INDEX objs_map_type ON objs (map_type);
CREATE INDEX objs_hash_id ON objs (hash_id);
CREATE INDEX objs_gen_group ON objs (gen_group);
CREATE INDEX objs_unit_config_name ON objs (unit_config_name);
"#;

const FTS: &str = r#"
CREATE VIRTUAL TABLE objs_fts USING fts5(content="", map, actor, name, data,
  "drop", equip, onehit, lastboss, hard, no_rankup, scale, bonus, static,
  region, fieldarea, lotm);

INSERT INTO objs_fts(rowid, map, actor, name, data, "drop", equip, onehit,
  lastboss, hard, no_rankup, scale, bonus, static, region, fieldarea, lotm)
SELECT objid, map_type||'/'||map_name, unit_config_name, ui_name, data,
  ui_drop, ui_equip, one_hit_mode, last_boss_mode, hard_mode,
  disable_rankup_for_hard_mode, scale, sharp_weapon_judge_type, map_static,
  region, field_area, spawns_with_lotm FROM objs;
"#;

/// A sink writing one ingestion run into a SQLite database.
pub struct SqliteSink {
    conn: Option<Connection>,
    target: PathBuf,
    tmp: PathBuf,
}

impl SqliteSink {
    /// Creates the temporary database, applies the schema, and opens the
    /// run's transaction. The target path is only touched by `finish`.
    pub fn create(target: impl AsRef<Path>) -> Result<Self, SqliteSinkError> {
        let target = target.as_ref().to_path_buf();
        let mut tmp = target.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if tmp.exists() {
            fs::remove_file(&tmp)?;
        }

        let conn = Connection::open(&tmp)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("BEGIN")?;
        Ok(SqliteSink {
            conn: Some(conn),
            target,
            tmp,
        })
    }

    fn conn(&self) -> &Connection {
        // Only `finish` takes the connection, and it consumes self.
        self.conn.as_ref().expect("sink already finished")
    }

    /// Builds indexes and the full-text table, commits the run, and
    /// atomically publishes the database at the target path.
    pub fn finish(mut self) -> Result<(), SqliteSinkError> {
        let conn = self.conn.take().expect("sink already finished");
        conn.execute_batch(INDEXES)?;
        conn.execute_batch(FTS)?;
        conn.execute_batch("COMMIT")?;
        conn.close().map_err(|(_, err)| err)?;
        fs::rename(&self.tmp, &self.target)?;
        Ok(())
    }
}

impl Drop for SqliteSink {
    fn drop(&mut self) {
        // An unfinished run leaves nothing behind.
        if let Some(conn) = self.conn.take() {
            let _ = conn.close();
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

impl RowSink for SqliteSink {
    type Error = SqliteSinkError;

    fn append_object(&mut self, row: &ObjectRow) -> Result<i64, Self::Error> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(INSERT_OBJ)?;
        stmt.execute(named_params! {
            ":map_type": row.map_type,
            ":map_name": row.map_name,
            ":map_static": row.map_static,
            ":gen_group": row.gen_group.0,
            ":hash_id": row.hash_id.0 as i64,
            ":unit_config_name": row.unit_config_name,
            ":ui_name": row.ui_name,
            ":data": row.data,
            ":one_hit_mode": row.one_hit_mode,
            ":last_boss_mode": row.last_boss_mode,
            ":hard_mode": row.hard_mode,
            ":disable_rankup_for_hard_mode": row.disable_rankup_for_hard_mode,
            ":scale": row.scale,
            ":sharp_weapon_judge_type": row.sharp_weapon_judge_type,
            ":drop": row.drop_data,
            ":equip": row.equip_data,
            ":ui_drop": row.ui_drop,
            ":ui_equip": row.ui_equip,
            ":messageid": row.messageid,
            ":region": row.region,
            ":field_area": row.field_area,
            ":spawns_with_lotm": row.spawns_with_lotm,
            ":korok_id": row.korok_id,
            ":korok_type": row.korok_type,
        })?;
        Ok(conn.last_insert_rowid())
    }

    fn append_drop_table(&mut self, row: &DropTableRow) -> Result<(), Self::Error> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare_cached("INSERT INTO drop_table (actor_name, name, data) VALUES (?1, ?2, ?3)")?;
        stmt.execute((&row.actor_name, &row.name, row.data.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placemap_core::{GroupId, HashId};
    use tempfile::TempDir;

    fn row(hash_id: u64, name: &str, ui_name: &str) -> ObjectRow {
        ObjectRow {
            map_type: "MainField".into(),
            map_name: "A-1".into(),
            map_static: true,
            gen_group: GroupId(3),
            hash_id: HashId(hash_id),
            unit_config_name: name.into(),
            ui_name: ui_name.into(),
            data: format!(r#"{{"UnitConfigName":"{name}"}}"#),
            one_hit_mode: false,
            last_boss_mode: true,
            hard_mode: false,
            disable_rankup_for_hard_mode: false,
            scale: Some(2),
            sharp_weapon_judge_type: 0,
            drop_data: Some(r#"[2,"Enemy_Bokoblin"]"#.into()),
            equip_data: None,
            ui_drop: Some("Table:Enemy_Bokoblin".into()),
            ui_equip: None,
            messageid: None,
            region: "Central".into(),
            field_area: Some(12),
            spawns_with_lotm: false,
            korok_id: None,
            korok_type: None,
        }
    }

    #[test]
    fn publishes_atomically_on_finish() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("map.db");

        let mut sink = SqliteSink::create(&target).unwrap();
        sink.append_object(&row(1, "Enemy_Bokoblin", "Bokoblin")).unwrap();
        assert!(!target.exists());

        sink.finish().unwrap();
        assert!(target.exists());
        assert!(!dir.path().join("map.db.tmp").exists());
    }

    #[test]
    fn aborted_run_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("map.db");

        let mut sink = SqliteSink::create(&target).unwrap();
        sink.append_object(&row(1, "Enemy_Bokoblin", "Bokoblin")).unwrap();
        drop(sink);

        assert!(!target.exists());
        assert!(!dir.path().join("map.db.tmp").exists());
    }

    #[test]
    fn rows_are_queryable_by_map_and_hash_id() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("map.db");

        let mut sink = SqliteSink::create(&target).unwrap();
        let first = sink.append_object(&row(101, "Enemy_Bokoblin", "Bokoblin")).unwrap();
        let second = sink.append_object(&row(102, "Item_Apple", "Apple")).unwrap();
        assert_ne!(first, second);
        sink.finish().unwrap();

        let conn = Connection::open(&target).unwrap();
        let (objid, name): (i64, String) = conn
            .query_row(
                "SELECT objid, unit_config_name FROM objs
                 WHERE map_type = ?1 AND map_name = ?2 AND hash_id = ?3",
                ("MainField", "A-1", 102),
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(objid, second);
        assert_eq!(name, "Item_Apple");
    }

    #[test]
    fn display_names_are_full_text_searchable() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("map.db");

        let mut sink = SqliteSink::create(&target).unwrap();
        sink.append_object(&row(1, "Enemy_Bokoblin", "Bokoblin")).unwrap();
        sink.append_object(&row(2, "Item_Apple", "Apple")).unwrap();
        sink.finish().unwrap();

        let conn = Connection::open(&target).unwrap();
        let rowid: i64 = conn
            .query_row(
                "SELECT rowid FROM objs_fts WHERE objs_fts MATCH 'name:Apple'",
                (),
                |r| r.get(0),
            )
            .unwrap();
        let name: String = conn
            .query_row("SELECT unit_config_name FROM objs WHERE objid = ?1", [rowid], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "Item_Apple");
    }

    #[test]
    fn drop_table_rows_round_trip() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("map.db");

        let mut sink = SqliteSink::create(&target).unwrap();
        sink.append_drop_table(&DropTableRow {
            actor_name: "Enemy_Keese".into(),
            name: "Normal".into(),
            data: serde_json::json!({"items": {"Item_Enemy_19": 100.0}, "repeat_num": [1, 1]}),
        })
        .unwrap();
        sink.finish().unwrap();

        let conn = Connection::open(&target).unwrap();
        let (actor, data): (String, String) = conn
            .query_row(
                "SELECT actor_name, data FROM drop_table WHERE name = 'Normal'",
                (),
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(actor, "Enemy_Keese");
        let data: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(data["repeat_num"], serde_json::json!([1, 1]));
    }
}
