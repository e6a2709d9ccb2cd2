//! Persistence sink contract.
//!
//! The pipeline only appends rows; indexing, search, and publication are the
//! sink's business. Sinks operate inside one all-or-nothing ingestion run.

use std::convert::Infallible;

use serde::Serialize;
use serde_json::Value;

use crate::groups::GroupId;
use crate::record::HashId;

/// One denormalized object row, ready for the store.
///
/// `data`, `drop_data`, and `equip_data` are pre-serialized JSON so the sink
/// never needs to understand the document model.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectRow {
    pub map_type: String,
    pub map_name: String,
    pub map_static: bool,
    pub gen_group: GroupId,
    pub hash_id: HashId,
    pub unit_config_name: String,
    pub ui_name: String,
    /// The raw placement record, serialized.
    pub data: String,
    pub one_hit_mode: bool,
    pub last_boss_mode: bool,
    pub hard_mode: bool,
    pub disable_rankup_for_hard_mode: bool,
    pub scale: Option<i64>,
    pub sharp_weapon_judge_type: i64,
    /// Serialized drop descriptor (`[1, actor]` / `[2, table]`).
    pub drop_data: Option<String>,
    /// Serialized equipment list.
    pub equip_data: Option<String>,
    pub ui_drop: Option<String>,
    pub ui_equip: Option<String>,
    pub messageid: Option<String>,
    pub region: String,
    pub field_area: Option<u32>,
    pub spawns_with_lotm: bool,
    pub korok_id: Option<String>,
    pub korok_type: Option<String>,
}

/// One auxiliary drop-table row.
#[derive(Debug, Clone, Serialize)]
pub struct DropTableRow {
    pub actor_name: String,
    pub name: String,
    pub data: Value,
}

/// Append-only row sink.
///
/// `append_object` returns the generated object id, which is globally unique
/// across the run. Implementations batch writes in a single transaction and
/// must not publish anything until the whole run succeeds.
pub trait RowSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn append_object(&mut self, row: &ObjectRow) -> Result<i64, Self::Error>;

    fn append_drop_table(&mut self, row: &DropTableRow) -> Result<(), Self::Error>;
}

/// Vec-backed sink, the reference implementation used by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub objects: Vec<ObjectRow>,
    pub drop_tables: Vec<DropTableRow>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RowSink for MemorySink {
    type Error = Infallible;

    fn append_object(&mut self, row: &ObjectRow) -> Result<i64, Self::Error> {
        self.objects.push(row.clone());
        Ok(self.objects.len() as i64)
    }

    fn append_drop_table(&mut self, row: &DropTableRow) -> Result<(), Self::Error> {
        self.drop_tables.push(row.clone());
        Ok(())
    }
}
