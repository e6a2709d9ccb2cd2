//! Attribute derivation and row emission.
//!
//! One `Ingestor` drives a whole ingestion run: documents are processed one
//! at a time (build, resolve, derive, append), sharing the group counter and
//! the sink across documents. Structural faults abort the run; lookup
//! misses fall back locally.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::beco::{AREA_NONE, Beco};
use crate::classify::{ActorDb, LastBossRules, ScaleRules};
use crate::drops::{ActorTags, DropTables, drop_descriptor, equipment, ui_equipment};
use crate::groups::{GroupCounter, GroupId, resolve_groups};
use crate::map::{BuildError, PlacementMap, PlacementNode};
use crate::names::NameTables;
use crate::record::{HashId, PlacementRecord};
use crate::sink::{DropTableRow, ObjectRow, RowSink};

/// Area tables keyed by map type.
///
/// Distinct terrain layers ship distinct tables; a map type with no
/// registered table simply gets no spatial tags.
#[derive(Debug, Default)]
pub struct AreaTables {
    field: HashMap<String, Beco>,
    tower: HashMap<String, Beco>,
}

impl AreaTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the field-area table for a map type.
    pub fn register_field(&mut self, map_type: impl Into<String>, beco: Beco) {
        self.field.insert(map_type.into(), beco);
    }

    /// Registers the tower/region table for a map type.
    pub fn register_tower(&mut self, map_type: impl Into<String>, beco: Beco) {
        self.tower.insert(map_type.into(), beco);
    }

    pub fn field_for(&self, map_type: &str) -> Option<&Beco> {
        self.field.get(map_type)
    }

    pub fn tower_for(&self, map_type: &str) -> Option<&Beco> {
        self.tower.get(map_type)
    }
}

/// Optional quest/korok tagging, keyed by placement hash id.
#[derive(Debug, Clone, Default)]
pub struct KorokTable {
    by_hash: HashMap<HashId, KorokEntry>,
}

#[derive(Debug, Clone)]
pub struct KorokEntry {
    pub id: String,
    pub kind: String,
}

impl KorokTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash_id: HashId, entry: KorokEntry) {
        self.by_hash.insert(hash_id, entry);
    }

    pub fn get(&self, hash_id: HashId) -> Option<&KorokEntry> {
        self.by_hash.get(&hash_id)
    }
}

/// Run-wide configuration: classification rules and the domain constants
/// they depend on. Everything here is data, not logic.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub last_boss: LastBossRules,
    pub scale: ScaleRules,
    /// The synthetic type whose display name comes from its message id.
    pub location_marker_actor: String,
    /// Region names indexed by tower area number.
    pub region_names: Vec<String>,
    /// Field area and actor tag gating `spawns_with_lotm`.
    pub lotm_area: u32,
    pub lotm_tag: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            last_boss: LastBossRules::default(),
            scale: ScaleRules::default(),
            location_marker_actor: "LocationTag".into(),
            region_names: [
                "Hebra",
                "Tabantha",
                "Gerudo",
                "Wasteland",
                "Woodland",
                "Central",
                "Great Plateau",
                "Dueling Peaks",
                "Lake",
                "Eldin",
                "Akkala",
                "Lanayru",
                "Hateno",
                "Faron",
                "Ridgeland",
            ]
            .map(String::from)
            .to_vec(),
            lotm_area: 64,
            lotm_tag: "UnderGodForest".into(),
        }
    }
}

/// Auxiliary lookup data shared by a run. All of it is optional in the
/// sense that misses degrade to documented fallbacks.
#[derive(Debug, Default)]
pub struct Lookups {
    pub names: NameTables,
    pub actors: ActorDb,
    pub drop_tables: DropTables,
    pub actor_tags: ActorTags,
    pub koroks: KorokTable,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError<E: std::error::Error + Send + Sync + 'static> {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("serializing row data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Sink(#[source] E),
}

/// Drives one ingestion run.
pub struct Ingestor {
    config: PipelineConfig,
    areas: AreaTables,
    lookups: Lookups,
    counter: GroupCounter,
}

impl Ingestor {
    pub fn new(config: PipelineConfig, areas: AreaTables, lookups: Lookups) -> Self {
        Ingestor {
            config,
            areas,
            lookups,
            counter: GroupCounter::new(),
        }
    }

    /// Group ids already handed out, for diagnostics.
    pub fn groups_allocated(&self) -> u32 {
        self.counter.peek().0
    }

    /// Ingests one map document: builds the graph, resolves generation
    /// groups, derives every row, and appends them to the sink. Returns the
    /// number of rows written.
    pub fn process_document<S: RowSink>(
        &mut self,
        map_type: &str,
        map_name: &str,
        is_static: bool,
        records: Vec<PlacementRecord>,
        sink: &mut S,
    ) -> Result<usize, IngestError<S::Error>> {
        let mut map = PlacementMap::build(map_type, map_name, is_static, records)?;
        resolve_groups(&mut map, &mut self.counter);

        let spawns_allowed = self.last_boss_veto(&map);

        for node in map.nodes() {
            let row = self.derive_row(&map, node, &spawns_allowed)?;
            sink.append_object(&row).map_err(IngestError::Sink)?;
        }

        info!(
            map = %map.label(),
            nodes = map.len(),
            groups = self.counter.peek().0,
            "ingested document"
        );
        Ok(map.len())
    }

    /// Appends the auxiliary drop-table rows. Called once per run.
    pub fn write_drop_tables<S: RowSink>(&self, sink: &mut S) -> Result<usize, IngestError<S::Error>> {
        let mut written = 0;
        for (actor, table) in self.lookups.drop_tables.iter() {
            let row = DropTableRow {
                actor_name: actor.to_string(),
                name: table.name.clone(),
                data: serde_json::to_value(table)?,
            };
            sink.append_drop_table(&row).map_err(IngestError::Sink)?;
            written += 1;
        }
        Ok(written)
    }

    /// One allow flag per generation group: a component spawns in last-boss
    /// mode only if every member passes the allow test, so one failing
    /// member disqualifies the whole group.
    fn last_boss_veto(&self, map: &PlacementMap) -> HashMap<GroupId, bool> {
        let mut allowed: HashMap<GroupId, bool> = HashMap::new();
        for node in map.nodes() {
            let Some(group) = node.group else { continue };
            let ok = self.config.last_boss.allows(node.name(), &self.lookups.actors);
            allowed.entry(group).and_modify(|a| *a &= ok).or_insert(ok);
        }
        allowed
    }

    fn derive_row(
        &self,
        map: &PlacementMap,
        node: &PlacementNode,
        spawns_allowed: &HashMap<GroupId, bool>,
    ) -> Result<ObjectRow, serde_json::Error> {
        let record = &node.record;
        let params = record.params();
        let name = node.name();
        let names = &self.lookups.names;

        let ui_name = if name == self.config.location_marker_actor {
            let message_id = params.and_then(|p| p.str_of("MessageID")).unwrap_or_default();
            names.location_display(message_id)
        } else {
            names.display(name)
        };

        let drop = drop_descriptor(params, name, &self.lookups.drop_tables);
        let equip = params.map(equipment);

        let scale = if self.config.scale.applies(name) {
            Some(params.and_then(|p| p.int_of("LevelSensorMode")).unwrap_or(0))
        } else {
            None
        };

        let (x, z) = (record.translate.x(), record.translate.z());
        let field_area = self
            .areas
            .field_for(&map.map_type)
            .map(|beco| beco.area_number(x, z))
            .filter(|&area| area != AREA_NONE);

        let region = match self.areas.tower_for(&map.map_type) {
            Some(tower) => self.region_name(tower, x, z),
            None => String::new(),
        };

        let spawns_with_lotm = field_area == Some(self.config.lotm_area)
            && self.lookups.actor_tags.has(name, &self.config.lotm_tag);

        let korok = self.lookups.koroks.get(record.hash_id);

        // Group resolution ran before any row derivation; every node holds
        // an id by now.
        let gen_group = node.group.unwrap_or_else(|| {
            debug!(map = %map.label(), hash_id = %record.hash_id, "node missing group id");
            GroupId(u32::MAX)
        });
        let last_boss_mode = spawns_allowed.get(&gen_group).copied().unwrap_or(true);

        Ok(ObjectRow {
            map_type: map.map_type.clone(),
            map_name: map.map_name.clone(),
            map_static: map.is_static,
            gen_group,
            hash_id: record.hash_id,
            unit_config_name: name.to_string(),
            ui_name,
            data: serde_json::to_string(record)?,
            one_hit_mode: params.is_some_and(|p| p.flag("IsIchigekiActor")),
            last_boss_mode,
            hard_mode: params.is_some_and(|p| p.flag("IsHardModeActor")),
            disable_rankup_for_hard_mode: params.is_some_and(|p| p.flag("DisableRankUpForHardMode")),
            scale,
            sharp_weapon_judge_type: params
                .and_then(|p| p.int_of("SharpWeaponJudgeType"))
                .unwrap_or(0),
            drop_data: drop.as_ref().map(serde_json::to_string).transpose()?,
            equip_data: equip.as_ref().map(serde_json::to_string).transpose()?,
            ui_drop: drop.as_ref().map(|d| d.ui_text(names)),
            ui_equip: equip.as_deref().map(|items| ui_equipment(items, names)),
            messageid: params
                .and_then(|p| p.str_of("MessageID"))
                .map(str::to_string),
            region,
            field_area,
            spawns_with_lotm,
            korok_id: korok.map(|k| k.id.clone()),
            korok_type: korok.map(|k| k.kind.clone()),
        })
    }

    fn region_name(&self, tower: &Beco, x: f32, z: f32) -> String {
        let area = tower.area_number(x, z);
        if area == AREA_NONE {
            return String::new();
        }
        match self.config.region_names.get(area as usize) {
            Some(region) => region.clone(),
            None => {
                warn!(area, "tower area has no configured region name");
                String::new()
            }
        }
    }
}
