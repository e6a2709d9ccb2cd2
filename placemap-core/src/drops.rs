//! Drop and equipment descriptors plus the auxiliary drop-table data.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::names::NameTables;
use crate::record::ParameterBag;

/// Canonical default drop table. A table reference equal to this is treated
/// as "no drop".
pub const DEFAULT_DROP_TABLE: &str = "Normal";

/// Equipment slot parameters, in publication order.
pub const EQUIP_SLOTS: [&str; 6] = [
    "EquipItem1",
    "EquipItem2",
    "EquipItem3",
    "EquipItem4",
    "EquipItem5",
    "RideHorseName",
];

/// Sentinel meaning "slot empty".
pub const EQUIP_NONE: &str = "Default";

/// Arrows are equipment only when they differ from the default.
pub const DEFAULT_ARROW: &str = "NormalArrow";

/// What a defeated/destroyed object yields: a specific actor or a named
/// table. Serialized as the tagged pair consumed by the query layer:
/// `[1, actor]` or `[2, table]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropDescriptor {
    Actor(String),
    Table(String),
}

impl DropDescriptor {
    pub fn ui_text(&self, names: &NameTables) -> String {
        match self {
            DropDescriptor::Actor(actor) => names.display(actor),
            DropDescriptor::Table(table) => format!("Table:{table}"),
        }
    }
}

impl Serialize for DropDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (tag, name) = match self {
            DropDescriptor::Actor(name) => (1u8, name),
            DropDescriptor::Table(name) => (2u8, name),
        };
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&tag)?;
        tuple.serialize_element(name)?;
        tuple.end()
    }
}

/// One named drop table attached to an actor type.
#[derive(Debug, Clone, Serialize)]
pub struct DropTable {
    #[serde(skip)]
    pub name: String,
    /// Item name to drop probability, in declaration order.
    pub items: IndexMap<String, f64>,
    /// Min/max repeat count.
    pub repeat_num: [i64; 2],
}

/// Auxiliary drop-table data: every table declared for every actor type.
#[derive(Debug, Clone, Default)]
pub struct DropTables {
    by_actor: HashMap<String, Vec<DropTable>>,
}

impl DropTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: impl Into<String>, table: DropTable) {
        self.by_actor.entry(actor.into()).or_default().push(table);
    }

    pub fn tables_of(&self, actor: &str) -> &[DropTable] {
        self.by_actor.get(actor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether this actor declares a table with an empty name. Such actors
    /// fall back to the canonical default table when their placement
    /// parameters name no drop at all.
    pub fn has_unnamed_table(&self, actor: &str) -> bool {
        self.tables_of(actor).iter().any(|t| t.name.is_empty())
    }

    /// (actor, table) pairs in arbitrary order, for row emission.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DropTable)> {
        self.by_actor
            .iter()
            .flat_map(|(actor, tables)| tables.iter().map(move |t| (actor.as_str(), t)))
    }

    pub fn is_empty(&self) -> bool {
        self.by_actor.is_empty()
    }
}

/// Actor type to tag list, from the auxiliary actor-link data.
#[derive(Debug, Clone, Default)]
pub struct ActorTags {
    tags: HashMap<String, Vec<String>>,
}

impl ActorTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: impl Into<String>, tags: Vec<String>) {
        self.tags.insert(actor.into(), tags);
    }

    pub fn has(&self, actor: &str, tag: &str) -> bool {
        self.tags
            .get(actor)
            .is_some_and(|tags| tags.iter().any(|t| t == tag))
    }
}

/// Resolves the drop descriptor for one placement.
///
/// Precedence: a `DropActor` reference always wins; otherwise a `DropTable`
/// reference counts unless it names the canonical default (then the drop is
/// absent). When the parameters name no drop at all, actors known to declare
/// an empty-named table fall back to the default table.
pub fn drop_descriptor(
    params: Option<&ParameterBag>,
    actor: &str,
    tables: &DropTables,
) -> Option<DropDescriptor> {
    if let Some(params) = params {
        if let Some(drop_actor) = params.str_of("DropActor").filter(|s| !s.is_empty()) {
            return Some(DropDescriptor::Actor(drop_actor.to_string()));
        }
        if let Some(table) = params.str_of("DropTable").filter(|s| !s.is_empty()) {
            if table == DEFAULT_DROP_TABLE {
                return None;
            }
            return Some(DropDescriptor::Table(table.to_string()));
        }
    }
    if tables.has_unnamed_table(actor) {
        return Some(DropDescriptor::Table(DEFAULT_DROP_TABLE.to_string()));
    }
    None
}

/// Collects the published equipment list: the fixed slots (skipping the
/// empty sentinel) plus a non-default arrow.
pub fn equipment(params: &ParameterBag) -> Vec<String> {
    let mut out = Vec::new();
    for slot in EQUIP_SLOTS {
        if let Some(item) = params.str_of(slot) {
            if !item.is_empty() && item != EQUIP_NONE {
                out.push(item.to_string());
            }
        }
    }
    if let Some(arrow) = params.str_of("ArrowName") {
        if !arrow.is_empty() && arrow != DEFAULT_ARROW {
            out.push(arrow.to_string());
        }
    }
    out
}

/// Display string for an equipment list: mapped names joined with `, `.
pub fn ui_equipment(items: &[String], names: &NameTables) -> String {
    items
        .iter()
        .map(|item| names.display(item))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: serde_json::Value) -> ParameterBag {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn actor_reference_takes_precedence_over_table() {
        let params = bag(json!({"DropActor": "Item_Apple", "DropTable": "Enemy_Bokoblin"}));
        assert_eq!(
            drop_descriptor(Some(&params), "Enemy_Bokoblin", &DropTables::new()),
            Some(DropDescriptor::Actor("Item_Apple".into()))
        );
    }

    #[test]
    fn table_reference_used_when_no_actor() {
        let params = bag(json!({"DropTable": "Enemy_Lizalfos"}));
        assert_eq!(
            drop_descriptor(Some(&params), "Enemy_Lizalfos", &DropTables::new()),
            Some(DropDescriptor::Table("Enemy_Lizalfos".into()))
        );
    }

    #[test]
    fn default_table_reference_means_no_drop() {
        let params = bag(json!({"DropTable": "Normal"}));
        assert_eq!(
            drop_descriptor(Some(&params), "Enemy_Bokoblin", &DropTables::new()),
            None
        );
    }

    #[test]
    fn unnamed_table_entry_falls_back_to_default() {
        let mut tables = DropTables::new();
        tables.insert(
            "Enemy_Keese",
            DropTable {
                name: String::new(),
                items: IndexMap::new(),
                repeat_num: [1, 1],
            },
        );
        assert_eq!(
            drop_descriptor(None, "Enemy_Keese", &tables),
            Some(DropDescriptor::Table(DEFAULT_DROP_TABLE.into()))
        );
        // But an explicit default reference still suppresses the drop.
        let params = bag(json!({"DropTable": "Normal"}));
        assert_eq!(drop_descriptor(Some(&params), "Enemy_Keese", &tables), None);
    }

    #[test]
    fn descriptor_serializes_as_tagged_pair() {
        let actor = serde_json::to_string(&DropDescriptor::Actor("Item_Apple".into())).unwrap();
        assert_eq!(actor, r#"[1,"Item_Apple"]"#);
        let table = serde_json::to_string(&DropDescriptor::Table("Enemy_Keese".into())).unwrap();
        assert_eq!(table, r#"[2,"Enemy_Keese"]"#);
    }

    #[test]
    fn equipment_filters_sentinels() {
        let params = bag(json!({
            "EquipItem1": "Weapon_Sword_001",
            "EquipItem2": "Default",
            "EquipItem3": "",
            "RideHorseName": "GameRomHorse00L",
            "ArrowName": "NormalArrow",
        }));
        assert_eq!(
            equipment(&params),
            vec!["Weapon_Sword_001".to_string(), "GameRomHorse00L".to_string()]
        );
    }

    #[test]
    fn non_default_arrow_is_equipment() {
        let params = bag(json!({"ArrowName": "FireArrow"}));
        assert_eq!(equipment(&params), vec!["FireArrow".to_string()]);
    }
}
