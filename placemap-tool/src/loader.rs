//! Vendor data loading.
//!
//! Everything here turns on-disk dumps into the core's in-memory inputs:
//! map documents (JSON), actor-link and drop-table data (YAML with
//! vendor-specific tags), name/text dictionaries, and the actor database.
//! The core never parses serialized formats itself.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use placemap_core::{ActorDb, ActorTags, DropTable, DropTables, HashId, KorokEntry, KorokTable, PlacementRecord};

/// Reads a JSON file into any deserializable type.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Reads a YAML file, stripping vendor tags, into a plain JSON value.
pub fn read_yaml(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(strip_tags(value))
}

/// Converts a YAML value to JSON, unwrapping vendor tags (`!obj`, `!list`,
/// `!io`, `!str64`, `!u`, …) to their underlying values.
fn strip_tags(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64().map(Value::from).unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(strip_tags).collect()),
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = serde_json::Map::with_capacity(mapping.len());
            for (key, val) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => {
                        debug!(?other, "skipping non-scalar mapping key");
                        continue;
                    }
                };
                out.insert(key, strip_tags(val));
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => strip_tags(tagged.value),
    }
}

/// One per-map placement document. Rails and other sections are ignored;
/// rail references stay embedded in the records' retained fields.
#[derive(Debug, Deserialize)]
pub struct MapDocument {
    #[serde(rename = "Objs", default)]
    pub objs: Vec<PlacementRecord>,
}

pub fn read_map_document(path: &Path) -> Result<Vec<PlacementRecord>> {
    let doc: MapDocument = read_json(path)?;
    Ok(doc.objs)
}

/// Loads the actor database from the actor-info dump
/// (`{"Actors": [{"name": …, "profile": …}, …], "Hashes": […]}`).
pub fn read_actor_db(path: &Path) -> Result<ActorDb> {
    let value: Value = read_json(path)?;
    let Some(actors) = value.get("Actors").and_then(Value::as_array) else {
        bail!("{}: no Actors array", path.display());
    };
    let mut db = ActorDb::new();
    for actor in actors {
        if let (Some(name), Some(profile)) = (
            actor.get("name").and_then(Value::as_str),
            actor.get("profile").and_then(Value::as_str),
        ) {
            db.insert(name, profile);
        }
    }
    Ok(db)
}

/// Scans `ActorLink/*.yml`, collecting each actor's drop-table user and
/// tag list, then reads the referenced `DropTable/*.drop.yml` files.
/// Actors pointing at the `Dummy` table are skipped.
pub fn read_actor_links(actor_dir: &Path) -> Result<(DropTables, ActorTags)> {
    let mut tags = ActorTags::new();
    let mut tables = DropTables::new();

    let link_dir = actor_dir.join("ActorLink");
    let mut entries: Vec<_> = fs::read_dir(&link_dir)
        .with_context(|| format!("reading {}", link_dir.display()))?
        .collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yml") {
            continue;
        }
        let Some(actor) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let doc = read_yaml(&path)?;
        let objects = &doc["param_root"]["objects"];

        if let Some(actor_tags) = objects.get("Tags").and_then(Value::as_object) {
            let list: Vec<String> = actor_tags
                .values()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if !list.is_empty() {
                tags.insert(&actor, list);
            }
        }

        let table_user = objects
            .get("LinkTarget")
            .and_then(|t| t.get("DropTableUser"))
            .and_then(Value::as_str);
        if let Some(table_user) = table_user.filter(|t| *t != "Dummy") {
            let table_path = actor_dir.join("DropTable").join(format!("{table_user}.drop.yml"));
            for table in read_drop_table_file(&table_path)? {
                tables.insert(&actor, table);
            }
        }
    }
    Ok((tables, tags))
}

/// Parses one drop-table file: every object except the header is a named
/// table with `ColumnNum` item/probability column pairs and a repeat range.
pub fn read_drop_table_file(path: &Path) -> Result<Vec<DropTable>> {
    let doc = read_yaml(path)?;
    parse_drop_tables(&doc).with_context(|| format!("parsing {}", path.display()))
}

fn parse_drop_tables(doc: &Value) -> Result<Vec<DropTable>> {
    let Some(objects) = doc["param_root"]["objects"].as_object() else {
        bail!("no param_root.objects");
    };
    let mut tables = Vec::new();
    for (name, table) in objects {
        if name == "Header" {
            continue;
        }
        let columns = table.get("ColumnNum").and_then(Value::as_i64).unwrap_or(0);
        let mut items = IndexMap::new();
        for column in 1..=columns {
            let item = table
                .get(format!("ItemName{column:02}"))
                .and_then(Value::as_str);
            let probability = table
                .get(format!("ItemProbability{column:02}"))
                .and_then(Value::as_f64);
            if let (Some(item), Some(probability)) = (item, probability) {
                items.insert(item.to_string(), probability);
            }
        }
        let repeat = |key: &str| table.get(key).and_then(Value::as_i64).unwrap_or(1);
        tables.push(DropTable {
            name: name.clone(),
            items,
            repeat_num: [repeat("RepeatNumMin"), repeat("RepeatNumMax")],
        });
    }
    Ok(tables)
}

/// Optional korok/quest table: `{"<hash id>": {"id": …, "type": …}, …}`.
pub fn read_korok_table(path: &Path) -> Result<KorokTable> {
    let raw: HashMap<String, Value> = read_json(path)?;
    let mut table = KorokTable::new();
    for (hash, entry) in raw {
        let hash: u64 = hash
            .parse()
            .with_context(|| format!("{}: bad hash id {hash:?}", path.display()))?;
        let id = entry.get("id").and_then(Value::as_str).unwrap_or_default();
        let kind = entry.get("type").and_then(Value::as_str).unwrap_or_default();
        table.insert(
            HashId(hash),
            KorokEntry {
                id: id.to_string(),
                kind: kind.to_string(),
            },
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_vendor_tags() {
        let yaml = r"
param_root: !io
  objects:
    LinkTarget: !obj
      DropTableUser: !str64 Enemy_Bokoblin
    Tags: !obj
      Tag0: EnemyNormal
      Tag1: UnderGodForest
";
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let json = strip_tags(value);
        assert_eq!(
            json["param_root"]["objects"]["LinkTarget"]["DropTableUser"],
            json!("Enemy_Bokoblin")
        );
        assert_eq!(json["param_root"]["objects"]["Tags"]["Tag1"], json!("UnderGodForest"));
    }

    #[test]
    fn parses_drop_tables() {
        let doc = json!({
            "param_root": {
                "objects": {
                    "Header": {"TableNum": 1, "Table01": "Normal"},
                    "Normal": {
                        "ColumnNum": 2,
                        "ItemName01": "Item_Enemy_00",
                        "ItemProbability01": 70.0,
                        "ItemName02": "Item_Enemy_01",
                        "ItemProbability02": 30.0,
                        "RepeatNumMin": 1,
                        "RepeatNumMax": 2,
                    },
                }
            }
        });
        let tables = parse_drop_tables(&doc).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Normal");
        assert_eq!(tables[0].repeat_num, [1, 2]);
        assert_eq!(tables[0].items.get("Item_Enemy_00"), Some(&70.0));
        assert_eq!(tables[0].items.len(), 2);
    }

    #[test]
    fn map_document_ignores_unknown_sections() {
        let doc = json!({
            "Objs": [
                {"HashId": 1, "UnitConfigName": "Obj_Tree", "Translate": [0.0, 0.0, 0.0]}
            ],
            "Rails": [{"HashId": 2}]
        });
        let doc: MapDocument = serde_json::from_value(doc).unwrap();
        assert_eq!(doc.objs.len(), 1);
        assert_eq!(doc.objs[0].unit_config_name, "Obj_Tree");
    }
}
