use std::collections::HashMap;

use crate::groups::GroupId;
use crate::record::{HashId, LinkRecord, PlacementRecord};

/// Index handle into a map's node arena.
///
/// Nodes reference each other by handle instead of owning pointers; the link
/// graph is cyclic by construction (every forward link has a mirrored
/// backward link).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A typed reference between two nodes of the same document.
///
/// Stored directionally: the source node holds the forward link, the
/// destination holds a mirrored link whose `peer` points back at the source.
/// Both carry the same relation tag and raw reference record.
#[derive(Debug, Clone)]
pub struct PlacementLink {
    pub peer: NodeId,
    pub ltype: String,
    pub record: LinkRecord,
}

/// One placed object plus its resolved link lists and group assignment.
#[derive(Debug)]
pub struct PlacementNode {
    pub record: PlacementRecord,
    /// Forward links declared by this record.
    pub links: Vec<PlacementLink>,
    /// Mirrored links from records that reference this one.
    pub links_to_self: Vec<PlacementLink>,
    /// Generation group, `None` until `resolve_groups` runs. Set exactly once.
    pub group: Option<GroupId>,
}

impl PlacementNode {
    fn new(record: PlacementRecord) -> Self {
        PlacementNode {
            record,
            links: Vec::new(),
            links_to_self: Vec::new(),
            group: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.unit_config_name
    }

    pub fn hash_id(&self) -> HashId {
        self.record.hash_id
    }
}

/// Structural faults in a map document. All of these abort the ingestion
/// run: a partial graph would silently corrupt group resolution.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{map}: duplicate placement id {hash_id}")]
    DuplicateHashId { map: String, hash_id: HashId },
    #[error("{map}: link {ltype:?} from {from} references missing id {to}")]
    DanglingLink {
        map: String,
        from: HashId,
        to: HashId,
        ltype: String,
    },
}

/// One map document's placement graph: an arena of nodes indexed by hash id.
///
/// Nodes are exclusively owned by the map for the lifetime of one ingestion
/// run. Link lists are append-only during `build` and frozen afterwards.
#[derive(Debug)]
pub struct PlacementMap {
    pub map_type: String,
    pub map_name: String,
    pub is_static: bool,
    pub(crate) nodes: Vec<PlacementNode>,
    by_hash: HashMap<HashId, NodeId>,
}

impl PlacementMap {
    /// Builds the placement graph for one document.
    ///
    /// One node per record, then one forward + one mirrored backward link per
    /// reference. Duplicate hash ids and references to absent hash ids are
    /// fatal. O(nodes + links).
    pub fn build(
        map_type: impl Into<String>,
        map_name: impl Into<String>,
        is_static: bool,
        records: Vec<PlacementRecord>,
    ) -> Result<Self, BuildError> {
        let mut map = PlacementMap {
            map_type: map_type.into(),
            map_name: map_name.into(),
            is_static,
            nodes: Vec::with_capacity(records.len()),
            by_hash: HashMap::with_capacity(records.len()),
        };

        for record in records {
            let id = NodeId(map.nodes.len());
            if map.by_hash.insert(record.hash_id, id).is_some() {
                return Err(BuildError::DuplicateHashId {
                    map: map.label(),
                    hash_id: record.hash_id,
                });
            }
            map.nodes.push(PlacementNode::new(record));
        }

        // Resolve references in a read-only pass, then wire both directions.
        let mut edges = Vec::new();
        for (index, node) in map.nodes.iter().enumerate() {
            for link in node.record.links() {
                let dest = map.by_hash.get(&link.dest_unit_hash_id).copied().ok_or_else(|| {
                    BuildError::DanglingLink {
                        map: map.label(),
                        from: node.record.hash_id,
                        to: link.dest_unit_hash_id,
                        ltype: link.definition_name.clone(),
                    }
                })?;
                edges.push((NodeId(index), dest, link.clone()));
            }
        }
        for (src, dest, record) in edges {
            let ltype = record.definition_name.clone();
            map.nodes[src.0].links.push(PlacementLink {
                peer: dest,
                ltype: ltype.clone(),
                record: record.clone(),
            });
            map.nodes[dest.0].links_to_self.push(PlacementLink {
                peer: src,
                ltype,
                record,
            });
        }

        Ok(map)
    }

    /// `type/name (static|dynamic)` label used in logs and errors.
    pub fn label(&self) -> String {
        format!(
            "{}/{} ({})",
            self.map_type,
            self.map_name,
            if self.is_static { "static" } else { "dynamic" }
        )
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &PlacementNode {
        &self.nodes[id.0]
    }

    pub fn node_by_hash(&self, hash_id: HashId) -> Option<&PlacementNode> {
        self.by_hash.get(&hash_id).map(|id| &self.nodes[id.0])
    }

    /// Nodes in insertion order (the document's record order).
    pub fn nodes(&self) -> impl Iterator<Item = &PlacementNode> {
        self.nodes.iter()
    }

    /// Node handles in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(hash_id: u64, name: &str, links: &[(u64, &str)]) -> PlacementRecord {
        let mut value = json!({
            "HashId": hash_id,
            "UnitConfigName": name,
            "Translate": [0.0, 0.0, 0.0],
        });
        if !links.is_empty() {
            let links: Vec<_> = links
                .iter()
                .map(|(dest, ltype)| json!({"DestUnitHashId": dest, "DefinitionName": ltype}))
                .collect();
            value["LinksToObj"] = json!(links);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn build_wires_links_both_ways() {
        let map = PlacementMap::build(
            "MainField",
            "A-1",
            true,
            vec![
                record(1, "Enemy_Bokoblin", &[(2, "Drop")]),
                record(2, "Item_Apple", &[]),
            ],
        )
        .unwrap();

        let enemy = map.node_by_hash(HashId(1)).unwrap();
        assert_eq!(enemy.links.len(), 1);
        assert_eq!(enemy.links[0].ltype, "Drop");
        assert!(enemy.links_to_self.is_empty());

        let item = map.node_by_hash(HashId(2)).unwrap();
        assert!(item.links.is_empty());
        assert_eq!(item.links_to_self.len(), 1);
        assert_eq!(map.node(item.links_to_self[0].peer).hash_id(), HashId(1));
    }

    #[test]
    fn duplicate_hash_id_is_fatal() {
        let err = PlacementMap::build(
            "MainField",
            "A-1",
            true,
            vec![record(7, "A", &[]), record(7, "B", &[])],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateHashId { hash_id: HashId(7), .. }));
    }

    #[test]
    fn dangling_link_is_fatal() {
        let err = PlacementMap::build(
            "MainField",
            "A-1",
            false,
            vec![record(1, "A", &[(99, "Reference")])],
        )
        .unwrap_err();
        match err {
            BuildError::DanglingLink { from, to, ltype, .. } => {
                assert_eq!(from, HashId(1));
                assert_eq!(to, HashId(99));
                assert_eq!(ltype, "Reference");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_link_is_allowed() {
        let map = PlacementMap::build(
            "MainField",
            "A-1",
            true,
            vec![record(1, "A", &[(1, "Loop")])],
        )
        .unwrap();
        let node = map.node_by_hash(HashId(1)).unwrap();
        assert_eq!(node.links.len(), 1);
        assert_eq!(node.links_to_self.len(), 1);
    }
}
