use serde::{Deserialize, Serialize};

use crate::map::PlacementMap;

/// Identifier of one generation group (a connected component of the link
/// graph). Unique across every document of one ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

/// Monotonic allocator for group ids.
///
/// Owned by the ingestion run and threaded through every document, so ids
/// are globally unique within the run and independent runs never share
/// state.
#[derive(Debug, Default)]
pub struct GroupCounter {
    next: u32,
}

impl GroupCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: u32) -> Self {
        GroupCounter { next }
    }

    /// The id the next allocation will return.
    pub fn peek(&self) -> GroupId {
        GroupId(self.next)
    }

    fn allocate(&mut self) -> GroupId {
        let id = GroupId(self.next);
        self.next += 1;
        id
    }
}

/// Partitions a document's nodes into generation groups.
///
/// Nodes are visited in insertion order; each unassigned node seeds a fresh
/// group which is flooded across both link directions with an explicit
/// work-list (components can chain tens of thousands of nodes, so no
/// recursion). A node is assigned exactly once; the visit-once check also
/// terminates cycles. O(nodes + links).
pub fn resolve_groups(map: &mut PlacementMap, counter: &mut GroupCounter) {
    let mut stack = Vec::new();
    for seed in 0..map.nodes.len() {
        if map.nodes[seed].group.is_some() {
            continue;
        }
        let id = counter.allocate();
        stack.push(seed);
        while let Some(current) = stack.pop() {
            if map.nodes[current].group.is_some() {
                continue;
            }
            map.nodes[current].group = Some(id);
            let node = &map.nodes[current];
            for link in node.links.iter().chain(&node.links_to_self) {
                if map.nodes[link.peer.index()].group.is_none() {
                    stack.push(link.peer.index());
                }
            }
        }
    }
}
