//! Placemap ingests per-map placement documents, resolves cross-object
//! references into generation groups, derives denormalized query attributes,
//! and emits rows to a persistence sink.
//!
//! Core concepts:
//! - **PlacementRecord**: one placed object as loaded from a map dump
//! - **PlacementMap**: a document's node arena with mirrored typed links
//! - **Generation group**: a connected component of the link graph; objects
//!   in one group appear and disappear together
//! - **Beco**: a binary run-length area table mapping (x, z) to a region id
//! - **RowSink**: the append-only persistence contract; backends live in
//!   separate crates
//!
//! Documents flow one way: records → graph construction → group resolution
//! → attribute derivation → row emission. Structural faults (duplicate ids,
//! dangling references, malformed area tables) abort a run; lookup misses
//! fall back and log.

mod beco;
mod classify;
mod drops;
mod geometry;
mod groups;
mod map;
mod names;
mod pipeline;
mod record;
mod sink;

pub use beco::{AREA_NONE, Beco, BecoError};
pub use classify::{ActorDb, LastBossRules, ScaleRules};
pub use drops::{
    ActorTags, DEFAULT_ARROW, DEFAULT_DROP_TABLE, DropDescriptor, DropTable, DropTables,
    EQUIP_NONE, EQUIP_SLOTS, drop_descriptor, equipment, ui_equipment,
};
pub use geometry::{Polygon, find_containing};
pub use groups::{GroupCounter, GroupId, resolve_groups};
pub use map::{BuildError, NodeId, PlacementLink, PlacementMap, PlacementNode};
pub use names::NameTables;
pub use pipeline::{
    AreaTables, IngestError, Ingestor, KorokEntry, KorokTable, Lookups, PipelineConfig,
};
pub use record::{HashId, LinkRecord, ParameterBag, PlacementRecord, ScalarOrVec3, Vec3};
pub use sink::{DropTableRow, MemorySink, ObjectRow, RowSink};
