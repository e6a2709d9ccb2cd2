//! Placement database builder.
//!
//! Walks a dump of per-map placement documents, resolves generation groups,
//! derives query attributes, and publishes an indexed, full-text-searchable
//! SQLite database. The whole run is all-or-nothing: any structural fault
//! aborts before anything is published.

mod loader;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use placemap_core::{AreaTables, Beco, Ingestor, Lookups, NameTables, PipelineConfig};
use placemap_sqlite::SqliteSink;

#[derive(Parser)]
#[command(name = "placemap")]
#[command(about = "Build a searchable placement database from map dumps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest map documents and publish the database
    Build {
        /// Directory of per-map documents (content/map)
        #[arg(long)]
        map_dir: PathBuf,

        /// Directory with ActorLink and DropTable YAML dumps
        #[arg(long)]
        actor_dir: PathBuf,

        /// Content directory with names, texts, and area tables
        #[arg(long)]
        content_dir: PathBuf,

        /// Optional korok/quest table (JSON)
        #[arg(long)]
        koroks: Option<PathBuf>,

        /// Output database path
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Build {
            map_dir,
            actor_dir,
            content_dir,
            koroks,
            out,
        } => build(&map_dir, &actor_dir, &content_dir, koroks.as_deref(), &out),
    }
}

fn build(
    map_dir: &Path,
    actor_dir: &Path,
    content_dir: &Path,
    koroks: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let lookups = load_lookups(actor_dir, content_dir, koroks)?;
    let areas = load_area_tables(content_dir)?;
    let mut ingestor = Ingestor::new(PipelineConfig::default(), areas, lookups);

    let mut sink = SqliteSink::create(out)
        .with_context(|| format!("creating database at {}", out.display()))?;

    let mut documents = 0usize;
    let mut objects = 0usize;
    for (map_type, map_name, is_static, path) in map_documents(map_dir)? {
        let records = loader::read_map_document(&path)?;
        let label = format!(
            "{map_type}/{map_name} ({})",
            if is_static { "static" } else { "dynamic" }
        );
        objects += ingestor
            .process_document(&map_type, &map_name, is_static, records, &mut sink)
            .with_context(|| format!("processing {label}"))?;
        documents += 1;
    }

    let drop_rows = ingestor
        .write_drop_tables(&mut sink)
        .context("writing drop tables")?;
    sink.finish()
        .with_context(|| format!("publishing {}", out.display()))?;

    info!(
        documents,
        objects,
        drop_rows,
        out = %out.display(),
        "database published"
    );
    Ok(())
}

/// Every `(type, name, static?, path)` document under the map directory.
/// Each map ships a static and a dynamic document; both are required, and
/// the static one is processed first.
fn map_documents(map_dir: &Path) -> Result<Vec<(String, String, bool, PathBuf)>> {
    let mut out = Vec::new();
    for type_dir in sorted_dirs(map_dir)? {
        let map_type = dir_name(&type_dir)?;
        for name_dir in sorted_dirs(&type_dir)? {
            let map_name = dir_name(&name_dir)?;
            for (suffix, is_static) in [("Static", true), ("Dynamic", false)] {
                let path = name_dir.join(format!("{map_name}_{suffix}.json"));
                ensure!(
                    path.exists(),
                    "{}: missing {} document",
                    name_dir.display(),
                    suffix
                );
                out.push((map_type.clone(), map_name.clone(), is_static, path));
            }
        }
    }
    Ok(out)
}

fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("bad directory name: {}", path.display()))
}

fn load_lookups(actor_dir: &Path, content_dir: &Path, koroks: Option<&Path>) -> Result<Lookups> {
    let names = loader::read_json(&content_dir.join("names.json")).context("loading names")?;
    let markers = loader::read_json(&content_dir.join("text/StaticMsg/LocationMarker.json"))
        .context("loading location marker texts")?;
    let dungeons = loader::read_json(&content_dir.join("text/StaticMsg/Dungeon.json"))
        .context("loading dungeon texts")?;
    let actors = loader::read_actor_db(&content_dir.join("ActorInfo.product.json"))
        .context("loading actor database")?;
    let (drop_tables, actor_tags) =
        loader::read_actor_links(actor_dir).context("loading actor links")?;
    info!(actors = actors.len(), "auxiliary data loaded");

    let koroks = match koroks {
        Some(path) => loader::read_korok_table(path).context("loading korok table")?,
        None => {
            warn!("no korok table given; korok columns will be empty");
            Default::default()
        }
    };

    Ok(Lookups {
        names: NameTables::new(names, markers, dungeons),
        actors,
        drop_tables,
        actor_tags,
        koroks,
    })
}

/// The surface layer's area tables. Additional layers register here when
/// their dumps ship separate tables.
fn load_area_tables(content_dir: &Path) -> Result<AreaTables> {
    let mut areas = AreaTables::new();
    let field = content_dir.join("ecosystem/FieldMapArea.beco");
    areas.register_field(
        "MainField",
        Beco::load(&field).with_context(|| format!("loading {}", field.display()))?,
    );
    let tower = content_dir.join("ecosystem/MapTower.beco");
    areas.register_tower(
        "MainField",
        Beco::load(&tower).with_context(|| format!("loading {}", tower.display()))?,
    );
    Ok(areas)
}
