//! World definition files: static regions and the tile/model catalog.
//!
//! Both files are TOML. Regions are mandatory (a world without its world
//! region cannot boot); the catalog file is optional and missing entries
//! fall back to flagless defaults.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use world_core::StaticRegionDef;
use world_types::{GridRect, ModelInfo, TileCatalog, TileFlags, TilePoint};

// ============================================================================
// Region Definitions
// ============================================================================

#[derive(Debug, Deserialize)]
struct RegionsFile {
    #[serde(default)]
    region: Vec<RegionRecord>,
}

#[derive(Debug, Deserialize)]
struct RegionRecord {
    defname: String,
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    plane: u8,
    spawn: SpawnRecord,
    /// Rectangles as `[x1, y1, x2, y2]` corner pairs.
    #[serde(default)]
    rects: Vec<[u16; 4]>,
}

#[derive(Debug, Deserialize)]
struct SpawnRecord {
    x: u16,
    y: u16,
    #[serde(default)]
    z: i8,
}

/// Reads the static region definition file.
pub async fn load_regions(path: &Path) -> Result<Vec<StaticRegionDef>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading region file {}", path.display()))?;
    let defs = parse_regions(&content)
        .with_context(|| format!("parsing region file {}", path.display()))?;
    info!(regions = defs.len(), file = %path.display(), "region definitions loaded");
    Ok(defs)
}

fn parse_regions(content: &str) -> Result<Vec<StaticRegionDef>> {
    let file: RegionsFile = toml::from_str(content)?;
    Ok(file
        .region
        .into_iter()
        .map(|r| StaticRegionDef {
            defname: r.defname,
            name: r.name,
            parent: r.parent,
            spawn: TilePoint::new(r.spawn.x, r.spawn.y, r.spawn.z, r.plane),
            rects: r
                .rects
                .iter()
                .map(|&[x1, y1, x2, y2]| GridRect::new(x1, y1, x2, y2))
                .collect(),
        })
        .collect())
}

// ============================================================================
// Tile Catalog
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    land: Vec<LandRecord>,
    #[serde(default)]
    model: Vec<ModelRecord>,
}

#[derive(Debug, Deserialize)]
struct LandRecord {
    id: u16,
    flags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ModelRecord {
    id: u16,
    flags: Vec<String>,
    #[serde(default)]
    height: i8,
}

/// Catalog backed by the models file. Unlisted ids are flagless with zero
/// height.
#[derive(Debug)]
pub struct FileCatalog {
    land: HashMap<u16, TileFlags>,
    models: HashMap<u16, ModelInfo>,
}

impl TileCatalog for FileCatalog {
    fn land_flags(&self, tile_id: u16) -> TileFlags {
        self.land.get(&tile_id).copied().unwrap_or(TileFlags::NONE)
    }

    fn model(&self, model_id: u16) -> ModelInfo {
        self.models
            .get(&model_id)
            .copied()
            .unwrap_or_else(|| ModelInfo::new(TileFlags::NONE, 0))
    }
}

/// Reads the catalog file; a missing file yields an empty catalog.
pub async fn load_catalog(path: &Path) -> Result<FileCatalog> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(file = %path.display(), "no catalog file, all tiles and models are flagless");
            return parse_catalog("");
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading catalog file {}", path.display()))
        }
    };
    let catalog = parse_catalog(&content)
        .with_context(|| format!("parsing catalog file {}", path.display()))?;
    info!(
        land = catalog.land.len(),
        models = catalog.models.len(),
        file = %path.display(),
        "tile catalog loaded"
    );
    Ok(catalog)
}

fn parse_catalog(content: &str) -> Result<FileCatalog> {
    let file: CatalogFile = toml::from_str(content)?;
    let mut land = HashMap::new();
    for record in file.land {
        land.insert(record.id, parse_flags(&record.flags)?);
    }
    let mut models = HashMap::new();
    for record in file.model {
        models.insert(record.id, ModelInfo::new(parse_flags(&record.flags)?, record.height));
    }
    Ok(FileCatalog { land, models })
}

fn parse_flags(names: &[String]) -> Result<TileFlags> {
    let mut flags = TileFlags::NONE;
    for name in names {
        flags |= match name.as_str() {
            "impassable" => TileFlags::IMPASSABLE,
            "surface" => TileFlags::SURFACE,
            "wet" => TileFlags::WET,
            "bridge" => TileFlags::BRIDGE,
            "door" => TileFlags::DOOR,
            "lava" => TileFlags::LAVA,
            "ignored" => TileFlags::IGNORED,
            other => bail!("unknown tile flag: {other}"),
        };
    }
    Ok(flags)
}
