use crate::models::{AssetRecord, Container};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs::File, io::BufWriter, io::Write, path::Path};

/// Output of a collection run.
#[derive(Debug, Serialize)]
pub struct CollectionDocument<'a> {
    pub assets: &'a [AssetRecord],
    pub asset_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl<'a> CollectionDocument<'a> {
    pub fn new(assets: &'a [AssetRecord], chain_id: Option<u64>) -> Self {
        Self {
            assets,
            asset_count: assets.len(),
            chain_id,
            timestamp: Utc::now(),
        }
    }
}

/// Output of a single contract run.
#[derive(Debug, Serialize)]
pub struct ContractDocument<'a> {
    pub contract: &'a Container,
    pub assets: &'a [AssetRecord],
    pub asset_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl<'a> ContractDocument<'a> {
    pub fn new(contract: &'a Container, assets: &'a [AssetRecord]) -> Self {
        Self {
            contract,
            assets,
            asset_count: assets.len(),
            timestamp: Utc::now(),
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, document: &T, pretty: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let serialized = if pretty {
        serde_json::to_writer_pretty(&mut writer, document)
    } else {
        serde_json::to_writer(&mut writer, document)
    };
    serialized.with_context(|| format!("serialize output to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    tracing::info!("output written to {}", path.display());
    Ok(())
}
