// src/csv_import/mod.rs

//! Commit-metrics CSV feed. Rows are keyed by commit id and merge-upserted,
//! so re-importing the same file converges.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::models::CommitMetrics;
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct CommitRow {
    pub commit_id: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub buggy: bool,
    pub project: String,
    pub la: i64,
    pub ld: i64,
    pub nf: i64,
    pub nd: i64,
    pub ns: i64,
    pub ent: f64,
    pub ndev: f64,
    pub age: f64,
    pub nuc: f64,
    pub aexp: i64,
    pub arexp: f64,
    pub asexp: f64,
}

/// The feed writes booleans as True/False or 0/1 depending on its exporter.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!("unrecognized flag: {other}"))),
    }
}

impl CommitRow {
    pub fn to_model(&self) -> CommitMetrics {
        CommitMetrics {
            id: self.commit_id.clone(),
            buggy: self.buggy,
            project: self.project.clone(),
            lines_added: self.la,
            lines_deleted: self.ld,
            files_touched: self.nf,
            dirs_touched: self.nd,
            subsystems_touched: self.ns,
            entropy: self.ent,
            developers: self.ndev,
            age: self.age,
            unique_changes: self.nuc,
            author_experience: self.aexp,
            author_recent_experience: self.arexp,
            author_subsystem_experience: self.asexp,
        }
    }
}

/// Import every row of the CSV file into the commits table.
pub async fn import_file(store: &Store, path: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open commit metrics feed at {}", path.display()))?;

    let mut imported = 0usize;
    for record in reader.deserialize::<CommitRow>() {
        let row = record.context("Malformed commit metrics row")?;
        store.upsert_commit_metrics(&row.to_model()).await?;
        imported += 1;
    }

    info!(imported, path = %path.display(), "Commit metrics import complete");
    Ok(imported)
}
