// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Result Files

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use mall_elo_engine::EngineResult;
use serde::Serialize;

/// Writes `{stem}-{timestamp}.json` under `dir`, creating it if needed.
pub fn write_json<T: Serialize>(dir: &Path, stem: &str, value: &T) -> EngineResult<PathBuf> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    write_text(dir, &format!("{stem}-{timestamp}.json"), &json)
}

pub fn write_text(dir: &Path, name: &str, contents: &str) -> EngineResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    log::info!("wrote {}", path.display());
    Ok(path)
}
