//! Fitness priors persisted as pretty JSON between runs

use std::path::Path;

use consensus_engine::FitnessSnapshot;
use tracing::info;

use crate::{HostError, HostResult};

/// Load a snapshot; a missing file yields `None`
pub fn load(path: &Path) -> HostResult<Option<FitnessSnapshot>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(HostError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let snapshot: FitnessSnapshot =
        serde_json::from_str(&raw).map_err(|source| HostError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        path = %path.display(),
        species = snapshot.records.len(),
        generation = snapshot.generation,
        "Loaded fitness priors"
    );
    Ok(Some(snapshot))
}

/// Write through a temp file so a crash never leaves a half-written snapshot
pub fn save(path: &Path, snapshot: &FitnessSnapshot) -> HostResult<()> {
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| HostError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    let io_err = |source| HostError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use consensus_engine::SpeciesRecord;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitness.json");
        assert!(load(&path).unwrap().is_none());

        let mut snapshot = FitnessSnapshot {
            generation: 3,
            ..FitnessSnapshot::default()
        };
        snapshot
            .records
            .insert("code.go".into(), SpeciesRecord { spawns: 12, wins: 4 });
        save(&path, &snapshot).unwrap();

        assert_eq!(load(&path).unwrap(), Some(snapshot));
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fitness.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(load(&path), Err(HostError::Json { .. })));
    }
}
