use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::compiler::{ContentCompileError, ContentErrorCode};

pub(crate) const BUILTIN_SOURCE_ID: &str = "base";

#[derive(Debug, Clone)]
pub(crate) struct OverrideSource {
    pub source_id: String,
    pub load_index: u32,
    pub source_dir: PathBuf,
}

/// Override directories load after the built-in taxonomy, in the order given.
pub(crate) fn discover_override_sources(
    dirs: &[PathBuf],
) -> Result<Vec<OverrideSource>, ContentCompileError> {
    let mut seen = HashSet::<PathBuf>::new();
    let mut sources = Vec::with_capacity(dirs.len());

    for (idx, dir) in dirs.iter().enumerate() {
        let source_id = source_id_for(dir);
        ensure_dir_exists(&source_id, dir)?;
        if !seen.insert(dir.clone()) {
            return Err(ContentCompileError {
                code: ContentErrorCode::Discovery,
                message: format!(
                    "override directory '{}' listed more than once",
                    dir.display()
                ),
                source_id,
                file_path: dir.clone(),
                location: None,
            });
        }
        sources.push(OverrideSource {
            source_id,
            load_index: (idx + 1) as u32,
            source_dir: dir.clone(),
        });
    }

    Ok(sources)
}

fn source_id_for(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

fn ensure_dir_exists(source_id: &str, path: &Path) -> Result<(), ContentCompileError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "override directory '{}' not found; check taxonomy_overrides",
                path.display()
            ),
            source_id: source_id.to_string(),
            file_path: path.to_path_buf(),
            location: None,
        })
    }
}
