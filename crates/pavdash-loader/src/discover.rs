//! Production file discovery

use pavdash_core::selection::is_all_key;
use pavdash_core::ProjectId;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// File name prefix of the daily production spreadsheets
pub const DEFAULT_FILE_PREFIX: &str = "Produção_Diária_Obra_";

/// A spreadsheet found in the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub project: ProjectId,
}

/// Matches `<prefix><anything>.xlsx`, extension in any case
pub fn file_pattern(prefix: &str) -> Result<Regex, LoadError> {
    Ok(Regex::new(&format!(
        r"^{}.+\.(?i:xlsx)$",
        regex::escape(prefix)
    ))?)
}

/// Project id encoded in a production file name.
///
/// The id is the last `_`-separated token, up to its first dot:
/// `Produção_Diária_Obra_12.xlsx` is project `12`.
pub fn project_id_from_file_name(name: &str) -> Option<ProjectId> {
    let tail = name.rsplit('_').next()?;
    let id = tail.split('.').next()?.trim();
    (!id.is_empty()).then(|| ProjectId::new(id))
}

/// Production files directly inside `dir`, sorted by file name
pub fn discover_files(dir: &Path, prefix: &str) -> Result<Vec<SourceFile>, LoadError> {
    let pattern = file_pattern(prefix)?;
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !pattern.is_match(name) {
            continue;
        }
        match project_id_from_file_name(name) {
            // Such a project could never be selected
            Some(project) if is_all_key(project.as_str()) => tracing::warn!(
                file = %path.display(),
                project = %project,
                "Skipping file whose project id is a selector keyword"
            ),
            Some(project) => files.push(SourceFile {
                project,
                path: path.clone(),
            }),
            None => tracing::debug!(file = %path.display(), "Skipping file without project id"),
        }
    }

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}
