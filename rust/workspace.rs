//! Request-scoped scratch directories.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::{ConversionError, ConversionResult},
    output_path::OutputTarget,
};

const SCRATCH_PREFIX: &str = "fileconv-";
const STAGING_PREFIX: &str = ".fileconv-staging-";
const BACKUP_PREFIX: &str = ".previous-";

/// A uniquely named directory that is removed when the workspace is dropped,
/// whether the conversion succeeded or not.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
}

impl Workspace {
    /// Scratch space for intermediate files under the configured temp root.
    pub fn create(config: &Config) -> ConversionResult<Self> {
        let mut builder = Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match &config.temp_root {
            Some(root) => {
                fs::create_dir_all(root).map_err(|source| ConversionError::DirectoryCreation {
                    path: root.clone(),
                    source,
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| ConversionError::library(format!("failed to create scratch directory: {e}")))?;
        Ok(Self::wrap(dir))
    }

    /// Staging space inside the destination directory, so publishing is a rename.
    pub fn staging_in(dir: &Path) -> ConversionResult<Self> {
        let dir = Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(dir)
            .map_err(|source| ConversionError::DirectoryCreation {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(Self::wrap(dir))
    }

    fn wrap(dir: TempDir) -> Self {
        let root = dir.path().to_path_buf();
        debug!(workspace = %root.display(), "workspace created");
        Self {
            dir: Some(dir),
            root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Moves staged files into the target directory, keeping their file names
    /// and order. Returns the published paths. If any move fails, files
    /// already published by this call are removed again and the outputs they
    /// replaced are put back.
    pub fn publish(&self, staged: &[PathBuf], target: &OutputTarget) -> ConversionResult<Vec<PathBuf>> {
        let mut published = Vec::with_capacity(staged.len());
        for file in staged {
            match self.publish_one(file, target) {
                Ok(entry) => published.push(entry),
                Err(e) => {
                    for entry in published.iter().rev() {
                        entry.roll_back();
                    }
                    return Err(e);
                }
            }
        }
        Ok(published.into_iter().map(|entry| entry.dest).collect())
    }

    fn publish_one(&self, file: &Path, target: &OutputTarget) -> ConversionResult<Published> {
        let name = file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ConversionError::library(format!("staged file has no name: {}", file.display()))
            })?;
        let dest = target.join(name);

        // Replaced outputs wait in the workspace until the whole set is published.
        let backup = if dest.is_file() {
            let backup = self.root.join(format!("{BACKUP_PREFIX}{name}"));
            move_file(&dest, &backup).map_err(|e| {
                ConversionError::library(format!("failed to set aside {}: {e}", dest.display()))
            })?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = move_file(file, &dest) {
            let entry = Published { dest, backup };
            entry.restore();
            return Err(ConversionError::library(format!(
                "failed to write {}: {e}",
                entry.dest.display()
            )));
        }
        debug!(from = %file.display(), to = %dest.display(), "published");
        Ok(Published { dest, backup })
    }
}

#[derive(Debug)]
struct Published {
    dest: PathBuf,
    backup: Option<PathBuf>,
}

impl Published {
    fn roll_back(&self) {
        if let Err(err) = fs::remove_file(&self.dest) {
            warn!(path = %self.dest.display(), error = %err, "failed to roll back output");
        }
        self.restore();
    }

    fn restore(&self) {
        let Some(backup) = &self.backup else {
            return;
        };
        if let Err(err) = move_file(backup, &self.dest) {
            warn!(path = %self.dest.display(), error = %err, "failed to restore previous output");
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                warn!(workspace = %self.root.display(), error = %e, "failed to remove workspace");
            }
        }
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output_path::PathRequest;

    #[test]
    fn workspace_is_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            temp_root: Some(root.path().to_path_buf()),
            ..Config::default()
        };

        let path = {
            let ws = Workspace::create(&config).unwrap();
            fs::write(ws.join("page.png"), b"x").unwrap();
            ws.path().to_path_buf()
        };

        assert!(path.starts_with(root.path()));
        assert!(!path.exists());
    }

    #[test]
    fn concurrent_workspaces_do_not_collide() {
        let config = Config::default();
        let a = Workspace::create(&config).unwrap();
        let b = Workspace::create(&config).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn publish_moves_files_in_order() {
        let out = tempfile::tempdir().unwrap();
        let out_str = out.path().to_string_lossy().into_owned();
        let target =
            OutputTarget::prepare(&PathRequest::new("in/deck.pptx", Some(&out_str), "png")).unwrap();
        let ws = Workspace::staging_in(out.path()).unwrap();

        let staged: Vec<PathBuf> = (1..=3)
            .map(|i| {
                let path = ws.join(target.page_file_name(i).unwrap());
                fs::write(&path, [i as u8]).unwrap();
                path
            })
            .collect();

        let published = ws.publish(&staged, &target).unwrap();

        assert_eq!(published[0], out.path().join("deck-00001.png"));
        assert_eq!(published.len(), 3);
        for (i, path) in published.iter().enumerate() {
            assert_eq!(fs::read(path).unwrap(), vec![i as u8 + 1]);
        }
        assert!(staged.iter().all(|path| !path.exists()));
    }

    #[test]
    fn failed_publish_restores_existing_outputs() {
        let out = tempfile::tempdir().unwrap();
        let out_str = out.path().to_string_lossy().into_owned();
        let target =
            OutputTarget::prepare(&PathRequest::new("in/deck.pptx", Some(&out_str), "png")).unwrap();
        let existing = out.path().join("deck-00001.png");
        fs::write(&existing, b"old").unwrap();

        let ws = Workspace::staging_in(out.path()).unwrap();
        let first = ws.join(target.page_file_name(1).unwrap());
        fs::write(&first, b"new").unwrap();
        // Never written, so moving it fails after the first page was published.
        let missing = ws.join(target.page_file_name(2).unwrap());

        assert!(ws.publish(&[first, missing], &target).is_err());
        assert_eq!(fs::read(&existing).unwrap(), b"old");
        assert!(!out.path().join("deck-00002.png").exists());
    }

    #[test]
    fn publish_replaces_existing_outputs() {
        let out = tempfile::tempdir().unwrap();
        let out_str = out.path().to_string_lossy().into_owned();
        let target = OutputTarget::prepare(&PathRequest::new("in/a.xlsx", Some(&out_str), "csv")).unwrap();
        fs::write(out.path().join("a.csv"), b"old").unwrap();

        let ws = Workspace::staging_in(out.path()).unwrap();
        let staged = ws.join(target.file_name());
        fs::write(&staged, b"new").unwrap();
        let published = ws.publish(&[staged], &target).unwrap();
        drop(ws);

        assert_eq!(fs::read(&published[0]).unwrap(), b"new");
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[test]
    fn staging_dir_is_hidden_and_cleaned() {
        let out = tempfile::tempdir().unwrap();
        let staging = Workspace::staging_in(out.path()).unwrap();
        let name = staging.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(STAGING_PREFIX));
        drop(staging);
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }
}
