//! Recursive registration of a watch root with an [`EventSource`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::io_err;
use crate::paths::is_hidden;
use crate::source::EventSource;

/// Subscribe `root` and every non-hidden directory below it.
///
/// Returns how many directories were registered, root included. A directory
/// that cannot be listed is logged and contributes nothing, its subtree
/// included. Symlinks are never followed.
pub fn register_tree<S>(source: &mut S, root: &Path) -> usize
where
    S: EventSource + ?Sized,
{
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut registered = 0usize;

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                let err = io_err(&dir, err);
                tracing::warn!(error = %err, "skipping unreadable directory");
                continue;
            }
        };

        match source.subscribe(&dir) {
            Ok(()) => registered += 1,
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "unable to watch directory");
            }
        }

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(path = %dir.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            // `file_type` does not follow symlinks.
            let is_dir = entry.file_type().map(|ty| ty.is_dir()).unwrap_or(false);
            if is_dir && !is_hidden(&entry.file_name()) {
                pending.push(entry.path());
            }
        }
    }

    registered
}
