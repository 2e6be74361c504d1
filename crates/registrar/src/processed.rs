//! Persisted set of already-processed timeline posts
//!
//! The timeline API returns the same recent posts tick after tick; without
//! this set every tick would re-register them. The set is a JSON array on
//! disk, loaded at startup and flushed after each newly processed post.

use crate::error::Result;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct ProcessedPostsStore {
    path: PathBuf,
    ids: Mutex<BTreeSet<String>>,
}

impl ProcessedPostsStore {
    /// Load the store, starting empty when the file does not exist yet
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let ids = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<BTreeSet<String>>(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "Loaded {} processed post id(s) from {}",
            ids.len(),
            path.display()
        );
        Ok(Self {
            path,
            ids: Mutex::new(ids),
        })
    }

    pub fn contains(&self, post_id: &str) -> bool {
        self.ids.lock().contains(post_id)
    }

    /// Record a post as processed and flush the set to disk
    pub fn mark(&self, post_id: &str) -> Result<()> {
        let snapshot = {
            let mut ids = self.ids.lock();
            if !ids.insert(post_id.to_string()) {
                return Ok(());
            }
            ids.clone()
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&self.path, json)?;
        debug!("Marked post {} as processed", post_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}
