//! Atomic JSON-file document storage.
//!
//! [`JsonFile`] persists one serde document per file. Writes go to a
//! temporary sibling file which is then renamed over the target, so readers
//! never observe a half-written document. Reads never fail: a missing file
//! yields the default value silently, and an unreadable or corrupt file
//! yields the default value with a logged warning.

use std::{fs, io::Write, marker::PhantomData, path::{Path, PathBuf}};

use serde::{Serialize, de::DeserializeOwned};
use snafu::ResultExt;

use crate::error::{IoSnafu, Result, SerializeSnafu};

/// A single JSON document persisted at a fixed path.
#[derive(Debug)]
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Binds a document to `path`. The file is not created until the first
    /// [`store`](Self::store).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), _marker: PhantomData }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document, degrading to `T::default()` on any fault.
    ///
    /// A missing file is the normal first-run state and is not logged.
    /// Unreadable or corrupt files are logged at warn level and also yield
    /// the default; the store must keep serving.
    pub fn load(&self) -> T {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store file unreadable, using default");
                return T::default();
            },
        };
        match serde_json::from_slice(&contents) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "store file corrupt, using default");
                T::default()
            },
        }
    }

    /// Persists the document atomically.
    ///
    /// Writes to `<path>.tmp` and renames over the target, so a crash
    /// mid-write leaves the previous document intact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`](crate::StoreError) if serialization or any
    /// filesystem step fails.
    pub fn store(&self, value: &T) -> Result<()> {
        let serialized =
            serde_json::to_vec(value).context(SerializeSnafu { path: self.path.clone() })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context(IoSnafu { path: parent.to_path_buf() })?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp).context(IoSnafu { path: tmp.clone() })?;
            file.write_all(&serialized).context(IoSnafu { path: tmp.clone() })?;
            file.sync_all().context(IoSnafu { path: tmp.clone() })?;
        }
        fs::rename(&tmp, &self.path).context(IoSnafu { path: self.path.clone() })?;
        Ok(())
    }
}
