use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::{self, BoxFuture};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

static FILE_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum FileReadError {
    #[error("failed to read `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file `{0}` is no longer available")]
    Unavailable(String),
}

/// Backing storage of a user-selected file. Reads are asynchronous so the
/// presentation toolkit can hand over browser-style blobs.
pub trait FileSource: Send + Sync + 'static {
    fn read(&self) -> BoxFuture<'static, Result<Vec<u8>, FileReadError>>;
}

struct MemorySource(Arc<[u8]>);

impl FileSource for MemorySource {
    fn read(&self) -> BoxFuture<'static, Result<Vec<u8>, FileReadError>> {
        Box::pin(future::ready(Ok(self.0.to_vec())))
    }
}

/// Reads the whole file with a blocking `std::fs::read` on whichever executor
/// polls the preview. Fine for local images of a few megabytes; slow or
/// networked paths stall that executor for the duration of the read.
struct PathSource(PathBuf);

impl FileSource for PathSource {
    fn read(&self) -> BoxFuture<'static, Result<Vec<u8>, FileReadError>> {
        let path = self.0.clone();
        Box::pin(future::lazy(move |_| {
            std::fs::read(&path).map_err(|source| FileReadError::Io {
                name: path.display().to_string(),
                source,
            })
        }))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FileId(pub u64);

/// Lightweight reference to a selected file. Equality is identity: two
/// selections of the same bytes are different handles.
#[derive(Clone)]
pub struct FileHandle {
    id: FileId,
    name: Arc<str>,
    source: Arc<dyn FileSource>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, source: impl FileSource) -> Self {
        Self {
            id: FileId(FILE_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst)),
            name: Arc::from(name.into()),
            source: Arc::new(source),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, MemorySource(Arc::from(bytes.into())))
    }

    /// Handle for a file on disk; the bytes are read when the preview runs.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, PathSource(path))
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mime type guessed from the file extension.
    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(self.name())
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        }
    }

    pub fn read(&self) -> BoxFuture<'static, Result<Vec<u8>, FileReadError>> {
        self.source.read()
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FileHandle {}

impl Debug for FileHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Serialize for FileHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut file = serializer.serialize_struct("FileHandle", 2)?;
        file.serialize_field("name", self.name())?;
        file.serialize_field("type", self.mime_type())?;
        file.end()
    }
}
