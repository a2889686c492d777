use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::decode::{DecodedImage, decode_image};
use crate::foundation::error::{KarmaError, KarmaResult};

/// Opaque, immutable reference to one slide's source image.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A file path or `file://` URL, resolved relative to the loader root.
    Path(PathBuf),
    /// Encoded image bytes already held in memory (an uploaded blob).
    Blob {
        /// Display name used in logs and errors.
        name: String,
        /// Encoded bytes (PNG, JPEG, WebP, ...).
        bytes: Arc<[u8]>,
    },
}

impl ImageRef {
    /// Build a blob reference from encoded bytes.
    pub fn blob(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Blob {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Short human-readable label for logs.
    pub fn label(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Blob { name, .. } => format!("blob:{name}"),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Blob { name, bytes } => f
                .debug_struct("Blob")
                .field("name", name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self::Path(PathBuf::from(s))
    }
}

impl From<PathBuf> for ImageRef {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

/// Resolves an [`ImageRef`] into a drawable bitmap.
///
/// Implementations must be safe to share across the session worker thread. A failure is always a
/// [`KarmaError::Load`]; the sequence driver decides whether to continue.
pub trait ImageLoader: Send + Sync {
    /// Fetch and decode one image.
    fn load(&self, image: &ImageRef) -> KarmaResult<DecodedImage>;
}

/// Loader for local files and in-memory blobs.
///
/// Relative paths are resolved against `root`. Remote URLs are rejected with a load error.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    /// Create a loader resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, raw: &Path) -> KarmaResult<PathBuf> {
        let s = raw.to_string_lossy();
        if s.starts_with("http://") || s.starts_with("https://") {
            return Err(KarmaError::load(format!(
                "remote image '{s}' is not reachable from the file loader"
            )));
        }
        let stripped = s.strip_prefix("file://").map(PathBuf::from);
        let path = stripped.unwrap_or_else(|| raw.to_path_buf());
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.root.join(path))
        }
    }
}

impl Default for FsImageLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, image: &ImageRef) -> KarmaResult<DecodedImage> {
        match image {
            ImageRef::Path(raw) => {
                let path = self.resolve(raw)?;
                let bytes = std::fs::read(&path).map_err(|e| {
                    KarmaError::load(format!("read image '{}': {e}", path.display()))
                })?;
                decode_image(&bytes).map_err(|e| match e {
                    KarmaError::Load(msg) => {
                        KarmaError::load(format!("'{}': {msg}", path.display()))
                    }
                    other => other,
                })
            }
            ImageRef::Blob { name, bytes } => decode_image(bytes).map_err(|e| match e {
                KarmaError::Load(msg) => KarmaError::load(format!("blob '{name}': {msg}")),
                other => other,
            }),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
