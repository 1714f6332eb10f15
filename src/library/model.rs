use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Identity of a track, derived from its source path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(pub u64);

impl TrackId {
    pub fn from_path(path: &Path) -> Self {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        TrackId(hasher.finish())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    /// Audio source. An empty path marks a track that cannot be played.
    pub source: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub cover: Option<PathBuf>,
    pub duration: Option<Duration>,
    pub display: String,
}

impl Track {
    /// A track with only a source and a title; the id comes from the source.
    pub fn new(source: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        let source = source.into();
        let title = title.into();
        Self {
            id: TrackId::from_path(&source),
            display: title.clone(),
            source,
            title,
            artist: None,
            album: None,
            cover: None,
            duration: None,
        }
    }

    pub fn has_source(&self) -> bool {
        !self.source.as_os_str().is_empty()
    }

    /// Change the title, carrying the change into the display string.
    pub fn rename(&mut self, title: &str) {
        let old = std::mem::replace(&mut self.title, title.to_string());
        if !old.is_empty() && self.display.contains(&old) {
            self.display = self.display.replacen(&old, title, 1);
        } else if self.display.is_empty() {
            self.display = title.to_string();
        }
    }
}
