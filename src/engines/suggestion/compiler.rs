use crate::engines::generation::chromosome::Chromosome;
use crate::error::Result;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Serialises every worker that uses a shared scratch directory
static SHARED_SCRATCH_LOCK: Mutex<()> = Mutex::new(());

/// One compile-and-extract request
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub source: &'a str,
    pub classpath: &'a str,
    /// The normalized source, already written to the scratch space
    pub artifact: &'a Path,
}

/// Turns suggested source text into chromosomes.
///
/// `Ok(None)`, `Ok(Some(vec![]))` and `Err(_)` all mean no usable
/// candidates; errors are only logged.
pub trait Compiler: Send + Sync {
    fn compile_and_extract(&self, request: &CompileRequest<'_>) -> anyhow::Result<Option<Vec<Chromosome>>>;
}

enum Location {
    Shared(PathBuf),
    Namespaced(TempDir),
}

/// Directory holding temporary source and class artifacts of compile rounds
pub struct ScratchSpace {
    location: Location,
}

/// Held for the duration of one compile attempt
pub struct ScratchGuard<'a> {
    _lock: Option<MutexGuard<'static, ()>>,
    dir: &'a Path,
}

impl ScratchGuard<'_> {
    pub fn dir(&self) -> &Path {
        self.dir
    }
}

impl ScratchSpace {
    /// A directory that other workers may use too; access is serialised
    pub fn shared(dir: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Shared(dir.into()),
        }
    }

    /// A private temporary directory, removed when dropped
    pub fn namespaced(worker: usize) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("suitegen-worker{}-", worker))
            .tempdir()?;
        Ok(Self {
            location: Location::Namespaced(dir),
        })
    }

    pub fn dir(&self) -> &Path {
        match &self.location {
            Location::Shared(path) => path,
            Location::Namespaced(dir) => dir.path(),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.location, Location::Shared(_))
    }

    pub fn lock(&self) -> ScratchGuard<'_> {
        let lock = match self.location {
            Location::Shared(_) => Some(
                SHARED_SCRATCH_LOCK
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            ),
            Location::Namespaced(_) => None,
        };
        ScratchGuard {
            _lock: lock,
            dir: self.dir(),
        }
    }

    /// Write `contents` as `name` inside the scratch directory
    pub fn write_artifact(&self, _guard: &ScratchGuard<'_>, name: &str, contents: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(self.dir())?;
        let path = self.dir().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Remove everything left behind by a previous attempt
    pub fn clear(&self, _guard: &ScratchGuard<'_>) -> Result<()> {
        let dir = self.dir();
        if !dir.exists() {
            return Ok(());
        }
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
