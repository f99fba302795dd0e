//! Compiler seam and compiled artifacts.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::BoxError;
use crate::layer::TileLayerConfig;

// =============================================================================
// Compiler Trait
// =============================================================================

/// Turns the raw contents of a file into a ready-to-use artifact.
///
/// Implementations parse and evaluate `content` against a fresh artifact
/// instance. Closures of the shape `Fn(&Path, Bytes) -> Result<T, E>` are
/// compilers too.
pub trait Compiler<T>: Send + Sync {
    /// Compile the contents read from `path`.
    fn compile(&self, path: &Path, content: Bytes) -> Result<T, BoxError>;
}

impl<T, E, F> Compiler<T> for F
where
    F: Fn(&Path, Bytes) -> Result<T, E> + Send + Sync,
    E: Into<BoxError>,
{
    fn compile(&self, path: &Path, content: Bytes) -> Result<T, BoxError> {
        self(path, content).map_err(Into::into)
    }
}

// =============================================================================
// Compiled Artifact
// =============================================================================

/// An artifact together with the file it was compiled from.
///
/// The source path and the modification time observed before reading are
/// part of the same value, so they can never disagree with the artifact.
#[derive(Debug)]
pub struct Compiled<T> {
    path: PathBuf,
    modified: SystemTime,
    artifact: T,
}

impl<T> Compiled<T> {
    pub(crate) fn new(path: PathBuf, modified: SystemTime, artifact: T) -> Self {
        Self {
            path,
            modified,
            artifact,
        }
    }

    /// Path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Modification time of the source file when it was compiled.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn artifact(&self) -> &T {
        &self.artifact
    }
}

impl<T> Deref for Compiled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.artifact
    }
}

// =============================================================================
// Layer Config Compiler
// =============================================================================

/// Compiles JSON layer configuration files into [`TileLayerConfig`] values.
///
/// Loading goes through the persisted record, so legacy fields are migrated
/// before the artifact is published.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerConfigCompiler;

impl Compiler<TileLayerConfig> for LayerConfigCompiler {
    fn compile(&self, _path: &Path, content: Bytes) -> Result<TileLayerConfig, BoxError> {
        Ok(serde_json::from_slice(&content)?)
    }
}
