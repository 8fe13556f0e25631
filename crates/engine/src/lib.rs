//! recast-engine: file classification and conversion core.
//!
//! The engine decides what a file *is* (extension, declared MIME type
//! and byte-signature sniffing), which target formats it may legally be
//! converted to, and runs conversions as cancellable async jobs with
//! monotonic progress reporting.
//!
//! All lookup tables are built once and shared immutably; an [`Engine`]
//! is cheap to clone and safe to use from any number of tasks.

pub mod authorize;
pub mod classify;
mod error;
pub mod pipeline;
pub mod registry;
pub mod sniff;

use std::sync::Arc;

pub use crate::classify::FileClass;
pub use crate::error::EngineError;
pub use crate::pipeline::{Artifact, JobHandle, JobState, PassthroughTranscoder, SourceFile, Transcoder};
pub use crate::registry::{Category, TypeRegistry};

/// Facade over the registry, classifier, authorizer and pipeline.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<TypeRegistry>,
    transcoder: Arc<dyn Transcoder>,
}

impl Engine {
    /// Engine with the built-in registry and the passthrough
    /// transcoder (bytes are rewrapped, not re-encoded).
    pub fn new() -> Self {
        Self::with_transcoder(Arc::new(PassthroughTranscoder))
    }

    /// Engine with a custom transcoder (the seam for real codecs).
    pub fn with_transcoder(transcoder: Arc<dyn Transcoder>) -> Self {
        Self { registry: Arc::new(TypeRegistry::builtin()), transcoder }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn transcoder_name(&self) -> &'static str {
        self.transcoder.name()
    }

    /// Classify and validate a selected file. See [`classify::validate`]
    /// for the precedence rules.
    pub fn validate_file(
        &self,
        file_name: &str,
        declared_mime: &str,
        bytes: &[u8],
    ) -> Result<FileClass, EngineError> {
        classify::validate(&self.registry, file_name, declared_mime, bytes)
    }

    /// Legal conversion targets for `extension`, in display order.
    pub fn legal_targets(&self, extension: &str) -> &'static [&'static str] {
        self.registry.legal_targets(extension)
    }

    /// Start a conversion job.
    ///
    /// Re-runs [`authorize::authorize`] on the pair, regardless of any
    /// filtering the caller did, and only spawns the job when the
    /// authoritative gate passes.
    pub fn convert(
        &self,
        source: SourceFile,
        target_extension: &str,
    ) -> Result<JobHandle, EngineError> {
        let source_extension = classify::extension_of(&source.name);
        authorize::authorize(&self.registry, &source_extension, target_extension)?;
        Ok(pipeline::spawn(
            self.registry.clone(),
            self.transcoder.clone(),
            source,
            target_extension.to_lowercase(),
        ))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
