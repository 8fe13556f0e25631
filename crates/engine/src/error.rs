//! Engine error kinds. Callers branch on the variant; the `Display`
//! strings are the user-facing messages shown by the CLI.

use thiserror::Error;

use crate::registry::Category;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Extension not present in the type registry.
    #[error("Unsupported file type: .{extension}")]
    UnsupportedType { extension: String },

    /// Declared MIME type contradicts both the registry and the sniffed
    /// byte signature.
    #[error("File type mismatch. Expected {category} file but got {declared_mime}")]
    MimeMismatch {
        category: Category,
        declared_mime: String,
    },

    /// Source and target extensions resolve to different categories
    /// (an unresolvable side is formatted as "unknown").
    #[error("Cannot convert between different file types: {from} to {to}")]
    CrossCategoryConversion { from: String, to: String },

    /// Same category, but the pair is not in the conversion matrix.
    #[error("Conversion from {from} to {to} is not supported")]
    UnlistedConversion { from: String, to: String },

    /// The transformation step itself failed.
    #[error("Conversion failed: {0}")]
    PipelineFailure(anyhow::Error),

    /// The job was cancelled before it produced a result.
    #[error("Conversion cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_user_facing_wording() {
        let e = EngineError::UnsupportedType { extension: "exe".into() };
        assert_eq!(e.to_string(), "Unsupported file type: .exe");

        let e = EngineError::MimeMismatch {
            category: Category::Document,
            declared_mime: "text/plain".into(),
        };
        assert_eq!(e.to_string(), "File type mismatch. Expected document file but got text/plain");

        let e = EngineError::CrossCategoryConversion {
            from: "archive".into(),
            to: "document".into(),
        };
        assert_eq!(
            e.to_string(),
            "Cannot convert between different file types: archive to document"
        );

        let e = EngineError::UnlistedConversion { from: "mp3".into(), to: "mp3".into() };
        assert_eq!(e.to_string(), "Conversion from mp3 to mp3 is not supported");
    }
}
