//! Shapes and formatting for CLI output, including the `--json` views.

use recast_engine::{Artifact, Category, EngineError, FileClass, JobState};
use serde::Serialize;

/// JSON view of a validation outcome. Mirrors what the engine reports:
/// either a classification or a single user-facing error.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub category: Option<Category>,
    pub extension: Option<String>,
    /// Legal conversion targets, display order.
    pub targets: Vec<String>,
}

impl ValidationReport {
    pub fn ok(class: &FileClass, targets: &[&str]) -> Self {
        Self {
            valid: true,
            error: None,
            category: Some(class.category),
            extension: Some(class.extension.clone()),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn err(error: &EngineError) -> Self {
        // A mismatch still carries the category the extension resolved
        // to; the other error kinds never got that far.
        let category = match error {
            EngineError::MimeMismatch { category, .. } => Some(*category),
            _ => None,
        };
        Self {
            valid: false,
            error: Some(error.to_string()),
            category,
            extension: None,
            targets: Vec::new(),
        }
    }
}

/// JSON view of a finished conversion.
#[derive(Debug, Serialize)]
pub struct ConversionReport {
    pub state: JobState,
    pub file_name: String,
    pub mime_type: String,
    pub original_size: u64,
    pub converted_size: u64,
    /// Positive when the artifact shrank, percent of the original.
    pub compression_ratio: f64,
    pub transcoder: &'static str,
}

impl ConversionReport {
    pub fn succeeded(artifact: &Artifact, transcoder: &'static str) -> Self {
        Self {
            state: JobState::Succeeded,
            file_name: artifact.file_name.clone(),
            mime_type: artifact.mime_type.clone(),
            original_size: artifact.original_size,
            converted_size: artifact.converted_size,
            compression_ratio: (artifact.compression_ratio() * 10.0).round() / 10.0,
            transcoder,
        }
    }
}

/// Human-readable size, e.g. `0 Bytes`, `1 KB`, `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let mut text = format!("{value:.2}");
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{text} {}", UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_boundaries() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(1), "1 Bytes");
        assert_eq!(format_size(1023), "1023 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5 GB");
    }

    #[test]
    fn format_size_keeps_two_decimals_at_most() {
        // 1.333... MB rounds to 1.33.
        assert_eq!(format_size(1398101), "1.33 MB");
    }

    #[test]
    fn validation_report_shapes() {
        let class = FileClass { category: Category::Image, extension: "png".into() };
        let ok = ValidationReport::ok(&class, &["jpg", "webp"]);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["valid"], true);
        assert_eq!(json["category"], "image");
        assert_eq!(json["targets"][1], "webp");
        assert!(json.get("error").is_none());

        let err = ValidationReport::err(&EngineError::UnsupportedType { extension: "exe".into() });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["error"], "Unsupported file type: .exe");
        assert_eq!(json["category"], serde_json::Value::Null);
    }

    #[test]
    fn mismatch_report_keeps_the_resolved_category() {
        let err = ValidationReport::err(&EngineError::MimeMismatch {
            category: Category::Document,
            declared_mime: "image/png".into(),
        });
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["category"], "document");
        assert_eq!(
            json["error"],
            "File type mismatch. Expected document file but got image/png"
        );
    }
}
