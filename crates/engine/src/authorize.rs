//! Conversion authorization: the sole gate in front of the pipeline.
//!
//! The UI filters its format picker through the same registry, but that
//! is display sugar; this check re-runs immediately before a job
//! starts and is the authoritative decision.

use tracing::debug;

use crate::error::EngineError;
use crate::registry::{Category, TypeRegistry};

/// Authorize converting a `source_extension` file into
/// `target_extension`.
///
/// Fails with `CrossCategoryConversion` when the extensions resolve to
/// different categories (an unknown extension counts as a mismatch) and
/// with `UnlistedConversion` when the pair is same-category but absent
/// from the allow-list. Pure function of its inputs and the registry.
pub fn authorize(
    registry: &TypeRegistry,
    source_extension: &str,
    target_extension: &str,
) -> Result<(), EngineError> {
    let source_category = registry.category_of(source_extension);
    let target_category = registry.category_of(target_extension);

    let same_category = matches!((source_category, target_category), (Some(a), Some(b)) if a == b);
    if !same_category {
        return Err(EngineError::CrossCategoryConversion {
            from: category_name(source_category),
            to: category_name(target_category),
        });
    }

    let targets = registry.legal_targets(source_extension);
    if !targets.iter().any(|t| t.eq_ignore_ascii_case(target_extension)) {
        return Err(EngineError::UnlistedConversion {
            from: source_extension.to_lowercase(),
            to: target_extension.to_lowercase(),
        });
    }

    debug!(source_extension, target_extension, "conversion authorized");
    Ok(())
}

fn category_name(category: Option<Category>) -> String {
    match category {
        Some(c) => c.label().to_string(),
        None => "unknown".to_string(),
    }
}
