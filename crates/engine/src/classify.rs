//! Classifier/validator: decide what a file *is* from its name, its
//! declared MIME type and (when the declaration is off) its leading
//! byte signature.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::registry::{Category, TypeRegistry};
use crate::sniff;

/// Outcome of a successful validation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileClass {
    pub category: Category,
    /// Lowercased extension the file was classified under.
    pub extension: String,
}

/// Lowercased substring after the last `.` in `file_name`.
///
/// A name without a dot yields the whole name, so `Makefile` is
/// classified as extension `makefile` (and then rejected as
/// unsupported).
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_lowercase()
}

/// Validate a selected file.
///
/// Precedence, in order:
/// 1. the extension must be registered (otherwise `UnsupportedType`);
/// 2. a declared MIME type in the category's accepted set short-circuits
///    to success; the bytes are not inspected at all;
/// 3. otherwise the first [`sniff::SNIFF_LEN`] bytes are sniffed. A
///    sniff equal to the file's extension is valid; *no* sniff match is
///    also valid (plenty of real formats have no recognisable
///    signature); only a confident sniff of a different format fails
///    with `MimeMismatch`.
///
/// Pure and idempotent: same inputs, same result.
pub fn validate(
    registry: &TypeRegistry,
    file_name: &str,
    declared_mime: &str,
    bytes: &[u8],
) -> Result<FileClass, EngineError> {
    let extension = extension_of(file_name);

    let Some(category) = registry.category_of(&extension) else {
        debug!(file_name, %extension, "unsupported extension");
        return Err(EngineError::UnsupportedType { extension });
    };

    if registry.accepted_mime_types(category).contains(&declared_mime) {
        debug!(file_name, %category, declared_mime, "declared MIME accepted");
        return Ok(FileClass { category, extension });
    }

    // Declared MIME is off (absent, generic, or wrong). Let the bytes
    // arbitrate before rejecting.
    match sniff::sniff(bytes) {
        Some(sniffed) if sniffed == extension => {
            debug!(file_name, sniffed, "signature confirms extension");
            Ok(FileClass { category, extension })
        }
        None => {
            // Permissive fallback: an unrecognised signature is not
            // grounds for rejection.
            debug!(file_name, %extension, "no signature match, accepting");
            Ok(FileClass { category, extension })
        }
        Some(sniffed) => {
            warn!(file_name, %extension, sniffed, declared_mime, "signature contradicts extension");
            Err(EngineError::MimeMismatch {
                category,
                declared_mime: declared_mime.to_string(),
            })
        }
    }
}
