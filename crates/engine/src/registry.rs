//! Static format registry: which extensions belong to which category,
//! which declared MIME types are acceptable for each category, and the
//! per-extension allow-list of legal conversion targets.
//!
//! The registry is built once at startup ([`TypeRegistry::builtin`]) and
//! never mutated afterwards, so it can be shared by `Arc` across the
//! classifier, authorizer and pipeline without synchronisation.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The five supported file families.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Document,
    Image,
    Audio,
    Video,
    Archive,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Document,
        Category::Image,
        Category::Audio,
        Category::Video,
        Category::Archive,
    ];

    /// User-facing lowercase name, as used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Image => "image",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Archive => "archive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the registry knows about one category.
struct FormatDescriptor {
    category: Category,
    extensions: &'static [&'static str],
    accepted_mime_types: &'static [&'static str],
    /// source extension → ordered legal targets. Order is display order.
    /// No direction is ever inferred: `a → b` being listed says nothing
    /// about `b → a`.
    conversions: &'static [(&'static str, &'static [&'static str])],
}

static FORMATS: &[FormatDescriptor] = &[
    FormatDescriptor {
        category: Category::Document,
        extensions: &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf", "csv", "odt", "ods",
            "odp",
        ],
        accepted_mime_types: &[
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "text/plain",
            "application/rtf",
            "text/csv",
            "application/vnd.oasis.opendocument.text",
            "application/vnd.oasis.opendocument.spreadsheet",
            "application/vnd.oasis.opendocument.presentation",
        ],
        conversions: &[
            ("pdf", &["doc", "docx", "txt"]),
            ("doc", &["pdf", "docx", "txt"]),
            ("docx", &["pdf", "doc", "txt"]),
            ("xls", &["xlsx", "csv", "pdf"]),
            ("xlsx", &["xls", "csv", "pdf"]),
            ("ppt", &["pptx", "pdf"]),
            ("pptx", &["ppt", "pdf"]),
            ("txt", &["pdf", "doc", "docx"]),
        ],
    },
    FormatDescriptor {
        category: Category::Image,
        extensions: &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tiff", "ico"],
        accepted_mime_types: &[
            "image/jpeg",
            "image/png",
            "image/gif",
            "image/bmp",
            "image/webp",
            "image/svg+xml",
            "image/tiff",
            "image/x-icon",
        ],
        conversions: &[
            ("jpg", &["png", "gif", "bmp", "webp", "tiff"]),
            ("jpeg", &["png", "gif", "bmp", "webp", "tiff"]),
            ("png", &["jpg", "jpeg", "gif", "bmp", "webp", "tiff"]),
            ("gif", &["jpg", "jpeg", "png", "bmp", "webp"]),
            ("bmp", &["jpg", "jpeg", "png", "gif", "webp"]),
            ("webp", &["jpg", "jpeg", "png", "gif", "bmp"]),
            ("svg", &["png", "jpg", "jpeg"]),
            ("tiff", &["jpg", "jpeg", "png", "gif"]),
        ],
    },
    FormatDescriptor {
        category: Category::Audio,
        extensions: &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"],
        accepted_mime_types: &[
            "audio/mpeg",
            "audio/wav",
            "audio/flac",
            "audio/aac",
            "audio/ogg",
            "audio/mp4",
            "audio/x-ms-wma",
        ],
        conversions: &[
            ("mp3", &["wav", "flac", "aac", "ogg", "m4a"]),
            ("wav", &["mp3", "flac", "aac", "ogg", "m4a"]),
            ("flac", &["mp3", "wav", "aac", "ogg"]),
            ("aac", &["mp3", "wav", "flac", "ogg"]),
            ("ogg", &["mp3", "wav", "flac", "aac"]),
            ("m4a", &["mp3", "wav", "flac", "aac"]),
        ],
    },
    FormatDescriptor {
        category: Category::Video,
        extensions: &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v"],
        accepted_mime_types: &[
            "video/mp4",
            "video/x-msvideo",
            "video/x-matroska",
            "video/quicktime",
            "video/x-ms-wmv",
            "video/x-flv",
            "video/webm",
        ],
        conversions: &[
            ("mp4", &["avi", "mkv", "mov", "wmv", "webm"]),
            ("avi", &["mp4", "mkv", "mov", "wmv", "webm"]),
            ("mkv", &["mp4", "avi", "mov", "wmv", "webm"]),
            ("mov", &["mp4", "avi", "mkv", "wmv", "webm"]),
            ("wmv", &["mp4", "avi", "mkv", "mov", "webm"]),
            ("webm", &["mp4", "avi", "mkv", "mov"]),
        ],
    },
    FormatDescriptor {
        category: Category::Archive,
        extensions: &["zip", "7z", "tar", "gz", "bz2", "xz"],
        accepted_mime_types: &[
            "application/zip",
            "application/x-7z-compressed",
            "application/x-tar",
            "application/gzip",
            "application/x-bzip2",
            "application/x-xz",
        ],
        conversions: &[
            ("zip", &["7z", "tar", "gz"]),
            ("7z", &["zip", "tar", "gz"]),
            ("tar", &["zip", "7z", "gz"]),
            ("gz", &["zip", "7z", "tar"]),
        ],
    },
];

/// Extension → MIME type used to tag result artifacts. Anything not
/// listed here falls back to `application/octet-stream`.
static MIME_BY_EXT: &[(&str, &str)] = &[
    // Documents
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xls", "application/vnd.ms-excel"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    // Images
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("tiff", "image/tiff"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("m4a", "audio/mp4"),
    // Video
    ("mp4", "video/mp4"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("wmv", "video/x-ms-wmv"),
    ("webm", "video/webm"),
    // Archives
    ("zip", "application/zip"),
    ("7z", "application/x-7z-compressed"),
    ("tar", "application/x-tar"),
    ("gz", "application/gzip"),
];

pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Immutable lookup tables derived from [`FORMATS`] / [`MIME_BY_EXT`].
///
/// Build once with [`TypeRegistry::builtin`] and share by `Arc`.
pub struct TypeRegistry {
    category_by_ext: HashMap<&'static str, Category>,
    targets_by_ext: HashMap<&'static str, &'static [&'static str]>,
    mime_by_ext: HashMap<&'static str, &'static str>,
}

impl TypeRegistry {
    /// Build the registry from the built-in format tables.
    pub fn builtin() -> Self {
        let mut category_by_ext = HashMap::new();
        let mut targets_by_ext = HashMap::new();

        for desc in FORMATS {
            for ext in desc.extensions {
                let previous = category_by_ext.insert(*ext, desc.category);
                // Every extension belongs to exactly one category.
                assert!(
                    previous.is_none(),
                    "extension '{ext}' registered under two categories"
                );
            }
            for (source, targets) in desc.conversions {
                targets_by_ext.insert(*source, *targets);
            }
        }

        Self {
            category_by_ext,
            targets_by_ext,
            mime_by_ext: MIME_BY_EXT.iter().copied().collect(),
        }
    }

    /// Category owning `extension`, or `None` if unknown.
    /// Matching is case-insensitive.
    pub fn category_of(&self, extension: &str) -> Option<Category> {
        self.category_by_ext
            .get(extension.to_lowercase().as_str())
            .copied()
    }

    /// Declared MIME types accepted for files of `category`.
    pub fn accepted_mime_types(&self, category: Category) -> &'static [&'static str] {
        descriptor(category).accepted_mime_types
    }

    /// Extensions recognised as members of `category`, in display order.
    pub fn extensions(&self, category: Category) -> &'static [&'static str] {
        descriptor(category).extensions
    }

    /// Legal conversion targets for `source_extension`, in display
    /// order. Empty when the extension is unknown or has no listed
    /// conversions.
    pub fn legal_targets(&self, source_extension: &str) -> &'static [&'static str] {
        self.targets_by_ext
            .get(source_extension.to_lowercase().as_str())
            .copied()
            .unwrap_or(&[])
    }

    /// MIME type to declare on a converted artifact with `extension`.
    pub fn mime_for(&self, extension: &str) -> &'static str {
        self.mime_by_ext
            .get(extension.to_lowercase().as_str())
            .copied()
            .unwrap_or(FALLBACK_MIME)
    }
}

fn descriptor(category: Category) -> &'static FormatDescriptor {
    FORMATS
        .iter()
        .find(|d| d.category == category)
        .expect("all categories have a descriptor")
}
