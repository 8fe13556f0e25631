//! Byte-signature sniffing: identify a file's format from its leading
//! bytes, independent of its name or declared MIME type.
//!
//! The table is an ordered list of (prefix, extension) pairs and lookup
//! is first-prefix-match-wins over at most the first 8 bytes.
//!
//! Known limitation: several container formats share a prefix. RIFF
//! (`52 49 46 46`) fronts webp, wav and avi; the zip local-file header
//! (`50 4B 03 04`) fronts docx and zip. Only one registration of a
//! duplicated prefix is reachable, so RIFF always sniffs as `avi` and
//! zip containers always sniff as `zip`. This is an accepted
//! ambiguity: resolving it would require inspecting bytes past the
//! shared marker, which this sniffer deliberately does not do.

/// Bytes of the header that participate in matching. Callers only need
/// to supply this many bytes; anything extra is ignored.
pub const SNIFF_LEN: usize = 8;

/// Ordered signature table. First match wins; shadowed duplicates are
/// kept so the ambiguity stays visible.
static SIGNATURES: &[(&[u8], &str)] = &[
    // Images
    (&[0xFF, 0xD8, 0xFF], "jpg"),
    (&[0x89, 0x50, 0x4E, 0x47], "png"),
    (b"GIF8", "gif"),
    (&[0x42, 0x4D], "bmp"),
    // Documents
    (b"%PDF", "pdf"),
    (&[0xD0, 0xCF, 0x11, 0xE0], "doc"),
    // Audio
    (&[0xFF, 0xF3], "mp3"),
    (&[0xFF, 0xF2], "mp3"),
    (b"fLaC", "flac"),
    // Video
    (b"ftyp", "mp4"),
    (b"RIFF", "avi"),
    (&[0x1A, 0x45, 0xDF, 0xA3], "mkv"),
    // Archives
    (&[0x50, 0x4B, 0x03, 0x04], "zip"),
    (&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C], "7z"),
    (&[0x1F, 0x8B], "gz"),
    // Shadowed registrations. RIFF resolves to avi and the zip header
    // to zip above; these stay in the table so the ambiguity is
    // visible, but they can never match.
    (b"RIFF", "webp"),
    (b"RIFF", "wav"),
    (&[0x50, 0x4B, 0x03, 0x04], "docx"),
];

/// Return the extension of the first signature whose prefix matches the
/// start of `header`, or `None` when no known signature matches.
pub fn sniff(header: &[u8]) -> Option<&'static str> {
    let header = &header[..header.len().min(SNIFF_LEN)];
    SIGNATURES
        .iter()
        .find(|(prefix, _)| header.starts_with(prefix))
        .map(|(_, ext)| *ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]), Some("png"));
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
        assert_eq!(sniff(b"%PDF-1.7\n"), Some("pdf"));
        assert_eq!(sniff(b"GIF89a"), Some("gif"));
        assert_eq!(sniff(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]), Some("mkv"));
        assert_eq!(sniff(&[0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C, 0x00, 0x04]), Some("7z"));
        assert_eq!(sniff(&[0x1F, 0x8B, 0x08]), Some("gz"));
    }

    #[test]
    fn short_prefixes_match() {
        // bmp and gz signatures are only two bytes.
        assert_eq!(sniff(&[0x42, 0x4D]), Some("bmp"));
        assert_eq!(sniff(&[0xFF, 0xF3]), Some("mp3"));
    }

    #[test]
    fn header_shorter_than_signature_does_not_match() {
        assert_eq!(sniff(&[0x89, 0x50]), None);
        assert_eq!(sniff(&[]), None);
    }

    #[test]
    fn unknown_bytes_yield_none() {
        assert_eq!(sniff(b"hello world"), None);
        assert_eq!(sniff(&[0x00; 8]), None);
    }

    #[test]
    fn riff_ambiguity_resolves_to_avi() {
        // wav and webp headers also start with RIFF, but only the avi
        // registration is reachable.
        assert_eq!(sniff(b"RIFF$\x00\x00\x00WAVEfmt "), Some("avi"));
        assert_eq!(sniff(b"RIFF\x1a\x00\x00\x00WEBPVP8 "), Some("avi"));
    }

    #[test]
    fn zip_container_ambiguity_resolves_to_zip() {
        // docx shares the zip local-file header; the zip registration
        // is the reachable one.
        assert_eq!(sniff(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00]), Some("zip"));
    }

    #[test]
    fn only_first_eight_bytes_considered() {
        // 7z marker starting at offset 0 matches even with trailing noise...
        let mut buf = vec![0x37, 0x7A, 0xBC, 0xAF, 0x27, 0x1C];
        buf.extend_from_slice(&[0xAA; 32]);
        assert_eq!(sniff(&buf), Some("7z"));
        // ...but a marker buried past the start never matches.
        let mut shifted = vec![0x00, 0x00];
        shifted.extend_from_slice(b"%PDF");
        assert_eq!(sniff(&shifted), None);
    }
}
