//! Managed file naming
//!
//! Files copied into the managed directory are named
//! `<sanitized display name>_<id>.<extension>` so that sounds with identical or
//! conflicting display names never collide.

/// Extension used when neither the display name nor the source has one
pub const FALLBACK_EXTENSION: &str = "m4a";

/// Base name used when sanitizing leaves nothing
const FALLBACK_STEM: &str = "sound";

/// Normalize a display name into a filename stem
///
/// Trims, strips a trailing extension, replaces everything outside
/// `[A-Za-z0-9_-]` with `_`, and lowercases.
pub fn sanitize_file_name(name: &str) -> String {
    let trimmed = name.trim();
    let stem = strip_extension(trimmed);

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        sanitized
    }
}

/// Infer a file extension from a name or URI, ignoring any query string
pub fn infer_extension(uri: &str) -> Option<String> {
    let last_segment = soundboard_core::uri::file_name(uri)?;
    let (_, extension) = last_segment.rsplit_once('.')?;

    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

/// Build the managed filename for a sound
///
/// The extension comes from the display name, then the source URI, then
/// [`FALLBACK_EXTENSION`].
pub fn generate_file_name(display_name: &str, source_uri: Option<&str>, id: &str) -> String {
    let extension = infer_extension(display_name)
        .or_else(|| source_uri.and_then(infer_extension))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());

    format!("{}_{}.{}", sanitize_file_name(display_name), id, extension)
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, extension))
            if !extension.is_empty() && !extension.contains(['/', '\\']) =>
        {
            stem
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Kick Drum.wav"), "kick_drum");
        assert_eq!(sanitize_file_name("  Air Horn!  "), "air_horn_");
        assert_eq!(sanitize_file_name("crash_notso-software.mp3"), "crash_notso-software");
        assert_eq!(sanitize_file_name("über.ogg"), "_ber");
        assert_eq!(sanitize_file_name("archive.tar.gz"), "archive_tar");
        assert_eq!(sanitize_file_name(""), "sound");
        assert_eq!(sanitize_file_name(".wav"), "sound");
    }

    #[test]
    fn test_infer_extension() {
        assert_eq!(infer_extension("kick.WAV").as_deref(), Some("wav"));
        assert_eq!(
            infer_extension("https://host/o/assets%2FCrash.mp3?alt=media&token=abc").as_deref(),
            Some("mp3")
        );
        assert_eq!(infer_extension("file:///tmp/recording").as_deref(), None);
        assert_eq!(infer_extension("weird.").as_deref(), None);
    }

    #[test]
    fn test_generate_file_name() {
        assert_eq!(
            generate_file_name("Kick Drum.wav", Some("file:///tmp/x.mp3"), "1700000000000"),
            "kick_drum_1700000000000.wav"
        );
        // Name without extension falls back to the source
        assert_eq!(
            generate_file_name("Kick Drum", Some("file:///tmp/x.mp3"), "1"),
            "kick_drum_1.mp3"
        );
        assert_eq!(generate_file_name("Recording", None, "1"), "recording_1.m4a");
    }
}
