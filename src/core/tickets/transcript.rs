//! Plain-text transcripts written when a ticket is closed.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// UTF-8 byte order mark, so the file opens correctly in editors that guess encodings
const BOM: &str = "\u{feff}";

/// One message in a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    /// When the message was sent
    pub timestamp: DateTime<Utc>,
    /// Display name of the author
    pub author: String,
    /// Message text (attachment URLs appended by the caller)
    pub content: String,
}

/// Renders lines oldest first as `[YYYY-MM-DD HH:MM:SS] author: content`.
///
/// Input order does not matter; lines with the same timestamp keep their relative order.
#[must_use]
pub fn render(lines: &[TranscriptLine]) -> String {
    let mut ordered: Vec<&TranscriptLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.timestamp);

    let mut out = String::new();
    for line in ordered {
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            line.timestamp.format("%Y-%m-%d %H:%M:%S"),
            line.author,
            line.content
        );
    }
    out
}

/// Encodes a rendered transcript for upload.
#[must_use]
pub fn to_bytes(rendered: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(BOM.len() + rendered.len());
    bytes.extend_from_slice(BOM.as_bytes());
    bytes.extend_from_slice(rendered.as_bytes());
    bytes
}

/// Attachment name for a channel's transcript.
#[must_use]
pub fn file_name(channel_name: &str) -> String {
    format!("transcript-{channel_name}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(secs: i64, author: &str, content: &str) -> TranscriptLine {
        TranscriptLine {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap_or_default(),
            author: author.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_render_sorts_oldest_first() {
        let lines = vec![
            line(20, "staff", "how can we help?"),
            line(0, "owner", "hello"),
            line(40, "owner", "thanks"),
        ];

        let text = render(&lines);
        let rendered: Vec<&str> = text.lines().collect();

        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0], "[2023-11-14 22:13:20] owner: hello");
        assert_eq!(rendered[1], "[2023-11-14 22:13:40] staff: how can we help?");
        assert_eq!(rendered[2], "[2023-11-14 22:14:00] owner: thanks");
    }

    #[test]
    fn test_render_empty_channel() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_bytes_carry_bom() {
        let bytes = to_bytes("x");
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"x");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("ticket--004"), "transcript-ticket--004.txt");
    }
}
