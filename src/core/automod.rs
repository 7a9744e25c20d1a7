//! Link filter used by auto-moderation.

/// Substrings that mark a message as containing a link
const LINK_MARKERS: [&str; 3] = ["http://", "https://", "discord.gg/"];

/// Whether `content` contains a link members without manage-messages may not post.
#[must_use]
pub fn contains_link(content: &str) -> bool {
    let lowered = content.to_lowercase();
    LINK_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_link() {
        assert!(contains_link("see https://example.com"));
        assert!(contains_link("HTTP://EXAMPLE.COM"));
        assert!(contains_link("join discord.gg/abc"));
        assert!(!contains_link("no links here"));
        assert!(!contains_link("discord is fun"));
    }
}
