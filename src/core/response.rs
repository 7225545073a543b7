//! Discord message size helpers
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add code block wrapping for program output
//! - 1.0.0: UTF-8 safe truncation for replies and embed fields

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Discord embed field value limit
pub const FIELD_LIMIT: usize = 1024;

/// Truncate to `limit` bytes on a char boundary, ending with "..." when cut
pub fn truncate_to(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit.saturating_sub(3);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

pub fn truncate_for_message(text: &str) -> String {
    truncate_to(text, MESSAGE_LIMIT)
}

pub fn truncate_for_field(text: &str) -> String {
    truncate_to(text, FIELD_LIMIT)
}

/// Wrap program output in a code block that still fits one message
pub fn code_block(output: &str) -> String {
    // ``` + newline on each side
    const FENCE_OVERHEAD: usize = 8;
    let body = output.replace("```", "`\u{200b}``");
    let body = truncate_to(body.trim_end(), MESSAGE_LIMIT - FENCE_OVERHEAD);
    if body.is_empty() {
        return "```\n(no output)\n```".to_string();
    }
    format!("```\n{body}\n```")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_for_message("pong"), "pong");
    }

    #[test]
    fn test_long_text_truncated_with_ellipsis() {
        let result = truncate_for_message(&"a".repeat(3000));
        assert_eq!(result.len(), MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_utf8() {
        let text = "世界".repeat(1000);
        let result = truncate_to(&text, 100);
        assert!(result.len() <= 100);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_code_block_fits_message() {
        let block = code_block(&"line\n".repeat(1000));
        assert!(block.len() <= MESSAGE_LIMIT);
        assert!(block.starts_with("```\n"));
        assert!(block.ends_with("\n```"));
    }

    #[test]
    fn test_code_block_empty_output() {
        assert_eq!(code_block("  \n"), "```\n(no output)\n```");
    }

    #[test]
    fn test_code_block_escapes_fences() {
        let block = code_block("before ``` after");
        assert_eq!(block.matches("```").count(), 2);
    }
}
