//! Blog post rendering.

use comrak::{Options, markdown_to_html};

/// Words read per minute when estimating reading time.
const WORDS_PER_MINUTE: usize = 200;

/// Render markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is escaped; posts are written by staff but are
/// still served to every visitor.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    markdown_to_html(content, &options)
}

/// Estimated reading time in whole minutes, at least one.
#[must_use]
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_basic() {
        let html = render_markdown("# Cách đeo lens\n\n**Rửa tay** trước khi đeo.");
        assert!(html.contains("<h1"));
        assert!(html.contains("Cách đeo lens"));
        assert!(html.contains("<strong>Rửa tay</strong>"));
    }

    #[test]
    fn test_render_markdown_escapes_raw_html() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_markdown_tables() {
        let html = render_markdown("| Độ | Giá |\n|---|---|\n| -1.00 | 250k |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"từ ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"từ ".repeat(201)), 2);
        assert_eq!(reading_time_minutes(&"từ ".repeat(1000)), 5);
    }
}
