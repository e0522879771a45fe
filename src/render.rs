//! Render-time formatting of saved articles for the terminal.
//!
//! Stored values are never touched: timestamps are formatted and remote text
//! is cleaned only on the way to the screen.
use chrono::{DateTime, NaiveDate};
use std::borrow::Cow;
use std::fmt::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::storage::Article;

/// Shown instead of the list when nothing is saved
pub const EMPTY_LIST: &str = "No saved articles";

const ELLIPSIS: &str = "...";

/// Format an ISO-8601 `publishedAt` value with a chrono format string.
///
/// Full RFC 3339 timestamps and bare `YYYY-MM-DD` dates are understood.
/// Anything else, or a format string chrono rejects, yields the stored text
/// unchanged.
pub fn format_published<'a>(published_at: &'a str, format: &str) -> Cow<'a, str> {
    let mut out = String::new();
    let written = if let Ok(dt) = DateTime::parse_from_rfc3339(published_at) {
        write!(out, "{}", dt.format(format))
    } else if let Ok(date) = NaiveDate::parse_from_str(published_at, "%Y-%m-%d") {
        write!(out, "{}", date.format(format))
    } else {
        return Cow::Borrowed(published_at);
    };

    match written {
        Ok(()) => Cow::Owned(out),
        Err(_) => {
            tracing::debug!(format = %format, "Unusable date format, showing raw timestamp");
            Cow::Borrowed(published_at)
        }
    }
}

/// Remove terminal control characters and ANSI escape sequences from
/// remote text. Tabs and newlines become spaces so one field stays on one
/// line.
pub fn clean_text(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c.is_control()) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                // CSI: parameters until a final byte in 0x40..=0x7e
                Some('[') => {
                    chars.next();
                    for n in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&n) {
                            break;
                        }
                    }
                }
                // OSC: until BEL or ESC-backslash
                Some(']') => {
                    chars.next();
                    while let Some(n) = chars.next() {
                        if n == '\x07' {
                            break;
                        }
                        if n == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\t' | '\n' | '\r' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Cut `s` to at most `max_width` terminal columns, ending in "..." when
/// something was dropped. Widths of 3 or less get no ellipsis.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width > ELLIPSIS.len() {
        max_width - ELLIPSIS.len()
    } else {
        max_width
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    if max_width > ELLIPSIS.len() {
        Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
    } else {
        Cow::Owned(s[..end].to_string())
    }
}

/// Render the saved list as plain text lines for a terminal `width` wide.
pub fn render_list(articles: &[Article], width: usize, date_format: &str) -> String {
    if articles.is_empty() {
        return format!("{EMPTY_LIST}\n");
    }

    let indent = "  ";
    let inner = width.saturating_sub(indent.len());
    let mut out = String::new();

    for article in articles {
        let title = clean_text(&article.title);
        let _ = writeln!(out, "{}", truncate_to_width(&title, width));

        if let Some(description) = article.description.as_deref().filter(|d| !d.is_empty()) {
            let description = clean_text(description);
            let _ = writeln!(out, "{indent}{}", truncate_to_width(&description, inner));
        }

        let date = format_published(&article.published_at, date_format);
        let footer = if date.is_empty() {
            clean_text(&article.url).into_owned()
        } else {
            format!("{}  {}", date, clean_text(&article.url))
        };
        let _ = writeln!(out, "{indent}{}", truncate_to_width(&footer, inner));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_article(url: &str, title: &str) -> Article {
        Article {
            url: url.to_string(),
            title: title.to_string(),
            url_to_image: None,
            description: Some("D".to_string()),
            published_at: "2024-03-05T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_format_rfc3339_en_gb() {
        assert_eq!(format_published("2024-03-05T10:00:00Z", "%d/%m/%Y"), "05/03/2024");
        assert_eq!(
            format_published("2024-03-05T23:30:00+02:00", "%Y-%m-%d %H:%M"),
            "2024-03-05 23:30"
        );
    }

    #[test]
    fn test_format_bare_date() {
        assert_eq!(format_published("2024-12-31", "%d/%m/%Y"), "31/12/2024");
    }

    #[test]
    fn test_format_unparseable_is_verbatim() {
        assert_eq!(format_published("yesterday", "%d/%m/%Y"), "yesterday");
        assert_eq!(format_published("", "%d/%m/%Y"), "");
    }

    #[test]
    fn test_format_bad_format_string_is_verbatim() {
        let raw = "2024-03-05T10:00:00Z";
        assert_eq!(format_published(raw, "%Q"), raw);
    }

    #[test]
    fn test_clean_text_passthrough_borrows() {
        assert!(matches!(clean_text("plain title"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_clean_text_strips_escapes() {
        assert_eq!(clean_text("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(clean_text("\x1b]0;title\x07Body"), "Body");
        assert_eq!(clean_text("a\x00b\x7fc"), "abc");
        assert_eq!(clean_text("line\none"), "line one");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_to_width("Short", 10), "Short");
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("你好世界", 7), "你好...");
        assert_eq!(truncate_to_width("Test", 2), "Te");
        assert_eq!(truncate_to_width("Test", 0), "");
    }

    #[test]
    fn test_render_empty_list() {
        assert_eq!(render_list(&[], 80, "%d/%m/%Y"), "No saved articles\n");
    }

    #[test]
    fn test_render_list() {
        let articles = vec![
            test_article("https://x/1", "First"),
            test_article("https://x/2", "Second"),
        ];
        let text = render_list(&articles, 80, "%d/%m/%Y");
        assert_eq!(
            text,
            "First\n  D\n  05/03/2024  https://x/1\n\nSecond\n  D\n  05/03/2024  https://x/2\n\n"
        );
    }

    #[test]
    fn test_render_truncates_long_title() {
        let articles = vec![test_article("https://x/1", "A very long headline indeed")];
        let text = render_list(&articles, 10, "%d/%m/%Y");
        assert!(text.starts_with("A very ...\n"));
    }
}
