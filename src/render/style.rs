//! Style-override injection: a three-way fallback — append to `<head>` if
//! present, synthesize a `<head>` under `<html>` if not, or prepend a bare
//! `<style>` block if neither exists.
//!
//! Grounded in the `lol_html` streaming rewriter (as used for structural
//! HTML augmentation elsewhere in this lineage). Which branch to take is
//! decided up front by a cheap substring scan rather than inside the
//! handlers themselves: a streaming rewriter visits `<html>` before it has
//! any chance to see a later `<head>` sibling, so the head/html decision
//! cannot be made mid-stream without buffering the whole document.
//! Mutation itself is always performed by the rewriter, which tolerates
//! malformed markup far better than a raw string insert.

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};

pub fn inject_styles(html: &str, css: Option<&str>) -> String {
    let css = match css {
        Some(c) if !c.trim().is_empty() => c,
        _ => return html.to_string(),
    };

    let lower = html.to_ascii_lowercase();
    let has_head = lower.contains("<head");
    let has_html = lower.contains("<html");

    if !has_head && !has_html {
        return format!("<style>\n{}\n</style>\n{}", css, html);
    }

    let style_tag = format!("<style>{}</style>", css);
    let fallback = || format!("<style>\n{}\n</style>\n{}", css, html);

    let result = if has_head {
        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("head", move |el| {
                    el.append(&style_tag, ContentType::Html);
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        )
    } else {
        let head_block = format!("<head>{}</head>", style_tag);
        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("html", move |el| {
                    el.prepend(&head_block, ContentType::Html);
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        )
    };

    result.unwrap_or_else(|_| fallback())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_overrides_is_a_no_op() {
        let html = "<html><head></head><body></body></html>";
        assert_eq!(inject_styles(html, None), html);
        assert_eq!(inject_styles(html, Some("  ")), html);
    }

    #[test]
    fn appends_into_existing_head() {
        let html = "<html><head><title>t</title></head><body></body></html>";
        let out = inject_styles(html, Some("body{color:red}"));
        assert!(out.contains("<title>t</title>"));
        assert!(out.contains("<style>body{color:red}</style>"));
        let head_end = out.find("</head>").unwrap();
        let style_pos = out.find("<style>").unwrap();
        assert!(style_pos < head_end, "style must land inside <head>");
    }

    #[test]
    fn synthesizes_head_under_html() {
        let html = "<html><body>hi</body></html>";
        let out = inject_styles(html, Some("p{margin:0}"));
        assert!(out.contains("<head><style>p{margin:0}</style></head>"));
        assert!(out.contains("<body>hi</body>"));
    }

    #[test]
    fn prepends_when_neither_head_nor_html_present() {
        let html = "<div>fragment</div>";
        let out = inject_styles(html, Some("div{padding:1px}"));
        assert!(out.starts_with("<style>\ndiv{padding:1px}\n</style>\n"));
        assert!(out.ends_with("<div>fragment</div>"));
    }
}
