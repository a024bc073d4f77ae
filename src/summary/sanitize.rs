//! Normalization and allow-list sanitization of generated summary text.
//!
//! The collaborator is instructed to answer in `<p>`/`<b>` HTML, but its
//! output is never trusted: markdown bold is converted, bare text is wrapped
//! into paragraphs, and every tag outside the allow-list is stripped
//! regardless of attributes or casing.

/// Converts raw model output into text constrained to `<p>` and `<b>` tags.
pub fn to_constrained_html(raw: &str) -> String {
    let bolded = convert_markdown_bold(raw);
    let paragraphs = ensure_paragraphs(&bolded);
    strip_disallowed_tags(&paragraphs)
}

/// Rewrites `**term**` spans as `<b>term</b>`. An unmatched opener is left
/// in place as literal text.
fn convert_markdown_bold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str("<b>");
        out.push_str(&after[..end]);
        out.push_str("</b>");
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Wraps blank-line-separated blocks in `<p>` when the text carries no
/// paragraph markup of its own, collapsing internal whitespace per block.
fn ensure_paragraphs(text: &str) -> String {
    let lower = text.to_ascii_lowercase();
    if lower.contains("<p>") || lower.contains("<p ") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut block: Vec<&str> = Vec::new();

    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                let joined = block.join(" ");
                let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    out.push_str("<p>");
                    out.push_str(&collapsed);
                    out.push_str("</p>");
                }
                block.clear();
            }
        } else {
            block.push(line);
        }
    }

    out
}

/// Strict allow-list pass: only bare `<p>`, `</p>`, `<b>`, `</b>` survive.
/// Any other markup, and any attributes on allowed tags, are removed; text
/// content is kept.
fn strip_disallowed_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('>') {
            // A stray '<' never closed: drop the bracket, keep the text.
            None => {
                rest = after;
            }
            Some(end) => {
                if let Some(tag) = allowed_tag(&after[..end]) {
                    out.push_str(tag);
                }
                rest = &after[end + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn allowed_tag(body: &str) -> Option<&'static str> {
    let trimmed = body.trim();
    let (closing, name_part) = match trimmed.strip_prefix('/') {
        Some(name) => (true, name),
        None => (false, trimmed),
    };
    let name: String = name_part
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    let remainder = &name_part[name.len()..];
    if !remainder.is_empty() && !remainder.starts_with([' ', '\t', '\n']) {
        return None;
    }

    // The remainder of the tag body (attributes, styles) is discarded.
    match (name.as_str(), closing) {
        ("p", false) => Some("<p>"),
        ("p", true) => Some("</p>"),
        ("b", false) => Some("<b>"),
        ("b", true) => Some("</b>"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_bold_becomes_b_tags() {
        assert_eq!(
            convert_markdown_bold("a **strong** word"),
            "a <b>strong</b> word"
        );
    }

    #[test]
    fn unmatched_bold_marker_is_literal() {
        assert_eq!(convert_markdown_bold("a **dangling"), "a **dangling");
    }

    #[test]
    fn bare_text_is_wrapped_into_paragraphs() {
        let html = to_constrained_html("First block\nstill first.\n\nSecond   block.");
        assert_eq!(html, "<p>First block still first.</p><p>Second block.</p>");
    }

    #[test]
    fn existing_paragraphs_are_not_rewrapped() {
        let html = to_constrained_html("<p>one</p><p>two</p>");
        assert_eq!(html, "<p>one</p><p>two</p>");
    }

    #[test]
    fn attributes_on_allowed_tags_are_dropped() {
        let html = to_constrained_html("<p class=\"x\" style=\"y\">hi <b id=\"z\">there</b></p>");
        assert_eq!(html, "<p>hi <b>there</b></p>");
    }

    #[test]
    fn disallowed_markup_is_stripped() {
        let html = to_constrained_html(
            "<p><script>alert('x')</script><i>em</i> <a href=\"evil\">link</a></p>",
        );
        assert_eq!(html, "<p>alert('x')em link</p>");
    }

    #[test]
    fn uppercase_tags_are_normalized() {
        assert_eq!(to_constrained_html("<P>Hi <B>yo</B></P>"), "<p>Hi <b>yo</b></p>");
    }

    #[test]
    fn stray_angle_bracket_never_leaks_markup() {
        // "< 2</p" reads as one malformed tag and is dropped wholesale; the
        // allow-list errs on removal over preservation.
        assert_eq!(to_constrained_html("<p>1 < 2</p>"), "<p>1 ");
        assert_eq!(to_constrained_html("unclosed <p tag"), "unclosed p tag");
    }

    #[test]
    fn pre_is_not_mistaken_for_p() {
        assert_eq!(to_constrained_html("<p><pre>code</pre></p>"), "<p>code</p>");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(to_constrained_html(""), "");
        assert_eq!(to_constrained_html("   \n  "), "");
    }
}
