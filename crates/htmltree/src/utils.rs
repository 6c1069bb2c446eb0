//! Whitespace utilities
//!
//! Whitespace here means HTML ASCII whitespace: space, tab, LF, FF, CR.

/// HTML ASCII whitespace test
pub fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

/// True for empty strings and strings made only of whitespace
pub fn is_whitespace_only(text: &str) -> bool {
    text.chars().all(is_html_whitespace)
}

/// Text mode: trim, then turn every internal whitespace run into one space
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split(is_html_whitespace).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Markup mode: trim, delete whitespace runs that sit between `>` and `<`,
/// collapse every other run to a single space
///
/// ```
/// use htmltree::normalize_whitespace;
///
/// assert_eq!(
///     normalize_whitespace("  <div>  <p>a   b</p>\n</div> "),
///     "<div><p>a b</p></div>"
/// );
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    let trimmed = text.trim_matches(is_html_whitespace);
    let mut out = String::with_capacity(trimmed.len());
    let mut chars = trimmed.chars().peekable();

    while let Some(c) = chars.next() {
        if !is_html_whitespace(c) {
            out.push(c);
            continue;
        }

        while chars.next_if(|&n| is_html_whitespace(n)).is_some() {}

        // Input is trimmed, so a run always has a character on both sides
        let before = out.chars().next_back();
        let after = chars.peek().copied();
        if before == Some('>') && after == Some('<') {
            continue;
        }
        out.push(' ');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_only() {
        assert!(is_whitespace_only(""));
        assert!(is_whitespace_only(" \t\r\n\x0C"));
        assert!(!is_whitespace_only(" x "));
        // NBSP is content, not whitespace
        assert!(!is_whitespace_only("\u{a0}"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  hello \n\t world  "), "hello world");
        assert_eq!(collapse_whitespace("one"), "one");
        assert_eq!(collapse_whitespace("   "), "");
        // Tag boundaries mean nothing in text mode
        assert_eq!(collapse_whitespace("> <"), "> <");
    }

    #[test]
    fn test_tag_boundary_runs_are_deleted() {
        assert_eq!(
            normalize_whitespace("<div>  <p>x   y</p>  </div>"),
            "<div><p>x y</p></div>"
        );
    }

    #[test]
    fn test_runs_next_to_text_collapse() {
        assert_eq!(
            normalize_whitespace("<b>bold</b>   and  <i>it</i>"),
            "<b>bold</b> and <i>it</i>"
        );
        assert_eq!(normalize_whitespace("<p> x </p>"), "<p> x </p>");
    }

    #[test]
    fn test_trims_input() {
        assert_eq!(normalize_whitespace("\n\t  a  \r\n"), "a");
        assert_eq!(normalize_whitespace("    "), "");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            "   ",
            "plain   text",
            "<div>  <p>x</p>  </div>",
            " < >  <> >< \t<a>\n\n</a> ",
            "<pre>  keep?  </pre>   <span> s </span>",
            "ü  \u{a0}  é",
        ];
        for s in samples {
            let once = normalize_whitespace(s);
            assert_eq!(normalize_whitespace(&once), once, "input {s:?}");
        }
    }
}
