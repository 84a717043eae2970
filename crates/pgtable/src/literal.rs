//! Postgres array literal text (`{a,b,"c d"}`).

/// Render elements as a one-dimensional array literal.
pub(crate) fn format_array(elements: &[Option<String>]) -> String {
    let mut out = String::from("{");
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match element {
            None => out.push_str("NULL"),
            Some(s) if needs_quotes(s) => {
                out.push('"');
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }
            Some(s) => out.push_str(s),
        }
    }
    out.push('}');
    out
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("NULL")
        || s
            .chars()
            .any(|c| matches!(c, ',' | '{' | '}' | '"' | '\\') || c.is_whitespace())
}

/// Parse a one-dimensional array literal. Returns `None` when `text` is not braced.
pub(crate) fn parse_array(text: &str) -> Option<Vec<Option<String>>> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut elements = Vec::new();
    if inner.trim().is_empty() {
        return Some(elements);
    }

    let mut chars = inner.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let mut element = String::new();
        let mut quoted = false;
        if chars.peek() == Some(&'"') {
            quoted = true;
            chars.next();
            loop {
                match chars.next() {
                    Some('\\') => element.push(chars.next()?),
                    Some('"') => break,
                    Some(c) => element.push(c),
                    None => return None,
                }
            }
            while chars.peek().is_some_and(|c| *c != ',') {
                chars.next();
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                element.push(c);
                chars.next();
            }
            let trimmed = element.trim_end().len();
            element.truncate(trimmed);
        }

        if !quoted && element.eq_ignore_ascii_case("NULL") {
            elements.push(None);
        } else {
            elements.push(Some(element));
        }

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return None,
        }
    }
    Some(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn formats_plain_and_quoted_elements() {
        let text = format_array(&[s("1"), s("a b"), None, s(r#"x"y"#), s("")]);
        assert_eq!(text, r#"{1,"a b",NULL,"x\"y",""}"#);
    }

    #[test]
    fn empty_literal() {
        assert_eq!(format_array(&[]), "{}");
        assert_eq!(parse_array("{}"), Some(vec![]));
    }

    #[test]
    fn parses_plain_elements() {
        assert_eq!(parse_array("{1,2,3}"), Some(vec![s("1"), s("2"), s("3")]));
    }

    #[test]
    fn parses_quoted_and_null_elements() {
        assert_eq!(
            parse_array(r#"{"a,b",NULL,"NULL","q\"t"}"#),
            Some(vec![s("a,b"), None, s("NULL"), s(r#"q"t"#)])
        );
    }

    #[test]
    fn rejects_unbraced_text() {
        assert_eq!(parse_array("1,2"), None);
        assert_eq!(parse_array(r#"{"open}"#), None);
    }

    #[test]
    fn format_then_parse_preserves_elements() {
        let elements = vec![s("tag one"), s("two"), None, s("{x}")];
        assert_eq!(parse_array(&format_array(&elements)), Some(elements));
    }
}
