//! ASP page to plain script.
//!
//! Markup outside `<% %>` becomes `Response.Write` calls, `<%= x %>` becomes
//! `Response.Write x`, code blocks are copied as they are and `<%@ %>`
//! directives are dropped.

use crate::error::{TranslateError, TranslateResult};

const OPEN: &str = "<%";
const CLOSE: &str = "%>";

/// Whitespace that cannot sit inside a VBScript string literal, longest
/// sequence first.
const SPECIAL_SEQUENCES: &[(&str, &str)] = &[
    ("\r\n\n", "vbCrLf & vbLf"),
    ("\r\n", "vbCrLf"),
    ("\r", "vbCr"),
    ("\n", "vbLf"),
    ("\t", "vbTab"),
    ("\u{b}", "vbVerticalTab"),
    ("\u{c}", "vbFormFeed"),
    ("\0", "vbNullChar"),
];

pub fn to_script(page: &str) -> TranslateResult<String> {
    let mut lines = Vec::new();
    let mut rest = page;
    let mut line = 1;

    while !rest.is_empty() {
        let Some(open) = rest.find(OPEN) else {
            push_markup(&mut lines, rest);
            break;
        };
        push_markup(&mut lines, &rest[..open]);
        line += rest[..open].matches('\n').count();

        let after_open = &rest[open + OPEN.len()..];
        let close = after_open
            .find(CLOSE)
            .ok_or(TranslateError::UnterminatedScriptBlock { line })?;
        let block = &after_open[..close];
        if let Some(expression) = block.strip_prefix('=') {
            lines.push(format!("Response.Write {}", expression.trim()));
        } else if !block.starts_with('@') && !block.trim().is_empty() {
            lines.push(block.to_string());
        }

        line += block.matches('\n').count();
        rest = &after_open[close + CLOSE.len()..];
    }
    Ok(lines.join("\n"))
}

fn push_markup(lines: &mut Vec<String>, markup: &str) {
    if !markup.is_empty() {
        lines.push(format!("Response.Write {}", markup_pieces(markup).join(" & ")));
    }
}

/// Split markup into string literals and the named constants for the
/// characters a literal cannot hold.
fn markup_pieces(markup: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut rest = markup;

    'outer: while let Some(c) = rest.chars().next() {
        for (sequence, constant) in SPECIAL_SEQUENCES {
            if let Some(remaining) = rest.strip_prefix(*sequence) {
                if !text.is_empty() {
                    pieces.push(quote(&text));
                    text.clear();
                }
                pieces.push((*constant).to_string());
                rest = remaining;
                continue 'outer;
            }
        }
        text.push(c);
        rest = &rest[c.len_utf8()..];
    }
    if !text.is_empty() {
        pieces.push(quote(&text));
    }
    pieces
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_script() {
        let test_cases = vec![
            ("<p>Hi</p>", "Response.Write \"<p>Hi</p>\""),
            ("a\r\nb", "Response.Write \"a\" & vbCrLf & \"b\""),
            ("a\r\n\nb", "Response.Write \"a\" & vbCrLf & vbLf & \"b\""),
            ("\t\"q\"", "Response.Write vbTab & \"\"\"q\"\"\""),
            ("<%= name %>", "Response.Write name"),
            ("<%@ Language=VBScript %><b><% x = 1 %></b>", "Response.Write \"<b>\"\n x = 1 \nResponse.Write \"</b>\""),
            ("", ""),
        ];
        for (page, expected) in test_cases {
            assert_eq!(to_script(page).unwrap(), expected, "{page:?}");
        }
    }

    #[test]
    fn test_unterminated_block() {
        let error = to_script("line 1\nline 2 <% x = 1").unwrap_err();
        assert_eq!(error, TranslateError::UnterminatedScriptBlock { line: 2 });
    }
}
