//! JSON syntax highlighting for run output and structured defaults.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::ui::theme::roles::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Whitespace,
    Key,
    String,
    Punctuation,
    Keyword,
    Null,
    Number,
    Other,
}

/// Pretty prints `value` and highlights each line.
pub fn highlight_json_value(value: &Value, theme: &dyn Theme) -> Vec<Line<'static>> {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    pretty
        .lines()
        .map(|line| {
            Line::from(
                tokenize_line(line)
                    .into_iter()
                    .map(|(kind, token)| Span::styled(token.to_string(), token_style(kind, theme)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

fn token_style(kind: TokenKind, theme: &dyn Theme) -> Style {
    match kind {
        TokenKind::Key => theme.accent_primary_style(),
        TokenKind::String => theme.syntax_string_style(),
        TokenKind::Punctuation => theme.syntax_type_style(),
        TokenKind::Keyword => theme.syntax_keyword_style(),
        TokenKind::Null => theme.text_muted_style(),
        TokenKind::Number => theme.syntax_number_style(),
        TokenKind::Whitespace | TokenKind::Other => theme.text_primary_style(),
    }
}

/// Splits one line of pretty-printed JSON into classified tokens. A string
/// directly followed by `:` is an object key.
fn tokenize_line(line: &str) -> Vec<(TokenKind, &str)> {
    let mut tokens = Vec::new();
    let mut index = 0usize;
    while let Some(character) = line[index..].chars().next() {
        let remaining = &line[index..];
        let (kind, length) = if character.is_whitespace() {
            let end = remaining.find(|candidate: char| !candidate.is_whitespace()).unwrap_or(remaining.len());
            (TokenKind::Whitespace, end)
        } else if character == '"' {
            let length = string_token_length(remaining);
            let is_key = remaining[length..].trim_start().starts_with(':');
            (if is_key { TokenKind::Key } else { TokenKind::String }, length)
        } else if matches!(character, '{' | '}' | '[' | ']' | ':' | ',') {
            (TokenKind::Punctuation, 1)
        } else if let Some(keyword) = ["true", "false"].into_iter().find(|keyword| starts_with_keyword(remaining, keyword)) {
            (TokenKind::Keyword, keyword.len())
        } else if starts_with_keyword(remaining, "null") {
            (TokenKind::Null, 4)
        } else if (character == '-' || character.is_ascii_digit()) && number_length(remaining) > 0 {
            (TokenKind::Number, number_length(remaining))
        } else {
            (TokenKind::Other, character.len_utf8())
        };
        tokens.push((kind, &remaining[..length]));
        index += length;
    }
    tokens
}

fn string_token_length(input: &str) -> usize {
    let mut escaped = false;
    for (offset, byte) in input.bytes().enumerate().skip(1) {
        match byte {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return offset + 1,
            _ => {}
        }
    }
    input.len()
}

fn number_length(input: &str) -> usize {
    input
        .find(|character: char| !(character.is_ascii_digit() || matches!(character, '-' | '+' | '.' | 'e' | 'E')))
        .unwrap_or(input.len())
}

fn starts_with_keyword(input: &str, keyword: &str) -> bool {
    input.strip_prefix(keyword).is_some_and(|rest| {
        rest.chars()
            .next()
            .is_none_or(|character| !character.is_ascii_alphanumeric() && character != '_')
    })
}
