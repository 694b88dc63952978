//! Safe `{placeholder}` substitution engine.
//!
//! Mirrors the brace syntax of minimal format strings:
//!
//! - `{name}` is replaced by the context value for `name`
//! - `{{` and `}}` render literal braces
//! - `{name!r}` quotes the value, `{name!s}` is the plain value
//! - `{name[0]}` picks a single character of the value
//! - `{name:>20}` / `{name:*^9.3}` apply fill, alignment, width and precision;
//!   the spec may itself contain placeholders (`{name:>{width}}`), one level
//!   deep. Specs nested further are taken literally.
//!
//! Rendering is total. Unknown placeholders become empty strings, a stray
//! `}` is kept literally and an unterminated `{` is emitted as written.

use std::iter::Peekable;
use std::str::Chars;

use super::context::Context;

/// Render `template` against `context`.
pub fn render(template: &str, context: &Context) -> String {
    render_at(template, context, 0)
}

/// `depth` is the spec nesting level; placeholders inside a spec are only
/// expanded at level 0, which bounds recursion regardless of input.
fn render_at(template: &str, context: &Context, depth: usize) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                match take_field(&mut chars) {
                    Ok(field) => out.push_str(&render_field(&field, context, depth)),
                    Err(raw) => {
                        out.push('{');
                        out.push_str(&raw);
                    }
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Consume a field body up to its matching `}`.
///
/// Returns `Err` with the consumed text when the input ends first.
fn take_field(chars: &mut Peekable<Chars<'_>>) -> Result<String, String> {
    let mut field = String::new();
    let mut depth = 0usize;

    for ch in chars.by_ref() {
        match ch {
            '{' => depth += 1,
            '}' if depth == 0 => return Ok(field),
            '}' => depth -= 1,
            _ => {}
        }
        field.push(ch);
    }

    Err(field)
}

fn render_field(field: &str, context: &Context, depth: usize) -> String {
    let name_end = field.find(&['!', ':'][..]).unwrap_or(field.len());
    let (name, mut rest) = field.split_at(name_end);

    let mut value = lookup(name, context);

    if let Some(after_bang) = rest.strip_prefix('!') {
        let conv_end = after_bang.find(':').unwrap_or(after_bang.len());
        let (conversion, remainder) = after_bang.split_at(conv_end);
        if matches!(conversion, "r" | "a") {
            value = quote(&value);
        }
        rest = remainder;
    }

    match rest.strip_prefix(':') {
        Some(spec) if !spec.is_empty() => {
            let spec = if depth == 0 && spec.contains('{') {
                render_at(spec, context, depth + 1)
            } else {
                spec.to_string()
            };
            apply_spec(&value, &FormatSpec::parse(&spec))
        }
        _ => value,
    }
}

/// Resolve a field name with optional `[n]` character indexing.
///
/// Anything other than a run of `[digits]` after the name (attribute access,
/// non-numeric keys, out-of-range indices) yields an empty string.
fn lookup(field_name: &str, context: &Context) -> String {
    let base_end = field_name.find(&['[', '.'][..]).unwrap_or(field_name.len());
    let (name, mut accessors) = field_name.split_at(base_end);
    let mut value = context.get_or_empty(name).to_string();

    while !accessors.is_empty() {
        let index = accessors
            .strip_prefix('[')
            .and_then(|rest| rest.split_once(']'))
            .and_then(|(key, rest)| Some((key.parse::<usize>().ok()?, rest)));

        match index {
            Some((idx, rest)) => {
                value = value.chars().nth(idx).map(String::from).unwrap_or_default();
                accessors = rest;
            }
            None => return String::new(),
        }
    }

    value
}

/// Quote like a repr: single quotes unless the value holds a single quote
/// and no double quote.
fn quote(value: &str) -> String {
    let delimiter = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push(delimiter);
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(ch),
        }
    }
    quoted.push(delimiter);
    quoted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormatSpec {
    fill: char,
    align: Align,
    width: usize,
    precision: Option<usize>,
}

impl FormatSpec {
    /// Lenient parse of `[[fill]align][sign][#][0][width][,][.precision][type]`.
    /// Parts that make no sense for text are skipped.
    fn parse(spec: &str) -> Self {
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec {
            fill: ' ',
            align: Align::Left,
            width: 0,
            precision: None,
        };
        let mut i = 0;
        let mut explicit_fill = false;

        if chars.len() >= 2 && align_of(chars[1]).is_some() {
            parsed.fill = chars[0];
            parsed.align = align_of(chars[1]).unwrap_or(Align::Left);
            explicit_fill = true;
            i = 2;
        } else if let Some(align) = chars.first().copied().and_then(align_of) {
            parsed.align = align;
            i = 1;
        }

        while i < chars.len() && matches!(chars[i], '+' | '-' | ' ' | '#') {
            i += 1;
        }

        if i < chars.len() && chars[i] == '0' {
            if !explicit_fill {
                parsed.fill = '0';
            }
            i += 1;
        }

        let (width, next) = take_number(&chars, i);
        parsed.width = width.unwrap_or(0);
        i = next;

        while i < chars.len() && matches!(chars[i], ',' | '_') {
            i += 1;
        }

        if i < chars.len() && chars[i] == '.' {
            parsed.precision = take_number(&chars, i + 1).0;
        }

        parsed
    }
}

fn align_of(ch: char) -> Option<Align> {
    match ch {
        '<' => Some(Align::Left),
        '>' | '=' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    }
}

fn take_number(chars: &[char], start: usize) -> (Option<usize>, usize) {
    let mut end = start;
    while end < chars.len() && chars[end].is_ascii_digit() {
        end += 1;
    }
    if end == start {
        return (None, start);
    }
    let digits: String = chars[start..end].iter().collect();
    (digits.parse().ok(), end)
}

fn apply_spec(value: &str, spec: &FormatSpec) -> String {
    let truncated: String = match spec.precision {
        Some(precision) => value.chars().take(precision).collect(),
        None => value.to_string(),
    };

    let len = truncated.chars().count();
    if len >= spec.width {
        return truncated;
    }

    let pad = spec.width - len;
    let (left, right) = match spec.align {
        Align::Left => (0, pad),
        Align::Right => (pad, 0),
        Align::Center => (pad / 2, pad - pad / 2),
    };

    let fill = |n: usize| std::iter::repeat(spec.fill).take(n);
    fill(left).chain(truncated.chars()).chain(fill(right)).collect()
}
