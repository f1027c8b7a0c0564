use super::{PathError, PathSegment};
use crate::config::compile_time::paths::{MAX_PATH_EXPRESSION_LENGTH, MAX_PATH_SEGMENTS};

pub(super) fn parse(input: &str) -> Result<Vec<PathSegment>, PathError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    if trimmed.len() > MAX_PATH_EXPRESSION_LENGTH {
        return Err(PathError::TooLong {
            length: trimmed.len(),
            max: MAX_PATH_EXPRESSION_LENGTH,
        });
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;
    let mut after_dot = false;

    while pos < chars.len() {
        match chars[pos] {
            '[' => {
                if after_dot {
                    return Err(PathError::EmptySegment { position: pos });
                }
                let close = find_closing_bracket(&chars, pos)?;
                let content: String = chars[pos + 1..close].iter().collect();
                segments.push(parse_bracket(&content, pos)?);
                pos = close + 1;
                after_dot = consume_separator(&chars, &mut pos)?;
            }
            '.' => return Err(PathError::EmptySegment { position: pos }),
            ']' => {
                return Err(PathError::UnexpectedCharacter {
                    position: pos,
                    found: ']',
                })
            }
            _ => {
                let start = pos;
                while pos < chars.len() && !matches!(chars[pos], '.' | '[' | ']') {
                    pos += 1;
                }
                let key: String = chars[start..pos].iter().collect();
                segments.push(PathSegment::Key(key));
                after_dot = consume_separator(&chars, &mut pos)?;
            }
        }

        if segments.len() > MAX_PATH_SEGMENTS {
            return Err(PathError::TooManySegments {
                count: segments.len(),
                max: MAX_PATH_SEGMENTS,
            });
        }
    }

    if after_dot {
        return Err(PathError::EmptySegment { position: chars.len() });
    }

    Ok(segments)
}

/// Consume a `.` after a segment; returns true when one was consumed
fn consume_separator(chars: &[char], pos: &mut usize) -> Result<bool, PathError> {
    match chars.get(*pos) {
        None | Some('[') => Ok(false),
        Some('.') => {
            *pos += 1;
            Ok(true)
        }
        Some(&found) => Err(PathError::UnexpectedCharacter {
            position: *pos,
            found,
        }),
    }
}

fn find_closing_bracket(chars: &[char], open: usize) -> Result<usize, PathError> {
    let mut quote: Option<char> = None;
    for (offset, &c) in chars[open + 1..].iter().enumerate() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Ok(open + 1 + offset),
            (None, _) => {}
        }
    }
    Err(PathError::UnterminatedBracket { position: open })
}

fn unquote(text: &str) -> Option<&str> {
    let text = text.trim();
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('\'' | '"')), Some(close)) if open == close => {
            let inner = &text[1..text.len() - 1];
            if inner.contains(open) {
                None
            } else {
                Some(inner)
            }
        }
        _ => None,
    }
}

fn parse_bracket(content: &str, position: usize) -> Result<PathSegment, PathError> {
    let invalid = || PathError::InvalidBracket {
        position,
        content: content.to_string(),
    };
    let body = content.trim();

    if body == "*" {
        return Ok(PathSegment::Wildcard);
    }

    if !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()) {
        return body.parse().map(PathSegment::Index).map_err(|_| invalid());
    }

    if let Some(key) = unquote(body) {
        if key.is_empty() {
            return Err(invalid());
        }
        return Ok(PathSegment::Key(key.to_string()));
    }

    if let Some((raw_key, raw_value)) = split_selector(body) {
        let key = unquote(raw_key).unwrap_or(raw_key.trim());
        let value = unquote(raw_value).unwrap_or(raw_value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(invalid());
        }
        return Ok(PathSegment::Select {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    Err(invalid())
}

/// Split `key=value` at the first `=` outside quotes
fn split_selector(body: &str) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (idx, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '=') => return Some((&body[..idx], &body[idx + 1..])),
            (None, _) => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_dotted_keys() {
        assert_eq!(parse("a.b.c").unwrap(), vec![key("a"), key("b"), key("c")]);
    }

    #[test]
    fn test_index_and_wildcard() {
        assert_eq!(
            parse("settings[2].value").unwrap(),
            vec![key("settings"), PathSegment::Index(2), key("value")]
        );
        assert_eq!(
            parse("rules[*]").unwrap(),
            vec![key("rules"), PathSegment::Wildcard]
        );
        assert_eq!(
            parse("matrix[1][0]").unwrap(),
            vec![key("matrix"), PathSegment::Index(1), PathSegment::Index(0)]
        );
    }

    #[test]
    fn test_quoted_keys() {
        assert_eq!(parse("['@odata.type']").unwrap(), vec![key("@odata.type")]);
        assert_eq!(
            parse("root[\"a.b\"].c").unwrap(),
            vec![key("root"), key("a.b"), key("c")]
        );
    }

    #[test]
    fn test_selector() {
        assert_eq!(
            parse("settings[definitionId=device_vendor_msft_x].value").unwrap(),
            vec![
                key("settings"),
                PathSegment::Select {
                    key: "definitionId".to_string(),
                    value: "device_vendor_msft_x".to_string()
                },
                key("value")
            ]
        );
        assert_eq!(
            parse("items['name'='a]b']").unwrap()[1],
            PathSegment::Select {
                key: "name".to_string(),
                value: "a]b".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_paths() {
        assert_matches!(parse(""), Err(PathError::Empty));
        assert_matches!(parse("   "), Err(PathError::Empty));
        assert_matches!(parse("a..b"), Err(PathError::EmptySegment { position: 2 }));
        assert_matches!(parse(".a"), Err(PathError::EmptySegment { position: 0 }));
        assert_matches!(parse("a."), Err(PathError::EmptySegment { .. }));
        assert_matches!(parse("a.[0]"), Err(PathError::EmptySegment { .. }));
        assert_matches!(parse("a[0"), Err(PathError::UnterminatedBracket { position: 1 }));
        assert_matches!(parse("a[]"), Err(PathError::InvalidBracket { .. }));
        assert_matches!(parse("a[x]"), Err(PathError::InvalidBracket { .. }));
        assert_matches!(parse("a[0]b"), Err(PathError::UnexpectedCharacter { found: 'b', .. }));
        assert_matches!(parse("a]"), Err(PathError::UnexpectedCharacter { found: ']', .. }));
    }

    #[test]
    fn test_limits() {
        let long = "a".repeat(MAX_PATH_EXPRESSION_LENGTH + 1);
        assert_matches!(parse(&long), Err(PathError::TooLong { .. }));

        let deep = vec!["k"; MAX_PATH_SEGMENTS + 1].join(".");
        assert_matches!(parse(&deep), Err(PathError::TooManySegments { .. }));
    }
}
