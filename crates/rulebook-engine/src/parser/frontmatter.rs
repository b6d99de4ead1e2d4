//! `---` delimited metadata block at the top of a rule file

use crate::compiler::errors::ErrorKind;
use crate::patterns::FRONTMATTER_DELIM;

/// One `key: value` entry with the 1-based line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub value: String,
    pub line: usize,
}

/// Metadata fields plus the untouched remainder of the file
#[derive(Debug)]
pub struct Frontmatter<'a> {
    pub fields: Vec<Field>,
    /// Everything after the closing delimiter line, byte-for-byte
    pub rest: &'a str,
    /// 1-based line number of the first line of `rest`
    pub rest_line: usize,
}

impl Frontmatter<'_> {
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Split the metadata block off the front of `text`.
///
/// Errors carry the 1-based line where the problem was found.
pub fn split(text: &str) -> Result<Frontmatter<'_>, (ErrorKind, usize)> {
    let mut lines = text.split_inclusive('\n');
    let mut offset = 0;

    let first = lines.next().unwrap_or("");
    if first.trim_start_matches('\u{feff}').trim() != FRONTMATTER_DELIM {
        return Err((
            ErrorKind::MalformedMetadata("missing opening `---` line".to_string()),
            1,
        ));
    }
    offset += first.len();

    let mut fields: Vec<Field> = Vec::new();
    // Set while the last key was written as a bare `key:` opening a list
    let mut list_open = false;
    for (idx, line) in lines.enumerate() {
        let line_num = idx + 2;
        offset += line.len();
        let trimmed = line.trim();

        if trimmed == FRONTMATTER_DELIM {
            return Ok(Frontmatter {
                fields,
                rest: &text[offset..],
                rest_line: line_num + 1,
            });
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // `- item` continues a list opened by an empty `key:` line
        if let Some(item) = trimmed.strip_prefix("- ") {
            match fields.last_mut().filter(|_| list_open) {
                Some(last) => {
                    if !last.value.is_empty() {
                        last.value.push_str(", ");
                    }
                    last.value.push_str(strip_quotes(item));
                    continue;
                }
                None => {
                    return Err((
                        ErrorKind::MalformedMetadata("list item without a list key".to_string()),
                        line_num,
                    ))
                }
            }
        }

        let Some((key, value)) = parse_key_value(trimmed) else {
            return Err((
                ErrorKind::MalformedMetadata(format!("expected `key: value`, found `{}`", trimmed)),
                line_num,
            ));
        };
        if fields.iter().any(|f| f.key == key) {
            return Err((
                ErrorKind::MalformedMetadata(format!("key `{}` appears more than once", key)),
                line_num,
            ));
        }
        list_open = value.is_empty();
        fields.push(Field {
            key: key.to_string(),
            value: strip_quotes(value).to_string(),
            line: line_num,
        });
    }

    Err((
        ErrorKind::MalformedMetadata("metadata block is never closed with `---`".to_string()),
        1,
    ))
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    Some((key, value.trim()))
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}
