use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::Peekable;
use std::path::Path;
use std::str::CharIndices;

use thiserror::Error;

/// Syntax error in a single-quoted array literal; offsets are byte offsets
/// into the literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected '[' at offset {offset}")]
    ExpectedOpenBracket { offset: usize },

    #[error("expected a single-quoted string at offset {offset}, found {}", describe(.found))]
    ExpectedString { offset: usize, found: Option<char> },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("expected ',' or ']' at offset {offset}, found {}", describe(.found))]
    ExpectedSeparator { offset: usize, found: Option<char> },

    #[error("unexpected input after ']' at offset {offset}")]
    TrailingInput { offset: usize },
}

fn describe(found: &Option<char>) -> String {
    match found {
        Some(c) => format!("{:?}", c),
        None => "end of input".to_string(),
    }
}

/// Parse a key list written as a single-quoted array literal
///
/// The grammar is one flat list:
/// ```text
/// '[' ( string ( ',' string )* )? ']'
/// string = "'" ( "\'" | any char but "'" )* "'"
/// ```
/// Whitespace between tokens is ignored. `\'` is the only escape; any other
/// backslash is kept as-is.
///
/// ```
/// use json_drop_keys::parse_key_list;
///
/// let keys = parse_key_list(r"['props.secret', 'it\'s']").unwrap();
/// assert_eq!(keys, vec!["props.secret", "it's"]);
/// ```
pub fn parse_key_list(text: &str) -> Result<Vec<String>, ParseError> {
    let mut lexer = Lexer::new(text);
    let mut keys = Vec::new();

    lexer.skip_whitespace();
    match lexer.chars.next() {
        Some((_, '[')) => {}
        Some((offset, _)) => return Err(ParseError::ExpectedOpenBracket { offset }),
        None => return Err(ParseError::ExpectedOpenBracket { offset: text.len() }),
    }

    lexer.skip_whitespace();
    if lexer.peek() == Some(']') {
        lexer.chars.next();
    } else {
        loop {
            lexer.skip_whitespace();
            keys.push(lexer.quoted_string()?);
            lexer.skip_whitespace();
            match lexer.chars.next() {
                Some((_, ',')) => continue,
                Some((_, ']')) => break,
                Some((offset, c)) => {
                    return Err(ParseError::ExpectedSeparator {
                        offset,
                        found: Some(c),
                    })
                }
                None => {
                    return Err(ParseError::ExpectedSeparator {
                        offset: text.len(),
                        found: None,
                    })
                }
            }
        }
    }

    lexer.skip_whitespace();
    if let Some((offset, _)) = lexer.chars.next() {
        return Err(ParseError::TrailingInput { offset });
    }

    Ok(keys)
}

struct Lexer<'a> {
    len: usize,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer {
            len: text.len(),
            chars: text.char_indices().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.len, |&(i, _)| i)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn quoted_string(&mut self) -> Result<String, ParseError> {
        let start = self.offset();
        match self.chars.next() {
            Some((_, '\'')) => {}
            found => {
                return Err(ParseError::ExpectedString {
                    offset: start,
                    found: found.map(|(_, c)| c),
                })
            }
        }

        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => return Ok(value),
                Some((_, '\\')) if self.peek() == Some('\'') => {
                    self.chars.next();
                    value.push('\'');
                }
                Some((_, c)) => value.push(c),
                None => return Err(ParseError::UnterminatedString { offset: start }),
            }
        }
    }
}

/// Collect dotted key paths from a line-oriented source
///
/// Each line is trimmed; blank lines and lines starting with `#` are ignored.
/// Nothing is parsed inside a line, so a path may contain quotes or spaces.
pub fn read_key_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    reader
        .lines()
        .filter_map(|line| match line {
            Ok(line) => {
                let path = line.trim();
                (!path.is_empty() && !path.starts_with('#')).then(|| Ok(path.to_owned()))
            }
            Err(err) => Some(Err(err)),
        })
        .collect()
}

/// [`read_key_lines`] over a file on disk
pub fn read_key_file<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<String>> {
    read_key_lines(BufReader::new(File::open(path)?))
}
