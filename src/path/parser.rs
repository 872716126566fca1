//! Field path string parser.

use super::ast::{CollectionKind, PathExpression, PathSegment};
use super::error::PathError;

/// Parser for field path strings.
pub struct Parser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given path string.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Parses the path string into a PathExpression.
    pub fn parse(input: &'a str) -> Result<PathExpression, PathError> {
        let mut parser = Parser::new(input);
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<PathExpression, PathError> {
        let mut segments = Vec::new();

        // A single leading separator is optional
        if self.peek() == Some('/') {
            self.next();
        }

        while !self.is_eof() {
            if self.peek() == Some('/') {
                // Empty piece between separators
                self.next();
                continue;
            }
            segments.push(self.parse_segment()?);
            match self.peek() {
                Some('/') => {
                    self.next();
                }
                None => break,
                Some(ch) => {
                    return Err(self.unexpected(ch, "'/' or end of path"));
                }
            }
        }

        Ok(PathExpression::from_segments(segments))
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn unexpected(&self, found: char, expected: &str) -> PathError {
        PathError::UnexpectedToken {
            path: self.input.to_string(),
            position: self.position,
            found: found.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Parses `name` followed by an optional collection marker.
    fn parse_segment(&mut self) -> Result<PathSegment, PathError> {
        let start = self.position;
        let name = self.parse_name()?;

        let kind = match self.peek().and_then(CollectionKind::from_open) {
            Some(kind) => kind,
            None => return Ok(PathSegment::named(name)),
        };

        if name.is_empty() {
            return Err(PathError::EmptySegment {
                path: self.input.to_string(),
                position: start,
            });
        }

        self.next();
        let index = self.parse_index()?;
        self.expect_close(kind)?;
        Ok(PathSegment::collection(name, kind, index))
    }

    /// Reads name characters up to a separator or collection marker.
    fn parse_name(&mut self) -> Result<String, PathError> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '/' | '[' | '<' | '{' => break,
                ']' | '>' | '}' => {
                    return Err(self.unexpected(ch, "name character"));
                }
                _ => {
                    name.push(ch);
                    self.next();
                }
            }
        }
        Ok(name)
    }

    /// Parses the digits between the brackets, if any.
    fn parse_index(&mut self) -> Result<Option<u32>, PathError> {
        let start = self.position;
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '+' || ch == '.' {
                text.push(ch);
                self.next();
            } else {
                break;
            }
        }

        if text.is_empty() {
            return Ok(None);
        }
        if !text.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(PathError::InvalidIndex {
                path: self.input.to_string(),
                position: start,
                text,
            });
        }
        text.parse::<u32>()
            .map(Some)
            .map_err(|_| PathError::InvalidIndex {
                path: self.input.to_string(),
                position: start,
                text,
            })
    }

    /// Expects the closing bracket that matches `kind`.
    fn expect_close(&mut self, kind: CollectionKind) -> Result<(), PathError> {
        let close = match kind.brackets() {
            Some((_, close)) => close,
            None => return Ok(()),
        };
        match self.peek() {
            Some(ch) if ch == close => {
                self.next();
                Ok(())
            }
            Some(ch) => Err(self.unexpected(ch, &format!("'{}'", close))),
            None => Err(PathError::UnexpectedEnd {
                path: self.input.to_string(),
                expected: format!("'{}'", close),
            }),
        }
    }
}
