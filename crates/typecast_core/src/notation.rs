//! Declaration notation for attribute types.
//!
//! # Responsibility
//! - Parse `Array[Hash[String => Integer]]`-style type declarations into
//!   attributes.
//!
//! # Invariants
//! - Primitive and container names are built in; other names resolve against
//!   the registry, or become deferred references when not declared yet.
//! - Bare `Array` and `Hash` default their members to `Object`.

use crate::attribute::{Attribute, AttributeOptions};
use crate::model::descriptor::{PrimitiveKind, TypeDescriptor};
use crate::registry::TypeRegistry;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Type notation parse errors. Positions are byte offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    EmptyInput,
    UnexpectedEnd { expected: &'static str },
    UnexpectedChar {
        position: usize,
        found: char,
        expected: &'static str,
    },
    UnexpectedArguments { name: String },
}

impl Display for NotationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "type notation must not be empty"),
            Self::UnexpectedEnd { expected } => {
                write!(f, "type notation ended early; expected {expected}")
            }
            Self::UnexpectedChar {
                position,
                found,
                expected,
            } => write!(f, "unexpected `{found}` at {position}; expected {expected}"),
            Self::UnexpectedArguments { name } => {
                write!(f, "type `{name}` does not take member types")
            }
        }
    }
}

impl Error for NotationError {}

/// Parses one type declaration with default attribute options.
pub fn parse_type(source: &str, registry: &Arc<TypeRegistry>) -> Result<Arc<Attribute>, NotationError> {
    parse_type_with(source, registry, &AttributeOptions::default())
}

/// Parses one type declaration; every attribute in the tree shares `options`.
pub fn parse_type_with(
    source: &str,
    registry: &Arc<TypeRegistry>,
    options: &AttributeOptions,
) -> Result<Arc<Attribute>, NotationError> {
    if source.trim().is_empty() {
        return Err(NotationError::EmptyInput);
    }
    let mut parser = Parser {
        source,
        position: 0,
        registry,
        options,
    };
    let attribute = parser.parse_type()?;
    parser.skip_whitespace();
    match parser.peek() {
        None => Ok(attribute),
        Some(found) => Err(NotationError::UnexpectedChar {
            position: parser.position,
            found,
            expected: "end of input",
        }),
    }
}

struct Parser<'a> {
    source: &'a str,
    position: usize,
    registry: &'a Arc<TypeRegistry>,
    options: &'a AttributeOptions,
}

impl Parser<'_> {
    fn parse_type(&mut self) -> Result<Arc<Attribute>, NotationError> {
        let name = self.parse_name()?;
        self.skip_whitespace();
        let has_arguments = self.peek() == Some('[');

        match name.as_str() {
            "Array" => {
                let member = if has_arguments {
                    self.expect('[', "`[`")?;
                    let member = self.parse_type()?;
                    self.expect(']', "`]`")?;
                    member
                } else {
                    self.object()
                };
                Ok(self.build(TypeDescriptor::collection(member)))
            }
            "Hash" => {
                let (key, value) = if has_arguments {
                    self.expect('[', "`[`")?;
                    let key = self.parse_type()?;
                    self.expect_arrow()?;
                    let value = self.parse_type()?;
                    self.expect(']', "`]`")?;
                    (key, value)
                } else {
                    (self.object(), self.object())
                };
                Ok(self.build(TypeDescriptor::mapping(key, value)))
            }
            _ if has_arguments => Err(NotationError::UnexpectedArguments { name }),
            _ => Ok(self.named(&name)),
        }
    }

    fn named(&self, name: &str) -> Arc<Attribute> {
        if let Some(kind) = PrimitiveKind::from_type_name(name) {
            return self.build(TypeDescriptor::Primitive(kind));
        }
        match self.registry.get(name) {
            Some(entry) => self.build(entry.descriptor()),
            None => Attribute::deferred(self.registry.reference(name), self.options.clone()),
        }
    }

    fn object(&self) -> Arc<Attribute> {
        self.build(TypeDescriptor::Primitive(PrimitiveKind::Object))
    }

    fn build(&self, descriptor: TypeDescriptor) -> Arc<Attribute> {
        Attribute::build_with(descriptor, self.options.clone())
    }

    fn parse_name(&mut self) -> Result<String, NotationError> {
        self.skip_whitespace();
        let start = self.position;
        loop {
            self.parse_segment()?;
            if self.rest().starts_with("::") {
                self.position += 2;
            } else {
                break;
            }
        }
        Ok(self.source[start..self.position].to_string())
    }

    fn parse_segment(&mut self) -> Result<(), NotationError> {
        match self.peek() {
            None => return Err(NotationError::UnexpectedEnd { expected: "type name" }),
            Some(c) if c.is_ascii_uppercase() => {}
            Some(found) => {
                return Err(NotationError::UnexpectedChar {
                    position: self.position,
                    found,
                    expected: "type name",
                })
            }
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.position += c.len_utf8();
            } else {
                break;
            }
        }
        Ok(())
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> Result<(), NotationError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == wanted => {
                self.position += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(NotationError::UnexpectedChar {
                position: self.position,
                found,
                expected,
            }),
            None => Err(NotationError::UnexpectedEnd { expected }),
        }
    }

    fn expect_arrow(&mut self) -> Result<(), NotationError> {
        self.skip_whitespace();
        if self.rest().starts_with("=>") {
            self.position += 2;
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(NotationError::UnexpectedChar {
                position: self.position,
                found,
                expected: "`=>`",
            }),
            None => Err(NotationError::UnexpectedEnd { expected: "`=>`" }),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.position += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn rest(&self) -> &str {
        &self.source[self.position..]
    }
}
