//! Error types.

use std::error;
use std::fmt;

use cssparser::{BasicParseError, BasicParseErrorKind, ParseErrorKind};

/// A short-lived error for attribute value parsing.
///
/// The lifetime of the error is the same as the `cssparser::ParserInput` that
/// was used to create a `cssparser::Parser`.  That is, it is the lifetime of
/// the string data that is being parsed.
pub type ParseError<'i> = cssparser::ParseError<'i, ValueErrorKind>;

/// A simple error which refers to an attribute's value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueErrorKind {
    /// The value could not be parsed
    Parse(String),

    // The value could be parsed, but is invalid
    Value(String),
}

impl ValueErrorKind {
    pub fn parse_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Parse(s.to_string())
    }

    pub fn value_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Value(s.to_string())
    }
}

impl fmt::Display for ValueErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueErrorKind::Parse(ref s) => write!(f, "parse error: {}", s),

            ValueErrorKind::Value(ref s) => write!(f, "invalid value: {}", s),
        }
    }
}

impl<'a> From<BasicParseError<'a>> for ValueErrorKind {
    fn from(e: BasicParseError<'_>) -> ValueErrorKind {
        let BasicParseError { kind, .. } = e;

        let msg = match kind {
            BasicParseErrorKind::UnexpectedToken(_) => "unexpected token",
            BasicParseErrorKind::EndOfInput => "unexpected end of input",
            BasicParseErrorKind::AtRuleInvalid(_) => "invalid @-rule",
            BasicParseErrorKind::AtRuleBodyInvalid => "invalid @-rule body",
            BasicParseErrorKind::QualifiedRuleInvalid => "invalid qualified rule",
        };

        ValueErrorKind::parse_error(msg)
    }
}

/// A complete error for an attribute and its erroneous value
#[derive(Debug, Clone, PartialEq)]
pub struct ElementError {
    pub attr: String,
    pub err: ValueErrorKind,
}

impl fmt::Display for ElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attr, self.err)
    }
}

impl error::Error for ElementError {}

/// Helper for converting `Result<O, ParseError>` into `Result<O, ElementError>`
pub trait AttributeResultExt<O> {
    fn attribute(self, attr: &str) -> Result<O, ElementError>;
}

impl<'i, O> AttributeResultExt<O> for Result<O, ParseError<'i>> {
    fn attribute(self, attr: &str) -> Result<O, ElementError> {
        self.map_err(|e| {
            let err = match e.kind {
                ParseErrorKind::Basic(b) => ValueErrorKind::from(BasicParseError {
                    kind: b,
                    location: e.location,
                }),
                ParseErrorKind::Custom(v) => v,
            };

            ElementError {
                attr: attr.to_string(),
                err,
            }
        })
    }
}

/// Errors that can happen while loading an SVG document.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadingError {
    /// The document is not valid UTF-8.
    Encoding,

    /// The document is not well-formed XML.
    Xml(String),
}

impl fmt::Display for LoadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LoadingError::Encoding => write!(f, "invalid UTF-8 in document"),
            LoadingError::Xml(ref s) => write!(f, "XML parse error: {}", s),
        }
    }
}

impl error::Error for LoadingError {}

impl From<roxmltree::Error> for LoadingError {
    fn from(e: roxmltree::Error) -> LoadingError {
        LoadingError::Xml(format!("{}", e))
    }
}

/// Errors that can happen while rasterizing a document.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderingError {
    /// An error from the rendering backend.
    Rendering(String),

    /// The document's resolved width or height is zero or negative.
    InvalidSize,
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RenderingError::Rendering(ref s) => write!(f, "rendering error: {}", s),
            RenderingError::InvalidSize => {
                write!(f, "width or height is zero or negative")
            }
        }
    }
}

impl error::Error for RenderingError {}

impl From<cairo::Error> for RenderingError {
    fn from(e: cairo::Error) -> RenderingError {
        RenderingError::Rendering(format!("{:?}", e))
    }
}
