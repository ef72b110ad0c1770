//! Error types for document parsing and configuration loading.
//!
//! Engine operations never surface these to their callers: a failed parse
//! degrades to "return the input unchanged". They are public for callers that
//! work with [`Document`](crate::document::Document) directly.

use std::path::PathBuf;

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("malformed document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("document has no root element")]
    NoRoot,

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("closing tag </{0}> has no matching start tag")]
    UnexpectedEnd(String),

    #[error("failed to read options from {path}: {source}")]
    OptionsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options in {path}: {source}")]
    OptionsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, EditError>;
