use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("blogger export not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("output directory does not exist: {}", .0.display())]
    OutputDirNotFound(PathBuf),
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed ATOM export: {0}")]
    Atom(#[from] atom_syndication::Error),
    #[error("malformed ATOM export: {0}")]
    Malformed(String),
    #[error("missing required element <{element}> in {context}")]
    MissingElement {
        element: &'static str,
        context: String,
    },
    #[error("duplicate post id {0}")]
    DuplicatePostId(String),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl ConvertError {
    pub(crate) fn missing(element: &'static str, context: impl Into<String>) -> Self {
        ConvertError::MissingElement {
            element,
            context: context.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
