use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Progress and diagnostic notifications raised during a conversion.
/// Purely advisory; nothing here affects the output document.
#[derive(Debug, Clone, PartialEq)]
pub enum ConverterMessage {
    BlogTitle {
        title: String,
        updated: DateTime<Utc>,
    },
    BlogAuthor {
        name: String,
        email: Option<String>,
        uri: Option<String>,
    },
    UnexpectedCategoryScheme {
        entry_id: String,
        scheme: String,
    },
    ConflictingEntryKind {
        entry_id: String,
        previous: String,
        current: String,
    },
    ImportingSettings {
        name: String,
        value: String,
    },
    ImportingPost {
        title: String,
    },
    ImportingComment {
        title: String,
    },
    AttachingComment {
        comment: String,
        post: String,
    },
    OrphanedComment {
        title: String,
        in_reply_to: Option<String>,
    },
    UnexpectedEntryKind {
        entry_id: String,
        kind: Option<String>,
    },
    BuildingBlogMl,
    WritingBlogMl {
        path: PathBuf,
    },
}

impl ConverterMessage {
    /// Data anomalies that were skipped rather than converted.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            ConverterMessage::UnexpectedCategoryScheme { .. }
                | ConverterMessage::ConflictingEntryKind { .. }
                | ConverterMessage::OrphanedComment { .. }
                | ConverterMessage::UnexpectedEntryKind { .. }
        )
    }
}

impl fmt::Display for ConverterMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConverterMessage::BlogTitle { title, updated } => {
                write!(f, "Blog: {} (last updated {})", title, updated.to_rfc3339())
            }
            ConverterMessage::BlogAuthor { name, email, uri } => write!(
                f,
                "Author: {} <{}> {}",
                name,
                email.as_deref().unwrap_or(""),
                uri.as_deref().unwrap_or("")
            ),
            ConverterMessage::UnexpectedCategoryScheme { entry_id, scheme } => {
                write!(f, "Unexpected category scheme '{}' on {}", scheme, entry_id)
            }
            ConverterMessage::ConflictingEntryKind {
                entry_id,
                previous,
                current,
            } => write!(
                f,
                "Entry {} declares more than one kind ({} then {}), using the last",
                entry_id, previous, current
            ),
            ConverterMessage::ImportingSettings { name, value } => {
                write!(f, "Importing setting {} = {}", name, value)
            }
            ConverterMessage::ImportingPost { title } => write!(f, "Importing post: {}", title),
            ConverterMessage::ImportingComment { title } => {
                write!(f, "Importing comment: {}", title)
            }
            ConverterMessage::AttachingComment { comment, post } => {
                write!(f, "Attaching comment '{}' to post '{}'", comment, post)
            }
            ConverterMessage::OrphanedComment { title, in_reply_to } => write!(
                f,
                "Orphaned comment '{}' (in reply to {}), dropped",
                title,
                in_reply_to.as_deref().unwrap_or("nothing")
            ),
            ConverterMessage::UnexpectedEntryKind { entry_id, kind } => write!(
                f,
                "Unexpected entry kind '{}' on {}, skipped",
                kind.as_deref().unwrap_or("none"),
                entry_id
            ),
            ConverterMessage::BuildingBlogMl => write!(f, "Building BlogML"),
            ConverterMessage::WritingBlogMl { path } => {
                write!(f, "Writing BlogML to {}", path.display())
            }
        }
    }
}

/// Receives converter messages in emission order.
pub trait MessageSink {
    fn notify(&mut self, message: &ConverterMessage);
}

impl<F> MessageSink for F
where
    F: FnMut(&ConverterMessage),
{
    fn notify(&mut self, message: &ConverterMessage) {
        self(message)
    }
}

/// Sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl MessageSink for Discard {
    fn notify(&mut self, _message: &ConverterMessage) {}
}
