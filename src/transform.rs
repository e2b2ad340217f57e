use crate::error::{ConvertError, Result};
use crate::messages::{ConverterMessage, MessageSink};
use crate::models::{
    Author, Blog, Category, Comment, ConversionReport, ExtendedProperty, Post, PostType,
};
use crate::source::{SourceEntry, SourceFeed};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub const KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";
pub const TAG_SCHEME: &str = "http://www.blogger.com/atom/ns#";

pub const KIND_TEMPLATE: &str = "http://schemas.google.com/blogger/2008/kind#template";
pub const KIND_SETTINGS: &str = "http://schemas.google.com/blogger/2008/kind#settings";
pub const KIND_POST: &str = "http://schemas.google.com/blogger/2008/kind#post";
pub const KIND_COMMENT: &str = "http://schemas.google.com/blogger/2008/kind#comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Template,
    Settings,
    Post,
    Comment,
    Other,
}

impl EntryKind {
    fn from_term(term: Option<&str>) -> Self {
        match term {
            Some(KIND_TEMPLATE) => EntryKind::Template,
            Some(KIND_SETTINGS) => EntryKind::Settings,
            Some(KIND_POST) => EntryKind::Post,
            Some(KIND_COMMENT) => EntryKind::Comment,
            _ => EntryKind::Other,
        }
    }
}

/// Result of one transformation pass.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub blog: Blog,
    /// Site template, when the export carried one. Not part of BlogML.
    pub template: Option<String>,
    pub report: ConversionReport,
}

#[derive(Debug, Default)]
struct CategoryTable {
    items: Vec<Category>,
    by_title: HashMap<String, usize>,
}

impl CategoryTable {
    /// Returns the id of the category titled `title`, creating it on first use.
    /// An earlier `created` lowers the stored creation date.
    fn resolve(&mut self, title: &str, created: DateTime<Utc>, now: DateTime<Utc>) -> String {
        if let Some(&idx) = self.by_title.get(title) {
            let category = &mut self.items[idx];
            if category.created > created {
                category.created = created;
                category.modified = now;
            }
            return category.id.clone();
        }

        let id = Uuid::new_v4().to_string();
        self.by_title.insert(title.to_string(), self.items.len());
        self.items.push(Category {
            id: id.clone(),
            title: title.to_string(),
            description: title.to_string(),
            created,
            modified: now,
            approved: true,
        });
        id
    }
}

#[derive(Debug, Default)]
struct AuthorTable {
    items: Vec<Author>,
    by_key: HashMap<(String, Option<String>), usize>,
}

impl AuthorTable {
    fn resolve(
        &mut self,
        name: &str,
        email: Option<&str>,
        created: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> String {
        let key = (name.to_string(), email.map(str::to_string));
        if let Some(&idx) = self.by_key.get(&key) {
            let author = &mut self.items[idx];
            if author.created > created {
                author.created = created;
                author.modified = now;
            }
            return author.id.clone();
        }

        let id = Uuid::new_v4().to_string();
        self.by_key.insert(key, self.items.len());
        self.items.push(Author {
            id: id.clone(),
            title: name.to_string(),
            email: email.map(str::to_string),
            created,
            modified: now,
            approved: true,
        });
        id
    }
}

struct PendingComment {
    comment: Comment,
    in_reply_to: Option<String>,
}

struct Transformer<'a, S: MessageSink + ?Sized> {
    now: DateTime<Utc>,
    sink: &'a mut S,
    blog_created: DateTime<Utc>,
    posts: Vec<Post>,
    post_index: HashMap<String, usize>,
    pending: Vec<PendingComment>,
    authors: AuthorTable,
    categories: CategoryTable,
    properties: Vec<ExtendedProperty>,
    template: Option<String>,
    report: ConversionReport,
}

/// Turns a parsed Blogger export into a BlogML aggregate.
///
/// `now` stamps the modified date of every author and category the pass
/// creates or back-dates.
pub fn transform<S: MessageSink + ?Sized>(
    feed: SourceFeed,
    now: DateTime<Utc>,
    sink: &mut S,
) -> Result<Conversion> {
    sink.notify(&ConverterMessage::BlogTitle {
        title: feed.title.clone(),
        updated: feed.updated,
    });
    sink.notify(&ConverterMessage::BlogAuthor {
        name: feed.author.name.clone(),
        email: feed.author.email.clone(),
        uri: feed.author.uri.clone(),
    });

    let mut transformer = Transformer {
        now,
        sink,
        blog_created: feed.updated,
        posts: Vec::new(),
        post_index: HashMap::new(),
        pending: Vec::new(),
        authors: AuthorTable::default(),
        categories: CategoryTable::default(),
        properties: Vec::new(),
        template: None,
        report: ConversionReport::default(),
    };

    for entry in feed.entries {
        transformer.route(entry)?;
    }
    transformer.attach_comments();

    Ok(transformer.finish(feed.title))
}

impl<'a, S: MessageSink + ?Sized> Transformer<'a, S> {
    fn route(&mut self, entry: SourceEntry) -> Result<()> {
        if entry.published < self.blog_created {
            self.blog_created = entry.published;
        }

        let mut kind_term: Option<&str> = None;
        let mut category_refs = Vec::new();

        for category in &entry.categories {
            match category.scheme.as_str() {
                KIND_SCHEME => {
                    if let Some(previous) = kind_term.filter(|p| *p != category.term) {
                        self.sink.notify(&ConverterMessage::ConflictingEntryKind {
                            entry_id: entry.id.clone(),
                            previous: previous.to_string(),
                            current: category.term.clone(),
                        });
                    }
                    kind_term = Some(category.term.as_str());
                }
                TAG_SCHEME => {
                    category_refs.push(self.categories.resolve(
                        &category.term,
                        entry.published,
                        self.now,
                    ));
                }
                other => {
                    self.sink.notify(&ConverterMessage::UnexpectedCategoryScheme {
                        entry_id: entry.id.clone(),
                        scheme: other.to_string(),
                    });
                }
            }
        }

        let kind = EntryKind::from_term(kind_term);
        debug!(entry = %entry.id, ?kind, "routing entry");

        match kind {
            EntryKind::Template => {
                self.template = Some(entry.content);
            }
            EntryKind::Settings => {
                self.sink.notify(&ConverterMessage::ImportingSettings {
                    name: entry.id.clone(),
                    value: entry.content.clone(),
                });
                self.properties.push(ExtendedProperty {
                    name: entry.id,
                    value: entry.content,
                });
            }
            EntryKind::Post => {
                self.sink.notify(&ConverterMessage::ImportingPost {
                    title: entry.title.clone(),
                });
                if self.post_index.contains_key(&entry.id) {
                    return Err(ConvertError::DuplicatePostId(entry.id));
                }

                let author_ref = self.authors.resolve(
                    &entry.author.name,
                    entry.author.email.as_deref(),
                    entry.published,
                    self.now,
                );
                self.post_index.insert(entry.id.clone(), self.posts.len());
                self.posts.push(Post {
                    id: entry.id,
                    title: entry.title,
                    content: entry.content,
                    created: entry.published,
                    modified: entry.updated,
                    approved: true,
                    post_type: PostType::Normal,
                    has_excerpt: false,
                    author_refs: vec![author_ref],
                    category_refs,
                    comments: Vec::new(),
                });
            }
            EntryKind::Comment => {
                self.sink.notify(&ConverterMessage::ImportingComment {
                    title: entry.title.clone(),
                });
                self.pending.push(PendingComment {
                    comment: Comment {
                        id: entry.id,
                        title: entry.title,
                        content: entry.content,
                        created: entry.published,
                        modified: entry.updated,
                        approved: true,
                        user_name: entry.author.name,
                        user_email: entry.author.email,
                        user_url: entry.author.uri,
                    },
                    in_reply_to: entry.in_reply_to,
                });
            }
            EntryKind::Other => {
                self.report.skipped_entries += 1;
                self.sink.notify(&ConverterMessage::UnexpectedEntryKind {
                    entry_id: entry.id,
                    kind: kind_term.map(str::to_string),
                });
            }
        }

        Ok(())
    }

    fn attach_comments(&mut self) {
        for pending in std::mem::take(&mut self.pending) {
            let target = pending
                .in_reply_to
                .as_ref()
                .and_then(|id| self.post_index.get(id))
                .copied();

            match target {
                Some(idx) => {
                    let post = &mut self.posts[idx];
                    self.sink.notify(&ConverterMessage::AttachingComment {
                        comment: pending.comment.title.clone(),
                        post: post.title.clone(),
                    });
                    post.comments.push(pending.comment);
                    self.report.comments_attached += 1;
                }
                None => {
                    self.sink.notify(&ConverterMessage::OrphanedComment {
                        title: pending.comment.title,
                        in_reply_to: pending.in_reply_to,
                    });
                    self.report.comments_orphaned += 1;
                }
            }
        }
    }

    fn finish(self, title: String) -> Conversion {
        let mut report = self.report;
        report.posts = self.posts.len();
        report.authors = self.authors.items.len();
        report.categories = self.categories.items.len();
        report.extended_properties = self.properties.len();
        report.template_captured = self.template.is_some();
        report.blog_created = Some(self.blog_created);

        Conversion {
            blog: Blog {
                title,
                created: self.blog_created,
                authors: self.authors.items,
                categories: self.categories.items,
                posts: self.posts,
                extended_properties: self.properties,
            },
            template: self.template,
            report,
        }
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod transform_tests;
