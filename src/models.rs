use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A tag shared by any number of posts. One per distinct title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub approved: bool,
}

/// A post author, identified by the (name, email) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub title: String,
    pub email: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub approved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Normal,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub approved: bool,
    pub post_type: PostType,
    pub has_excerpt: bool,
    /// Ids of entries in `Blog::authors`.
    pub author_refs: Vec<String>,
    /// Ids of entries in `Blog::categories`.
    pub category_refs: Vec<String>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub approved: bool,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperty {
    pub name: String,
    pub value: String,
}

/// Root of the BlogML document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub title: String,
    pub created: DateTime<Utc>,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    pub posts: Vec<Post>,
    pub extended_properties: Vec<ExtendedProperty>,
}

impl Blog {
    pub fn author(&self, id: &str) -> Option<&Author> {
        self.authors.iter().find(|a| a.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn comment_count(&self) -> usize {
        self.posts.iter().map(|p| p.comments.len()).sum()
    }
}

/// Counts describing one conversion run, written by `--report`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub posts: usize,
    pub comments_attached: usize,
    pub comments_orphaned: usize,
    pub authors: usize,
    pub categories: usize,
    pub extended_properties: usize,
    pub skipped_entries: usize,
    pub template_captured: bool,
    pub blog_created: Option<DateTime<Utc>>,
}
