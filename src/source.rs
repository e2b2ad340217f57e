use crate::error::{ConvertError, Result};
use atom_syndication::{Entry, Feed, Person};
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::fs;
use std::path::Path;

pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
pub const THREAD_NAMESPACE: &str = "http://purl.org/syndication/thread/1.0";

#[derive(Debug, Clone, PartialEq)]
pub struct SourcePerson {
    pub name: String,
    /// `Some("")` when the element is present but empty.
    pub uri: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceCategory {
    pub scheme: String,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceLink {
    pub rel: String,
    pub mime_type: Option<String>,
    pub href: String,
}

/// One `<entry>` of the export, with timestamps already in UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub id: String,
    pub published: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub author: SourcePerson,
    pub in_reply_to: Option<String>,
    pub categories: Vec<SourceCategory>,
    pub links: Vec<SourceLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFeed {
    pub title: String,
    pub updated: DateTime<Utc>,
    pub author: SourcePerson,
    pub entries: Vec<SourceEntry>,
}

impl SourceFeed {
    /// Loads and parses a Blogger export file entirely into memory.
    pub fn load(path: &Path) -> Result<Self> {
        let xml = fs::read(path).map_err(|e| ConvertError::io(path, e))?;
        Self::from_bytes(&xml)
    }

    pub fn parse(xml: &str) -> Result<Self> {
        Self::from_bytes(xml.as_bytes())
    }

    /// The ATOM reader supplies values but fills in defaults for absent
    /// elements, so a second namespace-aware pass records which elements
    /// the document really carries.
    pub fn from_bytes(xml: &[u8]) -> Result<Self> {
        let feed = Feed::read_from(xml)?;
        let outline = FeedOutline::scan(xml)?;
        Self::from_atom(&feed, &outline)
    }

    fn from_atom(feed: &Feed, outline: &FeedOutline) -> Result<Self> {
        if !outline.title {
            return Err(ConvertError::missing("title", "feed"));
        }
        if !outline.updated {
            return Err(ConvertError::missing("updated", "feed"));
        }

        let author = feed
            .authors()
            .first()
            .ok_or_else(|| ConvertError::missing("author", "feed"))?;
        // uri and email must be there, though either may be empty.
        let author = person(author, &outline.author);
        if author.uri.is_none() {
            return Err(ConvertError::missing("uri", "feed author"));
        }
        if author.email.is_none() {
            return Err(ConvertError::missing("email", "feed author"));
        }

        if feed.entries().len() != outline.entries.len() {
            return Err(ConvertError::Malformed(format!(
                "{} entries read but {} <entry> elements found",
                feed.entries().len(),
                outline.entries.len()
            )));
        }
        let entries = feed
            .entries()
            .iter()
            .zip(&outline.entries)
            .map(|(entry, shape)| source_entry(entry, shape))
            .collect::<Result<Vec<_>>>()?;

        Ok(SourceFeed {
            title: feed.title().value.clone(),
            updated: feed.updated().with_timezone(&Utc),
            author,
            entries,
        })
    }
}

fn person(p: &Person, shape: &PersonOutline) -> SourcePerson {
    SourcePerson {
        name: p.name().to_string(),
        uri: p
            .uri()
            .map(str::to_string)
            .or_else(|| shape.uri.then(String::new)),
        email: p
            .email()
            .map(str::to_string)
            .or_else(|| shape.email.then(String::new)),
    }
}

fn source_entry(entry: &Entry, shape: &EntryOutline) -> Result<SourceEntry> {
    let position = shape.position;
    let context = || {
        if entry.id().is_empty() {
            format!("entry #{}", position)
        } else {
            format!("entry {}", entry.id())
        }
    };

    if !shape.id {
        return Err(ConvertError::missing("id", context()));
    }
    if !shape.updated {
        return Err(ConvertError::missing("updated", context()));
    }
    if !shape.title {
        return Err(ConvertError::missing("title", context()));
    }

    let published = entry
        .published()
        .ok_or_else(|| ConvertError::missing("published", context()))?
        .with_timezone(&Utc);

    let author = entry
        .authors()
        .first()
        .map(|p| person(p, &shape.author))
        .ok_or_else(|| ConvertError::missing("author", context()))?;
    if author.name.is_empty() {
        return Err(ConvertError::missing("name", context()));
    }

    let content = entry
        .content()
        .ok_or_else(|| ConvertError::missing("content", context()))?
        .value()
        .unwrap_or_default()
        .to_string();

    let categories = entry
        .categories()
        .iter()
        .map(|c| SourceCategory {
            scheme: c.scheme().unwrap_or_default().to_string(),
            term: c.term().to_string(),
        })
        .collect();

    let links = entry
        .links()
        .iter()
        .map(|l| SourceLink {
            rel: l.rel().to_string(),
            mime_type: l.mime_type().map(str::to_string),
            href: l.href().to_string(),
        })
        .collect();

    Ok(SourceEntry {
        id: entry.id().to_string(),
        published,
        updated: entry.updated().with_timezone(&Utc),
        title: entry.title().value.clone(),
        content,
        author,
        in_reply_to: shape.in_reply_to.clone(),
        categories,
        links,
    })
}

/// Which optional-looking elements of the first author block are present.
#[derive(Debug, Default, Clone)]
struct PersonOutline {
    uri: bool,
    email: bool,
}

#[derive(Debug, Default, Clone)]
struct EntryOutline {
    position: usize,
    id: bool,
    updated: bool,
    title: bool,
    authors: usize,
    author: PersonOutline,
    in_reply_to: Option<String>,
}

#[derive(Debug, Default)]
struct FeedOutline {
    title: bool,
    updated: bool,
    authors: usize,
    author: PersonOutline,
    entries: Vec<EntryOutline>,
}

impl FeedOutline {
    fn scan(xml: &[u8]) -> Result<Self> {
        let mut reader = NsReader::from_reader(xml);
        let mut buf = Vec::new();
        // Known ATOM element names of the open elements, outermost first.
        let mut path: Vec<Option<&'static str>> = Vec::new();
        let mut outline = FeedOutline::default();

        loop {
            let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let local = e.local_name();
                    let tag = if in_namespace(&ns, ATOM_NAMESPACE) {
                        atom_tag(local.as_ref())
                    } else {
                        None
                    };

                    if in_namespace(&ns, THREAD_NAMESPACE) && local.as_ref() == b"in-reply-to" {
                        let reference = match e.try_get_attribute("ref").map_err(quick_xml::Error::from)? {
                            Some(attr) => Some(attr.unescape_value()?.into_owned()),
                            None => None,
                        };
                        outline.record_reply(&path, reference);
                    } else if let Some(tag) = tag {
                        outline.record(&path, tag);
                    }

                    if matches!(event, Event::Start(_)) {
                        path.push(tag);
                    }
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(outline)
    }

    fn record(&mut self, path: &[Option<&'static str>], tag: &'static str) {
        match (path, tag) {
            ([Some("feed")], "title") => self.title = true,
            ([Some("feed")], "updated") => self.updated = true,
            ([Some("feed")], "author") => self.authors += 1,
            ([Some("feed")], "entry") => self.entries.push(EntryOutline {
                position: self.entries.len() + 1,
                ..EntryOutline::default()
            }),
            ([Some("feed"), Some("author")], "uri") if self.authors == 1 => self.author.uri = true,
            ([Some("feed"), Some("author")], "email") if self.authors == 1 => {
                self.author.email = true
            }
            ([Some("feed"), Some("entry"), ..], _) => {
                if let Some(entry) = self.entries.last_mut() {
                    entry.record(&path[2..], tag);
                }
            }
            _ => {}
        }
    }

    fn record_reply(&mut self, path: &[Option<&'static str>], reference: Option<String>) {
        if let ([Some("feed"), Some("entry")], Some(entry)) = (path, self.entries.last_mut()) {
            if entry.in_reply_to.is_none() {
                entry.in_reply_to = reference;
            }
        }
    }
}

impl EntryOutline {
    /// `path` is relative to the `<entry>` element.
    fn record(&mut self, path: &[Option<&'static str>], tag: &'static str) {
        match (path, tag) {
            ([], "id") => self.id = true,
            ([], "updated") => self.updated = true,
            ([], "title") => self.title = true,
            ([], "author") => self.authors += 1,
            ([Some("author")], "uri") if self.authors == 1 => self.author.uri = true,
            ([Some("author")], "email") if self.authors == 1 => self.author.email = true,
            _ => {}
        }
    }
}

fn in_namespace(ns: &ResolveResult, uri: &str) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(bound)) if *bound == uri.as_bytes())
}

fn atom_tag(local: &[u8]) -> Option<&'static str> {
    match local {
        b"feed" => Some("feed"),
        b"entry" => Some("entry"),
        b"author" => Some("author"),
        b"id" => Some("id"),
        b"title" => Some("title"),
        b"updated" => Some("updated"),
        b"uri" => Some("uri"),
        b"email" => Some("email"),
        _ => None,
    }
}
