use crate::error::{ConvertError, Result};
use crate::models::{Author, Blog, Category, Comment, Post};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const BLOGML_NAMESPACE: &str = "http://www.blogml.com/2006/09/BlogML";
const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Writes `blog` to `path`, replacing any existing file.
/// The document goes to a temporary file beside the target first, so a
/// failure leaves no partial output behind.
pub fn write_file(blog: &Blog, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir).map_err(|e| ConvertError::io(dir, e))?;
    {
        let mut out = BufWriter::new(tmp.as_file());
        write_blog(blog, &mut out)?;
        out.flush().map_err(|e| ConvertError::io(tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| ConvertError::io(path, e.error))?;
    Ok(())
}

pub fn to_string(blog: &Blog) -> Result<String> {
    let mut buf = Vec::new();
    write_blog(blog, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Serializes `blog` as an indented BlogML 2.0 document.
pub fn write_blog<W: Write>(blog: &Blog, inner: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let created = date(&blog.created);
    let root = BytesStart::new("blog").with_attributes([
        ("root-url", ""),
        ("date-created", created.as_str()),
        ("xmlns", BLOGML_NAMESPACE),
        ("xmlns:xs", XS_NAMESPACE),
    ]);
    writer.write_event(Event::Start(root))?;

    text_element(&mut writer, "title", &blog.title)?;
    text_element(&mut writer, "sub-title", "")?;

    writer.write_event(Event::Start(BytesStart::new("authors")))?;
    for author in &blog.authors {
        write_author(&mut writer, author)?;
    }
    writer.write_event(Event::End(BytesEnd::new("authors")))?;

    if !blog.extended_properties.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("extended-properties")))?;
        for prop in &blog.extended_properties {
            let property = BytesStart::new("property")
                .with_attributes([("name", prop.name.as_str()), ("value", prop.value.as_str())]);
            writer.write_event(Event::Empty(property))?;
        }
        writer.write_event(Event::End(BytesEnd::new("extended-properties")))?;
    }

    writer.write_event(Event::Start(BytesStart::new("categories")))?;
    for category in &blog.categories {
        write_category(&mut writer, category)?;
    }
    writer.write_event(Event::End(BytesEnd::new("categories")))?;

    writer.write_event(Event::Start(BytesStart::new("posts")))?;
    for post in &blog.posts {
        write_post(&mut writer, post)?;
    }
    writer.write_event(Event::End(BytesEnd::new("posts")))?;

    writer.write_event(Event::End(BytesEnd::new("blog")))?;
    Ok(())
}

fn write_author<W: Write>(writer: &mut Writer<W>, author: &Author) -> Result<()> {
    let created = date(&author.created);
    let modified = date(&author.modified);
    let start = BytesStart::new("author").with_attributes([
        ("id", author.id.as_str()),
        ("date-created", created.as_str()),
        ("date-modified", modified.as_str()),
        ("approved", flag(author.approved)),
        ("email", author.email.as_deref().unwrap_or("")),
    ]);
    writer.write_event(Event::Start(start))?;
    text_element(writer, "title", &author.title)?;
    writer.write_event(Event::End(BytesEnd::new("author")))?;
    Ok(())
}

fn write_category<W: Write>(writer: &mut Writer<W>, category: &Category) -> Result<()> {
    let created = date(&category.created);
    let modified = date(&category.modified);
    let start = BytesStart::new("category").with_attributes([
        ("id", category.id.as_str()),
        ("date-created", created.as_str()),
        ("date-modified", modified.as_str()),
        ("approved", flag(category.approved)),
        ("description", category.description.as_str()),
        ("parentref", "0"),
    ]);
    writer.write_event(Event::Start(start))?;
    text_element(writer, "title", &category.title)?;
    writer.write_event(Event::End(BytesEnd::new("category")))?;
    Ok(())
}

fn write_post<W: Write>(writer: &mut Writer<W>, post: &Post) -> Result<()> {
    let created = date(&post.created);
    let modified = date(&post.modified);
    let start = BytesStart::new("post").with_attributes([
        ("id", post.id.as_str()),
        ("date-created", created.as_str()),
        ("date-modified", modified.as_str()),
        ("approved", flag(post.approved)),
        ("post-url", ""),
        ("type", post.post_type.as_str()),
        ("hasexcerpt", flag(post.has_excerpt)),
        ("views", "0"),
        ("is-published", "true"),
    ]);
    writer.write_event(Event::Start(start))?;
    text_element(writer, "title", &post.title)?;
    text_element(writer, "content", &post.content)?;
    text_element(writer, "post-name", "")?;

    if !post.category_refs.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("categories")))?;
        for id in &post.category_refs {
            let reference = BytesStart::new("category").with_attributes([("ref", id.as_str())]);
            writer.write_event(Event::Empty(reference))?;
        }
        writer.write_event(Event::End(BytesEnd::new("categories")))?;
    }

    if !post.comments.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("comments")))?;
        for comment in &post.comments {
            write_comment(writer, comment)?;
        }
        writer.write_event(Event::End(BytesEnd::new("comments")))?;
    }

    writer.write_event(Event::Empty(BytesStart::new("trackbacks")))?;

    writer.write_event(Event::Start(BytesStart::new("authors")))?;
    for id in &post.author_refs {
        let reference = BytesStart::new("author").with_attributes([("ref", id.as_str())]);
        writer.write_event(Event::Empty(reference))?;
    }
    writer.write_event(Event::End(BytesEnd::new("authors")))?;

    writer.write_event(Event::End(BytesEnd::new("post")))?;
    Ok(())
}

fn write_comment<W: Write>(writer: &mut Writer<W>, comment: &Comment) -> Result<()> {
    let created = date(&comment.created);
    let modified = date(&comment.modified);
    let start = BytesStart::new("comment").with_attributes([
        ("id", comment.id.as_str()),
        ("date-created", created.as_str()),
        ("date-modified", modified.as_str()),
        ("approved", flag(comment.approved)),
        ("user-name", comment.user_name.as_str()),
        ("user-email", comment.user_email.as_deref().unwrap_or("")),
        ("user-url", comment.user_url.as_deref().unwrap_or("")),
    ]);
    writer.write_event(Event::Start(start))?;
    text_element(writer, "title", &comment.title)?;
    text_element(writer, "content", &comment.content)?;
    writer.write_event(Event::End(BytesEnd::new("comment")))?;
    Ok(())
}

/// `<name type="text"><![CDATA[value]]></name>`
fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    writer.write_event(Event::Start(
        BytesStart::new(name).with_attributes([("type", "text")]),
    ))?;
    // "]]>" cannot appear inside one CDATA section; split it across two.
    let mut pieces = value.split("]]>").peekable();
    let mut first = true;
    while let Some(piece) = pieces.next() {
        let lead = if first { "" } else { ">" };
        let tail = if pieces.peek().is_some() { "]]" } else { "" };
        writer.write_event(Event::CData(BytesCData::new(format!("{}{}{}", lead, piece, tail))))?;
        first = false;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn date(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn flag(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtendedProperty, PostType};
    use chrono::TimeZone;

    fn create_test_blog() -> Blog {
        let created = Utc.with_ymd_and_hms(2009, 1, 1, 0, 0, 0).unwrap();
        Blog {
            title: "Field Notes".to_string(),
            created,
            authors: vec![Author {
                id: "author-1".to_string(),
                title: "Alice".to_string(),
                email: Some("a@x.com".to_string()),
                created,
                modified: created,
                approved: true,
            }],
            categories: vec![Category {
                id: "cat-1".to_string(),
                title: "Tech".to_string(),
                description: "Tech".to_string(),
                created,
                modified: created,
                approved: true,
            }],
            posts: vec![Post {
                id: "p1".to_string(),
                title: "Hello & welcome".to_string(),
                content: "<p>a ]]> b</p>".to_string(),
                created,
                modified: created,
                approved: true,
                post_type: PostType::Normal,
                has_excerpt: false,
                author_refs: vec!["author-1".to_string()],
                category_refs: vec!["cat-1".to_string()],
                comments: vec![Comment {
                    id: "c1".to_string(),
                    title: "Nice".to_string(),
                    content: "agreed".to_string(),
                    created,
                    modified: created,
                    approved: true,
                    user_name: "Bob".to_string(),
                    user_email: None,
                    user_url: Some("http://bob.example/".to_string()),
                }],
            }],
            extended_properties: vec![ExtendedProperty {
                name: "BLOG_NAME".to_string(),
                value: "Field \"Notes\"".to_string(),
            }],
        }
    }

    #[test]
    fn test_document_shape() {
        let xml = to_string(&create_test_blog()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("date-created=\"2009-01-01T00:00:00\""));
        assert!(xml.contains(&format!("xmlns=\"{}\"", BLOGML_NAMESPACE)));
        assert!(xml.contains("<title type=\"text\"><![CDATA[Field Notes]]></title>"));
        assert!(xml.contains("<category ref=\"cat-1\"/>"));
        assert!(xml.contains("<author ref=\"author-1\"/>"));
        assert!(xml.contains("user-name=\"Bob\""));
        assert!(xml.contains("type=\"normal\""));
        assert!(xml.contains("value=\"Field &quot;Notes&quot;\""));
    }

    #[test]
    fn test_cdata_terminator_is_split() {
        let xml = to_string(&create_test_blog()).unwrap();
        assert!(xml.contains("<![CDATA[<p>a ]]]]><![CDATA[> b</p>]]>"));
    }

    #[test]
    fn test_write_file_replaces_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("blog.xml");
        std::fs::write(&path, "stale").unwrap();

        write_file(&create_test_blog(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<posts>"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
