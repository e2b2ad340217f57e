use blogger2blogml::{BlogConverter, ConvertError, ConverterMessage, Discard};
use std::fs;
use tempfile::TempDir;

const EXPORT: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<feed xmlns='http://www.w3.org/2005/Atom' xmlns:thr='http://purl.org/syndication/thread/1.0'>
  <id>tag:blogger.com,1999:blog-1</id>
  <updated>2009-03-01T00:00:00.000Z</updated>
  <title type='text'>Field Notes</title>
  <author><name>Alice</name><uri>http://alice.example/</uri><email>a@x.com</email></author>
  <entry>
    <id>tag:blogger.com,1999:blog-1.settings.BLOG_NAME</id>
    <published>2009-02-01T00:00:00.000Z</published>
    <updated>2009-02-01T00:00:00.000Z</updated>
    <category scheme='http://schemas.google.com/g/2005#kind' term='http://schemas.google.com/blogger/2008/kind#settings'/>
    <title type='text'>Blog name</title>
    <content type='text'>Field Notes</content>
    <author><name>Alice</name></author>
  </entry>
  <entry>
    <id>p1</id>
    <published>2009-01-01T00:00:00.000Z</published>
    <updated>2009-01-01T12:00:00.000Z</updated>
    <category scheme='http://schemas.google.com/g/2005#kind' term='http://schemas.google.com/blogger/2008/kind#post'/>
    <category scheme='http://www.blogger.com/atom/ns#' term='Tech'/>
    <title type='text'>First post</title>
    <content type='html'>&lt;p&gt;Hello&lt;/p&gt;</content>
    <link rel='alternate' type='text/html' href='http://alice.example/2009/01/first-post.html'/>
    <author><name>Alice</name><email>a@x.com</email></author>
  </entry>
  <entry>
    <id>c1</id>
    <published>2009-01-02T00:00:00.000Z</published>
    <updated>2009-01-02T00:00:00.000Z</updated>
    <category scheme='http://schemas.google.com/g/2005#kind' term='http://schemas.google.com/blogger/2008/kind#comment'/>
    <title type='text'>Great read</title>
    <content type='html'>Thanks!</content>
    <author><name>Bob</name><uri>http://bob.example/</uri></author>
    <thr:in-reply-to ref='p1' type='text/html'/>
  </entry>
  <entry>
    <id>c2</id>
    <published>2009-01-03T00:00:00.000Z</published>
    <updated>2009-01-03T00:00:00.000Z</updated>
    <category scheme='http://schemas.google.com/g/2005#kind' term='http://schemas.google.com/blogger/2008/kind#comment'/>
    <category scheme='http://unknown.example/scheme' term='x'/>
    <title type='text'>Lost</title>
    <content type='html'>Where am I?</content>
    <author><name>Carol</name></author>
    <thr:in-reply-to ref='nonexistent' type='text/html'/>
  </entry>
</feed>"#;

fn setup(export: &str) -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("blog-export.xml");
    let output = temp_dir.path().join("blogml.xml");
    fs::write(&input, export).unwrap();
    (temp_dir, input, output)
}

#[test]
fn test_end_to_end_conversion() {
    let (_temp_dir, input, output) = setup(EXPORT);
    let converter = BlogConverter::new(&input, &output).unwrap();

    let mut messages = Vec::new();
    let report = converter
        .convert(&mut |m: &ConverterMessage| messages.push(m.clone()))
        .unwrap();

    assert_eq!(report.posts, 1);
    assert_eq!(report.authors, 1);
    assert_eq!(report.categories, 1);
    assert_eq!(report.comments_attached, 1);
    assert_eq!(report.comments_orphaned, 1);
    assert_eq!(report.extended_properties, 1);

    let xml = fs::read_to_string(&output).unwrap();
    assert!(xml.contains("date-created=\"2009-01-01T00:00:00\""));
    assert!(xml.contains("<post id=\"p1\""));
    assert!(xml.contains("<![CDATA[Tech]]>"));
    assert!(xml.contains("<![CDATA[<p>Hello</p>]]>"));
    assert!(xml.contains("user-name=\"Bob\""));
    assert!(!xml.contains("Carol"));
    assert!(xml.contains("name=\"tag:blogger.com,1999:blog-1.settings.BLOG_NAME\""));

    let unexpected = messages
        .iter()
        .filter(|m| matches!(m, ConverterMessage::UnexpectedCategoryScheme { .. }))
        .count();
    assert_eq!(unexpected, 1);
    assert!(matches!(messages.last(), Some(ConverterMessage::WritingBlogMl { .. })));
}

#[test]
fn test_conversion_is_repeatable() {
    let (_temp_dir, input, output) = setup(EXPORT);
    let converter = BlogConverter::new(&input, &output).unwrap();

    let first = converter.transform(&mut Discard).unwrap();
    let second = converter.transform(&mut Discard).unwrap();

    assert_eq!(first.blog.posts.len(), second.blog.posts.len());
    assert_eq!(first.blog.posts[0].comments, second.blog.posts[0].comments);
    assert_eq!(first.blog.created, second.blog.created);
    assert_ne!(first.blog.categories[0].id, second.blog.categories[0].id);
}

#[test]
fn test_missing_input_fails_fast() {
    let temp_dir = TempDir::new().unwrap();
    let err = BlogConverter::new(
        temp_dir.path().join("nope.xml"),
        temp_dir.path().join("out.xml"),
    )
    .err()
    .unwrap();
    assert!(matches!(err, ConvertError::InputNotFound(_)));
}

#[test]
fn test_missing_output_dir_fails_fast() {
    let (temp_dir, input, _) = setup(EXPORT);
    let err = BlogConverter::new(&input, temp_dir.path().join("missing").join("out.xml"))
        .err()
        .unwrap();
    assert!(matches!(err, ConvertError::OutputDirNotFound(_)));
}

#[test]
fn test_failed_conversion_leaves_no_output() {
    let broken = EXPORT.replace("<published>2009-01-01T00:00:00.000Z</published>", "");
    let (temp_dir, input, output) = setup(&broken);
    let converter = BlogConverter::new(&input, &output).unwrap();

    let err = converter.convert(&mut Discard).unwrap_err();
    assert!(matches!(err, ConvertError::MissingElement { element: "published", .. }));
    assert!(!output.exists());
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_empty_feed_uses_feed_updated() {
    let start = EXPORT.find("<entry>").unwrap();
    let end = EXPORT.rfind("</entry>").unwrap() + "</entry>".len();
    let empty = format!("{}{}", &EXPORT[..start], &EXPORT[end..]);
    let (_temp_dir, input, output) = setup(&empty);

    let conversion = BlogConverter::new(&input, &output)
        .unwrap()
        .transform(&mut Discard)
        .unwrap();
    assert!(conversion.blog.posts.is_empty());
    assert_eq!(conversion.blog.created.to_rfc3339(), "2009-03-01T00:00:00+00:00");
}

#[test]
fn test_empty_feed_author_email_converts() {
    let export = EXPORT.replace(
        "<uri>http://alice.example/</uri><email>a@x.com</email></author>\n  <entry>",
        "<uri>http://alice.example/</uri><email></email></author>\n  <entry>",
    );
    assert_ne!(export, EXPORT);
    let (_temp_dir, input, output) = setup(&export);

    let report = BlogConverter::new(&input, &output)
        .unwrap()
        .convert(&mut Discard)
        .unwrap();
    assert_eq!(report.posts, 1);
    assert!(output.exists());
}

#[test]
fn test_missing_feed_updated_aborts() {
    let export = EXPORT.replace("<updated>2009-03-01T00:00:00.000Z</updated>", "");
    let (_temp_dir, input, output) = setup(&export);

    let err = BlogConverter::new(&input, &output)
        .unwrap()
        .convert(&mut Discard)
        .unwrap_err();
    assert!(matches!(err, ConvertError::MissingElement { element: "updated", .. }));
    assert!(!output.exists());
}

#[test]
fn test_missing_entry_id_aborts() {
    let export = EXPORT.replace("<id>p1</id>", "");
    let (_temp_dir, input, output) = setup(&export);

    let err = BlogConverter::new(&input, &output)
        .unwrap()
        .convert(&mut Discard)
        .unwrap_err();
    assert!(matches!(err, ConvertError::MissingElement { element: "id", .. }));
    assert!(!output.exists());
}
