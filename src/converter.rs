use crate::blogml;
use crate::error::{ConvertError, Result};
use crate::messages::{ConverterMessage, MessageSink};
use crate::models::ConversionReport;
use crate::source::SourceFeed;
use crate::transform::{self, Conversion};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts a Blogger ATOM export file into a BlogML file.
pub struct BlogConverter {
    export_path: PathBuf,
    blogml_path: PathBuf,
}

impl BlogConverter {
    /// Checks that the export exists and that the output directory does,
    /// before anything is parsed.
    pub fn new(export_path: impl Into<PathBuf>, blogml_path: impl Into<PathBuf>) -> Result<Self> {
        let export_path = export_path.into();
        let blogml_path = blogml_path.into();

        if !export_path.is_file() {
            return Err(ConvertError::InputNotFound(export_path));
        }
        let out_dir = match blogml_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !out_dir.is_dir() {
            return Err(ConvertError::OutputDirNotFound(out_dir));
        }

        Ok(Self {
            export_path,
            blogml_path,
        })
    }

    pub fn export_path(&self) -> &Path {
        &self.export_path
    }

    pub fn blogml_path(&self) -> &Path {
        &self.blogml_path
    }

    /// Loads and transforms the export without writing anything.
    pub fn transform<S: MessageSink + ?Sized>(&self, sink: &mut S) -> Result<Conversion> {
        info!("Reading Blogger export {}", self.export_path.display());
        let feed = SourceFeed::load(&self.export_path)?;
        debug!(entries = feed.entries.len(), "export loaded");
        transform::transform(feed, Utc::now(), sink)
    }

    /// Runs the whole conversion. On any error the output file is left as it was.
    pub fn convert<S: MessageSink + ?Sized>(&self, sink: &mut S) -> Result<ConversionReport> {
        let conversion = self.transform(sink)?;

        sink.notify(&ConverterMessage::BuildingBlogMl);
        sink.notify(&ConverterMessage::WritingBlogMl {
            path: self.blogml_path.clone(),
        });
        blogml::write_file(&conversion.blog, &self.blogml_path)?;

        Ok(conversion.report)
    }
}
