//! Writes selected snippets out as pretty-printed XML files.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use super::builder::XmlSnippet;
use super::tree::XmlWriteError;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Xml(#[from] XmlWriteError),
}

/// File naming for a generated corpus: `{prefix}_{NNN}.xml`, with the depth
/// suffix variant used by the set-cover pipeline.
#[derive(Clone, Debug)]
pub struct OutputWriter {
    directory: PathBuf,
    prefix: String,
    with_depth_suffix: bool,
}

impl OutputWriter {
    pub fn new(directory: &Path, prefix: &str, with_depth_suffix: bool) -> Self {
        OutputWriter {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            with_depth_suffix,
        }
    }

    /// Writes one snippet under the given sequence number and returns the
    /// path. Each file is opened, written and closed before returning.
    pub fn write_snippet(&self, number: usize, snippet: &XmlSnippet) -> Result<PathBuf, WriterError> {
        fs::create_dir_all(&self.directory).map_err(|e| WriterError::Io {
            path: self.directory.clone(),
            source: e,
        })?;
        let file_name = if self.with_depth_suffix {
            format!("{}_{number:03}_depth{}.xml", self.prefix, snippet.depth)
        } else {
            format!("{}_{number:03}.xml", self.prefix)
        };
        let path = self.directory.join(file_name);
        let xml = snippet.to_xml_string()?;
        fs::write(&path, xml).map_err(|e| WriterError::Io {
            path: path.clone(),
            source: e,
        })?;
        info!(
            "wrote {} ({} covered paths)",
            path.display(),
            snippet.covered_paths.len()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tree::XmlElement;
    use std::collections::BTreeSet;

    fn snippet() -> XmlSnippet {
        let mut root = XmlElement::new("Root");
        root.text = Some("x".to_string());
        XmlSnippet {
            root,
            covered_paths: BTreeSet::from(["/Root".to_string()]),
            depth: 2,
        }
    }

    #[test]
    fn writes_with_and_without_depth_suffix() {
        let dir = std::env::temp_dir().join("xsd-coverage-writer-test");
        let _ = fs::remove_dir_all(&dir);

        let writer = OutputWriter::new(&dir, "generated", true);
        let path = writer.write_snippet(1, &snippet()).unwrap();
        assert!(path.ends_with("generated_001_depth2.xml"));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));

        let writer = OutputWriter::new(&dir, "pairwise_test", false);
        let path = writer.write_snippet(7, &snippet()).unwrap();
        assert!(path.ends_with("pairwise_test_007.xml"));

        let _ = fs::remove_dir_all(&dir);
    }
}
