use std::fs;

use quire_params::{ImageFormat, Rotation, Source, SourceLocation};

use crate::document::{Document, DocumentBackend, DocumentError, SaveOptions};

const PAGE_BREAK: char = '\u{0C}';

/// Backend for UTF-8 text paginated with form feeds.
///
/// Text pages cannot be rotated or rendered; those operations report
/// [`DocumentError::Unsupported`]. Passwords are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextBackend;

impl PlainTextBackend {
  pub fn new() -> Self {
    Self
  }
}

impl DocumentBackend for PlainTextBackend {
  fn open(&self, source: &Source) -> Result<Box<dyn Document>, DocumentError> {
    let bytes = match &source.location {
      SourceLocation::File { path } => fs::read(path)?,
      SourceLocation::Inline { bytes } => bytes.clone(),
    };
    let text = String::from_utf8(bytes).map_err(|e| DocumentError::Malformed {
      message: format!("'{}' is not valid UTF-8: {}", source.name, e),
    })?;
    Ok(Box::new(TextDocument::parse(&text)))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextDocument {
  pages: Vec<String>,
}

impl TextDocument {
  fn parse(text: &str) -> Self {
    Self {
      pages: text.split(PAGE_BREAK).map(str::to_string).collect(),
    }
  }

  fn page(&self, page: u32) -> Result<&String, DocumentError> {
    page
      .checked_sub(1)
      .and_then(|idx| self.pages.get(idx as usize))
      .ok_or(DocumentError::NoSuchPage { page })
  }

  fn join(&self) -> String {
    let mut out = String::new();
    for (idx, page) in self.pages.iter().enumerate() {
      if idx > 0 {
        out.push(PAGE_BREAK);
      }
      out.push_str(page);
    }
    out
  }
}

impl Document for TextDocument {
  fn page_count(&self) -> u32 {
    self.pages.len() as u32
  }

  fn rotate_page(&mut self, _page: u32, _rotation: Rotation) -> Result<(), DocumentError> {
    Err(DocumentError::Unsupported {
      operation: "page rotation",
    })
  }

  fn extract(&self, pages: &[u32]) -> Result<Box<dyn Document>, DocumentError> {
    let pages = pages
      .iter()
      .map(|page| self.page(*page).cloned())
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Box::new(TextDocument { pages }))
  }

  fn append(&mut self, other: &dyn Document) -> Result<(), DocumentError> {
    let bytes = other.save(&SaveOptions::default())?;
    let text = String::from_utf8(bytes).map_err(|e| DocumentError::Malformed {
      message: e.to_string(),
    })?;
    self.pages.extend(TextDocument::parse(&text).pages);
    Ok(())
  }

  fn render_page(&self, _page: u32, _format: ImageFormat) -> Result<Vec<u8>, DocumentError> {
    Err(DocumentError::Unsupported {
      operation: "page rendering",
    })
  }

  fn save(&self, _options: &SaveOptions) -> Result<Vec<u8>, DocumentError> {
    Ok(self.join().into_bytes())
  }

  fn extension(&self) -> &'static str {
    "txt"
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn open(text: &str) -> Box<dyn Document> {
    PlainTextBackend::new()
      .open(&Source::inline("doc.txt", text))
      .unwrap()
  }

  #[test]
  fn test_pages_split_on_form_feed() {
    let doc = open("one\u{0C}two\u{0C}three");
    assert_eq!(doc.page_count(), 3);

    let part = doc.extract(&[3, 1]).unwrap();
    assert_eq!(part.save(&SaveOptions::default()).unwrap(), b"three\x0Cone");
  }

  #[test]
  fn test_append_and_save() {
    let mut doc = open("a\u{0C}b");
    doc.append(&*open("c")).unwrap();
    assert_eq!(doc.page_count(), 3);
    assert_eq!(doc.save(&SaveOptions::default()).unwrap(), b"a\x0Cb\x0Cc");
  }

  #[test]
  fn test_missing_page_and_unsupported_operations() {
    let mut doc = open("only");
    assert!(matches!(
      doc.extract(&[2]).err().unwrap(),
      DocumentError::NoSuchPage { page: 2 }
    ));
    assert!(matches!(
      doc.rotate_page(1, Rotation::Degrees90),
      Err(DocumentError::Unsupported { .. })
    ));
    assert!(matches!(
      doc.render_page(1, ImageFormat::Png),
      Err(DocumentError::Unsupported { .. })
    ));
  }

  #[test]
  fn test_invalid_utf8_is_malformed() {
    let err = PlainTextBackend::new()
      .open(&Source::inline("bin", vec![0xff, 0xfe]))
      .err()
      .unwrap();
    assert!(matches!(err, DocumentError::Malformed { .. }));
  }

  #[test]
  fn test_reads_file_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.txt");
    fs::write(&path, "x\u{0C}y").unwrap();
    let doc = PlainTextBackend::new().open(&Source::file(&path)).unwrap();
    assert_eq!(doc.page_count(), 2);
  }
}
