use std::fmt;

use serde::{Deserialize, Serialize};

/// An inclusive, 1-based range of pages.
///
/// A missing `end` means "up to the last page of the document".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRange {
  pub start: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end: Option<u32>,
}

impl PageRange {
  pub fn new(start: u32, end: u32) -> Self {
    Self {
      start,
      end: Some(end),
    }
  }

  /// A range covering exactly one page.
  pub fn single(page: u32) -> Self {
    Self::new(page, page)
  }

  /// A range from `start` to the end of the document.
  pub fn starting_at(start: u32) -> Self {
    Self { start, end: None }
  }

  /// Whether `page` falls inside this range.
  pub fn contains(&self, page: u32) -> bool {
    page >= self.start && self.end.is_none_or(|end| page <= end)
  }

  /// Whether every page of this range exists in a document of `page_count` pages.
  pub fn fits(&self, page_count: u32) -> bool {
    if self.start == 0 || self.start > page_count {
      return false;
    }
    match self.end {
      Some(end) => end >= self.start && end <= page_count,
      None => true,
    }
  }

  /// Pages of this range that exist in a document of `page_count` pages.
  pub fn pages(&self, page_count: u32) -> impl Iterator<Item = u32> {
    let start = self.start.max(1);
    let end = self.end.unwrap_or(page_count).min(page_count);
    start..=end
  }
}

impl fmt::Display for PageRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.end {
      Some(end) => write!(f, "{}-{}", self.start, end),
      None => write!(f, "{}-", self.start),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_contains() {
    let range = PageRange::new(2, 4);
    assert!(!range.contains(1));
    assert!(range.contains(2));
    assert!(range.contains(4));
    assert!(!range.contains(5));

    assert!(PageRange::starting_at(3).contains(1000));
  }

  #[test]
  fn test_fits() {
    assert!(PageRange::new(1, 4).fits(4));
    assert!(!PageRange::single(10).fits(4));
    assert!(!PageRange::new(3, 5).fits(4));
    assert!(!PageRange::new(3, 2).fits(4));
    assert!(!PageRange::single(0).fits(4));
    assert!(PageRange::starting_at(4).fits(4));
    assert!(!PageRange::starting_at(5).fits(4));
  }

  #[test]
  fn test_pages_are_clipped_to_document() {
    let pages: Vec<u32> = PageRange::new(2, 10).pages(4).collect();
    assert_eq!(pages, vec![2, 3, 4]);

    let pages: Vec<u32> = PageRange::single(15).pages(4).collect();
    assert!(pages.is_empty());
  }

  #[test]
  fn test_display() {
    assert_eq!(PageRange::new(10, 10).to_string(), "10-10");
    assert_eq!(PageRange::starting_at(3).to_string(), "3-");
  }
}
