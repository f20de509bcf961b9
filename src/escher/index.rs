//! Cached sibling-record index for repeated lookups inside one container.
//!
//! Shape containers are searched many times during an import (descriptor,
//! property tables, anchors, text). Scanning them once and keeping the headers
//! avoids re-reading the same bytes for every query.

use super::record::{ByteCursor, HEADER_SIZE, RecordHeader};

/// Headers stored per page. Pages are never reallocated once full.
const PAGE_CAPACITY: usize = 64;

/// Where a [`RecordIndex::seek_to_content`] query starts looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Search from the first record of the container.
    FromBeginning,
    /// Search the records after the current one.
    FromCurrentForward,
    /// Search after the current record, then wrap around to the start and
    /// stop once the original position has been checked.
    FromCurrentRestartIfNotFound,
}

/// Flattened list of sibling record headers.
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    pages: Vec<Vec<RecordHeader>>,
    len: usize,
    current: usize,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan sibling records from the cursor position up to `container_end`
    /// (or the end of the stream), replacing any previous content.
    ///
    /// Returns the number of records indexed. The cursor is left at the end
    /// of the last complete record.
    pub fn consume(&mut self, cursor: &mut ByteCursor<'_>, container_end: u64) -> usize {
        self.clear();
        let limit = container_end.min(cursor.len());
        while cursor.position() + HEADER_SIZE <= limit {
            let Ok(header) = cursor.read_header() else {
                break;
            };
            let header = RecordHeader {
                end: header.end.min(limit),
                ..header
            };
            self.push(header);
            if !cursor.seek_to_end(&header) {
                break;
            }
        }
        self.len
    }

    /// Index the direct children of `container`.
    pub fn consume_container(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        container: &RecordHeader,
    ) -> usize {
        if !cursor.seek_to_content(container) {
            self.clear();
            return 0;
        }
        self.consume(cursor, container.end)
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.len = 0;
        self.current = 0;
    }

    fn push(&mut self, header: RecordHeader) {
        match self.pages.last_mut() {
            Some(page) if page.len() < PAGE_CAPACITY => page.push(header),
            _ => {
                let mut page = Vec::with_capacity(PAGE_CAPACITY);
                page.push(header);
                self.pages.push(page);
            },
        }
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&RecordHeader> {
        self.pages
            .get(index / PAGE_CAPACITY)
            .and_then(|page| page.get(index % PAGE_CAPACITY))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordHeader> {
        self.pages.iter().flatten()
    }

    #[inline]
    pub fn current(&self) -> Option<&RecordHeader> {
        self.get(self.current)
    }

    pub fn first(&mut self) -> Option<&RecordHeader> {
        self.current = 0;
        self.current()
    }

    pub fn last(&mut self) -> Option<&RecordHeader> {
        self.current = self.len.checked_sub(1)?;
        self.current()
    }

    pub fn next(&mut self) -> Option<&RecordHeader> {
        if self.current + 1 >= self.len {
            return None;
        }
        self.current += 1;
        self.current()
    }

    pub fn prev(&mut self) -> Option<&RecordHeader> {
        self.current = self.current.checked_sub(1)?;
        self.current()
    }

    /// Find the next record of `rec_type` and position the cursor on its
    /// content. On failure the current record and the cursor are unchanged.
    pub fn seek_to_content(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        rec_type: u16,
        mode: SeekMode,
    ) -> Option<RecordHeader> {
        let found = self.find(rec_type, mode)?;
        let header = *self.get(found)?;
        if !cursor.seek_to_content(&header) {
            return None;
        }
        self.current = found;
        Some(header)
    }

    /// Position of the next record of `rec_type` without moving anything.
    pub fn find(&self, rec_type: u16, mode: SeekMode) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let matches = |i: usize| self.get(i).is_some_and(|h| h.rec_type == rec_type);
        match mode {
            SeekMode::FromBeginning => (0..self.len).find(|&i| matches(i)),
            SeekMode::FromCurrentForward => (self.current + 1..self.len).find(|&i| matches(i)),
            SeekMode::FromCurrentRestartIfNotFound => (self.current + 1..self.len)
                .find(|&i| matches(i))
                .or_else(|| (0..=self.current).find(|&i| matches(i))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::writer::RecordBuilder;

    fn three_atoms() -> Vec<u8> {
        let mut b = RecordBuilder::new();
        b.atom(0, 0, 0xF00A, &[0; 8]);
        b.atom(0, 0, 0xF00B, &[]);
        b.atom(0, 0, 0xF010, &[0; 16]);
        b.into_bytes()
    }

    #[test]
    fn test_consume_and_navigate() {
        let data = three_atoms();
        let mut cursor = ByteCursor::new(&data);
        let mut index = RecordIndex::new();
        assert_eq!(index.consume(&mut cursor, u64::MAX), 3);
        assert_eq!(index.first().map(|h| h.rec_type), Some(0xF00A));
        assert_eq!(index.next().map(|h| h.rec_type), Some(0xF00B));
        assert_eq!(index.last().map(|h| h.rec_type), Some(0xF010));
        assert!(index.next().is_none());
        assert_eq!(index.prev().map(|h| h.rec_type), Some(0xF00B));
    }

    #[test]
    fn test_seek_modes() {
        let data = three_atoms();
        let mut cursor = ByteCursor::new(&data);
        let mut index = RecordIndex::new();
        index.consume(&mut cursor, u64::MAX);

        index.last();
        assert!(
            index
                .seek_to_content(&mut cursor, 0xF00A, SeekMode::FromCurrentForward)
                .is_none()
        );
        let sp = index
            .seek_to_content(&mut cursor, 0xF00A, SeekMode::FromCurrentRestartIfNotFound)
            .unwrap();
        assert_eq!(cursor.position(), sp.content_begin());
        assert_eq!(index.current().map(|h| h.rec_type), Some(0xF00A));

        assert!(
            index
                .seek_to_content(&mut cursor, 0xF999, SeekMode::FromCurrentRestartIfNotFound)
                .is_none()
        );
        assert_eq!(index.current().map(|h| h.rec_type), Some(0xF00A));
    }

    #[test]
    fn test_pages_grow_past_capacity() {
        let mut b = RecordBuilder::new();
        for _ in 0..(PAGE_CAPACITY * 2 + 5) {
            b.atom(0, 0, 0xF011, &[]);
        }
        b.atom(0, 0, 0xF00D, &[1, 2]);
        let data = b.into_bytes();
        let mut cursor = ByteCursor::new(&data);
        let mut index = RecordIndex::new();
        assert_eq!(index.consume(&mut cursor, u64::MAX), PAGE_CAPACITY * 2 + 6);
        assert_eq!(
            index.find(0xF00D, SeekMode::FromBeginning),
            Some(PAGE_CAPACITY * 2 + 5)
        );
        assert_eq!(index.iter().count(), index.len());
    }
}
