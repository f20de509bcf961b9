//! Picture lookup by blip-store index.
//!
//! The store keeps one [`BlipStoreEntry`] per picture (index 1..N) and the
//! streams those entries point into. Decoded pictures are cached per index;
//! the cache holds at most `capacity` pictures and drops the oldest first.

use super::blip::BlipRecord;
use super::bse::{BlipLocation, BlipStoreEntry};
use super::Graphic;
use crate::common::error::{Error, Result};
use crate::escher::record::{ByteCursor, DEFAULT_MAX_RECORD_LENGTH, RecordHeader};
use crate::escher::types::RecordType;
use log::{debug, trace, warn};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Anything that can hand out decoded pictures by store index.
pub trait BlipSource {
    /// Picture for the 1-based store `index`, `None` when it cannot be had.
    fn blip(&mut self, index: u32) -> Option<Arc<Graphic>>;
}

/// A source without pictures.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlips;

impl BlipSource for NoBlips {
    fn blip(&mut self, _index: u32) -> Option<Arc<Graphic>> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct BlipStore<'data> {
    entries: Vec<BlipStoreEntry>,
    drawing: &'data [u8],
    delay: Option<&'data [u8]>,
    secondary: Option<&'data [u8]>,
    cache: HashMap<u32, Arc<Graphic>>,
    order: VecDeque<u32>,
    capacity: usize,
    max_record_length: u32,
}

impl<'data> BlipStore<'data> {
    /// Store whose inline pictures live in `drawing`.
    pub fn new(drawing: &'data [u8]) -> Self {
        Self {
            entries: Vec::new(),
            drawing,
            delay: None,
            secondary: None,
            cache: HashMap::new(),
            order: VecDeque::new(),
            capacity: DEFAULT_CACHE_CAPACITY,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
        }
    }

    /// Stream `foDelay` offsets point into. Defaults to the drawing stream.
    pub fn with_delay_stream(mut self, data: &'data [u8]) -> Self {
        self.delay = Some(data);
        self
    }

    /// Stream tried when the delay stream does not hold a readable record.
    pub fn with_secondary_stream(mut self, data: &'data [u8]) -> Self {
        self.secondary = Some(data);
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_record_length(mut self, max: u32) -> Self {
        self.max_record_length = max;
        self
    }

    pub fn push(&mut self, entry: BlipStoreEntry) {
        self.entries.push(entry);
    }

    /// Read every BSE child of a blip store container. Entries that cannot
    /// be parsed keep their index slot with no location.
    ///
    /// Returns the number of entries added.
    pub fn read_container(&mut self, cursor: &ByteCursor<'data>, container: &RecordHeader) -> usize {
        let before = self.entries.len();
        for child in cursor.children(container) {
            if child.rec_type != RecordType::Bse as u16 {
                trace!("skipping {:#06x} in blip store", child.rec_type);
                continue;
            }
            match BlipStoreEntry::read(cursor, &child) {
                Ok(entry) => self.entries.push(entry),
                Err(err) => {
                    warn!("unreadable blip store entry at {}: {err}", child.begin);
                    self.entries.push(BlipStoreEntry {
                        blip_type: None,
                        win32_type: 0,
                        mac_type: 0,
                        uid: [0; 16],
                        tag: 0,
                        size: 0,
                        ref_count: 0,
                        delay_offset: u32::MAX,
                        usage: 0,
                        name: None,
                        location: BlipLocation::Delay(u32::MAX),
                    });
                },
            }
        }
        self.entries.len() - before
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a 1-based index.
    pub fn entry(&self, index: u32) -> Option<&BlipStoreEntry> {
        let slot = (index as usize).checked_sub(1)?;
        self.entries.get(slot)
    }

    pub fn entries(&self) -> &[BlipStoreEntry] {
        &self.entries
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Decoded picture for a 1-based index, from the cache when possible.
    pub fn get(&mut self, index: u32) -> Result<Arc<Graphic>> {
        if let Some(hit) = self.cache.get(&index) {
            debug!("picture {index} from cache");
            return Ok(Arc::clone(hit));
        }
        let entry = self
            .entry(index)
            .ok_or_else(|| Error::NotFound(format!("picture {index} of {}", self.entries.len())))?;
        let graphic = Arc::new(self.load(entry)?);
        self.remember(index, Arc::clone(&graphic));
        Ok(graphic)
    }

    fn load(&self, entry: &BlipStoreEntry) -> Result<Graphic> {
        let candidates: Vec<(&'data [u8], u64)> = match entry.location {
            BlipLocation::Inline(at) => vec![(self.drawing, at)],
            BlipLocation::Delay(at) => [Some(self.delay.unwrap_or(self.drawing)), self.secondary]
                .into_iter()
                .flatten()
                .map(|stream| (stream, at as u64))
                .collect(),
        };

        let mut last = Error::NotFound("picture has no readable location".into());
        for (stream, offset) in candidates {
            match self.decode_at(stream, offset) {
                Ok(graphic) => return Ok(graphic),
                Err(err) => {
                    debug!("picture at {offset} not readable: {err}");
                    last = err;
                },
            }
        }
        Err(last)
    }

    fn decode_at(&self, stream: &'data [u8], offset: u64) -> Result<Graphic> {
        let mut cursor = ByteCursor::new(stream).with_max_record_length(self.max_record_length);
        if !cursor.seek(offset) {
            return Err(Error::NotFound(format!("offset {offset} past end of stream")));
        }
        BlipRecord::read(&mut cursor)?.decode()
    }

    fn remember(&mut self, index: u32, graphic: Arc<Graphic>) {
        if self.capacity == 0 {
            return;
        }
        while self.cache.len() >= self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.cache.remove(&oldest);
        }
        self.cache.insert(index, graphic);
        self.order.push_back(index);
    }
}

impl BlipSource for BlipStore<'_> {
    fn blip(&mut self, index: u32) -> Option<Arc<Graphic>> {
        match self.get(index) {
            Ok(graphic) => Some(graphic),
            Err(err) => {
                warn!("picture {index}: {err}");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::writer::RecordBuilder;

    /// A 1x1 24-bit DIB picture record.
    fn dib_record(rgb: [u8; 3]) -> Vec<u8> {
        let mut content = vec![0u8; 17];
        content.extend_from_slice(&40u32.to_le_bytes());
        content.extend_from_slice(&1i32.to_le_bytes());
        content.extend_from_slice(&1i32.to_le_bytes());
        content.extend_from_slice(&1u16.to_le_bytes());
        content.extend_from_slice(&24u16.to_le_bytes());
        content.extend_from_slice(&[0; 24]);
        content.extend_from_slice(&[rgb[2], rgb[1], rgb[0], 0]);
        let mut b = RecordBuilder::new();
        b.atom(0, 0x7A8, 0xF01F, &content);
        b.into_bytes()
    }

    fn delay_entry(offset: u32) -> BlipStoreEntry {
        BlipStoreEntry {
            blip_type: Some(super::super::BlipType::Dib),
            win32_type: 7,
            mac_type: 7,
            uid: [0; 16],
            tag: 0xFF,
            size: 0,
            ref_count: 1,
            delay_offset: offset,
            usage: 0,
            name: None,
            location: BlipLocation::Delay(offset),
        }
    }

    #[test]
    fn test_delay_stream_lookup_and_cache() {
        let mut delay = dib_record([1, 2, 3]);
        let second = delay.len() as u32;
        delay.extend(dib_record([4, 5, 6]));

        let mut store = BlipStore::new(&[]).with_delay_stream(&delay);
        store.push(delay_entry(0));
        store.push(delay_entry(second));

        let a = store.get(2).unwrap();
        assert_eq!(a.as_bitmap().unwrap().get_pixel(0, 0).0, [4, 5, 6, 0xFF]);
        let again = store.get(2).unwrap();
        assert!(Arc::ptr_eq(&a, &again));
        assert!(matches!(store.get(0), Err(Error::NotFound(_))));
        assert!(matches!(store.get(3), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_falls_back_to_secondary_stream() {
        let good = dib_record([9, 9, 9]);
        let bad = vec![0u8; good.len()];
        let mut store = BlipStore::new(&[])
            .with_delay_stream(&bad)
            .with_secondary_stream(&good);
        store.push(delay_entry(0));
        assert!(store.blip(1).is_some());
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut delay = Vec::new();
        let mut offsets = Vec::new();
        for i in 0..4u8 {
            offsets.push(delay.len() as u32);
            delay.extend(dib_record([i, i, i]));
        }
        let mut store = BlipStore::new(&[]).with_delay_stream(&delay).with_capacity(2);
        for off in offsets {
            store.push(delay_entry(off));
        }
        for i in 1..=4 {
            store.get(i).unwrap();
        }
        assert_eq!(store.cached_len(), 2);
    }

    #[test]
    fn test_read_container_with_inline_picture() {
        let pic = dib_record([7, 8, 9]);
        let mut bse = vec![0x07, 0x07];
        bse.extend_from_slice(&[0; 16]);
        bse.extend_from_slice(&0xFFu16.to_le_bytes());
        bse.extend_from_slice(&(pic.len() as u32).to_le_bytes());
        bse.extend_from_slice(&1u32.to_le_bytes());
        bse.extend_from_slice(&0u32.to_le_bytes());
        bse.extend_from_slice(&[0; 4]);
        bse.extend_from_slice(&pic);

        let mut b = RecordBuilder::new();
        b.begin_container_with_instance(RecordType::BStoreContainer, 1);
        b.atom(2, 7, RecordType::Bse as u16, &bse);
        b.end_container();
        let bytes = b.into_bytes();

        let mut cursor = ByteCursor::new(&bytes);
        let header = cursor.read_header().unwrap();
        let mut store = BlipStore::new(&bytes);
        assert_eq!(store.read_container(&cursor, &header), 1);
        assert!(store.entry(1).unwrap().is_inline());
        let graphic = store.get(1).unwrap();
        assert_eq!(graphic.pixel_size(), Some((1, 1)));
    }
}
