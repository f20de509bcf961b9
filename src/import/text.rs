//! Shape text: client text boxes and fontwork strings.

use crate::common::binary::{parse_utf16le_string, parse_windows1252_string};
use crate::escher::properties::{PropertyId, PropertySet, bits};
use crate::escher::record::{ByteCursor, RecordHeader};
use crate::host::{CharFormat, Paragraph, TextAlign, TextContent, WritingDirection};
use log::trace;

const TEXT_CHARS_ATOM: u16 = 0x0FA0;
const TEXT_BYTES_ATOM: u16 = 0x0FA8;

/// Default fontwork size, 36pt in 16.16.
const DEFAULT_FONT_SIZE: i32 = 36 << 16;

/// Plain text of a client text box.
pub fn client_text(cursor: &ByteCursor<'_>, textbox: &RecordHeader) -> Option<String> {
    let parts: Vec<String> = cursor
        .children(textbox)
        .filter_map(|h| match h.rec_type {
            TEXT_CHARS_ATOM => Some(parse_utf16le_string(cursor.content(&h))),
            TEXT_BYTES_ATOM => Some(parse_windows1252_string(cursor.content(&h))),
            other => {
                trace!("skipping {other:#06x} in client text");
                None
            },
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("\r"))
}

/// Whether `c` belongs to a right-to-left script block.
fn is_rtl_char(c: char) -> bool {
    matches!(
        c as u32,
        0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF | 0x10800..=0x10FFF | 0x1E800..=0x1EFFF
    )
}

/// Writing direction of one paragraph. Paragraphs without strong
/// characters take `fallback`.
pub fn paragraph_direction(text: &str, fallback: WritingDirection) -> WritingDirection {
    for c in text.chars() {
        if is_rtl_char(c) {
            return WritingDirection::RightToLeft;
        }
        if c.is_alphabetic() {
            return WritingDirection::LeftToRight;
        }
    }
    fallback
}

/// Paragraphs of `text` with their writing direction.
pub fn paragraphs(text: &str, fallback: WritingDirection) -> Vec<Paragraph> {
    TextContent::from_plain(text)
        .paragraphs
        .into_iter()
        .map(|mut p| {
            p.direction = paragraph_direction(&p.text, fallback);
            p
        })
        .collect()
}

/// Direction from the shape's bidi property.
pub fn shape_direction(props: &PropertySet<'_>) -> WritingDirection {
    if props.get(PropertyId::TextBidi, 0) != 0 {
        WritingDirection::RightToLeft
    } else {
        WritingDirection::LeftToRight
    }
}

/// Text of a fontwork shape, `None` when it carries no string.
pub fn fontwork_text(props: &PropertySet<'_>) -> Option<TextContent> {
    let text = props.string(PropertyId::GeoTextUnicode)?;
    let flag = |bit| props.flag_or(PropertyId::GeoTextBooleans, bit, false);
    let size = props.get_i32(PropertyId::GeoTextSize, DEFAULT_FONT_SIZE) as f64 / 65536.0;
    Some(TextContent {
        paragraphs: paragraphs(&text, shape_direction(props)),
        format: CharFormat {
            font: props.string(PropertyId::GeoTextFont).filter(|f| !f.is_empty()),
            size: Some(size),
            bold: flag(bits::GT_BOLD),
            italic: flag(bits::GT_ITALIC),
            underline: flag(bits::GT_UNDERLINE),
            strikeout: flag(bits::GT_STRIKE),
            small_caps: flag(bits::GT_SMALLCAPS),
            shadow: flag(bits::GT_SHADOW),
        },
        align: Some(TextAlign::from_raw(props.get(PropertyId::GeoTextAlign, 1))),
        vertical: flag(bits::GT_VERTICAL),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::types::RecordType;
    use crate::escher::writer::{PropertyBuilder, RecordBuilder};

    fn decode(builder: PropertyBuilder, f: impl FnOnce(&PropertySet<'_>)) {
        let count = builder.len() as u16;
        let mut b = RecordBuilder::new();
        b.properties(&builder);
        let bytes = b.into_bytes();
        f(&PropertySet::decode(&bytes[8..], count));
    }

    #[test]
    fn test_client_text_atoms() {
        let mut b = RecordBuilder::new();
        b.container(RecordType::ClientTextbox, |b| {
            b.atom(0, 0, 0x0F9F, &[0, 0, 0, 0]);
            let chars: Vec<u8> = "Hello\rworld".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
            b.atom(0, 0, TEXT_CHARS_ATOM, &chars);
        });
        let data = b.into_bytes();
        let mut cursor = ByteCursor::new(&data);
        let textbox = cursor.read_header().unwrap();
        let text = client_text(&cursor, &textbox).unwrap();
        assert_eq!(TextContent::from_plain(&text).plain_text(), "Hello\nworld");

        let mut b = RecordBuilder::new();
        b.container(RecordType::ClientTextbox, |b| {
            b.atom(0, 0, TEXT_BYTES_ATOM, b"caf\xE9");
        });
        let data = b.into_bytes();
        let mut cursor = ByteCursor::new(&data);
        let textbox = cursor.read_header().unwrap();
        assert_eq!(client_text(&cursor, &textbox).as_deref(), Some("café"));
    }

    #[test]
    fn test_paragraph_directions() {
        let paras = paragraphs("שלום\rHello\r123", WritingDirection::RightToLeft);
        let dirs: Vec<_> = paras.iter().map(|p| p.direction).collect();
        assert_eq!(
            dirs,
            [
                WritingDirection::RightToLeft,
                WritingDirection::LeftToRight,
                WritingDirection::RightToLeft
            ]
        );
        assert_eq!(paragraph_direction("مرحبا", WritingDirection::LeftToRight), WritingDirection::RightToLeft);
    }

    #[test]
    fn test_fontwork_text() {
        let props = PropertyBuilder::new()
            .unicode(PropertyId::GeoTextUnicode, "Hi")
            .unicode(PropertyId::GeoTextFont, "Arial")
            .simple(PropertyId::GeoTextSize, 24 << 16)
            .simple(PropertyId::GeoTextAlign, 3)
            .simple(PropertyId::GeoTextBooleans, 0x0020_0020);
        decode(props, |props| {
            let text = fontwork_text(props).unwrap();
            assert_eq!(text.plain_text(), "Hi");
            assert_eq!(text.format.font.as_deref(), Some("Arial"));
            assert_eq!(text.format.size, Some(24.0));
            assert!(text.format.bold && !text.format.italic);
            assert_eq!(text.align, Some(TextAlign::Right));
        });
        decode(PropertyBuilder::new(), |props| assert!(fontwork_text(props).is_none()));
    }
}
