//! Text handed to the host's text engine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WritingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Center,
    Left,
    Right,
    /// Letter spacing fills the line.
    LetterJustify,
    WordJustify,
    Stretch,
}

impl TextAlign {
    /// Value of the fontwork alignment property.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Stretch,
            2 => Self::Left,
            3 => Self::Right,
            4 => Self::LetterJustify,
            5 => Self::WordJustify,
            _ => Self::Center,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    pub direction: WritingDirection,
    pub suppress_bullets: bool,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Character formatting shared by every paragraph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CharFormat {
    pub font: Option<String>,
    /// Size in points.
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub small_caps: bool,
    pub shadow: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextContent {
    pub paragraphs: Vec<Paragraph>,
    pub format: CharFormat,
    pub align: Option<TextAlign>,
    /// Characters are stacked top to bottom.
    pub vertical: bool,
}

impl TextContent {
    /// Content with one paragraph per `\r`-separated line of `text`.
    pub fn from_plain(text: &str) -> Self {
        let text = text.strip_suffix('\r').unwrap_or(text);
        Self {
            paragraphs: text.split(['\r', '\n']).map(Paragraph::new).collect(),
            ..Self::default()
        }
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Opaque reference to text owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextHandle(pub u32);
