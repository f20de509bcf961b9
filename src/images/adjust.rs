//! Picture adjustments carried by picture shapes.
//!
//! Most adjustments are handed to the host as declarative attributes. Two
//! cases are applied to the pixels instead: a color key (the host has no
//! attribute for it) and contrast combined with brightness, because the
//! format applies half of the brightness before the contrast and half after,
//! which no single declarative pair can reproduce.

use super::{Graphic, GraphicKind};
use crate::color::ColorResolver;
use crate::common::RgbColor;
use crate::escher::properties::{PropertyId, PropertySet, bits};
use image::{Rgba, RgbaImage};
use log::debug;
use serde::{Deserialize, Serialize};

const FIXED_ONE: i64 = 0x1_0000;
const KEY_TOLERANCE: u8 = 9;

/// How the picture is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawMode {
    #[default]
    Standard,
    Greys,
    Mono,
    Watermark,
}

/// Crop as fractions of the picture size; negative values extend it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Crop {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Crop {
    pub fn from_properties(props: &PropertySet<'_>) -> Self {
        let frac = |id| props.get_i32(id, 0) as f64 / FIXED_ONE as f64;
        Self {
            left: frac(PropertyId::CropFromLeft),
            top: frac(PropertyId::CropFromTop),
            right: frac(PropertyId::CropFromRight),
            bottom: frac(PropertyId::CropFromBottom),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }

    /// Cut the crop out of a bitmap. Extending crops are ignored.
    pub fn apply(&self, img: &RgbaImage) -> RgbaImage {
        let (w, h) = img.dimensions();
        let px = |f: f64, size: u32| ((f.max(0.0) * size as f64).round() as u32).min(size);
        let l = px(self.left, w).min(w.saturating_sub(1));
        let t = px(self.top, h).min(h.saturating_sub(1));
        let cw = w.saturating_sub(l).saturating_sub(px(self.right, w)).max(1);
        let ch = h.saturating_sub(t).saturating_sub(px(self.bottom, h)).max(1);
        image::imageops::crop_imm(img, l, t, cw, ch).to_image()
    }
}

/// Decoded picture adjustments of one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PictureAdjustments {
    /// -100..=100, 0 is unchanged.
    pub contrast: i16,
    /// -100..=100, 0 is unchanged.
    pub brightness: i16,
    /// 1.0 is unchanged.
    pub gamma: f64,
    pub draw_mode: DrawMode,
    pub transparent: Option<RgbColor>,
    pub crop: Crop,
}

impl Default for PictureAdjustments {
    fn default() -> Self {
        Self {
            contrast: 0,
            brightness: 0,
            gamma: 1.0,
            draw_mode: DrawMode::Standard,
            transparent: None,
            crop: Crop::default(),
        }
    }
}

impl PictureAdjustments {
    pub fn from_properties(props: &PropertySet<'_>, colors: &ColorResolver<'_>) -> Self {
        let mut contrast = contrast_percent(props.get_i32(PropertyId::PictureContrast, FIXED_ONE as i32) as i64);
        let mut brightness = (props.get_i32(PropertyId::PictureBrightness, 0) / 327).clamp(-100, 100) as i16;
        let gamma = props.get_i32(PropertyId::PictureGamma, FIXED_ONE as i32) as f64 / FIXED_ONE as f64;

        let gray = 1 << bits::PICTURE_GRAY;
        let bi_level = 1 << bits::PICTURE_BI_LEVEL;
        let draw_mode = match props.get(PropertyId::BlipBooleans, 0) & (gray | bi_level) {
            v if v == gray => DrawMode::Greys,
            v if v == gray | bi_level => DrawMode::Mono,
            0 if contrast == -70 && brightness == 70 => {
                contrast = 0;
                brightness = 0;
                DrawMode::Watermark
            },
            _ => DrawMode::Standard,
        };

        let transparent = props
            .value(PropertyId::PictureTransparent)
            .map(|code| colors.resolve(code, PropertyId::PictureTransparent, props));

        Self {
            contrast,
            brightness,
            gamma,
            draw_mode,
            transparent,
            crop: Crop::from_properties(props),
        }
    }

    /// Nothing to adjust.
    pub fn is_identity(&self) -> bool {
        self.contrast == 0
            && self.brightness == 0
            && self.gamma == 1.0
            && self.draw_mode == DrawMode::Standard
            && self.transparent.is_none()
            && self.crop.is_empty()
    }

    /// Apply to `graphic` whatever cannot stay declarative and return the
    /// adjustments the host still has to apply.
    ///
    /// With `rasterize_crop` a bitmap is cropped in place as well.
    pub fn apply(mut self, graphic: &mut Graphic, rasterize_crop: bool) -> Self {
        let GraphicKind::Bitmap(img) = &mut graphic.kind else {
            return self;
        };

        if let Some(key) = self.transparent.take() {
            mask_color(img, key);
        }

        if self.contrast != 0 && self.brightness != 0 {
            debug!(
                "rasterizing contrast {} with brightness {}",
                self.contrast, self.brightness
            );
            let table = adjust_table(self.brightness, self.contrast, self.gamma);
            for px in img.pixels_mut() {
                for c in &mut px.0[..3] {
                    *c = table[*c as usize];
                }
            }
            match self.draw_mode {
                DrawMode::Greys => to_greys(img),
                DrawMode::Mono => to_mono(img),
                _ => {},
            }
            self.contrast = 0;
            self.brightness = 0;
            self.gamma = 1.0;
            self.draw_mode = DrawMode::Standard;
        }

        if rasterize_crop && !self.crop.is_empty() {
            *img = self.crop.apply(img);
            self.crop = Crop::default();
        }
        self
    }
}

/// Contrast from its 16.16 form, where `0x10000` is unchanged, smaller
/// values flatten towards gray and larger ones steepen up to infinity.
fn contrast_percent(raw: i64) -> i16 {
    if raw == FIXED_ONE {
        return 0;
    }
    let percent = if raw <= 0 {
        0
    } else if raw < FIXED_ONE {
        raw * 50 / FIXED_ONE
    } else if raw >= i32::MAX as i64 {
        100
    } else {
        100 - 50 * FIXED_ONE / raw
    };
    ((percent - 50) * 2) as i16
}

fn adjust_table(brightness: i16, contrast: i16, gamma: f64) -> [u8; 256] {
    let c = contrast.clamp(-100, 100) as f64;
    let slope = if c >= 0.0 {
        128.0 / (128.0 - 1.27 * c)
    } else {
        (128.0 + 1.27 * c) / 128.0
    };
    let offset = brightness.clamp(-100, 100) as f64 * 2.55;
    let inv_gamma = if gamma <= 0.0 || gamma > 10.0 { 1.0 } else { 1.0 / gamma };

    let mut table = [0u8; 256];
    for (x, slot) in table.iter_mut().enumerate() {
        let v = ((x as f64 + offset / 2.0 - 128.0) * slope + 128.0 + offset / 2.0)
            .round()
            .clamp(0.0, 255.0);
        let v = if inv_gamma != 1.0 {
            ((v / 255.0).powf(inv_gamma) * 255.0).round().clamp(0.0, 255.0)
        } else {
            v
        };
        *slot = v as u8;
    }
    table
}

fn mask_color(img: &mut RgbaImage, key: RgbColor) {
    let near = |a: u8, b: u8| a.abs_diff(b) <= KEY_TOLERANCE;
    for px in img.pixels_mut() {
        let Rgba([r, g, b, _]) = *px;
        if near(r, key.r) && near(g, key.g) && near(b, key.b) {
            px.0[3] = 0;
        }
    }
}

fn to_greys(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let l = RgbColor::new(px.0[0], px.0[1], px.0[2]).luminance();
        px.0[..3].fill(l);
    }
}

fn to_mono(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        let l = RgbColor::new(px.0[0], px.0[1], px.0[2]).luminance();
        px.0[..3].fill(if l >= 128 { 0xFF } else { 0 });
    }
}
