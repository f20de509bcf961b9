//! Shaded fills.
//!
//! The format stores a shade as a fill type, an angle, a focus percentage and
//! either two colors (fill and back) or an explicit list of shade colors.
//! Linear, axial and rectangular styles map onto a native gradient. The
//! "shade from center" style has a focus rectangle the gradient model cannot
//! express, so it is drawn into a bitmap instead when the shape has a size.

use super::StyleContext;
use crate::common::RgbColor;
use crate::escher::properties::PropertyId;
use crate::scale::{fixed_angle_to_hundredths, normalize_angle};
use image::{Rgba, RgbaImage};
use log::debug;
use serde::{Deserialize, Serialize};

/// Fill types that produce a shade.
pub const FILL_SHADE_CENTER: u32 = 4;
pub const FILL_SHADE: u32 = 5;
pub const FILL_SHADE_SHAPE: u32 = 6;
pub const FILL_SHADE_SCALE: u32 = 7;
pub const FILL_SHADE_TITLE: u32 = 8;

const RASTER_DPI: f64 = 90.0;
const MAX_RASTER_SIZE: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientStyle {
    #[default]
    Linear,
    Axial,
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// 0.0 at the start of the gradient, 1.0 at its end.
    pub offset: f64,
    pub color: RgbColor,
    /// 0.0 (invisible) to 1.0 (opaque).
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub style: GradientStyle,
    /// Counter-clockwise angle in hundredths of a degree.
    pub angle: i32,
    /// Center of a rectangular gradient, percent of the width.
    pub focus_x: u8,
    /// Center of a rectangular gradient, percent of the height.
    pub focus_y: u8,
    pub stops: Vec<GradientStop>,
}

/// A shade color at a distance from the outer edge (0.0) towards the focus
/// (1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeColor {
    pub distance: f64,
    pub color: RgbColor,
}

/// Shade colors of a shape, back color first.
pub fn shade_colors(ctx: &StyleContext<'_, '_>) -> Vec<ShadeColor> {
    let mut colors = Vec::new();
    if let Some(array) = ctx.props.array(PropertyId::FillShadeColors) {
        if array.element_size() == 8 && !array.is_truncated() {
            for element in array.elements() {
                let code = u32::from_le_bytes([element[0], element[1], element[2], element[3]]);
                let position = i32::from_le_bytes([element[4], element[5], element[6], element[7]]);
                colors.push(ShadeColor {
                    distance: 1.0 - position as f64 / 65536.0,
                    color: ctx.colors.resolve(code, PropertyId::FillColor, ctx.props),
                });
            }
        } else {
            debug!("ignoring malformed shade color list");
        }
    }
    if colors.is_empty() {
        colors.push(ShadeColor {
            distance: 0.0,
            color: ctx.color(PropertyId::FillBackColor, 0xFF_FFFF),
        });
        colors.push(ShadeColor {
            distance: 1.0,
            color: ctx.color(PropertyId::FillColor, 0xFF_FFFF),
        });
    }
    colors
}

/// Native gradient for a shaded fill.
///
/// `opacity` and `back_opacity` are the fill and back opacities in 0..=1.
pub fn build(ctx: &StyleContext<'_, '_>, fill_type: u32, opacity: f64, back_opacity: f64) -> Gradient {
    let props = ctx.props;
    let mut reverse = false;

    let raw_angle = props.get_i32(PropertyId::FillAngle, 0);
    if raw_angle >= 0 {
        reverse = !reverse;
    }
    let mut angle = fixed_angle_to_hundredths(raw_angle);
    if ctx.fill_rotates_with_shape() {
        angle += ctx.rotation;
    }
    let angle = normalize_angle(angle);

    let mut style = GradientStyle::Linear;
    let mut focus = props.get_i32(PropertyId::FillFocus, 0);
    if focus == 0 {
        reverse = !reverse;
    } else if focus < 0 {
        focus = focus.saturating_neg();
        reverse = !reverse;
    }
    if focus > 40 && focus < 60 {
        style = GradientStyle::Axial;
        reverse = !reverse;
    }
    let mut focus_x = focus.clamp(0, 100) as u8;
    let mut focus_y = focus_x;

    match fill_type {
        FILL_SHADE_SHAPE => {
            style = GradientStyle::Rect;
            focus_x = 50;
            focus_y = 50;
            reverse = !reverse;
        },
        FILL_SHADE_CENTER => {
            style = GradientStyle::Rect;
            focus_x = if props.get(PropertyId::FillToRight, 0) == 0x1_0000 { 100 } else { 0 };
            focus_y = if props.get(PropertyId::FillToBottom, 0) == 0x1_0000 { 100 } else { 0 };
            reverse = !reverse;
        },
        _ => {},
    }

    let mut stops: Vec<GradientStop> = shade_colors(ctx)
        .into_iter()
        .map(|shade| GradientStop {
            offset: shade.distance.clamp(0.0, 1.0),
            color: shade.color,
            opacity: back_opacity + (opacity - back_opacity) * shade.distance.clamp(0.0, 1.0),
        })
        .collect();
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    if reverse {
        stops.reverse();
        for stop in &mut stops {
            stop.offset = 1.0 - stop.offset;
        }
    }

    Gradient {
        style,
        angle,
        focus_x,
        focus_y,
        stops,
    }
}

/// Draw a shade-from-center fill into a bitmap at 90 dpi.
///
/// Returns `None` for shapes without a size or too large to rasterize.
pub fn rasterize_rect(ctx: &StyleContext<'_, '_>, shades: &[ShadeColor]) -> Option<RgbaImage> {
    let first = shades.first()?;
    if ctx.bounds.is_empty() {
        return None;
    }
    let width = (ctx.scaler.logical_to_inches(ctx.bounds.width()) * RASTER_DPI) as u32;
    let height = (ctx.scaler.logical_to_inches(ctx.bounds.height()) * RASTER_DPI) as u32;
    if width == 0 || height == 0 || width > MAX_RASTER_SIZE || height > MAX_RASTER_SIZE {
        debug!("shade raster of {width}x{height} pixels skipped");
        return None;
    }

    let focus_x = ctx.props.get_i32(PropertyId::FillToRight, 0) as f64 / 65536.0;
    let focus_y = ctx.props.get_i32(PropertyId::FillToBottom, 0) as f64 / 65536.0;

    let mut img = RgbaImage::new(width, height);
    for (px, py, pixel) in img.enumerate_pixels_mut() {
        let x = px as f64 / width as f64;
        let y = py as f64 / height as f64;
        let (mut dist, span) = edge_distance(x, y, focus_x, focus_y);
        if span != 0.0 {
            dist /= span;
        }
        *pixel = shade_at(shades, first.color, dist);
    }

    if ctx.rotation != 0 && ctx.fill_rotates_with_shape() {
        img = rotate_image(&img, ctx.rotation, first.color);
        if ctx.flip_v {
            image::imageops::flip_vertical_in_place(&mut img);
        }
        if ctx.flip_h {
            image::imageops::flip_horizontal_in_place(&mut img);
        }
    }
    Some(img)
}

/// Distance of `(x, y)` to the nearest edge on its side of the focus, and
/// the distance from that edge to the focus.
fn edge_distance(x: f64, y: f64, fx: f64, fy: f64) -> (f64, f64) {
    match (x < fx, y < fy) {
        (true, true) if x > y => (y, fy),
        (true, true) => (x, fx),
        (true, false) if x > 1.0 - y => (1.0 - y, 1.0 - fy),
        (true, false) => (x, fx),
        (false, true) if 1.0 - x > y => (y, fy),
        (false, true) => (1.0 - x, 1.0 - fx),
        (false, false) if 1.0 - x > 1.0 - y => (1.0 - y, 1.0 - fy),
        (false, false) => (1.0 - x, 1.0 - fx),
    }
}

fn shade_at(shades: &[ShadeColor], first: RgbColor, dist: f64) -> Rgba<u8> {
    let (mut a, mut color_a) = (0.0, first);
    let (mut b, mut color_b) = (1.0, first);
    for shade in shades {
        if a <= shade.distance && shade.distance <= dist {
            a = shade.distance;
            color_a = shade.color;
        }
        if dist < shade.distance && shade.distance <= b {
            b = shade.distance;
            color_b = shade.color;
        }
    }
    let span = b - a;
    let channel = |ca: u8, cb: u8| {
        let mut v = ca as f64;
        if span != 0.0 {
            v += (dist - a) * (cb as f64 - ca as f64) / span;
        }
        (v + 0.5).clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(color_a.r, color_b.r),
        channel(color_a.g, color_b.g),
        channel(color_a.b, color_b.b),
        0xFF,
    ])
}

/// Rotate counter-clockwise by `angle` hundredths of a degree onto a canvas
/// large enough for the result, filling uncovered pixels with `background`.
pub fn rotate_image(src: &RgbaImage, angle: i32, background: RgbColor) -> RgbaImage {
    let (w, h) = src.dimensions();
    let rad = (normalize_angle(angle) as f64 / 100.0).to_radians();
    let (sin, cos) = rad.sin_cos();
    let out_w = ((w as f64 * cos).abs() + (h as f64 * sin).abs()).round().max(1.0) as u32;
    let out_h = ((w as f64 * sin).abs() + (h as f64 * cos).abs()).round().max(1.0) as u32;

    let fill = Rgba([background.r, background.g, background.b, 0xFF]);
    let (scx, scy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (dcx, dcy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let ox = x as f64 + 0.5 - dcx;
        let oy = y as f64 + 0.5 - dcy;
        let sx = ox * cos - oy * sin + scx;
        let sy = ox * sin + oy * cos + scy;
        if sx < 0.0 || sy < 0.0 {
            return fill;
        }
        let (sx, sy) = (sx as u32, sy as u32);
        if sx < w && sy < h { *src.get_pixel(sx, sy) } else { fill }
    })
}
