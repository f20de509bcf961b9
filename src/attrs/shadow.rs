//! Offset shadow.

use super::StyleContext;
use super::line::transparency;
use crate::common::RgbColor;
use crate::escher::properties::{PropertyId, bits};
use serde::{Deserialize, Serialize};

const DEFAULT_OFFSET_EMU: i32 = 25_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shadow {
    pub color: RgbColor,
    /// Horizontal offset in logical units.
    pub offset_x: i32,
    pub offset_y: i32,
    pub transparency: u8,
}

/// The shadow of a shape, `None` unless the shadow flag is on.
pub fn build(ctx: &StyleContext<'_, '_>) -> Option<Shadow> {
    let props = ctx.props;
    if !props.flag_or(PropertyId::ShadowStyleBooleans, bits::SHADOW, false) {
        return None;
    }
    Some(Shadow {
        color: ctx.color(PropertyId::ShadowColor, 0x80_8080),
        offset_x: ctx.scaler.scale_emu(props.get_i32(PropertyId::ShadowOffsetX, DEFAULT_OFFSET_EMU)),
        offset_y: ctx.scaler.scale_emu(props.get_i32(PropertyId::ShadowOffsetY, DEFAULT_OFFSET_EMU)),
        transparency: transparency(props.get(PropertyId::ShadowOpacity, 0x1_0000)),
    })
}
