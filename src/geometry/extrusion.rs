//! 3-D extrusion settings.
//!
//! Every field carries the format's documented default when its property is
//! absent, so the host never falls back to a default of its own.

use crate::attrs::StyleContext;
use crate::common::RgbColor;
use crate::escher::properties::{PropertyId, bits};
use serde::{Deserialize, Serialize};

const FIXED_ONE: f64 = 65536.0;
/// Intensities are 16.16 fractions; the host wants percent.
const PERCENT: f64 = 655.36;
const WIREFRAME: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadeMode {
    Flat,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionMode {
    Perspective,
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extrusion {
    /// Ambient light, percent.
    pub brightness: f64,
    /// Total depth in logical units.
    pub depth: f64,
    /// Share of the depth in front of the shape plane.
    pub depth_fraction: f64,
    pub diffusion: f64,
    pub line_segments: i32,
    pub light_face: bool,
    pub first_light_harsh: bool,
    pub second_light_harsh: bool,
    pub first_light_level: f64,
    pub second_light_level: f64,
    pub first_light_direction: [f64; 3],
    pub second_light_direction: [f64; 3],
    pub metal: bool,
    pub shade_mode: ShadeMode,
    /// Rotation about the x and y axes in degrees.
    pub rotate_angle: (f64, f64),
    pub auto_rotation_center: bool,
    /// x and y as fractions of the shape, z in logical units.
    pub rotation_center: [f64; 3],
    pub shininess: f64,
    /// Skew amount (percent) and angle (degrees).
    pub skew: (f64, f64),
    pub specularity: f64,
    pub projection: ProjectionMode,
    /// Eye position in logical units.
    pub view_point: [f64; 3],
    pub origin: (f64, f64),
    pub color: Option<RgbColor>,
}

/// Extrusion of the shape, `None` unless 3-D is switched on.
pub fn build(ctx: &StyleContext<'_, '_>) -> Option<Extrusion> {
    let props = ctx.props;
    if !props.flag_or(PropertyId::ThreeDObjectBooleans, bits::THREE_D, false) {
        return None;
    }
    let int = |id, default: i32| props.get_i32(id, default) as f64;
    let emu = |id, default: i32| ctx.scaler.emu_ratio().apply_f64(int(id, default));
    let object_flag = |bit, default| props.flag_or(PropertyId::ThreeDObjectBooleans, bit, default);
    let style_flag = |bit, default| props.flag_or(PropertyId::ThreeDStyleBooleans, bit, default);

    let back = emu(PropertyId::ThreeDExtrudeBackward, 457_200);
    let fore = emu(PropertyId::ThreeDExtrudeForward, 0);
    let depth = back + fore;

    Some(Extrusion {
        brightness: int(PropertyId::ThreeDAmbientIntensity, 20_000) / PERCENT,
        depth,
        depth_fraction: if depth != 0.0 { fore / depth } else { 0.0 },
        diffusion: int(PropertyId::ThreeDDiffuseAmount, 65_536) / PERCENT,
        line_segments: props.get_i32(PropertyId::ThreeDTolerance, 30_000),
        light_face: object_flag(bits::LIGHT_FACE, true),
        first_light_harsh: style_flag(bits::KEY_HARSH, true),
        second_light_harsh: style_flag(bits::FILL_HARSH, true),
        first_light_level: int(PropertyId::ThreeDKeyIntensity, 38_000) / PERCENT,
        second_light_level: int(PropertyId::ThreeDFillIntensity, 38_000) / PERCENT,
        first_light_direction: [
            int(PropertyId::ThreeDKeyX, 50_000),
            int(PropertyId::ThreeDKeyY, 0),
            int(PropertyId::ThreeDKeyZ, 10_000),
        ],
        second_light_direction: [
            int(PropertyId::ThreeDFillX, -50_000),
            int(PropertyId::ThreeDFillY, 0),
            int(PropertyId::ThreeDFillZ, 10_000),
        ],
        metal: object_flag(bits::METALLIC, false),
        shade_mode: if props.get(PropertyId::ThreeDRenderMode, 0) == WIREFRAME {
            ShadeMode::Draft
        } else {
            ShadeMode::Flat
        },
        rotate_angle: (
            int(PropertyId::ThreeDXRotationAngle, 0) / FIXED_ONE,
            int(PropertyId::ThreeDYRotationAngle, 0) / FIXED_ONE,
        ),
        auto_rotation_center: style_flag(bits::ROTATION_CENTER_AUTO, false),
        rotation_center: [
            int(PropertyId::ThreeDRotationCenterX, 0) / FIXED_ONE,
            int(PropertyId::ThreeDRotationCenterY, 0) / FIXED_ONE,
            emu(PropertyId::ThreeDRotationCenterZ, 0),
        ],
        shininess: int(PropertyId::ThreeDShininess, 5),
        skew: (
            int(PropertyId::ThreeDSkewAmount, 50),
            int(PropertyId::ThreeDSkewAngle, -135 * 65_536) / FIXED_ONE,
        ),
        specularity: int(PropertyId::ThreeDSpecularAmount, 0) / 1333.0,
        projection: if style_flag(bits::PARALLEL, false) {
            ProjectionMode::Parallel
        } else {
            ProjectionMode::Perspective
        },
        view_point: [
            emu(PropertyId::ThreeDXViewpoint, 1_250_000),
            emu(PropertyId::ThreeDYViewpoint, -1_250_000),
            emu(PropertyId::ThreeDZViewpoint, 9_000_000),
        ],
        origin: (
            int(PropertyId::ThreeDOriginX, 32_768) / FIXED_ONE,
            int(PropertyId::ThreeDOriginY, -32_768) / FIXED_ONE,
        ),
        color: props
            .contains(PropertyId::ThreeDExtrusionColor)
            .then(|| ctx.color(PropertyId::ThreeDExtrusionColor, 0)),
    })
}
