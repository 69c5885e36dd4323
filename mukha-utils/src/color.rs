//! Colour space conversions used by the feature extractors.
//!
//! Every image handled by mukha is an `RgbImage`, i.e. channels are stored in
//! R, G, B order. The diagnostic thresholds were tuned against OpenCV's 8-bit
//! conventions, so the helpers here emit values on the same scales:
//!
//! * HSV: hue in `0..180` (degrees halved), saturation and value in `0..=255`.
//! * Lightness: CIELAB L* scaled from `0..=100` to `0..=255`.
//! * Grayscale: ITU-R BT.601 luma weights.

/// Convert RGB channels (0-255) to HSV (hue in degrees 0-360, saturation/value 0-1).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let rf = r as f32 / 255.0;
    let gf = g as f32 / 255.0;
    let bf = b as f32 / 255.0;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let hue = if delta.abs() < f32::EPSILON {
        0.0
    } else if (max - rf).abs() < f32::EPSILON {
        60.0 * (((gf - bf) / delta) % 6.0)
    } else if (max - gf).abs() < f32::EPSILON {
        60.0 * (((bf - rf) / delta) + 2.0)
    } else {
        60.0 * (((rf - gf) / delta) + 4.0)
    };

    let hue = if hue < 0.0 { hue + 360.0 } else { hue };
    let saturation = if max.abs() < f32::EPSILON {
        0.0
    } else {
        delta / max
    };
    (hue, saturation, max)
}

/// Convert HSV (hue in degrees, saturation/value 0-1) to RGB channels (0-255).
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    if s <= 0.0 {
        let val = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        return (val, val, val);
    }

    let hue = if h.is_nan() { 0.0 } else { h.rem_euclid(360.0) };
    let c = v * s;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match hue {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |value: f32| -> u8 { ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8 };

    (to_byte(r1), to_byte(g1), to_byte(b1))
}

/// Convert an RGB pixel to OpenCV-scaled HSV: `[hue 0..180, sat 0..=255, val 0..=255]`.
pub fn rgb_to_hsv_u8(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (h, s, v) = rgb_to_hsv(r, g, b);
    let hue = ((h / 2.0).round() as u16 % 180) as u8;
    [
        hue,
        (s * 255.0).round().clamp(0.0, 255.0) as u8,
        (v * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

/// Build an RGB pixel from OpenCV-scaled HSV components.
///
/// Handy for synthesising test patches from the thresholds used by the rules.
pub fn hsv_u8_to_rgb(hue: u8, saturation: u8, value: u8) -> [u8; 3] {
    let (r, g, b) = hsv_to_rgb(
        hue as f32 * 2.0,
        saturation as f32 / 255.0,
        value as f32 / 255.0,
    );
    [r, g, b]
}

/// BT.601 luma of an RGB pixel, rounded to 8 bits.
#[inline]
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// CIELAB lightness of an sRGB pixel (D65), scaled to `0..=255`.
pub fn lab_lightness(r: u8, g: u8, b: u8) -> f32 {
    let y = 0.212_671 * srgb_to_linear(r)
        + 0.715_160 * srgb_to_linear(g)
        + 0.072_169 * srgb_to_linear(b);
    let l = if y > 0.008_856 {
        116.0 * y.cbrt() - 16.0
    } else {
        903.3 * y
    };
    (l * 255.0 / 100.0).clamp(0.0, 255.0)
}
