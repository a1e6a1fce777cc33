//! Packed `0xRRGGBB` color helpers.

/// A color packed as `0x00RRGGBB`.
pub type Color32 = u32;

/// Black, the color of an LED that is off.
pub const BLACK: Color32 = 0;

/// Fixed-point scaler used by the interpolation helpers.
const INTERPOLATION_SCALER: i64 = 1024;

/// Pack three channels into a [`Color32`]. Channels are clamped to `[0, 255]`.
#[inline]
pub fn to_color32(red: i32, green: i32, blue: i32) -> Color32 {
    let r = red.clamp(0, 255) as u32;
    let g = green.clamp(0, 255) as u32;
    let b = blue.clamp(0, 255) as u32;
    (r << 16) | (g << 8) | b
}

/// Red channel of a packed color.
#[inline]
pub fn get_red(color: Color32) -> u8 {
    ((color >> 16) & 0xFF) as u8
}

/// Green channel of a packed color.
#[inline]
pub fn get_green(color: Color32) -> u8 {
    ((color >> 8) & 0xFF) as u8
}

/// Blue channel of a packed color.
#[inline]
pub fn get_blue(color: Color32) -> u8 {
    (color & 0xFF) as u8
}

/// Per-channel product, normalized so that 255 is the identity.
pub fn mul_colors(a: Color32, b: Color32) -> Color32 {
    let mul = |x: u8, y: u8| x as i32 * y as i32 / 255;
    to_color32(
        mul(get_red(a), get_red(b)),
        mul(get_green(a), get_green(b)),
        mul(get_blue(a), get_blue(b)),
    )
}

/// Per-channel maximum. Used to merge two colors claimed by the same LED.
pub fn combine_colors(a: Color32, b: Color32) -> Color32 {
    to_color32(
        get_red(a).max(get_red(b)) as i32,
        get_green(a).max(get_green(b)) as i32,
        get_blue(a).max(get_blue(b)) as i32,
    )
}

/// Scale a color by an intensity in `[0, 255]`.
pub fn modulate_color(color: Color32, intensity: u8) -> Color32 {
    let scale = |c: u8| c as i32 * intensity as i32 / 255;
    to_color32(
        scale(get_red(color)),
        scale(get_green(color)),
        scale(get_blue(color)),
    )
}

/// Fixed-point interpolation parameter of `time` within `[time1, time2]`,
/// in units of 1/1024.
#[inline]
fn scaled_percent(time1: i32, time2: i32, time: i32) -> i64 {
    let span = (time2 - time1) as i64;
    if span == 0 {
        return INTERPOLATION_SCALER;
    }
    ((time - time1) as i64 * INTERPOLATION_SCALER / span).clamp(0, INTERPOLATION_SCALER)
}

/// Linear blend between two colors keyed at `time1` and `time2`.
pub fn interpolate_colors(
    color1: Color32,
    time1: i32,
    color2: Color32,
    time2: i32,
    time: i32,
) -> Color32 {
    let percent = scaled_percent(time1, time2, time);
    let lerp = |a: u8, b: u8| {
        ((a as i64 * (INTERPOLATION_SCALER - percent) + b as i64 * percent)
            / INTERPOLATION_SCALER) as i32
    };
    to_color32(
        lerp(get_red(color1), get_red(color2)),
        lerp(get_green(color1), get_green(color2)),
        lerp(get_blue(color1), get_blue(color2)),
    )
}

/// Linear blend between two intensities keyed at `time1` and `time2`.
pub fn interpolate_intensity(
    intensity1: u8,
    time1: i32,
    intensity2: u8,
    time2: i32,
    time: i32,
) -> u8 {
    let percent = scaled_percent(time1, time2, time);
    let value = (intensity1 as i64 * (INTERPOLATION_SCALER - percent)
        + intensity2 as i64 * percent)
        / INTERPOLATION_SCALER;
    value.clamp(0, 255) as u8
}

/// Hue wheel: three 85-wide bands, red→green, green→blue, blue→red.
///
/// `position` wraps at 256; `intensity` scales the result (0 is always black).
pub fn rainbow_wheel(position: u8, intensity: u8) -> Color32 {
    let intensity = intensity as i32;
    let pos = position as i32;
    let (r, g, b) = if pos < 85 {
        (255 - pos * 3, pos * 3, 0)
    } else if pos < 170 {
        let p = pos - 85;
        (0, 255 - p * 3, p * 3)
    } else {
        let p = pos - 170;
        (p * 3, 0, 255 - p * 3)
    };
    to_color32(r * intensity / 255, g * intensity / 255, b * intensity / 255)
}
