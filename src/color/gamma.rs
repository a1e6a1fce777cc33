//! Gamma correction lookup tables (gamma 2.8, as used by the LED driver).

use super::{Color32, get_blue, get_green, get_red, to_color32};

/// Linear intensity → perceived LED intensity.
#[rustfmt::skip]
pub const GAMMA_TABLE: [u8; 256] = [
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   1,   1,   1,   1,
      1,   1,   1,   1,   1,   1,   1,   1,   1,   2,   2,   2,   2,   2,   2,   2,
      2,   3,   3,   3,   3,   3,   3,   3,   4,   4,   4,   4,   4,   5,   5,   5,
      5,   6,   6,   6,   6,   7,   7,   7,   7,   8,   8,   8,   9,   9,   9,  10,
     10,  10,  11,  11,  11,  12,  12,  13,  13,  13,  14,  14,  15,  15,  16,  16,
     17,  17,  18,  18,  19,  19,  20,  20,  21,  21,  22,  22,  23,  24,  24,  25,
     25,  26,  27,  27,  28,  29,  29,  30,  31,  32,  32,  33,  34,  35,  35,  36,
     37,  38,  39,  39,  40,  41,  42,  43,  44,  45,  46,  47,  48,  49,  50,  50,
     51,  52,  54,  55,  56,  57,  58,  59,  60,  61,  62,  63,  64,  66,  67,  68,
     69,  70,  72,  73,  74,  75,  77,  78,  79,  81,  82,  83,  85,  86,  87,  89,
     90,  92,  93,  95,  96,  98,  99, 101, 102, 104, 105, 107, 109, 110, 112, 114,
    115, 117, 119, 120, 122, 124, 126, 127, 129, 131, 133, 135, 137, 138, 140, 142,
    144, 146, 148, 150, 152, 154, 156, 158, 160, 162, 164, 167, 169, 171, 173, 175,
    177, 180, 182, 184, 186, 189, 191, 193, 196, 198, 200, 203, 205, 208, 210, 213,
    215, 218, 220, 223, 225, 228, 231, 233, 236, 239, 241, 244, 247, 249, 252, 255,
];

/// Perceived intensity → smallest linear intensity that reaches it.
pub const REVERSE_GAMMA_TABLE: [u8; 256] = build_reverse_gamma();

const fn build_reverse_gamma() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut value = 0;
    while value < 256 {
        let mut i = 0;
        while i < 255 && (GAMMA_TABLE[i] as usize) < value {
            i += 1;
        }
        table[value] = i as u8;
        value += 1;
    }
    table
}

/// Gamma-correct a single channel.
#[inline]
pub fn gamma8(x: u8) -> u8 {
    GAMMA_TABLE[x as usize]
}

/// Undo [`gamma8`] (up to table resolution).
#[inline]
pub fn reverse_gamma8(x: u8) -> u8 {
    REVERSE_GAMMA_TABLE[x as usize]
}

/// Gamma-correct all three channels of a packed color.
pub fn gamma32(color: Color32) -> Color32 {
    to_color32(
        gamma8(get_red(color)) as i32,
        gamma8(get_green(color)) as i32,
        gamma8(get_blue(color)) as i32,
    )
}
