//! Time and envelope helpers shared by the instance evaluators.

/// Milliseconds since `start_ms`, 0 before the animation started.
#[inline]
pub(crate) fn elapsed_ms(time_ms: u32, start_ms: u32) -> i64 {
    time_ms.saturating_sub(start_ms) as i64
}

/// Elapsed time rescaled to the 0–1000 track scale.
#[inline]
pub(crate) fn normalized_time(elapsed: i64, duration_ms: u16) -> i32 {
    if duration_ms == 0 {
        return 1000;
    }
    (elapsed * 1000 / duration_ms as i64).min(i32::MAX as i64) as i32
}

/// Length of one fade ramp: `fade` is a 0–255 fraction of half the span.
#[inline]
pub(crate) fn fade_time(span: i64, fade: u8) -> i64 {
    span * fade as i64 / (255 * 2)
}

/// Global envelope: ramp up over the first fade time, ramp down over the
/// last one, `peak` in between.
pub(crate) fn fade_envelope(elapsed: i64, duration: i64, fade: u8, peak: u8) -> u8 {
    let fade_time = fade_time(duration, fade);
    let peak = peak as i64;
    let value = if fade_time > 0 && elapsed <= fade_time {
        elapsed * peak / fade_time
    } else if fade_time > 0 && elapsed >= duration - fade_time {
        (duration - elapsed).max(0) * peak / fade_time
    } else {
        peak
    };
    value.clamp(0, 255) as u8
}
