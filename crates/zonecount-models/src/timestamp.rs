//! Frame-index to wall-clock conversions.
//!
//! Reports label every event as `MM:SS`, where minutes are not wrapped at
//! the hour (a 75 minute mark renders as `75:00`).

/// Seconds elapsed at a frame index.
#[inline]
pub fn frame_to_seconds(frame: u64, fps: f64) -> f64 {
    frame as f64 / fps
}

/// Format a frame index as `MM:SS`.
///
/// # Examples
/// ```
/// use zonecount_models::timestamp::format_timestamp;
/// assert_eq!(format_timestamp(90, 30.0), "00:03");
/// assert_eq!(format_timestamp(1830, 30.0), "01:01");
/// ```
pub fn format_timestamp(frame: u64, fps: f64) -> String {
    format_duration(frame_to_seconds(frame, fps))
}

/// Format a number of seconds as `MM:SS`, truncating fractional seconds.
///
/// # Examples
/// ```
/// use zonecount_models::timestamp::format_duration;
/// assert_eq!(format_duration(2.0), "00:02");
/// assert_eq!(format_duration(59.99), "00:59");
/// ```
pub fn format_duration(total_secs: f64) -> String {
    let total_secs = if total_secs.is_finite() { total_secs.max(0.0) } else { 0.0 };
    let minutes = (total_secs / 60.0).floor() as u64;
    let seconds = (total_secs.floor() as u64) % 60;
    format!("{:02}:{:02}", minutes, seconds)
}
