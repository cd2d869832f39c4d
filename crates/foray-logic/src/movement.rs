//! Movement simulation — scalar progress along a travel leg.
//!
//! Movement is an abstract progress value in [0, 1], not a trajectory.
//! A leg of `distance` advances by `speed × tick / distance` per tick and
//! arrival is the clamp boundary itself, so a leg that completes mid-tick
//! costs no extra tick.

/// Advance progress along a leg.
///
/// A non-positive `distance` means the destination is where the team
/// already stands, which reads as instant arrival.
pub fn advance_progress(progress: f32, speed: f32, tick_secs: f32, distance: f32) -> f32 {
    if distance <= 0.0 {
        return 1.0;
    }
    (progress + speed * tick_secs / distance).clamp(0.0, 1.0)
}

/// A team travels at its slowest member's pace.
///
/// Empty teams (or teams whose every member reports a non-positive speed)
/// yield 0.0 and simply do not move.
pub fn team_speed(member_speeds: &[f32]) -> f32 {
    match member_speeds.iter().copied().reduce(f32::min) {
        Some(slowest) => slowest.max(0.0),
        None => 0.0,
    }
}
