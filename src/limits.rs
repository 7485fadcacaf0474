use crate::model::Ms;

/// Merged events in one timeline, boundaries included.
pub const MAX_TIMELINE_EVENTS: usize = 200_000;

/// Candidate slots a single potentiality may carry.
pub const MAX_PLACES_PER_POTENTIAL: usize = 10_000;

/// Quantity of a single need or insert.
pub const MAX_TRANSFORM_QUANTITY: u32 = 100_000;

/// Widest accepted horizon: ten years.
pub const MAX_HORIZON_WIDTH_MS: Ms = 10 * 366 * 24 * 3_600_000;
