pub(crate) const MAX_RELATION: i32 = 100;
pub(crate) const MIN_RELATION: i32 = -100;
pub(crate) const MIN_TIME_MULTIPLIER: f64 = 0.1;
pub(crate) const MAX_TIME_MULTIPLIER: f64 = 5.0;
pub(crate) const FRIENDLY_GESTURE_MIN: i32 = 40;
