use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Expiration value for watchers that never expire.
pub const NEVER_EXPIRES: u64 = u64::MAX;

/// Milliseconds since the Unix epoch. Times before the epoch clamp to 0 and
/// times beyond `u64` range clamp to [`NEVER_EXPIRES`].
pub fn to_millis(time: SystemTime) -> u64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since_epoch) => u64::try_from(since_epoch.as_millis()).unwrap_or(NEVER_EXPIRES),
        Err(_) => 0,
    }
}

/// Inverse of [`to_millis`]. [`NEVER_EXPIRES`] maps to `None`.
pub fn from_millis(millis: u64) -> Option<SystemTime> {
    if millis == NEVER_EXPIRES {
        return None;
    }
    UNIX_EPOCH.checked_add(Duration::from_millis(millis))
}

/// return milliseconds
pub fn now_millis() -> u64 {
    to_millis(SystemTime::now())
}
