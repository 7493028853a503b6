use crate::api::Time;

/// Visual emphasis put on the target of a deep link, fading out after a
/// fixed duration
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Highlight {
    since: Time,
    duration: chrono::Duration,
}

impl Highlight {
    /// Negative durations are taken as zero
    pub fn start(now: Time, duration_ms: i64) -> Highlight {
        Highlight {
            since: now,
            duration: chrono::Duration::milliseconds(std::cmp::max(duration_ms, 0)),
        }
    }

    pub fn is_active(&self, now: Time) -> bool {
        now >= self.since && self.ends_at().map_or(true, |end| now < end)
    }

    /// None if the end lies beyond representable time, ie. never fades
    pub fn ends_at(&self) -> Option<Time> {
        self.since.checked_add_signed(self.duration)
    }
}
