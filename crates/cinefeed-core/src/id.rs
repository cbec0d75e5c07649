//! Time-sortable record identifiers.

use parking_lot::Mutex;
use ulid::Ulid;

use crate::error::Error;

/// Monotonic ULID source.
///
/// Ids sort lexicographically by creation time. Every id is strictly greater
/// than all ids previously issued or [observed](Self::observe) by this
/// generator, even within one millisecond or if the wall clock steps back.
pub struct IdGenerator {
    last: Mutex<Option<Ulid>>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Allocate the next id.
    pub fn next_id(&self) -> Result<String, Error> {
        let mut last = self.last.lock();
        let fresh = Ulid::new();
        let next = match *last {
            Some(prev) if fresh <= prev => prev.increment().ok_or(Error::IdSpaceExhausted)?,
            _ => fresh,
        };
        *last = Some(next);
        Ok(next.to_string())
    }

    /// Record an id issued elsewhere (e.g. by a previous process) so that
    /// later ids sort after it. Strings that are not ULIDs are ignored.
    pub fn observe(&self, id: &str) {
        let Ok(seen) = Ulid::from_string(id) else {
            return;
        };
        let mut last = self.last.lock();
        if last.is_none_or(|prev| seen > prev) {
            *last = Some(seen);
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
