//! Coarse-grained cancellation for long decodes.
//!
//! The decoder is synchronous and single-threaded; it never suspends for
//! I/O internally. Callers that need to abandon work in progress poll a
//! [`CancelToken`] at natural checkpoints — once per decoded class, once
//! per compared pair — rather than after every instruction or constant
//! pool entry.

use crate::error::DecodeError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub trait CancelToken {
    fn is_cancelled(&self) -> bool;

    fn check(&self) -> Result<(), DecodeError> {
        if self.is_cancelled() {
            Err(DecodeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Never reports cancellation. The default for callers that don't need it.
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Cancels once a wall-clock deadline has passed.
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(duration: Duration) -> Deadline {
        Deadline { at: Instant::now() + duration }
    }
}

impl CancelToken for Deadline {
    fn is_cancelled(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// A flag that can be flipped from another thread to request cancellation.
pub struct Flag(AtomicBool);

impl Flag {
    pub fn new() -> Flag {
        Flag(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Default for Flag {
    fn default() -> Flag {
        Flag::new()
    }
}

impl CancelToken for Flag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_cancel_always_succeeds() {
        assert!(NeverCancel.check().is_ok());
    }

    #[test]
    fn flag_cancels_once_set() {
        let flag = Flag::new();
        assert!(flag.check().is_ok());
        flag.cancel();
        assert_eq!(flag.check(), Err(DecodeError::Cancelled));
    }

    #[test]
    fn deadline_in_the_past_is_already_cancelled() {
        let deadline = Deadline::after(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(deadline.is_cancelled());
    }
}
