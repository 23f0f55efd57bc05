//! Expected-status contracts
//!
//! Every call the engine makes declares up front which status codes satisfy
//! it. Most calls expect a single code; probes against resources that may
//! not exist, and retries/cancels of operations that may already be
//! terminal, accept a set.

use std::fmt;

/// Acceptable status codes for one API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusContract {
    /// Exactly this code
    Exactly(u16),
    /// Any code in the set
    OneOf(&'static [u16]),
}

impl StatusContract {
    /// Whether the observed status satisfies the contract
    pub fn matches(&self, status: u16) -> bool {
        match self {
            StatusContract::Exactly(expected) => status == *expected,
            StatusContract::OneOf(expected) => expected.contains(&status),
        }
    }
}

impl fmt::Display for StatusContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusContract::Exactly(code) => write!(f, "{}", code),
            StatusContract::OneOf(codes) => {
                let list: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
                write!(f, "one of [{}]", list.join(", "))
            }
        }
    }
}

/// Created
pub const CREATED: StatusContract = StatusContract::Exactly(201);
/// Read or update succeeded
pub const OK: StatusContract = StatusContract::Exactly(200);
/// Async operation accepted
pub const ACCEPTED: StatusContract = StatusContract::Exactly(202);
/// Deleted, or already gone
pub const DELETED: StatusContract = StatusContract::OneOf(&[204, 404]);
/// Lookup of a resource that may not exist
pub const MAYBE_FOUND: StatusContract = StatusContract::OneOf(&[200, 404]);
/// Action on an operation that may already be terminal
pub const MAYBE_CONFLICT: StatusContract = StatusContract::OneOf(&[200, 409]);
/// Action that may run synchronously or be queued
pub const ACTION_OK: StatusContract = StatusContract::OneOf(&[200, 202]);
/// Action against a resource that may be missing or already terminal
pub const ACTION_TOLERANT: StatusContract = StatusContract::OneOf(&[200, 202, 404, 409]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly() {
        assert!(OK.matches(200));
        assert!(!OK.matches(201));
    }

    #[test]
    fn test_one_of() {
        assert!(MAYBE_FOUND.matches(200));
        assert!(MAYBE_FOUND.matches(404));
        assert!(!MAYBE_FOUND.matches(500));
        assert!(DELETED.matches(404));
        assert!(MAYBE_CONFLICT.matches(409));
    }

    #[test]
    fn test_display() {
        assert_eq!(OK.to_string(), "200");
        assert_eq!(MAYBE_FOUND.to_string(), "one of [200, 404]");
    }
}
