//! Primary-key newtype for stored records.
//!
//! [`Pk`] wraps the `i64` row identity SQLite hands out for
//! `INTEGER PRIMARY KEY` columns. The value `0` is reserved: it marks a
//! record that has not been persisted yet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Row identity of a stored record.
///
/// `Pk(0)` ([`Pk::UNASSIGNED`]) means "not yet persisted"; storage assigns
/// strictly positive values starting from 1.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Pk(pub i64);

impl Pk {
    /// The "not yet persisted" key.
    pub const UNASSIGNED: Pk = Pk(0);

    /// Returns `true` once storage has given this key a value.
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Pk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Pk {
    fn from(raw: i64) -> Self {
        Pk(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unassigned() {
        assert_eq!(Pk::default(), Pk::UNASSIGNED);
        assert!(!Pk::default().is_assigned());
        assert!(Pk(1).is_assigned());
    }

    #[test]
    fn pk_display() {
        assert_eq!(format!("{}", Pk(7)), "7");
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&Pk(42)).unwrap();
        assert_eq!(json, "42");
        let back: Pk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Pk(42));
    }
}
