//! Variable identifiers.
use std::fmt;

/// A variable identifier (1-indexed).
///
/// The identifier doubles as the variable's level: the manager never reorders,
/// so smaller identifiers are always closer to the root.
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved for terminals)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Largest 0-indexed identifier. Ids stay below `u32::MAX`, the level of terminals.
    pub const MAX_INDEX: u32 = u32::MAX - 2;

    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Creates the variable for a 0-indexed identifier, as used by persisted files.
    ///
    /// # Panics
    ///
    /// Panics if `index > Var::MAX_INDEX`.
    pub fn from_index(index: u32) -> Self {
        match Self::checked_from_index(index) {
            Some(var) => var,
            None => panic!("Variable index {} is out of range", index),
        }
    }

    /// Creates the variable for a 0-indexed identifier, or `None` past [`Var::MAX_INDEX`].
    pub fn checked_from_index(index: u32) -> Option<Self> {
        if index > Self::MAX_INDEX {
            return None;
        }
        index.checked_add(1).map(Var)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the 0-indexed identifier, the inverse of [`Var::from_index`].
    pub fn index(self) -> u32 {
        self.0 - 1
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert!(v1 < v2);
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_file_index() {
        let v = Var::from_index(0);
        assert_eq!(v.id(), 1);
        assert_eq!(v.index(), 0);
        assert_eq!(Var::from_index(7).index(), 7);
    }

    #[test]
    fn test_file_index_bounds() {
        assert_eq!(Var::checked_from_index(Var::MAX_INDEX).map(Var::id), Some(u32::MAX - 1));
        assert_eq!(Var::checked_from_index(Var::MAX_INDEX + 1), None);
        assert_eq!(Var::checked_from_index(u32::MAX), None);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_file_index_overflow_panics() {
        Var::from_index(u32::MAX);
    }
}
