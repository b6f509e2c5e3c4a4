use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// A handle to a Boolean function stored in a [`Bdd`][crate::bdd::Bdd] manager.
///
/// The lowest bit is the complement flag, the remaining bits hold the node index.
/// Since nodes are hash-consed, two handles are equal iff the functions are equal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Ref(u32);

impl Ref {
    pub const fn new(index: u32, negated: bool) -> Self {
        Self((index << 1) | negated as u32)
    }

    pub const fn positive(index: u32) -> Self {
        Self::new(index, false)
    }

    pub const fn negative(index: u32) -> Self {
        Self::new(index, true)
    }

    /// Return the index of the referenced node.
    pub const fn index(self) -> usize {
        (self.0 >> 1) as usize
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 != 0
    }

    /// Return the same node with the complement flag cleared.
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Return the internal representation of the reference.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}
