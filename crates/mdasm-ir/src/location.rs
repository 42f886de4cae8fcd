//! Assignment destinations and bindings.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{Expr, Indirection};

/// Destination of a symbolic assignment.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Location {
    /// The hard-wired zero register. Writes to it are discarded.
    Zero,
    /// Named register or special accumulator (`$sp`, `hi`, ...).
    Sym(String),
    /// Memory cell.
    Mem(Indirection),
}

impl Location {
    #[must_use]
    pub fn sym(name: &str) -> Self {
        Self::Sym(name.to_string())
    }

    /// Interpret an abstracted operand as a destination.
    ///
    /// The integer 0 is how the zero register abstracts, so it maps to
    /// [`Location::Zero`]. Other constants and compound expressions are not
    /// assignable.
    #[must_use]
    pub fn from_expr(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Int(0) => Some(Self::Zero),
            Expr::Sym(name) => Some(Self::Sym(name.clone())),
            Expr::Deref(ind) => Some(Self::Mem(ind.clone())),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_expr(&self) -> Expr {
        match self {
            Self::Zero => Expr::Int(0),
            Self::Sym(name) => Expr::Sym(name.clone()),
            Self::Mem(ind) => Expr::Deref(ind.clone()),
        }
    }
}

impl From<Location> for Expr {
    fn from(loc: Location) -> Self {
        match loc {
            Location::Zero => Self::Int(0),
            Location::Sym(name) => Self::Sym(name),
            Location::Mem(ind) => Self::Deref(ind),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => f.write_str("$zero"),
            Self::Sym(name) => f.write_str(name),
            Self::Mem(ind) => write!(f, "{ind}"),
        }
    }
}

/// Symbolic effect: each location maps to its new value, expressed over the
/// state before the effect took place.
pub type Binding = FxHashMap<Location, Expr>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_expr() {
        assert_eq!(Location::from_expr(&Expr::int(0)), Some(Location::Zero));
        assert_eq!(Location::from_expr(&Expr::sym("$sp")), Some(Location::sym("$sp")));
        assert_eq!(Location::from_expr(&Expr::int(4)), None);
        assert_eq!(
            Location::from_expr(&Expr::add(Expr::sym("$a0"), Expr::int(1))),
            None
        );
    }

    #[test]
    fn test_mem_location_ignores_origin() {
        let a = Expr::deref(Expr::sym("$sp"), 4, Some(0x1000));
        let b = Expr::deref(Expr::sym("$sp"), 4, Some(0x2000));
        assert_eq!(Location::from_expr(&a), Location::from_expr(&b));
    }

    #[test]
    fn test_round_trip_expr() {
        let loc = Location::sym("hi");
        assert_eq!(Location::from_expr(&loc.to_expr()), Some(loc.clone()));
        assert_eq!(Expr::from(loc), Expr::sym("hi"));
    }
}
