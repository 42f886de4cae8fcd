use super::*;
use crate::{Binding, Location};

fn sym(name: &str) -> Expr {
    Expr::sym(name)
}

#[test]
fn test_expr_int() {
    let expr = Expr::int(42);
    assert!(matches!(expr, Expr::Int(42)));
    assert_eq!(expr.as_int(), Some(42));
}

#[test]
fn test_expr_sym() {
    let expr = sym("$sp");
    assert_eq!(expr.as_sym(), Some("$sp"));
    assert!(expr.as_int().is_none());
}

#[test]
fn test_reduce_folds_constants() {
    let expr = Expr::add(Expr::int(0x1000), Expr::add(Expr::int(4), Expr::int(4)));
    assert_eq!(expr.reduce(), Expr::int(0x1008));

    let expr = Expr::shl(Expr::int(0x1234), Expr::int(16));
    assert_eq!(expr.reduce(), Expr::int(0x1234_0000));

    let expr = Expr::not(Expr::or(Expr::int(0xf0), Expr::int(0x0f)));
    assert_eq!(expr.reduce(), Expr::int(!0xff));
}

#[test]
fn test_reduce_comparison_is_boolean() {
    assert_eq!(Expr::lt(Expr::int(-1), Expr::int(3)).reduce(), Expr::int(1));
    assert_eq!(Expr::lt(Expr::int(3), Expr::int(3)).reduce(), Expr::int(0));
}

#[test]
fn test_reduce_division_by_zero_is_kept() {
    let expr = Expr::div(Expr::int(7), Expr::int(0));
    assert!(matches!(
        expr.reduce(),
        Expr::Binary {
            op: BinaryOp::Div,
            ..
        }
    ));
}

#[test]
fn test_reduce_stack_adjustment_cancels() {
    // ($sp + -16) + 16
    let expr = Expr::add(Expr::add(sym("$sp"), Expr::int(-16)), Expr::int(16));
    assert_eq!(expr.reduce(), sym("$sp"));
}

#[test]
fn test_reduce_sym_difference_is_constant() {
    // ($sp + 8) - $sp
    let expr = Expr::sub(Expr::add(sym("$sp"), Expr::int(8)), sym("$sp"));
    assert_eq!(expr.reduce(), Expr::int(8));
}

#[test]
fn test_reduce_canonical_constant_last() {
    let expr = Expr::add(Expr::int(4), sym("$a0"));
    assert_eq!(expr.reduce(), Expr::add(sym("$a0"), Expr::int(4)));
}

#[test]
fn test_reduce_is_idempotent() {
    let expr = Expr::sub(
        Expr::add(Expr::mul(sym("$a0"), Expr::int(3)), sym("$a1")),
        Expr::add(sym("$a1"), Expr::int(2)),
    );
    let once = expr.reduce();
    assert_eq!(once.reduce(), once);
}

#[test]
fn test_reduce_unknown_absorbs() {
    let expr = Expr::add(sym("$a0"), Expr::unknown());
    assert!(expr.reduce().is_unknown());
    assert!(Expr::not(Expr::unknown()).reduce().is_unknown());
}

#[test]
fn test_reduce_identities() {
    assert_eq!(Expr::mul(sym("$t0"), Expr::int(1)).reduce(), sym("$t0"));
    assert_eq!(Expr::and(sym("$t0"), Expr::int(0)).reduce(), Expr::int(0));
    assert_eq!(Expr::xor(sym("$t0"), sym("$t0")).reduce(), Expr::int(0));
    assert_eq!(Expr::shr(sym("$t0"), Expr::int(0)).reduce(), sym("$t0"));
    assert_eq!(Expr::not(Expr::not(sym("$t0"))).reduce(), sym("$t0"));
}

#[test]
fn test_bind_substitutes_simultaneously() {
    let mut binding = Binding::default();
    binding.insert(Location::sym("$a0"), sym("$a1"));
    binding.insert(Location::sym("$a1"), Expr::int(5));

    let expr = Expr::add(sym("$a0"), sym("$a1"));
    // $a0 becomes $a1, which is not rebound to 5.
    assert_eq!(
        expr.bind(&binding).reduce(),
        Expr::add(sym("$a1"), Expr::int(5))
    );
}

#[test]
fn test_bind_memory_location() {
    let cell = Expr::deref(Expr::add(sym("$sp"), Expr::int(12)), 4, Some(0x1004));
    let mut binding = Binding::default();
    binding.insert(Location::from_expr(&cell).unwrap(), sym("$ra"));

    let read = Expr::deref(Expr::add(sym("$sp"), Expr::int(12)), 4, None);
    assert_eq!(read.bind(&binding), sym("$ra"));
}

#[test]
fn test_bind_inside_pointer() {
    let mut binding = Binding::default();
    binding.insert(Location::sym("$sp"), Expr::add(sym("$sp"), Expr::int(-16)));

    let read = Expr::deref(Expr::add(sym("$sp"), Expr::int(12)), 4, None);
    let bound = read.bind(&binding).reduce();
    assert_eq!(
        bound,
        Expr::deref(Expr::add(sym("$sp"), Expr::int(-4)), 4, None)
    );
}

#[test]
fn test_substitute() {
    let expr = Expr::add(sym("loc_1000"), Expr::int(4));
    let replaced = expr.substitute(&sym("loc_1000"), &Expr::int(0x1000));
    assert_eq!(replaced.reduce(), Expr::int(0x1004));
}

#[test]
fn test_externals() {
    let expr = Expr::add(
        Expr::deref(Expr::add(sym("$sp"), Expr::int(4)), 4, None),
        Expr::mul(sym("$a0"), Expr::int(2)),
    );
    let ext = expr.externals();
    assert!(ext.contains("$sp"));
    assert!(ext.contains("$a0"));
    assert_eq!(ext.len(), 2);
    assert!(Expr::int(3).externals().is_empty());
}

#[test]
fn test_display() {
    let expr = Expr::deref(Expr::add(sym("$at"), Expr::int(4)), 4, Some(0x1000));
    assert_eq!(expr.to_string(), "dword ptr [$at + 4]");
    assert_eq!(Expr::int(0x2008).to_string(), "0x2008");
    assert_eq!(Expr::int(-16).to_string(), "-0x10");
    assert_eq!(
        Expr::not(Expr::or(sym("$a0"), sym("$a1"))).to_string(),
        "~($a0 | $a1)"
    );
}

#[test]
fn test_reduce_ignores_operand_order() {
    let ab = Expr::add(sym("$a0"), sym("$a1"));
    let ba = Expr::add(sym("$a1"), sym("$a0"));
    assert_eq!(ab.reduce(), ba.reduce());
    assert_eq!(ba.reduce(), Expr::add(sym("$a0"), sym("$a1")));

    // A constant on either side is a coefficient.
    let left = Expr::add(Expr::mul(Expr::int(3), sym("$a0")), sym("$a1"));
    let right = Expr::add(sym("$a1"), Expr::mul(sym("$a0"), Expr::int(3)));
    assert_eq!(left.reduce(), right.reduce());
    assert_eq!(
        Expr::mul(Expr::int(3), sym("$a0")).reduce(),
        Expr::mul(sym("$a0"), Expr::int(3))
    );

    for op in [Expr::and, Expr::or, Expr::xor, Expr::mul] {
        assert_eq!(
            op(sym("$t1"), sym("$t0")).reduce(),
            op(sym("$t0"), sym("$t1")).reduce()
        );
    }
    assert_eq!(
        Expr::and(Expr::int(0xff), sym("$t0")).reduce(),
        Expr::and(sym("$t0"), Expr::int(0xff))
    );
}

#[test]
fn test_reduce_orders_nested_sums() {
    // ($s0 + 4) + ($a0 - 4) and $a0 + $s0 are the same value.
    let expr = Expr::add(
        Expr::add(sym("$s0"), Expr::int(4)),
        Expr::sub(sym("$a0"), Expr::int(4)),
    );
    let once = expr.reduce();
    assert_eq!(once, Expr::add(sym("$a0"), sym("$s0")));
    assert_eq!(once.reduce(), once);

    let expr = Expr::sub(sym("$a1"), Expr::mul(sym("$a0"), Expr::int(2)));
    let once = expr.reduce();
    assert_eq!(once.reduce(), once);
}

#[test]
fn test_bind_memory_location_in_any_term_order() {
    let cell = Expr::deref(Expr::add(sym("$sp"), sym("$a0")), 4, Some(0x1004)).reduce();
    let mut binding = Binding::default();
    binding.insert(Location::from_expr(&cell).unwrap(), sym("$ra"));

    let read = Expr::deref(Expr::add(sym("$a0"), sym("$sp")), 4, None).reduce();
    assert_eq!(read.bind(&binding), sym("$ra"));
}
