//! Call-site hooks: `$t9` propagation and cross-references.

use mdasm_cfg::{
    AddressBindings, BacktraceOptions, Backtracker, CallTarget, default_function_summary,
    possible_targets, propagate_call_context,
};
use mdasm_ir::{Expr, Location};
use mdasm_isa::{ByteStream, Instruction, Mips, MipsConfig};

struct NullTracer;

impl Backtracker for NullTracer {
    fn backtrace(&self, expr: &Expr, _start: u64, _options: &BacktraceOptions) -> Vec<Expr> {
        vec![expr.clone()]
    }

    fn block_end(&self, _address: u64) -> Option<u64> {
        None
    }
}

fn decode(word: u32, address: u64) -> Instruction {
    let mips = Mips::new(MipsConfig::default()).unwrap();
    let code = word.to_be_bytes();
    mips.decode(&mut ByteStream::new(&code, address)).unwrap()
}

#[test]
fn test_jalr_t9_binds_callee_entry() {
    let call = decode(0x0320_F809, 0x1000); // jalr $t9
    let mut bindings = AddressBindings::default();

    // The target arrives unreduced; it is normalized before use as a key.
    let target = Expr::add(Expr::int(0x4000), Expr::int(0x10));
    assert!(propagate_call_context(&NullTracer, &call, &target, &mut bindings));

    let entry = &bindings[&Expr::int(0x4010)];
    assert_eq!(entry[&Location::sym("$t9")], Expr::int(0x4010));

    // An existing value is kept.
    assert!(!propagate_call_context(&NullTracer, &call, &target, &mut bindings));
    assert_eq!(bindings.len(), 1);
}

#[test]
fn test_other_calls_do_not_bind() {
    let mut bindings = AddressBindings::default();
    let target = Expr::int(0x4000);

    let jalr_t0 = decode(0x0100_F809, 0x1000); // jalr $t0
    assert!(!propagate_call_context(&NullTracer, &jalr_t0, &target, &mut bindings));

    let jalr_rd = decode(0x0320_2009, 0x1000); // jalr $a0, $t9
    assert!(!propagate_call_context(&NullTracer, &jalr_rd, &target, &mut bindings));

    let jal = decode(0x0C00_1000, 0x1000);
    assert!(!propagate_call_context(&NullTracer, &jal, &target, &mut bindings));
    assert!(bindings.is_empty());
}

#[test]
fn test_unresolved_call_uses_default_summary() {
    let call = decode(0x0320_F809, 0x1000); // jalr $t9
    let targets: Vec<_> = possible_targets(&call).collect();
    assert_eq!(targets, vec![Expr::sym("$t9")]);

    let summary = default_function_summary();
    let traces = summary.traces_for_call(CallTarget::Default, Some(&call));
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].expr, Expr::sym("$ra"));
}
