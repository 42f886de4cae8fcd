//! Function effect summaries.
//!
//! A summary maps each register to its value on return, expressed over the
//! register state at function entry. Callers apply it in place of the
//! callee body during backtracking.

use std::sync::Arc;

use mdasm_ir::{Binding, Expr, Location};
use mdasm_isa::{Instruction, REG_AT, REG_RA, REG_SP, VOLATILE_REGS, reg_name};
use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, trace, trace_span};

use crate::backtrace::{AccessKind, BacktraceOptions, BacktraceTrace, Backtracker, TraceOrigin};

/// When a summary's pending traces apply at a call site.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TraceGate {
    #[default]
    Always,
    /// Only at call sites that save a return address and are not `jr $ra`,
    /// unless the summary stands in for a concrete target.
    SavingCallSite,
}

/// Which callee a summary is being applied for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallTarget {
    /// Target not resolved yet.
    Default,
    Address(u64),
}

/// Register effect of a function plus the backtraces it asks callers for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunctionSummary {
    pub binding: Binding,
    pub backtracked_for: Vec<BacktraceTrace>,
    pub gate: TraceGate,
}

impl FunctionSummary {
    #[must_use]
    pub fn new(binding: Binding) -> Self {
        Self {
            binding,
            ..Self::default()
        }
    }

    /// Value of `reg` on return, if the summary records it.
    #[must_use]
    pub fn value_of(&self, reg: u8) -> Option<&Expr> {
        self.binding.get(&Location::sym(reg_name(reg)))
    }

    /// Whether the function returns with `reg` unchanged.
    #[must_use]
    pub fn preserves(&self, reg: u8) -> bool {
        self.value_of(reg)
            .and_then(Expr::as_sym)
            .is_some_and(|name| name == reg_name(reg))
    }

    /// Pending traces to follow when this summary is applied for `target`
    /// at `call_site`.
    #[must_use]
    pub fn traces_for_call(
        &self,
        target: CallTarget,
        call_site: Option<&Instruction>,
    ) -> &[BacktraceTrace] {
        let pass = match (self.gate, target) {
            (TraceGate::Always, _) | (TraceGate::SavingCallSite, CallTarget::Address(_)) => true,
            (TraceGate::SavingCallSite, CallTarget::Default) => call_site
                .is_some_and(|call| call.props.saves_ip() && !call.is_return_via_link()),
        };
        if pass { &self.backtracked_for[..] } else { &[] }
    }
}

/// Conservative summary for a callee that has not been analyzed.
///
/// Every caller-saved register becomes unknown and `$ra` is traced as an
/// executed address, so the return lands back in the caller.
#[must_use]
pub fn default_function_summary() -> FunctionSummary {
    let binding = VOLATILE_REGS
        .iter()
        .map(|&reg| (Location::sym(reg_name(reg)), Expr::Unknown))
        .collect();
    let ra = Expr::sym(reg_name(REG_RA));
    FunctionSummary {
        binding,
        backtracked_for: vec![BacktraceTrace::new(ra, TraceOrigin::Default, AccessKind::Exec)],
        gate: TraceGate::SavingCallSite,
    }
}

/// Summarize the function entered at `entry` and left through
/// `return_addresses`.
///
/// For each register `$at` through `$ra`, backtraces its value from every
/// return site (normalized to the end of its block) back to the entry
/// snapshot. Values are compared in reduced form. If all sites agree on one
/// value, that is the register's summary; otherwise the register is unknown.
pub fn summarize_function<B: Backtracker + ?Sized>(
    tracer: &B,
    entry: u64,
    return_addresses: &[u64],
) -> FunctionSummary {
    let _span = trace_span!("summarize_function", entry).entered();

    let return_sites: Vec<u64> = return_addresses
        .iter()
        .map(|&ret| tracer.block_end(ret).unwrap_or(ret))
        .collect();

    let mut binding = Binding::default();
    for reg in REG_AT..=REG_RA {
        let name = reg_name(reg);
        let target = Expr::sym(name);
        let mut values: Vec<Expr> = Vec::new();
        for &site in &return_sites {
            let options = BacktraceOptions {
                include_start: true,
                snapshot_addr: Some(entry),
                origin: Some(site),
            };
            for value in tracer.backtrace(&target, site, &options) {
                let value = value.reduce();
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        let value = match values.as_slice() {
            [single] => single.clone(),
            _ => Expr::Unknown,
        };
        trace!(reg = name, %value, candidates = values.len(), "register summarized");
        binding.insert(Location::sym(name), value);
    }

    check_stack_restored(entry, &binding);
    debug!(entry, return_sites = return_sites.len(), "function summarized");
    FunctionSummary::new(binding)
}

/// Diagnose a function whose `$sp` on return is not `$sp + constant`.
fn check_stack_restored(entry: u64, binding: &Binding) {
    let sp_name = reg_name(REG_SP);
    let Some(sp) = binding.get(&Location::sym(sp_name)) else {
        return;
    };
    let delta = Expr::sub(sp.clone(), Expr::sym(sp_name)).reduce();
    if delta.as_int().is_none() {
        debug!(entry, %sp, "$sp on return is not a constant offset from entry");
    }
}

/// Function known to the driver, with its summary slot.
///
/// The slot is written once. Its lock is held while the summary is
/// computed, so concurrent requests for the same function wait for the one
/// computation in flight.
#[derive(Debug)]
pub struct FunctionRecord {
    pub entry: u64,
    pub return_addresses: Vec<u64>,
    summary: Mutex<Option<Arc<FunctionSummary>>>,
}

impl FunctionRecord {
    #[must_use]
    pub const fn new(entry: u64, return_addresses: Vec<u64>) -> Self {
        Self {
            entry,
            return_addresses,
            summary: Mutex::new(None),
        }
    }

    /// Summary computed so far, if any.
    #[must_use]
    pub fn summary(&self) -> Option<Arc<FunctionSummary>> {
        self.summary.lock().clone()
    }

    /// Summarize through `tracer`, reusing an earlier result.
    ///
    /// The tracer must not summarize this same record again while this call
    /// is running; recursion guards belong to the driver.
    pub fn summarize<B: Backtracker + ?Sized>(&self, tracer: &B) -> Arc<FunctionSummary> {
        let mut slot = self.summary.lock();
        if let Some(summary) = slot.as_ref() {
            return Arc::clone(summary);
        }
        let summary = Arc::new(summarize_function(tracer, self.entry, &self.return_addresses));
        *slot = Some(Arc::clone(&summary));
        summary
    }
}

/// Summarize independent functions in parallel.
pub fn summarize_functions<B: Backtracker + Sync + ?Sized>(
    tracer: &B,
    functions: &[FunctionRecord],
) -> Vec<Arc<FunctionSummary>> {
    debug!(functions = functions.len(), "summarizing functions");
    functions.par_iter().map(|function| function.summarize(tracer)).collect()
}
