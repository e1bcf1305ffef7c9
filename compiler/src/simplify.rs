// simplify.rs — Structural-zero reduction and mask consistency
//
// Polynomials are already canonical (see expr.rs), so the remaining work is
// folding the non-polynomial forms and checking each synthesized component
// vector against the output mask it is about to be emitted under.
//
// Preconditions: inputs are canonical polynomials.
// Postconditions: `sqrt(0)` is the literal zero; `sqrt(k^2 m^2)` is `|k m|`.
// Failure modes: `first_violation` reports the lowest position holding a
//   nonzero formula outside the mask; callers turn it into a fatal error.
// Side effects: none.

use crate::basis::Mask;
use crate::expr::{Expr, Operand, Poly};

/// Simplified square root of a polynomial.
pub fn sqrt(p: &Poly) -> Expr {
    if p.is_zero() {
        return Expr::zero();
    }
    match p.square_root() {
        Some(root) => Expr::Abs(root),
        None => Expr::Sqrt(p.clone()),
    }
}

/// Lift polynomial components into expressions.
pub fn lift(components: &[Poly]) -> Vec<Expr> {
    components.iter().cloned().map(Expr::Poly).collect()
}

/// Positions where the components are not the literal zero.
pub fn support(components: &[Expr]) -> Mask {
    components
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_zero())
        .fold(Mask::EMPTY, |acc, (i, _)| acc.union(Mask::single(i)))
}

/// First position outside `mask` whose formula is not structurally zero.
pub fn first_violation(components: &[Expr], mask: Mask) -> Option<usize> {
    components
        .iter()
        .enumerate()
        .find(|(i, c)| !mask.contains(*i) && !c.is_zero())
        .map(|(i, _)| i)
}

/// Whether any component mentions a symbol of `operand`.
pub fn references_operand(components: &[Expr], operand: Operand) -> bool {
    components
        .iter()
        .any(|c| c.free_symbols().iter().any(|s| s.operand == operand))
}

// ── Tests ───────────────────────────────────────────────────────────────────
