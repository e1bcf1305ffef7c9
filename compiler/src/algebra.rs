// algebra.rs — Multivector maps over symbolic coefficients
//
// The structural operations of R(3,0,1) applied to 16-component vectors of
// polynomials: the three bilinear products from the structure constants, the
// vee product through duality, the sign-pattern involutions, and the norms.
// Nothing here knows about registered types; masks enter only through
// `generic` and `select`.
//
// Preconditions: none.
// Postconditions: every result is in canonical polynomial form, so a
//   structurally zero component compares equal to `Poly::zero()`.
// Failure modes: none.
// Side effects: none.

use crate::basis::{grade, structure_constants, Mask, ProductKind, BASIS_COUNT};
use crate::expr::{Expr, Operand, Poly, Sym};
use crate::simplify;

/// Sign applied per grade by reversion: `(-1)^(k(k-1)/2)`.
const REVERSE_SIGN: [i64; 5] = [1, 1, -1, -1, 1];

/// Sign applied per grade by Clifford conjugation: `(-1)^(k(k+1)/2)`.
const CONJUGATE_SIGN: [i64; 5] = [1, -1, -1, 1, 1];

/// A general multivector with symbolic coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multivector {
    pub components: [Poly; BASIS_COUNT],
}

impl Default for Multivector {
    fn default() -> Self {
        Self::zero()
    }
}

impl Multivector {
    pub fn zero() -> Self {
        Multivector {
            components: std::array::from_fn(|_| Poly::zero()),
        }
    }

    pub fn from_fn(f: impl FnMut(usize) -> Poly) -> Self {
        Multivector {
            components: std::array::from_fn(f),
        }
    }

    /// Free symbols of `operand` at every position in `mask`, literal zero
    /// elsewhere.
    pub fn generic(operand: Operand, mask: Mask) -> Self {
        Self::from_fn(|i| {
            if mask.contains(i) {
                Poly::symbol(Sym::new(operand, i))
            } else {
                Poly::zero()
            }
        })
    }

    /// Positions holding a nonzero formula.
    pub fn support(&self) -> Mask {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .fold(Mask::EMPTY, |acc, (i, _)| acc.union(Mask::single(i)))
    }

    fn map_signed(&self, sign: impl Fn(usize) -> i64) -> Self {
        Self::from_fn(|i| self.components[i].scale(sign(i)))
    }

    // ── Unary maps ──────────────────────────────────────────────────────────

    pub fn neg(&self) -> Self {
        self.map_signed(|_| -1)
    }

    pub fn reverse(&self) -> Self {
        self.map_signed(|i| REVERSE_SIGN[grade(i)])
    }

    pub fn conjugate(&self) -> Self {
        self.map_signed(|i| CONJUGATE_SIGN[grade(i)])
    }

    /// Index reversal: position `i` receives position `15 - i`.
    pub fn dual(&self) -> Self {
        Self::from_fn(|i| self.components[BASIS_COUNT - 1 - i].clone())
    }

    /// Keep only the positions in `mask`.
    pub fn select(&self, mask: Mask) -> Self {
        Self::from_fn(|i| {
            if mask.contains(i) {
                self.components[i].clone()
            } else {
                Poly::zero()
            }
        })
    }

    /// `sqrt(<a * ~a>_0)`, simplified.
    pub fn norm(&self) -> Expr {
        let squared = self.geometric(&self.reverse());
        simplify::sqrt(&squared.components[0])
    }

    /// Norm of the dual.
    pub fn inorm(&self) -> Expr {
        self.dual().norm()
    }

    // ── Binary maps ─────────────────────────────────────────────────────────

    pub fn add(&self, other: &Multivector) -> Self {
        Self::from_fn(|i| self.components[i].add(&other.components[i]))
    }

    pub fn sub(&self, other: &Multivector) -> Self {
        Self::from_fn(|i| self.components[i].sub(&other.components[i]))
    }

    pub fn product(&self, other: &Multivector, kind: ProductKind) -> Self {
        let rows = structure_constants(kind);
        Self::from_fn(|out| {
            let mut acc = Poly::zero();
            for term in &rows[out] {
                let lhs = &self.components[term.lhs];
                let rhs = &other.components[term.rhs];
                if lhs.is_zero() || rhs.is_zero() {
                    continue;
                }
                acc.add_product(term.coeff, lhs, rhs);
            }
            acc
        })
    }

    pub fn geometric(&self, other: &Multivector) -> Self {
        self.product(other, ProductKind::Geometric)
    }

    pub fn wedge(&self, other: &Multivector) -> Self {
        self.product(other, ProductKind::Wedge)
    }

    pub fn dot(&self, other: &Multivector) -> Self {
        self.product(other, ProductKind::Dot)
    }

    /// `dual(dual(a) ^ dual(b))`.
    pub fn vee(&self, other: &Multivector) -> Self {
        self.dual().wedge(&other.dual()).dual()
    }

    // ── Derived maps ────────────────────────────────────────────────────────

    /// `(a . b) * b`
    pub fn project(&self, onto: &Multivector) -> Self {
        self.dot(onto).geometric(onto)
    }

    /// `b * a * b`
    pub fn reflect(&self, across: &Multivector) -> Self {
        across.geometric(self).geometric(across)
    }

    /// `b * a * ~b`
    pub fn transform(&self, by: &Multivector) -> Self {
        by.geometric(self).geometric(&by.reverse())
    }

    /// Evaluate every component with bound symbols.
    pub fn eval(&self, value: &dyn Fn(Sym) -> i64) -> [i64; BASIS_COUNT] {
        std::array::from_fn(|i| self.components[i].eval(value))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{SubspaceType, TypeRegistry};

    fn generic(operand: Operand, ty: SubspaceType) -> Multivector {
        Multivector::generic(operand, ty.mask())
    }

    fn full(operand: Operand) -> Multivector {
        Multivector::generic(operand, Mask::FULL)
    }

    fn basis(index: usize) -> Multivector {
        Multivector::from_fn(|i| if i == index { Poly::constant(1) } else { Poly::zero() })
    }

    #[test]
    fn involutions_are_identities() {
        let a = full(Operand::Lhs);
        assert_eq!(a.dual().dual(), a);
        assert_eq!(a.reverse().reverse(), a);
        assert_eq!(a.conjugate().conjugate(), a);
        assert_eq!(a.neg().neg(), a);
    }

    #[test]
    fn sign_patterns_match_reference_vectors() {
        let reverse = [1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 1];
        let conjugate = [1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 1, 1, 1, 1, 1];
        let ones = Multivector::from_fn(|_| Poly::constant(1));
        let one = |_: Sym| 1;
        assert_eq!(ones.reverse().eval(&one), reverse);
        assert_eq!(ones.conjugate().eval(&one), conjugate);
    }

    #[test]
    fn metric_axioms() {
        assert!(basis(1).geometric(&basis(1)).support() == Mask::EMPTY);
        for i in 2..=4 {
            assert_eq!(basis(i).geometric(&basis(i)), basis(0));
        }
    }

    #[test]
    fn dual_of_vector_is_trivector() {
        let registry = TypeRegistry::standard();
        let v = generic(Operand::Lhs, SubspaceType::Vector);
        assert_eq!(registry.infer(v.dual().support()), Some(SubspaceType::Trivector));
    }

    #[test]
    fn vector_product_is_scalar_and_bivector() {
        let registry = TypeRegistry::standard();
        let a = generic(Operand::Lhs, SubspaceType::Vector);
        let b = generic(Operand::Rhs, SubspaceType::Vector);
        let support = a.geometric(&b).support();
        assert_eq!(registry.infer(support), Some(SubspaceType::ScalarAndBivector));
        assert_eq!(registry.infer(a.wedge(&b).support()), Some(SubspaceType::Bivector));
        assert_eq!(registry.infer(a.dot(&b).support()), Some(SubspaceType::Scalar));
    }

    #[test]
    fn vee_of_planes_is_line() {
        // Two vectors (planes) join to nothing; two trivectors (points) join
        // to a bivector (line).
        let registry = TypeRegistry::standard();
        let p = generic(Operand::Lhs, SubspaceType::Trivector);
        let q = generic(Operand::Rhs, SubspaceType::Trivector);
        assert_eq!(registry.infer(p.vee(&q).support()), Some(SubspaceType::Bivector));
    }

    #[test]
    fn pseudoscalar_wedge_vector_vanishes() {
        let a = generic(Operand::Lhs, SubspaceType::Pseudoscalar);
        let b = generic(Operand::Rhs, SubspaceType::Vector);
        assert_eq!(a.wedge(&b).support(), Mask::EMPTY);
    }

    #[test]
    fn geometric_product_is_associative() {
        let a = full(Operand::Lhs);
        let b = full(Operand::Rhs);
        let c = basis(14).add(&basis(6));
        assert_eq!(a.geometric(&b).geometric(&c), a.geometric(&b.geometric(&c)));
    }

    #[test]
    fn reverse_is_anti_automorphism() {
        let a = generic(Operand::Lhs, SubspaceType::Bivector);
        let b = generic(Operand::Rhs, SubspaceType::Trivector);
        assert_eq!(a.geometric(&b).reverse(), b.reverse().geometric(&a.reverse()));
    }

    #[test]
    fn norms_of_graded_types() {
        let v = generic(Operand::Lhs, SubspaceType::Vector);
        // e0 is null, so only e1..e3 contribute.
        match v.norm() {
            Expr::Sqrt(p) => {
                assert_eq!(p.term_count(), 3);
                assert!(!p.free_symbols().contains(&Sym::new(Operand::Lhs, 1)));
            }
            other => panic!("expected sqrt, got {other}"),
        }
        let s = generic(Operand::Lhs, SubspaceType::Scalar);
        assert_eq!(s.norm(), Expr::Abs(Poly::symbol(Sym::new(Operand::Lhs, 0))));
        let ps = generic(Operand::Lhs, SubspaceType::Pseudoscalar);
        assert!(ps.norm().is_zero());
        assert_eq!(ps.inorm(), Expr::Abs(Poly::symbol(Sym::new(Operand::Lhs, 15))));
    }

    #[test]
    fn motor_sandwich_closes_on_lines_and_points() {
        let registry = TypeRegistry::standard();
        let motor = generic(Operand::Rhs, SubspaceType::Bivector);
        let line = generic(Operand::Lhs, SubspaceType::Bivector);
        let point = generic(Operand::Lhs, SubspaceType::Trivector);
        let moved_line = line.transform(&motor).support();
        let moved_point = point.transform(&motor).support();
        assert_eq!(registry.infer(moved_line), Some(SubspaceType::Bivector));
        assert_eq!(registry.infer(moved_point), Some(SubspaceType::Trivector));
    }
}
