// synth.rs — Operator synthesis over registered types
//
// Specializes every operation to every applicable combination of registered
// subspace types: builds generic operands restricted to the type masks,
// evaluates the algebra, and resolves the output type (inferred for
// structural operations, forced for selectors, required-equal-to-lhs for
// derived operations).
//
// Preconditions: the registry passed the `check_registry` pass.
// Postconditions: every SynthesizedOperator has exactly 16 components, all
//   literal zero outside `output.mask()`; `uses_rhs` is true iff some
//   component mentions a right-operand symbol.
// Failure modes: GenError::UnresolvableType when no descriptor covers a
//   result; GenError::MaskInconsistency when a result escapes its declared
//   output mask.
// Side effects: none.

use std::fmt;

use crate::algebra::Multivector;
use crate::basis::{Mask, BLADES};
use crate::expr::{Expr, Operand};
use crate::registry::{SubspaceType, TypeRegistry};
use crate::simplify;

// ── Operations ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnaryOp {
    Neg,
    Reverse,
    Dual,
    Conjugate,
    Norm,
    INorm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    /// Geometric product.
    Mul,
    Wedge,
    Vee,
    Dot,
}

impl BinaryOp {
    /// Emission order.
    pub const ALL: [BinaryOp; 6] = [
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Wedge,
        BinaryOp::Vee,
        BinaryOp::Dot,
    ];
}

/// Operations whose result must stay in the left operand's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DerivedOp {
    Project,
    Reflect,
    Transform,
}

impl DerivedOp {
    pub const ALL: [DerivedOp; 3] = [DerivedOp::Project, DerivedOp::Reflect, DerivedOp::Transform];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Unary(UnaryOp),
    /// Grade selection into the given type.
    Select(SubspaceType),
    Binary(BinaryOp),
    Derived(DerivedOp),
}

impl Operation {
    /// Emitted function name.
    pub fn method_name(self) -> &'static str {
        match self {
            Operation::Unary(UnaryOp::Neg) => "neg",
            Operation::Unary(UnaryOp::Reverse) => "reverse",
            Operation::Unary(UnaryOp::Dual) => "dual",
            Operation::Unary(UnaryOp::Conjugate) => "conjugate",
            Operation::Unary(UnaryOp::Norm) => "norm",
            Operation::Unary(UnaryOp::INorm) => "inorm",
            Operation::Select(target) => target.selector_name().unwrap_or("select"),
            Operation::Binary(BinaryOp::Add) => "add",
            Operation::Binary(BinaryOp::Sub) => "sub",
            Operation::Binary(BinaryOp::Mul) => "mul",
            Operation::Binary(BinaryOp::Wedge) => "bitxor",
            Operation::Binary(BinaryOp::Vee) => "bitand",
            Operation::Binary(BinaryOp::Dot) => "bitor",
            Operation::Derived(DerivedOp::Project) => "project",
            Operation::Derived(DerivedOp::Reflect) => "reflect",
            Operation::Derived(DerivedOp::Transform) => "transform",
        }
    }

    /// Implemented trait, or `None` for inherent methods.
    pub fn trait_name(self) -> Option<&'static str> {
        match self {
            Operation::Unary(UnaryOp::Neg) => Some("Neg"),
            Operation::Unary(UnaryOp::Reverse) => Some("Reverse"),
            Operation::Unary(UnaryOp::Dual) => Some("Dual"),
            Operation::Unary(UnaryOp::Conjugate) => Some("Conjugate"),
            Operation::Unary(UnaryOp::Norm) => Some("Normalize"),
            Operation::Unary(UnaryOp::INorm) => Some("NormalizeInfinite"),
            Operation::Select(_) => None,
            Operation::Binary(BinaryOp::Add) => Some("Add"),
            Operation::Binary(BinaryOp::Sub) => Some("Sub"),
            Operation::Binary(BinaryOp::Mul) => Some("Mul"),
            Operation::Binary(BinaryOp::Wedge) => Some("BitXor"),
            Operation::Binary(BinaryOp::Vee) => Some("BitAnd"),
            Operation::Binary(BinaryOp::Dot) => Some("BitOr"),
            Operation::Derived(DerivedOp::Project) => Some("Project"),
            Operation::Derived(DerivedOp::Reflect) => Some("Reflect"),
            Operation::Derived(DerivedOp::Transform) => Some("Transform"),
        }
    }

    /// Whether the emitted impl declares `type Output`.
    pub fn declares_output(self) -> bool {
        matches!(
            self,
            Operation::Unary(UnaryOp::Neg | UnaryOp::Dual) | Operation::Binary(_)
        )
    }
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// Fatal generation-time configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    /// No registered descriptor covers the result's support.
    UnresolvableType { operator: String, support: Mask },
    /// A component outside the declared output mask is not structurally zero.
    MaskInconsistency {
        operator: String,
        output: SubspaceType,
        position: usize,
    },
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::UnresolvableType { operator, support } => {
                write!(f, "no registered type covers the result of {operator} (support {support})")
            }
            GenError::MaskInconsistency {
                operator,
                output,
                position,
            } => write!(
                f,
                "{operator} produces a nonzero {} component outside {}",
                BLADES[*position].name,
                output.rust_name()
            ),
        }
    }
}

impl std::error::Error for GenError {}

impl GenError {
    pub fn operator(&self) -> &str {
        match self {
            GenError::UnresolvableType { operator, .. }
            | GenError::MaskInconsistency { operator, .. } => operator,
        }
    }
}

// ── Synthesized operators ───────────────────────────────────────────────────

/// One operation specialized to concrete operand types.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedOperator {
    pub op: Operation,
    pub lhs: SubspaceType,
    pub rhs: Option<SubspaceType>,
    pub output: SubspaceType,
    /// Simplified formulas, one per basis position.
    pub components: Vec<Expr>,
    pub uses_rhs: bool,
}

impl SynthesizedOperator {
    /// e.g. `mul(Vector, Trivector)`.
    pub fn signature(&self) -> String {
        signature(self.op, self.lhs, self.rhs)
    }

    /// Total number of polynomial terms across emitted components.
    pub fn term_count(&self) -> usize {
        self.output
            .mask()
            .indices()
            .map(|i| self.components[i].term_count())
            .sum()
    }

    pub fn component(&self, index: usize) -> &Expr {
        &self.components[index]
    }
}

fn signature(op: Operation, lhs: SubspaceType, rhs: Option<SubspaceType>) -> String {
    match rhs {
        Some(rhs) => format!("{}({}, {})", op.method_name(), lhs.rust_name(), rhs.rust_name()),
        None => format!("{}({})", op.method_name(), lhs.rust_name()),
    }
}

/// Validate `components` against `output` and package the operator.
fn finish(
    op: Operation,
    lhs: SubspaceType,
    rhs: Option<SubspaceType>,
    output: SubspaceType,
    components: Vec<Expr>,
) -> Result<SynthesizedOperator, GenError> {
    if let Some(position) = simplify::first_violation(&components, output.mask()) {
        return Err(GenError::MaskInconsistency {
            operator: signature(op, lhs, rhs),
            output,
            position,
        });
    }
    let uses_rhs = rhs.is_some() && simplify::references_operand(&components, Operand::Rhs);
    Ok(SynthesizedOperator {
        op,
        lhs,
        rhs,
        output,
        components,
        uses_rhs,
    })
}

fn infer(
    registry: &TypeRegistry,
    op: Operation,
    lhs: SubspaceType,
    rhs: Option<SubspaceType>,
    components: &[Expr],
) -> Result<SubspaceType, GenError> {
    let support = simplify::support(components);
    registry
        .infer(support)
        .ok_or_else(|| GenError::UnresolvableType {
            operator: signature(op, lhs, rhs),
            support,
        })
}

fn scalar_result(value: Expr) -> Vec<Expr> {
    let mut components = vec![Expr::zero(); BLADES.len()];
    components[0] = value;
    components
}

/// Specialize a unary structural operation to `ty`.
pub fn synthesize_unary(
    registry: &TypeRegistry,
    op: UnaryOp,
    ty: SubspaceType,
) -> Result<SynthesizedOperator, GenError> {
    let a = Multivector::generic(Operand::Lhs, ty.mask());
    let components = match op {
        UnaryOp::Neg => simplify::lift(&a.neg().components),
        UnaryOp::Reverse => simplify::lift(&a.reverse().components),
        UnaryOp::Dual => simplify::lift(&a.dual().components),
        UnaryOp::Conjugate => simplify::lift(&a.conjugate().components),
        UnaryOp::Norm => scalar_result(a.norm()),
        UnaryOp::INorm => scalar_result(a.inorm()),
    };
    let operation = Operation::Unary(op);
    let output = infer(registry, operation, ty, None, &components)?;
    finish(operation, ty, None, output, components)
}

/// Grade selection of `ty` into `target`. `None` when trivial: the input
/// already is the target, or the masks are disjoint.
pub fn synthesize_selector(
    ty: SubspaceType,
    target: SubspaceType,
) -> Result<Option<SynthesizedOperator>, GenError> {
    if ty == target || !ty.mask().overlaps(target.mask()) {
        return Ok(None);
    }
    let a = Multivector::generic(Operand::Lhs, ty.mask());
    let components = simplify::lift(&a.select(target.mask()).components);
    finish(Operation::Select(target), ty, None, target, components).map(Some)
}

/// Specialize a binary structural operation. `None` for scalar × scalar,
/// which the host float type already provides.
pub fn synthesize_binary(
    registry: &TypeRegistry,
    op: BinaryOp,
    lhs: SubspaceType,
    rhs: SubspaceType,
) -> Result<Option<SynthesizedOperator>, GenError> {
    if lhs.is_scalar() && rhs.is_scalar() {
        return Ok(None);
    }
    let a = Multivector::generic(Operand::Lhs, lhs.mask());
    let b = Multivector::generic(Operand::Rhs, rhs.mask());
    let result = match op {
        BinaryOp::Add => a.add(&b),
        BinaryOp::Sub => a.sub(&b),
        BinaryOp::Mul => a.geometric(&b),
        BinaryOp::Wedge => a.wedge(&b),
        BinaryOp::Vee => a.vee(&b),
        BinaryOp::Dot => a.dot(&b),
    };
    let components = simplify::lift(&result.components);
    let operation = Operation::Binary(op);
    let output = infer(registry, operation, lhs, Some(rhs), &components)?;
    finish(operation, lhs, Some(rhs), output, components).map(Some)
}

/// Specialize a derived operation. `None` unless the result fits `lhs`.
pub fn synthesize_derived(
    op: DerivedOp,
    lhs: SubspaceType,
    rhs: SubspaceType,
) -> Result<Option<SynthesizedOperator>, GenError> {
    let a = Multivector::generic(Operand::Lhs, lhs.mask());
    let b = Multivector::generic(Operand::Rhs, rhs.mask());
    let result = match op {
        DerivedOp::Project => a.project(&b),
        DerivedOp::Reflect => a.reflect(&b),
        DerivedOp::Transform => a.transform(&b),
    };
    if !lhs.mask().is_superset(result.support()) {
        return Ok(None);
    }
    let components = simplify::lift(&result.components);
    finish(Operation::Derived(op), lhs, Some(rhs), lhs, components).map(Some)
}

// ── Operator table ──────────────────────────────────────────────────────────

/// Everything synthesized for one left-operand type, in emission order.
#[derive(Debug, Clone)]
pub struct TypeUnit {
    pub ty: SubspaceType,
    pub reverse: SynthesizedOperator,
    pub dual: SynthesizedOperator,
    pub conjugate: SynthesizedOperator,
    pub norm: SynthesizedOperator,
    pub inorm: SynthesizedOperator,
    /// Absent for the scalar type (host float negation).
    pub neg: Option<SynthesizedOperator>,
    /// Non-trivial grade selectors; empty for the scalar type.
    pub selectors: Vec<SynthesizedOperator>,
    /// Operation-major, right operand in registry order.
    pub binary: Vec<SynthesizedOperator>,
    /// Closing derived specializations only.
    pub derived: Vec<SynthesizedOperator>,
}

impl TypeUnit {
    /// All operators of the unit in emission order.
    pub fn operators(&self) -> impl Iterator<Item = &SynthesizedOperator> {
        [&self.reverse, &self.dual, &self.conjugate, &self.norm, &self.inorm]
            .into_iter()
            .chain(self.selectors.iter())
            .chain(self.neg.iter())
            .chain(self.binary.iter())
            .chain(self.derived.iter())
    }
}

/// The complete synthesis result for a registry.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    pub units: Vec<TypeUnit>,
    /// Derived (operation, lhs, rhs) candidates that did not close.
    pub omitted_derived: usize,
}

impl OperatorTable {
    pub fn synthesize(registry: &TypeRegistry) -> Result<Self, GenError> {
        let mut units = Vec::with_capacity(registry.len());
        let mut omitted_derived = 0;

        for ty in registry.types() {
            let unary = |op| synthesize_unary(registry, op, ty);

            let neg = if ty.is_scalar() {
                None
            } else {
                Some(unary(UnaryOp::Neg)?)
            };

            let mut selectors = Vec::new();
            if !ty.is_scalar() {
                for target in SubspaceType::ALL {
                    if target.selector_name().is_none() {
                        continue;
                    }
                    if let Some(sel) = synthesize_selector(ty, target)? {
                        selectors.push(sel);
                    }
                }
            }

            let mut binary = Vec::new();
            for op in BinaryOp::ALL {
                for rhs in registry.types() {
                    if let Some(s) = synthesize_binary(registry, op, ty, rhs)? {
                        binary.push(s);
                    }
                }
            }

            let mut derived = Vec::new();
            for op in DerivedOp::ALL {
                for rhs in registry.types() {
                    match synthesize_derived(op, ty, rhs)? {
                        Some(s) => derived.push(s),
                        None => omitted_derived += 1,
                    }
                }
            }

            units.push(TypeUnit {
                ty,
                reverse: unary(UnaryOp::Reverse)?,
                dual: unary(UnaryOp::Dual)?,
                conjugate: unary(UnaryOp::Conjugate)?,
                norm: unary(UnaryOp::Norm)?,
                inorm: unary(UnaryOp::INorm)?,
                neg,
                selectors,
                binary,
                derived,
            });
        }

        Ok(OperatorTable {
            units,
            omitted_derived,
        })
    }

    pub fn operators(&self) -> impl Iterator<Item = &SynthesizedOperator> {
        self.units.iter().flat_map(|u| u.operators())
    }

    pub fn len(&self) -> usize {
        self.operators().count()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, ty: SubspaceType) -> Option<&TypeUnit> {
        self.units.iter().find(|u| u.ty == ty)
    }

    pub fn find(
        &self,
        op: Operation,
        lhs: SubspaceType,
        rhs: Option<SubspaceType>,
    ) -> Option<&SynthesizedOperator> {
        self.operators()
            .find(|s| s.op == op && s.lhs == lhs && s.rhs == rhs)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Poly, Sym};
    use SubspaceType::*;

    fn registry() -> TypeRegistry {
        TypeRegistry::standard()
    }

    fn binary(op: BinaryOp, lhs: SubspaceType, rhs: SubspaceType) -> SynthesizedOperator {
        synthesize_binary(&registry(), op, lhs, rhs)
            .expect("synthesis failed")
            .expect("operator not applicable")
    }

    #[test]
    fn add_vector_vector_sums_pairwise() {
        let s = binary(BinaryOp::Add, Vector, Vector);
        assert_eq!(s.output, Vector);
        for i in 1..=4 {
            let expected = Poly::symbol(Sym::new(Operand::Lhs, i))
                .add(&Poly::symbol(Sym::new(Operand::Rhs, i)));
            assert_eq!(s.components[i], Expr::Poly(expected));
        }
        assert!(s.uses_rhs);
    }

    #[test]
    fn scalar_times_vector_is_vector() {
        let s = binary(BinaryOp::Mul, Scalar, Vector);
        assert_eq!(s.output, Vector);
        let scalar = Sym::new(Operand::Lhs, 0);
        for i in 1..=4 {
            assert!(s.components[i].free_symbols().contains(&scalar));
        }
    }

    #[test]
    fn scalar_scalar_arithmetic_is_skipped() {
        for op in BinaryOp::ALL {
            assert!(synthesize_binary(&registry(), op, Scalar, Scalar).unwrap().is_none());
        }
    }

    #[test]
    fn zero_result_infers_scalar_and_drops_rhs() {
        let s = binary(BinaryOp::Wedge, Pseudoscalar, Vector);
        assert_eq!(s.output, Scalar);
        assert!(s.components.iter().all(Expr::is_zero));
        assert!(!s.uses_rhs);
    }

    #[test]
    fn dual_outputs_pair_grades() {
        let expected = [
            (Scalar, Pseudoscalar),
            (Vector, Trivector),
            (Bivector, Bivector),
            (Trivector, Vector),
            (Pseudoscalar, Scalar),
            (ScalarAndBivector, FullMultivector),
            (FullMultivector, FullMultivector),
        ];
        for (ty, out) in expected {
            let s = synthesize_unary(&registry(), UnaryOp::Dual, ty).unwrap();
            assert_eq!(s.output, out, "dual({ty})");
        }
    }

    #[test]
    fn norms_are_scalar() {
        for ty in SubspaceType::ALL {
            for op in [UnaryOp::Norm, UnaryOp::INorm] {
                let s = synthesize_unary(&registry(), op, ty).unwrap();
                assert_eq!(s.output, Scalar);
            }
        }
    }

    #[test]
    fn transform_closes_for_motors_on_lines_and_points() {
        let line = synthesize_derived(DerivedOp::Transform, Bivector, Bivector).unwrap();
        assert_eq!(line.map(|s| s.output), Some(Bivector));
        let point = synthesize_derived(DerivedOp::Transform, Trivector, Bivector).unwrap();
        assert_eq!(point.map(|s| s.output), Some(Trivector));
    }

    #[test]
    fn non_closing_derived_is_omitted() {
        assert!(synthesize_derived(DerivedOp::Project, Vector, Bivector)
            .unwrap()
            .is_none());
    }

    #[test]
    fn trivial_selectors_are_omitted() {
        assert!(synthesize_selector(Vector, Vector).unwrap().is_none());
        assert!(synthesize_selector(Vector, Bivector).unwrap().is_none());
        let s = synthesize_selector(ScalarAndBivector, Bivector).unwrap().unwrap();
        assert_eq!(s.output, Bivector);
        assert_eq!(s.op.method_name(), "bivector");
    }

    #[test]
    fn unresolvable_type_is_reported() {
        let partial = TypeRegistry::with_types(vec![Vector, Bivector]);
        let err = synthesize_binary(&partial, BinaryOp::Mul, Vector, Vector).unwrap_err();
        assert_eq!(err.operator(), "mul(Vector, Vector)");
        assert!(matches!(err, GenError::UnresolvableType { .. }));
    }

    #[test]
    fn mask_inconsistency_is_reported() {
        let mut components = vec![Expr::zero(); 16];
        components[1] = Expr::Poly(Poly::symbol(Sym::new(Operand::Lhs, 1)));
        let err = finish(Operation::Unary(UnaryOp::Neg), Vector, None, Bivector, components)
            .unwrap_err();
        assert_eq!(
            err,
            GenError::MaskInconsistency {
                operator: "neg(Vector)".to_string(),
                output: Bivector,
                position: 1,
            }
        );
        assert!(err.to_string().contains("e0"));
    }

    #[test]
    fn table_layout() {
        let table = OperatorTable::synthesize(&registry()).unwrap();
        assert_eq!(table.units.len(), 7);
        let scalar = table.unit(Scalar).unwrap();
        assert!(scalar.neg.is_none());
        assert!(scalar.selectors.is_empty());
        // 6 ops × 6 non-scalar right operands
        assert_eq!(scalar.binary.len(), 36);
        let vector = table.unit(Vector).unwrap();
        assert_eq!(vector.binary.len(), 42);
        assert!(table
            .find(Operation::Derived(DerivedOp::Transform), Bivector, Some(Bivector))
            .is_some());
        assert!(table.omitted_derived > 0);
        assert_eq!(
            table.operators().filter(|s| matches!(s.op, Operation::Derived(_))).count()
                + table.omitted_derived,
            3 * 7 * 7
        );
    }
}
