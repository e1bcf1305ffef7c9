// codegen.rs — Rust code generation for the synthesized algebra
//
// Renders the operator table into one self-contained Rust module: the
// header, the capability traits, then one section per registered type
// (layout, trait impls, inherent methods, operator overloads, closing
// derived operations), then the hand-written extras.
//
// Preconditions: the operator table passed synthesis (every component outside
//                its output mask is the literal zero).
// Postconditions: returns the generated source; identical input and options
//                 give byte-identical output.
// Failure modes: none.
// Side effects: none.

use std::fmt::Write as _;

use crate::basis::BLADES;
use crate::expr::{Expr, Operand, Poly, Sym};
use crate::registry::SubspaceType;
use crate::synth::{OperatorTable, Operation, SynthesizedOperator, TypeUnit};

// ── Public types ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct GeneratedCode {
    pub source: String,
    /// Number of top-level blocks emitted for type sections.
    pub block_count: usize,
}

/// Host float type behind the `Float` alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatType {
    F32,
    F64,
}

impl FloatType {
    pub fn rust_name(self) -> &'static str {
        match self {
            FloatType::F32 => "f32",
            FloatType::F64 => "f64",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    pub float_type: FloatType,
    /// Threshold below which `is_finite`, `is_infinite` and `exp` treat a
    /// norm as zero.
    pub division_epsilon: f64,
    /// Emit `Bivector::exp` and the unit pseudoscalar `I`.
    pub include_extras: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            float_type: FloatType::F64,
            division_epsilon: 1e-9,
            include_extras: true,
        }
    }
}

// ── Public entry point ──────────────────────────────────────────────────────

pub fn codegen(table: &OperatorTable, options: &CodegenOptions) -> GeneratedCode {
    let mut ctx = CodegenCtx::new(table, options);
    ctx.emit_all();
    GeneratedCode {
        source: ctx.out,
        block_count: ctx.block_count,
    }
}

// ── Internal context ────────────────────────────────────────────────────────

struct CodegenCtx<'a> {
    table: &'a OperatorTable,
    options: &'a CodegenOptions,
    out: String,
    block_count: usize,
}

impl<'a> CodegenCtx<'a> {
    fn new(table: &'a OperatorTable, options: &'a CodegenOptions) -> Self {
        CodegenCtx {
            table,
            options,
            out: String::with_capacity(1 << 20),
            block_count: 0,
        }
    }

    fn emit_all(&mut self) {
        self.emit_header();
        self.emit_prelude();
        for unit in &self.table.units {
            let blocks = type_section(unit);
            self.block_count += blocks.len();
            self.out.push('\n');
            self.out.push_str(&blocks.join("\n\n"));
            self.out.push('\n');
        }
        if self.options.include_extras && self.has_extras_types() {
            self.emit_extras();
        }
    }

    fn emit_header(&mut self) {
        self.out
            .push_str("// Generated by pgac (PGA Compiler). Do not edit by hand.\n");
        self.out.push_str("//\n");
        self.out
            .push_str("// 3D projective geometric algebra (PGA), metric R(3,0,1).\n");
        self.out.push_str("//\n");
        self.out
            .push_str("// Coefficients are named after their basis blade position:\n");
        for (grade, line) in basis_convention_lines().iter().enumerate() {
            let lead = if grade == 0 { "" } else { "+ " };
            let _ = writeln!(self.out, "// {}{}", lead, line);
        }
        self.out.push_str("//\n");
        self.out.push_str("// Operators:\n");
        self.out.push_str("// *  geometric product\n");
        self.out.push_str("// ^  wedge (meet)\n");
        self.out.push_str("// &  vee (join)\n");
        self.out.push_str("// |  dot\n");
        self.out.push('\n');
    }

    fn emit_prelude(&mut self) {
        self.out
            .push_str("use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Neg, Sub};\n\n");
        let _ = writeln!(
            self.out,
            "pub type Float = {};",
            self.options.float_type.rust_name()
        );
        let _ = writeln!(
            self.out,
            "pub const FLOAT_DIVISION_EPSILON: Float = {:e};\n",
            self.options.division_epsilon
        );
        self.out.push_str(PRELUDE_TRAITS);
    }

    fn has_extras_types(&self) -> bool {
        [
            SubspaceType::Bivector,
            SubspaceType::ScalarAndBivector,
            SubspaceType::Pseudoscalar,
        ]
        .iter()
        .all(|&t| self.table.unit(t).is_some())
    }

    fn emit_extras(&mut self) {
        self.out.push('\n');
        self.out.push_str(
            "impl Bivector {
    pub fn exp(self) -> ScalarAndBivector {
        let theta = self.norm();
        if theta.abs() < FLOAT_DIVISION_EPSILON {
            1.0 + self
        } else {
            theta.cos() + (theta.sin() / theta) * self
        }
    }
}

pub const I: Pseudoscalar = Pseudoscalar { a15: 1.0 };
",
        );
    }
}

const PRELUDE_TRAITS: &str = "pub trait Reverse {
    fn reverse(self) -> Self;
}

pub trait Dual {
    type Output;
    fn dual(self) -> Self::Output;
}

pub trait Conjugate {
    fn conjugate(self) -> Self;
}

pub trait Normalize {
    fn norm(self) -> Float;

    // Return a normalized copy
    fn hat(self) -> Self
    where
        Self: Copy + Mul<Float, Output = Self>,
    {
        assert!(self.is_finite(), \"norm is zero\");
        self * (1.0 / self.norm())
    }

    fn is_finite(self) -> bool
    where
        Self: Copy,
    {
        self.norm() > FLOAT_DIVISION_EPSILON
    }
}

pub trait NormalizeInfinite {
    fn inorm(self) -> Float;

    // Return an infinite-normalized copy
    fn ihat(self) -> Self
    where
        Self: Copy + Mul<Float, Output = Self>,
    {
        assert!(self.is_infinite(), \"inorm is zero\");
        self * (1.0 / self.inorm())
    }

    fn is_infinite(self) -> bool
    where
        Self: Copy,
    {
        self.inorm() > FLOAT_DIVISION_EPSILON
    }
}

pub trait Project<Entity> {
    fn project(self, r: Entity) -> Self;
}

pub trait Reflect<Entity> {
    fn reflect(self, r: Entity) -> Self;
}

pub trait Transform<Entity> {
    fn transform(self, r: Entity) -> Self;
}
";

/// `a0`, `a1 * e0 + a2 * e1 + ...`, one line per grade.
fn basis_convention_lines() -> Vec<String> {
    let mut lines: Vec<Vec<String>> = vec![Vec::new(); 5];
    for (i, blade) in BLADES.iter().enumerate() {
        let term = if blade.grade() == 0 {
            format!("a{i}")
        } else {
            format!("a{i} * {}", blade.name)
        };
        lines[blade.grade()].push(term);
    }
    lines.into_iter().map(|terms| terms.join(" + ")).collect()
}

// ── Type sections ───────────────────────────────────────────────────────────

/// All blocks for one type, in emission order.
fn type_section(unit: &TypeUnit) -> Vec<String> {
    let ty = unit.ty;
    let name = ty.rust_name();
    let mut blocks = vec![format!(
        "// ===========================================================================\n\
         // {name}\n\
         // ==========================================================================="
    )];

    if !ty.is_scalar() {
        blocks.push(struct_block(ty));
    }
    blocks.push(unary_impl(&unit.reverse));
    blocks.push(unary_impl(&unit.dual));
    blocks.push(unary_impl(&unit.conjugate));
    blocks.push(unary_impl(&unit.norm));
    blocks.push(unary_impl(&unit.inorm));
    if !ty.is_scalar() {
        blocks.push(inherent_block(ty, &unit.selectors));
    }
    if let Some(neg) = &unit.neg {
        blocks.push(unary_impl(neg));
    }
    blocks.extend(unit.binary.iter().map(binary_impl));
    blocks.extend(unit.derived.iter().map(binary_impl));
    blocks
}

fn struct_block(ty: SubspaceType) -> String {
    let mut s = String::new();
    s.push_str("#[derive(Default, Debug, Clone, Copy, PartialEq)]\n");
    let _ = writeln!(s, "pub struct {} {{", ty.rust_name());
    for i in ty.mask().indices() {
        let _ = writeln!(s, "    pub a{i}: Float,");
    }
    s.push('}');
    s
}

fn inherent_block(ty: SubspaceType, selectors: &[SynthesizedOperator]) -> String {
    let name = ty.rust_name();
    let fields: Vec<String> = ty.mask().indices().map(|i| format!("a{i}")).collect();
    let mut fns = Vec::new();

    let params: Vec<String> = fields.iter().map(|f| format!("{f}: Float")).collect();
    fns.push(format!(
        "pub fn new({}) -> {name} {{\n    {name} {{ {} }}\n}}",
        params.join(", "),
        fields.join(", ")
    ));

    fns.push(format!("pub fn zero() -> {name} {{\n    Default::default()\n}}"));

    let accesses: Vec<String> = fields.iter().map(|f| format!("self.{f}")).collect();
    let (tuple_ty, tuple_val) = if fields.len() > 1 {
        (
            format!("({})", vec!["Float"; fields.len()].join(", ")),
            format!("({})", accesses.join(", ")),
        )
    } else {
        ("Float".to_string(), accesses.join(", "))
    };
    fns.push(format!(
        "pub fn as_tuple(&self) -> {tuple_ty} {{\n    {tuple_val}\n}}"
    ));

    for sel in selectors {
        fns.push(format!("pub {}", function(sel)));
    }

    wrap_impl(&fns.join("\n\n"), name, None, None, None)
}

fn unary_impl(s: &SynthesizedOperator) -> String {
    let output = s.op.declares_output().then(|| s.output.rust_name());
    wrap_impl(
        &function(s),
        s.lhs.rust_name(),
        s.op.trait_name(),
        None,
        output,
    )
}

fn binary_impl(s: &SynthesizedOperator) -> String {
    let output = s.op.declares_output().then(|| s.output.rust_name());
    wrap_impl(
        &function(s),
        s.lhs.rust_name(),
        s.op.trait_name(),
        s.rhs.map(SubspaceType::rust_name),
        output,
    )
}

/// `fn name(self[, r: Rhs]) -> Out { body }`
fn function(s: &SynthesizedOperator) -> String {
    let params = match s.rhs {
        Some(rhs) => {
            let r = if s.uses_rhs { "r" } else { "_r" };
            format!("self, {r}: {}", rhs.rust_name())
        }
        None => "self".to_string(),
    };
    format!(
        "fn {}({params}) -> {} {{\n{}\n}}",
        s.op.method_name(),
        s.output.rust_name(),
        indent(&result_body(s), 1)
    )
}

/// The returned value: a bare expression for the scalar type, a struct
/// literal over the output mask otherwise.
fn result_body(s: &SynthesizedOperator) -> String {
    let render = Renderer {
        lhs_scalar: s.lhs.is_scalar(),
        rhs_scalar: s.rhs.is_some_and(SubspaceType::is_scalar),
    };
    if s.output.is_scalar() {
        return render.expr(&s.components[0]);
    }
    let fields: Vec<String> = s
        .output
        .mask()
        .indices()
        .map(|i| format!("a{i}: {},", render.expr(&s.components[i])))
        .collect();
    format!(
        "{} {{\n{}\n}}",
        s.output.rust_name(),
        indent(&fields.join("\n"), 1)
    )
}

/// Wrap code in an `impl` block, optionally for a trait with one type
/// argument and an `Output` associated type.
fn wrap_impl(
    code: &str,
    self_ty: &str,
    trait_name: Option<&str>,
    type_arg: Option<&str>,
    output: Option<&str>,
) -> String {
    let mut header = String::from("impl");
    if let Some(t) = trait_name {
        let _ = write!(header, " {t}");
        if let Some(arg) = type_arg {
            let _ = write!(header, "<{arg}>");
        }
        header.push_str(" for");
    }
    let _ = write!(header, " {self_ty} {{");

    let assoc = match output {
        Some(out) => format!("    type Output = {out};\n\n"),
        None => String::new(),
    };
    format!("{header}\n{assoc}{}\n}}", indent(code, 1))
}

/// Indent every non-empty line by four spaces per level.
fn indent(s: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    s.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Expressions ─────────────────────────────────────────────────────────────

/// Renders formulas with operand symbols substituted by field accesses.
struct Renderer {
    lhs_scalar: bool,
    rhs_scalar: bool,
}

impl Renderer {
    fn expr(&self, e: &Expr) -> String {
        match e {
            Expr::Poly(p) => self.poly(p),
            Expr::Sqrt(p) => format!("({}).sqrt()", self.poly(p)),
            Expr::Abs(p) => match single_symbol(p) {
                Some(sym) => format!("{}.abs()", self.symbol(sym)),
                None => format!("({}).abs()", self.poly(p)),
            },
        }
    }

    fn symbol(&self, sym: Sym) -> String {
        let (name, scalar) = match sym.operand {
            Operand::Lhs => ("self", self.lhs_scalar),
            Operand::Rhs => ("r", self.rhs_scalar),
        };
        if scalar {
            name.to_string()
        } else {
            format!("{name}.a{}", sym.index)
        }
    }

    fn poly(&self, p: &Poly) -> String {
        if p.is_zero() {
            return "0.0".to_string();
        }
        let mut out = String::new();
        for (i, (monomial, coeff)) in p.terms().enumerate() {
            match (i, coeff < 0) {
                (0, true) => out.push('-'),
                (0, false) => {}
                (_, true) => out.push_str(" - "),
                (_, false) => out.push_str(" + "),
            }
            let magnitude = coeff.unsigned_abs();
            let factors: Vec<String> = monomial
                .powers()
                .into_iter()
                .map(|(sym, exp)| match exp {
                    1 => self.symbol(sym),
                    _ => format!("{}.powi({exp})", self.symbol(sym)),
                })
                .collect();
            if factors.is_empty() {
                let _ = write!(out, "{magnitude}.0");
            } else if magnitude == 1 {
                out.push_str(&factors.join(" * "));
            } else {
                let _ = write!(out, "{magnitude}.0 * {}", factors.join(" * "));
            }
        }
        out
    }
}

/// The symbol of a polynomial that is exactly `1 * sym`.
fn single_symbol(p: &Poly) -> Option<Sym> {
    let mut terms = p.terms();
    let (monomial, coeff) = terms.next()?;
    if terms.next().is_some() || coeff != 1 || monomial.degree() != 1 {
        return None;
    }
    monomial.symbols().first().copied()
}

/// The emitted shape of every operator in the table, in emission order.
pub fn planned_signatures(table: &OperatorTable) -> Vec<PlannedFn> {
    table
        .operators()
        .map(|s| PlannedFn {
            trait_name: s.op.trait_name(),
            type_arg: s.rhs.map(SubspaceType::rust_name),
            self_ty: s.lhs.rust_name(),
            name: s.op.method_name(),
            output: s.output.rust_name(),
            rhs_param: s.rhs.map(|_| if s.uses_rhs { "r" } else { "_r" }),
            op: s.op,
        })
        .collect()
}

/// The emitted shape of one synthesized operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFn {
    pub op: Operation,
    pub trait_name: Option<&'static str>,
    pub type_arg: Option<&'static str>,
    pub self_ty: &'static str,
    pub name: &'static str,
    pub output: &'static str,
    pub rhs_param: Option<&'static str>,
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::synth::{
        synthesize_binary, synthesize_derived, synthesize_unary, BinaryOp, DerivedOp, UnaryOp,
    };
    use SubspaceType::*;

    fn binary(op: BinaryOp, lhs: SubspaceType, rhs: SubspaceType) -> SynthesizedOperator {
        synthesize_binary(&TypeRegistry::standard(), op, lhs, rhs)
            .unwrap()
            .unwrap()
    }

    fn generate() -> String {
        let table = OperatorTable::synthesize(&TypeRegistry::standard()).unwrap();
        codegen(&table, &CodegenOptions::default()).source
    }

    #[test]
    fn add_vector_vector_fields() {
        let block = binary_impl(&binary(BinaryOp::Add, Vector, Vector));
        assert!(block.starts_with("impl Add<Vector> for Vector {\n    type Output = Vector;\n"));
        for i in 1..=4 {
            assert!(block.contains(&format!("a{i}: self.a{i} + r.a{i},")), "{block}");
        }
        assert!(!block.contains("a0:"));
        assert!(!block.contains("a5:"));
    }

    #[test]
    fn scalar_operand_is_bare() {
        let block = binary_impl(&binary(BinaryOp::Mul, Scalar, Vector));
        assert!(block.starts_with("impl Mul<Vector> for Float {"));
        assert!(block.contains("a1: self * r.a1,"));
        assert!(!block.contains("self.a0"));

        let block = binary_impl(&binary(BinaryOp::Mul, Vector, Scalar));
        assert!(block.contains("a4: self.a4 * r,"));
    }

    #[test]
    fn unused_rhs_is_underscored() {
        let block = binary_impl(&binary(BinaryOp::Wedge, Pseudoscalar, Vector));
        assert!(block.contains("fn bitxor(self, _r: Vector) -> Float {\n        0.0\n    }"));
    }

    #[test]
    fn norm_renders_sqrt_and_abs() {
        let reg = TypeRegistry::standard();
        let v = unary_impl(&synthesize_unary(&reg, UnaryOp::Norm, Vector).unwrap());
        assert!(v.contains("(self.a2.powi(2) + self.a3.powi(2) + self.a4.powi(2)).sqrt()"));
        let s = unary_impl(&synthesize_unary(&reg, UnaryOp::Norm, Scalar).unwrap());
        assert!(s.contains("self.abs()"));
        let p = unary_impl(&synthesize_unary(&reg, UnaryOp::Norm, Pseudoscalar).unwrap());
        assert!(p.contains("fn norm(self) -> Float {\n        0.0\n    }"));
    }

    #[test]
    fn derived_impl_has_no_output_type() {
        let s = synthesize_derived(DerivedOp::Transform, Bivector, Bivector)
            .unwrap()
            .unwrap();
        let block = binary_impl(&s);
        assert!(block.starts_with("impl Transform<Bivector> for Bivector {\n    fn transform(self, r: Bivector) -> Bivector {"));
        assert!(!block.contains("type Output"));
    }

    #[test]
    fn integer_coefficients_render_as_floats() {
        let r = Renderer {
            lhs_scalar: false,
            rhs_scalar: false,
        };
        let a = Poly::symbol(Sym::new(Operand::Lhs, 1));
        let b = Poly::symbol(Sym::new(Operand::Rhs, 2));
        let p = a.mul(&b).scale(2).sub(&Poly::constant(3));
        assert_eq!(r.poly(&p), "-3.0 + 2.0 * self.a1 * r.a2");
        assert_eq!(r.poly(&Poly::zero()), "0.0");
        assert_eq!(r.poly(&a.neg()), "-self.a1");
    }

    #[test]
    fn struct_and_inherent_blocks() {
        assert_eq!(
            struct_block(Vector),
            "#[derive(Default, Debug, Clone, Copy, PartialEq)]\npub struct Vector {\n    pub a1: Float,\n    pub a2: Float,\n    pub a3: Float,\n    pub a4: Float,\n}"
        );
        let block = inherent_block(Pseudoscalar, &[]);
        assert!(block.contains("pub fn new(a15: Float) -> Pseudoscalar {\n        Pseudoscalar { a15 }\n    }"));
        assert!(block.contains("pub fn as_tuple(&self) -> Float {\n        self.a15\n    }"));
    }

    #[test]
    fn header_documents_basis() {
        let src = generate();
        assert!(src.contains("// a0\n// + a1 * e0 + a2 * e1 + a3 * e2 + a4 * e3\n"));
        assert!(src.contains("// + a15 * e0123\n"));
        assert!(src.contains("pub type Float = f64;"));
        assert!(src.contains("pub const FLOAT_DIVISION_EPSILON: Float = 1e-9;"));
    }

    #[test]
    fn options_change_prelude_and_extras() {
        let table = OperatorTable::synthesize(&TypeRegistry::standard()).unwrap();
        let options = CodegenOptions {
            float_type: FloatType::F32,
            division_epsilon: 1e-6,
            include_extras: false,
        };
        let src = codegen(&table, &options).source;
        assert!(src.contains("pub type Float = f32;"));
        assert!(src.contains("FLOAT_DIVISION_EPSILON: Float = 1e-6;"));
        assert!(!src.contains("pub fn exp"));
        assert!(!src.contains("pub const I:"));
    }

    #[test]
    fn extras_follow_generated_units() {
        let src = generate();
        let exp = src.find("pub fn exp(self) -> ScalarAndBivector").unwrap();
        let last_section = src.find("// FullMultivector\n").unwrap();
        assert!(exp > last_section);
        assert!(src.ends_with("pub const I: Pseudoscalar = Pseudoscalar { a15: 1.0 };\n"));
    }

    #[test]
    fn scalar_section_has_no_struct_or_neg() {
        let src = generate();
        assert!(!src.contains("pub struct Float"));
        assert!(!src.contains("impl Neg for Float"));
        assert!(!src.contains("impl Add<Float> for Float"));
        assert!(src.contains("impl Neg for Vector {"));
        assert!(src.contains("impl Dual for Vector {\n    type Output = Trivector;"));
    }

    #[test]
    fn generation_is_deterministic() {
        assert_eq!(generate(), generate());
    }

    #[test]
    fn planned_signatures_cover_table() {
        let table = OperatorTable::synthesize(&TypeRegistry::standard()).unwrap();
        let plan = planned_signatures(&table);
        assert_eq!(plan.len(), table.len());
        assert!(plan.iter().any(|p| p.trait_name == Some("BitAnd")
            && p.self_ty == "Trivector"
            && p.type_arg == Some("Trivector")
            && p.output == "Bivector"));
    }
}
