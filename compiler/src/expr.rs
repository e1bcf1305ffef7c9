// expr.rs — Symbolic coefficient expressions
//
// Sparse polynomials with integer coefficients over operand symbols, plus the
// two non-polynomial forms the algebra needs (square root and absolute value,
// produced only by the norms). Polynomials are kept canonical on every
// operation: like monomials are collected and zero coefficients dropped, so a
// structurally zero component is exactly the empty polynomial.
//
// Preconditions: none.
// Postconditions: equal polynomials have equal representations.
// Failure modes: none (coefficient overflow is not reachable for the degrees
//   the algebra produces).
// Side effects: none.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which operand a symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operand {
    /// Left operand, emitted as `self`.
    Lhs,
    /// Right operand, emitted as `r`.
    Rhs,
}

/// A free symbol: coefficient `index` of one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sym {
    pub operand: Operand,
    pub index: u8,
}

impl Sym {
    pub fn new(operand: Operand, index: usize) -> Self {
        Sym {
            operand,
            index: index as u8,
        }
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.operand {
            Operand::Lhs => 'a',
            Operand::Rhs => 'b',
        };
        write!(f, "{}{}", letter, self.index)
    }
}

// ── Monomials ───────────────────────────────────────────────────────────────

/// Product of symbols, stored sorted with repetition for powers.
/// The empty monomial is the constant 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Monomial(Vec<Sym>);

impl Monomial {
    pub fn one() -> Self {
        Monomial(Vec::new())
    }

    pub fn of(sym: Sym) -> Self {
        Monomial(vec![sym])
    }

    pub fn degree(&self) -> usize {
        self.0.len()
    }

    pub fn symbols(&self) -> &[Sym] {
        &self.0
    }

    /// Distinct symbols with their exponents, in symbol order.
    pub fn powers(&self) -> Vec<(Sym, u32)> {
        let mut out: Vec<(Sym, u32)> = Vec::new();
        for &sym in &self.0 {
            match out.last_mut() {
                Some((last, exp)) if *last == sym => *exp += 1,
                _ => out.push((sym, 1)),
            }
        }
        out
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            if self.0[i] <= other.0[j] {
                merged.push(self.0[i]);
                i += 1;
            } else {
                merged.push(other.0[j]);
                j += 1;
            }
        }
        merged.extend_from_slice(&self.0[i..]);
        merged.extend_from_slice(&other.0[j..]);
        Monomial(merged)
    }

    /// The monomial `m` with `m * m == self`, if every exponent is even.
    pub fn square_root(&self) -> Option<Monomial> {
        let mut root = Vec::with_capacity(self.0.len() / 2);
        for (sym, exp) in self.powers() {
            if exp % 2 != 0 {
                return None;
            }
            root.extend(std::iter::repeat(sym).take((exp / 2) as usize));
        }
        Some(Monomial(root))
    }
}

// ── Polynomials ─────────────────────────────────────────────────────────────

/// Integer-coefficient polynomial in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Poly {
    terms: BTreeMap<Monomial, i64>,
}

impl Poly {
    pub fn zero() -> Self {
        Poly::default()
    }

    pub fn constant(value: i64) -> Self {
        Poly::monomial(Monomial::one(), value)
    }

    pub fn symbol(sym: Sym) -> Self {
        Poly::monomial(Monomial::of(sym), 1)
    }

    pub fn monomial(monomial: Monomial, coeff: i64) -> Self {
        let mut terms = BTreeMap::new();
        if coeff != 0 {
            terms.insert(monomial, coeff);
        }
        Poly { terms }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Terms in monomial order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, i64)> {
        self.terms.iter().map(|(m, &c)| (m, c))
    }

    fn accumulate(&mut self, monomial: Monomial, coeff: i64) {
        if coeff == 0 {
            return;
        }
        let entry = self.terms.entry(monomial);
        match entry {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(coeff);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                *slot.get_mut() += coeff;
                if *slot.get() == 0 {
                    slot.remove();
                }
            }
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        out.add_assign(other);
        out
    }

    pub fn add_assign(&mut self, other: &Poly) {
        for (m, c) in other.terms() {
            self.accumulate(m.clone(), c);
        }
    }

    pub fn sub(&self, other: &Poly) -> Poly {
        let mut out = self.clone();
        for (m, c) in other.terms() {
            out.accumulate(m.clone(), -c);
        }
        out
    }

    pub fn neg(&self) -> Poly {
        self.scale(-1)
    }

    pub fn scale(&self, factor: i64) -> Poly {
        if factor == 0 {
            return Poly::zero();
        }
        Poly {
            terms: self.terms.iter().map(|(m, &c)| (m.clone(), c * factor)).collect(),
        }
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        let mut out = Poly::zero();
        for (ma, ca) in self.terms() {
            for (mb, cb) in other.terms() {
                out.accumulate(ma.mul(mb), ca * cb);
            }
        }
        out
    }

    /// Add `factor * a * b` without materializing the product polynomial.
    pub fn add_product(&mut self, factor: i64, a: &Poly, b: &Poly) {
        for (ma, ca) in a.terms() {
            for (mb, cb) in b.terms() {
                self.accumulate(ma.mul(mb), factor * ca * cb);
            }
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<Sym> {
        self.terms
            .keys()
            .flat_map(|m| m.symbols().iter().copied())
            .collect()
    }

    /// Evaluate with every symbol bound by `value`.
    pub fn eval(&self, value: &dyn Fn(Sym) -> i64) -> i64 {
        self.terms()
            .map(|(m, c)| m.symbols().iter().fold(c, |acc, &s| acc * value(s)))
            .sum()
    }

    /// `Some(q)` with `q * q == self` when `self` is a single square term.
    pub fn square_root(&self) -> Option<Poly> {
        let mut terms = self.terms();
        let (monomial, coeff) = terms.next()?;
        if terms.next().is_some() || coeff <= 0 {
            return None;
        }
        let root_coeff = integer_sqrt(coeff)?;
        Some(Poly::monomial(monomial.square_root()?, root_coeff))
    }
}

fn integer_sqrt(value: i64) -> Option<i64> {
    let root = (value as f64).sqrt().round() as i64;
    (root * root == value).then_some(root)
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        for (i, (m, c)) in self.terms().enumerate() {
            let magnitude = c.unsigned_abs();
            match (i, c < 0) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            let factors: Vec<String> = m.symbols().iter().map(|s| s.to_string()).collect();
            match (magnitude, factors.is_empty()) {
                (_, true) => write!(f, "{magnitude}")?,
                (1, false) => write!(f, "{}", factors.join("*"))?,
                (_, false) => write!(f, "{}*{}", magnitude, factors.join("*"))?,
            }
        }
        Ok(())
    }
}

// ── Expressions ─────────────────────────────────────────────────────────────

/// A simplified component formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Poly(Poly),
    /// Square root of a polynomial that is not a perfect square.
    Sqrt(Poly),
    /// Absolute value, from `sqrt(m^2)`.
    Abs(Poly),
}

impl Default for Expr {
    fn default() -> Self {
        Expr::Poly(Poly::zero())
    }
}

impl Expr {
    pub fn zero() -> Self {
        Expr::default()
    }

    /// True only for the literal zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Expr::Poly(p) | Expr::Sqrt(p) | Expr::Abs(p) => p.is_zero(),
        }
    }

    pub fn inner(&self) -> &Poly {
        match self {
            Expr::Poly(p) | Expr::Sqrt(p) | Expr::Abs(p) => p,
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<Sym> {
        self.inner().free_symbols()
    }

    pub fn term_count(&self) -> usize {
        self.inner().term_count()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Poly(p) => write!(f, "{p}"),
            Expr::Sqrt(p) => write!(f, "sqrt({p})"),
            Expr::Abs(p) => write!(f, "|{p}|"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
