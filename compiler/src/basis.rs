// basis.rs — Basis blades and structure constants of R(3,0,1)
//
// Declares the 16 basis blades of 3D projective geometric algebra, each as an
// ordered list of generators, and derives the multiplication (Cayley) table
// from those lists: generators are sorted with a sign flip per swap, repeated
// generators contract through the metric (e0² = 0, e1² = e2² = e3² = 1).
// The wedge and dot tables are filtered views of the geometric table.
//
// Preconditions: none (constants only).
// Postconditions: tables are identical on every run; every blade product
//   lands on exactly one blade with a sign in {+1, -1, 0}.
// Failure modes: none.
// Side effects: tables are built lazily once per process.

use std::sync::OnceLock;

/// Number of basis blades (2^4).
pub const BASIS_COUNT: usize = 16;

/// Number of generators: e0 (degenerate), e1, e2, e3.
pub const GENERATOR_COUNT: usize = 4;

/// Square of each generator.
const METRIC: [Sign; GENERATOR_COUNT] = [Sign::Zero, Sign::Pos, Sign::Pos, Sign::Pos];

// ── Blades ──────────────────────────────────────────────────────────────────

/// A basis blade, written as the ordered product of its generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blade {
    pub name: &'static str,
    pub generators: &'static [u8],
}

/// The basis in coefficient order `a0..a15`. The non-ascending generator
/// orders (`e31`, `e021`, `e013`, `e032`) fix those blades' orientation.
pub const BLADES: [Blade; BASIS_COUNT] = [
    Blade { name: "1", generators: &[] },
    Blade { name: "e0", generators: &[0] },
    Blade { name: "e1", generators: &[1] },
    Blade { name: "e2", generators: &[2] },
    Blade { name: "e3", generators: &[3] },
    Blade { name: "e01", generators: &[0, 1] },
    Blade { name: "e02", generators: &[0, 2] },
    Blade { name: "e03", generators: &[0, 3] },
    Blade { name: "e12", generators: &[1, 2] },
    Blade { name: "e31", generators: &[3, 1] },
    Blade { name: "e23", generators: &[2, 3] },
    Blade { name: "e021", generators: &[0, 2, 1] },
    Blade { name: "e013", generators: &[0, 1, 3] },
    Blade { name: "e032", generators: &[0, 3, 2] },
    Blade { name: "e123", generators: &[1, 2, 3] },
    Blade { name: "e0123", generators: &[0, 1, 2, 3] },
];

impl Blade {
    pub fn grade(&self) -> usize {
        self.generators.len()
    }

    /// Generator set as a bitmask (bit g set iff e_g is a factor).
    fn bits(&self) -> usize {
        self.generators.iter().fold(0, |acc, &g| acc | (1 << g))
    }

    /// Sign of the permutation taking `generators` into ascending order.
    fn order_sign(&self) -> Sign {
        let mut gens = self.generators.to_vec();
        let mut sign = Sign::Pos;
        for pass in 0..gens.len() {
            for i in 0..gens.len().saturating_sub(pass + 1) {
                if gens[i] > gens[i + 1] {
                    gens.swap(i, i + 1);
                    sign = sign.flip();
                }
            }
        }
        sign
    }
}

/// Grade of the blade at coefficient position `index`.
pub fn grade(index: usize) -> usize {
    BLADES[index].grade()
}

// ── Masks ───────────────────────────────────────────────────────────────────

/// A set of basis positions, bit `i` standing for blade `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct Mask(pub u16);

impl Mask {
    pub const EMPTY: Mask = Mask(0);
    pub const FULL: Mask = Mask(u16::MAX);

    /// Positions `start..=end`.
    pub const fn span(start: usize, end: usize) -> Mask {
        let mut bits = 0u16;
        let mut i = start;
        while i <= end {
            bits |= 1 << i;
            i += 1;
        }
        Mask(bits)
    }

    pub const fn single(index: usize) -> Mask {
        Mask(1 << index)
    }

    pub const fn union(self, other: Mask) -> Mask {
        Mask(self.0 | other.0)
    }

    pub fn contains(self, index: usize) -> bool {
        index < BASIS_COUNT && (self.0 >> index) & 1 == 1
    }

    pub fn is_superset(self, other: Mask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn overlaps(self, other: Mask) -> bool {
        self.0 & other.0 != 0
    }

    /// Member positions in ascending order.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..BASIS_COUNT).filter(move |&i| self.contains(i))
    }
}

impl std::fmt::Display for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.indices().map(|i| BLADES[i].name).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

// ── Signs ───────────────────────────────────────────────────────────────────

/// Sign of a blade product. `Zero` arises from the degenerate generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Pos,
    Neg,
    Zero,
}

impl Sign {
    pub fn flip(self) -> Self {
        match self {
            Sign::Pos => Sign::Neg,
            Sign::Neg => Sign::Pos,
            Sign::Zero => Sign::Zero,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Sign::Pos => 1,
            Sign::Neg => -1,
            Sign::Zero => 0,
        }
    }
}

impl std::ops::Mul for Sign {
    type Output = Sign;

    fn mul(self, rhs: Sign) -> Sign {
        match (self, rhs) {
            (Sign::Zero, _) | (_, Sign::Zero) => Sign::Zero,
            (Sign::Pos, s) | (s, Sign::Pos) => s,
            (Sign::Neg, Sign::Neg) => Sign::Pos,
        }
    }
}

// ── Cayley table ────────────────────────────────────────────────────────────

/// Result of multiplying two basis blades.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CayleyEntry {
    pub blade: usize,
    pub sign: Sign,
}

/// Which part of the geometric product a bilinear map keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductKind {
    Geometric,
    /// Grade-additive part.
    Wedge,
    /// Grade-contracting part, `|grade(a) - grade(b)|`.
    Dot,
}

impl ProductKind {
    fn keeps(self, lhs_grade: usize, rhs_grade: usize, out_grade: usize) -> bool {
        match self {
            ProductKind::Geometric => true,
            ProductKind::Wedge => out_grade == lhs_grade + rhs_grade,
            ProductKind::Dot => out_grade == lhs_grade.abs_diff(rhs_grade),
        }
    }
}

/// One nonzero structure constant: `coeff * a[lhs] * b[rhs]` contributes to
/// the output position that owns the term list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub coeff: i64,
    pub lhs: usize,
    pub rhs: usize,
}

/// Full blade multiplication table.
#[derive(Debug, Clone)]
pub struct CayleyTable {
    entries: [[CayleyEntry; BASIS_COUNT]; BASIS_COUNT],
}

impl Default for CayleyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CayleyTable {
    pub fn new() -> Self {
        let mut by_bits = [0usize; BASIS_COUNT];
        for (index, blade) in BLADES.iter().enumerate() {
            by_bits[blade.bits()] = index;
        }

        let mut entries = [[CayleyEntry {
            blade: 0,
            sign: Sign::Zero,
        }; BASIS_COUNT]; BASIS_COUNT];
        for (i, row) in entries.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = multiply_blades(i, j, &by_bits);
            }
        }
        CayleyTable { entries }
    }

    pub fn product(&self, lhs: usize, rhs: usize) -> CayleyEntry {
        self.entries[lhs][rhs]
    }

    /// Sparse structure constants for `kind`, grouped by output position.
    /// Within a position, terms are ordered by `(lhs, rhs)`.
    pub fn terms(&self, kind: ProductKind) -> Vec<Vec<Term>> {
        let mut rows = vec![Vec::new(); BASIS_COUNT];
        for lhs in 0..BASIS_COUNT {
            for rhs in 0..BASIS_COUNT {
                let entry = self.entries[lhs][rhs];
                if entry.sign == Sign::Zero {
                    continue;
                }
                if !kind.keeps(grade(lhs), grade(rhs), grade(entry.blade)) {
                    continue;
                }
                rows[entry.blade].push(Term {
                    coeff: entry.sign.as_i64(),
                    lhs,
                    rhs,
                });
            }
        }
        rows
    }
}

/// Multiply blade `i` by blade `j`.
///
/// Works on ascending generator bitmasks: for every generator of the right
/// factor, each higher generator of the left factor must be swapped past it.
/// Shared generators contract through the metric. The blades' own ordering
/// signs convert between the bitmask form and the declared orientation.
fn multiply_blades(i: usize, j: usize, by_bits: &[usize; BASIS_COUNT]) -> CayleyEntry {
    let a = BLADES[i].bits();
    let b = BLADES[j].bits();

    let mut sign = Sign::Pos;
    for g in 0..GENERATOR_COUNT {
        if (b >> g) & 1 == 1 {
            for h in (g + 1)..GENERATOR_COUNT {
                if (a >> h) & 1 == 1 {
                    sign = sign.flip();
                }
            }
        }
    }

    let shared = a & b;
    for (g, &square) in METRIC.iter().enumerate() {
        if (shared >> g) & 1 == 1 {
            sign = sign * square;
        }
    }

    let blade = by_bits[a ^ b];
    sign = sign * BLADES[i].order_sign() * BLADES[j].order_sign() * BLADES[blade].order_sign();
    CayleyEntry { blade, sign }
}

/// Process-wide structure constants, built on first use.
pub fn structure_constants(kind: ProductKind) -> &'static [Vec<Term>] {
    static TABLES: OnceLock<[Vec<Vec<Term>>; 3]> = OnceLock::new();
    let tables = TABLES.get_or_init(|| {
        let table = CayleyTable::new();
        [
            table.terms(ProductKind::Geometric),
            table.terms(ProductKind::Wedge),
            table.terms(ProductKind::Dot),
        ]
    });
    match kind {
        ProductKind::Geometric => &tables[0],
        ProductKind::Wedge => &tables[1],
        ProductKind::Dot => &tables[2],
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
