// registry.rs — Subspace type registry
//
// The closed set of sparse multivector types the generator specializes into,
// each a fixed mask of permitted nonzero basis positions. Declaration order is
// significant: inference returns the FIRST descriptor whose mask covers a
// result's support, not the most specific one.

use std::fmt;

use serde::Serialize;

use crate::basis::Mask;

// ── Data types ──────────────────────────────────────────────────────────────

/// A named subspace of the 16-dimensional algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SubspaceType {
    Scalar,
    Vector,
    Bivector,
    Trivector,
    Pseudoscalar,
    ScalarAndBivector,
    FullMultivector,
}

impl SubspaceType {
    /// Canonical declaration order.
    pub const ALL: [SubspaceType; 7] = [
        SubspaceType::Scalar,
        SubspaceType::Vector,
        SubspaceType::Bivector,
        SubspaceType::Trivector,
        SubspaceType::Pseudoscalar,
        SubspaceType::ScalarAndBivector,
        SubspaceType::FullMultivector,
    ];

    pub const fn mask(self) -> Mask {
        match self {
            SubspaceType::Scalar => Mask::single(0),
            SubspaceType::Vector => Mask::span(1, 4),
            SubspaceType::Bivector => Mask::span(5, 10),
            SubspaceType::Trivector => Mask::span(11, 14),
            SubspaceType::Pseudoscalar => Mask::single(15),
            SubspaceType::ScalarAndBivector => Mask::single(0).union(Mask::span(5, 10)),
            SubspaceType::FullMultivector => Mask::FULL,
        }
    }

    /// Name in emitted code. The scalar type is the host float alias.
    pub fn rust_name(self) -> &'static str {
        match self {
            SubspaceType::Scalar => "Float",
            SubspaceType::Vector => "Vector",
            SubspaceType::Bivector => "Bivector",
            SubspaceType::Trivector => "Trivector",
            SubspaceType::Pseudoscalar => "Pseudoscalar",
            SubspaceType::ScalarAndBivector => "ScalarAndBivector",
            SubspaceType::FullMultivector => "FullMultivector",
        }
    }

    /// Name of the grade-selection accessor targeting this type, if any.
    pub fn selector_name(self) -> Option<&'static str> {
        match self {
            SubspaceType::Scalar => Some("scalar"),
            SubspaceType::Vector => Some("vector"),
            SubspaceType::Bivector => Some("bivector"),
            SubspaceType::Trivector => Some("trivector"),
            SubspaceType::Pseudoscalar => Some("pseudoscalar"),
            SubspaceType::ScalarAndBivector => None,
            SubspaceType::FullMultivector => Some("full_multivector"),
        }
    }

    pub fn is_scalar(self) -> bool {
        self == SubspaceType::Scalar
    }

    pub fn from_rust_name(name: &str) -> Option<SubspaceType> {
        SubspaceType::ALL.into_iter().find(|t| t.rust_name() == name)
    }
}

impl fmt::Display for SubspaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// `true` iff every position of `support` is permitted by `ty`.
pub fn fits(support: Mask, ty: SubspaceType) -> bool {
    ty.mask().is_superset(support)
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Ordered descriptor list used for inference and enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    types: Vec<SubspaceType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Serialize)]
struct DescriptorEntry {
    name: &'static str,
    mask: Mask,
}

impl TypeRegistry {
    /// All descriptors in canonical order.
    pub fn standard() -> Self {
        TypeRegistry {
            types: SubspaceType::ALL.to_vec(),
        }
    }

    /// A registry with a caller-chosen order. Completeness is checked by the
    /// `check_registry` pass, not here.
    pub fn with_types(types: Vec<SubspaceType>) -> Self {
        TypeRegistry { types }
    }

    pub fn types(&self) -> impl Iterator<Item = SubspaceType> + '_ {
        self.types.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// First descriptor in declaration order whose mask covers `support`.
    /// The empty support resolves to the first descriptor.
    pub fn infer(&self, support: Mask) -> Option<SubspaceType> {
        self.types().find(|&t| fits(support, t))
    }

    /// Descriptors that can never be inferred because an earlier one covers
    /// their whole mask, paired with the earlier descriptor.
    pub fn shadowed(&self) -> Vec<(SubspaceType, SubspaceType)> {
        let mut out = Vec::new();
        for (i, &later) in self.types.iter().enumerate() {
            if let Some(&earlier) = self.types[..i]
                .iter()
                .find(|e| e.mask().is_superset(later.mask()))
            {
                out.push((later, earlier));
            }
        }
        out
    }

    /// Union of all descriptor masks.
    pub fn coverage(&self) -> Mask {
        self.types().fold(Mask::EMPTY, |acc, t| acc.union(t.mask()))
    }

    /// Compact, key-ordered JSON used for provenance fingerprints.
    pub fn canonical_json(&self) -> String {
        let entries: Vec<DescriptorEntry> = self
            .types()
            .map(|t| DescriptorEntry {
                name: t.rust_name(),
                mask: t.mask(),
            })
            .collect();
        serde_json::to_string(&entries).unwrap_or_default()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
