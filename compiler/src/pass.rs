// pass.rs — Pass descriptor module: metadata, dependency resolution, artifact IDs
//
// Declares the generator's 4 passes, their dependency edges, and the
// artifacts they produce. Used by the pipeline runner to compute minimal
// pass subsets for each --emit target.

use std::collections::HashSet;

// ── Pass and Artifact identifiers ──────────────────────────────────────────

/// Identifies each generator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    CheckRegistry,
    Synthesize,
    Emit,
    Verify,
}

/// Machine-readable artifact identifiers. Each maps to a concrete type
/// in the compilation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactId {
    Registry,  // TypeRegistry (checked)
    Operators, // OperatorTable
    Generated, // GeneratedCode
    Cert,      // VerifyCert
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a generator pass.
pub struct PassDescriptor {
    /// Human-readable name for diagnostics/verbose output.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
    /// Artifacts this pass produces.
    pub outputs: &'static [ArtifactId],
    /// What invalidates this pass's output.
    pub invalidation_key: &'static str,
    /// Postconditions, documentation only.
    pub invariants: &'static str,
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::CheckRegistry => PassDescriptor {
            name: "check_registry",
            inputs: &[],
            outputs: &[ArtifactId::Registry],
            invalidation_key: "registry order + masks",
            invariants: "last descriptor covers all positions",
        },
        PassId::Synthesize => PassDescriptor {
            name: "synthesize",
            inputs: &[PassId::CheckRegistry],
            outputs: &[ArtifactId::Operators],
            invalidation_key: "registry + structure constants",
            invariants: "every operator resolved, components zero outside output mask",
        },
        PassId::Emit => PassDescriptor {
            name: "emit",
            inputs: &[PassId::Synthesize],
            outputs: &[ArtifactId::Generated],
            invalidation_key: "operators + codegen_options",
            invariants: "epsilon positive and finite, one source unit per synthesized operator",
        },
        PassId::Verify => PassDescriptor {
            name: "verify",
            inputs: &[PassId::Emit],
            outputs: &[ArtifactId::Cert],
            invalidation_key: "generated + operators",
            invariants: "text parses, float literals, surface matches plan, rhs usage",
        },
    }
}

// ── Stage certificates ─────────────────────────────────────────────────────

/// A pass-level proof record: named boolean obligations.
pub trait StageCert {
    /// Every obligation paired with whether it holds.
    fn obligations(&self) -> Vec<(&'static str, bool)>;

    fn all_pass(&self) -> bool {
        self.obligations().iter().all(|(_, ok)| *ok)
    }

    /// Names of failed obligations.
    fn failures(&self) -> Vec<&'static str> {
        self.obligations()
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All 4 pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 4] = [
    PassId::CheckRegistry,
    PassId::Synthesize,
    PassId::Emit,
    PassId::Verify,
];

/// Compute the minimal ordered set of passes needed to produce `terminal`.
/// Returns passes in topological (execution) order.
pub fn required_passes(terminal: PassId) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    visit(terminal, &mut visited, &mut order);
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────
