// pipeline.rs — Compilation state and pass orchestration
//
// Holds all pass artifacts and runs the minimal set of passes for a given
// terminal PassId.
//
// Preconditions: the registry and codegen options are set before calling
//                run_pipeline.
// Postconditions: all artifacts for required passes are populated, or
//                 has_error is set.
// Failure modes: any pass emitting error-level diagnostics.
// Side effects: calls on_pass_complete callback after each pass for immediate
//               display; prints progress to stderr when verbose.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::basis::Mask;
use crate::codegen::{codegen, planned_signatures, CodegenOptions, GeneratedCode};
use crate::diag::{codes, has_errors, Diagnostic};
use crate::pass::{descriptor, required_passes, PassId, StageCert};
use crate::registry::{SubspaceType, TypeRegistry};
use crate::synth::OperatorTable;
use crate::verify::{verify, VerifyCert};

// ── Provenance ─────────────────────────────────────────────────────────────

/// Provenance metadata for reproducible builds.
///
/// `artifact_hash`: SHA-256 of the generated source text.
/// `registry_fingerprint`: SHA-256 of `TypeRegistry::canonical_json()`.
/// `compiler_version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub artifact_hash: [u8; 32],
    pub registry_fingerprint: [u8; 32],
    pub compiler_version: &'static str,
}

impl Provenance {
    /// Hex string of the artifact hash (64 characters).
    pub fn artifact_hash_hex(&self) -> String {
        bytes_to_hex(&self.artifact_hash)
    }

    /// Hex string of the registry fingerprint (64 characters).
    pub fn registry_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.registry_fingerprint)
    }

    /// Serialize provenance as a JSON string for `--emit build-info`.
    pub fn to_json(&self) -> String {
        format!(
            "{{\n  \"artifact_hash\": \"{}\",\n  \"registry_fingerprint\": \"{}\",\n  \"manifest_schema_version\": 1,\n  \"compiler_version\": \"{}\"\n}}\n",
            self.artifact_hash_hex(),
            self.registry_fingerprint_hex(),
            self.compiler_version,
        )
    }
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

fn sha256(text: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Compute provenance from the generated text and the registry.
pub fn compute_provenance(source: &str, registry: &TypeRegistry) -> Provenance {
    Provenance {
        artifact_hash: sha256(source),
        registry_fingerprint: sha256(&registry.canonical_json()),
        compiler_version: env!("CARGO_PKG_VERSION"),
    }
}

// ── Manifest ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub compiler_version: &'static str,
    pub registry: Vec<ManifestType>,
    pub operators: Vec<ManifestOperator>,
    pub omitted_derived: usize,
}

#[derive(Debug, Serialize)]
pub struct ManifestType {
    pub name: &'static str,
    pub mask: u16,
    pub components: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct ManifestOperator {
    #[serde(rename = "trait", skip_serializing_if = "Option::is_none")]
    pub trait_name: Option<&'static str>,
    pub method: &'static str,
    pub lhs: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rhs: Option<&'static str>,
    pub output: &'static str,
    pub uses_rhs: bool,
    pub term_count: usize,
}

impl Manifest {
    pub fn new(registry: &TypeRegistry, table: &OperatorTable) -> Self {
        let registry = registry
            .types()
            .map(|t| ManifestType {
                name: t.rust_name(),
                mask: t.mask().0,
                components: t.mask().indices().collect(),
            })
            .collect();
        let operators = table
            .operators()
            .map(|s| ManifestOperator {
                trait_name: s.op.trait_name(),
                method: s.op.method_name(),
                lhs: s.lhs.rust_name(),
                rhs: s.rhs.map(SubspaceType::rust_name),
                output: s.output.rust_name(),
                uses_rhs: s.uses_rhs,
                term_count: s.term_count(),
            })
            .collect();
        Manifest {
            compiler_version: env!("CARGO_PKG_VERSION"),
            registry,
            operators,
            omitted_derived: table.omitted_derived,
        }
    }

    /// Pretty JSON for `--emit manifest`.
    pub fn to_json(&self) -> String {
        let mut json = serde_json::to_string_pretty(self).unwrap_or_default();
        json.push('\n');
        json
    }
}

// ── Compilation state ──────────────────────────────────────────────────────

/// Holds all compilation artifacts and accumulated diagnostics.
pub struct CompilationState {
    pub registry: TypeRegistry,
    pub options: CodegenOptions,
    pub operators: Option<OperatorTable>,
    pub generated: Option<GeneratedCode>,
    pub cert: Option<VerifyCert>,
    pub diagnostics: Vec<Diagnostic>,
    pub has_error: bool,
    pub provenance: Option<Provenance>,
}

impl CompilationState {
    pub fn new(registry: TypeRegistry, options: CodegenOptions) -> Self {
        Self {
            registry,
            options,
            operators: None,
            generated: None,
            cert: None,
            diagnostics: Vec::new(),
            has_error: false,
            provenance: None,
        }
    }

    pub fn manifest(&self) -> Option<Manifest> {
        self.operators
            .as_ref()
            .map(|table| Manifest::new(&self.registry, table))
    }
}

// ── Error type ─────────────────────────────────────────────────────────────

/// Pipeline execution failed due to error-level diagnostics in a pass.
/// The specific diagnostics are available in `CompilationState.diagnostics`.
#[derive(Debug)]
pub struct PipelineError {
    /// The pass that produced the error.
    pub failing_pass: PassId,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pass `{}` failed", descriptor(self.failing_pass).name)
    }
}

impl std::error::Error for PipelineError {}

// ── Registry check ─────────────────────────────────────────────────────────

/// Completeness and shadowing checks on the declared descriptor order.
pub fn check_registry(registry: &TypeRegistry) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    match registry.types().last() {
        None => diags.push(
            Diagnostic::error("registry declares no descriptors").with_code(codes::E0200),
        ),
        Some(last) if last.mask() != Mask::FULL => diags.push(
            Diagnostic::error("last descriptor does not cover every basis position")
                .with_code(codes::E0200)
                .with_subject(last.rust_name())
                .with_cause(format!("registry coverage is {}", registry.coverage()))
                .with_hint("declare a descriptor covering all 16 positions last"),
        ),
        Some(_) => {}
    }

    for (later, earlier) in registry.shadowed() {
        diags.push(
            Diagnostic::warning(format!(
                "descriptor is covered by `{}` and can never be inferred",
                earlier.rust_name()
            ))
            .with_code(codes::W0200)
            .with_subject(later.rust_name()),
        );
    }
    diags
}

// ── Options check ──────────────────────────────────────────────────────────

/// The division epsilon is emitted as a float literal and used as a strict
/// lower bound, so it must be finite and positive.
pub fn check_options(options: &CodegenOptions) -> Vec<Diagnostic> {
    let epsilon = options.division_epsilon;
    if epsilon.is_finite() && epsilon > 0.0 {
        return Vec::new();
    }
    vec![Diagnostic::error(format!("division epsilon `{epsilon}` is not a positive finite number"))
        .with_code(codes::E0201)
        .with_subject("--epsilon")
        .with_hint("pass a value such as 1e-9")]
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// Per-pass post-processing: callback, accumulate, verbose, error check.
fn finish_pass(
    state: &mut CompilationState,
    pass_id: PassId,
    diags: Vec<Diagnostic>,
    elapsed: Duration,
    verbose: bool,
    on_pass_complete: &mut impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    on_pass_complete(pass_id, &diags);
    let is_err = has_errors(&diags);
    state.diagnostics.extend(diags);
    if verbose {
        eprintln!(
            "pgac: {} complete, {:.1}ms",
            descriptor(pass_id).name,
            elapsed.as_secs_f64() * 1000.0
        );
    }
    if is_err {
        state.has_error = true;
        return Err(PipelineError {
            failing_pass: pass_id,
        });
    }
    Ok(())
}

/// An upstream artifact was absent when a pass needed it.
fn missing_input(state: &mut CompilationState, pass_id: PassId) -> PipelineError {
    state.diagnostics.push(Diagnostic::error(format!(
        "pass `{}` ran before its inputs were produced",
        descriptor(pass_id).name
    )));
    state.has_error = true;
    PipelineError {
        failing_pass: pass_id,
    }
}

// ── Pipeline runner ────────────────────────────────────────────────────────

/// Run the minimal set of passes to produce `terminal`.
///
/// Per-pass sequence: execute → on_pass_complete(callback) → verbose → error check.
///
/// Preconditions: `state.registry` and `state.options` are set.
/// Postconditions: artifacts for all passes in `required_passes(terminal)` are
///   populated, or `state.has_error` is true.
/// Failure modes: any pass producing error-level diagnostics; verification
///   obligations not met.
/// Side effects: calls `on_pass_complete` after each pass for immediate
///   diagnostic display.
pub fn run_pipeline(
    state: &mut CompilationState,
    terminal: PassId,
    verbose: bool,
    mut on_pass_complete: impl FnMut(PassId, &[Diagnostic]),
) -> Result<(), PipelineError> {
    for pass_id in required_passes(terminal) {
        match pass_id {
            PassId::CheckRegistry => {
                let t = Instant::now();
                let diags = check_registry(&state.registry);
                let elapsed = t.elapsed();
                finish_pass(state, pass_id, diags, elapsed, verbose, &mut on_pass_complete)?;
            }
            PassId::Synthesize => {
                let t = Instant::now();
                let result = OperatorTable::synthesize(&state.registry);
                let elapsed = t.elapsed();
                let diags = match result {
                    Ok(table) => {
                        if verbose {
                            eprintln!(
                                "pgac: {} operators synthesized, {} derived specializations omitted",
                                table.len(),
                                table.omitted_derived
                            );
                        }
                        state.operators = Some(table);
                        Vec::new()
                    }
                    Err(err) => vec![Diagnostic::from(&err)],
                };
                finish_pass(state, pass_id, diags, elapsed, verbose, &mut on_pass_complete)?;
            }
            PassId::Emit => {
                let Some(table) = state.operators.as_ref() else {
                    return Err(missing_input(state, pass_id));
                };
                let t = Instant::now();
                let option_diags = check_options(&state.options);
                if has_errors(&option_diags) {
                    let elapsed = t.elapsed();
                    return finish_pass(
                        state,
                        pass_id,
                        option_diags,
                        elapsed,
                        verbose,
                        &mut on_pass_complete,
                    );
                }
                let generated = codegen(table, &state.options);
                let elapsed = t.elapsed();
                if verbose {
                    eprintln!(
                        "pgac: {} bytes emitted in {} blocks",
                        generated.source.len(),
                        generated.block_count
                    );
                }
                state.provenance = Some(compute_provenance(&generated.source, &state.registry));
                state.generated = Some(generated);
                finish_pass(
                    state,
                    pass_id,
                    Vec::new(),
                    elapsed,
                    verbose,
                    &mut on_pass_complete,
                )?;
            }
            PassId::Verify => {
                let (Some(table), Some(generated)) =
                    (state.operators.as_ref(), state.generated.as_ref())
                else {
                    return Err(missing_input(state, pass_id));
                };
                let t = Instant::now();
                let plan = planned_signatures(table);
                let (cert, mut diags) = verify(&generated.source, &plan);
                let elapsed = t.elapsed();
                if !cert.all_pass() {
                    diags.push(
                        Diagnostic::error(format!(
                            "artifact verification failed: {}",
                            cert.failures().join(", ")
                        ))
                        .with_code(codes::E0300),
                    );
                }
                state.cert = Some(cert);
                finish_pass(state, pass_id, diags, elapsed, verbose, &mut on_pass_complete)?;
            }
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
