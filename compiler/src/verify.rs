// verify.rs — Structural checks on the emitted artifact
//
// Re-reads the generated text through the lexer and surface parser and
// compares what is actually there against the planned signatures.
//
// Preconditions: `plan` was computed from the same operator table that
//                produced `source`.
// Postconditions: returns a certificate with one flag per obligation, plus an
//                 `E0300` diagnostic for every violation found.
// Failure modes: none (violations are reported, not raised).
// Side effects: none.

use std::collections::BTreeMap;

use crate::codegen::PlannedFn;
use crate::diag::{codes, Diagnostic};
use crate::lexer::{Span, Token};
use crate::pass::StageCert;
use crate::surface::{self, FnItem, ImplItem, ParseResult};

// ── Certificate ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyCert {
    /// Delimiters balance and the item surface parses.
    pub parses_balanced: bool,
    /// Every numeric literal is a float literal, except `powi` exponents.
    pub float_literals: bool,
    /// `FLOAT_DIVISION_EPSILON` is defined once, by a positive float literal.
    pub epsilon_literal: bool,
    /// Every planned operator appears exactly once with its planned shape.
    pub surface_matches_plan: bool,
    /// `_r` is never referenced; `r` always is.
    pub rhs_usage: bool,
}

impl StageCert for VerifyCert {
    fn obligations(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("parses_balanced", self.parses_balanced),
            ("float_literals", self.float_literals),
            ("epsilon_literal", self.epsilon_literal),
            ("surface_matches_plan", self.surface_matches_plan),
            ("rhs_usage", self.rhs_usage),
        ]
    }
}

// ── Public entry point ──────────────────────────────────────────────────────

pub fn verify(source: &str, plan: &[PlannedFn]) -> (VerifyCert, Vec<Diagnostic>) {
    let parsed = surface::parse(source);
    let mut diags = Vec::new();

    for err in &parsed.errors {
        diags.push(violation("generated text does not parse").with_cause(err.to_string()));
    }
    let impls = match &parsed.impls {
        Some(impls) if parsed.errors.is_empty() => impls,
        _ => return (VerifyCert::default(), diags),
    };

    let cert = VerifyCert {
        parses_balanced: true,
        float_literals: check_literals(source, &parsed.tokens, &mut diags),
        epsilon_literal: check_epsilon(source, &parsed.tokens, &mut diags),
        surface_matches_plan: check_plan(impls, plan, &mut diags),
        rhs_usage: check_rhs_usage(source, &parsed, impls, &mut diags),
    };
    (cert, diags)
}

fn violation(message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(message).with_code(codes::E0300)
}

fn text(source: &str, span: Span) -> &str {
    &source[span.start..span.end]
}

// ── Literals ────────────────────────────────────────────────────────────────

fn check_literals(source: &str, tokens: &[(Token, Span)], diags: &mut Vec<Diagnostic>) -> bool {
    let mut ok = true;
    for (i, (tok, span)) in tokens.iter().enumerate() {
        if !matches!(tok, Token::IntLit(_)) {
            continue;
        }
        let powi_arg = i >= 2
            && tokens[i - 1].0 == Token::LParen
            && tokens[i - 2].0 == Token::Ident
            && text(source, tokens[i - 2].1) == "powi";
        if !powi_arg {
            ok = false;
            diags.push(
                violation(format!("integer literal `{}`", text(source, *span)))
                    .with_subject(format!("byte {}", span.start))
                    .with_hint("coefficients must be emitted as float literals"),
            );
        }
    }
    ok
}

const EPSILON_NAME: &str = "FLOAT_DIVISION_EPSILON";

/// `const FLOAT_DIVISION_EPSILON: Float = <positive float literal>;`
fn check_epsilon(source: &str, tokens: &[(Token, Span)], diags: &mut Vec<Diagnostic>) -> bool {
    let definitions: Vec<usize> = tokens
        .windows(2)
        .enumerate()
        .filter(|(_, w)| {
            w[0].0 == Token::Ident
                && text(source, w[0].1) == EPSILON_NAME
                && w[1].0 == Token::Colon
        })
        .map(|(i, _)| i)
        .collect();
    let &[at] = definitions.as_slice() else {
        diags.push(
            violation(format!("`{EPSILON_NAME}` defined {} times", definitions.len()))
                .with_subject(EPSILON_NAME),
        );
        return false;
    };

    let initializer = tokens[at..]
        .iter()
        .position(|(t, _)| *t == Token::Equals)
        .map(|p| at + p + 1);
    let value = initializer.and_then(|i| match (tokens.get(i), tokens.get(i + 1)) {
        (Some((Token::FloatLit(v), _)), Some((Token::Semi, _))) => Some(*v),
        _ => None,
    });
    match value {
        Some(v) if v > 0.0 => true,
        _ => {
            let shown = initializer
                .and_then(|i| tokens.get(i))
                .map(|(_, span)| text(source, *span))
                .unwrap_or("<missing>");
            diags.push(
                violation(format!("initializer `{shown}` is not a positive float literal"))
                    .with_subject(EPSILON_NAME),
            );
            false
        }
    }
}

// ── Surface vs. plan ────────────────────────────────────────────────────────

/// (trait, type argument, self type, method name)
type FnKey = (Option<String>, Option<String>, String, String);

fn check_plan(impls: &[ImplItem], plan: &[PlannedFn], diags: &mut Vec<Diagnostic>) -> bool {
    let mut found: BTreeMap<FnKey, Vec<(&ImplItem, &FnItem)>> = BTreeMap::new();
    for imp in impls {
        for f in &imp.fns {
            let key = (
                imp.trait_name.clone(),
                imp.type_arg.clone(),
                imp.self_ty.clone(),
                f.name.clone(),
            );
            found.entry(key).or_default().push((imp, f));
        }
    }

    let mut ok = true;
    for p in plan {
        let key = (
            p.trait_name.map(str::to_string),
            p.type_arg.map(str::to_string),
            p.self_ty.to_string(),
            p.name.to_string(),
        );
        let subject = describe(p);
        let hits = found.get(&key).map(Vec::as_slice).unwrap_or_default();
        let (imp, f) = match hits {
            [hit] => *hit,
            [] => {
                ok = false;
                diags.push(violation("planned operator is missing").with_subject(subject));
                continue;
            }
            _ => {
                ok = false;
                diags.push(
                    violation(format!("planned operator emitted {} times", hits.len()))
                        .with_subject(subject),
                );
                continue;
            }
        };
        if f.ret != p.output {
            ok = false;
            diags.push(
                violation(format!("returns `{}`, planned `{}`", f.ret, p.output))
                    .with_subject(subject.clone()),
            );
        }
        let declared = p.op.declares_output().then_some(p.output);
        if imp.output.as_deref() != declared {
            ok = false;
            diags.push(
                violation(format!(
                    "`type Output` is {:?}, planned {:?}",
                    imp.output, declared
                ))
                .with_subject(subject.clone()),
            );
        }
        if f.rhs_param() != p.rhs_param {
            ok = false;
            diags.push(
                violation(format!(
                    "right parameter is {:?}, planned {:?}",
                    f.rhs_param(),
                    p.rhs_param
                ))
                .with_subject(subject),
            );
        }
    }

    // Trait impls nobody planned.
    let planned_traits = plan.iter().filter(|p| p.trait_name.is_some()).count();
    let emitted_traits: usize = found
        .iter()
        .filter(|((trait_name, ..), _)| trait_name.is_some())
        .map(|(_, hits)| hits.len())
        .sum();
    if emitted_traits != planned_traits {
        ok = false;
        diags.push(violation(format!(
            "{emitted_traits} trait methods emitted, {planned_traits} planned"
        )));
    }
    ok
}

fn describe(p: &PlannedFn) -> String {
    match (p.trait_name, p.type_arg) {
        (Some(t), Some(arg)) => format!("impl {t}<{arg}> for {}::{}", p.self_ty, p.name),
        (Some(t), None) => format!("impl {t} for {}::{}", p.self_ty, p.name),
        (None, _) => format!("{}::{}", p.self_ty, p.name),
    }
}

// ── Right-operand usage ─────────────────────────────────────────────────────

fn check_rhs_usage(
    source: &str,
    parsed: &ParseResult,
    impls: &[ImplItem],
    diags: &mut Vec<Diagnostic>,
) -> bool {
    let mut ok = true;
    for imp in impls {
        for f in &imp.fns {
            let Some(param) = f.rhs_param() else {
                continue;
            };
            if param != "r" && param != "_r" {
                continue;
            }
            let referenced = parsed
                .tokens_within(f.body)
                .any(|(tok, span)| *tok == Token::Ident && text(source, *span) == param);
            let expected = param == "r";
            if referenced != expected {
                ok = false;
                let message = if expected {
                    "parameter `r` is never referenced"
                } else {
                    "parameter `_r` is referenced"
                };
                diags.push(
                    violation(message).with_subject(format!("{}::{}", imp.self_ty, f.name)),
                );
            }
        }
    }
    ok
}

// ── Tests ───────────────────────────────────────────────────────────────────
