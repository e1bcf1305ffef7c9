// pgac — PGA Compiler
//
// Library root. Derives the 3D projective geometric algebra R(3,0,1) from its
// basis, specializes every operation to the registered subspace types, and
// emits the result as one Rust module.

pub mod algebra;
pub mod basis;
pub mod codegen;
pub mod diag;
pub mod expr;
pub mod lexer;
pub mod pass;
pub mod pipeline;
pub mod registry;
pub mod simplify;
pub mod surface;
pub mod synth;
pub mod verify;
