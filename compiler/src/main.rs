use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use pgac::codegen::{CodegenOptions, FloatType};
use pgac::pass::PassId;
use pgac::pipeline::{run_pipeline, CompilationState};
use pgac::registry::TypeRegistry;

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    /// Generated Rust module
    Rust,
    /// Registry and operator table as JSON
    Manifest,
    /// Provenance hashes as JSON
    BuildInfo,
}

impl EmitStage {
    fn terminal(&self) -> PassId {
        match self {
            EmitStage::Rust | EmitStage::BuildInfo => PassId::Verify,
            EmitStage::Manifest => PassId::Synthesize,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FloatArg {
    F32,
    F64,
}

#[derive(Parser, Debug)]
#[command(
    name = "pgac",
    version,
    about = "PGA Compiler — generates the sparse R(3,0,1) projective geometric algebra as Rust source"
)]
struct Cli {
    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Rust)]
    emit: EmitStage,

    /// Host float type behind the `Float` alias
    #[arg(long = "float", value_enum, default_value_t = FloatArg::F64)]
    float: FloatArg,

    /// Norm threshold used by `is_finite`, `is_infinite` and `exp`
    #[arg(long, default_value_t = 1e-9)]
    epsilon: f64,

    /// Omit `Bivector::exp` and the unit pseudoscalar `I`
    #[arg(long)]
    no_extras: bool,

    /// Print generator passes and timing
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        match &cli.output {
            Some(path) => eprintln!("pgac: output = {}", path.display()),
            None => eprintln!("pgac: output = <stdout>"),
        }
        eprintln!("pgac: emit   = {:?}", cli.emit);
    }

    let options = CodegenOptions {
        float_type: match cli.float {
            FloatArg::F32 => FloatType::F32,
            FloatArg::F64 => FloatType::F64,
        },
        division_epsilon: cli.epsilon,
        include_extras: !cli.no_extras,
    };

    let registry = TypeRegistry::standard();
    if cli.verbose {
        eprintln!("pgac: {} types registered", registry.len());
    }

    // ── Run passes ──
    let mut state = CompilationState::new(registry, options);
    let result = run_pipeline(&mut state, cli.emit.terminal(), cli.verbose, |_, diags| {
        for diag in diags {
            eprintln!("pgac: {}", diag);
        }
    });
    if let Err(err) = result {
        if cli.verbose {
            eprintln!("pgac: {}", err);
        }
        std::process::exit(1);
    }

    let text = match cli.emit {
        EmitStage::Rust => state.generated.map(|g| g.source),
        EmitStage::Manifest => state.manifest().map(|m| m.to_json()),
        EmitStage::BuildInfo => state.provenance.map(|p| p.to_json()),
    };
    let Some(text) = text else {
        eprintln!("pgac: error: requested artifact was not produced");
        std::process::exit(1);
    };

    // ── Write output ──
    let written = match &cli.output {
        Some(path) => std::fs::write(path, &text).map_err(|e| (path.display().to_string(), e)),
        None => std::io::stdout()
            .write_all(text.as_bytes())
            .map_err(|e| ("<stdout>".to_string(), e)),
    };
    if let Err((target, e)) = written {
        eprintln!("pgac: error: {}: {}", target, e);
        std::process::exit(2);
    }

    if cli.verbose {
        eprintln!("pgac: wrote {} bytes", text.len());
    }
}
