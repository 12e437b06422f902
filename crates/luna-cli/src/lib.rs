//! luna-cli — bibliothèque interne du binaire `luna`
//!
//! But : garder `main.rs` réduit au parsing d'arguments et à l'initialisation
//! (logger, couleur) ; tout le reste vit ici et reste testable.
//!
//! Points clés :
//! - `Command` haut-niveau + `execute(cmd, out)` → code de sortie
//! - Suite de fumée (`luna test`) : construit des chunks, les valide et les
//!   désassemble (texte ou JSON)
//! - Traces (`feature = "trace"`) et couleurs (`feature = "color"`) optionnelles

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use luna_core::prelude::*;

// ───────────────────────────── Types publics ─────────────────────────────

/// Représente une commande haut-niveau ; le parsing CLI reste dans main.rs.
#[derive(Clone, Debug)]
pub enum Command {
    /// Aucun argument : invite interactive (pas encore disponible).
    Prompt,
    /// Exécuter un script (pas encore disponible).
    Run(RunTask),
    /// Compiler un paquet.
    Build(BuildTask),
    /// Compiler puis installer un paquet.
    Install(BuildTask),
    /// Suite de fumée du cœur bytecode.
    Test(TestTask),
    /// Afficher la version.
    Version,
}

#[derive(Clone, Debug)]
pub struct RunTask {
    pub script: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct BuildTask {
    pub input: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct TestTask {
    pub filter: Option<String>, // sous-chaîne du nom de cas
    pub json: bool,             // rapports JSON au lieu du texte
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger selon la feature `trace`.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .format_timestamp_secs()
            .try_init();
    }
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Exécute une commande en écrivant sur `out`. Retourne un code de sortie.
pub fn execute(cmd: Command, out: &mut dyn Write) -> Result<i32> {
    match cmd {
        Command::Prompt => {
            writeln!(out, "[Prompt]\tN/A")?;
            Ok(0)
        },
        Command::Run(t) => run_entry(&t, out),
        Command::Build(t) => front_end_missing("build", &t),
        Command::Install(t) => front_end_missing("install", &t),
        Command::Test(t) => test_entry(&t, out),
        Command::Version => {
            writeln!(out, "luna {}", env!("CARGO_PKG_VERSION"))?;
            Ok(0)
        },
    }
}

fn run_entry(task: &RunTask, out: &mut dyn Write) -> Result<i32> {
    log::info!("run {}", display(&task.script));
    writeln!(out, "[Running scripts]\tN/A")?;
    Ok(0)
}

fn front_end_missing(what: &str, task: &BuildTask) -> Result<i32> {
    let target = task.input.as_deref().map_or_else(|| ".".to_owned(), display);
    bail!("`{what}` {target}: compiler front end not available")
}

fn test_entry(task: &TestTask, out: &mut dyn Write) -> Result<i32> {
    let selected: Vec<&SmokeCase> = SMOKE_CASES
        .iter()
        .filter(|c| task.filter.as_deref().map_or(true, |f| c.name.contains(f)))
        .collect();
    if selected.is_empty() {
        bail!("aucun cas ne correspond au filtre `{}`", task.filter.as_deref().unwrap_or_default());
    }

    let reports: Vec<CaseReport> = selected.into_iter().map(SmokeCase::run).collect();
    let failed = reports.iter().filter(|r| !r.passed).count();

    if task.json {
        serde_json::to_writer_pretty(&mut *out, &reports).context("sérialisation JSON")?;
        writeln!(out)?;
    } else {
        for report in &reports {
            write_report(out, report)?;
        }
        writeln!(out, "{} passed, {failed} failed", reports.len() - failed)?;
    }

    for report in &reports {
        eprintln!("{}", status_line(report.passed, report.name));
    }
    Ok(i32::from(failed > 0))
}

fn write_report(out: &mut dyn Write, report: &CaseReport) -> Result<()> {
    writeln!(out, "-- {} --", report.name)?;
    for note in &report.notes {
        writeln!(out, "{note}")?;
    }
    if let Some(trace) = &report.trace {
        write!(out, "{trace}")?;
    }
    match &report.error {
        Some(e) => writeln!(out, "FAILED: {e}")?,
        None => writeln!(out, "ok")?,
    }
    writeln!(out)?;
    Ok(())
}

// ───────────────────────────── Suite de fumée ─────────────────────────────

/// Un cas : construit un chunk, le valide, puis compare son désassemblage.
pub struct SmokeCase {
    pub name: &'static str,
    build: fn(&mut Vec<String>) -> Result<Chunk>,
    expected: &'static str,
}

/// Résultat sérialisable d'un cas.
#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub name: &'static str,
    pub passed: bool,
    pub notes: Vec<String>,
    pub trace: Option<Trace>,
    pub error: Option<String>,
}

/// Cas embarqués, dans l'ordre d'exécution.
pub const SMOKE_CASES: &[SmokeCase] = &[
    SmokeCase { name: "allocs", build: allocs_case, expected: "== test chunk ==\n0000  102 OP_RETURN\n" },
    SmokeCase {
        name: "constants",
        build: constants_case,
        expected: "== test chunk ==\n0000   89 OP_CONSTANT         0 '1.2'\n0002  101 OP_RETURN\n",
    },
    SmokeCase { name: "disassembly", build: disassembly_case, expected: "== test chunk ==\n0000   99 OP_RETURN\n" },
];

impl SmokeCase {
    /// Exécute le cas ; n'échoue jamais, l'erreur est portée par le rapport.
    pub fn run(&self) -> CaseReport {
        let mut notes = Vec::new();
        let outcome = (self.build)(&mut notes).and_then(|chunk| {
            validate_chunk(&chunk)?;
            let trace = disassemble_chunk(&chunk, "test chunk")?;
            if trace.to_string() != self.expected {
                bail!("trace inattendue:\n{trace}");
            }
            Ok(trace)
        });
        log::debug!("smoke case `{}` done (ok={})", self.name, outcome.is_ok());
        match outcome {
            Ok(trace) => CaseReport { name: self.name, passed: true, notes, trace: Some(trace), error: None },
            Err(e) => CaseReport { name: self.name, passed: false, notes, trace: None, error: Some(format!("{e:#}")) },
        }
    }
}

fn sizes(chunk: &Chunk) -> String { format!("count={} capacity={}", chunk.len(), chunk.capacity()) }

fn allocs_case(notes: &mut Vec<String>) -> Result<Chunk> {
    let mut chunk = Chunk::new();
    notes.push(format!("init: {}", sizes(&chunk)));
    chunk.write_op(OpCode::Return, 102);
    notes.push(format!("write: {}", sizes(&chunk)));
    if (chunk.len(), chunk.capacity()) != (1, 8) {
        bail!("première écriture: attendu count=1 capacity=8, obtenu {}", sizes(&chunk));
    }

    let mut scratch = chunk.clone();
    scratch.reset();
    notes.push(format!("reset: {}", sizes(&scratch)));
    if (scratch.len(), scratch.capacity()) != (0, 0) {
        bail!("reset: attendu count=0 capacity=0, obtenu {}", sizes(&scratch));
    }
    Ok(chunk)
}

fn constants_case(notes: &mut Vec<String>) -> Result<Chunk> {
    let mut chunk = Chunk::new();
    let constant = chunk.add_constant(Value::Number(1.2));
    notes.push(format!("constant index: {constant}"));
    let operand = u8::try_from(constant).context("index de constante sur un octet")?;

    // [ OP_CONSTANT | index ]
    chunk.write_op(OpCode::Constant, 89);
    chunk.write(operand, 89);
    chunk.write_op(OpCode::Return, 101);
    Ok(chunk)
}

fn disassembly_case(_notes: &mut Vec<String>) -> Result<Chunk> {
    let mut chunk = Chunk::new();
    chunk.write_op(OpCode::Return, 99);
    Ok(chunk)
}

// ───────────────────────────── Utilitaires ─────────────────────────────

fn display(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

/// `PASS name` / `FAIL name`, colorée seulement si stderr le supporte
/// (respecte `NO_COLOR`, `CLICOLOR_FORCE` et `--color`).
fn status_line(passed: bool, msg: &str) -> String {
    let tag = if passed { "PASS" } else { "FAIL" };
    #[cfg(feature = "color")]
    {
        use owo_colors::{OwoColorize, Stream, Style};
        let style = if passed { Style::new().green().bold() } else { Style::new().red().bold() };
        format!("{} {msg}", tag.if_supports_color(Stream::Stderr, |t| t.style(style)))
    }
    #[cfg(not(feature = "color"))]
    {
        format!("{tag} {msg}")
    }
}

// ───────────────────────────── Tests ─────────────────────────────
