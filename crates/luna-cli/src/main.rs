//! `luna` — outil de gestion du code source Rocket
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `luna_cli` (lib).

#![forbid(unsafe_code)]

use std::{io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use luna_cli as cli; // notre lib interne (src/lib.rs)

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "luna",
    version,
    about = "luna is a tool for managing Rocket source code.",
    long_about = None
)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Script à exécuter (sans sous-commande) ; invite interactive si omis
    script: Option<PathBuf>,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile packages and dependencies
    Build {
        /// Paquet ou fichier source
        input: Option<PathBuf>,
    },
    /// Compile and install packages and dependencies
    Install {
        /// Paquet ou fichier source
        input: Option<PathBuf>,
    },
    /// Test packages (suite de fumée du cœur bytecode)
    Test {
        /// Ne lancer que les cas dont le nom contient ce filtre
        filter: Option<String>,
        /// Rapports JSON sur stdout
        #[arg(long)]
        json: bool,
    },
    /// Print Luna version
    Version,
}

// ──────────────────────────── Logger / Verbosité ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool) {
    #[cfg(feature = "trace")]
    {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        std::env::set_var(
            "RUST_LOG",
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
        );
        cli::init_logger();
    }
    #[cfg(not(feature = "trace"))]
    let _ = (verbose, quiet);
}

fn init_color(choice: ColorChoice) {
    // `owo-colors` détecte le TTY ; on ne force que sur demande.
    match choice {
        ColorChoice::Auto => {},
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
            #[cfg(feature = "color")]
            owo_colors::set_override(true);
        },
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
            #[cfg(feature = "color")]
            owo_colors::set_override(false);
        },
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            report_error(&e);
            ExitCode::from(1)
        },
    }
}

fn report_error(e: &anyhow::Error) {
    #[cfg(feature = "color")]
    {
        use owo_colors::{OwoColorize, Stream};
        eprintln!("{} {:#}", "error:".if_supports_color(Stream::Stderr, |t| t.red()), e);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("error: {:#}", e);
    }
}

/// Sous-commande explicite d'abord, sinon script, sinon invite.
fn to_command(cmd: Option<Command>, script: Option<PathBuf>) -> cli::Command {
    match (cmd, script) {
        (Some(Command::Build { input }), _) => cli::Command::Build(cli::BuildTask { input }),
        (Some(Command::Install { input }), _) => cli::Command::Install(cli::BuildTask { input }),
        (Some(Command::Test { filter, json }), _) => cli::Command::Test(cli::TestTask { filter, json }),
        (Some(Command::Version), _) => cli::Command::Version,
        (None, Some(script)) => cli::Command::Run(cli::RunTask { script }),
        (None, None) => cli::Command::Prompt,
    }
}

fn real_main() -> Result<i32> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet);

    let command = to_command(opt.cmd, opt.script);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::execute(command, &mut out).context("échec d'exécution de la commande")
}

// ──────────────────────────── Tests ────────────────────────────
