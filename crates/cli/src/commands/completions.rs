//! Shell completion generation
//!
//! `r2sync --completions <SHELL>` prints a completion script for bash, zsh,
//! fish, elvish, or powershell.

use clap::CommandFactory;
use clap_complete::{Generator, Shell};

use super::Cli;
use crate::exit_code::ExitCode;

/// Generate shell completions and print to stdout
pub fn execute(shell: Shell) -> ExitCode {
    let mut cmd = Cli::command();
    print_completions(shell, &mut cmd, &mut std::io::stdout());
    ExitCode::Success
}

fn print_completions<G: Generator>(
    generator: G,
    cmd: &mut clap::Command,
    out: &mut dyn std::io::Write,
) {
    clap_complete::generate(generator, cmd, cmd.get_name().to_string(), out);
}
