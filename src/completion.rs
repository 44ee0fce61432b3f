//! # Shell Completion Module
//!
//! Static completion scripts come from `clap_complete`; playlist names are
//! completed dynamically through the hidden `complete-playlists` command,
//! which reads the state file.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! tiertune completion bash > ~/.local/share/bash-completion/completions/tiertune
//!
//! # Generate zsh completions
//! tiertune completion zsh > ~/.config/zsh/completions/_tiertune
//! ```

use crate::snapshot;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Playlist names stored in the state file, sorted. Empty when the file is
/// missing or unreadable.
pub fn get_playlist_completions(state_path: &Path) -> Vec<String> {
    if !state_path.exists() {
        return Vec::new();
    }
    match snapshot::load(state_path) {
        Ok(Some(snapshot)) => {
            let mut names: Vec<String> = snapshot
                .playlists
                .iter()
                .map(|p| p.name().to_string())
                .collect();
            names.sort();
            names
        }
        _ => Vec::new(),
    }
}

/// Print playlist names one per line, quoting names with whitespace.
pub fn print_playlist_completions<W: Write>(state_path: &Path, out: &mut W) -> Result<()> {
    for name in get_playlist_completions(state_path) {
        if name.contains(char::is_whitespace) {
            writeln!(out, "\"{}\"", name.replace('"', "\\\""))?;
        } else {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}
