use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Enrich a ranked Korean vocabulary list with lemmas, definitions, audits and glosses
#[derive(Debug, Parser)]
#[command(name = "kvocab")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file; `kvocab.json` is used when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store file, overriding the config
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a frequency list (`<rank>. <term>` per line) to the store
    Ingest {
        file: PathBuf,
    },
    /// Tag untagged terms with lemma and part of speech
    Lemmatize,
    /// Generate definitions for undefined terms
    Define,
    /// Review definitions that have not been checked yet
    Audit,
    /// Address concerns raised by the audit
    Correct,
    /// Add English glosses to clean entries
    Translate,
    /// Delete definitions produced by the given requests
    Rollback {
        #[arg(long = "request-id", required = true, num_args = 1..)]
        request_ids: Vec<String>,
    },
    /// Report which lemmas the definitions are written with
    Coverage {
        /// Report file, overriding the config
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count entries per audit status and pending work per operation
    Status,
}
