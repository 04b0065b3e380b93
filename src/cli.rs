// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Command-line argument definitions.
//!
//! Four subcommands: `build` to turn a JSONL record stream into an artifact
//! directory, `inspect` to examine one, `search` to query it, and `get` to
//! fetch a single record by key or id.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "refdex",
    about = "Two-tier full-text search index for bibliographic corpora",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build index artifacts from a JSONL record file
    Build {
        /// Input JSONL file (one source record per line)
        #[arg(short, long)]
        input: String,

        /// Output directory for the artifact set
        #[arg(short, long)]
        output: String,
    },

    /// Inspect an artifact directory
    Inspect {
        /// Artifact directory
        dir: String,
    },

    /// Search an artifact directory and display ranked results
    Search {
        /// Artifact directory
        dir: String,

        /// Query string (quotes mark phrases, trailing token is a prefix)
        query: String,

        /// Maximum number of results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Load the extended tier up front
        #[arg(long)]
        extended: bool,
    },

    /// Fetch one record by key or numeric doc id
    Get {
        /// Artifact directory
        dir: String,

        /// Record key or doc id
        id_or_key: String,
    },
}
