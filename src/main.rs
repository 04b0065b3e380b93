// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! refdex CLI: build, inspect, and query index artifact directories.
//!
//! ```bash
//! # Build artifacts from a JSONL record stream
//! refdex build --input records.jsonl --output ./artifacts
//!
//! # Inspect the artifact set
//! refdex inspect ./artifacts
//!
//! # Query it
//! refdex search ./artifacts '"authenticated encryption" rogaway' --limit 10
//!
//! # Fetch one record
//! refdex get ./artifacts DBLP:conf/ccs/RogawayBBK01
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use refdex::binary::TierMeta;
use refdex::{run_build, Engine, LoadedTier, SearchOptions, Tier};

mod cli;
use cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { input, output } => build(Path::new(&input), Path::new(&output)),
        Commands::Inspect { dir } => inspect(Path::new(&dir)),
        Commands::Search {
            dir,
            query,
            limit,
            extended,
        } => search(Path::new(&dir), &query, limit, extended),
        Commands::Get { dir, id_or_key } => get(Path::new(&dir), &id_or_key),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn build(input: &Path, output: &Path) -> Result<(), String> {
    let started = Instant::now();
    let summary = run_build(input, output)?;

    eprintln!();
    eprintln!(
        "built {} documents │ {} core terms │ {} ext terms │ {} │ {:.2}s",
        summary.num_docs,
        summary.core_terms,
        summary.ext_terms,
        format_bytes(summary.total_bytes),
        started.elapsed().as_secs_f64()
    );
    for (name, size) in &summary.files {
        eprintln!("  {:<28} {:>10}", name, format_bytes(*size));
    }
    Ok(())
}

fn inspect(dir: &Path) -> Result<(), String> {
    for tier in Tier::ALL {
        let (loaded, meta): (LoadedTier, TierMeta) =
            LoadedTier::load(dir, tier).map_err(|e| e.to_string())?;

        println!("{}", tier.file_prefix());
        println!("  version      {}", meta.version);
        if let Some(num_docs) = meta.num_docs {
            println!("  documents    {num_docs}");
        }
        println!("  terms        {}", loaded.dict.len());
        println!("  term bytes   {}", format_bytes(loaded.dict.blob_len()));
        println!("  postings     {}", format_bytes(loaded.postings.len()));
        for (idx, field) in tier.fields().iter().enumerate() {
            let populated = (0..loaded.dict.len() as u32)
                .filter(|&t| loaded.ptrs.slice_of(idx, t).is_some())
                .count();
            println!("    {:<9} {} terms", field.name(), populated);
        }
        println!("  checksums    ok");
        println!();
    }
    Ok(())
}

fn search(dir: &Path, query: &str, limit: usize, extended: bool) -> Result<(), String> {
    let load_started = Instant::now();
    let engine = Engine::open(dir).map_err(|e| e.to_string())?;
    let load_time = load_started.elapsed();

    let options = SearchOptions {
        limit,
        use_extended: extended,
        ..SearchOptions::default()
    };

    let query_started = Instant::now();
    let hits = engine.search(query, &options).map_err(|e| e.to_string())?;
    let query_time = query_started.elapsed();

    println!(
        "load {:.1} ms │ query {:.3} ms │ {} hit(s){}",
        load_time.as_secs_f64() * 1000.0,
        query_time.as_secs_f64() * 1000.0,
        hits.len(),
        if engine.extended_loaded() {
            " │ extended tier"
        } else {
            ""
        }
    );
    println!();

    if hits.is_empty() {
        println!("no results");
        return Ok(());
    }

    println!("{:<3} {:>6}  {:<6} {:<28} TITLE", "#", "SCORE", "YEAR", "KEY");
    for (i, hit) in hits.iter().enumerate() {
        let year = hit
            .record
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "—".to_string());
        println!(
            "{:<3} {:>6.2}  {:<6} {:<28} {}",
            i + 1,
            hit.score,
            year,
            truncate(&hit.record.key, 28),
            truncate(&hit.record.title, 60)
        );
        if let Some(venue) = &hit.record.venue {
            println!("{:>12}  {} — {}", "", venue, truncate(&hit.record.authors_str, 60));
        } else {
            println!("{:>12}  {}", "", truncate(&hit.record.authors_str, 70));
        }
    }
    Ok(())
}

fn get(dir: &Path, id_or_key: &str) -> Result<(), String> {
    let engine = Engine::open(dir).map_err(|e| e.to_string())?;
    match engine.get_entry(id_or_key).map_err(|e| e.to_string())? {
        None => Err(format!("no record for {id_or_key:?}")),
        Some(record) => {
            let json =
                serde_json::to_string_pretty(&record).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
    }
}

fn format_bytes(n: usize) -> String {
    const KIB: f64 = 1024.0;
    let n = n as f64;
    if n >= KIB * KIB {
        format!("{:.1} MB", n / KIB / KIB)
    } else if n >= KIB {
        format!("{:.1} KB", n / KIB)
    } else {
        format!("{n:.0} B")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        s.to_string()
    }
}
