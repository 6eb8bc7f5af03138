//! Command-line front end for the character engine.
//!
//! Feeds chapter files through a [`NovelSession`] in order, syncs with a
//! JSON file store and prints what was found:
//!
//! ```bash
//! RUST_LOG=info cargo run -p cast -- --novel moonlit chapters/*.txt
//! ```

mod args;

use args::{parse_config_from_args, print_help, CliConfig};
use cast_core::{ChapterReport, EngineConfig, JsonFileStore, NovelSession, SessionError};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let cli = parse_config_from_args(&args);

    if cli.help {
        print_help();
        return Ok(());
    }
    if cli.chapters.is_empty() {
        eprintln!("Error: no chapter files given.");
        eprintln!("Run with --help for usage.");
        std::process::exit(2);
    }

    run(cli).await.map_err(|e| e.into())
}

async fn run(cli: CliConfig) -> Result<(), SessionError> {
    let novel_id = cli.resolved_novel_id();
    let mut session = NovelSession::with_config(novel_id.clone(), EngineConfig::from_env());

    if !cli.offline {
        let store = Arc::new(JsonFileStore::new(&cli.store_dir));
        if let Some(max_age) = cli.evict_after {
            match store.evict_older_than(max_age).await {
                Ok(0) => {}
                Ok(n) => println!("Evicted {n} stale novels"),
                Err(e) => log::warn!("Eviction failed: {e}"),
            }
        }
        session = session.with_store(store);

        // A missing or unreachable store is not fatal; start fresh.
        match session.load().await {
            Ok(n) => println!("=== {novel_id}: {n} known characters ==="),
            Err(e) => log::warn!("Could not load stored characters: {e}"),
        }
    } else {
        println!("=== {novel_id} (offline) ===");
    }
    println!();

    for (index, path) in cli.chapters.iter().enumerate() {
        let chapter = cli.first_chapter.saturating_add(index as u32);

        if !cli.offline && !cli.force && session.is_chapter_enhanced(chapter).await.unwrap_or(false) {
            println!("Chapter {chapter}: already processed, skipping");
            continue;
        }

        let report = match session.process_chapter_file(path).await {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Chapter {chapter}: cannot read {}: {e}", path.display());
                continue;
            }
        };
        print_report(chapter, path, &report);

        if !cli.offline {
            if let Err(e) = session.mark_chapter_enhanced(chapter).await {
                log::warn!("Could not mark chapter {chapter}: {e}");
            }
        }
    }

    if !cli.offline {
        match session.sync().await {
            Ok(n) => println!("\nSaved {n} characters to {}", cli.store_dir.display()),
            Err(e) => eprintln!("\nSync failed, results were not saved: {e}"),
        }
    }

    let summary = session.summary();
    if summary.is_empty() {
        println!("\nNo characters found.");
    } else {
        println!("\nCharacters:");
        println!("{summary}");
    }
    Ok(())
}

fn print_report(chapter: u32, path: &Path, report: &ChapterReport) {
    println!(
        "Chapter {chapter} ({}): {} names, {} new, {} updated",
        path.display(),
        report.mentioned.len(),
        report.new_characters.len(),
        report.updated.len()
    );
    if !report.new_characters.is_empty() {
        println!("  new: {}", report.new_characters.join(", "));
    }
}
