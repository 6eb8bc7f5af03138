//! Command line parsing for the `cast` binary.

use std::path::PathBuf;
use std::time::Duration;

/// Default store directory, relative to the working directory.
pub const DEFAULT_STORE_DIR: &str = "cast-store";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// Novel identifier. Defaults to the first chapter's parent directory name.
    pub novel_id: Option<String>,
    pub store_dir: PathBuf,
    /// Number of the first chapter file, used for chapter tracking.
    pub first_chapter: u32,
    /// Reprocess chapters the store already marks as done.
    pub force: bool,
    /// Drop stored novels idle for longer than this before starting.
    pub evict_after: Option<Duration>,
    /// Skip the store entirely.
    pub offline: bool,
    pub chapters: Vec<PathBuf>,
    pub help: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            novel_id: None,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            first_chapter: 1,
            force: false,
            evict_after: None,
            offline: false,
            chapters: Vec::new(),
            help: false,
        }
    }
}

impl CliConfig {
    /// The novel id to use, falling back to the first chapter's directory.
    pub fn resolved_novel_id(&self) -> String {
        if let Some(id) = &self.novel_id {
            return id.clone();
        }
        self.chapters
            .first()
            .and_then(|path| path.parent())
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "default".to_string())
    }
}

/// Parse `args` (including the program name at index 0).
///
/// Unknown flags are reported and skipped. Bad numbers keep the default.
pub fn parse_config_from_args(args: &[String]) -> CliConfig {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.help = true,
            "--novel" => {
                if let Some(id) = args.get(i + 1) {
                    config.novel_id = Some(id.clone());
                    i += 1;
                }
            }
            "--store" => {
                if let Some(dir) = args.get(i + 1) {
                    config.store_dir = PathBuf::from(dir);
                    i += 1;
                }
            }
            "--first-chapter" => {
                if let Some(n) = args.get(i + 1) {
                    config.first_chapter = n.parse().unwrap_or(config.first_chapter);
                    i += 1;
                }
            }
            "--evict-days" => {
                if let Some(days) = args.get(i + 1) {
                    config.evict_after = days
                        .parse::<u64>()
                        .ok()
                        .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60)));
                    i += 1;
                }
            }
            "--force" => config.force = true,
            "--offline" => config.offline = true,
            flag if flag.starts_with("--") => eprintln!("Ignoring unknown option {flag}"),
            path => config.chapters.push(PathBuf::from(path)),
        }
        i += 1;
    }

    config
}

pub fn print_help() {
    println!("cast - find the characters in a novel and infer their genders");
    println!();
    println!("USAGE:");
    println!("  cast [OPTIONS] <CHAPTER>...");
    println!();
    println!("Chapters are plain text files processed in the order given.");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help             Show this help message");
    println!("  --novel <ID>           Novel identifier (default: first chapter's directory)");
    println!("  --store <DIR>          Store directory (default: {DEFAULT_STORE_DIR})");
    println!("  --first-chapter <N>    Number of the first chapter file (default: 1)");
    println!("  --force                Reprocess chapters already marked as done");
    println!("  --evict-days <DAYS>    Drop novels not touched for this many days");
    println!("  --offline              Do not read or write the store");
    println!();
    println!("ENVIRONMENT:");
    println!("  CAST_SYNC_TIMEOUT_MS   Store timeout in milliseconds");
    println!("  CAST_MAX_TEXT_LENGTH   Characters analyzed per chapter");
    println!("  CAST_STRICT_CACHE_KEYS Key the analysis cache on full text (true/false)");
    println!("  RUST_LOG               Log level (e.g. info, debug)");
    println!();
    println!("EXAMPLES:");
    println!("  cast novel/ch01.txt novel/ch02.txt");
    println!("  cast --novel moonlit --first-chapter 12 ch12.txt ch13.txt");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("cast")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = parse_config_from_args(&args(&[]));
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.resolved_novel_id(), "default");
    }

    #[test]
    fn test_options_and_chapters() {
        let config = parse_config_from_args(&args(&[
            "--novel",
            "moonlit",
            "ch1.txt",
            "--store",
            "/tmp/s",
            "--first-chapter",
            "12",
            "--evict-days",
            "2",
            "--force",
            "ch2.txt",
        ]));
        assert_eq!(config.novel_id.as_deref(), Some("moonlit"));
        assert_eq!(config.store_dir, PathBuf::from("/tmp/s"));
        assert_eq!(config.first_chapter, 12);
        assert_eq!(config.evict_after, Some(Duration::from_secs(2 * 86_400)));
        assert!(config.force);
        assert_eq!(config.chapters, vec![PathBuf::from("ch1.txt"), PathBuf::from("ch2.txt")]);
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = parse_config_from_args(&args(&["--first-chapter", "x", "--evict-days", "soon"]));
        assert_eq!(config.first_chapter, 1);
        assert_eq!(config.evict_after, None);
    }

    #[test]
    fn test_novel_id_from_directory() {
        let config = parse_config_from_args(&args(&["books/moonlit/ch1.txt", "--help"]));
        assert!(config.help);
        assert_eq!(config.resolved_novel_id(), "moonlit");
    }
}
