use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ziptree")]
#[command(version)]
#[command(about = "Write a ZIP archive of a git tree to stdout", long_about = None)]
#[command(after_help = "Examples:\n  \
  ziptree HEAD > head.zip              archive the current commit\n  \
  ziptree -l 9 v1.0 project-1.0 > p.zip   best compression, files under project-1.0/\n  \
  ziptree -l 0 main -o main.zip        store only, write to main.zip")]
pub struct Cli {
    /// Commit, tag or tree to archive
    #[arg(value_name = "TREE-ISH")]
    pub tree_ish: String,

    /// Directory to put every entry under
    #[arg(value_name = "BASE")]
    pub base: Option<String>,

    /// Compression level (0 = store only)
    #[arg(short = 'l', long = "level", value_name = "0-9", default_value_t = 6,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: u32,

    /// Path to the git directory
    #[arg(long = "git-dir", env = "GIT_DIR", value_name = "DIR", default_value = ".git")]
    pub git_dir: PathBuf,

    /// Write the archive to FILE instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// More log output (-vv => debug)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log fatal errors
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    /// Maximum log level implied by `-q` / `-v`.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
