use std::path::{Path, PathBuf};

mod check;
mod daily;
mod practice;
mod pregenerate;
mod status;
mod terminal;
mod validate;

use check::Check;
use clap::ArgAction;
use daily::Daily;
use equatle::{
    Allocator, Config, Directory, Generator, Puzzle,
    storage::directory::{self, CONFIG_FILE},
};
use practice::Practice;
use pregenerate::Pregenerate;
use status::Status;
use tracing::instrument;
use validate::Validate;

/// Normalize a guess typed on an ordinary keyboard.
///
/// This is a CLI boundary function that accepts `*` and `x` for `×`, and `/`
/// for `÷`, before the strict equation grammar sees the input.
fn normalize_guess(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '*' | 'x' | 'X' => '×',
            '/' => '÷',
            c => c,
        })
        .collect()
}

/// Open the store at `root` and wrap it in an allocator configured from the
/// store's `config.toml`.
fn open_allocator(root: PathBuf) -> anyhow::Result<Allocator<Directory<directory::Loaded>>> {
    let directory = Directory::open(root)?;
    let generator = Generator::new(directory.config().max_attempts());
    Ok(Allocator::new(directory, generator))
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn print_puzzle(puzzle: &Puzzle, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(puzzle)?),
        OutputFormat::Table => {
            println!("Equation:      {}", puzzle.equation);
            println!("Target number: {}", puzzle.target_number);
            println!("Difficulty:    {}", puzzle.difficulty());
        }
    }
    Ok(())
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global=true)]
    verbose: u8,

    /// The path to the root of the equation store
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Status(Status::default()))
            .run(self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Show pool and daily assignment counts (default)
    Status(Status),

    /// Initialize a new equation store
    Init,

    /// Show the equation for a date, assigning one if necessary
    Daily(Daily),

    /// Generate a practice equation without touching the store
    Practice(Practice),

    /// Check whether a guess is a well-formed equation
    Validate(Validate),

    /// Score guesses against a target equation
    ///
    /// Each guess is shown as a row of colored tiles: correct symbols in the
    /// right place, present symbols in the wrong place, and absent symbols.
    Check(Check),

    /// Fill the equation pool ahead of time
    Pregenerate(Pregenerate),
}

impl Command {
    fn run(self, root: PathBuf) -> anyhow::Result<()> {
        match self {
            Self::Status(command) => command.run(root)?,
            Self::Init => init(&root)?,
            Self::Daily(command) => command.run(root)?,
            Self::Practice(command) => command.run(&root)?,
            Self::Validate(command) => command.run(),
            Self::Check(command) => command.run(root)?,
            Self::Pregenerate(command) => command.run(root)?,
        }
        Ok(())
    }
}

#[instrument]
fn init(root: &Path) -> anyhow::Result<()> {
    use std::fs;

    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("Store already initialized (found existing {CONFIG_FILE})");
    }

    for dir in ["pool", "daily"] {
        fs::create_dir_all(root.join(dir))
            .map_err(|e| anyhow::anyhow!("Failed to create {dir} directory: {e}"))?;
    }

    Config::default()
        .save(&config_path)
        .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

    println!("Initialized equation store in {}", root.display());
    println!("  Created: {CONFIG_FILE}");
    println!("  Created: pool/");
    println!("  Created: daily/");
    println!();
    println!("Next steps:");
    println!("  equatle pregenerate --year <YEAR>");
    println!("  equatle daily");

    Ok(())
}
