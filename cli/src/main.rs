use anyhow::Result;
use clap::{Parser, Subcommand};
use ftse_core::config::{DEFAULT_CORPUS_PATH, DEFAULT_OUTPUT_PATH};
use ftse_core::{Engine, EngineConfig};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ftse")]
#[command(about = "Line-level full-text search over a directory of text files", long_about = None)]
struct Cli {
    /// Corpus directory; one document per line of each file
    #[arg(long, global = true, env = "FTSE_CORPUS_PATH", default_value = DEFAULT_CORPUS_PATH)]
    corpus: String,
    /// Output directory; the index is kept in <output>/index
    #[arg(long, global = true, env = "FTSE_OUTPUT_PATH", default_value = DEFAULT_OUTPUT_PATH)]
    output: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the index from the corpus, replacing any existing one
    Init,
    /// Search the index and print matches as JSON
    Search {
        /// Query: terms (ORed), AND/OR/NOT, parentheses, "quoted phrases"
        query: String,
    },
    /// Print a corpus file
    Dump {
        filename: String,
    },
    /// Print metadata of the current index
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    print!("{}", run(cli)?);
    Ok(())
}

fn run(cli: Cli) -> Result<String> {
    let defaults = EngineConfig::default();
    let config = EngineConfig::new(defaults.resolve_corpus(&cli.corpus), defaults.resolve_output(&cli.output));
    let engine = Engine::new(config);

    let out = match cli.command {
        Commands::Init => {
            engine.rebuild()?;
            "init success\n".to_string()
        }
        Commands::Search { query } => format!("{}\n", engine.search(&query)?),
        Commands::Dump { filename } => engine.dump(&filename)?,
        Commands::Stats => format!("{}\n", serde_json::to_string_pretty(&engine.stats()?)?),
    };
    Ok(out)
}
