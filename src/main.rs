use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vitae_core::{OutputFormat, VitaeConfig, VitaeError};
use vitae_index::extract::{Extractor, PlainTextExtractor};
use vitae_index::pack::Pack;
use vitae_query::{FileSource, NoMatchReason, Outcome, PackSession, QueryOptions};

#[derive(Parser)]
#[command(
    name = "vitae",
    version,
    about = "Offline question answering over a resume",
    long_about = "vitae turns a resume into a small TF-IDF retrieval pack and answers\n\
                   questions from it without any server or model call.\n\n\
                   Examples:\n  \
                     vitae build resume.txt pack.json        Build a pack from extracted text\n  \
                     vitae ask 'rust experience' --pack pack.json\n  \
                     vitae inspect --pack pack.json          Validate a pack and show its stats"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .vitae.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable output (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging unless RUST_LOG is set)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Build a retrieval pack from a source document
    #[command(long_about = "Build a retrieval pack from a source document.\n\n\
        Reads the document's text, splits it into passages, weights every term by\n\
        TF-IDF and writes the pack atomically. Nothing is written on failure.\n\
        PDF and other binary formats must be extracted to text first.\n\n\
        Examples:\n  vitae build resume.txt assets/rag/pack.json\n  vitae build notes.dat pack.json --force-text")]
    Build {
        /// Source document (.txt, .text, .md, .markdown)
        source: PathBuf,
        /// Where to write the pack
        output: PathBuf,
        /// Read the source as UTF-8 text whatever its extension
        #[arg(long)]
        force_text: bool,
        /// Fail instead of writing an empty pack when no passages are found
        #[arg(long)]
        fail_on_empty: bool,
    },
    /// Answer a question from a pack
    #[command(long_about = "Answer a question from a pack.\n\n\
        Ranks every passage by cosine similarity with the question and prints the\n\
        best ones verbatim. Prints a fallback message when nothing is relevant.\n\n\
        Examples:\n  vitae ask 'which databases?' --pack pack.json\n  vitae ask 'kafka' --pack pack.json --top-k 5 --format json")]
    Ask {
        /// The question
        question: String,
        /// Pack to answer from
        #[arg(long)]
        pack: PathBuf,
        /// Maximum passages in the answer (default: from config, 3)
        #[arg(long)]
        top_k: Option<usize>,
        /// Minimum relevance score in [0, 1] (default: from config, 0.05)
        #[arg(long)]
        min_score: Option<f64>,
    },
    /// Validate a pack and show its statistics
    Inspect {
        /// Pack to inspect
        #[arg(long)]
        pack: PathBuf,
    },
    /// Create a default .vitae.toml configuration file
    #[command(long_about = "Create a default .vitae.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .vitae.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

const DEFAULT_CONFIG: &str = r#"# vitae configuration
# Every value below is the built-in default; uncomment to change it.

[tokenizer]
# min_token_len = 2
# keep_numeric = false
# fold_accents = true
# whitelist = ["c", "r"]
# Replaces the built-in English stopword list entirely:
# stopwords = ["a", "an", "the"]
# extra_stopwords = []

[chunker]
# min_chars = 40
# max_chars = 600
# min_words = 3
# section_headings = ["summary", "profile", "objective", "about", "experience", "work experience", "professional experience", "employment", "education", "skills", "technical skills", "projects", "certifications", "publications", "awards", "honors", "leadership", "volunteering", "research", "coursework", "activities", "interests", "languages", "contact"]

[vectorizer]
# "smooth" = ln((1+N)/(1+df)) + 1, "plain" = max(ln(N/df), 0), "log1p" = ln(1 + N/df)
# smoothing = "smooth"
# min_terms = 1

[query]
# top_k = 3
# min_score = 0.05
# dedup = true
# dedup_threshold = 0.9
"#;

const NO_MATCH_MESSAGE: &str = "No confident answer found in the resume.";

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mvitae\x1b[0m v{version} — offline question answering over a resume\n");

        println!("Quick start:");
        println!("  \x1b[36mvitae build resume.txt pack.json\x1b[0m        Build a retrieval pack");
        println!("  \x1b[36mvitae ask 'rust' --pack pack.json\x1b[0m       Ask a question\n");

        println!("All commands:");
        println!("  \x1b[32mbuild\x1b[0m    Build a TF-IDF pack from a text document");
        println!("  \x1b[32mask\x1b[0m      Answer a question from a pack");
        println!("  \x1b[32minspect\x1b[0m  Validate a pack and show its statistics");
        println!("  \x1b[32minit\x1b[0m     Create default configuration\n");
    } else {
        println!("vitae v{version} — offline question answering over a resume\n");

        println!("Quick start:");
        println!("  vitae build resume.txt pack.json        Build a retrieval pack");
        println!("  vitae ask 'rust' --pack pack.json       Ask a question\n");

        println!("All commands:");
        println!("  build    Build a TF-IDF pack from a text document");
        println!("  ask      Answer a question from a pack");
        println!("  inspect  Validate a pack and show its statistics");
        println!("  init     Create default configuration\n");
    }

    println!("Run 'vitae <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<VitaeConfig> {
    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            VitaeConfig::from_file(path)?
        }
        None => {
            let default_path = Path::new(".vitae.toml");
            if default_path.exists() {
                debug!("loading config from .vitae.toml");
                VitaeConfig::from_file(default_path)?
            } else {
                VitaeConfig::default()
            }
        }
    };
    Ok(config)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PackStats {
    schema_version: u32,
    source: Option<String>,
    created: Option<String>,
    content_sha256: String,
    chunks: usize,
    vocabulary: usize,
    sections: Vec<(String, usize)>,
}

impl PackStats {
    fn of(pack: &Pack) -> Self {
        let mut sections: Vec<(String, usize)> = Vec::new();
        for chunk in &pack.chunks {
            let label = chunk
                .section
                .as_ref()
                .map_or_else(|| "(none)".to_string(), |s| s.to_string());
            match sections.iter_mut().find(|(l, _)| *l == label) {
                Some((_, count)) => *count += 1,
                None => sections.push((label, 1)),
            }
        }
        Self {
            schema_version: pack.schema_version,
            source: pack.source.clone(),
            created: pack.created.map(|c| c.to_rfc3339()),
            content_sha256: pack.content_sha256.clone(),
            chunks: pack.chunks.len(),
            vocabulary: pack.vocab.len(),
            sections,
        }
    }
}

fn no_match_detail(reason: NoMatchReason) -> &'static str {
    match reason {
        NoMatchReason::EmptyPack => "the pack has no passages",
        NoMatchReason::NoKnownTerms => "none of the question's words appear in the resume",
        NoMatchReason::BelowThreshold => "no passage was relevant enough",
    }
}

/// Escape text for a Markdown table cell.
fn md_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn print_outcome(outcome: &Outcome, format: OutputFormat, verbose: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(outcome).into_diagnostic()?);
        }
        OutputFormat::Markdown => match outcome {
            Outcome::Answered(answer) => {
                println!("## Answer\n");
                for m in &answer.matches {
                    println!("> {}\n", md_cell(&m.text));
                }
                println!("| # | Chunk | Section | Score |");
                println!("|---|-------|---------|-------|");
                for (i, m) in answer.matches.iter().enumerate() {
                    let section = m.section.as_ref().map_or("", |s| s.as_str());
                    println!(
                        "| {} | {} | {} | {:.3} |",
                        i + 1,
                        m.chunk_id,
                        md_cell(section),
                        m.score
                    );
                }
            }
            Outcome::NoMatch { reason } => {
                println!("_{NO_MATCH_MESSAGE}_ ({})", no_match_detail(*reason));
            }
            Outcome::NotReady => println!("_The pack is not loaded yet._"),
        },
        OutputFormat::Text => match outcome {
            Outcome::Answered(answer) => {
                println!("{}", answer.assembled);
                if verbose {
                    eprintln!("--- Matches ---");
                    for m in &answer.matches {
                        let section = m.section.as_ref().map_or("-", |s| s.as_str());
                        eprintln!("  #{:<4} {:.3}  {}", m.chunk_id, m.score, section);
                    }
                }
            }
            Outcome::NoMatch { reason } => {
                println!("{NO_MATCH_MESSAGE}");
                if verbose {
                    eprintln!("reason: {}", no_match_detail(*reason));
                }
            }
            Outcome::NotReady => println!("The pack is not loaded yet."),
        },
    }
    Ok(())
}

fn print_stats(stats: &PackStats, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(stats).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# Pack\n");
            println!("| Field | Value |");
            println!("|-------|-------|");
            println!("| Schema version | {} |", stats.schema_version);
            println!("| Source | {} |", md_cell(stats.source.as_deref().unwrap_or("-")));
            println!("| Created | {} |", stats.created.as_deref().unwrap_or("-"));
            println!("| Chunks | {} |", stats.chunks);
            println!("| Vocabulary | {} |", stats.vocabulary);
            for (section, count) in &stats.sections {
                println!("| Section `{}` | {count} |", md_cell(section));
            }
        }
        OutputFormat::Text => {
            println!("schema version: {}", stats.schema_version);
            println!("source:         {}", stats.source.as_deref().unwrap_or("-"));
            println!("created:        {}", stats.created.as_deref().unwrap_or("-"));
            println!("content sha256: {}", stats.content_sha256);
            println!("chunks:         {}", stats.chunks);
            println!("vocabulary:     {}", stats.vocabulary);
            for (section, count) in &stats.sections {
                println!("  {section:<24} {count}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Build {
            ref source,
            ref output,
            force_text,
            fail_on_empty,
        }) => {
            let extractor = PlainTextExtractor { force: force_text };
            let text = extractor
                .extract(source)
                .wrap_err_with(|| format!("cannot read {}", source.display()))?;

            let mut pack = vitae_index::build_pack(&text, &config);
            if pack.is_empty() && fail_on_empty {
                return Err(VitaeError::EmptyDocument.into());
            }
            pack.source = source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            pack.created = Some(Utc::now());
            pack.save(output)
                .wrap_err_with(|| format!("cannot write pack to {}", output.display()))?;

            println!(
                "Saved pack with {} chunks, vocab size {}.",
                pack.chunks.len(),
                pack.vocab.len()
            );
        }
        Some(Command::Ask {
            ref question,
            ref pack,
            top_k,
            min_score,
        }) => {
            let mut query = config.query.clone();
            if let Some(k) = top_k {
                query.top_k = k;
            }
            if let Some(s) = min_score {
                query.min_score = s;
            }
            query.validate()?;

            let session = PackSession::new();
            session
                .load(&FileSource(pack.clone()))
                .await
                .wrap_err_with(|| format!("cannot load pack {}", pack.display()))?;

            let outcome = session.ask(question, &QueryOptions::from(&query));
            print_outcome(&outcome, cli.format, cli.verbose)?;
        }
        Some(Command::Inspect { ref pack }) => {
            let pack = Pack::load(pack)
                .wrap_err_with(|| format!("cannot load pack {}", pack.display()))?;
            print_stats(&PackStats::of(&pack), cli.format)?;
        }
        Some(Command::Init) => {
            let path = Path::new(".vitae.toml");
            if path.exists() {
                miette::bail!(".vitae.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .vitae.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "vitae", &mut std::io::stdout());
        }
    }

    Ok(())
}
