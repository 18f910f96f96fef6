use anyhow::{Context as AnyhowContext, Result};
use cg_cgif::{read, write, write_to_file, CodecConfig, ParseOutput};
use cg_graph::{ObjectId, ObjectKind};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cgif")]
#[command(about = "Read, check and rewrite conceptual graphs in CGIF", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Codec configuration file (TOML with [writer] and [reader] tables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CGIF file and write it back in canonical form
    Normalize(NormalizeArgs),

    /// Parse a CGIF file and report what it contains
    Check(InputArgs),

    /// Parse a CGIF file and print the graph model as JSON
    Dump(DumpArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Input file, or `-` for stdin
    input: String,

    /// Require every variable to be defined before it is used
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct NormalizeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Embed layout comments
    #[arg(long)]
    comments: bool,

    /// Spaces per nesting level
    #[arg(long)]
    indent: Option<usize>,

    /// Leave out type declarations and subtype assertions
    #[arg(long)]
    no_subtypes: bool,
}

#[derive(Args)]
struct DumpArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

/// Object counts reported by `check`
#[derive(Serialize)]
struct Summary {
    objects: usize,
    variables: usize,
    max_depth: usize,
    kinds: BTreeMap<String, usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Normalize(args) => run_normalize(args, config),
        Commands::Check(args) => run_check(args, config),
        Commands::Dump(args) => run_dump(args, config),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CodecConfig> {
    match path {
        Some(path) => CodecConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CodecConfig::default()),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn parse_input(args: &InputArgs, config: &mut CodecConfig) -> Result<ParseOutput> {
    if args.strict {
        config.reader.defer_unresolved = false;
    }
    let text = read_input(&args.input)?;
    read(&text, &config.reader).with_context(|| format!("Failed to parse {}", args.input))
}

fn run_normalize(args: NormalizeArgs, mut config: CodecConfig) -> Result<()> {
    if args.comments {
        config.writer.write_comments = true;
    }
    if let Some(width) = args.indent {
        config.writer.indent = " ".repeat(width);
    }
    if args.no_subtypes {
        config.writer.export_subtypes = false;
    }

    let parsed = parse_input(&args.input, &mut config)?;

    match &args.output {
        Some(path) => {
            write_to_file(path, &parsed.graph, &config.writer)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Normalized {} -> {}", args.input.input, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write(&mut out, &parsed.graph, &config.writer).context("Failed to write CGIF")?;
            writeln!(out)?;
        }
    }

    Ok(())
}

fn run_check(args: InputArgs, mut config: CodecConfig) -> Result<()> {
    let parsed = parse_input(&args, &mut config)?;
    let graph = &parsed.graph;

    let mut kinds = BTreeMap::new();
    for obj in graph.deep_objects(ObjectId::ROOT)? {
        *kinds.entry(format!("{:?}", obj.kind())).or_insert(0) += 1;
    }

    let summary = Summary {
        objects: graph.object_count(),
        variables: parsed.referents.len(),
        max_depth: graph.context_depth(ObjectId::ROOT)?,
        kinds,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);

    let unlinked = graph
        .deep_objects_of_kind(ObjectId::ROOT, ObjectKind::Relation)?
        .filter(|obj| obj.edges.is_empty())
        .count();
    if unlinked > 0 {
        log::warn!("{} relations have no arguments", unlinked);
    }

    Ok(())
}

fn run_dump(args: DumpArgs, mut config: CodecConfig) -> Result<()> {
    let parsed = parse_input(&args.input, &mut config)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&parsed.graph)?
    } else {
        serde_json::to_string(&parsed.graph)?
    };
    println!("{}", json);

    Ok(())
}
