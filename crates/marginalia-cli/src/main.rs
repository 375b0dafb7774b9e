use marginalia_core::{
    Corpus, CorpusStats, Epistemic, MarginaliaError, RenderOutput, SearchQuery, ViewState, render,
    render_page, render_search_overview, search,
};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

mod config;
mod telemetry;

use config::{Config, resolve_facets};

#[derive(Parser)]
#[command(version, about = "Marginalia - render annotated corpus pages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to corpus.json (defaults to the `corpus` entry of the config file)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Path to config file
    #[arg(long, global = true, env = "MARGINALIA_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct ViewArgs {
    /// Active entity types, comma separated
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,

    /// Active epistemic categories, comma separated
    #[arg(long, value_delimiter = ',')]
    epistemic: Vec<String>,

    /// Highlight matches of this query
    #[arg(long)]
    query: Option<String>,

    /// Write markup here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a chapter with its annotations
    Chapter {
        /// Chapter id, e.g. `de-deo`
        id: String,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Render a single page
    Page {
        /// Page number
        number: u32,

        #[command(flatten)]
        view: ViewArgs,
    },
    /// Count matches of a query across the whole corpus
    Search {
        query: String,

        /// Also print the overview markup
        #[arg(long)]
        html: bool,

        /// Write markup here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print reference statistics and the chapter list
    Stats,
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    telemetry::init(telemetry::TelemetryConfig::from_env(cli.verbose));

    let config = match &cli.config {
        Some(path) => Config::load(path, true)?,
        None => match Config::default_path() {
            Some(path) => Config::load(&path, false)?,
            None => Config::default(),
        },
    };
    let corpus_path = cli.corpus.clone().or_else(|| config.corpus.clone()).ok_or_else(|| {
        miette::miette!("No corpus given. Pass --corpus <file> or set `corpus` in the config file")
    })?;
    let corpus = load_corpus(&corpus_path)?;

    match cli.command {
        Commands::Chapter { id, view } => {
            let mut state = view_state(&corpus, &config, &view)?;
            if corpus.chapter(&id).is_none() {
                return Err(MarginaliaError::UnknownChapter(id.into()).into());
            }
            state.select_chapter(Some(id.into()));
            if let RenderOutput::Chapter(html) = render(&corpus, &state) {
                write_output(view.out.as_deref(), &html)?;
            }
        }
        Commands::Page { number, view } => {
            let state = view_state(&corpus, &config, &view)?;
            let (_, page) = corpus
                .page(number)
                .ok_or(MarginaliaError::UnknownPage(number))?;
            write_output(view.out.as_deref(), &render_page(page, &state))?;
        }
        Commands::Search { query, html, out } => {
            let Some(query) = SearchQuery::parse(&query) else {
                println!("Query too short (minimum {} characters)", search::MIN_QUERY_CHARS);
                return Ok(());
            };
            let summary = search::summarize(&corpus.chapters, &query);
            println!("{}", summary.describe());
            for chapter in &summary.chapters {
                println!("  {:<24} {:>5}  {}", chapter.chapter_id, chapter.count, chapter.title);
            }
            if html && !summary.is_empty() {
                let markup = render_search_overview(&summary, &query);
                write_output(out.as_deref(), &markup)?;
            }
        }
        Commands::Stats => print_stats(&corpus),
    }

    Ok(())
}

fn load_corpus(path: &Path) -> Result<Corpus> {
    if !path.exists() {
        return Err(miette::miette!("Corpus file not found: {}", path.display()));
    }
    let src = std::fs::read_to_string(path).into_diagnostic()?;
    let start = std::time::Instant::now();
    let corpus =
        Corpus::from_json(path.display().to_string(), &src).map_err(MarginaliaError::from)?;
    tracing::info!(
        chapters = corpus.chapters.len(),
        pages = corpus.pages().count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "corpus loaded"
    );
    Ok(corpus)
}

fn view_state(corpus: &Corpus, config: &Config, view: &ViewArgs) -> Result<ViewState> {
    let facets = resolve_facets(corpus, config, &view.types, &view.epistemic)?;
    let mut state = ViewState::new(facets);
    if let Some(query) = &view.query {
        state.set_query(query);
        if state.query.is_none() {
            tracing::warn!(query = %query, "query too short, not highlighting");
        }
    }
    Ok(state)
}

fn write_output(out: Option<&Path>, markup: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).into_diagnostic()?;
                }
            }
            std::fs::write(path, markup).into_diagnostic()?;
            tracing::info!(path = %path.display(), bytes = markup.len(), "markup written");
        }
        None => println!("{markup}"),
    }
    Ok(())
}

fn print_stats(corpus: &Corpus) {
    let stats = CorpusStats::compute(&corpus.chapters);

    if let Some(title) = &corpus.metadata.title {
        match &corpus.metadata.author {
            Some(author) => println!("{title} ({author})"),
            None => println!("{title}"),
        }
    }
    println!(
        "{} references on {} pages in {} chapters ({} by consensus)",
        stats.total_references, stats.pages_with_content, stats.chapters, stats.consensus_count
    );

    println!("\nBy type:");
    for (id, count) in &stats.by_type {
        let label = corpus
            .entity_type(id)
            .map(|t| t.label.as_str())
            .unwrap_or(id.as_str());
        println!("  {label:<28} {count:>5}");
    }

    println!("\nBy epistemic status:");
    for (id, count) in &stats.by_epistemic {
        let label = id
            .parse::<Epistemic>()
            .ok()
            .and_then(|e| corpus.epistemic_type(e))
            .map(|t| t.label.as_str())
            .unwrap_or(id.as_str());
        println!("  {label:<28} {count:>5}");
    }

    println!("\nBy detection method:");
    for (method, count) in &stats.by_method {
        println!("  {method:<28} {count:>5}");
    }

    println!("\nChapters:");
    for chapter in &corpus.chapters {
        println!(
            "  {:<24} pp. {}–{}  {} ({} references)",
            chapter.id,
            chapter.start_page,
            chapter.end_page,
            chapter.title,
            chapter.reference_count()
        );
    }
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
