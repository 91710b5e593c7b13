use anyhow::Result;
use clap::Parser;
use std::io::Stdout;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use the library instead of redeclaring modules
use course_browser::{
    cache::{CourseCache, FileKeyValueStore, KeyValueStore},
    config::Config,
    errors::{AppError, ExportError, LoadError, LoadResult},
    export::DirectoryExportTarget,
    ingestor::{source_for_location, DataLoader, LoadOutcome},
    models::SortField,
    render::TerminalRenderTarget,
    utils::datetime::DateTimeParser,
    view::{CommandOutcome, CourseBrowser, LoadStatus, PageAction, UiEvent, COMMAND_HELP},
};

#[derive(Parser)]
#[command(name = "course-browser")]
#[command(version = "0.1.0")]
#[command(about = "Browse, filter, sort and export a course catalogue from the terminal")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Course data location, URL or file path (overrides config file)
    #[arg(short, long, value_name = "URL|PATH")]
    source: Option<String>,

    /// Only show this category
    #[arg(long)]
    category: Option<String>,

    /// Instructor substring filter
    #[arg(long, value_name = "TEXT")]
    instructor: Option<String>,

    /// Course name substring filter
    #[arg(long, value_name = "TEXT")]
    name: Option<String>,

    /// Sort column; give the same field twice to sort descending
    #[arg(long, value_name = "FIELD")]
    sort: Vec<SortField>,

    /// Page to show
    #[arg(long, value_name = "N")]
    page: Option<u32>,

    /// Write the filtered courses to CSV
    #[arg(short, long)]
    export: bool,

    /// Read commands from stdin after the first render
    #[arg(short, long)]
    interactive: bool,

    /// Skip the persistent cache
    #[arg(long)]
    no_cache: bool,

    /// Drop the cached copy and fetch from the source
    #[arg(long)]
    refresh: bool,

    /// Plain output without colors
    #[arg(long)]
    no_color: bool,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

impl Cli {
    /// View events implied by the flags, in the order they are applied
    ///
    /// A page request made while the load is still running is held by the
    /// browser until the records arrive.
    fn startup_events(&self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        if let Some(category) = &self.category {
            events.push(UiEvent::CategoryChanged(Some(category.clone())));
        }
        if let Some(instructor) = &self.instructor {
            events.push(UiEvent::InstructorQuery(instructor.clone()));
        }
        if let Some(name) = &self.name {
            events.push(UiEvent::NameQuery(name.clone()));
        }
        events.extend(self.sort.iter().copied().map(UiEvent::HeaderClicked));
        if let Some(page) = self.page {
            events.push(UiEvent::Page(PageAction::Goto(page)));
        }
        events
    }
}

type Terminal = TerminalRenderTarget<Stdout>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with the table
    let log_filter = format!("course_browser={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Course Browser v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if cli.no_cache {
        config.cache.enabled = false;
    }
    if cli.no_color {
        config.display.color = false;
    }
    let tz = config.display.tz()?;

    let location = cli
        .source
        .clone()
        .or_else(|| config.source.url.clone())
        .unwrap_or_else(|| config.source.path.display().to_string());
    info!("Using course source: {}", location);

    let source = source_for_location(&location, &config.source);
    let cache = config.cache.enabled.then(|| {
        CourseCache::new(
            Box::new(FileKeyValueStore::new(config.cache.directory.clone())) as Box<dyn KeyValueStore>,
            config.cache.freshness(),
        )
    });
    if let Some(cache) = cache.as_ref().filter(|_| cli.refresh) {
        match cache.clear() {
            Ok(()) => info!("Course cache cleared"),
            Err(e) => warn!("Could not clear course cache: {}", e),
        }
    }
    let loader = DataLoader::new(source, cache, tz);

    let load = tokio::spawn(async move { loader.load(DateTimeParser::now_utc()).await });

    let mut browser = CourseBrowser::new(tz)
        .with_export_prefix(config.export.file_prefix.clone())
        .with_collation_locale(&config.display.locale);
    let mut target = TerminalRenderTarget::new(std::io::stdout(), config.display.color);
    let exports = DirectoryExportTarget::new(config.export.directory.clone());

    if cli.interactive {
        run_interactive(&cli, &mut browser, &mut target, &exports, load).await
    } else {
        run_once(&cli, &mut browser, &mut target, &exports, load).await
    }
}

/// Load, apply the flags, render once and optionally export
async fn run_once(
    cli: &Cli,
    browser: &mut CourseBrowser,
    target: &mut Terminal,
    exports: &DirectoryExportTarget,
    load: JoinHandle<LoadResult<LoadOutcome>>,
) -> Result<()> {
    install(browser, target, load.await);

    for event in cli.startup_events() {
        browser.dispatch(&event);
    }
    browser.flush(target, DateTimeParser::now_utc());

    if cli.export {
        export(browser, exports);
    }
    Ok(())
}

/// Event loop: commands on stdin are handled one at a time while the load
/// runs; each one is followed by at most one render
async fn run_interactive(
    cli: &Cli,
    browser: &mut CourseBrowser,
    target: &mut Terminal,
    exports: &DirectoryExportTarget,
    mut load: JoinHandle<LoadResult<LoadOutcome>>,
) -> Result<()> {
    for event in cli.startup_events() {
        browser.dispatch(&event);
    }
    browser.flush(target, DateTimeParser::now_utc());
    println!("{}", COMMAND_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut loading = true;

    loop {
        tokio::select! {
            result = &mut load, if loading => {
                loading = false;
                install(browser, target, result);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match browser.execute(&line, DateTimeParser::now_utc(), exports) {
                    Ok(CommandOutcome::Quit) => break,
                    Ok(CommandOutcome::Applied) => {}
                    Ok(CommandOutcome::Exported(path)) => println!("Exported to {}", path.display()),
                    Ok(CommandOutcome::Stats(stats)) => {
                        println!("{}", serde_json::to_string_pretty(&stats)?);
                    }
                    Err(AppError::Export(ExportError::Empty)) => println!("Nothing to export"),
                    Err(AppError::Export(e)) => println!("Export failed: {}", e),
                    Err(e) => {
                        warn!("{}", e);
                        println!("{}", COMMAND_HELP);
                    }
                }
            }
        }

        browser.flush(target, DateTimeParser::now_utc());
    }

    if loading {
        load.abort();
    }
    info!("Course Browser stopped");
    Ok(())
}

/// Hands the load result to the browser and runs the one-time filter setup
fn install(
    browser: &mut CourseBrowser,
    target: &mut Terminal,
    joined: Result<LoadResult<LoadOutcome>, tokio::task::JoinError>,
) {
    let result = joined.unwrap_or_else(|e| Err(LoadError::interrupted(e.to_string())));
    browser.install(result);

    if *browser.status() == LoadStatus::Loaded {
        browser.populate_filters(target);
    }
}

fn export(browser: &CourseBrowser, exports: &DirectoryExportTarget) {
    match browser.export(DateTimeParser::now_utc(), exports) {
        Ok(path) => println!("Exported to {}", path.display()),
        Err(ExportError::Empty) => println!("Nothing to export"),
        Err(e) => println!("Export failed: {}", e),
    }
}
