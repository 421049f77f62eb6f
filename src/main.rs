use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use grant_forge::{
    Category, CliConfig, DocumentLoader, DocumentSource, FileOutputWriter, GeminiClient,
    LoggingClient, OrgDetails, OutputWriter, PromptBuilder, Workflow, WorkflowState,
    session_slug,
};

/// Grant-Forge CLI: draft a grant proposal from a funding announcement
#[derive(Parser, Debug)]
#[command(name = "grant-forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a whole drafting session: analysis through export
    #[command(name = "run")]
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Analyze an announcement and print the result as JSON
    #[command(name = "analyze")]
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Announcement text file ("-" reads stdin)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Announcement text given inline
    #[arg(long)]
    text: Option<String>,

    /// Web page holding the announcement
    #[arg(long)]
    url: Option<String>,
}

impl SourceArgs {
    fn source(&self) -> Result<DocumentSource> {
        match (&self.file, &self.text, &self.url) {
            (Some(path), _, _) => Ok(DocumentSource::File(path.clone())),
            (_, Some(text), _) => Ok(DocumentSource::Text(text.clone())),
            (_, _, Some(url)) => Ok(DocumentSource::Url(url.clone())),
            _ => anyhow::bail!("One of --file, --text or --url is required"),
        }
    }
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the model (e.g., "gemini-2.0-flash")
    #[arg(long)]
    model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    common: CommonArgs,

    /// Scope of service to select (repeatable)
    #[arg(long = "scope")]
    scopes: Vec<String>,

    /// Program to select (repeatable)
    #[arg(long = "program")]
    programs: Vec<String>,

    /// Focus area to select (repeatable)
    #[arg(long = "focus-area")]
    focus_areas: Vec<String>,

    /// Suggested concept to use, 1-based (defaults to the first)
    #[arg(long)]
    concept: Option<usize>,

    /// Organization name
    #[arg(long, default_value = "")]
    org_name: String,

    /// Organization mission
    #[arg(long, default_value = "")]
    mission: String,

    /// Relevant past experience
    #[arg(long, default_value = "")]
    experience: String,

    /// Maximum budget in dollars
    #[arg(long, default_value = "")]
    max_budget: String,

    /// Project length in months
    #[arg(long, default_value = "")]
    time_frame: String,

    /// Required section to leave out (repeatable)
    #[arg(long = "skip-section")]
    skip_sections: Vec<String>,

    /// Refinement instructions applied after the review
    #[arg(long)]
    refine: Option<String>,

    /// Output directory for the exported proposal
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Run { args }) => handle_run_command(args).await,
        Some(Command::Analyze { source, common }) => handle_analyze_command(source, common).await,
        None => {
            // Default behavior: show help
            eprintln!("No command specified. Use --help for usage information.");
            eprintln!("Example: grant-forge run --file announcement.txt --org-name \"Helping Hands\"");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Shared setup: config with CLI overrides, client, prompts and loader
struct Session {
    config: CliConfig,
    workflow: Workflow<LoggingClient<GeminiClient>>,
    loader: DocumentLoader,
}

fn build_session(common: &CommonArgs) -> Result<Session> {
    let mut config = CliConfig::load_or_default(common.config.as_deref())?;
    if let Some(model) = &common.model {
        config.model.model = model.clone();
    }

    // Prompt overrides resolve relative to the config file
    let base_dir = common
        .config
        .as_ref()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let client = GeminiClient::from_env(&config.model)?;
    let prompts = PromptBuilder::new(&config.prompts, &base_dir)?;
    let loader = DocumentLoader::new(Duration::from_secs(config.model.request_timeout_secs))?;

    Ok(Session {
        workflow: Workflow::new(LoggingClient::new(client), prompts),
        loader,
        config,
    })
}

async fn handle_analyze_command(source: SourceArgs, common: CommonArgs) -> Result<()> {
    init_logging(common.verbose);

    let mut session = build_session(&common)?;
    let text = session.loader.load(&source.source()?).await?;

    session.workflow.analyze(&text).await?;
    report_slot(session.workflow.state());

    let json = serde_json::to_string_pretty(session.workflow.state().analysis())
        .context("Failed to serialize analysis")?;
    println!("{}", json);
    Ok(())
}

async fn handle_run_command(args: RunArgs) -> Result<()> {
    init_logging(args.common.verbose);
    info!("Grant-Forge CLI starting");

    let source = args.source.source()?;
    let mut session = build_session(&args.common)?;
    if let Some(output) = &args.output {
        session.config.output.active_dir = output.clone();
    }

    let label = if args.org_name.trim().is_empty() {
        source.label()
    } else {
        args.org_name.clone()
    };
    let slug = session_slug(&label);
    info!("Session: {}", slug);

    let writer = FileOutputWriter::new(session.config.output.clone(), slug);
    let workflow = &mut session.workflow;

    // Upload -> Analyzing
    let text = session.loader.load(&source).await?;
    workflow.analyze(&text).await?;
    checkpoint(&writer, workflow.state()).await?;

    apply_selections(workflow, Category::Scopes, &args.scopes)?;
    apply_selections(workflow, Category::Programs, &args.programs)?;
    apply_selections(workflow, Category::FocusAreas, &args.focus_areas)?;

    // Analyzing -> ConceptSelection -> OrgDetails
    workflow.suggest_concepts().await?;
    checkpoint(&writer, workflow.state()).await?;
    if let Some(number) = args.concept {
        let index = number
            .checked_sub(1)
            .context("--concept is 1-based; 0 is not a concept")?;
        workflow.select_concept(index)?;
    }
    if let Some(concept) = workflow.state().selected_concept() {
        info!("Concept: {}", concept.name);
    }
    workflow.confirm_concept()?;

    // OrgDetails -> SectionSelection
    workflow.set_org_details(OrgDetails {
        name: args.org_name.clone(),
        mission: args.mission.clone(),
        past_experience: args.experience.clone(),
        max_budget: args.max_budget.clone(),
        time_frame: args.time_frame.clone(),
    })?;
    workflow.confirm_org_details()?;
    for title in &args.skip_sections {
        workflow.toggle_section(title)?;
    }
    checkpoint(&writer, workflow.state()).await?;

    // SectionSelection -> Generating -> Review
    workflow
        .generate(|progress| {
            if let Some(current) = &progress.current {
                info!(
                    "Drafting section {}/{}: {}",
                    progress.completed + 1,
                    progress.total,
                    current
                );
            }
        })
        .await?;
    checkpoint(&writer, workflow.state()).await?;

    // Review -> Download
    match args.refine.as_deref().map(str::trim) {
        Some(notes) if !notes.is_empty() => {
            workflow.set_refinement_request(notes)?;
            if let Err(e) = workflow.refine().await {
                warn!("Refinement failed, exporting the unrefined draft: {}", e);
                workflow.finish()?;
            }
        }
        _ => workflow.finish()?,
    }
    checkpoint(&writer, workflow.state()).await?;

    let state = workflow.state();
    let files = writer.write_final(state.proposal(), state.review()).await?;
    print_result(state, &files.markdown, &files.html, &writer.session_dir());
    Ok(())
}

fn apply_selections<C: grant_forge::ModelClient>(
    workflow: &mut Workflow<C>,
    category: Category,
    names: &[String],
) -> Result<()> {
    for name in names {
        if let Err(e) = workflow.toggle_selection(category, name) {
            let available: Vec<&str> = workflow
                .state()
                .analysis()
                .items(category)
                .iter()
                .map(|i| i.name.as_str())
                .collect();
            anyhow::bail!(
                "{}. Available {}: {}",
                e,
                category.label(),
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            );
        }
    }
    Ok(())
}

/// Surface the error slot and snapshot the state.
async fn checkpoint(writer: &FileOutputWriter, state: &WorkflowState) -> Result<()> {
    report_slot(state);
    writer.write_snapshot(state).await?;
    Ok(())
}

fn report_slot(state: &WorkflowState) {
    if let Some(message) = state.last_error() {
        warn!("{}", message);
    }
}

fn print_result(state: &WorkflowState, markdown: &Path, html: &Path, session_dir: &Path) {
    let sections = state.generated().len();
    let failed = state.failed_sections();

    println!("\n========================================");
    println!("Proposal Complete!");
    println!("========================================");
    println!("Sections drafted: {}", sections - failed.len());
    if !failed.is_empty() {
        println!("Sections needing manual work: {}", failed.join(", "));
    }
    println!("Markdown: {}", markdown.display());
    println!("HTML: {}", html.display());
    println!("Session state: {}", session_dir.display());
    println!("\nReview:\n{}", state.review().text);
}
