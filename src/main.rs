//! usaco-codegen CLI
//!
//! Generates USACO solutions with a hosted LLM and prints the extracted code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use usaco_codegen::{
    config::Config,
    extract::CodeExtractor,
    harness::{HarnessInput, run_tasks},
    llm::{LlmClient, RetryPolicy},
    logging,
    solver::Solver,
    template::PromptTemplate,
};

/// usaco-codegen - generate competitive-programming solutions with an LLM
#[derive(Parser)]
#[command(name = "usaco-codegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate code for one problem statement and print it
    Solve {
        /// Path to the problem statement (text file)
        problem: PathBuf,

        /// Prompt template with a {question} placeholder
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Model name, overrides LLM_MODEL
        #[arg(short, long)]
        model: Option<String>,

        /// Print the full model response instead of the extracted code
        #[arg(long)]
        raw: bool,
    },

    /// Fill in responses for every task of a harness input document
    Run {
        /// Path to the harness JSON document
        input: PathBuf,

        /// Prompt template with a {question} placeholder
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Model name, overrides LLM_MODEL
        #[arg(short, long)]
        model: Option<String>,

        /// Where to write the output document (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the prompt that would be sent for a problem
    Render {
        /// Path to the problem statement (text file)
        problem: PathBuf,

        /// Prompt template with a {question} placeholder
        #[arg(short, long)]
        template: Option<PathBuf>,
    },

    /// Extract code from a saved model response
    Extract {
        /// Path to the response text
        response: PathBuf,

        /// Info string of the fenced block
        #[arg(short, long, default_value = "python")]
        language: String,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    match cli.command {
        Commands::Solve {
            problem,
            template,
            model,
            raw,
        } => cmd_solve(problem, template, model, raw).await,
        Commands::Run {
            input,
            template,
            model,
            output,
        } => cmd_run(input, template, model, output).await,
        Commands::Render { problem, template } => cmd_render(problem, template),
        Commands::Extract { response, language } => cmd_extract(response, &language),
        Commands::Test => cmd_test().await,
    }
}

/// Load configuration and apply command-line overrides.
fn load_config(template: Option<PathBuf>, model: Option<String>) -> Result<Config> {
    let mut config = Config::load().context("Failed to load configuration")?;

    if template.is_some() {
        config.template.path = template;
    }
    if let Some(model) = model {
        config.llm.model = model;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn cmd_solve(
    problem_path: PathBuf,
    template: Option<PathBuf>,
    model: Option<String>,
    raw: bool,
) -> Result<()> {
    let config = load_config(template, model)?;

    let problem = fs::read_to_string(&problem_path)
        .with_context(|| format!("Failed to read problem file: {}", problem_path.display()))?;

    let solver = Solver::from_config(&config).context("Failed to set up solver")?;

    tracing::info!(
        "Solving {} with model {}",
        problem_path.display(),
        config.llm.model
    );
    let start = Instant::now();

    let solution = solver
        .solve(&problem)
        .await
        .context("Failed to generate solution")?;

    tracing::info!("Solution generated in {:.2?}", start.elapsed());

    if raw {
        println!("{}", solution.response);
    } else {
        print!("{}", solution.code);
    }

    Ok(())
}

async fn cmd_run(
    input_path: PathBuf,
    template: Option<PathBuf>,
    model: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(template, model)?;

    let input = HarnessInput::load(&input_path).context("Failed to load harness input")?;
    let solver = Solver::from_config(&config).context("Failed to set up solver")?;

    tracing::info!(
        "model name={}, prompt_template_path={}, tasks={}",
        config.llm.model,
        solver
            .template()
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<builtin>".to_string()),
        input.len()
    );

    let start = Instant::now();
    let results = run_tasks(&solver, input).await;

    tracing::info!(
        "Finished {} tasks in {:.2?} ({} failed)",
        results.succeeded + results.failed,
        start.elapsed(),
        results.failed
    );

    match output {
        Some(path) => {
            results
                .save(&path)
                .context("Failed to write harness output")?;
            tracing::info!("Output saved to: {}", path.display());
        }
        None => {
            let json = results.to_json().context("Failed to serialize output")?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn cmd_render(problem_path: PathBuf, template: Option<PathBuf>) -> Result<()> {
    let problem = fs::read_to_string(&problem_path)
        .with_context(|| format!("Failed to read problem file: {}", problem_path.display()))?;

    let template_path = template_path_or_config(template, Config::load)?;
    let template = PromptTemplate::load(template_path.as_deref())
        .context("Failed to load prompt template")?;
    let prompt = template
        .render(&problem)
        .context("Failed to render prompt")?;

    println!("{}", prompt);
    Ok(())
}

/// Use `--template` when given; only then is the config file left unread.
fn template_path_or_config<F>(template: Option<PathBuf>, load: F) -> Result<Option<PathBuf>>
where
    F: FnOnce() -> usaco_codegen::Result<Config>,
{
    match template {
        Some(path) => Ok(Some(path)),
        None => Ok(load().context("Failed to load configuration")?.template.path),
    }
}

fn cmd_extract(response_path: PathBuf, language: &str) -> Result<()> {
    let response = fs::read_to_string(&response_path)
        .with_context(|| format!("Failed to read response file: {}", response_path.display()))?;

    let extractor = CodeExtractor::new(language);
    print!("{}", extractor.extract_or_fallback(&response));
    Ok(())
}

async fn cmd_test() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("Configuration:");
    eprintln!("  API Base:  {}", config.llm.api_base);
    eprintln!("  Model:     {}", config.llm.model);
    eprintln!(
        "  API Key:   {}",
        if config.llm.api_key.is_empty() {
            "<none>".to_string()
        } else {
            format!("{}...", config.llm.api_key.chars().take(8).collect::<String>())
        }
    );

    config.validate().context("Invalid configuration")?;

    let client = LlmClient::new(config.llm.clone())
        .context("Failed to create LLM client")?
        .with_retry(RetryPolicy::from(&config.retry));

    eprintln!("Sending test request...");
    client
        .test_connection()
        .await
        .context("Connection failed")?;
    println!("Connection successful!");

    Ok(())
}
