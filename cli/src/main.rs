//! deckpilot CLI - edit PowerPoint decks with natural-language instructions
//!
//! Without a subcommand the tool starts an interactive session on the
//! target deck; every line typed is one instruction.

use clap::{Parser, Subcommand};
use colored::*;
use deckpilot::config::AssistantConfig;
use deckpilot::pipeline::{Assistant, Verdict};
use deckpilot::plan::extract_plan_text;
use deckpilot::{ops, summary};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

/// Conversational assistant for editing slide decks
#[derive(Parser)]
#[command(
    name = "deckpilot",
    version,
    about = "Edit PowerPoint decks with natural-language instructions",
    long_about = "deckpilot - conversational slide-deck editing.\n\n\
                  Each instruction is turned into an edit plan by a language model \
                  and applied through a fixed set of guarded shape operations."
)]
struct Cli {
    /// Target deck; created on the first instruction if missing
    #[arg(short = 'p', long = "ppt", default_value = "presentation.pptx", global = true)]
    ppt: PathBuf,

    /// Print each edit plan before it is applied
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file (default: $DECKPILOT_CONFIG or ./deckpilot.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the vision check after each edit
    #[arg(long, global = true)]
    no_validate: bool,

    /// Open the deck in the default application after each edit
    #[arg(long, global = true)]
    open: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive session (default)
    Chat,

    /// Print the structure summary the model sees
    Inspect {
        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Apply an edit plan from a file, without calling a model
    Apply {
        /// Plan file (JSON, optionally in a fenced block)
        #[arg(long)]
        plan: PathBuf,
    },

    /// Create an empty deck
    New {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version information
    Version,
}

/// Per-session switches taken from the command line.
struct SessionOptions {
    debug: bool,
    validate: bool,
    open: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        print_error(e.as_ref());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let path = absolute(&cli.ppt)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = AssistantConfig::discover(cli.config.as_deref())?;
            init_logging(&config.logging.level);
            let assistant = Assistant::from_config(config)?;
            let options = SessionOptions {
                debug: cli.debug,
                validate: !cli.no_validate,
                open: cli.open,
            };
            chat(&assistant, &path, &options)?;
        }

        Commands::Inspect { json } => {
            let prs = ops::load_presentation(&path)?;
            let text = if json {
                summary::to_json(&prs)?
            } else {
                summary::summarize(&prs)
            };
            println!("{}", text.trim_end());
        }

        Commands::Apply { plan } => {
            let config = AssistantConfig::discover(cli.config.as_deref())?;
            init_logging(&config.logging.level);
            let assistant = Assistant::new(config, None, Box::new(deckpilot::render::NoRenderer));

            let plan_text = extract_plan_text(&fs::read_to_string(&plan)?)?;
            if cli.debug {
                print_plan(&plan_text);
            }
            let created = assistant.ensure_deck(&path)?;
            if created {
                println!("{} Created new presentation: {}", "✓".green().bold(), path.display());
            }
            let applied = assistant.apply(&path, &plan_text)?;
            for note in &applied.notes {
                println!("  {} {}", "·".dimmed(), note);
            }
            println!("{} Plan applied to {}", "✓".green().bold(), path.display());
        }

        Commands::New { force } => {
            if path.exists() && !force {
                return Err(format!("{} already exists (use --force to replace it)", path.display()).into());
            }
            let mut prs = ops::new_presentation()?;
            prs.save_as(&path)?;
            println!("{} Created new presentation: {}", "✓".green().bold(), path.display());
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn chat(assistant: &Assistant, path: &Path, options: &SessionOptions) -> io::Result<()> {
    println!("{}", "deckpilot".cyan().bold());
    println!("{}", "─".repeat(40));
    println!("{}: {}", "Target file".bold(), path.display());
    if !path.exists() {
        println!("{} File does not exist; it will be created on the first instruction.", "!".yellow().bold());
    }
    if !assistant.has_model() {
        println!("{} No API key configured; set GOOGLE_API_KEY.", "!".yellow().bold());
    }
    if options.debug {
        println!("{} Debug mode: edit plans are printed before they are applied.", "i".blue().bold());
    }
    println!("Type an instruction, or 'exit' to quit.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n{} ", "[you]".green().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let instruction = line.trim();
        if instruction.is_empty() {
            continue;
        }
        if instruction.eq_ignore_ascii_case("exit") || instruction.eq_ignore_ascii_case("quit") {
            println!("Bye!");
            break;
        }

        if let Err(e) = handle_instruction(assistant, path, instruction, options) {
            print_error(&e);
        }
    }
    Ok(())
}

fn handle_instruction(
    assistant: &Assistant,
    path: &Path,
    instruction: &str,
    options: &SessionOptions,
) -> deckpilot::Result<()> {
    if assistant.ensure_deck(path)? {
        println!("{} Created new presentation: {}", "✓".green().bold(), path.display());
    }

    let pb = create_spinner("Inspecting presentation...");
    let inspection = assistant.inspect(path);
    pb.finish_and_clear();
    let inspection = inspection?;
    if inspection.visual.is_none() {
        println!("{} Working from the structure summary only (no PDF).", "i".blue().bold());
    }

    let pb = create_spinner("Asking the model for an edit plan...");
    let plan = assistant.generate(path, instruction, &inspection);
    pb.finish_and_clear();
    let plan = plan?;
    if options.debug {
        print_plan(&plan);
    }

    let applied = match assistant.apply(path, &plan) {
        Ok(applied) => applied,
        Err(e) => {
            if !options.debug {
                print_plan(&plan);
            }
            return Err(e);
        }
    };
    for note in &applied.notes {
        println!("  {} {}", "·".dimmed(), note);
    }
    println!("{} Modification applied successfully.", "✓".green().bold());

    if options.validate {
        let pb = create_spinner("Validating result...");
        let verdict = assistant.validate(path, instruction);
        pb.finish_and_clear();
        print_verdict(&verdict);
    }

    if options.open {
        open_in_viewer(path);
    }
    Ok(())
}

fn print_verdict(verdict: &Verdict) {
    match verdict {
        Verdict::Satisfied => println!("{} Validation: no issues found.", "✓".green().bold()),
        Verdict::IssuesReported(issues) => {
            println!("{} Validation reported possible issues:", "!".yellow().bold());
            for issue in issues {
                println!("  - {}", issue);
            }
        }
        Verdict::Skipped(reason) => println!("{} Validation skipped: {}", "i".blue().bold(), reason),
    }
}

fn print_plan(plan: &str) {
    println!("{}", "Edit plan".cyan().bold());
    println!("{}", "=".repeat(60));
    println!("{}", plan);
    println!("{}", "=".repeat(60));
}

fn print_error(e: &(dyn std::error::Error + 'static)) {
    eprintln!("{}: {}", "Error".red().bold(), e);
    let mut source = e.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

fn open_in_viewer(path: &Path) {
    let status = if cfg!(windows) {
        Command::new("cmd").arg("/C").arg("start").arg("").arg(path).status()
    } else if cfg!(target_os = "macos") {
        Command::new("open").arg(path).status()
    } else {
        Command::new("xdg-open").arg(path).status()
    };
    if let Err(e) = status {
        warn!(error = %e, "could not open viewer");
        println!("{} Please open {} manually.", "!".yellow().bold(), path.display());
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    // A subscriber may already be installed
    let _ = subscriber.try_init();
}

fn print_version() {
    println!("{} {}", "deckpilot".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Conversational PowerPoint editing with guarded edit plans");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command() {
        let cli = Cli::try_parse_from(["deckpilot", "-p", "talk.pptx", "-d"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.debug);
        assert_eq!(cli.ppt, PathBuf::from("talk.pptx"));
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from(["deckpilot", "inspect", "--json", "-p", "a.pptx"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Inspect { json: true })));

        let cli = Cli::try_parse_from(["deckpilot", "apply", "--plan", "plan.json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Apply { .. })));
        assert!(Cli::try_parse_from(["deckpilot", "apply"]).is_err());
    }
}
