use clap::{Parser, Subcommand};
use lectern::quiz::QuizLoader;
use lectern::server::{self, App};
use lectern::site::Site;
use lectern::{config, logging, output};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Documentation and quiz browser for lesson repositories")]
#[command(long_about = "\
Documentation and quiz browser for lesson repositories

The repository is the data source. Directories become sections, markdown
files become lessons, code files are shown with an optional embedded gist,
and JSON files under Quiz/ become quizzes.

Repository structure:

  repo/
  ├── config.toml                  # Optional site config
  ├── README.md                    # Start page (hidden from the tree)
  ├── Arrays/
  │   ├── README.md                # Priority content is listed first
  │   ├── theory.md
  │   ├── two_sum_easy.dart        # Difficulty: easy < medium < hard
  │   ├── two_sum_easy.txt         # Gist URL for two_sum_easy.dart
  │   └── trapping_rain_water_hard.dart
  └── Quiz/
      └── arrays/
          ├── 001.json             # {question, options, answer, explanation}
          └── 002.json

Run 'lectern gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Repository to serve
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the site over HTTP
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Interface to bind
        #[arg(long)]
        interface: Option<String>,
    },
    /// Print the ordered content tree
    Tree {
        /// Print the flattened reading order instead
        #[arg(long)]
        sequence: bool,
    },
    /// Render one file with its previous/next neighbours
    Show {
        /// Path relative to the repository (default document when omitted)
        path: Option<String>,
        /// Print the file-content JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Print a quiz, or list quiz types when none is given
    Quiz {
        /// Quiz type (a subdirectory of the quiz directory)
        quiz_type: Option<String>,
    },
    /// Validate config and content without serving
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut site_config = config::load_config(&cli.source)?;
    site_config.apply_env_overrides(|key| std::env::var(key).ok())?;
    if let Command::Serve { port, interface } = &cli.command {
        if let Some(port) = port {
            site_config.server.port = *port;
        }
        if let Some(interface) = interface {
            site_config.server.interface = interface.clone();
        }
    }
    site_config.validate()?;
    logging::init_logging(&site_config.logging)?;

    match cli.command {
        Command::Serve { .. } => {
            let app = App::from_config(&cli.source, &site_config)?;
            info!(root = %cli.source.display(), login = app.auth.is_enabled(), "starting server");
            server::serve(app, &site_config.server)?;
        }
        Command::Tree { sequence } => {
            let tree = Site::new(&cli.source, &site_config).tree();
            if sequence {
                for line in output::format_sequence(&tree) {
                    println!("{}", line);
                }
            } else {
                output::print_tree(&tree);
            }
        }
        Command::Show { path, json } => {
            let site = Site::new(&cli.source, &site_config);
            let lookup = site.lookup(path.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&lookup)?);
            } else {
                output::print_lookup(&lookup);
            }
        }
        Command::Quiz { quiz_type } => {
            let quizzes = QuizLoader::new(cli.source.join(&site_config.quiz.dir));
            match quiz_type {
                Some(quiz_type) => {
                    let questions = quizzes.load(&quiz_type)?;
                    output::print_quiz(&quiz_type, &questions);
                }
                None => {
                    for quiz_type in quizzes.types() {
                        println!("{}", quiz_type);
                    }
                }
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let site = Site::new(&cli.source, &site_config);
            site.lookup(None)?;
            let tree = site.tree();
            println!("{}", output::format_tree_summary(&tree));

            let quizzes = QuizLoader::new(cli.source.join(&site_config.quiz.dir));
            for quiz_type in quizzes.types() {
                let count = quizzes.load(&quiz_type)?.len();
                println!("Quiz {}: {} questions", quiz_type, count);
            }
            if !site_config.auth.is_configured() {
                warn!("GitHub credentials not set, quizzes will be unreachable when serving");
            }
            println!("==> Content is valid");
        }
        Command::GenConfig => {}
    }

    Ok(())
}
