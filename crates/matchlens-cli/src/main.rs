// matchlens entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr; stdout carries the view)
// 3. Load config, copying defaults on first run
// 4. Build the configured open-data source behind the dashboard cache
// 5. Run the requested command once and print the result

mod output;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use matchlens_core::config;
use matchlens_core::dashboard::{Dashboard, Selection, ViewKind};
use matchlens_core::export::export_view;
use matchlens_core::positions::PositionGroup;
use matchlens_core::views::ViewResult;
use matchlens_opendata::OpenDataSource;

#[derive(Parser)]
#[command(name = "matchlens")]
#[command(
    about = "Explore tournament event data: progressions, shots, networks and report cards",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List competition seasons offered by the provider
    Competitions,

    /// List every team in the configured tournament
    Teams,

    /// List a team's matches
    Matches {
        #[arg(long)]
        team: String,
    },

    /// Compute one view
    View {
        /// progressions, touches, shots, heatmap, network or report
        name: String,

        #[arg(long)]
        team: String,

        /// Match id to include (repeatable; default: all of the team's matches)
        #[arg(long = "match")]
        matches: Vec<u64>,

        #[arg(long)]
        player: Option<String>,

        /// Second player for the touch comparison
        #[arg(long)]
        player2: Option<String>,

        /// Position group for report cards (goalkeeper, defender, midfielder, forward)
        #[arg(long)]
        group: Option<String>,

        /// Write the view's tables as CSV files into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} (competition {}, season {})",
        config.tournament.query(),
        config.tournament.competition_id,
        config.tournament.season_id
    );

    let source =
        matchlens_opendata::from_config(&config.source).context("failed to set up data source")?;
    let dashboard = Dashboard::new(config, source);

    run(&dashboard, cli.command).await
}

async fn run(dashboard: &Dashboard<OpenDataSource>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Competitions => {
            let competitions = dashboard
                .cache()
                .competitions()
                .await
                .context("failed to fetch competitions")?;
            for c in competitions.iter() {
                println!(
                    "{:>4} {:>4}  {} / {} {} ({})",
                    c.competition_id,
                    c.season_id,
                    c.country_name,
                    c.competition_name,
                    c.season_name,
                    c.competition_gender
                );
            }
        }
        Commands::Teams => {
            let teams = dashboard.teams().await.context("failed to fetch matches")?;
            for team in teams {
                println!("{team}");
            }
        }
        Commands::Matches { team } => {
            match dashboard
                .match_options(&team)
                .await
                .context("failed to fetch matches")?
            {
                ViewResult::Ready(options) => print!("{}", output::format_match_options(&options)),
                ViewResult::NoData(reason) => println!("{reason}"),
            }
        }
        Commands::View {
            name,
            team,
            matches,
            player,
            player2,
            group,
            export,
        } => {
            let kind = ViewKind::from_name(&name).ok_or_else(|| {
                let known: Vec<&str> = ViewKind::ALL.iter().map(|k| k.name()).collect();
                anyhow!("unknown view '{}'; expected one of: {}", name, known.join(", "))
            })?;
            let group = match group {
                Some(g) => Some(
                    PositionGroup::from_str_group(&g)
                        .ok_or_else(|| anyhow!("unknown position group '{g}'"))?,
                ),
                None => None,
            };
            let selection = Selection {
                team,
                match_ids: matches,
                player,
                player2,
                group,
            };

            let result = dashboard
                .render(kind, &selection)
                .await
                .with_context(|| format!("failed to render {kind}"))?;
            print!("{}", output::format_view(kind, &result));

            if let (Some(dir), ViewResult::Ready(view)) = (export, &result) {
                let files = export_view(&dir, view).context("failed to export view")?;
                for file in files {
                    println!("wrote {}", file.display());
                }
            }
        }
    }

    let stats = dashboard.cache().stats();
    info!(
        "cache: {} hits, {} misses, {} entries",
        stats.hits, stats.misses, stats.entries
    );
    Ok(())
}

/// Initialize tracing to stderr so stdout stays clean for view output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matchlens=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
