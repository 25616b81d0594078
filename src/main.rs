//! santa - Secret Santa raffle CLI
//!
//! Thin command-line front end over the group and raffle services.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use santa_lib::adapter::error::ApiError;
use santa_lib::domain::error::RaffleError;
use santa_lib::infrastructure::{config, logging};
use santa_lib::App;
use serde::Serialize;

/// santa - Secret Santa group raffles
#[derive(Parser, Debug)]
#[command(name = "santa")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a group; the admin becomes its first member
    CreateGroup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        admin: String,
    },

    /// Add a member to a pending group
    AddMember {
        #[arg(long)]
        group: String,
        /// Acting user, must be the group admin
        #[arg(long)]
        requester: String,
        #[arg(long)]
        user: String,
    },

    /// Remove a member from a pending group
    RemoveMember {
        #[arg(long)]
        group: String,
        #[arg(long)]
        requester: String,
        #[arg(long)]
        user: String,
    },

    /// Show a group
    Show {
        #[arg(long)]
        group: String,
    },

    /// Run the raffle for a group
    Draw {
        #[arg(long)]
        group: String,
        #[arg(long)]
        requester: String,
    },

    /// Show who a member gives a gift to
    Mine {
        #[arg(long)]
        group: String,
        #[arg(long)]
        user: String,
    },

    /// Clear a completed raffle so it can be drawn again
    Reset {
        #[arg(long)]
        group: String,
        #[arg(long)]
        requester: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetOutput {
    group_id: String,
    deleted_assignments: u64,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(app: &App, command: Commands) -> anyhow::Result<Result<(), RaffleError>> {
    let outcome = match command {
        Commands::CreateGroup { name, admin } => app.groups.create(name, admin).await.map(|g| print_json(&g)),
        Commands::AddMember {
            group,
            requester,
            user,
        } => app
            .groups
            .add_member(&group, &requester, &user)
            .await
            .map(|g| print_json(&g)),
        Commands::RemoveMember {
            group,
            requester,
            user,
        } => app
            .groups
            .remove_member(&group, &requester, &user)
            .await
            .map(|g| print_json(&g)),
        Commands::Show { group } => app.groups.get(&group).await.map(|g| print_json(&g)),
        Commands::Draw { group, requester } => app
            .raffles
            .perform_raffle(&group, &requester)
            .await
            .map(|o| print_json(&o)),
        Commands::Mine { group, user } => app
            .raffles
            .get_my_assignment(&group, &user)
            .await
            .map(|v| print_json(&v)),
        Commands::Reset { group, requester } => app
            .raffles
            .reset_raffle(&group, &requester)
            .await
            .map(|deleted| {
                print_json(&ResetOutput {
                    group_id: group.clone(),
                    deleted_assignments: deleted,
                })
            }),
    };

    match outcome {
        Ok(printed) => {
            printed?;
            Ok(Ok(()))
        }
        Err(e) => Ok(Err(e)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (app_config, config_source) = config::init(cli.config.as_deref());
    logging::setup(&app_config.logging);
    config_source.log();

    let app = App::from_config(&app_config.storage).await?;

    match run(&app, cli.command).await? {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::debug!("Command failed: {}", e);
            print_json(&ApiError::from(e))?;
            Ok(ExitCode::FAILURE)
        }
    }
}
