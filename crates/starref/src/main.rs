use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use starref_core::{
    config::Config,
    domain::{DialogId, UserId},
    program::{ProgramParameters, ProgramSortOrder},
    registry::InMemoryRegistry,
    AffiliateProgramManager,
};
use starref_rpc::HttpDispatcher;

/// Affiliate program client: runs one operation and prints the result as JSON.
#[derive(Debug, Parser)]
#[command(name = "starref", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Set or end (0 0) the affiliate program of an owned bot.
    SetProgram {
        #[arg(long, value_parser = parse_dialog)]
        bot: DialogId,
        #[arg(long, default_value_t = 0)]
        commission_permille: i32,
        #[arg(long, default_value_t = 0)]
        duration_months: i32,
    },
    /// Open a bot from a referral link's username and code.
    Resolve {
        username: String,
        referrer: String,
    },
    /// Search programs a dialog could join.
    Search {
        #[arg(long, value_parser = parse_dialog)]
        dialog: DialogId,
        #[arg(long, default_value = "profitability")]
        order: ProgramSortOrder,
        #[arg(long, default_value = "")]
        offset: String,
        #[arg(long, default_value_t = 20)]
        limit: i32,
    },
    /// Join a bot's program.
    Connect {
        #[arg(long, value_parser = parse_dialog)]
        dialog: DialogId,
        #[arg(long)]
        bot: i64,
    },
    /// Revoke a referral link.
    Revoke {
        #[arg(long, value_parser = parse_dialog)]
        dialog: DialogId,
        #[arg(long)]
        url: String,
    },
    /// Show the dialog's connection to one bot's program.
    Connection {
        #[arg(long, value_parser = parse_dialog)]
        dialog: DialogId,
        #[arg(long)]
        bot: i64,
    },
    /// List the programs a dialog is connected to.
    Connections {
        #[arg(long, value_parser = parse_dialog)]
        dialog: DialogId,
        #[arg(long, default_value = "")]
        offset: String,
        #[arg(long, default_value_t = 20)]
        limit: i32,
    },
}

fn parse_dialog(s: &str) -> Result<DialogId, String> {
    DialogId::parse(s).ok_or_else(|| {
        format!("invalid dialog {s:?}, expected user:<id>, chat:<id> or channel:<id>")
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    starref_core::logging::init("starref")?;
    let cli = Cli::parse();

    let cfg = Config::load()?;
    let registry = Arc::new(
        InMemoryRegistry::load(&cfg.registry_file).with_context(|| {
            format!("failed to load registry {}", cfg.registry_file.display())
        })?,
    );
    let dispatcher = Arc::new(HttpDispatcher::new(&cfg)?);
    let manager = AffiliateProgramManager::new(registry.clone(), registry, dispatcher);

    let output = run(&manager, cli.command).await.map_err(|e| {
        tracing::warn!(code = e.code(), "operation failed: {e}");
        anyhow::anyhow!("[{}] {e}", e.code())
    })?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(
    manager: &AffiliateProgramManager,
    command: Command,
) -> starref_core::Result<serde_json::Value> {
    let value = match command {
        Command::SetProgram {
            bot,
            commission_permille,
            duration_months,
        } => {
            let parameters = ProgramParameters::new(commission_permille, duration_months);
            manager.set_program(bot, parameters).await?;
            serde_json::json!({ "ok": true })
        }
        Command::Resolve { username, referrer } => {
            serde_json::to_value(manager.resolve_program(&username, &referrer).await?)?
        }
        Command::Search {
            dialog,
            order,
            offset,
            limit,
        } => serde_json::to_value(
            manager
                .search_programs(dialog, order, &offset, limit)
                .await?,
        )?,
        Command::Connect { dialog, bot } => {
            serde_json::to_value(manager.connect_program(dialog, UserId(bot)).await?)?
        }
        Command::Revoke { dialog, url } => {
            serde_json::to_value(manager.revoke_program(dialog, &url).await?)?
        }
        Command::Connection { dialog, bot } => serde_json::to_value(
            manager
                .get_connected_program(dialog, UserId(bot))
                .await?,
        )?,
        Command::Connections {
            dialog,
            offset,
            limit,
        } => serde_json::to_value(
            manager
                .get_connected_programs(dialog, &offset, limit)
                .await?,
        )?,
    };
    Ok(value)
}
