//! `chkpt` - CLI for the checkpoint crossing registry
//!
//! This binary provides the command-line interface for recording crossings,
//! screening identities, browsing the journal, and administering the
//! reference lists.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;

use checkpoint::cli::{
    parse_cargo_line, CheckCommand, Cli, Command, ConfigCommand, LogCommand, RecordCommand,
    WantedCommand, WatchCommand,
};
use checkpoint::model::{CrossingRole, Identity, VehicleRef, WantedEntry, WatchEntry};
use checkpoint::workflow::{DecisionChannel, DeclineReason, EntryWorkflow, SubmitOutcome};
use checkpoint::{init_logging, Config, LogFilter, Storage};

/// Operator confirmations for the interactive terminal, or auto-accept
/// under `--yes`.
#[derive(Debug, Clone, Copy)]
enum Decisions {
    Interactive,
    AutoConfirm,
}

impl DecisionChannel for Decisions {
    fn confirm(&self, message: &str) -> bool {
        match self {
            Self::AutoConfirm => {
                println!("{message}");
                println!("  (confirmed automatically with --yes)");
                true
            }
            Self::Interactive => {
                println!("{message}");
                print!("  [y/N] ");
                if io::stdout().flush().is_err() {
                    return false;
                }
                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line).is_err() {
                    return false;
                }
                matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Record(cmd) => handle_record(&config, cmd),
        Command::Check(cmd) => handle_check(&config, &cmd),
        Command::Log(cmd) => handle_log(&config, &cmd),
        Command::Wanted(cmd) => handle_wanted(&config, cmd),
        Command::Watch(cmd) => handle_watch(&config, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    Storage::open(config.database_path()).context("failed to open the registry database")
}

fn handle_record(config: &Config, cmd: RecordCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let decisions = if cmd.yes {
        Decisions::AutoConfirm
    } else {
        Decisions::Interactive
    };
    let mut workflow = EntryWorkflow::new(storage, decisions, config.entry.operator.clone());

    workflow.begin_entry();
    if let Some(driver_id) = cmd.driver_crossing {
        let driver = workflow
            .store()
            .crossing(driver_id)?
            .with_context(|| format!("driver crossing {driver_id} not found"))?;
        workflow.add_passenger(driver)?;

        let manifest = workflow.previous_passengers()?;
        if !manifest.is_empty() {
            println!("Passengers on this driver's previous trip:");
            for passenger in manifest {
                println!("  {} born {}", passenger.full_name, passenger.person_dob);
            }
        }
    } else {
        let draft = workflow.draft_mut();
        draft.direction = cmd.direction.into();
        draft.role = cmd.role.into();
        draft.purpose = cmd.purpose.clone();
        draft.destination = cmd.destination.clone();
        if CrossingRole::from(cmd.role).requires_vehicle() {
            draft.vehicle = VehicleRef {
                id: None,
                make: cmd.vehicle_make.clone().unwrap_or_default(),
                plate: cmd.vehicle_plate.clone().unwrap_or_default(),
            };
        }
    }

    for raw in &cmd.cargo {
        let line = parse_cargo_line(raw)?;
        workflow.draft_mut().cargo.push(line);
    }

    workflow.update_identity(|identity| {
        identity.last_name = cmd.last_name.clone();
        identity.first_name = cmd.first_name.clone();
        identity.patronymic = cmd.patronymic.clone();
        identity.dob = cmd.dob.clone();
        identity.citizenship = cmd.citizenship.clone();
        identity.document = Some(cmd.document.clone());
        identity.notes = cmd.notes.clone();
    });

    match workflow.submit()? {
        SubmitOutcome::Committed { crossing_id } => {
            let crossing = workflow
                .store()
                .crossing(crossing_id)?
                .context("committed crossing missing from journal")?;
            println!(
                "Recorded crossing {}: {} {} {}",
                crossing_id, crossing.full_name, crossing.direction, crossing.timestamp
            );
            if crossing.role == CrossingRole::Driver {
                println!(
                    "Add passengers with: chkpt record --driver-crossing {crossing_id} ..."
                );
            }
        }
        SubmitOutcome::Declined { reason } => {
            let reason = match reason {
                DeclineReason::WantedBlock => "wanted-list hit was not overridden",
                DeclineReason::WatchlistBlock => "watch-list hit was not overridden",
                DeclineReason::IdentityMismatch => "identity mismatch was not confirmed",
                DeclineReason::DuplicateDirection => "duplicate direction was not confirmed",
            };
            println!("Not recorded: {reason}.");
        }
    }
    Ok(())
}

fn handle_check(config: &Config, cmd: &CheckCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let candidate = Identity {
        last_name: cmd.last_name.clone(),
        first_name: cmd.first_name.clone(),
        patronymic: cmd.patronymic.clone(),
        dob: cmd.dob.clone(),
        ..Identity::default()
    };

    use checkpoint::CrossingStore;
    let wanted = storage.wanted_entries()?;
    let watch = storage.watch_entries()?;
    let decision = checkpoint::evaluate(&candidate, &wanted, &watch);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        println!("{}", decision.message());
    }
    Ok(())
}

fn handle_log(config: &Config, cmd: &LogCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let filter = LogFilter {
        last_name: cmd.last_name.clone().unwrap_or_default(),
        first_name: cmd.first_name.clone().unwrap_or_default(),
        patronymic: cmd.patronymic.clone().unwrap_or_default(),
        citizenship: cmd.citizenship.clone().unwrap_or_default(),
        document: cmd.document.clone().unwrap_or_default(),
    };

    let rows = filter.apply(&storage.recent_crossings(cmd.limit)?);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No crossings match.");
        return Ok(());
    }
    for crossing in rows {
        let vehicle = if crossing.vehicle_info.is_empty() {
            String::new()
        } else {
            format!("  {}", crossing.vehicle_info)
        };
        println!(
            "{}  #{:<5} {:<3} {:<10} {}  doc {}{}",
            crossing.timestamp,
            crossing.id,
            crossing.direction,
            crossing.role,
            crossing.full_name,
            crossing.person_document,
            vehicle
        );
    }
    Ok(())
}

fn handle_wanted(config: &Config, cmd: WantedCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    use checkpoint::CrossingStore;
    match cmd {
        WantedCommand::Add {
            last_name,
            first_name,
            patronymic,
            dob,
            info,
            actions,
        } => {
            let id = storage.add_wanted(&WantedEntry {
                id: None,
                last_name,
                first_name,
                patronymic,
                dob,
                info,
                actions,
            })?;
            println!("Added wanted entry {id}.");
        }
        WantedCommand::Remove { id } => {
            if storage.remove_wanted(id)? {
                println!("Removed wanted entry {id}.");
            } else {
                println!("No wanted entry with id {id}.");
            }
        }
        WantedCommand::List { json } => {
            let entries = storage.wanted_entries()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("Wanted list ({} entries):", entries.len());
                for entry in entries {
                    println!(
                        "  #{:<5} {} {} {} born {}  {}",
                        entry.id.unwrap_or_default(),
                        entry.last_name,
                        entry.first_name,
                        entry.patronymic.as_deref().unwrap_or(""),
                        entry.dob,
                        entry.info.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_watch(config: &Config, cmd: WatchCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    use checkpoint::CrossingStore;
    match cmd {
        WatchCommand::Add {
            last_name,
            first_name,
            patronymic,
            dob,
            reason,
        } => {
            let id = storage.add_watch(&WatchEntry {
                id: None,
                last_name,
                first_name,
                patronymic,
                dob,
                reason,
            })?;
            println!("Added watch entry {id}.");
        }
        WatchCommand::Remove { id } => {
            if storage.remove_watch(id)? {
                println!("Removed watch entry {id}.");
            } else {
                println!("No watch entry with id {id}.");
            }
        }
        WatchCommand::List { json } => {
            let entries = storage.watch_entries()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("Watch list ({} entries):", entries.len());
                for entry in entries {
                    println!(
                        "  #{:<5} {} {} {} born {}  {}",
                        entry.id.unwrap_or_default(),
                        entry.last_name,
                        entry.first_name,
                        entry.patronymic.as_deref().unwrap_or(""),
                        entry.dob,
                        entry.reason.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:    {}", config.database_path().display());
                println!();
                println!("[Entry]");
                println!("  Operator:         {}", config.entry.operator);
                println!("  Filter debounce:  {} ms", config.entry.filter_debounce_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
