use crate::cli::Commands;
use quicktext_core::{
    is_daemon_running, Mode, QuickTextError, Result, Settings, ShortcutEntry, ShortcutStore,
};
use quicktext_daemon::process::verify_process_running;
use quicktext_daemon::{
    daemon_status, daemon_worker_entry, run_foreground, start_daemon, stop_daemon,
};
use std::path::Path;

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            keyword,
            phrase,
            category,
        } => {
            let mut store = ShortcutStore::open_default()?;
            let entry = store.add(&keyword, &phrase, &category)?;
            println!("Shortcut '{}' added to {}", entry.keyword, entry.category);
            Ok(())
        }
        Commands::Edit {
            keyword,
            new_keyword,
            phrase,
            category,
        } => {
            if new_keyword.is_none() && phrase.is_none() && category.is_none() {
                return Err(QuickTextError::Other(
                    "Nothing to change. Pass --new-keyword, --phrase or --category".to_string(),
                ));
            }
            let mut store = ShortcutStore::open_default()?;
            store.update(
                &keyword,
                new_keyword.as_deref(),
                phrase.as_deref(),
                category.as_deref(),
            )?;
            println!("Shortcut updated successfully");
            Ok(())
        }
        Commands::Delete { keyword } => {
            let mut store = ShortcutStore::open_default()?;
            store.delete(&keyword)?;
            println!("Shortcut deleted successfully");
            Ok(())
        }
        Commands::List { search, category } => {
            let store = ShortcutStore::open_default()?;
            let entries = store.search(search.as_deref().unwrap_or(""), category.as_deref());
            print_entries(&entries);
            Ok(())
        }
        Commands::Categories => {
            let store = ShortcutStore::open_default()?;
            for category in store.categories() {
                println!("{}", category);
            }
            Ok(())
        }
        Commands::Stats { top } => {
            let store = ShortcutStore::open_default()?;
            let stats = store.statistics(top);
            println!("Total shortcuts:   {}", stats.total_shortcuts);
            println!("Total expansions:  {}", stats.total_expansions);
            if !stats.top.is_empty() {
                println!();
                println!("Most used:");
                for entry in &stats.top {
                    println!("  {:<16} {}", entry.keyword, entry.usage_count);
                }
            }
            Ok(())
        }
        Commands::Export { file } => {
            let store = ShortcutStore::open_default()?;
            store.export(&file)?;
            println!("Exported {} shortcuts to {}", store.all().len(), file.display());
            Ok(())
        }
        Commands::Import { file } => handle_import(&file),
        Commands::Mode { mode } => handle_mode(mode),
        Commands::Start { mode } => start_daemon(mode),
        Commands::Stop => stop_daemon(),
        Commands::Status => daemon_status(),
        Commands::Run { mode } => run_foreground(mode),
        Commands::DaemonWorker => daemon_worker_entry(),
    }
}

fn handle_import(file: &Path) -> Result<()> {
    let mut store = ShortcutStore::open_default()?;
    let imported = store.import(file)?;
    println!("Imported {} shortcuts from {}", imported, file.display());
    if daemon_is_live()? {
        println!("The running daemon will pick up the changes within a second.");
    }
    Ok(())
}

fn handle_mode(mode: Option<Mode>) -> Result<()> {
    let mut settings = Settings::load()?;
    let Some(mode) = mode else {
        println!("Current mode: {}", settings.mode.describe());
        return Ok(());
    };

    if daemon_is_live()? {
        return Err(QuickTextError::MonitorRunning);
    }
    settings.mode = mode;
    settings.save()?;
    println!("Mode set to {}", mode.describe());
    Ok(())
}

fn daemon_is_live() -> Result<bool> {
    Ok(is_daemon_running()?.map_or(false, verify_process_running))
}

fn print_entries(entries: &[&ShortcutEntry]) {
    if entries.is_empty() {
        println!("No shortcuts found.");
        return;
    }

    let width = entries
        .iter()
        .map(|entry| entry.keyword.chars().count())
        .max()
        .unwrap_or(0)
        .max("KEYWORD".len());
    println!("{:<width$}  {:<12}  {:>5}  PHRASE", "KEYWORD", "CATEGORY", "USES");
    for entry in entries {
        println!(
            "{:<width$}  {:<12}  {:>5}  {}",
            entry.keyword,
            entry.category,
            entry.usage_count,
            entry.phrase.replace('\n', "\\n"),
        );
    }
}
