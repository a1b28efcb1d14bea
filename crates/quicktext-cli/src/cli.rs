use clap::{Parser, Subcommand};
use quicktext_core::Mode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "quicktext - A keyword to phrase text expander",
    long_about = "quicktext watches your typing and replaces short keywords with saved phrases, \
either when you press Ctrl+Space or as soon as the keyword is followed by a delimiter."
)]
pub struct Quicktext {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Add a new shortcut
    Add {
        #[clap(long, short = 'k', help = "Keyword to type")]
        keyword: String,

        #[clap(long, short = 'p', help = "Phrase the keyword expands to")]
        phrase: String,

        #[clap(long, short = 'c', default_value = "General", help = "Category")]
        category: String,
    },
    /// Edit an existing shortcut
    Edit {
        #[clap(long, short = 'k', help = "Keyword of the shortcut to edit")]
        keyword: String,

        #[clap(long, help = "Rename the keyword")]
        new_keyword: Option<String>,

        #[clap(long, short = 'p', help = "New phrase")]
        phrase: Option<String>,

        #[clap(long, short = 'c', help = "New category")]
        category: Option<String>,
    },
    /// Delete a shortcut by keyword
    Delete {
        #[clap(long, short = 'k', help = "Keyword of the shortcut to delete")]
        keyword: String,
    },
    /// List shortcuts, optionally filtered
    List {
        #[clap(long, short = 's', help = "Match keyword or phrase")]
        search: Option<String>,

        #[clap(long, short = 'c', help = "Only this category")]
        category: Option<String>,
    },
    /// List all categories
    Categories,
    /// Show usage statistics
    Stats {
        #[clap(long, short = 'n', default_value = "10", help = "Number of top shortcuts")]
        top: usize,
    },
    /// Export all shortcuts to a JSON file
    Export { file: PathBuf },
    /// Import shortcuts from a JSON file
    Import { file: PathBuf },
    /// Show the expansion mode, or set it while the daemon is stopped
    Mode {
        #[clap(value_parser = parse_mode, help = "hotkey or auto")]
        mode: Option<Mode>,
    },
    /// Start the background daemon
    Start {
        #[clap(long, short = 'm', value_parser = parse_mode, help = "hotkey or auto")]
        mode: Option<Mode>,
    },
    /// Stop the background daemon
    Stop,
    /// Check the status of the daemon
    Status,
    /// Monitor the keyboard in this terminal until interrupted
    Run {
        #[clap(long, short = 'm', value_parser = parse_mode, help = "hotkey or auto")]
        mode: Option<Mode>,
    },
    // Hidden command used internally to run the daemon worker
    #[clap(hide = true)]
    DaemonWorker,
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value.parse().map_err(|e: quicktext_core::QuickTextError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Commands {
        Quicktext::try_parse_from(std::iter::once("quicktext").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn add_defaults_category() {
        assert_eq!(
            parse(&["add", "-k", "brb", "-p", "Be right back"]),
            Commands::Add {
                keyword: "brb".to_string(),
                phrase: "Be right back".to_string(),
                category: "General".to_string(),
            }
        );
    }

    #[test]
    fn edit_fields_are_optional() {
        assert_eq!(
            parse(&["edit", "-k", "brb", "--new-keyword", "brb2"]),
            Commands::Edit {
                keyword: "brb".to_string(),
                new_keyword: Some("brb2".to_string()),
                phrase: None,
                category: None,
            }
        );
    }

    #[test]
    fn mode_accepts_both_spellings() {
        assert_eq!(
            parse(&["mode", "auto-expand"]),
            Commands::Mode {
                mode: Some(Mode::AutoExpand)
            }
        );
        assert_eq!(parse(&["mode"]), Commands::Mode { mode: None });
        assert_eq!(
            parse(&["start", "--mode", "hotkey"]),
            Commands::Start {
                mode: Some(Mode::Hotkey)
            }
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Quicktext::try_parse_from(["quicktext", "run", "--mode", "turbo"]).is_err());
    }

    #[test]
    fn stats_top_defaults_to_ten() {
        assert_eq!(parse(&["stats"]), Commands::Stats { top: 10 });
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Quicktext::try_parse_from(["quicktext"]).is_err());
    }
}
