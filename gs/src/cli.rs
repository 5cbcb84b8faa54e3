// CLI argument parsing and definitions

use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "guildspace")]
#[command(about = "Create, archive, restore and delete project workspaces in a Discord guild")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Maximum concurrent resource creations (overrides CREATE_CONCURRENCY)
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Print the full workflow report as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a project: access role, banner, text channels and voice channel
    #[command(alias = "newproject")]
    Create {
        /// Project name; several words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Move a project to the archive category and drop its role and voice channel
    Archive {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Bring an archived project back under a new role
    Unarchive {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Remove every channel and the role of a project
    Delete {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

impl Command {
    /// The project's display name as typed.
    pub fn display_name(&self) -> String {
        let words = match self {
            Command::Create { name }
            | Command::Archive { name }
            | Command::Unarchive { name }
            | Command::Delete { name } => name,
        };
        words.join(" ")
    }
}
