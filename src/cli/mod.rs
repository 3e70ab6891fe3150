//! Command-line interface for the watchlist.

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::Genre;
use crate::models::SortOption;

/// anime-archive - a personal anime watch log
#[derive(Parser)]
#[command(name = "anime-archive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the AI proxy server
    Serve,

    /// Add an anime, filling missing details from MyAnimeList
    #[command(alias = "a")]
    Add {
        /// Title of the anime
        #[arg(required = true)]
        title: Vec<String>,

        #[command(flatten)]
        fields: RecordFields,
    },

    /// Add one anime per line from a file (or stdin)
    Bulk {
        /// File with one title per line; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// List the collection
    #[command(alias = "ls", alias = "l")]
    List {
        /// Match against title and notes
        #[arg(short, long)]
        search: Option<String>,

        /// Only show these genres (any of them)
        #[arg(short, long = "genre", value_parser = parse_genre)]
        genres: Vec<Genre>,

        /// date, title or rating
        #[arg(long, default_value = "date")]
        sort: SortOption,
    },

    /// Edit an existing record
    #[command(alias = "e")]
    Edit {
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: RecordFields,
    },

    /// Remove one or more records
    #[command(alias = "rm", alias = "r")]
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Mark a record as watched again today
    Rewatch { id: String },

    /// Write the collection as JSON
    Export {
        /// Output file; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the collection with a JSON export
    Import { file: PathBuf },

    /// Show collection statistics
    Stats,

    /// Manage custom lists
    Lists {
        #[command(subcommand)]
        command: ListCommands,
    },

    /// Ask the AI assistant
    Chat {
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// Identify the anime in an image
    Identify {
        image: PathBuf,

        /// Add the identified title to the collection
        #[arg(long)]
        add: bool,
    },

    /// Create default config file
    Init,
}

/// Optional record fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct RecordFields {
    /// Release year
    #[arg(long)]
    pub year: Option<i32>,

    /// Genre (Japanese label or English name); repeatable
    #[arg(short, long = "genre", value_parser = parse_genre)]
    pub genres: Vec<Genre>,

    /// Personal rating, 0-5
    #[arg(short, long)]
    pub rating: Option<u8>,

    #[arg(short, long)]
    pub notes: Option<String>,

    /// Cover image URL
    #[arg(long)]
    pub image: Option<String>,

    /// Watched date, YYYY-MM-DD (defaults to today for new records)
    #[arg(short, long)]
    pub date: Option<String>,
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// Show all custom lists
    #[command(alias = "list")]
    Ls,
    /// Create a list
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a list (its records stay in the collection)
    #[command(alias = "rm")]
    Delete { list_id: String },
    /// Rename a list or change its description
    Update {
        list_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
    },
    /// Add a record to a list
    Add { list_id: String, anime_id: String },
    /// Remove a record from a list
    Remove { list_id: String, anime_id: String },
    /// Show the records in a list
    Show { list_id: String },
}

fn parse_genre(input: &str) -> Result<Genre, String> {
    Genre::parse(input).ok_or_else(|| {
        let known: Vec<&str> = Genre::ALL.iter().map(|g| g.label()).collect();
        format!("unknown genre '{input}' (expected one of: {})", known.join(", "))
    })
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_with_fields() {
        let cli = Cli::try_parse_from([
            "anime-archive",
            "add",
            "Sword",
            "Art",
            "Online",
            "--year",
            "2012",
            "-g",
            "アクション",
            "-g",
            "romance",
            "-r",
            "4",
        ])
        .unwrap();

        let Some(Commands::Add { title, fields }) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(title.join(" "), "Sword Art Online");
        assert_eq!(fields.year, Some(2012));
        assert_eq!(fields.genres, vec![Genre::Action, Genre::Romance]);
        assert_eq!(fields.rating, Some(4));
    }

    #[test]
    fn test_parse_list_sort() {
        let cli = Cli::try_parse_from(["anime-archive", "ls", "--sort", "rating"]).unwrap();
        let Some(Commands::List { sort, .. }) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(sort, SortOption::PersonalRatingDesc);
    }

    #[test]
    fn test_unknown_genre_is_rejected() {
        assert!(Cli::try_parse_from(["anime-archive", "list", "-g", "isekai"]).is_err());
    }
}
