use std::{path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail};
use clap::{Args, Parser, Subcommand};

use crate::{
    db::models::{FontFamily, FontSize, Theme},
    navigation::{ClockMode, EntryDate},
};

/// daybook - a five-minute journal: three gratitudes in the morning, three
/// good things at night.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the journal database and config (default: ~/.daybook)
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the entry for a day (today when no date is given)
    Show {
        /// Day to open, YYYY-MM-DD
        date: Option<EntryDate>,
    },

    /// Jump back to today
    Today,

    /// Go to the day before DATE (default: today)
    Prev { date: Option<EntryDate> },

    /// Go to the day after DATE; never past today
    Next { date: Option<EntryDate> },

    /// Write the morning reflection
    Morning(MorningArgs),

    /// Write the evening reflection
    Evening(EveningArgs),

    /// List every journaled day with its completion status
    History,

    /// Reader preferences stored with the journal
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Application config (config.json in the data directory)
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, Args)]
pub struct MorningArgs {
    /// Day to edit (default: today)
    pub date: Option<EntryDate>,

    /// Gratitude slot, e.g. --gratitude 1="morning coffee"
    #[arg(long = "gratitude", value_name = "N=TEXT")]
    pub gratitude: Vec<SlotEdit>,

    /// What would make today great?
    #[arg(long)]
    pub great_day: Option<String>,

    /// Daily affirmation
    #[arg(long)]
    pub affirmation: Option<String>,
}

#[derive(Debug, Args)]
pub struct EveningArgs {
    /// Day to edit (default: today)
    pub date: Option<EntryDate>,

    /// Amazing thing that happened, e.g. --amazing 2="lunch outside"
    #[arg(long = "amazing", value_name = "N=TEXT")]
    pub amazing: Vec<SlotEdit>,

    /// How could today have been better?
    #[arg(long)]
    pub improvements: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        font_size: Option<FontSize>,
        #[arg(long)]
        font_family: Option<FontFamily>,
        #[arg(long)]
        animations: Option<bool>,
        #[arg(long)]
        ruled_lines: Option<bool>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    Show,
    Set {
        /// Which calendar decides "today": local or utc
        #[arg(long)]
        clock: Option<ClockMode>,
        /// Extra attempts for a failed durable write
        #[arg(long)]
        write_retries: Option<u32>,
    },
}

/// One edit to a numbered list slot, written `N=TEXT` with N in 1..=3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEdit {
    /// Zero-based.
    pub index: usize,
    pub text: String,
}

impl FromStr for SlotEdit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (slot, text) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected N=TEXT, got '{s}'"))?;
        let slot: usize = slot
            .trim()
            .parse()
            .map_err(|_| anyhow!("slot '{slot}' is not a number"))?;
        if !(1..=3).contains(&slot) {
            bail!("slot must be 1, 2 or 3, got {slot}");
        }
        Ok(Self {
            index: slot - 1,
            text: text.to_string(),
        })
    }
}
