//! Reader presentation preferences, stored in the `settings` table.

use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Row id under which the single settings record is stored.
pub const USER_SETTINGS_ID: &str = "user";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Sepia,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Sepia => "sepia",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "sepia" => Ok(Theme::Sepia),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow!("unknown theme '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

impl FromStr for FontSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(FontSize::Small),
            "medium" => Ok(FontSize::Medium),
            "large" => Ok(FontSize::Large),
            other => Err(anyhow!("unknown font size '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Serif,
    Handwriting,
}

impl FontFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontFamily::Serif => "serif",
            FontFamily::Handwriting => "handwriting",
        }
    }
}

impl FromStr for FontFamily {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serif" => Ok(FontFamily::Serif),
            "handwriting" => Ok(FontFamily::Handwriting),
            other => Err(anyhow!("unknown font family '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: Theme,
    pub font_size: FontSize,
    pub font_family: FontFamily,
    pub enable_animations: bool,
    pub enable_ruled_lines: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            font_size: FontSize::Medium,
            font_family: FontFamily::Serif,
            enable_animations: true,
            enable_ruled_lines: false,
        }
    }
}
