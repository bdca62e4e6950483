mod entries;
mod settings;
