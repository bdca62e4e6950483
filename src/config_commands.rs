//! `daybook config` handlers.

use anyhow::Result;

use crate::{cli::ConfigAction, AppState};

pub fn config(state: &AppState, action: Option<ConfigAction>, json: bool) -> Result<()> {
    if let Some(ConfigAction::Set {
        clock,
        write_retries,
    }) = action
    {
        let mut config = state.config.config();
        if let Some(clock) = clock {
            config.clock = clock;
        }
        if let Some(write_retries) = write_retries {
            config.write_retries = write_retries;
        }
        state.config.update(config)?;
    }

    let config = state.config.config();
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("config file:    {}", state.config.path().display());
        println!("database:       {}", state.db.path().display());
        println!("clock:          {}", config.clock.as_str());
        println!("write retries:  {}", config.write_retries);
    }
    Ok(())
}
