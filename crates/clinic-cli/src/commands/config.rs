//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;
use tracing::info;

/// Execute the config command.
///
/// `path` is the file the configuration was loaded from; changes are saved
/// back to it.
pub fn execute_config(args: ConfigArgs, config: &mut Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            println!("{}", formatter.format_config(config)?);
        }
        ConfigAction::SetSearchLimit { limit } => {
            config.set_search_limit(limit)?;
            config.save(path)?;
            info!(limit, path = %path.display(), "Search limit updated");
            println!("{}", formatter.success(&format!("Search limit set to {}", limit)));
        }
    }
    Ok(())
}
