use crate::cli::commands::{ConfigAction, ConfigCmd};
use crate::io::config_io;
use crate::io::lock::WriteLock;

use super::Context;

pub(super) fn cmd_config(ctx: &Context, args: ConfigCmd) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.workspace.config_path();
    match args.action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Get(get) => {
            let (_, doc) = config_io::read_config(&path)?;
            println!("{}", config_io::get_value(&doc, &get.key)?);
        }
        ConfigAction::Set(set) => {
            let _lock = WriteLock::acquire_default(&ctx.workspace.data_dir)?;
            let (_, mut doc) = config_io::read_config(&path)?;
            // Validates the whole document before anything is written
            config_io::set_value(&mut doc, &set.key, &set.value)?;
            config_io::write_config(&path, &doc)?;
            println!("{} = {}", set.key, set.value);
        }
    }
    Ok(())
}
