use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use snapdbx::config::{load_or_default, ConfigUpdate};

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(long)]
    pub catalog_url: Option<String>,
}

pub fn execute(config_path: Option<PathBuf>, args: ConfigArgs) -> Result<()> {
    let (mut config, path) = load_or_default(config_path)?;

    let ConfigArgs {
        data_dir,
        catalog_url,
    } = args;

    if data_dir.is_none() && catalog_url.is_none() {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    config.apply_update(ConfigUpdate {
        data_dir,
        catalog_url,
    });
    config.ensure_data_dir()?;
    config.save(&path)?;
    println!("configuration updated at {}", path.display());

    Ok(())
}
