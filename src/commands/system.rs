use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Result;
use clap::Args;

use snapdbx::{
    catalog::CatalogStore,
    config::load_or_default,
    store::{ReviewSnapshot, SeriesStore},
};

pub fn status(config_path: Option<PathBuf>) -> Result<()> {
    let (config, path) = load_or_default(config_path)?;
    let store: SeriesStore<ReviewSnapshot> = SeriesStore::open(config.series_store_path(), false)?;
    let catalog = CatalogStore::load(config.catalog_path())?;

    println!("config: {}", path.display());
    println!("data dir: {}", config.data_dir.display());
    println!("series buckets: {}", store.bucket_count()?);
    println!("catalog entries: {}", catalog.list().len());

    Ok(())
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Skip the interactive confirmation prompt
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

pub fn destroy(config_path: Option<PathBuf>, args: DestroyArgs) -> Result<()> {
    let (config, path) = load_or_default(config_path)?;

    if !args.force {
        eprint!(
            "This will permanently delete all snapdbx data under {} and remove the config file at {}.\nType \"destroy\" to continue: ",
            config.data_dir.display(),
            path.display()
        );
        io::stderr().flush()?;
        let mut confirmation = String::new();
        io::stdin().read_line(&mut confirmation)?;
        if confirmation.trim() != "destroy" {
            println!("Destroy command cancelled.");
            return Ok(());
        }
    }

    if config.data_dir.exists() {
        fs::remove_dir_all(&config.data_dir)?;
    }

    if path.exists() {
        fs::remove_file(&path)?;
    }

    println!(
        "All snapdbx data and configuration removed from {}",
        config.data_dir.display()
    );
    Ok(())
}
