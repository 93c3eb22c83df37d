use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Subcommand;

use snapdbx::{
    catalog::CatalogStore,
    config::{load_or_default, Config},
    remote::HttpCatalog,
};

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Load the catalog, fetching from the remote source when the local copy is empty
    Sync,
    /// List cached catalog entries
    List,
    /// Refresh one entry's details from the remote source and persist
    Refresh {
        /// Entry name to refresh
        name: String,
    },
}

pub async fn execute(config_path: Option<PathBuf>, command: CatalogCommands) -> Result<()> {
    let (config, _) = load_or_default(config_path)?;
    let store = CatalogStore::load(config.catalog_path())?;

    match command {
        CatalogCommands::Sync => {
            let remote = remote_source(&config)?;
            let entries = store.load_all(&remote).await?;
            println!("catalog holds {} entries", entries.len());
        }
        CatalogCommands::List => {
            let entries = store.list();
            for entry in &entries {
                match entry.app_id {
                    Some(app_id) => println!("{}\t{}", entry.name, app_id),
                    None => println!("{}\t-", entry.name),
                }
            }
            if entries.is_empty() {
                eprintln!("catalog is empty; run `sdbx catalog sync` first");
            }
        }
        CatalogCommands::Refresh { name } => {
            let remote = remote_source(&config)?;
            let entry = store.update_details(&name, &remote).await?;
            store.persist_all()?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
    }

    Ok(())
}

fn remote_source(config: &Config) -> Result<HttpCatalog> {
    let url = config.catalog_url.as_deref().ok_or_else(|| {
        anyhow!("catalog_url is not configured; set it with `sdbx config --catalog-url <URL>`")
    })?;
    Ok(HttpCatalog::new(url))
}
