mod app;
mod cli;
mod commands;
mod paths;
mod user;

use std::fs;
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use datagrid_lib::DataGrid;
use datagrid_lib::config::TableConfig;
use datagrid_lib::fetch::HttpDataSource;
use datagrid_lib::sizing::SizingStore;
use datagrid_lib::storage::MemoryBackend;
use datagrid_lib::storage::SqliteBackend;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::WriteLogger;
use url::Url;

use crate::cli::Cli;
use crate::user::User;
use crate::user::user_columns;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.into());

    let config = load_config(&cli)?;
    let location = Url::parse(&cli.location).with_context(|| format!("invalid location '{}'", cli.location))?;
    let source = HttpDataSource::<User>::builder()
        .endpoint(&cli.endpoint)?
        .timeout(Duration::from_secs(cli.timeout))
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let sizing_store = open_settings(cli.in_memory).await;

    log::info!("browsing {} as '{}'", cli.endpoint, config.column_resizing_table_id);

    let columns = user_columns(config.enable_row_selection);
    let (grid, completions) = DataGrid::new(config, columns, Arc::new(source), sizing_store, location);
    app::run(grid, completions).await
}

/// Logs go to `latest.log` in the cache dir; stdout belongs to the table.
fn init_logging(level: LevelFilter) {
    paths::rotate_logs();
    let Some(path) = paths::log_file() else {
        return;
    };
    if let Err(e) = paths::ensure_parent(&path) {
        eprintln!("warning: cannot create log directory for {}: {}", path.display(), e);
    }
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) = WriteLogger::init(level, Config::default(), file) {
                eprintln!("warning: logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("warning: cannot create {}: {}", path.display(), e),
    }
}

/// Defaults for the users table, overlaid with the config file if given.
fn load_config(cli: &Cli) -> Result<TableConfig> {
    let mut merged = serde_json::to_value(TableConfig::default().with_entity_name("users").with_table_id("users"))?;

    if let Some(path) = &cli.config {
        let raw = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
        let overrides: serde_json::Value =
            serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))?;
        match (merged.as_object_mut(), overrides) {
            (Some(base), serde_json::Value::Object(overrides)) => base.extend(overrides),
            _ => bail!("{} must contain a JSON object", path.display()),
        }
    }

    let mut config = TableConfig::from_json(&merged.to_string())?;
    if let Some(table_id) = &cli.table_id {
        config = config.with_table_id(table_id.clone());
        config.validate()?;
    }
    Ok(config)
}

/// Opens the settings database, or falls back to memory.
async fn open_settings(in_memory: bool) -> SizingStore {
    if in_memory {
        return SizingStore::new(MemoryBackend::new());
    }
    let Some(path) = paths::settings_db() else {
        log::warn!("no data directory, column widths will not be saved");
        return SizingStore::new(MemoryBackend::new());
    };
    if let Err(e) = paths::ensure_parent(&path) {
        log::warn!("cannot create settings directory for {}: {}", path.display(), e);
    }
    match SqliteBackend::open(&path).await {
        Ok(backend) => SizingStore::new(backend),
        Err(e) => {
            log::warn!("settings database {} unavailable: {}", path.display(), e);
            SizingStore::new(MemoryBackend::new())
        }
    }
}
