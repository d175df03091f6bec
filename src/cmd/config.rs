//! Configuration view and setup commands: `office-dash config`.

use anyhow::{Context, Result, bail};

use office_dash::config::{CliOverrides, DashboardConfig, DashboardToml};

use super::super::ConfigCommands;

pub fn cmd_config(command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None => show(CliOverrides::default()),
        Some(ConfigCommands::Show { page_url, config }) => show(CliOverrides {
            page_url,
            config_path: config,
            ..Default::default()
        }),
        Some(ConfigCommands::Init { path, force }) => {
            let Some(path) = path.or_else(DashboardToml::default_path) else {
                bail!("No config directory on this platform; pass --path");
            };
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let content = toml::to_string_pretty(&DashboardToml::default())
                .context("Failed to serialize default config")?;
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn show(overrides: CliOverrides) -> Result<()> {
    let config = DashboardConfig::resolve(&overrides).context("Failed to load configuration")?;

    println!("# office-dash configuration");
    match &config.source {
        Some(path) => println!("# config file: {}", path.display()),
        None => println!("# config file: (none, using defaults)"),
    }
    println!();
    print!(
        "{}",
        config.to_toml().context("Failed to serialize configuration")?
    );
    Ok(())
}
