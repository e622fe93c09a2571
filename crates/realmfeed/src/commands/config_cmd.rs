//! Config subcommand handlers.

use realmfeed_config::{self as config, Config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::config_file;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_file(global);

    match args.command {
        ConfigCommand::Show { toml } => {
            let cfg =
                config::load_config_from(&path).map_err(|e| CliError::from_config(e, &path))?;
            let rendered = if toml {
                toml::to_string_pretty(&cfg)?
            } else {
                output::render_config(&cfg)
            };
            output::print_output(&rendered, global.quiet);
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&Config::default(), &path)
                .map_err(|e| CliError::from_config(e, &path))?;
            tracing::info!(path = %path.display(), "wrote default configuration");
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}
