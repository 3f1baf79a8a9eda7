use clap::{Args, Subcommand};

use super::OutputFormat;
use crate::config::{Config, ConfigValue};

const MASK: &str = "********";

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn masked(value: &ConfigValue<Option<String>>) -> ConfigValue<Option<String>> {
    ConfigValue::new(
        value.value.as_ref().map(|_| MASK.to_string()),
        value.source.clone(),
    )
}

fn print_value(name: &str, value: &str, source: &impl std::fmt::Display) {
    println!("{}: {}", name, value);
    println!("  source: {}", source);
    println!();
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                let config = Config {
                    api_key: masked(&config.api_key),
                    secret: masked(&config.secret),
                    ..config.clone()
                };

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        let unset = "(not set)".to_string();
                        print_value("server_url", &config.server_url.value, &config.server_url.source);
                        print_value(
                            "api_key",
                            config.api_key.value.as_ref().unwrap_or(&unset),
                            &config.api_key.source,
                        );
                        print_value("username", &config.username.value, &config.username.source);
                        print_value(
                            "secret",
                            config.secret.value.as_ref().unwrap_or(&unset),
                            &config.secret.source,
                        );
                        print_value(
                            "probe_timeout_ms",
                            &config.probe_timeout_ms.value.to_string(),
                            &config.probe_timeout_ms.source,
                        );
                    }
                }
                Ok(())
            }
        }
    }
}
