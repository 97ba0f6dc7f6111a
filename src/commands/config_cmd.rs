use clap::{Args, Subcommand};

use super::OutputFormat;
use tramcan_sync::config::{Config, ConfigSource, ConfigValue};

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

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
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

                        print_value(
                            "database_path",
                            &config.database_path.value.display(),
                            &config.database_path.source,
                        );
                        print_entry("port", &config.port);
                        print_entry("max_connections", &config.max_connections);
                    }
                }
                Ok(())
            }
        }
    }
}

fn print_entry<T: std::fmt::Display>(key: &str, entry: &ConfigValue<T>) {
    print_value(key, &entry.value, &entry.source);
}

fn print_value(key: &str, value: &dyn std::fmt::Display, source: &ConfigSource) {
    println!("{}: {}", key, value);
    println!("  source: {}", source);
    println!();
}
