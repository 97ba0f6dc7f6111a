mod changes;
mod config_cmd;
mod record;

pub use changes::ChangesCommand;
pub use config_cmd::ConfigCommand;
pub use record::{DeleteCommand, ShowCommand, ShowPlateCommand};

use clap::ValueEnum;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
