//! # modbot-cli
//!
//! Argument parsing and the helpers behind each subcommand.

pub mod cli;

pub use cli::{describe_config, load_config, module_table, Cli, Commands};
