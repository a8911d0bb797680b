//! `cognitor config` — Print the default configuration.

use cognitor_config::AppConfig;

pub fn run() {
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    println!("{}", AppConfig::default_toml());
}
