mod logging;

use dnswatch_domain::{CliOverrides, Config};

pub use logging::init_logging;

pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides)?;
    config.validate()?;
    Ok(config)
}

/// The file `load_config` read from, if any.
pub fn config_source(path: Option<&str>) -> Option<String> {
    path.map(str::to_string).or_else(Config::get_config_path)
}
