use std::fs;

use directories::ProjectDirs;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default target regions, used when `--regions` is not given.
    pub target_regions: Option<Vec<String>>,
    /// Max values per OR-clause in one catalog request.
    pub batch_size: Option<usize>,
}

pub fn load_config() -> Config {
    let Some(dirs) = ProjectDirs::from("", "", "pricemap") else {
        return Config::default();
    };

    let path = dirs.config_dir().join("config.toml");
    let Ok(data) = fs::read_to_string(&path) else {
        return Config::default();
    };

    match toml::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: invalid config at {}: {}", path.display(), e);
            Config::default()
        }
    }
}
