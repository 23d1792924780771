use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_TENANTS_FILE: &str = "inquilinos.txt";
pub const DEFAULT_PARKING_SPOTS_FILE: &str = "cocheras.txt";
pub const DEFAULT_PAYMENTS_FILE: &str = "pagos.txt";
pub const DEFAULT_RESERVATIONS_FILE: &str = "reservas.txt";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CONDO_DATA_DIR";
/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "CONDO_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Store file names, overridable from the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreFiles {
    pub tenants: String,
    pub parking_spots: String,
    pub payments: String,
    pub reservations: String,
}

impl Default for StoreFiles {
    fn default() -> Self {
        Self {
            tenants: DEFAULT_TENANTS_FILE.to_string(),
            parking_spots: DEFAULT_PARKING_SPOTS_FILE.to_string(),
            payments: DEFAULT_PAYMENTS_FILE.to_string(),
            reservations: DEFAULT_RESERVATIONS_FILE.to_string(),
        }
    }
}

/// Contents of the optional YAML config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the store files
    pub data_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub files: StoreFiles,
}

impl Config {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config if the file exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Resolved locations of the four store files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub tenants: PathBuf,
    pub parking_spots: PathBuf,
    pub payments: PathBuf,
    pub reservations: PathBuf,
}

impl DataPaths {
    /// Default file names inside `dir`
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_files(dir, &StoreFiles::default())
    }

    pub fn with_files<P: AsRef<Path>>(dir: P, files: &StoreFiles) -> Self {
        let dir = dir.as_ref();
        Self {
            tenants: dir.join(&files.tenants),
            parking_spots: dir.join(&files.parking_spots),
            payments: dir.join(&files.payments),
            reservations: dir.join(&files.reservations),
        }
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|dir| dir.join("condo").join("config.yaml"))
}

/// Determines where the store files live
///
/// Priority: explicit directory, then `CONDO_DATA_DIR`, then `data_dir` from
/// the config file, then the current directory.
pub fn determine_data_paths(data_dir_option: Option<&Path>) -> Result<DataPaths, ConfigError> {
    let config = match get_config_path() {
        Some(path) => Config::load_or_default(path)?,
        None => Config::default(),
    };

    let data_dir = data_dir_option
        .map(Path::to_path_buf)
        .or_else(|| env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(DataPaths::with_files(data_dir, &config.files))
}
