//! # JSON Config Store
//!
//! Keeps the node configuration in memory and writes it back to
//! `<workingdir>/config.json` on request. A default config file, when given,
//! seeds the configuration only if no config file exists yet.

use dl_04_domain_registry::DomainConfig;
use parking_lot::RwLock;
use shared_types::DomainId;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::{ConfigError, CoreConfig};
use crate::ports::ConfigStore;

pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug)]
pub struct JsonConfigStore {
    path: PathBuf,
    config: RwLock<CoreConfig>,
}

impl JsonConfigStore {
    /// Load (or initialise) the configuration of `workingdir`.
    ///
    /// A relative `config_file` is resolved against `workingdir`.
    pub fn load(
        workingdir: &Path,
        config_file: Option<&Path>,
        default_config: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        fs::create_dir_all(workingdir).map_err(|source| ConfigError::Write {
            path: workingdir.to_path_buf(),
            source,
        })?;

        let path = match config_file {
            Some(file) if file.is_absolute() => file.to_path_buf(),
            Some(file) => workingdir.join(file),
            None => workingdir.join(CONFIG_FILE_NAME),
        };

        let config = if path.exists() {
            read_config(&path)?
        } else if let Some(default) = default_config {
            info!(default = %default.display(), "Seeding configuration from default file");
            read_config(default)?
        } else {
            CoreConfig::default()
        };

        debug!(path = %path.display(), domains = config.domains.len(), "Configuration loaded");
        Ok(Self::new(path, config))
    }

    pub fn new(path: PathBuf, config: CoreConfig) -> Self {
        Self {
            path,
            config: RwLock::new(config),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn update_client(&self, update: impl FnOnce(&mut crate::domain::ClientConfig)) {
        update(&mut self.config.write().client);
    }
}

fn read_config(path: &Path) -> Result<CoreConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ConfigStore for JsonConfigStore {
    fn get_config(&self) -> CoreConfig {
        self.config.read().clone()
    }

    fn set_domain(&self, domain_id: &DomainId, config: DomainConfig) {
        self.config.write().set_domain(domain_id, config);
    }

    fn remove_domain(&self, domain_id: &DomainId) {
        self.config.write().remove_domain(domain_id);
    }

    fn update_config(&self) -> Result<(), ConfigError> {
        let encoded = serde_json::to_string_pretty(&*self.config.read())?;
        let tmp = self.path.with_extension("json.tmp");
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, encoded).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        debug!(path = %self.path.display(), "Configuration persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Identifier;

    #[test]
    fn test_fresh_workingdir_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::load(&dir.path().join("wd"), None, None).unwrap();
        assert_eq!(store.get_config(), CoreConfig::default());
        assert_eq!(store.path(), dir.path().join("wd").join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let domain_id = DomainId::new([4; 32]);
        {
            let store = JsonConfigStore::load(dir.path(), None, None).unwrap();
            store.set_domain(&domain_id, DomainConfig::default());
            store.update_config().unwrap();
        }
        let store = JsonConfigStore::load(dir.path(), None, None).unwrap();
        assert_eq!(store.domains().unwrap(), vec![(domain_id, DomainConfig::default())]);

        store.remove_domain(&domain_id);
        assert!(store.domains().unwrap().is_empty());
    }

    #[test]
    fn test_default_config_only_seeds_first_start() {
        let dir = tempfile::tempdir().unwrap();
        let default_path = dir.path().join("default.json");
        let seeded = format!(r#"{{"domains": {{"{}": {{}}}}}}"#, DomainId::new([7; 32]).to_hex());
        fs::write(&default_path, seeded).unwrap();

        let wd = dir.path().join("wd");
        let store = JsonConfigStore::load(&wd, None, Some(&default_path)).unwrap();
        assert_eq!(store.domains().unwrap().len(), 1);
        store.remove_domain(&DomainId::new([7; 32]));
        store.update_config().unwrap();

        let reloaded = JsonConfigStore::load(&wd, None, Some(&default_path)).unwrap();
        assert!(reloaded.domains().unwrap().is_empty());
    }

    #[test]
    fn test_broken_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ nope").unwrap();
        assert!(matches!(
            JsonConfigStore::load(dir.path(), None, None),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_json_config_text() {
        let store = JsonConfigStore::new(PathBuf::from("unused.json"), CoreConfig::default());
        let json: serde_json::Value = serde_json::from_str(&store.get_json_config().unwrap()).unwrap();
        assert_eq!(json["client"]["port"], 9000);
    }
}
