use config::{Binding, Config};
use failure::Error;
use std::path::{Path, PathBuf};
use tracker::{Registry, Spool};
use uplink::{Decoder, Schema};

/// The shared state for the JSON API.
///
/// The schema version is resolved when the state is built, so a config
/// naming an unregistered version fails at startup. The registry itself is
/// rebuilt from the spool per request, so the API always reflects what the
/// transport client has written so far.
#[derive(Clone, Debug)]
pub struct State {
    spool_root: PathBuf,
    schema: &'static Schema,
    binding: Binding,
}

impl State {
    /// Creates a state from the path to a TOML configuration file.
    ///
    /// # Examples
    ///
    /// ```
    /// use web::State;
    /// let state = State::from_path("fixtures/config.toml").unwrap();
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<State, Error> {
        State::new(Config::from_path(path)?)
    }

    fn new(config: Config) -> Result<State, Error> {
        let schema = match config.schema_version() {
            Some(version) => Schema::get(version)?,
            None => Schema::latest(),
        };
        Ok(State {
            spool_root: config.spool_root().to_path_buf(),
            schema: schema,
            binding: config.binding(),
        })
    }

    /// Builds a registry from the current contents of the spool.
    ///
    /// # Examples
    ///
    /// ```
    /// use web::State;
    /// let state = State::from_path("fixtures/config.toml").unwrap();
    /// let registry = state.registry().unwrap();
    /// assert!(registry.device("HEWGHP").is_some());
    /// ```
    pub fn registry(&self) -> Result<Registry, Error> {
        let spool = Spool::open(&self.spool_root)?;
        let decoder = Decoder::new(self.schema, self.binding.decompressor());
        Registry::from_spool(&spool, &decoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures() {
        let state = State::from_path("fixtures/config.toml").unwrap();
        let registry = state.registry().unwrap();
        assert_eq!(2, registry.devices().count());
    }
}
