//! Configuration for the JSON API.
//!
//! # Examples
//!
//! Configs are usually specified in TOML files:
//!
//! ```
//! use web::Config;
//! let config = Config::from_path("fixtures/config.toml").unwrap();
//! ```

use failure::Error;
use std::path::{Path, PathBuf};
use uplink::{Passthrough, SampleDecompressor};

/// Configure the JSON API.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    spool_root: PathBuf,
    schema_version: Option<u8>,
    #[serde(default)]
    decompressor: Binding,
}

/// The decompressor binding to construct decoders with.
///
/// The production Rice codec is a native library chosen per deployment;
/// this build knows the passthrough binding used for test deployments and
/// fixtures. An unknown name in the config fails deserialization, so a
/// misconfigured deployment stops at startup rather than at decode time.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// Chunks are already decoded; see `uplink::Passthrough`.
    Passthrough,
}

impl Default for Binding {
    fn default() -> Binding {
        Binding::Passthrough
    }
}

impl Binding {
    /// Constructs the configured decompressor.
    pub fn decompressor(&self) -> Box<dyn SampleDecompressor> {
        match *self {
            Binding::Passthrough => Box::new(Passthrough),
        }
    }
}

impl Config {
    /// Reads configuration from a toml file.
    ///
    /// # Examples
    ///
    /// ```
    /// let config = web::Config::from_path("fixtures/config.toml").unwrap();
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        use std::fs::File;
        use std::io::Read;
        use toml;

        let mut file = File::open(path)?;
        let mut string = String::new();
        file.read_to_string(&mut string)?;
        toml::from_str(&string).map_err(Error::from)
    }

    /// Returns the spool root directory.
    pub fn spool_root(&self) -> &Path {
        &self.spool_root
    }

    /// Returns the configured protocol schema version, if pinned.
    pub fn schema_version(&self) -> Option<u8> {
        self.schema_version
    }

    /// Returns the configured decompressor binding.
    pub fn binding(&self) -> Binding {
        self.decompressor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures() {
        let config = Config::from_path("fixtures/config.toml").unwrap();
        assert_eq!(Some(2), config.schema_version());
        assert_eq!(Binding::Passthrough, config.binding());
    }

    #[test]
    fn missing_file() {
        assert!(Config::from_path("fixtures/nope.toml").is_err());
    }
}
