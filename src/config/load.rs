//! Load spherical optimizer configuration from YAML

use super::schema::SphereSpec;
use super::validate::validate_config;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parse and validate a YAML configuration string
pub fn parse_config(yaml: &str) -> Result<SphereSpec> {
    let spec: SphereSpec = serde_yaml::from_str(yaml)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {}", e)))?;

    validate_config(&spec).map_err(|e| Error::ConfigError(format!("Invalid config: {}", e)))?;

    Ok(spec)
}

/// Load and validate a YAML configuration file
///
/// # Example
///
/// ```no_run
/// use esfera::config::{build_spherical, load_config};
/// use esfera::Tensor;
///
/// let spec = load_config("sphere.yaml")?;
/// let latent = vec![Tensor::from_shape_vec(&[1, 18, 512], vec![0.1; 18 * 512], true)?];
/// let optimizer = build_spherical(&spec, &latent)?;
/// # Ok::<(), esfera::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SphereSpec> {
    let path = path.as_ref();
    let yaml = fs::read_to_string(path).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let spec = parse_config(&yaml)?;
    debug!(path = %path.display(), optimizer = %spec.optimizer.name, "loaded config");
    Ok(spec)
}

/// Serialize a config back to YAML
pub fn to_yaml(spec: &SphereSpec) -> Result<String> {
    serde_yaml::to_string(spec).map_err(|e| Error::Serialization(e.to_string()))
}
