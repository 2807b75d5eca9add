//! Launch sites declared in a YAML file.
//!
//! ```yaml
//! sites:
//!   - id: 5b0f1c3e-8d7a-4c55-9a57-2f1f4f0f2a11
//!     name: Brauneck
//!     latitude: 47.6633
//!     longitude: 11.5247
//!     elevation: 1555
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use storage::{SiteCatalog, StorageError};
use weather_common::{Site, SiteValidationError};

#[derive(Debug, Error)]
pub enum SitesFileError {
    #[error("Failed to read sites file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse sites file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid site '{name}': {source}")]
    Invalid {
        name: String,
        source: SiteValidationError,
    },

    #[error("Failed to register site: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    #[serde(default)]
    sites: Vec<Site>,
}

/// Parse and validate a sites document.
pub fn parse(yaml: &str) -> Result<Vec<Site>, SitesFileError> {
    let file: SitesFile = serde_yaml::from_str(yaml)?;
    for site in &file.sites {
        site.validate().map_err(|source| SitesFileError::Invalid {
            name: site.name.clone(),
            source,
        })?;
    }
    Ok(file.sites)
}

pub fn load(path: &Path) -> Result<Vec<Site>, SitesFileError> {
    let yaml = std::fs::read_to_string(path)?;
    parse(&yaml)
}

/// Load the file and upsert every site. Returns the number of sites.
pub async fn seed(catalog: &SiteCatalog, path: &Path) -> Result<usize, SitesFileError> {
    let sites = load(path)?;
    for site in &sites {
        catalog.upsert(site).await?;
    }
    info!(path = %path.display(), count = sites.len(), "Registered launch sites");
    Ok(sites.len())
}
