use crate::session::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BoundarySource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "parentAreaProperty")]
    pub parent_area_property: Option<String>,
    #[serde(rename = "parentAreaValue")]
    pub parent_area_value: Option<String>,
    #[serde(rename = "idProperty")]
    pub id_property: Option<String>,
    #[serde(rename = "nameProperty")]
    pub name_property: Option<String>,
}

impl BoundarySource {
    /// The catalog filter, with the GADM defaults for the missing attributes.
    pub fn filter(&self) -> BoundaryFilter {
        let default = BoundaryFilter::default();
        BoundaryFilter {
            parent_area_property: self
                .parent_area_property
                .clone()
                .unwrap_or(default.parent_area_property),
            parent_area_value: self
                .parent_area_value
                .clone()
                .unwrap_or(default.parent_area_value),
            id_property: self.id_property.clone().unwrap_or(default.id_property),
            name_property: self.name_property.clone().or(default.name_property),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationSetting {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "hasHeaders")]
    pub has_headers: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    pub question: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "boundarySource")]
    pub boundary_source: BoundarySource,
    #[serde(rename = "choiceDomain")]
    pub choice_domain: Option<String>,
    pub location: Option<LocationSetting>,
    #[serde(rename = "voteSources")]
    pub vote_sources: Option<Vec<VoteSource>>,
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
}

pub fn read_config(path: &str) -> SessionResult<SessionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SessionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}
