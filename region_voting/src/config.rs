// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use geo::{MultiPolygon, Point};

/// A position as reported by a geolocation provider, in decimal degrees.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// The point geometry for this coordinate.
    ///
    /// Geometries are always built as (x = longitude, y = latitude), which is
    /// the axis order of GeoJSON boundary files. This is the only place where
    /// the conversion happens.
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// The identifier of a region, as found in the boundary file.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> RegionId {
        RegionId(s.to_string())
    }
}

/// A votable area. Immutable once loaded into a catalog.
#[derive(PartialEq, Debug, Clone)]
pub struct Region {
    pub id: RegionId,
    pub name: Option<String>,
    pub parent_area: String,
    pub geometry: MultiPolygon<f64>,
}

/// Who cast a vote.
///
/// This is a placeholder: it is never used to deduplicate votes. Raw tags (for
/// example IP addresses) are hashed before they are stored.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum VoterTag {
    Unknown,
    Hashed(String),
}

impl VoterTag {
    pub fn from_raw(raw: &str) -> VoterTag {
        let tag = raw.trim();
        if tag.is_empty() || tag == "N/A" || tag.eq_ignore_ascii_case("unknown") {
            VoterTag::Unknown
        } else {
            VoterTag::Hashed(sha256::digest(tag))
        }
    }
}

impl Display for VoterTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoterTag::Unknown => write!(f, "N/A"),
            VoterTag::Hashed(digest) => write!(f, "{}", digest),
        }
    }
}

/// One accepted vote. Events are appended once and never changed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteEvent<C> {
    pub region_id: RegionId,
    pub choice: C,
    pub voter: VoterTag,
}

// ******** Output data structures *********

/// The votes of one region, derived from the ledger.
#[derive(PartialEq, Debug, Clone)]
pub struct RegionSummary {
    pub region_id: RegionId,
    /// Count per choice label, in the order of the choice domain.
    /// All the choices are present, including those with no vote.
    pub counts: Vec<(String, u64)>,
    pub total: u64,
    /// Mean of the scored choices. Only available for domains that score
    /// their choices, and 0.0 when the region has no vote.
    pub average: Option<f64>,
}

impl RegionSummary {
    pub fn count(&self, label: &str) -> u64 {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

/// Summaries for every region of a catalog.
pub type Summary = BTreeMap<RegionId, RegionSummary>;

/// The fill class of a region on the choropleth map.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ColorClass {
    Neutral,
    YesMajority,
    NoMajority,
    Warning,
    Safe,
}

impl ColorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorClass::Neutral => "neutral",
            ColorClass::YesMajority => "yesMajority",
            ColorClass::NoMajority => "noMajority",
            ColorClass::Warning => "warning",
            ColorClass::Safe => "safe",
        }
    }
}

impl Display for ColorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that prevent a catalog from loading or a vote from being recorded.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RegionVotingError {
    /// The boundary source is missing or malformed. Fatal at startup.
    CatalogLoadFailure(String),
    /// Attribution was requested on a catalog without any region.
    NoRegionsLoaded,
    /// The choice is not part of the active choice domain.
    InvalidChoice(String),
    /// No coordinate is available for the voter.
    LocationUnavailable,
}

impl Error for RegionVotingError {}

impl Display for RegionVotingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionVotingError::CatalogLoadFailure(reason) => {
                write!(f, "Could not load the region catalog: {}", reason)
            }
            RegionVotingError::NoRegionsLoaded => {
                write!(f, "No region is loaded: the vote cannot be attributed")
            }
            RegionVotingError::InvalidChoice(choice) => {
                write!(f, "Invalid choice: {:?}", choice)
            }
            RegionVotingError::LocationUnavailable => {
                write!(f, "Your location is not available")
            }
        }
    }
}

// ********* Configuration **********

/// Which features of a boundary file make up the catalog, and which
/// attributes carry the identifier and the name.
///
/// The defaults follow the GADM level 3 layout, restricted to Attica.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BoundaryFilter {
    pub parent_area_property: String,
    pub parent_area_value: String,
    pub id_property: String,
    pub name_property: Option<String>,
}

impl BoundaryFilter {
    pub const DEFAULT_PARENT_AREA_PROPERTY: &'static str = "NAME_1";
    pub const DEFAULT_PARENT_AREA_VALUE: &'static str = "Attica";
    pub const DEFAULT_ID_PROPERTY: &'static str = "GID_3";
    pub const DEFAULT_NAME_PROPERTY: &'static str = "NAME_3";

    /// The default attribute layout, for another parent area.
    pub fn for_parent_area(parent_area_value: &str) -> BoundaryFilter {
        BoundaryFilter {
            parent_area_value: parent_area_value.to_string(),
            ..BoundaryFilter::default()
        }
    }
}

impl Default for BoundaryFilter {
    fn default() -> Self {
        BoundaryFilter {
            parent_area_property: Self::DEFAULT_PARENT_AREA_PROPERTY.to_string(),
            parent_area_value: Self::DEFAULT_PARENT_AREA_VALUE.to_string(),
            id_property: Self::DEFAULT_ID_PROPERTY.to_string(),
            name_property: Some(Self::DEFAULT_NAME_PROPERTY.to_string()),
        }
    }
}
