use std::collections::HashSet;
use std::fs;
use std::path::Path;

use geo::{EuclideanDistance, Geometry, MultiPolygon, Point};
use geojson::{Feature, GeoJson, JsonValue};
use log::{debug, info};

use crate::config::*;

/// The immutable set of votable regions.
///
/// Regions are kept in the order of the boundary file. This order is also the
/// tie-break order of attribution.
#[derive(PartialEq, Debug, Clone)]
pub struct RegionCatalog {
    filter: BoundaryFilter,
    regions: Vec<Region>,
}

const MIN_RING_COORDINATES: usize = 4;

fn load_failure(reason: String) -> RegionVotingError {
    RegionVotingError::CatalogLoadFailure(reason)
}

impl Region {
    /// Planar distance from the point to the region, in degrees.
    /// It is zero when the point lies inside the region.
    pub fn distance_to(&self, point: &Point<f64>) -> f64 {
        self.geometry
            .0
            .iter()
            .map(|polygon| point.euclidean_distance(polygon))
            .fold(f64::INFINITY, f64::min)
    }
}

impl RegionCatalog {
    /// Reads a GeoJSON boundary file and keeps the features of the parent area.
    pub fn load<P: AsRef<Path>>(
        path: P,
        filter: &BoundaryFilter,
    ) -> Result<RegionCatalog, RegionVotingError> {
        let path = path.as_ref();
        info!("Loading boundaries from {:?}", path);
        let contents = fs::read_to_string(path)
            .map_err(|e| load_failure(format!("cannot read {}: {}", path.display(), e)))?;
        RegionCatalog::from_geojson_str(&contents, filter)
    }

    pub fn from_geojson_str(
        contents: &str,
        filter: &BoundaryFilter,
    ) -> Result<RegionCatalog, RegionVotingError> {
        let gj: GeoJson = contents
            .parse()
            .map_err(|e: geojson::Error| load_failure(format!("malformed GeoJSON: {}", e)))?;
        RegionCatalog::from_geojson(gj, filter)
    }

    pub fn from_geojson(
        gj: GeoJson,
        filter: &BoundaryFilter,
    ) -> Result<RegionCatalog, RegionVotingError> {
        let fc = match gj {
            GeoJson::FeatureCollection(fc) => fc,
            _ => {
                return Err(load_failure(
                    "the boundary source is not a FeatureCollection".to_string(),
                ))
            }
        };
        let num_features = fc.features.len();
        let mut regions: Vec<Region> = Vec::new();
        for (idx, feature) in fc.features.into_iter().enumerate() {
            let parent_area = string_property(&feature, &filter.parent_area_property)
                .ok_or_else(|| {
                    load_failure(format!(
                        "feature #{} has no {:?} attribute",
                        idx, filter.parent_area_property
                    ))
                })?;
            if parent_area != filter.parent_area_value {
                continue;
            }
            regions.push(feature_to_region(idx, feature, parent_area, filter)?);
        }
        info!(
            "Kept {} regions out of {} features for {} = {:?}",
            regions.len(),
            num_features,
            filter.parent_area_property,
            filter.parent_area_value
        );
        RegionCatalog::from_regions(filter, regions)
    }

    /// Builds a catalog out of regions that are already parsed.
    ///
    /// All the regions must belong to the parent area of the filter and have
    /// distinct identifiers.
    pub fn from_regions(
        filter: &BoundaryFilter,
        regions: Vec<Region>,
    ) -> Result<RegionCatalog, RegionVotingError> {
        let mut seen: HashSet<&RegionId> = HashSet::new();
        for r in regions.iter() {
            if r.parent_area != filter.parent_area_value {
                return Err(load_failure(format!(
                    "region {} belongs to {:?}, not to {:?}",
                    r.id, r.parent_area, filter.parent_area_value
                )));
            }
            if r.geometry.0.is_empty() {
                return Err(load_failure(format!("region {} has an empty geometry", r.id)));
            }
            // A closed ring has at least 4 coordinates. Degenerate rings are at
            // distance 0 from every point.
            if r
                .geometry
                .0
                .iter()
                .any(|p| p.exterior().0.len() < MIN_RING_COORDINATES)
            {
                return Err(load_failure(format!(
                    "region {} has a polygon without a valid exterior ring",
                    r.id
                )));
            }
            if !seen.insert(&r.id) {
                return Err(load_failure(format!("duplicate region id {}", r.id)));
            }
        }
        Ok(RegionCatalog {
            filter: filter.clone(),
            regions,
        })
    }

    /// Finds the region that contains the coordinate, or the nearest one.
    ///
    /// This is a linear scan over all the regions. When several regions are
    /// at the same minimum distance, the first one in catalog order wins.
    pub fn attribute(&self, coordinate: &Coordinate) -> Result<&Region, RegionVotingError> {
        if self.regions.is_empty() {
            return Err(RegionVotingError::NoRegionsLoaded);
        }
        if !coordinate.is_finite() {
            return Err(RegionVotingError::LocationUnavailable);
        }
        let point = coordinate.to_point();
        let mut closest: Option<(&Region, f64)> = None;
        for region in self.regions.iter() {
            let distance = region.distance_to(&point);
            match closest {
                Some((_, best)) if distance >= best => {}
                _ => {
                    closest = Some((region, distance));
                }
            }
        }
        let (region, distance) = closest.ok_or(RegionVotingError::NoRegionsLoaded)?;
        debug!(
            "attribute: {} -> {} (distance {})",
            coordinate, region.id, distance
        );
        Ok(region)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == *id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn filter(&self) -> &BoundaryFilter {
        &self.filter
    }
}

// GADM writes identifiers as strings, other sources sometimes use numbers.
fn string_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.properties.as_ref().and_then(|p| p.get(key)) {
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn feature_to_region(
    idx: usize,
    feature: Feature,
    parent_area: String,
    filter: &BoundaryFilter,
) -> Result<Region, RegionVotingError> {
    let id = string_property(&feature, &filter.id_property).ok_or_else(|| {
        load_failure(format!(
            "feature #{} has no {:?} attribute",
            idx, filter.id_property
        ))
    })?;
    let name = filter
        .name_property
        .as_ref()
        .and_then(|key| string_property(&feature, key));
    let gj = feature
        .geometry
        .ok_or_else(|| load_failure(format!("region {} has no geometry", id)))?;
    let geom: Geometry<f64> = gj
        .value
        .try_into()
        .map_err(|e: geojson::Error| load_failure(format!("region {}: {}", id, e)))?;
    let geometry: MultiPolygon<f64> = match geom {
        Geometry::Polygon(p) => p.into(),
        Geometry::MultiPolygon(m) => m,
        _ => {
            return Err(load_failure(format!(
                "region {} is not a polygon or a multipolygon",
                id
            )))
        }
    };
    Ok(Region {
        id: RegionId(id),
        name,
        parent_area,
        geometry,
    })
}
