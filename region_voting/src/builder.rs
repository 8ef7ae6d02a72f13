pub use crate::catalog::RegionCatalog;
pub use crate::config::*;

use geo::{MultiPolygon, Rect};

/// A builder for catalogs that do not come from a boundary file.
///
/// ```
/// pub use region_voting::builder::CatalogBuilder;
/// pub use region_voting::{BoundaryFilter, Coordinate};
/// # use region_voting::RegionVotingError;
///
/// let mut builder = CatalogBuilder::new(&BoundaryFilter::default());
/// builder.add_rect(
///     "GRC.1.1.1_1",
///     Some("Athens"),
///     Coordinate::new(37.9, 23.6),
///     Coordinate::new(38.1, 23.8),
/// )?;
/// let catalog = builder.build()?;
///
/// let region = catalog.attribute(&Coordinate::new(37.98, 23.72))?;
/// assert_eq!(region.id.as_str(), "GRC.1.1.1_1");
///
/// # Ok::<(), RegionVotingError>(())
/// ```
pub struct CatalogBuilder {
    pub(crate) _filter: BoundaryFilter,
    pub(crate) _regions: Vec<Region>,
}

impl CatalogBuilder {
    pub fn new(filter: &BoundaryFilter) -> CatalogBuilder {
        CatalogBuilder {
            _filter: filter.clone(),
            _regions: Vec::new(),
        }
    }

    /// Adds a region of the parent area of the filter.
    ///
    /// Regions are attributed in the order in which they are added.
    pub fn add_region<G: Into<MultiPolygon<f64>>>(
        &mut self,
        id: &str,
        name: Option<&str>,
        geometry: G,
    ) -> Result<(), RegionVotingError> {
        if self._regions.iter().any(|r| r.id.as_str() == id) {
            return Err(RegionVotingError::CatalogLoadFailure(format!(
                "duplicate region id {}",
                id
            )));
        }
        self._regions.push(Region {
            id: RegionId::from(id),
            name: name.map(|s| s.to_string()),
            parent_area: self._filter.parent_area_value.clone(),
            geometry: geometry.into(),
        });
        Ok(())
    }

    /// Adds a rectangular region between two corners.
    pub fn add_rect(
        &mut self,
        id: &str,
        name: Option<&str>,
        south_west: Coordinate,
        north_east: Coordinate,
    ) -> Result<(), RegionVotingError> {
        let rect = Rect::new(
            south_west.to_point().0,
            north_east.to_point().0,
        );
        self.add_region(id, name, rect.to_polygon())
    }

    pub fn build(self) -> Result<RegionCatalog, RegionVotingError> {
        RegionCatalog::from_regions(&self._filter, self._regions)
    }
}
