/*!
Region attribution and per-region vote aggregation.

A [RegionCatalog] holds the votable regions of one parent area. A [Ledger]
records votes: each vote is attributed to the region that contains the
voter, or to the nearest one. The ledger then summarizes the votes of every
region, and the [ChoiceDomain] of the ledger turns each summary into the
color class of that region on a choropleth map.

```
use region_voting::builder::CatalogBuilder;
use region_voting::*;

let mut builder = CatalogBuilder::new(&BoundaryFilter::default());
builder.add_rect("north", None, Coordinate::new(38.0, 23.0), Coordinate::new(38.5, 24.0))?;
builder.add_rect("south", None, Coordinate::new(37.5, 23.0), Coordinate::new(38.0, 24.0))?;
let catalog = builder.build()?;

let mut ledger: Ledger<SafetyRating> = Ledger::new();
let here = Some(Coordinate::new(38.2, 23.5));
ledger.record_vote(&catalog, here, 5, VoterTag::Unknown)?;
ledger.record_vote(&catalog, here, 1, VoterTag::Unknown)?;

let summary = ledger.summarize(&catalog);
assert_eq!(summary[&RegionId::from("north")].average, Some(3.0));
assert_eq!(classify::<SafetyRating>(&summary)[&RegionId::from("south")], ColorClass::Neutral);
# Ok::<(), RegionVotingError>(())
```

For more details about the command line program, see the [manual].
*/

pub mod builder;
mod catalog;
mod config;
mod domain;
pub mod manual;

use log::{debug, info, warn};

use std::{
    collections::{BTreeMap, HashMap},
    marker::PhantomData,
};

pub use crate::catalog::*;
pub use crate::config::*;
pub use crate::domain::*;

/// The append-only record of the votes of one session.
///
/// The ledger is an owned value: it is created by the caller and passed to
/// whatever needs to record or read votes. Nothing is persisted.
#[derive(Debug, Clone)]
pub struct Ledger<D: ChoiceDomain> {
    events: Vec<VoteEvent<D::Choice>>,
    _domain: PhantomData<D>,
}

impl<D: ChoiceDomain> Default for Ledger<D> {
    fn default() -> Self {
        Ledger {
            events: Vec::new(),
            _domain: PhantomData,
        }
    }
}

impl<D: ChoiceDomain> Ledger<D> {
    pub fn new() -> Ledger<D> {
        Ledger::default()
    }

    /// Records one vote.
    ///
    /// Arguments:
    /// * `catalog` the regions that votes are attributed to
    /// * `location` the position of the voter, if the geolocation succeeded
    /// * `choice` the choice of the voter, checked before any attribution
    /// * `voter` the voter tag (never used to reject repeated votes)
    ///
    /// The vote is either appended as a whole or not at all.
    pub fn record_vote(
        &mut self,
        catalog: &RegionCatalog,
        location: Option<Coordinate>,
        choice: D::Choice,
        voter: VoterTag,
    ) -> Result<&VoteEvent<D::Choice>, RegionVotingError> {
        if let Err(e) = D::validate(&choice) {
            warn!("record_vote: rejected choice {:?}", choice);
            return Err(e);
        }
        let coordinate = location.ok_or(RegionVotingError::LocationUnavailable)?;
        let region = catalog.attribute(&coordinate)?;
        debug!(
            "record_vote: {} -> region {} choice {}",
            coordinate,
            region.id,
            D::label(&choice)
        );
        self.events.push(VoteEvent {
            region_id: region.id.clone(),
            choice,
            voter,
        });
        Ok(&self.events[self.events.len() - 1])
    }

    pub fn events(&self) -> &[VoteEvent<D::Choice>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Computes the summary of every region of the catalog from the full
    /// history of the ledger.
    ///
    /// Regions without votes get zero counts and, for scored domains, an
    /// average of 0.0. Nothing is cached between calls.
    pub fn summarize(&self, catalog: &RegionCatalog) -> Summary {
        // Count per (region, choice) pair, then pivot per region.
        let mut grouped: HashMap<(&RegionId, D::Choice), u64> = HashMap::new();
        for e in self.events.iter() {
            *grouped.entry((&e.region_id, e.choice)).or_insert(0) += 1;
        }
        debug!(
            "summarize: {} events in {} (region, choice) groups",
            self.events.len(),
            grouped.len()
        );

        let choices = D::choices();
        let mut summary = Summary::new();
        for region in catalog.regions() {
            let counts: Vec<(D::Choice, u64)> = choices
                .iter()
                .map(|c| (*c, grouped.get(&(&region.id, *c)).cloned().unwrap_or(0)))
                .collect();
            let total: u64 = counts.iter().map(|(_, n)| *n).sum();
            let average = mean_score::<D>(&counts, total);
            summary.insert(
                region.id.clone(),
                RegionSummary {
                    region_id: region.id.clone(),
                    counts: counts.iter().map(|(c, n)| (D::label(c), *n)).collect(),
                    total,
                    average,
                },
            );
        }
        info!(
            "Summarized {} votes over {} regions ({})",
            self.events.len(),
            summary.len(),
            D::name()
        );
        summary
    }
}

/// The color class of every region of a summary.
pub fn classify<D: ChoiceDomain>(summary: &Summary) -> BTreeMap<RegionId, ColorClass> {
    summary
        .iter()
        .map(|(rid, rs)| (rid.clone(), D::classify(rs)))
        .collect()
}

fn mean_score<D: ChoiceDomain>(counts: &[(D::Choice, u64)], total: u64) -> Option<f64> {
    let mut weighted: u64 = 0;
    for (c, n) in counts.iter() {
        weighted += D::score(c)? as u64 * n;
    }
    if total > 0 {
        Some(weighted as f64 / total as f64)
    } else {
        Some(0.0)
    }
}
