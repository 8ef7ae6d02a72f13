// Replaying recorded votes from CSV files.

use std::io::Read;

use crate::session::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ReplayStats {
    pub recorded: usize,
    pub rejected: usize,
}

pub fn replay_votes<D: ChoiceDomain>(
    source: &VoteFile,
    catalog: &RegionCatalog,
    ledger: &mut Ledger<D>,
) -> SessionResult<ReplayStats> {
    info!("Attempting to read vote file {:?}", source.path);
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&source.path)
        .context(CsvOpenSnafu {
            path: source.path.clone(),
        })?;
    Ok(replay_reader(rdr, source.has_headers, catalog, ledger))
}

/// Records every row of the reader. Rows that cannot be recorded are logged
/// and counted, they never stop the replay.
///
/// The reader must not consume the header row itself: with `has_headers`
/// unset, the first row is skipped only when none of its latitude, longitude
/// and choice fields can be read. A malformed first vote is rejected as any
/// other row.
pub fn replay_reader<D: ChoiceDomain, R: Read>(
    rdr: csv::Reader<R>,
    has_headers: Option<bool>,
    catalog: &RegionCatalog,
    ledger: &mut Ledger<D>,
) -> ReplayStats {
    let mut stats = ReplayStats::default();
    for (idx, record_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let record = match record_r {
            Ok(record) => record,
            Err(e) => {
                warn!("replay: line {}: cannot read the row: {}", lineno, e);
                stats.rejected += 1;
                continue;
            }
        };
        if idx == 0 && is_header::<D>(&record, has_headers) {
            debug!("replay: skipping header {:?}", record);
            continue;
        }
        let res = parse_row::<D>(&record).and_then(|(coordinate, choice, voter)| {
            ledger
                .record_vote(catalog, Some(coordinate), choice, voter)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
        match res {
            Ok(()) => {
                stats.recorded += 1;
            }
            Err(msg) => {
                warn!("replay: line {}: vote rejected: {}", lineno, msg);
                stats.rejected += 1;
            }
        }
    }
    stats
}

fn is_header<D: ChoiceDomain>(record: &csv::StringRecord, has_headers: Option<bool>) -> bool {
    match has_headers {
        Some(h) => h,
        None => {
            let not_number = |idx: usize| {
                record
                    .get(idx)
                    .map(|s| s.parse::<f64>().is_err())
                    .unwrap_or(true)
            };
            let not_choice = record
                .get(2)
                .map(|s| D::parse_choice(s).is_err())
                .unwrap_or(true);
            not_number(0) && not_number(1) && not_choice
        }
    }
}

// latitude,longitude,choice[,voter]
fn parse_row<D: ChoiceDomain>(
    record: &csv::StringRecord,
) -> Result<(Coordinate, D::Choice, VoterTag), String> {
    let field = |idx: usize, name: &str| -> Result<String, String> {
        record
            .get(idx)
            .map(|s| s.to_string())
            .ok_or_else(|| format!("missing {} column", name))
    };
    let latitude = field(0, "latitude")?
        .parse::<f64>()
        .map_err(|e| format!("latitude: {}", e))?;
    let longitude = field(1, "longitude")?
        .parse::<f64>()
        .map_err(|e| format!("longitude: {}", e))?;
    let choice = D::parse_choice(&field(2, "choice")?).map_err(|e| e.to_string())?;
    let voter = record
        .get(3)
        .map(VoterTag::from_raw)
        .unwrap_or(VoterTag::Unknown);
    Ok((Coordinate::new(latitude, longitude), choice, voter))
}
