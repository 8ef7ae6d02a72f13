use log::{debug, info, warn};

use region_voting::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::session::config_reader::*;

pub mod config_reader;
mod console;
mod io_csv;
mod io_geojson;

pub use crate::session::console::run_console;
pub use crate::session::io_csv::ReplayStats;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the output"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening the vote file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error loading the boundaries from {path}: {source}"))]
    LoadingCatalog {
        source: RegionVotingError,
        path: String,
    },
    #[snafu(display("{source}"))]
    Voting { source: RegionVotingError },
    #[snafu(display("Error on the console"))]
    Console { source: std::io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Which vote schema the session runs with.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum DomainKind {
    YesNo,
    SafetyRating,
}

impl FromStr for DomainKind {
    type Err = SessionError;

    fn from_str(s: &str) -> SessionResult<DomainKind> {
        match s {
            "yes-no" | "yesNo" | "binary" => Ok(DomainKind::YesNo),
            "safety-rating" | "safetyRating" | "rating" => Ok(DomainKind::SafetyRating),
            x => whatever!(
                "Unknown choice domain {:?} (expected yes-no or safety-rating)",
                x
            ),
        }
    }
}

/// Source of the voter's position.
///
/// In a browser this is the geolocation API; it may be denied or fail, in
/// which case no coordinate is returned and votes are rejected.
pub trait LocationProvider {
    fn current_location(&mut self) -> Option<Coordinate>;
}

/// A position set once, from the command line, the configuration or the console.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct FixedLocation(pub Option<Coordinate>);

impl LocationProvider for FixedLocation {
    fn current_location(&mut self) -> Option<Coordinate> {
        self.0
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteFile {
    pub path: String,
    /// `None` lets the reader detect a header row.
    pub has_headers: Option<bool>,
}

/// The options of a session, once the command line and the configuration
/// file have been merged.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub boundaries: String,
    pub filter: BoundaryFilter,
    pub domain: DomainKind,
    pub location: Option<Coordinate>,
    pub voter: VoterTag,
    pub vote_files: Vec<VoteFile>,
    pub output: Option<String>,
    pub reference: Option<String>,
    pub question: Option<String>,
    pub interactive: bool,
}

/// Parses a `LAT,LON` pair.
pub fn parse_location(s: &str) -> SessionResult<Coordinate> {
    let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
    match parts.as_slice() {
        [lat, lon] => match (lat.parse::<f64>(), lon.parse::<f64>()) {
            (Ok(latitude), Ok(longitude)) if latitude.is_finite() && longitude.is_finite() => {
                Ok(Coordinate::new(latitude, longitude))
            }
            _ => whatever!("Cannot read the location {:?}", s),
        },
        _ => whatever!("Expected a location as LAT,LON but got {:?}", s),
    }
}

fn resolve_path(root: &Path, p: &str) -> String {
    if p == "stdout" {
        return p.to_string();
    }
    let full: PathBuf = root.join(p);
    full.as_path().display().to_string()
}

pub fn resolve_settings(args: &Args) -> SessionResult<Settings> {
    let config: Option<(SessionConfig, PathBuf)> = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            Some((config, root))
        }
        None => None,
    };

    let boundaries: String = match (&args.boundaries, &config) {
        (Some(p), _) => p.clone(),
        (None, Some((c, root))) => resolve_path(root, &c.boundary_source.file_path),
        (None, None) => {
            whatever!("No boundary file: use --boundaries or provide a --config file")
        }
    };

    let mut filter = config
        .as_ref()
        .map(|(c, _)| c.boundary_source.filter())
        .unwrap_or_default();
    if let Some(parent_area) = &args.parent_area {
        filter.parent_area_value = parent_area.clone();
    }

    let domain = match (&args.domain, &config) {
        (Some(d), _) => DomainKind::from_str(d)?,
        (None, Some((c, _))) => match &c.choice_domain {
            Some(d) => DomainKind::from_str(d)?,
            None => DomainKind::SafetyRating,
        },
        (None, None) => DomainKind::SafetyRating,
    };

    let location = match (&args.location, &config) {
        (Some(l), _) => Some(parse_location(l)?),
        (None, Some((c, _))) => c
            .location
            .map(|l| Coordinate::new(l.latitude, l.longitude)),
        (None, None) => None,
    };

    let mut vote_files: Vec<VoteFile> = Vec::new();
    if let Some((c, root)) = &config {
        for vs in c.vote_sources.clone().unwrap_or_default() {
            vote_files.push(VoteFile {
                path: resolve_path(root, &vs.file_path),
                has_headers: vs.has_headers,
            });
        }
    }
    for p in args.votes.clone().unwrap_or_default() {
        vote_files.push(VoteFile {
            path: p,
            has_headers: None,
        });
    }

    let output_settings = config.as_ref().and_then(|(c, root)| {
        c.output_settings
            .clone()
            .map(|os| (os, root.to_path_buf()))
    });
    let output = match (&args.out, &output_settings) {
        (Some(o), _) => Some(o.clone()),
        (None, Some((os, root))) => os.output_path.as_ref().map(|p| resolve_path(root, p)),
        (None, None) => None,
    };
    let question = output_settings.and_then(|(os, _)| os.question);

    Ok(Settings {
        boundaries,
        filter,
        domain,
        location,
        voter: args
            .voter
            .as_deref()
            .map(VoterTag::from_raw)
            .unwrap_or(VoterTag::Unknown),
        vote_files,
        output,
        reference: args.reference.clone(),
        question,
        interactive: !args.batch,
    })
}

/// The state of one voting session: the catalog, the ledger and the
/// position of the current voter.
pub struct Session<D: ChoiceDomain> {
    catalog: RegionCatalog,
    ledger: Ledger<D>,
    location: Box<dyn LocationProvider>,
    voter: VoterTag,
    output: Option<String>,
    question: Option<String>,
}

impl<D: ChoiceDomain> Session<D> {
    pub fn new(
        catalog: RegionCatalog,
        location: Box<dyn LocationProvider>,
        voter: VoterTag,
        output: Option<String>,
        question: Option<String>,
    ) -> Session<D> {
        Session {
            catalog,
            ledger: Ledger::new(),
            location,
            voter,
            output,
            question,
        }
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger<D> {
        &self.ledger
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn set_location(&mut self, location: Option<Coordinate>) {
        self.location = Box::new(FixedLocation(location));
    }

    /// The region of the current position, if there is one.
    pub fn current_region(&mut self) -> SessionResult<&Region> {
        let coordinate = self
            .location
            .current_location()
            .ok_or(RegionVotingError::LocationUnavailable)
            .context(VotingSnafu {})?;
        self.catalog.attribute(&coordinate).context(VotingSnafu {})
    }

    /// Records a vote at the current position.
    pub fn vote(&mut self, raw_choice: &str) -> SessionResult<String> {
        let choice = D::parse_choice(raw_choice).context(VotingSnafu {})?;
        let location = self.location.current_location();
        let event = self
            .ledger
            .record_vote(&self.catalog, location, choice, self.voter.clone())
            .context(VotingSnafu {})?;
        let region_name = self
            .catalog
            .get(&event.region_id)
            .and_then(|r| r.name.clone())
            .unwrap_or_else(|| event.region_id.to_string());
        info!(
            "Vote {} recorded for region {}",
            D::label(&choice),
            event.region_id
        );
        Ok(format!(
            "Recorded {} for {} ({})",
            D::label(&choice),
            region_name,
            event.region_id
        ))
    }

    pub fn replay(&mut self, source: &VoteFile) -> SessionResult<ReplayStats> {
        let stats = io_csv::replay_votes(source, &self.catalog, &mut self.ledger)?;
        info!(
            "Replayed {}: {} votes recorded, {} rejected",
            source.path, stats.recorded, stats.rejected
        );
        Ok(stats)
    }

    pub fn summary(&self) -> Summary {
        self.ledger.summarize(&self.catalog)
    }

    pub fn summary_json(&self) -> JSValue {
        summary_to_json::<D>(&self.catalog, &self.summary())
    }

    /// Writes the choropleth map to the given path, or to the configured output.
    pub fn export(&self, path: Option<&str>) -> SessionResult<String> {
        let target = match path.or(self.output.as_deref()) {
            Some(p) => p.to_string(),
            None => whatever!("No output: give a path or set --out"),
        };
        let gj = io_geojson::build_choropleth::<D>(&self.catalog, &self.summary(), self.question());
        io_geojson::write_geojson(&gj, &target)?;
        Ok(format!("Map written to {}", target))
    }
}

/// The summary of all the regions, in catalog order, with their color class.
pub fn summary_to_json<D: ChoiceDomain>(catalog: &RegionCatalog, summary: &Summary) -> JSValue {
    let mut regions: Vec<JSValue> = Vec::new();
    for region in catalog.regions() {
        let rs = match summary.get(&region.id) {
            Some(rs) => rs,
            None => continue,
        };
        let mut counts: JSMap<String, JSValue> = JSMap::new();
        for (label, count) in rs.counts.iter() {
            counts.insert(label.clone(), json!(count));
        }
        let class = D::classify(rs);
        let mut js = json!({
            "id": region.id.as_str(),
            "name": region.name,
            "counts": counts,
            "total": rs.total,
            "colorClass": class.as_str(),
            "fillColor": D::fill_color(class),
        });
        if let Some(average) = rs.average {
            js["average"] = json!(average);
        }
        regions.push(js);
    }
    json!({ "domain": D::name(), "regions": regions })
}

/// Compares the summary with a reference summary, and prints the differences.
pub fn check_reference(summary_js: &JSValue, reference_path: &str) -> SessionResult<()> {
    let contents =
        fs::read_to_string(reference_path).context(OpeningJsonSnafu { path: reference_path })?;
    let reference: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(WritingJsonSnafu {})?;
    let pretty_summary = serde_json::to_string_pretty(summary_js).context(WritingJsonSnafu {})?;
    if pretty_reference != pretty_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), pretty_summary.as_str(), "\n");
        whatever!("Difference detected between the summary and the reference summary")
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

pub fn run(args: &Args) -> SessionResult<()> {
    let settings = resolve_settings(args)?;
    debug!("settings: {:?}", settings);

    let catalog = RegionCatalog::load(&settings.boundaries, &settings.filter).context(
        LoadingCatalogSnafu {
            path: settings.boundaries.clone(),
        },
    )?;
    if catalog.is_empty() {
        warn!(
            "No region matches {} = {:?}: every vote will be rejected",
            settings.filter.parent_area_property, settings.filter.parent_area_value
        );
    }

    match settings.domain {
        DomainKind::YesNo => run_with::<YesNo>(catalog, &settings),
        DomainKind::SafetyRating => run_with::<SafetyRating>(catalog, &settings),
    }
}

// Standard output carries a single JSON document: the map when it goes there.
fn prints_summary(settings: &Settings) -> bool {
    !settings.interactive && settings.output.as_deref() != Some("stdout")
}

fn run_with<D: ChoiceDomain>(catalog: RegionCatalog, settings: &Settings) -> SessionResult<()> {
    let mut session: Session<D> = Session::new(
        catalog,
        Box::new(FixedLocation(settings.location)),
        settings.voter.clone(),
        settings.output.clone(),
        settings.question.clone(),
    );

    for source in settings.vote_files.iter() {
        session.replay(source)?;
    }

    if settings.interactive {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut out = stdout.lock();
        run_console(&mut session, stdin.lock(), &mut out)?;
        out.flush().context(ConsoleSnafu {})?;
    }

    let summary_js = session.summary_json();
    if !settings.interactive {
        let pretty = serde_json::to_string_pretty(&summary_js).context(WritingJsonSnafu {})?;
        if prints_summary(settings) {
            println!("{}", pretty);
        } else {
            info!("summary: {}", pretty);
        }
    }
    if settings.output.is_some() {
        let msg = session.export(None)?;
        info!("{}", msg);
    }
    if let Some(reference) = &settings.reference {
        check_reference(&summary_js, reference)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use clap::Parser;

    pub(crate) const BOUNDARIES: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        { "type": "Feature",
          "properties": { "GID_3": "GRC.1.1.1_1", "NAME_1": "Attica", "NAME_3": "Athens" },
          "geometry": { "type": "Polygon",
            "coordinates": [[[23.0, 37.5], [23.5, 37.5], [23.5, 38.0], [23.0, 38.0], [23.0, 37.5]]] } },
        { "type": "Feature",
          "properties": { "GID_3": "GRC.1.1.2_1", "NAME_1": "Attica", "NAME_3": "Piraeus" },
          "geometry": { "type": "Polygon",
            "coordinates": [[[23.5, 37.5], [24.0, 37.5], [24.0, 38.0], [23.5, 38.0], [23.5, 37.5]]] } },
        { "type": "Feature",
          "properties": { "GID_3": "GRC.2.1.1_1", "NAME_1": "Crete", "NAME_3": "Heraklion" },
          "geometry": { "type": "Polygon",
            "coordinates": [[[25.0, 35.0], [25.5, 35.0], [25.5, 35.5], [25.0, 35.5], [25.0, 35.0]]] } }
      ]
    }"#;

    pub(crate) fn attica() -> RegionCatalog {
        RegionCatalog::from_geojson_str(BOUNDARIES, &BoundaryFilter::default()).unwrap()
    }

    pub(crate) fn session<D: ChoiceDomain>(location: Option<Coordinate>) -> Session<D> {
        Session::new(
            attica(),
            Box::new(FixedLocation(location)),
            VoterTag::Unknown,
            None,
            None,
        )
    }

    #[test]
    fn location_parsing() {
        assert_eq!(
            parse_location("37.98, 23.72").unwrap(),
            Coordinate::new(37.98, 23.72)
        );
        assert!(parse_location("37.98").is_err());
        assert!(parse_location("north,south").is_err());
        assert!(parse_location("NaN,1").is_err());
    }

    #[test]
    fn domain_names() {
        assert_eq!(DomainKind::from_str("yes-no").unwrap(), DomainKind::YesNo);
        assert_eq!(
            DomainKind::from_str("safetyRating").unwrap(),
            DomainKind::SafetyRating
        );
        assert!(DomainKind::from_str("approval").is_err());
    }

    #[test]
    fn vote_without_location() {
        let mut s: Session<SafetyRating> = session(None);
        let err = s.vote("4").unwrap_err();
        assert!(matches!(
            err,
            SessionError::Voting {
                source: RegionVotingError::LocationUnavailable
            }
        ));
        assert!(s.ledger().is_empty());
    }

    #[test]
    fn vote_with_location() {
        let mut s: Session<SafetyRating> = session(Some(Coordinate::new(37.75, 23.25)));
        let msg = s.vote("4").unwrap();
        assert_eq!(msg, "Recorded 4 for Athens (GRC.1.1.1_1)");
        assert!(matches!(
            s.vote("6"),
            Err(SessionError::Voting {
                source: RegionVotingError::InvalidChoice(_)
            })
        ));
        assert_eq!(s.ledger().len(), 1);
        assert_eq!(s.current_region().unwrap().id.as_str(), "GRC.1.1.1_1");
    }

    #[test]
    fn summary_json_layout() {
        let mut s: Session<SafetyRating> = session(Some(Coordinate::new(37.75, 23.75)));
        for r in ["5", "5", "1"] {
            s.vote(r).unwrap();
        }
        let js = s.summary_json();
        assert_eq!(js["domain"], json!("safety-rating"));
        let regions = js["regions"].as_array().unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0]["id"], json!("GRC.1.1.1_1"));
        assert_eq!(regions[0]["colorClass"], json!("neutral"));
        assert_eq!(regions[0]["fillColor"], json!("blue"));
        assert_eq!(regions[0]["average"], json!(0.0));
        assert_eq!(regions[1]["counts"]["5"], json!(2));
        assert_eq!(regions[1]["total"], json!(3));
        assert_eq!(regions[1]["colorClass"], json!("safe"));
        assert_eq!(regions[1]["fillColor"], json!("green"));
    }

    #[test]
    fn yes_no_summary_has_no_average() {
        let mut s: Session<YesNo> = session(Some(Coordinate::new(37.75, 23.25)));
        s.vote("Yes").unwrap();
        s.vote("no").unwrap();
        let js = s.summary_json();
        let athens = &js["regions"][0];
        assert!(athens.get("average").is_none());
        assert_eq!(athens["colorClass"], json!("noMajority"));
        assert_eq!(athens["fillColor"], json!("red"));
        assert_eq!(js["regions"][1]["fillColor"], json!("gray"));
    }

    #[test]
    fn reference_check() {
        let mut s: Session<YesNo> = session(Some(Coordinate::new(37.75, 23.25)));
        s.vote("Yes").unwrap();
        let js = s.summary_json();
        let reference = tempfile::NamedTempFile::new().unwrap();
        fs::write(reference.path(), serde_json::to_string(&js).unwrap()).unwrap();
        let p = reference.path().display().to_string();
        assert!(check_reference(&js, &p).is_ok());
        s.vote("No").unwrap();
        assert!(check_reference(&s.summary_json(), &p).is_err());
    }

    #[test]
    fn settings_from_command_line() {
        let args = Args::parse_from([
            "regionvote",
            "--boundaries",
            "attica.geojson",
            "--parent-area",
            "Crete",
            "--domain",
            "yes-no",
            "--location",
            "35.3,25.1",
            "--voter",
            "10.0.0.1",
            "--votes",
            "a.csv",
            "--batch",
        ]);
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.boundaries, "attica.geojson");
        assert_eq!(settings.filter.parent_area_value, "Crete");
        assert_eq!(settings.filter.id_property, "GID_3");
        assert_eq!(settings.domain, DomainKind::YesNo);
        assert_eq!(settings.location, Some(Coordinate::new(35.3, 25.1)));
        assert!(matches!(settings.voter, VoterTag::Hashed(_)));
        assert_eq!(
            settings.vote_files,
            vec![VoteFile {
                path: "a.csv".to_string(),
                has_headers: None
            }]
        );
        assert!(!settings.interactive);
    }

    #[test]
    fn settings_need_boundaries() {
        let args = Args::parse_from(["regionvote"]);
        assert!(resolve_settings(&args).is_err());
    }

    #[test]
    fn settings_from_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let config_path = dir.join("session.json");
        fs::write(
            &config_path,
            r#"{
              "boundarySource": { "filePath": "attica.geojson" },
              "choiceDomain": "yesNo",
              "location": { "latitude": 37.9, "longitude": 23.7 },
              "voteSources": [ { "filePath": "votes.csv", "hasHeaders": true } ],
              "outputSettings": { "outputPath": "map.geojson", "question": "Yes or no?" }
            }"#,
        )
        .unwrap();
        let config_str = config_path.display().to_string();
        let args = Args::parse_from(["regionvote", "--config", config_str.as_str(), "--out", "stdout"]);
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(
            settings.boundaries,
            dir.join("attica.geojson").display().to_string()
        );
        assert_eq!(settings.domain, DomainKind::YesNo);
        assert_eq!(settings.location, Some(Coordinate::new(37.9, 23.7)));
        assert_eq!(settings.vote_files[0].has_headers, Some(true));
        assert_eq!(
            settings.vote_files[0].path,
            dir.join("votes.csv").display().to_string()
        );
        assert_eq!(settings.output.as_deref(), Some("stdout"));
        assert_eq!(settings.question.as_deref(), Some("Yes or no?"));
        assert!(settings.interactive);
    }

    #[test]
    fn run_in_batch_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let boundaries = dir.join("attica.geojson");
        fs::write(&boundaries, BOUNDARIES).unwrap();
        let votes = dir.join("votes.csv");
        fs::write(&votes, "latitude,longitude,choice\n37.75,23.25,2\n37.75,23.75,9\n").unwrap();
        let out = dir.join("map.geojson");
        let b = boundaries.display().to_string();
        let v = votes.display().to_string();
        let o = out.display().to_string();
        let args = Args::parse_from([
            "regionvote",
            "--boundaries",
            b.as_str(),
            "--votes",
            v.as_str(),
            "--out",
            o.as_str(),
            "--batch",
        ]);
        run(&args).unwrap();
        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("\"yellow\""));
    }

    #[test]
    fn one_document_on_stdout() {
        let batch = |out: Option<&str>| {
            let mut args = vec!["regionvote", "--boundaries", "attica.geojson", "--batch"];
            if let Some(o) = out {
                args.extend(["--out", o]);
            }
            resolve_settings(&Args::parse_from(args)).unwrap()
        };
        assert!(prints_summary(&batch(None)));
        assert!(prints_summary(&batch(Some("map.geojson"))));
        assert!(!prints_summary(&batch(Some("stdout"))));
        let interactive =
            resolve_settings(&Args::parse_from(["regionvote", "--boundaries", "a.geojson"])).unwrap();
        assert!(!prints_summary(&interactive));
    }

    #[test]
    fn run_with_missing_boundaries() {
        let args = Args::parse_from([
            "regionvote",
            "--boundaries",
            "/nonexistent/attica.geojson",
            "--batch",
        ]);
        assert!(matches!(
            run(&args),
            Err(SessionError::LoadingCatalog {
                source: RegionVotingError::CatalogLoadFailure(_),
                ..
            })
        ));
    }
}
