use clap::Parser;

/// Location-based voting: attributes each vote to the region of the voter and
/// draws the results as a choropleth map.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the session: boundaries, choice domain,
    /// location, vote files and output. Options given on the command line take precedence.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A GeoJSON FeatureCollection with the boundaries of the regions.
    #[clap(short, long, value_parser)]
    pub boundaries: Option<String>,

    /// (default Attica) Only the features whose parent area attribute has this value are kept.
    #[clap(long, value_parser)]
    pub parent_area: Option<String>,

    /// (yes-no or safety-rating, default safety-rating) The kind of votes that are accepted.
    #[clap(short, long, value_parser)]
    pub domain: Option<String>,

    /// (LAT,LON) The position of the voter. Without it, votes are rejected until a position
    /// is set in the console.
    #[clap(short, long, value_parser, allow_hyphen_values = true)]
    pub location: Option<String>,

    /// (optional) An identifier of the voter, such as an IP address. Only its hash is kept.
    #[clap(long, value_parser)]
    pub voter: Option<String>,

    /// (list of CSV files) Votes to replay before the session starts. Each row is
    /// latitude,longitude,choice and optionally the voter.
    #[clap(long, value_parser)]
    pub votes: Option<Vec<String>>,

    /// (file path, 'stdout' or empty) If specified, the choropleth map will be written in GeoJSON
    /// format to the given location. Setting this option overrides the path that may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the summary of the votes in JSON format. If provided,
    /// regionvote will check that the final summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, does not read commands from the standard input: the votes are
    /// replayed and the summary is printed.
    #[clap(long, takes_value = false)]
    pub batch: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
