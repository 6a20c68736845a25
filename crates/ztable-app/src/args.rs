use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::DataSource;

#[derive(Parser, Debug)]
#[command(name = "ztable")]
#[command(about = "Query a record collection the way a ztable data table would", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// URL query string to hydrate the table from, e.g. "?page=2&search=sales"
    #[arg(short, long, default_value = "")]
    pub query: String,

    /// Base URL for facet lookups (defaults to `<list url>/../facets`)
    #[arg(long, requires = "url")]
    pub facets_url: Option<String>,

    /// JSON file with column definitions
    #[arg(long)]
    pub columns: Option<PathBuf>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Keep hidden columns and recent searches in this file between runs
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// JSON array of records to serve in-process
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Remote list endpoint, e.g. http://localhost:5000/api/users
    #[arg(short, long)]
    pub url: Option<String>,
}

impl Cli {
    pub fn data_source(&self) -> Option<DataSource> {
        match (&self.source.data, &self.source.url) {
            (Some(path), _) => Some(DataSource::File(path.clone())),
            (None, Some(url)) => Some(DataSource::Remote {
                url: url.clone(),
                facets_url: self.facets_url.clone(),
            }),
            (None, None) => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the settled page as JSON (default)
    Page,

    /// Print the option list of one field
    Facets {
        /// Dot-path of the field, e.g. work.department
        field: String,
    },
}
