use clap::{Parser, Subcommand, ValueEnum};
use geolocate_resolver::Mode;

#[derive(Parser, Debug)]
#[command(name = "geolocate", version, about = "Belgian address resolution on top of Pelias")]
pub struct Cli {
    #[arg(long, global = true, help = "Wait for the geocoder to be ready before running")]
    pub wait: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Geocode a structured address
    Geocode {
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        housenumber: Option<String>,
        #[arg(long)]
        postcode: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long, value_enum, default_value_t = ModeArg::Advanced)]
        mode: ModeArg,
        #[arg(long, default_value_t = false, help = "Include the raw geocoder answer")]
        raw: bool,
    },
    /// Geocode a free-text address
    Unstructured {
        address: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Advanced)]
        mode: ModeArg,
        #[arg(long, default_value_t = false, help = "Include the raw geocoder answer")]
        raw: bool,
    },
    /// Addresses around a point
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 1.0, help = "Radius in kilometers")]
        radius: f64,
        #[arg(long, default_value_t = 5)]
        size: usize,
        #[arg(long, default_value_t = false)]
        raw: bool,
    },
    SearchCity {
        #[arg(long)]
        postcode: Option<String>,
        #[arg(long)]
        city: Option<String>,
    },
    GetById {
        best_id: String,
    },
    Health,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Basic,
    Simple,
    Advanced,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Basic => Mode::Basic,
            ModeArg::Simple => Mode::Simple,
            ModeArg::Advanced => Mode::Advanced,
        }
    }
}
