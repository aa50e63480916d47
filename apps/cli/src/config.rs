use std::time::Duration;

pub struct Config {
    pub pelias_host: String,
    pub interpolation_host: String,
    pub es_host: String,
    pub postcode_match_length: usize,
    pub similarity_threshold: f64,
    pub request_timeout: Duration,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<f64>().ok());

        Self {
            pelias_host: string("PELIAS_HOST", "localhost:4000"),
            interpolation_host: string("PELIAS_INTERPOL_HOST", "localhost:4300"),
            es_host: string("PELIAS_ES_HOST", "localhost:9200"),
            postcode_match_length: lookup("GEOLOCATE_POSTCODE_MATCH_LENGTH")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(2),
            similarity_threshold: parsed("GEOLOCATE_SIMILARITY_THRESHOLD").unwrap_or(0.8),
            request_timeout: lookup("GEOLOCATE_REQUEST_TIMEOUT_MS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_secs(30)),
            log_format: string("GEOLOCATE_LOG_FORMAT", "text"),
        }
    }
}
