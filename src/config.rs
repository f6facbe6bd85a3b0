use std::path::PathBuf;
use clap::Parser;
use hifitime::Duration;

pub(crate) const CELESTRAK_ACTIVE_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=active&FORMAT=tle";

/// Command line of the viewer. Without options the active-satellite feed is fetched.
#[derive(Debug, Parser)]
#[command(name = "satellite-orbit", about = "Plot short-horizon satellite orbits over the Earth")]
pub(crate) struct Args {
    /// Element set feed to fetch at startup
    #[arg(long, value_name = "URL", default_value = CELESTRAK_ACTIVE_URL)]
    pub(crate) catalog_url: String,

    /// Read element sets from a local TLE file instead of fetching them
    #[arg(long, value_name = "PATH", conflicts_with = "catalog_url")]
    pub(crate) tle_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub(crate) struct OrbitConfig {
    pub(crate) catalog_url: String,
    pub(crate) dropdown_limit: usize,
    pub(crate) sample_count: usize,
    pub(crate) sample_step: Duration,
    pub(crate) earth_radius_km: f64,
    pub(crate) mesh_resolution: usize,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        OrbitConfig {
            catalog_url: CELESTRAK_ACTIVE_URL.to_string(),
            dropdown_limit: 50,
            sample_count: 90,
            sample_step: Duration::from_seconds(60.0),
            earth_radius_km: 6371.0,
            mesh_resolution: 100,
        }
    }
}

impl OrbitConfig {
    pub(crate) fn from_args(args: &Args) -> OrbitConfig {
        OrbitConfig {
            catalog_url: args.catalog_url.clone(),
            ..OrbitConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrbitConfig::default();
        assert_eq!(config.catalog_url, CELESTRAK_ACTIVE_URL);
        assert_eq!(config.dropdown_limit, 50);
        assert_eq!(config.sample_count, 90);
        assert_eq!(config.sample_step.to_seconds(), 60.0);
        assert_eq!(config.mesh_resolution, 100);
    }

    #[test]
    fn test_catalog_url_override() {
        let args = Args::parse_from(["satellite-orbit", "--catalog-url", "http://localhost/tle.txt"]);
        let config = OrbitConfig::from_args(&args);
        assert_eq!(config.catalog_url, "http://localhost/tle.txt");
        assert_eq!(config.sample_count, 90);
        assert!(args.tle_file.is_none());
    }

    #[test]
    fn test_tle_file() {
        let args = Args::parse_from(["satellite-orbit", "--tle-file", "stations.tle"]);
        assert_eq!(args.tle_file, Some(PathBuf::from("stations.tle")));
        assert_eq!(args.catalog_url, CELESTRAK_ACTIVE_URL);
    }
}
