//! Source configuration and credentials.
//!
//! Dataset parameters live in config/sources.yaml; every section has serde
//! defaults matching the values the tool ships with, so a missing file or a
//! partial file still yields a runnable configuration. Credentials come only
//! from the environment.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use ingest_common::{IngestError, IngestResult};

/// Root configuration for all dataset sources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub modis: ModisConfig,
    pub parks: ParksConfig,
    pub population: PopulationConfig,
    pub air_quality: AirQualityConfig,
    pub demographics: DemographicsConfig,
    pub temperature: TemperatureConfig,
    pub land_cover: LandCoverConfig,
    pub elevation: ElevationConfig,
    pub sea_level: SeaLevelConfig,
    pub sentinel: SentinelConfig,
}

impl SourcesConfig {
    /// Load configuration from a YAML file, falling back to defaults when
    /// the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Sources config not found, using built-in defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: SourcesConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded sources config");
        Ok(config)
    }
}

/// MODIS MOD13Q1 NDVI tile download parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModisConfig {
    pub start_year: i32,
    pub end_year: i32,
    pub interval_days: u32,
    /// MODIS sinusoidal tile ids covering the area of interest
    pub tiles: Vec<String>,
    pub base_url: String,
    pub product: String,
    pub collection: String,
}

impl Default for ModisConfig {
    fn default() -> Self {
        Self {
            start_year: 2004,
            end_year: 2024,
            interval_days: 16,
            // California + Western US coverage
            tiles: ["h08v04", "h09v04", "h10v04", "h08v05", "h09v05", "h10v05"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            base_url: "https://e4ftl01.cr.usgs.gov/MOLT/MOD13Q1.006".to_string(),
            product: "MOD13Q1".to_string(),
            collection: "006".to_string(),
        }
    }
}

/// OSM park boundary query parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParksConfig {
    pub overpass_url: String,
    pub tag_key: String,
    pub tag_value: String,
    /// Server-side query timeout in seconds
    pub timeout_secs: u32,
}

impl Default for ParksConfig {
    fn default() -> Self {
        Self {
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            tag_key: "leisure".to_string(),
            tag_value: "park".to_string(),
            timeout_secs: 180,
        }
    }
}

/// GPWv4 population density raster parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub years: Vec<u32>,
    pub url_template: String,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            years: vec![2000, 2005, 2010, 2015, 2020],
            url_template:
                "https://pacific-data.sprep.org/system/files/Global_{year}_PopulationDensity30sec_GPWv4.tiff"
                    .to_string(),
        }
    }
}

/// AirNow / Google Air Quality parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AirQualityConfig {
    pub airnow_url: String,
    pub google_url: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in miles
    pub distance: u32,
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            airnow_url: "https://www.airnowapi.org/aq/observation/latLong/current/".to_string(),
            google_url: "https://airquality.googleapis.com/v1/currentConditions:lookup"
                .to_string(),
            // Los Angeles
            latitude: 34.0522,
            longitude: -118.2437,
            distance: 25,
        }
    }
}

/// Census ACS5 demographics parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemographicsConfig {
    pub url: String,
    pub variables: String,
    pub geography: String,
    pub within: String,
}

impl Default for DemographicsConfig {
    fn default() -> Self {
        Self {
            url: "https://api.census.gov/data/2020/acs/acs5".to_string(),
            variables: "NAME,B01003_001E".to_string(),
            geography: "tract:*".to_string(),
            // California
            within: "state:06".to_string(),
        }
    }
}

/// NOAA GHCND temperature parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    pub url: String,
    pub dataset_id: String,
    pub datatype_id: String,
    pub station_id: String,
    pub start_date: String,
    pub end_date: String,
    pub limit: u32,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            url: "https://www.ncei.noaa.gov/cdo-web/api/v2/data".to_string(),
            dataset_id: "GHCND".to_string(),
            datatype_id: "TMAX".to_string(),
            // LAX
            station_id: "GHCND:USW00023169".to_string(),
            start_date: "2023-01-01".to_string(),
            end_date: "2023-12-31".to_string(),
            limit: 1000,
        }
    }
}

/// NLCD land cover archive parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LandCoverConfig {
    pub url: String,
    pub filename: String,
}

impl Default for LandCoverConfig {
    fn default() -> Self {
        Self {
            url: "https://s3.amazonaws.com/mrlc/nlcd_2016_land_cover_l48_20210604.zip"
                .to_string(),
            filename: "nlcd_2016.zip".to_string(),
        }
    }
}

/// Mapzen/Tilezen terrain tile parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    pub url_template: String,
    pub zoom: u32,
    /// "min_lon,min_lat,max_lon,max_lat"
    pub bbox: String,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            url_template: "https://s3.amazonaws.com/elevation-tiles-prod/geotiff/{z}/{x}/{y}.tif"
                .to_string(),
            zoom: 8,
            // California
            bbox: "-124.482003,32.528832,-114.131211,42.009518".to_string(),
        }
    }
}

/// NASA PO.DAAC sea level parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeaLevelConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SeaLevelConfig {
    fn default() -> Self {
        Self {
            url: "https://podaac-tools.jpl.nasa.gov/drive/files/allData/merged_alt/L2/gdr/nrt/global_mean_sea_level/mean_sea_level_gmsl.csv"
                .to_string(),
            timeout_secs: 30,
        }
    }
}

/// Sentinel-2 NDVI export parameters (Earth Engine hand-off).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub api_url: String,
    pub collection: String,
    pub start_date: String,
    pub end_date: String,
    pub cloud_max_percent: f64,
    pub export_name: String,
    pub drive_folder: String,
    /// Export resolution in meters (Sentinel-2 native)
    pub scale_meters: u32,
    pub crs: String,
    pub max_pixels: u64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://earthengine.googleapis.com/v1".to_string(),
            collection: "COPERNICUS/S2_SR".to_string(),
            start_date: "2024-06-01".to_string(),
            end_date: "2024-09-01".to_string(),
            cloud_max_percent: 10.0,
            export_name: "california_ndvi".to_string(),
            drive_folder: "GTB_Exports".to_string(),
            scale_meters: 10,
            crs: "EPSG:4326".to_string(),
            max_pixels: 10_000_000_000_000,
        }
    }
}

/// API credentials read from the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub census_api_key: Option<String>,
    pub noaa_token: Option<String>,
    pub airnow_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub nasa_username: Option<String>,
    pub nasa_password: Option<String>,
    pub earthdata_token: Option<String>,
    pub gee_access_token: Option<String>,
    pub gee_project: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            census_api_key: env::var("CENSUS_API_KEY").ok(),
            noaa_token: env::var("NOAA_TOKEN").ok(),
            airnow_api_key: env::var("AIRNOW_API_KEY").ok(),
            google_api_key: env::var("GOOGLE_API_KEY").ok(),
            nasa_username: env::var("NASA_USERNAME").ok(),
            nasa_password: env::var("NASA_PASSWORD").ok(),
            earthdata_token: env::var("EARTHDATA_TOKEN").ok(),
            gee_access_token: env::var("GEE_ACCESS_TOKEN").ok(),
            gee_project: env::var("GEE_PROJECT").ok(),
        }
    }
}

/// Resolve a required credential or fail before any network call is made.
pub fn require<'a>(value: &'a Option<String>, var: &'static str) -> IngestResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(IngestError::MissingCredential(var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shipped_values() {
        let config = SourcesConfig::default();
        assert_eq!(config.modis.tiles.len(), 6);
        assert_eq!(config.modis.interval_days, 16);
        assert_eq!(config.population.years, vec![2000, 2005, 2010, 2015, 2020]);
        assert_eq!(config.elevation.zoom, 8);
        assert_eq!(config.temperature.station_id, "GHCND:USW00023169");
        assert_eq!(config.sentinel.scale_meters, 10);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
modis:
  start_year: 2020
  end_year: 2021

elevation:
  zoom: 6
"#;
        let config: SourcesConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.modis.start_year, 2020);
        assert_eq!(config.modis.end_year, 2021);
        // untouched fields keep their defaults
        assert_eq!(config.modis.interval_days, 16);
        assert_eq!(config.elevation.zoom, 6);
        assert_eq!(config.sea_level.timeout_secs, 30);
    }

    #[test]
    fn test_require_credential() {
        let present = Some("abc123".to_string());
        assert_eq!(require(&present, "CENSUS_API_KEY").unwrap(), "abc123");

        let missing: Option<String> = None;
        let err = require(&missing, "CENSUS_API_KEY").unwrap_err();
        assert!(matches!(err, IngestError::MissingCredential("CENSUS_API_KEY")));

        let empty = Some(String::new());
        assert!(require(&empty, "NOAA_TOKEN").is_err());
    }
}
