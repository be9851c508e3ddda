//! One module per acquirable dataset.

pub mod air_quality;
pub mod demographics;
pub mod elevation;
pub mod land_cover;
pub mod modis;
pub mod parks;
pub mod population;
pub mod sea_level;
pub mod sentinel;
pub mod temperature;

use crate::runner::Dataset;

/// All datasets in run order.
pub fn registry() -> Vec<Box<dyn Dataset>> {
    vec![
        Box::new(modis::ModisNdvi),
        Box::new(parks::OsmParks),
        Box::new(population::Population),
        Box::new(air_quality::AirQuality),
        Box::new(demographics::Demographics),
        Box::new(temperature::Temperature),
        Box::new(land_cover::LandCover),
        Box::new(elevation::Elevation),
        Box::new(sea_level::SeaLevel),
        Box::new(sentinel::SentinelNdvi),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let datasets = registry();
        let mut names: Vec<&str> = datasets.iter().map(|d| d.name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 10);
    }
}
