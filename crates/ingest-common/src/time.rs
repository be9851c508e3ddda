//! MODIS composite calendar helpers.
//!
//! MOD13Q1 is published on a 16-day cadence starting at day-of-year 1.

use chrono::NaiveDate;

/// Check that a day-of-year exists in the given year (DOY 366 only in leap years).
pub fn is_valid_doy(year: i32, doy: u32) -> bool {
    NaiveDate::from_yo_opt(year, doy).is_some()
}

/// List the valid 16-day composite start days for a year.
pub fn composite_days(year: i32) -> Vec<u32> {
    composite_days_with_interval(year, 16)
}

/// List composite start days with an explicit interval.
pub fn composite_days_with_interval(year: i32, interval_days: u32) -> Vec<u32> {
    let step = interval_days.max(1) as usize;
    (1..367)
        .step_by(step)
        .filter(|&doy| is_valid_doy(year, doy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_days_count() {
        // 16-day cadence gives 23 composites per year, last starting DOY 353
        let days = composite_days(2023);
        assert_eq!(days.len(), 23);
        assert_eq!(days.first(), Some(&1));
        assert_eq!(days.last(), Some(&353));
    }

    #[test]
    fn test_leap_year_doy() {
        assert!(is_valid_doy(2024, 366));
        assert!(!is_valid_doy(2023, 366));
        assert!(is_valid_doy(2023, 365));
        assert!(!is_valid_doy(2023, 0));
    }

    #[test]
    fn test_custom_interval() {
        let days = composite_days_with_interval(2023, 100);
        assert_eq!(days, vec![1, 101, 201, 301]);
    }
}
