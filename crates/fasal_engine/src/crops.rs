//! Static agronomic profile registry.
//!
//! Profiles hold the ideal growing bands a forecast is checked against and
//! the crop traits that feed the feature vector. Unknown crops coming back
//! from the base provider are handled with a neutral profile rather than
//! rejected.

use once_cell::sync::Lazy;

use crate::types::{Season, WaterRequirement};

/// Agronomic profile for one crop.
#[derive(Debug, Clone)]
pub struct CropProfile {
    pub name: &'static str,
    /// Ideal temperature band in degrees Celsius (min, max).
    pub ideal_temp_c: (f64, f64),
    /// Ideal weekly rainfall band in millimetres (min, max).
    pub ideal_rain_mm: (f64, f64),
    pub duration_days: u32,
    pub water: WaterRequirement,
    pub seasons: &'static [Season],
}

pub static CROP_REGISTRY: Lazy<Vec<CropProfile>> = Lazy::new(|| {
    vec![
        CropProfile {
            name: "rice",
            ideal_temp_c: (20.0, 35.0),
            ideal_rain_mm: (80.0, 200.0),
            duration_days: 140,
            water: WaterRequirement::High,
            seasons: &[Season::Kharif],
        },
        CropProfile {
            name: "wheat",
            ideal_temp_c: (10.0, 25.0),
            ideal_rain_mm: (10.0, 40.0),
            duration_days: 120,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Rabi],
        },
        CropProfile {
            name: "maize",
            ideal_temp_c: (18.0, 32.0),
            ideal_rain_mm: (30.0, 90.0),
            duration_days: 100,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Kharif, Season::Rabi],
        },
        CropProfile {
            name: "cotton",
            ideal_temp_c: (21.0, 35.0),
            ideal_rain_mm: (30.0, 80.0),
            duration_days: 170,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Kharif],
        },
        CropProfile {
            name: "sugarcane",
            ideal_temp_c: (20.0, 35.0),
            ideal_rain_mm: (50.0, 120.0),
            duration_days: 360,
            water: WaterRequirement::High,
            seasons: &[Season::YearRound],
        },
        CropProfile {
            name: "mustard",
            ideal_temp_c: (10.0, 25.0),
            ideal_rain_mm: (5.0, 30.0),
            duration_days: 110,
            water: WaterRequirement::Low,
            seasons: &[Season::Rabi],
        },
        CropProfile {
            name: "chickpea",
            ideal_temp_c: (15.0, 28.0),
            ideal_rain_mm: (5.0, 30.0),
            duration_days: 105,
            water: WaterRequirement::Low,
            seasons: &[Season::Rabi],
        },
        CropProfile {
            name: "potato",
            ideal_temp_c: (15.0, 25.0),
            ideal_rain_mm: (20.0, 60.0),
            duration_days: 90,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Rabi],
        },
        CropProfile {
            name: "onion",
            ideal_temp_c: (13.0, 28.0),
            ideal_rain_mm: (15.0, 50.0),
            duration_days: 120,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Rabi, Season::Kharif],
        },
        CropProfile {
            name: "soybean",
            ideal_temp_c: (20.0, 32.0),
            ideal_rain_mm: (40.0, 100.0),
            duration_days: 100,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Kharif],
        },
        CropProfile {
            name: "groundnut",
            ideal_temp_c: (21.0, 33.0),
            ideal_rain_mm: (30.0, 80.0),
            duration_days: 110,
            water: WaterRequirement::Low,
            seasons: &[Season::Kharif],
        },
        CropProfile {
            name: "bajra",
            ideal_temp_c: (25.0, 35.0),
            ideal_rain_mm: (10.0, 50.0),
            duration_days: 80,
            water: WaterRequirement::Low,
            seasons: &[Season::Kharif],
        },
        CropProfile {
            name: "tomato",
            ideal_temp_c: (18.0, 30.0),
            ideal_rain_mm: (20.0, 60.0),
            duration_days: 95,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Rabi, Season::Zaid],
        },
        CropProfile {
            name: "watermelon",
            ideal_temp_c: (24.0, 35.0),
            ideal_rain_mm: (10.0, 40.0),
            duration_days: 85,
            water: WaterRequirement::Moderate,
            seasons: &[Season::Zaid],
        },
    ]
});

/// Neutral profile used for crops the registry does not know. Wide bands
/// keep the forecast analysis close to its neutral midpoint.
static GENERIC_PROFILE: Lazy<CropProfile> = Lazy::new(|| CropProfile {
    name: "generic",
    ideal_temp_c: (15.0, 32.0),
    ideal_rain_mm: (10.0, 100.0),
    duration_days: 120,
    water: WaterRequirement::Moderate,
    seasons: &[Season::YearRound],
});

/// Look up a crop profile by name, case-insensitively. Unknown crops get
/// the generic profile so the pipeline never drops a candidate.
pub fn find_crop(name: &str) -> &'static CropProfile {
    let needle = name.trim().to_lowercase();
    CROP_REGISTRY
        .iter()
        .find(|p| p.name == needle)
        .unwrap_or(&GENERIC_PROFILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_expected_crops() {
        assert!(CROP_REGISTRY.len() >= 14);
        assert!(CROP_REGISTRY.iter().any(|p| p.name == "rice"));
        assert!(CROP_REGISTRY.iter().any(|p| p.name == "wheat"));
    }

    #[test]
    fn test_find_crop_case_insensitive() {
        assert_eq!(find_crop("Rice").name, "rice");
        assert_eq!(find_crop("  WHEAT ").name, "wheat");
    }

    #[test]
    fn test_find_crop_unknown_gets_generic() {
        let profile = find_crop("dragonfruit");
        assert_eq!(profile.name, "generic");
        assert_eq!(profile.water, WaterRequirement::Moderate);
    }

    #[test]
    fn test_profiles_have_sane_bands() {
        for profile in CROP_REGISTRY.iter() {
            assert!(profile.ideal_temp_c.0 < profile.ideal_temp_c.1, "{}", profile.name);
            assert!(profile.ideal_rain_mm.0 < profile.ideal_rain_mm.1, "{}", profile.name);
            assert!(profile.duration_days > 0);
        }
    }
}
