//! Offline UTC offset estimation.
//!
//! The last resort when no timezone service answers. Starts from solar
//! time (15 degrees of longitude per hour) and then applies a table of
//! named regional bands where civil time departs from it. Crude, but
//! deterministic and always available.

use tracing::trace;

use super::types::{Coordinates, TimezoneInfo, offset_label};

/// Source name reported for estimated offsets.
pub const ESTIMATE_SOURCE: &str = "estimate";

/// A longitude band inside a region, with the offset used there.
struct Band {
    name: &'static str,
    lon: (f64, f64),
    offset: f64,
}

/// A latitude/longitude box with its own bands.
struct Region {
    name: &'static str,
    lat: (f64, f64),
    lon: (f64, f64),
    bands: &'static [Band],
}

/// Bounds are exclusive on both ends. Later bands win where they overlap.
const REGIONS: &[Region] = &[
    Region {
        name: "Asia",
        lat: (5.0, 55.0),
        lon: (70.0, 150.0),
        bands: &[
            Band {
                name: "Pakistan",
                lon: (68.0, 80.0),
                offset: 5.0,
            },
            Band {
                name: "India",
                lon: (80.0, 92.0),
                offset: 5.5,
            },
            Band {
                name: "Southeast Asia",
                lon: (92.0, 108.0),
                offset: 7.0,
            },
            Band {
                name: "China and Philippines",
                lon: (108.0, 128.0),
                offset: 8.0,
            },
            Band {
                name: "Japan and Korea",
                lon: (128.0, 146.0),
                offset: 9.0,
            },
        ],
    },
    Region {
        name: "Australia",
        lat: (-45.0, -10.0),
        lon: (110.0, 155.0),
        bands: &[
            Band {
                name: "Central Australia",
                lon: (125.0, 141.0),
                offset: 9.5,
            },
            Band {
                name: "Eastern Australia",
                lon: (141.0, 155.0),
                offset: 10.0,
            },
        ],
    },
    Region {
        name: "North America",
        lat: (25.0, 70.0),
        lon: (-170.0, -50.0),
        bands: &[
            Band {
                name: "Mountain",
                lon: (-130.0, -100.0),
                offset: -7.0,
            },
            Band {
                name: "Central",
                lon: (-100.0, -85.0),
                offset: -6.0,
            },
            Band {
                name: "Eastern",
                lon: (-85.0, -65.0),
                offset: -5.0,
            },
        ],
    },
    Region {
        name: "Europe",
        lat: (35.0, 70.0),
        lon: (-10.0, 40.0),
        bands: &[
            Band {
                name: "Central European",
                lon: (-10.0, 20.0),
                offset: 1.0,
            },
            Band {
                name: "Eastern European",
                lon: (20.0, 40.0),
                offset: 2.0,
            },
        ],
    },
];

fn within(value: f64, (min, max): (f64, f64)) -> bool {
    value > min && value < max
}

/// Estimate the UTC offset at a point, in hours.
///
/// Always within [-12, +12]. Non-finite input estimates as UTC.
///
/// # Examples
///
/// ```
/// use itinerary_server::timezone::estimate_offset;
///
/// assert_eq!(estimate_offset(35.68, 139.69), 9.0);   // Tokyo
/// assert_eq!(estimate_offset(-34.93, 138.60), 9.5);  // Adelaide
/// assert_eq!(estimate_offset(-8.84, 13.23), 1.0);    // Luanda, solar time
/// ```
pub fn estimate_offset(lat: f64, lon: f64) -> f64 {
    if !lat.is_finite() || !lon.is_finite() {
        return 0.0;
    }

    let mut offset = (lon / 15.0).round().clamp(-12.0, 12.0);

    for region in REGIONS {
        if !within(lat, region.lat) || !within(lon, region.lon) {
            continue;
        }
        for band in region.bands {
            if within(lon, band.lon) {
                trace!(region = region.name, band = band.name, "estimate band matched");
                offset = band.offset;
            }
        }
    }

    offset
}

/// Estimate the offset at `at` and label it as an estimate.
pub fn estimated_info(at: Coordinates) -> TimezoneInfo {
    let utc_offset_hours = estimate_offset(at.lat, at.lon);
    TimezoneInfo {
        utc_offset_hours,
        name: format!("Estimated ({})", offset_label(utc_offset_hours)),
        source: ESTIMATE_SOURCE,
    }
}
