//! Magnetic declination lookup
//!
//! Prints the World Magnetic Model field elements for a few locations, first
//! for today and then across several years to show the secular variation.
//!
//! Run with: `cargo run --example declination`

use ahrs_wmm::Wmm;
use chrono::NaiveDate;
use std::error::Error;

const LOCATIONS: [(&str, f64, f64, f64); 5] = [
    ("Boulder", 40.015, -105.27, 1.655),
    ("London", 51.507, -0.128, 0.011),
    ("Cape Town", -33.925, 18.424, 0.0),
    ("Longyearbyen", 78.223, 15.627, 0.0),
    ("McMurdo", -77.846, 166.676, 0.024),
];

fn main() -> Result<(), Box<dyn Error>> {
    let mut wmm = Wmm::new()?;

    println!("Field elements for today");
    println!(
        "{:<14} {:>10} {:>10} {:>10} {:>10} {:>8} {:>8} {:>8}",
        "Location", "X (nT)", "Y (nT)", "Z (nT)", "F (nT)", "I (°)", "D (°)", "GV (°)"
    );
    for (name, latitude, longitude, height) in LOCATIONS {
        let field = wmm.today(latitude, longitude, height)?;
        println!(
            "{:<14} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>8.2} {:>8.2} {:>8.2}",
            name, field.x, field.y, field.z, field.f, field.i, field.d, field.gv
        );
    }

    println!();
    println!("Declination drift at {}", LOCATIONS[0].0);
    let (_, latitude, longitude, height) = LOCATIONS[0];
    for year in 2015..=2024 {
        let Some(date) = NaiveDate::from_ymd_opt(year, 7, 1) else {
            continue;
        };
        let field = wmm.magnetic_field(latitude, longitude, height, date)?;
        println!("{date}: D = {:+.3}°", field.d);
    }

    println!("✓ Coefficient sets loaded: {}", wmm.reloads());
    Ok(())
}
