use std::sync::Arc;
use std::thread;

use ahrs_wmm::coefficients::{CoefficientTable, GaussCoefficients};
use ahrs_wmm::{DecimalYear, Error, MagneticField, Wmm};
use chrono::NaiveDate;
use serde::Deserialize;

/// Row of `tests/data/wmm_reference.csv`; empty cells are not checked
#[derive(Debug, Deserialize)]
struct Reference {
    latitude: f64,
    longitude: f64,
    height: f64,
    year: f64,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    h: Option<f64>,
    f: Option<f64>,
    i: Option<f64>,
    d: Option<f64>,
    gv: Option<f64>,
    component_tolerance: Option<f64>,
    angle_tolerance: Option<f64>,
}

fn load_references() -> Vec<Reference> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/wmm_reference.csv");
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.deserialize().map(|row| row.unwrap()).collect()
}

fn check(name: &str, actual: f64, expected: Option<f64>, tolerance: Option<f64>, row: &Reference) {
    if let (Some(expected), Some(tolerance)) = (expected, tolerance) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "{name} at ({}, {}, {} km, {}): expected {expected}, got {actual}",
            row.latitude,
            row.longitude,
            row.height,
            row.year
        );
    }
}

fn assert_finite(field: &MagneticField) {
    for value in [field.x, field.y, field.z, field.h, field.f, field.i, field.d, field.gv] {
        assert!(value.is_finite(), "{field:?}");
    }
}

#[test]
fn test_reference_values() {
    let references = load_references();
    assert!(!references.is_empty());

    let mut wmm = Wmm::new().unwrap();
    for row in &references {
        let field = wmm
            .magnetic_field(row.latitude, row.longitude, row.height, row.year)
            .unwrap();

        let nt = row.component_tolerance;
        let deg = row.angle_tolerance;
        check("X", field.x, row.x, nt, row);
        check("Y", field.y, row.y, nt, row);
        check("Z", field.z, row.z, nt, row);
        check("H", field.h, row.h, nt, row);
        check("F", field.f, row.f, nt, row);
        check("I", field.i, row.i, deg, row);
        check("D", field.d, row.d, deg, row);
        check("GV", field.gv, row.gv, deg, row);
    }
}

#[test]
fn test_calendar_and_decimal_dates_agree() {
    let mut wmm = Wmm::new().unwrap();
    let date = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();

    let from_date = wmm.magnetic_field(-33.9, 18.4, 0.0, date).unwrap();
    let from_year = wmm
        .magnetic_field(-33.9, 18.4, 0.0, DecimalYear::from(date).0)
        .unwrap();
    assert_eq!(from_date, from_year);
}

#[test]
fn test_geographic_poles() {
    let mut wmm = Wmm::new().unwrap();

    for latitude in [90.0, -90.0] {
        let pole = wmm.magnetic_field(latitude, 0.0, 0.0, 2022.0).unwrap();
        assert_finite(&pole);
        assert!(pole.f > 50_000.0);

        // The polar branch is the limit of the regular evaluation, checked
        // about 1 m from the pole
        let near = wmm
            .magnetic_field(latitude * (1.0 - 1e-7), 0.0, 0.0, 2022.0)
            .unwrap();
        assert!((pole.y - near.y).abs() < 0.1, "{} vs {}", pole.y, near.y);
        assert!((pole.x - near.x).abs() < 0.1, "{} vs {}", pole.x, near.x);
        assert!((pole.z - near.z).abs() < 0.1, "{} vs {}", pole.z, near.z);

        // At the pole the longitude only turns the horizontal axes
        let turned = wmm.magnetic_field(latitude, 90.0, 0.0, 2022.0).unwrap();
        assert!((turned.h - pole.h).abs() < 1e-6);
        assert!((turned.z - pole.z).abs() < 1e-6);
    }
}

#[test]
fn test_grivation_in_polar_regions() {
    let mut wmm = Wmm::new().unwrap();

    let arctic = wmm.magnetic_field(78.2, 15.6, 0.0, 2021.0).unwrap();
    assert!((arctic.gv - (arctic.d - 15.6)).abs() < 1e-12);

    let antarctic = wmm.magnetic_field(-77.8, 166.7, 0.0, 2021.0).unwrap();
    assert!((antarctic.gv - (antarctic.d + 166.7)).abs() < 1e-12);
}

#[test]
fn test_epoch_boundary_crossing() {
    let mut wmm = Wmm::new().unwrap();

    let before = wmm.magnetic_field(10.0, -20.0, 0.0, 2019.999).unwrap();
    assert_eq!(wmm.reloads(), 1);
    let after = wmm.magnetic_field(10.0, -20.0, 0.0, 2020.0).unwrap();
    assert_eq!(wmm.reloads(), 2);

    // Staying inside the epoch does not reload
    wmm.magnetic_field(-45.0, 100.0, 5.0, 2023.7).unwrap();
    assert_eq!(wmm.reloads(), 2);

    assert_finite(&before);
    assert_finite(&after);
    assert!((before.d - after.d).abs() < 0.5);
    assert!((before.f - after.f).abs() < 250.0);

    // Crossing back reloads once more
    wmm.magnetic_field(10.0, -20.0, 0.0, 2019.0).unwrap();
    assert_eq!(wmm.reloads(), 3);
}

#[test]
fn test_date_before_earliest_epoch() {
    let mut wmm = Wmm::new().unwrap();
    let date = NaiveDate::from_ymd_opt(2014, 6, 1).unwrap();

    match wmm.magnetic_field(0.0, 0.0, 0.0, date) {
        Err(Error::Range { date, earliest }) => {
            assert!(date < 2015.0);
            assert_eq!(earliest, 2015.0);
        }
        other => panic!("expected a range error, got {other:?}"),
    }
}

#[test]
fn test_custom_catalog_from_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/WMM2015.COF");
    let table = CoefficientTable::from_path(path).unwrap();
    let mut wmm = Wmm::with_tables(vec![table]).unwrap();
    assert_eq!(wmm.tables().len(), 1);

    // Past the validity window the only table is extrapolated
    let field = wmm.magnetic_field(10.0, -20.0, 0.0, 2021.0).unwrap();
    assert_finite(&field);
    assert_eq!(wmm.coefficients().unwrap().header().model, "WMM-2015");

    assert!(matches!(
        CoefficientTable::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml")),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_shared_coefficients_across_threads() {
    let mut wmm = Wmm::new().unwrap();
    let coefficients: Arc<GaussCoefficients> = wmm.coefficients_for(2022.5).unwrap();
    let date = DecimalYear(2022.5);

    let points: Vec<(f64, f64)> = (-8..=8)
        .flat_map(|lat| (-17..=18).map(move |lon| (lat as f64 * 10.0, lon as f64 * 10.0)))
        .collect();

    let sequential: Vec<MagneticField> = points
        .iter()
        .map(|&(lat, lon)| coefficients.field(lat, lon, 0.0, date))
        .collect();

    let parallel: Vec<MagneticField> = thread::scope(|scope| {
        let handles: Vec<_> = points
            .chunks(64)
            .map(|chunk| {
                let coefficients = Arc::clone(&coefficients);
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|&(lat, lon)| coefficients.field(lat, lon, 0.0, date))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(sequential, parallel);
    sequential.iter().for_each(assert_finite);
    // Total intensity stays within the physical range of the main field
    assert!(sequential.iter().all(|field| (20_000.0..70_000.0).contains(&field.f)));
}
