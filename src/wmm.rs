//! World Magnetic Model evaluation with automatic epoch selection

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::coefficients::{CoefficientTable, GaussCoefficients};
use crate::error::{Error, Result};

/// Years after its epoch during which a model is considered valid
pub const VALIDITY_YEARS: f64 = 5.0;

/// Latitude (degrees) beyond which grivation is referred to the polar grid
const GRID_LATITUDE: f64 = 55.0;

/// Date expressed as a fractional year, e.g. `2020.5`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct DecimalYear(pub f64);

impl From<f64> for DecimalYear {
    fn from(year: f64) -> Self {
        Self(year)
    }
}

impl From<NaiveDate> for DecimalYear {
    /// `year + (day_of_year - 1) / days_in_year`
    fn from(date: NaiveDate) -> Self {
        let days = if date.leap_year() { 366.0 } else { 365.0 };
        Self(date.year() as f64 + date.ordinal0() as f64 / days)
    }
}

/// Geomagnetic field elements at one point
///
/// Components are in nT, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MagneticField {
    /// North component
    pub x: f64,
    /// East component
    pub y: f64,
    /// Down component
    pub z: f64,
    /// Horizontal intensity
    pub h: f64,
    /// Total intensity
    pub f: f64,
    /// Inclination (dip), positive downwards
    pub i: f64,
    /// Declination, positive east of true north
    pub d: f64,
    /// Grivation, declination relative to grid north in polar regions
    pub gv: f64,
}

impl MagneticField {
    /// Derive the field elements from geodetic north/east/down components
    pub(crate) fn from_components(x: f64, y: f64, z: f64, latitude: f64, longitude: f64) -> Self {
        let h = x.hypot(y);
        let f = h.hypot(z);
        let i = z.atan2(h).to_degrees();
        let d = y.atan2(x).to_degrees();

        let gv = if latitude > GRID_LATITUDE {
            d - longitude
        } else if latitude < -GRID_LATITUDE {
            d + longitude
        } else {
            d
        };

        Self {
            x,
            y,
            z,
            h,
            f,
            i,
            d,
            gv,
        }
    }
}

/// World Magnetic Model
///
/// Holds a catalog of coefficient tables and denormalizes the one covering the
/// requested date on demand. The active set is shared as an
/// `Arc<GaussCoefficients>`, so evaluations running on other threads keep the
/// set they started with when the active epoch changes.
///
/// # Example
/// ```
/// use ahrs_wmm::Wmm;
///
/// let mut wmm = Wmm::new().unwrap();
/// let field = wmm.magnetic_field(10.0, -20.0, 0.0, 2020.4).unwrap();
/// assert!((field.d + 9.1224).abs() < 0.01);
/// ```
#[derive(Debug, Clone)]
pub struct Wmm {
    /// Tables sorted by epoch
    catalog: Vec<CoefficientTable>,
    active: Option<(usize, Arc<GaussCoefficients>)>,
    reloads: usize,
}

impl Wmm {
    /// Model backed by the compiled-in WMM2015 and WMM2020 tables
    pub fn new() -> Result<Self> {
        Self::with_tables(CoefficientTable::builtin()?)
    }

    /// Model backed by user-supplied tables, in any order
    pub fn with_tables(mut tables: Vec<CoefficientTable>) -> Result<Self> {
        if tables.is_empty() {
            return Err(Error::Format("no coefficient tables supplied".into()));
        }
        tables.sort_by(|a, b| a.epoch().total_cmp(&b.epoch()));

        Ok(Self {
            catalog: tables,
            active: None,
            reloads: 0,
        })
    }

    /// Evaluate the field at a geodetic position
    ///
    /// `latitude` and `longitude` are in degrees, `height` in km above the
    /// WGS-84 ellipsoid. Fails with [`Error::Range`] if `date` precedes the
    /// oldest epoch in the catalog.
    pub fn magnetic_field(
        &mut self,
        latitude: f64,
        longitude: f64,
        height: f64,
        date: impl Into<DecimalYear>,
    ) -> Result<MagneticField> {
        let date = date.into();
        let coefficients = self.coefficients_for(date)?;
        Ok(coefficients.field(latitude, longitude, height, date))
    }

    /// Evaluate the field for the current local date
    pub fn today(&mut self, latitude: f64, longitude: f64, height: f64) -> Result<MagneticField> {
        let date = chrono::Local::now().date_naive();
        self.magnetic_field(latitude, longitude, height, date)
    }

    /// Activate the coefficient set covering `date`
    ///
    /// The newest table whose epoch is not after `date` is selected. It is
    /// denormalized only when it differs from the currently active one.
    pub fn coefficients_for(&mut self, date: impl Into<DecimalYear>) -> Result<Arc<GaussCoefficients>> {
        let DecimalYear(year) = date.into();
        let Some(index) = self.catalog.iter().rposition(|table| table.epoch() <= year) else {
            return Err(Error::Range {
                date: year,
                earliest: self.catalog[0].epoch(),
            });
        };

        let table = &self.catalog[index];
        if index == self.catalog.len() - 1 && year >= table.epoch() + VALIDITY_YEARS {
            log::warn!(
                "{year:.3} is past the validity of {}, extrapolating",
                table.header().model
            );
        }

        if let Some((active, coefficients)) = &self.active {
            if *active == index {
                return Ok(Arc::clone(coefficients));
            }
        }

        log::debug!("activating {} for {year:.3}", table.header().model);
        let coefficients = Arc::new(GaussCoefficients::denormalize(table));
        self.active = Some((index, Arc::clone(&coefficients)));
        self.reloads += 1;
        Ok(coefficients)
    }

    /// Currently active coefficient set, if any evaluation happened yet
    pub fn coefficients(&self) -> Option<Arc<GaussCoefficients>> {
        self.active.as_ref().map(|(_, coefficients)| Arc::clone(coefficients))
    }

    /// Number of times a coefficient set has been denormalized
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    /// Catalog of tables, oldest epoch first
    pub fn tables(&self) -> &[CoefficientTable] {
        &self.catalog
    }
}
