//! Gauss coefficient tables of the World Magnetic Model
//!
//! A `.COF` file starts with a header line `epoch model release-date`, followed
//! by one row per coefficient pair `n m g h g_dot h_dot` and terminated by rows
//! of nines. Coefficients are stored in a single square matrix per quantity:
//! `g(n, m)` at `[m, n]` and `h(n, m)` at `[n, m - 1]`.

use std::path::Path;

use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::geodesy::{MEAN_EARTH_RADIUS, geodetic_to_spherical};
use crate::wmm::{DecimalYear, MagneticField};

/// WMM2015 coefficients, valid 2015.0 to 2020.0
pub const WMM2015: &str = include_str!("../data/WMM2015.COF");

/// WMM2020 coefficients, valid 2020.0 to 2025.0
pub const WMM2020: &str = include_str!("../data/WMM2020.COF");

/// `cos` of the geocentric latitude below which the point is treated as a
/// geographic pole
const POLE_TOLERANCE: f64 = 1e-10;

/// Metadata from the first line of a coefficient file
#[derive(Debug, Clone, PartialEq)]
pub struct ModelHeader {
    /// Reference epoch as a decimal year
    pub epoch: f64,
    /// Model name, e.g. `WMM-2020`
    pub model: String,
    /// Release date as written in the file
    pub release_date: String,
}

/// Raw (Schmidt normalized) coefficients as read from a table
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    header: ModelHeader,
    max_degree: usize,
    main: DMatrix<f64>,
    secular: DMatrix<f64>,
}

impl CoefficientTable {
    /// Parse a table in `.COF` layout
    ///
    /// # Example
    /// ```
    /// use ahrs_wmm::coefficients::{CoefficientTable, WMM2020};
    ///
    /// let table = CoefficientTable::parse(WMM2020).unwrap();
    /// assert_eq!(table.header().epoch, 2020.0);
    /// assert_eq!(table.max_degree(), 12);
    /// assert_eq!(table.g(1, 0), -29404.5);
    /// ```
    pub fn parse(source: &str) -> Result<Self> {
        let mut lines = source
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let header = match lines.next() {
            Some((number, line)) => parse_header(number, line)?,
            None => return Err(Error::Format("empty coefficient table".into())),
        };

        let mut rows = Vec::new();
        for (number, line) in lines {
            if line.starts_with("9999") {
                break;
            }
            rows.push(parse_row(number, line)?);
        }

        let Some(max_degree) = rows.iter().map(|row| row.n).max() else {
            return Err(Error::Format(format!("{} has no coefficients", header.model)));
        };

        let dims = max_degree + 1;
        let mut main = DMatrix::zeros(dims, dims);
        let mut secular = DMatrix::zeros(dims, dims);
        for row in &rows {
            main[(row.m, row.n)] = row.g;
            secular[(row.m, row.n)] = row.g_dot;
            if row.m != 0 {
                main[(row.n, row.m - 1)] = row.h;
                secular[(row.n, row.m - 1)] = row.h_dot;
            }
        }

        log::debug!(
            "parsed {} coefficients of {} (epoch {}, degree {})",
            rows.len(),
            header.model,
            header.epoch,
            max_degree
        );

        Ok(Self {
            header,
            max_degree,
            main,
            secular,
        })
    }

    /// Read a `.COF` file from disk
    ///
    /// Fails with [`Error::Format`] if the file does not carry the `.COF`
    /// extension (case-insensitive) or is malformed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_cof = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("cof"));
        if !is_cof {
            return Err(Error::Format(format!(
                "{} is not a .COF file",
                path.display()
            )));
        }

        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Tables compiled into the crate, oldest first
    pub fn builtin() -> Result<Vec<Self>> {
        [WMM2015, WMM2020].into_iter().map(Self::parse).collect()
    }

    /// Header line of the source file
    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    /// Reference epoch as a decimal year
    pub fn epoch(&self) -> f64 {
        self.header.epoch
    }

    /// Highest degree `n` present in the table
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Main field coefficient `g(n, m)` in nT
    pub fn g(&self, n: usize, m: usize) -> f64 {
        self.main[(m, n)]
    }

    /// Main field coefficient `h(n, m)` in nT, zero for `m = 0`
    pub fn h(&self, n: usize, m: usize) -> f64 {
        if m == 0 { 0.0 } else { self.main[(n, m - 1)] }
    }

    /// Secular variation of `g(n, m)` in nT/year
    pub fn g_dot(&self, n: usize, m: usize) -> f64 {
        self.secular[(m, n)]
    }

    /// Secular variation of `h(n, m)` in nT/year
    pub fn h_dot(&self, n: usize, m: usize) -> f64 {
        if m == 0 { 0.0 } else { self.secular[(n, m - 1)] }
    }
}

struct Row {
    n: usize,
    m: usize,
    g: f64,
    h: f64,
    g_dot: f64,
    h_dot: f64,
}

fn parse_header(number: usize, line: &str) -> Result<ModelHeader> {
    let mut fields = line.split_whitespace();
    let epoch = fields
        .next()
        .and_then(|field| field.parse::<f64>().ok())
        .ok_or_else(|| Error::Format(format!("line {number}: missing model epoch")))?;
    let model = fields
        .next()
        .ok_or_else(|| Error::Format(format!("line {number}: missing model name")))?;

    Ok(ModelHeader {
        epoch,
        model: model.to_string(),
        release_date: fields.next().unwrap_or_default().to_string(),
    })
}

fn parse_row(number: usize, line: &str) -> Result<Row> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(Error::Format(format!(
            "line {number}: expected 6 columns, found {}",
            fields.len()
        )));
    }

    let index = |i: usize| {
        fields[i]
            .parse::<usize>()
            .map_err(|_| Error::Format(format!("line {number}: invalid index {:?}", fields[i])))
    };
    let value = |i: usize| {
        fields[i]
            .parse::<f64>()
            .map_err(|_| Error::Format(format!("line {number}: invalid value {:?}", fields[i])))
    };

    let (n, m) = (index(0)?, index(1)?);
    if n == 0 || m > n {
        return Err(Error::Format(format!(
            "line {number}: invalid degree/order ({n}, {m})"
        )));
    }

    Ok(Row {
        n,
        m,
        g: value(2)?,
        h: value(3)?,
        g_dot: value(4)?,
        h_dot: value(5)?,
    })
}

/// Coefficients scaled by the Schmidt semi-normalization factors, ready for
/// field evaluation
#[derive(Debug, Clone)]
pub struct GaussCoefficients {
    header: ModelHeader,
    max_degree: usize,
    main: DMatrix<f64>,
    secular: DMatrix<f64>,
    /// Legendre recursion factors `k[m, n]`
    recursion: DMatrix<f64>,
}

impl GaussCoefficients {
    /// Apply the Schmidt semi-normalization factors to a raw table
    pub fn denormalize(table: &CoefficientTable) -> Self {
        let dims = table.max_degree + 1;
        let mut main = table.main.clone();
        let mut secular = table.secular.clone();
        let mut snorm = DMatrix::<f64>::identity(dims, dims);
        let mut recursion = DMatrix::<f64>::zeros(dims, dims);

        for n in 1..dims {
            let nf = n as f64;
            snorm[(0, n)] = snorm[(0, n - 1)] * (2.0 * nf - 1.0) / nf;
            let mut j = 2.0;

            for m in 0..=n {
                let mf = m as f64;
                recursion[(m, n)] = ((nf - 1.0).powi(2) - mf * mf)
                    / ((2.0 * nf - 1.0) * (2.0 * nf - 3.0));

                if m > 0 {
                    let factor = (nf - mf + 1.0) * j / (nf + mf);
                    snorm[(m, n)] = snorm[(m - 1, n)] * factor.sqrt();
                    j = 1.0;
                    main[(n, m - 1)] *= snorm[(m, n)];
                    secular[(n, m - 1)] *= snorm[(m, n)];
                }
                main[(m, n)] *= snorm[(m, n)];
                secular[(m, n)] *= snorm[(m, n)];
            }
        }

        log::debug!(
            "denormalized {} coefficients (epoch {})",
            table.header.model,
            table.header.epoch
        );

        Self {
            header: table.header.clone(),
            max_degree: table.max_degree,
            main,
            secular,
            recursion,
        }
    }

    /// Header of the table these coefficients were derived from
    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    /// Reference epoch as a decimal year
    pub fn epoch(&self) -> f64 {
        self.header.epoch
    }

    /// Highest degree `n` of the expansion
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Evaluate the field at a geodetic position
    ///
    /// `latitude` and `longitude` are in degrees, `height` in km above the
    /// WGS-84 ellipsoid. Coefficients are propagated linearly from the epoch to
    /// `date` with their secular variation, without any range check.
    pub fn field(
        &self,
        latitude: f64,
        longitude: f64,
        height: f64,
        date: DecimalYear,
    ) -> MagneticField {
        let dims = self.max_degree + 1;
        let dt = date.0 - self.header.epoch;
        let lat = latitude.to_radians();
        let lon = longitude.to_radians();

        let spherical = geodetic_to_spherical(lat, lon, height);
        let (spr, cpr) = spherical.latitude.sin_cos();
        let at_pole = cpr.abs() < POLE_TOLERANCE;

        // sin and cos of m·longitude
        let (sl, cl) = lon.sin_cos();
        let mut sp = vec![0.0; dims];
        let mut cp = vec![1.0; dims];
        for m in 1..dims {
            sp[m] = sl * cp[m - 1] + cl * sp[m - 1];
            cp[m] = cl * cp[m - 1] - sl * sp[m - 1];
        }

        // Associated Legendre functions and their latitude derivative
        let mut p = DMatrix::<f64>::zeros(dims, dims);
        let mut dp = DMatrix::<f64>::zeros(dims, dims);
        p[(0, 0)] = 1.0;
        // Order 1 functions divided by cos(latitude), used at the poles
        let mut pp = vec![0.0; dims];
        pp[0] = 1.0;

        let ratio = MEAN_EARTH_RADIUS / spherical.radius;
        let mut arn = ratio * ratio;
        let (mut xp, mut yp, mut zp, mut yp_polar) = (0.0, 0.0, 0.0, 0.0);

        for n in 1..dims {
            arn *= ratio;
            let (mut xn, mut yn, mut zn) = (0.0, 0.0, 0.0);

            for m in 0..=n {
                if m == n {
                    p[(m, n)] = cpr * p[(m - 1, n - 1)];
                    dp[(m, n)] = cpr * dp[(m - 1, n - 1)] + spr * p[(m - 1, n - 1)];
                } else {
                    p[(m, n)] = spr * p[(m, n - 1)];
                    dp[(m, n)] = spr * dp[(m, n - 1)] - cpr * p[(m, n - 1)];
                    if m + 2 <= n {
                        let k = self.recursion[(m, n)];
                        p[(m, n)] -= k * p[(m, n - 2)];
                        dp[(m, n)] -= k * dp[(m, n - 2)];
                    }
                }

                let g = self.main[(m, n)] + dt * self.secular[(m, n)];
                let h = if m == 0 {
                    0.0
                } else {
                    self.main[(n, m - 1)] + dt * self.secular[(n, m - 1)]
                };
                let gchs = g * cp[m] + h * sp[m];
                let gshc = g * sp[m] - h * cp[m];

                xn += gchs * dp[(m, n)];
                yn += m as f64 * gshc * p[(m, n)];
                zn += gchs * p[(m, n)];

                if at_pole && m == 1 {
                    pp[n] = if n == 1 {
                        pp[0]
                    } else {
                        spr * pp[n - 1] - self.recursion[(1, n)] * pp[n - 2]
                    };
                    yp_polar += arn * gshc * pp[n];
                }
            }

            xp += arn * xn;
            yp += arn * yn;
            zp -= (n as f64 + 1.0) * arn * zn;
        }

        let yp = if at_pole { yp_polar } else { yp / cpr };

        // Rotate from spherical to geodetic north/down
        let (sin_psi, cos_psi) = (spherical.latitude - lat).sin_cos();
        let x = xp * cos_psi - zp * sin_psi;
        let z = xp * sin_psi + zp * cos_psi;

        MagneticField::from_components(x, yp, z, latitude, longitude)
    }
}
