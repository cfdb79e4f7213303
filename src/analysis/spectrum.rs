//! TSC-2018 design spectrum
//!
//! Site coefficients come from the Fs/F1 tables with linear interpolation on
//! the mapped spectral accelerations. Horizontal ordinates are reduced by the
//! period-dependent Ra(T); vertical ordinates are elastic.

use serde::{Deserialize, Serialize};

const SS_BREAKPOINTS: [f64; 6] = [0.25, 0.50, 0.75, 1.00, 1.25, 1.50];
const S1_BREAKPOINTS: [f64; 6] = [0.10, 0.20, 0.30, 0.40, 0.50, 0.60];
const GRID_STEP: f64 = 0.2;
const MIN_KEY_DISTANCE: f64 = 0.1;

/// Local site class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SiteClass {
    ZA,
    ZB,
    #[default]
    ZC,
    ZD,
    ZE,
}

impl SiteClass {
    /// Parse a class label; unknown labels map to ZC
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "ZA" => Self::ZA,
            "ZB" => Self::ZB,
            "ZD" => Self::ZD,
            "ZE" => Self::ZE,
            _ => Self::ZC,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ZA => "ZA",
            Self::ZB => "ZB",
            Self::ZC => "ZC",
            Self::ZD => "ZD",
            Self::ZE => "ZE",
        }
    }

    fn fs_row(&self) -> [f64; 6] {
        match self {
            Self::ZA => [0.8; 6],
            Self::ZB => [0.9; 6],
            Self::ZC => [1.3, 1.3, 1.2, 1.2, 1.2, 1.2],
            Self::ZD => [1.6, 1.4, 1.2, 1.1, 1.0, 1.0],
            Self::ZE => [2.4, 1.7, 1.3, 1.1, 0.9, 0.8],
        }
    }

    fn f1_row(&self) -> [f64; 6] {
        match self {
            Self::ZA | Self::ZB => [0.8; 6],
            Self::ZC => [1.5, 1.5, 1.5, 1.5, 1.5, 1.4],
            Self::ZD => [2.4, 2.2, 2.0, 1.9, 1.8, 1.7],
            Self::ZE => [4.2, 3.3, 2.8, 2.4, 2.2, 2.0],
        }
    }
}

impl From<String> for SiteClass {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<SiteClass> for String {
    fn from(class: SiteClass) -> Self {
        class.label().to_string()
    }
}

/// Spectrum component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpectrumDirection {
    #[default]
    Horizontal,
    /// Any label other than "Horizontal"
    #[serde(other)]
    Vertical,
}

/// How spectral ordinates are read at a modal period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Closed-form ordinate at the exact period
    Exact,
    /// Linear interpolation on the tabulated curve
    #[default]
    #[serde(other)]
    Linear,
}

fn default_function_type() -> String {
    "TSC-2018".to_string()
}

fn default_tl() -> f64 {
    6.0
}

fn default_damping() -> f64 {
    0.05
}

fn unit() -> f64 {
    1.0
}

/// Response spectrum function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumFunction {
    #[serde(rename = "type", default = "default_function_type")]
    pub function_type: String,
    pub name: String,
    /// Short-period mapped spectral acceleration
    #[serde(rename = "Ss")]
    pub ss: f64,
    /// 1-second mapped spectral acceleration
    #[serde(rename = "S1")]
    pub s1: f64,
    /// Long-period transition period
    #[serde(rename = "TL", default = "default_tl")]
    pub tl: f64,
    /// Response modification coefficient
    #[serde(rename = "R", default = "unit")]
    pub r: f64,
    /// Overstrength coefficient
    #[serde(rename = "D", default = "unit")]
    pub d: f64,
    /// Importance factor
    #[serde(rename = "I", default = "unit")]
    pub i: f64,
    #[serde(rename = "SiteClass", default)]
    pub site_class: SiteClass,
    #[serde(rename = "Direction", default)]
    pub direction: SpectrumDirection,
    #[serde(rename = "Interpolation", default)]
    pub interpolation: Interpolation,
    #[serde(rename = "Damping", default = "default_damping")]
    pub damping: f64,
}

impl SpectrumFunction {
    /// Horizontal TSC-2018 spectrum with default TL and damping
    pub fn tsc2018(name: &str, ss: f64, s1: f64, site_class: SiteClass, r: f64, d: f64, i: f64) -> Self {
        Self {
            function_type: default_function_type(),
            name: name.to_string(),
            ss,
            s1,
            tl: default_tl(),
            r,
            d,
            i,
            site_class,
            direction: SpectrumDirection::Horizontal,
            interpolation: Interpolation::Linear,
            damping: default_damping(),
        }
    }

    pub fn vertical(mut self) -> Self {
        self.direction = SpectrumDirection::Vertical;
        self
    }

    pub fn exact(mut self) -> Self {
        self.interpolation = Interpolation::Exact;
        self
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_tl(mut self, tl: f64) -> Self {
        self.tl = tl;
        self
    }
}

/// Tabulated spectrum: sorted periods and design ordinates (in g)
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumCurve {
    pub periods: Vec<f64>,
    pub values: Vec<f64>,
}

impl SpectrumCurve {
    /// Linear interpolation, clamped to the first and last ordinate
    pub fn interpolate(&self, t: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.periods.first(), self.periods.last()) else {
            return 0.0;
        };
        if t <= first {
            return self.values[0];
        }
        if t >= last {
            return self.values[self.values.len() - 1];
        }
        let hi = self.periods.partition_point(|&p| p < t);
        let (t1, t2) = (self.periods[hi - 1], self.periods[hi]);
        let (v1, v2) = (self.values[hi - 1], self.values[hi]);
        if t2 == t1 {
            return v2;
        }
        v1 + (t - t1) * (v2 - v1) / (t2 - t1)
    }
}

/// Piecewise-linear lookup on a table row, clamped at the ends
fn interpolate_coefficient(row: &[f64; 6], breakpoints: &[f64; 6], value: f64) -> f64 {
    if value <= breakpoints[0] {
        return row[0];
    }
    if value >= breakpoints[5] {
        return row[5];
    }
    for k in 0..5 {
        let (x1, x2) = (breakpoints[k], breakpoints[k + 1]);
        if value <= x2 {
            return row[k] + (value - x1) * (row[k + 1] - row[k]) / (x2 - x1);
        }
    }
    row[5]
}

/// Design spectrum of one function
#[derive(Debug, Clone)]
pub struct SpectrumGenerator {
    function: SpectrumFunction,
    fs: f64,
    f1: f64,
    sds: f64,
    sd1: f64,
    ta: f64,
    tb: f64,
    curve: SpectrumCurve,
}

impl SpectrumGenerator {
    /// Build the spectrum and its tabulated curve up to `t_max`
    pub fn new(function: &SpectrumFunction, t_max: f64) -> Self {
        let (fs, f1) = Self::coefficients(function.ss, function.s1, function.site_class);
        let sds = fs * function.ss;
        let sd1 = f1 * function.s1;
        let (ta, tb) = Self::corner_periods(sds, sd1);

        let mut generator = Self {
            function: function.clone(),
            fs,
            f1,
            sds,
            sd1,
            ta,
            tb,
            curve: SpectrumCurve {
                periods: Vec::new(),
                values: Vec::new(),
            },
        };
        generator.curve = generator.generate_curve(t_max);
        generator
    }

    /// Site coefficients (Fs, F1)
    pub fn coefficients(ss: f64, s1: f64, site_class: SiteClass) -> (f64, f64) {
        (
            interpolate_coefficient(&site_class.fs_row(), &SS_BREAKPOINTS, ss),
            interpolate_coefficient(&site_class.f1_row(), &S1_BREAKPOINTS, s1),
        )
    }

    /// Corner periods (TA, TB); both zero when SDS is zero
    pub fn corner_periods(sds: f64, sd1: f64) -> (f64, f64) {
        if sds == 0.0 {
            return (0.0, 0.0);
        }
        (0.2 * sd1 / sds, sd1 / sds)
    }

    pub fn function(&self) -> &SpectrumFunction {
        &self.function
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn f1(&self) -> f64 {
        self.f1
    }

    pub fn sds(&self) -> f64 {
        self.sds
    }

    pub fn sd1(&self) -> f64 {
        self.sd1
    }

    /// (TA, TB, TL)
    pub fn periods(&self) -> (f64, f64, f64) {
        (self.ta, self.tb, self.function.tl)
    }

    pub fn curve(&self) -> &SpectrumCurve {
        &self.curve
    }

    /// Horizontal elastic spectral acceleration Sae(T)
    pub fn horizontal_elastic(&self, t: f64) -> f64 {
        let tl = self.function.tl;
        if t < self.ta {
            self.sds * (0.4 + 0.6 * t / self.ta)
        } else if t <= self.tb {
            self.sds
        } else if t <= tl {
            self.sd1 / t
        } else {
            self.sd1 * tl / (t * t)
        }
    }

    /// Vertical elastic spectral acceleration SaeD(T)
    pub fn vertical_elastic(&self, t: f64) -> f64 {
        let tad = self.ta / 3.0;
        let tbd = self.tb / 3.0;
        let tld = self.function.tl / 2.0;
        if t < tad {
            self.sds * (0.32 + 0.48 * t / tad)
        } else if t <= tbd {
            0.8 * self.sds
        } else if t <= tld {
            0.8 * self.sds * tbd / t
        } else {
            0.0
        }
    }

    /// Seismic load reduction factor Ra(T)
    pub fn reduction_factor(&self, t: f64) -> f64 {
        let f = &self.function;
        let ra = f.r / f.i;
        if t > self.tb || self.tb <= 0.0 {
            ra
        } else {
            f.d + (ra - f.d) * t / self.tb
        }
    }

    /// Design ordinate in g at period `t`, from the closed-form spectrum
    pub fn design_acceleration(&self, t: f64) -> f64 {
        match self.function.direction {
            SpectrumDirection::Horizontal => {
                if t <= 0.0 {
                    0.4 * self.sds / self.function.d
                } else {
                    self.horizontal_elastic(t) / self.reduction_factor(t)
                }
            }
            SpectrumDirection::Vertical => {
                if t <= 0.0 {
                    0.32 * self.sds
                } else {
                    self.vertical_elastic(t)
                }
            }
        }
    }

    /// Key periods plus a regular grid that keeps clear of them
    pub fn generate_curve(&self, t_max: f64) -> SpectrumCurve {
        let key_points = match self.function.direction {
            SpectrumDirection::Horizontal => [0.0, self.ta, self.tb, self.function.tl],
            SpectrumDirection::Vertical => [0.0, self.ta / 3.0, self.tb / 3.0, self.function.tl / 2.0],
        };

        let mut periods: Vec<f64> = key_points.to_vec();
        let steps = (t_max / GRID_STEP).round() as usize;
        for k in 1..=steps {
            let t = k as f64 * GRID_STEP;
            if key_points.iter().all(|&key| (t - key).abs() >= MIN_KEY_DISTANCE) {
                periods.push(t);
            }
        }
        periods.sort_by(|a, b| a.total_cmp(b));
        periods.dedup();

        let values = periods.iter().map(|&t| self.design_acceleration(t)).collect();
        SpectrumCurve { periods, values }
    }

    /// Design ordinate in g using the function's interpolation mode
    pub fn spectral_acceleration(&self, t: f64) -> f64 {
        match self.function.interpolation {
            Interpolation::Linear => self.curve.interpolate(t),
            Interpolation::Exact => self.design_acceleration(t),
        }
    }
}
