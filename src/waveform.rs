//! Cosine sweeps used to drive brightness and colour temperature effects
use std::f64::consts::PI;

use crate::datatypes::{MAX_KELVIN, MIN_KELVIN};

const LABEL_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    pub min: f64,
    pub max: f64,
    pub samples: usize,
    /// Number of full cosine cycles across the samples
    pub periods: f64,
    /// Phase offset in radians
    pub phase: f64,
}

impl Waveform {
    pub fn new(min: f64, max: f64, samples: usize) -> Waveform {
        Waveform {
            min,
            max,
            samples,
            periods: 1.0,
            phase: 0.0,
        }
    }

    pub fn periods(mut self, periods: f64) -> Waveform {
        self.periods = periods;
        self
    }

    pub fn phase(mut self, phase: f64) -> Waveform {
        self.phase = phase;
        self
    }

    /// Full-range brightness sweep, 0 to 255
    pub fn brightness(samples: usize) -> Waveform {
        Waveform::new(0.0, 255.0, samples)
    }

    /// Sweep across the colour temperatures a tunable bulb accepts
    pub fn temperature(samples: usize) -> Waveform {
        Waveform::new(f64::from(MIN_KELVIN), f64::from(MAX_KELVIN), samples)
    }

    pub fn values(&self) -> Vec<f64> {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        let mid = (self.min + self.max) / 2.0;
        let amplitude = (self.max - self.min) / 2.0;

        (0..self.samples)
            .map(|i| {
                let angle = 2.0 * PI * self.periods * i as f64 / self.samples as f64 + self.phase;
                (mid + amplitude * angle.cos()).max(lo).min(hi)
            })
            .collect()
    }

    pub fn brightness_levels(&self) -> Vec<u8> {
        self.values()
            .into_iter()
            .map(|value| value.round().max(0.0).min(255.0) as u8)
            .collect()
    }

    pub fn temperatures(&self) -> Vec<u16> {
        self.values()
            .into_iter()
            .map(|value| {
                value
                    .round()
                    .max(f64::from(MIN_KELVIN))
                    .min(f64::from(MAX_KELVIN)) as u16
            })
            .collect()
    }
}

/// Render `values` as a text chart with at most `width` plotted columns
///
/// Each line is prefixed by an 8-column value label and ` |`.
pub fn plot(values: &[f64], width: usize, height: usize) -> String {
    if values.is_empty() || width == 0 || height == 0 {
        return String::new();
    }

    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let columns = width.min(values.len());
    let rows: Vec<usize> = (0..columns)
        .map(|column| {
            let value = values[column * values.len() / columns];
            ((value - lo) / span * (height - 1) as f64).round() as usize
        })
        .collect();

    let mut chart = String::new();
    for row in (0..height).rev() {
        let label = if row == height - 1 {
            format!("{:>width$.1}", hi, width = LABEL_WIDTH)
        } else if row == 0 {
            format!("{:>width$.1}", lo, width = LABEL_WIDTH)
        } else {
            " ".repeat(LABEL_WIDTH)
        };
        let line: String = rows
            .iter()
            .map(|level| if *level == row { '*' } else { ' ' })
            .collect();
        chart.push_str(format!("{} |{}", label, line).trim_end());
        chart.push('\n');
    }
    chart
}
