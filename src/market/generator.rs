//! Bounded random-walk price path.
//!
//! Each step is `previous + U(-step_bound, step_bound)` with an independent
//! `U(0, max_volume)` volume draw. The generator keeps no state besides its
//! RNG, so the path is a pure function of the previous sample and the draw.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::constants::simulation::{MAX_REDRAWS, MIN_PRICE};
use crate::data::window::{PriceSample, PriceWindow};

pub struct PricePathGenerator<R = StdRng> {
    step_bound: f64,
    max_volume: f64,
    rng: R,
}

impl PricePathGenerator<StdRng> {
    pub fn new(step_bound: f64, max_volume: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), step_bound, max_volume)
    }

    pub fn with_seed(seed: u64, step_bound: f64, max_volume: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), step_bound, max_volume)
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        match config.rng_seed {
            Some(seed) => Self::with_seed(seed, config.step_bound, config.max_volume),
            None => Self::new(config.step_bound, config.max_volume),
        }
    }
}

impl<R: Rng> PricePathGenerator<R> {
    pub fn with_rng(rng: R, step_bound: f64, max_volume: f64) -> Self {
        Self {
            step_bound: finite_or_zero(step_bound.abs()),
            max_volume: finite_or_zero(max_volume.max(0.0)),
            rng,
        }
    }

    /// Next sample after `previous`, stamped `at`. Never returns a
    /// non-positive price: negative steps are redrawn, then clamped.
    pub fn advance(&mut self, previous: &PriceSample, at: DateTime<Utc>) -> PriceSample {
        let mut price = previous.price + self.draw_step();
        let mut attempts = 1;
        while price <= 0.0 && attempts < MAX_REDRAWS {
            price = previous.price + self.draw_step();
            attempts += 1;
        }
        if !(price > 0.0) {
            price = MIN_PRICE;
        }

        PriceSample::new(at, price, self.draw_volume())
    }

    /// Fills `window` with `count` samples spaced `spacing` apart and ending
    /// at `end`, starting the walk from `base_price`.
    pub fn seed_window(
        &mut self,
        window: &mut PriceWindow,
        base_price: f64,
        count: usize,
        end: DateTime<Utc>,
        spacing: Duration,
    ) {
        if count == 0 {
            return;
        }

        let start = end - spacing * (count as i32 - 1);
        let mut previous = PriceSample::new(start, base_price.max(MIN_PRICE), self.draw_volume());
        window.push(previous);

        for i in 1..count {
            let next = self.advance(&previous, start + spacing * i as i32);
            window.push(next);
            previous = next;
        }
    }

    // Unit draws scaled by the bound, so a very wide bound cannot make the
    // sampling range itself overflow
    fn draw_step(&mut self) -> f64 {
        if self.step_bound > 0.0 {
            self.step_bound * self.rng.gen_range(-1.0..=1.0)
        } else {
            0.0
        }
    }

    fn draw_volume(&mut self) -> f64 {
        if self.max_volume > 0.0 {
            self.max_volume * self.rng.gen::<f64>()
        } else {
            0.0
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
