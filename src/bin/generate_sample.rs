//! Writes a synthetic tank export for trying out the viewer.
//!
//! Usage: `generate_sample [OUTPUT.csv]` (default `sample_tanks.csv`).

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// A simulated tank: draining slowly, refilled when low.
struct Tank {
    name: &'static str,
    capacity_hl: f64,
    level_hl: f64,
    gravity: f64,
    material: &'static str,
}

/// Codes from the built-in material table, plus an alias and a code
/// written as a decimal.
const MATERIALS: [&str; 7] = ["7", "8", "9", "28", "1", "ichnusa", "9.0"];

/// European decimal comma, as in the plant exports.
fn euro(v: f64, decimals: usize) -> String {
    format!("{v:.decimals$}").replace('.', ",")
}

fn main() -> Result<()> {
    let output = std::env::args().nth(1).unwrap_or_else(|| "sample_tanks.csv".to_string());
    let mut rng = SimpleRng::new(42);

    let mut tanks = vec![
        Tank { name: "FST1", capacity_hl: 600.0, level_hl: 520.0, gravity: 12.0, material: "7" },
        Tank { name: "FST2", capacity_hl: 600.0, level_hl: 300.0, gravity: 11.5, material: "9" },
        Tank { name: "FST3", capacity_hl: 400.0, level_hl: 0.0, gravity: 0.0, material: "0" },
        Tank { name: "BBT1", capacity_hl: 250.0, level_hl: 180.0, gravity: 11.2, material: "8" },
        Tank { name: "BBT2", capacity_hl: 250.0, level_hl: 90.0, gravity: 11.8, material: "28" },
        Tank { name: "RBT1", capacity_hl: 120.0, level_hl: 60.0, gravity: 4.0, material: "32" },
    ];

    let mut header = vec!["Time".to_string()];
    for tank in &tanks {
        header.push(format!("{} Average Gravity", tank.name));
        header.push(format!("{} Level", tank.name));
        header.push(format!("{} Material", tank.name));
    }

    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("creating {output}"))?;
    writer.write_record(&header)?;

    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_time(NaiveTime::MIN).checked_add_signed(Duration::hours(6)))
        .context("invalid start date")?;

    let mut rows = 0usize;
    for step in 0..(7 * 4) {
        let ts = start + Duration::hours(6 * step);
        let mut record = vec![ts.format("%d/%m/%Y %H:%M:%S").to_string()];

        for tank in &mut tanks {
            if tank.material != "0" {
                tank.level_hl = (tank.level_hl - rng.gauss(12.0, 4.0).max(0.0)).max(0.0);
                if tank.level_hl < tank.capacity_hl * 0.1 {
                    tank.level_hl = tank.capacity_hl * 0.9;
                    tank.material = *rng.pick(&MATERIALS);
                    tank.gravity = rng.gauss(11.5, 0.6);
                }
            }

            // Occasional gaps: blank gravity cells are skipped by the analyzer.
            let gravity = if rng.next_f64() < 0.05 {
                String::new()
            } else {
                euro(tank.gravity + rng.gauss(0.0, 0.05), 2)
            };
            record.push(gravity);
            record.push(euro(tank.level_hl, 1));
            record.push(tank.material.to_string());
        }

        writer.write_record(&record)?;
        rows += 1;
    }
    writer.flush()?;

    println!("Wrote {rows} rows for {} tanks to {output}", tanks.len());
    Ok(())
}
