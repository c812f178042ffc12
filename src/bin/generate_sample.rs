use anyhow::{Context, Result};

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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    /// Uniform jitter in [-spread, spread].
    fn jitter(&mut self, spread: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * spread
    }
}

/// Write a sample ternary CSV the `/upload` endpoint accepts: three rock
/// classes scattered around typical SiO2 / Al2O3 / MgO compositions.
fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // (class, center composition, jitter)
    let classes: [(&str, [f64; 3], f64); 3] = [
        ("Basalt", [50.0, 15.0, 8.0], 3.0),
        ("Andesite", [60.0, 17.0, 3.5], 2.5),
        ("Rhyolite", [74.0, 13.0, 0.5], 2.0),
    ];
    let samples_per_class = 12;

    let output_path = "sample_ternary.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer
        .write_record(["title", "class", "SiO2", "Al2O3", "MgO"])
        .context("writing CSV header")?;

    let mut total = 0usize;
    for (class, center, spread) in classes {
        for i in 0..samples_per_class {
            let values: Vec<String> = center
                .iter()
                .map(|&c| format!("{:.2}", (c + rng.jitter(spread)).max(0.0)))
                .collect();
            writer
                .write_record([
                    format!("{class}-{i:02}"),
                    class.to_string(),
                    values[0].clone(),
                    values[1].clone(),
                    values[2].clone(),
                ])
                .context("writing CSV row")?;
            total += 1;
        }
    }
    writer.flush().context("flushing CSV writer")?;

    println!("Wrote {total} rows to {output_path}");
    Ok(())
}
