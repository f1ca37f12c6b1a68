// src/noise.rs
//! Детерминированный фрактальный шум Перлина
//!
//! Один слой берётся из `FastNoiseLite` (Perlin, частота 1), а сумма октав
//! считается здесь: каждая октава удваивает частоту и умножает амплитуду на
//! `persistence`, итог делится на `Σ persistenceⁱ`. Поэтому значение
//! всегда лежит в `[-1, 1]` независимо от числа октав, а частоту и амплитуду
//! задаёт вызывающий код.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};

pub struct NoiseField {
    noise: FastNoiseLite,
    octaves: u32,
    persistence: f32,
    normalizer: f32,
}

impl NoiseField {
    /// Создаёт поле с заданным сидом. `octaves` меньше 1 трактуется как 1.
    #[must_use]
    pub fn new(seed: i32, octaves: u32, persistence: f32) -> Self {
        let mut noise = FastNoiseLite::new();
        noise.set_seed(Some(seed));
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_fractal_type(Some(FractalType::None));
        noise.set_frequency(Some(1.0));

        let octaves = octaves.max(1);
        let normalizer = (0..octaves).map(|i| persistence.powi(i as i32)).sum::<f32>();

        Self {
            noise,
            octaves,
            persistence,
            normalizer,
        }
    }

    /// Нормализованное значение в `[-1, 1]`.
    #[must_use]
    pub fn value(&self, x: f64, y: f64) -> f32 {
        let mut total = 0.0;
        let mut frequency = 1.0_f64;
        let mut amplitude = 1.0_f32;

        for _ in 0..self.octaves {
            let single = self
                .noise
                .get_noise_2d((x * frequency) as f32, (y * frequency) as f32)
                .clamp(-1.0, 1.0);
            total += single * amplitude;
            amplitude *= self.persistence;
            frequency *= 2.0;
        }

        if self.normalizer > 0.0 {
            total / self.normalizer
        } else {
            total
        }
    }

    /// `amplitude * value(x * frequency, y * frequency)`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64, frequency: f64, amplitude: f32) -> f32 {
        amplitude * self.value(x * frequency, y * frequency)
    }

    #[must_use]
    pub fn octaves(&self) -> u32 {
        self.octaves
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField")
            .field("octaves", &self.octaves)
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}
