// src/config.rs
//! Конфигурация генерации страны
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией:
//! - Форма береговой линии (эллипс, шум, острова)
//! - Количество районов, регионов и внутренних точек триангуляции
//! - Пороги очистки мелких районов
//! - Выравнивание населения регионов и синтез демографии
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Ошибка загрузки конфигурации.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Настройки береговой линии
///
/// Берег строится обходом эллипса, каждая точка которого смещается двумя
/// независимыми полями шума по X и Y.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoastlineSettings {
    /// Количество шагов обхода эллипса (точек исходного кольца)
    #[serde(default = "default_boundary_points")]
    pub boundary_points: usize,

    /// Размер эллипса относительно карты по каждой оси
    #[serde(default = "default_ellipse_scale")]
    pub ellipse_scale: f64,

    /// Частота шума в координатах карты
    #[serde(default = "default_noise_frequency")]
    pub noise_frequency: f64,

    /// Амплитуда смещения как доля меньшей полуоси эллипса
    #[serde(default = "default_noise_amplitude")]
    pub noise_amplitude: f64,

    /// Количество октав шума
    #[serde(default = "default_noise_octaves")]
    pub noise_octaves: u32,

    /// Множитель амплитуды между октавами
    #[serde(default = "default_noise_persistence")]
    pub noise_persistence: f32,

    /// Поле вокруг суши при масштабировании под размер карты (доля)
    #[serde(default = "default_margin")]
    pub margin: f64,

    /// Сколько точек отрезается с каждого края отколовшегося острова
    #[serde(default = "default_island_trim")]
    pub island_trim: usize,

    /// Остров сохраняется, только если после обрезки в нём больше точек
    #[serde(default = "default_min_island_points")]
    pub min_island_points: usize,

    /// Ограничение на число исправлений самопересечений на кольцо
    #[serde(default = "default_max_untangle_passes")]
    pub max_untangle_passes: usize,
}

fn default_boundary_points() -> usize {
    360
}
fn default_ellipse_scale() -> f64 {
    0.75
}
fn default_noise_frequency() -> f64 {
    0.006
}
fn default_noise_amplitude() -> f64 {
    0.45
}
fn default_noise_octaves() -> u32 {
    4
}
fn default_noise_persistence() -> f32 {
    0.5
}
fn default_margin() -> f64 {
    0.05
}
fn default_island_trim() -> usize {
    2
}
fn default_min_island_points() -> usize {
    3
}
fn default_max_untangle_passes() -> usize {
    10_000
}

impl Default for CoastlineSettings {
    fn default() -> Self {
        Self {
            boundary_points: default_boundary_points(),
            ellipse_scale: default_ellipse_scale(),
            noise_frequency: default_noise_frequency(),
            noise_amplitude: default_noise_amplitude(),
            noise_octaves: default_noise_octaves(),
            noise_persistence: default_noise_persistence(),
            margin: default_margin(),
            island_trim: default_island_trim(),
            min_island_points: default_min_island_points(),
            max_untangle_passes: default_max_untangle_passes(),
        }
    }
}

/// Пороги очистки после роста районов
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeSettings {
    /// Район меньше `target / cleanup_divisor` сливается с лучшим соседом любого размера
    #[serde(default = "default_cleanup_divisor")]
    pub cleanup_divisor: f64,

    /// Район меньше `target / deletion_divisor` после очистки удаляется
    #[serde(default = "default_deletion_divisor")]
    pub deletion_divisor: f64,
}

fn default_cleanup_divisor() -> f64 {
    5.0
}
fn default_deletion_divisor() -> f64 {
    75.0
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            cleanup_divisor: default_cleanup_divisor(),
            deletion_divisor: default_deletion_divisor(),
        }
    }
}

/// Настройки выравнивания регионов
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionSettings {
    /// Верхняя граница числа проходов выравнивания населения
    #[serde(default = "default_max_equalization_passes")]
    pub max_equalization_passes: usize,
}

fn default_max_equalization_passes() -> usize {
    1000
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            max_equalization_passes: default_max_equalization_passes(),
        }
    }
}

/// Настройки синтеза демографии районов
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeSettings {
    /// Количество городов (первый из них столица)
    #[serde(default = "default_city_count")]
    pub city_count: usize,

    /// Население на единицу площади при плотности 1.0
    #[serde(default = "default_population_per_unit_area")]
    pub population_per_unit_area: f64,

    /// Частота шума урбанизации
    #[serde(default = "default_urban_noise_frequency")]
    pub urban_noise_frequency: f64,
}

fn default_city_count() -> usize {
    6
}
fn default_population_per_unit_area() -> f64 {
    25.0
}
fn default_urban_noise_frequency() -> f64 {
    0.01
}

impl Default for AttributeSettings {
    fn default() -> Self {
        Self {
            city_count: default_city_count(),
            population_per_unit_area: default_population_per_unit_area(),
            urban_noise_frequency: default_urban_noise_frequency(),
        }
    }
}

/// Основные параметры генерации страны
///
/// Полная конфигурация для одного запуска. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Сид генератора случайных чисел (детерминированная генерация)
    pub seed: u64,

    /// Ширина карты; если не задана, выбирается из {700, 800, 900, 1000}
    #[serde(default)]
    pub width: Option<u32>,

    /// Высота карты; если не задана, выбирается из {700, 800, 900, 1000}
    #[serde(default)]
    pub height: Option<u32>,

    /// Желаемое количество районов
    #[serde(default = "default_district_count")]
    pub district_count: usize,

    /// Количество регионов (групп районов с равным населением)
    #[serde(default = "default_region_count")]
    pub region_count: usize,

    /// Количество случайных внутренних точек триангуляции
    #[serde(default = "default_internal_points")]
    pub internal_points: usize,

    /// Сколько попыток даётся на размещение одной точки на суше
    #[serde(default = "default_seed_placement_attempts")]
    pub seed_placement_attempts: usize,

    #[serde(default)]
    pub coastline: CoastlineSettings,

    #[serde(default)]
    pub merge: MergeSettings,

    #[serde(default)]
    pub regions: RegionSettings,

    #[serde(default)]
    pub attributes: AttributeSettings,
}

fn default_district_count() -> usize {
    500
}
fn default_region_count() -> usize {
    10
}
fn default_internal_points() -> usize {
    5000
}
fn default_seed_placement_attempts() -> usize {
    10_000
}

impl GenerationParams {
    /// Параметры по умолчанию с указанными счётчиками.
    #[must_use]
    pub fn new(seed: u64, district_count: usize, region_count: usize, internal_points: usize) -> Self {
        Self {
            seed,
            district_count,
            region_count,
            internal_points,
            ..Self::default()
        }
    }

    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # country.toml
    /// seed = 42
    /// district_count = 300
    /// region_count = 8
    ///
    /// [coastline]
    /// noise_amplitude = 0.3
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Проверки до начала любой геометрической работы.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let invalid = |msg: String| Err(GenerationError::InvalidConfig(msg));

        if self.district_count == 0 {
            return invalid("district_count must be positive".into());
        }
        if self.region_count == 0 {
            return invalid("region_count must be positive".into());
        }
        if self.region_count > self.district_count {
            return invalid(format!(
                "region_count ({}) exceeds district_count ({})",
                self.region_count, self.district_count
            ));
        }
        if self.seed_placement_attempts == 0 {
            return invalid("seed_placement_attempts must be positive".into());
        }
        if matches!(self.width, Some(0)) || matches!(self.height, Some(0)) {
            return invalid("map dimensions must be positive".into());
        }

        let c = &self.coastline;
        if c.boundary_points < 3 {
            return invalid(format!("boundary_points must be at least 3, got {}", c.boundary_points));
        }
        if !(c.ellipse_scale.is_finite() && c.ellipse_scale > 0.0) {
            return invalid("ellipse_scale must be finite and positive".into());
        }
        if !(c.noise_frequency.is_finite() && c.noise_amplitude.is_finite() && c.noise_amplitude >= 0.0) {
            return invalid("coastline noise parameters must be finite".into());
        }
        if !(0.0..0.5).contains(&c.margin) {
            return invalid(format!("margin must lie in [0, 0.5), got {}", c.margin));
        }

        let m = &self.merge;
        if !(m.cleanup_divisor > 0.0 && m.deletion_divisor > 0.0) {
            return invalid("merge divisors must be positive".into());
        }
        Ok(())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: 0,
            width: None,
            height: None,
            district_count: default_district_count(),
            region_count: default_region_count(),
            internal_points: default_internal_points(),
            seed_placement_attempts: default_seed_placement_attempts(),
            coastline: CoastlineSettings::default(),
            merge: MergeSettings::default(),
            regions: RegionSettings::default(),
            attributes: AttributeSettings::default(),
        }
    }
}
