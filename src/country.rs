// src/country.rs
//! Полный конвейер генерации страны
//!
//! шум → берег → точки на суше → триангуляция → районы → демография → регионы.
//! Вся случайность идёт из одного `ChaCha8Rng`, засеянного `params.seed`,
//! поэтому один и тот же сид всегда даёт одну и ту же страну.

use crate::attributes::apply_demographics;
use crate::coastline::CoastlineBuilder;
use crate::config::GenerationParams;
use crate::district::graph::build_district_graph;
use crate::district::merge::{DistrictMerger, MergeReport};
use crate::district::{District, DistrictArena, DistrictId};
use crate::error::GenerationError;
use crate::geometry::Polygon;
use crate::noise::NoiseField;
use crate::region::{EqualizationReport, Region, RegionAllocator};
use crate::triangulation::{place_seed_points, triangulate_land};
use petgraph::algo::connected_components;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Сводка по этапам генерации.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub land_triangles: usize,
    /// Площадь суши по треугольникам до слияния
    pub land_area: f64,
    pub merge: MergeReport,
    /// Компоненты связности графа смежности районов (острова дают свои)
    pub components: usize,
    pub equalization: EqualizationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Country {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    /// Кольца суши, первое из них материк
    pub landmass: Vec<Polygon>,
    pub districts: Vec<District>,
    pub regions: Vec<Region>,
    /// Районы-города, первый из них столица
    pub cities: Vec<DistrictId>,
    pub report: GenerationReport,
}

impl Country {
    #[must_use]
    pub fn capital(&self) -> Option<&District> {
        self.cities.first().and_then(|id| self.districts.get(id.0))
    }

    #[must_use]
    pub fn total_population(&self) -> u64 {
        self.districts.iter().map(District::population).sum()
    }

    #[must_use]
    pub fn district_area(&self) -> f64 {
        self.districts.iter().map(District::area).sum()
    }
}

/// Генерация с параметрами по умолчанию и заданными счётчиками.
pub fn generate(
    seed: u64,
    district_count: usize,
    region_count: usize,
    internal_points: usize,
) -> Result<Country, GenerationError> {
    generate_with(&GenerationParams::new(seed, district_count, region_count, internal_points))
}

pub fn generate_with(params: &GenerationParams) -> Result<Country, GenerationError> {
    params.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let width = params.width.unwrap_or_else(|| rng.gen_range(7..=10) * 100);
    let height = params.height.unwrap_or_else(|| rng.gen_range(7..=10) * 100);
    tracing::info!(
        target: "countrygen::country",
        seed = params.seed,
        width,
        height,
        districts = params.district_count,
        regions = params.region_count,
        "country.generation.started"
    );

    let c = &params.coastline;
    let noise_x = NoiseField::new(rng.r#gen(), c.noise_octaves, c.noise_persistence);
    let noise_y = NoiseField::new(rng.r#gen(), c.noise_octaves, c.noise_persistence);
    let (w, h) = (f64::from(width), f64::from(height));
    let landmass = CoastlineBuilder::new(c, w, h, &noise_x, &noise_y).build()?;

    let seeds = place_seed_points(
        &mut rng,
        &landmass,
        w,
        h,
        params.internal_points,
        params.seed_placement_attempts,
    )?;
    let triangulation = triangulate_land(&landmass, &seeds)?;
    if triangulation.len() < params.district_count {
        return Err(GenerationError::InsufficientLand {
            available: triangulation.len(),
            requested: params.district_count,
        });
    }
    let land_triangles = triangulation.len();
    let land_area = triangulation.land_area();

    let mut arena = DistrictArena::from_triangulation(&triangulation);
    let merge = DistrictMerger::new(&params.merge, land_area, params.district_count).run(&mut arena)?;
    let mut districts = arena.into_districts();
    let components = connected_components(&build_district_graph(&districts));
    tracing::debug!(
        target: "countrygen::country",
        districts = districts.len(),
        components,
        "country.districts.connected"
    );

    let cities = apply_demographics(&mut rng, &mut districts, &landmass, &params.attributes);
    let (regions, equalization) =
        RegionAllocator::new(&params.regions).allocate(&mut rng, &mut districts, params.region_count)?;

    let country = Country {
        seed: params.seed,
        width,
        height,
        landmass,
        districts,
        regions,
        cities,
        report: GenerationReport {
            land_triangles,
            land_area,
            merge,
            components,
            equalization,
        },
    };
    tracing::info!(
        target: "countrygen::country",
        districts = country.districts.len(),
        regions = country.regions.len(),
        population = country.total_population(),
        "country.generation.done"
    );
    Ok(country)
}
