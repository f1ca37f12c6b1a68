// src/district/mod.rs
//! Районы: полигоны из слитых треугольников, смежность и арена владения.
//!
//! Районы живут в арене и ссылаются друг на друга (и на регион) только по
//! индексам. Смежность всегда симметрична: арена правит обе стороны связи.

pub mod graph;
pub mod merge;

use crate::attributes::Demographics;
use crate::error::TopologyError;
use crate::geometry::{AdjacencyInfo, Point, Polygon, bounding_box_center};
use crate::region::RegionId;
use crate::triangulation::Triangulation;
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DistrictId(pub usize);

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct District {
    pub id: DistrictId,
    polygon: Polygon,
    adjacent: BTreeSet<DistrictId>,
    region: Option<RegionId>,
    #[serde(skip)]
    center: OnceCell<Point>,
    pub demographics: Demographics,
}

impl District {
    #[must_use]
    pub fn new(id: DistrictId, polygon: Polygon) -> Self {
        Self {
            id,
            polygon,
            adjacent: BTreeSet::new(),
            region: None,
            center: OnceCell::new(),
            demographics: Demographics::default(),
        }
    }

    #[must_use]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        self.polygon.vertices()
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygon.area()
    }

    #[must_use]
    pub fn adjacent(&self) -> &BTreeSet<DistrictId> {
        &self.adjacent
    }

    #[must_use]
    pub fn is_adjacent_to(&self, other: DistrictId) -> bool {
        self.adjacent.contains(&other)
    }

    #[must_use]
    pub fn region(&self) -> Option<RegionId> {
        self.region
    }

    pub(crate) fn set_region(&mut self, region: Option<RegionId>) {
        self.region = region;
    }

    #[must_use]
    pub fn population(&self) -> u64 {
        self.demographics.population
    }

    /// Центр ограничивающего прямоугольника; вычисляется один раз.
    #[must_use]
    pub fn center(&self) -> Point {
        *self.center.get_or_init(|| bounding_box_center(self.polygon.vertices()))
    }
}

/// Арена районов. Слот пустеет, когда район поглощён или удалён.
#[derive(Debug, Clone, Default)]
pub struct DistrictArena {
    slots: Vec<Option<District>>,
}

impl DistrictArena {
    /// Каждый треугольник суши становится районом со смежностью триангуляции.
    #[must_use]
    pub fn from_triangulation(triangulation: &Triangulation) -> Self {
        let slots = triangulation
            .triangles
            .iter()
            .zip(&triangulation.adjacency)
            .enumerate()
            .map(|(i, (triangle, neighbours))| {
                let mut district = District::new(DistrictId(i), Polygon::new(triangle.vertices.to_vec()));
                district.adjacent = neighbours.iter().map(|&n| DistrictId(n)).collect();
                Some(district)
            })
            .collect();
        Self { slots }
    }

    /// Арена из готовых полигонов; связи задаются через [`DistrictArena::link`].
    #[must_use]
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        let slots = polygons
            .into_iter()
            .enumerate()
            .map(|(i, polygon)| Some(District::new(DistrictId(i), polygon)))
            .collect();
        Self { slots }
    }

    /// Связывает два района (в обе стороны).
    pub fn link(&mut self, a: DistrictId, b: DistrictId) {
        if a == b {
            return;
        }
        if let Some(d) = self.get_mut(a) {
            d.adjacent.insert(b);
        }
        if let Some(d) = self.get_mut(b) {
            d.adjacent.insert(a);
        }
    }

    #[must_use]
    pub fn get(&self, id: DistrictId) -> Option<&District> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: DistrictId) -> Option<&mut District> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Живые районы в порядке возрастания идентификатора.
    pub fn iter(&self) -> impl Iterator<Item = &District> {
        self.slots.iter().flatten()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<DistrictId> {
        self.iter().map(|d| d.id).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.iter().map(District::area).sum()
    }

    /// Общая граница двух районов, заявленных смежными.
    pub fn adjacency_info(&self, a: DistrictId, b: DistrictId) -> Result<AdjacencyInfo, TopologyError> {
        let da = self.get(a).ok_or(TopologyError::UnknownDistrict(a.0))?;
        let db = self.get(b).ok_or(TopologyError::UnknownDistrict(b.0))?;
        da.polygon
            .adjacency_info(&db.polygon)
            .ok_or(TopologyError::MissingSharedEdge(a.0, b.0))
    }

    /// `keep` поглощает `gone`: полигоны сливаются, соседи `gone` переходят к `keep`.
    pub fn absorb(&mut self, keep: DistrictId, gone: DistrictId, info: &AdjacencyInfo) -> Result<(), TopologyError> {
        if keep == gone || self.get(keep).is_none() {
            return Err(TopologyError::UnknownDistrict(keep.0));
        }
        let absorbed = self
            .slots
            .get_mut(gone.0)
            .and_then(Option::take)
            .ok_or(TopologyError::UnknownDistrict(gone.0))?;

        let Some(district) = self.get_mut(keep) else {
            return Err(TopologyError::UnknownDistrict(keep.0));
        };
        if let Err(err) = district.polygon.merge_with(&absorbed.polygon, info) {
            self.slots[gone.0] = Some(absorbed);
            return Err(err);
        }
        district.center = OnceCell::new();
        district.adjacent.remove(&gone);
        let inherited: Vec<DistrictId> = absorbed.adjacent.iter().copied().filter(|&n| n != keep).collect();
        district.adjacent.extend(inherited.iter().copied());

        for n in inherited {
            if let Some(neighbour) = self.get_mut(n) {
                neighbour.adjacent.remove(&gone);
                neighbour.adjacent.insert(keep);
            }
        }
        Ok(())
    }

    /// Удаляет район и все ссылки на него.
    pub fn delete(&mut self, id: DistrictId) -> Option<District> {
        let removed = self.slots.get_mut(id.0)?.take()?;
        for &n in &removed.adjacent {
            if let Some(neighbour) = self.get_mut(n) {
                neighbour.adjacent.remove(&id);
            }
        }
        Some(removed)
    }

    /// Уплотняет арену: живые районы получают идентификаторы `0..n`.
    #[must_use]
    pub fn into_districts(self) -> Vec<District> {
        let mut remap = vec![None; self.slots.len()];
        for (new, old) in self.slots.iter().enumerate().filter(|(_, s)| s.is_some()).map(|(i, _)| i).enumerate() {
            remap[old] = Some(DistrictId(new));
        }
        self.slots
            .into_iter()
            .flatten()
            .map(|mut district| {
                district.id = remap[district.id.0].unwrap_or(district.id);
                district.adjacent = district.adjacent.iter().filter_map(|n| remap[n.0]).collect();
                district
            })
            .collect()
    }
}
