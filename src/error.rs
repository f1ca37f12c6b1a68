// src/error.rs
//! Ошибки генерации страны
//!
//! Генерация представляет собой чистое пакетное вычисление, поэтому набор ошибок узкий:
//! неверные параметры, исчерпанная выборка точек и нарушения топологии.
//! Ни одна из них не повторяется молча: любая ошибка прерывает текущий запуск.

use crate::geometry::Point;
use thiserror::Error;

/// Ошибка одного запуска генерации.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("coastline collapsed: mainland ring has {points} points")]
    DegenerateCoastline { points: usize },

    #[error("could not place seed point {index} on land after {attempts} attempts")]
    SeedPlacementExhausted { index: usize, attempts: usize },

    #[error("only {available} land triangles available for {requested} districts")]
    InsufficientLand { available: usize, requested: usize },

    #[error("only {available} districts left for {requested} regions")]
    TooFewDistricts { available: usize, requested: usize },

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Нарушение топологического инварианта. Продолжать после такой ошибки нельзя.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("degenerate triangle {a:?} {b:?} {c:?}: zero circumcircle determinant")]
    DegenerateTriangle { a: Point, b: Point, c: Point },

    #[error("shared vertex run does not occur on the polygon ring")]
    SharedRunNotFound,

    #[error("cannot merge two polygons with identical rings")]
    IdenticalRings,

    #[error("districts {0} and {1} are linked but share no boundary edge")]
    MissingSharedEdge(usize, usize),

    #[error("district {0} is not alive in the arena")]
    UnknownDistrict(usize),
}
