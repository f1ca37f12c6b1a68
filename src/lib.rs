pub mod attributes;
pub mod coastline;
pub mod config;
pub mod country;
pub mod district;
pub mod error;
pub mod geometry;
pub mod noise;
pub mod region;
pub mod triangulation;

pub use config::{AttributeSettings, CoastlineSettings, GenerationParams, MergeSettings, RegionSettings};
pub use country::{Country, GenerationReport, generate, generate_with};
pub use district::{District, DistrictId};
pub use error::{GenerationError, TopologyError};
pub use region::{Region, RegionId};
