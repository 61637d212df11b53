//! Cutting-stock planning for steel procurement.
//!
//! Takes a bill of materials of required cut lengths per profile and works
//! out how many standard-length stock bars to buy and how to saw them,
//! routing already-held profiles to a stock CHECK list and pre-cut profiles
//! past the packer entirely.

pub mod catalog;
pub mod normalize;
pub mod planner;
pub mod types;

pub use catalog::{Catalog, CatalogSpec};
pub use normalize::MaterialKey;
pub use planner::{pack, Planner};
pub use types::{
    BomRow, BundlingMode, BuyLine, CheckLine, PackError, PlanError, PlanSummary, ProcessRequest,
    ProcessResult, StockLength, Warning,
};
