// Domain layer - pure types and transformations, no I/O
pub mod dashboard;
pub mod equipment;
pub mod field;
pub mod fleet;
pub mod insight;
pub mod policy;
pub mod reading;
pub mod registry;
pub mod row;
