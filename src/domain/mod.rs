// Domain layer - Media description consumed by the report builder

pub mod errors;
pub mod model;
