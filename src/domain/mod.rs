// Domain layer - Core types, errors and rules

pub mod errors;
pub mod model;
pub mod rules;
