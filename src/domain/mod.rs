// Domain layer - descriptors, requests and plans

pub mod model;
pub mod plan;
