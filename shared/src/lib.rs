pub mod breeds;
pub mod constants;
pub mod genetics;
pub mod lifecycle;
pub mod litter;
pub mod naming;
pub mod stats;
