pub mod config;
pub mod error;
pub mod homeostasis;
pub mod inhibition;
pub mod mapping;
pub mod overlap;
pub mod spatial_pooler;
pub mod synapses;
pub mod topology;
