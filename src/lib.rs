//! Spatial Pooler of Hierarchical Temporal Memory (HTM).
//!
//! The pooler turns dense input vectors into sparse sets of active columns. Build one from a
//! [`core::config::SpatialPoolerConfig`] and feed it inputs through
//! [`core::spatial_pooler::SpatialPooler::compute`].

pub mod core;
