//! Behaviour suite of the docfield document model

pub mod features;
