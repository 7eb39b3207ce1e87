//! Codec implementations

pub mod imbe;

pub use imbe::ImbeVocoder;
