//! IMBE Test Modules
//!
//! This module organizes the test suite for the IMBE codec implementation.

pub mod utils;
