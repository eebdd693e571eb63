//! Signal Simulation Library
//!
//! An adaptive, emergency-aware signal controller for a single four-way
//! intersection, runnable headless.

pub mod simulation;
