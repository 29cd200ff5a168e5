//! Benchmark Harness Module
//!
//! Input generation and the in-process measurement loop.
//!
//! # Components
//!
//! - [`generator`] - Seeded `A_{n}.bin` / `B_{n}.bin` generation
//! - [`sampler`] - Process CPU / RSS sampling behind [`sampler::ResourceSampler`]
//! - [`pacing`] - Warm-up, cooldown and poll pauses behind [`pacing::Sleeper`]
//! - [`runner`] - Warm-up plus sampled, paced multiplication iterations

pub mod generator;
pub mod pacing;
pub mod runner;
pub mod sampler;
