//! Fidelity metrics for reconstructed-scene renders.
//!
//! [`compare`] scores a rendered image against a reference photo (PSNR and
//! SSIM over a configurable pixel region) and draws a diff image; [`batch`]
//! runs that over a directory of cameras and [`report`] aggregates the
//! results into the persisted per-mesh record.

pub mod batch;
pub mod compare;
pub mod config;
pub mod decode;
pub mod report;
