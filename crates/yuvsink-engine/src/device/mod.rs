//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - binding a Surface to an owned or adopted native window
//! - acquiring surface frames and presenting them
//! - the leaked driver descriptor sweep run after teardown

mod config;
mod gpu;
mod quirks;
mod surface;

pub use config::GpuConfig;
pub use gpu::{AdoptedTarget, GpuContext, SurfaceFrame};
pub use quirks::{LeakedFdSweep, SweepReport, LEAKY_DEVICE_NODES};
pub use surface::SurfaceRecovery;
