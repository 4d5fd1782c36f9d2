//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue, with or without a window
//! - creating & configuring the Surface (swapchain)
//! - handing out `WgpuContext`s bound to the device

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuDevice, GpuFrame};
pub use init::GpuInit;
pub(crate) use surface::has_area;
pub use surface::SurfaceErrorAction;
