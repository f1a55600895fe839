// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod traits;

pub use error::MetricsError;
pub use traits::{ActionProcessor, MetricsLibrary, SystemState};
