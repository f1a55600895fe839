// SPDX-License-Identifier: GPL-3.0-only

pub mod action;
pub mod metrics;

pub use action::ActionProcessor;
pub use metrics::{MetricsLibrary, SystemState};
