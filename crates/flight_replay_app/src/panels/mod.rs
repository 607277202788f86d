// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay panel implementations.

mod disclaimer;
mod viewport;

pub use disclaimer::DisclaimerPanel;
pub use viewport::{RenderContext, ViewportPanel};
