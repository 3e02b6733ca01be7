//! MIR Analysis Module
//!
//! Provides control flow analysis: dominator trees and natural-loop
//! discovery, the two analyses the optimizer's LICM pass depends on (§4.3.4).

pub mod cfg;

pub use cfg::*;
