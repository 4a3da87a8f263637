//! Font source: units, the stroke engine and the parametric model
//!
//! Everything here is synchronous. The build pipeline in
//! [`crate::compiler`] consumes [`BuildRequest`] snapshots.

pub mod conversions;
pub mod metrics;
pub mod model;
pub mod snapshot;
pub mod stroker;
pub mod units;

#[cfg(test)]
pub(crate) mod tests;

pub use metrics::FontMetrics;
pub use model::{IgnoredReason, InterpretationMode, ParameterChange, ParametricFontModel};
pub use snapshot::BuildRequest;
pub use stroker::{FontNames, OutlineEngine, StrokerError, UfoStroker};
pub use units::{convert, LengthUnit};
