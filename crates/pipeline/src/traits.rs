//! Core traits for the feature pipeline.
//!
//! Fitting produces an immutable snapshot; only snapshots implement
//! [`Transformer`], so an unfitted encoder has no way to transform.

use crate::error::Result;
use crate::frame::FeatureFrame;

/// A fitted (or stateless) feature stage.
///
/// ## Design Note
/// - `Send + Sync` lets a fitted pipeline be shared across threads
/// - Stages take ownership of the frame and hand it back with new columns
pub trait Transformer: Send + Sync {
    /// Returns the name of this stage (for logging/debugging)
    fn name(&self) -> &str;

    /// Append this stage's columns to the frame.
    ///
    /// # Returns
    /// * `Ok(FeatureFrame)` - The frame with this stage's columns added
    /// * `Err` - If the stage cannot produce its columns
    fn transform(&self, frame: FeatureFrame) -> Result<FeatureFrame>;
}
