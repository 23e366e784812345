//! rollcall-core — Identity model, feature store, and recognition engine.
//!
//! Enrollment accumulates labeled 50×50 face crops in a SQLite-backed
//! feature store; recognition trains a k-NN classifier over the full store
//! and classifies one crop at a time.

pub mod capture;
pub mod classifier;
pub mod features;
pub mod identity;
pub mod store;

pub use capture::{FaceDetector, FaceRegion, FrameSource, FullFrameDetector};
pub use classifier::{ClassifyError, Recognizer, Verdict};
pub use identity::{Identity, IdentityRecord, LabelError};
pub use store::{FeatureStore, StoreError, StoreSnapshot};
