//! Editor and viewer state for slotwise product configurations.
//!
//! A configuration is a set of variants (e.g. product SKUs). Each variant owns
//! wizard steps and slots; each slot holds catalog objects with a transform
//! and material choice. Two front-ends share the model:
//!
//! - [`ConfiguratorState`]: the mutable editor state with atomic operations
//!   that keep the model valid (at least one variant, at least one step per
//!   variant, selections always in range).
//! - [`ViewerState`]: read-mostly playback of a saved configuration that only
//!   tracks per-slot selections and cached meshes.
//!
//! Both load documents through a [`slotwise_catalog::Catalog`]; unresolvable
//! object references are dropped and the rest of the configuration loads.
//!
//! # Example
//!
//! ```ignore
//! use slotwise_state::ConfiguratorState;
//!
//! let mut state = ConfiguratorState::new();
//! state.add_slot(Some("Frame"));
//! state.add_object_to_current(&chair_details);
//! let json = state.export_json()?;
//!
//! let mut restored = ConfiguratorState::new();
//! restored.import_json(&json, &catalog).await?;
//! ```

use thiserror::Error;

pub mod editor;
mod export;
mod hydrate;
pub mod loads;
pub mod model;
pub mod render;
pub mod viewer;

pub use editor::ConfiguratorState;
pub use hydrate::ImportReport;
pub use loads::{LoadKey, LoadTicket, LoadTokens};
pub use model::{MeshHandle, PlacedObject, Slot, Step, Transform, Variant, ViewPoint};
pub use render::RenderRequest;
pub use viewer::{MeshLoad, ViewerState};

/// Errors from loading or saving a configuration.
///
/// Only malformed input is an error; missing catalog objects and invalid
/// operations are recovered silently.
#[derive(Debug, Error)]
pub enum StateError {
    /// The document could not be read or written.
    #[error(transparent)]
    Document(#[from] slotwise_ir::DocumentError),
}

/// Result type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
