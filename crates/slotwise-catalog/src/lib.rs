#![warn(missing_docs)]

//! Catalog capability for slotwise.
//!
//! A configuration document only stores object UUIDs. This crate defines the
//! seam through which those references are resolved into full metadata:
//!
//! - [`Catalog`]: async lookup of one UUID
//! - [`ObjectDetails`] / [`Material`]: what a lookup returns
//! - [`MemoryCatalog`]: a uuid-keyed in-memory implementation, loadable from
//!   a JSON file
//!
//! # Example
//!
//! ```ignore
//! use slotwise_catalog::{Catalog, MemoryCatalog};
//!
//! let catalog = MemoryCatalog::load("catalog.json")?;
//! let chair = catalog.fetch_details("3f1c...").await?;
//! println!("{} has {} materials", chair.name, chair.materials.len());
//! ```

pub mod details;
pub mod error;
pub mod memory;

pub use details::{Material, ObjectDetails};
pub use error::{CatalogError, Result};
pub use memory::MemoryCatalog;

/// Resolves object UUIDs to catalog metadata.
///
/// Lookups are the only suspension points of a configuration load. An
/// implementation reports a missing object as [`CatalogError::NotFound`] and
/// transport trouble as [`CatalogError::Unavailable`]; callers treat both as
/// "this object is gone".
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Fetch metadata for one object.
    async fn fetch_details(&self, uuid: &str) -> Result<ObjectDetails>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    async fn fetch_details(&self, uuid: &str) -> Result<ObjectDetails> {
        (**self).fetch_details(uuid).await
    }
}

/// Fetch metadata, folding every failure into `None`.
///
/// Failures are logged at `warn` with the offending UUID.
pub async fn resolve_details<C: Catalog + ?Sized>(catalog: &C, uuid: &str) -> Option<ObjectDetails> {
    match catalog.fetch_details(uuid).await {
        Ok(details) => Some(details),
        Err(err) => {
            tracing::warn!(uuid, error = %err, "catalog lookup failed, dropping reference");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offline;

    impl Catalog for Offline {
        async fn fetch_details(&self, _uuid: &str) -> Result<ObjectDetails> {
            Err(CatalogError::Unavailable("no network".into()))
        }
    }

    #[test]
    fn resolve_folds_errors() {
        let found = tokio_test::block_on(resolve_details(&Offline, "abc"));
        assert!(found.is_none());
    }

    #[test]
    fn reference_is_a_catalog() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(ObjectDetails::new("abc", "Lamp", vec![]));
        let by_ref = &catalog;
        let details = tokio_test::block_on(by_ref.fetch_details("abc")).unwrap();
        assert_eq!(details.name, "Lamp");
    }
}
