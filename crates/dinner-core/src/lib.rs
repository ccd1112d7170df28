//! # dinner-core: Domain Types for Dinner Done Better
//!
//! The vocabulary shared by the data access core and its callers: entities,
//! creation inputs, range value objects and the pagination protocol. No I/O
//! happens here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Dinner Done Better Backend                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            HTTP handlers / workers (outside this repo)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  dinner-db (Querier)                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dinner-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  filter   │  │  ranges   │  │   error   │  │   │
//! │  │   │ Recipe    │  │ QueryFil- │  │ Float32.. │  │ Valida-   │  │   │
//! │  │   │ Meal ...  │  │ ter       │  │ Uint16..  │  │ tionError │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities and their creation inputs
//! - [`filter`] - `QueryFilter` and the `QueryFilteredResult` envelope
//! - [`ranges`] - Min/max value objects
//! - [`error`] - Validation errors
//!
//! ## Example Usage
//!
//! ```rust
//! use dinner_core::filter::QueryFilter;
//!
//! let filter = QueryFilter::page(3, 25);
//! assert_eq!(filter.query_offset(), 50);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod ranges;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use filter::{Pagination, QueryFilter, QueryFilteredResult};
pub use ranges::*;
pub use types::*;
