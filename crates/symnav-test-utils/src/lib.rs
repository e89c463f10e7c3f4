//! Testing utilities, fixtures, and mocks for symnav.
//!
//! - **Fixtures**: temporary project directories
//! - **Builders**: symbols, ranges and raw locations
//! - **Mocks**: in-memory implementations of the symbol collaborators
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use symnav_test_utils::{builders::SymbolBuilder, mocks::MockSymbolRetriever};
//! use symnav_symbols::SymbolKind;
//!
//! let retriever = MockSymbolRetriever::new().with_file(
//!     "src/shapes.py",
//!     vec![SymbolBuilder::new("Circle", SymbolKind::Class)
//!         .range(0, 0, 10, 0)
//!         .child(SymbolBuilder::new("area", SymbolKind::Method).range(2, 4, 4, 0))
//!         .build()],
//! );
//! ```

pub mod builders;
pub mod fixtures;
pub mod mocks;

pub use builders::{range, raw_location, SymbolBuilder};
pub use fixtures::TestProject;
pub use mocks::{MockCodeEditor, MockLspSession, MockProject, MockSymbolRetriever};
