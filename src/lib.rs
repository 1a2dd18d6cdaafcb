// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Unused / redundant code
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Targeted allowances (thresholds live in clippy.toml)
#![allow(clippy::option_if_let_else)]

//! Declarative scene adapter for imperative molecular 3D viewers.
//!
//! Molsync reconciles a caller-supplied, declarative description of a
//! molecular scene (structures, components, shapes, selection, focus,
//! hover, trajectory frame, measurements) against a viewer that only
//! speaks imperative calls (`load…`, `select`, `set_focus`,
//! `create_component`, `set_frame`, …) and assigns its own internal
//! identities to everything it loads.
//!
//! # Key entry points
//!
//! - [`adapter::SceneAdapter`] - the reconciliation engine; feed it
//!   [`scene::SceneSnapshot`]s and poll it with
//!   [`adapter::SceneAdapter::pump`]
//! - [`viewer::Viewer`] - the contract the 3D viewer must implement
//! - [`target`] - bidirectional translation between hierarchical
//!   (chain → residue → atom) and flat per-atom selection targets
//! - [`registry::IdentityRegistry`] - label → viewer-identity tables
//!
//! # Architecture
//!
//! Structure and shape loads are asynchronous on the viewer side: every
//! load returns a [`viewer::LoadTicket`] and completes later through
//! the viewer's event queue. [`adapter::SceneAdapter::pump`] polls that
//! queue each pass, resolves pending tickets, and republishes
//! viewer-originated interaction (user clicks changing selection,
//! focus, or frame) as [`adapter::StateUpdate`]s, comparing against
//! the last published value so nothing echoes back into the viewer.

pub mod adapter;
pub mod error;
pub mod options;
pub mod registry;
pub mod scene;
pub mod target;
pub mod viewer;

pub use adapter::{SceneAdapter, StateUpdate};
pub use error::MolsyncError;
pub use scene::SceneSnapshot;
