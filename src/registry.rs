//! Label → viewer-identity tables.
//!
//! Declarative labels are the only stable identity the caller has; the
//! viewer assigns its own model ids and refs, and only once a load
//! completes. The registry bridges the two with four independent
//! tables (structures, components, shapes, snapshots) and an explicit
//! per-structure lifecycle: `Pending` from the moment the load is
//! issued, `Ready` once the viewer reports its identity.
//!
//! Single writer: only the adapter's reconciliation logic mutates the
//! registry; the interaction synchronizers just read.

use rustc_hash::FxHashMap;

use crate::viewer::{ModelId, StructureIdentity, ViewerRef};

/// Lifecycle of one structure label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureState {
    /// Load issued, no identity assigned yet. Interactions targeting
    /// this label are dropped until the load resolves.
    Pending,
    /// Load resolved; the viewer identity is usable.
    Ready(StructureIdentity),
}

/// The four label → identity tables plus the ready-order used for
/// "most recently loaded" defaulting.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    structures: FxHashMap<String, StructureState>,
    components: FxHashMap<String, ViewerRef>,
    shapes: FxHashMap<String, ViewerRef>,
    snapshots: FxHashMap<String, ViewerRef>,
    /// Structure labels in the order their loads resolved.
    ready_order: Vec<String>,
}

impl IdentityRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Structures --

    /// Record that a load was issued for `label`.
    pub fn begin_structure_load(&mut self, label: &str) {
        let _ = self
            .structures
            .insert(label.to_owned(), StructureState::Pending);
    }

    /// Promote a pending label to ready with its viewer identity.
    pub fn mark_structure_ready(
        &mut self,
        label: &str,
        identity: StructureIdentity,
    ) {
        let _ = self
            .structures
            .insert(label.to_owned(), StructureState::Ready(identity));
        self.ready_order.retain(|l| l != label);
        self.ready_order.push(label.to_owned());
    }

    /// Lifecycle state of a structure label, if known at all.
    #[must_use]
    pub fn structure_state(&self, label: &str) -> Option<&StructureState> {
        self.structures.get(label)
    }

    /// Model id of a ready structure.
    #[must_use]
    pub fn model_id(&self, label: &str) -> Option<&ModelId> {
        match self.structures.get(label)? {
            StructureState::Ready(identity) => Some(&identity.model_id),
            StructureState::Pending => None,
        }
    }

    /// Source ref of a ready structure (used for removal).
    #[must_use]
    pub fn structure_ref(&self, label: &str) -> Option<&ViewerRef> {
        match self.structures.get(label)? {
            StructureState::Ready(identity) => Some(&identity.source_ref),
            StructureState::Pending => None,
        }
    }

    /// All known structure labels, pending or ready.
    #[must_use]
    pub fn structure_labels(&self) -> Vec<String> {
        self.structures.keys().cloned().collect()
    }

    /// Label of the most recently resolved structure.
    #[must_use]
    pub fn latest_ready(&self) -> Option<&str> {
        self.ready_order.last().map(String::as_str)
    }

    /// Model id of the most recently resolved structure.
    #[must_use]
    pub fn latest_model_id(&self) -> Option<&ModelId> {
        self.model_id(self.ready_order.last()?)
    }

    /// Drop a structure label. Cascades: every component entry whose
    /// composite label is prefixed `"<label>."` is purged too, and the
    /// label leaves the ready order. Removal is terminal: the label
    /// may only re-enter as a fresh `Pending` entry.
    pub fn unregister_structure(
        &mut self,
        label: &str,
    ) -> Option<StructureState> {
        let state = self.structures.remove(label);
        let prefix = composite_prefix(label);
        self.components.retain(|l, _| !l.starts_with(&prefix));
        self.ready_order.retain(|l| l != label);
        state
    }

    // -- Components (keyed by composite label) --

    /// Register a created component under its composite label.
    pub fn register_component(
        &mut self,
        composite_label: &str,
        reference: ViewerRef,
    ) {
        let _ = self
            .components
            .insert(composite_label.to_owned(), reference);
    }

    /// Whether a composite label has a live component.
    #[must_use]
    pub fn component_registered(&self, composite_label: &str) -> bool {
        self.components.contains_key(composite_label)
    }

    /// Composite labels of all live components under one structure,
    /// sorted for deterministic removal order.
    #[must_use]
    pub fn components_under(&self, structure_label: &str) -> Vec<String> {
        let prefix = composite_prefix(structure_label);
        let mut labels: Vec<String> = self
            .components
            .keys()
            .filter(|l| l.starts_with(&prefix))
            .cloned()
            .collect();
        labels.sort_unstable();
        labels
    }

    /// Drop a single component entry.
    pub fn unregister_component(
        &mut self,
        composite_label: &str,
    ) -> Option<ViewerRef> {
        self.components.remove(composite_label)
    }

    // -- Shapes --

    /// Register a built shape.
    pub fn register_shape(&mut self, label: &str, reference: ViewerRef) {
        let _ = self.shapes.insert(label.to_owned(), reference);
    }

    /// Viewer ref of a built shape.
    #[must_use]
    pub fn shape_ref(&self, label: &str) -> Option<&ViewerRef> {
        self.shapes.get(label)
    }

    /// All built shape labels.
    #[must_use]
    pub fn shape_labels(&self) -> Vec<String> {
        self.shapes.keys().cloned().collect()
    }

    /// Drop a shape entry.
    pub fn unregister_shape(&mut self, label: &str) -> Option<ViewerRef> {
        self.shapes.remove(label)
    }

    // -- Snapshots --

    /// Register an applied snapshot.
    pub fn register_snapshot(&mut self, label: &str, reference: ViewerRef) {
        let _ = self.snapshots.insert(label.to_owned(), reference);
    }

    /// Whether a snapshot label was already applied.
    #[must_use]
    pub fn snapshot_registered(&self, label: &str) -> bool {
        self.snapshots.contains_key(label)
    }
}

/// The `"<structureLabel>."` prefix that scopes composite labels.
#[must_use]
pub fn composite_prefix(structure_label: &str) -> String {
    format!("{structure_label}.")
}

/// Build the composite label for a component of a structure.
#[must_use]
pub fn composite_label(structure_label: &str, component_label: &str) -> String {
    format!("{structure_label}.{component_label}")
}
