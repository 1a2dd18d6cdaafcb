//! The imperative viewer contract and its asynchronous load protocol.
//!
//! The 3D viewer is an external collaborator: it owns its internal
//! object graph and assigns its own identities (model ids, refs) to
//! everything it loads. The adapter never walks that graph; it only
//! issues the calls below and observes completions and user
//! interaction through [`Viewer::poll_events`].
//!
//! Loads are asynchronous: every `load_*` / `create_bounding_*` call
//! returns a [`LoadTicket`] immediately and completes later with a
//! [`ViewerEvent::LoadCompleted`] carrying the assigned identity.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::{
    CoordinateSource, MeasurementKind, Representation, SelectionMode,
    SelectionModifier, SnapshotFormat, StructureFormat, TopologySource,
};
use crate::target::FlatTarget;

/// Viewer-assigned model id of a loaded structure. Flat targets are
/// keyed by this; it has no meaning in the declarative model.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Wrap a viewer-assigned model id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Opaque viewer-internal reference to a loaded object (structure
/// source, shape, or snapshot), used only for removal.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ViewerRef(String);

impl ViewerRef {
    /// Wrap a viewer-assigned reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The raw reference string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Handle for an in-flight load, matched against
/// [`ViewerEvent::LoadCompleted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub u64);

/// Identities a completed structure load carries: the model id used in
/// flat targets plus the source ref used for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureIdentity {
    /// Model id for selection targets.
    pub model_id: ModelId,
    /// Source ref for `remove_ref`.
    pub source_ref: ViewerRef,
}

/// What an asynchronous load resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A structure (or trajectory) finished loading.
    Structure(StructureIdentity),
    /// A shape finished building.
    Shape(ViewerRef),
    /// A snapshot finished applying.
    Snapshot(ViewerRef),
    /// The load was rejected by the viewer.
    Failed(String),
}

/// Change notifications and load completions, drained each pass by the
/// adapter. Selection/focus/frame changes carry no payload: the
/// adapter reads the current value back through the accessors, so the
/// viewer stays the source of truth. Hover has no accessor, so its
/// event carries the highlighted targets.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// An asynchronous load finished.
    LoadCompleted {
        /// Ticket returned by the originating call.
        ticket: LoadTicket,
        /// Assigned identity or failure reason.
        outcome: LoadOutcome,
    },
    /// The current selection changed (user interaction or a `select`
    /// call).
    SelectionChanged,
    /// The hover highlight changed.
    HoverChanged(Vec<FlatTarget>),
    /// The camera focus changed.
    FocusChanged,
    /// The trajectory frame changed.
    FrameChanged,
}

/// Extra properties attached to a structure load.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LoadProps {
    /// Declarative label, stored on the loaded structure so the host
    /// can recognize it in the viewer's own UI.
    pub data_label: String,
    /// Opaque preset forwarded untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<serde_json::Value>,
}

/// The call surface the adapter drives. One adapter exclusively owns
/// one viewer; implementations need no internal synchronization.
pub trait Viewer {
    /// Load a structure from inline file content.
    fn load_structure_from_data(
        &mut self,
        data: &str,
        format: StructureFormat,
        keep_existing: bool,
        props: &LoadProps,
    ) -> LoadTicket;

    /// Load a structure from a URL the viewer fetches itself.
    fn load_structure_from_url(
        &mut self,
        url: &str,
        format: StructureFormat,
        keep_existing: bool,
        props: &LoadProps,
    ) -> LoadTicket;

    /// Load a trajectory from topology and coordinate sources.
    fn load_trajectory(
        &mut self,
        topology: &TopologySource,
        coordinates: &CoordinateSource,
        props: &LoadProps,
    ) -> LoadTicket;

    /// Apply a state/session snapshot from a URL (fire-and-forget).
    fn load_snapshot_from_url(
        &mut self,
        url: &str,
        format: SnapshotFormat,
    ) -> LoadTicket;

    /// Create a named component over the given flat targets.
    fn create_component(
        &mut self,
        label: &str,
        targets: &[FlatTarget],
        representation: &Representation,
    ) -> ViewerRef;

    /// Remove a component by its (composite) label.
    fn remove_component(&mut self, label: &str);

    /// Build a wireframe bounding box shape.
    #[allow(clippy::too_many_arguments)]
    fn create_bounding_box(
        &mut self,
        label: &str,
        min: Vec3,
        max: Vec3,
        radius: f32,
        color: &str,
        alpha: f32,
    ) -> LoadTicket;

    /// Build a bounding sphere shape.
    #[allow(clippy::too_many_arguments)]
    fn create_bounding_sphere(
        &mut self,
        label: &str,
        center: Vec3,
        radius: f32,
        color: &str,
        alpha: f32,
        detail: Option<u32>,
    ) -> LoadTicket;

    /// Remove a loaded object by its viewer-internal reference.
    fn remove_ref(&mut self, reference: &ViewerRef);

    /// Apply a selection or hover highlight.
    fn select(
        &mut self,
        targets: &[FlatTarget],
        mode: SelectionMode,
        modifier: SelectionModifier,
    );

    /// Clear the selection of one mode.
    fn clear_selection(&mut self, mode: SelectionMode);

    /// Focus the camera on the given targets.
    fn set_focus(&mut self, targets: &[FlatTarget], analyse: bool);

    /// Clear the camera focus.
    fn clear_focus(&mut self);

    /// Jump to a trajectory frame.
    fn set_frame(&mut self, index: usize);

    /// Add one measurement over the given targets.
    fn add_measurement(&mut self, targets: &[FlatTarget], kind: MeasurementKind);

    /// Remove all measurements.
    fn clear_measurements(&mut self);

    /// Remove everything from the viewer.
    fn clear(&mut self);

    /// Reset the camera to frame the whole scene.
    fn reset_camera(&mut self);

    /// Notify the viewer that its container was resized.
    fn handle_resize(&mut self);

    /// Current selection, flat form.
    fn current_selection(&self) -> Vec<FlatTarget>;

    /// Current camera focus, flat form.
    fn current_focus(&self) -> Vec<FlatTarget>;

    /// Current trajectory frame, if any trajectory is loaded.
    fn current_frame(&self) -> Option<usize>;

    /// Drain pending change notifications and load completions.
    fn poll_events(&mut self) -> Vec<ViewerEvent>;
}
