//! The reconciliation engine.
//!
//! [`SceneAdapter`] exclusively owns one [`Viewer`] and keeps three
//! pieces of private state: the [`IdentityRegistry`], the last applied
//! declarative snapshot, and the last published viewer-originated
//! values (for feedback-loop prevention).
//!
//! Two entry points drive everything:
//!
//! - [`SceneAdapter::reconcile`] applies a new declarative snapshot:
//!   structure loads/unloads first, then component re-sync, then the
//!   interaction synchronizers in a fixed order (selection → hover →
//!   focus → frame → measurement).
//! - [`SceneAdapter::pump`] drains the viewer's event queue: load
//!   completions resolve pending tickets, and user interaction is
//!   translated back to hierarchical form and returned as
//!   [`StateUpdate`]s for the host.
//!
//! The impl blocks are split across this directory: scene diffing in
//! `scene_sync`, interaction reducers in `interaction`, the event
//! bridge in `events`.

mod events;
mod interaction;
mod scene_sync;

use rustc_hash::FxHashMap;

use crate::options::{AdapterOptions, LayoutOptions};
use crate::registry::IdentityRegistry;
use crate::scene::SceneSnapshot;
use crate::target::Target;
use crate::viewer::{LoadTicket, Viewer};

/// What kind of load a pending ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingKind {
    Structure,
    Shape,
    Snapshot,
}

/// Bookkeeping for one in-flight load.
#[derive(Debug, Clone)]
pub(crate) struct PendingLoad {
    pub(crate) label: String,
    pub(crate) kind: PendingKind,
}

/// Viewer-originated state change, translated to the declarative
/// shape and handed to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// The viewer's selection changed; `None` means cleared.
    Selection(Option<Target>),
    /// The hover highlight changed; `None` means cleared.
    Hover(Option<Target>),
    /// The camera focus changed; `None` means cleared.
    Focus(Option<Target>),
    /// The trajectory frame changed.
    Frame(usize),
    /// A load was rejected; the label stays pending forever.
    LoadFailed {
        /// Declarative label of the failed entry.
        label: String,
        /// Viewer-reported reason.
        reason: String,
    },
}

/// Last values published to the host, per channel. An incoming viewer
/// event whose translated value equals the published one is an echo of
/// something this adapter already applied and must not be re-published
/// (loop prevention by value comparison, not by lock).
#[derive(Debug, Default)]
struct PublishedState {
    selection: Option<Target>,
    hover: Option<Target>,
    focus: Option<Target>,
    frame: Option<usize>,
}

/// Stateful adapter between declarative snapshots and one imperative
/// viewer.
pub struct SceneAdapter<V: Viewer> {
    viewer: V,
    registry: IdentityRegistry,
    options: AdapterOptions,
    layout: LayoutOptions,
    /// Last snapshot successfully applied, field by field. Dropped
    /// operations (unresolved labels, frame before load) are *not*
    /// recorded, so the next pass retries them.
    applied: SceneSnapshot,
    published: PublishedState,
    pending: FxHashMap<LoadTicket, PendingLoad>,
}

impl<V: Viewer> SceneAdapter<V> {
    /// Take exclusive ownership of a viewer. `layout` is fixed for the
    /// adapter's lifetime.
    #[must_use]
    pub fn new(viewer: V, layout: LayoutOptions, options: AdapterOptions) -> Self {
        Self {
            viewer,
            registry: IdentityRegistry::new(),
            options,
            layout,
            applied: SceneSnapshot::default(),
            published: PublishedState::default(),
            pending: FxHashMap::default(),
        }
    }

    /// Apply a declarative snapshot. Returns read-back publishes (the
    /// viewer is the source of truth after a selection call).
    pub fn reconcile(&mut self, next: &SceneSnapshot) -> Vec<StateUpdate> {
        let mut updates = Vec::new();
        self.sync_entries(&next.data);
        self.sync_selection(next.selection.as_ref(), &mut updates);
        self.sync_hover(next.hover.as_ref());
        self.sync_focus(next.focus.as_ref());
        self.sync_frame(next.frame, &mut updates);
        self.sync_measurements(next.measurements.as_ref());
        updates
    }

    /// Read access to the owned viewer.
    #[must_use]
    pub const fn viewer(&self) -> &V {
        &self.viewer
    }

    /// Write access to the owned viewer, for host-driven calls outside
    /// the declarative surface.
    pub const fn viewer_mut(&mut self) -> &mut V {
        &mut self.viewer
    }

    /// The one-time layout configuration.
    #[must_use]
    pub const fn layout(&self) -> &LayoutOptions {
        &self.layout
    }

    /// The reconciliation behavior toggles.
    #[must_use]
    pub const fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// The last snapshot the adapter actually applied.
    #[must_use]
    pub const fn applied(&self) -> &SceneSnapshot {
        &self.applied
    }

    /// Forward a container resize to the viewer.
    pub fn handle_resize(&mut self) {
        self.viewer.handle_resize();
    }

    /// Reset the viewer camera to frame the whole scene.
    pub fn reset_camera(&mut self) {
        self.viewer.reset_camera();
    }

    /// Remove everything: viewer contents, registry, applied and
    /// published state, pending loads.
    pub fn clear(&mut self) {
        self.viewer.clear();
        self.registry = IdentityRegistry::new();
        self.applied = SceneSnapshot::default();
        self.published = PublishedState::default();
        self.pending.clear();
    }

    /// Whether a load for `label` of the given kind is in flight.
    pub(crate) fn load_in_flight(&self, label: &str, kind: PendingKind) -> bool {
        self.pending
            .values()
            .any(|p| p.kind == kind && p.label == label)
    }
}
