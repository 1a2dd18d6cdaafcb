//! Scene diffing: structure loads/unloads, component re-sync, shape
//! and snapshot lifecycle.
//!
//! Existence-based diffing against the registry, never against the
//! previous snapshot: a label already known to the registry (pending
//! or ready) is left alone, an unknown one starts a load, a registered
//! one missing from the incoming list is torn down. Entry parameters
//! are not compared; changing a structure's data under the same label
//! is not an update path.

use super::{PendingKind, PendingLoad, SceneAdapter};
use crate::registry::{composite_label, StructureState};
use crate::scene::{
    Component, SceneEntry, ShapeEntry, ShapeGeometry, UrlEntry, UrlFor,
    UrlFormat,
};
use crate::target::translate::to_flat;
use crate::viewer::{LoadProps, LoadTicket, Viewer};

/// The viewer's own polymer component, replaced rather than merged
/// when a declared component uses the same label.
const POLYMER_LABEL: &str = "Polymer";

impl<V: Viewer> SceneAdapter<V> {
    /// Bring the viewer's loaded set in line with `next`: load unknown
    /// labels, re-sync components of ready structures, tear down
    /// everything that disappeared.
    pub(crate) fn sync_entries(&mut self, next: &[SceneEntry]) {
        let mut structure_labels: Vec<&str> = Vec::new();
        let mut shape_labels: Vec<&str> = Vec::new();

        for entry in next {
            match entry {
                SceneEntry::Mol(_) | SceneEntry::Trajectory(_) => {
                    structure_labels.push(entry.label());
                    self.sync_structure(entry);
                }
                SceneEntry::Url(url) => {
                    if url.urlfor == UrlFor::Mol {
                        structure_labels.push(entry.label());
                        self.sync_structure(entry);
                    } else {
                        self.sync_snapshot(url);
                    }
                }
                SceneEntry::Shape(shape) => {
                    shape_labels.push(entry.label());
                    self.sync_shape(shape);
                }
            }
        }

        // Removal: everything registered (or pending) whose label left
        // the list. Pending labels just lose their registry entry; the
        // in-flight load cancels itself on resolution.
        for label in self.registry.structure_labels() {
            if !structure_labels.iter().any(|l| *l == label) {
                self.unload_structure(&label);
            }
        }
        for label in self.registry.shape_labels() {
            if !shape_labels.iter().any(|l| *l == label) {
                if let Some(reference) = self.registry.unregister_shape(&label)
                {
                    self.viewer.remove_ref(&reference);
                    log::debug!("removed shape '{label}'");
                }
            }
        }

        self.applied.data = next.to_vec();
    }

    /// One structure-like entry: load if unknown, re-sync components
    /// if ready, leave pending loads alone.
    fn sync_structure(&mut self, entry: &SceneEntry) {
        let label = entry.label();
        match self.registry.structure_state(label) {
            None => self.load_structure(entry),
            // Components attach when the load resolves.
            Some(StructureState::Pending) => {}
            Some(StructureState::Ready(_)) => {
                if !entry.components().is_empty() {
                    let components = entry.components().to_vec();
                    self.sync_components(label, &components);
                }
            }
        }
    }

    fn load_structure(&mut self, entry: &SceneEntry) {
        let label = entry.label();
        let props = LoadProps {
            data_label: label.to_owned(),
            preset: match entry {
                SceneEntry::Mol(e) => e.preset.clone(),
                SceneEntry::Url(e) => e.preset.clone(),
                SceneEntry::Trajectory(e) => e.preset.clone(),
                SceneEntry::Shape(_) => None,
            },
        };
        let ticket = match entry {
            SceneEntry::Mol(e) => self.viewer.load_structure_from_data(
                &e.data, e.format, true, &props,
            ),
            SceneEntry::Url(e) => {
                let UrlFormat::Structure(format) = e.format else {
                    log::warn!(
                        "url entry '{label}' declares urlfor=mol with a \
                         snapshot format; skipped"
                    );
                    return;
                };
                self.viewer
                    .load_structure_from_url(&e.data, format, true, &props)
            }
            SceneEntry::Trajectory(e) => self.viewer.load_trajectory(
                &e.topology,
                &e.coordinates,
                &props,
            ),
            SceneEntry::Shape(_) => return,
        };
        self.registry.begin_structure_load(label);
        self.track(ticket, label, PendingKind::Structure);
        log::debug!("structure load issued for '{label}'");
    }

    /// Re-sync the component set of a ready structure: create missing
    /// composite labels, remove stale ones. Existing components are
    /// never updated in place.
    pub(crate) fn sync_components(
        &mut self,
        structure_label: &str,
        components: &[Component],
    ) {
        let Some(model_id) = self.registry.model_id(structure_label).cloned()
        else {
            log::warn!(
                "component sync for '{structure_label}' before its load \
                 resolved; skipped"
            );
            return;
        };

        let mut desired: Vec<String> = Vec::with_capacity(components.len());
        for component in components {
            let composite =
                composite_label(structure_label, &component.label);
            desired.push(composite.clone());
            if self.registry.component_registered(&composite) {
                continue;
            }
            // The viewer creates its own polymer component at load
            // time; a declared "Polymer" replaces it.
            if component.label == POLYMER_LABEL {
                self.viewer.remove_component(POLYMER_LABEL);
            }
            let mut flat = Vec::new();
            for target in &component.targets {
                flat.extend(to_flat(target, &model_id, target.auth));
            }
            let reference = self.viewer.create_component(
                &composite,
                &flat,
                &component.representation,
            );
            self.registry.register_component(&composite, reference);
        }

        for composite in self.registry.components_under(structure_label) {
            if !desired.contains(&composite) {
                self.viewer.remove_component(&composite);
                let _ = self.registry.unregister_component(&composite);
                log::debug!("removed stale component '{composite}'");
            }
        }
    }

    /// Tear down one structure: components first, then the source ref,
    /// then the registry entry (which cascades component bookkeeping).
    fn unload_structure(&mut self, label: &str) {
        for composite in self.registry.components_under(label) {
            self.viewer.remove_component(&composite);
            let _ = self.registry.unregister_component(&composite);
        }
        if let Some(reference) = self.registry.structure_ref(label).cloned() {
            self.viewer.remove_ref(&reference);
        }
        let _ = self.registry.unregister_structure(label);
        log::debug!("unloaded structure '{label}'");
    }

    /// Snapshot urls are fire-and-forget: applied at most once per
    /// label, never torn down when the entry disappears.
    fn sync_snapshot(&mut self, entry: &UrlEntry) {
        let label = &entry.label;
        if self.registry.snapshot_registered(label)
            || self.load_in_flight(label, PendingKind::Snapshot)
        {
            return;
        }
        let format = match entry.format {
            UrlFormat::Snapshot(format) => format,
            UrlFormat::Structure(_) => {
                log::warn!(
                    "url entry '{label}' declares urlfor=snapshot with a \
                     structure format; skipped"
                );
                return;
            }
        };
        let ticket = self.viewer.load_snapshot_from_url(&entry.data, format);
        self.track(ticket, label, PendingKind::Snapshot);
        log::debug!("snapshot load issued for '{label}'");
    }

    /// Shapes build asynchronously like structures but carry only a
    /// ref. No update path: a changed shape must leave the list for
    /// one pass and come back.
    fn sync_shape(&mut self, entry: &ShapeEntry) {
        let label = &entry.label;
        if self.registry.shape_ref(label).is_some()
            || self.load_in_flight(label, PendingKind::Shape)
        {
            return;
        }
        let ticket = match entry.geometry {
            ShapeGeometry::Box { min, max, radius } => {
                self.viewer.create_bounding_box(
                    label,
                    min,
                    max,
                    radius,
                    &entry.color,
                    entry.alpha,
                )
            }
            ShapeGeometry::Sphere {
                center,
                radius,
                detail,
            } => self.viewer.create_bounding_sphere(
                label,
                center,
                radius,
                &entry.color,
                entry.alpha,
                detail,
            ),
        };
        self.track(ticket, label, PendingKind::Shape);
        log::debug!("shape build issued for '{label}'");
    }

    fn track(&mut self, ticket: LoadTicket, label: &str, kind: PendingKind) {
        let _ = self.pending.insert(
            ticket,
            PendingLoad {
                label: label.to_owned(),
                kind,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::adapter::SceneAdapter;
    use crate::options::{AdapterOptions, LayoutOptions};
    use crate::scene::{
        Component, Representation, SceneEntry, SceneSnapshot, ShapeEntry,
        ShapeGeometry, StructureEntry, StructureFormat, UrlEntry, UrlFor,
        UrlFormat,
    };
    use crate::target::{Chain, Target};
    use crate::viewer::mock::{Call, MockViewer};
    use crate::viewer::ViewerRef;

    fn adapter() -> SceneAdapter<MockViewer> {
        SceneAdapter::new(
            MockViewer::new(),
            LayoutOptions::default(),
            AdapterOptions::default(),
        )
    }

    fn mol(label: &str) -> SceneEntry {
        SceneEntry::Mol(StructureEntry {
            label: label.to_owned(),
            data: "ATOM ...".to_owned(),
            format: StructureFormat::Pdb,
            components: vec![],
            preset: None,
        })
    }

    fn mol_with_component(label: &str, component: &str) -> SceneEntry {
        SceneEntry::Mol(StructureEntry {
            label: label.to_owned(),
            data: "ATOM ...".to_owned(),
            format: StructureFormat::Pdb,
            components: vec![Component {
                label: component.to_owned(),
                targets: vec![Target {
                    chains: vec![Chain::whole("A")],
                    auth: false,
                }],
                representation: Representation::default(),
            }],
            preset: None,
        })
    }

    fn shape(label: &str) -> SceneEntry {
        SceneEntry::Shape(ShapeEntry {
            label: label.to_owned(),
            geometry: ShapeGeometry::Box {
                min: Vec3::ZERO,
                max: Vec3::ONE,
                radius: 0.1,
            },
            color: "red".to_owned(),
            alpha: 1.0,
        })
    }

    fn snapshot(data: Vec<SceneEntry>) -> SceneSnapshot {
        SceneSnapshot {
            data,
            ..SceneSnapshot::default()
        }
    }

    #[test]
    fn unknown_label_starts_exactly_one_load() {
        let mut adapter = adapter();
        let scene = snapshot(vec![mol("1abc")]);
        let _ = adapter.reconcile(&scene);
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![Call::LoadData {
                label: "1abc".to_owned()
            }]
        );

        // Still pending: the second pass must not re-issue.
        let _ = adapter.reconcile(&scene);
        assert!(adapter.viewer_mut().take_calls().is_empty());
    }

    #[test]
    fn identical_snapshot_after_load_issues_no_calls() {
        let mut adapter = adapter();
        let scene = snapshot(vec![
            mol_with_component("1abc", "Pocket"),
            shape("site"),
        ]);
        let _ = adapter.reconcile(&scene);
        let ticket = adapter.viewer().ticket_for("1abc");
        adapter.viewer_mut().complete_structure(ticket, "m1");
        let shape_ticket = adapter.viewer().ticket_for("site");
        adapter.viewer_mut().complete_shape(shape_ticket, "shape-1");
        let _ = adapter.pump();
        let _ = adapter.viewer_mut().take_calls();

        let _ = adapter.reconcile(&scene);
        assert!(adapter.viewer_mut().take_calls().is_empty());
    }

    #[test]
    fn removed_structure_tears_down_components_then_source() {
        let mut adapter = adapter();
        let scene = snapshot(vec![mol_with_component("1abc", "Pocket")]);
        let _ = adapter.reconcile(&scene);
        let ticket = adapter.viewer().ticket_for("1abc");
        adapter.viewer_mut().complete_structure(ticket, "m1");
        let _ = adapter.pump();
        let _ = adapter.viewer_mut().take_calls();

        let _ = adapter.reconcile(&snapshot(vec![]));
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![
                Call::RemoveComponent {
                    label: "1abc.Pocket".to_owned()
                },
                Call::RemoveRef {
                    reference: ViewerRef::new("src-m1")
                },
            ]
        );
        assert!(adapter.registry.structure_state("1abc").is_none());
    }

    #[test]
    fn polymer_component_replaces_viewer_builtin() {
        let mut adapter = adapter();
        let scene = snapshot(vec![mol_with_component("1abc", "Polymer")]);
        let _ = adapter.reconcile(&scene);
        let ticket = adapter.viewer().ticket_for("1abc");
        adapter.viewer_mut().complete_structure(ticket, "m1");
        let _ = adapter.viewer_mut().take_calls();

        let _ = adapter.pump();
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![
                Call::RemoveComponent {
                    label: "Polymer".to_owned()
                },
                Call::CreateComponent {
                    label: "1abc.Polymer".to_owned(),
                    target_count: 1
                },
                Call::ResetCamera,
            ]
        );

        // Re-syncing the same set must not remove the builtin again.
        let _ = adapter.reconcile(&scene);
        assert!(adapter.viewer_mut().take_calls().is_empty());
    }

    #[test]
    fn stale_components_are_removed_on_resync() {
        let mut adapter = adapter();
        let _ = adapter
            .reconcile(&snapshot(vec![mol_with_component("1abc", "Pocket")]));
        let ticket = adapter.viewer().ticket_for("1abc");
        adapter.viewer_mut().complete_structure(ticket, "m1");
        let _ = adapter.pump();
        let _ = adapter.viewer_mut().take_calls();

        // Same structure, different component set.
        let _ = adapter
            .reconcile(&snapshot(vec![mol_with_component("1abc", "Ligand")]));
        let calls = adapter.viewer_mut().take_calls();
        assert!(calls.contains(&Call::CreateComponent {
            label: "1abc.Ligand".to_owned(),
            target_count: 1
        }));
        assert!(calls.contains(&Call::RemoveComponent {
            label: "1abc.Pocket".to_owned()
        }));
        assert!(!adapter.registry.component_registered("1abc.Pocket"));
    }

    #[test]
    fn shape_changes_require_remove_then_recreate() {
        let mut adapter = adapter();
        let _ = adapter.reconcile(&snapshot(vec![shape("site")]));
        let ticket = adapter.viewer().ticket_for("site");
        adapter.viewer_mut().complete_shape(ticket, "shape-1");
        let _ = adapter.pump();
        let _ = adapter.viewer_mut().take_calls();

        // Same label stays untouched even with different parameters.
        let changed = SceneEntry::Shape(ShapeEntry {
            label: "site".to_owned(),
            geometry: ShapeGeometry::Sphere {
                center: Vec3::ZERO,
                radius: 5.0,
                detail: None,
            },
            color: "blue".to_owned(),
            alpha: 0.5,
        });
        let _ = adapter.reconcile(&snapshot(vec![changed.clone()]));
        assert!(adapter.viewer_mut().take_calls().is_empty());

        // Leave for one pass, then come back.
        let _ = adapter.reconcile(&snapshot(vec![]));
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![Call::RemoveRef {
                reference: ViewerRef::new("shape-1")
            }]
        );
        let _ = adapter.reconcile(&snapshot(vec![changed]));
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![Call::CreateSphere {
                label: "site".to_owned()
            }]
        );
    }

    #[test]
    fn snapshot_url_is_fire_and_forget() {
        let mut adapter = adapter();
        let entry = SceneEntry::Url(UrlEntry {
            label: "session".to_owned(),
            data: "https://example.org/s.molx".to_owned(),
            urlfor: UrlFor::Snapshot,
            format: UrlFormat::Snapshot(crate::scene::SnapshotFormat::Molx),
            components: vec![],
            preset: None,
        });
        let _ = adapter.reconcile(&snapshot(vec![entry.clone()]));
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![Call::LoadSnapshot {
                url: "https://example.org/s.molx".to_owned()
            }]
        );

        // Applied snapshots are never torn down.
        let ticket = adapter.viewer().last_ticket();
        adapter.viewer_mut().events.push_back(
            crate::viewer::ViewerEvent::LoadCompleted {
                ticket,
                outcome: crate::viewer::LoadOutcome::Snapshot(
                    ViewerRef::new("snap-1"),
                ),
            },
        );
        let _ = adapter.pump();
        let _ = adapter.viewer_mut().take_calls();
        let _ = adapter.reconcile(&snapshot(vec![]));
        assert!(adapter.viewer_mut().take_calls().is_empty());

        // And never re-applied under the same label.
        let _ = adapter.reconcile(&snapshot(vec![entry]));
        assert!(adapter.viewer_mut().take_calls().is_empty());
    }

    #[test]
    fn format_kind_mismatch_is_skipped_with_no_load() {
        let mut adapter = adapter();
        let entry = SceneEntry::Url(UrlEntry {
            label: "bad".to_owned(),
            data: "https://example.org/x".to_owned(),
            urlfor: UrlFor::Mol,
            format: UrlFormat::Snapshot(crate::scene::SnapshotFormat::Molx),
            components: vec![],
            preset: None,
        });
        let _ = adapter.reconcile(&snapshot(vec![entry]));
        assert!(adapter.viewer_mut().take_calls().is_empty());
        assert!(adapter.registry.structure_state("bad").is_none());
    }
}
