//! The event bridge: drains the viewer's queue, resolves pending load
//! tickets, and translates user interaction back into declarative
//! [`StateUpdate`]s.
//!
//! Loop prevention is by value: every channel remembers the last value
//! published (or applied), and an event whose translated value equals
//! it is an echo and produces nothing. A genuine user change always
//! differs and passes through.

use super::{PendingLoad, SceneAdapter, StateUpdate};
use crate::scene::{FocusDescriptor, SceneEntry};
use crate::target::translate::to_hierarchical;
use crate::target::{FlatTarget, Target};
use crate::viewer::{
    LoadOutcome, LoadTicket, StructureIdentity, Viewer, ViewerEvent,
};

impl<V: Viewer> SceneAdapter<V> {
    /// Drain pending viewer events. Call once per host tick; returns
    /// the updates the host should fold into its declarative state.
    pub fn pump(&mut self) -> Vec<StateUpdate> {
        let mut updates = Vec::new();
        for event in self.viewer.poll_events() {
            match event {
                ViewerEvent::LoadCompleted { ticket, outcome } => {
                    self.finish_load(ticket, &outcome, &mut updates);
                }
                ViewerEvent::SelectionChanged => {
                    let tree =
                        as_tree(&self.viewer.current_selection());
                    if self.published.selection != tree {
                        self.published.selection = tree.clone();
                        updates.push(StateUpdate::Selection(tree));
                    }
                }
                ViewerEvent::HoverChanged(targets) => {
                    let tree = as_tree(&targets);
                    if self.published.hover != tree {
                        self.published.hover = tree.clone();
                        updates.push(StateUpdate::Hover(tree));
                    }
                }
                ViewerEvent::FocusChanged => {
                    let tree = as_tree(&self.viewer.current_focus());
                    if self.published.focus != tree {
                        self.published.focus = tree.clone();
                        updates.push(StateUpdate::Focus(tree));
                    }
                }
                ViewerEvent::FrameChanged => {
                    self.frame_changed(&mut updates);
                }
            }
        }
        updates
    }

    fn frame_changed(&mut self, updates: &mut Vec<StateUpdate>) {
        let frame = self.viewer.current_frame();
        if self.published.frame == frame {
            return;
        }
        self.published.frame = frame;
        if let Some(index) = frame {
            updates.push(StateUpdate::Frame(index));
        }
        self.rederive_after_frame(updates);
    }

    /// Resolve one completed load against its pending ticket.
    fn finish_load(
        &mut self,
        ticket: LoadTicket,
        outcome: &LoadOutcome,
        updates: &mut Vec<StateUpdate>,
    ) {
        let Some(PendingLoad { label, .. }) = self.pending.remove(&ticket)
        else {
            log::debug!("completion for unknown ticket {ticket:?}; ignored");
            return;
        };
        match outcome {
            LoadOutcome::Failed(reason) => {
                log::error!("load of '{label}' failed: {reason}");
                // The label stays pending in the registry forever; the
                // host must drop and re-add it to retry.
                updates.push(StateUpdate::LoadFailed {
                    label,
                    reason: reason.clone(),
                });
            }
            LoadOutcome::Structure(identity) => {
                self.finish_structure(&label, identity.clone());
            }
            LoadOutcome::Shape(reference) => {
                let desired = self.applied.data.iter().any(|e| {
                    matches!(e, SceneEntry::Shape(_)) && e.label() == label
                });
                if desired {
                    self.registry.register_shape(&label, reference.clone());
                } else {
                    // Removed while in flight.
                    self.viewer.remove_ref(reference);
                    log::debug!("shape '{label}' resolved after removal");
                }
            }
            LoadOutcome::Snapshot(reference) => {
                self.registry.register_snapshot(&label, reference.clone());
            }
        }
    }

    fn finish_structure(&mut self, label: &str, identity: StructureIdentity) {
        let desired = self
            .applied
            .data
            .iter()
            .any(|e| e.is_structure_like() && e.label() == label);
        if !desired {
            // Removed while in flight: discard immediately, before the
            // structure becomes targetable.
            self.viewer.remove_ref(&identity.source_ref);
            let _ = self.registry.unregister_structure(label);
            log::debug!("structure '{label}' resolved after removal");
            return;
        }

        self.registry.mark_structure_ready(label, identity);
        let components: Vec<_> = self
            .applied
            .data
            .iter()
            .find(|e| e.is_structure_like() && e.label() == label)
            .map(|e| e.components().to_vec())
            .unwrap_or_default();
        if !components.is_empty() {
            self.sync_components(label, &components);
        }
        self.viewer.reset_camera();
        log::info!("structure '{label}' ready");

        if self.options.auto_focus {
            let descriptor = FocusDescriptor {
                molecule: Some(label.to_owned()),
                targets: None,
                analyse: false,
            };
            if self.apply_focus(&descriptor) {
                self.applied.focus = Some(descriptor);
            }
        }
    }
}

fn as_tree(flat: &[FlatTarget]) -> Option<Target> {
    if flat.is_empty() {
        None
    } else {
        Some(to_hierarchical(flat))
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::{SceneAdapter, StateUpdate};
    use crate::options::{AdapterOptions, LayoutOptions};
    use crate::scene::{
        SceneEntry, SceneSnapshot, SelectionDescriptor, SelectionMode,
        SelectionModifier, StructureEntry, StructureFormat,
    };
    use crate::target::{Chain, FlatTarget, Target};
    use crate::viewer::mock::{Call, MockViewer};
    use crate::viewer::{ModelId, ViewerEvent, ViewerRef};

    fn adapter_with(options: AdapterOptions) -> SceneAdapter<MockViewer> {
        SceneAdapter::new(MockViewer::new(), LayoutOptions::default(), options)
    }

    fn adapter() -> SceneAdapter<MockViewer> {
        adapter_with(AdapterOptions::default())
    }

    fn mol(label: &str) -> SceneEntry {
        SceneEntry::Mol(StructureEntry {
            label: label.to_owned(),
            data: String::new(),
            format: StructureFormat::Pdb,
            components: vec![],
            preset: None,
        })
    }

    fn snapshot(data: Vec<SceneEntry>) -> SceneSnapshot {
        SceneSnapshot {
            data,
            ..SceneSnapshot::default()
        }
    }

    fn flat(model: &str, chain: &str) -> FlatTarget {
        let mut target = FlatTarget::whole_model(ModelId::new(model));
        target.label_asym_id = Some(chain.to_owned());
        target
    }

    #[test]
    fn user_selection_is_published_as_tree() {
        let mut adapter = adapter();
        adapter
            .viewer_mut()
            .user_select(vec![flat("m1", "A"), flat("m1", "B")]);
        let updates = adapter.pump();
        let [StateUpdate::Selection(Some(tree))] = updates.as_slice() else {
            panic!("expected one selection update, got {updates:?}");
        };
        assert_eq!(tree.chains.len(), 2);
        assert_eq!(tree.chains[0].name, "A");
    }

    #[test]
    fn echoed_selection_event_publishes_nothing() {
        let mut adapter = adapter();
        let _ = adapter.reconcile(&snapshot(vec![mol("1abc")]));
        let ticket = adapter.viewer().ticket_for("1abc");
        adapter.viewer_mut().complete_structure(ticket, "m1");
        let _ = adapter.pump();

        // Adapter-applied selection...
        let scene = SceneSnapshot {
            data: vec![mol("1abc")],
            selection: Some(SelectionDescriptor {
                molecule: Some("1abc".to_owned()),
                targets: Some(vec![Target {
                    chains: vec![Chain::whole("A")],
                    auth: false,
                }]),
                mode: SelectionMode::Select,
                modifier: SelectionModifier::Set,
            }),
            ..SceneSnapshot::default()
        };
        let _ = adapter.reconcile(&scene);

        // ...echoed back by the viewer as a change event.
        adapter
            .viewer_mut()
            .events
            .push_back(ViewerEvent::SelectionChanged);
        assert!(adapter.pump().is_empty());

        // A genuinely different user selection still passes through.
        adapter.viewer_mut().user_select(vec![flat("m1", "Z")]);
        let updates = adapter.pump();
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn selection_cleared_by_user_publishes_none() {
        let mut adapter = adapter();
        adapter.viewer_mut().user_select(vec![flat("m1", "A")]);
        let _ = adapter.pump();
        adapter.viewer_mut().user_select(vec![]);
        assert_eq!(
            adapter.pump(),
            vec![StateUpdate::Selection(None)]
        );
    }

    #[test]
    fn load_resolving_after_removal_is_discarded() {
        let mut adapter = adapter();
        let _ = adapter.reconcile(&snapshot(vec![mol("1abc")]));
        let ticket = adapter.viewer().ticket_for("1abc");
        // Removed before the load resolves.
        let _ = adapter.reconcile(&snapshot(vec![]));
        let _ = adapter.viewer_mut().take_calls();

        adapter.viewer_mut().complete_structure(ticket, "m1");
        let updates = adapter.pump();
        assert!(updates.is_empty());
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![Call::RemoveRef {
                reference: ViewerRef::new("src-m1")
            }]
        );
        assert!(adapter.registry.structure_state("1abc").is_none());
        assert!(adapter.registry.latest_ready().is_none());
    }

    #[test]
    fn failed_load_is_reported_and_terminal() {
        let mut adapter = adapter();
        let scene = snapshot(vec![mol("1abc")]);
        let _ = adapter.reconcile(&scene);
        let ticket = adapter.viewer().ticket_for("1abc");
        adapter.viewer_mut().fail_load(ticket, "parse error");

        let updates = adapter.pump();
        assert_eq!(
            updates,
            vec![StateUpdate::LoadFailed {
                label: "1abc".to_owned(),
                reason: "parse error".to_owned(),
            }]
        );

        // Terminal: the same snapshot never re-issues the load.
        let _ = adapter.viewer_mut().take_calls();
        let _ = adapter.reconcile(&scene);
        assert!(adapter.viewer_mut().take_calls().is_empty());
    }

    #[test]
    fn structure_ready_resets_camera_and_can_auto_focus() {
        let mut adapter = adapter_with(AdapterOptions {
            auto_focus: true,
            ..AdapterOptions::default()
        });
        let _ = adapter.reconcile(&snapshot(vec![mol("1abc")]));
        let ticket = adapter.viewer().ticket_for("1abc");
        let _ = adapter.viewer_mut().take_calls();
        adapter.viewer_mut().complete_structure(ticket, "m1");
        let _ = adapter.pump();
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![
                Call::ResetCamera,
                Call::SetFocus {
                    target_count: 1,
                    analyse: false
                },
            ]
        );
    }

    #[test]
    fn user_frame_change_publishes_and_can_chase_focus() {
        let mut adapter = adapter_with(AdapterOptions {
            update_focus_on_frame_change: true,
            ..AdapterOptions::default()
        });
        let _ = adapter.reconcile(&snapshot(vec![mol("traj")]));
        let ticket = adapter.viewer().ticket_for("traj");
        adapter.viewer_mut().complete_structure(ticket, "m1");
        let _ = adapter.pump();

        let scene = SceneSnapshot {
            data: vec![mol("traj")],
            focus: Some(crate::scene::FocusDescriptor {
                molecule: Some("traj".to_owned()),
                targets: None,
                analyse: false,
            }),
            ..SceneSnapshot::default()
        };
        let _ = adapter.reconcile(&scene);
        let _ = adapter.viewer_mut().take_calls();

        adapter.viewer_mut().user_frame(7);
        let updates = adapter.pump();
        assert_eq!(updates, vec![StateUpdate::Frame(7)]);
        // The focus descriptor is re-applied for the new frame.
        assert_eq!(
            adapter.viewer_mut().take_calls(),
            vec![Call::SetFocus {
                target_count: 1,
                analyse: false
            }]
        );

        // Echo of the adapter's own set_frame is suppressed.
        let _ = adapter.reconcile(&SceneSnapshot {
            frame: Some(9),
            ..scene.clone()
        });
        adapter.viewer_mut().events.push_back(ViewerEvent::FrameChanged);
        assert!(adapter.pump().is_empty());
    }

    #[test]
    fn hover_event_carries_its_own_payload() {
        let mut adapter = adapter();
        adapter
            .viewer_mut()
            .events
            .push_back(ViewerEvent::HoverChanged(vec![flat("m1", "C")]));
        let updates = adapter.pump();
        let [StateUpdate::Hover(Some(tree))] = updates.as_slice() else {
            panic!("expected one hover update, got {updates:?}");
        };
        assert_eq!(tree.chains[0].name, "C");

        // Same payload again is an echo.
        adapter
            .viewer_mut()
            .events
            .push_back(ViewerEvent::HoverChanged(vec![flat("m1", "C")]));
        assert!(adapter.pump().is_empty());
    }
}
