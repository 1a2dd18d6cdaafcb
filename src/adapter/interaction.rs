//! Interaction synchronizers: selection, hover, focus, frame, and
//! measurements.
//!
//! Each synchronizer compares the incoming field against the last
//! applied one and does nothing on equality, so re-reconciling an
//! unchanged snapshot is free. A descriptor naming a structure whose
//! load has not resolved is dropped with a warning and *not* recorded
//! as applied; the next pass retries it.

use super::{SceneAdapter, StateUpdate};
use crate::error::MolsyncError;
use crate::scene::{
    FocusDescriptor, MeasurementDescriptor, MeasurementMode,
    SelectionDescriptor, SelectionMode,
};
use crate::target::translate::{to_flat, to_hierarchical};
use crate::target::{FlatTarget, Target};
use crate::viewer::{ModelId, Viewer};

impl<V: Viewer> SceneAdapter<V> {
    /// Model id for a descriptor's `molecule` field; absent defaults
    /// to the most recently resolved structure.
    fn resolve_model(
        &self,
        molecule: Option<&str>,
    ) -> Result<ModelId, MolsyncError> {
        match molecule {
            Some(label) => self.registry.model_id(label).cloned().ok_or_else(
                || MolsyncError::UnresolvedLabel(label.to_owned()),
            ),
            None => {
                self.registry.latest_model_id().cloned().ok_or_else(|| {
                    MolsyncError::AmbiguousTarget(
                        "no structure loaded to default to".to_owned(),
                    )
                })
            }
        }
    }

    fn flatten(&self, targets: &[Target], model_id: &ModelId) -> Vec<FlatTarget> {
        targets
            .iter()
            .flat_map(|t| to_flat(t, model_id, t.auth))
            .collect()
    }

    pub(crate) fn sync_selection(
        &mut self,
        next: Option<&SelectionDescriptor>,
        updates: &mut Vec<StateUpdate>,
    ) {
        if next == self.applied.selection.as_ref() {
            return;
        }
        match next {
            None => {
                self.viewer.clear_selection(SelectionMode::Select);
                self.applied.selection = None;
                self.published.selection = None;
            }
            Some(descriptor) => {
                if self.apply_selection(descriptor, updates) {
                    self.applied.selection = Some(descriptor.clone());
                }
            }
        }
    }

    /// Issue one select call and, for persistent selections, read the
    /// viewer's resulting selection back as the value to publish. The
    /// viewer may normalize or prune targets, so its read-back is the
    /// source of truth, not the descriptor.
    pub(crate) fn apply_selection(
        &mut self,
        descriptor: &SelectionDescriptor,
        updates: &mut Vec<StateUpdate>,
    ) -> bool {
        let model_id = match self.resolve_model(descriptor.molecule.as_deref())
        {
            Ok(id) => id,
            Err(e) => {
                log::warn!("selection dropped: {e}");
                return false;
            }
        };
        let flat = descriptor
            .targets
            .as_deref()
            .map(|targets| self.flatten(targets, &model_id))
            .unwrap_or_default();
        self.viewer
            .select(&flat, descriptor.mode, descriptor.modifier);

        if descriptor.mode == SelectionMode::Select {
            let read_back = self.viewer.current_selection();
            let tree = if read_back.is_empty() {
                None
            } else {
                Some(to_hierarchical(&read_back))
            };
            if self.published.selection != tree {
                self.published.selection = tree.clone();
                updates.push(StateUpdate::Selection(tree));
            }
        }
        true
    }

    /// Hover reuses the selection descriptor but the mode is forced to
    /// hover; there is no read-back (the viewer exposes no hover
    /// accessor).
    pub(crate) fn sync_hover(&mut self, next: Option<&SelectionDescriptor>) {
        if next == self.applied.hover.as_ref() {
            return;
        }
        match next {
            None => {
                self.viewer.clear_selection(SelectionMode::Hover);
                self.applied.hover = None;
            }
            Some(descriptor) => {
                let model_id = match self
                    .resolve_model(descriptor.molecule.as_deref())
                {
                    Ok(id) => id,
                    Err(e) => {
                        log::warn!("hover dropped: {e}");
                        return;
                    }
                };
                let flat = descriptor
                    .targets
                    .as_deref()
                    .map(|targets| self.flatten(targets, &model_id))
                    .unwrap_or_default();
                self.viewer.select(
                    &flat,
                    SelectionMode::Hover,
                    descriptor.modifier,
                );
                self.applied.hover = Some(descriptor.clone());
            }
        }
    }

    pub(crate) fn sync_focus(&mut self, next: Option<&FocusDescriptor>) {
        if next == self.applied.focus.as_ref() {
            return;
        }
        match next {
            None => {
                self.viewer.clear_focus();
                self.applied.focus = None;
                self.published.focus = None;
            }
            Some(descriptor) => {
                if descriptor.molecule.is_none() {
                    // Ambiguous with multiple structures loaded;
                    // rejected outright rather than guessed at.
                    log::warn!("focus without a molecule label; ignored");
                    self.applied.focus = Some(descriptor.clone());
                    return;
                }
                if self.apply_focus(descriptor) {
                    self.applied.focus = Some(descriptor.clone());
                }
            }
        }
    }

    /// Issue one focus call. Absent targets focus the whole model.
    pub(crate) fn apply_focus(&mut self, descriptor: &FocusDescriptor) -> bool {
        let model_id = match self.resolve_model(descriptor.molecule.as_deref())
        {
            Ok(id) => id,
            Err(e) => {
                log::warn!("focus dropped: {e}");
                return false;
            }
        };
        let flat = match descriptor.targets.as_deref() {
            Some(targets) if !targets.is_empty() => {
                self.flatten(targets, &model_id)
            }
            _ => vec![FlatTarget::whole_model(model_id)],
        };
        self.viewer.set_focus(&flat, descriptor.analyse);
        self.published.focus =
            Some(to_hierarchical(&self.viewer.current_focus()));
        true
    }

    /// A frame index arriving before any structure resolved is dropped
    /// (and retried next pass); otherwise one `set_frame` per change.
    pub(crate) fn sync_frame(
        &mut self,
        next: Option<usize>,
        updates: &mut Vec<StateUpdate>,
    ) {
        if next == self.applied.frame {
            return;
        }
        match next {
            None => {
                self.applied.frame = None;
            }
            Some(index) => {
                if self.registry.latest_ready().is_none() {
                    log::debug!(
                        "frame {index} before any structure resolved; dropped"
                    );
                    return;
                }
                self.viewer.set_frame(index);
                self.applied.frame = Some(index);
                self.published.frame = Some(index);
                self.rederive_after_frame(updates);
            }
        }
    }

    /// Frames move atoms; optionally chase them with the last applied
    /// focus/selection descriptor. Runs on every frame change,
    /// declarative or viewer-originated.
    pub(crate) fn rederive_after_frame(
        &mut self,
        updates: &mut Vec<StateUpdate>,
    ) {
        if self.options.update_focus_on_frame_change {
            if let Some(descriptor) = self.applied.focus.clone() {
                let _ = self.apply_focus(&descriptor);
            }
        }
        if self.options.update_selection_on_frame_change {
            if let Some(descriptor) = self.applied.selection.clone() {
                let _ = self.apply_selection(&descriptor, updates);
            }
        }
    }

    /// One viewer call per declared measurement, in declaration order.
    /// Any descriptor in `set` mode clears existing measurements
    /// before the batch is applied. A descriptor naming an unresolved
    /// label defers the whole batch, including the set-mode clear, so
    /// nothing is lost and the next pass retries everything.
    pub(crate) fn sync_measurements(
        &mut self,
        next: Option<&Vec<MeasurementDescriptor>>,
    ) {
        if next == self.applied.measurements.as_ref() {
            return;
        }
        match next {
            None => {
                self.viewer.clear_measurements();
                self.applied.measurements = None;
            }
            Some(descriptors) => {
                let mut resolved = Vec::with_capacity(descriptors.len());
                for descriptor in descriptors {
                    match self.resolve_model(descriptor.molecule.as_deref())
                    {
                        Ok(id) => resolved.push(id),
                        Err(e) => {
                            log::warn!("measurements dropped: {e}");
                            return;
                        }
                    }
                }
                if descriptors
                    .iter()
                    .any(|m| m.mode == MeasurementMode::Set)
                {
                    self.viewer.clear_measurements();
                }
                for (descriptor, model_id) in
                    descriptors.iter().zip(&resolved)
                {
                    let flat = self.flatten(&descriptor.targets, model_id);
                    self.viewer.add_measurement(&flat, descriptor.kind);
                }
                self.applied.measurements = Some(descriptors.clone());
            }
        }
    }
}
