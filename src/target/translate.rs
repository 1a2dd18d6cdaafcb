//! Pure bidirectional translation between hierarchical target trees
//! and the viewer's flat per-chain/residue/atom targets.
//!
//! [`to_flat`] expands a tree in authoring order: one flat target per
//! atom where atoms are given, else one per residue, else one per
//! chain. [`to_hierarchical`] regroups a flat list without sorting:
//! the first-seen order of every chain and residue key is preserved,
//! so a read-back round-trips into the tree the caller authored.

use rustc_hash::FxHashMap;

use super::{Atom, Chain, FlatTarget, Residue, Target};
use crate::viewer::ModelId;

/// Residue grouping key: two flat targets belong to the same residue
/// iff all four fields match.
type ResidueKey = (Option<i32>, String, Option<i32>, String);

/// Expand a hierarchical tree into viewer-native flat targets.
///
/// The `auth` flag selects the author- instead of label- naming
/// convention for chain ids and sequence numbers. Fields the tree
/// does not supply are simply omitted, letting the viewer apply its
/// whole-chain/whole-residue fallback semantics.
#[must_use]
pub fn to_flat(
    target: &Target,
    model_id: &ModelId,
    auth: bool,
) -> Vec<FlatTarget> {
    let mut flat = Vec::new();
    for chain in &target.chains {
        let mut base = FlatTarget::whole_model(model_id.clone());
        if auth {
            let name = if chain.auth_name.is_empty() {
                &chain.name
            } else {
                &chain.auth_name
            };
            base.auth_asym_id = Some(name.clone());
        } else {
            base.label_asym_id = Some(chain.name.clone());
        }

        if chain.residues.is_empty() {
            flat.push(base);
            continue;
        }
        for residue in &chain.residues {
            let mut per_residue = base.clone();
            if auth {
                per_residue.auth_seq_id = residue.number.or(residue.index);
            } else {
                per_residue.label_seq_id = residue.index.or(residue.number);
            }
            if !residue.ins_code.is_empty() {
                per_residue.pdbx_ins_code = Some(residue.ins_code.clone());
            }
            if !residue.name.is_empty() {
                per_residue.residue_name = Some(residue.name.clone());
            }

            if residue.atoms.is_empty() {
                flat.push(per_residue);
                continue;
            }
            for atom in &residue.atoms {
                let mut per_atom = per_residue.clone();
                per_atom.atom_index = atom.index;
                if !atom.name.is_empty() {
                    per_atom.atom_name = Some(atom.name.clone());
                }
                per_atom.position = atom.position();
                flat.push(per_atom);
            }
        }
    }
    flat
}

/// Regroup flat targets into one hierarchical tree.
///
/// Grouping, not sorting: chains keep the order their key first
/// appeared in, residues likewise within each chain, and one atom
/// entry is appended per flat target that carries atom-level fields.
#[must_use]
pub fn to_hierarchical(flat: &[FlatTarget]) -> Target {
    let mut chains: Vec<Chain> = Vec::new();
    let mut chain_slots: FxHashMap<String, usize> = FxHashMap::default();
    let mut residue_slots: Vec<FxHashMap<ResidueKey, usize>> = Vec::new();

    for record in flat {
        let chain_key = record
            .label_asym_id
            .clone()
            .or_else(|| record.auth_asym_id.clone())
            .unwrap_or_default();
        let chain_idx = if let Some(&idx) = chain_slots.get(&chain_key) {
            idx
        } else {
            let idx = chains.len();
            chains.push(Chain {
                name: chain_key.clone(),
                auth_name: record
                    .auth_asym_id
                    .clone()
                    .unwrap_or_else(|| chain_key.clone()),
                residues: Vec::new(),
            });
            residue_slots.push(FxHashMap::default());
            let _ = chain_slots.insert(chain_key, idx);
            idx
        };

        // A record with no residue-level fields selects the whole
        // chain; the chain entry above is all it contributes.
        if !record.has_residue_fields() {
            continue;
        }

        let residue_key: ResidueKey = (
            record.label_seq_id,
            record.pdbx_ins_code.clone().unwrap_or_default(),
            record.auth_seq_id,
            record.residue_name.clone().unwrap_or_default(),
        );
        let chain = &mut chains[chain_idx];
        let residue_idx =
            if let Some(&idx) = residue_slots[chain_idx].get(&residue_key) {
                idx
            } else {
                let idx = chain.residues.len();
                chain.residues.push(Residue {
                    name: record.residue_name.clone().unwrap_or_default(),
                    index: record.label_seq_id,
                    number: record.auth_seq_id,
                    ins_code: record
                        .pdbx_ins_code
                        .clone()
                        .unwrap_or_default(),
                    atoms: Vec::new(),
                });
                let _ = residue_slots[chain_idx].insert(residue_key, idx);
                idx
            };

        if record.atom_index.is_some()
            || record.atom_name.is_some()
            || record.position.is_some()
        {
            chain.residues[residue_idx].atoms.push(Atom {
                name: record.atom_name.clone().unwrap_or_default(),
                index: record.atom_index,
                x: record.position.map(|p| p.x),
                y: record.position.map(|p| p.y),
                z: record.position.map(|p| p.z),
            });
        }
    }

    Target {
        chains,
        auth: false,
    }
}
