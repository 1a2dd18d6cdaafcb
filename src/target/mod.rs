//! Selection target representations and the translator between them.
//!
//! Two shapes of the same information exist side by side:
//!
//! - [`Target`] - the hierarchical chain → residue → atom tree that
//!   callers author selections, components, focus regions, and
//!   measurements with. Absence of `residues`/`atoms` at a level means
//!   "select the whole parent".
//! - [`FlatTarget`] - the viewer-native unit: one record per selected
//!   chain/residue/atom, keyed by model id plus label- or author-
//!   convention identifiers. This is the only shape the viewer
//!   accepts or emits.
//!
//! [`translate`] converts between the two without touching any state.

pub mod translate;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::viewer::ModelId;

pub use translate::{to_flat, to_hierarchical};

// ---------------------------------------------------------------------------
// Hierarchical form (caller-facing)
// ---------------------------------------------------------------------------

/// A single atom inside a residue. Coordinates are optional; they are
/// present on viewer read-backs and ignored when authoring selections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Atom {
    /// Atom name (`CA`, `N`, …).
    pub name: String,
    /// Source-file atom index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// X coordinate in ångström.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// Y coordinate in ångström.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Z coordinate in ångström.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl Atom {
    /// 3D position, if all three coordinates are present.
    #[must_use]
    pub const fn position(&self) -> Option<Vec3> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => Some(Vec3::new(x, y, z)),
            _ => None,
        }
    }
}

/// A residue inside a chain. `index` is the label-convention sequence
/// id, `number` the author-assigned one; either may stand alone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Residue {
    /// Residue name (`GLY`, `ARG`, …).
    pub name: String,
    /// Label-convention sequence id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    /// Author-assigned sequence number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    /// PDB insertion code; empty when none.
    pub ins_code: String,
    /// Atoms of this residue; empty means "the whole residue".
    pub atoms: Vec<Atom>,
}

/// A chain of a structure. `auth_name` falls back to `name` when the
/// author convention does not differ.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Chain {
    /// Label-convention asym id.
    pub name: String,
    /// Author-convention asym id.
    pub auth_name: String,
    /// Residues of this chain; empty means "the whole chain".
    pub residues: Vec<Residue>,
}

impl Chain {
    /// Chain with no residue restriction (whole-chain selection).
    #[must_use]
    pub fn whole(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            auth_name: name.clone(),
            name,
            residues: Vec::new(),
        }
    }
}

/// Hierarchical target tree: the only representation exposed to
/// callers for authoring selections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    /// Selected chains, in authoring order.
    pub chains: Vec<Chain>,
    /// Emit author-convention identifiers when translating to flat
    /// targets (`auth_asym_id`/`auth_seq_id` instead of the label
    /// convention).
    pub auth: bool,
}

impl Target {
    /// Whether the tree selects anything at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Total number of atoms across all chains.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.chains
            .iter()
            .flat_map(|c| c.residues.iter())
            .map(|r| r.atoms.len())
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Flat form (viewer-facing)
// ---------------------------------------------------------------------------

/// Viewer-native selection unit. Field names follow the viewer's wire
/// convention (camelCase). A record with only a `model_id` addresses
/// the whole model; each additional field narrows the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatTarget {
    /// Viewer-assigned model id of the owning structure.
    pub model_id: ModelId,
    /// Label-convention chain id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_asym_id: Option<String>,
    /// Author-convention chain id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_asym_id: Option<String>,
    /// Label-convention residue sequence id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_seq_id: Option<i32>,
    /// Author-convention residue sequence number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_seq_id: Option<i32>,
    /// PDB insertion code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdbx_ins_code: Option<String>,
    /// Residue name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residue_name: Option<String>,
    /// Source-file atom index; present only for atom-level targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_index: Option<u32>,
    /// Atom name, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atom_name: Option<String>,
    /// Atom position, present on viewer read-backs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

impl FlatTarget {
    /// A target addressing an entire model.
    #[must_use]
    pub const fn whole_model(model_id: ModelId) -> Self {
        Self {
            model_id,
            label_asym_id: None,
            auth_asym_id: None,
            label_seq_id: None,
            auth_seq_id: None,
            pdbx_ins_code: None,
            residue_name: None,
            atom_index: None,
            atom_name: None,
            position: None,
        }
    }

    /// Whether this record narrows below the chain level.
    #[must_use]
    pub const fn has_residue_fields(&self) -> bool {
        self.label_seq_id.is_some()
            || self.auth_seq_id.is_some()
            || self.pdbx_ins_code.is_some()
            || self.residue_name.is_some()
            || self.atom_index.is_some()
    }
}
