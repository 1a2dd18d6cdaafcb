//! Declarative scene model: entries, components, interaction
//! descriptors, and the full snapshot handed to the adapter.
//!
//! Everything here is plain serde data authored by the host. Entry
//! kinds form a closed tagged union on the `type` field; a kind the
//! adapter does not know is a deserialization error, never a silent
//! skip. Labels default to the empty string and must be unique within
//! their kind at any instant.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use glam::Vec3;

use crate::error::MolsyncError;
use crate::target::Target;

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Structure file formats the viewer can parse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StructureFormat {
    /// mmCIF.
    #[default]
    Mmcif,
    /// CIF core dictionary.
    #[serde(rename = "cifCore")]
    CifCore,
    /// Legacy PDB.
    Pdb,
    /// AutoDock PDBQT.
    Pdbqt,
    /// GROMACS GRO.
    Gro,
    /// Plain XYZ.
    Xyz,
    /// MDL molfile.
    Mol,
    /// MDL SDF.
    Sdf,
    /// Tripos MOL2.
    Mol2,
}

/// Viewer state/session snapshot formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Plain JSON state.
    #[default]
    Json,
    /// Molstar state file.
    Molj,
    /// Molstar session file.
    Molx,
    /// Zipped session.
    Zip,
}

/// Trajectory coordinate formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFormat {
    /// CHARMM/NAMD DCD.
    #[default]
    Dcd,
    /// GROMACS XTC.
    Xtc,
    /// GROMACS TRR.
    Trr,
    /// AMBER NetCDF.
    Nctraj,
}

// ---------------------------------------------------------------------------
// Representations
// ---------------------------------------------------------------------------

/// Visual representation kinds for components.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RepresentationKind {
    /// Residue labels.
    Label,
    /// Bond lines.
    Line,
    /// Cartoon ribbons.
    #[default]
    Cartoon,
    /// Backbone trace.
    Backbone,
    /// Ball-and-stick.
    BallAndStick,
    /// Carbohydrate symbols.
    Carbohydrate,
    /// Thermal ellipsoids.
    Ellipsoid,
    /// Gaussian surface.
    GaussianSurface,
    /// Gaussian volume.
    GaussianVolume,
    /// Molecular surface.
    MolecularSurface,
    /// Orientation boxes.
    Orientation,
    /// Points.
    Point,
    /// B-factor putty.
    Putty,
    /// Space-filling spheres.
    Spacefill,
}

/// Component representation: a kind plus opaque theme parameters the
/// adapter passes straight through to the viewer.
///
/// Deserializes from either a bare kind string (`"cartoon"`) or the
/// full object form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, from = "RepresentationDe")]
pub struct Representation {
    /// Representation kind.
    #[serde(rename = "type")]
    pub kind: RepresentationKind,
    /// Color theme name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Size theme name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Kind-specific parameters, passed through untouched.
    #[serde(rename = "typeParams", skip_serializing_if = "Option::is_none")]
    pub type_params: Option<serde_json::Value>,
    /// Color theme parameters, passed through untouched.
    #[serde(rename = "colorParams", skip_serializing_if = "Option::is_none")]
    pub color_params: Option<serde_json::Value>,
    /// Size theme parameters, passed through untouched.
    #[serde(rename = "sizeParams", skip_serializing_if = "Option::is_none")]
    pub size_params: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RepresentationDe {
    Kind(RepresentationKind),
    Full {
        #[serde(rename = "type", default)]
        kind: RepresentationKind,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        size: Option<String>,
        #[serde(rename = "typeParams", default)]
        type_params: Option<serde_json::Value>,
        #[serde(rename = "colorParams", default)]
        color_params: Option<serde_json::Value>,
        #[serde(rename = "sizeParams", default)]
        size_params: Option<serde_json::Value>,
    },
}

impl From<RepresentationDe> for Representation {
    fn from(de: RepresentationDe) -> Self {
        match de {
            RepresentationDe::Kind(kind) => Self {
                kind,
                ..Self::default()
            },
            RepresentationDe::Full {
                kind,
                color,
                size,
                type_params,
                color_params,
                size_params,
            } => Self {
                kind,
                color,
                size,
                type_params,
                color_params,
                size_params,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Scene entries
// ---------------------------------------------------------------------------

/// A component declared on a structure entry. Owned by exactly one
/// structure; addressed everywhere else by the composite label
/// `"<structureLabel>.<componentLabel>"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Component {
    /// Component label; `"Polymer"` replaces the viewer's own polymer
    /// component instead of sitting next to it.
    pub label: String,
    /// Regions of the owning structure this component covers.
    pub targets: Vec<Target>,
    /// How the component is drawn.
    pub representation: Representation,
}

/// Inline structure entry: the file content travels in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureEntry {
    /// Unique label within structure-like entries.
    #[serde(default)]
    pub label: String,
    /// Raw structure file content.
    pub data: String,
    /// Format of `data`.
    pub format: StructureFormat,
    /// Components to create once the load resolves.
    #[serde(
        default,
        rename = "component",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub components: Vec<Component>,
    /// Opaque load preset, passed through to the viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<serde_json::Value>,
}

/// What a url entry points at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UrlFor {
    /// A structure file.
    #[default]
    Mol,
    /// A viewer state/session snapshot.
    Snapshot,
}

/// Format of a url entry, structure or snapshot depending on `urlfor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlFormat {
    /// Structure file format.
    Structure(StructureFormat),
    /// Snapshot file format.
    Snapshot(SnapshotFormat),
}

/// URL-referenced entry: a structure the viewer fetches itself, or a
/// fire-and-forget snapshot load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlEntry {
    /// Unique label within its kind.
    #[serde(default)]
    pub label: String,
    /// The URL.
    pub data: String,
    /// Structure or snapshot.
    #[serde(default)]
    pub urlfor: UrlFor,
    /// Format of the referenced file.
    pub format: UrlFormat,
    /// Components to create once the load resolves (structures only).
    #[serde(
        default,
        rename = "component",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub components: Vec<Component>,
    /// Opaque load preset, passed through to the viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<serde_json::Value>,
}

/// Topology half of a trajectory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySource {
    /// Raw topology file content or URL.
    pub data: String,
    /// Format of `data`.
    pub format: StructureFormat,
}

/// Coordinate half of a trajectory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSource {
    /// Raw coordinate file content or URL.
    pub data: String,
    /// Format of `data`.
    pub format: CoordinateFormat,
}

/// Trajectory entry: topology plus coordinates, loaded as one
/// structure whose frames the `frame` prop steps through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    /// Unique label within structure-like entries.
    #[serde(default)]
    pub label: String,
    /// Topology source.
    pub topology: TopologySource,
    /// Coordinate source.
    pub coordinates: CoordinateSource,
    /// Components to create once the load resolves.
    #[serde(
        default,
        rename = "component",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub components: Vec<Component>,
    /// Opaque load preset, passed through to the viewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<serde_json::Value>,
}

/// Shape geometry parameters, tagged on the `shape` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ShapeGeometry {
    /// Axis-aligned bounding box drawn as edges.
    Box {
        /// Minimum corner.
        min: Vec3,
        /// Maximum corner.
        max: Vec3,
        /// Edge radius in ångström.
        #[serde(default = "default_edge_radius")]
        radius: f32,
    },
    /// Bounding sphere.
    Sphere {
        /// Sphere center.
        center: Vec3,
        /// Sphere radius in ångström.
        radius: f32,
        /// Tessellation detail.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<u32>,
    },
}

fn default_edge_radius() -> f32 {
    0.1
}

fn default_shape_color() -> String {
    "red".to_owned()
}

fn default_alpha() -> f32 {
    1.0
}

/// A primitive shape entry. Shapes have no update path: changed
/// parameters must arrive as remove-then-recreate from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeEntry {
    /// Unique label within shape entries.
    #[serde(default)]
    pub label: String,
    /// Geometry parameters.
    #[serde(flatten)]
    pub geometry: ShapeGeometry,
    /// X11 color name.
    #[serde(default = "default_shape_color")]
    pub color: String,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

/// One entry of the declarative `data` list. The tag set is closed;
/// anything else fails deserialization as a validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneEntry {
    /// Inline structure data.
    Mol(StructureEntry),
    /// URL-referenced structure or snapshot.
    Url(UrlEntry),
    /// Topology + coordinates trajectory.
    Trajectory(TrajectoryEntry),
    /// Primitive shape.
    Shape(ShapeEntry),
}

impl SceneEntry {
    /// The entry's label (empty string when the caller omitted one).
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Mol(e) => &e.label,
            Self::Url(e) => &e.label,
            Self::Trajectory(e) => &e.label,
            Self::Shape(e) => &e.label,
        }
    }

    /// Whether this entry loads as a structure with a model identity
    /// (snapshot urls and shapes do not).
    #[must_use]
    pub fn is_structure_like(&self) -> bool {
        match self {
            Self::Mol(_) | Self::Trajectory(_) => true,
            Self::Url(e) => e.urlfor == UrlFor::Mol,
            Self::Shape(_) => false,
        }
    }

    /// Declared components, empty for entries that cannot carry any.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        match self {
            Self::Mol(e) => &e.components,
            Self::Url(e) => &e.components,
            Self::Trajectory(e) => &e.components,
            Self::Shape(_) => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Interaction descriptors
// ---------------------------------------------------------------------------

/// Selection mode: persistent selection or transient hover highlight.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Persistent selection.
    #[default]
    Select,
    /// Transient highlight.
    Hover,
}

/// Whether a selection replaces or extends the existing one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SelectionModifier {
    /// Replace the current selection.
    #[default]
    Set,
    /// Add to the current selection.
    Add,
}

/// Declarative selection (or hover) descriptor. `molecule` names the
/// structure label; when absent the most recently loaded structure is
/// used.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionDescriptor {
    /// Structure label the targets belong to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub molecule: Option<String>,
    /// Regions to select; `None` selects nothing (with `set` this
    /// clears).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<Target>>,
    /// Select or hover.
    pub mode: SelectionMode,
    /// Replace or extend.
    pub modifier: SelectionModifier,
}

/// Declarative camera focus descriptor. A descriptor without a
/// `molecule` is ambiguous and rejected as a no-op.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusDescriptor {
    /// Structure label to focus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub molecule: Option<String>,
    /// Regions to focus; absent focuses the whole structure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<Target>>,
    /// Analyse non-covalent interactions around the focused region.
    pub analyse: bool,
}

/// Measurement kinds the viewer supports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Pairwise distance.
    #[default]
    Distance,
    /// Three-point angle.
    Angle,
    /// Four-point dihedral.
    Dihedral,
    /// Text label on a target.
    Label,
    /// Orientation box.
    Orientation,
}

/// Whether a measurement set replaces or extends existing ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementMode {
    /// Append to existing measurements.
    #[default]
    Add,
    /// Clear all measurements first.
    Set,
}

/// One declarative measurement. Multiple descriptors may be declared;
/// each becomes exactly one viewer call, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementDescriptor {
    /// Structure label the targets belong to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub molecule: Option<String>,
    /// Measured points, one tree per point group.
    pub targets: Vec<Target>,
    /// What to measure.
    pub kind: MeasurementKind,
    /// Replace or extend.
    pub mode: MeasurementMode,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The full declarative snapshot handed to
/// [`SceneAdapter::reconcile`](crate::adapter::SceneAdapter::reconcile).
///
/// Every interaction field is independently nullable; `None` means
/// "clear". The `data` field accepts a single entry or a list on the
/// wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSnapshot {
    /// Scene contents.
    #[serde(deserialize_with = "one_or_many")]
    pub data: Vec<SceneEntry>,
    /// Persistent selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionDescriptor>,
    /// Transient hover highlight (mode is forced to hover).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<SelectionDescriptor>,
    /// Camera focus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<FocusDescriptor>,
    /// Trajectory frame index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<usize>,
    /// Declared measurements.
    #[serde(
        rename = "measurement",
        deserialize_with = "opt_one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub measurements: Option<Vec<MeasurementDescriptor>>,
}

impl SceneSnapshot {
    /// Parse a snapshot from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`MolsyncError::SnapshotParse`] for malformed input,
    /// including entries with an unknown `type` tag.
    pub fn from_json(json: &str) -> Result<Self, MolsyncError> {
        serde_json::from_str(json)
            .map_err(|e| MolsyncError::SnapshotParse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Accept `T` or `[T]` on the wire, normalizing to a list.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// Accept `null`, `T`, or `[T]` on the wire.
fn opt_one_or_many<'de, D, T>(
    deserializer: D,
) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<OneOrMany<T>>::deserialize(deserializer)?.map(
        |v| match v {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        MeasurementKind, Representation, RepresentationKind, SceneEntry,
        SceneSnapshot, SelectionMode, SelectionModifier, ShapeGeometry,
        StructureFormat, UrlFor, UrlFormat,
    };

    #[test]
    fn mol_entry_round_trips() {
        let json = r#"{
            "type": "mol",
            "label": "1abc",
            "data": "ATOM ...",
            "format": "pdb",
            "component": {
                "label": "Pocket",
                "targets": [{"chains": [{"name": "A"}]}],
                "representation": "ball-and-stick"
            }
        }"#;
        let entry: SceneEntry = serde_json::from_str(json).unwrap();
        let SceneEntry::Mol(ref mol) = entry else {
            panic!("expected mol entry");
        };
        assert_eq!(mol.label, "1abc");
        assert_eq!(mol.format, StructureFormat::Pdb);
        assert_eq!(mol.components.len(), 1);
        assert_eq!(
            mol.components[0].representation.kind,
            RepresentationKind::BallAndStick
        );
        assert!(entry.is_structure_like());
    }

    #[test]
    fn unknown_entry_kind_is_rejected() {
        let json = r#"{"type": "volume", "label": "v", "data": ""}"#;
        assert!(serde_json::from_str::<SceneEntry>(json).is_err());

        let snapshot = r#"{"data": {"type": "volume", "data": ""}}"#;
        let err = SceneSnapshot::from_json(snapshot).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MolsyncError::SnapshotParse(_)
        ));
    }

    #[test]
    fn url_entry_for_snapshot_is_not_structure_like() {
        let json = r#"{
            "type": "url",
            "urlfor": "snapshot",
            "data": "https://example.org/session.molx",
            "format": "molx"
        }"#;
        let entry: SceneEntry = serde_json::from_str(json).unwrap();
        assert!(!entry.is_structure_like());
        let SceneEntry::Url(url) = entry else {
            panic!("expected url entry");
        };
        assert_eq!(url.urlfor, UrlFor::Snapshot);
        assert!(matches!(url.format, UrlFormat::Snapshot(_)));
    }

    #[test]
    fn shape_entry_defaults() {
        let json = r#"{
            "type": "shape",
            "shape": "box",
            "label": "site",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 2.0, 3.0]
        }"#;
        let entry: SceneEntry = serde_json::from_str(json).unwrap();
        let SceneEntry::Shape(shape) = entry else {
            panic!("expected shape entry");
        };
        assert_eq!(shape.color, "red");
        assert!((shape.alpha - 1.0).abs() < f32::EPSILON);
        let ShapeGeometry::Box { radius, .. } = shape.geometry else {
            panic!("expected box geometry");
        };
        assert!((radius - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn representation_accepts_bare_kind_string() {
        let repr: Representation =
            serde_json::from_str("\"molecular-surface\"").unwrap();
        assert_eq!(repr.kind, RepresentationKind::MolecularSurface);
        assert!(repr.color.is_none());
    }

    #[test]
    fn snapshot_accepts_single_entry_and_single_measurement() {
        let json = r#"{
            "data": {"type": "mol", "label": "m", "data": "", "format": "pdb"},
            "selection": {"mode": "hover", "modifier": "add"},
            "frame": 3,
            "measurement": {"kind": "angle", "targets": []}
        }"#;
        let snapshot: SceneSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.data.len(), 1);
        assert_eq!(snapshot.frame, Some(3));
        let selection = snapshot.selection.unwrap();
        assert_eq!(selection.mode, SelectionMode::Hover);
        assert_eq!(selection.modifier, SelectionModifier::Add);
        let measurements = snapshot.measurements.unwrap();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].kind, MeasurementKind::Angle);
    }
}
