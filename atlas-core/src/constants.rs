pub const DEFAULT_DATASET_URL: &str =
    "https://cdn.jsdelivr.net/npm/us-atlas@3/counties-albers-10m.json";

pub(crate) const DEFAULT_CONTAINER_ID: &str = "map";
pub(crate) const DEFAULT_OBJECT_NAME: &str = "states";

pub(crate) const SHAPE_CLASS: &str = "state";

// Radius used by the path generator when drawing point geometries.
pub(crate) const POINT_RADIUS: f64 = 4.5;

// Smallest number of positions a closed ring can hold.
pub(crate) const MIN_RING_POSITIONS: usize = 4;

pub(crate) const TOPOLOGY_TYPE: &str = "Topology";
