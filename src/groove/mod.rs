// Groove Engine - Candidate timeline, grid snapping, merging, and density
// Turns raw detector timestamps into a playable, bounded event timeline

pub mod aggregate;
pub mod density;
pub mod grid;
pub mod merge;
pub mod quantize;

pub use aggregate::aggregate_candidates;
pub use density::{DensityGovernor, DensityWindow, GovernedTimeline};
pub use grid::{nearest_grid_point, GridDivision, GridPoint, SNAP_DIVISIONS};
pub use merge::merge_close;
pub use quantize::{snap_candidates, SnapKind, SnappedEvent};
