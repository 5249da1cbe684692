pub mod bbox;
pub mod matrix;
pub mod point;
pub mod report;

pub use bbox::BoundingBox;
pub use matrix::BitMatrix;
pub use point::{Point, PointI};
pub use report::{
    AttemptRecord, DetectedModule, ErrorReport, FrameDimensions, ModulePosition, ScanReport,
};
