pub mod detector;
pub mod heatmap;
pub mod joint;
pub mod preprocess;
pub mod resize;

#[cfg(feature = "desktop")]
pub use detector::CpmDetector;
pub use detector::HandModel;
pub use heatmap::{decode, Heatmap};
pub use joint::{HandJoint, Joint, JointSet};
pub use preprocess::{center_map_tensor, gaussian_center_map, preprocess_for_cpm};
pub use resize::resize_channels;
