pub mod capture;

pub use capture::FrameSource;
#[cfg(feature = "desktop")]
pub use capture::OpenCvCapture;
