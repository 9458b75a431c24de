pub mod fingerprint;
pub mod pipeline;

pub use pipeline::CaptureService;
