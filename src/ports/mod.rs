// Ports - Interface definitions (contracts)

use crate::domain::plan::Plan;
use crate::error::EncodeResult;

/// Port for running the external prober on one file
pub trait ProbePort {
    /// Raw probe output (JSON, possibly surrounded by tool chatter)
    fn probe(&self, file_path: &str) -> EncodeResult<String>;
}

/// Port for turning compiled plans into something executable
pub trait RenderPort {
    /// Render every plan of a batch; returns the files written
    fn render(&self, prefix: &str, plans: &[Plan]) -> EncodeResult<Vec<String>>;
}
