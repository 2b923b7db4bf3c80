//! Control panel: the controlling context. Loads the stored record,
//! applies mutations through [`Controller`], and pushes realtime
//! previews to the shade daemon.

mod controller;
mod status;

pub use controller::{Controller, IpcPreviewPush, PreviewPush, detect_host};
pub use status::{preset_label, site_label, status_line};
