//! App-selection gate: a closed two-way switch over the capture mode.

use crate::models::CaptureMode;

pub fn should_capture_package(mode: CaptureMode, is_package_selected: bool) -> bool {
    match mode {
        CaptureMode::OnlySelectedApps => is_package_selected,
        CaptureMode::AllApps => true,
    }
}
