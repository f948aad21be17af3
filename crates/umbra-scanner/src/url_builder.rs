use crate::error::{Result, ScanError};
use umbra_core::Handle;

/// Substitute the handle into a catalog URL template.
///
/// Templates carry a `{handle}` placeholder (validated at catalog load, but
/// re-checked here since registry inserts can bypass the loader).
pub fn build_probe_url(template: &str, handle: &Handle, platform_name: &str) -> Result<String> {
    if !template.contains("{handle}") {
        return Err(ScanError::InvalidTemplate {
            platform: platform_name.to_string(),
            reason: format!("no {{handle}} placeholder in '{template}'"),
        });
    }

    Ok(template.replace("{handle}", handle.as_str()))
}
