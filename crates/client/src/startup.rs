//! Client startup.
//!
//! Checks the page can host the app and reads its hydration snapshot.

use tracing::error;

use crate::error::StartupError;
use crate::hydration::HydrationSlot;

/// Id of the element the app mounts into.
pub const MOUNT_POINT_ID: &str = "app";

/// Prepare a page for bootstrap.
///
/// # Errors
///
/// Returns [`StartupError::MissingMountPoint`] if the page has no mount
/// point; nothing else is read in that case.
pub fn prepare(html: &str) -> Result<HydrationSlot, StartupError> {
    if !has_mount_point(html) {
        error!(mount_point = MOUNT_POINT_ID, "Mount point missing, aborting startup");
        return Err(StartupError::MissingMountPoint(MOUNT_POINT_ID));
    }
    Ok(HydrationSlot::from_html(html))
}

fn has_mount_point(html: &str) -> bool {
    let double = format!(r#"id="{MOUNT_POINT_ID}""#);
    let single = format!("id='{MOUNT_POINT_ID}'");
    html.contains(&double) || html.contains(&single)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehost_core::{RouteKind, SnapshotBuilder};

    use super::*;

    #[test]
    fn test_missing_mount_point_aborts() {
        let err = prepare("<html><body><main></main></body></html>").unwrap_err();
        assert!(matches!(err, StartupError::MissingMountPoint("app")));
    }

    #[test]
    fn test_prepare_reads_snapshot() {
        let tag = SnapshotBuilder::new(RouteKind::Spa)
            .finish()
            .to_script_tag()
            .unwrap();
        let html = format!(r#"<body><div id="app"></div>{tag}</body>"#);

        let mut slot = prepare(&html).unwrap();
        assert_eq!(slot.take().unwrap().route(), RouteKind::Spa);
    }

    #[test]
    fn test_page_without_snapshot_starts_cold() {
        let mut slot = prepare("<div id='app'></div>").unwrap();
        assert!(slot.take().is_none());
    }
}
