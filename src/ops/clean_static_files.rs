use crate::error::Result;
use std::path::Path;

const STATIC_VIEW_DIR: &str = "pub/static";
const STATIC_VIEW_ENTRIES: [&str; 3] = ["adminhtml", "frontend", "deployed_version.txt"];
const VIEW_PREPROCESSED_DIR: &str = "var/view_preprocessed";

/// Clears generated static view files under the installation base directory:
/// the adminhtml/frontend trees and the deployed-version marker under
/// `pub/static`, and all of `var/view_preprocessed`. Paths that do not exist
/// are skipped.
pub async fn clean_static_view_files(base_dir: &Path) -> Result<()> {
    let static_view = base_dir.join(STATIC_VIEW_DIR);
    for entry in STATIC_VIEW_ENTRIES {
        remove_path(&static_view.join(entry)).await?;
    }

    remove_path(&base_dir.join(VIEW_PREPROCESSED_DIR)).await?;
    Ok(())
}

async fn remove_path(path: &Path) -> Result<()> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await?;
    } else {
        tokio::fs::remove_file(path).await?;
    }
    log::info!("Removed {}", path.display());
    Ok(())
}
