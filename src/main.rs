use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use fuser::mount2;
use tokio::runtime::Handle;

use jukefs::core::Identity;
use jukefs::librarian::Librarian;
use jukefs::turntable::Turntable;
use jukefs::{GlobalState, JukeError, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut settings = Settings::load()?;

    // Positional args override config: <mountpoint> [source_dir]
    let args: Vec<String> = env::args().collect();
    if let Some(mount) = args.get(1) {
        settings.mount_dir = PathBuf::from(mount);
    }
    if let Some(source) = args.get(2) {
        settings.source_dir = PathBuf::from(source);
    }
    if let Err(msg) = settings.validate() {
        anyhow::bail!("invalid configuration: {msg}");
    }

    tracing::info!("jukefs starting");
    tracing::info!("Source directory: {}", settings.source_dir.display());
    tracing::info!("Mountpoint: {}", settings.mount_dir.display());

    // Watching the directory we mount to would feed our own virtual entries
    // back into ingestion.
    let abs_mount = std::fs::canonicalize(&settings.mount_dir).unwrap_or(settings.mount_dir.clone());
    let abs_source =
        std::fs::canonicalize(&settings.source_dir).unwrap_or(settings.source_dir.clone());
    if abs_source.starts_with(&abs_mount) {
        anyhow::bail!(
            "feedback loop: source dir {} is inside the mountpoint {}",
            abs_source.display(),
            abs_mount.display()
        );
    }
    if abs_mount.starts_with(&abs_source) {
        tracing::warn!("Mountpoint is inside the source directory; expect double events");
    }

    let identity = Identity::capture();
    let mount_options = identity.mount_options();
    let mountpoint = settings.mount_dir.clone();

    let state = Arc::new(GlobalState::new(settings, identity));

    let mut librarian = Librarian::new(Arc::clone(&state), Handle::current());
    librarian.start()?;
    tracing::info!("Librarian (watcher) started");

    let turntable = Turntable::new(state);
    tracing::info!("Mounting FUSE at {}", mountpoint.display());

    if let Err(e) = mount2(turntable, &mountpoint, &mount_options) {
        tracing::error!("FUSE mount failed: {}", e);
        return Err(JukeError::Mount(e.to_string()).into());
    }

    tracing::info!("jukefs shutting down");
    Ok(())
}
