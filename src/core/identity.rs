//! Process identity, captured once at startup.
//!
//! Virtual directories have no real owner, so synthesized attributes carry
//! the uid/gid of the serving process.

use fuser::MountOption;

#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
    pub is_root: bool,
}

impl Identity {
    pub fn capture() -> Self {
        let uid = unsafe { libc::getuid() };
        let gid = unsafe { libc::getgid() };
        let is_root = uid == 0;

        if is_root {
            tracing::warn!("Running as root; the mount will allow other users");
        } else {
            tracing::info!("Serving as UID:{} GID:{}", uid, gid);
        }

        Self { uid, gid, is_root }
    }

    /// Mount options for a read-only virtual filesystem.
    pub fn mount_options(&self) -> Vec<MountOption> {
        let mut options = vec![
            MountOption::RO,
            MountOption::AutoUnmount,
            MountOption::FSName("jukefs".to_string()),
        ];
        if self.is_root {
            options.push(MountOption::AllowOther);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_is_always_read_only() {
        let identity = Identity { uid: 1000, gid: 1000, is_root: false };
        let options = identity.mount_options();
        assert!(options.iter().any(|o| matches!(o, MountOption::RO)));
        assert!(!options.iter().any(|o| matches!(o, MountOption::AllowOther)));
    }

    #[test]
    fn root_serves_other_users() {
        let identity = Identity { uid: 0, gid: 0, is_root: true };
        assert!(identity
            .mount_options()
            .iter()
            .any(|o| matches!(o, MountOption::AllowOther)));
    }
}
