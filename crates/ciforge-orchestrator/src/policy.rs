//! How the director and pipeline steps are ordered for one run.

/// Chosen once per deploy, after certificates are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectorPolicy {
    /// Deploy the director and wait, store its assets, clean up, then set
    /// the default pipeline.
    Converge,
    /// Set the default pipeline on the running platform first, then start
    /// the director update without waiting for it.
    SelfUpdate,
}

impl DirectorPolicy {
    /// Self-update only applies when it was asked for and the platform is
    /// already answering. Otherwise there is nothing to hand the update to.
    pub fn select(self_update_requested: bool, platform_reachable: bool) -> Self {
        if self_update_requested && platform_reachable {
            DirectorPolicy::SelfUpdate
        } else {
            DirectorPolicy::Converge
        }
    }

    pub fn detaches_director(&self) -> bool {
        matches!(self, DirectorPolicy::SelfUpdate)
    }
}
