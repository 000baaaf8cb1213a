use std::path::PathBuf;

/// A filesystem change relevant to the resource index.
///
/// Paths are absolute. The LSP layer translates `notify` events into these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    Created(PathBuf),
    Changed(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl WorkspaceEvent {
    /// Every path the event touches.
    pub fn paths(&self) -> Vec<&PathBuf> {
        match self {
            WorkspaceEvent::Created(path)
            | WorkspaceEvent::Changed(path)
            | WorkspaceEvent::Removed(path) => vec![path],
            WorkspaceEvent::Renamed { from, to } => vec![from, to],
        }
    }
}
