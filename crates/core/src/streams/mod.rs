//! Stream resolution pipeline.
//!
//! Identifier -> candidates -> debrid reconciliation -> assembled stream list.

mod assemble;
mod file_selector;
mod format;
mod reconciler;
mod resolver;
mod types;

pub use assemble::{assemble, torrent_stream, torrent_streams};
pub use file_selector::{is_video, parse_episode_hint, select_best_file, VIDEO_EXTENSIONS};
pub use format::{format_bytes, format_details};
pub use reconciler::{reconcile, DebridServices, FallbackEntry, Reconciled};
pub use resolver::{ResolveError, StreamResolver};
pub use types::*;

/// Per-request values shared by reconciliation and assembly.
#[derive(Debug, Clone, Copy)]
pub struct StreamContext<'a> {
    /// Name shown on every stream.
    pub branding: &'a str,
    /// Catalog title, preferred over torrent titles for debrid file hints.
    pub preferred_title: Option<&'a str>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}
