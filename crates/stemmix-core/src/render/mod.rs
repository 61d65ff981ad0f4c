//! Offline render/export
//!
//! Snapshots the current channel gains, stages the mix's stems, and
//! drives the system transcoder to produce one encoded file.

mod graph;
mod message;
mod service;

pub use graph::{
    build_filter_graph, output_encoding_args, valid_filename, ChannelInput, RenderRequest,
    DEFAULT_BITRATE_KBPS,
};
pub use message::RenderProgress;
pub use service::{InitResult, RenderError, RenderService};
