//! # Product archive
//!
//! Getting a SINEX solution from the archive to a line reader:
//!
//! * [`fetch`] – HTTP retrieval behind the [`Fetch`] trait ([`ArchiveClient`]) and a local
//!   directory stand-in ([`LocalMirror`]),
//! * [`decompress`] – `.Z` / `.gz` / plain handling ending in a [`SolutionReader`].
pub mod decompress;
pub mod fetch;

pub use decompress::{prepare_solution, uncompress_unix, SolutionReader};
pub use fetch::{keep_auth_header, ArchiveClient, Fetch, LocalMirror};
