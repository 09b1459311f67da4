//! Block device counter collection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Sampler (per device)         │
//! │   baseline: Option<BlockStat>                │
//! │   source:   StatSource ── read_stat() ──┐    │
//! └─────────────────────────────────────────┼────┘
//!                                           │ parse_block_stat()
//!                      ┌────────────────────┴──┐
//!                      │  FileSystem (trait)   │
//!                      └──────────┬────────────┘
//!                    ┌────────────┴────────────┐
//!             ┌──────▼──────┐           ┌──────▼──────┐
//!             │   RealFs    │           │   MockFs    │
//!             │ (StatFile)  │           │ (Testing)   │
//!             └─────────────┘           └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use blkstat_core::collector::{FileSystem, MockFs, StatSource, parse_block_stat};
//! use std::path::Path;
//!
//! let fs = MockFs::new();
//! fs.set_device_stat("/sys", "sda", [1, 0, 8, 2, 3, 0, 16, 4, 0, 5, 6]);
//! let mut source = fs.open(Path::new("/sys/block/sda/stat")).unwrap();
//! let stat = parse_block_stat(source.read_stat().unwrap()).unwrap();
//! assert_eq!(stat.read_sectors, 8);
//! ```

pub mod mock;
pub mod parser;
pub mod traits;

pub use mock::MockFs;
pub use parser::{BlockStat, FIELD_COUNT, FIELD_NAMES, ParseError, parse_block_stat};
pub use traits::{FileSystem, RealFs, StatFile, StatSource};
