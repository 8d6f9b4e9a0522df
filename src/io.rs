//! Codecs, the read and write engines, and the storage backends.
//!
//! The engines are backend agnostic:
//! - [`reader::ChunkedReader`] reads slices through a [`reader::RangeFetch`]
//! - [`writer::ChunkedSender`] writes batches through a [`writer::Destination`]
//! - [`slicer::Slicer`] produces the worklist of slices
//!
//! Each backend module provides the primitives for one kind of storage:
//!
//! | Backend | Fetch | Destination | Slicer |
//! |---------|-------|-------------|--------|
//! | [`local`] | [`local::FileFetcher`] | [`local::FsDestination`] | [`slicer::DirectorySlicer`] + [`local::LocalLister`] |
//! | [`hdfs`] | [`hdfs::HdfsFetcher`] | [`hdfs::HdfsDestination`] | [`slicer::DirectorySlicer`] + [`hdfs::HdfsLister`] |
//! | [`object`] | [`object::ObjectFetcher`] | [`object::ObjectDestination`] | [`object::ObjectSlicer`] |

pub mod cloud;
pub mod compression;
pub mod hdfs;
pub mod local;
pub mod object;
pub mod reader;
pub mod slicer;
pub mod writer;
