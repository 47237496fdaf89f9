//! An immutable k-d tree over points in R^m.
//!
//! ## Creation
//!
//! Use [`KdTreeBuilder`] to construct a [`KdTree`]: add points one at a
//! time, then call [`KdTreeBuilder::finish`] to run the sliding-midpoint
//! build. The finished tree is read-only; the counting queries in
//! [`crate::count`] consume pairs of built trees.
//!
//! ## Periodic boxes
//!
//! A tree built with [`KdTreeBuilder::with_boxsize`] lives on a torus:
//! every coordinate must lie in `[0, boxsize)` along each periodic axis,
//! and distances wrap to the shorter way around. An axis length of zero
//! leaves that axis non-periodic.
//!
//! ## Example
//!
//! ```
//! use paircount::kdtree::KdTreeBuilder;
//!
//! let mut builder = KdTreeBuilder::new(3);
//! builder.add(&[0.0, 0.0, 0.0])?;
//! builder.add(&[1.0, 2.0, 3.0])?;
//! let tree = builder.finish()?;
//!
//! assert_eq!(tree.num_items(), 2);
//! assert_eq!(tree.dims(), 3);
//! # Ok::<(), paircount::PairCountError>(())
//! ```

mod builder;
mod index;

pub use builder::{KdTreeBuilder, DEFAULT_LEAF_SIZE};
pub use index::KdTree;
pub(crate) use index::{Node, NodeKind};
