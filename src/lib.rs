pub mod count;
pub mod error;
pub mod kdtree;
pub mod metric;
pub mod rect;

pub use count::{count_neighbors, count_neighbors_weighted, TreeWeights};
pub use error::{PairCountError, Result};
pub use kdtree::{KdTree, KdTreeBuilder};
