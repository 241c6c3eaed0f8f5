//! Relations between mapped entities.
//!
//! - [`Identity`]: the key column(s) of a mapped table
//! - [`Relation`]: the parent field an attached mapper fills

pub mod def;
pub mod identity;

pub use def::{Relation, RelationType};
pub use identity::{Identity, IdentityIter};
