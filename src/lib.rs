#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod policy;
pub mod session;
pub mod snap;
pub mod validate;

#[cfg(feature = "cli")]
pub use cli::run;
pub use ir::{Edge, GraphSpec, Node, NodeKind};
pub use layout::{Axis, NodePosition, NodeSize, PositionMap, SizeMap};
pub use session::{EditorError, EditorSession};
