//! Navigation graph construction and A* pathfinding over terrain faces.
pub mod graph;
pub mod pathfind;

pub use graph::{NavGraph, NavNode, build_nav_graph, step_cost};
pub use pathfind::{PathResult, find_path};
