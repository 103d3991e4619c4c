pub mod dag;
pub mod graph;
