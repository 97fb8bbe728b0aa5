pub mod dom_utils;
pub mod traverse;

mod dom_builder;
mod entities;
mod tokenizer;
mod types;

pub use crate::dom_builder::{build_dom, build_fragment};
pub use crate::tokenizer::tokenize;
pub use crate::types::{Id, Node, NodeId, Token};

/// Parses a full page into a document tree with unassigned node ids.
pub fn parse_document(input: &str) -> Node {
    build_dom(&tokenize(input))
}

/// Parses a fragment of markup into top-level nodes with unassigned node ids.
pub fn parse_fragment(input: &str) -> Vec<Node> {
    build_fragment(&tokenize(input))
}
