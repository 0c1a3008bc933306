//! Graphviz export of a decode tree.
//!
//! One dot node per tree node labeled with its id and path metric, one dot
//! edge per incoming edge labeled with the input symbol and the edge
//! metric.  Nodes on the final path are filled with a light color.

use std::io::{self,Write};
use super::tree::Tree;

/// Write the tree rooted at `root` as a dot digraph.
pub fn write_dot<R, W: Write>(tree: &Tree<R>, root: usize, os: &mut W) -> io::Result<()> {
    let mut pending = vec![root];
    let mut slots: Vec<usize> = Vec::new();
    while let Some(slot) = pending.pop() {
        slots.push(slot);
        pending.extend(tree.node(slot).children.iter().rev().copied());
    }
    writeln!(os,"digraph G {{")?;
    writeln!(os,"    rankdir=LR")?;
    writeln!(os)?;
    for &slot in &slots {
        let node = tree.node(slot);
        let shape = match node.depth < 0 {
            true => "box",
            false => "ellipse"
        };
        write!(os,"    n_{} [shape={}, label=\"{} {}\"",node.id,shape,node.id,node.path_metric)?;
        if node.on_final_path {
            write!(os," style=filled fillcolor=lightblue")?;
        }
        writeln!(os,"]")?;
    }
    for &slot in &slots {
        let node = tree.node(slot);
        if let Some(parent) = node.parent {
            writeln!(os,"    n_{} -> n_{} [label=\"{} {}\"]",
                tree.node(parent).id,node.id,node.in_symbol,node.edge_metric)?;
        }
    }
    writeln!(os,"}}")?;
    Ok(())
}

// *************** TESTS *****************

#[test]
fn dot_output_shape() {
    use super::tree::Node;
    let mut tree: Tree<u8> = Tree::new();
    let root = tree.insert(Node::root(0));
    let child = tree.insert(Node {
        id: 1,
        parent: Some(root),
        in_symbol: 1,
        out_symbol: 3,
        edge_metric: -0.5,
        path_metric: -0.5,
        depth: 0,
        registers: vec![1],
        children: Vec::new(),
        on_final_path: true,
        traversed_back: false
    });
    tree.node_mut(root).children.push(child);
    let mut buf: Vec<u8> = Vec::new();
    write_dot(&tree,root,&mut buf).expect("write failed");
    let dot = String::from_utf8(buf).expect("not utf8");
    assert!(dot.starts_with("digraph G {"));
    assert!(dot.contains("rankdir=LR"));
    assert!(dot.contains("n_0 [shape=box"));
    assert!(dot.contains("n_1 [shape=ellipse"));
    assert!(dot.contains("style=filled fillcolor=lightblue"));
    assert!(dot.contains("n_0 -> n_1 [label=\"1 -0.5\"]"));
    assert!(dot.trim_end().ends_with("}"));
}
