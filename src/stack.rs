//! Stack decoder, the Zigangirov-Jelinek algorithm.
//!
//! Best-first traversal of the code tree: an ordered stack keeps every live
//! node keyed by path metric, the top node is expanded and replaced by its
//! children until the top reaches terminal depth.  The root is never in the
//! stack.

use num_traits::{PrimInt,Unsigned};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::{self,Write};
use crate::encoder::ConvEncoder;
use crate::relmat::ReliabilityMatrix;
use crate::seq::SeqCore;
use crate::tools::graphviz;
use crate::tools::tree::{Node,Tree};
use crate::Error;

/// Stack ordering key: by path metric, ties broken by node id.
#[derive(Clone,Copy,Debug)]
struct StackKey {
    path_metric: f32,
    node_id: u32
}

impl Ord for StackKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path_metric.total_cmp(&other.path_metric).then(self.node_id.cmp(&other.node_id))
    }
}

impl PartialOrd for StackKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for StackKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StackKey {}

pub struct StackDecoder<R: PrimInt + Unsigned = u64> {
    core: SeqCore<R>,
    tree: Tree<R>,
    root: usize,
    /// live nodes by increasing (path metric, id); the best is last
    node_stack: BTreeMap<StackKey,usize>,
    /// give up when the best path metric falls to this value
    giveup_threshold: Option<f32>
}

impl <R: PrimInt + Unsigned> StackDecoder<R> {
    /// Create a stack decoder for the given code.
    pub fn new(constraints: Vec<u32>, genpolys: Vec<Vec<R>>) -> Result<Self,Error> {
        let encoder = ConvEncoder::new(constraints,genpolys)?;
        Ok(Self {
            core: SeqCore::new(encoder),
            tree: Tree::new(),
            root: 0,
            node_stack: BTreeMap::new(),
            giveup_threshold: None
        })
    }

    /// Give up once the best path metric is at or below this value.
    pub fn set_giveup_threshold(&mut self, giveup_threshold: f32) {
        self.giveup_threshold = Some(giveup_threshold);
    }
    /// Run until the end of the tree regardless of the metric.
    pub fn clear_giveup_threshold(&mut self) {
        self.giveup_threshold = None;
    }
    /// Stop and fail when more than this many nodes have been created.
    pub fn set_node_limit(&mut self, node_limit: u32) {
        self.core.node_limit = Some(node_limit);
    }
    pub fn clear_node_limit(&mut self) {
        self.core.node_limit = None;
    }
    /// Assume the last m-1 message symbols are zero (on by default).
    pub fn set_tail_zeros(&mut self, tail_zeros: bool) {
        self.core.tail_zeros = tail_zeros;
    }
    /// Bias subtracted from every edge metric.
    pub fn set_edge_bias(&mut self, edge_bias: f32) {
        self.core.edge_bias = edge_bias;
    }
    pub fn set_verbosity(&mut self, verbosity: u32) {
        self.core.verbosity = verbosity;
    }

    /// Path metric of the codeword found by the last successful decode.
    pub fn score(&self) -> f32 {
        self.core.codeword_score
    }
    /// Codeword score in dB per symbol.
    pub fn score_db_per_symbol(&self) -> f32 {
        self.core.score_db_per_symbol()
    }
    /// Number of nodes created by the last decode, root included.
    pub fn nb_nodes(&self) -> u32 {
        self.core.node_count
    }
    pub fn current_depth(&self) -> i32 {
        self.core.cur_depth
    }
    pub fn max_depth(&self) -> i32 {
        self.core.max_depth
    }
    /// Path metric at the top of the stack, 0 before the first expansion.
    pub fn stack_score(&self) -> f32 {
        match self.node_stack.last_key_value() {
            Some((key,_)) => key.path_metric,
            None => 0.0
        }
    }
    /// Number of live nodes in the stack
    pub fn stack_size(&self) -> usize {
        self.node_stack.len()
    }

    /// Reset to a freshly-constructed state.
    pub fn reset(&mut self) {
        self.tree.clear();
        self.node_stack.clear();
        self.core.reset();
    }

    /// Decode a message from the reliability matrix.
    /// Returns `Ok(Some(message))` on success and `Ok(None)` when the
    /// give-up threshold or the node limit was hit; the statistics stay
    /// readable either way.  A matrix that does not match the code
    /// dimensions is an error.
    pub fn decode(&mut self, relmat: &ReliabilityMatrix) -> Result<Option<Vec<u32>>,Error> {
        self.core.check_relmat(relmat)?;
        self.reset();
        self.root = self.tree.insert(Node::root(0));
        self.core.node_count = 1;
        self.visit_node(self.root,relmat);

        loop {
            let (&key,&top) = self.node_stack.last_key_value().expect("empty node stack");
            if matches!(self.giveup_threshold,Some(giveup) if key.path_metric <= giveup) {
                log::warn!("give-up threshold encountered");
                return Ok(None);
            }
            if self.tree.node(top).depth == relmat.message_length() as i32 - 1 {
                // the top of the stack is the solution
                self.core.codeword_score = key.path_metric;
                return Ok(Some(self.tree.back_track(top)));
            }
            if self.core.verbosity > 1 {
                log::debug!("top node #{} depth={} Mc={}",key.node_id,self.tree.node(top).depth,key.path_metric);
            }
            self.visit_node(top,relmat);
            if matches!(self.core.node_limit,Some(limit) if self.core.node_count > limit) {
                log::warn!("node limit exhausted");
                return Ok(None);
            }
        }
    }

    /// Print the statistics line of the last decode followed by the
    /// machine-readable `_RES` summary.
    pub fn print_stats<W: Write>(&self, os: &mut W, success: bool) -> io::Result<()> {
        writeln!(os,"score = {} stack = {} nodes = {} max depth = {}",
            self.core.codeword_score,
            self.node_stack.len(),
            self.core.node_count,
            self.core.max_depth)?;
        writeln!(os,"_RES {},{},{},{},{}",
            if success {1} else {0},
            self.core.codeword_score,
            self.node_stack.len(),
            self.core.node_count,
            self.core.max_depth)
    }

    /// Write the decode tree of the last decode in Graphviz dot format.
    pub fn print_dot<W: Write>(&self, os: &mut W) -> io::Result<()> {
        if self.tree.len() == 0 {
            return Ok(());
        }
        graphviz::write_dot(&self.tree,self.root,os)
    }

    /// Expand a node: create its children, push them on the stack and drop
    /// the node itself from the stack.
    fn visit_node(&mut self, node: usize, relmat: &ReliabilityMatrix) {
        let forward_depth = self.tree.node(node).depth + 1;

        // return the encoder to the appropriate state, the root starts from
        // cleared registers
        if self.tree.node(node).depth >= 0 {
            let registers = self.tree.node(node).registers.clone();
            self.core.encoder.set_registers(&registers);
        }

        let end_symbol = self.core.end_symbol(forward_depth,relmat.message_length());
        let parent_path_metric = self.tree.node(node).path_metric;
        for in_symbol in 0..end_symbol {
            // step only once per symbol place
            let out_symbol = self.core.encoder.encode(in_symbol,in_symbol == 0);
            let edge_metric = relmat.get(out_symbol,forward_depth as usize).log2() - self.core.edge_bias;
            let path_metric = parent_path_metric + edge_metric;
            let child = self.tree.insert(Node {
                id: self.core.node_count,
                parent: Some(node),
                in_symbol,
                out_symbol,
                edge_metric,
                path_metric,
                depth: forward_depth,
                registers: self.core.encoder.registers().to_vec(),
                children: Vec::new(),
                on_final_path: false,
                traversed_back: false
            });
            self.tree.node_mut(node).children.push(child);
            self.node_stack.insert(StackKey {path_metric,node_id: self.core.node_count},child);
            self.core.node_count += 1;
        }
        self.core.cur_depth = forward_depth;
        if forward_depth > self.core.max_depth {
            self.core.max_depth = forward_depth;
        }
        // the expanded node leaves the stack, the root was never in it
        if self.tree.node(node).depth >= 0 {
            let key = StackKey {
                path_metric: self.tree.node(node).path_metric,
                node_id: self.tree.node(node).id
            };
            self.node_stack.remove(&key);
        }
    }
}

// *************** TESTS *****************

#[cfg(test)]
fn matrix_for(constraints: Vec<u32>, genpolys: Vec<Vec<u8>>, message: &[u32], p_true: f32, p_other: f32) -> ReliabilityMatrix {
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(constraints,genpolys).expect("bad code");
    let mut relmat = ReliabilityMatrix::new(enc.n(),message.len());
    let mut column = vec![0.0f32;1 << enc.n()];
    for &symbol in message {
        let out = enc.encode(symbol,true);
        column.fill(p_other);
        column[out as usize] = p_true;
        relmat.enter_column_auto(&column);
    }
    relmat.normalize().expect("normalize failed");
    relmat
}

#[test]
fn decodes_hanchen1() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder: StackDecoder<u8> = StackDecoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    let decoded = decoder.decode(&relmat).expect("matrix rejected");
    assert_eq!(decoded,Some(message));
    assert!((decoder.score()-7.0*0.7f32.log2()).abs() < 1e-3);
    assert_eq!(decoder.score(),decoder.stack_score());
    assert_eq!(decoder.max_depth(),6);
}

#[test]
fn decodes_hanchen2() {
    let message = vec![3u32,2,0,0];
    let relmat = matrix_for(vec![3,3],vec![vec![1,0,2],vec![0,1,6]],&message,0.3,0.1);
    let mut decoder: StackDecoder<u8> =
        StackDecoder::new(vec![3,3],vec![vec![1,0,2],vec![0,1,6]]).expect("bad code");
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),Some(message));
}

#[test]
fn agrees_with_fano_on_clean_input() {
    use crate::fano::FanoDecoder;
    for message in [vec![1u32,1,1,0,1,0,0],vec![0u32,1,0,1,1,0,0],vec![1u32,0,0,1,0,0,0]] {
        let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,1.0,0.0);
        let mut stack: StackDecoder<u8> = StackDecoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
        let mut fano: FanoDecoder<u8> =
            FanoDecoder::new(vec![3],vec![vec![7,5]],0.0,1.0,0,0.0).expect("bad code");
        let from_stack = stack.decode(&relmat).expect("matrix rejected");
        let from_fano = fano.decode(&relmat).expect("matrix rejected");
        assert_eq!(from_stack,Some(message.clone()));
        assert_eq!(from_stack,from_fano);
    }
}

#[test]
fn giveup_threshold_stops_the_search() {
    // the true path sinks below the give-up threshold before terminal depth
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder: StackDecoder<u8> = StackDecoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    decoder.set_giveup_threshold(-1.0);
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),None);
}

#[test]
fn node_limit_aborts() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder: StackDecoder<u8> = StackDecoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    decoder.set_node_limit(2);
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),None);
    assert!(decoder.nb_nodes() > 2);
}

#[test]
fn edge_bias_shifts_the_score() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,1.0,0.0);
    let mut decoder: StackDecoder<u8> = StackDecoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    decoder.set_edge_bias(0.5);
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),Some(message));
    assert!((decoder.score()+7.0*0.5).abs() < 1e-5);
}

#[test]
fn stats_report_the_outcome() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder: StackDecoder<u8> = StackDecoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    let success = decoder.decode(&relmat).expect("matrix rejected").is_some();
    let mut buf: Vec<u8> = Vec::new();
    decoder.print_stats(&mut buf,success).expect("write failed");
    let stats = String::from_utf8(buf).expect("not utf8");
    assert!(stats.starts_with("score = "));
    assert!(stats.contains("_RES 1,"));
}
