//! Fano sequential decoder.
//!
//! Threshold-driven traversal of the code tree after Han & Chen,
//! *Sequential Decoding of Convolutional Codes* (the algorithm on p.26).
//! The traversed-back indicator lives on each node's incoming edge and is
//! only meaningful at the current threshold: loosening the threshold
//! reopens the marked branches below the loosening node, which is what
//! lets the search revisit rejected paths the way the textbook algorithm
//! does with its next-best successor rule.  The tree can optionally be
//! cached up to a maximum number of resident nodes; past that the tree is
//! purged down to the current spine before new nodes are allocated.

use num_traits::{PrimInt,Unsigned};
use std::io::{self,Write};
use crate::encoder::ConvEncoder;
use crate::relmat::ReliabilityMatrix;
use crate::seq::SeqCore;
use crate::tools::graphviz;
use crate::tools::tree::{Node,Tree};
use crate::Error;

pub struct FanoDecoder<R: PrimInt + Unsigned = u64> {
    core: SeqCore<R>,
    tree: Tree<R>,
    root: usize,
    /// threshold the search starts from, lowered by unlooping
    init_threshold: f32,
    cur_threshold: f32,
    /// latest threshold seen at the root, used for loop detection
    root_threshold: f32,
    /// threshold step for tightening and loosening
    delta_threshold: f32,
    solution_found: bool,
    /// nodes currently resident in the tree
    effective_node_count: u32,
    /// iterations of the main loop
    nb_moves: u32,
    /// maximum resident nodes, 0 disables the cache
    tree_cache_size: u32,
    /// restart with a lower initial threshold on a detected loop
    unloop: bool,
    delta_init_threshold: f32
}

impl <R: PrimInt + Unsigned> FanoDecoder<R> {
    /// Create a Fano decoder for the given code.
    /// A negative `delta_init_threshold` enables unlooping: every detected
    /// loop lowers the initial threshold by that delta and restarts the
    /// search, for as long as the initial threshold stays above the metric
    /// limit.
    pub fn new(constraints: Vec<u32>,
            genpolys: Vec<Vec<R>>,
            init_threshold: f32,
            delta_threshold: f32,
            tree_cache_size: u32,
            delta_init_threshold: f32) -> Result<Self,Error> {
        let encoder = ConvEncoder::new(constraints,genpolys)?;
        Ok(Self {
            core: SeqCore::new(encoder),
            tree: Tree::new(),
            root: 0,
            init_threshold,
            cur_threshold: init_threshold,
            root_threshold: init_threshold,
            delta_threshold,
            solution_found: false,
            effective_node_count: 0,
            nb_moves: 0,
            tree_cache_size,
            unloop: delta_init_threshold < 0.0,
            delta_init_threshold
        })
    }

    /// Stop and fail when more than this many nodes have been created.
    pub fn set_node_limit(&mut self, node_limit: u32) {
        self.core.node_limit = Some(node_limit);
    }
    /// Let the search run regardless of the number of nodes created.
    pub fn clear_node_limit(&mut self) {
        self.core.node_limit = None;
    }
    /// Stop and fail when the threshold falls below this metric.
    pub fn set_metric_limit(&mut self, metric_limit: f32) {
        self.core.metric_limit = Some(metric_limit);
    }
    /// Let the threshold loosen without bound.
    pub fn clear_metric_limit(&mut self) {
        self.core.metric_limit = None;
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
    /// Maximum number of resident nodes, 0 to disable the tree cache.
    pub fn set_tree_cache_size(&mut self, tree_cache_size: u32) {
        self.tree_cache_size = tree_cache_size;
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
    /// Main-loop iterations of the last decode
    pub fn nb_moves(&self) -> u32 {
        self.nb_moves
    }
    pub fn current_threshold(&self) -> f32 {
        self.cur_threshold
    }
    /// True when the last decode reached an eligible terminal node.
    pub fn solution_found(&self) -> bool {
        self.solution_found
    }

    /// Reset to a freshly-constructed state: statistics, thresholds,
    /// encoder registers and the tree.
    pub fn reset(&mut self) {
        self.tree.clear();
        self.core.reset();
        self.cur_threshold = self.init_threshold;
        self.root_threshold = self.init_threshold;
        self.solution_found = false;
        self.effective_node_count = 0;
        self.nb_moves = 0;
    }

    /// Decode a message from the reliability matrix.
    /// Returns `Ok(Some(message))` on success and `Ok(None)` when the
    /// search aborted on a loop, the metric limit or the node limit; the
    /// statistics stay readable either way.  A matrix that does not match
    /// the code dimensions is an error.
    pub fn decode(&mut self, relmat: &ReliabilityMatrix) -> Result<Option<Vec<u32>>,Error> {
        self.core.check_relmat(relmat)?;
        self.reset();
        self.root = self.tree.insert(Node::root(0));
        self.core.node_count = 1;
        self.effective_node_count = 1;
        let mut cur = self.root;
        self.visit_node_forward(cur,relmat);

        while self.continue_process(cur,relmat) {
            if self.core.verbosity > 1 {
                log::debug!("T={} depth={} node #{} Mc={}",
                    self.cur_threshold,
                    self.tree.node(cur).depth,
                    self.tree.node(cur).id,
                    self.tree.node(cur).path_metric);
            }
            if self.tree.node(cur).depth > self.core.max_depth {
                self.core.max_depth = self.tree.node(cur).depth;
            }
            if cur == self.root {
                self.root_threshold = self.cur_threshold;
            }
            self.nb_moves += 1;

            // best successor among the children not yet traversed back
            let mut successor: Option<usize> = None;
            for &child in &self.tree.node(cur).children {
                if self.tree.node(child).traversed_back {
                    continue;
                }
                successor = Some(match successor {
                    Some(best) if !Self::outranks(self.tree.node(child),self.tree.node(best)) => best,
                    _ => child
                });
            }
            let best = match successor {
                Some(best) => best,
                None => {
                    // exhausted forward paths
                    if self.core.verbosity > 2 {
                        log::trace!("exhausted forward paths at node #{}",self.tree.node(cur).id);
                    }
                    cur = self.move_back_or_loosen(cur);
                    continue;
                }
            };
            if self.core.verbosity > 2 {
                let candidate = self.tree.node(best);
                log::trace!("best successor node #{} in={} out={} Ms={}",
                    candidate.id,candidate.in_symbol,candidate.out_symbol,candidate.path_metric);
            }

            if self.tree.node(best).path_metric >= self.cur_threshold {
                let predecessor = cur;
                cur = best;

                // termination with solution
                if self.tree.node(cur).depth == relmat.message_length() as i32 - 1 {
                    self.core.codeword_score = self.tree.node(cur).path_metric;
                    let message = self.tree.back_track(cur);
                    self.solution_found = true;
                    self.core.max_depth += 1;
                    return Ok(Some(message));
                }

                // tighten the threshold when the predecessor barely made it
                if self.tree.node(predecessor).path_metric < self.cur_threshold + self.delta_threshold {
                    let quotient = (self.tree.node(cur).path_metric - self.init_threshold) / self.delta_threshold;
                    // conversion truncates toward zero, matching the grid
                    // snapping of the published algorithm
                    let mut nb_delta = quotient as i32;
                    if nb_delta < 0 {
                        nb_delta -= 1;
                    }
                    self.cur_threshold = nb_delta as f32 * self.delta_threshold + self.init_threshold;
                    if self.core.verbosity > 2 {
                        log::trace!("tightening {} -> {}",self.tree.node(cur).path_metric,self.cur_threshold);
                    }
                }

                self.visit_node_forward(cur,relmat);
            } else {
                cur = self.move_back_or_loosen(cur);
            }
        }
        Ok(None)
    }

    /// Print the statistics line of the last decode followed by the
    /// machine-readable `_RES` summary.
    pub fn print_stats<W: Write>(&self, os: &mut W, success: bool) -> io::Result<()> {
        writeln!(os,"score = {} cur.threshold = {} nodes = {} eff.nodes = {} moves = {} max depth = {}",
            self.core.codeword_score,
            self.cur_threshold,
            self.core.node_count,
            self.effective_node_count,
            self.nb_moves,
            self.core.max_depth)?;
        writeln!(os,"_RES {},{},{},{},{},{},{}",
            if success {1} else {0},
            self.core.codeword_score,
            self.cur_threshold,
            self.core.node_count,
            self.effective_node_count,
            self.nb_moves,
            self.core.max_depth)
    }

    /// Write the decode tree of the last decode in Graphviz dot format.
    pub fn print_dot<W: Write>(&self, os: &mut W) -> io::Result<()> {
        if self.tree.len() == 0 {
            return Ok(());
        }
        graphviz::write_dot(&self.tree,self.root,os)
    }

    /// Greater by path metric, ties broken by greater id.
    fn outranks(a: &Node<R>, b: &Node<R>) -> bool {
        a.path_metric.total_cmp(&b.path_metric).then(a.id.cmp(&b.id)).is_gt()
    }

    /// Create the children of a node unless they are already cached,
    /// restoring the encoder to the node's saved state first.
    fn visit_node_forward(&mut self, node: usize, relmat: &ReliabilityMatrix) {
        let forward_depth = self.tree.node(node).depth + 1;

        // return the encoder to the appropriate state, the root starts from
        // cleared registers
        if self.tree.node(node).depth >= 0 {
            let registers = self.tree.node(node).registers.clone();
            self.core.encoder.set_registers(&registers);
        }

        let end_symbol = self.core.end_symbol(forward_depth,relmat.message_length());

        if self.tree.node(node).children.is_empty() {
            if self.tree_cache_size > 0 && self.effective_node_count >= self.tree_cache_size {
                self.purge_tree_cache(node);
            }
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
                self.core.node_count += 1;
                self.effective_node_count += 1;
            }
        }
        self.core.cur_depth = forward_depth;
    }

    /// Move back to the predecessor when its metric still meets the
    /// threshold, deleting the abandoned subtree when the cache is off and
    /// marking the incoming edge traversed back; otherwise loosen the
    /// threshold in place and reopen the branches the old threshold had
    /// rejected.
    fn move_back_or_loosen(&mut self, cur: usize) -> usize {
        if cur == self.root {
            // at the root there is no other option than loosening
            self.cur_threshold -= self.delta_threshold;
            self.reopen_descendants(cur);
            if self.core.verbosity > 2 {
                log::trace!("loosening at root -> {}",self.cur_threshold);
            }
            return cur;
        }
        let predecessor = self.tree.node(cur).parent.expect("non-root node without parent");
        if self.tree.node(predecessor).path_metric >= self.cur_threshold {
            if self.tree_cache_size == 0 {
                let removed = self.tree.prune_descendants(cur) as u32;
                self.effective_node_count -= removed;
            }
            self.tree.node_mut(cur).traversed_back = true;
            predecessor
        } else {
            self.cur_threshold -= self.delta_threshold;
            self.reopen_descendants(cur);
            if self.core.verbosity > 2 {
                log::trace!("loosening {} -> {}",self.tree.node(cur).path_metric,self.cur_threshold);
            }
            cur
        }
    }

    /// A lower threshold makes previously rejected branches eligible
    /// again: drop the traversed-back marks below this node.
    fn reopen_descendants(&mut self, node: usize) {
        let mut pending = self.tree.node(node).children.clone();
        while let Some(cur) = pending.pop() {
            self.tree.node_mut(cur).traversed_back = false;
            pending.extend(self.tree.node(cur).children.iter().copied());
        }
    }

    /// Check the termination conditions.  Returning to the root with an
    /// unchanged threshold and no root child marked traversed back means
    /// the search is looping: abort, or restart with a lower initial
    /// threshold when unlooping is enabled.
    fn continue_process(&mut self, cur: usize, relmat: &ReliabilityMatrix) -> bool {
        if cur == self.root && self.nb_moves > 0 && self.cur_threshold == self.root_threshold {
            let children_open = self.tree.node(cur).children.iter()
                .all(|&child| !self.tree.node(child).traversed_back);
            if children_open {
                let restartable = self.unloop
                    && matches!(self.core.metric_limit,Some(limit) if self.init_threshold > limit);
                if restartable {
                    self.init_threshold += self.delta_init_threshold;
                    self.core.reset();
                    self.cur_threshold = self.init_threshold;
                    self.solution_found = false;
                    // keep the root but drop everything under it
                    self.tree.prune_descendants(self.root);
                    self.core.node_count = 1;
                    self.effective_node_count = 1;
                    self.nb_moves = 0;
                    self.visit_node_forward(cur,relmat);
                    log::warn!("loop condition detected, restarting with initial threshold {}",self.init_threshold);
                    return true;
                }
                log::warn!("loop condition detected, aborting");
                return false;
            }
        }
        if matches!(self.core.metric_limit,Some(limit) if self.cur_threshold < limit) {
            log::warn!("metric limit encountered");
            return false;
        }
        if matches!(self.core.node_limit,Some(limit) if self.core.node_count > limit) {
            log::warn!("node limit exhausted");
            return false;
        }
        true
    }

    /// Reduce the tree to the root-to-node spine and the spine nodes'
    /// immediate children, then account for the surviving nodes.
    fn purge_tree_cache(&mut self, node: usize) {
        let mut node_terminal = true;
        let mut remaining_nodes = 0u32;
        let mut cur = node;
        while cur != self.root {
            let predecessor = self.tree.node(cur).parent.expect("non-root node without parent");
            let siblings = self.tree.node(predecessor).children.clone();
            for sibling in siblings {
                if node_terminal || sibling != cur {
                    self.tree.prune_descendants(sibling);
                }
                remaining_nodes += 1;
            }
            cur = predecessor;
            node_terminal = false;
        }
        remaining_nodes += 1; // the root itself
        self.effective_node_count = remaining_nodes;
        if self.core.verbosity > 1 {
            log::debug!("purged tree cache, {} nodes remain",remaining_nodes);
        }
    }
}

// *************** TESTS *****************

#[cfg(test)]
fn hanchen1_decoder() -> FanoDecoder<u8> {
    FanoDecoder::new(vec![3],vec![vec![7,5]],0.0,1.0,0,0.0).expect("bad code")
}

/// Reliability matrix built around the codeword of `message`, with p_true
/// on the true output symbol of each column and p_other elsewhere.
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
    // scenario from Han & Chen: (2,1,2) code, 0.7 on the true symbol
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    let decoded = decoder.decode(&relmat).expect("matrix rejected");
    assert_eq!(decoded,Some(message));
    let expected_score = 7.0 * 0.7f32.log2();
    assert!((decoder.score()-expected_score).abs() < 1e-3);
    assert!(decoder.solution_found());
    assert_eq!(decoder.current_depth(),6);
    assert!(decoder.nb_moves() > 0);
}

#[test]
fn decodes_hanchen2() {
    // (3,2,2) systematic code, 0.3 on the true symbol
    let message = vec![3u32,2,0,0];
    let relmat = matrix_for(vec![3,3],vec![vec![1,0,2],vec![0,1,6]],&message,0.3,0.1);
    let mut decoder: FanoDecoder<u8> =
        FanoDecoder::new(vec![3,3],vec![vec![1,0,2],vec![0,1,6]],0.0,1.0,0,0.0).expect("bad code");
    let decoded = decoder.decode(&relmat).expect("matrix rejected");
    assert_eq!(decoded,Some(message));
}

#[test]
fn noise_free_score_is_bias_only() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,1.0,0.0);
    let mut decoder = hanchen1_decoder();
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),Some(message.clone()));
    assert_eq!(decoder.score(),0.0);

    let mut biased = hanchen1_decoder();
    biased.set_edge_bias(0.25);
    assert_eq!(biased.decode(&relmat).expect("matrix rejected"),Some(message));
    assert!((biased.score()+7.0*0.25).abs() < 1e-5);
}

#[test]
fn decode_is_idempotent() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    let first = decoder.decode(&relmat).expect("matrix rejected");
    let first_score = decoder.score();
    let second = decoder.decode(&relmat).expect("matrix rejected");
    assert_eq!(first,second);
    assert_eq!(first_score,decoder.score());
}

#[test]
fn reset_restores_fresh_statistics() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    decoder.decode(&relmat).expect("matrix rejected");
    assert!(decoder.nb_nodes() > 0);
    decoder.reset();
    let fresh = hanchen1_decoder();
    assert_eq!(decoder.nb_nodes(),fresh.nb_nodes());
    assert_eq!(decoder.score(),fresh.score());
    assert_eq!(decoder.current_depth(),fresh.current_depth());
    assert_eq!(decoder.max_depth(),fresh.max_depth());
    assert_eq!(decoder.nb_moves(),fresh.nb_moves());
    assert_eq!(decoder.current_threshold(),fresh.current_threshold());
}

#[test]
fn threshold_stays_on_grid() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    decoder.decode(&relmat).expect("matrix rejected");
    let t = decoder.current_threshold();
    assert!((t-t.round()).abs() < 1e-4,"threshold {} left the unit grid",t);
}

#[test]
fn tree_cache_does_not_change_the_answer() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    for cache_size in [4u32,6,32] {
        let mut decoder: FanoDecoder<u8> =
            FanoDecoder::new(vec![3],vec![vec![7,5]],0.0,1.0,cache_size,0.0).expect("bad code");
        let decoded = decoder.decode(&relmat).expect("matrix rejected");
        assert_eq!(decoded,Some(message.clone()),"cache size {}",cache_size);
    }
}

#[test]
fn flipped_column_lowers_the_score() {
    // disturb one position: the probabilities of the true symbol and one
    // other symbol are swapped
    let message = vec![1u32,1,1,0,1,0,0];
    let mut relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    // true output at position 3 is symbol 2
    let mut column = [0.1f32;4];
    column[1] = 0.7;
    relmat.enter_column(3,&column);
    let mut decoder = hanchen1_decoder();
    decoder.set_metric_limit(-20.0);
    match decoder.decode(&relmat).expect("matrix rejected") {
        Some(decoded) => {
            assert_eq!(decoded,message);
            assert!(decoder.score() < 7.0*0.7f32.log2() - 1.0);
        },
        None => {} // a metric-limit or loop abort is also acceptable
    }
}

#[test]
fn node_limit_aborts() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    decoder.set_node_limit(2);
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),None);
    assert!(decoder.nb_nodes() > 2);
}

#[test]
fn unreachable_threshold_aborts() {
    // initial threshold far above anything achievable and a metric limit
    // above the codeword score: the search cannot terminate
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder: FanoDecoder<u8> =
        FanoDecoder::new(vec![3],vec![vec![7,5]],100.0,1.0,0,0.0).expect("bad code");
    decoder.set_metric_limit(-1.0);
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),None);
    assert!(decoder.nb_moves() > 0);
}

#[test]
fn unlooping_cannot_pass_the_metric_limit() {
    // even with unlooping enabled the metric limit sits above the codeword
    // score, so the search terminates at the limit
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder: FanoDecoder<u8> =
        FanoDecoder::new(vec![3],vec![vec![7,5]],2.0,1.0,0,-2.0).expect("bad code");
    decoder.set_metric_limit(-1.0);
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),None);
}

#[test]
fn completes_without_loop_abort() {
    // the canonical configuration: initial threshold 0, unit delta, no
    // cache, no unlooping, full alphabet everywhere
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    decoder.set_tail_zeros(false);
    let decoded = decoder.decode(&relmat).expect("matrix rejected");
    assert_eq!(decoded,Some(message));
    assert!(decoder.nb_moves() > 0);
}

/// Three uniform columns give every path the same metric, so the search
/// has to loosen its way down and resolve every choice by tie-break.
#[cfg(test)]
fn uniform_matrix() -> ReliabilityMatrix {
    let mut relmat = ReliabilityMatrix::new(2,3);
    for _ in 0..3 {
        relmat.enter_column_auto(&[0.25,0.25,0.25,0.25]);
    }
    relmat.normalize().expect("normalize failed");
    relmat
}

#[test]
fn flat_reliabilities_resolve_by_id_tie_break() {
    let mut decoder: FanoDecoder<u8> =
        FanoDecoder::new(vec![3],vec![vec![7,5]],0.0,1.0,0,0.0).expect("bad code");
    decoder.set_tail_zeros(false);
    let decoded = decoder.decode(&uniform_matrix()).expect("matrix rejected");
    // ties are broken by greater id, which is the greater input symbol
    assert_eq!(decoded,Some(vec![1,1,1]));
    assert!((decoder.score()-3.0*0.25f32.log2()).abs() < 1e-4);
}

#[test]
fn unloop_configuration_decodes_the_same() {
    let mut decoder: FanoDecoder<u8> =
        FanoDecoder::new(vec![3],vec![vec![7,5]],0.0,1.0,0,-2.0).expect("bad code");
    decoder.set_tail_zeros(false);
    decoder.set_metric_limit(-10.0);
    let decoded = decoder.decode(&uniform_matrix()).expect("matrix rejected");
    assert_eq!(decoded,Some(vec![1,1,1]));
    assert!((decoder.score()-3.0*0.25f32.log2()).abs() < 1e-4);
}

#[test]
fn tail_zeros_constrains_the_tail() {
    // a message whose tail is not zero cannot be reached with tail-zeros on
    let message = vec![1u32,1,1,0,1,0,1];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,1.0,0.0);
    let mut decoder = hanchen1_decoder();
    decoder.set_metric_limit(-10.0);
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),None);
    decoder.set_tail_zeros(false);
    decoder.clear_metric_limit();
    assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),Some(message));
}

#[test]
fn random_messages_round_trip() {
    use rand::{Rng,SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xcc50f7);
    let mut decoder: FanoDecoder<u8> =
        FanoDecoder::new(vec![4],vec![vec![0b1011,0b1111]],0.0,1.0,0,0.0).expect("bad code");
    for _ in 0..20 {
        let mut message: Vec<u32> = (0..12).map(|_| rng.random_range(0..2)).collect();
        message[9] = 0;
        message[10] = 0;
        message[11] = 0;
        let relmat = matrix_for(vec![4],vec![vec![0b1011,0b1111]],&message,1.0,0.0);
        assert_eq!(decoder.decode(&relmat).expect("matrix rejected"),Some(message));
    }
}

#[test]
fn dot_export_marks_the_final_path() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    decoder.decode(&relmat).expect("matrix rejected");
    let mut buf: Vec<u8> = Vec::new();
    decoder.print_dot(&mut buf).expect("write failed");
    let dot = String::from_utf8(buf).expect("not utf8");
    assert!(dot.starts_with("digraph G {"));
    assert!(dot.contains("rankdir=LR"));
    assert!(dot.contains("style=filled fillcolor=lightblue"));
    assert!(dot.contains(" -> "));
}

#[test]
fn stats_report_the_outcome() {
    let message = vec![1u32,1,1,0,1,0,0];
    let relmat = matrix_for(vec![3],vec![vec![7,5]],&message,0.7,0.1);
    let mut decoder = hanchen1_decoder();
    let success = decoder.decode(&relmat).expect("matrix rejected").is_some();
    let mut buf: Vec<u8> = Vec::new();
    decoder.print_stats(&mut buf,success).expect("write failed");
    let stats = String::from_utf8(buf).expect("not utf8");
    assert!(stats.starts_with("score = "));
    assert!(stats.contains("_RES 1,"));
}

#[test]
fn rejects_mismatched_matrices() {
    let mut decoder = hanchen1_decoder();
    let short = ReliabilityMatrix::new(2,2);
    assert!(matches!(decoder.decode(&short),Err(Error::MatrixTooShort)));
    let wrong = ReliabilityMatrix::new(3,7);
    assert!(matches!(decoder.decode(&wrong),Err(Error::MatrixSymbolMismatch)));
}
