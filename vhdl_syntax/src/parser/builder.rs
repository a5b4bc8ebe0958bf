// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use crate::syntax::child::Child;
use crate::syntax::green::{GreenNode, GreenNodeData};
use crate::syntax::node_kind::NodeKind;
use crate::tokens::Token;

/// Position in the children of the current node, used to wrap
/// already parsed children into a new node after the fact.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Checkpoint(usize);

/// Internal builder used to create nodes when parsing.
///
/// The stack holds the absolute start offset of each open node.
pub(crate) struct NodeBuilder {
    stack: Vec<(usize, GreenNodeData)>,
    text_len: usize,
}

impl NodeBuilder {
    pub fn new() -> NodeBuilder {
        NodeBuilder {
            stack: Vec::new(),
            text_len: 0,
        }
    }

    pub fn push(&mut self, token: Token) {
        let len = token.byte_len();
        let text_len = self.text_len;
        if let Some((start, node)) = self.stack.last_mut() {
            node.push_token(text_len - *start, token);
        }
        self.text_len += len;
    }

    pub fn start_node(&mut self, kind: NodeKind) {
        self.stack.push((self.text_len, GreenNodeData::new(kind)));
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(
            self.stack
                .last()
                .map(|(_, node)| node.child_count())
                .unwrap_or(0),
        )
    }

    /// Starts a node that contains all children pushed since the checkpoint.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        let text_len = self.text_len;
        let Some((parent_start, parent)) = self.stack.last_mut() else {
            return self.start_node(kind);
        };
        let (start, children) = match parent.split_off(checkpoint.0) {
            Some((rel_start, children)) => (*parent_start + rel_start, children),
            None => (text_len, Vec::new()),
        };
        self.stack
            .push((start, GreenNodeData::with_children(kind, children)));
    }

    pub fn end_node(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some((start, node)) = self.stack.pop() {
            if let Some((parent_start, parent)) = self.stack.last_mut() {
                parent.push_node(start - *parent_start, node);
            }
        }
    }

    /// Closes all open nodes and returns the root.
    pub fn end(mut self) -> GreenNode {
        while self.stack.len() > 1 {
            self.end_node();
        }
        let root = match self.stack.pop() {
            Some((_, root)) => root,
            None => GreenNodeData::new(NodeKind::DesignFile),
        };
        GreenNode::new(root)
    }

    /// Like [NodeBuilder::end], but unwraps the implicit fragment node
    /// when a single node was parsed into it.
    pub fn end_fragment(self) -> GreenNode {
        let root = self.end();
        let single = {
            let mut children = root.children();
            match (children.next(), children.next()) {
                (Some(Child::Node((_, node))), None) => Some(node.clone()),
                _ => None,
            }
        };
        single.unwrap_or(root)
    }

    /// Length of the text consumed so far
    pub fn text_len(&self) -> usize {
        self.text_len
    }
}
