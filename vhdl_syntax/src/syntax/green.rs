//! Private API for the underlying Green Tree
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
use crate::syntax::child::Child;
use crate::syntax::node_kind::NodeKind;
use crate::tokens::{Token, TokenKind, Trivia};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct GreenToken(Arc<Token>);

impl GreenToken {
    pub(crate) fn new(token: Token) -> GreenToken {
        GreenToken(Arc::new(token))
    }

    pub fn kind(&self) -> TokenKind {
        self.0.kind()
    }

    pub fn leading_trivia(&self) -> &Trivia {
        self.0.leading_trivia()
    }

    pub fn text(&self) -> &str {
        self.0.text()
    }

    pub fn byte_len(&self) -> usize {
        self.0.byte_len()
    }
}

impl Display for GreenToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Children are stored together with their offset relative to the start of the parent.
pub(crate) type GreenChild = Child<(usize, GreenNode), (usize, GreenToken)>;

impl GreenChild {
    pub fn rel_offset(&self) -> usize {
        match self {
            Child::Node((offset, _)) | Child::Token((offset, _)) => *offset,
        }
    }

    fn with_rel_offset(self, offset: usize) -> GreenChild {
        match self {
            Child::Node((_, node)) => Child::Node((offset, node)),
            Child::Token((_, token)) => Child::Token((offset, token)),
        }
    }

    pub fn byte_len(&self) -> usize {
        match self {
            Child::Token((_, token)) => token.byte_len(),
            Child::Node((_, node)) => node.byte_len(),
        }
    }
}

#[derive(Debug, Eq, PartialEq, Clone)]
pub(crate) struct GreenNodeData {
    kind: NodeKind,
    children: Vec<GreenChild>,
    byte_len: usize,
}

impl GreenNodeData {
    pub(crate) fn new(kind: NodeKind) -> GreenNodeData {
        GreenNodeData {
            kind,
            children: Vec::new(),
            byte_len: 0,
        }
    }

    fn push_child(&mut self, child: GreenChild) {
        self.byte_len = self.byte_len.max(child.rel_offset() + child.byte_len());
        self.children.push(child)
    }

    pub(crate) fn push_token(&mut self, offset: usize, token: Token) {
        self.push_child(Child::Token((offset, GreenToken::new(token))))
    }

    pub(crate) fn push_node(&mut self, offset: usize, node: GreenNodeData) {
        self.push_child(Child::Node((offset, GreenNode::new(node))))
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Removes the children from `index` on and returns them with offsets
    /// relative to the first removed child, together with that child's offset.
    pub(crate) fn split_off(&mut self, index: usize) -> Option<(usize, Vec<GreenChild>)> {
        if index >= self.children.len() {
            return None;
        }
        let tail = self.children.split_off(index);
        let start = tail[0].rel_offset();
        self.byte_len = self
            .children
            .last()
            .map(|child| child.rel_offset() + child.byte_len())
            .unwrap_or(0);
        let rebased = tail
            .into_iter()
            .map(|child| {
                let offset = child.rel_offset() - start;
                child.with_rel_offset(offset)
            })
            .collect();
        Some((start, rebased))
    }

    pub(crate) fn with_children(kind: NodeKind, children: Vec<GreenChild>) -> GreenNodeData {
        let mut data = GreenNodeData::new(kind);
        for child in children {
            data.push_child(child);
        }
        data
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct GreenNode(Arc<GreenNodeData>);

impl GreenNode {
    pub(crate) fn new(data: GreenNodeData) -> GreenNode {
        GreenNode(Arc::new(data))
    }

    pub fn children(&self) -> impl Iterator<Item = &GreenChild> {
        self.0.children.iter()
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn byte_len(&self) -> usize {
        self.0.byte_len
    }

    #[cfg(test)]
    pub fn test_text(&self, indent: usize) -> String {
        let mut text = format!("{:indent$}{:?}\n", "", self.kind());
        for child in self.children() {
            match child {
                Child::Node((_, node)) => text.push_str(&node.test_text(indent + 2)),
                Child::Token((_, token)) => {
                    text.push_str(&format!("{:width$}{:?}", "", token.kind(), width = indent + 2));
                    if matches!(
                        token.kind(),
                        TokenKind::Identifier
                            | TokenKind::AbstractLiteral
                            | TokenKind::CharacterLiteral
                            | TokenKind::StringLiteral
                            | TokenKind::BitStringLiteral
                    ) {
                        text.push_str(&format!(" '{}'", token.text()));
                    }
                    text.push('\n');
                }
            }
        }
        text
    }
}

impl Display for GreenNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for child in self.children() {
            match child {
                Child::Node((_, node)) => write!(f, "{node}")?,
                Child::Token((_, token)) => write!(f, "{token}")?,
            }
        }
        Ok(())
    }
}
