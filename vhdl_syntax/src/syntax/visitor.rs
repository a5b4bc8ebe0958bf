// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com

use crate::syntax::node::SyntaxNode;

pub enum WalkEvent<T> {
    Enter(T),
    Leave(T),
}

/// Iterator that visits nodes in their textual order.
///
/// Every node is reported twice, once when entering and once when leaving it.
pub struct Preorder {
    start: SyntaxNode,
    next: Option<WalkEvent<SyntaxNode>>,
    skip_subtree: bool,
}

impl Preorder {
    pub fn new(start: SyntaxNode) -> Preorder {
        Preorder {
            next: Some(WalkEvent::Enter(start.clone())),
            start,
            skip_subtree: false,
        }
    }

    /// Do not descend into the node that was entered last.
    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true
    }

    fn successor(&self, event: &WalkEvent<SyntaxNode>) -> Option<WalkEvent<SyntaxNode>> {
        match event {
            WalkEvent::Enter(node) => Some(match node.first_child() {
                Some(child) => WalkEvent::Enter(child),
                None => WalkEvent::Leave(node.clone()),
            }),
            WalkEvent::Leave(node) => {
                if node == &self.start {
                    return None;
                }
                Some(match node.next_sibling() {
                    Some(sibling) => WalkEvent::Enter(sibling),
                    None => WalkEvent::Leave(node.parent()?),
                })
            }
        }
    }
}

impl Iterator for Preorder {
    type Item = WalkEvent<SyntaxNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if std::mem::take(&mut self.skip_subtree) {
            self.next = match self.next.take() {
                // The pending event is the first child of the skipped node
                Some(WalkEvent::Enter(child)) => child.parent().map(WalkEvent::Leave),
                other => other,
            };
        }
        let current = self.next.take()?;
        self.next = self.successor(&current);
        Some(current)
    }
}
