// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::kind::{DeclId, Declaration};
use std::iter;

/// Owns all declarations of one document, the file declaration is always first
#[derive(Clone, Debug, Default)]
pub struct DeclArena {
    decls: Vec<Declaration>,
}

impl DeclArena {
    pub fn root(&self) -> DeclId {
        DeclId(0)
    }

    pub(crate) fn alloc(&mut self, make: impl FnOnce(DeclId) -> Declaration) -> DeclId {
        let id = DeclId(self.decls.len());
        self.decls.push(make(id));
        id
    }

    pub fn get(&self, id: DeclId) -> &Declaration {
        &self.decls[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: DeclId) -> &mut Declaration {
        &mut self.decls[id.0]
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter()
    }

    /// The declaration itself followed by its enclosing declarations
    pub fn ancestors(&self, id: DeclId) -> impl Iterator<Item = &Declaration> + '_ {
        iter::successors(Some(self.get(id)), |decl| decl.parent.map(|parent| self.get(parent)))
    }

    /// The design unit containing a declaration
    pub fn design_unit(&self, id: DeclId) -> Option<&Declaration> {
        self.ancestors(id)
            .find(|decl| decl.parent == Some(self.root()))
    }
}
