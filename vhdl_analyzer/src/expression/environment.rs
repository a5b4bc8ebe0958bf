// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use super::Value;
use crate::analysis::DeclRef;
use crate::config::AnalysisConfig;
use crate::data::Source;
use crate::resolve::Registry;
use crate::types::TypeRef;
use fnv::FnvHashMap;
use parking_lot::Mutex;
use std::sync::Arc;

type DeclKeyed<T> = Mutex<FnvHashMap<(Source, Arc<str>), T>>;

/// State shared by all evaluations of one deep analysis run
pub struct Environment {
    registry: Arc<Registry>,
    config: AnalysisConfig,
    types: DeclKeyed<TypeRef>,
    constants: DeclKeyed<Option<Value>>,
}

impl Environment {
    pub fn new(registry: Arc<Registry>, config: AnalysisConfig) -> Environment {
        Environment {
            registry,
            config,
            types: Mutex::default(),
            constants: Mutex::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn standard(&self) -> Option<DeclRef> {
        self.registry.resolve_package("std", "standard")
    }

    pub(crate) fn cached_type(&self, decl: &DeclRef) -> Option<TypeRef> {
        self.types.lock().get(&decl.key()).cloned()
    }

    /// The first type cached for a declaration wins
    pub(crate) fn cache_type(&self, decl: &DeclRef, typ: TypeRef) -> TypeRef {
        self.types.lock().entry(decl.key()).or_insert(typ).clone()
    }

    pub(crate) fn cached_constant(&self, decl: &DeclRef) -> Option<Option<Value>> {
        self.constants.lock().get(&decl.key()).cloned()
    }

    pub(crate) fn cache_constant(&self, decl: &DeclRef, value: Option<Value>) {
        self.constants.lock().insert(decl.key(), value);
    }
}
