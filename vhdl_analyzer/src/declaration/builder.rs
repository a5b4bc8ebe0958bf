// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Builds the declaration tree of a document in a single visit of its syntax tree

use super::arena::DeclArena;
use super::kind::*;
use super::lower::{is_token, node_after, Lowering};
use crate::data::*;
use crate::expression::ast::*;
use crate::statement::*;
use fnv::FnvHashMap;
use std::ops;
use std::sync::Arc;
use vhdl_syntax::{Keyword as Kw, NodeKind, SyntaxElement, SyntaxNode, SyntaxToken, TokenKind};

/// A `use` clause or context reference, `use ieee.std_logic_1164.all`
#[derive(Clone, Debug)]
pub struct UseItem {
    /// The normalized names of the selected name, library first
    pub segments: Vec<WithPos<String>>,
    pub all: bool,
    /// `context lib.ctx;`
    pub is_context: bool,
    pub pos: SrcPos,
}

impl UseItem {
    pub fn library(&self) -> Option<&WithPos<String>> {
        self.segments.first()
    }

    pub fn unit(&self) -> Option<&WithPos<String>> {
        self.segments.get(1)
    }

    pub fn item(&self) -> Option<&WithPos<String>> {
        self.segments.get(2)
    }
}

/// Links that can only be resolved once the whole library is known
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToResolve {
    /// Architecture to entity and package body to package
    Twin(DeclId),
    /// Subprogram body to its declaration
    SubprogramBody(DeclId),
    UseClause { scope: DeclId, index: usize },
}

#[derive(Debug, Default)]
pub struct DeclarationTable {
    pub arena: DeclArena,
    pub by_path: FnvHashMap<Arc<str>, DeclId>,
    /// Declarations by the offset of their name, or of their node when anonymous
    pub by_offset: FnvHashMap<usize, DeclId>,
    /// The declarations of a region by normalized designator, all decorations included
    pub children_by_name: FnvHashMap<(DeclId, String), Vec<DeclId>>,
    pub use_clauses: FnvHashMap<DeclId, Vec<UseItem>>,
    pub to_resolve: Vec<ToResolve>,
    /// The statements of every region that has statements
    pub bodies: FnvHashMap<DeclId, Vec<Stmt>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DeclarationTable {
    /// `(library, package)` pairs named by use clauses, `work` is not substituted
    pub fn used_packages(&self) -> Vec<(String, String)> {
        let mut used: Vec<(String, String)> = self
            .use_clauses
            .values()
            .flatten()
            .filter_map(|item| Some((item.library()?.item.clone(), item.unit()?.item.clone())))
            .collect();
        used.sort();
        used.dedup();
        used
    }
}

pub fn build_declarations(
    source: &Source,
    contents: &Contents,
    root: &SyntaxNode,
    symbols: &SymbolTable,
) -> DeclarationTable {
    let mut builder = DeclarationBuilder {
        lower: Lowering {
            source,
            contents,
            symbols,
        },
        table: DeclarationTable::default(),
    };
    builder.design_file(root);
    builder.table
}

#[derive(Clone, Copy)]
enum InterfaceKind {
    Generic,
    Port,
    Parameter { is_function: bool },
}

type Label = Option<(WithPos<Designator>, SyntaxToken)>;

struct DeclarationBuilder<'a> {
    lower: Lowering<'a>,
    table: DeclarationTable,
}

fn identifier_tokens(node: &SyntaxNode) -> Vec<SyntaxToken> {
    node.tokens()
        .filter(|token| token.kind() == TokenKind::Identifier)
        .collect()
}

fn may_be_duplicate(kind: &DeclKind) -> bool {
    !kind.is_overloadable()
        && !matches!(
            kind,
            DeclKind::Library(..)
                | DeclKind::Architecture { .. }
                | DeclKind::PackageBody
                | DeclKind::Generate
                | DeclKind::Type(TypeDef::Incomplete)
        )
}

/// The first child of a statement that is not its label
fn statement_child(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.children()
        .find(|child| child.kind() != NodeKind::Label)
}

impl DeclarationBuilder<'_> {
    fn decorated_name(&self, parent: DeclId, designator: &Designator, kind: &DeclKind) -> Arc<str> {
        let base = designator.normalized();
        let name = match kind {
            DeclKind::Subprogram(subprogram) if !subprogram.is_body => {
                format!("{base}@declaration")
            }
            DeclKind::PackageBody => format!("{base}@body"),
            _ => base,
        };
        let parent_path = &self.table.arena.get(parent).tree_path;
        let is_free = |name: &str| {
            let path = if parent_path.is_empty() {
                name.to_owned()
            } else {
                format!("{parent_path}.{name}")
            };
            !self.table.by_path.contains_key(path.as_str())
        };
        if *designator != Designator::Anonymous && is_free(&name) {
            return Arc::from(name);
        }
        let mut ordinal = 1;
        loop {
            let candidate = format!("{name}@{ordinal}");
            if is_free(&candidate) {
                return Arc::from(candidate);
            }
            ordinal += 1;
        }
    }

    fn check_duplicate(
        &mut self,
        parent: DeclId,
        designator: &Designator,
        kind: &DeclKind,
        pos: &SrcPos,
    ) {
        if !may_be_duplicate(kind) || *designator == Designator::Anonymous {
            return;
        }
        let key = (parent, designator.normalized());
        let previous = self.table.children_by_name.get(&key).and_then(|ids| {
            ids.iter()
                .map(|id| self.table.arena.get(*id))
                .find(|decl| may_be_duplicate(&decl.kind))
        });
        if let Some(previous) = previous {
            let diagnostic = Diagnostic::error(
                pos,
                format!("Duplicate declaration of '{designator}'"),
                ErrorCode::DuplicateDeclaration,
            )
            .related(previous.decl_pos(), "Previously defined here");
            self.table.diagnostics.push(diagnostic);
        }
    }

    fn add(
        &mut self,
        parent: Option<DeclId>,
        designator: Designator,
        kind: DeclKind,
        span: ops::Range<usize>,
        name: Option<&SyntaxToken>,
    ) -> DeclId {
        let name_span = name.map(|token| self.lower.token_pos(token));
        let pos = self.lower.pos(span.clone());
        let (decorated, tree_path) = match parent {
            Some(parent) => {
                self.check_duplicate(
                    parent,
                    &designator,
                    &kind,
                    name_span.as_ref().unwrap_or(&pos),
                );
                let decorated = self.decorated_name(parent, &designator, &kind);
                let parent_path = &self.table.arena.get(parent).tree_path;
                let tree_path: Arc<str> = if parent_path.is_empty() {
                    decorated.clone()
                } else {
                    Arc::from(format!("{parent_path}.{decorated}"))
                };
                (decorated, tree_path)
            }
            None => (Arc::from(""), Arc::from("")),
        };
        let offset = name
            .map(|token| token.text_range().start)
            .unwrap_or(span.start);
        let normalized = designator.normalized();
        let id = self.table.arena.alloc(|id| Declaration {
            id,
            name: decorated,
            designator,
            tree_path: tree_path.clone(),
            kind,
            span: pos,
            name_span,
            byte_span: span,
            parent,
            children: Vec::new(),
        });
        self.table.by_path.insert(tree_path, id);
        self.table.by_offset.entry(offset).or_insert(id);
        if let Some(parent) = parent {
            self.table.arena.get_mut(parent).children.push(id);
            if !normalized.is_empty() {
                self.table
                    .children_by_name
                    .entry((parent, normalized))
                    .or_default()
                    .push(id);
            }
        }
        id
    }

    fn add_named(
        &mut self,
        parent: DeclId,
        node: &SyntaxNode,
        name: Option<&SyntaxToken>,
        kind: DeclKind,
    ) -> DeclId {
        let designator = name
            .map(|token| self.lower.designator(token))
            .unwrap_or(Designator::Anonymous);
        self.add(Some(parent), designator, kind, node.text_range(), name)
    }

    fn add_labeled(
        &mut self,
        parent: DeclId,
        label: &Label,
        kind: DeclKind,
        node: &SyntaxNode,
    ) -> DeclId {
        match label {
            Some((designator, token)) => self.add(
                Some(parent),
                designator.item.clone(),
                kind,
                node.text_range(),
                Some(token),
            ),
            None => self.add(
                Some(parent),
                Designator::Anonymous,
                kind,
                node.text_range(),
                None,
            ),
        }
    }

    fn set_kind(&mut self, id: DeclId, kind: DeclKind) {
        self.table.arena.get_mut(id).kind = kind;
    }

    fn design_file(&mut self, node: &SyntaxNode) {
        let root = self.add(
            None,
            Designator::Anonymous,
            DeclKind::File,
            0..node.byte_len(),
            None,
        );
        for library in ["std", "work"] {
            let symbol = self.lower.symbols.insert(library);
            self.add(
                Some(root),
                Designator::Identifier(symbol.clone()),
                DeclKind::Library(symbol),
                0..0,
                None,
            );
        }
        for unit in node.children_of_kind(NodeKind::DesignUnit) {
            self.design_unit(root, &unit);
        }
    }

    fn design_unit(&mut self, root: DeclId, unit: &SyntaxNode) {
        let context = unit.child_of_kind(NodeKind::ContextClause);
        let Some(node) = unit
            .children()
            .find(|child| child.kind() != NodeKind::ContextClause)
        else {
            return;
        };
        self.unit(root, &node, context.as_ref());
    }

    fn unit(&mut self, parent: DeclId, node: &SyntaxNode, context: Option<&SyntaxNode>) {
        let identifiers = identifier_tokens(node);
        let name = identifiers.first();
        let id = match node.kind() {
            NodeKind::EntityDeclaration => {
                let id = self.add_named(parent, node, name, DeclKind::Entity);
                self.context_items(id, context);
                self.interfaces(id, node);
                self.declarative_part(id, node);
                if let Some(statements) = node.child_of_kind(NodeKind::ConcurrentStatements) {
                    let statements = self.concurrent_statements(id, &statements);
                    self.table.bodies.insert(id, statements);
                }
                id
            }
            NodeKind::ArchitectureBody => {
                let (entity, entity_pos) = match identifiers.get(1) {
                    Some(token) => (self.lower.designator(token), self.lower.token_pos(token)),
                    None => (Designator::Anonymous, self.lower.node_pos(node)),
                };
                let id = self.add_named(
                    parent,
                    node,
                    name,
                    DeclKind::Architecture { entity, entity_pos },
                );
                self.table.to_resolve.push(ToResolve::Twin(id));
                self.context_items(id, context);
                self.declarative_part(id, node);
                let statements = match node.child_of_kind(NodeKind::ConcurrentStatements) {
                    Some(statements) => self.concurrent_statements(id, &statements),
                    None => Vec::new(),
                };
                self.table.bodies.insert(id, statements);
                id
            }
            NodeKind::PackageDeclaration => {
                let id = self.add_named(parent, node, name, DeclKind::Package);
                self.context_items(id, context);
                self.interfaces(id, node);
                self.declarative_part(id, node);
                id
            }
            NodeKind::PackageInstantiation => {
                let id = self.add_named(parent, node, name, DeclKind::Package);
                self.context_items(id, context);
                id
            }
            NodeKind::PackageBody => {
                let id = self.add_named(parent, node, name, DeclKind::PackageBody);
                self.table.to_resolve.push(ToResolve::Twin(id));
                self.context_items(id, context);
                self.declarative_part(id, node);
                id
            }
            NodeKind::ContextDeclaration => {
                let id = self.add_named(parent, node, name, DeclKind::Context);
                self.context_items(id, context);
                self.context_items(id, Some(node));
                id
            }
            _ => return,
        };
        log::trace!("Declared {}", self.table.arena.get(id).tree_path);
    }

    fn context_items(&mut self, scope: DeclId, context: Option<&SyntaxNode>) {
        let Some(context) = context else {
            return;
        };
        for item in context.children() {
            match item.kind() {
                NodeKind::LibraryClause => {
                    for token in identifier_tokens(&item) {
                        let symbol = self.lower.symbols.insert(token.text());
                        self.add(
                            Some(scope),
                            Designator::Identifier(symbol.clone()),
                            DeclKind::Library(symbol),
                            token.text_range(),
                            Some(&token),
                        );
                    }
                }
                NodeKind::UseClause => self.use_clause(scope, &item, false),
                NodeKind::ContextReference => self.use_clause(scope, &item, true),
                _ => {}
            }
        }
    }

    fn use_clause(&mut self, scope: DeclId, node: &SyntaxNode, is_context: bool) {
        for name in node.children() {
            let expr = self.lower.expr(&name);
            let mut segments = Vec::new();
            let all = flatten_name(&expr, &mut segments);
            if segments.is_empty() {
                continue;
            }
            let items = self.table.use_clauses.entry(scope).or_default();
            let index = items.len();
            items.push(UseItem {
                segments,
                all,
                is_context,
                pos: expr.pos.clone(),
            });
            self.table
                .to_resolve
                .push(ToResolve::UseClause { scope, index });
        }
    }

    fn interfaces(&mut self, scope: DeclId, node: &SyntaxNode) {
        for clause in node.children() {
            let kind = match clause.kind() {
                NodeKind::GenericClause => InterfaceKind::Generic,
                NodeKind::PortClause => InterfaceKind::Port,
                _ => continue,
            };
            if let Some(list) = clause.child_of_kind(NodeKind::InterfaceList) {
                self.interface_list(scope, &list, kind);
            }
        }
    }

    fn interface_list(
        &mut self,
        scope: DeclId,
        list: &SyntaxNode,
        kind: InterfaceKind,
    ) -> Vec<DeclId> {
        let mut ids = Vec::new();
        for item in list.children() {
            match item.kind() {
                NodeKind::InterfaceObjectDeclaration => {
                    ids.extend(self.interface_object(scope, &item, kind));
                }
                NodeKind::InterfaceTypeDeclaration => {
                    let name = item.token_of_kind(TokenKind::Identifier);
                    ids.push(self.add_named(
                        scope,
                        &item,
                        name.as_ref(),
                        DeclKind::Type(TypeDef::Incomplete),
                    ));
                }
                NodeKind::InterfaceSubprogramDeclaration => {
                    if let Some(id) = self.subprogram(scope, &item, false) {
                        ids.push(id);
                    }
                }
                NodeKind::InterfacePackageDeclaration => {
                    let name = item.token_of_kind(TokenKind::Identifier);
                    ids.push(self.add_named(scope, &item, name.as_ref(), DeclKind::Package));
                }
                _ => {}
            }
        }
        ids
    }

    fn interface_object(
        &mut self,
        scope: DeclId,
        item: &SyntaxNode,
        kind: InterfaceKind,
    ) -> Vec<DeclId> {
        let mut class = None;
        let mut mode = None;
        for token in item.tokens() {
            match token.kind() {
                TokenKind::Keyword(Kw::Signal) => class = Some(ObjectClass::Signal),
                TokenKind::Keyword(Kw::Constant) => class = Some(ObjectClass::Constant),
                TokenKind::Keyword(Kw::Variable) => class = Some(ObjectClass::Variable),
                TokenKind::Keyword(Kw::File) => class = Some(ObjectClass::File),
                TokenKind::Keyword(Kw::In) => mode = Some(Mode::In),
                TokenKind::Keyword(Kw::Out) => mode = Some(Mode::Out),
                TokenKind::Keyword(Kw::Inout) => mode = Some(Mode::Inout),
                TokenKind::Keyword(Kw::Buffer) => mode = Some(Mode::Buffer),
                TokenKind::Keyword(Kw::Linkage) => mode = Some(Mode::Linkage),
                _ => {}
            }
        }
        let mode = mode.unwrap_or(Mode::In);
        let (class, role) = match kind {
            InterfaceKind::Generic => (class.unwrap_or(ObjectClass::Constant), ObjectRole::Generic),
            InterfaceKind::Port => (ObjectClass::Signal, ObjectRole::Port(mode)),
            InterfaceKind::Parameter { is_function } => {
                let default_class = if is_function || mode == Mode::In {
                    ObjectClass::Constant
                } else {
                    ObjectClass::Variable
                };
                (class.unwrap_or(default_class), ObjectRole::Parameter(mode))
            }
        };
        let subtype = item
            .child_of_kind(NodeKind::SubtypeIndication)
            .map(|ind| self.lower.subtype_indication(&ind));
        let default = self
            .lower
            .opt_expr(node_after(item, TokenKind::ColonEq).as_ref());
        self.object_names(scope, item, |_| {
            DeclKind::Object(ObjectDecl {
                class,
                role,
                subtype: subtype.clone(),
                default: default.clone(),
                range: None,
            })
        })
    }

    /// Declares every name of the identifier list of `node`
    fn object_names(
        &mut self,
        scope: DeclId,
        node: &SyntaxNode,
        kind: impl Fn(&SyntaxToken) -> DeclKind,
    ) -> Vec<DeclId> {
        let Some(list) = node.child_of_kind(NodeKind::IdentifierList) else {
            return Vec::new();
        };
        identifier_tokens(&list)
            .iter()
            .map(|token| {
                let designator = self.lower.designator(token);
                self.add(
                    Some(scope),
                    designator,
                    kind(token),
                    node.text_range(),
                    Some(token),
                )
            })
            .collect()
    }

    fn declarative_part(&mut self, scope: DeclId, node: &SyntaxNode) {
        let Some(part) = node.child_of_kind(NodeKind::DeclarativePart) else {
            return;
        };
        for item in part.children() {
            self.declaration(scope, &item);
        }
    }

    fn declaration(&mut self, scope: DeclId, node: &SyntaxNode) {
        let name = node.token_of_kind(TokenKind::Identifier);
        match node.kind() {
            NodeKind::SignalDeclaration
            | NodeKind::ConstantDeclaration
            | NodeKind::VariableDeclaration
            | NodeKind::FileDeclaration => self.object_declaration(scope, node),
            NodeKind::TypeDeclaration => self.type_declaration(scope, node),
            NodeKind::SubtypeDeclaration => {
                if let Some(ind) = node.child_of_kind(NodeKind::SubtypeIndication) {
                    let ind = self.lower.subtype_indication(&ind);
                    self.add_named(scope, node, name.as_ref(), DeclKind::Subtype(ind));
                }
            }
            NodeKind::AliasDeclaration => {
                let designator = node.tokens().find(|token| {
                    matches!(
                        token.kind(),
                        TokenKind::Identifier
                            | TokenKind::CharacterLiteral
                            | TokenKind::StringLiteral
                    )
                });
                let subtype = node
                    .child_of_kind(NodeKind::SubtypeIndication)
                    .map(|ind| self.lower.subtype_indication(&ind));
                if let Some(target) = node_after(node, TokenKind::Keyword(Kw::Is)) {
                    let target = self.lower.expr(&target);
                    self.add_named(
                        scope,
                        node,
                        designator.as_ref(),
                        DeclKind::Alias { subtype, target },
                    );
                }
            }
            NodeKind::AttributeDeclaration => {
                if let Some(type_mark) = node_after(node, TokenKind::Colon) {
                    let type_mark = self.lower.expr(&type_mark);
                    self.add_named(
                        scope,
                        node,
                        name.as_ref(),
                        DeclKind::Attribute { type_mark },
                    );
                }
            }
            NodeKind::ComponentDeclaration => {
                let id = self.add_named(scope, node, name.as_ref(), DeclKind::Component);
                self.interfaces(id, node);
            }
            NodeKind::SubprogramDeclaration => {
                self.subprogram(scope, node, false);
            }
            NodeKind::SubprogramBody => {
                self.subprogram(scope, node, true);
            }
            NodeKind::UseClause => self.use_clause(scope, node, false),
            NodeKind::PackageDeclaration
            | NodeKind::PackageBody
            | NodeKind::PackageInstantiation => self.unit(scope, node, None),
            _ => {}
        }
    }

    fn object_declaration(&mut self, scope: DeclId, node: &SyntaxNode) {
        let class = match node.kind() {
            NodeKind::SignalDeclaration => ObjectClass::Signal,
            NodeKind::ConstantDeclaration => ObjectClass::Constant,
            NodeKind::VariableDeclaration if node.has_token(TokenKind::Keyword(Kw::Shared)) => {
                ObjectClass::SharedVariable
            }
            NodeKind::VariableDeclaration => ObjectClass::Variable,
            _ => ObjectClass::File,
        };
        let subtype = node
            .child_of_kind(NodeKind::SubtypeIndication)
            .map(|ind| self.lower.subtype_indication(&ind));
        let default = self
            .lower
            .opt_expr(node_after(node, TokenKind::ColonEq).as_ref());
        self.object_names(scope, node, |_| {
            DeclKind::Object(ObjectDecl {
                class,
                role: ObjectRole::Local,
                subtype: subtype.clone(),
                default: default.clone(),
                range: None,
            })
        });
    }

    fn type_declaration(&mut self, scope: DeclId, node: &SyntaxNode) {
        let name = node.token_of_kind(TokenKind::Identifier);
        let name = name.as_ref();
        let Some(definition) = node.first_child() else {
            self.add_named(scope, node, name, DeclKind::Type(TypeDef::Incomplete));
            return;
        };
        match definition.kind() {
            NodeKind::EnumerationTypeDefinition => {
                let id = self.add_named(
                    scope,
                    node,
                    name,
                    DeclKind::Type(TypeDef::Enumeration(Vec::new())),
                );
                let literals = definition
                    .tokens()
                    .filter(|token| {
                        matches!(
                            token.kind(),
                            TokenKind::Identifier | TokenKind::CharacterLiteral
                        )
                    })
                    .enumerate()
                    .map(|(ordinal, token)| {
                        let designator = self.lower.designator(&token);
                        self.add(
                            Some(scope),
                            designator,
                            DeclKind::EnumLiteral { ty: id, ordinal },
                            token.text_range(),
                            Some(&token),
                        )
                    })
                    .collect();
                self.set_kind(id, DeclKind::Type(TypeDef::Enumeration(literals)));
            }
            NodeKind::RangeTypeDefinition => {
                if let Some(range) = self.lower.opt_expr(definition.first_child().as_ref()) {
                    self.add_named(scope, node, name, DeclKind::Type(TypeDef::Range(range)));
                }
            }
            NodeKind::PhysicalTypeDefinition => {
                let Some(range) = self.lower.opt_expr(definition.first_child().as_ref()) else {
                    return;
                };
                let id = self.add_named(
                    scope,
                    node,
                    name,
                    DeclKind::Type(TypeDef::Physical {
                        range: range.clone(),
                        units: Vec::new(),
                    }),
                );
                let mut units = Vec::new();
                for unit in definition.children() {
                    let factor = match unit.kind() {
                        NodeKind::PrimaryUnitDeclaration => None,
                        NodeKind::SecondaryUnitDeclaration => {
                            unit.first_child().map(|factor| self.lower.expr(&factor))
                        }
                        _ => continue,
                    };
                    let unit_name = unit.token_of_kind(TokenKind::Identifier);
                    units.push(self.add_named(
                        scope,
                        &unit,
                        unit_name.as_ref(),
                        DeclKind::PhysicalUnit { ty: id, factor },
                    ));
                }
                self.set_kind(id, DeclKind::Type(TypeDef::Physical { range, units }));
            }
            NodeKind::ArrayTypeDefinition => {
                let children: Vec<SyntaxNode> = definition.children().collect();
                let Some((element, indexes)) = children.split_last() else {
                    return;
                };
                let indexes = indexes
                    .iter()
                    .map(|index| match index.kind() {
                        NodeKind::IndexSubtypeDefinition => {
                            let mark = match index.first_child() {
                                Some(mark) => self.lower.expr(&mark),
                                None => Expr::new(ExprKind::Unknown, self.lower.node_pos(index)),
                            };
                            IndexDef::Unconstrained(mark)
                        }
                        _ => IndexDef::Constrained(self.lower.expr(index)),
                    })
                    .collect();
                let element = self.lower.subtype_indication(element);
                let kind = DeclKind::Type(TypeDef::Array { indexes, element });
                self.add_named(scope, node, name, kind);
            }
            NodeKind::RecordTypeDefinition => {
                let id = self.add_named(
                    scope,
                    node,
                    name,
                    DeclKind::Type(TypeDef::Record(Vec::new())),
                );
                let mut fields = Vec::new();
                for element in definition.children_of_kind(NodeKind::ElementDeclaration) {
                    let Some(ind) = element.child_of_kind(NodeKind::SubtypeIndication) else {
                        continue;
                    };
                    let ind = self.lower.subtype_indication(&ind);
                    let names =
                        self.object_names(id, &element, |_| DeclKind::RecordField(ind.clone()));
                    fields.extend(names);
                }
                self.set_kind(id, DeclKind::Type(TypeDef::Record(fields)));
            }
            NodeKind::AccessTypeDefinition => {
                if let Some(ind) = definition.child_of_kind(NodeKind::SubtypeIndication) {
                    let ind = self.lower.subtype_indication(&ind);
                    self.add_named(scope, node, name, DeclKind::Type(TypeDef::Access(ind)));
                }
            }
            NodeKind::FileTypeDefinition => {
                if let Some(mark) = self.lower.opt_expr(definition.first_child().as_ref()) {
                    self.add_named(scope, node, name, DeclKind::Type(TypeDef::File(mark)));
                }
            }
            NodeKind::ProtectedTypeDefinition => {
                self.add_named(scope, node, name, DeclKind::Type(TypeDef::Protected));
            }
            _ => {}
        }
    }

    fn subprogram(&mut self, scope: DeclId, node: &SyntaxNode, is_body: bool) -> Option<DeclId> {
        let spec = node.children().find(|child| {
            matches!(
                child.kind(),
                NodeKind::FunctionSpecification | NodeKind::ProcedureSpecification
            )
        })?;
        let is_function = spec.kind() == NodeKind::FunctionSpecification;
        let name = spec.tokens().find(|token| {
            matches!(
                token.kind(),
                TokenKind::Identifier | TokenKind::StringLiteral
            )
        });
        let id = self.add_named(
            scope,
            node,
            name.as_ref(),
            DeclKind::Subprogram(SubprogramDecl {
                is_function,
                is_body,
                params: Vec::new(),
                return_type: None,
                signature: String::new(),
            }),
        );

        let params = match spec.child_of_kind(NodeKind::InterfaceList) {
            Some(list) => self.interface_list(id, &list, InterfaceKind::Parameter { is_function }),
            None => Vec::new(),
        };
        let return_type = if is_function {
            self.lower
                .opt_expr(node_after(&spec, TokenKind::Keyword(Kw::Return)).as_ref())
        } else {
            None
        };
        let marks: Vec<String> = params
            .iter()
            .filter_map(|param| {
                let object = self.table.arena.get(*param).kind.as_object()?;
                Some(object.subtype.as_ref()?.mark_text())
            })
            .collect();
        let mut signature = format!("[{}]", marks.join(", "));
        if let Some(return_type) = &return_type {
            let mark = return_type.mark_text();
            let mark = mark.rsplit('.').next().unwrap_or(&mark).to_owned();
            signature = format!("{signature} return {mark}");
        }
        self.set_kind(
            id,
            DeclKind::Subprogram(SubprogramDecl {
                is_function,
                is_body,
                params,
                return_type,
                signature,
            }),
        );

        if is_body {
            self.table.to_resolve.push(ToResolve::SubprogramBody(id));
            self.declarative_part(id, node);
            let statements = self.sequential_statements(id, node);
            self.table.bodies.insert(id, statements);
        }
        Some(id)
    }

    fn label(&self, node: &SyntaxNode) -> Label {
        let token = node
            .child_of_kind(NodeKind::Label)?
            .token_of_kind(TokenKind::Identifier)?;
        let designator = WithPos::new(self.lower.designator(&token), self.lower.token_pos(&token));
        Some((designator, token))
    }

    fn concurrent_statements(&mut self, scope: DeclId, node: &SyntaxNode) -> Vec<Stmt> {
        node.children()
            .filter_map(|statement| self.concurrent_statement(scope, &statement))
            .collect()
    }

    fn generate_body(&mut self, scope: DeclId, branch: &SyntaxNode) {
        let statements = match branch.child_of_kind(NodeKind::GenerateBody) {
            Some(body) => {
                self.declarative_part(scope, &body);
                match body.child_of_kind(NodeKind::ConcurrentStatements) {
                    Some(statements) => self.concurrent_statements(scope, &statements),
                    None => Vec::new(),
                }
            }
            None => Vec::new(),
        };
        self.table.bodies.insert(scope, statements);
    }

    /// Declares the parameter of a for loop or for generate
    fn for_parameter(&mut self, scope: DeclId, scheme: &SyntaxNode) -> Option<DeclId> {
        let name = scheme.token_of_kind(TokenKind::Identifier)?;
        let range = scheme.first_child().map(|range| self.lower.expr(&range));
        let designator = self.lower.designator(&name);
        Some(self.add(
            Some(scope),
            designator,
            DeclKind::Object(ObjectDecl {
                class: ObjectClass::Constant,
                role: ObjectRole::LoopParameter,
                subtype: None,
                default: None,
                range,
            }),
            scheme.text_range(),
            Some(&name),
        ))
    }

    fn first_expression(&self, node: &SyntaxNode) -> Option<Expr> {
        node.children()
            .find(|child| child.kind().is_expression())
            .map(|child| self.lower.expr(&child))
    }

    fn concurrent_statement(&mut self, scope: DeclId, node: &SyntaxNode) -> Option<Stmt> {
        let label = self.label(node);
        let kind = match node.kind() {
            NodeKind::ProcessStatement => {
                let sensitivity = match node.child_of_kind(NodeKind::SensitivityList) {
                    None => Sensitivity::None,
                    Some(list) if list.has_token(TokenKind::Keyword(Kw::All)) => Sensitivity::All,
                    Some(list) => Sensitivity::List(
                        list.children()
                            .map(|name| self.lower.expr(&name))
                            .collect(),
                    ),
                };
                let id = self.add_labeled(scope, &label, DeclKind::Process(sensitivity), node);
                self.declarative_part(id, node);
                let statements = self.sequential_statements(id, node);
                self.table.bodies.insert(id, statements);
                StmtKind::Process(id)
            }
            NodeKind::BlockStatement => {
                let id = self.add_labeled(scope, &label, DeclKind::Block, node);
                self.interfaces(id, node);
                self.declarative_part(id, node);
                let statements = match node.child_of_kind(NodeKind::ConcurrentStatements) {
                    Some(statements) => self.concurrent_statements(id, &statements),
                    None => Vec::new(),
                };
                self.table.bodies.insert(id, statements);
                StmtKind::Block(id)
            }
            NodeKind::ForGenerateStatement => {
                let id = self.add_labeled(scope, &label, DeclKind::Generate, node);
                if let Some(scheme) = node.child_of_kind(NodeKind::ForScheme) {
                    self.for_parameter(id, &scheme);
                }
                self.generate_body(id, node);
                StmtKind::ForGenerate(id)
            }
            NodeKind::IfGenerateStatement => {
                let mut branches = Vec::new();
                for branch in node.children_of_kind(NodeKind::GenerateBranch) {
                    let is_else = branch
                        .first_token()
                        .is_some_and(|token| token.kind() == TokenKind::Keyword(Kw::Else));
                    let condition = if is_else {
                        None
                    } else {
                        self.first_expression(&branch)
                    };
                    let decl = self.add_labeled(scope, &label, DeclKind::Generate, &branch);
                    self.generate_body(decl, &branch);
                    branches.push(GenerateBranch {
                        condition,
                        choices: Vec::new(),
                        decl,
                    });
                }
                StmtKind::IfGenerate(branches)
            }
            NodeKind::CaseGenerateStatement => {
                let selector = self.first_expression(node)?;
                let mut branches = Vec::new();
                for branch in node.children_of_kind(NodeKind::GenerateBranch) {
                    let choices = branch
                        .child_of_kind(NodeKind::Choices)
                        .map(|choices| self.lower.choices(&choices))
                        .unwrap_or_default();
                    let decl = self.add_labeled(scope, &label, DeclKind::Generate, &branch);
                    self.generate_body(decl, &branch);
                    branches.push(GenerateBranch {
                        condition: None,
                        choices,
                        decl,
                    });
                }
                StmtKind::CaseGenerate { selector, branches }
            }
            NodeKind::ComponentInstantiation => {
                let unit_node = node.child_of_kind(NodeKind::InstantiatedUnit)?;
                let name = self.lower.expr(&unit_node.first_child()?);
                let unit = if unit_node.has_token(TokenKind::Keyword(Kw::Entity)) {
                    InstantiatedUnit::Entity(name)
                } else if unit_node.has_token(TokenKind::Keyword(Kw::Configuration)) {
                    InstantiatedUnit::Configuration(name)
                } else {
                    InstantiatedUnit::Component(name)
                };
                let map = |kind: NodeKind| {
                    node.child_of_kind(kind)
                        .and_then(|aspect| aspect.child_of_kind(NodeKind::AssociationList))
                        .map(|list| self.lower.association_list(&list))
                        .unwrap_or_default()
                };
                let generic_map = map(NodeKind::GenericMapAspect);
                let port_map = map(NodeKind::PortMapAspect);
                if label.is_some() {
                    self.add_labeled(scope, &label, DeclKind::Instance, node);
                }
                StmtKind::Instance {
                    unit,
                    generic_map,
                    port_map,
                }
            }
            NodeKind::SignalAssignment => self.signal_assignment(node)?,
            NodeKind::SelectedSignalAssignment => self.selected_assignment(node)?,
            NodeKind::AssertStatement => self.assert_statement(node)?,
            NodeKind::ProcedureCall => {
                StmtKind::ProcedureCall(self.lower.expr(&statement_child(node)?))
            }
            _ => return None,
        };
        Some(Stmt {
            label: label.map(|(designator, _)| designator),
            kind,
            pos: self.lower.node_pos(node),
        })
    }

    fn waveform(&self, node: &SyntaxNode) -> Vec<WaveformElement> {
        node.child_of_kind(NodeKind::Waveform)
            .map(|waveform| {
                waveform
                    .children_of_kind(NodeKind::WaveformElement)
                    .filter_map(|element| {
                        let after = node_after(&element, TokenKind::Keyword(Kw::After));
                        Some(WaveformElement {
                            value: self.lower.expr(&element.first_child()?),
                            after: self.lower.opt_expr(after.as_ref()),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn signal_assignment(&self, node: &SyntaxNode) -> Option<StmtKind> {
        let target = self.lower.expr(&statement_child(node)?);
        let waveforms = node
            .children_of_kind(NodeKind::ConditionalWaveform)
            .map(|waveform| ConditionalWaveform {
                waveform: self.waveform(&waveform),
                condition: self
                    .lower
                    .opt_expr(node_after(&waveform, TokenKind::Keyword(Kw::When)).as_ref()),
            })
            .collect();
        Some(StmtKind::SignalAssignment { target, waveforms })
    }

    fn selected_assignment(&self, node: &SyntaxNode) -> Option<StmtKind> {
        let selector = self.first_expression(node)?;
        let target = self
            .lower
            .expr(&node_after(node, TokenKind::Keyword(Kw::Select))?);
        let alternatives = node
            .children_of_kind(NodeKind::SelectedWaveform)
            .map(|alternative| SelectedWaveform {
                waveform: self.waveform(&alternative),
                choices: alternative
                    .child_of_kind(NodeKind::Choices)
                    .map(|choices| self.lower.choices(&choices))
                    .unwrap_or_default(),
            })
            .collect();
        Some(StmtKind::SelectedAssignment {
            selector,
            target,
            alternatives,
        })
    }

    fn assert_statement(&self, node: &SyntaxNode) -> Option<StmtKind> {
        Some(StmtKind::Assert {
            condition: self.first_expression(node)?,
            report: self
                .lower
                .opt_expr(node_after(node, TokenKind::Keyword(Kw::Report)).as_ref()),
            severity: self
                .lower
                .opt_expr(node_after(node, TokenKind::Keyword(Kw::Severity)).as_ref()),
        })
    }

    fn sequential_statements(&mut self, scope: DeclId, parent: &SyntaxNode) -> Vec<Stmt> {
        match parent.child_of_kind(NodeKind::SequentialStatements) {
            Some(statements) => statements
                .children()
                .filter_map(|statement| self.sequential_statement(scope, &statement))
                .collect(),
            None => Vec::new(),
        }
    }

    fn loop_label(&self, node: &SyntaxNode) -> Option<WithPos<Designator>> {
        let token = node.token_of_kind(TokenKind::Identifier)?;
        Some(WithPos::new(self.lower.designator(&token), self.lower.token_pos(&token)))
    }

    fn sequential_statement(&mut self, scope: DeclId, node: &SyntaxNode) -> Option<Stmt> {
        let label = self.label(node);
        let kind = match node.kind() {
            NodeKind::IfStatement => {
                let mut branches = Vec::new();
                for branch in node.children() {
                    let condition = match branch.kind() {
                        NodeKind::ConditionalBranch => Some(self.first_expression(&branch)?),
                        NodeKind::ElseBranch => None,
                        _ => continue,
                    };
                    branches.push((condition, self.sequential_statements(scope, &branch)));
                }
                StmtKind::If(branches)
            }
            NodeKind::CaseStatement => {
                let selector = self.first_expression(node)?;
                let alternatives = node
                    .children_of_kind(NodeKind::CaseAlternative)
                    .map(|alternative| {
                        let choices = alternative
                            .child_of_kind(NodeKind::Choices)
                            .map(|choices| self.lower.choices(&choices))
                            .unwrap_or_default();
                        (choices, self.sequential_statements(scope, &alternative))
                    })
                    .collect();
                StmtKind::Case {
                    selector,
                    alternatives,
                }
            }
            NodeKind::LoopStatement => {
                let loop_scope = self.add_labeled(scope, &label, DeclKind::LoopScope, node);
                let scheme = if let Some(scheme) = node.child_of_kind(NodeKind::WhileScheme) {
                    match self.first_expression(&scheme) {
                        Some(condition) => LoopScheme::While(condition),
                        None => LoopScheme::Infinite,
                    }
                } else if let Some(scheme) = node.child_of_kind(NodeKind::ForScheme) {
                    match self.for_parameter(loop_scope, &scheme) {
                        Some(param) => LoopScheme::For(param),
                        None => LoopScheme::Infinite,
                    }
                } else {
                    LoopScheme::Infinite
                };
                let body = self.sequential_statements(loop_scope, node);
                StmtKind::Loop {
                    scope: loop_scope,
                    scheme,
                    body,
                }
            }
            NodeKind::NextStatement => StmtKind::Next {
                loop_label: self.loop_label(node),
                condition: self
                    .lower
                    .opt_expr(node_after(node, TokenKind::Keyword(Kw::When)).as_ref()),
            },
            NodeKind::ExitStatement => StmtKind::Exit {
                loop_label: self.loop_label(node),
                condition: self
                    .lower
                    .opt_expr(node_after(node, TokenKind::Keyword(Kw::When)).as_ref()),
            },
            NodeKind::ReturnStatement => StmtKind::Return(self.first_expression(node)),
            NodeKind::NullStatement => StmtKind::Null,
            NodeKind::WaitStatement => StmtKind::Wait {
                on: node
                    .child_of_kind(NodeKind::SensitivityList)
                    .map(|list| list.children().map(|name| self.lower.expr(&name)).collect())
                    .unwrap_or_default(),
                until: self
                    .lower
                    .opt_expr(node_after(node, TokenKind::Keyword(Kw::Until)).as_ref()),
                timeout: self
                    .lower
                    .opt_expr(node_after(node, TokenKind::Keyword(Kw::For)).as_ref()),
            },
            NodeKind::AssertStatement => self.assert_statement(node)?,
            NodeKind::ReportStatement => StmtKind::Report {
                report: self.first_expression(node)?,
                severity: self
                    .lower
                    .opt_expr(node_after(node, TokenKind::Keyword(Kw::Severity)).as_ref()),
            },
            NodeKind::VariableAssignment => self.variable_assignment(node)?,
            NodeKind::SignalAssignment => self.signal_assignment(node)?,
            NodeKind::SelectedSignalAssignment => self.selected_assignment(node)?,
            NodeKind::ProcedureCall => {
                StmtKind::ProcedureCall(self.lower.expr(&statement_child(node)?))
            }
            _ => return None,
        };
        Some(Stmt {
            label: label.map(|(designator, _)| designator),
            kind,
            pos: self.lower.node_pos(node),
        })
    }

    /// `target := value [when condition else value ...];`
    fn variable_assignment(&self, node: &SyntaxNode) -> Option<StmtKind> {
        let target = self.lower.expr(&statement_child(node)?);
        let mut values = Vec::new();
        let mut pending: Option<Expr> = None;
        let mut in_condition = false;
        let tail = node
            .children_with_tokens()
            .skip_while(|child| !is_token(child, TokenKind::ColonEq))
            .skip(1);
        for child in tail {
            match child {
                SyntaxElement::Token(token) if token.kind() == TokenKind::Keyword(Kw::When) => {
                    in_condition = true
                }
                SyntaxElement::Node(node) => {
                    let expr = self.lower.expr(&node);
                    if in_condition {
                        if let Some(value) = pending.take() {
                            values.push((value, Some(expr)));
                        }
                        in_condition = false;
                    } else if let Some(value) = pending.replace(expr) {
                        values.push((value, None));
                    }
                }
                SyntaxElement::Token(_) => {}
            }
        }
        values.extend(pending.map(|value| (value, None)));
        Some(StmtKind::VariableAssignment { target, values })
    }
}

/// Collects the designators of a selected name, returns whether it ends with `.all`
fn flatten_name(expr: &Expr, segments: &mut Vec<WithPos<String>>) -> bool {
    match &expr.kind {
        ExprKind::Name(designator) => {
            segments.push(WithPos::new(designator.normalized(), &expr.pos));
            false
        }
        ExprKind::Selected(prefix, Suffix::Designator(designator, pos)) => {
            flatten_name(prefix, segments);
            segments.push(WithPos::new(designator.normalized(), pos));
            false
        }
        ExprKind::Selected(prefix, Suffix::All(_)) => {
            flatten_name(prefix, segments);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Code;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn build(code: &Code) -> DeclarationTable {
        let text = code.source().text();
        let (root, _) = vhdl_syntax::parse(&text);
        let contents = Contents::from_str(&text);
        build_declarations(code.source(), &contents, &root, &SymbolTable::new())
    }

    fn paths(table: &DeclarationTable) -> Vec<String> {
        table
            .arena
            .iter()
            .map(|decl| decl.tree_path.to_string())
            .collect()
    }

    #[test]
    fn tree_paths_of_design_units() {
        let code = Code::new(
            "\
library ieee;
use ieee.std_logic_1164.all;

entity ent is
  port (clk : in std_logic);
end entity;

architecture rtl of ent is
  signal s : std_logic;
begin
end architecture;
",
        );
        let table = build(&code);
        assert_eq!(
            paths(&table),
            vec!["", "std", "work", "ent", "ent.ieee", "ent.clk", "rtl", "rtl.s"]
        );
        assert_eq!(table.to_resolve.len(), 2);
        assert_eq!(
            table.used_packages(),
            vec![("ieee".to_owned(), "std_logic_1164".to_owned())]
        );
    }

    #[test]
    fn decorations() {
        let code = Code::new(
            "\
package pkg is
  function f return integer;
  function f return boolean;
end package;

package body pkg is
  function f return integer is
  begin
    return 0;
  end function;
end package body;
",
        );
        let table = build(&code);
        assert_eq!(
            paths(&table),
            vec![
                "",
                "std",
                "work",
                "pkg",
                "pkg.f@declaration",
                "pkg.f@declaration@1",
                "pkg@body",
                "pkg@body.f",
            ]
        );
    }

    #[test]
    fn anonymous_processes_and_loops() {
        let code = Code::new(
            "\
architecture a of e is
begin
  process
  begin
    for i in 0 to 3 loop
    end loop;
  end process;
  process
  begin
  end process;
end architecture;
",
        );
        let table = build(&code);
        assert_eq!(
            paths(&table),
            vec!["", "std", "work", "a", "a.@1", "a.@1.@1", "a.@1.@1.i", "a.@2"]
        );
    }

    #[test]
    fn enumeration_literals_are_siblings() {
        let code = Code::new("package p is type state_t is (idle, 'x', run); end package;");
        let table = build(&code);
        assert_eq!(
            paths(&table),
            vec!["", "std", "work", "p", "p.state_t", "p.idle", "p.'x'", "p.run"]
        );
        let state_t = table.by_path.get("p.state_t").copied().unwrap();
        assert_matches!(
            &table.arena.get(state_t).kind,
            DeclKind::Type(TypeDef::Enumeration(literals)) if literals.len() == 3
        );
    }

    #[test]
    fn duplicate_declarations() {
        let code = Code::new(
            "\
package p is
  constant c : integer := 0;
  constant c : integer := 1;
  function f return integer;
  function f return boolean;
end package;
",
        );
        let table = build(&code);
        assert_eq!(table.diagnostics.len(), 1);
        let diagnostic = &table.diagnostics[0];
        assert_eq!(diagnostic.code, ErrorCode::DuplicateDeclaration);
        assert_eq!(diagnostic.pos, code.s1("c : integer := 1").s1("c").pos());
        assert_eq!(paths(&table)[5], "p.c@1");
    }

    #[test]
    fn same_text_gives_same_paths() {
        let code = Code::new(
            "entity e is generic (g : natural); end; architecture a of e is begin end;",
        );
        assert_eq!(paths(&build(&code)), paths(&build(&code)));
    }

    #[test]
    fn statements_are_lowered() {
        let code = Code::new(
            "\
architecture a of e is
begin
  main: process (clk)
    variable v : integer;
  begin
    if rst = '1' then
      v := 0;
    elsif rising_edge(clk) then
      v := v + 1 when en else v;
    end if;
  end process;
  q <= d after 1 ns when en = '1' else '0';
end architecture;
",
        );
        let table = build(&code);
        let arch = table.by_path.get("a").copied().unwrap();
        let statements = &table.bodies[&arch];
        assert_eq!(statements.len(), 2);
        let StmtKind::Process(process) = statements[0].kind else {
            panic!("Expected process");
        };
        assert_eq!(table.arena.get(process).tree_path.as_ref(), "a.main");
        assert_matches!(
            &table.arena.get(process).kind,
            DeclKind::Process(Sensitivity::List(names)) if names.len() == 1
        );
        let body = &table.bodies[&process];
        let StmtKind::If(branches) = &body[0].kind else {
            panic!("Expected if statement");
        };
        assert_eq!(branches.len(), 2);
        assert_matches!(
            &branches[1].1[0].kind,
            StmtKind::VariableAssignment { values, .. } if values.len() == 2 && values[0].1.is_some()
        );
        assert_matches!(
            &statements[1].kind,
            StmtKind::SignalAssignment { waveforms, .. } if waveforms.len() == 2
        );
    }
}
