// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
/// Parsing of design files, context clauses and design units.
use crate::parser::diagnostics::ParserError;
use crate::parser::Parser;
use crate::syntax::node_kind::NodeKind::*;
use crate::tokens::token_kind::Keyword as Kw;
use crate::tokens::token_kind::TokenKind::*;
use crate::tokens::TokenStream;

impl<T: TokenStream> Parser<T> {
    pub fn design_file(&mut self) {
        self.start_node(DesignFile);
        while !self.at_eof() {
            let before = self.position();
            self.design_unit();
            if self.position() == before {
                self.skip_erroneous_token();
            }
        }
        // The end-of-file token carries the trailing trivia
        if let Some(token) = self.tokenizer.next() {
            self.builder.push(token);
        }
        self.end_node();
    }

    pub fn design_unit(&mut self) {
        self.start_node(DesignUnit);
        self.context_clause();
        match self.peek_kind() {
            Some(Keyword(Kw::Entity)) => self.entity(),
            Some(Keyword(Kw::Architecture)) => self.architecture(),
            Some(Keyword(Kw::Package)) => {
                if self.nth_is_kw(1, Kw::Body) {
                    self.package_body()
                } else {
                    self.package_declaration()
                }
            }
            Some(Keyword(Kw::Configuration)) => self.configuration(),
            Some(Keyword(Kw::Context)) => self.context_declaration(),
            _ => {
                self.error(ParserError::ExpectingDesignUnit);
                self.recover_to(&[
                    Keyword(Kw::Entity),
                    Keyword(Kw::Architecture),
                    Keyword(Kw::Package),
                    Keyword(Kw::Configuration),
                    Keyword(Kw::Library),
                    Keyword(Kw::Use),
                ]);
            }
        }
        self.end_node();
    }

    pub fn context_clause(&mut self) {
        self.start_node(ContextClause);
        loop {
            match self.peek_kind() {
                Some(Keyword(Kw::Library)) => self.library_clause(),
                Some(Keyword(Kw::Use)) => self.use_clause(),
                // `context foo is` starts a context declaration
                Some(Keyword(Kw::Context)) if !self.nth_is_kw(2, Kw::Is) => {
                    self.context_reference()
                }
                _ => break,
            }
        }
        self.end_node();
    }

    fn library_clause(&mut self) {
        self.start_node(LibraryClause);
        self.expect_kw(Kw::Library);
        self.expect_token(Identifier);
        while self.opt_token(Comma) {
            self.expect_token(Identifier);
        }
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub fn use_clause(&mut self) {
        self.start_node(UseClause);
        self.expect_kw(Kw::Use);
        self.name();
        while self.opt_token(Comma) {
            self.name();
        }
        self.expect_token(SemiColon);
        self.end_node();
    }

    fn context_reference(&mut self) {
        self.start_node(ContextReference);
        self.expect_kw(Kw::Context);
        self.name();
        while self.opt_token(Comma) {
            self.name();
        }
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub fn entity(&mut self) {
        self.start_node(EntityDeclaration);
        self.expect_kw(Kw::Entity);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Is);
        if self.at_kw(Kw::Generic) {
            self.generic_clause();
        }
        if self.at_kw(Kw::Port) {
            self.port_clause();
        }
        self.declarative_part();
        if self.opt_kw(Kw::Begin) {
            self.concurrent_statements();
        }
        self.expect_kw(Kw::End);
        self.opt_kw(Kw::Entity);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub fn architecture(&mut self) {
        self.start_node(ArchitectureBody);
        self.expect_kw(Kw::Architecture);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Of);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Is);
        self.declarative_part();
        self.expect_kw(Kw::Begin);
        self.concurrent_statements();
        self.expect_kw(Kw::End);
        self.opt_kw(Kw::Architecture);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub fn package_declaration(&mut self) {
        if self.nth_is_kw(2, Kw::Is) && self.nth_is_kw(3, Kw::New) {
            return self.package_instantiation();
        }
        self.start_node(PackageDeclaration);
        self.expect_kw(Kw::Package);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Is);
        if self.at_kw(Kw::Generic) {
            self.generic_clause();
            if self.at_kw(Kw::Generic) && self.nth_is_kw(1, Kw::Map) {
                self.map_aspect(GenericMapAspect);
                self.expect_token(SemiColon);
            }
        }
        self.declarative_part();
        self.expect_kw(Kw::End);
        self.opt_kw(Kw::Package);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    fn package_instantiation(&mut self) {
        self.start_node(PackageInstantiation);
        self.expect_kw(Kw::Package);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Is);
        self.expect_kw(Kw::New);
        self.name();
        if self.at_kw(Kw::Generic) {
            self.map_aspect(GenericMapAspect);
        }
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub fn package_body(&mut self) {
        self.start_node(PackageBody);
        self.expect_kw(Kw::Package);
        self.expect_kw(Kw::Body);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Is);
        self.declarative_part();
        self.expect_kw(Kw::End);
        if self.opt_kw(Kw::Package) {
            self.expect_kw(Kw::Body);
        }
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    /// Configurations are kept in the tree, but their block configurations are not structured.
    fn configuration(&mut self) {
        self.start_node(ConfigurationDeclaration);
        self.expect_kw(Kw::Configuration);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Of);
        self.name();
        self.expect_kw(Kw::Is);
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.peek_kind() {
                Some(Keyword(Kw::For)) => depth += 1,
                Some(Keyword(Kw::End)) if self.nth_is_kw(1, Kw::For) => {
                    depth = depth.saturating_sub(1);
                    self.skip();
                }
                Some(Keyword(Kw::End)) if depth == 0 => break,
                _ => {}
            }
            self.skip();
        }
        self.expect_kw(Kw::End);
        self.opt_kw(Kw::Configuration);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    fn context_declaration(&mut self) {
        self.start_node(ContextDeclaration);
        self.expect_kw(Kw::Context);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Is);
        loop {
            match self.peek_kind() {
                Some(Keyword(Kw::Library)) => self.library_clause(),
                Some(Keyword(Kw::Use)) => self.use_clause(),
                Some(Keyword(Kw::Context)) => self.context_reference(),
                _ => break,
            }
        }
        self.expect_kw(Kw::End);
        self.opt_kw(Kw::Context);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::{parse_fn, tree};
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_simple_entity() {
        assert_eq!(
            tree(
                "\
entity my_ent is
begin
end my_ent;",
                Parser::entity
            ),
            "\
EntityDeclaration
  Keyword(Entity)
  Identifier 'my_ent'
  Keyword(Is)
  DeclarativePart
  Keyword(Begin)
  ConcurrentStatements
  Keyword(End)
  Identifier 'my_ent'
  SemiColon
"
        );
    }

    #[test]
    fn parse_design_file_with_context() {
        assert_eq!(
            tree(
                "\
library ieee;
use ieee.std_logic_1164.all;

entity ent is
end entity;

architecture rtl of ent is
begin
end architecture rtl;
",
                Parser::design_file
            ),
            "\
DesignFile
  DesignUnit
    ContextClause
      LibraryClause
        Keyword(Library)
        Identifier 'ieee'
        SemiColon
      UseClause
        Keyword(Use)
        SelectedName
          SelectedName
            SimpleName
              Identifier 'ieee'
            Dot
            Identifier 'std_logic_1164'
          Dot
          Keyword(All)
        SemiColon
    EntityDeclaration
      Keyword(Entity)
      Identifier 'ent'
      Keyword(Is)
      DeclarativePart
      Keyword(End)
      Keyword(Entity)
      SemiColon
  DesignUnit
    ContextClause
    ArchitectureBody
      Keyword(Architecture)
      Identifier 'rtl'
      Keyword(Of)
      Identifier 'ent'
      Keyword(Is)
      DeclarativePart
      Keyword(Begin)
      ConcurrentStatements
      Keyword(End)
      Keyword(Architecture)
      Identifier 'rtl'
      SemiColon
  Eof
"
        );
    }

    #[test]
    fn parse_package_and_body() {
        let (node, diagnostics) = parse_fn(
            "\
package pkg is
  constant c : integer := 1;
end package;

package body pkg is
end package body pkg;",
            Parser::design_file,
        );
        assert_eq!(diagnostics, vec![]);
        let kinds: Vec<_> = node
            .children()
            .filter_map(|unit| unit.children().nth(1))
            .map(|unit| unit.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                crate::syntax::NodeKind::PackageDeclaration,
                crate::syntax::NodeKind::PackageBody
            ]
        );
    }

    #[test]
    fn configuration_is_skipped_structurally() {
        let (_, diagnostics) = parse_fn(
            "\
configuration cfg of ent is
  for rtl
    for u1 : comp use entity work.foo;
    end for;
  end for;
end configuration cfg;",
            Parser::design_file,
        );
        assert_eq!(diagnostics, vec![]);
    }

    #[test]
    fn garbage_is_reported_and_kept() {
        let code = "foo bar; entity ent is end;";
        let (node, diagnostics) = parse_fn(code, Parser::design_file);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].text_pos, 0);
        assert_eq!(node.to_string(), code);
    }

    #[test]
    fn missing_end_reports_eof_once() {
        let (_, diagnostics) = parse_fn("entity ent is", Parser::design_file);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].error,
            crate::parser::diagnostics::ParserError::Eof
        );
    }
}
