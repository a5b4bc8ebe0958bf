// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
/// Parsing of declarative parts, object and subprogram declarations and interface lists
use crate::parser::diagnostics::ParserError;
use crate::parser::Parser;
use crate::syntax::node_kind::NodeKind::{self, *};
use crate::tokens::token_kind::Keyword as Kw;
use crate::tokens::token_kind::TokenKind::{self, *};
use crate::tokens::TokenStream;

/// Tokens that can start a declarative item
fn starts_declaration(kind: TokenKind) -> bool {
    matches!(
        kind,
        Keyword(
            Kw::Signal
                | Kw::Constant
                | Kw::Variable
                | Kw::Shared
                | Kw::File
                | Kw::Type
                | Kw::Subtype
                | Kw::Alias
                | Kw::Attribute
                | Kw::Component
                | Kw::Function
                | Kw::Procedure
                | Kw::Pure
                | Kw::Impure
                | Kw::Use
                | Kw::Package
                | Kw::Disconnect
                | Kw::Group
                | Kw::For
        )
    )
}

impl<T: TokenStream> Parser<T> {
    pub(crate) fn at_declaration_start(&self) -> bool {
        self.peek_kind().is_some_and(starts_declaration)
    }

    pub fn declarative_part(&mut self) {
        self.start_node(DeclarativePart);
        loop {
            match self.peek_kind() {
                None | Some(Eof) | Some(Keyword(Kw::Begin)) | Some(Keyword(Kw::End)) => break,
                _ => {}
            }
            let before = self.position();
            self.declaration();
            if self.position() == before {
                self.skip_erroneous_token();
            }
        }
        self.end_node();
    }

    pub fn declaration(&mut self) {
        let Some(kind) = self.peek_kind() else {
            return self.eof_err();
        };
        match kind {
            Keyword(Kw::Signal) => self.object_declaration(SignalDeclaration),
            Keyword(Kw::Constant) => self.object_declaration(ConstantDeclaration),
            Keyword(Kw::Variable | Kw::Shared) => self.object_declaration(VariableDeclaration),
            Keyword(Kw::File) => self.object_declaration(FileDeclaration),
            Keyword(Kw::Type) => self.type_declaration(),
            Keyword(Kw::Subtype) => self.subtype_declaration(),
            Keyword(Kw::Alias) => self.alias_declaration(),
            Keyword(Kw::Attribute) => {
                if self.nth_is_kw(2, Kw::Of) {
                    self.attribute_specification()
                } else {
                    self.attribute_declaration()
                }
            }
            Keyword(Kw::Component) => self.component_declaration(),
            Keyword(Kw::Function | Kw::Procedure | Kw::Pure | Kw::Impure) => self.subprogram(),
            Keyword(Kw::Use) => self.use_clause(),
            Keyword(Kw::Package) => {
                if self.nth_is_kw(1, Kw::Body) {
                    self.package_body()
                } else {
                    self.package_declaration()
                }
            }
            Keyword(Kw::Disconnect | Kw::Group | Kw::For) => {
                // Configuration specifications, disconnection specifications and groups
                // carry no information for the analysis
                self.start_node(SkippedDeclaration);
                self.skip_until(&[SemiColon]);
                self.expect_token(SemiColon);
                self.end_node();
            }
            _ => {
                self.error(ParserError::ExpectingDeclaration);
                self.recover_statement();
            }
        }
    }

    fn object_declaration(&mut self, kind: NodeKind) {
        self.start_node(kind);
        self.opt_kw(Kw::Shared);
        self.skip();
        self.identifier_list();
        self.expect_token(Colon);
        self.subtype_indication();
        if kind == SignalDeclaration && !self.opt_kw(Kw::Register) {
            self.opt_kw(Kw::Bus);
        }
        if kind == FileDeclaration {
            if self.opt_kw(Kw::Open) {
                self.expression();
            }
            if self.opt_kw(Kw::Is) {
                self.expression();
            }
        }
        if self.opt_token(ColonEq) {
            self.expression();
        }
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub(crate) fn identifier_list(&mut self) {
        self.start_node(IdentifierList);
        self.expect_token(Identifier);
        while self.opt_token(Comma) {
            self.expect_token(Identifier);
        }
        self.end_node();
    }

    fn subtype_declaration(&mut self) {
        self.start_node(SubtypeDeclaration);
        self.expect_kw(Kw::Subtype);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Is);
        self.subtype_indication();
        self.expect_token(SemiColon);
        self.end_node();
    }

    fn alias_declaration(&mut self) {
        self.start_node(AliasDeclaration);
        self.expect_kw(Kw::Alias);
        self.expect_one_of(&[Identifier, CharacterLiteral, StringLiteral]);
        if self.opt_token(Colon) {
            self.subtype_indication();
        }
        self.expect_kw(Kw::Is);
        self.name();
        if self.at(LeftSquare) {
            self.signature();
        }
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub(crate) fn signature(&mut self) {
        self.start_node(Signature);
        self.expect_token(LeftSquare);
        if !self.at(RightSquare) && !self.at_kw(Kw::Return) {
            self.name();
            while self.opt_token(Comma) {
                self.name();
            }
        }
        if self.opt_kw(Kw::Return) {
            self.name();
        }
        self.expect_token(RightSquare);
        self.end_node();
    }

    fn attribute_declaration(&mut self) {
        self.start_node(AttributeDeclaration);
        self.expect_kw(Kw::Attribute);
        self.expect_token(Identifier);
        self.expect_token(Colon);
        self.name();
        self.expect_token(SemiColon);
        self.end_node();
    }

    fn attribute_specification(&mut self) {
        self.start_node(AttributeSpecification);
        self.expect_kw(Kw::Attribute);
        self.expect_token(Identifier);
        self.expect_kw(Kw::Of);
        self.skip_until(&[Keyword(Kw::Is), SemiColon]);
        self.expect_kw(Kw::Is);
        self.expression();
        self.expect_token(SemiColon);
        self.end_node();
    }

    fn component_declaration(&mut self) {
        self.start_node(ComponentDeclaration);
        self.expect_kw(Kw::Component);
        self.expect_token(Identifier);
        self.opt_kw(Kw::Is);
        if self.at_kw(Kw::Generic) {
            self.generic_clause();
        }
        if self.at_kw(Kw::Port) {
            self.port_clause();
        }
        self.expect_kw(Kw::End);
        self.opt_kw(Kw::Component);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub(crate) fn generic_clause(&mut self) {
        self.start_node(GenericClause);
        self.expect_kw(Kw::Generic);
        self.interface_list();
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub(crate) fn port_clause(&mut self) {
        self.start_node(PortClause);
        self.expect_kw(Kw::Port);
        self.interface_list();
        self.expect_token(SemiColon);
        self.end_node();
    }

    pub fn interface_list(&mut self) {
        self.start_node(InterfaceList);
        self.expect_token(LeftPar);
        loop {
            let before = self.position();
            self.interface_declaration();
            if self.position() == before {
                self.recover_to(&[SemiColon, RightPar]);
            }
            if !self.opt_token(SemiColon) || self.at(RightPar) {
                break;
            }
        }
        self.expect_token(RightPar);
        self.end_node();
    }

    fn interface_declaration(&mut self) {
        match self.peek_kind() {
            Some(Keyword(Kw::Type)) => {
                self.start_node(InterfaceTypeDeclaration);
                self.skip();
                self.expect_token(Identifier);
                self.end_node();
            }
            Some(Keyword(Kw::Function | Kw::Procedure | Kw::Pure | Kw::Impure)) => {
                self.start_node(InterfaceSubprogramDeclaration);
                self.subprogram_specification();
                if self.opt_kw(Kw::Is) && !self.opt_token(BOX) {
                    self.name();
                }
                self.end_node();
            }
            Some(Keyword(Kw::Package)) => {
                self.start_node(InterfacePackageDeclaration);
                self.skip();
                self.expect_token(Identifier);
                self.expect_kw(Kw::Is);
                self.expect_kw(Kw::New);
                self.name();
                if self.at_kw(Kw::Generic) {
                    self.map_aspect(GenericMapAspect);
                }
                self.end_node();
            }
            _ => self.interface_object_declaration(),
        }
    }

    fn interface_object_declaration(&mut self) {
        self.start_node(InterfaceObjectDeclaration);
        if !self.opt_kw(Kw::Signal) && !self.opt_kw(Kw::Constant) && !self.opt_kw(Kw::Variable)
        {
            self.opt_kw(Kw::File);
        }
        self.identifier_list();
        self.expect_token(Colon);
        if let Some(Keyword(Kw::In | Kw::Out | Kw::Inout | Kw::Buffer | Kw::Linkage)) =
            self.peek_kind()
        {
            self.skip();
        }
        self.subtype_indication();
        self.opt_kw(Kw::Bus);
        if self.opt_token(ColonEq) {
            self.expression();
        }
        self.end_node();
    }

    pub(crate) fn subprogram_specification(&mut self) {
        if self.at_kw(Kw::Procedure) {
            self.start_node(ProcedureSpecification);
            self.skip();
            self.expect_one_of(&[Identifier, StringLiteral]);
            self.opt_kw(Kw::Parameter);
            if self.at(LeftPar) {
                self.interface_list();
            }
            self.end_node();
        } else {
            self.start_node(FunctionSpecification);
            if !self.opt_kw(Kw::Pure) {
                self.opt_kw(Kw::Impure);
            }
            self.expect_kw(Kw::Function);
            self.expect_one_of(&[Identifier, StringLiteral]);
            self.opt_kw(Kw::Parameter);
            if self.at(LeftPar) {
                self.interface_list();
            }
            self.expect_kw(Kw::Return);
            self.name();
            self.end_node();
        }
    }

    pub fn subprogram(&mut self) {
        let checkpoint = self.checkpoint();
        self.subprogram_specification();
        if self.at_kw(Kw::Is) && self.nth_is_kw(1, Kw::New) {
            self.start_node_at(checkpoint, SubprogramInstantiation);
            self.skip_until(&[SemiColon]);
            self.expect_token(SemiColon);
            self.end_node();
            return;
        }
        if !self.at_kw(Kw::Is) {
            self.start_node_at(checkpoint, SubprogramDeclaration);
            self.expect_token(SemiColon);
            self.end_node();
            return;
        }
        self.start_node_at(checkpoint, SubprogramBody);
        self.expect_kw(Kw::Is);
        self.declarative_part();
        self.expect_kw(Kw::Begin);
        self.sequential_statements();
        self.expect_kw(Kw::End);
        if !self.opt_kw(Kw::Function) {
            self.opt_kw(Kw::Procedure);
        }
        if !self.opt_identifier() {
            self.opt_token(StringLiteral);
        }
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
    fn signal_declaration_with_default() {
        assert_eq!(
            tree("signal a, b : bit := '0';", Parser::declaration),
            "\
SignalDeclaration
  Keyword(Signal)
  IdentifierList
    Identifier 'a'
    Comma
    Identifier 'b'
  Colon
  SubtypeIndication
    SimpleName
      Identifier 'bit'
  ColonEq
  Literal
    CharacterLiteral ''0''
  SemiColon
"
        );
    }

    #[test]
    fn port_clause() {
        assert_eq!(
            tree(
                "(clk : in std_logic; q : out std_logic_vector(7 downto 0) := (others => '0'))",
                Parser::interface_list
            ),
            "\
InterfaceList
  LeftPar
  InterfaceObjectDeclaration
    IdentifierList
      Identifier 'clk'
    Colon
    Keyword(In)
    SubtypeIndication
      SimpleName
        Identifier 'std_logic'
  SemiColon
  InterfaceObjectDeclaration
    IdentifierList
      Identifier 'q'
    Colon
    Keyword(Out)
    SubtypeIndication
      CallOrIndex
        SimpleName
          Identifier 'std_logic_vector'
        AssociationList
          LeftPar
          AssociationElement
            Range
              Literal
                AbstractLiteral '7'
              Keyword(Downto)
              Literal
                AbstractLiteral '0'
          RightPar
    ColonEq
    Aggregate
      LeftPar
      ElementAssociation
        Choices
          Keyword(Others)
        RightArrow
        Literal
          CharacterLiteral ''0''
      RightPar
  RightPar
"
        );
    }

    #[test]
    fn function_declaration_and_body() {
        let (node, diagnostics) = parse_fn(
            "\
package body pkg is
  function f(x : integer) return integer;
  function f(x : integer) return integer is
    variable v : integer;
  begin
    return x + 1;
  end function f;
  procedure \"and\"(a : bit);
end package body;",
            Parser::package_body,
        );
        assert_eq!(diagnostics, vec![]);
        let kinds: Vec<_> = node
            .child_of_kind(crate::syntax::NodeKind::DeclarativePart)
            .unwrap()
            .children()
            .map(|child| child.kind())
            .collect();
        use crate::syntax::NodeKind::*;
        assert_eq!(
            kinds,
            vec![SubprogramDeclaration, SubprogramBody, SubprogramDeclaration]
        );
    }

    #[test]
    fn bad_declaration_recovers_at_semicolon() {
        let (node, diagnostics) = parse_fn(
            "\
architecture a of e is
  foo bar baz;
  signal s : bit;
begin
end;",
            Parser::architecture,
        );
        assert_eq!(diagnostics.len(), 1);
        let decls: Vec<_> = node
            .child_of_kind(crate::syntax::NodeKind::DeclarativePart)
            .unwrap()
            .children()
            .map(|child| child.kind())
            .collect();
        assert_eq!(
            decls,
            vec![
                crate::syntax::NodeKind::Error,
                crate::syntax::NodeKind::SignalDeclaration
            ]
        );
    }
}
