// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
/// Parsing of type definitions and subtype indications
use crate::parser::Parser;
use crate::syntax::node_kind::NodeKind::*;
use crate::tokens::token_kind::Keyword as Kw;
use crate::tokens::token_kind::TokenKind::*;
use crate::tokens::TokenStream;

impl<T: TokenStream> Parser<T> {
    pub fn type_declaration(&mut self) {
        self.start_node(TypeDeclaration);
        self.expect_kw(Kw::Type);
        self.expect_token(Identifier);
        if self.opt_token(SemiColon) {
            // incomplete type declaration
            self.end_node();
            return;
        }
        self.expect_kw(Kw::Is);
        match self.peek_kind() {
            Some(LeftPar) => self.enumeration_type_definition(),
            Some(Keyword(Kw::Range)) => self.range_or_physical_type_definition(),
            Some(Keyword(Kw::Array)) => self.array_type_definition(),
            Some(Keyword(Kw::Record)) => self.record_type_definition(),
            Some(Keyword(Kw::Access)) => {
                self.start_node(AccessTypeDefinition);
                self.skip();
                self.subtype_indication();
                self.end_node();
            }
            Some(Keyword(Kw::File)) => {
                self.start_node(FileTypeDefinition);
                self.skip();
                self.expect_kw(Kw::Of);
                self.name();
                self.end_node();
            }
            Some(Keyword(Kw::Protected)) => self.protected_type(),
            _ => self.expect_tokens_err([
                LeftPar,
                Keyword(Kw::Range),
                Keyword(Kw::Array),
                Keyword(Kw::Record),
                Keyword(Kw::Access),
                Keyword(Kw::File),
                Keyword(Kw::Protected),
            ]),
        }
        if !self.expect_token(SemiColon) {
            self.recover_statement();
        }
        self.end_node();
    }

    fn enumeration_type_definition(&mut self) {
        self.start_node(EnumerationTypeDefinition);
        self.expect_token(LeftPar);
        self.expect_one_of(&[Identifier, CharacterLiteral]);
        while self.opt_token(Comma) {
            self.expect_one_of(&[Identifier, CharacterLiteral]);
        }
        self.expect_token(RightPar);
        self.end_node();
    }

    fn range_or_physical_type_definition(&mut self) {
        let checkpoint = self.checkpoint();
        self.expect_kw(Kw::Range);
        self.expression_or_range();
        if !self.at_kw(Kw::Units) {
            self.start_node_at(checkpoint, RangeTypeDefinition);
            self.end_node();
            return;
        }
        self.start_node_at(checkpoint, PhysicalTypeDefinition);
        self.expect_kw(Kw::Units);
        self.start_node(PrimaryUnitDeclaration);
        self.expect_token(Identifier);
        self.expect_token(SemiColon);
        self.end_node();
        while self.at(Identifier) {
            self.start_node(SecondaryUnitDeclaration);
            self.skip();
            self.expect_token(EQ);
            self.expression();
            self.expect_token(SemiColon);
            self.end_node();
        }
        self.expect_kw(Kw::End);
        self.expect_kw(Kw::Units);
        self.opt_identifier();
        self.end_node();
    }

    fn array_type_definition(&mut self) {
        self.start_node(ArrayTypeDefinition);
        self.expect_kw(Kw::Array);
        self.expect_token(LeftPar);
        loop {
            self.index_definition();
            if !self.opt_token(Comma) {
                break;
            }
        }
        self.expect_token(RightPar);
        self.expect_kw(Kw::Of);
        self.subtype_indication();
        self.end_node();
    }

    /// Either `type_mark range <>` or a discrete range
    fn index_definition(&mut self) {
        let checkpoint = self.checkpoint();
        self.expression_or_range();
        if self.at_kw(Kw::Range) && self.nth(1) == Some(BOX) {
            self.start_node_at(checkpoint, IndexSubtypeDefinition);
            self.skip();
            self.skip();
            self.end_node();
        }
    }

    fn record_type_definition(&mut self) {
        self.start_node(RecordTypeDefinition);
        self.expect_kw(Kw::Record);
        while self.at(Identifier) {
            self.start_node(ElementDeclaration);
            self.identifier_list();
            self.expect_token(Colon);
            self.subtype_indication();
            self.expect_token(SemiColon);
            self.end_node();
        }
        self.expect_kw(Kw::End);
        self.expect_kw(Kw::Record);
        self.opt_identifier();
        self.end_node();
    }

    fn protected_type(&mut self) {
        if self.nth_is_kw(1, Kw::Body) {
            self.start_node(ProtectedTypeBody);
            self.skip();
            self.skip();
            self.declarative_part();
            self.expect_kw(Kw::End);
            self.expect_kw(Kw::Protected);
            self.expect_kw(Kw::Body);
        } else {
            self.start_node(ProtectedTypeDefinition);
            self.skip();
            self.declarative_part();
            self.expect_kw(Kw::End);
            self.expect_kw(Kw::Protected);
        }
        self.opt_identifier();
        self.end_node();
    }

    /// ```ebnf
    /// subtype_indication ::= [ resolution_indication ] type_mark [ constraint ]
    /// ```
    /// An index constraint directly following the type mark is parsed as part of the name.
    pub fn subtype_indication(&mut self) {
        self.start_node(SubtypeIndication);
        if self.at(LeftPar) {
            self.start_node(ResolutionIndication);
            self.skip_balanced_parens();
            self.end_node();
        }
        self.name();
        if self.at(Identifier) {
            // The first name was a resolution function
            self.name();
        }
        if self.at_kw(Kw::Range) && self.nth(1) != Some(BOX) {
            self.start_node(RangeConstraint);
            self.skip();
            self.expression_or_range();
            self.end_node();
        } else if self.at(LeftPar) {
            self.start_node(IndexConstraint);
            self.skip();
            loop {
                self.expression_or_range();
                if !self.opt_token(Comma) {
                    break;
                }
            }
            self.expect_token(RightPar);
            self.end_node();
        }
        self.end_node();
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::tree;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn enumeration_type() {
        assert_eq!(
            tree(
                "type state_t is (idle, 'x', run);",
                Parser::type_declaration,
            ),
            "\
TypeDeclaration
  Keyword(Type)
  Identifier 'state_t'
  Keyword(Is)
  EnumerationTypeDefinition
    LeftPar
    Identifier 'idle'
    Comma
    CharacterLiteral ''x''
    Comma
    Identifier 'run'
    RightPar
  SemiColon
"
        );
    }

    #[test]
    fn physical_type() {
        assert_eq!(
            tree(
                "type time is range -10 to 10 units fs; ps = 1000 fs; end units;",
                Parser::type_declaration
            ),
            "\
TypeDeclaration
  Keyword(Type)
  Identifier 'time'
  Keyword(Is)
  PhysicalTypeDefinition
    Keyword(Range)
    Range
      UnaryExpression
        Minus
        Literal
          AbstractLiteral '10'
      Keyword(To)
      Literal
        AbstractLiteral '10'
    Keyword(Units)
    PrimaryUnitDeclaration
      Identifier 'fs'
      SemiColon
    SecondaryUnitDeclaration
      Identifier 'ps'
      EQ
      PhysicalLiteral
        AbstractLiteral '1000'
        Identifier 'fs'
      SemiColon
    Keyword(End)
    Keyword(Units)
  SemiColon
"
        );
    }

    #[test]
    fn unconstrained_array_type() {
        assert_eq!(
            tree(
                "type word_array is array (natural range <>) of bit;",
                Parser::type_declaration
            ),
            "\
TypeDeclaration
  Keyword(Type)
  Identifier 'word_array'
  Keyword(Is)
  ArrayTypeDefinition
    Keyword(Array)
    LeftPar
    IndexSubtypeDefinition
      SimpleName
        Identifier 'natural'
      Keyword(Range)
      BOX
    RightPar
    Keyword(Of)
    SubtypeIndication
      SimpleName
        Identifier 'bit'
  SemiColon
"
        );
    }

    #[test]
    fn record_type() {
        assert_eq!(
            tree(
                "type rec is record a, b : bit; end record rec;",
                Parser::type_declaration
            ),
            "\
TypeDeclaration
  Keyword(Type)
  Identifier 'rec'
  Keyword(Is)
  RecordTypeDefinition
    Keyword(Record)
    ElementDeclaration
      IdentifierList
        Identifier 'a'
        Comma
        Identifier 'b'
      Colon
      SubtypeIndication
        SimpleName
          Identifier 'bit'
      SemiColon
    Keyword(End)
    Keyword(Record)
    Identifier 'rec'
  SemiColon
"
        );
    }

    #[test]
    fn subtype_indication_with_resolution_and_range() {
        assert_eq!(
            tree(
                "resolved std_ulogic range 'U' to 'Z'",
                Parser::subtype_indication,
            ),
            "\
SubtypeIndication
  SimpleName
    Identifier 'resolved'
  SimpleName
    Identifier 'std_ulogic'
  RangeConstraint
    Keyword(Range)
    Range
      Literal
        CharacterLiteral ''U''
      Keyword(To)
      Literal
        CharacterLiteral ''Z''
"
        );
    }
}
