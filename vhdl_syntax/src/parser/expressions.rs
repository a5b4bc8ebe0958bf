// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
/// Parsing of expressions, names, aggregates and association lists
use crate::parser::diagnostics::ParserError;
use crate::parser::Parser;
use crate::syntax::node_kind::NodeKind::*;
use crate::tokens::token_kind::Keyword as Kw;
use crate::tokens::token_kind::TokenKind::{self, *};
use crate::tokens::TokenStream;

fn is_logical_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        Keyword(Kw::And | Kw::Or | Kw::Nand | Kw::Nor | Kw::Xor | Kw::Xnor)
    )
}

fn is_relational_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        EQ | NE | LT | LTE | GT | GTE | QueEQ | QueNE | QueLT | QueLTE | QueGT | QueGTE
    )
}

fn is_shift_operator(kind: TokenKind) -> bool {
    matches!(
        kind,
        Keyword(Kw::Sll | Kw::Srl | Kw::Sla | Kw::Sra | Kw::Rol | Kw::Ror)
    )
}

fn is_adding_operator(kind: TokenKind) -> bool {
    matches!(kind, Plus | Minus | Concat)
}

fn is_multiplying_operator(kind: TokenKind) -> bool {
    matches!(kind, Times | Div | Keyword(Kw::Mod | Kw::Rem))
}

impl<T: TokenStream> Parser<T> {
    fn at_matching(&self, pred: fn(TokenKind) -> bool) -> bool {
        self.peek_kind().is_some_and(pred)
    }

    /// ```ebnf
    /// expression ::= condition_operator primary | logical_expression
    /// ```
    pub fn expression(&mut self) {
        if self.at(QueQue) {
            self.start_node(UnaryExpression);
            self.skip();
            self.primary();
            self.end_node();
            return;
        }
        let checkpoint = self.checkpoint();
        self.relation();
        while self.at_matching(is_logical_operator) {
            self.start_node_at(checkpoint, BinaryExpression);
            self.skip();
            self.relation();
            self.end_node();
        }
    }

    fn relation(&mut self) {
        let checkpoint = self.checkpoint();
        self.shift_expression();
        if self.at_matching(is_relational_operator) {
            self.start_node_at(checkpoint, BinaryExpression);
            self.skip();
            self.shift_expression();
            self.end_node();
        }
    }

    fn shift_expression(&mut self) {
        let checkpoint = self.checkpoint();
        self.simple_expression();
        if self.at_matching(is_shift_operator) {
            self.start_node_at(checkpoint, BinaryExpression);
            self.skip();
            self.simple_expression();
            self.end_node();
        }
    }

    /// A leading sign applies to the first term only
    fn simple_expression(&mut self) {
        let checkpoint = self.checkpoint();
        if self.at(Plus) || self.at(Minus) {
            self.start_node(UnaryExpression);
            self.skip();
            self.term();
            self.end_node();
        } else {
            self.term();
        }
        while self.at_matching(is_adding_operator) {
            self.start_node_at(checkpoint, BinaryExpression);
            self.skip();
            self.term();
            self.end_node();
        }
    }

    fn term(&mut self) {
        let checkpoint = self.checkpoint();
        self.factor();
        while self.at_matching(is_multiplying_operator) {
            self.start_node_at(checkpoint, BinaryExpression);
            self.skip();
            self.factor();
            self.end_node();
        }
    }

    fn factor(&mut self) {
        if self.at_kw(Kw::Abs) || self.at_kw(Kw::Not) || self.at_matching(is_logical_operator) {
            self.start_node(UnaryExpression);
            self.skip();
            self.primary();
            self.end_node();
            return;
        }
        let checkpoint = self.checkpoint();
        self.primary();
        if self.at(Pow) {
            self.start_node_at(checkpoint, BinaryExpression);
            self.skip();
            self.primary();
            self.end_node();
        }
    }

    pub fn primary(&mut self) {
        match self.peek_kind() {
            Some(AbstractLiteral) => {
                if self.nth(1) == Some(Identifier) {
                    self.start_node(PhysicalLiteral);
                    self.skip();
                    self.skip();
                } else {
                    self.start_node(Literal);
                    self.skip();
                }
                self.end_node();
            }
            Some(StringLiteral) if self.nth(1) == Some(LeftPar) => self.name(),
            Some(StringLiteral | BitStringLiteral | CharacterLiteral | Keyword(Kw::Null)) => {
                self.start_node(Literal);
                self.skip();
                self.end_node();
            }
            Some(LeftPar) => self.aggregate_or_parenthesized(),
            Some(Keyword(Kw::New)) => {
                self.start_node(Allocator);
                self.skip();
                self.name();
                self.end_node();
            }
            Some(Identifier | LtLt) => self.name(),
            _ => self.error(ParserError::ExpectingExpression),
        }
    }

    /// An expression, a range `a to b` or a subtype indication with range constraint
    /// as used in discrete ranges.
    pub fn expression_or_range(&mut self) {
        let checkpoint = self.checkpoint();
        self.expression();
        if self.at_kw(Kw::To) || self.at_kw(Kw::Downto) {
            self.start_node_at(checkpoint, Range);
            self.skip();
            self.expression();
            self.end_node();
        } else if self.at_kw(Kw::Range) && self.nth(1) != Some(BOX) {
            self.start_node_at(checkpoint, SubtypeIndication);
            self.start_node(RangeConstraint);
            self.skip();
            self.expression_or_range();
            self.end_node();
            self.end_node();
        }
    }

    /// ```ebnf
    /// name ::= simple_name | operator_symbol | character_literal
    ///        | selected_name | indexed_name | slice_name | attribute_name
    ///        | function_call | qualified_expression | external_name
    /// ```
    pub fn name(&mut self) {
        let checkpoint = self.checkpoint();
        match self.peek_kind() {
            Some(Identifier | StringLiteral) => {
                self.start_node(SimpleName);
                self.skip();
                self.end_node();
            }
            Some(CharacterLiteral) => {
                self.start_node(Literal);
                self.skip();
                self.end_node();
            }
            Some(LtLt) => {
                self.start_node(ExternalName);
                self.skip_until(&[GtGt, SemiColon]);
                self.expect_token(GtGt);
                self.end_node();
            }
            _ => {
                self.expect_tokens_err([Identifier]);
                return;
            }
        }
        loop {
            match self.peek_kind() {
                Some(Dot) => {
                    self.start_node_at(checkpoint, SelectedName);
                    self.skip();
                    self.expect_one_of(&[
                        Identifier,
                        CharacterLiteral,
                        StringLiteral,
                        Keyword(Kw::All),
                    ]);
                    self.end_node();
                }
                Some(LeftPar) => {
                    self.start_node_at(checkpoint, CallOrIndex);
                    self.association_list();
                    self.end_node();
                }
                Some(Tick) => match self.nth(1) {
                    Some(LeftPar) => {
                        self.start_node_at(checkpoint, QualifiedExpression);
                        self.skip();
                        self.aggregate_or_parenthesized();
                        self.end_node();
                    }
                    Some(Identifier | Keyword(Kw::Range | Kw::Subtype)) => {
                        self.start_node_at(checkpoint, AttributeName);
                        self.skip();
                        self.skip();
                        self.end_node();
                    }
                    _ => break,
                },
                _ => break,
            }
        }
    }

    pub fn association_list(&mut self) {
        self.start_node(AssociationList);
        self.expect_token(LeftPar);
        loop {
            self.association_element();
            if !self.opt_token(Comma) {
                break;
            }
        }
        self.expect_token(RightPar);
        self.end_node();
    }

    fn association_element(&mut self) {
        self.start_node(AssociationElement);
        if self.lookahead_at_depth_zero(RightArrow) {
            self.name();
            self.expect_token(RightArrow);
        }
        if !self.opt_kw(Kw::Open) {
            self.expression_or_range();
        }
        self.end_node();
    }

    /// Whether the parenthesis at the current position starts an aggregate,
    /// that is contains a choice, a comma or `others`.
    fn at_aggregate(&self) -> bool {
        if self.nth_is_kw(1, Kw::Others) {
            return true;
        }
        let mut depth = 0usize;
        let mut n = 1;
        loop {
            match self.nth(n) {
                None | Some(Eof) | Some(SemiColon) => return false,
                Some(LeftPar) => depth += 1,
                Some(RightPar) => {
                    if depth == 0 {
                        return false;
                    }
                    depth -= 1;
                }
                Some(Comma | RightArrow | Bar) if depth == 0 => return true,
                _ => {}
            }
            n += 1;
        }
    }

    pub fn aggregate_or_parenthesized(&mut self) {
        if self.at_aggregate() {
            self.aggregate();
            return;
        }
        self.start_node(ParenthesizedExpression);
        self.expect_token(LeftPar);
        self.expression_or_range();
        self.expect_token(RightPar);
        self.end_node();
    }

    fn aggregate(&mut self) {
        self.start_node(Aggregate);
        self.expect_token(LeftPar);
        loop {
            self.start_node(ElementAssociation);
            if self.at_kw(Kw::Others) || self.lookahead_at_depth_zero(RightArrow) {
                self.choices();
                self.expect_token(RightArrow);
            }
            self.expression_or_range();
            self.end_node();
            if !self.opt_token(Comma) {
                break;
            }
        }
        self.expect_token(RightPar);
        self.end_node();
    }

    pub fn choices(&mut self) {
        self.start_node(Choices);
        loop {
            if !self.opt_kw(Kw::Others) {
                self.expression_or_range();
            }
            if !self.opt_token(Bar) {
                break;
            }
        }
        self.end_node();
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::{parse_fn, tree};
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn precedence_of_binary_operators() {
        assert_eq!(
            tree("a + b * c = d and e", Parser::expression),
            "\
BinaryExpression
  BinaryExpression
    BinaryExpression
      SimpleName
        Identifier 'a'
      Plus
      BinaryExpression
        SimpleName
          Identifier 'b'
        Times
        SimpleName
          Identifier 'c'
    EQ
    SimpleName
      Identifier 'd'
  Keyword(And)
  SimpleName
    Identifier 'e'
"
        );
    }

    #[test]
    fn left_associative_adding_operators() {
        assert_eq!(
            tree("a - b - c", Parser::expression),
            "\
BinaryExpression
  BinaryExpression
    SimpleName
      Identifier 'a'
    Minus
    SimpleName
      Identifier 'b'
  Minus
  SimpleName
    Identifier 'c'
"
        );
    }

    #[test]
    fn names_with_suffixes() {
        assert_eq!(
            tree("work.pkg.f(x)'length", Parser::expression),
            "\
AttributeName
  CallOrIndex
    SelectedName
      SelectedName
        SimpleName
          Identifier 'work'
        Dot
        Identifier 'pkg'
      Dot
      Identifier 'f'
    AssociationList
      LeftPar
      AssociationElement
        SimpleName
          Identifier 'x'
      RightPar
  Tick
  Identifier 'length'
"
        );
    }

    #[test]
    fn qualified_expression_and_named_association() {
        assert_eq!(
            tree("f(a => t'(b), c => open)", Parser::expression),
            "\
CallOrIndex
  SimpleName
    Identifier 'f'
  AssociationList
    LeftPar
    AssociationElement
      SimpleName
        Identifier 'a'
      RightArrow
      QualifiedExpression
        SimpleName
          Identifier 't'
        Tick
        ParenthesizedExpression
          LeftPar
          SimpleName
            Identifier 'b'
          RightPar
    Comma
    AssociationElement
      SimpleName
        Identifier 'c'
      RightArrow
      Keyword(Open)
    RightPar
"
        );
    }

    #[test]
    fn aggregate_with_choices() {
        assert_eq!(
            tree("(0 | 1 => '1', others => '0')", Parser::expression),
            "\
Aggregate
  LeftPar
  ElementAssociation
    Choices
      Literal
        AbstractLiteral '0'
      Bar
      Literal
        AbstractLiteral '1'
    RightArrow
    Literal
      CharacterLiteral ''1''
  Comma
  ElementAssociation
    Choices
      Keyword(Others)
    RightArrow
    Literal
      CharacterLiteral ''0''
  RightPar
"
        );
    }

    #[test]
    fn sign_binds_to_first_term() {
        assert_eq!(
            tree("-a * b", Parser::expression),
            "\
UnaryExpression
  Minus
  BinaryExpression
    SimpleName
      Identifier 'a'
    Times
    SimpleName
      Identifier 'b'
"
        );
    }

    #[test]
    fn physical_literal() {
        assert_eq!(
            tree("10 ns", Parser::expression),
            "\
PhysicalLiteral
  AbstractLiteral '10'
  Identifier 'ns'
"
        );
    }

    #[test]
    fn missing_operand_is_reported() {
        let (_, diagnostics) = parse_fn("a + ;", Parser::expression);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].text_pos, 4);
    }
}
