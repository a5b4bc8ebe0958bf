// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
/// Parsing of sequential statements
use crate::parser::builder::Checkpoint;
use crate::parser::diagnostics::ParserError;
use crate::parser::Parser;
use crate::syntax::node_kind::NodeKind::{self, *};
use crate::tokens::token_kind::Keyword as Kw;
use crate::tokens::token_kind::TokenKind::*;
use crate::tokens::TokenStream;

impl<T: TokenStream> Parser<T> {
    pub fn sequential_statements(&mut self) {
        self.start_node(SequentialStatements);
        loop {
            match self.peek_kind() {
                None
                | Some(Eof)
                | Some(Keyword(Kw::End | Kw::Elsif | Kw::Else | Kw::When)) => break,
                _ => {}
            }
            let before = self.position();
            self.sequential_statement();
            if self.position() == before {
                self.skip_erroneous_token();
            }
        }
        self.end_node();
    }

    pub fn sequential_statement(&mut self) {
        let checkpoint = self.checkpoint();
        self.opt_label();
        match self.peek_kind() {
            Some(Keyword(Kw::If)) => self.if_statement(checkpoint),
            Some(Keyword(Kw::Case)) => self.case_statement(checkpoint),
            Some(Keyword(Kw::While | Kw::For | Kw::Loop)) => self.loop_statement(checkpoint),
            Some(Keyword(Kw::Next)) => self.next_or_exit(checkpoint, NextStatement),
            Some(Keyword(Kw::Exit)) => self.next_or_exit(checkpoint, ExitStatement),
            Some(Keyword(Kw::Return)) => {
                self.start_node_at(checkpoint, ReturnStatement);
                self.skip();
                if !self.at(SemiColon) {
                    self.expression();
                }
                self.end_statement();
            }
            Some(Keyword(Kw::Null)) => {
                self.start_node_at(checkpoint, NullStatement);
                self.skip();
                self.end_statement();
            }
            Some(Keyword(Kw::Wait)) => self.wait_statement(checkpoint),
            Some(Keyword(Kw::Assert)) => self.assert_statement(checkpoint),
            Some(Keyword(Kw::Report)) => {
                self.start_node_at(checkpoint, ReportStatement);
                self.skip();
                self.expression();
                if self.opt_kw(Kw::Severity) {
                    self.expression();
                }
                self.end_statement();
            }
            Some(Keyword(Kw::With)) => self.selected_signal_assignment(checkpoint),
            Some(Identifier | LtLt | LeftPar | StringLiteral) => {
                self.assignment_or_call(checkpoint)
            }
            _ => {
                self.error(ParserError::ExpectingStatement);
                self.recover_statement();
            }
        }
    }

    /// Expects the final semicolon and closes the statement node
    fn end_statement(&mut self) {
        if !self.expect_token(SemiColon) {
            self.recover_statement();
        }
        self.end_node();
    }

    fn assignment_or_call(&mut self, checkpoint: Checkpoint) {
        if self.at(LeftPar) {
            self.aggregate_or_parenthesized();
        } else {
            self.name();
        }
        match self.peek_kind() {
            Some(ColonEq) => {
                self.start_node_at(checkpoint, VariableAssignment);
                self.skip();
                self.expression();
                while self.opt_kw(Kw::When) {
                    self.expression();
                    if self.opt_kw(Kw::Else) {
                        self.expression();
                    }
                }
                self.end_statement();
            }
            Some(LTE) => {
                self.start_node_at(checkpoint, SignalAssignment);
                self.signal_assignment_tail();
                self.end_node();
            }
            _ => {
                self.start_node_at(checkpoint, ProcedureCall);
                if !self.at(SemiColon) {
                    self.expect_tokens_err([ColonEq, LTE, SemiColon]);
                }
                self.end_statement();
            }
        }
    }

    fn if_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, IfStatement);
        loop {
            if self.at_kw(Kw::Else) {
                self.start_node(ElseBranch);
                self.skip();
                self.sequential_statements();
                self.end_node();
                break;
            }
            self.start_node(ConditionalBranch);
            self.skip();
            self.expression();
            self.expect_kw(Kw::Then);
            self.sequential_statements();
            self.end_node();
            if !(self.at_kw(Kw::Elsif) || self.at_kw(Kw::Else)) {
                break;
            }
        }
        self.expect_kw(Kw::End);
        self.expect_kw(Kw::If);
        self.opt_identifier();
        self.end_statement();
    }

    fn case_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, CaseStatement);
        self.expect_kw(Kw::Case);
        self.opt_token(Que);
        self.expression();
        self.expect_kw(Kw::Is);
        while self.at_kw(Kw::When) {
            self.start_node(CaseAlternative);
            self.skip();
            self.choices();
            self.expect_token(RightArrow);
            self.sequential_statements();
            self.end_node();
        }
        self.expect_kw(Kw::End);
        self.expect_kw(Kw::Case);
        self.opt_token(Que);
        self.opt_identifier();
        self.end_statement();
    }

    fn loop_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, LoopStatement);
        if self.at_kw(Kw::While) {
            self.start_node(WhileScheme);
            self.skip();
            self.expression();
            self.end_node();
        } else if self.at_kw(Kw::For) {
            self.for_scheme();
        }
        self.expect_kw(Kw::Loop);
        self.sequential_statements();
        self.expect_kw(Kw::End);
        self.expect_kw(Kw::Loop);
        self.opt_identifier();
        self.end_statement();
    }

    fn next_or_exit(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        self.start_node_at(checkpoint, kind);
        self.skip();
        self.opt_identifier();
        if self.opt_kw(Kw::When) {
            self.expression();
        }
        self.end_statement();
    }

    fn wait_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, WaitStatement);
        self.expect_kw(Kw::Wait);
        if self.opt_kw(Kw::On) {
            self.start_node(SensitivityList);
            self.name();
            while self.opt_token(Comma) {
                self.name();
            }
            self.end_node();
        }
        if self.opt_kw(Kw::Until) {
            self.expression();
        }
        if self.opt_kw(Kw::For) {
            self.expression();
        }
        self.end_statement();
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::{parse_fn, tree};
    use crate::parser::Parser;
    use crate::syntax::NodeKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn if_elsif_else() {
        assert_eq!(
            tree(
                "if a then x := 1; elsif b then null; else return; end if;",
                Parser::sequential_statement
            ),
            "\
IfStatement
  ConditionalBranch
    Keyword(If)
    SimpleName
      Identifier 'a'
    Keyword(Then)
    SequentialStatements
      VariableAssignment
        SimpleName
          Identifier 'x'
        ColonEq
        Literal
          AbstractLiteral '1'
        SemiColon
  ConditionalBranch
    Keyword(Elsif)
    SimpleName
      Identifier 'b'
    Keyword(Then)
    SequentialStatements
      NullStatement
        Keyword(Null)
        SemiColon
  ElseBranch
    Keyword(Else)
    SequentialStatements
      ReturnStatement
        Keyword(Return)
        SemiColon
  Keyword(End)
  Keyword(If)
  SemiColon
"
        );
    }

    #[test]
    fn case_statement() {
        assert_eq!(
            tree(
                "case s is when 0 | 1 => null; when others => end case;",
                Parser::sequential_statement
            ),
            "\
CaseStatement
  Keyword(Case)
  SimpleName
    Identifier 's'
  Keyword(Is)
  CaseAlternative
    Keyword(When)
    Choices
      Literal
        AbstractLiteral '0'
      Bar
      Literal
        AbstractLiteral '1'
    RightArrow
    SequentialStatements
      NullStatement
        Keyword(Null)
        SemiColon
  CaseAlternative
    Keyword(When)
    Choices
      Keyword(Others)
    RightArrow
    SequentialStatements
  Keyword(End)
  Keyword(Case)
  SemiColon
"
        );
    }

    #[test]
    fn loops_and_jumps() {
        assert_eq!(
            tree(
                "l: for i in v'range loop next l when i = 2; exit; end loop l;",
                Parser::sequential_statement
            ),
            "\
LoopStatement
  Label
    Identifier 'l'
    Colon
  ForScheme
    Keyword(For)
    Identifier 'i'
    Keyword(In)
    AttributeName
      SimpleName
        Identifier 'v'
      Tick
      Keyword(Range)
  Keyword(Loop)
  SequentialStatements
    NextStatement
      Keyword(Next)
      Identifier 'l'
      Keyword(When)
      BinaryExpression
        SimpleName
          Identifier 'i'
        EQ
        Literal
          AbstractLiteral '2'
      SemiColon
    ExitStatement
      Keyword(Exit)
      SemiColon
  Keyword(End)
  Keyword(Loop)
  Identifier 'l'
  SemiColon
"
        );
    }

    #[test]
    fn statement_kinds() {
        let (node, diagnostics) = parse_fn(
            "\
wait on a, b until c for 10 ns;
report \"x\" severity note;
s <= transport a after 1 ns, b after 2 ns;
f(1);
(a, b) := t;
while true loop end loop;
",
            Parser::sequential_statements,
        );
        assert_eq!(diagnostics, vec![]);
        assert_eq!(
            node.children().map(|stmt| stmt.kind()).collect::<Vec<_>>(),
            vec![
                NodeKind::WaitStatement,
                NodeKind::ReportStatement,
                NodeKind::SignalAssignment,
                NodeKind::ProcedureCall,
                NodeKind::VariableAssignment,
                NodeKind::LoopStatement,
            ]
        );
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let (node, diagnostics) = parse_fn("x := a y := 2;", Parser::sequential_statements);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].text_pos, 7);
        assert_eq!(node.to_string(), "x := a y := 2;");
    }
}
