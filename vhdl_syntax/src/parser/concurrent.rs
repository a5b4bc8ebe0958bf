// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c)  2024, Lukas Scheller lukasscheller@icloud.com
/// Parsing of concurrent statements and the signal assignments shared with sequential code
use crate::parser::builder::Checkpoint;
use crate::parser::diagnostics::ParserError;
use crate::parser::Parser;
use crate::syntax::node_kind::NodeKind::{self, *};
use crate::tokens::token_kind::Keyword as Kw;
use crate::tokens::token_kind::TokenKind::*;
use crate::tokens::TokenStream;

impl<T: TokenStream> Parser<T> {
    pub fn concurrent_statements(&mut self) {
        self.start_node(ConcurrentStatements);
        loop {
            match self.peek_kind() {
                None
                | Some(Eof)
                | Some(Keyword(Kw::End | Kw::Elsif | Kw::Else | Kw::When)) => break,
                _ => {}
            }
            let before = self.position();
            self.concurrent_statement();
            if self.position() == before {
                self.skip_erroneous_token();
            }
        }
        self.end_node();
    }

    /// `label :`
    pub(crate) fn opt_label(&mut self) {
        if self.at(Identifier) && self.nth(1) == Some(Colon) {
            self.start_node(Label);
            self.skip();
            self.skip();
            self.end_node();
        }
    }

    pub fn concurrent_statement(&mut self) {
        let checkpoint = self.checkpoint();
        self.opt_label();
        self.opt_kw(Kw::Postponed);
        match self.peek_kind() {
            Some(Keyword(Kw::Process)) => self.process_statement(checkpoint),
            Some(Keyword(Kw::Block)) => self.block_statement(checkpoint),
            Some(Keyword(Kw::For)) => self.for_generate_statement(checkpoint),
            Some(Keyword(Kw::If)) => self.if_generate_statement(checkpoint),
            Some(Keyword(Kw::Case)) => self.case_generate_statement(checkpoint),
            Some(Keyword(Kw::Component | Kw::Entity | Kw::Configuration)) => {
                self.start_node_at(checkpoint, ComponentInstantiation);
                self.start_node(InstantiatedUnit);
                self.skip();
                self.name();
                self.end_node();
                self.instantiation_tail();
                self.end_node();
            }
            Some(Keyword(Kw::Assert)) => self.assert_statement(checkpoint),
            Some(Keyword(Kw::With)) => self.selected_signal_assignment(checkpoint),
            Some(Identifier | LtLt | LeftPar | StringLiteral) => {
                self.name_led_statement(checkpoint)
            }
            _ => {
                self.error(ParserError::ExpectingStatement);
                self.recover_statement();
            }
        }
    }

    /// Statements starting with a name: instantiations, assignments and procedure calls
    fn name_led_statement(&mut self, checkpoint: Checkpoint) {
        let name_checkpoint = self.checkpoint();
        if self.at(LeftPar) {
            self.aggregate_or_parenthesized();
        } else {
            self.name();
        }
        match self.peek_kind() {
            Some(LTE) => {
                self.start_node_at(checkpoint, SignalAssignment);
                self.signal_assignment_tail();
                self.end_node();
            }
            Some(Keyword(Kw::Generic | Kw::Port)) => {
                self.start_node_at(name_checkpoint, InstantiatedUnit);
                self.end_node();
                self.start_node_at(checkpoint, ComponentInstantiation);
                self.instantiation_tail();
                self.end_node();
            }
            Some(SemiColon) => {
                self.start_node_at(checkpoint, ProcedureCall);
                self.skip();
                self.end_node();
            }
            _ => {
                self.start_node_at(checkpoint, ProcedureCall);
                self.expect_tokens_err([LTE, SemiColon]);
                self.recover_statement();
                self.end_node();
            }
        }
    }

    fn instantiation_tail(&mut self) {
        if self.at_kw(Kw::Generic) {
            self.map_aspect(GenericMapAspect);
        }
        if self.at_kw(Kw::Port) {
            self.map_aspect(PortMapAspect);
        }
        if !self.expect_token(SemiColon) {
            self.recover_statement();
        }
    }

    /// `generic map ( ... )` or `port map ( ... )`
    pub fn map_aspect(&mut self, kind: NodeKind) {
        self.start_node(kind);
        self.skip();
        self.expect_kw(Kw::Map);
        self.association_list();
        self.end_node();
    }

    fn process_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, ProcessStatement);
        self.expect_kw(Kw::Process);
        if self.at(LeftPar) {
            self.start_node(SensitivityList);
            self.skip();
            if !self.opt_kw(Kw::All) {
                self.name();
                while self.opt_token(Comma) {
                    self.name();
                }
            }
            self.expect_token(RightPar);
            self.end_node();
        }
        self.opt_kw(Kw::Is);
        self.declarative_part();
        self.expect_kw(Kw::Begin);
        self.sequential_statements();
        self.expect_kw(Kw::End);
        self.opt_kw(Kw::Postponed);
        self.expect_kw(Kw::Process);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    fn block_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, BlockStatement);
        self.expect_kw(Kw::Block);
        if self.at(LeftPar) {
            self.aggregate_or_parenthesized();
        }
        self.opt_kw(Kw::Is);
        if self.at_kw(Kw::Generic) {
            self.generic_clause();
            if self.at_kw(Kw::Generic) {
                self.map_aspect(GenericMapAspect);
                self.expect_token(SemiColon);
            }
        }
        if self.at_kw(Kw::Port) {
            self.port_clause();
            if self.at_kw(Kw::Port) {
                self.map_aspect(PortMapAspect);
                self.expect_token(SemiColon);
            }
        }
        self.declarative_part();
        self.expect_kw(Kw::Begin);
        self.concurrent_statements();
        self.expect_kw(Kw::End);
        self.expect_kw(Kw::Block);
        self.opt_identifier();
        self.expect_token(SemiColon);
        self.end_node();
    }

    /// `for i in range`
    pub(crate) fn for_scheme(&mut self) {
        self.start_node(ForScheme);
        self.expect_kw(Kw::For);
        self.expect_token(Identifier);
        self.expect_kw(Kw::In);
        self.expression_or_range();
        self.end_node();
    }

    fn generate_body(&mut self) {
        self.start_node(GenerateBody);
        if (self.at_declaration_start() && !self.at_kw(Kw::For)) || self.at_kw(Kw::Begin) {
            self.declarative_part();
            self.expect_kw(Kw::Begin);
        }
        self.concurrent_statements();
        if self.at_kw(Kw::End) && !self.nth_is_kw(1, Kw::Generate) {
            self.skip();
            self.opt_identifier();
            self.expect_token(SemiColon);
        }
        self.end_node();
    }

    fn end_generate(&mut self) {
        self.expect_kw(Kw::End);
        self.expect_kw(Kw::Generate);
        self.opt_identifier();
        self.expect_token(SemiColon);
    }

    fn opt_alternative_label(&mut self) {
        if self.at(Identifier) && self.nth(1) == Some(Colon) {
            self.skip();
            self.skip();
        }
    }

    fn for_generate_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, ForGenerateStatement);
        self.for_scheme();
        self.expect_kw(Kw::Generate);
        self.generate_body();
        self.end_generate();
        self.end_node();
    }

    fn if_generate_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, IfGenerateStatement);
        loop {
            self.start_node(GenerateBranch);
            let is_else = self.at_kw(Kw::Else);
            self.skip();
            self.opt_alternative_label();
            if !is_else {
                self.expression();
            }
            self.expect_kw(Kw::Generate);
            self.generate_body();
            self.end_node();
            if !(self.at_kw(Kw::Elsif) || self.at_kw(Kw::Else)) {
                break;
            }
        }
        self.end_generate();
        self.end_node();
    }

    fn case_generate_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, CaseGenerateStatement);
        self.expect_kw(Kw::Case);
        self.expression();
        self.expect_kw(Kw::Generate);
        while self.at_kw(Kw::When) {
            self.start_node(GenerateBranch);
            self.skip();
            self.opt_alternative_label();
            self.choices();
            self.expect_token(RightArrow);
            self.generate_body();
            self.end_node();
        }
        self.end_generate();
        self.end_node();
    }

    pub(crate) fn assert_statement(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, AssertStatement);
        self.expect_kw(Kw::Assert);
        self.expression();
        if self.opt_kw(Kw::Report) {
            self.expression();
        }
        if self.opt_kw(Kw::Severity) {
            self.expression();
        }
        if !self.expect_token(SemiColon) {
            self.recover_statement();
        }
        self.end_node();
    }

    fn opt_delay_mechanism(&mut self) {
        if self.at_kw(Kw::Transport) || self.at_kw(Kw::Inertial) || self.at_kw(Kw::Reject) {
            self.start_node(DelayMechanism);
            if self.opt_kw(Kw::Reject) {
                self.expression();
                self.expect_kw(Kw::Inertial);
            } else {
                self.skip();
            }
            self.end_node();
        }
    }

    pub(crate) fn waveform(&mut self) {
        self.start_node(Waveform);
        if !self.opt_kw(Kw::Unaffected) {
            loop {
                self.start_node(WaveformElement);
                self.expression();
                if self.opt_kw(Kw::After) {
                    self.expression();
                }
                self.end_node();
                if !self.opt_token(Comma) {
                    break;
                }
            }
        }
        self.end_node();
    }

    /// Everything after the target of a signal assignment, starting at `<=`
    pub(crate) fn signal_assignment_tail(&mut self) {
        self.expect_token(LTE);
        self.opt_kw(Kw::Guarded);
        self.opt_delay_mechanism();
        loop {
            self.start_node(ConditionalWaveform);
            self.waveform();
            if self.opt_kw(Kw::When) {
                self.expression();
            }
            self.end_node();
            if !self.opt_kw(Kw::Else) {
                break;
            }
        }
        if !self.expect_token(SemiColon) {
            self.recover_statement();
        }
    }

    pub(crate) fn selected_signal_assignment(&mut self, checkpoint: Checkpoint) {
        self.start_node_at(checkpoint, SelectedSignalAssignment);
        self.expect_kw(Kw::With);
        self.expression();
        self.expect_kw(Kw::Select);
        self.opt_token(Que);
        if self.at(LeftPar) {
            self.aggregate_or_parenthesized();
        } else {
            self.name();
        }
        self.expect_token(LTE);
        self.opt_kw(Kw::Guarded);
        self.opt_delay_mechanism();
        loop {
            self.start_node(SelectedWaveform);
            self.waveform();
            self.expect_kw(Kw::When);
            self.choices();
            self.end_node();
            if !self.opt_token(Comma) {
                break;
            }
        }
        if !self.expect_token(SemiColon) {
            self.recover_statement();
        }
        self.end_node();
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::test_util::{parse_fn, tree};
    use crate::parser::Parser;
    use crate::syntax::NodeKind;
    use pretty_assertions::assert_eq;

    fn statement_kinds(code: &str) -> Vec<NodeKind> {
        let (node, diagnostics) = parse_fn(code, Parser::concurrent_statements);
        assert_eq!(diagnostics, vec![]);
        node.children().map(|stmt| stmt.kind()).collect()
    }

    #[test]
    fn conditional_signal_assignment() {
        assert_eq!(
            tree(
                "q <= a when en = '1' else 'Z';",
                Parser::concurrent_statement,
            ),
            "\
SignalAssignment
  SimpleName
    Identifier 'q'
  LTE
  ConditionalWaveform
    Waveform
      WaveformElement
        SimpleName
          Identifier 'a'
    Keyword(When)
    BinaryExpression
      SimpleName
        Identifier 'en'
      EQ
      Literal
        CharacterLiteral ''1''
  Keyword(Else)
  ConditionalWaveform
    Waveform
      WaveformElement
        Literal
          CharacterLiteral ''Z''
  SemiColon
"
        );
    }

    #[test]
    fn labelled_component_instantiation() {
        assert_eq!(
            tree("u1 : foo port map (a => b);", Parser::concurrent_statement),
            "\
ComponentInstantiation
  Label
    Identifier 'u1'
    Colon
  InstantiatedUnit
    SimpleName
      Identifier 'foo'
  PortMapAspect
    Keyword(Port)
    Keyword(Map)
    AssociationList
      LeftPar
      AssociationElement
        SimpleName
          Identifier 'a'
        RightArrow
        SimpleName
          Identifier 'b'
      RightPar
  SemiColon
"
        );
    }

    #[test]
    fn process_with_sensitivity_list() {
        assert_eq!(
            tree(
                "p: process (clk) is begin null; end process p;",
                Parser::concurrent_statement
            ),
            "\
ProcessStatement
  Label
    Identifier 'p'
    Colon
  Keyword(Process)
  SensitivityList
    LeftPar
    SimpleName
      Identifier 'clk'
    RightPar
  Keyword(Is)
  DeclarativePart
  Keyword(Begin)
  SequentialStatements
    NullStatement
      Keyword(Null)
      SemiColon
  Keyword(End)
  Keyword(Process)
  Identifier 'p'
  SemiColon
"
        );
    }

    #[test]
    fn statement_dispatch() {
        assert_eq!(
            statement_kinds(
                "\
u0 : entity work.ent(rtl) generic map (w => 8);
gen : for i in 0 to 3 generate
  signal s : bit;
begin
  s <= '0';
end generate;
g2 : if c generate
  x <= y;
elsif d generate
else generate
end generate g2;
blk : block is begin end block;
with sel select y <= a when \"00\", b when others;
assert x report \"msg\" severity error;
proc(a, b);
"
            ),
            vec![
                NodeKind::ComponentInstantiation,
                NodeKind::ForGenerateStatement,
                NodeKind::IfGenerateStatement,
                NodeKind::BlockStatement,
                NodeKind::SelectedSignalAssignment,
                NodeKind::AssertStatement,
                NodeKind::ProcedureCall,
            ]
        );
    }

    #[test]
    fn case_generate_with_alternatives() {
        let (node, diagnostics) = parse_fn(
            "\
g : case mode generate
  when a1: 0 | 1 => x <= y;
  when others => end generate;",
            Parser::concurrent_statement,
        );
        assert_eq!(diagnostics, vec![]);
        assert_eq!(
            node.children_of_kind(NodeKind::GenerateBranch).count(),
            2
        );
    }

    #[test]
    fn invalid_statement_recovers() {
        let (node, diagnostics) = parse_fn(
            "begin x <= y; z <= w;",
            Parser::concurrent_statements,
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            node.children_of_kind(NodeKind::SignalAssignment).count(),
            2
        );
    }
}
