// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

//! Conversion of syntax nodes into expressions and subtype indications

use crate::data::{Contents, Source, SrcPos, SymbolTable};
use crate::declaration::Designator;
use crate::expression::ast::*;
use std::ops;
use std::sync::Arc;
use vhdl_syntax::{Keyword as Kw, NodeKind, SyntaxElement, SyntaxNode, SyntaxToken, TokenKind};

pub(crate) struct Lowering<'a> {
    pub source: &'a Source,
    pub contents: &'a Contents,
    pub symbols: &'a SymbolTable,
}

/// The first child node following a token of the given kind
pub(crate) fn is_token(element: &SyntaxElement, kind: TokenKind) -> bool {
    matches!(element, SyntaxElement::Token(token) if token.kind() == kind)
}

pub(crate) fn node_after(node: &SyntaxNode, kind: TokenKind) -> Option<SyntaxNode> {
    node.children_with_tokens()
        .skip_while(|child| !is_token(child, kind))
        .find_map(SyntaxElement::into_node)
}

fn operator_of(kind: TokenKind) -> Option<Operator> {
    use Operator::*;
    Some(match kind {
        TokenKind::Keyword(Kw::And) => And,
        TokenKind::Keyword(Kw::Or) => Or,
        TokenKind::Keyword(Kw::Nand) => Nand,
        TokenKind::Keyword(Kw::Nor) => Nor,
        TokenKind::Keyword(Kw::Xor) => Xor,
        TokenKind::Keyword(Kw::Xnor) => Xnor,
        TokenKind::Keyword(Kw::Sll) => Sll,
        TokenKind::Keyword(Kw::Srl) => Srl,
        TokenKind::Keyword(Kw::Sla) => Sla,
        TokenKind::Keyword(Kw::Sra) => Sra,
        TokenKind::Keyword(Kw::Rol) => Rol,
        TokenKind::Keyword(Kw::Ror) => Ror,
        TokenKind::Keyword(Kw::Mod) => Mod,
        TokenKind::Keyword(Kw::Rem) => Rem,
        TokenKind::Keyword(Kw::Abs) => Abs,
        TokenKind::Keyword(Kw::Not) => Not,
        TokenKind::EQ => EQ,
        TokenKind::NE => NE,
        TokenKind::LT => LT,
        TokenKind::LTE => LTE,
        TokenKind::GT => GT,
        TokenKind::GTE => GTE,
        TokenKind::QueEQ => QueEQ,
        TokenKind::QueNE => QueNE,
        TokenKind::QueLT => QueLT,
        TokenKind::QueLTE => QueLTE,
        TokenKind::QueGT => QueGT,
        TokenKind::QueGTE => QueGTE,
        TokenKind::QueQue => QueQue,
        TokenKind::Plus => Plus,
        TokenKind::Minus => Minus,
        TokenKind::Concat => Concat,
        TokenKind::Times => Times,
        TokenKind::Div => Div,
        TokenKind::Pow => Pow,
        _ => return None,
    })
}

/// The contents of a string literal token without the enclosing quotes
pub(crate) fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(text);
    inner.replace("\"\"", "\"")
}

fn digit_value(chr: char) -> Option<u32> {
    chr.to_digit(16)
}

/// Parses decimal and based abstract literals such as `1_000`, `1.5e3` and `16#FF#`
pub(crate) fn parse_abstract_literal(text: &str) -> Option<Literal> {
    let text = text.replace('_', "");
    if let Some((base, rest)) = text.split_once('#') {
        let base: u32 = base.parse().ok()?;
        if !(2..=16).contains(&base) {
            return None;
        }
        let (digits, exponent) = rest.split_once('#')?;
        let exponent: i32 = match exponent.trim_start_matches(['e', 'E']) {
            "" => 0,
            exp => exp.trim_start_matches('+').parse().ok()?,
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        let mut value = 0f64;
        for chr in int_part.chars() {
            let digit = digit_value(chr).filter(|digit| *digit < base)?;
            value = value * f64::from(base) + f64::from(digit);
        }
        let is_real = digits.contains('.');
        let mut scale = 1.0 / f64::from(base);
        for chr in frac_part.chars() {
            let digit = digit_value(chr).filter(|digit| *digit < base)?;
            value += f64::from(digit) * scale;
            scale /= f64::from(base);
        }
        let value = value * f64::from(base).powi(exponent);
        return Some(if is_real || exponent < 0 {
            Literal::Real(value)
        } else {
            Literal::Integer(value as i64)
        });
    }

    let lower = text.to_ascii_lowercase();
    let (mantissa, exponent) = match lower.split_once('e') {
        Some((mantissa, exponent)) => (
            mantissa,
            exponent.trim_start_matches('+').parse::<i32>().ok()?,
        ),
        None => (lower.as_str(), 0),
    };
    if mantissa.contains('.') || exponent < 0 {
        let value: f64 = mantissa.parse().ok()?;
        Some(Literal::Real(value * 10f64.powi(exponent)))
    } else {
        let value: i64 = mantissa.parse().ok()?;
        let scale = 10i64.checked_pow(u32::try_from(exponent).ok()?)?;
        Some(Literal::Integer(value.checked_mul(scale)?))
    }
}

/// Expands a bit string literal such as `4UX"F"` or `b"1_0"` to one character per bit
pub(crate) fn expand_bit_string(text: &str) -> Option<String> {
    let quote = text.find('"')?;
    let prefix = &text[..quote];
    let value = unquote(&text[quote..]).replace('_', "");
    let specifier_start = prefix.find(|chr: char| chr.is_ascii_alphabetic())?;
    let length: Option<usize> = match &prefix[..specifier_start] {
        "" => None,
        length => Some(length.parse().ok()?),
    };
    let specifier = prefix[specifier_start..].to_ascii_lowercase();
    let (signed, base) = match specifier.as_str() {
        "b" | "ub" => (false, 'b'),
        "o" | "uo" => (false, 'o'),
        "x" | "ux" => (false, 'x'),
        "sb" => (true, 'b'),
        "so" => (true, 'o'),
        "sx" => (true, 'x'),
        "d" => (false, 'd'),
        _ => return None,
    };

    let bits = match base {
        'b' => value,
        'd' => {
            let number: u128 = value.parse().ok()?;
            let bits = format!("{number:b}");
            if number == 0 {
                "0".to_owned()
            } else {
                bits
            }
        }
        _ => {
            let width = if base == 'o' { 3 } else { 4 };
            let mut bits = String::new();
            for chr in value.chars() {
                match chr.to_digit(if base == 'o' { 8 } else { 16 }) {
                    Some(digit) => bits.push_str(&format!("{digit:0width$b}")),
                    None => bits.extend(std::iter::repeat(chr).take(width)),
                }
            }
            bits
        }
    };

    let Some(length) = length else {
        return Some(bits);
    };
    let current = bits.chars().count();
    if current >= length {
        Some(bits.chars().skip(current - length).collect())
    } else {
        let fill = if signed {
            bits.chars().next().unwrap_or('0')
        } else {
            '0'
        };
        let mut padded: String = std::iter::repeat(fill).take(length - current).collect();
        padded.push_str(&bits);
        Some(padded)
    }
}

impl Lowering<'_> {
    pub fn pos(&self, span: ops::Range<usize>) -> SrcPos {
        SrcPos::new(self.source.clone(), self.contents.range_of(span))
    }

    pub fn node_pos(&self, node: &SyntaxNode) -> SrcPos {
        self.pos(node.text_range())
    }

    pub fn token_pos(&self, token: &SyntaxToken) -> SrcPos {
        self.pos(token.text_range())
    }

    /// The designator of an identifier, operator symbol or character literal token
    pub fn designator(&self, token: &SyntaxToken) -> Designator {
        match token.kind() {
            TokenKind::Identifier => Designator::Identifier(self.symbols.insert(token.text())),
            TokenKind::StringLiteral => {
                Designator::OperatorSymbol(Arc::from(unquote(token.text()).to_lowercase()))
            }
            TokenKind::CharacterLiteral => token
                .text()
                .chars()
                .nth(1)
                .map(Designator::Character)
                .unwrap_or(Designator::Anonymous),
            _ => Designator::Anonymous,
        }
    }

    fn unknown(&self, node: &SyntaxNode) -> Expr {
        Expr::new(ExprKind::Unknown, self.node_pos(node))
    }

    pub fn opt_expr(&self, node: Option<&SyntaxNode>) -> Option<Expr> {
        node.map(|node| self.expr(node))
    }

    pub fn expr(&self, node: &SyntaxNode) -> Expr {
        let pos = self.node_pos(node);
        let kind = match node.kind() {
            NodeKind::SimpleName => match node.first_token() {
                Some(token) => ExprKind::Name(self.designator(&token)),
                None => ExprKind::Unknown,
            },
            NodeKind::Literal => match node.first_token() {
                Some(token) => self.literal(&token),
                None => ExprKind::Unknown,
            },
            NodeKind::PhysicalLiteral => {
                let value = node
                    .token_of_kind(TokenKind::AbstractLiteral)
                    .and_then(|token| parse_abstract_literal(token.text()));
                let unit = node.token_of_kind(TokenKind::Identifier);
                match (value, unit) {
                    (Some(value), Some(unit)) => {
                        let value = match value {
                            Literal::Integer(value) => value as f64,
                            Literal::Real(value) => value,
                            _ => 0.0,
                        };
                        ExprKind::Literal(Literal::Physical {
                            value,
                            unit: self.designator(&unit),
                        })
                    }
                    _ => ExprKind::Unknown,
                }
            }
            NodeKind::SelectedName => {
                let prefix = node.first_child().map(|prefix| self.expr(&prefix));
                let suffix = node
                    .tokens()
                    .skip_while(|token| token.kind() != TokenKind::Dot)
                    .nth(1);
                match (prefix, suffix) {
                    (Some(prefix), Some(suffix)) => {
                        let suffix_pos = self.token_pos(&suffix);
                        let suffix = if suffix.kind() == TokenKind::Keyword(Kw::All) {
                            Suffix::All(suffix_pos)
                        } else {
                            Suffix::Designator(self.designator(&suffix), suffix_pos)
                        };
                        ExprKind::Selected(Box::new(prefix), suffix)
                    }
                    _ => ExprKind::Unknown,
                }
            }
            NodeKind::CallOrIndex => {
                let prefix = node.first_child().map(|prefix| self.expr(&prefix));
                let args = node
                    .child_of_kind(NodeKind::AssociationList)
                    .map(|list| self.association_list(&list))
                    .unwrap_or_default();
                match prefix {
                    Some(prefix) => ExprKind::CallOrIndex(Box::new(prefix), args),
                    None => ExprKind::Unknown,
                }
            }
            NodeKind::AttributeName => {
                let prefix = node.first_child().map(|prefix| self.expr(&prefix));
                let designator = node
                    .tokens()
                    .skip_while(|token| token.kind() != TokenKind::Tick)
                    .nth(1);
                match (prefix, designator) {
                    (Some(prefix), Some(designator)) => ExprKind::Attribute(
                        Box::new(prefix),
                        designator.text().to_ascii_lowercase(),
                    ),
                    _ => ExprKind::Unknown,
                }
            }
            NodeKind::QualifiedExpression => {
                let mut children = node.children();
                match (children.next(), children.next()) {
                    (Some(mark), Some(operand)) => ExprKind::Qualified(
                        Box::new(self.expr(&mark)),
                        Box::new(self.expr(&operand)),
                    ),
                    _ => ExprKind::Unknown,
                }
            }
            NodeKind::BinaryExpression => {
                let mut children = node.children();
                let op = node.tokens().find_map(|token| operator_of(token.kind()));
                match (children.next(), op, children.next()) {
                    (Some(left), Some(op), Some(right)) => ExprKind::Binary(
                        op,
                        Box::new(self.expr(&left)),
                        Box::new(self.expr(&right)),
                    ),
                    _ => ExprKind::Unknown,
                }
            }
            NodeKind::UnaryExpression => {
                let op = node.tokens().find_map(|token| operator_of(token.kind()));
                match (op, node.first_child()) {
                    (Some(op), Some(operand)) => ExprKind::Unary(op, Box::new(self.expr(&operand))),
                    _ => ExprKind::Unknown,
                }
            }
            NodeKind::ParenthesizedExpression => {
                return match node.first_child() {
                    Some(inner) => self.expr(&inner),
                    None => self.unknown(node),
                };
            }
            NodeKind::Aggregate => ExprKind::Aggregate(
                node.children_of_kind(NodeKind::ElementAssociation)
                    .map(|assoc| self.element_association(&assoc))
                    .collect(),
            ),
            NodeKind::Range => {
                let mut children = node.children();
                let direction = if node.has_token(TokenKind::Keyword(Kw::Downto)) {
                    Direction::Descending
                } else {
                    Direction::Ascending
                };
                match (children.next(), children.next()) {
                    (Some(left), Some(right)) => ExprKind::Range(
                        Box::new(self.expr(&left)),
                        direction,
                        Box::new(self.expr(&right)),
                    ),
                    _ => ExprKind::Unknown,
                }
            }
            NodeKind::SubtypeIndication => {
                // `integer range 0 to 7` used as a discrete range
                let ind = self.subtype_indication(node);
                match ind.constraint {
                    Some(Constraint::Range(range)) => {
                        ExprKind::SubtypeRange(Box::new(ind.type_mark), Box::new(range))
                    }
                    _ => return ind.type_mark,
                }
            }
            NodeKind::Allocator => match node.first_child() {
                Some(operand) => ExprKind::Allocator(Box::new(self.expr(&operand))),
                None => ExprKind::Unknown,
            },
            _ => ExprKind::Unknown,
        };
        Expr::new(kind, pos)
    }

    fn literal(&self, token: &SyntaxToken) -> ExprKind {
        let literal = match token.kind() {
            TokenKind::AbstractLiteral => parse_abstract_literal(token.text()),
            TokenKind::StringLiteral => Some(Literal::String(unquote(token.text()))),
            TokenKind::BitStringLiteral => expand_bit_string(token.text()).map(Literal::BitString),
            TokenKind::CharacterLiteral => token.text().chars().nth(1).map(Literal::Character),
            TokenKind::Keyword(Kw::Null) => Some(Literal::Null),
            _ => None,
        };
        literal.map(ExprKind::Literal).unwrap_or(ExprKind::Unknown)
    }

    pub fn association_list(&self, list: &SyntaxNode) -> Vec<Assoc> {
        list.children_of_kind(NodeKind::AssociationElement)
            .map(|element| {
                let has_formal = element.has_token(TokenKind::RightArrow);
                let mut nodes = element.children();
                let formal = if has_formal {
                    nodes.next().map(|formal| self.expr(&formal))
                } else {
                    None
                };
                let actual = match nodes.next() {
                    Some(actual) => self.expr(&actual),
                    None => {
                        let kind = if element.has_token(TokenKind::Keyword(Kw::Open)) {
                            ExprKind::Open
                        } else {
                            ExprKind::Unknown
                        };
                        Expr::new(kind, self.node_pos(&element))
                    }
                };
                Assoc { formal, actual }
            })
            .collect()
    }

    fn element_association(&self, assoc: &SyntaxNode) -> ElementAssoc {
        let choices = assoc
            .child_of_kind(NodeKind::Choices)
            .map(|choices| self.choices(&choices))
            .unwrap_or_default();
        let value = assoc
            .children()
            .find(|child| child.kind() != NodeKind::Choices)
            .map(|value| self.expr(&value))
            .unwrap_or_else(|| self.unknown(assoc));
        ElementAssoc { choices, value }
    }

    /// The alternatives of a choice list, `others` included
    pub fn choices(&self, choices: &SyntaxNode) -> Vec<Expr> {
        choices
            .children_with_tokens()
            .filter_map(|child| match child {
                SyntaxElement::Node(node) => Some(self.expr(&node)),
                SyntaxElement::Token(token) if token.kind() == TokenKind::Keyword(Kw::Others) => {
                    Some(Expr::new(ExprKind::Others, self.token_pos(&token)))
                }
                SyntaxElement::Token(_) => None,
            })
            .collect()
    }

    pub fn subtype_indication(&self, node: &SyntaxNode) -> SubtypeInd {
        let pos = self.node_pos(node);
        let names: Vec<SyntaxNode> = node
            .children()
            .filter(|child| child.kind().is_expression())
            .collect();
        let (resolution, mark) = match names.as_slice() {
            [resolution, mark, ..] => (Some(self.expr(resolution)), self.expr(mark)),
            [mark] => (None, self.expr(mark)),
            [] => (None, Expr::new(ExprKind::Unknown, pos.clone())),
        };
        let resolution = resolution.or_else(|| {
            node.child_of_kind(NodeKind::ResolutionIndication)
                .map(|res| Expr::new(ExprKind::Unknown, self.node_pos(&res)))
        });

        let mut constraint = None;
        if let Some(range) = node.child_of_kind(NodeKind::RangeConstraint) {
            let range = range
                .first_child()
                .map(|range| self.expr(&range))
                .unwrap_or_else(|| self.unknown(&range));
            constraint = Some(Constraint::Range(range));
        } else if let Some(index) = node.child_of_kind(NodeKind::IndexConstraint) {
            constraint = Some(Constraint::Index(
                index.children().map(|range| self.expr(&range)).collect(),
            ));
        }

        // An index constraint directly following the type mark is parsed as a call
        let type_mark = match (constraint.is_none(), mark.kind) {
            (true, ExprKind::CallOrIndex(prefix, args)) => {
                constraint = Some(Constraint::Index(
                    args.into_iter().map(|assoc| assoc.actual).collect(),
                ));
                *prefix
            }
            (_, kind) => Expr::new(kind, mark.pos),
        };

        SubtypeInd {
            type_mark,
            resolution,
            constraint,
            pos,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::path::Path;
    use pretty_assertions::assert_eq;

    fn lower_expression(code: &str) -> Expr {
        let text = format!("package p is constant c : t := {code}; end package;");
        let source = Source::inline(Path::new("lower.vhd"), &text);
        let contents = Contents::from_str(&text);
        let symbols = SymbolTable::new();
        let lowering = Lowering {
            source: &source,
            contents: &contents,
            symbols: &symbols,
        };
        let (root, diagnostics) = vhdl_syntax::parse(&text);
        assert_eq!(diagnostics, vec![]);
        let decl = root
            .descendants()
            .find(|node| node.kind() == NodeKind::ConstantDeclaration)
            .unwrap();
        lowering.expr(&node_after(&decl, TokenKind::ColonEq).unwrap())
    }

    #[test]
    fn abstract_literals() {
        assert_eq!(
            parse_abstract_literal("1_000"),
            Some(Literal::Integer(1000))
        );
        assert_eq!(parse_abstract_literal("1e3"), Some(Literal::Integer(1000)));
        assert_eq!(parse_abstract_literal("1.5"), Some(Literal::Real(1.5)));
        assert_eq!(
            parse_abstract_literal("16#FF#"),
            Some(Literal::Integer(255))
        );
        assert_eq!(
            parse_abstract_literal("2#1010#e1"),
            Some(Literal::Integer(20))
        );
        assert_eq!(parse_abstract_literal("16#F.8#"), Some(Literal::Real(15.5)));
        assert_eq!(parse_abstract_literal("2#102#"), None);
    }

    #[test]
    fn bit_strings() {
        assert_eq!(expand_bit_string("x\"F0\"").as_deref(), Some("11110000"));
        assert_eq!(expand_bit_string("b\"1_0\"").as_deref(), Some("10"));
        assert_eq!(expand_bit_string("o\"7\"").as_deref(), Some("111"));
        assert_eq!(expand_bit_string("6UX\"F\"").as_deref(), Some("001111"));
        assert_eq!(expand_bit_string("6SX\"F\"").as_deref(), Some("111111"));
        assert_eq!(expand_bit_string("3X\"F\"").as_deref(), Some("111"));
        assert_eq!(expand_bit_string("d\"5\"").as_deref(), Some("101"));
        assert_eq!(expand_bit_string("x\"Z\"").as_deref(), Some("ZZZZ"));
    }

    #[test]
    fn binary_expression() {
        let expr = lower_expression("a + 1 * 2");
        assert_matches!(expr.kind, ExprKind::Binary(Operator::Plus, _, _));
    }

    #[test]
    fn string_literal_contents() {
        let expr = lower_expression("\"a\"\"b\"");
        assert_matches!(expr.kind, ExprKind::Literal(Literal::String(ref text)) if text == "a\"b");
    }

    #[test]
    fn selected_and_called_names() {
        let expr = lower_expression("work.pkg.f(1, x => open)");
        let ExprKind::CallOrIndex(prefix, args) = expr.kind else {
            panic!("Expected call");
        };
        assert_eq!(prefix.mark_text(), "work.pkg.f");
        assert_eq!(args.len(), 2);
        assert!(args[0].formal.is_none());
        assert_matches!(args[1].actual.kind, ExprKind::Open);
    }

    #[test]
    fn aggregates_with_others() {
        let expr = lower_expression("(0 => '1', others => '0')");
        let ExprKind::Aggregate(assocs) = expr.kind else {
            panic!("Expected aggregate");
        };
        assert_eq!(assocs.len(), 2);
        assert_matches!(assocs[1].choices[0].kind, ExprKind::Others);
    }

    #[test]
    fn attributes_are_lower_case() {
        let expr = lower_expression("v'LENGTH");
        assert_matches!(expr.kind, ExprKind::Attribute(_, ref attr) if attr == "length");
    }
}
