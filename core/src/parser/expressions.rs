use super::SceneParser;
use crate::node::{ChoiceScriptType, NodeId, NodeKind, Rule};
use crate::token::{Token, TokenKind};

/// Function-like value keywords, tried before plain identifiers.
const EXPR_FUNCTIONS: &[&str] = &["not", "round", "timestamp", "log", "length", "auto"];

impl SceneParser {
    /// One ChoiceScript expression: a value term, then either nothing
    /// (singleton) or exactly one operator and one more value term. No
    /// precedence climbing; ChoiceScript requires parentheses instead.
    ///
    /// `closing` is consumed and verified when given. `bound` is an
    /// exclusive offset limit used for multireplace selectors.
    pub(super) fn parse_cs_expr(
        &mut self,
        closing: Option<TokenKind>,
        bound: Option<usize>,
    ) -> Option<NodeId> {
        let start_offset = self.token.offset;
        let left = self.parse_cs_value(bound)?;
        let node = self.arena.alloc(NodeKind::Expression { cs_type: None }, start_offset);
        self.arena.add_child(node, left);

        if self.expr_ended(closing, bound) {
            self.close_expr(node, closing);
            self.finish(node);
            return Some(node);
        }

        match self.parse_cs_operator() {
            Some((operator, cs_type)) => {
                self.arena.add_child(node, operator);
                self.arena[node].kind = NodeKind::Expression { cs_type: Some(cs_type) };
                match self.parse_cs_value(bound) {
                    Some(right) => self.arena.add_child(node, right),
                    None => self.flag(node, Rule::ExpectedOperand),
                }
            }
            None => {
                self.flag(node, Rule::ExpectedOperator);
                match closing {
                    Some(kind) => self.resync(&[kind, TokenKind::EndOfLine]),
                    None => self.resync(&[TokenKind::EndOfLine]),
                }
            }
        }
        self.close_expr(node, closing);
        self.finish(node);
        Some(node)
    }

    fn expr_ended(&self, closing: Option<TokenKind>, bound: Option<usize>) -> bool {
        if self.at_line_end() {
            return true;
        }
        if let Some(kind) = closing {
            if self.token.kind == kind {
                return true;
            }
        }
        if let Some(bound) = bound {
            if self.token.offset >= bound {
                return true;
            }
        }
        // An unrequested close brace or a multireplace variant separator
        // always terminates: both belong to an enclosing construct.
        self.token.kind == TokenKind::RBrace || self.at_operator("|")
    }

    fn close_expr(&mut self, node: NodeId, closing: Option<TokenKind>) {
        if let Some(kind) = closing {
            if !self.accept(kind) {
                self.flag(node, Rule::UnbalancedParens);
            }
        }
    }

    /// One value term, in priority order: bracketed sub-expression,
    /// function keyword, boolean, number, string, identifier.
    pub(super) fn parse_cs_value(&mut self, bound: Option<usize>) -> Option<NodeId> {
        if let Some(bound) = bound {
            if self.token.offset >= bound {
                return None;
            }
        }
        match self.token.kind {
            TokenKind::LParen => Some(self.parse_bracketed(TokenKind::RParen)),
            TokenKind::LBrace => Some(self.parse_bracketed(TokenKind::RBrace)),
            TokenKind::Number => Some(self.leaf(NodeKind::NumberExpression)),
            // negated literal, e.g. `*create delta -5`
            TokenKind::Operator if self.token.text == "-" => {
                let mark = self.mark();
                let start = self.token.offset;
                self.advance();
                if self.at(TokenKind::Number) {
                    let node = self.arena.alloc(NodeKind::NumberExpression, start);
                    self.advance();
                    self.finish(node);
                    Some(node)
                } else {
                    self.restore(mark);
                    None
                }
            }
            TokenKind::String => {
                let terminated = string_terminated(&self.token);
                let leaf = self.leaf(NodeKind::StringExpression);
                if !terminated {
                    self.flag_node(leaf, Rule::UnclosedString);
                }
                Some(leaf)
            }
            TokenKind::Word => {
                let text = self.token.text.clone();
                if text == "true" || text == "false" {
                    return Some(self.leaf(NodeKind::BooleanExpression));
                }
                if EXPR_FUNCTIONS.contains(&text.as_str()) {
                    return Some(self.parse_function_value(text));
                }
                Some(self.leaf(NodeKind::Variable { name: text }))
            }
            _ => None,
        }
    }

    /// `(expr)` or `{expr}`: the wrapper node covers the brackets.
    pub(super) fn parse_bracketed(&mut self, closing: TokenKind) -> NodeId {
        let wrapper = self.start(NodeKind::Expression { cs_type: None });
        self.advance(); // opening bracket
        match self.parse_cs_expr(Some(closing), None) {
            Some(inner) => self.arena.add_child(wrapper, inner),
            None => {
                self.flag(wrapper, Rule::ExpectedExpression);
                self.resync(&[closing, TokenKind::EndOfLine]);
                self.accept(closing);
            }
        }
        self.finish(wrapper);
        wrapper
    }

    /// `not(expr)`, `round(expr)`, ... A bare keyword without the call
    /// parentheses is read as an ordinary variable reference.
    fn parse_function_value(&mut self, name: String) -> NodeId {
        let node = self.start(NodeKind::Expression { cs_type: None });
        let ident = self.leaf(NodeKind::Identifier { name });
        self.arena.add_child(node, ident);
        if self.at(TokenKind::LParen) {
            let argument = self.parse_bracketed(TokenKind::RParen);
            self.arena.add_child(node, argument);
        } else if let NodeKind::Identifier { name } = &self.arena[ident].kind {
            let name = name.clone();
            self.arena[ident].kind = NodeKind::Variable { name };
        }
        self.finish(node);
        node
    }

    /// Classify the current token as a binary operator and build its
    /// node. The operator decides the expression's value category.
    pub(super) fn parse_cs_operator(&mut self) -> Option<(NodeId, ChoiceScriptType)> {
        let cs_type = classify_operator(&self.token)?;
        let operator = self.leaf(NodeKind::Operator);
        Some((operator, cs_type))
    }

    /// `*set` shorthand: an expression may start with the operator, the
    /// left operand being the variable being set.
    pub(super) fn parse_set_value(&mut self) -> Option<NodeId> {
        if classify_operator(&self.token).is_some() {
            let node = self.start(NodeKind::Expression { cs_type: None });
            let (operator, cs_type) = self.parse_cs_operator()?;
            self.arena.add_child(node, operator);
            self.arena[node].kind = NodeKind::Expression { cs_type: Some(cs_type) };
            match self.parse_cs_value(None) {
                Some(value) => self.arena.add_child(node, value),
                None => self.flag(node, Rule::ExpectedOperand),
            }
            self.finish(node);
            return Some(node);
        }
        self.parse_cs_expr(None, None)
    }
}

fn classify_operator(token: &Token) -> Option<ChoiceScriptType> {
    match token.kind {
        TokenKind::Asterisk => Some(ChoiceScriptType::Number),
        TokenKind::FairMathAdd | TokenKind::FairMathSub => Some(ChoiceScriptType::Number),
        TokenKind::Operator => match token.text.as_str() {
            "+" | "-" | "/" | "%" | "^" => Some(ChoiceScriptType::Number),
            "&" | "#" => Some(ChoiceScriptType::String),
            "<" | ">" | "=" | "<=" | ">=" | "!=" => Some(ChoiceScriptType::Boolean),
            _ => None,
        },
        TokenKind::Word => match token.text.as_str() {
            "and" | "or" => Some(ChoiceScriptType::Boolean),
            "modulo" => Some(ChoiceScriptType::Number),
            _ => None,
        },
        _ => None,
    }
}

/// Whether a scanned string token actually reached its closing quote.
fn string_terminated(token: &Token) -> bool {
    let chars: Vec<char> = token.text.chars().collect();
    if chars.len() < 2 || chars[chars.len() - 1] != '"' {
        return false;
    }
    let mut backslashes = 0;
    let mut i = chars.len() - 1;
    while i > 0 && chars[i - 1] == '\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 0
}
