//! Recursive-descent, precedence-climbing parser producing the typed-declaration
//! statements, expressions, and control flow spec.md §6 describes.
//!
//! Grounded on `original_source/pork/src/parse.c`: `parse_primary`/`parse_binary`
//! (precedence climbing, with the `>`/`>=` swap trick so the AST only ever needs
//! `Less`/`LEqual` kinds), `parse_assign`, `parse_block`, `parse_statement`. The
//! original only recognized `TOKEN_U64` as a declarable type; this port resolves
//! all eight integral keywords via [`crate::types::Program::integral_by_op_type`].

use crate::ast::{Ast, AstKind, NodeId};
use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::types::{Program, TypeId};

pub struct Parser<'src, 'prog> {
    lexer: Lexer<'src>,
    program: &'prog Program,
    ast: Ast,
    diagnostics: DiagnosticBag,
}

/// A parse result: `Some(id)` on success, `None` once a diagnostic has been
/// raised. Unlike the semantic analyzer, the parser stops at the first error —
/// spec.md §7 only asks semantic analysis to keep going.
type PResult = Option<NodeId>;

impl<'src, 'prog> Parser<'src, 'prog> {
    pub fn new(source: &'src str, program: &'prog Program) -> Self {
        Parser {
            lexer: Lexer::new(source),
            program,
            ast: Ast::new(),
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Parses the whole source as one function body (a brace-delimited block)
    /// and returns the owning [`Ast`] alongside the body's root, or the
    /// diagnostics collected along the way.
    pub fn parse_program(mut self) -> Result<(Ast, NodeId), Vec<Diagnostic>> {
        match self.block() {
            Some(body) => {
                if self.diagnostics.has_errors() {
                    Err(self.diagnostics.into_vec())
                } else {
                    Ok((self.ast, body))
                }
            }
            None => Err(self.diagnostics.into_vec()),
        }
    }

    fn error(&mut self, token: &Token<'src>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::at_token(token, message));
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        let token = self.lexer.peek();
        if token.kind == kind {
            Some(self.lexer.next_token())
        } else {
            self.error(&token, format!("expected {}", kind.describe()));
            None
        }
    }

    fn primary(&mut self) -> PResult {
        let token = self.lexer.peek();
        match token.kind {
            TokenKind::IntLiteral => {
                self.lexer.next_token();
                let value: u64 = token.text.parse().ok()?;
                Some(self.ast.int_literal(token.line, self.program.integer_literal, value))
            }
            TokenKind::Identifier => {
                self.lexer.next_token();
                Some(self.ast.variable(token.line, self.program.void, token.text.to_string()))
            }
            _ => {
                self.error(&token, "expected an expression");
                None
            }
        }
    }

    fn binary_precedence(kind: TokenKind) -> i32 {
        match kind {
            TokenKind::Star | TokenKind::Slash => 20,
            TokenKind::Plus | TokenKind::Minus => 10,
            TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => 7,
            TokenKind::EqualEqual | TokenKind::BangEqual => 5,
            _ => 0,
        }
    }

    /// Maps an operator token to its `AstKind`, and whether the operands must be
    /// swapped (`>` and `>=` are parsed as `<`/`<=` with operands reversed, so the
    /// AST never needs `Greater`/`GEqual` kinds).
    fn binary_kind(kind: TokenKind) -> (AstKind, bool) {
        match kind {
            TokenKind::Star => (AstKind::Mul, false),
            TokenKind::Slash => (AstKind::Div, false),
            TokenKind::Plus => (AstKind::Add, false),
            TokenKind::Minus => (AstKind::Sub, false),
            TokenKind::Less => (AstKind::Less, false),
            TokenKind::Greater => (AstKind::Less, true),
            TokenKind::LessEqual => (AstKind::LEqual, false),
            TokenKind::GreaterEqual => (AstKind::LEqual, true),
            TokenKind::EqualEqual => (AstKind::Equal, false),
            TokenKind::BangEqual => (AstKind::NEqual, false),
            other => unreachable!("{other:?} is not a binary operator"),
        }
    }

    fn binary(&mut self, caller_precedence: i32) -> PResult {
        let mut left = self.primary()?;

        loop {
            let op = self.lexer.peek();
            let prec = Self::binary_precedence(op.kind);
            if prec <= caller_precedence {
                break;
            }
            self.lexer.next_token();

            let right = self.binary(prec)?;

            let (kind, swap) = Self::binary_kind(op.kind);
            let (l, r) = if swap { (right, left) } else { (left, right) };
            left = self.ast.binary(kind, op.line, self.program.void, l, r);
        }

        Some(left)
    }

    fn assign(&mut self) -> PResult {
        let left = self.binary(0)?;

        if self.lexer.peek().kind == TokenKind::Equal {
            let eq = self.lexer.next_token();
            let right = self.assign()?;
            return Some(self.ast.assign(eq.line, self.program.void, left, right));
        }

        Some(left)
    }

    fn expression(&mut self) -> PResult {
        self.assign()
    }

    /// Parses `{ stmt* }`. Statements are chained through `AstNode::next`; a
    /// `VariableDecl` with an initializer already owns a one-node `next` chain to
    /// its desugared `Assign` (see the `=` branch in [`Parser::statement`]), so
    /// appending the *next* parsed statement must walk to the end of that chain
    /// rather than overwrite it — exactly what
    /// `original_source/pork/src/parse.c`'s `parse_block` does with its
    /// `while (cur->next) { cur = cur->next; }` walk.
    fn block(&mut self) -> PResult {
        let lbrace = self.expect(TokenKind::LBrace)?;

        let mut first: Option<NodeId> = None;
        let mut tail: Option<NodeId> = None;

        while !matches!(self.lexer.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            let stmt = self.statement()?;

            match tail {
                Some(t) => self.ast.get_mut(t).next = Some(stmt),
                None => first = Some(stmt),
            }

            let mut end = stmt;
            while let Some(n) = self.ast.get(end).next {
                end = n;
            }
            tail = Some(end);
        }

        self.expect(TokenKind::RBrace)?;
        Some(self.ast.block(lbrace.line, self.program.void, first))
    }

    fn find_type(&mut self, token: &Token<'src>) -> TypeId {
        match token.kind.as_op_type().and_then(|op| self.program.integral_by_op_type(op)) {
            Some(id) => id,
            None => {
                self.error(token, "unrecognized type");
                self.program.void
            }
        }
    }

    fn statement(&mut self) -> PResult {
        let token = self.lexer.peek();

        match token.kind {
            TokenKind::LBrace => self.block(),

            TokenKind::Return => {
                self.lexer.next_token();
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon)?;
                Some(self.ast.return_stmt(token.line, self.program.void, expr))
            }

            TokenKind::If => {
                self.lexer.next_token();
                let condition = self.expression()?;
                let block_then = self.block()?;
                let block_else = if self.lexer.peek().kind == TokenKind::Else {
                    self.lexer.next_token();
                    Some(self.block()?)
                } else {
                    None
                };
                Some(
                    self.ast
                        .if_stmt(token.line, self.program.void, condition, block_then, block_else),
                )
            }

            TokenKind::While => {
                self.lexer.next_token();
                let condition = self.expression()?;
                let body = self.block()?;
                Some(self.ast.while_stmt(token.line, self.program.void, condition, body))
            }

            kind if kind.as_op_type().is_some() => {
                self.lexer.next_token();
                let declared_type = self.find_type(&token);

                let name_token = self.expect(TokenKind::Identifier)?;
                let decl = self
                    .ast
                    .variable_decl(token.line, declared_type, name_token.text.to_string());

                if self.lexer.peek().kind == TokenKind::Equal {
                    let eq = self.lexer.next_token();
                    let var_ref = self
                        .ast
                        .variable(name_token.line, self.program.void, name_token.text.to_string());
                    let rhs = self.assign()?;
                    let assign = self.ast.assign(eq.line, self.program.void, var_ref, rhs);
                    self.ast.get_mut(decl).next = Some(assign);
                }

                self.expect(TokenKind::Semicolon)?;
                Some(decl)
            }

            _ => {
                let expr = self.expression()?;
                self.expect(TokenKind::Semicolon)?;
                Some(expr)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstPayload;

    fn parse_ok(source: &str) -> (Ast, NodeId, Program) {
        let program = Program::new();
        let parser = Parser::new(source, &program);
        let (ast, body) = parser.parse_program().expect("expected source to parse");
        (ast, body, program)
    }

    #[test]
    fn parses_return_literal() {
        let (ast, body, _program) = parse_ok("{ return 42; }");
        let stmts = ast.block_children(body);
        assert_eq!(stmts.len(), 1);
        assert_eq!(ast.get(stmts[0]).kind, AstKind::Return);
    }

    #[test]
    fn precedence_groups_multiplication_tighter_than_addition() {
        let (ast, body, _program) = parse_ok("{ return 1 + 2 * 3; }");
        let ret = ast.get(ast.block_children(body)[0]);
        let add = ast.get(ret.expression());
        assert_eq!(add.kind, AstKind::Add);
        let AstPayload::Binary { right, .. } = &add.payload else {
            panic!()
        };
        assert_eq!(ast.get(*right).kind, AstKind::Mul);
    }

    #[test]
    fn greater_than_is_desugared_to_swapped_less() {
        let (ast, body, _program) = parse_ok("{ return 1 > 2; }");
        let ret = ast.get(ast.block_children(body)[0]);
        let cmp = ast.get(ret.expression());
        assert_eq!(cmp.kind, AstKind::Less);
        let AstPayload::Binary { left, right } = &cmp.payload else {
            panic!()
        };
        let AstPayload::IntLiteral(l) = ast.get(*left).payload else {
            panic!()
        };
        let AstPayload::IntLiteral(r) = ast.get(*right).payload else {
            panic!()
        };
        assert_eq!((l, r), (2, 1));
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let program = Program::new();
        let parser = Parser::new("{ return 1 }", &program);
        let result = parser.parse_program();
        assert!(result.is_err());
    }

    #[test]
    fn variable_decl_with_initializer_chains_an_assign_via_next() {
        let (ast, body, _program) = parse_ok("{ i32 a = 1; return a; }");
        let stmts = ast.block_children(body);
        assert_eq!(ast.get(stmts[0]).kind, AstKind::VariableDecl);
        let assign_id = ast.get(stmts[0]).next.expect("initializer assign");
        assert_eq!(ast.get(assign_id).kind, AstKind::Assign);
    }
}
