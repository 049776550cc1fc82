//! Implicit coercion rules: integer-literal contextual typing, cast insertion,
//! and the binary-operand unification algorithm of spec.md §4.D.
//!
//! Grounded on spec.md §4.D directly — the original C analyzer
//! (`original_source/pork/src/semantics.c`) only checks same-type equality with
//! no coercion at all; this crate implements the richer rules spec.md specifies,
//! which supersede the original where the two differ (see SPEC_FULL.md §4.D).

use crate::ast::{Ast, AstKind, AstPayload, NodeId};
use crate::types::{Program, TypeId};

/// `Coercible(from, to)`: both integral and `to` is at least as wide as `from`,
/// or `from` is the `integer_literal` placeholder and `to` is integral.
pub fn coercible(program: &Program, from: TypeId, to: TypeId) -> bool {
    if program.is_integral(from) && program.is_integral(to) {
        return program.get(to).size >= program.get(from).size;
    }
    program.is_integer_literal(from) && program.is_integral(to)
}

/// Rewrites the type of a literal-only subtree in place, walking only through
/// arithmetic/comparison nodes: a literal "takes the shape of its context" by
/// having its (and any literal operands feeding into it) type rewritten, rather
/// than wrapped in a `Cast`. `node` is assumed to currently have type
/// `integer_literal`.
pub fn rewrite_literal_type(ast: &mut Ast, node: NodeId, wanted: TypeId) {
    let kind = ast.get(node).kind;

    if kind == AstKind::IntLiteral {
        ast.get_mut(node).ty = wanted;
        return;
    }

    if ast.get(node).is_binary() {
        let (left, right) = match &ast.get(node).payload {
            AstPayload::Binary { left, right } => (*left, *right),
            _ => unreachable!("is_binary() implies a Binary payload"),
        };
        rewrite_literal_type(ast, left, wanted);
        rewrite_literal_type(ast, right, wanted);
    }

    ast.get_mut(node).ty = wanted;
}

/// `implicit_cast(node, wanted)`: if `node`'s current type is `integer_literal`,
/// rewrites the literal subtree in place (no `Cast` node). Otherwise wraps `node`
/// in a `Cast`: clones `node` into a fresh slot, then mutates the original
/// in-place to kind `Cast` with the clone as its expression. `node`'s identity
/// never moves, so anything already holding that `NodeId` (a parent's `left`/
/// `right`/`expression` field) keeps pointing at the same — now `Cast` — node.
pub fn implicit_cast(ast: &mut Ast, program: &Program, node: NodeId, wanted: TypeId) -> NodeId {
    if program.is_integer_literal(ast.get(node).ty) {
        rewrite_literal_type(ast, node, wanted);
        return node;
    }

    let clone = ast.duplicate(node);

    let original = ast.get_mut(node);
    original.kind = AstKind::Cast;
    original.ty = wanted;
    original.payload = AstPayload::Cast { expr: clone };

    node
}

/// Resolves mismatched operand types for a binary op per spec.md §4.D rules 1/2.
/// Returns the node's resolved type on success, inserting casts or rewriting
/// literal subtrees on the operands as needed; `None` if the combination is
/// invalid (rule 3 — the caller reports the error and sets the node's type to
/// `void`).
pub fn unify_binary_operands(ast: &mut Ast, program: &Program, left: NodeId, right: NodeId) -> Option<TypeId> {
    let left_ty = ast.get(left).ty;
    let right_ty = ast.get(right).ty;

    if left_ty == right_ty {
        return Some(left_ty);
    }

    let left_integral = program.is_integral(left_ty);
    let right_integral = program.is_integral(right_ty);
    let left_literal = program.is_integer_literal(left_ty);
    let right_literal = program.is_integer_literal(right_ty);

    if left_integral && right_integral {
        let left_size = program.get(left_ty).size;
        let right_size = program.get(right_ty).size;
        let mut wider = if left_size >= right_size { left_ty } else { right_ty };

        if program.is_signed_integral(left_ty) || program.is_signed_integral(right_ty) {
            wider = program.to_signed(wider);
        }

        if left_ty != wider {
            implicit_cast(ast, program, left, wider);
        }
        if right_ty != wider {
            implicit_cast(ast, program, right, wider);
        }

        return Some(wider);
    }

    if left_integral && right_literal {
        rewrite_literal_type(ast, right, left_ty);
        return Some(left_ty);
    }

    if left_literal && right_integral {
        rewrite_literal_type(ast, left, right_ty);
        return Some(right_ty);
    }

    None
}

/// Coerces `node` to `wanted` per the `Assign`/`Return` rule: equal types need
/// nothing, a coercible mismatch gets a cast or literal rewrite, anything else
/// is `None` (the caller reports its own context-specific message).
pub fn coerce_to(ast: &mut Ast, program: &Program, node: NodeId, wanted: TypeId) -> Option<TypeId> {
    let ty = ast.get(node).ty;
    if ty == wanted {
        return Some(wanted);
    }
    if coercible(program, ty, wanted) {
        implicit_cast(ast, program, node, wanted);
        return Some(wanted);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Program;

    #[test]
    fn coercible_widens_but_not_narrows() {
        let p = Program::new();
        assert!(coercible(&p, p.u8_(), p.u32_()));
        assert!(!coercible(&p, p.u32_(), p.u8_()));
    }

    #[test]
    fn integer_literal_coerces_to_any_integral() {
        let p = Program::new();
        assert!(coercible(&p, p.integer_literal, p.i8_()));
        assert!(coercible(&p, p.integer_literal, p.u64_()));
    }

    #[test]
    fn unify_promotes_to_wider_signed_when_either_side_signed() {
        let p = Program::new();
        let mut ast = Ast::new();
        let left = ast.variable(1, p.u32_(), "a".into());
        let right = ast.variable(1, p.i64_(), "b".into());
        let result = unify_binary_operands(&mut ast, &p, left, right).unwrap();
        assert_eq!(result, p.i64_());
        assert_eq!(ast.get(left).kind, AstKind::Cast);
    }

    #[test]
    fn unify_rewrites_bare_literal_without_inserting_a_cast() {
        let p = Program::new();
        let mut ast = Ast::new();
        let left = ast.variable(1, p.u32_(), "a".into());
        let right = ast.int_literal(1, p.integer_literal, 5);
        let result = unify_binary_operands(&mut ast, &p, left, right).unwrap();
        assert_eq!(result, p.u32_());
        assert_eq!(ast.get(right).kind, AstKind::IntLiteral);
        assert_eq!(ast.get(right).ty, p.u32_());
    }

    #[test]
    fn implicit_cast_preserves_node_identity_for_non_literals() {
        let p = Program::new();
        let mut ast = Ast::new();
        let var = ast.variable(1, p.u32_(), "a".into());
        let result = implicit_cast(&mut ast, &p, var, p.u64_());
        assert_eq!(result, var);
        assert_eq!(ast.get(var).kind, AstKind::Cast);
        assert_eq!(ast.get(var).ty, p.u64_());
        let AstPayload::Cast { expr } = ast.get(var).payload else {
            panic!("expected Cast payload");
        };
        assert_eq!(ast.get(expr).kind, AstKind::Variable);
    }
}
