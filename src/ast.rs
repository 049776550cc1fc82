//! The typed AST: a tagged sum type keyed on [`AstKind`], stored in a `Vec`-backed
//! arena so the semantic analyzer can mutate nodes in place (spec.md §4.D's cast
//! insertion rewrites a node's kind to `Cast`) without fighting the borrow checker
//! over an owned-tree representation.
//!
//! Grounded on `original_source/pork/src/types.h`'s `ASTNode` tagged union; reshaped
//! per spec.md §9's design note into "a sum type keyed on kind, with one variant
//! per AST kind" so `match`es over [`AstPayload`] are exhaustiveness-checked at
//! compile time instead of relying on a C `switch`'s `default: assert(false)`.

use crate::types::{TypeId, VarId};

/// The 17 AST node kinds spec.md §3 lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstKind {
    IntLiteral,
    Variable,
    Cast,
    Add,
    Sub,
    Mul,
    Div,
    Less,
    LEqual,
    Equal,
    NEqual,
    Assign,
    Block,
    Return,
    VariableDecl,
    If,
    While,
}

pub const NUM_AST_KINDS: usize = 17;

/// An identity handle into [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Kind-specific data. The discriminant always agrees with the owning
/// [`AstNode::kind`] — enforced by construction, since every constructor in
/// [`Ast`] pairs a kind with its matching payload variant.
#[derive(Debug, Clone)]
pub enum AstPayload {
    IntLiteral(u64),
    Variable {
        name: String,
        variable: Option<VarId>,
    },
    VariableDecl {
        name: String,
        variable: Option<VarId>,
    },
    Cast {
        expr: NodeId,
    },
    Return {
        expr: NodeId,
    },
    Binary {
        left: NodeId,
        right: NodeId,
    },
    Assign {
        left: NodeId,
        right: NodeId,
    },
    Block {
        first: Option<NodeId>,
    },
    If {
        condition: NodeId,
        block_then: NodeId,
        block_else: Option<NodeId>,
    },
    While {
        condition: NodeId,
        block: NodeId,
    },
}

/// One AST node: `{ kind, token, type, next }` plus its kind-specific payload,
/// per spec.md §3.
#[derive(Debug, Clone)]
pub struct AstNode {
    pub kind: AstKind,
    pub line: u32,
    /// Filled in by the analyzer; starts as `void` and stays `void` for any
    /// subtree analysis failed on (spec.md §3 invariant).
    pub ty: TypeId,
    /// Sibling link within a `Block`'s statement list.
    pub next: Option<NodeId>,
    pub payload: AstPayload,
}

impl AstNode {
    pub fn left(&self) -> NodeId {
        match &self.payload {
            AstPayload::Binary { left, .. } | AstPayload::Assign { left, .. } => *left,
            _ => panic!("{:?} has no `left`", self.kind),
        }
    }

    pub fn right(&self) -> NodeId {
        match &self.payload {
            AstPayload::Binary { right, .. } | AstPayload::Assign { right, .. } => *right,
            _ => panic!("{:?} has no `right`", self.kind),
        }
    }

    pub fn expression(&self) -> NodeId {
        match &self.payload {
            AstPayload::Cast { expr } | AstPayload::Return { expr } => *expr,
            _ => panic!("{:?} has no `expression`", self.kind),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self.kind,
            AstKind::Add
                | AstKind::Sub
                | AstKind::Mul
                | AstKind::Div
                | AstKind::Less
                | AstKind::LEqual
                | AstKind::Equal
                | AstKind::NEqual
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self.kind,
            AstKind::Less | AstKind::LEqual | AstKind::Equal | AstKind::NEqual
        )
    }
}

/// Owns every [`AstNode`] parsed for one function body.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: AstKind, line: u32, ty: TypeId, payload: AstPayload) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode {
            kind,
            line,
            ty,
            next: None,
            payload,
        });
        id
    }

    pub fn int_literal(&mut self, line: u32, ty: TypeId, value: u64) -> NodeId {
        self.alloc(AstKind::IntLiteral, line, ty, AstPayload::IntLiteral(value))
    }

    pub fn variable(&mut self, line: u32, ty: TypeId, name: String) -> NodeId {
        self.alloc(
            AstKind::Variable,
            line,
            ty,
            AstPayload::Variable { name, variable: None },
        )
    }

    pub fn variable_decl(&mut self, line: u32, ty: TypeId, name: String) -> NodeId {
        self.alloc(
            AstKind::VariableDecl,
            line,
            ty,
            AstPayload::VariableDecl { name, variable: None },
        )
    }

    pub fn binary(&mut self, kind: AstKind, line: u32, ty: TypeId, left: NodeId, right: NodeId) -> NodeId {
        debug_assert!(matches!(
            kind,
            AstKind::Add
                | AstKind::Sub
                | AstKind::Mul
                | AstKind::Div
                | AstKind::Less
                | AstKind::LEqual
                | AstKind::Equal
                | AstKind::NEqual
        ));
        self.alloc(kind, line, ty, AstPayload::Binary { left, right })
    }

    pub fn assign(&mut self, line: u32, ty: TypeId, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(AstKind::Assign, line, ty, AstPayload::Assign { left, right })
    }

    pub fn cast(&mut self, line: u32, ty: TypeId, expr: NodeId) -> NodeId {
        self.alloc(AstKind::Cast, line, ty, AstPayload::Cast { expr })
    }

    pub fn return_stmt(&mut self, line: u32, ty: TypeId, expr: NodeId) -> NodeId {
        self.alloc(AstKind::Return, line, ty, AstPayload::Return { expr })
    }

    pub fn block(&mut self, line: u32, ty: TypeId, first: Option<NodeId>) -> NodeId {
        self.alloc(AstKind::Block, line, ty, AstPayload::Block { first })
    }

    pub fn if_stmt(
        &mut self,
        line: u32,
        ty: TypeId,
        condition: NodeId,
        block_then: NodeId,
        block_else: Option<NodeId>,
    ) -> NodeId {
        self.alloc(
            AstKind::If,
            line,
            ty,
            AstPayload::If {
                condition,
                block_then,
                block_else,
            },
        )
    }

    pub fn while_stmt(&mut self, line: u32, ty: TypeId, condition: NodeId, block: NodeId) -> NodeId {
        self.alloc(AstKind::While, line, ty, AstPayload::While { condition, block })
    }

    pub fn get(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.0]
    }

    /// Clones the node at `id` into a fresh slot, preserving the identity of its
    /// children (they are referenced by `NodeId`, not deep-copied). Used by
    /// [`crate::analyzer::coerce::implicit_cast`] to wrap a node in a `Cast`
    /// without disturbing anything that already points at `id`.
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let node = self.nodes[id.0].clone();
        let new_id = NodeId(self.nodes.len());
        self.nodes.push(node);
        new_id
    }

    /// Statement children of a `Block` node, in order.
    pub fn block_children(&self, block: NodeId) -> Vec<NodeId> {
        let AstPayload::Block { first } = &self.get(block).payload else {
            panic!("block_children called on a non-Block node");
        };

        let mut out = Vec::new();
        let mut cur = *first;
        while let Some(id) = cur {
            out.push(id);
            cur = self.get(id).next;
        }
        out
    }
}
