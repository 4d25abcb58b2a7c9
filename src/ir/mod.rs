//! LLVM-flavoured IR: every value lives in its own stack slot, and every instruction is
//! kept as data until the module is rendered.
pub mod attribute;
mod format;
pub mod generate;
pub mod module;

use thiserror::Error;

use attribute::{Attribute, AttributeId, AttributePool};

/// A numbered virtual register, `%N`. Numbers start at 1 (the entry block is `%0`) and are
/// never reused inside one module.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Register(pub usize);

/// A named basic block, rendered as `{name}{id}`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Label {
    pub name: &'static str,
    pub id: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Constant(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    UnsignedDivide,
}

/// Signed integer comparisons, plus `ne` used to test conditions against zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Equal,
    NotEqual,
    SignedLess,
    SignedLessEqual,
    SignedGreater,
    SignedGreaterEqual,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// `%slot = alloca i32, align 4`
    Alloca { slot: Register },
    Store { value: Operand, slot: Register },
    Load { target: Register, slot: Register },
    Arithmetic {
        target: Register,
        op: ArithmeticOp,
        lhs: Register,
        rhs: Register,
    },
    /// Yields an `i1`.
    Compare {
        target: Register,
        condition: Condition,
        lhs: Register,
        rhs: Operand,
    },
    /// `i1` to `i32`.
    ZeroExtend { target: Register, value: Register },
    /// Variadic call through a pooled format constant.
    CallPrintf {
        target: Register,
        format: &'static str,
        argument: Register,
    },
    Jump(Label),
    Branch {
        flag: Register,
        on_true: Label,
        on_false: Label,
    },
    /// Starts a new basic block.
    Block(Label),
}

impl Instruction {
    /// The register this instruction defines, if any.
    pub const fn defines(&self) -> Option<Register> {
        match self {
            Self::Alloca { slot: target }
            | Self::Load { target, .. }
            | Self::Arithmetic { target, .. }
            | Self::Compare { target, .. }
            | Self::ZeroExtend { target, .. }
            | Self::CallPrintf { target, .. } => Some(*target),
            Self::Store { .. } | Self::Jump(_) | Self::Branch { .. } | Self::Block(_) => None,
        }
    }
    pub const fn is_terminator(&self) -> bool {
        matches!(self, Self::Jump(_) | Self::Branch { .. })
    }
}

/// A private global byte string; the trailing NUL is added when rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constant {
    pub name: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: &'static str,
    pub return_type: &'static str,
    pub parameters: &'static str,
    pub attribute: AttributeId,
}

/// Append-only and deduplicated: inserting an equal item hands back the index it already has.
#[derive(Debug)]
pub struct Pool<T> {
    items: Vec<T>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PartialEq> Pool<T> {
    pub fn insert(&mut self, item: T) -> usize {
        if let Some(index) = self.items.iter().position(|it| *it == item) {
            return index;
        }
        self.items.push(item);
        self.items.len() - 1
    }
}

impl<T> Pool<T> {
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("unknown function: {0:?}")]
    UnknownFunction(String),
    #[error("`print` takes exactly one argument, but {found} were given")]
    PrintArity { found: usize },
    #[error("internal error: attribute rendered before it was given an index")]
    UnindexedAttribute,
    #[error("internal error: expression lowered without producing a value")]
    MissingValue,
}

#[derive(Debug)]
pub struct RegisterCounter {
    next: usize,
}

impl Default for RegisterCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl RegisterCounter {
    pub fn next_register(&mut self) -> Register {
        let current = self.next;
        self.next += 1;
        Register(current)
    }
}

/// Everything one compilation unit accumulates while its body is generated.
#[derive(Debug, Default)]
pub struct CodeGenContext {
    registers: RegisterCounter,
    next_label: usize,
    body: Vec<Instruction>,
    constants: Pool<Constant>,
    declarations: Pool<Declaration>,
    attributes: AttributePool,
    print_format: Option<&'static str>,
}

impl CodeGenContext {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn next_register(&mut self) -> Register {
        self.registers.next_register()
    }
    /// Labels share one counter, so every label created in a unit is distinct.
    pub fn new_label(&mut self, name: &'static str) -> Label {
        let id = self.next_label;
        self.next_label += 1;
        Label { name, id }
    }
    pub fn push(&mut self, instruction: Instruction) {
        tracing::trace!(target: "irgen", "{instruction:?}");
        self.body.push(instruction);
    }
    pub fn body(&self) -> &[Instruction] {
        &self.body
    }
    pub fn constants(&self) -> &Pool<Constant> {
        &self.constants
    }
    pub fn declarations(&self) -> &Pool<Declaration> {
        &self.declarations
    }
    pub fn attributes(&self) -> &AttributePool {
        &self.attributes
    }
    pub fn add_constant(&mut self, constant: Constant) -> ConstantId {
        let id = ConstantId(self.constants.insert(constant));
        tracing::debug!(target: "irgen::pool", "constant #{}", id.0);
        id
    }
    pub fn add_declaration(&mut self, declaration: Declaration) -> usize {
        let index = self.declarations.insert(declaration);
        tracing::debug!(target: "irgen::pool", "declaration #{index}");
        index
    }
    pub fn add_attribute(&mut self, attribute: Attribute) -> AttributeId {
        let id = self.attributes.register(attribute);
        tracing::debug!(target: "irgen::pool", "attribute {id}");
        id
    }

    /// Registers the format string, the `printf` declaration and its attributes the first
    /// time it is called; later calls only hand back the format constant's name.
    pub fn print_support(&mut self) -> &'static str {
        if let Some(format) = self.print_format {
            return format;
        }
        tracing::debug!(target: "irgen::pool", "registering print support");
        let format = ".str";
        self.add_constant(Constant {
            name: format,
            bytes: b"%d\n".to_vec(),
        });
        let attribute = self.add_attribute(Attribute::new());
        self.add_declaration(Declaration {
            name: "printf",
            return_type: "i32",
            parameters: "ptr noundef, ...",
            attribute,
        });
        self.print_format = Some(format);
        format
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Vec<Instruction>, Vec<Constant>, Vec<Declaration>, AttributePool) {
        (
            self.body,
            self.constants.into_inner(),
            self.declarations.into_inner(),
            self.attributes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_start_at_one_and_increase() {
        let mut ctx = CodeGenContext::new();
        let regs: Vec<_> = (0..4).map(|_| ctx.next_register()).collect();
        let expected: Vec<_> = (1..=4).map(Register).collect();
        assert_eq!(regs, expected);
    }

    #[test]
    fn labels_are_unique_across_names() {
        let mut ctx = CodeGenContext::new();
        let a = ctx.new_label("if.then");
        let b = ctx.new_label("if.end");
        let c = ctx.new_label("if.then");
        assert_ne!(a, c);
        assert_eq!((a.id, b.id, c.id), (0, 1, 2));
    }

    #[test]
    fn pool_deduplicates() {
        let mut pool = Pool::default();
        assert_eq!(pool.insert("a"), 0);
        assert_eq!(pool.insert("b"), 1);
        assert_eq!(pool.insert("a"), 0);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn print_support_is_registered_once() {
        let mut ctx = CodeGenContext::new();
        let first = ctx.print_support();
        let second = ctx.print_support();
        assert_eq!(first, second);
        assert_eq!(ctx.constants().len(), 1);
        assert_eq!(ctx.declarations().len(), 1);
        assert_eq!(ctx.attributes().len(), 1);
    }

    #[test]
    fn defined_registers() {
        let alloca = Instruction::Alloca { slot: Register(3) };
        assert_eq!(alloca.defines(), Some(Register(3)));
        let store = Instruction::Store {
            value: Operand::Constant(1),
            slot: Register(3),
        };
        assert_eq!(store.defines(), None);
        assert!(!store.is_terminator());
        assert!(Instruction::Jump(Label { name: "x", id: 0 }).is_terminator());
    }
}
