use std::fmt;

use super::{
    ArithmeticOp, Condition, Constant, Declaration, Instruction, Label, Operand, Register,
};

/// `{target} = {rest}`
macro_rules! write_definition {
    ($formatter:expr, $target:expr, $($rest:tt)+) => {{
        write!($formatter, "{} = ", $target)?;
        write!($formatter, $($rest)+)
    }};
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.id)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(register) => register.fmt(f),
            Self::Constant(constant) => constant.fmt(f),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // no signed-wrap flag on division
        f.write_str(match self {
            Self::Add => "add nsw",
            Self::Subtract => "sub nsw",
            Self::Multiply => "mul nsw",
            Self::UnsignedDivide => "udiv",
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equal => "eq",
            Self::NotEqual => "ne",
            Self::SignedLess => "slt",
            Self::SignedLessEqual => "sle",
            Self::SignedGreater => "sgt",
            Self::SignedGreaterEqual => "sge",
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloca { slot } => write_definition!(f, slot, "alloca i32, align 4"),
            Self::Store { value, slot } => write!(f, "store i32 {value}, ptr {slot}, align 4"),
            Self::Load { target, slot } => {
                write_definition!(f, target, "load i32, ptr {slot}, align 4")
            }
            Self::Arithmetic {
                target,
                op,
                lhs,
                rhs,
            } => write_definition!(f, target, "{op} i32 {lhs}, {rhs}"),
            Self::Compare {
                target,
                condition,
                lhs,
                rhs,
            } => write_definition!(f, target, "icmp {condition} i32 {lhs}, {rhs}"),
            Self::ZeroExtend { target, value } => {
                write_definition!(f, target, "zext i1 {value} to i32")
            }
            Self::CallPrintf {
                target,
                format,
                argument,
            } => write_definition!(
                f,
                target,
                "call i32 (ptr, ...) @printf(ptr noundef @{format}, i32 noundef {argument})"
            ),
            Self::Jump(label) => write!(f, "br label %{label}"),
            Self::Branch {
                flag,
                on_true,
                on_false,
            } => write!(f, "br i1 {flag}, label %{on_true}, label %{on_false}"),
            Self::Block(label) => write!(f, "{label}:"),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{} = private unnamed_addr constant [{} x i8] c\"",
            self.name,
            self.bytes.len() + 1
        )?;
        for &byte in self.bytes.iter().chain(std::iter::once(&0)) {
            if byte.is_ascii_graphic() && byte != b'"' && byte != b'\\' || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\{:02X}", byte)?;
            }
        }
        f.write_str("\", align 1")
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "declare {} @{}({}) {}",
            self.return_type, self.name, self.parameters, self.attribute
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::attribute::AttributeId;
    use super::*;

    #[test]
    fn print_format_constant() {
        let constant = Constant {
            name: ".str",
            bytes: b"%d\n".to_vec(),
        };
        assert_eq!(
            constant.to_string(),
            r#"@.str = private unnamed_addr constant [4 x i8] c"%d\0A\00", align 1"#
        );
    }

    #[test]
    fn escapes_quotes_and_backslashes() {
        let constant = Constant {
            name: "s",
            bytes: b"a \"b\\".to_vec(),
        };
        assert!(constant.to_string().contains(r#"c"a \22b\5C\00""#));
    }

    #[test]
    fn instructions() {
        let cases = [
            (
                Instruction::Alloca { slot: Register(1) },
                "%1 = alloca i32, align 4",
            ),
            (
                Instruction::Store {
                    value: Operand::Constant(-3),
                    slot: Register(1),
                },
                "store i32 -3, ptr %1, align 4",
            ),
            (
                Instruction::Load {
                    target: Register(2),
                    slot: Register(1),
                },
                "%2 = load i32, ptr %1, align 4",
            ),
            (
                Instruction::Arithmetic {
                    target: Register(5),
                    op: ArithmeticOp::Add,
                    lhs: Register(3),
                    rhs: Register(4),
                },
                "%5 = add nsw i32 %3, %4",
            ),
            (
                Instruction::Arithmetic {
                    target: Register(5),
                    op: ArithmeticOp::UnsignedDivide,
                    lhs: Register(3),
                    rhs: Register(4),
                },
                "%5 = udiv i32 %3, %4",
            ),
            (
                Instruction::Compare {
                    target: Register(7),
                    condition: Condition::NotEqual,
                    lhs: Register(6),
                    rhs: Operand::Constant(0),
                },
                "%7 = icmp ne i32 %6, 0",
            ),
            (
                Instruction::ZeroExtend {
                    target: Register(8),
                    value: Register(7),
                },
                "%8 = zext i1 %7 to i32",
            ),
            (
                Instruction::Branch {
                    flag: Register(7),
                    on_true: Label {
                        name: "while.body",
                        id: 1,
                    },
                    on_false: Label {
                        name: "while.end",
                        id: 2,
                    },
                },
                "br i1 %7, label %while.body1, label %while.end2",
            ),
            (
                Instruction::Block(Label {
                    name: "while.end",
                    id: 2,
                }),
                "while.end2:",
            ),
        ];
        for (instruction, text) in cases {
            assert_eq!(instruction.to_string(), text);
        }
    }

    #[test]
    fn printf_declaration() {
        let declaration = Declaration {
            name: "printf",
            return_type: "i32",
            parameters: "ptr noundef, ...",
            attribute: AttributeId(0),
        };
        assert_eq!(
            declaration.to_string(),
            "declare i32 @printf(ptr noundef, ...) #0"
        );
    }
}
