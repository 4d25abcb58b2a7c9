use itertools::Itertools;

use super::attribute::{Attribute, AttributeId, AttributePool};
use super::{CodeGenContext, CodegenError, Constant, Declaration, Instruction};

/// What the module header and trailer say about the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub triple: String,
    pub datalayout: String,
    pub ident: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            triple: "x86_64-pc-linux-gnu".to_string(),
            datalayout: "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128"
                .to_string(),
            ident: concat!("hmmc version ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TargetConfig {
    pub fn with_triple(mut self, triple: impl Into<String>) -> Self {
        self.triple = triple.into();
        self
    }
}

const MAIN_FLAGS: [&str; 4] = ["noinline", "nounwind", "optnone", "uwtable"];

/// A fully generated compilation unit: one `main` plus whatever its body pulled in.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub target: TargetConfig,
    pub constants: Vec<Constant>,
    pub body: Vec<Instruction>,
    pub main_attribute: AttributeId,
    pub declarations: Vec<Declaration>,
    pub attributes: AttributePool,
}

impl Module {
    /// Closes the body with `ret i32 0` and registers the entry point's attributes. The body
    /// has already registered everything it references, so `main` always gets the last index.
    pub fn from_context(
        name: impl Into<String>,
        target: TargetConfig,
        mut ctx: CodeGenContext,
    ) -> Self {
        let main_attribute = ctx.add_attribute(Attribute::with(
            &MAIN_FLAGS,
            &[("min-legal-vector-width", "0")],
        ));
        let (body, constants, declarations, attributes) = ctx.into_parts();
        Self {
            name: name.into(),
            target,
            constants,
            body,
            main_attribute,
            declarations,
            attributes,
        }
    }

    fn preamble(&self) -> String {
        end_join([
            format!("; ModuleID = '{}'", self.name),
            format!("source_filename = \"{}\"", self.name),
            format!("target datalayout = \"{}\"", self.target.datalayout),
            format!("target triple = \"{}\"", self.target.triple),
        ])
    }

    fn main(&self) -> String {
        let body = self
            .body
            .iter()
            .map(|instruction| match instruction {
                // labels sit one level out
                Instruction::Block(_) => format!("{instruction}"),
                _ => format!("  {instruction}"),
            })
            .chain(std::iter::once("  ret i32 0".to_string()));
        end_join(
            [
                format!("; Function Attrs: {}", MAIN_FLAGS.join(" ")),
                format!("define dso_local i32 @main() {} {{", self.main_attribute),
            ]
            .into_iter()
            .chain(body)
            .chain(std::iter::once("}".to_string())),
        )
    }

    fn trailer(&self) -> String {
        end_join([
            "!llvm.module.flags = !{!0, !1, !2, !3, !4}".to_string(),
            "!llvm.ident = !{!5}".to_string(),
            String::new(),
            "!0 = !{i32 1, !\"wchar_size\", i32 4}".to_string(),
            "!1 = !{i32 7, !\"PIC Level\", i32 2}".to_string(),
            "!2 = !{i32 7, !\"PIE Level\", i32 2}".to_string(),
            "!3 = !{i32 7, !\"uwtable\", i32 1}".to_string(),
            "!4 = !{i32 7, !\"frame-pointer\", i32 2}".to_string(),
            format!("!5 = !{{!\"{}\"}}", self.target.ident),
        ])
    }

    /// Renders every section in order: header, constants, `main`, declarations, attributes
    /// and the metadata trailer.
    pub fn render(&self) -> Result<String, CodegenError> {
        let attributes = self
            .attributes
            .iter()
            .map(|attribute| attribute.definition().map(|def| def.to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            target: "irgen",
            "rendering module {:?}: {} constants, {} declarations, {} attributes",
            self.name,
            self.constants.len(),
            self.declarations.len(),
            attributes.len()
        );
        Ok([
            self.preamble(),
            end_join(self.constants.iter().map(ToString::to_string)),
            self.main(),
            end_join(self.declarations.iter().map(ToString::to_string)),
            end_join(attributes),
            self.trailer(),
        ]
        .join("\n"))
    }
}

/// Every line is terminated, including the last one.
fn end_join<I>(lines: I) -> String
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    lines.into_iter().map(|line| format!("{line}\n")).join("")
}
