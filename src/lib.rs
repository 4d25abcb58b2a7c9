pub mod ast;
pub mod error;
pub mod eval;
pub mod grammar;
pub mod ir;

pub use grammar::{parse_source, Parsed};

use error::SourceMetadata;
use ir::module::TargetConfig;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Parse(#[from] grammar::ParseError),
    #[error("error while generating code: {0}")]
    Codegen(#[from] ir::CodegenError),
}

/// Output of a successful compilation.
#[derive(Debug)]
pub struct Compiled<'source> {
    pub ir: String,
    pub warnings: Vec<grammar::Warning<'source>>,
}

/// Lexes, parses and lowers `source` into a textual LLVM module called `module_name`.
pub fn compile<'source>(
    source: &SourceMetadata<'source>,
    module_name: &str,
    target: &TargetConfig,
) -> Result<Compiled<'source>, CompileError> {
    let Parsed { program, warnings } = parse_source(source)?;
    tracing::info!(target: "irgen", "generating module {module_name:?}");
    let ir = ir::generate::compile_program(&program, module_name, target)?;
    Ok(Compiled { ir, warnings })
}
