// Pattern compiler - main module
// Parses a pattern under a flag set and lowers it to matcher bytecode.

mod ast;
mod codegen;
mod error;
mod parser;
mod reader;

pub use error::{CompileError, CompileErrorKind};

use crate::vm::{Flags, GroupNames, Program};

/// Compile `pattern` into an immutable [`Program`].
///
/// Errors identify the code-point offset of the offending token so the
/// caller can underline it in the pattern text.
pub fn compile(pattern: &str, flags: Flags) -> Result<Program, CompileError> {
    let chars: Vec<char> = pattern.chars().collect();
    let parsed = parser::parse(&chars, flags)?;
    let code = codegen::generate(&parsed.node, flags);

    let program = Program {
        code: code.into_boxed_slice(),
        flags,
        group_count: parsed.capture_count + 1,
        group_names: GroupNames::new(parsed.names),
    };
    log::debug!(
        "compiled pattern ({} code points) to {} bytes, {} groups",
        chars.len(),
        program.code.len(),
        program.group_count
    );
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("bytecode:\n{}", program.disassemble());
    }
    Ok(program)
}
