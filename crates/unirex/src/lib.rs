// Unicode regex engine
// A compact backtracking matcher with a bytecode compiler and a
// Unicode text normalizer.

#[cfg(test)]
mod test;

pub mod compiler;
pub mod unicode;
pub mod vm;

pub use compiler::{compile, CompileError, CompileErrorKind};
pub use unicode::{normalize, normalize_str, AllocError, NormalizationForm};
pub use vm::{
    execute, AbortReason, Captures, Deadline, DepthLimit, Flags, GroupNames, MatchOutcome,
    Matches, NoChecks, Program, ResourceChecks, StepLimit,
};
