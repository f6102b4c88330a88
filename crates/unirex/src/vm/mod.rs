// Backtracking virtual machine
// Bytecode layout, compiled programs, and the matcher itself.

mod checks;
mod executor;
pub mod limits;
mod matches;
pub mod opcode;
mod program;

pub use checks::{Deadline, DepthLimit, NoChecks, ResourceChecks, StepLimit};
pub use executor::{execute, AbortReason, Captures, MatchOutcome};
pub use matches::Matches;
pub use opcode::OpCode;
pub use program::{Flags, GroupNames, Program};
