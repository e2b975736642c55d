//! Kiln Core - cooperative bytecode runtime (pure logic, no IO)
//!
//! Contains the value model, the arithmetic dispatcher, the variable
//! environment, the trigger registry, the update handler and the CPU that
//! executes compiled programs a bounded slice at a time.
//!
//! Configuration and loggers are passed explicitly, never read from global state.

pub mod calculator;
pub mod cpu;
pub mod diagnostics;
pub mod error;
pub mod program;
pub mod trigger;
pub mod update;
pub mod value;
pub mod variable;

// Re-export common types
pub use calculator::{Calculator, Dispatcher, OperandPair, Operator, UnaryOperator};
pub use cpu::{Clock, Cpu, ExecutionState, SliceOutcome, SliceStatus, TickReport, TriggerFault};
pub use diagnostics::{DiagnosticsContext, NagKind};
pub use error::{ControlError, DispatchError, Fault, FaultKind};
pub use program::{Instruction, Literal, Opcode, Program, SourceLocation};
pub use trigger::{Delegate, TriggerEvent, TriggerRegistry};
pub use update::{FixedUpdateObserver, ObserverHandle, UpdateHandler, UpdateObserver};
pub use value::{HostObject, ScalarValue, Value, ValueKind, Vector3};
pub use variable::{Environment, Scope, ScopeStack, Variable};

// Re-export config types from kiln-config
pub use kiln_config::{CpuConfig, LimitConfig, Phase};
