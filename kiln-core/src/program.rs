//! Compiled program model
//!
//! A program is a flat list of opcodes, each tagged with the source position
//! it was compiled from. Jump, call and trigger targets are absolute indices
//! and are only validated when executed.

use crate::calculator::{Operator, UnaryOperator};
use crate::trigger::TriggerEvent;
use crate::value::{Value, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== SourceLocation ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ==================== Literal ====================

/// Constant operand of `Push`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i32),
    Double(f64),
    String(String),
    Bool(bool),
    Vector([f64; 3]),
}

impl Literal {
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Int(n) => Value::from(*n),
            Literal::Double(d) => Value::from(*d),
            Literal::String(s) => Value::from(s.as_str()),
            Literal::Bool(b) => Value::from(*b),
            Literal::Vector(v) => Value::from(Vector3::from(*v)),
        }
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int(n)
    }
}

impl From<f64> for Literal {
    fn from(d: f64) -> Self {
        Literal::Double(d)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<Vector3> for Literal {
    fn from(v: Vector3) -> Self {
        Literal::Vector([v.x, v.y, v.z])
    }
}

// ==================== Opcode ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "arg")]
pub enum Opcode {
    Push(Literal),
    PushVariable(String),
    /// Pop and assign (nearest existing variable, else innermost frame)
    Store(String),
    /// Pop and declare in the innermost frame
    StoreLocal(String),
    Unset(String),
    Pop,
    Dup,
    Swap,
    Binary(Operator),
    Unary(UnaryOperator),
    Jump(usize),
    JumpIfFalse(usize),
    JumpIfTrue(usize),
    /// Push a call frame and a function scope, then jump
    Call(usize),
    /// Leave the current call; at the outermost level ends the run
    Return,
    PushScope,
    PopScope,
    AddTrigger { entry: usize, event: TriggerEvent },
    RemoveTrigger { entry: usize },
    /// Pop a duration in seconds and yield until the physics clock passes it
    Wait,
    Print,
    Break,
    Nop,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Push(lit) => write!(f, "push {}", lit.to_value()),
            Opcode::PushVariable(name) => write!(f, "pushvar {name}"),
            Opcode::Store(name) => write!(f, "store {name}"),
            Opcode::StoreLocal(name) => write!(f, "storelocal {name}"),
            Opcode::Unset(name) => write!(f, "unset {name}"),
            Opcode::Pop => f.write_str("pop"),
            Opcode::Dup => f.write_str("dup"),
            Opcode::Swap => f.write_str("swap"),
            Opcode::Binary(op) => write!(f, "binary {}", op.symbol()),
            Opcode::Unary(op) => write!(f, "unary {op}"),
            Opcode::Jump(t) => write!(f, "jump @{t}"),
            Opcode::JumpIfFalse(t) => write!(f, "jumpfalse @{t}"),
            Opcode::JumpIfTrue(t) => write!(f, "jumptrue @{t}"),
            Opcode::Call(t) => write!(f, "call @{t}"),
            Opcode::Return => f.write_str("return"),
            Opcode::PushScope => f.write_str("pushscope"),
            Opcode::PopScope => f.write_str("popscope"),
            Opcode::AddTrigger { entry, event } => write!(f, "addtrigger @{entry} on {event}"),
            Opcode::RemoveTrigger { entry } => write!(f, "removetrigger @{entry}"),
            Opcode::Wait => f.write_str("wait"),
            Opcode::Print => f.write_str("print"),
            Opcode::Break => f.write_str("break"),
            Opcode::Nop => f.write_str("nop"),
        }
    }
}

// ==================== Program ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// One opcode per source line, starting at line 1
    pub fn from_opcodes(file: &str, opcodes: impl IntoIterator<Item = Opcode>) -> Self {
        let mut program = Self::new();
        for (i, opcode) in opcodes.into_iter().enumerate() {
            let line = u32::try_from(i + 1).unwrap_or(u32::MAX);
            program.push(opcode, SourceLocation::new(file, line, 1));
        }
        program
    }

    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Append an opcode, returning its index
    pub fn push(&mut self, opcode: Opcode, location: SourceLocation) -> usize {
        self.instructions.push(Instruction { opcode, location });
        self.instructions.len() - 1
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, ip: usize) -> Option<&Instruction> {
        self.instructions.get(ip)
    }

    /// Location of `ip`, or of the last instruction when `ip` is past the end
    pub fn location(&self, ip: usize) -> SourceLocation {
        self.instructions
            .get(ip)
            .or_else(|| self.instructions.last())
            .map(|inst| inst.location.clone())
            .unwrap_or_default()
    }
}
