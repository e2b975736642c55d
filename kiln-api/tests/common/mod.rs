//! Test helpers

#![allow(dead_code)]

use kiln_api::{Program, RunConfig};
use kiln_core::{Literal, Opcode, TriggerEvent};

pub fn program(ops: Vec<Opcode>) -> Program {
    Program::from_opcodes("session.ks", ops)
}

pub fn config() -> RunConfig {
    RunConfig {
        max_ticks: 100,
        ..RunConfig::default()
    }
}

pub fn on_key(entry: usize) -> Opcode {
    Opcode::AddTrigger {
        entry,
        event: TriggerEvent::Keypress,
    }
}

pub fn int(n: i32) -> Opcode {
    Opcode::Push(Literal::Int(n))
}

pub fn string(s: &str) -> Opcode {
    Opcode::Push(Literal::String(s.to_string()))
}
