//! Session tests
//!
//! A CPU hosted behind the update handler with keyboard input.

mod common;
use common::*;
use kiln_api::{load_program, run, run_with_input, KilnError, Key, Session, SliceStatus, Value};
use kiln_core::{ExecutionState, Literal, Opcode, Operator};

/// Waits for keys forever, appending each typed character to `line`
fn echo_program() -> Vec<Opcode> {
    vec![
        string(""),
        Opcode::Store("line".into()),
        on_key(5),
        Opcode::Jump(3), // 3: spin
        Opcode::Nop,
        Opcode::PushVariable("line".into()), // 5: payload is below on the stack
        Opcode::Swap,
        Opcode::Binary(Operator::Add),
        Opcode::Store("line".into()),
        Opcode::Return,
    ]
}

#[test]
fn test_typed_keys_reach_triggers() {
    let config = config();
    let mut session = Session::new(&config);
    session.load(program(echo_program()));
    session.tick(&config).unwrap();

    session.type_text("go");
    // keys are delivered on the next frame, run on the following physics step
    session.tick(&config).unwrap();
    assert_eq!(session.cpu().global("line"), Some(&Value::from("go")));
}

#[test]
fn test_keys_reach_triggers_while_locked() {
    let config = config();
    let mut session = Session::new(&config);
    session.load(program(echo_program()));
    session.tick(&config).unwrap();

    session.input().lock();
    session.press(Key::Char('x'));
    session.tick(&config).unwrap();
    assert_eq!(session.cpu().global("line"), Some(&Value::from("x")));
    assert_eq!(session.input().take_typed(), "");
}

#[test]
fn test_break_key_aborts_immediately() {
    let config = config();
    let mut session = Session::new(&config);
    session.load(program(echo_program()));
    session.tick(&config).unwrap();
    assert_eq!(session.cpu().state(), ExecutionState::Running);

    session.press(Key::Break);
    assert!(session.is_idle());
    // written variables survive
    assert_eq!(session.cpu().global("line"), Some(&Value::from("")));
}

#[test]
fn test_trigger_fault_becomes_nag() {
    let config = config();
    let mut session = Session::new(&config);
    session.load(program(vec![
        on_key(3),
        Opcode::Jump(1),
        Opcode::Nop,
        Opcode::PushVariable("missing".into()), // 3
        Opcode::Return,
    ]));
    session.tick(&config).unwrap();
    session.press(Key::Char('k'));
    let outcomes = session.tick(&config).unwrap();

    assert_eq!(outcomes[0].status, SliceStatus::BudgetExhausted);
    let nags = session.diagnostics().pending_nags();
    assert_eq!(nags.len(), 1);
    assert!(nags[0].contains("undefined variable 'missing'"));
    assert!(session.diagnostics().pending_nags().is_empty());
    assert_eq!(session.take_trigger_faults().len(), 1);
}

#[test]
fn test_run_waits_on_physics_clock() {
    let config = config();
    let result = run(
        program(vec![
            string("before"),
            Opcode::Print,
            Opcode::Push(Literal::Double(0.1)),
            Opcode::Wait,
            string("after"),
            Opcode::Print,
        ]),
        &config,
    )
    .unwrap();
    assert_eq!(result.output, vec!["before", "after"]);
    assert!(result.ticks >= 5, "waited only {} ticks", result.ticks);
    assert_eq!(result.status, SliceStatus::Finished);
}

#[test]
fn test_run_reports_main_fault() {
    let err = run(
        program(vec![int(1), string("x"), Opcode::Binary(Operator::Subtract)]),
        &config(),
    )
    .unwrap_err();
    let report = err.to_report();
    assert_eq!(report.phase, "dispatch");
    assert_eq!(report.line, Some(3));
    assert_eq!(report.error_kind, "UnsupportedOperation");
}

#[test]
fn test_run_tick_limit() {
    let err = run(program(vec![Opcode::Jump(0)]), &config()).unwrap_err();
    assert_eq!(err, KilnError::TickLimit(100));
}

#[test]
fn test_teardown_detaches_cpu() {
    let config = config();
    let mut session = Session::new(&config);
    session.load(program(vec![Opcode::Jump(0)]));
    session.tick(&config).unwrap();
    assert_eq!(session.handler().fixed_observer_count(), 1);

    session.diagnostics().add_nag(kiln_core::NagKind::Forever, "stale");
    session.teardown();
    assert!(session.is_idle());
    assert_eq!(session.handler().observer_count(), 0);
    assert_eq!(session.handler().fixed_observer_count(), 0);
    assert!(!session.diagnostics().has_pending());
    assert!(session.tick(&config).unwrap().is_empty());
}

#[test]
fn test_code_fragment_lists_program() {
    let mut session = Session::new(&config());
    session.load(program(vec![int(1), Opcode::Print]));
    let listing = session.code_fragment();
    assert!(listing.contains("session.ks"));
    assert!(listing.contains("print"));
}

#[test]
fn test_run_with_input_types_one_key_per_tick() {
    let ops = vec![
        Opcode::Push(Literal::Bool(false)),
        Opcode::Store("done".into()),
        on_key(6),
        Opcode::PushVariable("done".into()), // 3
        Opcode::JumpIfFalse(3),
        Opcode::Jump(11),
        Opcode::Print, // 6: prints the key
        Opcode::Push(Literal::Bool(true)),
        Opcode::Store("done".into()),
        Opcode::Return,
        Opcode::Nop,
    ];
    let result = run_with_input(program(ops), &config(), "hi").unwrap();
    // 'h' is delivered before the first slice registers the trigger
    assert_eq!(result.output, vec!["i"]);
    assert_eq!(result.ticks, 2);
}

#[test]
fn test_countdown_demo() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/countdown/boot.json");
    let program = load_program(&std::fs::read_to_string(path).unwrap()).unwrap();
    let result = run_with_input(program, &config(), "xq").unwrap();
    assert_eq!(result.output, vec!["3", "q", "2", "1", "liftoff"]);
    assert_eq!(result.status, SliceStatus::Finished);
    assert!(result.trigger_faults.is_empty());
}
