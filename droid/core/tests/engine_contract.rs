use droid_core::{CoreError, Engine, Fault, Status, Suspension};
use proptest::prelude::*;

#[test]
fn add_in_place_then_halt() {
    let mut engine = Engine::new(vec![1, 0, 0, 0, 99]);
    assert_eq!(engine.resume().unwrap(), Suspension::Halted);
    assert_eq!(engine.memory().read(0).unwrap(), 2);
    assert_eq!(engine.status(), Status::Halted);
}

#[test]
fn immediate_destination_is_rejected_before_writing() {
    // add with mode 1 on the destination parameter
    let program = vec![10001, 5, 6, 0, 99, 7, 8];
    let mut engine = Engine::new(program.clone());
    match engine.resume().unwrap() {
        Suspension::Faulted(Fault {
            ip: 0,
            error: intcode::Error::ImmediateDestination { ip: 0 },
        }) => {}
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(engine.memory().image(), program.as_slice());
}

#[test]
fn relative_base_reads_own_instruction_word() {
    let mut engine = Engine::new(vec![109, 1, 204, -1, 99]);
    assert_eq!(engine.resume().unwrap(), Suspension::Halted);
    // 109 is 'm': not a line yet, it sits in the accumulator.
    assert_eq!(engine.take_partial_line().as_deref(), Some("m"));
    assert_eq!(engine.state().relative_base, 1);
}

#[test]
fn comparisons_store_flags() {
    let cases = [(8, 5, 5, 1), (8, 5, 6, 0), (7, 5, 6, 1)];
    for (op, a, b, expected) in cases {
        let mut engine = Engine::new(vec![1100 + op, a, b, 5, 99, -1]);
        assert_eq!(engine.resume().unwrap(), Suspension::Halted);
        assert_eq!(
            engine.memory().read(5).unwrap(),
            expected,
            "op {op} on ({a}, {b})"
        );
    }
}

#[test]
fn input_round_trip() {
    let mut engine = Engine::new(vec![3, 5, 99, 0, 0, 0]);
    assert_eq!(engine.resume().unwrap(), Suspension::AwaitingInput);
    assert_eq!(engine.status(), Status::AwaitingInput);
    assert_eq!(engine.state().ip, 0);
    assert_eq!(engine.memory().read(5).unwrap(), 0);

    engine.push_input(42);
    assert_eq!(engine.resume().unwrap(), Suspension::Halted);
    assert_eq!(engine.state().ip, 2);
    assert_eq!(engine.memory().read(5).unwrap(), 42);
}

#[test]
fn output_line_assembly() {
    let mut engine = Engine::new(vec![104, 65, 104, 66, 104, 10, 99]);
    assert_eq!(
        engine.resume().unwrap(),
        Suspension::LineReady("AB\n".to_string())
    );
    assert_eq!(engine.partial_line(), "");
    assert_eq!(engine.resume().unwrap(), Suspension::Halted);
    assert_eq!(engine.take_partial_line(), None);
}

#[test]
fn unknown_opcode_faults_and_stays_faulted() {
    let program = vec![1, 0, 0, 7, 55, 0, 0, 0];
    let mut engine = Engine::new(program);
    match engine.resume().unwrap() {
        Suspension::Faulted(fault) => {
            assert_eq!(fault.ip, 4);
            assert_eq!(
                fault.error,
                intcode::Error::UnknownOpcode { opcode: 55, ip: 4 }
            );
        }
        other => panic!("unexpected {other:?}"),
    }
    let after_fault = engine.memory().clone();
    assert_eq!(after_fault.read(7).unwrap(), 2);
    assert_eq!(engine.status(), Status::Faulted);
    assert!(engine.fault().is_some());

    assert!(matches!(
        engine.resume(),
        Err(CoreError::Terminated(Status::Faulted))
    ));
    assert_eq!(engine.memory(), &after_fault);
    assert_eq!(engine.events().next(), None);
}

#[test]
fn jump_to_negative_address_faults() {
    let mut engine = Engine::new(vec![1105, 1, -4]);
    assert!(matches!(
        engine.resume().unwrap(),
        Suspension::Faulted(Fault {
            ip: -4,
            error: intcode::Error::InvalidAddress(-4),
        })
    ));
}

#[test]
fn far_addresses_are_ordinary_memory() {
    for addr in [1i64 << 40, i64::MAX] {
        // [addr] = 1 + 0; out [addr]; hlt
        let mut engine = Engine::new(vec![1101, 1, 0, addr, 4, addr, 99]);
        assert_eq!(engine.resume().unwrap(), Suspension::Halted, "addr {addr}");
        assert_eq!(engine.take_partial_line().as_deref(), Some("\u{1}"));
        assert_eq!(engine.memory().read(addr).unwrap(), 1);
        assert_eq!(engine.memory().len(), 8);
    }
}

proptest! {
    #[test]
    fn arithmetic_matches_host(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        for (op, expected) in [(1, a + b), (2, a * b), (7, (a < b) as i64), (8, (a == b) as i64)] {
            let mut engine = Engine::new(vec![1100 + op, a, b, 5, 99, 0]);
            prop_assert_eq!(engine.resume().unwrap(), Suspension::Halted);
            prop_assert_eq!(engine.memory().read(5).unwrap(), expected);
        }
    }
}
