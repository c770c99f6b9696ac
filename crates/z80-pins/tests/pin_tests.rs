//! Half-by-half pin behaviour, driven directly through a `PinBoard`.

use std::cell::RefCell;
use std::rc::Rc;

use emu_core::{Observable, SimpleBus, Value};
use z80_pins::{
    Board, BusConflict, BusName, ConflictPolicy, Coordinate, Driver, Fault, InputPin, Level,
    MicroInstruction, MicroKind, OutputPin, PinBank, PinBoard, Registers, Z80, Z80Config,
};

/// A CPU whose data pins are held at `byte` by an external driver, so every
/// fetch and read sees it.
fn cpu_reading(byte: u8, config: Z80Config) -> Z80<PinBoard> {
    let mut cpu = Z80::with_config(PinBoard::new(), config);
    cpu.pins_mut()
        .drive_data(Driver::External, byte)
        .expect("data bus starts released");
    cpu
}

fn record(cpu: &mut Z80<impl PinBank>) -> Rc<RefCell<Vec<MicroInstruction>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    cpu.attach_trace(move |event: &MicroInstruction| sink.borrow_mut().push(*event));
    events
}

#[test]
fn test_opcode_fetch_pin_sequence() {
    let mut cpu = cpu_reading(0x00, Z80Config::default());
    let mut regs = cpu.registers();
    regs.pc = 0x1234;
    regs.i = 0x3F;
    regs.r = 0x00;
    cpu.set_registers(regs);

    // (M1, MREQ, RD, RFSH) asserted, address pins
    let expected = [
        (true, false, false, false, 0x1234),
        (true, true, true, false, 0x1234),
        (true, true, true, false, 0x1234),
        (true, true, true, false, 0x1234),
        (false, false, false, true, 0x3F00),
        (false, true, false, true, 0x3F00),
        (false, true, false, true, 0x3F00),
        (false, false, false, true, 0x3F00),
    ];
    for (index, &(m1, mreq, rd, rfsh, address)) in expected.iter().enumerate() {
        cpu.advance_half_t_state();
        let half = index as u8 + 1;
        assert_eq!(cpu.coordinate(), Coordinate::new(1, half));
        let pins = cpu.pins();
        assert_eq!(pins.asserted(OutputPin::M1), m1, "M1 at half {half}");
        assert_eq!(pins.asserted(OutputPin::Mreq), mreq, "MREQ at half {half}");
        assert_eq!(pins.asserted(OutputPin::Rd), rd, "RD at half {half}");
        assert_eq!(pins.asserted(OutputPin::Rfsh), rfsh, "RFSH at half {half}");
        assert!(!pins.asserted(OutputPin::Iorq));
        assert!(!pins.asserted(OutputPin::Wr));
        assert_eq!(pins.address(), Some(address), "address at half {half}");
    }
    assert!(cpu.instruction_complete());
    assert_eq!(cpu.mnemonic(), "NOP");
    let regs = cpu.registers();
    assert_eq!(regs.pc, 0x1235);
    assert_eq!(regs.r, 0x01);
}

#[test]
fn test_refresh_keeps_r_bit_7() {
    let mut cpu = cpu_reading(0x00, Z80Config::default());
    let mut regs = cpu.registers();
    regs.r = 0xFF;
    cpu.set_registers(regs);
    for _ in 0..8 {
        cpu.advance_half_t_state();
    }
    assert_eq!(cpu.registers().r, 0x80);
}

#[test]
fn test_memory_write_holds_data_around_wr() {
    let mut bus = SimpleBus::new();
    // LD A,5Ah ; LD (8000h),A
    bus.load(0x0000, &[0x3E, 0x5A, 0x32, 0x00, 0x80]);
    let mut board = Board::new(bus);
    let events = record(board.cpu_mut());

    assert_eq!(board.step(), 7);
    assert_eq!(board.step(), 13);
    assert_eq!(board.bus().peek(0x8000), 0x5A);

    let events = events.borrow();
    let find = |wanted: MicroInstruction| {
        events
            .iter()
            .position(|event| *event == wanted)
            .unwrap_or_else(|| panic!("{wanted:?} never traced"))
    };
    let address = find(MicroInstruction::with_value(MicroKind::AddressDriven, 0x8000));
    let mreq_low = events
        .iter()
        .rposition(|event| *event == MicroInstruction::pin_changed(OutputPin::Mreq, Level::Low))
        .expect("MREQ asserted");
    let driven = find(MicroInstruction::with_value(MicroKind::DataDriven, 0x5A));
    let wr_low = find(MicroInstruction::pin_changed(OutputPin::Wr, Level::Low));
    let wr_high = find(MicroInstruction::pin_changed(OutputPin::Wr, Level::High));
    let released = find(MicroInstruction::new(MicroKind::DataReleased));

    assert!(address < driven);
    assert!(mreq_low < wr_low);
    assert!(driven < wr_low, "data must be stable before WR falls");
    assert!(wr_low < wr_high);
    assert!(wr_high < released, "data must be held until WR rises");
}

#[test]
fn test_io_write_strobes_iorq_with_wr() {
    let mut bus = SimpleBus::new();
    // LD A,77h ; OUT (FEh),A
    bus.load(0x0000, &[0x3E, 0x77, 0xD3, 0xFE]);
    let mut board = Board::new(bus);
    board.step();
    assert_eq!(board.step(), 11);
    assert_eq!(board.bus().port_writes(), &[(0x77FE, 0x77)]);
    assert_eq!(board.cpu().registers().wz, 0x77FF);
}

#[test]
fn test_io_read_fills_a() {
    let mut bus = SimpleBus::new();
    // LD A,12h ; IN A,(34h)
    bus.load(0x0000, &[0x3E, 0x12, 0xDB, 0x34]);
    bus.set_port(0x1234, 0xA5);
    let mut board = Board::new(bus);
    board.step();
    assert_eq!(board.step(), 11);
    assert_eq!(board.cpu().registers().a, 0xA5);
}

#[test]
fn test_wait_stretches_the_fetch() {
    let mut cpu = cpu_reading(0x00, Z80Config::default());
    cpu.pins_mut().set_input(InputPin::Wait, Level::Low);

    for _ in 0..4 {
        cpu.advance_half_t_state();
    }
    assert_eq!(cpu.coordinate(), Coordinate::new(1, 4));

    // Three wait states; WAIT is looked at again on each TW falling edge.
    for tick in 5..=10 {
        if tick == 10 {
            cpu.pins_mut().set_input(InputPin::Wait, Level::High);
        }
        cpu.advance_half_t_state();
        assert_eq!(cpu.coordinate(), Coordinate::new(1, 4), "tick {tick}");
        assert!(cpu.pins().asserted(OutputPin::Rd));
    }

    for _ in 11..14 {
        cpu.advance_half_t_state();
        assert!(!cpu.instruction_complete());
    }
    cpu.advance_half_t_state();
    assert!(cpu.instruction_complete());
    assert_eq!(cpu.half_ticks().get(), 14);
}

#[test]
fn test_wait_is_ignored_outside_its_sampling_half() {
    let mut cpu = cpu_reading(0x00, Z80Config::default());
    for _ in 0..4 {
        cpu.advance_half_t_state();
    }
    cpu.pins_mut().set_input(InputPin::Wait, Level::Low);
    for _ in 0..4 {
        cpu.advance_half_t_state();
    }
    assert!(cpu.instruction_complete());
}

#[test]
fn test_board_step_counts_wait_states() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0x00]);
    let mut board = Board::new(bus);
    board.set_input(InputPin::Wait, Level::Low);
    for _ in 0..5 {
        board.tick();
    }
    board.set_input(InputPin::Wait, Level::High);
    board.step();
    // Four T-states plus one TW.
    assert_eq!(board.cpu().half_ticks().get(), 10);
}

#[test]
fn test_reset_needs_a_minimum_hold() {
    let mut cpu = cpu_reading(0x00, Z80Config::default());
    let mut regs = cpu.registers();
    regs.set_bc(0x1234);
    regs.a = 0x12;
    regs.sp = 0x4000;
    cpu.set_registers(regs);

    for _ in 0..3 {
        cpu.advance_half_t_state();
    }
    cpu.pins_mut().set_input(InputPin::Reset, Level::Low);

    // Five halves LOW are not enough; the fetch carries on.
    for _ in 0..5 {
        cpu.advance_half_t_state();
    }
    assert_eq!(cpu.coordinate(), Coordinate::new(1, 8));
    assert_eq!(cpu.registers().pc, 1);

    cpu.advance_half_t_state();
    let regs = cpu.registers();
    assert_eq!(regs.pc, 0);
    assert_eq!(regs.af(), 0xFFFF);
    assert_eq!(regs.sp, 0xFFFF);
    assert_eq!((regs.i, regs.r), (0, 0));
    assert_eq!(regs.bc(), 0x1234, "general registers survive reset");
    let control = cpu.control();
    assert!(!control.iff1 && !control.iff2);
    assert_eq!(control.im, 0);
    for pin in OutputPin::ALL {
        assert_eq!(cpu.pins().output(pin), Level::High, "{}", pin.name());
    }
    assert_eq!(cpu.pins().address(), None);

    // Held: nothing moves.
    for _ in 0..10 {
        cpu.advance_half_t_state();
    }
    assert_eq!(cpu.coordinate(), Coordinate::new(1, 0));
    assert_eq!(cpu.pins().address(), None);

    cpu.pins_mut().set_input(InputPin::Reset, Level::High);
    cpu.advance_half_t_state();
    assert_eq!(cpu.coordinate(), Coordinate::new(1, 1));
    assert_eq!(cpu.pins().address(), Some(0x0000));
}

#[test]
fn test_reset_truncates_a_long_instruction() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0xC3, 0x00, 0x90]);
    let mut board = Board::new(bus);
    for _ in 0..10 {
        board.tick();
    }
    board.set_input(InputPin::Reset, Level::Low);
    for _ in 0..6 {
        board.tick();
    }
    board.set_input(InputPin::Reset, Level::High);
    assert_eq!(board.cpu().registers().pc, 0);
    assert_eq!(board.step(), 10);
    assert_eq!(board.cpu().registers().pc, 0x9000);
}

#[test]
fn test_reset_is_traced() {
    let mut cpu = Z80::new(PinBoard::new());
    let events = record(&mut cpu);
    cpu.reset();
    assert_eq!(*events.borrow(), [MicroInstruction::new(MicroKind::Reset)]);
}

#[test]
fn test_bus_conflict_is_recorded() {
    let config = Z80Config {
        conflict_policy: ConflictPolicy::Record,
        ..Z80Config::default()
    };
    // 0xC7 is RST 00h: its pushes collide with the external driver.
    let mut cpu = cpu_reading(0xC7, config);
    let events = record(&mut cpu);
    for _ in 0..22 {
        cpu.advance_half_t_state();
    }
    assert!(cpu.instruction_complete());
    assert_eq!(
        cpu.last_fault(),
        Some(Fault::BusConflict(BusConflict {
            bus: BusName::Data,
            holder: Driver::External,
            contender: Driver::Cpu,
        }))
    );
    assert_eq!(cpu.pins().data(), Some(0xC7));
    let conflicts = events
        .borrow()
        .iter()
        .filter(|event| event.kind == MicroKind::BusConflict)
        .count();
    assert_eq!(conflicts, 2);
}

#[test]
#[should_panic(expected = "Cpu drove the data bus while External held it")]
fn test_bus_conflict_panics_when_configured() {
    let config = Z80Config {
        conflict_policy: ConflictPolicy::Panic,
        ..Z80Config::default()
    };
    let mut cpu = cpu_reading(0xC7, config);
    for _ in 0..22 {
        cpu.advance_half_t_state();
    }
}

#[test]
fn test_external_master_owns_the_buses_while_released() {
    let mut cpu = cpu_reading(0x00, Z80Config::default());
    cpu.pins_mut().set_input(InputPin::Busreq, Level::Low);
    for _ in 0..9 {
        cpu.advance_half_t_state();
    }
    assert!(cpu.control().bus_released);
    assert_eq!(cpu.pins().address_driver(), None);

    let pins = cpu.pins_mut();
    pins.drive_address(Driver::External, 0x4000)
        .expect("released address bus");
    pins.drive_data(Driver::External, 0x99)
        .expect("released data bus");
    cpu.advance_half_t_state();
    assert_eq!(cpu.pins().address(), Some(0x4000));

    let pins = cpu.pins_mut();
    pins.release_address(Driver::External);
    pins.release_data(Driver::External);
    pins.set_input(InputPin::Busreq, Level::High);
    cpu.advance_half_t_state();
    cpu.advance_half_t_state();
    assert_eq!(cpu.pins().address_driver(), Some(Driver::Cpu));
    assert_eq!(cpu.pins().address(), Some(0x0001));
    assert_eq!(cpu.last_fault(), None);
}

#[test]
fn test_unsupported_opcodes_run_as_four_t_state_no_ops() {
    let mut bus = SimpleBus::new();
    // CB 00 ; ADD A,B
    bus.load(0x0000, &[0xCB, 0x00, 0x80]);
    let mut board = Board::new(bus);

    assert_eq!(board.step(), 8);
    assert_eq!(
        board.cpu().last_fault(),
        Some(Fault::UnsupportedOpcode {
            prefix: Some(0xCB),
            opcode: 0x00,
            pc: 0x0001,
        })
    );

    assert_eq!(board.step(), 4);
    assert_eq!(
        board.cpu().last_fault(),
        Some(Fault::UnsupportedOpcode {
            prefix: None,
            opcode: 0x80,
            pc: 0x0002,
        })
    );
    assert_eq!(board.cpu().unsupported_opcodes(), 2);
    assert_eq!(board.cpu().registers().pc, 0x0003);
}

#[test]
fn test_unknown_ed_opcodes_are_two_byte_no_ops() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0xED, 0x00]);
    let mut board = Board::new(bus);
    assert_eq!(board.step(), 8);
    assert_eq!(board.cpu().mnemonic(), "NOP*");
    assert_eq!(board.cpu().last_fault(), None);
}

#[test]
fn test_observable_reports_state() {
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &[0x3E, 0x5A]);
    let mut board = Board::new(bus);
    board.step();
    let cpu = board.cpu();
    assert_eq!(cpu.query("a"), Some(Value::U8(0x5A)));
    assert_eq!(cpu.query("pc"), Some(Value::U16(0x0002)));
    assert_eq!(cpu.query("instruction"), Some(Value::Str("LD r,n")));
    assert_eq!(cpu.query("coordinate.machine_cycle"), Some(Value::U8(2)));
    assert_eq!(cpu.query("coordinate.half_t"), Some(Value::U8(6)));
    assert_eq!(cpu.query("instructions"), Some(Value::U64(1)));
    assert_eq!(cpu.query("ticks"), Some(Value::U64(14)));
    assert_eq!(cpu.query("pins.mreq"), Some(Value::Str("high")));
    assert_eq!(cpu.query("flags.z"), Some(Value::Bool(true)));
}

#[test]
fn test_trace_events_serialize() {
    let event = MicroInstruction::pin_changed(OutputPin::Busack, Level::Low);
    let json = serde_json::to_string(&event).expect("serialize");
    let back: MicroInstruction = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, event);

    let regs = Registers {
        a: 0x12,
        ix: 0xBEEF,
        wz: 0x8007,
        ..Registers::default()
    };
    let json = serde_json::to_string(&regs).expect("serialize");
    let back: Registers = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, regs);
}
