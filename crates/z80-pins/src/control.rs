//! External control unit: halt, interrupt flip-flops and modes, request
//! latches and bus release.

use crate::datapath::Core;
use crate::signal::Level;
use crate::trace::{MicroInstruction, MicroKind};

/// Latched control state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ControlUnit {
    pub(crate) iff1: bool,
    pub(crate) iff2: bool,
    pub(crate) im: u8,
    pub(crate) halted: bool,
    pub(crate) nmi_pending: bool,
    pub(crate) int_pending: bool,
    pub(crate) busreq_pending: bool,
    pub(crate) bus_released: bool,
    /// Set by EI and prefix bytes: INT is not accepted at the end of the
    /// current instruction.
    pub(crate) defer_interrupts: bool,
    /// A falling edge on NMI was seen and not yet latched as pending.
    nmi_edge: bool,
    nmi_low: bool,
}

/// What the sequencer starts at an instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Nmi,
    Interrupt,
    HaltLoop,
    Fetch,
}

impl ControlUnit {
    /// Track the NMI line every half period; the edge is kept until the
    /// next sampling point.
    pub(crate) fn watch_nmi(&mut self, level: Level) {
        let low = level.is_low();
        if low && !self.nmi_low {
            self.nmi_edge = true;
        }
        self.nmi_low = low;
    }

    pub(crate) fn sample_busreq(&mut self, level: Level) {
        self.busreq_pending = level.is_low();
    }

    /// Sampling point at the end of an instruction.
    pub(crate) fn sample_interrupts(&mut self, int: Level) {
        if self.nmi_edge {
            self.nmi_edge = false;
            self.nmi_pending = true;
        }
        self.int_pending = int.is_low() && self.iff1 && !self.defer_interrupts;
    }

    pub(crate) fn next_service(&self) -> Service {
        if self.nmi_pending {
            Service::Nmi
        } else if self.int_pending && self.iff1 {
            Service::Interrupt
        } else if self.halted {
            Service::HaltLoop
        } else {
            Service::Fetch
        }
    }

    /// Back to the power-on state. The NMI line keeps its level, so a line
    /// already LOW is not a new edge.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            nmi_low: self.nmi_low,
            ..Self::default()
        };
    }

    /// Take `level` as the NMI line's current state without an edge.
    pub(crate) fn settle_nmi(&mut self, level: Level) {
        self.nmi_low = level.is_low();
        self.nmi_edge = false;
    }

    #[must_use]
    pub(crate) fn snapshot(&self) -> ControlState {
        ControlState {
            iff1: self.iff1,
            iff2: self.iff2,
            im: self.im,
            halted: self.halted,
            nmi_pending: self.nmi_pending,
            int_pending: self.int_pending,
            busreq_pending: self.busreq_pending,
            bus_released: self.bus_released,
        }
    }
}

/// Read-only view of the control unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlState {
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
    pub nmi_pending: bool,
    pub int_pending: bool,
    pub busreq_pending: bool,
    pub bus_released: bool,
}

impl Core {
    pub(crate) fn set_interrupt_enable(&mut self, iff1: bool, iff2: bool) {
        let control = &mut self.control;
        if (control.iff1, control.iff2) != (iff1, iff2) {
            control.iff1 = iff1;
            control.iff2 = iff2;
            self.emit(MicroInstruction::with_value(
                MicroKind::InterruptEnableChanged,
                u16::from(iff1) | u16::from(iff2) << 1,
            ));
        }
    }

    pub(crate) fn set_interrupt_mode(&mut self, im: u8) {
        if self.control.im != im {
            self.control.im = im;
            self.emit(MicroInstruction::with_value(
                MicroKind::InterruptModeChanged,
                u16::from(im),
            ));
        }
    }

    /// Hold off INT acceptance until after the next instruction.
    pub(crate) fn defer_interrupts(&mut self) {
        self.control.defer_interrupts = true;
    }

    /// Stop at the HALT opcode: PC points back at it.
    pub(crate) fn enter_halt(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_sub(1);
        self.control.halted = true;
        self.emit(MicroInstruction::new(MicroKind::HaltEntered));
    }

    fn leave_halt(&mut self) {
        if self.control.halted {
            self.control.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
            self.emit(MicroInstruction::new(MicroKind::HaltExited));
        }
    }

    pub(crate) fn accept_nmi(&mut self) {
        self.leave_halt();
        self.control.nmi_pending = false;
        let iff2 = self.control.iff2;
        self.set_interrupt_enable(false, iff2);
        self.emit(MicroInstruction::new(MicroKind::NmiAccepted));
    }

    pub(crate) fn accept_interrupt(&mut self) {
        self.leave_halt();
        self.control.int_pending = false;
        self.set_interrupt_enable(false, false);
        self.emit(MicroInstruction::with_value(
            MicroKind::InterruptAccepted,
            u16::from(self.control.im),
        ));
    }
}
