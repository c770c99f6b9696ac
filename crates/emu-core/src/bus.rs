//! Memory and I/O bus interface.

use std::collections::HashMap;

/// Memory and I/O bus interface.
///
/// Host-side devices answer the transactions a CPU signals on its pins
/// through this trait. The bus handles address decoding and routing to the
/// appropriate device.
pub trait Bus {
    /// Read a byte from the given memory address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given memory address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte from an I/O port. The full 16-bit address is passed.
    fn io_read(&mut self, port: u16) -> u8;

    /// Write a byte to an I/O port. The full 16-bit address is passed.
    fn io_write(&mut self, port: u16, value: u8);
}

/// Flat 64 KiB RAM with a port table, for tests and simple hosts.
///
/// Unmapped ports read as `0xFF` (floating bus with pull-ups). Port writes
/// are recorded in order so tests can assert on them.
pub struct SimpleBus {
    ram: Box<[u8; 0x1_0000]>,
    ports: HashMap<u16, u8>,
    port_writes: Vec<(u16, u8)>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x1_0000]),
            ports: HashMap::new(),
            port_writes: Vec::new(),
        }
    }

    /// Copy `bytes` into RAM starting at `address`, wrapping at 64 KiB.
    pub fn load(&mut self, address: u16, bytes: &[u8]) {
        let mut addr = address;
        for &byte in bytes {
            self.ram[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read RAM without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    /// Preset the value an `io_read` of `port` returns.
    pub fn set_port(&mut self, port: u16, value: u8) {
        self.ports.insert(port, value);
    }

    /// Every port write seen so far, oldest first.
    #[must_use]
    pub fn port_writes(&self) -> &[(u16, u8)] {
        &self.port_writes
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.ports.get(&port).copied().unwrap_or(0xFF)
    }

    fn io_write(&mut self, port: u16, value: u8) {
        self.port_writes.push((port, value));
    }
}
