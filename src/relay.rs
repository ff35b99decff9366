//! Serial motor relay board.
//!
//! Each control action is sent as a four byte frame: sync byte, action code
//! and a big-endian 16-bit byte-sum checksum over the first two bytes.

use crate::collaborators::ControlSink;
use crate::constants::*;
use crate::error::Result;
use crate::types::ControlAction;
use log::debug;
use serialport::SerialPort;
use std::io::Write;
use std::time::Duration;

/// Control sink writing relay frames to a serial port
pub struct SerialRelay<P: Write> {
    port: P,
    print_tx: bool,
}

impl SerialRelay<Box<dyn SerialPort>> {
    /// Open the relay board on `port_name`
    pub fn open(port_name: &str) -> Result<Self> {
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(Duration::from_millis(TIMEOUT_MS))
            .stop_bits(STOP_BITS)
            .open()?;
        Ok(Self::new(port))
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }
}

impl<P: Write> SerialRelay<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            print_tx: false,
        }
    }

    /// Enable/disable debug printing of outgoing frames
    pub fn set_debug_print(&mut self, tx: bool) {
        self.print_tx = tx;
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Calculate checksum for payload
    fn checksum(payload: &[u8]) -> u16 {
        payload.iter().map(|&b| b as u16).sum()
    }

    /// Build the frame for `action`
    pub fn frame(action: ControlAction) -> [u8; 4] {
        let payload = [RELAY_SYNC_BYTE, action.code()];
        let [high, low] = Self::checksum(&payload).to_be_bytes();
        [payload[0], payload[1], high, low]
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        if self.print_tx {
            let debug_print: String = frame
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            debug!("Sending:  {}", debug_print);
        }
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }
}

impl<P: Write> ControlSink for SerialRelay<P> {
    fn actuate(&mut self, action: ControlAction) -> Result<()> {
        let frame = Self::frame(action);
        self.send(&frame)
    }
}
