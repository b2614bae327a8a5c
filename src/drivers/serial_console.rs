use embedded_hal::serial;

/// Line-oriented console over any blocking-capable serial transmitter.
///
/// Also a `ufmt` sink, so `uwrite!` works on it directly.
pub struct SerialConsole<W> {
    tx: W,
}

impl<W: serial::Write<u8>> SerialConsole<W> {
    pub fn new(tx: W) -> Self {
        Self { tx }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), W::Error> {
        nb::block!(self.tx.write(byte))
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), W::Error> {
        for byte in s.bytes() {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    pub fn write_line(&mut self, s: &str) -> Result<(), W::Error> {
        self.write_str(s)?;
        self.write_str("\r\n")
    }

    // Debug helper - print hex value
    pub fn write_hex(&mut self, val: u8) -> Result<(), W::Error> {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        self.write_byte(HEX_CHARS[(val >> 4) as usize])?;
        self.write_byte(HEX_CHARS[(val & 0xF) as usize])
    }

    /// `label: 0xVV` on its own line.
    pub fn debug(&mut self, label: &str, val: u8) -> Result<(), W::Error> {
        self.write_str(label)?;
        self.write_str(": 0x")?;
        self.write_hex(val)?;
        self.write_str("\r\n")
    }

    pub fn flush(&mut self) -> Result<(), W::Error> {
        nb::block!(self.tx.flush())
    }

    pub fn release(self) -> W {
        self.tx
    }
}

impl<W: serial::Write<u8>> ufmt::uWrite for SerialConsole<W> {
    type Error = W::Error;

    fn write_str(&mut self, s: &str) -> Result<(), W::Error> {
        SerialConsole::write_str(self, s)
    }
}
