//! Transport abstraction: any byte-oriented channel to the peer board.
//!
//! The comms task is generic over `Transport`, so moving the link from
//! the UART to another medium needs no change to the protocol logic.

/// Byte-oriented transport channel.
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes. Returns 0 if nothing is pending
    /// (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`. Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Write all of `data`, looping over short writes.
    fn write_all(&mut self, mut data: &[u8]) -> Result<(), Self::Error> {
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                break;
            }
            data = &data[n..];
        }
        Ok(())
    }
}

/// Discards all writes and never reads. Used when the board runs
/// without a peer attached.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}
