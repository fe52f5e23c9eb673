//! Instruction data deserialization helpers
//!
//! Bounds-checked reads from the raw instruction byte slice. Truncated
//! input fails with `InvalidInstruction`, never panics.

use crate::error::StakingError;
use pinocchio::pubkey::Pubkey;

/// Read a u8 from instruction data
#[inline]
pub fn read_u8(data: &[u8], offset: usize) -> Result<u8, StakingError> {
    if offset >= data.len() {
        return Err(StakingError::InvalidInstruction);
    }
    Ok(data[offset])
}

/// Read a u16 (little-endian) from instruction data
#[inline]
pub fn read_u16(data: &[u8], offset: usize) -> Result<u16, StakingError> {
    if offset + 2 > data.len() {
        return Err(StakingError::InvalidInstruction);
    }
    let mut bytes = [0u8; 2];
    bytes.copy_from_slice(&data[offset..offset + 2]);
    Ok(u16::from_le_bytes(bytes))
}

/// Read a u64 (little-endian) from instruction data
#[inline]
pub fn read_u64(data: &[u8], offset: usize) -> Result<u64, StakingError> {
    if offset + 8 > data.len() {
        return Err(StakingError::InvalidInstruction);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    Ok(u64::from_le_bytes(bytes))
}

/// Read a u128 (little-endian) from instruction data
#[inline]
pub fn read_u128(data: &[u8], offset: usize) -> Result<u128, StakingError> {
    if offset + 16 > data.len() {
        return Err(StakingError::InvalidInstruction);
    }
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&data[offset..offset + 16]);
    Ok(u128::from_le_bytes(bytes))
}

/// Read a fixed-size byte array from instruction data
#[inline]
pub fn read_bytes<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], StakingError> {
    if offset + N > data.len() {
        return Err(StakingError::InvalidInstruction);
    }
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&data[offset..offset + N]);
    Ok(bytes)
}

/// Read a pubkey (32 raw bytes) from instruction data
#[inline]
pub fn read_pubkey(data: &[u8], offset: usize) -> Result<Pubkey, StakingError> {
    read_bytes::<32>(data, offset)
}

/// Instruction data reader with tracked offset
///
/// Sequentially reads fields from instruction data while automatically
/// tracking the current offset.
pub struct InstructionReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> InstructionReader<'a> {
    /// Create a new instruction reader
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Get the current offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Get remaining bytes
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Read a u8 and advance offset
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, StakingError> {
        let val = read_u8(self.data, self.offset)?;
        self.offset += 1;
        Ok(val)
    }

    /// Read a u16 and advance offset
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, StakingError> {
        let val = read_u16(self.data, self.offset)?;
        self.offset += 2;
        Ok(val)
    }

    /// Read a u64 and advance offset
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, StakingError> {
        let val = read_u64(self.data, self.offset)?;
        self.offset += 8;
        Ok(val)
    }

    /// Read a u128 and advance offset
    #[inline]
    pub fn read_u128(&mut self) -> Result<u128, StakingError> {
        let val = read_u128(self.data, self.offset)?;
        self.offset += 16;
        Ok(val)
    }

    /// Read a fixed-size byte array and advance offset
    #[inline]
    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], StakingError> {
        let val = read_bytes(self.data, self.offset)?;
        self.offset += N;
        Ok(val)
    }

    /// Read a pubkey and advance offset
    #[inline]
    pub fn read_pubkey(&mut self) -> Result<Pubkey, StakingError> {
        let val = read_pubkey(self.data, self.offset)?;
        self.offset += 32;
        Ok(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u8() {
        let data = [42u8, 0, 0, 0];
        assert_eq!(read_u8(&data, 0).unwrap(), 42);
        assert!(read_u8(&data, 4).is_err());
    }

    #[test]
    fn test_read_u64() {
        let data = [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01];
        assert_eq!(read_u64(&data, 0).unwrap(), 0x0102030405060708);
        assert!(read_u64(&data, 1).is_err());
    }

    #[test]
    fn test_read_u128() {
        let data = 77u128.to_le_bytes();
        assert_eq!(read_u128(&data, 0).unwrap(), 77);
        assert!(read_u128(&data, 1).is_err());
    }

    #[test]
    fn test_read_pubkey() {
        let mut data = [0u8; 33];
        data[0] = 9;
        let key = read_pubkey(&data, 1).unwrap();
        assert_eq!(key, [0u8; 32]);
        assert!(read_pubkey(&data, 2).is_err());
    }

    #[test]
    fn test_instruction_reader() {
        let mut data = [0u8; 41];
        data[0] = 7; // plan id
        data[1..9].copy_from_slice(&1000u64.to_le_bytes());
        data[9..41].copy_from_slice(&[3u8; 32]);

        let mut reader = InstructionReader::new(&data);
        assert_eq!(reader.remaining(), 41);

        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.read_u64().unwrap(), 1000);
        assert_eq!(reader.read_pubkey().unwrap(), [3u8; 32]);
        assert_eq!(reader.offset(), 41);
        assert_eq!(reader.remaining(), 0);

        assert!(reader.read_u8().is_err());
    }
}
