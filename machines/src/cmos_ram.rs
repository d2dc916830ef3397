/// Battery-backed CMOS RAM.
///
/// Simple read/write memory that persists across sessions through NVRAM
/// files. Arcade boards keep high scores, operator settings and audit
/// counters here. The size is a power of two and offsets wrap, mirroring
/// how the chip only decodes the low address lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmosRam {
    data: Vec<u8>,
}

impl CmosRam {
    /// Create a zeroed CMOS RAM of `size` bytes. `size` must be a power of two.
    pub fn new(size: usize) -> Self {
        debug_assert!(size.is_power_of_two(), "CMOS size {size} is not a power of two");
        Self {
            data: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn mask(&self, offset: u16) -> usize {
        offset as usize & (self.data.len() - 1)
    }

    /// Read a byte. The offset wraps at the RAM size.
    pub fn read(&self, offset: u16) -> u8 {
        self.data[self.mask(offset)]
    }

    /// Write a byte. The offset wraps at the RAM size.
    pub fn write(&mut self, offset: u16, value: u8) {
        let i = self.mask(offset);
        self.data[i] = value;
    }

    /// Little-endian 16-bit counter at `offset`.
    pub fn read_u16(&self, offset: u16) -> u16 {
        u16::from_le_bytes([self.read(offset), self.read(offset.wrapping_add(1))])
    }

    pub fn write_u16(&mut self, offset: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write(offset, lo);
        self.write(offset.wrapping_add(1), hi);
    }

    /// Bump the 16-bit counter at `offset`, saturating at 0xFFFF.
    pub fn increment_u16(&mut self, offset: u16) {
        let v = self.read_u16(offset).saturating_add(1);
        self.write_u16(offset, v);
    }

    /// Load CMOS contents from a byte slice (e.g., from an NVRAM file).
    ///
    /// If `src` is shorter than the RAM, only the first `src.len()` bytes are
    /// written. If longer, the excess is ignored.
    pub fn load_from(&mut self, src: &[u8]) {
        let len = src.len().min(self.data.len());
        self.data[..len].copy_from_slice(&src[..len]);
    }

    /// The full contents, for saving.
    pub fn snapshot(&self) -> &[u8] {
        &self.data
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}
