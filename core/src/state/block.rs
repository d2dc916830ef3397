//! Block file codec.
//!
//! A block file is a flat sequence of named blocks. Each block is laid out as
//!
//! ```text
//! u32 LE   total block length in bytes (header + data)
//! u32 LE   offset of the data from the start of the block
//! [u8]     block name, NUL-terminated
//! [u8]     description, NUL-terminated
//! [u8]     data
//! ```
//!
//! Writers collect blocks in memory and emit the file in one write; readers
//! load and parse the entire file before handing out any block, so a short
//! or damaged file is rejected before a single byte reaches a machine.

use std::path::{Path, PathBuf};

use super::error::{Result, StateError};

const BLOCK_HEADER_LEN: usize = 8;

struct PendingBlock {
    name: String,
    description: String,
    data: Vec<u8>,
}

/// Builds a block file in memory.
///
/// Every `write_*` call appends to the most recently started block.
pub struct BlockWriter {
    closed: Vec<PendingBlock>,
    current: PendingBlock,
}

impl PendingBlock {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            data: Vec::new(),
        }
    }
}

impl BlockWriter {
    /// Start a new file whose first block is `name`.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            closed: Vec::new(),
            current: PendingBlock::new(name, description),
        }
    }

    /// Close the current block and start another one.
    pub fn new_block(&mut self, name: &str, description: &str) {
        let done = std::mem::replace(&mut self.current, PendingBlock::new(name, description));
        self.closed.push(done);
    }

    fn blocks(&self) -> impl Iterator<Item = &PendingBlock> {
        self.closed.iter().chain(std::iter::once(&self.current))
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.current.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write(&[v]);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Write `s` followed by a NUL, `s.len() + 1` bytes in total.
    pub fn write_cstr(&mut self, s: &str) {
        self.write(s.as_bytes());
        self.write_u8(0);
    }

    /// Names of the blocks written so far, in order.
    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks().map(|b| b.name.as_str())
    }

    /// Serialize every block.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for block in self.blocks() {
            if block.name.contains('\0') || block.description.contains('\0') {
                return Err(StateError::Corrupt(format!(
                    "block name or description of '{}' contains NUL",
                    block.name
                )));
            }
            let data_offset = BLOCK_HEADER_LEN + block.name.len() + 1 + block.description.len() + 1;
            let total = data_offset + block.data.len();
            let total32 = u32::try_from(total)
                .map_err(|_| StateError::Corrupt(format!("block '{}' too large", block.name)))?;

            out.extend_from_slice(&total32.to_le_bytes());
            out.extend_from_slice(&(data_offset as u32).to_le_bytes());
            out.extend_from_slice(block.name.as_bytes());
            out.push(0);
            out.extend_from_slice(block.description.as_bytes());
            out.push(0);
            out.extend_from_slice(&block.data);
        }
        Ok(out)
    }

    /// Write the file to `path`, creating its parent directory if needed.
    pub fn create(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| StateError::io(dir, e))?;
        }
        std::fs::write(path, bytes).map_err(|e| StateError::io(path, e))
    }
}

#[derive(Debug)]
struct ParsedBlock {
    name: String,
    description: String,
    start: usize,
    end: usize,
}

/// A fully loaded, parsed block file.
#[derive(Debug)]
pub struct BlockFile {
    path: PathBuf,
    bytes: Vec<u8>,
    blocks: Vec<ParsedBlock>,
}

impl BlockFile {
    /// Read and parse the whole file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| StateError::io(path, e))?;
        Self::parse(path, bytes)
    }

    /// Parse an in-memory image. `path` is only used in error messages.
    pub fn parse(path: &Path, bytes: Vec<u8>) -> Result<Self> {
        match Self::parse_partial(path, bytes) {
            (file, None) => Ok(file),
            (_, Some(damage)) => Err(damage),
        }
    }

    /// Parse as many whole blocks as the image holds.
    ///
    /// Returns the blocks before the first damaged one together with the
    /// damage, if any. Nothing after the damage is looked at.
    pub fn parse_partial(path: &Path, bytes: Vec<u8>) -> (Self, Option<StateError>) {
        let mut blocks = Vec::new();
        let mut damage = None;
        let mut pos = 0;

        while pos < bytes.len() {
            match parse_block(&bytes, pos) {
                Ok(block) => {
                    pos = block.end;
                    blocks.push(block);
                }
                Err(e) => {
                    damage = Some(e);
                    break;
                }
            }
        }

        let file = Self {
            path: path.to_path_buf(),
            bytes,
            blocks,
        };
        (file, damage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Locate a block by exact name and return a reader over its data.
    pub fn find_block(&self, name: &str) -> Option<BlockReader<'_>> {
        self.blocks
            .iter()
            .find(|b| b.name == name)
            .map(|b| BlockReader {
                name: &b.name,
                description: &b.description,
                data: &self.bytes[b.start..b.end],
                pos: 0,
            })
    }

    /// Like [`find_block`](Self::find_block), but a missing block is an error.
    pub fn require_block(&self, name: &str) -> Result<BlockReader<'_>> {
        self.find_block(name)
            .ok_or_else(|| StateError::BlockNotFound(name.to_string()))
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.name.as_str())
    }
}

fn parse_block(bytes: &[u8], pos: usize) -> Result<ParsedBlock> {
    let corrupt = |what: &str| StateError::Corrupt(format!("{what} at offset {pos}"));

    if bytes.len() - pos < BLOCK_HEADER_LEN {
        return Err(corrupt("truncated block header"));
    }
    let total = read_u32_at(bytes, pos) as usize;
    let data_offset = read_u32_at(bytes, pos + 4) as usize;
    if total < data_offset || data_offset < BLOCK_HEADER_LEN + 2 {
        return Err(corrupt("bad block lengths"));
    }
    if bytes.len() - pos < total {
        return Err(corrupt("block runs past end of file"));
    }

    let header = &bytes[pos + BLOCK_HEADER_LEN..pos + data_offset];
    let mut strings = header.split(|&b| b == 0);
    let name = strings.next().ok_or_else(|| corrupt("missing block name"))?;
    let description = strings
        .next()
        .ok_or_else(|| corrupt("missing block description"))?;
    if header.last() != Some(&0) {
        return Err(corrupt("unterminated block header"));
    }

    Ok(ParsedBlock {
        name: String::from_utf8_lossy(name).into_owned(),
        description: String::from_utf8_lossy(description).into_owned(),
        start: pos + data_offset,
        end: pos + total,
    })
}

fn read_u32_at(bytes: &[u8], pos: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[pos..pos + 4]);
    u32::from_le_bytes(buf)
}

/// Sequential reader over one block's data.
pub struct BlockReader<'a> {
    name: &'a str,
    description: &'a str,
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlockReader<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn description(&self) -> &'a str {
        self.description
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(StateError::Truncated {
                block: self.name.to_string(),
                wanted: len,
                available: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let src = self.read(dst.len())?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a NUL-terminated string, consuming the terminator.
    pub fn read_cstr(&mut self) -> Result<String> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| StateError::Corrupt(format!("unterminated string in '{}'", self.name)))?;
        let s = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: Vec<u8>) -> Result<BlockFile> {
        BlockFile::parse(Path::new("test.bin"), bytes)
    }

    #[test]
    fn block_layout_on_disk() {
        let mut w = BlockWriter::new("AB", "c");
        w.write_u8(0x7F);
        let bytes = w.to_bytes().unwrap();

        // 8 header + "AB\0" + "c\0" + 1 data byte
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[0..4], &14u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &13u32.to_le_bytes());
        assert_eq!(&bytes[8..13], b"AB\0c\0");
        assert_eq!(bytes[13], 0x7F);
    }

    #[test]
    fn blocks_are_addressable_by_name() {
        let mut w = BlockWriter::new("Header", "first");
        w.write_u32(1);
        w.new_block("CPU", "");
        w.write_u64(0xDEAD_BEEF_0000_0001);
        w.new_block("Sound", "audio");
        w.write_u16(0x1234);

        let file = parse(w.to_bytes().unwrap()).unwrap();
        assert_eq!(
            file.block_names().collect::<Vec<_>>(),
            vec!["Header", "CPU", "Sound"]
        );

        let mut sound = file.find_block("Sound").unwrap();
        assert_eq!(sound.description(), "audio");
        assert_eq!(sound.read_u16().unwrap(), 0x1234);
        assert_eq!(sound.remaining(), 0);

        let mut cpu = file.find_block("CPU").unwrap();
        assert_eq!(cpu.read_u64().unwrap(), 0xDEAD_BEEF_0000_0001);
    }

    #[test]
    fn name_match_is_exact() {
        let w = BlockWriter::new("Save State", "");
        let file = parse(w.to_bytes().unwrap()).unwrap();
        assert!(file.find_block("Save").is_none());
        assert!(file.find_block("save state").is_none());
        assert!(matches!(
            file.require_block("Save"),
            Err(StateError::BlockNotFound(_))
        ));
    }

    #[test]
    fn cstr_is_length_plus_one() {
        let mut w = BlockWriter::new("S", "");
        w.write_cstr("scud");
        w.write_u8(9);
        let file = parse(w.to_bytes().unwrap()).unwrap();
        let mut r = file.find_block("S").unwrap();
        assert_eq!(r.remaining(), 6);
        assert_eq!(r.read_cstr().unwrap(), "scud");
        assert_eq!(r.read_u8().unwrap(), 9);
    }

    #[test]
    fn read_past_end_is_truncated() {
        let mut w = BlockWriter::new("S", "");
        w.write_u16(1);
        let file = parse(w.to_bytes().unwrap()).unwrap();
        let mut r = file.find_block("S").unwrap();
        let err = r.read_u32().unwrap_err();
        assert!(matches!(
            err,
            StateError::Truncated {
                wanted: 4,
                available: 2,
                ..
            }
        ));
        // A failed read consumes nothing.
        assert_eq!(r.read_u16().unwrap(), 1);
    }

    #[test]
    fn truncated_file_is_rejected() {
        let mut w = BlockWriter::new("S", "");
        w.write(&[0u8; 32]);
        let mut bytes = w.to_bytes().unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(parse(bytes), Err(StateError::Corrupt(_))));
    }

    #[test]
    fn garbage_header_is_rejected() {
        assert!(matches!(parse(vec![1, 2, 3]), Err(StateError::Corrupt(_))));
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        assert!(matches!(parse(bytes), Err(StateError::Corrupt(_))));
    }

    #[test]
    fn partial_parse_keeps_blocks_before_damage() {
        let mut w = BlockWriter::new("First", "");
        w.write_u32(5);
        w.new_block("Second", "");
        w.write(&[0u8; 16]);
        let mut bytes = w.to_bytes().unwrap();
        bytes.truncate(bytes.len() - 4);

        let (file, damage) = BlockFile::parse_partial(Path::new("test.bin"), bytes);
        assert!(matches!(damage, Some(StateError::Corrupt(_))));
        assert_eq!(file.block_names().collect::<Vec<_>>(), vec!["First"]);
        assert_eq!(file.find_block("First").unwrap().read_u32().unwrap(), 5);
    }

    #[test]
    fn empty_file_has_no_blocks() {
        let file = parse(Vec::new()).unwrap();
        assert_eq!(file.block_names().count(), 0);
    }

    #[test]
    fn nul_in_name_is_refused() {
        let w = BlockWriter::new("bad\0name", "");
        assert!(w.to_bytes().is_err());
    }

    #[test]
    fn create_makes_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Nested").join("file.bin");
        let mut w = BlockWriter::new("S", "");
        w.write_u8(1);
        w.create(&path).unwrap();

        let file = BlockFile::load(&path).unwrap();
        assert_eq!(file.find_block("S").unwrap().read_u8().unwrap(), 1);
        assert_eq!(file.path(), path.as_path());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = BlockFile::load(&dir.path().join("absent")).err().unwrap();
        assert!(err.is_not_found());
    }
}
