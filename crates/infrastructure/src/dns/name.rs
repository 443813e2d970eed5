use dnswatch_domain::DecodeError;
use std::fmt;

/// Longest decoded name, separators included.
pub const MAX_NAME_LEN: usize = 256;

const MAX_LABEL_LEN: usize = 63;
const POINTER_MASK: u8 = 0xC0;

/// A decompressed domain name held in a fixed stack buffer.
///
/// Labels are joined with `.`; there is no trailing dot and the root name is
/// empty. Label bytes are kept as they appeared on the wire.
#[derive(Clone)]
pub struct DecodedName {
    buf: [u8; MAX_NAME_LEN],
    len: usize,
}

impl DecodedName {
    fn new() -> Self {
        Self {
            buf: [0u8; MAX_NAME_LEN],
            len: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lossy UTF-8 rendering for logs and output.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    fn push_label(&mut self, label: &[u8]) -> Result<(), DecodeError> {
        let separator = usize::from(self.len > 0);
        if self.len + separator + label.len() > MAX_NAME_LEN {
            return Err(DecodeError::malformed(format!(
                "name exceeds {} bytes",
                MAX_NAME_LEN
            )));
        }
        if separator == 1 {
            self.buf[self.len] = b'.';
            self.len += 1;
        }
        self.buf[self.len..self.len + label.len()].copy_from_slice(label);
        self.len += label.len();
        Ok(())
    }
}

impl fmt::Debug for DecodedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DecodedName")
            .field(&self.to_string_lossy())
            .finish()
    }
}

impl PartialEq for DecodedName {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for DecodedName {}

/// Decodes the name starting at `offset` in `input`.
///
/// Returns the name and the offset just past its uncompressed part: the byte
/// after the terminating zero, or after the first compression pointer.
///
/// Every pointer must target an offset strictly below the lowest offset read
/// so far. Each jump therefore moves backwards and decoding always ends.
pub fn decode_name(input: &[u8], offset: usize) -> Result<(DecodedName, usize), DecodeError> {
    let mut name = DecodedName::new();
    let mut pos = offset;
    let mut lowest = offset;
    let mut resume: Option<usize> = None;

    loop {
        let len_byte = *input
            .get(pos)
            .ok_or_else(|| DecodeError::malformed(format!("name runs past end at {}", pos)))?;

        match len_byte & POINTER_MASK {
            0x00 if len_byte == 0 => {
                return Ok((name, resume.unwrap_or(pos + 1)));
            }
            0x00 => {
                let len = len_byte as usize;
                debug_assert!(len <= MAX_LABEL_LEN);
                let label = input.get(pos + 1..pos + 1 + len).ok_or_else(|| {
                    DecodeError::malformed(format!("label at {} runs past end", pos))
                })?;
                name.push_label(label)?;
                pos += 1 + len;
            }
            POINTER_MASK => {
                let low = *input.get(pos + 1).ok_or_else(|| {
                    DecodeError::malformed(format!("truncated pointer at {}", pos))
                })?;
                let target = (usize::from(len_byte & !POINTER_MASK) << 8) | usize::from(low);

                if target >= lowest {
                    return Err(DecodeError::malformed(format!(
                        "pointer at {} to {} does not point backwards",
                        pos, target
                    )));
                }

                resume.get_or_insert(pos + 2);
                lowest = target;
                pos = target;
            }
            other => {
                return Err(DecodeError::malformed(format!(
                    "reserved label type {:#04x} at {}",
                    other, pos
                )));
            }
        }
    }
}

/// Walks over the name at `offset` without materialising it.
pub fn skip_name(input: &[u8], offset: usize) -> Result<usize, DecodeError> {
    decode_name(input, offset).map(|(_, next)| next)
}
