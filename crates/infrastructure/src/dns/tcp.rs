use bytes::BytesMut;
use dnswatch_domain::wire::TCP_LENGTH_PREFIX_LEN;
use dnswatch_domain::DecodeError;
use tracing::debug;

use super::state::ParseOutcome;

/// Receives complete records from a [`TcpFramer`] and pays for its buffer.
pub trait RecordSink {
    /// Charges `size` additional bytes of framing buffer.
    fn reserve_buffer(&mut self, size: u64) -> Result<(), DecodeError>;

    fn handle_record(&mut self, record: &[u8]) -> ParseOutcome;
}

/// What one delivered segment produced.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TcpOutcome {
    /// Always the full segment: every byte is parsed, buffered or skipped.
    pub consumed: usize,
    /// One entry per record completed during this call, in stream order.
    pub records: Vec<ParseOutcome>,
    /// Bytes held back for the next segment.
    pub buffered: usize,
}

/// Reassembles 2-byte length-prefixed DNS messages across segments.
///
/// Records that arrive whole inside one segment are handed over straight from
/// the input; only split records are copied into the accumulation buffer. The
/// buffer keeps its capacity between records.
#[derive(Debug, Default)]
pub struct TcpFramer {
    buffer: BytesMut,
    /// Buffer bytes already charged to the flow.
    charged: u64,
    prefix: [u8; TCP_LENGTH_PREFIX_LEN],
    prefix_len: usize,
    /// Expected length of the record in progress, 0 when none.
    record_len: usize,
    /// Bytes of a refused record still to be dropped from the stream.
    discard: usize,
}

impl TcpFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the record in progress sitting in the buffer.
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn record_len(&self) -> usize {
        self.record_len
    }

    pub fn is_idle(&self) -> bool {
        self.record_len == 0 && self.prefix_len == 0 && self.buffer.is_empty() && self.discard == 0
    }

    pub fn feed<S: RecordSink>(&mut self, input: &[u8], sink: &mut S) -> TcpOutcome {
        let mut records = Vec::new();
        let mut pos = 0;

        while pos < input.len() {
            let remaining = input.len() - pos;

            if self.discard > 0 {
                let skip = self.discard.min(remaining);
                self.discard -= skip;
                pos += skip;
                continue;
            }

            if self.record_len == 0 {
                let take = (TCP_LENGTH_PREFIX_LEN - self.prefix_len).min(remaining);
                self.prefix[self.prefix_len..self.prefix_len + take]
                    .copy_from_slice(&input[pos..pos + take]);
                self.prefix_len += take;
                pos += take;

                if self.prefix_len < TCP_LENGTH_PREFIX_LEN {
                    break;
                }
                self.prefix_len = 0;
                // A zero length prefix frames nothing; move on to the next one.
                self.record_len = u16::from_be_bytes(self.prefix) as usize;
                continue;
            }

            if self.buffer.is_empty() && remaining >= self.record_len {
                let record = &input[pos..pos + self.record_len];
                pos += self.record_len;
                self.record_len = 0;
                records.push(sink.handle_record(record));
                continue;
            }

            if let Err(err) = self.ensure_capacity(sink) {
                debug!(record_len = self.record_len, "dropping TCP record, buffer refused");
                self.discard = self.record_len - self.buffer.len();
                self.buffer.clear();
                self.record_len = 0;
                records.push(ParseOutcome::aborted(0, None, err));
                continue;
            }

            let take = (self.record_len - self.buffer.len()).min(remaining);
            self.buffer.extend_from_slice(&input[pos..pos + take]);
            pos += take;

            if self.buffer.len() == self.record_len {
                let outcome = sink.handle_record(&self.buffer);
                self.buffer.clear();
                self.record_len = 0;
                records.push(outcome);
            }
        }

        TcpOutcome {
            consumed: input.len(),
            records,
            buffered: self.buffer.len() + self.prefix_len,
        }
    }

    fn ensure_capacity<S: RecordSink>(&mut self, sink: &mut S) -> Result<(), DecodeError> {
        let wanted = self.record_len as u64;
        if wanted > self.charged {
            sink.reserve_buffer(wanted - self.charged)?;
            self.charged = wanted;
        }
        if self.buffer.capacity() < self.record_len {
            self.buffer.reserve(self.record_len - self.buffer.len());
        }
        Ok(())
    }
}
