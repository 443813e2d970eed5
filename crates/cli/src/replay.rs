//! Feeds a text capture through one flow state and prints what came out.
//!
//! Capture format, one message (or TCP segment) per line:
//!
//! ```text
//! # comment
//! > 1234 0100 0001 0000 0000 0000 ...   to server
//! < 1234 8180 0001 0001 0000 0000 ...   to client
//! ```
//!
//! Whitespace inside the hex is ignored.

use anyhow::{bail, Context};
use dnswatch_domain::{Direction, Transport};
use dnswatch_infrastructure::dns::DnsContext;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::summary::{FlowSummary, TransactionSummary};

#[derive(Debug, PartialEq, Eq)]
pub struct CaptureLine {
    pub direction: Direction,
    pub payload: Vec<u8>,
}

pub fn parse_capture(text: &str) -> anyhow::Result<Vec<CaptureLine>> {
    let mut lines = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (direction, rest) = if let Some(rest) = line.strip_prefix('>') {
            (Direction::ToServer, rest)
        } else if let Some(rest) = line.strip_prefix('<') {
            (Direction::ToClient, rest)
        } else {
            bail!("line {}: expected '>' or '<' prefix", index + 1);
        };

        let digits: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
        let payload =
            hex::decode(&digits).with_context(|| format!("line {}: invalid hex", index + 1))?;

        lines.push(CaptureLine { direction, payload });
    }

    Ok(lines)
}

/// Replays `lines` through a fresh state and writes one JSON object per
/// transaction followed by a flow summary.
pub fn replay<W: Write>(
    ctx: &Arc<DnsContext>,
    transport: Transport,
    lines: &[CaptureLine],
    out: &mut W,
) -> anyhow::Result<FlowSummary> {
    let mut state = ctx.alloc_state(transport);

    for (index, line) in lines.iter().enumerate() {
        match transport {
            Transport::Udp => {
                let outcome = state.parse_message(line.direction, &line.payload);
                if let Some(err) = &outcome.error {
                    warn!(
                        line = index + 1,
                        direction = line.direction.as_str(),
                        error = %err,
                        "Message not fully parsed"
                    );
                }
            }
            Transport::Tcp => {
                let outcome = state.parse_tcp(line.direction, &line.payload);
                for err in outcome.records.iter().filter_map(|r| r.error.as_ref()) {
                    warn!(
                        line = index + 1,
                        direction = line.direction.as_str(),
                        error = %err,
                        "Record not fully parsed"
                    );
                }
                debug!(line = index + 1, buffered = outcome.buffered, "Segment consumed");
            }
        }
    }

    for tx in state.transactions() {
        serde_json::to_writer(&mut *out, &TransactionSummary::new(tx))?;
        writeln!(out)?;
    }

    let summary = FlowSummary::new(&state);
    serde_json::to_writer(&mut *out, &summary)?;
    writeln!(out)?;

    info!(
        transactions = summary.transactions,
        events = summary.events.len(),
        "Replay finished"
    );
    Ok(summary)
}
