//! Record-level decoding of a single DNS message.
//!
//! These functions only read; storing what they return is up to the caller.

use dnswatch_domain::wire::{
    read_u16, read_u32, ANSWER_HEADER_LEN, HEADER_LEN, QUERY_TRAILER_LEN,
};
use dnswatch_domain::{DecodeError, RecordType, WireHeader};

use super::name::{decode_name, skip_name, DecodedName};

#[derive(Debug)]
pub struct Question {
    pub name: DecodedName,
    pub rtype: u16,
    pub class: u16,
}

/// Rdata as stored: either the raw bytes or a decompressed embedded name.
#[derive(Debug)]
pub enum RecordData<'a> {
    Raw(&'a [u8]),
    Name(DecodedName),
}

impl RecordData<'_> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RecordData::Raw(bytes) => bytes,
            RecordData::Name(name) => name.as_bytes(),
        }
    }
}

#[derive(Debug)]
pub struct ResourceRecord<'a> {
    pub name: DecodedName,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData<'a>,
}

pub fn parse_question(input: &[u8], offset: usize) -> Result<(Question, usize), DecodeError> {
    let (name, pos) = decode_name(input, offset)?;

    let (rtype, class) = match (read_u16(input, pos), read_u16(input, pos + 2)) {
        (Some(rtype), Some(class)) => (rtype, class),
        _ => {
            return Err(DecodeError::malformed(format!(
                "question trailer at {} truncated",
                pos
            )))
        }
    };

    Ok((Question { name, rtype, class }, pos + QUERY_TRAILER_LEN))
}

/// Decodes one resource record starting at `offset`.
pub fn parse_record(
    input: &[u8],
    offset: usize,
) -> Result<(ResourceRecord<'_>, usize), DecodeError> {
    let (name, pos) = decode_name(input, offset)?;
    let (rtype, class, ttl, rdlength) = read_answer_header(input, pos)?;

    let rdata_start = pos + ANSWER_HEADER_LEN;
    let rdata_end = rdata_start + rdlength;
    let rdata = input.get(rdata_start..rdata_end).ok_or_else(|| {
        DecodeError::malformed(format!(
            "rdata of {} bytes at {} runs past end",
            rdlength, rdata_start
        ))
    })?;

    let data = decode_rdata(input, rtype, rdata_start, rdata_end, rdata)?;

    Ok((
        ResourceRecord {
            name,
            rtype,
            class,
            ttl,
            data,
        },
        rdata_end,
    ))
}

/// Checks the bounds of one record without keeping anything.
pub fn skip_record(input: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let pos = skip_name(input, offset)?;
    let (_, _, _, rdlength) = read_answer_header(input, pos)?;
    let end = pos + ANSWER_HEADER_LEN + rdlength;
    if end > input.len() {
        return Err(DecodeError::malformed(format!(
            "record at {} runs past end",
            offset
        )));
    }
    Ok(end)
}

fn read_answer_header(input: &[u8], pos: usize) -> Result<(u16, u16, u32, usize), DecodeError> {
    match (
        read_u16(input, pos),
        read_u16(input, pos + 2),
        read_u32(input, pos + 4),
        read_u16(input, pos + 8),
    ) {
        (Some(rtype), Some(class), Some(ttl), Some(rdlength)) => {
            Ok((rtype, class, ttl, rdlength as usize))
        }
        _ => Err(DecodeError::malformed(format!(
            "record header at {} truncated",
            pos
        ))),
    }
}

fn decode_rdata<'a>(
    input: &'a [u8],
    rtype: u16,
    start: usize,
    end: usize,
    rdata: &'a [u8],
) -> Result<RecordData<'a>, DecodeError> {
    let name_offset = match RecordType::from_u16(rtype) {
        Some(RecordType::CNAME | RecordType::NS | RecordType::PTR | RecordType::SOA) => start,
        // 2-byte preference before the exchange name.
        Some(RecordType::MX) => start + 2,
        _ => return Ok(RecordData::Raw(rdata)),
    };

    if name_offset >= end {
        return Err(DecodeError::malformed(format!(
            "rdata at {} too short for a name",
            start
        )));
    }

    // Compression may reach back into the whole message, but the uncompressed
    // part has to stay inside this record's rdata.
    let (name, next) = decode_name(input, name_offset)?;
    if next > end {
        return Err(DecodeError::malformed(format!(
            "name in rdata at {} overruns rdlength",
            start
        )));
    }
    Ok(RecordData::Name(name))
}

/// Cheap check whether `input` looks like a DNS message.
///
/// Only the header and the first question are examined.
pub fn probe(input: &[u8]) -> bool {
    let Ok(header) = WireHeader::parse(input) else {
        return false;
    };
    if !header.opcode().is_supported() || header.questions == 0 {
        return false;
    }
    parse_question(input, HEADER_LEN).is_ok()
}
