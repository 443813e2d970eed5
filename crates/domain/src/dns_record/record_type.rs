use std::fmt;
use std::str::FromStr;

/// Record types the parser recognises by name.
///
/// Codes outside this set are still parsed and stored as raw `u16` values;
/// they only lack a symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    NAPTR,

    DS,
    RRSIG,
    NSEC,
    NSEC3,

    TKEY,
    TSIG,

    ANY,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::NS => "NS",
            RecordType::CNAME => "CNAME",
            RecordType::SOA => "SOA",
            RecordType::PTR => "PTR",
            RecordType::MX => "MX",
            RecordType::TXT => "TXT",
            RecordType::AAAA => "AAAA",
            RecordType::SRV => "SRV",
            RecordType::NAPTR => "NAPTR",
            RecordType::DS => "DS",
            RecordType::RRSIG => "RRSIG",
            RecordType::NSEC => "NSEC",
            RecordType::NSEC3 => "NSEC3",
            RecordType::TKEY => "TKEY",
            RecordType::TSIG => "TSIG",
            RecordType::ANY => "ANY",
        }
    }

    pub fn to_u16(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::SRV => 33,
            RecordType::NAPTR => 35,
            RecordType::DS => 43,
            RecordType::RRSIG => 46,
            RecordType::NSEC => 47,
            RecordType::NSEC3 => 50,
            RecordType::TKEY => 249,
            RecordType::TSIG => 250,
            RecordType::ANY => 255,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1 => Some(RecordType::A),
            2 => Some(RecordType::NS),
            5 => Some(RecordType::CNAME),
            6 => Some(RecordType::SOA),
            12 => Some(RecordType::PTR),
            15 => Some(RecordType::MX),
            16 => Some(RecordType::TXT),
            28 => Some(RecordType::AAAA),
            33 => Some(RecordType::SRV),
            35 => Some(RecordType::NAPTR),
            43 => Some(RecordType::DS),
            46 => Some(RecordType::RRSIG),
            47 => Some(RecordType::NSEC),
            50 => Some(RecordType::NSEC3),
            249 => Some(RecordType::TKEY),
            250 => Some(RecordType::TSIG),
            255 => Some(RecordType::ANY),
            _ => None,
        }
    }

    pub fn is_dnssec(&self) -> bool {
        matches!(
            self,
            RecordType::DS | RecordType::RRSIG | RecordType::NSEC | RecordType::NSEC3
        )
    }

    /// True for types whose rdata starts with (or is) a compressible domain name.
    pub fn has_name_rdata(&self) -> bool {
        matches!(
            self,
            RecordType::NS | RecordType::CNAME | RecordType::PTR | RecordType::MX | RecordType::SOA
        )
    }
}

/// Renders a wire type code, falling back to `TYPE<n>` (RFC 3597) for codes
/// without a symbolic name.
pub fn type_string(code: u16) -> String {
    match RecordType::from_u16(code) {
        Some(rtype) => rtype.as_str().to_string(),
        None => format!("TYPE{}", code),
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "NS" => Ok(RecordType::NS),
            "CNAME" => Ok(RecordType::CNAME),
            "SOA" => Ok(RecordType::SOA),
            "PTR" => Ok(RecordType::PTR),
            "MX" => Ok(RecordType::MX),
            "TXT" => Ok(RecordType::TXT),
            "AAAA" => Ok(RecordType::AAAA),
            "SRV" => Ok(RecordType::SRV),
            "NAPTR" => Ok(RecordType::NAPTR),
            "DS" => Ok(RecordType::DS),
            "RRSIG" => Ok(RecordType::RRSIG),
            "NSEC" => Ok(RecordType::NSEC),
            "NSEC3" => Ok(RecordType::NSEC3),
            "TKEY" => Ok(RecordType::TKEY),
            "TSIG" => Ok(RecordType::TSIG),
            "ANY" => Ok(RecordType::ANY),
            _ => Err(format!("Unknown record type: {}", s)),
        }
    }
}
