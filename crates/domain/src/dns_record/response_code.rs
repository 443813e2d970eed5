use std::fmt;
use std::str::FromStr;

/// DNS response codes.
///
/// Values above 15 only exist in TSIG/TKEY records or in the extended RCODE
/// carried by an OPT record; the 4-bit header field can never hold them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    YxDomain,
    YxRrSet,
    NxRrSet,
    NotAuth,
    NotZone,
    /// Code 16 is both BADVERS (RFC 6891) and BADSIG (RFC 8945). Telling them
    /// apart needs the OPT record, which this parser does not decode.
    BadVers,
    BadKey,
    BadTime,
    BadMode,
    BadName,
    BadAlg,
    BadTrunc,
}

impl ResponseCode {
    pub const BADSIG: ResponseCode = ResponseCode::BadVers;

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::FormErr => "FORMERR",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::NxDomain => "NXDOMAIN",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::YxDomain => "YXDOMAIN",
            ResponseCode::YxRrSet => "YXRRSET",
            ResponseCode::NxRrSet => "NXRRSET",
            ResponseCode::NotAuth => "NOTAUTH",
            ResponseCode::NotZone => "NOTZONE",
            ResponseCode::BadVers => "BADVERS",
            ResponseCode::BadKey => "BADKEY",
            ResponseCode::BadTime => "BADTIME",
            ResponseCode::BadMode => "BADMODE",
            ResponseCode::BadName => "BADNAME",
            ResponseCode::BadAlg => "BADALG",
            ResponseCode::BadTrunc => "BADTRUNC",
        }
    }

    pub fn to_u8(&self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NxDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::YxDomain => 6,
            ResponseCode::YxRrSet => 7,
            ResponseCode::NxRrSet => 8,
            ResponseCode::NotAuth => 9,
            ResponseCode::NotZone => 10,
            ResponseCode::BadVers => 16,
            ResponseCode::BadKey => 17,
            ResponseCode::BadTime => 18,
            ResponseCode::BadMode => 19,
            ResponseCode::BadName => 20,
            ResponseCode::BadAlg => 21,
            ResponseCode::BadTrunc => 22,
        }
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(ResponseCode::NoError),
            1 => Some(ResponseCode::FormErr),
            2 => Some(ResponseCode::ServFail),
            3 => Some(ResponseCode::NxDomain),
            4 => Some(ResponseCode::NotImp),
            5 => Some(ResponseCode::Refused),
            6 => Some(ResponseCode::YxDomain),
            7 => Some(ResponseCode::YxRrSet),
            8 => Some(ResponseCode::NxRrSet),
            9 => Some(ResponseCode::NotAuth),
            10 => Some(ResponseCode::NotZone),
            16 => Some(ResponseCode::BadVers),
            17 => Some(ResponseCode::BadKey),
            18 => Some(ResponseCode::BadTime),
            19 => Some(ResponseCode::BadMode),
            20 => Some(ResponseCode::BadName),
            21 => Some(ResponseCode::BadAlg),
            22 => Some(ResponseCode::BadTrunc),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, ResponseCode::NoError)
    }
}

/// Renders a response code, falling back to `RCODE<n>` for unassigned values.
pub fn rcode_string(code: u8) -> String {
    match ResponseCode::from_u8(code) {
        Some(rcode) => rcode.as_str().to_string(),
        None => format!("RCODE{}", code),
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResponseCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NOERROR" => Ok(ResponseCode::NoError),
            "FORMERR" => Ok(ResponseCode::FormErr),
            "SERVFAIL" => Ok(ResponseCode::ServFail),
            "NXDOMAIN" => Ok(ResponseCode::NxDomain),
            "NOTIMP" => Ok(ResponseCode::NotImp),
            "REFUSED" => Ok(ResponseCode::Refused),
            "YXDOMAIN" => Ok(ResponseCode::YxDomain),
            "YXRRSET" => Ok(ResponseCode::YxRrSet),
            "NXRRSET" => Ok(ResponseCode::NxRrSet),
            "NOTAUTH" => Ok(ResponseCode::NotAuth),
            "NOTZONE" => Ok(ResponseCode::NotZone),
            "BADVERS" | "BADSIG" => Ok(ResponseCode::BadVers),
            "BADKEY" => Ok(ResponseCode::BadKey),
            "BADTIME" => Ok(ResponseCode::BadTime),
            "BADMODE" => Ok(ResponseCode::BadMode),
            "BADNAME" => Ok(ResponseCode::BadName),
            "BADALG" => Ok(ResponseCode::BadAlg),
            "BADTRUNC" => Ok(ResponseCode::BadTrunc),
            _ => Err(format!("Unknown response code: {}", s)),
        }
    }
}
