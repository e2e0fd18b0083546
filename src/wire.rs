// Response framing: one frame per response, a single tag byte followed by a
// payload whose layout depends on the verb that produced it.

pub const TAG_MSG: u8 = 0x01;
pub const TAG_DATA: u8 = 0x02;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A UTF-8 string rendered verbatim to the user. Strings beginning with
    /// `Error:` or `Warning:` are colorized by the client.
    Msg(String),
    /// A verb-specific binary payload.
    Data(Vec<u8>),
}

impl Frame {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Frame::Msg(s) => {
                let mut out = Vec::with_capacity(1 + s.len());
                out.push(TAG_MSG);
                out.extend_from_slice(s.as_bytes());
                out
            }
            Frame::Data(payload) => {
                let mut out = Vec::with_capacity(1 + payload.len());
                out.push(TAG_DATA);
                out.extend_from_slice(&payload);
                out
            }
        }
    }

    /// Splits a received frame into its tag byte and payload. Returns `None`
    /// for an empty buffer (malformed / closed-before-sending peer).
    pub fn split(raw: &[u8]) -> Option<(u8, &[u8])> {
        raw.split_first().map(|(tag, rest)| (*tag, rest))
    }
}

/// Encodes the `list` verb's records: `name\0command`, with a `\0\0`
/// separator between (not after) records.
pub fn encode_list(records: &[(String, String)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, (name, command)) in records.iter().enumerate() {
        if i > 0 {
            out.push(0);
            out.push(0);
        }
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(command.as_bytes());
    }
    out
}

pub fn decode_list(payload: &[u8]) -> Vec<(String, String)> {
    if payload.is_empty() {
        return Vec::new();
    }
    let text = String::from_utf8_lossy(payload);
    text.split("\u{0}\u{0}")
        .filter_map(|rec| {
            let mut parts = rec.splitn(2, '\u{0}');
            let name = parts.next()?;
            let command = parts.next()?;
            Some((name.to_string(), command.to_string()))
        })
        .collect()
}

/// Encodes `mem`/`cpu` style records: `name\0` + an 8-byte little-endian f64,
/// concatenated with no separator between records.
pub fn encode_f64_records(records: &[(String, f64)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in records {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn decode_f64_records(payload: &[u8]) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    let mut rest = payload;
    while let Some(nul) = rest.iter().position(|&b| b == 0) {
        let name = String::from_utf8_lossy(&rest[..nul]).into_owned();
        let after = &rest[nul + 1..];
        if after.len() < 8 {
            break;
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&after[..8]);
        out.push((name, f64::from_le_bytes(buf)));
        rest = &after[8..];
    }
    out
}

/// Encodes `pid` records: `name\0` + a 4-byte little-endian i32.
pub fn encode_i32_records(records: &[(String, i32)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in records {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn decode_i32_records(payload: &[u8]) -> Vec<(String, i32)> {
    let mut out = Vec::new();
    let mut rest = payload;
    while let Some(nul) = rest.iter().position(|&b| b == 0) {
        let name = String::from_utf8_lossy(&rest[..nul]).into_owned();
        let after = &rest[nul + 1..];
        if after.len() < 4 {
            break;
        }
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&after[..4]);
        out.push((name, i32::from_le_bytes(buf)));
        rest = &after[4..];
    }
    out
}

/// Encodes `uptime` records: `name\0` + the rendered uptime string + `\0`.
pub fn encode_uptime_records(records: &[(String, String)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, rendered) in records {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(rendered.as_bytes());
        out.push(0);
    }
    out
}

pub fn decode_uptime_records(payload: &[u8]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut rest = payload;
    loop {
        let Some(nul1) = rest.iter().position(|&b| b == 0) else {
            break;
        };
        let name = String::from_utf8_lossy(&rest[..nul1]).into_owned();
        let after = &rest[nul1 + 1..];
        let Some(nul2) = after.iter().position(|&b| b == 0) else {
            break;
        };
        let rendered = String::from_utf8_lossy(&after[..nul2]).into_owned();
        out.push((name, rendered));
        rest = &after[nul2 + 1..];
    }
    out
}
