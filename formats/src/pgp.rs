//! PGP 2.x packet grammar (keyrings, signatures, messages).
//!
//! Every packet starts with a cipher type byte (CTB):
//!
//! ```text
//!   7     6     5 4 3 2      1 0
//! +-----+-----+----------+--------+
//! |  1  | res |   type   | length |
//! +-----+-----+----------+--------+
//! ```
//!
//! The low two bits select a 1, 2 or 4 byte big-endian length; `3` means the
//! packet has no explicit length and runs to the end of the data.

use std::fmt;
use std::sync::Arc;

use codec::procfield::builtin;
use codec::{
    CodecError, CodecResult, DecodeContext, EncodeContext, Oracle, Procfield, ProcfieldTable,
    Record, Value,
};
use tracing::debug;

/// `length_of_length` value meaning "no explicit length".
pub const INDEFINITE_LENGTH: u64 = 3;

/// Fixed size of a cipher IV when the secret key is encrypted.
pub const CIPHER_IV_LEN: usize = 8;

/// Packet types this grammar understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    PublicKeyEncrypted,
    Signature,
    SecretKeyCertificate,
    PublicKeyCertificate,
    Compressed,
    ConventionalEncrypted,
    Literal,
    Trust,
    UserId,
    Comment,
}

impl PacketKind {
    pub const ALL: [Self; 10] = [
        Self::PublicKeyEncrypted,
        Self::Signature,
        Self::SecretKeyCertificate,
        Self::PublicKeyCertificate,
        Self::Compressed,
        Self::ConventionalEncrypted,
        Self::Literal,
        Self::Trust,
        Self::UserId,
        Self::Comment,
    ];

    /// Message digest packets (type 3) are recognised by PGP but have no
    /// grammar here, so they map to `None` like unknown types.
    #[must_use]
    pub const fn from_type(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::PublicKeyEncrypted),
            2 => Some(Self::Signature),
            5 => Some(Self::SecretKeyCertificate),
            6 => Some(Self::PublicKeyCertificate),
            8 => Some(Self::Compressed),
            9 => Some(Self::ConventionalEncrypted),
            11 => Some(Self::Literal),
            12 => Some(Self::Trust),
            13 => Some(Self::UserId),
            14 => Some(Self::Comment),
            _ => None,
        }
    }

    #[must_use]
    pub const fn type_code(self) -> u8 {
        match self {
            Self::PublicKeyEncrypted => 1,
            Self::Signature => 2,
            Self::SecretKeyCertificate => 5,
            Self::PublicKeyCertificate => 6,
            Self::Compressed => 8,
            Self::ConventionalEncrypted => 9,
            Self::Literal => 11,
            Self::Trust => 12,
            Self::UserId => 13,
            Self::Comment => 14,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::PublicKeyEncrypted => "public-key-encrypted packet",
            Self::Signature => "secret-key-encrypted (signature) packet",
            Self::SecretKeyCertificate => "Secret key certificate",
            Self::PublicKeyCertificate => "Public key certificate",
            Self::Compressed => "Compressed data packet",
            Self::ConventionalEncrypted => "Conventional-Key-Encrypted data",
            Self::Literal => "Raw literal plaintext data, with filename and mode",
            Self::Trust => "Keyring trust packet",
            Self::UserId => "User ID packet, associated with public or secret key",
            Self::Comment => "Comment packet",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Human-readable meaning of a signature classification byte.
#[must_use]
pub const fn signature_classification(code: u64) -> Option<&'static str> {
    match code {
        0x00 => Some("signature of message or document, binary image"),
        0x01 => Some("signature of message or document, canonical text"),
        0x10 => Some("key certification, generic"),
        0x11 => Some("key certification, persona"),
        0x12 => Some("key certification, casual"),
        0x13 => Some("key certification, positive id"),
        0x20 => Some("key compromise"),
        0x30 => Some("key/userid revocation"),
        0x40 => Some("signature timestamp"),
        _ => None,
    }
}

/// A decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketKind,
    pub fields: Record,
}

impl Packet {
    /// The decoded cipher type byte.
    pub fn ctb(&self) -> CodecResult<&Record> {
        self.fields.record("ctb")
    }
}

/// The PGP packet grammar as a set of oracles, built once and reused.
#[derive(Debug, Clone)]
pub struct PgpParser {
    ctb: Arc<Oracle>,
    trust_flags: Oracle,
    packets: Vec<Oracle>,
}

impl PgpParser {
    pub fn new() -> CodecResult<Self> {
        let ctb = Arc::new(Oracle::new(
            "cipher type byte",
            "B(1 1 4 2)",
            &["ctb_designator", "reserved", "type", "length_of_length"],
            ProcfieldTable::new(),
        )?);

        let base = ProcfieldTable::new()
            .with("ctb", ctb.as_procfield())
            .with("len", length_procfield())
            .with("mpi", builtin::mpi())
            .with("rps", builtin::pascal_string());

        let trust_flags = Oracle::new(
            "trust bits for a key",
            "B(3 2 1 1 1)",
            &["ownertrust", "reserved", "disabled", "reserved2", "buckstop"],
            ProcfieldTable::new(),
        )?;

        let packets = PacketKind::ALL
            .iter()
            .map(|kind| packet_oracle(*kind, &base))
            .collect::<CodecResult<Vec<_>>>()?;

        Ok(Self {
            ctb,
            trust_flags,
            packets,
        })
    }

    /// The oracle used for packets of `kind`.
    #[must_use]
    pub fn oracle(&self, kind: PacketKind) -> &Oracle {
        &self.packets[kind.index()]
    }

    #[must_use]
    pub fn ctb_oracle(&self) -> &Oracle {
        &self.ctb
    }

    /// Classifies the packet starting at `offset` from its CTB alone.
    pub fn packet_kind(&self, data: &[u8], offset: usize) -> CodecResult<PacketKind> {
        let (ctb, _) = self.ctb.unpack(data, offset)?;
        if ctb.uint("ctb_designator")? == 0 {
            return Err(CodecError::invalid_data(format!(
                "not a CTB byte at offset {offset}"
            )));
        }
        let code = ctb.uint("type")?;
        match PacketKind::from_type(code) {
            Some(kind) => Ok(kind),
            None if code == 3 => Err(CodecError::invalid_data(
                "message digest packets are not supported",
            )),
            None => Err(CodecError::invalid_data(format!("unknown CTB type {code}"))),
        }
    }

    /// Decodes one packet, returning it and its total length.
    pub fn parse_packet(&self, data: &[u8], offset: usize) -> CodecResult<(Packet, usize)> {
        let kind = self.packet_kind(data, offset)?;
        debug!(%kind, offset, "pgp packet");
        let (fields, used) = self.oracle(kind).unpack(data, offset)?;
        Ok((Packet { kind, fields }, used))
    }

    /// Decodes packets back to back until the data is exhausted.
    pub fn parse_all(&self, data: &[u8]) -> CodecResult<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let (packet, used) = self.parse_packet(data, pos)?;
            if used == 0 {
                return Err(CodecError::invalid_data(format!(
                    "empty packet at offset {pos}"
                )));
            }
            packets.push(packet);
            pos += used;
        }
        Ok(packets)
    }

    /// Re-emits a packet. The CTB's type must agree with `packet.kind`.
    pub fn encode_packet(&self, packet: &Packet) -> CodecResult<Vec<u8>> {
        let code = packet.ctb()?.uint("type")?;
        if code != u64::from(packet.kind.type_code()) {
            return Err(CodecError::invalid_data(format!(
                "CTB type {code} does not match {}",
                packet.kind
            )));
        }
        self.oracle(packet.kind).pack(&packet.fields)
    }

    /// Decodes the flags byte of a keyring trust packet.
    pub fn trust_flags(&self, flags: u8) -> CodecResult<Record> {
        self.trust_flags.unpack(&[flags], 0).map(|(record, _)| record)
    }
}

fn packet_oracle(kind: PacketKind, base: &ProcfieldTable) -> CodecResult<Oracle> {
    let (format, names): (&str, &[&str]) = match kind {
        PacketKind::PublicKeyEncrypted => (
            "B[ctb][len]b8bb[mpi]",
            &["ctb", "length", "version", "key_id", "algorithm", "key"],
        ),
        PacketKind::Signature => (
            "B[ctb][len]bbbl8bbb2b[mpi]",
            &[
                "ctb",
                "length",
                "version",
                "md_length",
                "signature_classification",
                "timestamp",
                "key_id",
                "pub_key_algorithm",
                "md_algorithm",
                "check_bytes",
                "digest",
            ],
        ),
        PacketKind::SecretKeyCertificate => (
            "B[ctb][len]blhb[mpi][mpi]b[civ][mpi][mpi][mpi][mpi]h",
            &[
                "ctb",
                "length",
                "version",
                "timestamp",
                "valid_for",
                "algorithm",
                "rsa_pub_mod_n",
                "rsa_enc_exp",
                "cipher_algorithm",
                "cipher_iv",
                "sec_exp_d",
                "sec_fac_p",
                "sec_fac_q",
                "sec_mul_inv_u",
                "checksum",
            ],
        ),
        PacketKind::PublicKeyCertificate => (
            "B[ctb][len]blhb[mpi][mpi]",
            &[
                "ctb",
                "length",
                "version",
                "timestamp",
                "valid_for",
                "algorithm",
                "rsa_pub_mod_n",
                "rsa_pub_enc_exp",
            ],
        ),
        PacketKind::Compressed => (
            "B[ctb][len]b[cd]",
            &["ctb", "length", "algorithm", "data"],
        ),
        PacketKind::ConventionalEncrypted => ("B[ctb][len][ed]", &["ctb", "length", "data"]),
        PacketKind::Literal => (
            "B[ctb][len]b[rps]l[rd]",
            &["ctb", "length", "mode", "filename", "timestamp", "data"],
        ),
        PacketKind::Trust => ("B[ctb]bb", &["ctb", "length", "flags"]),
        PacketKind::UserId => ("B[ctb][rps]", &["ctb", "user_id"]),
        PacketKind::Comment => ("B[ctb][rps]", &["ctb", "comment"]),
    };

    let mut procfields = base.clone();
    match kind {
        PacketKind::Compressed => {
            procfields.insert("cd", body_procfield(|_| 1));
        }
        PacketKind::ConventionalEncrypted => {
            procfields.insert("ed", body_procfield(|_| 0));
        }
        PacketKind::Literal => {
            // mode + filename length byte + filename + timestamp
            procfields.insert(
                "rd",
                body_procfield(|filename| 1 + 1 + filename + 4),
            );
        }
        PacketKind::SecretKeyCertificate => {
            procfields.insert("civ", cipher_iv_procfield());
        }
        _ => {}
    }

    Oracle::builder(kind.description(), format)
        .fields(names)
        .procfields(procfields)
        .build()
}

/// Explicit length size in bytes for a CTB record, or `None` if indefinite.
fn length_size(ctb: &Value) -> CodecResult<Option<usize>> {
    let record = ctb.as_record().ok_or_else(|| CodecError::TypeMismatch {
        field: "ctb".to_string(),
        expected: "record",
        found: ctb.kind_name(),
    })?;
    let lol = record.uint("length_of_length")?;
    Ok((lol != INDEFINITE_LENGTH).then(|| 1 << lol))
}

fn length_procfield() -> Procfield {
    Procfield::new(
        |cx: &DecodeContext<'_>| {
            let Some(size) = length_size(cx.field("ctb")?)? else {
                return Ok((Value::UInt(0), 0));
            };
            let (data, pos, order) = (cx.data(), cx.offset(), cx.byte_order());
            let length = match size {
                1 => u64::from(wire::read_u8(data, pos)?),
                2 => u64::from(wire::read_u16(data, pos, order)?),
                _ => u64::from(wire::read_u32(data, pos, order)?),
            };
            Ok((Value::UInt(length), size))
        },
        |cx: &EncodeContext<'_>, out: &mut Vec<u8>| {
            let length = cx.value().as_uint().ok_or_else(|| cx.mismatch("uint"))?;
            match length_size(cx.field("ctb")?)? {
                None => {}
                Some(1) => wire::write_u8(out, length)?,
                Some(2) => wire::write_u16(out, length, cx.byte_order())?,
                Some(_) => wire::write_u32(out, length, cx.byte_order())?,
            }
            Ok(())
        },
    )
}

/// Opaque body whose length is the packet length minus a header computed
/// from the filename length (0 when the packet has no filename), or the
/// rest of the data when the packet length is indefinite.
fn body_procfield(header_len: fn(usize) -> usize) -> Procfield {
    Procfield::new(
        move |cx: &DecodeContext<'_>| {
            let len = match length_size(cx.field("ctb")?)? {
                None => cx.remaining().len(),
                Some(_) => {
                    let filename = cx
                        .field("filename")
                        .ok()
                        .and_then(Value::as_bytes)
                        .map_or(0, <[u8]>::len);
                    let packet_len = usize::try_from(cx.uint("length")?).unwrap_or(usize::MAX);
                    packet_len
                        .checked_sub(header_len(filename))
                        .ok_or_else(|| {
                            CodecError::invalid_data(format!(
                                "packet length {packet_len} shorter than its header"
                            ))
                        })?
                }
            };
            Ok((Value::Bytes(cx.bytes(0, len)?.to_vec()), len))
        },
        |cx: &EncodeContext<'_>, out: &mut Vec<u8>| {
            let bytes = cx.value().as_bytes().ok_or_else(|| cx.mismatch("bytes"))?;
            out.extend_from_slice(bytes);
            Ok(())
        },
    )
}

/// Eight IV bytes, present only when `cipher_algorithm` is non-zero.
fn cipher_iv_procfield() -> Procfield {
    Procfield::new(
        |cx: &DecodeContext<'_>| {
            if cx.uint("cipher_algorithm")? == 0 {
                return Ok((Value::Absent, 0));
            }
            let iv = cx.bytes(0, CIPHER_IV_LEN)?;
            let items = iv.iter().map(|b| Value::UInt(u64::from(*b))).collect();
            Ok((Value::List(items), CIPHER_IV_LEN))
        },
        |cx: &EncodeContext<'_>, out: &mut Vec<u8>| {
            let encrypted = cx.uint("cipher_algorithm")? != 0;
            match (encrypted, cx.value()) {
                (false, Value::Absent) => Ok(()),
                (true, Value::List(items)) if items.len() == CIPHER_IV_LEN => {
                    for item in items {
                        let byte = item
                            .as_uint()
                            .filter(|v| *v <= 0xFF)
                            .ok_or_else(|| cx.mismatch("list of bytes"))?;
                        out.push(byte as u8);
                    }
                    Ok(())
                }
                (true, _) => Err(cx.mismatch("list of 8 bytes")),
                (false, _) => Err(cx.mismatch("absent")),
            }
        },
    )
}
