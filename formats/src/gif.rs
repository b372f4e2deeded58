//! GIF (87a/89a) container grammar.
//!
//! ```text
//! <GIF Data Stream>         ::= Header <Logical Screen> <Data>* Trailer
//! <Logical Screen>          ::= Logical Screen Descriptor [Global Color Table]
//! <Data>                    ::= <Graphic Block> | <Special-Purpose Block>
//! <Graphic Block>           ::= [Graphic Control Extension] <Graphic-Rendering Block>
//! <Graphic-Rendering Block> ::= <Table-Based Image> | Plain Text Extension
//! <Table-Based Image>       ::= Image Descriptor [Local Color Table] Image Data
//! <Special-Purpose Block>   ::= Application Extension | Comment Extension
//! ```
//!
//! LZW image data is kept compressed as data sub-blocks.

use std::sync::Arc;

use codec::procfield::builtin;
use codec::{
    CodecError, CodecResult, DecodeContext, EncodeContext, Oracle, Procfield, ProcfieldTable,
    Record, Value,
};
use tracing::debug;

pub const SIGNATURE: &[u8; 3] = b"GIF";
pub const VERSIONS: [&[u8; 3]; 2] = [b"87a", b"89a"];

pub const EXTENSION_INTRODUCER: u8 = 0x21;
pub const IMAGE_SEPARATOR: u8 = 0x2C;
pub const TRAILER: u8 = 0x3B;
pub const APPLICATION_LABEL: u8 = 0xFF;
pub const COMMENT_LABEL: u8 = 0xFE;
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
pub const PLAIN_TEXT_LABEL: u8 = 0x01;

/// Block kinds used as the single key of each entry in the `data` list.
pub const APPLICATION_EXTENSION: &str = "application extension";
pub const COMMENT_EXTENSION: &str = "comment extension";
pub const GRAPHIC_BLOCK: &str = "graphic block";

/// Keys of a graphic block record.
pub const GRAPHIC_CONTROL_EXTENSION: &str = "graphic control extension";
pub const IMAGE: &str = "image";
pub const PLAIN_TEXT: &str = "plain text";

/// Number of entries in a colour table with the given 3-bit size field.
#[must_use]
pub const fn color_table_entries(size: u64) -> usize {
    2 << (size & 0x7)
}

/// The GIF grammar as a set of oracles, built once and reused.
#[derive(Debug, Clone)]
pub struct GifParser {
    file: Oracle,
    header: Arc<Oracle>,
    logical_screen: Arc<Oracle>,
    image_descriptor: Arc<Oracle>,
    graphic_control: Arc<Oracle>,
    comment: Arc<Oracle>,
    plain_text: Arc<Oracle>,
    application: Arc<Oracle>,
    table_based_image: Arc<Oracle>,
}

impl GifParser {
    pub fn new() -> CodecResult<Self> {
        let header = Arc::new(Oracle::new(
            "GIF Header",
            "L3c3c",
            &["signature", "version"],
            ProcfieldTable::new(),
        )?);

        let logical_screen = Arc::new(Oracle::new(
            "Logical Screen Descriptor",
            "Lhh(1 3 1 3)bb[gct]",
            &[
                "width",
                "height",
                "global color table flag",
                "color resolution",
                "sort flag",
                "global color table size",
                "background color index",
                "pixel aspect ratio",
                "global color table",
            ],
            ProcfieldTable::new().with(
                "gct",
                color_table("global color table flag", "global color table size", None),
            ),
        )?);

        let image_descriptor = Arc::new(Oracle::new(
            "Image Descriptor",
            "Lbhhhh(1 1 1 2 3)",
            &[
                "separator",
                "left",
                "top",
                "width",
                "height",
                "local color table flag",
                "interlace flag",
                "sort flag",
                "reserved",
                "local color table size",
            ],
            ProcfieldTable::new(),
        )?);

        let graphic_control = Arc::new(Oracle::new(
            "Graphic Control Extension",
            "Lbbb(3 3 1 1)hbb",
            &[
                "extension introducer",
                "graphic control label",
                "block size",
                "reserved",
                "disposal method",
                "user input flag",
                "transparent color flag",
                "delay time",
                "transparent color index",
                "block terminator",
            ],
            ProcfieldTable::new(),
        )?);

        let comment = Arc::new(Oracle::new(
            "Comment Extension",
            "Lbb[db]",
            &["extension introducer", "comment label", "data"],
            ProcfieldTable::new().with("db", builtin::data_blocks()),
        )?);

        let plain_text = Arc::new(Oracle::new(
            "Plain Text Extension",
            "Lbbbhhhhbbbb",
            &[
                "extension introducer",
                "plain text label",
                "block size",
                "text grid left",
                "text grid top",
                "text grid width",
                "text grid height",
                "char cell width",
                "char cell height",
                "text foreground color index",
                "text background color index",
            ],
            ProcfieldTable::new(),
        )?);

        let application = Arc::new(Oracle::new(
            "Application Extension",
            "Lbbb8b3b[db]",
            &[
                "extension introducer",
                "application label",
                "block size",
                "identifier",
                "authentication code",
                "data",
            ],
            ProcfieldTable::new().with("db", builtin::data_blocks()),
        )?);

        let table_based_image = Arc::new(Oracle::new(
            "GIF table-based image",
            "L[id][lct]b[data]",
            &[
                "image descriptor",
                "local color table",
                "lzw code size",
                "image data",
            ],
            ProcfieldTable::new()
                .with("id", image_descriptor.as_procfield())
                .with(
                    "lct",
                    color_table(
                        "local color table flag",
                        "local color table size",
                        Some("image descriptor"),
                    ),
                )
                .with("data", builtin::data_blocks()),
        )?);

        let blocks = Blocks {
            graphic_control: Arc::clone(&graphic_control),
            comment: Arc::clone(&comment),
            plain_text: Arc::clone(&plain_text),
            application: Arc::clone(&application),
            table_based_image: Arc::clone(&table_based_image),
        };

        let file = Oracle::new(
            "GIF file format Top-Level Parser",
            "L[head][ls][data][trailer]",
            &["header", "logical screen", "data", "trailer"],
            ProcfieldTable::new()
                .with("head", header_procfield(Arc::clone(&header)))
                .with("ls", logical_screen.as_procfield())
                .with("data", Procfield::from_handler(blocks))
                .with("trailer", trailer_procfield()),
        )?;

        Ok(Self {
            file,
            header,
            logical_screen,
            image_descriptor,
            graphic_control,
            comment,
            plain_text,
            application,
            table_based_image,
        })
    }

    /// Parses a whole GIF stream, returning the file record and its length
    /// including the trailer.
    pub fn parse(&self, data: &[u8]) -> CodecResult<(Record, usize)> {
        self.file.unpack(data, 0)
    }

    /// Re-emits a file record produced by [`GifParser::parse`].
    pub fn encode(&self, file: &Record) -> CodecResult<Vec<u8>> {
        self.file.pack(file)
    }

    /// The top-level oracle.
    #[must_use]
    pub const fn file_oracle(&self) -> &Oracle {
        &self.file
    }

    #[must_use]
    pub fn header_oracle(&self) -> &Oracle {
        &self.header
    }

    #[must_use]
    pub fn logical_screen_oracle(&self) -> &Oracle {
        &self.logical_screen
    }

    #[must_use]
    pub fn image_descriptor_oracle(&self) -> &Oracle {
        &self.image_descriptor
    }

    #[must_use]
    pub fn graphic_control_oracle(&self) -> &Oracle {
        &self.graphic_control
    }

    #[must_use]
    pub fn comment_oracle(&self) -> &Oracle {
        &self.comment
    }

    #[must_use]
    pub fn plain_text_oracle(&self) -> &Oracle {
        &self.plain_text
    }

    #[must_use]
    pub fn application_oracle(&self) -> &Oracle {
        &self.application
    }

    #[must_use]
    pub fn table_based_image_oracle(&self) -> &Oracle {
        &self.table_based_image
    }
}

/// Header procfield: checks the signature before anything else is read,
/// then the version.
fn header_procfield(header: Arc<Oracle>) -> Procfield {
    let encoder = Arc::clone(&header);
    Procfield::new(
        move |cx: &DecodeContext<'_>| {
            if cx.bytes(0, SIGNATURE.len())? != SIGNATURE {
                return Err(CodecError::invalid_data("Not a GIF file"));
            }
            let (record, used) = header.unpack(cx.data(), cx.offset())?;
            let version = record.field("version")?.chars().unwrap_or_default();
            if !VERSIONS.iter().any(|v| v[..] == version[..]) {
                return Err(CodecError::invalid_data(format!(
                    "Unknown GIF version {:?}",
                    String::from_utf8_lossy(&version)
                )));
            }
            Ok((Value::Record(record), used))
        },
        move |cx: &EncodeContext<'_>, out: &mut Vec<u8>| {
            out.extend(encoder.pack(cx.record()?)?);
            Ok(())
        },
    )
}

/// Colour table procfield driven by a flag and a 3-bit size field.
///
/// With `owner` set, the flag and size are read from that already-decoded
/// sub-record; otherwise from the enclosing record itself.
fn color_table(flag: &'static str, size: &'static str, owner: Option<&'static str>) -> Procfield {
    Procfield::new(
        move |cx: &DecodeContext<'_>| {
            let (present, entries) = match owner {
                Some(owner) => table_shape(cx.field(owner)?, flag, size)?,
                None => (cx.uint(flag)? != 0, color_table_entries(cx.uint(size)?)),
            };
            if !present {
                return Ok((Value::Absent, 0));
            }
            let len = entries * 3;
            Ok((Value::Bytes(cx.bytes(0, len)?.to_vec()), len))
        },
        move |cx: &EncodeContext<'_>, out: &mut Vec<u8>| {
            let (present, entries) = match owner {
                Some(owner) => table_shape(cx.field(owner)?, flag, size)?,
                None => (cx.uint(flag)? != 0, color_table_entries(cx.uint(size)?)),
            };
            match (present, cx.value()) {
                (false, Value::Absent) => Ok(()),
                (true, Value::Bytes(table)) if table.len() == entries * 3 => {
                    out.extend_from_slice(table);
                    Ok(())
                }
                (true, Value::Bytes(table)) => Err(CodecError::invalid_data(format!(
                    "{}: {} bytes, expected {}",
                    cx.name(),
                    table.len(),
                    entries * 3
                ))),
                (true, _) => Err(cx.mismatch("bytes")),
                (false, _) => Err(cx.mismatch("absent")),
            }
        },
    )
}

fn table_shape(owner: &Value, flag: &str, size: &str) -> CodecResult<(bool, usize)> {
    let record = owner.as_record().ok_or_else(|| CodecError::TypeMismatch {
        field: flag.to_string(),
        expected: "record",
        found: owner.kind_name(),
    })?;
    Ok((
        record.uint(flag)? != 0,
        color_table_entries(record.uint(size)?),
    ))
}

fn trailer_procfield() -> Procfield {
    Procfield::new(
        |cx: &DecodeContext<'_>| {
            if cx.read_u8(0)? != TRAILER {
                return Err(CodecError::invalid_data("expected trailer missing"));
            }
            Ok((Value::UInt(u64::from(TRAILER)), 1))
        },
        |cx: &EncodeContext<'_>, out: &mut Vec<u8>| {
            if cx.value().as_uint() != Some(u64::from(TRAILER)) {
                return Err(CodecError::invalid_data("trailer must be 0x3B"));
            }
            out.push(TRAILER);
            Ok(())
        },
    )
}

/// The `<Data>*` loop: special-purpose and graphic blocks up to the trailer.
#[derive(Debug)]
struct Blocks {
    graphic_control: Arc<Oracle>,
    comment: Arc<Oracle>,
    plain_text: Arc<Oracle>,
    application: Arc<Oracle>,
    table_based_image: Arc<Oracle>,
}

impl Blocks {
    fn graphic_block(&self, data: &[u8], pos: usize) -> CodecResult<(Record, usize)> {
        let mut block = Record::new();
        let mut used = 0;
        if starts_with(data, pos, GRAPHIC_CONTROL_LABEL) {
            let (gce, len) = self.graphic_control.unpack(data, pos)?;
            block.set(GRAPHIC_CONTROL_EXTENSION, gce);
            used += len;
        } else {
            block.set(GRAPHIC_CONTROL_EXTENSION, Value::Absent);
        }

        if starts_with(data, pos + used, PLAIN_TEXT_LABEL) {
            debug!(offset = pos + used, "plain text extension");
            let (text, len) = self.plain_text.unpack(data, pos + used)?;
            block.set(PLAIN_TEXT, text);
            used += len;
        } else {
            if matches!(data.get(pos + used), Some(&marker) if marker != IMAGE_SEPARATOR) {
                return Err(CodecError::invalid_data(format!(
                    "unknown GIF block marker at offset {}",
                    pos + used
                )));
            }
            debug!(offset = pos + used, "table-based image");
            let (image, len) = self.table_based_image.unpack(data, pos + used)?;
            block.set(IMAGE, image);
            used += len;
        }
        Ok((block, used))
    }

    fn encode_graphic_block(&self, block: &Record, out: &mut Vec<u8>) -> CodecResult<()> {
        match block.field(GRAPHIC_CONTROL_EXTENSION)? {
            Value::Absent => {}
            Value::Record(gce) => out.extend(self.graphic_control.pack(gce)?),
            other => {
                return Err(CodecError::TypeMismatch {
                    field: GRAPHIC_CONTROL_EXTENSION.to_string(),
                    expected: "record",
                    found: other.kind_name(),
                })
            }
        }
        if let Some(text) = block.get(PLAIN_TEXT) {
            out.extend(self.plain_text.pack(as_record(PLAIN_TEXT, text)?)?);
        } else {
            out.extend(self.table_based_image.pack(block.record(IMAGE)?)?);
        }
        Ok(())
    }
}

impl codec::ProcfieldDecoder for Blocks {
    fn decode(&self, cx: &DecodeContext<'_>) -> CodecResult<(Value, usize)> {
        let data = cx.data();
        let mut pos = cx.offset();
        let mut blocks = Vec::new();

        while cx.read_u8(pos - cx.offset())? != TRAILER {
            let (kind, record, len) = if starts_with(data, pos, APPLICATION_LABEL) {
                let (record, len) = self.application.unpack(data, pos)?;
                (APPLICATION_EXTENSION, record, len)
            } else if starts_with(data, pos, COMMENT_LABEL) {
                let (record, len) = self.comment.unpack(data, pos)?;
                (COMMENT_EXTENSION, record, len)
            } else {
                let (record, len) = self.graphic_block(data, pos)?;
                (GRAPHIC_BLOCK, record, len)
            };
            debug!(kind, offset = pos, len, "gif block");
            blocks.push(Value::Record(Record::new().with(kind, record)));
            pos += len;
        }

        Ok((Value::List(blocks), pos - cx.offset()))
    }
}

impl codec::ProcfieldEncoder for Blocks {
    fn encode(&self, cx: &EncodeContext<'_>, out: &mut Vec<u8>) -> CodecResult<()> {
        let blocks = cx.value().as_list().ok_or_else(|| cx.mismatch("list"))?;
        for block in blocks {
            let entry = as_record(&cx.name(), block)?;
            let Some((kind, body)) = entry.iter().next() else {
                return Err(CodecError::invalid_data("empty GIF block"));
            };
            let body = as_record(kind, body)?;
            match kind {
                APPLICATION_EXTENSION => out.extend(self.application.pack(body)?),
                COMMENT_EXTENSION => out.extend(self.comment.pack(body)?),
                GRAPHIC_BLOCK => self.encode_graphic_block(body, out)?,
                other => {
                    return Err(CodecError::invalid_data(format!(
                        "unknown GIF block kind {other:?}"
                    )))
                }
            }
        }
        Ok(())
    }
}

/// True if an extension with `label` starts at `pos`.
fn starts_with(data: &[u8], pos: usize, label: u8) -> bool {
    data.get(pos..pos + 2) == Some(&[EXTENSION_INTRODUCER, label][..])
}

fn as_record<'a>(field: &str, value: &'a Value) -> CodecResult<&'a Record> {
    value.as_record().ok_or_else(|| CodecError::TypeMismatch {
        field: field.to_string(),
        expected: "record",
        found: value.kind_name(),
    })
}
