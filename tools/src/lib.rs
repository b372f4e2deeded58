//! Inspection helpers for the bitoracle command-line tools.
//!
//! Turns decoded GIF files and PGP packet streams into serializable
//! summaries, renders those summaries for humans, and scans batches of
//! files one at a time so a bad file never hides the rest.
//!
//! # Design Principles
//!
//! - **Decode fully, summarize after** - Summaries never touch raw bytes.
//! - **Human-readable output** - Pretty output follows the file's own structure.

use std::fmt::Write as _;

use codec::{CodecResult, Record, Value};
use formats::gif::{
    APPLICATION_EXTENSION, COMMENT_EXTENSION, GRAPHIC_BLOCK, GRAPHIC_CONTROL_EXTENSION, IMAGE,
    PLAIN_TEXT,
};
use formats::pgp::signature_classification;
use formats::Packet;
use serde::Serialize;

mod scan;

pub use scan::{
    collect_entries, FileOutcome, OutputFormat, ScanKind, ScanOptions, ScanReport, Scanner,
};

/// Longest byte string rendered in full by [`render_value`].
pub const MAX_RENDERED_BYTES: usize = 32;

/// Overview of a decoded GIF file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GifSummary {
    pub version: String,
    pub length: usize,
    pub width: u64,
    pub height: u64,
    pub colors: usize,
    pub blocks: Vec<BlockSummary>,
}

/// One entry of a GIF's data section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockSummary {
    Image {
        width: u64,
        height: u64,
        interlaced: bool,
        local_colors: Option<usize>,
        lzw_code_size: u64,
        data_blocks: usize,
        data_bytes: usize,
        transparent_color: Option<[u8; 3]>,
    },
    PlainText {
        grid_width: u64,
        grid_height: u64,
        transparent_color: Option<[u8; 3]>,
    },
    Application {
        identifier: String,
        authentication_code: String,
        data_bytes: usize,
    },
    Comment {
        text: String,
    },
}

/// Overview of one PGP packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketSummary {
    pub kind: String,
    pub type_code: u8,
    pub length: u64,
    pub fields: Record,
}

/// Builds a summary from a record produced by `GifParser::parse`.
pub fn summarize_gif(file: &Record, length: usize) -> CodecResult<GifSummary> {
    let header = file.record("header")?;
    let version = String::from_utf8_lossy(&header.field("version")?.chars().unwrap_or_default())
        .into_owned();
    let screen = file.record("logical screen")?;
    let palette = screen
        .get("global color table")
        .and_then(Value::as_bytes)
        .unwrap_or_default();

    let blocks = file
        .list("data")?
        .iter()
        .map(|block| summarize_block(block, palette))
        .collect::<CodecResult<Vec<_>>>()?;

    Ok(GifSummary {
        version,
        length,
        width: screen.uint("width")?,
        height: screen.uint("height")?,
        colors: palette.len() / 3,
        blocks,
    })
}

fn summarize_block(block: &Value, palette: &[u8]) -> CodecResult<BlockSummary> {
    let entry = block.as_record().ok_or_else(|| not_a_record("block", block))?;
    if let Some(app) = entry.get(APPLICATION_EXTENSION) {
        let app = app
            .as_record()
            .ok_or_else(|| not_a_record(APPLICATION_EXTENSION, app))?;
        return Ok(BlockSummary::Application {
            identifier: hex(&list_bytes(app.list("identifier")?)),
            authentication_code: hex(&list_bytes(app.list("authentication code")?)),
            data_bytes: block_bytes(app.list("data")?).len(),
        });
    }
    if let Some(comment) = entry.get(COMMENT_EXTENSION) {
        let comment = comment
            .as_record()
            .ok_or_else(|| not_a_record(COMMENT_EXTENSION, comment))?;
        let text = block_bytes(comment.list("data")?);
        return Ok(BlockSummary::Comment {
            text: String::from_utf8_lossy(&text).into_owned(),
        });
    }

    let graphic = entry.record(GRAPHIC_BLOCK)?;
    let transparent_color = match graphic.field(GRAPHIC_CONTROL_EXTENSION)? {
        Value::Record(gce) if gce.uint("transparent color flag")? != 0 => {
            let index = usize::try_from(gce.uint("transparent color index")?).unwrap_or(usize::MAX);
            palette
                .chunks_exact(3)
                .nth(index)
                .map(|rgb| [rgb[0], rgb[1], rgb[2]])
        }
        _ => None,
    };

    if let Some(text) = graphic.get(PLAIN_TEXT) {
        let text = text.as_record().ok_or_else(|| not_a_record(PLAIN_TEXT, text))?;
        return Ok(BlockSummary::PlainText {
            grid_width: text.uint("text grid width")?,
            grid_height: text.uint("text grid height")?,
            transparent_color,
        });
    }

    let image = graphic.record(IMAGE)?;
    let descriptor = image.record("image descriptor")?;
    let data = image.list("image data")?;
    Ok(BlockSummary::Image {
        width: descriptor.uint("width")?,
        height: descriptor.uint("height")?,
        interlaced: descriptor.uint("interlace flag")? != 0,
        local_colors: image
            .get("local color table")
            .and_then(Value::as_bytes)
            .map(|table| table.len() / 3),
        lzw_code_size: image.uint("lzw code size")?,
        data_blocks: data.len(),
        data_bytes: block_bytes(data).len(),
        transparent_color,
    })
}

/// Builds one summary per packet.
pub fn summarize_packets(packets: &[Packet]) -> Vec<PacketSummary> {
    packets
        .iter()
        .map(|packet| PacketSummary {
            kind: packet.kind.description().to_string(),
            type_code: packet.kind.type_code(),
            length: packet.fields.uint("length").unwrap_or(0),
            fields: packet.fields.clone(),
        })
        .collect()
}

/// Renders a GIF summary the way a person would describe the file.
pub fn format_gif_pretty(summary: &GifSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "GIF Version: {}", summary.version);
    let _ = writeln!(out, "File Length: {}", summary.length);
    let _ = writeln!(out, "Width: {} Height: {}", summary.width, summary.height);
    let _ = writeln!(out, "Colors: {}", summary.colors);
    let _ = writeln!(out, "Number of Blocks: {}", summary.blocks.len());
    for (i, block) in summary.blocks.iter().enumerate() {
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "Block: {i}");
        match block {
            BlockSummary::Image {
                width,
                height,
                interlaced,
                local_colors,
                lzw_code_size,
                data_blocks,
                data_bytes,
                transparent_color,
            } => {
                write_transparent(&mut out, *transparent_color);
                let _ = writeln!(out, "Image: {width}x{height}");
                let _ = writeln!(out, "Image Data: {data_blocks} blocks, {data_bytes} bytes");
                match local_colors {
                    Some(colors) => {
                        let _ = writeln!(out, "Local Color Table: yes, {colors} colors");
                    }
                    None => {
                        let _ = writeln!(out, "Local Color Table: no");
                    }
                }
                let _ = writeln!(out, "Interlaced: {}", yes_no(*interlaced));
                let _ = writeln!(out, "LZW starting code size: {lzw_code_size}");
            }
            BlockSummary::PlainText {
                grid_width,
                grid_height,
                transparent_color,
            } => {
                write_transparent(&mut out, *transparent_color);
                let _ = writeln!(out, "Plain Text: {grid_width}x{grid_height} grid");
            }
            BlockSummary::Application {
                identifier,
                authentication_code,
                data_bytes,
            } => {
                let _ = writeln!(out, "Application Extension");
                let _ = writeln!(out, "identifier {identifier} ({authentication_code})");
                let _ = writeln!(out, "data: {data_bytes} bytes");
            }
            BlockSummary::Comment { text } => {
                let _ = writeln!(out, "Comment: {text:?}");
            }
        }
    }
    out
}

/// Renders packet summaries as `name: value` listings.
pub fn format_packets_pretty(packets: &[PacketSummary]) -> String {
    let mut out = String::new();
    for packet in packets {
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "{} (type {})", packet.kind, packet.type_code);
        for (name, value) in packet.fields.iter() {
            let rendered = render_value(value);
            match (name, value.as_uint().and_then(signature_classification)) {
                ("signature_classification", Some(meaning)) => {
                    let _ = writeln!(out, "  {name}: {rendered} ({meaning})");
                }
                _ => {
                    let _ = writeln!(out, "  {name}: {rendered}");
                }
            }
        }
    }
    out
}

/// Compact one-line rendering of a decoded value.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::UInt(v) => v.to_string(),
        Value::Char(c) => char::from(*c).to_string(),
        Value::List(items) if items.iter().all(|item| item.as_char().is_some()) => {
            let bytes: Vec<u8> = items.iter().filter_map(Value::as_char).collect();
            format!("{:?}", String::from_utf8_lossy(&bytes))
        }
        Value::List(items) if items.iter().all(|item| item.as_uint().is_some_and(|v| v <= 0xFF)) => {
            hex(&list_bytes(items))
        }
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Bytes(bytes) => render_bytes(bytes),
        Value::Mpi(mpi) => {
            let shown = &mpi.magnitude()[..mpi.magnitude().len().min(MAX_RENDERED_BYTES)];
            let ellipsis = if shown.len() < mpi.magnitude().len() { "..." } else { "" };
            format!("{}-bit 0x{}{ellipsis}", mpi.bits(), hex(shown))
        }
        Value::Record(record) => {
            let parts: Vec<String> = record
                .iter()
                .map(|(name, value)| format!("{name}: {}", render_value(value)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Absent => "-".to_string(),
    }
}

fn render_bytes(bytes: &[u8]) -> String {
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        return format!("{:?}", String::from_utf8_lossy(bytes));
    }
    if bytes.len() > MAX_RENDERED_BYTES {
        return format!(
            "0x{}... ({} bytes)",
            hex(&bytes[..MAX_RENDERED_BYTES]),
            bytes.len()
        );
    }
    format!("0x{}", hex(bytes))
}

fn write_transparent(out: &mut String, color: Option<[u8; 3]>) {
    if let Some([r, g, b]) = color {
        let _ = writeln!(out, "Transparent Color: R:{r:3} G:{g:3} B:{b:3}");
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

fn list_bytes(items: &[Value]) -> Vec<u8> {
    items
        .iter()
        .filter_map(Value::as_uint)
        .map(|v| v as u8)
        .collect()
}

/// Concatenates data sub-blocks.
fn block_bytes(blocks: &[Value]) -> Vec<u8> {
    blocks
        .iter()
        .filter_map(Value::as_bytes)
        .flatten()
        .copied()
        .collect()
}

fn not_a_record(field: &str, value: &Value) -> codec::CodecError {
    codec::CodecError::TypeMismatch {
        field: field.to_string(),
        expected: "record",
        found: value.kind_name(),
    }
}
