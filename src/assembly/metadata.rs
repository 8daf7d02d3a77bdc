//! Reads the declared assembly name out of a managed PE image
//!
//! Only the path to the `Assembly` table row is decoded: CLR header,
//! metadata root, stream headers, the tables stream header and the row
//! sizes of every table stored in front of `Assembly` (0x20).

use super::AssemblyNameReader;
use crate::error::{Error, Result};
use crate::names::AssemblyName;
use goblin::pe::PE;
use std::path::Path;
use thiserror::Error as ThisError;
use tracing::trace;

/// Signature of the metadata root ("BSJB")
const METADATA_MAGIC: u32 = 0x424A_5342;

const ASSEMBLY_TABLE: usize = 0x20;

#[derive(ThisError, Debug)]
pub enum MetadataError {
    #[error("not a PE image: {0}")]
    NotPe(#[from] goblin::error::Error),
    #[error("image has no CLR runtime header")]
    NoClrHeader,
    #[error("RVA 0x{0:x} is not mapped by any section")]
    UnmappedRva(u32),
    #[error("out of bounds read at offset {0}")]
    OutOfBounds(usize),
    #[error("malformed metadata: {0}")]
    Malformed(String),
    #[error("image has no Assembly row (module only?)")]
    NoAssemblyRow,
}

type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// Reads assembly names from .NET PE files on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataReader;

impl MetadataReader {
    pub fn new() -> Self {
        Self
    }
}

impl AssemblyNameReader for MetadataReader {
    fn read_assembly_name(&self, path: &Path) -> Result<AssemblyName> {
        // The handle is closed as soon as the bytes are in memory
        let image = std::fs::read(path).map_err(|e| Error::unreadable(path, e))?;
        let name = assembly_name_from_image(&image).map_err(|e| Error::unreadable(path, e))?;
        trace!("{} declares assembly {}", path.display(), name);
        Ok(name)
    }
}

/// Extract the assembly name from a complete PE image
pub fn assembly_name_from_image(image: &[u8]) -> MetadataResult<AssemblyName> {
    let pe = PE::parse(image)?;
    let optional_header = pe
        .header
        .optional_header
        .as_ref()
        .ok_or(MetadataError::NoClrHeader)?;
    let clr_rva = match optional_header.data_directories.get_clr_runtime_header() {
        Some(dir) if dir.virtual_address != 0 => dir.virtual_address,
        _ => return Err(MetadataError::NoClrHeader),
    };

    let to_offset = |rva: u32| -> MetadataResult<usize> {
        pe.sections
            .iter()
            .find_map(|section| {
                let span = section.virtual_size.max(section.size_of_raw_data);
                let end = section.virtual_address.checked_add(span)?;
                (rva >= section.virtual_address && rva < end)
                    .then(|| (rva - section.virtual_address) as usize + section.pointer_to_raw_data as usize)
            })
            .ok_or(MetadataError::UnmappedRva(rva))
    };

    // Cor20 header: cb, runtime version, then the metadata directory
    let clr_offset = to_offset(clr_rva)?;
    let metadata_rva = read_u32(image, clr_offset + 8)?;
    let metadata_size = read_u32(image, clr_offset + 12)? as usize;
    let metadata_offset = to_offset(metadata_rva)?;
    let metadata = image
        .get(metadata_offset..metadata_offset + metadata_size)
        .ok_or(MetadataError::OutOfBounds(metadata_offset))?;

    assembly_name_from_metadata(metadata)
}

/// Extract the assembly name from the metadata root onwards
pub fn assembly_name_from_metadata(metadata: &[u8]) -> MetadataResult<AssemblyName> {
    let streams = read_stream_headers(metadata)?;

    let tables = streams
        .iter()
        .find(|s| s.name == "#~" || s.name == "#-")
        .ok_or_else(|| MetadataError::Malformed("missing tables stream".to_string()))?;
    let strings = streams
        .iter()
        .find(|s| s.name == "#Strings")
        .ok_or_else(|| MetadataError::Malformed("missing #Strings heap".to_string()))?;

    let tables_data = stream_slice(metadata, tables)?;
    let strings_data = stream_slice(metadata, strings)?;

    let layout = TablesLayout::read(tables_data)?;
    if layout.rows[ASSEMBLY_TABLE] == 0 {
        return Err(MetadataError::NoAssemblyRow);
    }

    let mut offset = layout.rows_end;
    for table in 0..ASSEMBLY_TABLE {
        offset += layout.rows[table] as usize * layout.row_size(table);
    }

    // HashAlgId, four version parts, Flags, then PublicKey (blob)
    let name_column = offset + 4 + 2 * 4 + 4 + layout.blob_width;
    let name_index = read_index(tables_data, name_column, layout.string_width)?;
    let name = read_heap_string(strings_data, name_index)?;
    if name.is_empty() {
        return Err(MetadataError::Malformed("assembly name is empty".to_string()));
    }

    Ok(AssemblyName::new(name))
}

struct StreamHeader {
    offset: usize,
    size: usize,
    name: String,
}

fn read_stream_headers(metadata: &[u8]) -> MetadataResult<Vec<StreamHeader>> {
    if read_u32(metadata, 0)? != METADATA_MAGIC {
        return Err(MetadataError::Malformed("bad metadata signature".to_string()));
    }

    let version_length = read_u32(metadata, 12)? as usize;
    let mut cursor = 16 + version_length;
    // Flags (u16) then the stream count
    let stream_count = read_u16(metadata, cursor + 2)? as usize;
    cursor += 4;

    let mut streams = Vec::with_capacity(stream_count);
    for _ in 0..stream_count {
        let offset = read_u32(metadata, cursor)? as usize;
        let size = read_u32(metadata, cursor + 4)? as usize;
        cursor += 8;

        let name_bytes = metadata.get(cursor..).ok_or(MetadataError::OutOfBounds(cursor))?;
        let name_len = name_bytes
            .iter()
            .take(32)
            .position(|&b| b == 0)
            .ok_or_else(|| MetadataError::Malformed("unterminated stream name".to_string()))?;
        let name = String::from_utf8_lossy(&name_bytes[..name_len]).to_string();
        // Name plus terminator, padded to four bytes
        cursor += (name_len + 1 + 3) & !3;

        streams.push(StreamHeader { offset, size, name });
    }

    Ok(streams)
}

fn stream_slice<'a>(metadata: &'a [u8], stream: &StreamHeader) -> MetadataResult<&'a [u8]> {
    let end = stream
        .offset
        .checked_add(stream.size)
        .ok_or(MetadataError::OutOfBounds(stream.offset))?;
    metadata
        .get(stream.offset..end)
        .ok_or(MetadataError::OutOfBounds(stream.offset))
}

/// Coded index: tag bit count and the tables it may point into
struct CodedIndex {
    bits: u32,
    tables: &'static [usize],
}

const TYPE_DEF_OR_REF: CodedIndex = CodedIndex { bits: 2, tables: &[0x02, 0x01, 0x1B] };
const HAS_CONSTANT: CodedIndex = CodedIndex { bits: 2, tables: &[0x04, 0x08, 0x17] };
const HAS_CUSTOM_ATTRIBUTE: CodedIndex = CodedIndex {
    bits: 5,
    tables: &[
        0x06, 0x04, 0x01, 0x02, 0x08, 0x09, 0x0A, 0x00, 0x0E, 0x17, 0x14, 0x11, 0x1A, 0x1B, 0x20,
        0x23, 0x26, 0x27, 0x28, 0x2A, 0x2C, 0x2B,
    ],
};
const HAS_FIELD_MARSHAL: CodedIndex = CodedIndex { bits: 1, tables: &[0x04, 0x08] };
const HAS_DECL_SECURITY: CodedIndex = CodedIndex { bits: 2, tables: &[0x02, 0x06, 0x20] };
const MEMBER_REF_PARENT: CodedIndex = CodedIndex { bits: 3, tables: &[0x02, 0x01, 0x1A, 0x06, 0x1B] };
const HAS_SEMANTICS: CodedIndex = CodedIndex { bits: 1, tables: &[0x14, 0x17] };
const METHOD_DEF_OR_REF: CodedIndex = CodedIndex { bits: 1, tables: &[0x06, 0x0A] };
const MEMBER_FORWARDED: CodedIndex = CodedIndex { bits: 1, tables: &[0x04, 0x06] };
const CUSTOM_ATTRIBUTE_TYPE: CodedIndex = CodedIndex { bits: 3, tables: &[0x06, 0x0A] };
const RESOLUTION_SCOPE: CodedIndex = CodedIndex { bits: 2, tables: &[0x00, 0x1A, 0x23, 0x01] };

enum Column {
    Fixed(usize),
    Str,
    Guid,
    Blob,
    Table(usize),
    Coded(&'static CodedIndex),
}

use Column::{Blob, Coded, Fixed, Guid, Str, Table};

/// Column layout of tables 0x00 through 0x1F (ECMA-335 II.22)
const SCHEMAS: [&[Column]; ASSEMBLY_TABLE] = [
    /* 0x00 Module */ &[Fixed(2), Str, Guid, Guid, Guid],
    /* 0x01 TypeRef */ &[Coded(&RESOLUTION_SCOPE), Str, Str],
    /* 0x02 TypeDef */ &[Fixed(4), Str, Str, Coded(&TYPE_DEF_OR_REF), Table(0x04), Table(0x06)],
    /* 0x03 FieldPtr */ &[Table(0x04)],
    /* 0x04 Field */ &[Fixed(2), Str, Blob],
    /* 0x05 MethodPtr */ &[Table(0x06)],
    /* 0x06 MethodDef */ &[Fixed(4), Fixed(2), Fixed(2), Str, Blob, Table(0x08)],
    /* 0x07 ParamPtr */ &[Table(0x08)],
    /* 0x08 Param */ &[Fixed(2), Fixed(2), Str],
    /* 0x09 InterfaceImpl */ &[Table(0x02), Coded(&TYPE_DEF_OR_REF)],
    /* 0x0A MemberRef */ &[Coded(&MEMBER_REF_PARENT), Str, Blob],
    /* 0x0B Constant */ &[Fixed(2), Coded(&HAS_CONSTANT), Blob],
    /* 0x0C CustomAttribute */ &[Coded(&HAS_CUSTOM_ATTRIBUTE), Coded(&CUSTOM_ATTRIBUTE_TYPE), Blob],
    /* 0x0D FieldMarshal */ &[Coded(&HAS_FIELD_MARSHAL), Blob],
    /* 0x0E DeclSecurity */ &[Fixed(2), Coded(&HAS_DECL_SECURITY), Blob],
    /* 0x0F ClassLayout */ &[Fixed(2), Fixed(4), Table(0x02)],
    /* 0x10 FieldLayout */ &[Fixed(4), Table(0x04)],
    /* 0x11 StandAloneSig */ &[Blob],
    /* 0x12 EventMap */ &[Table(0x02), Table(0x14)],
    /* 0x13 EventPtr */ &[Table(0x14)],
    /* 0x14 Event */ &[Fixed(2), Str, Coded(&TYPE_DEF_OR_REF)],
    /* 0x15 PropertyMap */ &[Table(0x02), Table(0x17)],
    /* 0x16 PropertyPtr */ &[Table(0x17)],
    /* 0x17 Property */ &[Fixed(2), Str, Blob],
    /* 0x18 MethodSemantics */ &[Fixed(2), Table(0x06), Coded(&HAS_SEMANTICS)],
    /* 0x19 MethodImpl */ &[Table(0x02), Coded(&METHOD_DEF_OR_REF), Coded(&METHOD_DEF_OR_REF)],
    /* 0x1A ModuleRef */ &[Str],
    /* 0x1B TypeSpec */ &[Blob],
    /* 0x1C ImplMap */ &[Fixed(2), Coded(&MEMBER_FORWARDED), Str, Table(0x1A)],
    /* 0x1D FieldRVA */ &[Fixed(4), Table(0x04)],
    /* 0x1E EncLog */ &[Fixed(4), Fixed(4)],
    /* 0x1F EncMap */ &[Fixed(4)],
];

/// Row counts and index widths from the tables stream header
struct TablesLayout {
    rows: [u32; 64],
    string_width: usize,
    guid_width: usize,
    blob_width: usize,
    /// Offset of the first table row
    rows_end: usize,
}

impl TablesLayout {
    fn read(data: &[u8]) -> MetadataResult<Self> {
        let heap_sizes = *data.get(6).ok_or(MetadataError::OutOfBounds(6))?;
        let valid = read_u64(data, 8)?;
        if valid == 0 {
            return Err(MetadataError::Malformed("no tables present".to_string()));
        }

        let mut rows = [0u32; 64];
        let mut cursor = 24;
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1u64 << table) != 0 {
                *count = read_u32(data, cursor)?;
                cursor += 4;
            }
        }

        let width = |flag: u8| if heap_sizes & flag != 0 { 4 } else { 2 };
        Ok(Self {
            rows,
            string_width: width(0x01),
            guid_width: width(0x02),
            blob_width: width(0x04),
            rows_end: cursor,
        })
    }

    fn table_width(&self, table: usize) -> usize {
        if self.rows[table] < (1 << 16) {
            2
        } else {
            4
        }
    }

    fn coded_width(&self, coded: &CodedIndex) -> usize {
        let max_rows = coded.tables.iter().map(|&t| self.rows[t]).max().unwrap_or(0);
        if max_rows < (1u32 << (16 - coded.bits)) {
            2
        } else {
            4
        }
    }

    fn row_size(&self, table: usize) -> usize {
        SCHEMAS[table]
            .iter()
            .map(|column| match column {
                Fixed(size) => *size,
                Str => self.string_width,
                Guid => self.guid_width,
                Blob => self.blob_width,
                Table(target) => self.table_width(*target),
                Coded(coded) => self.coded_width(coded),
            })
            .sum()
    }
}

fn read_heap_string(heap: &[u8], index: usize) -> MetadataResult<String> {
    let bytes = heap.get(index..).ok_or(MetadataError::OutOfBounds(index))?;
    let len = bytes
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| MetadataError::Malformed("unterminated heap string".to_string()))?;
    String::from_utf8(bytes[..len].to_vec())
        .map_err(|_| MetadataError::Malformed("heap string is not UTF-8".to_string()))
}

fn read_index(data: &[u8], offset: usize, width: usize) -> MetadataResult<usize> {
    match width {
        2 => read_u16(data, offset).map(usize::from),
        _ => read_u32(data, offset).map(|v| v as usize),
    }
}

fn read_u16(data: &[u8], offset: usize) -> MetadataResult<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(MetadataError::OutOfBounds(offset))
}

fn read_u32(data: &[u8], offset: usize) -> MetadataResult<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(MetadataError::OutOfBounds(offset))
}

fn read_u64(data: &[u8], offset: usize) -> MetadataResult<u64> {
    let lo = read_u32(data, offset)? as u64;
    let hi = read_u32(data, offset + 4)? as u64;
    Ok(lo | (hi << 32))
}
