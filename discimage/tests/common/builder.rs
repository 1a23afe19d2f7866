//! Byte-level builders for synthetic ISO9660 and UDF images

use std::collections::HashMap;

const SECTOR: usize = 2048;

/// One entry of a synthetic directory tree
#[derive(Debug, Clone)]
pub enum Entry {
    File {
        name: Vec<u8>,
        rock_ridge: Option<String>,
        content: Vec<u8>,
    },
    Dir {
        name: Vec<u8>,
        rock_ridge: Option<String>,
        children: Vec<Entry>,
    },
    /// Directory record pointing at an arbitrary extent (ISO9660 only)
    Link { name: Vec<u8>, sector: u32, size: u32 },
}

impl Entry {
    pub fn file(name: &str, content: &[u8]) -> Self {
        Entry::File {
            name: name.as_bytes().to_vec(),
            rock_ridge: None,
            content: content.to_vec(),
        }
    }

    pub fn dir(name: &str, children: Vec<Entry>) -> Self {
        Entry::Dir {
            name: name.as_bytes().to_vec(),
            rock_ridge: None,
            children,
        }
    }

    pub fn link(name: &str, sector: u32, size: u32) -> Self {
        Entry::Link {
            name: name.as_bytes().to_vec(),
            sector,
            size,
        }
    }

    /// File named in UCS-2 big endian, as Joliet tables store names
    pub fn joliet_file(name: &str, content: &[u8]) -> Self {
        Entry::File {
            name: utf16_be(name),
            rock_ridge: None,
            content: content.to_vec(),
        }
    }

    pub fn joliet_dir(name: &str, children: Vec<Entry>) -> Self {
        Entry::Dir {
            name: utf16_be(name),
            rock_ridge: None,
            children,
        }
    }

    /// Attach a Rock Ridge NM name (and PX attributes)
    pub fn rock_ridge(mut self, alternate: &str) -> Self {
        match &mut self {
            Entry::File { rock_ridge, .. } | Entry::Dir { rock_ridge, .. } => {
                *rock_ridge = Some(alternate.to_string());
            }
            Entry::Link { .. } => panic!("links carry no Rock Ridge entries"),
        }
        self
    }

    fn name(&self) -> &[u8] {
        match self {
            Entry::File { name, .. } | Entry::Dir { name, .. } | Entry::Link { name, .. } => name,
        }
    }
}

fn utf16_be(name: &str) -> Vec<u8> {
    name.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
}

fn both_u32(dst: &mut [u8], value: u32) {
    dst[0..4].copy_from_slice(&value.to_le_bytes());
    dst[4..8].copy_from_slice(&value.to_be_bytes());
}

fn both_u16(dst: &mut [u8], value: u16) {
    dst[0..2].copy_from_slice(&value.to_le_bytes());
    dst[2..4].copy_from_slice(&value.to_be_bytes());
}

fn put_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(data: &mut [u8], offset: usize, value: u64) {
    data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn write_at(data: &mut Vec<u8>, sector: usize, bytes: &[u8]) {
    let offset = sector * SECTOR;
    let end = (offset + bytes.len()).next_multiple_of(SECTOR);
    if data.len() < end {
        data.resize(end, 0);
    }
    data[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn sectors_for(bytes: usize) -> u32 {
    bytes.div_ceil(SECTOR).max(1) as u32
}

// ---------------------------------------------------------------------------
// ISO9660
// ---------------------------------------------------------------------------

fn system_use(alternate: Option<&str>, is_directory: bool) -> Vec<u8> {
    let Some(alternate) = alternate else {
        return Vec::new();
    };
    let mut su = Vec::new();

    su.extend_from_slice(b"PX");
    su.push(44);
    su.push(1);
    let mode: u32 = if is_directory { 0o040755 } else { 0o100644 };
    for value in [mode, 1, 1000, 1000, 0] {
        let mut field = [0u8; 8];
        both_u32(&mut field, value);
        su.extend_from_slice(&field);
    }

    su.extend_from_slice(b"NM");
    su.push((5 + alternate.len()) as u8);
    su.push(1);
    su.push(0);
    su.extend_from_slice(alternate.as_bytes());
    su
}

fn directory_record(name: &[u8], sector: u32, size: u32, flags: u8, system_use: &[u8]) -> Vec<u8> {
    let mut fixed = 33 + name.len();
    if fixed % 2 != 0 {
        fixed += 1;
    }
    let mut record = vec![0u8; fixed];
    record.extend_from_slice(system_use);
    if record.len() % 2 != 0 {
        record.push(0);
    }

    record[0] = record.len() as u8;
    both_u32(&mut record[2..10], sector);
    both_u32(&mut record[10..18], size);
    // 2024-01-01 00:00:00 GMT
    record[18] = 124;
    record[19] = 1;
    record[20] = 1;
    record[25] = flags;
    both_u16(&mut record[28..32], 1);
    record[32] = name.len() as u8;
    record[33..33 + name.len()].copy_from_slice(name);
    record
}

fn child_record(child: &Entry, sector: u32, size: u32) -> Vec<u8> {
    match child {
        Entry::File {
            name, rock_ridge, ..
        } => directory_record(name, sector, size, 0x00, &system_use(rock_ridge.as_deref(), false)),
        Entry::Dir {
            name, rock_ridge, ..
        } => directory_record(name, sector, size, 0x02, &system_use(rock_ridge.as_deref(), true)),
        Entry::Link { name, .. } => directory_record(name, sector, size, 0x02, &[]),
    }
}

/// Records never straddle a sector; the extent is whole sectors
fn pack(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut used = 0;
    for record in records {
        if used + record.len() > SECTOR {
            out.resize(out.len() + SECTOR - used, 0);
            used = 0;
        }
        out.extend_from_slice(record);
        used += record.len();
    }
    let padded = out.len().next_multiple_of(SECTOR).max(SECTOR);
    out.resize(padded, 0);
    out
}

fn iso_directory_len(children: &[Entry]) -> u32 {
    let mut records = vec![
        directory_record(&[0], 0, 0, 0x02, &[]),
        directory_record(&[1], 0, 0, 0x02, &[]),
    ];
    records.extend(children.iter().map(|child| child_record(child, 0, 0)));
    pack(&records).len() as u32
}

struct IsoLayout {
    data: Vec<u8>,
    next: u32,
}

impl IsoLayout {
    fn alloc(&mut self, bytes: usize) -> u32 {
        let sector = self.next;
        self.next += sectors_for(bytes);
        let end = self.next as usize * SECTOR;
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        sector
    }

    fn write_directory(&mut self, sector: u32, size: u32, parent: (u32, u32), children: &[Entry]) {
        let placed: Vec<(u32, u32)> = children
            .iter()
            .map(|child| match child {
                Entry::File { content, .. } => (self.alloc(content.len()), content.len() as u32),
                Entry::Dir { children, .. } => {
                    let len = iso_directory_len(children);
                    (self.alloc(len as usize), len)
                }
                Entry::Link { sector, size, .. } => (*sector, *size),
            })
            .collect();

        let mut records = vec![
            directory_record(&[0], sector, size, 0x02, &[]),
            directory_record(&[1], parent.0, parent.1, 0x02, &[]),
        ];
        for (child, &(child_sector, child_size)) in children.iter().zip(&placed) {
            records.push(child_record(child, child_sector, child_size));
        }
        write_at(&mut self.data, sector as usize, &pack(&records));

        for (child, &(child_sector, child_size)) in children.iter().zip(&placed) {
            match child {
                Entry::File { content, .. } => write_at(&mut self.data, child_sector as usize, content),
                Entry::Dir { children, .. } => {
                    self.write_directory(child_sector, child_size, (sector, size), children)
                }
                Entry::Link { .. } => {}
            }
        }
    }
}

struct Table {
    kind: u8,
    escapes: &'static [u8],
    entries: Vec<Entry>,
}

/// Builds ISO9660 images with any number of tables of contents
///
/// Descriptors start at sector 16 in the order they were added, followed
/// by a terminator; directories and file data follow.
#[derive(Default)]
pub struct IsoBuilder {
    tables: Vec<Table>,
}

impl IsoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary volume descriptor with the given root entries
    pub fn primary(mut self, entries: Vec<Entry>) -> Self {
        self.tables.push(Table {
            kind: 1,
            escapes: b"",
            entries,
        });
        self
    }

    /// Joliet (UCS-2 level 3) supplementary descriptor
    pub fn joliet(mut self, entries: Vec<Entry>) -> Self {
        self.tables.push(Table {
            kind: 2,
            escapes: b"%/E",
            entries,
        });
        self
    }

    /// Enhanced descriptor without Joliet escapes
    pub fn enhanced(mut self, entries: Vec<Entry>) -> Self {
        self.tables.push(Table {
            kind: 2,
            escapes: b"",
            entries,
        });
        self
    }

    /// Volume partition descriptor (no root directory)
    pub fn partition(mut self) -> Self {
        self.tables.push(Table {
            kind: 3,
            escapes: b"",
            entries: Vec::new(),
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let terminator = 16 + self.tables.len();
        let mut layout = IsoLayout {
            data: vec![0u8; (terminator + 1) * SECTOR],
            next: terminator as u32 + 1,
        };

        let mut descriptors = Vec::new();
        for table in &self.tables {
            let mut descriptor = vec![0u8; SECTOR];
            descriptor[0] = table.kind;
            descriptor[1..6].copy_from_slice(b"CD001");
            descriptor[6] = 1;

            if table.kind != 3 {
                descriptor[8..40].fill(b' ');
                descriptor[8..12].copy_from_slice(b"TEST");
                descriptor[40..72].fill(b' ');
                descriptor[40..46].copy_from_slice(b"VOLUME");
                descriptor[88..88 + table.escapes.len()].copy_from_slice(table.escapes);
                both_u16(&mut descriptor[128..132], SECTOR as u16);

                let root_len = iso_directory_len(&table.entries);
                let root = layout.alloc(root_len as usize);
                layout.write_directory(root, root_len, (root, root_len), &table.entries);
                let record = directory_record(&[0], root, root_len, 0x02, &[]);
                descriptor[156..156 + record.len()].copy_from_slice(&record);
            }
            descriptors.push(descriptor);
        }

        let total = layout.next;
        let mut data = layout.data;
        for (i, mut descriptor) in descriptors.into_iter().enumerate() {
            if descriptor[0] != 3 {
                both_u32(&mut descriptor[80..88], total);
            }
            write_at(&mut data, 16 + i, &descriptor);
        }

        let mut end = vec![0u8; SECTOR];
        end[0] = 255;
        end[1..6].copy_from_slice(b"CD001");
        end[6] = 1;
        write_at(&mut data, terminator, &end);
        data
    }
}

// ---------------------------------------------------------------------------
// UDF
// ---------------------------------------------------------------------------

fn write_tag(raw: &mut [u8], identifier: u16, location: u32, crc_length: u16) {
    put_u16(raw, 0, identifier);
    put_u16(raw, 2, 2);
    put_u16(raw, 6, 1);
    put_u16(raw, 10, crc_length);
    put_u32(raw, 12, location);
    raw[4] = raw[..16]
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != 4)
        .fold(0u8, |sum, (_, &b)| sum.wrapping_add(b));
}

fn fixed_dstring(field: &mut [u8], value: &str) {
    field[0] = 8;
    field[1..1 + value.len()].copy_from_slice(value.as_bytes());
    let last = field.len() - 1;
    field[last] = (1 + value.len()) as u8;
}

fn file_identifier(characteristics: u8, icb_block: u32, name: Option<&[u8]>, location: u32) -> Vec<u8> {
    let identifier: Vec<u8> = match name {
        Some(name) => std::iter::once(8u8).chain(name.iter().copied()).collect(),
        None => Vec::new(),
    };
    let length = (38 + identifier.len()).next_multiple_of(4);
    let mut raw = vec![0u8; length];
    put_u16(&mut raw, 16, 1);
    raw[18] = characteristics;
    raw[19] = identifier.len() as u8;
    put_u32(&mut raw, 20, SECTOR as u32);
    put_u32(&mut raw, 24, icb_block);
    put_u16(&mut raw, 28, 0);
    raw[38..38 + identifier.len()].copy_from_slice(&identifier);
    write_tag(&mut raw, 257, location, (length - 16) as u16);
    raw
}

/// Everything a UDF test needs to know about a built image
pub struct BuiltUdf {
    pub data: Vec<u8>,

    /// Absolute sector of partition 0
    pub partition_start: u32,

    /// Path -> partition-relative block of the file or directory data
    pub blocks: HashMap<String, u32>,

    /// Path -> partition-relative block of the (extended) file entry
    pub entries: HashMap<String, u32>,
}

/// Builds single-partition UDF images
///
/// Anchor at 256 and at the last sector; main descriptor sequence at 32
/// (PVD, PD, LVD, TD); integrity sequence at 64; File Set Descriptor in the
/// first partition block, root File Entry in the second.
pub struct UdfBuilder {
    entries: Vec<Entry>,
    partition_start: u32,
    extended: bool,
    deleted: Vec<String>,
}

impl UdfBuilder {
    pub const MAIN_SEQUENCE: u32 = 32;
    pub const INTEGRITY_SEQUENCE: u32 = 64;

    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            partition_start: 300,
            extended: false,
            deleted: Vec::new(),
        }
    }

    pub fn partition_start(mut self, sector: u32) -> Self {
        self.partition_start = sector;
        self
    }

    /// Write Extended File Entries instead of File Entries
    pub fn extended_entries(mut self) -> Self {
        self.extended = true;
        self
    }

    /// Add a deleted identifier to the root directory
    pub fn deleted(mut self, name: &str) -> Self {
        self.deleted.push(name.to_string());
        self
    }

    pub fn build(self) -> BuiltUdf {
        let p = self.partition_start;
        let mut udf = UdfLayout {
            data: vec![0u8; p as usize * SECTOR],
            start: p,
            next: 0,
            extended: self.extended,
            blocks: HashMap::new(),
            entries: HashMap::new(),
        };

        let fsd_block = udf.alloc(SECTOR);
        let root_entry = udf.alloc(SECTOR);
        let root_data = udf.alloc(udf_directory_len(&self.entries, &self.deleted));
        udf.entries.insert("/".to_string(), root_entry);
        udf.blocks.insert("/".to_string(), root_data);
        udf.write_directory(root_entry, root_data, root_entry, &self.entries, &self.deleted, "");

        let mut fsd = vec![0u8; SECTOR];
        put_u32(&mut fsd, 400, SECTOR as u32);
        put_u32(&mut fsd, 404, root_entry);
        put_u16(&mut fsd, 408, 0);
        fixed_dstring(&mut fsd[304..336], "FILESET");
        write_tag(&mut fsd, 256, fsd_block, 496);
        udf.write_block(fsd_block, &fsd);

        let partition_length = udf.next;
        let last = (p + partition_length).max(257);
        let mut data = udf.data;
        data.resize((last as usize + 1) * SECTOR, 0);

        let mut pvd = vec![0u8; SECTOR];
        fixed_dstring(&mut pvd[24..56], "UDFVOLUME");
        write_tag(&mut pvd, 1, Self::MAIN_SEQUENCE, 496);
        write_at(&mut data, Self::MAIN_SEQUENCE as usize, &pvd);

        let mut pd = vec![0u8; SECTOR];
        put_u16(&mut pd, 22, 0);
        put_u32(&mut pd, 188, p);
        put_u32(&mut pd, 192, partition_length);
        write_tag(&mut pd, 5, Self::MAIN_SEQUENCE + 1, 496);
        write_at(&mut data, Self::MAIN_SEQUENCE as usize + 1, &pd);

        let mut lvd = vec![0u8; SECTOR];
        fixed_dstring(&mut lvd[84..212], "LOGICAL");
        put_u32(&mut lvd, 212, SECTOR as u32);
        put_u32(&mut lvd, 248, SECTOR as u32);
        put_u32(&mut lvd, 252, fsd_block);
        put_u32(&mut lvd, 432, SECTOR as u32);
        put_u32(&mut lvd, 436, Self::INTEGRITY_SEQUENCE);
        write_tag(&mut lvd, 6, Self::MAIN_SEQUENCE + 2, 424);
        write_at(&mut data, Self::MAIN_SEQUENCE as usize + 2, &lvd);

        let mut td = vec![0u8; SECTOR];
        write_tag(&mut td, 8, Self::MAIN_SEQUENCE + 3, 496);
        write_at(&mut data, Self::MAIN_SEQUENCE as usize + 3, &td);

        let mut lvid = vec![0u8; SECTOR];
        write_tag(&mut lvid, 9, Self::INTEGRITY_SEQUENCE, 88);
        write_at(&mut data, Self::INTEGRITY_SEQUENCE as usize, &lvid);

        for anchor in [256, last] {
            let mut avdp = vec![0u8; SECTOR];
            put_u32(&mut avdp, 16, 16 * SECTOR as u32);
            put_u32(&mut avdp, 20, Self::MAIN_SEQUENCE);
            put_u32(&mut avdp, 24, 16 * SECTOR as u32);
            put_u32(&mut avdp, 28, Self::MAIN_SEQUENCE + 16);
            write_tag(&mut avdp, 2, anchor, 496);
            write_at(&mut data, anchor as usize, &avdp);
        }

        BuiltUdf {
            data,
            partition_start: p,
            blocks: udf.blocks,
            entries: udf.entries,
        }
    }
}

fn udf_name(entry: &Entry) -> String {
    String::from_utf8_lossy(entry.name()).into_owned()
}

fn udf_directory_len(children: &[Entry], deleted: &[String]) -> usize {
    let parent = file_identifier(0x0A, 0, None, 0).len();
    let named: usize = children
        .iter()
        .map(|child| udf_name(child).into_bytes())
        .chain(deleted.iter().map(|name| name.clone().into_bytes()))
        .map(|name| file_identifier(0, 0, Some(&name), 0).len())
        .sum();
    parent + named
}

struct UdfLayout {
    data: Vec<u8>,
    start: u32,
    next: u32,
    extended: bool,
    blocks: HashMap<String, u32>,
    entries: HashMap<String, u32>,
}

impl UdfLayout {
    fn alloc(&mut self, bytes: usize) -> u32 {
        let block = self.next;
        self.next += sectors_for(bytes);
        let end = (self.start + self.next) as usize * SECTOR;
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        block
    }

    fn write_block(&mut self, block: u32, bytes: &[u8]) {
        write_at(&mut self.data, (self.start + block) as usize, bytes);
    }

    fn write_entry(&mut self, block: u32, file_type: u8, data_block: u32, length: u32) {
        let mut raw = vec![0u8; SECTOR];
        let (modified_at, ea_at, ad_at, fixed, identifier) = if self.extended {
            (92, 208, 212, 216, 266)
        } else {
            (84, 168, 172, 176, 261)
        };
        put_u16(&mut raw, 20, 4);
        raw[27] = file_type;
        put_u32(&mut raw, 36, 1000);
        put_u32(&mut raw, 40, 1000);
        put_u32(&mut raw, 44, 0x14A5);
        put_u16(&mut raw, 48, 1);
        put_u64(&mut raw, 56, length as u64);
        // Timestamp: local time, UTC+0, 2024-01-01
        put_u16(&mut raw, modified_at, 0x1000);
        put_u16(&mut raw, modified_at + 2, 2024);
        raw[modified_at + 4] = 1;
        raw[modified_at + 5] = 1;
        put_u32(&mut raw, ea_at, 0);
        put_u32(&mut raw, ad_at, 8);
        put_u32(&mut raw, fixed, length);
        put_u32(&mut raw, fixed + 4, data_block);
        write_tag(&mut raw, identifier, block, (fixed + 8 - 16) as u16);
        self.write_block(block, &raw);
    }

    fn write_directory(
        &mut self,
        entry_block: u32,
        data_block: u32,
        parent_entry: u32,
        children: &[Entry],
        deleted: &[String],
        path: &str,
    ) {
        let placed: Vec<(u32, u32)> = children
            .iter()
            .map(|child| {
                let entry = self.alloc(SECTOR);
                let data = match child {
                    Entry::File { content, .. } => self.alloc(content.len()),
                    Entry::Dir { children, .. } => self.alloc(udf_directory_len(children, &[])),
                    Entry::Link { .. } => panic!("links are ISO9660 only"),
                };
                let child_path = format!("{}/{}", path, udf_name(child));
                self.entries.insert(child_path.clone(), entry);
                self.blocks.insert(child_path, data);
                (entry, data)
            })
            .collect();

        let mut fids = file_identifier(0x0A, parent_entry, None, data_block);
        for (child, &(entry, _)) in children.iter().zip(&placed) {
            let characteristics = if matches!(child, Entry::Dir { .. }) { 0x02 } else { 0x00 };
            fids.extend(file_identifier(
                characteristics,
                entry,
                Some(udf_name(child).as_bytes()),
                data_block,
            ));
        }
        for name in deleted {
            fids.extend(file_identifier(0x04, entry_block, Some(name.as_bytes()), data_block));
        }
        self.write_block(data_block, &fids);
        self.write_entry(entry_block, 4, data_block, fids.len() as u32);

        for (child, &(entry, data)) in children.iter().zip(&placed) {
            let child_path = format!("{}/{}", path, udf_name(child));
            match child {
                Entry::File { content, .. } => {
                    self.write_block(data, content);
                    self.write_entry(entry, 5, data, content.len() as u32);
                }
                Entry::Dir { children, .. } => {
                    self.write_directory(entry, data, entry_block, children, &[], &child_path);
                }
                Entry::Link { .. } => {}
            }
        }
    }
}
