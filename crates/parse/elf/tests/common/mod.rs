//! In-memory ELF64 image builder for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;
pub const EM_X86_64: u16 = 62;
pub const EM_AARCH64: u16 = 183;
pub const EM_RISCV: u16 = 243;

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;

pub const PT_LOAD: u32 = 1;

const EHDR: usize = 64;
const PHDR: usize = 56;
const SHDR: usize = 64;

/// Offset used for `SHT_NOBITS` sections; far past any fixture's end.
pub const NOBITS_OFFSET: u64 = 0xffff_0000;

struct Section {
    name: String,
    sh_type: u32,
    flags: u64,
    data: Vec<u8>,
    size: u64,
}

struct Segment {
    p_type: u32,
    flags: u32,
    vaddr: u64,
    data: Vec<u8>,
    memsz: u64,
}

/// Builds an ELF64 image with a generated `.shstrtab` as the last section.
pub struct ElfBuilder {
    e_type: u16,
    machine: u16,
    sections: Vec<Section>,
    segments: Vec<Segment>,
    extended_count: bool,
}

impl ElfBuilder {
    pub fn new() -> Self {
        Self {
            e_type: ET_EXEC,
            machine: EM_X86_64,
            sections: Vec::new(),
            segments: Vec::new(),
            extended_count: false,
        }
    }

    pub fn file_type(mut self, e_type: u16) -> Self {
        self.e_type = e_type;
        self
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn section(mut self, name: &str, sh_type: u32, flags: u64, data: &[u8]) -> Self {
        self.sections.push(Section {
            name: name.to_owned(),
            sh_type,
            flags,
            data: data.to_vec(),
            size: data.len() as u64,
        });
        self
    }

    pub fn nobits(mut self, name: &str, size: u64) -> Self {
        self.sections.push(Section {
            name: name.to_owned(),
            sh_type: SHT_NOBITS,
            flags: 0x3,
            data: Vec::new(),
            size,
        });
        self
    }

    pub fn segment(mut self, p_type: u32, flags: u32, vaddr: u64, data: &[u8], memsz: u64) -> Self {
        self.segments.push(Segment {
            p_type,
            flags,
            vaddr,
            data: data.to_vec(),
            memsz,
        });
        self
    }

    /// Store the section count in section 0's `sh_size` with `e_shnum = 0`.
    pub fn extended_count(mut self) -> Self {
        self.extended_count = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        // Name table: "\0" then every name, then ".shstrtab".
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for name in self
            .sections
            .iter()
            .map(|s| s.name.as_str())
            .chain([".shstrtab"])
        {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
        }

        let mut out = vec![0u8; EHDR + self.segments.len() * PHDR];

        let mut section_offsets = Vec::new();
        for s in &self.sections {
            if s.sh_type == SHT_NOBITS {
                section_offsets.push(NOBITS_OFFSET);
            } else {
                section_offsets.push(out.len() as u64);
                out.extend_from_slice(&s.data);
            }
        }
        let shstrtab_off = out.len() as u64;
        out.extend_from_slice(&shstrtab);

        let mut segment_offsets = Vec::new();
        for seg in &self.segments {
            segment_offsets.push(out.len() as u64);
            out.extend_from_slice(&seg.data);
        }

        out.resize(out.len().next_multiple_of(8), 0);
        let shoff = out.len() as u64;
        let shnum = self.sections.len() + 2;

        // Section 0.
        let mut null = [0u8; SHDR];
        if self.extended_count {
            null[32..40].copy_from_slice(&(shnum as u64).to_le_bytes());
        }
        out.extend_from_slice(&null);

        for (i, s) in self.sections.iter().enumerate() {
            out.extend_from_slice(&shdr(
                name_offsets[i],
                s.sh_type,
                s.flags,
                section_offsets[i],
                s.size,
            ));
        }
        out.extend_from_slice(&shdr(
            name_offsets[self.sections.len()],
            SHT_STRTAB,
            0,
            shstrtab_off,
            shstrtab.len() as u64,
        ));

        for (i, seg) in self.segments.iter().enumerate() {
            let b = &mut out[EHDR + i * PHDR..EHDR + (i + 1) * PHDR];
            b[0..4].copy_from_slice(&seg.p_type.to_le_bytes());
            b[4..8].copy_from_slice(&seg.flags.to_le_bytes());
            b[8..16].copy_from_slice(&segment_offsets[i].to_le_bytes());
            b[16..24].copy_from_slice(&seg.vaddr.to_le_bytes());
            b[24..32].copy_from_slice(&seg.vaddr.to_le_bytes());
            b[32..40].copy_from_slice(&(seg.data.len() as u64).to_le_bytes());
            b[40..48].copy_from_slice(&seg.memsz.to_le_bytes());
            b[48..56].copy_from_slice(&0x1000u64.to_le_bytes());
        }

        let h = &mut out[..EHDR];
        h[0..4].copy_from_slice(b"\x7fELF");
        h[4] = 2; // ELFCLASS64
        h[5] = 1; // ELFDATA2LSB
        h[6] = 1; // EV_CURRENT
        h[7] = 3; // ELFOSABI_LINUX
        h[16..18].copy_from_slice(&self.e_type.to_le_bytes());
        h[18..20].copy_from_slice(&self.machine.to_le_bytes());
        h[20..24].copy_from_slice(&1u32.to_le_bytes());
        h[24..32].copy_from_slice(&0x40_1000u64.to_le_bytes());
        h[32..40].copy_from_slice(&(EHDR as u64).to_le_bytes());
        h[40..48].copy_from_slice(&shoff.to_le_bytes());
        h[52..54].copy_from_slice(&(EHDR as u16).to_le_bytes());
        h[54..56].copy_from_slice(&(PHDR as u16).to_le_bytes());
        h[56..58].copy_from_slice(&(self.segments.len() as u16).to_le_bytes());
        h[58..60].copy_from_slice(&(SHDR as u16).to_le_bytes());
        let e_shnum = if self.extended_count { 0 } else { shnum as u16 };
        h[60..62].copy_from_slice(&e_shnum.to_le_bytes());
        h[62..64].copy_from_slice(&((shnum - 1) as u16).to_le_bytes());

        out
    }
}

fn shdr(name: u32, sh_type: u32, flags: u64, offset: u64, size: u64) -> [u8; SHDR] {
    let mut b = [0u8; SHDR];
    b[0..4].copy_from_slice(&name.to_le_bytes());
    b[4..8].copy_from_slice(&sh_type.to_le_bytes());
    b[8..16].copy_from_slice(&flags.to_le_bytes());
    b[24..32].copy_from_slice(&offset.to_le_bytes());
    b[32..40].copy_from_slice(&size.to_le_bytes());
    b[48..56].copy_from_slice(&1u64.to_le_bytes());
    b
}

/// Byte offset of section `index`'s header in an image built by [`ElfBuilder`].
pub fn shdr_offset(image: &[u8], index: usize) -> usize {
    let shoff = u64::from_le_bytes(image[40..48].try_into().unwrap());
    shoff as usize + index * SHDR
}

/// Write `bytes` to a fresh file inside a temporary directory.
pub fn write_fixture(bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("fixture.elf");
    std::fs::write(&path, bytes).expect("write fixture");
    (dir, path)
}
