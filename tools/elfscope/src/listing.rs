//! Text renderings of a loaded ELF file.

use std::io::{self, Write};

use anyhow::{Result, bail};
use elfscope_elf::ElfFile;

/// One section name per line, in table order.
pub fn names(elf: &ElfFile, out: &mut impl Write) -> io::Result<()> {
    for section in elf.sections() {
        writeln!(out, "{}", section.name())?;
    }
    Ok(())
}

/// Section table with one row per section.
pub fn sections(elf: &ElfFile, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{:>4} {:<20} {:<8} {:>10} {:<3} {:>18} {:>10} {:>5} {:>5} {:>5} {:>5}",
        "Nr", "Name", "Type", "Raw", "Flg", "Address", "Size", "Link", "Info", "Align", "EntSz"
    )?;
    for s in elf.sections() {
        writeln!(
            out,
            "{:>4} {:<20} {:<8} {:#010x} {:<3} {:#018x} {:#010x} {:>5} {:>5} {:>5} {:>5}",
            s.index(),
            s.name(),
            s.section_type(),
            s.raw_type(),
            s.attributes(),
            s.address(),
            s.size(),
            s.link(),
            s.info(),
            s.address_align(),
            s.entry_size(),
        )?;
    }
    Ok(())
}

/// Program header table with one row per segment.
pub fn segments(elf: &ElfFile, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{:>4} {:<8} {:>10} {:<3} {:>18} {:>18} {:>10} {:>10} {:>8}",
        "Nr", "Type", "Raw", "Flg", "VirtAddr", "PhysAddr", "FileSiz", "MemSiz", "Align"
    )?;
    for p in elf.segments() {
        writeln!(
            out,
            "{:>4} {:<8} {:#010x} {:<3} {:#018x} {:#018x} {:#010x} {:#010x} {:>8x}",
            p.index(),
            p.segment_type(),
            p.raw_type(),
            p.attributes(),
            p.virtual_address(),
            p.physical_address(),
            p.payload_size(),
            p.memory_size(),
            p.align(),
        )?;
    }
    Ok(())
}

/// Strings of the section called `name`, one per line.
pub fn strings(elf: &ElfFile, name: &str, out: &mut impl Write) -> Result<()> {
    let Some(section) = elf.image().and_then(|image| image.find_section(name)) else {
        bail!("no section named `{name}`");
    };
    for s in section.as_string_table() {
        writeln!(out, "{s}")?;
    }
    Ok(())
}
