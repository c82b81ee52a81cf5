//! ELF64 fixture shared by the unit and integration tests.

/// Shared object with `.text`, `.dynstr` and `.shstrtab`, plus one `PT_LOAD`
/// (R-X, vaddr 0x1000) covering `.text`.
pub fn shared_object() -> Vec<u8> {
    let text = b"\x31\xc0\xc3";
    let dynstr = b"\0libc.so.6\0puts\0";
    let shstrtab = b"\0.text\0.dynstr\0.shstrtab\0";

    let mut out = vec![0u8; 64 + 56];
    let text_off = out.len() as u64;
    out.extend_from_slice(text);
    let dynstr_off = out.len() as u64;
    out.extend_from_slice(dynstr);
    let shstrtab_off = out.len() as u64;
    out.extend_from_slice(shstrtab);
    out.resize(out.len().next_multiple_of(8), 0);
    let shoff = out.len() as u64;

    out.extend_from_slice(&[0u8; 64]);
    for (name, sh_type, flags, offset, size) in [
        (1u32, 1u32, 0x6u64, text_off, text.len()),
        (7, 3, 0x2, dynstr_off, dynstr.len()),
        (15, 3, 0, shstrtab_off, shstrtab.len()),
    ] {
        let mut h = [0u8; 64];
        h[0..4].copy_from_slice(&name.to_le_bytes());
        h[4..8].copy_from_slice(&sh_type.to_le_bytes());
        h[8..16].copy_from_slice(&flags.to_le_bytes());
        h[24..32].copy_from_slice(&offset.to_le_bytes());
        h[32..40].copy_from_slice(&(size as u64).to_le_bytes());
        h[48..56].copy_from_slice(&1u64.to_le_bytes());
        out.extend_from_slice(&h);
    }

    let p = &mut out[64..120];
    p[0..4].copy_from_slice(&1u32.to_le_bytes()); // PT_LOAD
    p[4..8].copy_from_slice(&5u32.to_le_bytes()); // R+X
    p[8..16].copy_from_slice(&text_off.to_le_bytes());
    p[16..24].copy_from_slice(&0x1000u64.to_le_bytes());
    p[24..32].copy_from_slice(&0x1000u64.to_le_bytes());
    p[32..40].copy_from_slice(&(text.len() as u64).to_le_bytes());
    p[40..48].copy_from_slice(&0x2000u64.to_le_bytes());
    p[48..56].copy_from_slice(&0x1000u64.to_le_bytes());

    let h = &mut out[..64];
    h[0..4].copy_from_slice(b"\x7fELF");
    h[4] = 2;
    h[5] = 1;
    h[6] = 1;
    h[7] = 3;
    h[16..18].copy_from_slice(&3u16.to_le_bytes());
    h[18..20].copy_from_slice(&62u16.to_le_bytes());
    h[32..40].copy_from_slice(&64u64.to_le_bytes());
    h[40..48].copy_from_slice(&shoff.to_le_bytes());
    h[52..54].copy_from_slice(&64u16.to_le_bytes());
    h[54..56].copy_from_slice(&56u16.to_le_bytes());
    h[56..58].copy_from_slice(&1u16.to_le_bytes());
    h[58..60].copy_from_slice(&64u16.to_le_bytes());
    h[60..62].copy_from_slice(&4u16.to_le_bytes());
    h[62..64].copy_from_slice(&3u16.to_le_bytes());
    out
}
