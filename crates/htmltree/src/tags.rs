//! Static tag tables
//!
//! Three separate questions, three separate sets:
//! - void: rendered self-closing when empty (`<BR />`)
//! - raw text: content is not HTML-escaped when the serializer is asked to
//!   preserve it
//! - whitespace preserving: the normalizer never touches text inside
//!
//! `script` and `style` sit in both of the last two; `pre`, `code` and
//! `textarea` only preserve whitespace. Do not merge the sets.
//!
//! Lookup is case-insensitive and allocation-free. Custom or unknown tag
//! names answer `false` everywhere.

const VOID: u8 = 1 << 0;
const RAW_TEXT: u8 = 1 << 1;
const PRESERVE_WS: u8 = 1 << 2;

/// Anything longer cannot be in the table
const MAX_TAG_LEN: usize = 10;

fn flags(tag_name: &str) -> u8 {
    let bytes = tag_name.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_TAG_LEN {
        return 0;
    }

    let mut buf = [0u8; MAX_TAG_LEN];
    let lower = &mut buf[..bytes.len()];
    lower.copy_from_slice(bytes);
    lower.make_ascii_lowercase();

    match &*lower {
        b"area" | b"base" | b"basefont" | b"bgsound" | b"br" | b"col" | b"embed" | b"frame"
        | b"hr" | b"img" | b"input" | b"keygen" | b"link" | b"meta" | b"param" | b"source"
        | b"track" | b"wbr" => VOID,
        b"script" | b"style" => RAW_TEXT | PRESERVE_WS,
        b"xmp" | b"iframe" | b"noembed" | b"noframes" | b"plaintext" => RAW_TEXT,
        b"pre" | b"code" | b"textarea" => PRESERVE_WS,
        _ => 0,
    }
}

/// Is this a void element (no content, self-closing when empty)?
pub fn is_void(tag_name: &str) -> bool {
    flags(tag_name) & VOID != 0
}

/// Is this a raw-text container whose content is not markup?
pub fn is_raw_text(tag_name: &str) -> bool {
    flags(tag_name) & RAW_TEXT != 0
}

/// Must whitespace inside this element be left alone?
pub fn is_whitespace_preserving(tag_name: &str) -> bool {
    flags(tag_name) & PRESERVE_WS != 0
}
