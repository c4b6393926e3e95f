use crate::{RenderError, font};

/// Resource subdictionaries svg2pdf fills from a hash map.
const RESOURCE_KEYS: &[&[u8]] =
    &[b"/ExtGState", b"/ColorSpace", b"/Pattern", b"/Shading", b"/XObject", b"/Font"];

/// Convert SVG string to PDF bytes.
///
/// Text is converted to outlines, so no font objects are written, and every
/// inline resource dictionary is sorted by name. Identical SVG gives
/// identical bytes.
pub fn svg_to_pdf(svg: &str) -> crate::Result<Vec<u8>> {
    let opt = usvg::Options { fontdb: font::system_database(), ..Default::default() };

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Pdf(e.to_string()))?;

    let conversion = svg2pdf::ConversionOptions { embed_text: false, ..Default::default() };
    let mut pdf = svg2pdf::to_pdf(&tree, conversion, svg2pdf::PageOptions::default())
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    sort_resource_dicts(&mut pdf);
    Ok(pdf)
}

/// Sort the entries of every inline resource dictionary by name, in place.
///
/// Only bytes inside each `<< >>` are permuted, so object offsets and the
/// xref table stay valid. Stream bodies are skipped.
fn sort_resource_dicts(pdf: &mut [u8]) {
    let mut i = 0;
    while i < pdf.len() {
        if let Some(end) = stream_end(pdf, i) {
            i = end;
            continue;
        }
        if pdf[i] == b'/'
            && let Some((open, close)) = resource_dict_at(pdf, i)
        {
            sort_entries(&mut pdf[open + 2..close]);
            i = close + 2;
            continue;
        }
        i += 1;
    }
}

fn starts_with_at(buf: &[u8], at: usize, pat: &[u8]) -> bool {
    buf.get(at..at + pat.len()) == Some(pat)
}

fn find(buf: &[u8], from: usize, pat: &[u8]) -> Option<usize> {
    buf.get(from..)?.windows(pat.len()).position(|w| w == pat).map(|p| p + from)
}

/// If a stream body starts at `at`, the index just past its `endstream`.
fn stream_end(pdf: &[u8], at: usize) -> Option<usize> {
    if !starts_with_at(pdf, at, b"stream") {
        return None;
    }
    let body = at + b"stream".len();
    if !matches!(pdf.get(body), Some(b'\r' | b'\n')) {
        return None;
    }
    if !pdf[..at].trim_ascii_end().ends_with(b">>") {
        return None;
    }
    find(pdf, body, b"endstream").map(|p| p + b"endstream".len())
}

/// `(index of "<<", index of ">>")` when a resource key at `at` opens an inline,
/// non-nested dictionary.
fn resource_dict_at(pdf: &[u8], at: usize) -> Option<(usize, usize)> {
    let key = RESOURCE_KEYS.iter().find(|key| starts_with_at(pdf, at, key))?;
    let mut open = at + key.len();
    if !matches!(pdf.get(open), Some(b) if b.is_ascii_whitespace() || *b == b'<') {
        return None;
    }
    while pdf.get(open).is_some_and(u8::is_ascii_whitespace) {
        open += 1;
    }
    if !starts_with_at(pdf, open, b"<<") {
        return None;
    }
    let close = find(pdf, open + 2, b">>")?;
    if find(&pdf[..close], open + 2, b"<<").is_some() {
        return None;
    }
    Some((open, close))
}

/// Byte spans of whitespace-separated tokens; `[...]` counts as one token.
fn tokens(body: &[u8]) -> Option<Vec<(usize, usize)>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < body.len() {
        if body[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        if body[i] == b'[' {
            let close = body[i..].iter().position(|&b| b == b']')? + i;
            i = close + 1;
        } else {
            while i < body.len() && !body[i].is_ascii_whitespace() && body[i] != b'[' {
                i += 1;
            }
        }
        out.push((start, i));
    }
    Some(out)
}

fn sort_entries(body: &mut [u8]) {
    if body.iter().any(|b| matches!(b, b'<' | b'>' | b'(' | b'%')) {
        return;
    }
    let Some(tokens) = tokens(body) else { return };

    // Entries are `/Key value`, where value is a name, an array or `N G R`.
    let mut entries: Vec<(usize, usize)> = Vec::new();
    let mut t = 0;
    while t < tokens.len() {
        let (start, _) = tokens[t];
        if body[start] != b'/' || t + 1 >= tokens.len() {
            return;
        }
        t += 1;
        if matches!(body[tokens[t].0], b'/' | b'[') {
            t += 1;
        } else {
            while t < tokens.len() && body[tokens[t].0] != b'/' {
                t += 1;
            }
        }
        entries.push((start, tokens[t - 1].1));
    }
    if entries.len() < 2 {
        return;
    }

    let key_of = |entry: &[u8]| -> Vec<u8> {
        entry.iter().take_while(|b| !b.is_ascii_whitespace() && **b != b'[').copied().collect()
    };
    let mut sorted: Vec<Vec<u8>> = entries.iter().map(|&(s, e)| body[s..e].to_vec()).collect();
    sorted.sort_by_key(|entry| key_of(entry));

    let mut out = Vec::with_capacity(body.len());
    let mut cursor = 0;
    for (&(start, end), entry) in entries.iter().zip(&sorted) {
        out.extend_from_slice(&body[cursor..start]);
        out.extend_from_slice(entry);
        cursor = end;
    }
    out.extend_from_slice(&body[cursor..]);
    body.copy_from_slice(&out);
}
