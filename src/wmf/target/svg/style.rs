//! SVG attribute writers.
//!
//! Everything writes straight into the output buffer. Attributes equal to
//! the SVG default are left out.

use std::fmt::Write;

use crate::wmf::objects::{Color, Font, Pen};

/// Compact number: integers without a fraction, others rounded to 2 places.
#[inline]
pub fn write_num(buf: &mut String, n: f64) {
    if !n.is_finite() {
        buf.push('0');
        return;
    }
    if n.fract() == 0.0 && n.abs() < 1e10 {
        let mut ints = itoa::Buffer::new();
        buf.push_str(ints.format(n as i64));
        return;
    }
    let rounded = (n * 100.0).round() / 100.0;
    if rounded == 0.0 {
        buf.push('0');
        return;
    }
    let mut floats = ryu::Buffer::new();
    let s = floats.format(rounded);
    if s.contains('.') {
        buf.push_str(s.trim_end_matches('0').trim_end_matches('.'));
    } else {
        buf.push_str(s);
    }
}

#[inline]
pub fn write_color(buf: &mut String, color: Color) {
    let _ = write!(buf, "#{:02x}{:02x}{:02x}", color.r, color.g, color.b);
}

/// ` name="value"` with a numeric value.
#[inline]
pub fn write_num_attr(buf: &mut String, name: &str, n: f64) {
    buf.push(' ');
    buf.push_str(name);
    buf.push_str("=\"");
    write_num(buf, n);
    buf.push('"');
}

pub fn write_xml_escaped(buf: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '&' => buf.push_str("&amp;"),
            '"' => buf.push_str("&quot;"),
            '\'' => buf.push_str("&apos;"),
            // not representable in XML 1.0
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {},
            c => buf.push(c),
        }
    }
}

/// Stroke attributes for `pen`. Width 0 becomes a one-pixel non-scaling stroke.
pub fn write_stroke_attrs(buf: &mut String, pen: &Pen) {
    if pen.is_null() {
        buf.push_str(r#" stroke="none""#);
        return;
    }
    buf.push_str(r#" stroke=""#);
    write_color(buf, pen.color);
    buf.push('"');

    let width = f64::from(pen.width.max(1));
    if pen.width == 0 {
        buf.push_str(r#" vector-effect="non-scaling-stroke""#);
    } else if pen.width != 1 {
        write_num_attr(buf, "stroke-width", width);
    }
    buf.push_str(r#" stroke-linecap="round" stroke-linejoin="round""#);

    if let Some(pattern) = pen.style.dash_pattern() {
        buf.push_str(r#" stroke-dasharray=""#);
        for (i, d) in pattern.iter().enumerate() {
            if i > 0 {
                buf.push(',');
            }
            write_num(buf, f64::from(*d) * width);
        }
        buf.push('"');
    }
}

/// Font family mapped to a generic CSS family where one fits.
pub fn map_font_family(name: &str) -> &str {
    match name {
        "Times New Roman" | "Times" | "Georgia" | "Garamond" => "serif",
        "Arial" | "Helvetica" | "Verdana" | "Tahoma" | "Trebuchet MS" | "Arial Black" => {
            "sans-serif"
        },
        "Courier New" | "Courier" | "Consolas" | "Monaco" | "Lucida Console" => "monospace",
        "Comic Sans MS" | "Brush Script MT" => "cursive",
        "Impact" | "Papyrus" => "fantasy",
        _ => name,
    }
}

pub fn write_font_attrs(buf: &mut String, font: &Font) {
    buf.push_str(r#" font-family=""#);
    write_xml_escaped(buf, map_font_family(&font.family));
    buf.push('"');
    write_num_attr(buf, "font-size", font.size());
    if font.is_bold() {
        buf.push_str(r#" font-weight="bold""#);
    }
    if font.italic {
        buf.push_str(r#" font-style="italic""#);
    }
    match (font.underline, font.strike_out) {
        (true, true) => buf.push_str(r#" text-decoration="underline line-through""#),
        (true, false) => buf.push_str(r#" text-decoration="underline""#),
        (false, true) => buf.push_str(r#" text-decoration="line-through""#),
        (false, false) => {},
    }
}
