//! Deterministic vector placeholder served when no generation capability is available.

use crate::{
    assets::data_url::DataUrl,
    generate::request::{GenerationRequest, GenerationResult, Mode},
};

/// Render the placeholder camera illustration at `width` x `height`.
///
/// The output depends only on its arguments. Labels are XML-escaped.
pub fn fallback_svg(
    subject: &str,
    orientation: &str,
    material: &str,
    width: u32,
    height: u32,
) -> String {
    let w = f64::from(width);
    let h = f64::from(height);

    let subject = escape_xml(subject);
    let caption = format!(
        "{} VIEW \u{2022} {}",
        escape_xml(&orientation.to_uppercase()),
        escape_xml(material)
    );

    let mut svg = String::with_capacity(1536);
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str(
        "  <defs><linearGradient id=\"body\" x1=\"0\" y1=\"0\" x2=\"1\" y2=\"1\">\
         <stop offset=\"0\" stop-color=\"#2f2f34\"/><stop offset=\"1\" stop-color=\"#101013\"/>\
         </linearGradient></defs>\n",
    );
    svg.push_str(&format!(
        "  <ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" fill=\"rgba(0,0,0,0.35)\"/>\n",
        w / 2.0,
        h * 0.82,
        w * 0.24,
        h * 0.07
    ));
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"10\" fill=\"url(#body)\" stroke=\"#8c8c94\" stroke-width=\"2\"/>\n",
        w * 0.24,
        h * 0.34,
        w * 0.52,
        h * 0.32
    ));
    svg.push_str(&format!(
        "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"#5f6370\" stroke=\"#c8ccd8\" stroke-width=\"2\"/>\n",
        w * 0.5,
        h * 0.5,
        w.min(h) * 0.11
    ));
    svg.push_str(&format!(
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"4\" fill=\"#1e1e24\"/>\n",
        w * 0.35,
        h * 0.26,
        w * 0.3,
        h * 0.08
    ));
    svg.push_str(&format!(
        "  <text x=\"50%\" y=\"{}\" text-anchor=\"middle\" font-size=\"{}\" fill=\"#e8e8ec\" font-family=\"Arial, sans-serif\">{subject}</text>\n",
        h * 0.12,
        (w * 0.055).max(10.0)
    ));
    svg.push_str(&format!(
        "  <text x=\"50%\" y=\"{}\" text-anchor=\"middle\" font-size=\"{}\" fill=\"#d4d4dc\" font-family=\"Arial, sans-serif\">{caption}</text>\n",
        h * 0.94,
        (w * 0.045).max(8.0)
    ));
    svg.push_str("</svg>");
    svg
}

/// Fallback-mode result for `request`, sized to its target dimensions.
pub fn fallback_result(request: &GenerationRequest) -> GenerationResult {
    let svg = fallback_svg(
        &request.subject_label,
        &request.orientation_label,
        &request.material_label,
        request.target_width,
        request.target_height,
    );
    GenerationResult {
        image: DataUrl::svg(svg),
        mode: Mode::Fallback,
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::decode::parse_svg;

    #[test]
    fn svg_is_sized_and_parses() {
        let svg = fallback_svg("Leica M3 (1954)", "front", "wood", 200, 150);
        assert!(svg.contains("width=\"200\" height=\"150\""));
        assert!(svg.contains("FRONT VIEW \u{2022} wood"));
        assert!(svg.contains(">Leica M3 (1954)</text>"));

        let tree = parse_svg(svg.as_bytes()).unwrap();
        assert_eq!(tree.size().width(), 200.0);
        assert_eq!(tree.size().height(), 150.0);
    }

    #[test]
    fn geometry_scales_with_target() {
        let svg = fallback_svg("x", "left", "metal", 100, 200);
        assert!(svg.contains("<ellipse cx=\"50\" cy=\"164\""));
        assert!(svg.contains(" r=\"11\" "));
        assert!(svg.contains("width=\"100\" height=\"200\""));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = fallback_svg("A & B <C>", "back", "\"glass\"", 64, 64);
        assert!(svg.contains("A &amp; B &lt;C&gt;"));
        assert!(svg.contains("&quot;glass&quot;"));
        parse_svg(svg.as_bytes()).unwrap();
    }

    #[test]
    fn identical_input_identical_output() {
        let a = fallback_svg("Nikon F (1959)", "right", "marble", 321, 123);
        let b = fallback_svg("Nikon F (1959)", "right", "marble", 321, 123);
        assert_eq!(a, b);
    }
}
