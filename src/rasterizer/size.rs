//! Intrinsic size detection and target size resolution.

use roxmltree::Document;

use crate::icon::SizePx;

/// Box used when neither the document nor the caller gives a size.
pub const DEFAULT_SIZE: SizePx = SizePx { width: 300, height: 300 };

/// A size in (possibly fractional) CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntrinsicSize {
    pub width: f64,
    pub height: f64,
}

impl IntrinsicSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    pub fn ratio(&self) -> f64 {
        self.width / self.height
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Parses an absolute SVG length into pixels.
///
/// Percentages and font-relative units yield `None`.
pub fn parse_length_px(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.ends_with('%') {
        return None;
    }

    let end = trimmed
        .char_indices()
        .take_while(|(_, ch)| matches!(ch, '0'..='9' | '+' | '-' | '.' | 'e' | 'E'))
        .map(|(idx, ch)| idx + ch.len_utf8())
        .last()?;

    let number = trimmed[..end].parse::<f64>().ok()?;
    let unit = trimmed[end..].trim_start();
    let px = match unit.to_ascii_lowercase().as_str() {
        "" | "px" => number,
        "in" => number * 96.0,
        "cm" => number * (96.0 / 2.54),
        "mm" => number * (96.0 / 25.4),
        "pt" => number * (96.0 / 72.0),
        "pc" => number * (96.0 / 6.0),
        _ => return None,
    };

    (px.is_finite() && px > 0.0).then_some(px)
}

/// Parses the width and height of a `viewBox` attribute.
pub fn parse_view_box(value: &str) -> Option<IntrinsicSize> {
    let nums: Vec<f64> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    let &[_, _, width, height] = nums.as_slice() else {
        return None;
    };
    let size = IntrinsicSize::new(width, height);
    size.is_valid().then_some(size)
}

/// Reads the intrinsic size from the root element of an SVG document.
///
/// Explicit `width`/`height` win. A single explicit dimension is completed
/// from the `viewBox` ratio. Without either, the `viewBox` dimensions are used.
pub fn intrinsic_size(svg: &str) -> Option<IntrinsicSize> {
    let doc = Document::parse(svg).ok()?;
    let root = doc.root_element();
    if !root.tag_name().name().eq_ignore_ascii_case("svg") {
        return None;
    }

    let width = root.attribute("width").and_then(parse_length_px);
    let height = root.attribute("height").and_then(parse_length_px);
    let view_box = root.attribute("viewBox").and_then(parse_view_box);

    let size = match (width, height, view_box) {
        (Some(w), Some(h), _) => IntrinsicSize::new(w, h),
        (Some(w), None, Some(vb)) => IntrinsicSize::new(w, w / vb.ratio()),
        (None, Some(h), Some(vb)) => IntrinsicSize::new(h * vb.ratio(), h),
        (None, None, Some(vb)) => vb,
        _ => return None,
    };
    size.is_valid().then_some(size)
}

/// Resolves the pixel size to render at.
///
/// - No target: the intrinsic size, or [`DEFAULT_SIZE`] when unknown.
/// - One target dimension: the other follows the intrinsic ratio (square
///   when unknown).
/// - Both: the intrinsic ratio is fitted inside the box, shrinking whichever
///   dimension would overshoot. Without an intrinsic size the box is used as is.
///
/// Non-positive or non-finite targets count as absent. Results are at least 1px.
pub fn resolve_target_size(
    intrinsic: Option<IntrinsicSize>,
    width: Option<f64>,
    height: Option<f64>,
) -> SizePx {
    let width = width.filter(|w| w.is_finite() && *w > 0.0);
    let height = height.filter(|h| h.is_finite() && *h > 0.0);

    let (w, h) = match (width, height, intrinsic) {
        (None, None, Some(size)) => (size.width, size.height),
        (None, None, None) => return DEFAULT_SIZE,
        (Some(w), None, Some(size)) => (w, w / size.ratio()),
        (None, Some(h), Some(size)) => (h * size.ratio(), h),
        (Some(w), None, None) => (w, w),
        (None, Some(h), None) => (h, h),
        (Some(w), Some(h), None) => (w, h),
        (Some(w), Some(h), Some(size)) => {
            let scale = (w / size.width).min(h / size.height);
            if w / size.width <= h / size.height {
                (w, size.height * scale)
            } else {
                (size.width * scale, h)
            }
        }
    };

    SizePx::new(to_px(w), to_px(h))
}

fn to_px(value: f64) -> u32 {
    value.round().clamp(1.0, u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intrinsic(w: f64, h: f64) -> Option<IntrinsicSize> {
        Some(IntrinsicSize::new(w, h))
    }

    #[test]
    fn length_units() {
        assert_eq!(parse_length_px("16"), Some(16.0));
        assert_eq!(parse_length_px("16px"), Some(16.0));
        assert_eq!(parse_length_px("1in"), Some(96.0));
        assert_eq!(parse_length_px("100%"), None);
        assert_eq!(parse_length_px("2em"), None);
        assert_eq!(parse_length_px(""), None);
    }

    #[test]
    fn view_box_parsing() {
        assert_eq!(parse_view_box("0 0 16 16"), Some(IntrinsicSize::new(16.0, 16.0)));
        assert_eq!(parse_view_box("0,0,40,20"), Some(IntrinsicSize::new(40.0, 20.0)));
        assert_eq!(parse_view_box("0 0 0 16"), None);
        assert_eq!(parse_view_box("0 0 16"), None);
    }

    #[test]
    fn intrinsic_from_attributes_and_view_box() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"/>"#;
        assert_eq!(intrinsic_size(svg), intrinsic(40.0, 20.0));

        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 30 10"/>"#;
        assert_eq!(intrinsic_size(svg), intrinsic(30.0, 10.0));

        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="60" viewBox="0 0 30 10"/>"#;
        assert_eq!(intrinsic_size(svg), intrinsic(60.0, 20.0));

        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%"/>"#;
        assert_eq!(intrinsic_size(svg), None);
    }

    #[test]
    fn defaults_without_any_size() {
        assert_eq!(resolve_target_size(None, None, None), SizePx::new(300, 300));
        assert_eq!(resolve_target_size(intrinsic(16.0, 16.0), None, None), SizePx::new(16, 16));
    }

    #[test]
    fn single_dimension_follows_ratio() {
        let size = intrinsic(200.0, 100.0);
        assert_eq!(resolve_target_size(size, Some(50.0), None), SizePx::new(50, 25));
        assert_eq!(resolve_target_size(size, None, Some(50.0)), SizePx::new(100, 50));
        assert_eq!(resolve_target_size(None, Some(32.0), None), SizePx::new(32, 32));
    }

    #[test]
    fn both_dimensions_fit_inside_box() {
        let wide = intrinsic(200.0, 100.0);
        assert_eq!(resolve_target_size(wide, Some(100.0), Some(100.0)), SizePx::new(100, 50));

        let tall = intrinsic(100.0, 200.0);
        assert_eq!(resolve_target_size(tall, Some(100.0), Some(100.0)), SizePx::new(50, 100));

        assert_eq!(resolve_target_size(None, Some(70.0), Some(100.0)), SizePx::new(70, 100));
    }

    #[test]
    fn non_positive_targets_are_absent() {
        let size = intrinsic(24.0, 12.0);
        assert_eq!(resolve_target_size(size, Some(0.0), Some(-5.0)), SizePx::new(24, 12));
    }

    #[test]
    fn aspect_ratio_is_preserved_across_boxes() {
        let intrinsics = [(16.0, 16.0), (200.0, 100.0), (30.0, 70.0), (1.0, 3.0), (640.0, 480.0)];
        let boxes = [(10.0, 10.0), (24.0, 100.0), (300.0, 17.0), (512.0, 512.0), (33.0, 45.0)];

        for (iw, ih) in intrinsics {
            for (bw, bh) in boxes {
                let size = resolve_target_size(intrinsic(iw, ih), Some(bw), Some(bh));
                assert!(size.width as f64 <= bw.round() && size.height as f64 <= bh.round());

                // One pixel of rounding on the shorter side bounds the ratio error.
                let expected = iw / ih;
                let actual = size.width as f64 / size.height as f64;
                let tolerance = expected * (1.0 / size.width.min(size.height) as f64) + 1e-9;
                assert!(
                    (actual - expected).abs() <= tolerance.max(expected / size.height as f64),
                    "{iw}x{ih} in {bw}x{bh} gave {}x{}",
                    size.width,
                    size.height
                );
            }
        }
    }
}
