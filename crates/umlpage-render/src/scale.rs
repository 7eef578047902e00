//! Display scaling.
//!
//! Zoom is clamped to `[1.0, 2.0]`: zooming out never shrinks a diagram
//! below its native size, zooming in enlarges up to twice the size.

use umlpage_engine::{Diagram, DiagramKind};

use crate::consts::{MAX_SCALE, MIN_SCALE};

/// Scale factor for a zoom percentage.
#[must_use]
pub fn scale_factor(zoom_percent: u32) -> f64 {
    (f64::from(zoom_percent) / 100.0).clamp(MIN_SCALE, MAX_SCALE)
}

/// Apply the zoom to every scalable part of `diagram` that has no scale yet.
///
/// Scales already present, whether declared by the source or set by an
/// earlier call, are kept. Returns how many scales were set.
pub fn apply_zoom(diagram: &mut Diagram, zoom_percent: u32) -> usize {
    let factor = scale_factor(zoom_percent);
    match diagram.kind_mut() {
        DiagramKind::Sequence { scale, .. } | DiagramKind::Simple { scale, .. } => {
            usize::from(scale.set_if_absent(factor))
        }
        DiagramKind::Paged { pages } => pages
            .iter_mut()
            .map(|page| page.scale.set_if_absent(factor))
            .filter(|set| *set)
            .count(),
        DiagramKind::Error { .. } => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umlpage_engine::{DiagramEngine, IncludeContext, MockEngine, Scale};

    fn diagram(source: &str) -> Diagram {
        MockEngine::new()
            .parse(source, &IncludeContext::default())
            .unwrap()
            .remove(0)
            .into_diagram()
    }

    #[test]
    fn test_scale_factor_examples() {
        assert_eq!(scale_factor(150), 1.5);
        assert_eq!(scale_factor(50), 1.0);
        assert_eq!(scale_factor(300), 2.0);
    }

    #[test]
    fn test_scale_factor_clamp_ranges() {
        for zoom in 0..=100 {
            assert_eq!(scale_factor(zoom), 1.0, "zoom {zoom}");
        }
        for zoom in 100..=200 {
            assert_eq!(scale_factor(zoom), f64::from(zoom) / 100.0, "zoom {zoom}");
        }
        for zoom in [201, 250, 1000, u32::MAX] {
            assert_eq!(scale_factor(zoom), 2.0, "zoom {zoom}");
        }
    }

    #[test]
    fn test_apply_zoom_is_idempotent() {
        let mut d = diagram("A -> B");
        assert_eq!(apply_zoom(&mut d, 150), 1);
        let once = d.page_scale(0);
        assert_eq!(apply_zoom(&mut d, 150), 0);
        assert_eq!(d.page_scale(0), once);
        assert_eq!(once, Scale::declared(1.5));
    }

    #[test]
    fn test_apply_zoom_keeps_existing_scale() {
        let mut d = diagram("A -> B");
        apply_zoom(&mut d, 150);
        apply_zoom(&mut d, 200);
        assert_eq!(d.page_scale(0).factor(), 1.5);

        let mut declared = diagram("scale 0.5\nA -> B");
        assert_eq!(apply_zoom(&mut declared, 200), 0);
        assert_eq!(declared.page_scale(0).factor(), 0.5);
    }

    #[test]
    fn test_apply_zoom_paged_pages() {
        let mut d = diagram("!paged\npage One\npage Two\npage Three");
        assert_eq!(apply_zoom(&mut d, 120), 3);
        for page in 0..3 {
            assert_eq!(d.page_scale(page).factor(), 1.2);
        }
        assert_eq!(apply_zoom(&mut d, 120), 0);
    }

    #[test]
    fn test_apply_zoom_sequence_and_error() {
        let mut seq = diagram("A\nnewpage\nB");
        assert_eq!(apply_zoom(&mut seq, 180), 1);
        assert_eq!(seq.page_scale(1).factor(), 1.8);

        let mut err = diagram("!error Broken");
        assert_eq!(apply_zoom(&mut err, 180), 0);
        assert_eq!(err.page_scale(0), Scale::unset());
    }
}
