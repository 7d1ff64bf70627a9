use std::f64::consts::PI;

use colored::{ColoredString, Colorize};

use crate::model::Severity;

/// Gauge outer radius in view units.
pub const GAUGE_RADIUS: f64 = 40.0;
/// Gauge ring stroke width in view units.
pub const GAUGE_STROKE: f64 = 8.0;

/// Named colors of the client palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Primary,
    Warning,
    Success,
    Danger,
    Info,
    Background,
    Text,
    White,
}

impl Tone {
    pub fn hex(self) -> &'static str {
        match self {
            Self::Primary => "#0000FF",
            Self::Warning => "#FFBF00",
            Self::Success => "#BEF754",
            Self::Danger => "#FF00FF",
            Self::Info => "#00FFFF",
            Self::Background => "#DCDFD5",
            Self::Text => "#000000",
            Self::White => "#FFFFFF",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Primary => (0x00, 0x00, 0xFF),
            Self::Warning => (0xFF, 0xBF, 0x00),
            Self::Success => (0xBE, 0xF7, 0x54),
            Self::Danger => (0xFF, 0x00, 0xFF),
            Self::Info => (0x00, 0xFF, 0xFF),
            Self::Background => (0xDC, 0xDF, 0xD5),
            Self::Text => (0x00, 0x00, 0x00),
            Self::White => (0xFF, 0xFF, 0xFF),
        }
    }
}

/// Background/foreground pair for a severity badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeStyle {
    pub background: Tone,
    pub foreground: Tone,
}

pub fn badge_style(severity: &Severity) -> BadgeStyle {
    let (background, foreground) = match severity {
        Severity::Critical => (Tone::Danger, Tone::White),
        Severity::High => (Tone::Warning, Tone::Text),
        Severity::Medium => (Tone::Info, Tone::Text),
        Severity::Low | Severity::Unrecognized(_) => (Tone::Success, Tone::Text),
    };
    BadgeStyle {
        background,
        foreground,
    }
}

/// Left-edge accent of a finding card.
pub fn accent_color(severity: &Severity) -> Tone {
    match severity {
        Severity::Critical => Tone::Danger,
        Severity::High => Tone::Warning,
        _ => Tone::Primary,
    }
}

/// Color of the overall risk gauge. Both thresholds are strict.
pub fn gauge_color(score: f64) -> Tone {
    if score > 7.0 {
        Tone::Danger
    } else if score > 4.0 {
        Tone::Warning
    } else {
        Tone::Success
    }
}

/// Ring geometry for the overall risk gauge.
///
/// The score is trusted to lie in `0..=10`; it is not clamped, so an
/// out-of-range score yields an out-of-range arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeGeometry {
    pub radius: f64,
    pub stroke: f64,
    pub normalized_radius: f64,
    pub circumference: f64,
    /// Filled share of the ring, `score / 10`.
    pub fraction: f64,
    pub dash_offset: f64,
}

impl GaugeGeometry {
    /// Render the arc as a fixed-width terminal bar.
    pub fn bar(&self, width: usize) -> String {
        let filled = (self.fraction * width as f64).round();
        let filled = if filled.is_nan() {
            0
        } else {
            (filled.max(0.0) as usize).min(width)
        };
        let mut out = String::with_capacity(width * 3);
        out.extend(std::iter::repeat('█').take(filled));
        out.extend(std::iter::repeat('░').take(width - filled));
        out
    }
}

pub fn gauge_geometry(score: f64) -> GaugeGeometry {
    let normalized_radius = GAUGE_RADIUS - GAUGE_STROKE * 2.0;
    let circumference = normalized_radius * 2.0 * PI;
    let fraction = score / 10.0;
    GaugeGeometry {
        radius: GAUGE_RADIUS,
        stroke: GAUGE_STROKE,
        normalized_radius,
        circumference,
        fraction,
        dash_offset: circumference - fraction * circumference,
    }
}

/// Format a 0–10 score the way the cards show it: `9`, `7.5`.
pub fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score}")
    }
}

/// Apply a palette color to terminal text when color output is enabled.
pub fn paint(text: &str, foreground: Tone, background: Option<Tone>, enabled: bool) -> String {
    if !enabled {
        return text.to_string();
    }
    let (r, g, b) = foreground.rgb();
    let mut styled: ColoredString = text.truecolor(r, g, b);
    if let Some(bg) = background {
        let (r, g, b) = bg.rgb();
        styled = styled.on_truecolor(r, g, b);
    }
    styled.to_string()
}

/// Padded severity label styled as a badge.
pub fn badge(severity: &Severity, color: bool) -> String {
    let label = format!(" {} ", severity.label());
    if !color {
        return label;
    }
    let style = badge_style(severity);
    let (fr, fg, fb) = style.foreground.rgb();
    let (br, bg, bb) = style.background.rgb();
    label
        .truecolor(fr, fg, fb)
        .on_truecolor(br, bg, bb)
        .bold()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn gauge_thresholds_are_strict() {
        assert_eq!(gauge_color(4.0), Tone::Success);
        assert_eq!(gauge_color(4.01), Tone::Warning);
        assert_eq!(gauge_color(7.0), Tone::Warning);
        assert_eq!(gauge_color(7.01), Tone::Danger);
        assert_eq!(gauge_color(0.0), Tone::Success);
        assert_eq!(gauge_color(10.0), Tone::Danger);
    }

    #[test]
    fn badge_styles_are_distinct_per_severity() {
        let styles: HashSet<_> = [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
        .into_iter()
        .map(|s| {
            let style = badge_style(&s);
            (style.background, style.foreground)
        })
        .collect();
        assert_eq!(styles.len(), 4);
        assert_eq!(
            badge_style(&Severity::Critical),
            BadgeStyle {
                background: Tone::Danger,
                foreground: Tone::White
            }
        );
    }

    #[test]
    fn unrecognized_severity_falls_back_to_low() {
        let odd = Severity::Unrecognized("SEVERE".into());
        assert_eq!(badge_style(&odd), badge_style(&Severity::Low));
        assert_eq!(badge(&odd, false), " SEVERE ");
    }

    #[test]
    fn accent_follows_card_rules() {
        assert_eq!(accent_color(&Severity::Critical), Tone::Danger);
        assert_eq!(accent_color(&Severity::High), Tone::Warning);
        assert_eq!(accent_color(&Severity::Medium), Tone::Primary);
        assert_eq!(accent_color(&Severity::Low), Tone::Primary);
    }

    #[test]
    fn geometry_matches_ring_dimensions() {
        let geometry = gauge_geometry(5.0);
        assert_eq!(geometry.normalized_radius, 24.0);
        assert!((geometry.circumference - 48.0 * PI).abs() < 1e-9);
        assert!((geometry.fraction - 0.5).abs() < f64::EPSILON);
        assert!((geometry.dash_offset - geometry.circumference / 2.0).abs() < 1e-9);
    }

    #[test]
    fn geometry_is_not_clamped() {
        let geometry = gauge_geometry(12.0);
        assert!(geometry.fraction > 1.0);
        assert!(geometry.dash_offset < 0.0);
        assert_eq!(geometry.bar(10).chars().filter(|c| *c == '█').count(), 10);
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(gauge_geometry(8.0).bar(10), "████████░░");
        assert_eq!(gauge_geometry(0.0).bar(4), "░░░░");
        assert_eq!(gauge_geometry(-3.0).bar(4), "░░░░");
    }

    #[test]
    fn scores_drop_trailing_zero() {
        assert_eq!(format_score(9.0), "9");
        assert_eq!(format_score(7.5), "7.5");
        assert_eq!(format_score(0.0), "0");
    }

    #[test]
    fn paint_is_plain_when_disabled() {
        assert_eq!(paint("x", Tone::Danger, Some(Tone::White), false), "x");
        assert_eq!(badge(&Severity::High, false), " HIGH ");
    }

    proptest! {
        #[test]
        fn gauge_color_buckets(score in 0.0f64..=10.0f64) {
            let expected = if score > 7.0 {
                Tone::Danger
            } else if score > 4.0 {
                Tone::Warning
            } else {
                Tone::Success
            };
            prop_assert_eq!(gauge_color(score), expected);
        }
    }
}
