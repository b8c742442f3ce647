//! ANSI SGR rendering of styled text segments.

use router_core::event::StyledSegment;

const RESET: &str = "\x1b[0m";

/// Renders a sequence of styled segments to a single output line.
///
/// When `color_enabled` is false, styling is dropped entirely and the
/// segments are concatenated as plain text — this is the `!color off`
/// path.
pub fn render_line(segments: &[StyledSegment], color_enabled: bool) -> String {
    if !color_enabled {
        return segments.iter().map(|s| s.text.as_str()).collect();
    }

    let mut out = String::new();
    for seg in segments {
        if seg.fg.is_some() || seg.bold {
            out.push_str("\x1b[");
            let mut parts = Vec::new();
            if seg.bold {
                parts.push("1".to_string());
            }
            if let Some(fg) = seg.fg {
                parts.push(format!("3{}", fg % 8));
            }
            out.push_str(&parts.join(";"));
            out.push('m');
            out.push_str(&seg.text);
            out.push_str(RESET);
        } else {
            out.push_str(&seg.text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_segment_round_trips_unstyled() {
        let segs = vec![StyledSegment::plain("hello")];
        assert_eq!(render_line(&segs, true), "hello");
        assert_eq!(render_line(&segs, false), "hello");
    }

    #[test]
    fn colored_segment_wraps_in_sgr_when_enabled() {
        let seg = StyledSegment { text: "red".to_string(), fg: Some(1), bold: false };
        let rendered = render_line(&[seg.clone()], true);
        assert!(rendered.starts_with("\x1b[31m"));
        assert!(rendered.ends_with(RESET));
        assert_eq!(render_line(&[seg], false), "red");
    }

    #[test]
    fn bold_and_color_combine_into_one_sgr_sequence() {
        let seg = StyledSegment { text: "x".to_string(), fg: Some(2), bold: true };
        let rendered = render_line(&[seg], true);
        assert_eq!(rendered, "\x1b[1;32mx\x1b[0m");
    }
}
