//! Estimate report output formatting
//!
//! Presentation helpers only: they turn an [`EstimateReport`] into text or
//! JSON and never touch the localizer.

use crate::api::types::{AnchorReport, EstimateReport};
use crate::core::PositionEstimate;

/// Human-readable text formatter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFormatter {
    /// Decimal places for coordinates and distances
    pub precision: usize,
    /// Append one line per anchor
    pub include_anchors: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            precision: 2,
            include_anchors: true,
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the coordinate block, rounded to whole feet
    pub fn compact() -> Self {
        Self {
            precision: 0,
            include_anchors: false,
        }
    }

    pub fn format_text(&self, report: &EstimateReport) -> String {
        let p = self.precision;
        let mut output = match &report.estimate {
            Some(PositionEstimate::Point { x, y, anchors_used, rms_residual, iterations }) => {
                let mut block = format!("Current PDU Coordinates:\nX: {:.p$} ft, Y: {:.p$} ft", x, y);
                if self.include_anchors {
                    block.push_str(&format!(
                        "\n{} anchors, rms residual {:.p$} ft, {} iterations",
                        anchors_used.len(),
                        rms_residual,
                        iterations
                    ));
                }
                block
            }
            Some(PositionEstimate::Unavailable { reason }) => {
                format!("Current PDU Coordinates: unavailable ({})", reason)
            }
            None => "Current PDU Coordinates: no estimate yet".to_string(),
        };

        if self.include_anchors {
            for anchor in &report.anchors {
                output.push('\n');
                output.push_str(&self.format_anchor(anchor));
            }
        }
        output
    }

    fn format_anchor(&self, anchor: &AnchorReport) -> String {
        let p = self.precision;
        match anchor.average_distance_ft {
            Some(distance) => format!(
                "{}: Average Distance = {:.p$} ft ({} samples) [{}]",
                anchor.name,
                distance,
                anchor.samples,
                anchor.status.label()
            ),
            None => format!("{}: no samples [{}]", anchor.name, anchor.status.label()),
        }
    }
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_json(&self, report: &EstimateReport) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::availability::AnchorStatus;
    use crate::core::{AnchorId, Point2, UnavailableReason};

    fn report(estimate: Option<PositionEstimate>) -> EstimateReport {
        EstimateReport {
            sequence: 3,
            estimate,
            anchors: vec![
                AnchorReport {
                    id: AnchorId(0),
                    name: "Tower 1".to_string(),
                    position: Point2::ORIGIN,
                    samples: 5,
                    average_reading: Some(-72.5),
                    average_distance_ft: Some(212.132),
                    status: AnchorStatus::Eligible { average_distance_ft: 212.132 },
                },
                AnchorReport {
                    id: AnchorId(1),
                    name: "Tower 2".to_string(),
                    position: Point2::new(300.0, 0.0),
                    samples: 0,
                    average_reading: None,
                    average_distance_ft: None,
                    status: AnchorStatus::Down,
                },
            ],
        }
    }

    fn point() -> PositionEstimate {
        PositionEstimate::Point {
            x: 150.004,
            y: 149.996,
            anchors_used: vec![AnchorId(0), AnchorId(2), AnchorId(3)],
            rms_residual: 0.01,
            iterations: 4,
        }
    }

    #[test]
    fn test_text_with_anchors() {
        let text = TextFormatter::new().format_text(&report(Some(point())));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Current PDU Coordinates:");
        assert_eq!(lines[1], "X: 150.00 ft, Y: 150.00 ft");
        assert_eq!(lines[2], "3 anchors, rms residual 0.01 ft, 4 iterations");
        assert_eq!(lines[3], "Tower 1: Average Distance = 212.13 ft (5 samples) [eligible]");
        assert_eq!(lines[4], "Tower 2: no samples [down]");
    }

    #[test]
    fn test_compact_text() {
        let text = TextFormatter::compact().format_text(&report(Some(point())));
        assert_eq!(text, "Current PDU Coordinates:\nX: 150 ft, Y: 150 ft");
    }

    #[test]
    fn test_text_unavailable() {
        let estimate = PositionEstimate::unavailable(UnavailableReason::InsufficientAnchors { eligible: 1, required: 3 });
        let text = TextFormatter::compact().format_text(&report(Some(estimate)));
        assert!(text.starts_with("Current PDU Coordinates: unavailable ("));
        assert!(TextFormatter::compact().format_text(&report(None)).ends_with("no estimate yet"));
    }

    #[test]
    fn test_json_output() {
        let json = JsonFormatter::new().format_json(&report(Some(point()))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["sequence"], 3);
        assert_eq!(value["anchors"][1]["name"], "Tower 2");
        assert!(value["anchors"][1]["average_distance_ft"].is_null());
        assert!(!json.contains('\n'));

        let pretty = JsonFormatter::pretty().format_json(&report(None)).unwrap();
        assert!(pretty.contains('\n'));
    }
}
