//! Pure coordinate math for GND rows: arrow polygons, axis segments, legend and
//! vertical placement. Nothing here touches SVG; see `canvas` for drawing.
//!
//! Horizontal positions arrive in fractional diagram units (0.0-1.0 covers the
//! drawable area) and leave as canvas units.

use crate::gene::{Diagram, Gene};

/// Fixed drawing constants, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstants {
    pub diagram_height: f64,
    pub uniref_title_height: f64,
    pub uniref_icon_size: f64,
    pub padding: f64,
    pub font_height: f64,
    pub arrow_height: f64,
    pub pointer_width: f64,
    pub axis_thickness: f64,
    pub axis_buffer: f64,
    /// Amino-acid length the full drawable width stands for in the legend.
    pub legend_scale: f64,
    /// Redraw complementary queries so every query points right.
    pub orient_query_forward: bool,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            diagram_height: 67.0,
            uniref_title_height: 18.0,
            uniref_icon_size: 21.0,
            padding: 10.0,
            font_height: 15.0,
            arrow_height: 15.0,
            pointer_width: 5.0,
            axis_thickness: 1.0,
            axis_buffer: 2.0,
            legend_scale: 3000.0,
            orient_query_forward: true,
        }
    }
}

/// Closed polygon of a gene arrow, ten values (five x/y points).
///
/// Forward: `[llx, lly, lrx, lly, px, py, lrx, ury, llx, ury]`.
/// Reverse: `[px, py, llx, lly, lrx, lry, urx, ury, ulx, uly]`.
pub type ArrowCoords = [f64; 10];

/// Slanted quad for one extra family color, eight values.
pub type SubArrowCoords = [f64; 8];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub dashed: bool,
}

impl Segment {
    fn solid(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            dashed: false,
        }
    }

    fn dashed(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            dashed: true,
        }
    }
}

/// Where a gene lands after orientation correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub width: f64,
    pub is_complement: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramPlacement {
    pub query: Placement,
    pub neighbors: Vec<Placement>,
    /// Occupied extent in fractional units.
    pub min_x: f64,
    pub max_x: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub segments: Vec<Segment>,
    pub label: String,
    pub label_x: f64,
    pub label_y: f64,
    /// Dotted vertical line through the diagram centers.
    pub center_guide: Option<Segment>,
}

/// Canvas-size dependent dimensions, recomputed when a search starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    pub constants: LayoutConstants,
    pub canvas_width: f64,
    pub drawable_area_width: f64,
    pub left_padding: f64,
    pub top_padding: f64,
    pub diagram_height: f64,
    pub title_height: f64,
    pub left_title_offset: f64,
    pub use_uniref: bool,
}

impl CanvasLayout {
    pub fn new(canvas_width: f64, use_uniref: bool) -> Self {
        Self::with_constants(LayoutConstants::default(), canvas_width, use_uniref)
    }

    pub fn with_constants(constants: LayoutConstants, canvas_width: f64, use_uniref: bool) -> Self {
        let c = constants;
        let drawable_area_width = (canvas_width - c.padding * 5.0).max(0.0);
        let base_top_padding = c.diagram_height / 2.0 + c.padding * 2.0;
        let left_padding = c.padding;

        if use_uniref {
            Self {
                constants,
                canvas_width,
                drawable_area_width,
                left_padding,
                top_padding: base_top_padding + c.uniref_title_height + 50.0,
                diagram_height: c.diagram_height + c.uniref_title_height,
                title_height: c.font_height + 5.0 + c.uniref_title_height,
                left_title_offset: left_padding + c.uniref_icon_size * 1.2,
                use_uniref,
            }
        } else {
            Self {
                constants,
                canvas_width,
                drawable_area_width,
                left_padding,
                top_padding: base_top_padding,
                diagram_height: c.diagram_height,
                title_height: c.font_height + 5.0,
                left_title_offset: left_padding,
                use_uniref,
            }
        }
    }

    /// Canvas x for a fractional position.
    pub fn to_canvas_x(&self, x: f64) -> f64 {
        self.left_padding + x * self.drawable_area_width
    }

    /// Axis baseline of the diagram at `index` counted from the first drawn row.
    pub fn y_position(&self, index: usize) -> f64 {
        self.row_y(index as f64)
    }

    fn row_y(&self, index: f64) -> f64 {
        index * self.diagram_height + self.top_padding
    }

    pub fn axis_y(&self, y: f64) -> f64 {
        y + self.constants.axis_thickness - 1.0
    }

    pub fn title_y(&self, y: f64) -> f64 {
        y - self.title_height - 1.0
    }

    /// Height needed to show `total_diagrams` rows plus room below the last one.
    pub fn canvas_height(&self, total_diagrams: usize) -> f64 {
        let c = &self.constants;
        total_diagrams as f64 * self.diagram_height + c.padding * 2.0 + c.font_height + 120.0
    }

    /// Right-pointing arrow above the axis at `y`.
    pub fn forward_arrow_coords(&self, x: f64, y: f64, width: f64) -> ArrowCoords {
        let c = &self.constants;
        let lly = y - c.axis_thickness - c.axis_buffer;
        let ury = lly - c.arrow_height;
        let py = lly - c.arrow_height / 2.0;

        let llx = self.to_canvas_x(x);
        let mut lrx = self.to_canvas_x(x + width) - c.pointer_width;
        let px = lrx + c.pointer_width;
        if llx > lrx {
            lrx = llx;
        }

        [llx, lly, lrx, lly, px, py, lrx, ury, llx, ury]
    }

    /// Left-pointing arrow below the axis at `y`.
    pub fn reverse_arrow_coords(&self, x: f64, y: f64, width: f64) -> ArrowCoords {
        let c = &self.constants;
        let px = self.to_canvas_x(x);
        let py = y + c.axis_thickness + c.axis_buffer + c.arrow_height / 2.0;
        let mut llx = px + c.pointer_width;
        let lly = py + c.arrow_height / 2.0;
        let lrx = self.to_canvas_x(x + width);
        let urx = lrx;
        let ury = y + c.axis_thickness + c.axis_buffer;
        let mut ulx = llx;

        if llx > lrx {
            llx = lrx;
            ulx = urx;
        }

        [px, py, llx, lly, lrx, lly, urx, ury, ulx, ury]
    }

    pub fn arrow_coords(&self, placement: &Placement, y: f64) -> ArrowCoords {
        if placement.is_complement {
            self.reverse_arrow_coords(placement.x, y, placement.width)
        } else {
            self.forward_arrow_coords(placement.x, y, placement.width)
        }
    }

    /// Places the query and its neighbors, mirroring the row when the query is on the
    /// complementary strand and queries are oriented forward.
    pub fn place_diagram(&self, diagram: &Diagram) -> DiagramPlacement {
        let orient = self.constants.orient_query_forward;
        let query = &diagram.query;
        let query_placement = Placement {
            x: query.rel_start,
            width: query.rel_width,
            is_complement: if orient { false } else { query.is_complement },
        };

        let mut min_x = 1.1_f64.min(query.rel_start);
        let mut max_x = (-0.1_f64).max(query.rel_end());

        let neighbors = diagram
            .neighbors
            .iter()
            .map(|nb| {
                let placement = place_neighbor(query, nb, orient);
                min_x = min_x.min(placement.x);
                max_x = max_x.max(placement.x + placement.width);
                placement
            })
            .collect();

        DiagramPlacement {
            query: query_placement,
            neighbors,
            min_x,
            max_x,
        }
    }

    /// Axis line for one row plus contig end caps or dashed continuations.
    pub fn axis_segments(&self, y: f64, min_x: f64, max_x: f64, query: &Gene) -> Vec<Segment> {
        let area = self.drawable_area_width;
        let pad = self.left_padding;
        let lo = min_x * area - 3.0;
        let hi = max_x * area + 3.0;

        let mut segments = vec![Segment::solid(pad + lo, y, pad + hi, y)];

        // Left and right trade places when the row was mirrored.
        let (left_cap, left_dash) = if query.is_complement {
            (hi, (hi, area))
        } else {
            (lo, (0.0, lo))
        };
        let (right_cap, right_dash) = if query.is_complement {
            (lo, (0.0, lo))
        } else {
            (hi, (hi, area))
        };

        for (contig_end, cap, dash) in [
            (query.left_contig_end, left_cap, left_dash),
            (query.right_contig_end, right_cap, right_dash),
        ] {
            if contig_end {
                segments.push(Segment::solid(pad + cap, y - 5.0, pad + cap, y + 5.0));
            } else if min_x > 0.0 {
                segments.push(Segment::dashed(pad + dash.0, y, pad + dash.1, y));
            }
        }
        segments
    }

    /// Scale bar drawn below the row at `index`.
    pub fn legend(&self, index: usize, center_guide: bool) -> Legend {
        let c = &self.constants;
        let y = self.y_position(index);
        let x = self.left_padding;

        let (legend_aa, kbp) = legend_length(c.legend_scale);
        let legend_bp = legend_aa * 3.0;
        let line_length = legend_bp * self.drawable_area_width / c.legend_scale;

        let segments = vec![
            Segment::solid(x, y, x + line_length, y),
            Segment::solid(x, y - 5.0, x, y + 5.0),
            Segment::solid(x + line_length, y - 5.0, x + line_length, y + 5.0),
        ];

        let center_guide = center_guide.then(|| {
            let y1 = self.top_padding - c.arrow_height - 7.0;
            let y2 = self.row_y(index as f64 - 1.0) + c.arrow_height + 7.0;
            let center_x = self.to_canvas_x(0.5);
            Segment::dashed(center_x, y1, center_x, y2)
        });

        Legend {
            segments,
            label: format!("Scale: {kbp} kbp"),
            label_x: x + 2.0,
            label_y: y - 4.0,
            center_guide,
        }
    }
}

fn place_neighbor(query: &Gene, neighbor: &Gene, orient: bool) -> Placement {
    if orient && query.is_complement {
        Placement {
            x: 1.0 - neighbor.rel_start - neighbor.rel_width + query.rel_width,
            width: neighbor.rel_width,
            is_complement: !neighbor.is_complement,
        }
    } else {
        Placement {
            x: neighbor.rel_start,
            width: neighbor.rel_width,
            is_complement: neighbor.is_complement,
        }
    }
}

/// Legend length in amino acids and the matching label value in kbp.
fn legend_length(legend_scale: f64) -> (f64, f64) {
    let exponent = legend_scale.log10().ceil() - 2.0;
    let aa = 10f64.powf(exponent);
    (aa, aa * 3.0 / 1000.0)
}

/// Slanted quads for every color but the last of a multi-family arrow. The base arrow
/// polygon supplies the last color.
pub fn sub_arrow_coords(
    coords: &ArrowCoords,
    is_complement: bool,
    num_colors: usize,
) -> Vec<SubArrowCoords> {
    if num_colors < 2 {
        return vec![];
    }
    let urx = coords[6];
    let ury = coords[7];
    let (llx, lly) = if is_complement {
        (coords[2], coords[3])
    } else {
        (coords[0], coords[1])
    };

    let slot_width = (urx - llx) / num_colors as f64;

    (0..num_colors - 1)
        .map(|i| {
            let i_f = i as f64;
            let (x1, x2) = if is_complement {
                (urx - slot_width * i_f, urx - slot_width * (i_f + 1.0))
            } else {
                (llx + slot_width * i_f, llx + slot_width * (i_f + 1.0))
            };
            let (off1, off2) = if i > 0 { (-2.0, 4.0) } else { (0.0, 0.0) };
            [x1 + off1, lly, x2 - 2.0, lly, x2 + 4.0, ury, x1 + off2, ury]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorAssigner;
    use gnd_protocol::{RawDiagram, RawGene};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn layout() -> CanvasLayout {
        CanvasLayout::new(1050.0, false)
    }

    fn raw(id: &str, start: f64, width: f64, complement: bool) -> RawGene {
        RawGene {
            accession: id.to_string(),
            rel_start: start,
            rel_width: width,
            direction: if complement { "complement" } else { "normal" }.to_string(),
            ..Default::default()
        }
    }

    fn diagram(query: RawGene, neighbors: Vec<RawGene>) -> Diagram {
        let mut colors = ColorAssigner::default();
        Diagram::build(
            &RawDiagram {
                attributes: query,
                neighbors,
            },
            &mut colors,
        )
    }

    #[test]
    fn layout_dimensions() {
        let plain = layout();
        assert_eq!(plain.drawable_area_width, 1000.0);
        assert_eq!(plain.top_padding, 53.5);
        assert_eq!(plain.diagram_height, 67.0);
        assert_eq!(plain.y_position(2), 187.5);
        assert_eq!(plain.title_y(100.0), 79.0);
        assert_eq!(plain.canvas_height(3), 356.0);

        let uniref = CanvasLayout::new(1050.0, true);
        assert_eq!(uniref.top_padding, 121.5);
        assert_eq!(uniref.diagram_height, 85.0);
        assert_eq!(uniref.title_height, 38.0);
        assert_eq!(uniref.left_title_offset, 35.2);
    }

    #[test]
    fn forward_arrow_points_right_above_axis() {
        let coords = layout().forward_arrow_coords(0.125, 100.0, 0.25);
        assert_eq!(
            coords,
            [135.0, 97.0, 380.0, 97.0, 385.0, 89.5, 380.0, 82.0, 135.0, 82.0]
        );
    }

    #[test]
    fn reverse_arrow_points_left_below_axis() {
        let coords = layout().reverse_arrow_coords(0.125, 100.0, 0.25);
        assert_eq!(
            coords,
            [135.0, 110.5, 140.0, 118.0, 385.0, 118.0, 385.0, 103.0, 140.0, 103.0]
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.001)]
    fn degenerate_width_clamps(#[case] width: f64) {
        let l = layout();
        let fwd = l.forward_arrow_coords(0.5, 100.0, width);
        assert_eq!(fwd[2], fwd[0]);
        assert!(fwd[4] >= fwd[0] - l.constants.pointer_width);

        let rev = l.reverse_arrow_coords(0.5, 100.0, width);
        assert_eq!(rev[2], rev[4]);
        assert_eq!(rev[8], rev[6]);
    }

    proptest! {
        #[test]
        fn arrow_edges_are_vertical_and_mirrored(x in 0.0f64..1.0, w in 0.01f64..0.5) {
            let l = layout();
            let fwd = l.forward_arrow_coords(x, 100.0, w);
            prop_assert_eq!(fwd[0], fwd[8]);
            prop_assert_eq!(fwd[2], fwd[6]);
            prop_assert!(fwd[2] >= fwd[0]);

            let rev = l.reverse_arrow_coords(x, 100.0, w);
            prop_assert_eq!(rev[2], rev[8]);
            prop_assert_eq!(rev[4], rev[6]);

            // Mirror about the arrow's center.
            let mirror = l.to_canvas_x(x) + l.to_canvas_x(x + w);
            prop_assert!((mirror - fwd[4] - rev[0]).abs() < 1e-9);
            prop_assert!((mirror - fwd[0] - rev[4]).abs() < 1e-9);
            prop_assert!((mirror - fwd[2] - rev[2]).abs() < 1e-9);
        }
    }

    #[test]
    fn complementary_query_mirrors_neighbors() {
        let d = diagram(
            raw("Q", 0.4, 0.2, true),
            vec![raw("A", 0.1, 0.1, false), raw("B", 0.7, 0.2, true)],
        );
        let placed = layout().place_diagram(&d);

        assert!(!placed.query.is_complement);
        assert!(placed.neighbors[0].is_complement);
        assert!((placed.neighbors[0].x - 1.0).abs() < 1e-12);
        assert!(!placed.neighbors[1].is_complement);
        assert!((placed.neighbors[1].x - 0.3).abs() < 1e-12);
        assert!((placed.min_x - 0.3).abs() < 1e-12);
        assert!((placed.max_x - 1.1).abs() < 1e-12);
    }

    #[test]
    fn forward_query_keeps_neighbors() {
        let d = diagram(raw("Q", 0.4, 0.2, false), vec![raw("A", 0.1, 0.1, true)]);
        let placed = layout().place_diagram(&d);
        assert_eq!(
            placed.neighbors[0],
            Placement {
                x: 0.1,
                width: 0.1,
                is_complement: true
            }
        );
        assert_eq!(placed.min_x, 0.1);
        assert!((placed.max_x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn sub_arrows_split_forward_arrow() {
        let l = layout();
        let coords = l.forward_arrow_coords(0.0, 100.0, 0.25);
        let subs = sub_arrow_coords(&coords, false, 3);
        assert_eq!(subs.len(), 2);
        // llx = 10, urx = 255
        let slot = 245.0 / 3.0;
        assert_eq!(subs[0][0], 10.0);
        assert_eq!(subs[0][2], 10.0 + slot - 2.0);
        assert_eq!(subs[1][0], 10.0 + slot - 2.0);
        assert_eq!(subs[1][6], 10.0 + slot + 4.0);
        assert!(sub_arrow_coords(&coords, false, 1).is_empty());
    }

    #[test]
    fn sub_arrows_run_right_to_left_on_reverse_arrow() {
        let l = layout();
        let coords = l.reverse_arrow_coords(0.0, 100.0, 0.25);
        let subs = sub_arrow_coords(&coords, true, 2);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0][0], coords[6]);
        assert!(subs[0][2] < subs[0][0]);
        assert_eq!(subs[0][1], coords[3]);
        assert_eq!(subs[0][5], coords[7]);
    }

    #[test]
    fn axis_with_contig_ends_and_dashes() {
        let l = layout();
        let mut query = diagram(raw("Q", 0.4, 0.2, false), vec![]).query;
        query.left_contig_end = true;

        let segments = l.axis_segments(100.0, 0.2, 0.8, &query);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::solid(207.0, 100.0, 813.0, 100.0));
        assert_eq!(segments[1], Segment::solid(207.0, 95.0, 207.0, 105.0));
        assert_eq!(segments[2], Segment::dashed(813.0, 100.0, 1010.0, 100.0));

        query.is_complement = true;
        let mirrored = l.axis_segments(100.0, 0.2, 0.8, &query);
        assert_eq!(mirrored[1], Segment::solid(813.0, 95.0, 813.0, 105.0));
        assert_eq!(mirrored[2], Segment::dashed(10.0, 100.0, 207.0, 100.0));
    }

    #[test]
    fn no_dashes_when_diagram_starts_at_edge() {
        let l = layout();
        let query = diagram(raw("Q", 0.4, 0.2, false), vec![]).query;
        assert_eq!(l.axis_segments(100.0, 0.0, 1.0, &query).len(), 1);
    }

    #[test]
    fn legend_is_tenth_of_scale() {
        let l = layout();
        let legend = l.legend(2, true);
        assert_eq!(legend.label, "Scale: 0.3 kbp");
        assert_eq!(legend.segments[0].x2 - legend.segments[0].x1, 100.0);
        assert_eq!(legend.segments[0].y1, l.y_position(2));
        let guide = legend.center_guide.unwrap();
        assert_eq!(guide.x1, 510.0);
        assert_eq!(guide.y1, 53.5 - 22.0);
        assert_eq!(guide.y2, l.y_position(1) + 22.0);
        assert!(l.legend(0, false).center_guide.is_none());
    }
}
