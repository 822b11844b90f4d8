//! Retained SVG scene for the drawn diagrams.
//!
//! Drawing a diagram computes its geometry once and stores it as a scene; the SVG
//! document is built on demand so highlight changes only flip flags on arrow handles.

use crate::constants::QUERY_FILL_COLOR;
use crate::gene::{Diagram, Gene};
use crate::geometry::{
    ArrowCoords, CanvasLayout, LayoutConstants, Legend, Placement, Segment, SubArrowCoords,
    sub_arrow_coords,
};
use crate::highlight::{ArrowHandle, ArrowId, HighlightIndex};
use crate::uniref::{UnirefInfo, diagram_title};
use gnd_protocol::ArrowHover;
use itertools::Itertools;
use svg::Document;
use svg::node::element::{Group, Line, Link, Path, Polygon, Style, Text};
use tracing::{debug, warn};

const AXIS_COLOR: &str = "black";
const CENTER_GUIDE_COLOR: &str = "lightgray";
const POPUP_OFFSET: f64 = 12.0;
const UNIREF_ICON_PATH: &str = "M2 0a2 2 0 0 0-2 2v12a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V2a2 2 0 0 0-2-2zm6.5 4.5v3h3a.5.5 0 0 1 0 1h-3v3a.5.5 0 0 1-1 0v-3h-3a.5.5 0 0 1 0-1h3v-3a.5.5 0 0 1 1 0";
const UNIREF_ICON_NATIVE_SIZE: f64 = 16.0;
const UNIREF_HELP_TEXT: &str = "Click this icon on the diagrams below to open a new window with the sequences contained in the given UniRef cluster.";
const STYLE_RULES: &str = r#"
    text { font-family: system-ui, -apple-system, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif; }
    .highlighted { stroke: #000; stroke-width: 3; }
    .diagram-title { font-size: 0.88rem; }
    .canvas-filter-active .an-arrow:not(.highlighted) { opacity: 0.3; }
"#;

#[derive(Debug, Clone)]
struct ArrowScene {
    arrow_id: ArrowId,
    gene_id: String,
    coords: ArrowCoords,
    fill: String,
    sub_arrows: Vec<(SubArrowCoords, String)>,
}

#[derive(Debug, Clone)]
struct TextScene {
    x: f64,
    y: f64,
    text: String,
}

#[derive(Debug, Clone)]
struct ExpandIcon {
    x: f64,
    y: f64,
    href: Option<String>,
}

#[derive(Debug, Clone)]
struct DiagramScene {
    index: usize,
    query_id: String,
    y: f64,
    arrows: Vec<ArrowScene>,
    axis: Vec<Segment>,
    title: Option<TextScene>,
    subtitle: Option<TextScene>,
    expand: Option<ExpandIcon>,
}

#[derive(Debug, Clone)]
pub struct SvgCanvas {
    layout: CanvasLayout,
    uniref: UnirefInfo,
    show_center_guide: bool,
    /// Page URL the UniRef expand links are derived from.
    expand_base_url: Option<String>,
    scenes: Vec<DiagramScene>,
    legend: Option<Legend>,
}

impl SvgCanvas {
    pub fn new(canvas_width: f64, show_center_guide: bool) -> Self {
        Self {
            layout: CanvasLayout::new(canvas_width, false),
            uniref: UnirefInfo::default(),
            show_center_guide,
            expand_base_url: None,
            scenes: vec![],
            legend: None,
        }
    }

    pub fn with_layout_constants(mut self, constants: LayoutConstants) -> Self {
        let (width, use_uniref) = (self.layout.canvas_width, self.layout.use_uniref);
        self.layout = CanvasLayout::with_constants(constants, width, use_uniref);
        self
    }

    pub fn with_expand_base_url(mut self, url: impl Into<String>) -> Self {
        self.expand_base_url = Some(url.into());
        self
    }

    pub fn layout(&self) -> &CanvasLayout {
        &self.layout
    }

    pub fn uniref(&self) -> &UnirefInfo {
        &self.uniref
    }

    /// Number of diagrams drawn since the last clear.
    pub fn diagram_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn has_legend(&self) -> bool {
        self.legend.is_some()
    }

    /// Starts a new search: drops every scene and lays the canvas out for `uniref`.
    pub fn initialize(&mut self, uniref: UnirefInfo) {
        self.clear();
        self.uniref = uniref;
        self.layout = CanvasLayout::with_constants(
            self.layout.constants,
            self.layout.canvas_width,
            uniref.use_uniref,
        );
    }

    pub fn clear(&mut self) {
        self.scenes.clear();
        self.legend = None;
    }

    pub fn clear_legend(&mut self) {
        self.legend = None;
    }

    /// Draws the legend below the row at `index`, usually the number of drawn diagrams.
    pub fn draw_legend(&mut self, index: usize) {
        self.legend = Some(self.layout.legend(index, self.show_center_guide));
    }

    /// Draws `diagram` as row `index` and registers its arrows for highlighting.
    pub fn draw_diagram(
        &mut self,
        index: usize,
        diagram: &Diagram,
        highlight: &mut HighlightIndex,
    ) -> Vec<ArrowId> {
        let layout = self.layout;
        let y = layout.y_position(index);
        let placed = layout.place_diagram(diagram);
        let query = &diagram.query;

        let mut arrows = Vec::with_capacity(1 + diagram.neighbors.len());
        arrows.push(self.draw_arrow(index, y, &placed.query, query, &query.id, highlight));
        for (neighbor, placement) in diagram.neighbors.iter().zip(&placed.neighbors) {
            arrows.push(self.draw_arrow(index, y, placement, neighbor, &query.id, highlight));
        }

        let axis = layout.axis_segments(layout.axis_y(y), placed.min_x, placed.max_x, query);

        let title_y = layout.title_y(y);
        let title_text = diagram_title(query, Some(&self.uniref));
        let title = (!title_text.is_empty()).then(|| TextScene {
            x: layout.left_title_offset,
            y: title_y,
            text: title_text,
        });

        let (subtitle, expand) = if self.uniref.use_uniref {
            let subtitle = TextScene {
                x: layout.left_title_offset,
                y: title_y + layout.constants.uniref_title_height,
                text: self.uniref.cluster_subtitle(query),
            };
            let expand = self.uniref.is_expandable(query).then(|| ExpandIcon {
                x: layout.constants.uniref_icon_size * 0.6,
                y: title_y - layout.constants.padding,
                href: self.expand_href(query),
            });
            (Some(subtitle), expand)
        } else {
            (None, None)
        };

        let ids = arrows.iter().map(|a| a.arrow_id).collect();
        self.scenes.push(DiagramScene {
            index,
            query_id: query.id.clone(),
            y,
            arrows,
            axis,
            title,
            subtitle,
            expand,
        });
        ids
    }

    fn draw_arrow(
        &self,
        index: usize,
        y: f64,
        placement: &Placement,
        gene: &Gene,
        query_id: &str,
        highlight: &mut HighlightIndex,
    ) -> ArrowScene {
        let coords = self.layout.arrow_coords(placement, y);
        let fill = if gene.is_query {
            QUERY_FILL_COLOR.to_string()
        } else {
            gene.fill_color().to_string()
        };
        let sub_arrows: Vec<(SubArrowCoords, String)> = if gene.is_query {
            vec![]
        } else {
            sub_arrow_coords(&coords, placement.is_complement, gene.colors.len())
                .into_iter()
                .zip(gene.colors.iter().cloned())
                .collect()
        };

        let handle = ArrowHandle::new(&gene.id, query_id, index, sub_arrows.len());
        let arrow_id = highlight.register_arrow(handle, gene);
        ArrowScene {
            arrow_id,
            gene_id: gene.id.clone(),
            coords,
            fill,
            sub_arrows,
        }
    }

    fn expand_href(&self, query: &Gene) -> Option<String> {
        let base = self.expand_base_url.as_deref()?;
        match self.uniref.expand_url(base, query) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "could not build UniRef expand link");
                None
            }
        }
    }

    /// Popup anchor for the most recently drawn arrow of `gene_id`.
    pub fn arrow_anchor(&self, gene_id: &str) -> Option<ArrowHover> {
        let (scene, arrow) = self
            .scenes
            .iter()
            .rev()
            .find_map(|s| s.arrows.iter().find(|a| a.gene_id == gene_id).map(|a| (s, a)))?;

        let xs = arrow.coords.iter().step_by(2);
        let ys = arrow.coords.iter().skip(1).step_by(2);
        let (min_x, max_x) = xs.fold((f64::MAX, f64::MIN), |(lo, hi), x| (lo.min(*x), hi.max(*x)));
        let max_y = ys.fold(f64::MIN, |hi, y| hi.max(*y));

        Some(ArrowHover {
            gene_id: gene_id.to_string(),
            x: (min_x + max_x) / 2.0,
            gnd_lower_y: max_y + self.layout.constants.arrow_height + POPUP_OFFSET,
            gnd_upper_y: self.layout.title_y(scene.y) - self.layout.constants.font_height,
        })
    }

    /// Full SVG for the current scenes, with highlight state read from `highlight`.
    pub fn document(&self, highlight: &HighlightIndex) -> Document {
        let width = self.layout.canvas_width;
        let height = self.layout.canvas_height(self.scenes.len());
        let class = if highlight.is_filter_overlay_enabled() {
            "gnd-canvas canvas-filter-active"
        } else {
            "gnd-canvas"
        };

        let mut doc = Document::new()
            .set("viewBox", (0, 0, width, height))
            .set("width", width)
            .set("height", height)
            .set("preserveAspectRatio", "xMinYMin meet")
            .set("class", class)
            .add(Style::new(STYLE_RULES));

        if self.uniref.use_uniref && !self.scenes.is_empty() {
            doc = doc.add(self.uniref_help_group());
        }
        for scene in &self.scenes {
            doc = doc.add(self.scene_group(scene, highlight));
        }
        if let Some(legend) = &self.legend {
            doc = doc.add(legend_group(legend));
        }
        debug!(diagrams = self.scenes.len(), "built SVG document");
        doc
    }

    pub fn to_svg_string(&self, highlight: &HighlightIndex) -> String {
        self.document(highlight).to_string()
    }

    fn scene_group(&self, scene: &DiagramScene, highlight: &HighlightIndex) -> Group {
        let mut group = Group::new()
            .set("id", format!("diagram-group-{}", scene.index))
            .set("data-query-arrow-id", scene.query_id.clone());

        for arrow in &scene.arrows {
            let class = if highlight.is_highlighted(arrow.arrow_id) {
                "an-arrow highlighted"
            } else {
                "an-arrow"
            };
            let mut arrow_group = Group::new()
                .set("class", "an-arrow-group")
                .set("data-id", arrow.gene_id.clone())
                .add(
                    Polygon::new()
                        .set("points", points(&arrow.coords))
                        .set("class", class)
                        .set("fill", arrow.fill.clone()),
                );
            for (coords, color) in &arrow.sub_arrows {
                arrow_group = arrow_group.add(
                    Polygon::new()
                        .set("points", points(coords))
                        .set("class", class)
                        .set("fill", color.clone())
                        .set("style", "pointer-events: none"),
                );
            }
            group = group.add(arrow_group);
        }

        for segment in &scene.axis {
            group = group.add(segment_line(segment, AXIS_COLOR, "2px, 4px"));
        }
        for text in scene.title.iter().chain(scene.subtitle.iter()) {
            group = group.add(
                Text::new(text.text.clone())
                    .set("x", text.x)
                    .set("y", text.y)
                    .set("class", "diagram-title"),
            );
        }
        if let Some(icon) = &scene.expand {
            let icon_path = uniref_icon(icon.x, icon.y, self.layout.constants.uniref_icon_size);
            group = match &icon.href {
                Some(href) => group.add(
                    Link::new()
                        .set("href", href.clone())
                        .set("target", "_blank")
                        .set("cursor", "pointer")
                        .add(icon_path),
                ),
                None => group.add(icon_path),
            };
        }
        group
    }

    fn uniref_help_group(&self) -> Group {
        let c = &self.layout.constants;
        Group::new()
            .set("class", "svg-canvas-uniref-controls-group")
            .add(uniref_icon(c.padding, c.padding, c.uniref_icon_size * 1.4))
            .add(
                Text::new(UNIREF_HELP_TEXT)
                    .set("x", c.uniref_icon_size * 1.6 + c.padding)
                    .set("y", c.padding + c.uniref_icon_size * 0.6)
                    .set("class", "diagram-title-uniref-help"),
            )
    }
}

fn points(coords: &[f64]) -> String {
    coords
        .chunks(2)
        .map(|xy| format!("{},{}", xy[0], xy[1]))
        .join(" ")
}

fn segment_line(segment: &Segment, color: &str, dash: &str) -> Line {
    let line = Line::new()
        .set("x1", segment.x1)
        .set("y1", segment.y1)
        .set("x2", segment.x2)
        .set("y2", segment.y2)
        .set("stroke", color)
        .set("stroke-width", 1);
    if segment.dashed {
        line.set("stroke-dasharray", dash)
    } else {
        line
    }
}

fn uniref_icon(x: f64, y: f64, size: f64) -> Path {
    let scale = size / UNIREF_ICON_NATIVE_SIZE;
    Path::new()
        .set("d", UNIREF_ICON_PATH)
        .set("fill", "currentColor")
        .set("transform", format!("translate({x},{y}) scale({scale})"))
}

fn legend_group(legend: &Legend) -> Group {
    let mut group = Group::new().set("class", "gnd-legend");
    for segment in &legend.segments {
        group = group.add(segment_line(segment, AXIS_COLOR, "2,2"));
    }
    group = group.add(
        Text::new(legend.label.clone())
            .set("x", legend.label_x)
            .set("y", legend.label_y)
            .set("class", "diagram-title"),
    );
    if let Some(guide) = &legend.center_guide {
        group = group.add(segment_line(guide, CENTER_GUIDE_COLOR, "2,2"));
    }
    group
}
