// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier
// Modifications (c) 2026 Peter Carlton

use std::{fs, path::Path};

use hex_color::HexColor;
use log::info;
use resvg::{tiny_skia, usvg};

use crate::{config::FigureConfig, errors::PipelineError, tree::TreeNode};

const MARGIN: f64 = 20.0;
const LABEL_GAP: f64 = 6.0;
// Rough advance of one label character, relative to the font size.
const CHAR_WIDTH: f64 = 0.62;

struct Colors {
    line: String,
    label: String,
    background: String,
}

impl Colors {
    fn from_config(cfg: &FigureConfig) -> Result<Self, PipelineError> {
        Ok(Colors {
            line: svg_color(&cfg.line_color)?,
            label: svg_color(&cfg.label_color)?,
            background: svg_color(&cfg.background)?,
        })
    }
}

fn svg_color(spec: &str) -> Result<String, PipelineError> {
    let c = HexColor::parse(spec)
        .map_err(|e| PipelineError::Config(format!("Bad color '{}': {}", spec, e)))?;
    Ok(format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b))
}

struct Layout<'a> {
    cfg: &'a FigureConfig,
    x_scale: f64,
    use_lengths: bool,
    next_row: usize,
    out: String,
}

impl Layout<'_> {
    fn edge(&self, node: &TreeNode) -> f64 {
        if self.use_lengths {
            node.branch_length.unwrap_or(0.0).max(0.0)
        } else {
            1.0
        }
    }

    fn row_y(&self, row: usize) -> f64 {
        MARGIN + (row as f64 + 0.5) * self.cfg.row_height as f64
    }

    // Draws `node` (whose branch starts at `parent_x`) and returns its y coordinate.
    fn draw(&mut self, node: &TreeNode, parent_x: f64, colors: &Colors) -> f64 {
        let x = parent_x + self.edge(node) * self.x_scale;
        let y = if node.is_leaf() {
            let y = self.row_y(self.next_row);
            self.next_row += 1;
            self.out.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\">{}</text>\n",
                x + LABEL_GAP,
                y,
                colors.label,
                escape_svg(node.name.as_deref().unwrap_or(""))
            ));
            y
        } else {
            let ys: Vec<f64> = node
                .children
                .iter()
                .map(|child| self.draw(child, x, colors))
                .collect();
            let y_first = ys.first().copied().unwrap_or(0.0);
            let y_last = ys.last().copied().unwrap_or(0.0);
            self.line(x, y_first, x, y_last, colors);
            (y_first + y_last) / 2.0
        };
        self.line(parent_x, y, x, y, colors);
        y
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, colors: &Colors) {
        self.out.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" \
             stroke=\"{}\" stroke-width=\"1.5\" stroke-linecap=\"square\"/>\n",
            x1, y1, x2, y2, colors.line
        ));
    }
}

fn cladogram_depth(node: &TreeNode) -> f64 {
    1.0 + node
        .children
        .iter()
        .map(cladogram_depth)
        .fold(0.0, f64::max)
}

/// Rectangular phylogram: x is the distance from the root, one leaf per row, internal nodes
/// centered on their outermost children. Trees without branch lengths are drawn as cladograms.
pub fn tree_to_svg(tree: &TreeNode, cfg: &FigureConfig) -> Result<String, PipelineError> {
    let colors = Colors::from_config(cfg)?;
    let leaves = tree.leaf_names();
    let max_label = leaves.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let label_width = max_label as f64 * cfg.font_size as f64 * CHAR_WIDTH + LABEL_GAP;

    let width = cfg.width as f64;
    let height = 2.0 * MARGIN + (leaves.len() as f64) * cfg.row_height as f64;
    let drawable = width - 2.0 * MARGIN - label_width;
    if drawable <= 0.0 {
        return Err(PipelineError::Render(format!(
            "Figure width {} leaves no room for the tree",
            cfg.width
        )));
    }

    let depth = tree.depth();
    let use_lengths = depth > 0.0;
    let depth = if use_lengths { depth } else { cladogram_depth(tree) };
    let mut layout = Layout {
        cfg,
        x_scale: drawable / depth,
        use_lengths,
        next_row: 0,
        out: String::new(),
    };
    layout.draw(tree, MARGIN, &colors);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" \
         width=\"{:.0}\" height=\"{:.0}\" viewBox=\"0 0 {:.0} {:.0}\">\n",
        width, height, width, height
    ));
    out.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        colors.background
    ));
    out.push_str(&format!(
        "<g font-family=\"sans-serif\" font-size=\"{}\" dominant-baseline=\"middle\">\n",
        cfg.font_size
    ));
    out.push_str(&layout.out);
    out.push_str("</g>\n</svg>\n");
    Ok(out)
}

fn escape_svg(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn svg_to_png(svg: &str, path: &Path) -> Result<(), PipelineError> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| PipelineError::Render(format!("SVG parse error: {}", e)))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| PipelineError::Render(String::from("Empty image size")))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap
        .save_png(path)
        .map_err(|e| PipelineError::Render(format!("PNG encoding error: {}", e)))?;
    Ok(())
}

/// Draws `tree` into `path` (PNG), creating parent directories as needed. An SVG copy is written
/// next to it.
pub fn render_tree(tree: &TreeNode, cfg: &FigureConfig, path: &Path) -> Result<(), PipelineError> {
    let svg = tree_to_svg(tree, cfg)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path.with_extension("svg"), &svg)?;
    svg_to_png(&svg, path)?;
    info!("Wrote tree figure {}", path.display());
    Ok(())
}
