use serde::{Deserialize, Serialize};
use tracing::debug;

use stagehand_core::{Direction, GridConfig, Handle, Point3, StageError, StageResult};

use crate::object::{Geometry, Style};
use crate::registry::SceneObjectRegistry;

/// Declarative parameters of a reference grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: usize,
    pub columns: usize,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub center: Point3,
}

impl GridSpec {
    pub fn new(rows: usize, columns: usize, width: f64, height: f64) -> Self {
        Self {
            rows,
            columns,
            width,
            height,
            center: Point3::ORIGIN,
        }
    }

    pub fn centered_at(mut self, center: Point3) -> Self {
        self.center = center;
        self
    }
}

impl From<&GridConfig> for GridSpec {
    fn from(config: &GridConfig) -> Self {
        GridSpec::new(config.rows, config.columns, config.width, config.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point3,
    pub end: Point3,
}

impl Segment {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

/// A coordinate label on the border of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub axis: Axis,
    /// Where the grid line meets the border.
    pub anchor: Point3,
    /// Center of the label text.
    pub label_position: Point3,
    pub value: f64,
    pub text: String,
}

/// Result of laying out a grid: lines, intersections, axes and ticks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridLayout {
    /// Column lines, left to right.
    pub vertical: Vec<Segment>,
    /// Row lines, bottom to top.
    pub horizontal: Vec<Segment>,
    /// Row-major from the bottom-left corner; `(rows + 1) * (columns + 1)` points.
    pub intersections: Vec<Point3>,
    /// x axis then y axis, both through the grid center.
    pub axes: Vec<Segment>,
    pub ticks: Vec<Tick>,
}

impl GridLayout {
    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.vertical.iter().chain(self.horizontal.iter())
    }
}

/// Registry handles created by [`LayoutEngine::populate`].
#[derive(Debug, Clone, Default)]
pub struct PopulatedGrid {
    pub lines: Vec<Handle>,
    pub axes: Vec<Handle>,
    pub labels: Vec<Handle>,
}

/// Computes absolute coordinates for grids, axes, labels and rows.
///
/// All positions are derived as `start + extent * (i / n)` rather than by
/// accumulating steps, so equal inputs produce bit-identical output.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    number_decimals: u32,
    label_buff: f64,
    label_size: f64,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(&GridConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            number_decimals: config.number_decimals,
            label_buff: config.label_buff,
            label_size: config.label_size,
        }
    }

    pub fn label_size(&self) -> f64 {
        self.label_size
    }

    /// Grid of `rows` x `columns` cells centered on the origin.
    pub fn grid(&self, rows: usize, columns: usize, width: f64, height: f64) -> StageResult<GridLayout> {
        self.grid_at(&GridSpec::new(rows, columns, width, height))
    }

    pub fn grid_at(&self, spec: &GridSpec) -> StageResult<GridLayout> {
        if !(spec.width.is_finite() && spec.width > 0.0) {
            return Err(StageError::layout(format!(
                "width must be positive and finite, got {}",
                spec.width
            )));
        }
        if !(spec.height.is_finite() && spec.height > 0.0) {
            return Err(StageError::layout(format!(
                "height must be positive and finite, got {}",
                spec.height
            )));
        }
        if !spec.center.is_finite() {
            return Err(StageError::layout("grid center must be finite"));
        }
        if spec.rows == 0 || spec.columns == 0 {
            debug!(rows = spec.rows, columns = spec.columns, "empty grid requested");
            return Ok(GridLayout::default());
        }

        let left = spec.center.x - spec.width / 2.0;
        let bottom = spec.center.y - spec.height / 2.0;
        let right = left + spec.width;
        let top = bottom + spec.height;
        let z = spec.center.z;
        let xs = even_stops(left, spec.width, spec.columns);
        let ys = even_stops(bottom, spec.height, spec.rows);

        let vertical = xs
            .iter()
            .map(|&x| Segment::new(Point3::new(x, bottom, z), Point3::new(x, top, z)))
            .collect();
        let horizontal = ys
            .iter()
            .map(|&y| Segment::new(Point3::new(left, y, z), Point3::new(right, y, z)))
            .collect();
        let intersections = ys
            .iter()
            .flat_map(|&y| xs.iter().map(move |&x| Point3::new(x, y, z)))
            .collect();
        let axes = vec![
            Segment::new(
                Point3::new(left, spec.center.y, z),
                Point3::new(right, spec.center.y, z),
            ),
            Segment::new(
                Point3::new(spec.center.x, bottom, z),
                Point3::new(spec.center.x, top, z),
            ),
        ];

        // Interior lines only; each gets a label on both borders it touches,
        // placed on the inner side of the border.
        let mut ticks = Vec::new();
        for &x in &xs[1..spec.columns] {
            for (y, side) in [(bottom, Direction::Up), (top, Direction::Down)] {
                ticks.push(self.tick(Axis::X, Point3::new(x, y, z), x, side));
            }
        }
        for &y in ys[1..spec.rows].iter().rev() {
            for (x, side) in [(left, Direction::Right), (right, Direction::Left)] {
                ticks.push(self.tick(Axis::Y, Point3::new(x, y, z), y, side));
            }
        }

        debug!(
            rows = spec.rows,
            columns = spec.columns,
            ticks = ticks.len(),
            "grid laid out"
        );
        Ok(GridLayout {
            vertical,
            horizontal,
            intersections,
            axes,
            ticks,
        })
    }

    fn tick(&self, axis: Axis, anchor: Point3, coordinate: f64, side: Direction) -> Tick {
        let value = round_to(coordinate, self.number_decimals);
        let text = tick_text(value);
        let half_extent = match side {
            Direction::Up | Direction::Down => self.label_size / 2.0,
            Direction::Left | Direction::Right => text.chars().count() as f64 * self.label_size * 0.3,
        };
        Tick {
            axis,
            anchor,
            label_position: anchor.next_to(side, self.label_buff + half_extent),
            value,
            text,
        }
    }

    /// `count` evenly spaced positions along +x, centered on `center`.
    pub fn row(&self, count: usize, center: Point3, spacing: f64) -> StageResult<Vec<Point3>> {
        if !spacing.is_finite() || !center.is_finite() {
            return Err(StageError::layout("row spacing and center must be finite"));
        }
        if count == 0 {
            return Ok(Vec::new());
        }
        let span = spacing * (count - 1) as f64;
        let first = center.x - span / 2.0;
        Ok((0..count)
            .map(|i| Point3::new(first + spacing * i as f64, center.y, center.z))
            .collect())
    }

    /// Materialize a layout as registry objects: grid lines, axes, tick labels.
    pub fn populate(
        &self,
        registry: &mut SceneObjectRegistry,
        layout: &GridLayout,
        grid_style: &Style,
        axis_style: &Style,
    ) -> StageResult<PopulatedGrid> {
        let mut populated = PopulatedGrid::default();
        for segment in layout.segments() {
            populated.lines.push(registry.create(
                Geometry::line(segment.start, segment.end),
                segment.start.midpoint(&segment.end),
                grid_style.clone(),
            )?);
        }
        for segment in &layout.axes {
            populated.axes.push(registry.create(
                Geometry::line(segment.start, segment.end),
                segment.start.midpoint(&segment.end),
                axis_style.clone(),
            )?);
        }
        let label_style = Style {
            stroke_width: 0.0,
            ..grid_style.clone()
        };
        for tick in &layout.ticks {
            populated.labels.push(registry.create(
                Geometry::label(tick.text.clone(), self.label_size),
                tick.label_position,
                label_style.clone(),
            )?);
        }
        Ok(populated)
    }
}

/// `n + 1` stops from `start` to `start + extent`, inclusive.
fn even_stops(start: f64, extent: f64, n: usize) -> Vec<f64> {
    (0..=n)
        .map(|i| start + extent * (i as f64 / n as f64))
        .collect()
}

/// Shortest text that reads back as `value`, keeping at least one decimal:
/// `1.0`, `-0.17`, `2.5`.
fn tick_text(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid printing "-0.00".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let engine = LayoutEngine::default();
        let layout = engine.grid(3, 4, 8.0, 6.0).unwrap();
        assert_eq!(layout.vertical.len(), 5);
        assert_eq!(layout.horizontal.len(), 4);
        assert_eq!(layout.intersections.len(), (3 + 1) * (4 + 1));
        // interior columns * 2 borders + interior rows * 2 borders
        assert_eq!(layout.ticks.len(), 3 * 2 + 2 * 2);
        assert_eq!(layout.axes.len(), 2);
    }

    #[test]
    fn test_grid_is_evenly_spaced() {
        let engine = LayoutEngine::default();
        let layout = engine.grid(8, 14, 14.0, 8.0).unwrap();
        for pair in layout.vertical.windows(2) {
            assert!((pair[1].start.x - pair[0].start.x - 1.0).abs() < 1e-9);
        }
        for pair in layout.horizontal.windows(2) {
            assert!((pair[1].start.y - pair[0].start.y - 1.0).abs() < 1e-9);
        }
        assert_eq!(layout.vertical[0].start, Point3::xy(-7.0, -4.0));
        assert_eq!(layout.vertical[14].end, Point3::xy(7.0, 4.0));
    }

    #[test]
    fn test_grid_is_deterministic() {
        let engine = LayoutEngine::default();
        let a = engine.grid(7, 3, 6.0, 6.0).unwrap();
        let b = engine.grid(7, 3, 6.0, 6.0).unwrap();
        assert_eq!(a, b);
        let bits = |l: &GridLayout| -> Vec<u64> {
            l.intersections.iter().flat_map(|p| [p.x.to_bits(), p.y.to_bits()]).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_zero_rows_or_columns_is_empty() {
        let engine = LayoutEngine::default();
        assert!(engine.grid(0, 5, 6.0, 6.0).unwrap().is_empty());
        let layout = engine.grid(5, 0, 6.0, 6.0).unwrap();
        assert!(layout.is_empty());
        assert!(layout.intersections.is_empty());
        assert!(layout.ticks.is_empty());
    }

    #[test]
    fn test_non_positive_dimensions_rejected() {
        let engine = LayoutEngine::default();
        for (w, h) in [(0.0, 6.0), (6.0, -1.0), (f64::NAN, 6.0), (6.0, f64::INFINITY)] {
            let err = engine.grid(2, 2, w, h).unwrap_err();
            assert!(matches!(err, StageError::InvalidLayoutParameters(_)));
        }
    }

    #[test]
    fn test_tick_labels_are_rounded() {
        let engine = LayoutEngine::default();
        let layout = engine.grid(3, 3, 1.0, 1.0).unwrap();
        let x_texts: Vec<_> = layout
            .ticks
            .iter()
            .filter(|t| t.axis == Axis::X)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(x_texts, ["-0.17", "-0.17", "0.17", "0.17"]);
    }

    #[test]
    fn test_tick_text_is_shortest_form() {
        let engine = LayoutEngine::default();
        let layout = engine.grid(4, 4, 4.0, 10.0).unwrap();
        let x_texts: Vec<_> = layout
            .ticks
            .iter()
            .filter(|t| t.axis == Axis::X)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(x_texts, ["-1.0", "-1.0", "0.0", "0.0", "1.0", "1.0"]);
        let y_texts: Vec<_> = layout
            .ticks
            .iter()
            .filter(|t| t.axis == Axis::Y)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(y_texts, ["2.5", "2.5", "0.0", "0.0", "-2.5", "-2.5"]);
        assert_eq!(tick_text(round_to(1.0 / 3.0, 2)), "0.33");
        assert_eq!(tick_text(round_to(-0.001, 2)), "0.0");
    }

    #[test]
    fn test_tick_labels_sit_inside_the_border() {
        let config = GridConfig {
            label_buff: 0.1,
            ..GridConfig::default()
        };
        let engine = LayoutEngine::new(&config);
        let layout = engine.grid(2, 2, 4.0, 4.0).unwrap();
        let bottom = layout
            .ticks
            .iter()
            .find(|t| t.axis == Axis::X && t.anchor.y < 0.0)
            .unwrap();
        assert_eq!(bottom.text, "0.0");
        assert!(bottom.label_position.y > bottom.anchor.y);
    }

    #[test]
    fn test_grid_offset_center() {
        let engine = LayoutEngine::default();
        let spec = GridSpec::new(1, 1, 2.0, 2.0).centered_at(Point3::xy(10.0, 10.0));
        let layout = engine.grid_at(&spec).unwrap();
        assert_eq!(layout.intersections.first(), Some(&Point3::xy(9.0, 9.0)));
        assert_eq!(layout.intersections.last(), Some(&Point3::xy(11.0, 11.0)));
    }

    #[test]
    fn test_row_is_centered() {
        let engine = LayoutEngine::default();
        let row = engine.row(4, Point3::xy(0.0, 1.0), 3.0).unwrap();
        assert_eq!(
            row,
            vec![
                Point3::xy(-4.5, 1.0),
                Point3::xy(-1.5, 1.0),
                Point3::xy(1.5, 1.0),
                Point3::xy(4.5, 1.0)
            ]
        );
        assert!(engine.row(0, Point3::ORIGIN, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_populate_creates_objects() {
        let engine = LayoutEngine::default();
        let layout = engine.grid(2, 2, 4.0, 4.0).unwrap();
        let mut registry = SceneObjectRegistry::new();
        let populated = engine
            .populate(&mut registry, &layout, &Style::default(), &Style::default())
            .unwrap();
        assert_eq!(populated.lines.len(), 6);
        assert_eq!(populated.axes.len(), 2);
        assert_eq!(populated.labels.len(), layout.ticks.len());
        assert_eq!(registry.len(), 6 + 2 + layout.ticks.len());
        let first = registry.get(populated.lines[0]).unwrap();
        assert_eq!(
            first.endpoints(),
            Some((Point3::xy(-2.0, -2.0), Point3::xy(-2.0, 2.0)))
        );
    }
}
