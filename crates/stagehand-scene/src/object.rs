use serde::{Deserialize, Serialize};

use stagehand_core::{Color, Direction, Handle, ObjectKind, Point3, StageError, StageResult};

/// Kind-specific shape data of a visual object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    Box { width: f64, height: f64 },
    Circle { radius: f64 },
    /// Endpoints are absolute; the object's position is their midpoint.
    Line { start: Point3, end: Point3 },
    /// `size` is the glyph height in scene units.
    Label { text: String, size: f64 },
}

impl Geometry {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Geometry::Box { .. } => ObjectKind::Box,
            Geometry::Circle { .. } => ObjectKind::Circle,
            Geometry::Line { .. } => ObjectKind::Line,
            Geometry::Label { .. } => ObjectKind::Label,
        }
    }

    pub fn square(side: f64) -> Self {
        Geometry::Box {
            width: side,
            height: side,
        }
    }

    pub fn line(start: Point3, end: Point3) -> Self {
        Geometry::Line { start, end }
    }

    pub fn label(text: impl Into<String>, size: f64) -> Self {
        Geometry::Label {
            text: text.into(),
            size,
        }
    }

    /// Geometry part-way from `self` to `other`, or `None` when the kinds differ.
    ///
    /// A label's text switches to the target's at the halfway point.
    pub fn lerp(&self, other: &Geometry, t: f64) -> Option<Geometry> {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        let geometry = match (self, other) {
            (
                Geometry::Box { width, height },
                Geometry::Box {
                    width: to_width,
                    height: to_height,
                },
            ) => Geometry::Box {
                width: mix(*width, *to_width),
                height: mix(*height, *to_height),
            },
            (Geometry::Circle { radius }, Geometry::Circle { radius: to }) => Geometry::Circle {
                radius: mix(*radius, *to),
            },
            (
                Geometry::Line { start, end },
                Geometry::Line {
                    start: to_start,
                    end: to_end,
                },
            ) => Geometry::Line {
                start: start.lerp(to_start, t),
                end: end.lerp(to_end, t),
            },
            (
                Geometry::Label { text, size },
                Geometry::Label {
                    text: to_text,
                    size: to_size,
                },
            ) => Geometry::Label {
                text: if t < 0.5 { text.clone() } else { to_text.clone() },
                size: mix(*size, *to_size),
            },
            _ => return None,
        };
        Some(geometry)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        let ok = match self {
            Geometry::Box { width, height } => {
                width.is_finite() && height.is_finite() && *width >= 0.0 && *height >= 0.0
            }
            Geometry::Circle { radius } => radius.is_finite() && *radius >= 0.0,
            Geometry::Line { start, end } => start.is_finite() && end.is_finite(),
            Geometry::Label { size, .. } => size.is_finite() && *size >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(format!("{} geometry has negative or non-finite extents", self.kind()))
        }
    }
}

/// Stroke and fill attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub fill_color: Color,
    pub fill_opacity: f64,
    /// Overall opacity multiplier; fades animate this.
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: Color::WHITE,
            stroke_width: 4.0,
            fill_color: Color::BLACK,
            fill_opacity: 0.0,
            opacity: 1.0,
        }
    }
}

impl Style {
    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            stroke_color: color,
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn filled(mut self, color: Color, opacity: f64) -> Self {
        self.fill_color = color;
        self.fill_opacity = opacity;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Point on an object that something else can be pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPoint {
    #[default]
    Center,
    /// Middle of one bounding-box edge, e.g. the top of a tree node.
    Edge(Direction),
}

/// A typed, in-place change to one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    MoveTo(Point3),
    Shift(Point3),
    SetOpacity(f64),
    SetStrokeColor(Color),
    SetStrokeWidth(f64),
    SetFillColor(Color),
    SetFillOpacity(f64),
    SetVisible(bool),
    SetEndpoints { start: Point3, end: Point3 },
    SetText(String),
    /// Scale the geometry about the object's center.
    ScaleBy(f64),
    /// Replace the geometry with one of the same kind. A line takes the new
    /// endpoints as given; other kinds keep their position.
    SetGeometry(Geometry),
    /// Fraction of the outline drawn, clamped to `0..=1`.
    SetDrawn(f64),
}

fn fully_drawn() -> f64 {
    1.0
}

/// A visual element owned by the scene registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualObject {
    pub handle: Handle,
    pub name: Option<String>,
    pub position: Point3,
    pub geometry: Geometry,
    pub style: Style,
    pub visible: bool,
    /// How much of the outline a renderer should draw, from 0 to 1.
    #[serde(default = "fully_drawn")]
    pub drawn: f64,
}

impl VisualObject {
    pub(crate) fn new(
        handle: Handle,
        name: Option<String>,
        geometry: Geometry,
        position: Point3,
        style: Style,
    ) -> StageResult<Self> {
        geometry
            .validate()
            .map_err(|message| StageError::mutation(handle, message))?;
        if !position.is_finite() {
            return Err(StageError::mutation(handle, "position must be finite"));
        }
        let mut object = Self {
            handle,
            name,
            position,
            geometry,
            style,
            visible: true,
            drawn: 1.0,
        };
        // A line is placed by its endpoints; move them to the requested center.
        if let Geometry::Line { start, end } = &mut object.geometry {
            let delta = position - start.midpoint(end);
            *start = *start + delta;
            *end = *end + delta;
        }
        Ok(object)
    }

    pub fn kind(&self) -> ObjectKind {
        self.geometry.kind()
    }

    pub fn center(&self) -> Point3 {
        self.position
    }

    /// Half width and half height of the bounding box.
    ///
    /// Label extents are estimated from character count, since glyph
    /// metrics belong to the renderer.
    pub fn half_extents(&self) -> (f64, f64) {
        match &self.geometry {
            Geometry::Box { width, height } => (width / 2.0, height / 2.0),
            Geometry::Circle { radius } => (*radius, *radius),
            Geometry::Line { start, end } => {
                ((end.x - start.x).abs() / 2.0, (end.y - start.y).abs() / 2.0)
            }
            Geometry::Label { text, size } => {
                (text.chars().count() as f64 * size * 0.3, size / 2.0)
            }
        }
    }

    /// Middle of the bounding-box edge facing `direction`.
    pub fn edge(&self, direction: Direction) -> Point3 {
        let (hw, hh) = self.half_extents();
        let reach = match direction {
            Direction::Up | Direction::Down => hh,
            Direction::Left | Direction::Right => hw,
        };
        self.position + direction.vector() * reach
    }

    pub fn anchor_point(&self, at: AnchorPoint) -> Point3 {
        match at {
            AnchorPoint::Center => self.center(),
            AnchorPoint::Edge(direction) => self.edge(direction),
        }
    }

    pub fn endpoints(&self) -> Option<(Point3, Point3)> {
        match &self.geometry {
            Geometry::Line { start, end } => Some((*start, *end)),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.geometry {
            Geometry::Label { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Apply a mutation. On error the object is left untouched.
    ///
    /// Results that overflow to a non-finite position or extent are
    /// rejected as well as non-finite inputs.
    pub fn apply(&mut self, mutation: Mutation) -> StageResult<()> {
        let mut next = self.clone();
        next.write(mutation)?;
        if !next.position.is_finite() {
            return Err(StageError::mutation(self.handle, "position overflowed"));
        }
        next.geometry
            .validate()
            .map_err(|message| StageError::mutation(self.handle, message))?;
        *self = next;
        Ok(())
    }

    fn write(&mut self, mutation: Mutation) -> StageResult<()> {
        let handle = self.handle;
        let finite = |p: &Point3, what: &str| -> StageResult<()> {
            if p.is_finite() {
                Ok(())
            } else {
                Err(StageError::mutation(handle, format!("{what} must be finite")))
            }
        };
        let unit = |v: f64, what: &str| -> StageResult<f64> {
            if v.is_finite() {
                Ok(v.clamp(0.0, 1.0))
            } else {
                Err(StageError::mutation(handle, format!("{what} must be finite")))
            }
        };

        match mutation {
            Mutation::MoveTo(target) => {
                finite(&target, "position")?;
                self.translate(target - self.position);
            }
            Mutation::Shift(delta) => {
                finite(&delta, "shift")?;
                self.translate(delta);
            }
            Mutation::SetOpacity(v) => self.style.opacity = unit(v, "opacity")?,
            Mutation::SetFillOpacity(v) => self.style.fill_opacity = unit(v, "fill opacity")?,
            Mutation::SetStrokeColor(c) => self.style.stroke_color = c,
            Mutation::SetFillColor(c) => self.style.fill_color = c,
            Mutation::SetStrokeWidth(w) => {
                if !(w.is_finite() && w >= 0.0) {
                    return Err(StageError::mutation(handle, "stroke width must be non-negative"));
                }
                self.style.stroke_width = w;
            }
            Mutation::SetVisible(v) => self.visible = v,
            Mutation::SetEndpoints { start, end } => {
                finite(&start, "line start")?;
                finite(&end, "line end")?;
                match &mut self.geometry {
                    Geometry::Line { start: s, end: e } => {
                        *s = start;
                        *e = end;
                        self.position = start.midpoint(&end);
                    }
                    _ => {
                        return Err(StageError::mutation(
                            handle,
                            format!("{} has no endpoints", self.kind()),
                        ))
                    }
                }
            }
            Mutation::SetText(new_text) => match &mut self.geometry {
                Geometry::Label { text, .. } => *text = new_text,
                _ => {
                    return Err(StageError::mutation(
                        handle,
                        format!("{} has no text", self.kind()),
                    ))
                }
            },
            Mutation::ScaleBy(factor) => {
                if !(factor.is_finite() && factor >= 0.0) {
                    return Err(StageError::mutation(handle, "scale factor must be non-negative"));
                }
                let center = self.position;
                match &mut self.geometry {
                    Geometry::Box { width, height } => {
                        *width *= factor;
                        *height *= factor;
                    }
                    Geometry::Circle { radius } => *radius *= factor,
                    Geometry::Line { start, end } => {
                        *start = center + (*start - center) * factor;
                        *end = center + (*end - center) * factor;
                    }
                    Geometry::Label { size, .. } => *size *= factor,
                }
            }
            Mutation::SetGeometry(geometry) => {
                if geometry.kind() != self.kind() {
                    return Err(StageError::mutation(
                        handle,
                        format!("cannot turn {} into {}", self.kind(), geometry.kind()),
                    ));
                }
                if let Geometry::Line { start, end } = &geometry {
                    self.position = start.midpoint(end);
                }
                self.geometry = geometry;
            }
            Mutation::SetDrawn(v) => self.drawn = unit(v, "draw progress")?,
        }
        Ok(())
    }

    fn translate(&mut self, delta: Point3) {
        self.position = self.position + delta;
        if let Geometry::Line { start, end } = &mut self.geometry {
            *start = *start + delta;
            *end = *end + delta;
        }
    }
}
