//! Report map canvas
//!
//! Markers are placed on a Web-Mercator plane (256px tiles, like every slippy
//! map), centered on the viewport. Wheel zooms, left-drag pans, and a click
//! on a marker selects it.

use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme, Vector};

use crate::state::data::Coordinate;
use crate::state::transfer::TransferRecord;
use crate::Message;

/// Edge length of one map tile in pixels
const TILE_SIZE: f64 = 256.0;

/// Web-Mercator cannot show the poles
const MAX_LATITUDE: f64 = 85.051_128_78;

pub const MIN_ZOOM: f32 = 2.0;
pub const MAX_ZOOM: f32 = 19.0;
/// Zoom used when the map opens on the newest report
pub const INITIAL_ZOOM: f32 = 14.0;

const MARKER_RADIUS: f32 = 8.0;
/// Clicks this close to a marker's center select it
const HIT_RADIUS: f32 = 12.0;

/// One pin on the map
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinate,
    pub title: String,
    /// Handed to the detail screen when the marker is selected
    pub payload: TransferRecord,
}

/// What part of the world is on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: Coordinate::new(0.0, 0.0),
            zoom: MIN_ZOOM,
        }
    }
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f32) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom as f64)
    }

    /// Screen position of `coordinate` inside a canvas of `size`
    pub fn to_screen(&self, coordinate: Coordinate, size: Size) -> Point {
        let world = self.world_size();
        let (cx, cy) = project(self.center, world);
        let (x, y) = project(coordinate, world);

        Point::new(
            (x - cx) as f32 + size.width / 2.0,
            (y - cy) as f32 + size.height / 2.0,
        )
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Move the map by a drag of `delta` pixels
    pub fn pan_by(&mut self, delta: Vector) {
        let world = self.world_size();
        let (cx, cy) = project(self.center, world);
        self.center = unproject(cx - delta.x as f64, cy - delta.y as f64, world);
    }
}

/// Web-Mercator world pixel coordinates of `coordinate`
pub fn project(coordinate: Coordinate, world_size: f64) -> (f64, f64) {
    let latitude = coordinate.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = (coordinate.longitude + 180.0) / 360.0 * world_size;
    let sin = latitude.to_radians().sin();
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)) * world_size;
    (x, y)
}

pub fn unproject(x: f64, y: f64, world_size: f64) -> Coordinate {
    let longitude = x / world_size * 360.0 - 180.0;
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / world_size;
    let latitude = n.sinh().atan().to_degrees();
    Coordinate::new(latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE), longitude)
}

/// Index of the marker under `point`. Markers drawn later sit on top,
/// so they win when pins overlap.
pub fn marker_at(markers: &[Marker], viewport: &Viewport, size: Size, point: Point) -> Option<usize> {
    markers
        .iter()
        .enumerate()
        .rev()
        .find(|(_, marker)| viewport.to_screen(marker.position, size).distance(point) <= HIT_RADIUS)
        .map(|(index, _)| index)
}

/// Canvas program drawing the markers for one viewport
pub struct MapCanvas<'a> {
    pub markers: &'a [Marker],
    pub viewport: Viewport,
}

impl Program<Message> for MapCanvas<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let size = bounds.size();

        frame.fill_rectangle(Point::ORIGIN, size, Color::from_rgb(0.16, 0.18, 0.20));
        self.draw_tile_grid(&mut frame, size);

        for marker in self.markers {
            let center = self.viewport.to_screen(marker.position, size);
            if center.x < -MARKER_RADIUS
                || center.y < -MARKER_RADIUS
                || center.x > size.width + MARKER_RADIUS
                || center.y > size.height + MARKER_RADIUS
            {
                continue;
            }

            let pin = Path::circle(center, MARKER_RADIUS);
            frame.fill(&pin, Color::from_rgb(0.90, 0.16, 0.16));
            frame.stroke(&pin, Stroke::default().with_color(Color::WHITE).with_width(2.0));

            frame.fill_text(canvas::Text {
                content: marker.title.clone(),
                position: Point::new(center.x + MARKER_RADIUS + 4.0, center.y - MARKER_RADIUS),
                color: Color::WHITE,
                size: Pixels(14.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.position_in(bounds).is_none() {
                    return (canvas::event::Status::Ignored, None);
                }
                let zoom_delta = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y * 0.5,
                    mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
                };
                return (canvas::event::Status::Captured, Some(Message::MapZoom(zoom_delta)));
            }

            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    if let Some(index) = marker_at(self.markers, &self.viewport, bounds.size(), position) {
                        return (canvas::event::Status::Captured, Some(Message::MarkerSelected(index)));
                    }
                    state.is_dragging = true;
                    state.last_position = Some(position);
                    return (canvas::event::Status::Captured, None);
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                state.is_dragging = false;
                state.last_position = None;
                return (canvas::event::Status::Captured, None);
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if state.is_dragging {
                    if let (Some(current), Some(last)) = (cursor.position_in(bounds), state.last_position) {
                        state.last_position = Some(current);
                        let delta = Vector::new(current.x - last.x, current.y - last.y);
                        return (canvas::event::Status::Captured, Some(Message::MapPan(delta)));
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging {
            return mouse::Interaction::Grabbing;
        }
        match cursor.position_in(bounds) {
            Some(position) if marker_at(self.markers, &self.viewport, bounds.size(), position).is_some() => {
                mouse::Interaction::Pointer
            }
            Some(_) => mouse::Interaction::Grab,
            None => mouse::Interaction::default(),
        }
    }
}

impl MapCanvas<'_> {
    /// Faint lines on tile boundaries so panning has something to follow
    fn draw_tile_grid(&self, frame: &mut canvas::Frame, size: Size) {
        let world = self.viewport.world_size();
        let (cx, cy) = project(self.viewport.center, world);
        let left = cx - size.width as f64 / 2.0;
        let top = cy - size.height as f64 / 2.0;

        let mut grid = canvas::path::Builder::new();

        let mut x = (left / TILE_SIZE).floor() * TILE_SIZE;
        while x <= left + size.width as f64 {
            let sx = (x - left) as f32;
            grid.move_to(Point::new(sx, 0.0));
            grid.line_to(Point::new(sx, size.height));
            x += TILE_SIZE;
        }

        let mut y = (top / TILE_SIZE).floor() * TILE_SIZE;
        while y <= top + size.height as f64 {
            let sy = (y - top) as f32;
            grid.move_to(Point::new(0.0, sy));
            grid.line_to(Point::new(size.width, sy));
            y += TILE_SIZE;
        }

        frame.stroke(
            &grid.build(),
            Stroke::default()
                .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.08))
                .with_width(1.0),
        );
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub last_position: Option<Point>,
}
