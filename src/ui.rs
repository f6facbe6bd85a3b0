use std::collections::HashMap;
use std::f32::consts::TAU;
use std::ops::Range;
use arboard::Clipboard;
use log::{error, info};
use raylib::camera::Camera3D;
use raylib::color::Color;
use raylib::consts::MouseButton::MOUSE_BUTTON_LEFT;
use raylib::drawing::{RaylibDraw, RaylibDraw3D, RaylibMode3DExt, RaylibTextureModeExt};
use raylib::{ffi, RaylibHandle, RaylibThread};
use raylib::math::{Matrix, Rectangle, Vector2, Vector3};
use raylib::misc::AsF32;
use raylib::prelude::RaylibDrawGui;
use raylib::texture::RenderTexture2D;
use crate::earth_mesh::GeocentricPosition;
use crate::controller::OrbitViewController;
use crate::error::{OrbitError, Result};
use crate::time;

const UI_GRID_SIZE: f32 = 8.0;

// Panel grid, in grid units
const PANEL_AREA_X: f32 = 34.0;
const PANEL_WIDTH: f32 = 37.0;
const PANEL_HEIGHT: f32 = 32.0;
const PANEL_COLUMNS: usize = 3;
const PANEL_ROWS: usize = 3;
const VISIBLE_PANELS: usize = PANEL_COLUMNS * PANEL_ROWS;

fn grid_value(value: f32) -> f32 {
    value / UI_GRID_SIZE
}

fn grid_anchor(x: f32, y: f32) -> Vector2 {
    Vector2::new(x * UI_GRID_SIZE, y * UI_GRID_SIZE)
}

fn grid_rectangle(anchor: Vector2, x: f32, y: f32, w: f32, h: f32) -> Rectangle {
    Rectangle::new(
        anchor.x + x * UI_GRID_SIZE,
        anchor.y + y * UI_GRID_SIZE,
        w * UI_GRID_SIZE,
        h * UI_GRID_SIZE
    )
}

/// Screen rectangle of the panel at `index`, filling rows left to right in creation order
fn panel_rectangle(index: usize) -> Rectangle {
    let column = (index % PANEL_COLUMNS) as f32;
    let row = (index / PANEL_COLUMNS) as f32;
    grid_rectangle(grid_anchor(PANEL_AREA_X, 1.0),
                   column * (PANEL_WIDTH + 1.0), row * (PANEL_HEIGHT + 1.0),
                   PANEL_WIDTH, PANEL_HEIGHT)
}

/// The most recent panels that fit in the grid
fn visible_panels(count: usize) -> Range<usize> {
    count.saturating_sub(VISIBLE_PANELS)..count
}

fn panel_count_label(count: usize) -> String {
    if count > VISIBLE_PANELS {
        format!("Orbits shown: {VISIBLE_PANELS} of {count} (newest)")
    } else {
        format!("Orbits shown: {count}")
    }
}

fn scene_point(position: GeocentricPosition) -> Vector3 {
    Vector3::new(position.x as f32, position.y as f32, position.z as f32)
}

/// raygui list items are separated by ';'
fn list_items(names: &[&str]) -> String {
    names.iter()
        .map(|name| name.replace(';', ","))
        .collect::<Vec<_>>()
        .join(";")
}


pub(crate) struct Window {
    rl: RaylibHandle,
    thread: RaylibThread,

    camera: Camera3D,
    camera_distance: f32,
    tilt_angle: f32,
    orbit_angle: f32,

    controller: OrbitViewController<RenderTexture2D>,
    earth_triangles: Vec<[Vector3; 3]>,

    sidebar_layout: HashMap<&'static str, Rectangle>,

    list_names: Vec<String>,
    list_items: String,
    list_scroll: i32,
    list_active: i32,

    generate_requested: bool,
    remove_requested: bool,
    update_clipboard: bool,

    status_error: Option<String>,
}

impl Window {
    const WIDTH: i32 = 1200;
    const HEIGHT: i32 = 800;

    // Scene units are thousands of kilometers
    const SCALE: f32 = 1.0/1_000.0;

    const INITIAL_CAMERA_DISTANCE: f32 = 28.0;
    const MIN_CAMERA_DISTANCE: f32 = 8.0;
    const INITIAL_TILT_ANGLE: f32 = -TAU/6.0;
    const INITIAL_YAW_ANGLE: f32 = -TAU/4.0;

    // System sizes in kilometers
    const MARKER_RADIUS: f32 = 180.0;
    const AXIS_LENGTH: f32 = 10_000.0;
    const AXIS_RADIUS: f32 = 30.0;

    const FPS: u32 = 60;

    pub(crate) fn init(mut controller: OrbitViewController<RenderTexture2D>, dropdown_limit: usize,
                       startup_error: Option<OrbitError>) -> Window {
        // Initialization
        let (mut rl, thread) = raylib::init()
            .size(Self::WIDTH, Self::HEIGHT)
            .title("Satellite Orbit")
            .build();

        // Camera setup
        let initial_camera_position = Vector3::new(0.0, 0.0, Self::INITIAL_CAMERA_DISTANCE)
            .transform_with(Matrix::rotate_xyz(Vector3::new(Self::INITIAL_TILT_ANGLE, 0.0, Self::INITIAL_YAW_ANGLE)));
        let camera = Camera3D::perspective(
            initial_camera_position,
            Vector3::new(0.0,  0.0,  0.0),
            Vector3::new(0.0,  0.0,  1.0),
            45.0,
        );

        // Sidebar
        let sidebar_box = grid_anchor(0.0, 0.0);
        let sidebar_content = grid_anchor(1.0, 1.0);

        let sidebar_layout = HashMap::from([
            ("sidebar",         grid_rectangle(sidebar_box, 0.0, 0.0, PANEL_AREA_X - 1.0, grid_value(Self::HEIGHT.as_f32()))),
            ("satellite_text",  grid_rectangle(sidebar_content, 0.0,  0.0, 30.0, 3.0)),
            ("satellite_list",  grid_rectangle(sidebar_content, 0.0,  3.0, 30.0, 60.0)),
            ("generate_button", grid_rectangle(sidebar_content, 0.0, 65.0, 30.0, 4.0)),
            ("remove_button",   grid_rectangle(sidebar_content, 0.0, 70.0, 30.0, 4.0)),
            ("copy_button",     grid_rectangle(sidebar_content, 0.0, 75.0, 30.0, 4.0)),
            ("status_text",     grid_rectangle(sidebar_content, 0.0, 81.0, 30.0, 3.0)),
            ("panels_text",     grid_rectangle(sidebar_content, 0.0, 84.0, 30.0, 3.0)),
            ("fps_text",        grid_rectangle(sidebar_content, 0.0, 94.0, 30.0, 3.0)),
        ]);

        let names = controller.catalog().display_names(dropdown_limit);
        let list_items = list_items(&names);
        let list_names = names.into_iter().map(str::to_string).collect::<Vec<_>>();

        // The list starts with its first entry selected
        if let Some(first) = list_names.first() {
            controller.select_satellite(first);
        }

        let earth_triangles = controller.earth_mesh().triangles()
            .map(|triangle| triangle.map(scene_point))
            .collect();

        rl.set_target_fps(Self::FPS);
        info!("Window ready with {} selectable satellites", list_names.len());

        Window {
            rl,
            thread,
            camera,
            camera_distance: Self::INITIAL_CAMERA_DISTANCE,
            tilt_angle: Self::INITIAL_TILT_ANGLE,
            orbit_angle: Self::INITIAL_YAW_ANGLE,
            controller,
            earth_triangles,
            sidebar_layout,
            list_names,
            list_items,
            list_scroll: 0,
            list_active: 0,
            generate_requested: false,
            remove_requested: false,
            update_clipboard: false,
            status_error: startup_error.map(|error| error.to_string()),
        }
    }

    pub(crate) fn run(&mut self) {
        while !self.rl.window_should_close() {
            self.update();
            self.render_panels();
            self.draw();
            self.handle_requests();
        }
    }

    fn update(&mut self) {
        // Toggle camera controls
        let moving_camera = self.rl.is_mouse_button_down(MOUSE_BUTTON_LEFT) || self.rl.get_mouse_wheel_move().abs() > 0.1;
        let in_gui = self.sidebar_layout["sidebar"].check_collision_point_rec(self.rl.get_mouse_position());
        let in_window = Rectangle::new(0.0, 0.0, Self::WIDTH.as_f32(), Self::HEIGHT.as_f32()).check_collision_point_rec(self.rl.get_mouse_position());

        if moving_camera && in_window && !in_gui {
            let mouse_delta = self.rl.get_mouse_delta();
            self.tilt_angle += mouse_delta.y * 0.01;
            self.orbit_angle += -mouse_delta.x * 0.01;

            let mouse_wheel_delta = self.rl.get_mouse_wheel_move();
            self.camera_distance = (self.camera_distance - mouse_wheel_delta).max(Self::MIN_CAMERA_DISTANCE);

            let camera_position = Vector3::new(0.0, 0.0, self.camera_distance);
            let matrix = Matrix::rotate_xyz(Vector3::new(self.tilt_angle, 0.0, self.orbit_angle));

            self.camera.position = camera_position.transform_with(matrix);
        }
    }

    /// Draw every live panel into its own render texture
    fn render_panels(&mut self) {
        let visible = visible_panels(self.controller.panel_count());
        for panel in &mut self.controller.panels_mut()[visible] {
            let title = panel.title().to_string();
            let current = panel.trajectory().current().map(|sample| scene_point(sample.position));
            let orbit = panel.trajectory().positions().map(scene_point).collect::<Vec<_>>();

            let mut t = self.rl.begin_texture_mode(&self.thread, &mut panel.surface);
            t.clear_background(Color::RAYWHITE);

            {
                let mut d3d = t.begin_mode3D(&self.camera);

                unsafe {
                    ffi::rlPushMatrix();
                    ffi::rlScalef(Self::SCALE, Self::SCALE, Self::SCALE);
                }

                // Earth surface
                let earth_color = Color::new(0x00, 0x00, 0xFF, 0x66);
                for [a, b, c] in &self.earth_triangles {
                    d3d.draw_triangle3D(*a, *b, *c, earth_color);
                }

                // Orbit track
                for segment in orbit.windows(2) {
                    d3d.draw_line_3D(segment[0], segment[1], Color::RED);
                }

                // Current position
                if let Some(current) = current {
                    d3d.draw_sphere_ex(current, Self::MARKER_RADIUS, 16, 16, Color::RED);
                }

                // Axis
                d3d.draw_cylinder_ex(Vector3::zero(), Vector3::new(Self::AXIS_LENGTH, 0.0, 0.0),
                                     Self::AXIS_RADIUS, Self::AXIS_RADIUS, 8, Color::RED.alpha(0.5));
                d3d.draw_cylinder_ex(Vector3::zero(), Vector3::new(0.0, Self::AXIS_LENGTH, 0.0),
                                     Self::AXIS_RADIUS, Self::AXIS_RADIUS, 8, Color::GREEN.alpha(0.5));
                d3d.draw_cylinder_ex(Vector3::zero(), Vector3::new(0.0, 0.0, Self::AXIS_LENGTH),
                                     Self::AXIS_RADIUS, Self::AXIS_RADIUS, 8, Color::BLUE.alpha(0.5));

                unsafe {
                    ffi::rlPopMatrix();
                }
            }

            // Title and legend
            let height = (PANEL_HEIGHT * UI_GRID_SIZE) as i32;
            t.draw_text(&title, 8, 8, 16, Color::DARKGRAY);
            t.draw_circle(14, height - 14, 5.0, Color::RED);
            t.draw_text("Current Position", 26, height - 21, 14, Color::DARKGRAY);
        }
    }

    fn draw(&mut self) {
        let mut d = self.rl.begin_drawing(&self.thread);
        d.clear_background(Color::RAYWHITE);

        // Panels
        {
            let source = Rectangle::new(0.0, 0.0, PANEL_WIDTH * UI_GRID_SIZE, -PANEL_HEIGHT * UI_GRID_SIZE);
            let visible = visible_panels(self.controller.panel_count());
            for (slot, panel) in self.controller.panels()[visible].iter().enumerate() {
                let bounds = panel_rectangle(slot);
                // Render textures are stored upside down
                d.draw_texture_rec(panel.surface.texture(), source, Vector2::new(bounds.x, bounds.y), Color::WHITE);
                d.draw_rectangle_lines_ex(bounds, 1.0, Color::LIGHTGRAY);
            }
        }

        // Sidebar
        {
            d.draw_rectangle_rec(self.sidebar_layout["sidebar"], Color::LIGHTGRAY.alpha(0.3));

            d.gui_label(self.sidebar_layout["satellite_text"], "Satellite");

            let previous = self.list_active;
            d.gui_list_view(self.sidebar_layout["satellite_list"], self.list_items.as_str(),
                            &mut self.list_scroll, &mut self.list_active);
            if self.list_active < 0 {
                // Clicking the active entry clears it, keep the current selection instead
                self.list_active = previous;
            } else if self.list_active != previous {
                if let Some(name) = self.list_names.get(self.list_active as usize) {
                    self.controller.select_satellite(name);
                }
            }

            if d.gui_button(self.sidebar_layout["generate_button"], "Generate Orbit") { self.generate_requested = true; }
            if d.gui_button(self.sidebar_layout["remove_button"], "Remove Orbit") { self.remove_requested = true; }
            if d.gui_button(self.sidebar_layout["copy_button"], "Copy TLE") { self.update_clipboard = true; }

            match self.status_error {
                Some(ref message) => {
                    d.draw_text(message, self.sidebar_layout["status_text"].x as i32,
                                self.sidebar_layout["status_text"].y as i32, 10, Color::MAROON);
                }
                None => {
                    let selection = self.controller.selection().unwrap_or("none");
                    d.gui_label(self.sidebar_layout["status_text"], format!("Selected: {selection}").as_str());
                }
            }
            d.gui_label(self.sidebar_layout["panels_text"],
                        panel_count_label(self.controller.panel_count()).as_str());
            d.gui_label(self.sidebar_layout["fps_text"], format!("FPS {}", d.get_fps()).as_str());
        }
    }

    /// Button actions need the raylib handle, so they run once the frame is drawn
    fn handle_requests(&mut self) {
        if self.generate_requested {
            self.generate_requested = false;
            let result = self.generate_orbit();
            self.report(result);
        }

        if self.remove_requested {
            self.remove_requested = false;
            // No-op when no panel is open
            self.controller.remove_orbit();
            self.status_error = None;
        }

        if self.update_clipboard {
            self.update_clipboard = false;
            let result = self.copy_selected_tle();
            self.report(result);
        }
    }

    fn generate_orbit(&mut self) -> Result<()> {
        let start = time::now()?;
        let rl = &mut self.rl;
        let thread = &self.thread;
        let width = (PANEL_WIDTH * UI_GRID_SIZE) as u32;
        let height = (PANEL_HEIGHT * UI_GRID_SIZE) as u32;

        self.controller.generate_orbit(start, || {
            rl.load_render_texture(thread, width, height)
                .map_err(|error| OrbitError::Surface(error.to_string()))
        })?;
        Ok(())
    }

    fn copy_selected_tle(&self) -> Result<()> {
        let record = self.controller.selected_record()?;
        Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(record.tle_text()))
            .map_err(|error| OrbitError::Clipboard(error.to_string()))?;
        info!("Copied element set of {} to clipboard", record.name());
        Ok(())
    }

    fn report(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.status_error = None,
            Err(error) => {
                error!("{error}");
                self.status_error = Some(error.to_string());
            }
        }
    }
}
