// Allow unused code for designed-but-not-yet-used APIs
// Remove these as the codebase matures
#![allow(dead_code)]

mod cache;
mod coordinator;
mod display;
mod engine;
mod math3d;
mod noise;
mod planet;
mod raster;
mod util;

use coordinator::Coordinator;
use display::{Display, InputEvent, MouseButtonKind, PixelBuffer, RenderTarget};
use display::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use engine::RenderRequest;
use math3d::{Quat, Vec3};
use planet::{PlanetBook, PlanetDescriptor};
use sdl2::keyboard::Keycode;
use util::{FpsCounter, Rng};

const INSPECT_TARGET: &str = "inspect";
const DESIGNER_TARGET: &str = "designer";

/// Designer preview pane, inset bottom-right
const DESIGNER_SIZE: u32 = 160;
const DESIGNER_MARGIN: i32 = 12;
/// Designer planet sits well inside its pane
const DESIGNER_RADIUS: f32 = DESIGNER_SIZE as f32 / 2.0 * 0.75;

const PRESETS_PATH: &str = "planets.json";

/// Radians of rotation per pixel of mouse drag
const DRAG_SENSITIVITY: f32 = 0.008;
/// Idle auto-spin, radians per second
const INSPECT_SPIN_RATE: f32 = 0.15;
const DESIGNER_SPIN_RATE: f32 = 0.45;

/// Parse command line arguments and return (width, height, vsync)
fn parse_args() -> (u32, u32, bool) {
    let args: Vec<String> = std::env::args().collect();
    let mut width = DEFAULT_WIDTH;
    let mut height = DEFAULT_HEIGHT;
    let mut vsync = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => vsync = false,
            "--width" | "-w" => {
                if i + 1 < args.len() {
                    if let Ok(w) = args[i + 1].parse::<u32>() {
                        width = w;
                    }
                    i += 1;
                }
            },
            "--height" | "-h" => {
                if i + 1 < args.len() {
                    if let Ok(h) = args[i + 1].parse::<u32>() {
                        height = h;
                    }
                    i += 1;
                }
            },
            "--resolution" | "-r" => {
                if i + 1 < args.len() {
                    // Parse WxH format (e.g., 1920x1080)
                    let parts: Vec<&str> = args[i + 1].split('x').collect();
                    if parts.len() == 2 {
                        if let (Ok(w), Ok(h)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                            width = w;
                            height = h;
                        }
                    }
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: globeforge [OPTIONS]");
                println!();
                println!("Options:");
                println!(
                    "  --width W, -w W       Set window width (default: {})",
                    DEFAULT_WIDTH
                );
                println!(
                    "  --height H, -h H      Set window height (default: {})",
                    DEFAULT_HEIGHT
                );
                println!("  --resolution WxH, -r WxH  Set resolution (e.g., 1920x1080)");
                println!("  --no-vsync            Disable VSync for uncapped framerate");
                println!("  --help                Show this help message");
                std::process::exit(0);
            },
            _ => {},
        }
        i += 1;
    }

    (width, height, vsync)
}

/// One render surface: the planet shown on it and its current orientation
struct Surface {
    descriptor: PlanetDescriptor,
    rotation: Quat,
    frame: Option<PixelBuffer>,
    dirty: bool,
}

impl Surface {
    fn new(descriptor: PlanetDescriptor) -> Self {
        Self {
            descriptor,
            rotation: Quat::identity(),
            frame: None,
            dirty: true,
        }
    }

    fn spin(&mut self, rate: f32, dt: f32) {
        let step = Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), rate * dt);
        self.rotation = (step * self.rotation).normalize();
        self.dirty = true;
    }

    fn request(
        &mut self,
        target_id: &str,
        width: u32,
        height: u32,
        radius_override: Option<f32>,
    ) -> RenderRequest {
        self.dirty = false;
        RenderRequest {
            descriptor: self.descriptor.clone(),
            rotation: self.rotation,
            width,
            height,
            target_id: target_id.into(),
            radius_override,
        }
    }
}

fn main() -> Result<(), String> {
    let (width, height, vsync) = parse_args();

    let (mut display, texture_creator) =
        Display::with_options("globeforge", width, height, vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;
    let mut screen = PixelBuffer::with_size(width, height);

    // One coordinator (and render thread) per preview surface, so a slow
    // frame on one never stalls the other
    let mut inspect_coord = Coordinator::new(INSPECT_TARGET);
    let mut designer_coord = Coordinator::new(DESIGNER_TARGET);

    let mut rng = Rng::from_entropy();
    let mut inspect = Surface::new(PlanetDescriptor::random(&mut rng));
    let mut designer = Surface::new(PlanetDescriptor::random(&mut rng));
    // Warm the inspect cache for the designer's planet: promoting it later
    // pays no permutation-table cost on the first interactive render
    inspect_coord.preload(designer.descriptor.continent_seed);

    let mut fps_counter = FpsCounter::new(60);
    let mut show_fps = false;
    let mut dragging = false;
    let mut last_mouse = (0i32, 0i32);

    println!("=== globeforge ===");
    println!("Resolution: {}x{}", width, height);
    if vsync {
        println!("VSync: ON (60fps locked). Use --no-vsync for uncapped.");
    } else {
        println!("VSync: OFF (uncapped framerate)");
    }
    println!("Use --help for command line options.");
    println!("Controls:");
    println!("  Drag       - Rotate the planet");
    println!("  N          - New random planet");
    println!("  Space      - Roll a new designer planet");
    println!("  Up/Down    - Raise/lower designer ocean level");
    println!("  C          - Recolor designer planet");
    println!("  Return     - Promote designer planet to main view");
    println!("  S          - Save planets to {}", PRESETS_PATH);
    println!("  L          - Load planets from {}", PRESETS_PATH);
    println!("  F          - Toggle FPS readout");
    println!("  Escape     - Quit");

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => match key {
                    Keycode::Escape => break 'main,
                    Keycode::N => {
                        inspect.descriptor = PlanetDescriptor::random(&mut rng);
                        inspect.dirty = true;
                    },
                    Keycode::Space => {
                        designer.descriptor = PlanetDescriptor::random(&mut rng);
                        designer.dirty = true;
                        inspect_coord.preload(designer.descriptor.continent_seed);
                    },
                    Keycode::Up => {
                        designer.descriptor.ocean_height_level += 0.5;
                        designer.dirty = true;
                    },
                    Keycode::Down => {
                        designer.descriptor.ocean_height_level -= 0.5;
                        designer.dirty = true;
                    },
                    Keycode::C => {
                        let fresh = PlanetDescriptor::random(&mut rng);
                        designer.descriptor.water_color = fresh.water_color;
                        designer.descriptor.land_color = fresh.land_color;
                        designer.dirty = true;
                    },
                    Keycode::Return => {
                        inspect.descriptor = designer.descriptor.clone();
                        inspect.dirty = true;
                    },
                    Keycode::S => {
                        let mut book = PlanetBook::new("viewer");
                        book.add(inspect.descriptor.clone());
                        book.add(designer.descriptor.clone());
                        if let Err(e) = book.save(PRESETS_PATH) {
                            eprintln!("Failed to save: {}", e);
                        } else {
                            println!("Planets saved to {}", PRESETS_PATH);
                        }
                    },
                    Keycode::L => match PlanetBook::load(PRESETS_PATH) {
                        Ok(book) => {
                            let mut planets = book.planets.into_iter();
                            if let Some(p) = planets.next() {
                                inspect.descriptor = p;
                                inspect.dirty = true;
                            }
                            if let Some(p) = planets.next() {
                                designer.descriptor = p;
                                designer.dirty = true;
                            }
                            println!("Planets loaded from {}", PRESETS_PATH);
                        },
                        Err(e) => eprintln!("Failed to load: {}", e),
                    },
                    Keycode::F => show_fps = !show_fps,
                    _ => {},
                },
                InputEvent::MouseDown {
                    x,
                    y,
                    button: MouseButtonKind::Left,
                } => {
                    dragging = true;
                    last_mouse = (x, y);
                },
                InputEvent::MouseUp {
                    button: MouseButtonKind::Left,
                    ..
                } => {
                    dragging = false;
                },
                InputEvent::MouseMove { x, y } => {
                    if dragging {
                        let dx = (x - last_mouse.0) as f32;
                        let dy = (y - last_mouse.1) as f32;
                        last_mouse = (x, y);

                        // Horizontal drag yaws about Y, vertical drag pitches
                        // about X; compose onto the current orientation
                        let yaw = Quat::from_axis_angle(
                            Vec3::new(0.0, 1.0, 0.0),
                            dx * DRAG_SENSITIVITY,
                        );
                        let pitch = Quat::from_axis_angle(
                            Vec3::new(1.0, 0.0, 0.0),
                            dy * DRAG_SENSITIVITY,
                        );
                        inspect.rotation = (yaw * pitch * inspect.rotation).normalize();
                        inspect.dirty = true;
                    }
                },
                _ => {},
            }
        }

        // Idle auto-spin; dragging takes over the inspect planet
        if !dragging {
            inspect.spin(INSPECT_SPIN_RATE, dt);
        }
        designer.spin(DESIGNER_SPIN_RATE, dt);

        // Issue renders; the coordinators coalesce whatever piles up
        if inspect.dirty {
            let request = inspect.request(INSPECT_TARGET, width, height, None);
            inspect_coord.request(request);
        }
        if designer.dirty {
            let request = designer.request(
                DESIGNER_TARGET,
                DESIGNER_SIZE,
                DESIGNER_SIZE,
                Some(DESIGNER_RADIUS),
            );
            designer_coord.request(request);
        }

        // Collect finished frames
        for frame in inspect_coord.tick() {
            if let Ok(buffer) = PixelBuffer::from_rgba(frame.width, frame.height, frame.pixels) {
                inspect.frame = Some(buffer);
            }
        }
        for frame in designer_coord.tick() {
            if let Ok(buffer) = PixelBuffer::from_rgba(frame.width, frame.height, frame.pixels) {
                designer.frame = Some(buffer);
            }
        }

        // Compose: space backdrop, main planet, designer inset with border
        screen.clear(4, 6, 14);
        if let Some(frame) = &inspect.frame {
            screen.blit_blend(frame, 0, 0);
        }
        if let Some(frame) = &designer.frame {
            let x = width as i32 - DESIGNER_SIZE as i32 - DESIGNER_MARGIN;
            let y = height as i32 - DESIGNER_SIZE as i32 - DESIGNER_MARGIN;
            screen.blit_blend(frame, x, y);
            screen.rect_outline(
                x - 1,
                y - 1,
                DESIGNER_SIZE as i32 + 2,
                DESIGNER_SIZE as i32 + 2,
                90,
                100,
                130,
            );
        }

        if show_fps {
            display.set_title(&format!("globeforge | {} fps", avg_fps as u32));
        } else {
            display.set_title("globeforge");
        }

        display.present(&mut target, &screen)?;
    }

    Ok(())
}
