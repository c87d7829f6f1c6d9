// main.rs - interactive Earth globe; clicking a point renders its map projections

mod camera;
mod canvas;
mod config;
mod error;
mod features;
mod fetch;
mod fonts;
mod geo;
mod i18n;
mod mesh;
mod picking;
mod plot;
mod projection;
mod renderer;
mod session;
mod texture;

use camera::{GlobeCamera, PointerGesture};
use config::ViewerConfig;
use error::StartupError;
use features::FeatureCache;
use geo::GeoPoint;
use i18n::{tr, tr_with};
use plot::MapPlotter;
use renderer::Renderer;
use session::{ClickDispatcher, ClickOutcome, PickEvent, ProjectionView};
use texture::EarthTexture;

use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowBuilder},
};

/// Widest projection image uploaded to egui for display.
const MAX_DISPLAY_WIDTH: u32 = 2048;

enum Status {
    Ready,
    Rendered(GeoPoint),
    Failed(String),
    Saved(PathBuf),
}

struct Projection {
    view: ProjectionView,
    texture: egui::TextureHandle,
}

struct AppState {
    camera: GlobeCamera,
    gesture: PointerGesture,
    cursor: Vec2,
    is_fullscreen: bool,
    current_lang: String,
    status: Status,
    projection: Option<Projection>,
    show_projection: bool,
    exit_requested: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("{}", tr_with("error.startup", &[("err", e.to_string())]));
        eprintln!();
        eprintln!("{}", tr("tips.header"));
        for key in ["tips.network", "tips.dependencies", "tips.gpu"] {
            eprintln!("{}", tr(key));
        }
        std::process::exit(1);
    }
}

fn run() -> Result<(), StartupError> {
    let config = ViewerConfig::from_env()?;
    i18n::init(config.lang.clone());
    log::info!("{}", tr("log.init"));
    log::debug!("{config:?}");

    log::info!(
        "{}",
        tr_with("log.downloading_texture", &[("source", config.texture_source.clone())])
    );
    let earth = EarthTexture::load(&config.texture_source)?;
    let (w, h) = earth.dimensions();
    log::info!(
        "{}",
        tr_with("log.texture_loaded", &[("w", w.to_string()), ("h", h.to_string())])
    );

    log::info!("{}", tr("log.creating_sphere"));
    let mesh = mesh::build_globe(config.lat_bands, config.lon_bands)?;
    log::debug!(
        "globe mesh {}x{} bands: {} vertices, {} triangles",
        mesh.lat_bands,
        mesh.lon_bands,
        mesh.vertices.len(),
        mesh.indices.len() / 3
    );

    log::info!("{}", tr("log.setting_up"));
    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(tr("app.title"))
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );
    let mut renderer = pollster::block_on(Renderer::new(window.clone(), &mesh, &earth))?;
    drop(mesh);

    let features = match &config.features_url {
        Some(url) => FeatureCache::remote(url.clone()),
        None => FeatureCache::disabled(),
    };
    let plotter = MapPlotter::new(
        earth,
        features,
        fonts::find_figure_font(),
        config.dpi,
        config.stock_image,
    );
    let mut dispatcher = ClickDispatcher::new(plotter, config.save_dir.clone());
    log::info!("{}", tr("log.setup_complete"));

    println!("{}", tr("banner.ready"));
    println!("{}", tr("banner.instructions"));

    let mut app = AppState {
        camera: GlobeCamera::default(),
        gesture: PointerGesture::default(),
        cursor: Vec2::ZERO,
        is_fullscreen: false,
        current_lang: i18n::current_lang(),
        status: Status::Ready,
        projection: None,
        show_projection: false,
        exit_requested: false,
    };

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        renderer.resize(*new_inner_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::F11) => toggle_fullscreen(&mut app, &window),
                                Some(VirtualKeyCode::R) => app.camera.reset(),
                                _ => {}
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                        match state {
                            ElementState::Pressed => app.gesture.press(app.cursor),
                            ElementState::Released => {
                                if let Some(at) = app.gesture.release() {
                                    handle_click(&mut app, &mut dispatcher, &mut renderer, at);
                                }
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        app.cursor = Vec2::new(position.x as f32, position.y as f32);
                        if let Some(delta) = app.gesture.motion(app.cursor) {
                            app.camera.drag(delta.x, delta.y);
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        app.camera.zoom(scroll);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                renderer.update_camera(&app.camera);

                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, &mut app, &window);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("{}", tr_with("error.render", &[("err", format!("{e:?}"))])),
                }

                if app.exit_requested {
                    *control_flow = ControlFlow::Exit;
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    })
}

/// Runs to completion before the loop takes more input.
fn handle_click(
    app: &mut AppState,
    dispatcher: &mut ClickDispatcher<MapPlotter>,
    renderer: &mut Renderer,
    at: Vec2,
) {
    let point = picking::pick_point(
        &app.camera,
        at,
        renderer.size.width as f32,
        renderer.size.height as f32,
    );
    match dispatcher.dispatch(PickEvent { point }) {
        ClickOutcome::Rendered(view) => {
            let texture = upload_projection(&renderer.egui_ctx, &view.image);
            app.status = Status::Rendered(view.center);
            app.projection = Some(Projection { view, texture });
            app.show_projection = true;
        }
        ClickOutcome::Failed(msg) => app.status = Status::Failed(msg),
    }
}

fn upload_projection(ctx: &egui::Context, image: &image::RgbaImage) -> egui::TextureHandle {
    let (w, h) = image.dimensions();
    let shown = if w > MAX_DISPLAY_WIDTH {
        let new_h = ((h as f64 * MAX_DISPLAY_WIDTH as f64 / w as f64).round() as u32).max(1);
        image::imageops::resize(
            image,
            MAX_DISPLAY_WIDTH,
            new_h,
            image::imageops::FilterType::Triangle,
        )
    } else {
        image.clone()
    };
    let (w, h) = shown.dimensions();
    let color = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], shown.as_raw());
    ctx.load_texture("projection", color, egui::TextureOptions::LINEAR)
}

/// Ask for a path and write the full-resolution figure. `None` when cancelled.
fn save_with_dialog(view: &ProjectionView) -> Option<Status> {
    let path = rfd::FileDialog::new()
        .add_filter(&tr("file.filter.png"), &["png"])
        .set_file_name(&session::projection_file_name(view.center))
        .save_file()?;
    Some(match view.image.save(&path) {
        Ok(()) => Status::Saved(path),
        Err(e) => {
            let msg = tr_with("error.save_projection", &[("err", e.to_string())]);
            log::error!("{msg}");
            Status::Failed(msg)
        }
    })
}

fn toggle_fullscreen(app: &mut AppState, window: &Window) {
    app.is_fullscreen = !app.is_fullscreen;
    if app.is_fullscreen {
        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    } else {
        window.set_fullscreen(None);
    }
}

fn draw_ui(ctx: &egui::Context, app: &mut AppState, window: &Window) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button(tr("menu.file"), |ui| {
                let can_save = app.projection.is_some();
                if ui
                    .add_enabled(can_save, egui::Button::new(tr("menu.save_projection")))
                    .clicked()
                {
                    ui.close_menu();
                    if let Some(p) = &app.projection {
                        if let Some(status) = save_with_dialog(&p.view) {
                            app.status = status;
                        }
                    }
                }
                if ui.button(tr("menu.exit")).clicked() {
                    app.exit_requested = true;
                    ui.close_menu();
                }
            });

            ui.menu_button(tr("menu.view"), |ui| {
                if ui.button(tr("view.reset")).clicked() {
                    app.camera.reset();
                    ui.close_menu();
                }

                let fullscreen_label = if app.is_fullscreen {
                    tr("view.fullscreen.exit")
                } else {
                    tr("view.fullscreen.enter")
                };
                if ui.button(fullscreen_label).clicked() {
                    toggle_fullscreen(app, window);
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button(tr("view.input_sensitivity"), |ui| {
                    ui.add(
                        egui::Slider::new(
                            &mut app.camera.sensitivity_scale,
                            camera::SENSITIVITY_RANGE,
                        )
                        .text(tr("view.multiplier")),
                    );
                    if ui.button(tr("view.reset_sensitivity")).clicked() {
                        app.camera.sensitivity_scale = 1.0;
                    }
                });

                ui.separator();
                if ui
                    .add_enabled(
                        app.projection.is_some(),
                        egui::Checkbox::new(&mut app.show_projection, tr("view.show_projection")),
                    )
                    .clicked()
                {
                    ui.close_menu();
                }
            });

            ui.menu_button(tr("menu.language"), |ui| {
                for (code, name) in i18n::LANGUAGES {
                    if ui
                        .radio_value(&mut app.current_lang, code.to_string(), name)
                        .clicked()
                    {
                        i18n::init(app.current_lang.clone());
                        window.set_title(&tr("app.title"));
                        ui.close_menu();
                    }
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            match &app.status {
                Status::Ready => {
                    ui.label(tr("status.ready"));
                }
                Status::Rendered(center) => {
                    ui.label(tr_with(
                        "status.last_click",
                        &[
                            ("lat", format!("{:.2}", center.lat)),
                            ("lon", format!("{:.2}", center.lon)),
                        ],
                    ));
                }
                Status::Failed(msg) => {
                    ui.label(egui::RichText::new(msg).color(egui::Color32::LIGHT_RED));
                }
                Status::Saved(path) => {
                    ui.label(tr_with(
                        "viewer.saved",
                        &[("path", path.display().to_string())],
                    ));
                }
            }
            ui.label("|");
            ui.label(tr_with(
                "status.distance",
                &[("distance", format!("{:.2}", app.camera.distance))],
            ));
            ui.label("|");
            ui.label(tr_with(
                "status.yaw",
                &[("value", format!("{:.1}", app.camera.yaw))],
            ));
            ui.label("|");
            ui.label(tr_with(
                "status.pitch",
                &[("value", format!("{:.1}", app.camera.pitch))],
            ));
        });
    });

    let Some(projection) = &app.projection else {
        return;
    };
    let mut save_clicked = false;
    egui::Window::new(tr("viewer.title"))
        .id(egui::Id::new("projection_viewer"))
        .open(&mut app.show_projection)
        .default_width(960.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button(tr("viewer.save_png")).clicked() {
                    save_clicked = true;
                }
                let (w, h) = projection.view.image.dimensions();
                ui.label(format!("{w}x{h}"));
            });
            ui.separator();

            let tex_size = projection.texture.size_vec2();
            let width = ui.available_width().min(tex_size.x).max(1.0);
            let size = egui::vec2(width, width * tex_size.y / tex_size.x.max(1.0));
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add(egui::Image::new(egui::load::SizedTexture::new(
                    projection.texture.id(),
                    size,
                )));
            });
        });

    if save_clicked {
        if let Some(status) = save_with_dialog(&projection.view) {
            app.status = status;
        }
    }
}
