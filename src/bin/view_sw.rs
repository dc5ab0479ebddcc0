use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use clap::Parser;
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tilecast::{
    EngineConfig,
    engine::{AdaptiveSampler, Projection, Screen},
    renderer::{
        RendererExt, Scene, Software,
        software::{MinimapStyle, draw_minimap},
    },
    sim::{Buttons, Game, InputCmd, TicRunner},
    world::{DemoOptions, demo},
};

/// Tile-grid raycaster demo.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Cells per side of the generated map.
    #[arg(long, default_value_t = 32)]
    size: i32,
    /// Map generator seed.
    #[arg(long, default_value_t = 1)]
    seed: u64,
    #[arg(long, default_value_t = 480)]
    width: usize,
    #[arg(long, default_value_t = 300)]
    height: usize,
    /// Window scale factor (1, 2 or 4).
    #[arg(long, default_value_t = 2)]
    scale: u8,
    /// Number of lights to place.
    #[arg(long, default_value_t = 6)]
    lights: usize,
    /// Render on the main thread instead of the frame worker.
    #[arg(long)]
    inline: bool,
}

/// Where finished frames come from.
enum Frames {
    Worker(tilecast::worker::FrameWorker),
    Inline(Software),
}

/// Latest frame plus the numbers the stats line needs.
struct Presented {
    rgba: Vec<u8>,
    rays_cast: u32,
    render_time: Duration,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("tilecast=info".parse()?))
        .init();

    let args = Args::parse();
    let cfg = EngineConfig::default();
    let (w, h) = (args.width.max(16), args.height.max(16));

    let level = demo::generate(
        &DemoOptions {
            size: args.size,
            seed: args.seed,
            lights: args.lights,
            ..DemoOptions::default()
        },
        &cfg,
    )?;
    let bank = Arc::new(level.bank);
    let sprites = level.sprites;
    let mut runner = TicRunner::new(Game::new(level.grid, level.spawn, cfg.clone()));

    let mut frames = if args.inline {
        Frames::Inline(Software::default())
    } else {
        let mut worker = tilecast::worker::FrameWorker::spawn()?;
        worker.init(runner.game().grid(), bank.clone(), sprites.clone(), (w, h), &cfg)?;
        Frames::Worker(worker)
    };

    let scale = match args.scale {
        1 => Scale::X1,
        4 => Scale::X4,
        _ => Scale::X2,
    };
    let mut win = Window::new(
        "tilecast",
        w,
        h,
        WindowOptions {
            scale,
            ..WindowOptions::default()
        },
    )?;
    win.set_target_fps(60);

    let screen = Screen::new(w, h);
    let projection = Projection::for_screen(&screen, Projection::DEFAULT_LENGTH);
    let mut sampler = AdaptiveSampler::new(&cfg);
    let mut show_map = false;
    let mut fb = vec![0u32; w * h];

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_rays = 0u64;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        if win.is_key_pressed(Key::M, KeyRepeat::No) {
            show_map = !show_map;
        }
        let cmd = read_input(&win, w, h);
        runner.pump(&cmd);
        let deltas = runner.game_mut().take_deltas();
        let game = runner.game();

        let fresh = match &mut frames {
            Frames::Worker(worker) => {
                worker.queue_deltas(deltas);
                worker
                    .exchange(
                        &mut sampler,
                        *game.camera(),
                        projection,
                        game.push_block().copied(),
                    )
                    .map(|out| Presented {
                        rgba: out.pixels,
                        rays_cast: out.rays_cast,
                        render_time: out.render_time,
                    })
            }
            Frames::Inline(sw) => {
                let t0 = Instant::now();
                let mut scene = Scene::new(
                    game.grid(),
                    &bank,
                    &sprites,
                    game.camera(),
                    projection,
                    &cfg,
                );
                scene.push_block = game.push_block();
                scene.row_step = sampler.row_step();
                let mut rgba = Vec::new();
                sw.draw_frame(w, h, &scene, |px, _, _| rgba.extend_from_slice(px));
                sampler.observe(sw.rays_cast());
                Some(Presented {
                    rgba,
                    rays_cast: sw.rays_cast(),
                    render_time: t0.elapsed(),
                })
            }
        };

        match fresh {
            Some(mut frame) => {
                acc_time += frame.render_time;
                acc_rays += u64::from(frame.rays_cast);
                acc_frames += 1;

                if show_map {
                    draw_minimap(
                        &mut frame.rgba,
                        w,
                        h,
                        game.grid(),
                        game.camera(),
                        game.push_block(),
                        &MinimapStyle::default(),
                    );
                }
                for (dst, px) in fb.iter_mut().zip(frame.rgba.chunks_exact(4)) {
                    *dst = u32::from_be_bytes([0, px[0], px[1], px[2]]);
                }
                win.update_with_buffer(&fb, w, h)?;
            }
            None => win.update(),
        }

        if last_print.elapsed() >= Duration::from_secs(3) && acc_frames > 0 {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            let fps = acc_frames as f64 / last_print.elapsed().as_secs_f64();
            info!(
                avg_render_ms = avg_ms,
                fps,
                rays_per_frame = acc_rays / acc_frames as u64,
                row_step = sampler.row_step(),
                "frame stats"
            );
            acc_time = Duration::ZERO;
            acc_rays = 0;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }

    if let Frames::Worker(worker) = frames {
        worker.shutdown();
    }
    Ok(())
}

/// Keyboard state plus the mouse position mapped to [-1, 1] around the
/// window centre.
fn read_input(win: &Window, w: usize, h: usize) -> InputCmd {
    let mut held = Buttons::empty();
    let bind = [
        (Key::W, Buttons::FORWARD),
        (Key::Up, Buttons::FORWARD),
        (Key::S, Buttons::BACK),
        (Key::Down, Buttons::BACK),
        (Key::Left, Buttons::TURN_LEFT),
        (Key::Right, Buttons::TURN_RIGHT),
        (Key::A, Buttons::STRAFE_LEFT),
        (Key::D, Buttons::STRAFE_RIGHT),
    ];
    for (key, button) in bind {
        if win.is_key_down(key) {
            held |= button;
        }
    }
    /* edge-triggered */
    if win.is_key_pressed(Key::Space, KeyRepeat::No) {
        held |= Buttons::USE;
    }

    let pointer = win
        .get_mouse_pos(minifb::MouseMode::Clamp)
        .map(|(x, y)| {
            glam::Vec2::new(
                (x / w as f32) * 2.0 - 1.0,
                (y / h as f32) * 2.0 - 1.0,
            )
        })
        .unwrap_or(glam::Vec2::ZERO);

    InputCmd { held, pointer }
}
