use std::{
    fs::File,
    path::PathBuf,
    time::{Duration, Instant},
};

use chip8_vm::{
    read_image, Color, Surface, VmBuilder, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR,
    SCREEN_HEIGHT, SCREEN_WIDTH,
};
use clap::Parser;
use sdl2::{
    event::Event,
    keyboard::Keycode,
    pixels::PixelFormatEnum,
};

/// CHIP-8 Emulator
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Filepath to Chip-8 ROM file that will be executed
    #[clap(index = 1)]
    rom: PathBuf,

    /// Filepath to a replacement 80-byte font file
    #[clap(long)]
    font: Option<PathBuf>,

    /// Background Color as HEX 0xAABBFF [default: 0x000000]
    #[clap(long)]
    background: Option<Color>,

    /// Foreground Color as HEX 0xAABBFF [default: 0xFFFFFF]
    #[clap(long)]
    foreground: Option<Color>,

    /// Display scaling factor
    #[clap(short, long, default_value_t = 10)]
    scale: u32,

    /// Instructions per second
    #[clap(short, long, default_value_t = 700)]
    ips: u32,

    /// PRNG seed
    #[clap(long)]
    seed: Option<u64>,
}

/// Map the 4x4 block 1234/QWER/ASDF/ZXCV onto the hexadecimal keypad
/// 1-2-3-C / 4-5-6-D / 7-8-9-E / A-0-B-F.
fn keypad_index(keycode: Keycode) -> Option<usize> {
    match keycode {
        Keycode::Num1 => Some(0x1),
        Keycode::Num2 => Some(0x2),
        Keycode::Num3 => Some(0x3),
        Keycode::Num4 => Some(0xC),
        Keycode::Q => Some(0x4),
        Keycode::W => Some(0x5),
        Keycode::E => Some(0x6),
        Keycode::R => Some(0xD),
        Keycode::A => Some(0x7),
        Keycode::S => Some(0x8),
        Keycode::D => Some(0x9),
        Keycode::F => Some(0xE),
        Keycode::Z => Some(0xA),
        Keycode::X => Some(0x0),
        Keycode::C => Some(0xB),
        Keycode::V => Some(0xF),
        _ => None,
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.scale == 0 || args.scale > 100 {
        panic!("Display scaling factor must be between [1-100]")
    }

    if args.ips == 0 || args.ips > 1_000_000 {
        panic!("Instructions per second [1-1000000]")
    }

    // Read the ROM through its declared file size so a truncated read is
    // reported as such rather than silently loading a partial program.
    let rom_file = File::open(&args.rom).expect("Failed to open ROM file");
    let rom_len = rom_file
        .metadata()
        .expect("Failed to stat ROM file")
        .len() as usize;
    let rom = read_image(rom_file, rom_len).expect("Failed to read ROM file");

    let mut builder = VmBuilder::new().with_image(rom);

    if let Some(font) = args.font {
        let font_data = std::fs::read(font).expect("Failed to read font file");
        let font_data: [u8; 80] = font_data
            .try_into()
            .expect("Font file must be exactly 80 bytes");
        builder = builder.with_font(font_data);
    }

    if let Some(seed) = args.seed {
        builder = builder.with_rng_seed(seed);
    }

    let mut vm = builder.build().expect("Failed to load ROM");

    let foreground = args.foreground.unwrap_or(DEFAULT_FOREGROUND_COLOR);
    let background = args.background.unwrap_or(DEFAULT_BACKGROUND_COLOR);
    let mut surface = Surface::new(foreground, background);

    let sdl_context = sdl2::init().unwrap();
    let video_subsystem = sdl_context.video().unwrap();

    let window = video_subsystem
        .window(
            "chip8-sdl",
            SCREEN_WIDTH as u32 * args.scale,
            SCREEN_HEIGHT as u32 * args.scale,
        )
        .position_centered()
        .build()
        .unwrap();

    let mut canvas = window.into_canvas().build().unwrap();
    canvas.clear();
    canvas.present();

    let texture_creator = canvas.texture_creator();
    let mut texture = texture_creator
        .create_texture_streaming(
            PixelFormatEnum::RGBX8888,
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
        )
        .unwrap();

    let mut event_pump = sdl_context.event_pump().unwrap();

    let mut keys = [false; 16];

    let delta_update = Duration::new(0, 1_000_000_000u32 / args.ips);
    let delta_timer = Duration::new(0, 1_000_000_000u32 / 60);
    let mut next_update = Instant::now();
    let mut next_timer = next_update;

    'running: loop {
        // Wait until next update
        let now = Instant::now();
        if let Some(delay) = next_update.checked_duration_since(now) {
            std::thread::sleep(delay);
        }
        next_update += delta_update;

        // Step the 60 Hz hardware timers independently of instruction
        // throughput.
        while Instant::now() >= next_timer {
            vm.step_timers();
            next_timer += delta_timer;
        }

        // Process events
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(key) = keypad_index(keycode) {
                        keys[key] = true;
                    }
                }
                Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => {
                    if let Some(key) = keypad_index(keycode) {
                        keys[key] = false;
                    }
                }
                _ => {}
            }
        }

        // Execute one CHIP-8 instruction; a fault ends the run but not the
        // process state, so it is logged and the window closes cleanly.
        if let Err(fault) = vm.step(&keys) {
            log::error!("emulation halted: {}", fault);
            break 'running;
        }

        // If the framebuffer changed then push it through the texture onto
        // the canvas.
        if vm.take_display_dirty() {
            surface.update(vm.framebuffer());
            texture
                .update(None, surface.bytes(), surface.pitch())
                .unwrap();
            canvas.copy(&texture, None, None).unwrap();
            canvas.present();
        }
    }
}
