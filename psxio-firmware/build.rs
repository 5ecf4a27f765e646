//! Build script for psxio-firmware
//!
//! - Links the defmt section layout
//! - Validates console.toml at compile time
//! - Generates the configuration constants the firmware includes

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use psxio_core::config::{FrontendConfig, VideoMode};

/// Framebuffers sit side by side in 1024-halfword VRAM
const MAX_FRAMEBUFFER_WIDTH: u16 = 512;
const MAX_FRAMEBUFFER_HEIGHT: u16 = 512;

fn main() {
    setup_linker();
    let config = load_config();
    validate_config(&config);
    generate_config(&config);
}

/// Add the defmt linker script
fn setup_linker() {
    println!("cargo:rustc-link-arg=-Tdefmt.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and deserialize console.toml
fn load_config() -> FrontendConfig {
    // Re-run if console.toml changes
    println!("cargo:rerun-if-changed=console.toml");

    let config_path = Path::new("console.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: console.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a console.toml configuration file.        ║\n\
            ║  Please create one in the psxio-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read console.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid console.toml                                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fail the build with every problem found in one section
fn report(section: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid {:<48} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        format!("{} configuration", section),
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_config(config: &FrontendConfig) {
    validate_game_id(config);
    validate_bus(config);
    validate_sio(config);
    validate_video(config);

    println!("cargo:warning=console.toml validated successfully");
}

fn validate_game_id(config: &FrontendConfig) {
    let mut errors = Vec::new();

    if !config.game_id.chars().all(|c| c.is_ascii_graphic()) {
        errors.push("game_id must be printable ASCII without spaces".to_string());
    }

    report("game_id", &errors);
}

fn validate_bus(config: &FrontendConfig) {
    let bus = &config.bus;
    let mut errors = Vec::new();

    if bus.dtr_delay_us == 0 {
        errors.push("[bus] dtr_delay_us must be non-zero".to_string());
    }
    if bus.ack_timeout_us == 0 {
        errors.push("[bus] ack_timeout_us must be non-zero".to_string());
    }
    if bus.ack_poll_step_us == 0 || bus.ack_poll_step_us > bus.ack_timeout_us {
        errors.push("[bus] ack_poll_step_us must be 1..=ack_timeout_us".to_string());
    }
    if bus.byte_delay_us == 0 {
        errors.push("[bus] byte_delay_us must be non-zero".to_string());
    }
    if bus.ack_timeout_us > 10_000 {
        errors.push("[bus] ack_timeout_us above 10ms would stall the frame".to_string());
    }

    report("bus", &errors);
}

fn validate_sio(config: &FrontendConfig) {
    let sio = &config.sio;
    let mut errors = Vec::new();

    if sio.baud_rate == 0 {
        errors.push("[sio] baud_rate must be non-zero".to_string());
    } else {
        let reload = sio.cpu_clock_hz / sio.baud_rate;
        if reload == 0 || reload > u16::MAX as u32 {
            errors.push(format!(
                "[sio] baud_rate {} is out of range for clock {}",
                sio.baud_rate, sio.cpu_clock_hz
            ));
        }
    }

    report("sio", &errors);
}

fn validate_video(config: &FrontendConfig) {
    let video = &config.video;
    let mut errors = Vec::new();

    if video.width == 0 || video.width > MAX_FRAMEBUFFER_WIDTH {
        errors.push(format!("[video] width must be 1-{}", MAX_FRAMEBUFFER_WIDTH));
    }
    if video.width % 16 != 0 {
        errors.push("[video] width must be a multiple of 16".to_string());
    }
    if video.height == 0 || video.height > MAX_FRAMEBUFFER_HEIGHT {
        errors.push(format!("[video] height must be 1-{}", MAX_FRAMEBUFFER_HEIGHT));
    }

    report("video", &errors);
}

/// Write the validated configuration as Rust constants
fn generate_config(config: &FrontendConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let bus = &config.bus;
    let sio = &config.sio;
    let video = &config.video;

    let mode = match video.mode {
        VideoMode::Auto => "VideoMode::Auto",
        VideoMode::Ntsc => "VideoMode::Ntsc",
        VideoMode::Pal => "VideoMode::Pal",
    };
    let clear_color = match video.clear_color {
        Some(c) => format!("Some(Rgb::new({}, {}, {}))", c.r, c.g, c.b),
        None => "None".to_string(),
    };

    let source = format!(
        "// Generated from console.toml by build.rs\n\
        \n\
        pub const GAME_ID: &str = {game_id:?};\n\
        \n\
        pub const BUS_TIMING: BusTiming = BusTiming {{\n\
        \x20   dtr_pre_delay_us: {},\n\
        \x20   dtr_delay_us: {},\n\
        \x20   dtr_post_delay_us: {},\n\
        \x20   ack_timeout_us: {},\n\
        \x20   ack_poll_step_us: {},\n\
        \x20   byte_delay_us: {},\n\
        }};\n\
        \n\
        pub const SIO: SioConfig = SioConfig {{\n\
        \x20   baud_rate: {},\n\
        \x20   cpu_clock_hz: {},\n\
        }};\n\
        \n\
        pub const VIDEO: VideoConfig = VideoConfig {{\n\
        \x20   mode: {mode},\n\
        \x20   width: {},\n\
        \x20   height: {},\n\
        \x20   clear_color: {clear_color},\n\
        }};\n",
        bus.dtr_pre_delay_us,
        bus.dtr_delay_us,
        bus.dtr_post_delay_us,
        bus.ack_timeout_us,
        bus.ack_poll_step_us,
        bus.byte_delay_us,
        sio.baud_rate,
        sio.cpu_clock_hz,
        video.width,
        video.height,
        game_id = config.game_id.as_str(),
    );

    fs::write(out_dir.join("console_config.rs"), source)
        .expect("failed to write generated configuration");
}
