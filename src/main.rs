use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use clap::Parser;

use chip8::display::MonoTermDisplay;
use chip8::environment::{EnvConfig, Environment};
use chip8::input::StdinInput;
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::{Chip8Interpreter, Quirks};

#[derive(Parser, Debug)]
#[command(
    name = "chip8",
    about = "Run a CHIP-8 program in the terminal. Esc quits.",
    after_help = "Log output (RUST_LOG=info etc.) goes to stderr and will garble the \
                  screen unless redirected, e.g. `RUST_LOG=warn chip8 game.ch8 2>chip8.log`. \
                  See also --log-file."
)]
struct Args {
    /// ROM image, loaded at 0x200
    #[arg(value_name = "PATH")]
    rom: PathBuf,

    /// instructions executed per 60Hz frame
    #[arg(long, default_value_t = 12)]
    cycles_per_frame: usize,

    /// stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// 8xy6/8xyE shift Vy into Vx (COSMAC VIP behaviour)
    #[arg(long)]
    shift_quirk: bool,

    /// Fx55/Fx65 advance I past the registers transferred
    #[arg(long)]
    load_store_quirk: bool,

    /// no beeping
    #[arg(long)]
    mute: bool,

    /// write log output here instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // stderr shares the terminal with the display
    let mut logger = env_logger::Builder::from_default_env();
    if let Some(path) = &args.log_file {
        logger.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    logger.init();

    let quirks = Quirks {
        shift_uses_vy: args.shift_quirk,
        load_store_increments_index: args.load_store_quirk,
    };
    let mut interpreter = match args.seed {
        Some(seed) => Chip8Interpreter::with_seed(seed),
        None => Chip8Interpreter::new(),
    }
    .with_quirks(quirks);

    // load a program
    let mut f = File::open(&args.rom)?;
    interpreter.load_from(&mut f)?;

    // initialise
    let mut display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new()?;
    let mut sound: Box<dyn Sound> = if args.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };
    let config = EnvConfig {
        cycles_per_frame: args.cycles_per_frame,
        ..EnvConfig::default()
    };

    let mut env = Environment::new(interpreter, &mut display, &mut input, &mut *sound, config);
    let result = env.main_loop(args.frames);
    drop(env);
    drop(input);

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    result.map(|frames| log::info!("ran {} frames", frames))
}
