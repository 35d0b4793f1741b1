//! clockmod CLI: headless runs and offline traces.
//!
//! Usage:
//!   cm-cli [--bpm N] [--swing N] [--seed N] [-v...]
//!          [--channel N [--kind K] [--clock L] [--gate L] [--delay L]
//!                       [--steps N] [--length N] [--prob N]]...
//!          [--trace TICKS | --run SECONDS]
//!
//! Kinds: gate, eucl, trig, sawr, sawf, sine, volt.
//! Lengths: 1/256 ... 1/1, dotted as 1/8., multiples as 2/1 ... 16/1.

use std::io::Write;
use std::time::{Duration, Instant};
use std::{env, process};

use cm_ir::{BAR_TICKS, NUM_CHANNELS, PPQN};
use cm_master::{kind_with_tag, ChannelKind, ClockLength, Controller, KindTag, ModuleConfig};
use tracing::Level;

const USAGE: &str = "Usage: cm-cli [--bpm N] [--swing N] [--seed N] [-v] \
[--channel N [--kind K] [--clock L] [--gate L] [--delay L] [--steps N] [--length N] [--prob N]]... \
[--trace TICKS | --run SECONDS]";

enum Mode {
    Show,
    Trace(u32),
    Run(f64),
}

struct Options {
    config: ModuleConfig,
    mode: Mode,
    verbosity: u8,
}

fn parse_num<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("{}: not a number: {}", flag, value))
}

fn parse_length(flag: &str, value: Option<&String>) -> Result<ClockLength, String> {
    let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
    ClockLength::from_label(value).ok_or_else(|| format!("{}: unknown length {}", flag, value))
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut seed = cm_master::DEFAULT_SEED;
    if let Some(i) = args.iter().position(|a| a == "--seed") {
        seed = parse_num("--seed", args.get(i + 1))?;
    }
    let mut config = ModuleConfig::with_seed(seed);
    let mut mode = Mode::Show;
    let mut verbosity = 0u8;
    let mut channel: Option<usize> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        let current = |channel: Option<usize>| channel.ok_or_else(|| format!("{} must follow --channel", flag));
        match flag {
            "-v" | "-vv" | "-vvv" => {
                verbosity += (flag.len() - 1) as u8;
                i += 1;
                continue;
            }
            "--seed" => {}
            "--bpm" => config.tempo = cm_ir::clamp_bpm(parse_num(flag, value)?),
            "--swing" => config.swing = cm_ir::clamp_swing(parse_num(flag, value)?),
            "--trace" => mode = Mode::Trace(parse_num(flag, value)?),
            "--run" => mode = Mode::Run(parse_num(flag, value)?),
            "--channel" => {
                let n: usize = parse_num(flag, value)?;
                if n >= NUM_CHANNELS {
                    return Err(format!("--channel: expected 0-{}, got {}", NUM_CHANNELS - 1, n));
                }
                channel = Some(n);
            }
            "--kind" => {
                let ch = current(channel)?;
                let label = value.ok_or("--kind needs a value")?;
                let tag = KindTag::from_label(label).ok_or_else(|| format!("--kind: unknown kind {}", label))?;
                config.channels[ch].kind = kind_with_tag(tag);
            }
            "--clock" => config.channels[current(channel)?].clock = parse_length(flag, value)?,
            "--gate" => config.channels[current(channel)?].gate = parse_length(flag, value)?,
            "--delay" => config.channels[current(channel)?].start_delay = parse_length(flag, value)?,
            "--steps" | "--length" | "--prob" => {
                let ch = current(channel)?;
                let n: u8 = parse_num(flag, value)?;
                config.channels[ch].kind = with_param(config.channels[ch].kind, flag, n)?;
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 2;
    }

    Ok(Options { config: config.normalized(), mode, verbosity })
}

fn with_param(kind: ChannelKind, flag: &str, n: u8) -> Result<ChannelKind, String> {
    let kind = match (kind, flag) {
        (ChannelKind::Euclidean { length, .. }, "--steps") => ChannelKind::Euclidean { steps: n, length },
        (ChannelKind::Euclidean { steps, .. }, "--length") => ChannelKind::Euclidean { steps, length: n },
        // a changed length or probability needs a fresh roll
        (ChannelKind::RandomTrigger { probability, .. }, "--length") => {
            ChannelKind::RandomTrigger { probability, length: n, pattern: None }
        }
        (ChannelKind::RandomTrigger { length, .. }, "--prob") => {
            ChannelKind::RandomTrigger { probability: n, length, pattern: None }
        }
        (ChannelKind::Voltage { .. }, "--length") => ChannelKind::Voltage { length: n, levels: None },
        (kind, flag) => return Err(format!("{} does not apply to {}", flag, kind.tag().long_label())),
    };
    Ok(kind)
}

fn print_config(ctrl: &mut Controller) {
    let config = ctrl.config().clone();
    println!("Tempo:  {} BPM", config.tempo);
    println!("Swing:  {}", config.swing);
    println!("Seed:   {:#x}", config.seed);
    println!();
    println!("Ch  Type       Clock  Gate   Delay  Params");
    for (i, ch) in config.channels.iter().enumerate() {
        let params = match ch.kind {
            ChannelKind::Euclidean { steps, length } => format!("{} of {}", steps, length),
            ChannelKind::RandomTrigger { probability, length, pattern } => {
                let steps = pattern.map(|p| p.render(length)).unwrap_or_default();
                format!("{}% len {} {}", probability, length, steps)
            }
            ChannelKind::Voltage { length, levels } => {
                format!("len {} {:08x}", length, levels.map_or(0, |l| l.word()))
            }
            _ => String::new(),
        };
        println!(
            "{}   {:<10} {:<6} {:<6} {:<6} {}",
            i,
            ch.tag().long_label(),
            ch.clock.long_label(),
            ch.gate.long_label(),
            ch.start_delay.long_label(),
            params
        );
    }
    println!();
}

fn print_trace(ctrl: &mut Controller, ticks: u32) -> Result<(), cm_master::ControlError> {
    let trace = ctrl.render_trace(ticks)?;
    println!("Rendered {} ticks, {} level changes", ticks, trace.len());
    for change in &trace {
        let bar = change.tick / BAR_TICKS;
        let beat = (change.tick % BAR_TICKS) / PPQN;
        println!(
            "{:>6}  {:>3}.{}  ch{}  gate {}  pwm {:>3}",
            change.tick,
            bar + 1,
            beat + 1,
            change.channel,
            if change.gate { "on " } else { "off" },
            change.pwm
        );
    }
    Ok(())
}

fn run_live(ctrl: &mut Controller, seconds: f64) -> Result<(), cm_master::ControlError> {
    ctrl.power_on()?;
    ctrl.start_transport();
    println!("Running for {:.1} s...", seconds);

    let view = ctrl.view();
    let end = Instant::now() + Duration::from_secs_f64(seconds.max(0.0));
    while Instant::now() < end {
        let tick = view.tick();
        let gates: String = view
            .levels()
            .iter()
            .map(|l| if l.gate { '|' } else { '.' })
            .collect();
        let pwm: Vec<String> = view.levels()[4..].iter().map(|l| format!("{:>3}", l.pwm)).collect();
        print!(
            "\rBar {:>2} Beat {} | {} | {}",
            tick / BAR_TICKS + 1,
            (tick % BAR_TICKS) / PPQN + 1,
            gates,
            pwm.join(" ")
        );
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(20));
    }

    ctrl.stop_transport();
    ctrl.shutdown()?;
    println!("\rDone.{:40}", "");
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("{}", e);
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let level = match options.verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut ctrl = Controller::new(options.config);
    print_config(&mut ctrl);

    let result = match options.mode {
        Mode::Show => Ok(()),
        Mode::Trace(ticks) => print_trace(&mut ctrl, ticks),
        Mode::Run(seconds) => run_live(&mut ctrl, seconds),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}
