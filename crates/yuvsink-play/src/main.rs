use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use yuvsink_engine::coords::Crop;
use yuvsink_engine::format::{Frame, PlaneLayout, VideoFormat};
use yuvsink_engine::logging::{init_logging, LoggingConfig};
use yuvsink_engine::{Sink, SinkConfig};

/// Plays moving colour bars through the video sink.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = 720)]
    width: u32,

    #[arg(long, default_value_t = 576)]
    height: u32,

    /// Number of frames to play.
    #[arg(long, default_value_t = 250)]
    frames: u32,

    #[arg(long, default_value_t = 25)]
    fps: u32,

    #[arg(long, default_value_t = 0)]
    crop_top: u32,

    #[arg(long, default_value_t = 0)]
    crop_bottom: u32,

    #[arg(long, default_value_t = 0)]
    crop_left: u32,

    #[arg(long, default_value_t = 0)]
    crop_right: u32,

    /// Leading frames to discard.
    #[arg(long, default_value_t = 0)]
    drop_first: u32,

    /// Log every frame's render time.
    #[arg(short, long)]
    verbose: bool,

    /// Logger filter, e.g. "yuvsink_engine=debug".
    #[arg(long)]
    log: Option<String>,
}

/// 75% bars as limited-range BT.601 (Y, U, V).
const BARS: [(u8, u8, u8); 7] = [
    (180, 128, 128),
    (162, 44, 142),
    (131, 156, 44),
    (112, 72, 58),
    (84, 184, 198),
    (65, 100, 212),
    (35, 212, 114),
];

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    let config = SinkConfig {
        crop: Crop::new(args.crop_top, args.crop_bottom, args.crop_left, args.crop_right),
        drop_first: args.drop_first,
        verbose: args.verbose,
        ..SinkConfig::default()
    };

    let mut sink = Sink::new(config);
    sink.on_window_handle(|handle| log::info!("drawing into window {:?}", handle.raw));

    let info = sink
        .set_format(&VideoFormat::i420(args.width, args.height))
        .context("unsupported video size")?;
    log::info!(
        "playing {} frames of {}x{} at {} fps (display aspect {}:{})",
        args.frames,
        info.width,
        info.height,
        args.fps,
        info.display_ratio.0,
        info.display_ratio.1
    );

    sink.start();

    let layout = PlaneLayout::i420(info.width, info.height);
    let interval = Duration::from_secs(1) / args.fps.max(1);
    let mut frame = Frame::for_layout(layout);
    let mut deadline = Instant::now();

    for n in 0..args.frames {
        paint_bars(&mut frame, layout, n);

        frame = if n == 0 {
            sink.preroll(frame).context("preroll failed")?
        } else {
            sink.render(frame).with_context(|| format!("frame {n} failed"))?
        };

        deadline += interval;
        if let Some(wait) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
    }

    sink.stop();
    log::info!("done");
    Ok(())
}

/// Fills `frame` with vertical bars scrolled left by `offset` pixels.
fn paint_bars(frame: &mut Frame, layout: PlaneLayout, offset: u32) {
    let luma_len = layout.luma_len();
    let chroma_len = layout.chroma_len();
    let data = frame.as_bytes_mut();
    let (y, chroma) = data.split_at_mut(luma_len);
    let (u, v) = chroma.split_at_mut(chroma_len);

    let bar_of = |x: u32, width: u32| {
        let x = (x + offset) % width;
        BARS[(x as usize * BARS.len()) / width as usize]
    };

    for (row, line) in y.chunks_exact_mut(layout.width as usize).enumerate() {
        // Bottom quarter stays black as a static reference.
        let black = row as u32 >= layout.height * 3 / 4;
        for (x, px) in line.iter_mut().enumerate() {
            *px = if black { 16 } else { bar_of(x as u32, layout.width).0 };
        }
    }

    let rows = u
        .chunks_exact_mut(layout.chroma_width as usize)
        .zip(v.chunks_exact_mut(layout.chroma_width as usize));
    for (row, (u_line, v_line)) in rows.enumerate() {
        let black = row as u32 >= layout.chroma_height * 3 / 4;
        for x in 0..layout.chroma_width as usize {
            let (_, cb, cr) = if black {
                (16, 128, 128)
            } else {
                bar_of(x as u32 * 2, layout.width)
            };
            u_line[x] = cb;
            v_line[x] = cr;
        }
    }
}
