use std::error::Error;
use std::path::Path;
use std::process::ExitCode;

use log::{error, info};
use qrcache::{FileLoader, QRHelper};

const USAGE: &str = "usage:
  qrcache encode <text> <size> <out.png>
  qrcache encode-uri <uri> <size> <out.png>
  qrcache decode <image>";

fn main() -> ExitCode {
    // Default filter is "info" if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let helper = QRHelper::builder().build(FileLoader);

    match args {
        [cmd, payload, size, out] if cmd == "encode" || cmd == "encode-uri" => {
            let size: u32 = size.parse()?;
            let rgba = if cmd == "encode" {
                helper.encode_text(payload, size).map(|img| img.to_rgba_image())
            } else {
                helper.encode_uri_sized(payload, size).map(|img| img.to_rgba_image())
            }
            .ok_or("encoding failed")?;
            rgba.save(out)?;
            info!("Wrote {}x{} symbol to {out}", rgba.width(), rgba.height());
            Ok(())
        }
        [cmd, path] if cmd == "decode" => {
            let text = helper.decode(Path::new(path)).ok_or("no QR code found")?;
            println!("{text}");
            Ok(())
        }
        _ => Err("invalid arguments".into()),
    }
}
