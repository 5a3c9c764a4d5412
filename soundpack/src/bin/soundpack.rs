use {
    anyhow::{bail, Result},
    camino::Utf8PathBuf,
    s4adpcm::Codec,
    soundpack::{pack_dirs, report, PackOptions},
};

const USAGE: &str = "\
Usage:
    soundpack <dir>... [options]

Each input directory becomes one image directory; every .wav inside it is
compressed and appended. Options:
    -o <path>         output image (default memimage.bin)
    -t, --text        also write the hex text form next to the image
    -8, --bits8       use the 8-bit codec instead of 4-bit
    --config <file>   palette config file (8 'font bc ic' lines)
    --desc <text>     image description string
    --loop <stem>     rotate the named clip to its loop point (repeatable)
    --clips <dir>     also emit standalone clip blobs
    --post <dir>      also decode clips back to .wav for auditioning
    -v                debug logging
";

fn log_init(filter: log::LevelFilter) {
    use simplelog::*;
    let _ = TermLogger::init(
        filter,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn main() -> Result<()> {
    let mut dirs: Vec<Utf8PathBuf> = Vec::new();
    let mut out = Utf8PathBuf::from("memimage.bin");
    let mut text = false;
    let mut config: Option<Utf8PathBuf> = None;
    let mut verbose = false;
    let mut opts = PackOptions::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| anyhow::anyhow!("{flag} needs a value"))
        };
        match arg.as_str() {
            "-o" => out = value("-o")?.into(),
            "-t" | "--text" => text = true,
            "-8" | "--bits8" => opts.codec = Codec::Bit8,
            "--config" => config = Some(value("--config")?.into()),
            "--desc" => opts.description = Some(value("--desc")?),
            "--loop" => opts.loop_names.push(value("--loop")?),
            "--clips" => opts.clips_dir = Some(value("--clips")?.into()),
            "--post" => opts.post_dir = Some(value("--post")?.into()),
            "-v" => verbose = true,
            flag if flag.starts_with('-') => bail!("unknown option {flag}\n{USAGE}"),
            dir => dirs.push(dir.into()),
        }
    }

    log_init(if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    if dirs.is_empty() {
        eprint!("{USAGE}");
        bail!("no input directories");
    }

    let image = pack_dirs(&dirs, config.as_deref(), &opts)?;
    report(&image);

    let mut file = std::fs::File::create(out.as_std_path())?;
    image.write(&mut file)?;
    log::info!("wrote {out} ({} bytes)", image.bytes().len());

    if text {
        let text_path = out.with_extension("txt");
        let mut file = std::fs::File::create(text_path.as_std_path())?;
        image.write_text(&mut file)?;
        log::info!("wrote {text_path}");
    }
    Ok(())
}
