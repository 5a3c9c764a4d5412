use memimage::{Image, ImageBuilder, Unit};

/// The per-file table the tool prints after a build. This is the product of
/// the run (stdout), not diagnostics.
pub fn report(builder: &ImageBuilder) {
    let Ok(image) = Image::new(builder.bytes()) else {
        return;
    };
    let mse = builder.mse();

    let mut total_compressed = 0u64;
    let mut total_uncompressed = 0u64;

    for dir in image.dirs() {
        println!("Dir: {}", dir.name_str());
        let mut dir_total = 0u64;

        for (j, unit) in image.units(&dir).enumerate() {
            match unit {
                Unit::Config(c) => {
                    println!(
                        "  {:>8} font={} bc={:02x}{:02x}{:02x} ic={:02x}{:02x}{:02x}",
                        c.name_str(),
                        c.font,
                        c.bc[0],
                        c.bc[1],
                        c.bc[2],
                        c.ic[0],
                        c.ic[1],
                        c.ic[2]
                    );
                }
                Unit::File(f) => {
                    let index = dir.first_file as usize + j;
                    let uncompressed = f.n_samples() as u64 * 2;
                    println!(
                        "  {:>8} at {:>8} size={:>7} ({:>4}k) table={} pred={} ratio={:>5.1} mse={:>8}",
                        f.name_str(),
                        f.offset,
                        f.size,
                        f.size / 1024,
                        f.table,
                        f.predictor,
                        100.0 * f.size as f32 / uncompressed as f32,
                        mse[index]
                    );
                    total_compressed += f.size as u64;
                    total_uncompressed += uncompressed;
                    dir_total += f.size as u64;
                }
            }
        }
        if dir_total > 0 {
            println!("  Dir total={}k", dir_total / 1024);
        }
    }

    if !image.description().is_empty() {
        println!("Description: {}", image.description());
    }
    if total_uncompressed > 0 {
        println!(
            "Overall ratio={:5.2}",
            total_compressed as f32 / total_uncompressed as f32
        );
    }
    println!(
        "Image size={} bytes, {}k (unit table {} of {} file slots)",
        builder.bytes().len(),
        builder.bytes().len() / 1024,
        image.dirs().map(|d| d.file_count).sum::<u32>(),
        memimage::NUM_FILES
    );
}
