use std::error::Error;
use std::path::Path;

use weldinspect::{inspect_frame, InspectionConfig};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image.png> [config.json]", args[0]);
        std::process::exit(2);
    }

    let config = match args.get(2) {
        Some(p) => InspectionConfig::from_json_file(Path::new(p))?,
        None => InspectionConfig::default(),
    };
    let gray = image::open(&args[1])?.to_luma8();
    let inspection = inspect_frame(&gray, &config);

    println!(
        "{}: {} holes, {} spatter",
        inspection.verdict.status,
        inspection.features.holes.len(),
        inspection.features.spatter_count
    );
    for msg in inspection.verdict.messages() {
        println!("  - {msg}");
    }
    if let Some(s) = inspection.seams {
        println!(
            "seams: top {:.2} bottom {:.2} left {:.2} right {:.2}",
            s.top, s.bottom, s.left, s.right
        );
    }
    Ok(())
}
