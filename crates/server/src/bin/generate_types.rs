//! Run with: cargo run --package server --bin generate-types --features typescript

use std::fs;
use std::path::Path;

fn main() {
    println!("Generating TypeScript types...");

    let out_dir = Path::new("frontend/src/types/generated");

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "typescript")]
    {
        use ts_rs::TS;

        let mut exported = Vec::new();

        macro_rules! export {
            ($($ty:path),* $(,)?) => {
                $(
                    if let Err(e) = <$ty>::export_all_to(out_dir) {
                        eprintln!("Failed to export {}: {}", stringify!($ty), e);
                        std::process::exit(1);
                    }
                    exported.push(<$ty>::name());
                )*
            };
        }

        export!(
            planwise_core::Questionnaire,
            planwise_core::ProjectData,
            planwise_core::ProjectUpdate,
            planwise_core::ProjectSummary,
            planwise_core::StageView,
            planwise_core::OrchestrationStatus,
            planwise_core::ProjectDocumentation,
            events::EventEnvelope,
            orchestrator::OrchestrationReport,
        );

        println!("Types exported to {}", out_dir.display());

        generate_index(out_dir, &exported);
    }

    #[cfg(not(feature = "typescript"))]
    {
        eprintln!("Error: typescript feature is not enabled");
        eprintln!("Run with: cargo run --package server --bin generate-types --features typescript");
        std::process::exit(1);
    }
}

#[cfg(feature = "typescript")]
fn generate_index(out_dir: &Path, names: &[String]) {
    let mut index = String::from(
        "// Auto-generated - regenerate with: cargo run --package server --bin generate-types --features typescript\n\n",
    );
    for name in names {
        index.push_str(&format!("export * from './{}';\n", name));
    }

    let index_path = out_dir.join("index.ts");
    if let Err(e) = fs::write(&index_path, index) {
        eprintln!("Failed to write {}: {}", index_path.display(), e);
        std::process::exit(1);
    }

    println!("Generated {}", index_path.display());
}
