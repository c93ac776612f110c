//! Loads a model configuration and its fragments from `./assets` and prints
//! what the engine made of it.
//!
//! ```text
//! cargo run --example inspect -- configs/sideboard.json
//! ```

use configurator_ngin::{PhysicalSize, Viewer, config::ModelConfig, preset::DoorVariant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let file_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "configs/sideboard.json".to_string());

    let config = ModelConfig::load(&file_name).await?;
    let mut viewer = Viewer::new(PhysicalSize::new(1280, 720));
    let request = viewer.switch_model(config);
    let loaded = request.load().await;
    viewer.finish_model_load(loaded);

    println!("{} ({} objects)", viewer.config().name, viewer.object_names().len());
    for name in viewer.object_names() {
        let interactive = if viewer.interactions().is_registered(name) {
            " [interactive]"
        } else {
            ""
        };
        let visible = viewer.registry().is_visible(name).unwrap_or(false);
        println!("  {name}{interactive}{}", if visible { "" } else { " (hidden)" });
    }

    let presets: Vec<(u32, u32)> = viewer
        .config()
        .presets
        .door_selections
        .iter()
        .flat_map(|(count, positions)| positions.keys().map(move |position| (*count, *position)))
        .collect();
    for (count, position) in presets {
        if let Some(resolution) = viewer.resolve_preset(count, position, DoorVariant::Solid) {
            println!(
                "preset [{count}][{position}]: show {:?}",
                resolution.to_show.iter().collect::<Vec<_>>()
            );
        }
    }

    for error in viewer.take_errors() {
        println!("! {error}");
    }
    Ok(())
}
