pub mod engine;
pub mod math;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod time;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
