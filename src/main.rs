mod catalog;
mod config;
mod controller;
mod earth_mesh;
mod error;
mod time;
mod trajectory;
mod ui;

use clap::Parser;
use log::error;
use crate::catalog::ElementCatalog;
use crate::config::{Args, OrbitConfig};
use crate::controller::OrbitViewController;
use crate::ui::Window;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = OrbitConfig::from_args(&args);

    let catalog = match args.tle_file {
        Some(ref path) => ElementCatalog::load(path),
        None => ElementCatalog::fetch(&config.catalog_url),
    };

    // Without a catalog the window still opens and shows why it is empty
    let (catalog, startup_error) = match catalog {
        Ok(catalog) => (catalog, None),
        Err(startup_error) => {
            error!("{startup_error}");
            (ElementCatalog::empty(), Some(startup_error))
        }
    };

    let controller = OrbitViewController::new(catalog, &config);
    let mut window = Window::init(controller, config.dropdown_limit, startup_error);
    window.run();
}
