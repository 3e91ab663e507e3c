use astro_journal::app::App;
use astro_journal::horoscope::{HoroscopeProvider, HttpProvider, SimulatedProvider};
use astro_journal::storage::JsonFileStorage;
use astro_journal::{logging, ui, AppState, Config};
use color_eyre::Result;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::load()?;
    let _log_guard = logging::init(&config.log_dir)?;
    info!(data_file = %config.data_file.display(), "starting astro journal");

    let state = AppState::restore(Box::new(JsonFileStorage::new(config.data_file.clone())));

    let provider: Arc<dyn HoroscopeProvider> = match &config.horoscope_url {
        Some(url) => {
            info!(%url, "using remote horoscope service");
            Arc::new(HttpProvider::new(url.clone(), config.fetch_timeout))
        }
        None => Arc::new(SimulatedProvider::new()),
    };

    let mut app = App::new(state, provider, config.auto_save_interval);
    ui::run(&mut app)?;

    info!("journal closed");
    Ok(())
}
