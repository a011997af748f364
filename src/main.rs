use gtk::prelude::*;
use relm4::prelude::*;
use tracing_subscriber::EnvFilter;

use hukum_chat::app::App;
use hukum_chat::config::{ClientConfig, APP_ID};

const STYLE: &str = include_str!("ui/style.css");

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (client_config, errors) = ClientConfig::from_env_lenient();
    for e in &errors {
        tracing::error!("{}; keeping the default for this setting", e);
    }
    if !errors.is_empty() {
        tracing::warn!("Continuing with backend {}", client_config.backend_url);
    }

    let app = adw::Application::builder().application_id(APP_ID).build();

    app.connect_startup(|_| {
        gtk::Window::set_default_icon_name(APP_ID);
        relm4::set_global_css(STYLE);
    });

    RelmApp::from_app(app).run_async::<App>(client_config);
}
