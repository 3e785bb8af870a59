use log::info;
use yew::prelude::*;

use petrascan_frontend::config;

mod pages {
    pub mod landing;
}

use pages::landing::Landing;

#[function_component]
fn App() -> Html {
    html! {
        <Landing />
    }
}

fn main() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    console_log::init_with_level(config::log_level()).expect("error initializing log");

    info!("🔬 PetraScan");
    info!("Biosensor Multiparameter untuk Deteksi Dini Mastitis");
    info!("© 2025 PetraScan. All rights reserved.");
    yew::Renderer::<App>::new().render();
}
