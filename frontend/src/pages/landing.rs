use std::rc::Rc;

use log::{info, warn};
use yew::prelude::*;

use petrascan_frontend::config::UiConfig;
use petrascan_frontend::dom::{PresentationTree, WebTree};
use petrascan_frontend::scheduler::BrowserScheduler;
use petrascan_frontend::PageController;

struct Feature {
    icon: &'static str,
    title: &'static str,
    body: &'static str,
}

const FEATURES: [Feature; 3] = [
    Feature {
        icon: "🔬",
        title: "Multiparameter",
        body: "Mengukur pH, konduktivitas, dan suhu susu dalam satu kali uji.",
    },
    Feature {
        icon: "⏱",
        title: "Hasil Cepat",
        body: "Deteksi mastitis subklinis langsung di kandang tanpa menunggu laboratorium.",
    },
    Feature {
        icon: "📱",
        title: "Terhubung",
        body: "Riwayat pemeriksaan setiap sapi tersimpan dan mudah dipantau.",
    },
];

const STATS: [(&str, &str); 3] = [("95%", "Akurasi deteksi"), ("1200", "Sampel diuji"), ("3", "Parameter sekaligus")];

#[function_component(Landing)]
pub fn landing() -> Html {
    // Behaviors are attached once to the rendered markup and detached on unmount.
    use_effect_with_deps(
        move |_| {
            let controller = match WebTree::from_window() {
                Ok(tree) => {
                    let tree: Rc<dyn PresentationTree> = Rc::new(tree);
                    let config = UiConfig::from_tree(tree.as_ref());
                    let controller = PageController::mount(tree, Rc::new(BrowserScheduler::new()), config);
                    info!("✅ PetraScan website initialized successfully!");
                    Some(controller)
                }
                Err(e) => {
                    warn!("Page behaviors disabled: {}", e);
                    None
                }
            };
            move || drop(controller)
        },
        (),
    );

    html! {
        <>
            <nav>
                <div class="nav-container">
                    <div class="logo">{"🔬 PetraScan"}</div>
                    <button class="mobile-menu-btn">{"☰"}</button>
                    <ul class="nav-links">
                        <li><a href="#beranda">{"Beranda"}</a></li>
                        <li><a href="#fitur">{"Fitur"}</a></li>
                        <li><a href="#statistik">{"Statistik"}</a></li>
                        <li><a href="#kontak">{"Kontak"}</a></li>
                    </ul>
                </div>
            </nav>

            <section id="beranda" class="hero">
                <h1>{"PetraScan"}</h1>
                <p>{"Biosensor Multiparameter untuk Deteksi Dini Mastitis"}</p>
                <a href="#kontak" class="cta-button">{"Hubungi Kami"}</a>
            </section>

            <section id="fitur" class="features">
                <h2>{"Fitur Utama"}</h2>
                <div class="features-grid">
                    { for FEATURES.iter().map(|feature| html! {
                        <div class="feature-card">
                            <div class="feature-icon">{feature.icon}</div>
                            <h3>{feature.title}</h3>
                            <p>{feature.body}</p>
                        </div>
                    }) }
                </div>
            </section>

            <section id="statistik" class="stats">
                <div class="stats-grid">
                    { for STATS.iter().map(|(value, label)| html! {
                        <div class="stat-card">
                            <span class="stat-number">{*value}</span>
                            <span class="stat-label">{*label}</span>
                        </div>
                    }) }
                </div>
            </section>

            <section id="kontak" class="contact">
                <h2>{"Hubungi Kami"}</h2>
                <form id="contactForm" novalidate=true>
                    <div class="form-group">
                        <label for="name">{"Nama"}</label>
                        <input id="name" type="text" required=true />
                    </div>
                    <div class="form-group">
                        <label for="email">{"Email"}</label>
                        <input id="email" type="email" required=true />
                    </div>
                    <div class="form-group">
                        <label for="phone">{"Nomor Telepon"}</label>
                        <input id="phone" type="tel" />
                    </div>
                    <div class="form-group">
                        <label for="subject">{"Subjek"}</label>
                        <select id="subject" required=true>
                            <option value="">{"Pilih subjek"}</option>
                            <option value="demo">{"Permintaan demo"}</option>
                            <option value="kerjasama">{"Kerja sama"}</option>
                            <option value="lainnya">{"Lainnya"}</option>
                        </select>
                    </div>
                    <div class="form-group">
                        <label for="message">{"Pesan"}</label>
                        <textarea id="message" rows="5" required=true />
                    </div>
                    <button type="submit" class="submit-button">{"Kirim Pesan"}</button>
                </form>
            </section>

            <footer>
                <p>{"© 2025 PetraScan. All rights reserved."}</p>
            </footer>
        </>
    }
}
